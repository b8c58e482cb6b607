use std::path::{Path, PathBuf};

use serde_json::Value;

/// Strings come back without the JSON quoting, everything else as compact JSON.
pub fn value_to_clean_string(val: &Value) -> String {
    match val {
        Value::String(s) => s.clone(),
        _ => val.to_string(),
    }
}

/// Truncate a display string to `max` characters, appending an ellipsis.
pub fn ellipsize(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let cut: String = s.chars().take(max).collect();
    format!("{cut}…")
}

/// `~/x` expansion for manually entered paths.
pub fn expand_tilde(raw: &str) -> PathBuf {
    if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(rest);
        }
    }
    PathBuf::from(raw)
}

/// Anchor a relative path at the current working directory.
pub fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    }
}

/// ExifTool's backup convention: the original is kept as `<file>_original`.
pub fn backup_path(path: &Path) -> PathBuf {
    PathBuf::from(format!("{}_original", path.display()))
}

/// Default "save as copy" suggestion: `<stem><suffix><ext>` next to the source.
pub fn suggest_output_path(src: &Path, suffix: &str) -> PathBuf {
    let abs = absolutize(src);
    let stem = abs
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = abs
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    abs.with_file_name(format!("{stem}{suffix}{ext}"))
}

/// Human-readable file size, `?` when the file cannot be stat'ed.
pub fn human_size(path: &Path) -> String {
    let Ok(meta) = std::fs::metadata(path) else {
        return "?".to_string();
    };
    let mut size = meta.len() as f64;
    for unit in ["B", "KB", "MB", "GB"] {
        if size < 1024.0 {
            return format!("{size:.0} {unit}");
        }
        size /= 1024.0;
    }
    format!("{size:.1} TB")
}

#[cfg(test)]
pub mod test_helpers {
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    /// Writes an executable shell script that stands in for the real
    /// ExifTool binary, so adapter tests run hermetically.
    pub fn fake_tool(script: &str) -> (TempDir, PathBuf) {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("fake-exiftool");
        fs::write(&path, format!("#!/bin/sh\n{script}\n")).expect("write script");
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod");
        }
        (dir, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn clean_string_unquotes_strings_only() {
        assert_eq!(value_to_clean_string(&json!("Jane Doe")), "Jane Doe");
        assert_eq!(value_to_clean_string(&json!(42)), "42");
        assert_eq!(value_to_clean_string(&json!([1, 2])), "[1,2]");
    }

    #[test]
    fn suggested_copy_name_keeps_extension() {
        let out = suggest_output_path(Path::new("/photos/trip.jpg"), "_clean");
        assert_eq!(out, PathBuf::from("/photos/trip_clean.jpg"));
    }

    #[test]
    fn suggested_copy_name_without_extension() {
        let out = suggest_output_path(Path::new("/photos/trip"), "_clean");
        assert_eq!(out, PathBuf::from("/photos/trip_clean"));
    }

    #[test]
    fn backup_path_appends_original() {
        assert_eq!(
            backup_path(Path::new("/a/b.jpg")),
            PathBuf::from("/a/b.jpg_original")
        );
    }

    #[test]
    fn ellipsize_counts_chars() {
        assert_eq!(ellipsize("short", 10), "short");
        assert_eq!(ellipsize("abcdef", 3), "abc…");
    }
}
