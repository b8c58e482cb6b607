use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde_json::Value;

use crate::error::{Result, TagSweepError};
use crate::export;

/// A grouped or flat metadata mapping, exactly as ExifTool emitted it.
pub type TagSet = serde_json::Map<String, Value>;

/// The nine GPS tags shown on the GPS screen.
pub const GPS_TAGS: &[&str] = &[
    "GPSLatitude",
    "GPSLongitude",
    "GPSAltitude",
    "GPSLatitudeRef",
    "GPSLongitudeRef",
    "GPSAltitudeRef",
    "GPSSpeed",
    "GPSDateStamp",
    "GPSTimeStamp",
];

/// Adapter around the system-installed `exiftool` binary.
///
/// Every operation spawns one subprocess, waits for it, and parses its
/// text or `-json` output. The adapter never reads file bytes itself;
/// all metadata work is delegated to the external tool.
#[derive(Debug, Clone)]
pub struct ExifTool {
    bin: PathBuf,
}

impl ExifTool {
    /// Resolves `exiftool` on PATH and probes it with `-ver`.
    ///
    /// Returns [`TagSweepError::ToolNotFound`] when the binary cannot be
    /// spawned, which callers should treat as fatal at startup.
    pub fn new() -> Result<Self> {
        let tool = Self::with_executable(Path::new("exiftool"));
        tool.version()?;
        Ok(tool)
    }

    /// Uses a specific executable instead of the PATH lookup.
    pub fn with_executable(path: &Path) -> Self {
        Self {
            bin: path.to_path_buf(),
        }
    }

    /// Runs the binary with the given argument vector and returns stdout.
    ///
    /// Stdout is decoded as UTF-8 with lossy replacement. Exit codes 0 and 1
    /// are success (1 means warnings but processed); anything else becomes
    /// [`TagSweepError::ToolExecution`] carrying the captured stderr.
    pub fn run<I, S>(&self, args: I) -> Result<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
        if log::log_enabled!(log::Level::Debug) {
            let shown: Vec<String> = args
                .iter()
                .map(|a| a.to_string_lossy().into_owned())
                .collect();
            log::debug!("exiftool {}", shown.join(" "));
        }

        let output = Command::new(&self.bin).args(&args).output().map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                TagSweepError::ToolNotFound
            } else {
                TagSweepError::Io(e)
            }
        })?;

        let status = output.status.code().unwrap_or(-1);
        if status != 0 && status != 1 {
            return Err(TagSweepError::ToolExecution {
                status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// `exiftool -ver`
    pub fn version(&self) -> Result<String> {
        Ok(self.run(["-ver"])?.trim().to_string())
    }

    fn run_json(&self, args: Vec<OsString>) -> Result<Value> {
        let out = self.run(args)?;
        if out.trim().is_empty() {
            return Ok(Value::Array(Vec::new()));
        }
        Ok(serde_json::from_str(&out)?)
    }

    fn first_object(value: Value) -> TagSet {
        match value {
            Value::Array(mut items) if !items.is_empty() => match items.swap_remove(0) {
                Value::Object(map) => map,
                _ => TagSet::new(),
            },
            _ => TagSet::new(),
        }
    }

    /// Grouped read of all tags, unknown ones included.
    ///
    /// `exiftool -json -a -u -g -- {path}`
    pub fn read(&self, path: &Path) -> Result<TagSet> {
        let mut args: Vec<OsString> =
            vec!["-json".into(), "-a".into(), "-u".into(), "-g".into()];
        push_target(&mut args, path);
        Ok(Self::first_object(self.run_json(args)?))
    }

    /// Ungrouped read of all tags.
    ///
    /// `exiftool -json -- {path}`
    pub fn read_flat(&self, path: &Path) -> Result<TagSet> {
        let mut args: Vec<OsString> = vec!["-json".into()];
        push_target(&mut args, path);
        Ok(Self::first_object(self.run_json(args)?))
    }

    /// Flat read of a specific set of tags.
    ///
    /// `exiftool -json -TAG... -- {path}`
    pub fn read_tags(&self, path: &Path, tags: &[&str]) -> Result<TagSet> {
        let mut args: Vec<OsString> = vec!["-json".into()];
        args.extend(tags.iter().map(|t| OsString::from(format!("-{t}"))));
        push_target(&mut args, path);
        Ok(Self::first_object(self.run_json(args)?))
    }

    /// Recursive ungrouped read of every file under a directory, one JSON
    /// object per file.
    ///
    /// `exiftool -json -a -u -r -- {dir}`
    pub fn read_dir(&self, dir: &Path) -> Result<Vec<TagSet>> {
        let mut args: Vec<OsString> =
            vec!["-json".into(), "-a".into(), "-u".into(), "-r".into()];
        push_target(&mut args, dir);
        match self.run_json(args)? {
            Value::Array(items) => Ok(items
                .into_iter()
                .filter_map(|item| match item {
                    Value::Object(map) => Some(map),
                    _ => None,
                })
                .collect()),
            _ => Ok(Vec::new()),
        }
    }

    /// Writes one `-Tag=value` argument per pair.
    ///
    /// `exiftool -TAG=VALUE... [-overwrite_original] -- {path}`
    pub fn write_tags(
        &self,
        path: &Path,
        tags: &[(String, String)],
        keep_backup: bool,
    ) -> Result<String> {
        let mut args: Vec<OsString> = tags
            .iter()
            .map(|(tag, value)| OsString::from(format!("-{tag}={value}")))
            .collect();
        push_overwrite(&mut args, keep_backup);
        push_target(&mut args, path);
        self.run(args)
    }

    fn strip(&self, path: &Path, clear_arg: &str, keep_backup: bool) -> Result<String> {
        let mut args: Vec<OsString> = vec![clear_arg.into()];
        push_overwrite(&mut args, keep_backup);
        push_target(&mut args, path);
        self.run(args)
    }

    /// ExifTool's in-place mode cannot target a different destination, so
    /// the copy-then-strip variants copy `src` to `dst` first and strip the
    /// copy, leaving `src` untouched.
    fn strip_to(&self, src: &Path, dst: &Path, clear_arg: &str) -> Result<String> {
        fs::copy(src, dst)?;
        let mut args: Vec<OsString> = vec![clear_arg.into(), "-overwrite_original".into()];
        push_target(&mut args, dst);
        self.run(args)
    }

    /// `exiftool -all= [-overwrite_original] -- {path}`
    pub fn strip_all(&self, path: &Path, keep_backup: bool) -> Result<String> {
        self.strip(path, "-all=", keep_backup)
    }

    pub fn strip_all_to(&self, src: &Path, dst: &Path) -> Result<String> {
        self.strip_to(src, dst, "-all=")
    }

    /// `exiftool -gps:all= [-overwrite_original] -- {path}`
    pub fn strip_gps(&self, path: &Path, keep_backup: bool) -> Result<String> {
        self.strip(path, "-gps:all=", keep_backup)
    }

    pub fn strip_gps_to(&self, src: &Path, dst: &Path) -> Result<String> {
        self.strip_to(src, dst, "-gps:all=")
    }

    /// `exiftool -TAG= [-overwrite_original] -- {path}`
    pub fn strip_tag(&self, path: &Path, tag: &str, keep_backup: bool) -> Result<String> {
        self.strip(path, &format!("-{tag}="), keep_backup)
    }

    pub fn strip_tag_to(&self, src: &Path, dst: &Path, tag: &str) -> Result<String> {
        self.strip_to(src, dst, &format!("-{tag}="))
    }

    fn dir_op(
        &self,
        dir: &Path,
        head: Vec<OsString>,
        exts: &[String],
        keep_backup: bool,
    ) -> Result<String> {
        let mut args = head;
        for ext in exts {
            args.push("-ext".into());
            args.push(ext.into());
        }
        push_overwrite(&mut args, keep_backup);
        args.push("-r".into());
        push_target(&mut args, dir);
        self.run(args)
    }

    /// Recursive strip of everything under a directory, optionally limited
    /// to a set of extensions.
    ///
    /// `exiftool -all= [-ext E]... [-overwrite_original] -r -- {dir}`
    pub fn strip_dir(&self, dir: &Path, exts: &[String], keep_backup: bool) -> Result<String> {
        self.dir_op(dir, vec!["-all=".into()], exts, keep_backup)
    }

    /// `exiftool -gps:all= [-ext E]... [-overwrite_original] -r -- {dir}`
    pub fn strip_gps_dir(&self, dir: &Path, exts: &[String], keep_backup: bool) -> Result<String> {
        self.dir_op(dir, vec!["-gps:all=".into()], exts, keep_backup)
    }

    /// `exiftool -TAG=VALUE... [-ext E]... [-overwrite_original] -r -- {dir}`
    pub fn write_dir(
        &self,
        dir: &Path,
        tags: &[(String, String)],
        exts: &[String],
        keep_backup: bool,
    ) -> Result<String> {
        let head: Vec<OsString> = tags
            .iter()
            .map(|(tag, value)| OsString::from(format!("-{tag}={value}")))
            .collect();
        self.dir_op(dir, head, exts, keep_backup)
    }

    /// Flat read of the GPS tag set.
    pub fn read_gps(&self, path: &Path) -> Result<TagSet> {
        self.read_tags(path, GPS_TAGS)
    }

    /// Writes decimal coordinates as absolute values plus reference tags
    /// (`N`/`S`, `E`/`W`, and `0`/`1` for altitude above/below sea level).
    pub fn write_gps(
        &self,
        path: &Path,
        lat: f64,
        lon: f64,
        alt: Option<f64>,
        keep_backup: bool,
    ) -> Result<String> {
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return Err(TagSweepError::InvalidInput(
                "coordinates out of valid range".to_string(),
            ));
        }
        self.write_tags(path, &gps_tags(lat, lon, alt), keep_backup)
    }

    /// Copies every tag from `src` onto `dst`.
    ///
    /// `exiftool -TagsFromFile {src} [-overwrite_original] -- {dst}`
    pub fn copy_tags_from(&self, src: &Path, dst: &Path, keep_backup: bool) -> Result<String> {
        let mut args: Vec<OsString> = vec!["-TagsFromFile".into(), src.into()];
        push_overwrite(&mut args, keep_backup);
        push_target(&mut args, dst);
        self.run(args)
    }

    /// Grouped read followed by a pretty JSON dump to `out`.
    pub fn export_json(&self, path: &Path, out: &Path) -> Result<()> {
        let data = self.read(path)?;
        export::write_json(&data, out)
    }

    /// Grouped read flattened to `Group,Tag,Value` rows at `out`.
    pub fn export_csv(&self, path: &Path, out: &Path) -> Result<()> {
        let data = self.read(path)?;
        export::write_csv(&data, out)
    }
}

fn push_target(args: &mut Vec<OsString>, path: &Path) {
    args.push("--".into());
    args.push(path.into());
}

fn push_overwrite(args: &mut Vec<OsString>, keep_backup: bool) {
    // With keep_backup the tool's own `{file}_original` convention applies.
    if !keep_backup {
        args.push("-overwrite_original".into());
    }
}

pub(crate) fn gps_tags(lat: f64, lon: f64, alt: Option<f64>) -> Vec<(String, String)> {
    let mut tags = vec![
        ("GPSLatitude".to_string(), lat.abs().to_string()),
        (
            "GPSLatitudeRef".to_string(),
            if lat >= 0.0 { "N" } else { "S" }.to_string(),
        ),
        ("GPSLongitude".to_string(), lon.abs().to_string()),
        (
            "GPSLongitudeRef".to_string(),
            if lon >= 0.0 { "E" } else { "W" }.to_string(),
        ),
    ];
    if let Some(alt) = alt {
        tags.push(("GPSAltitude".to_string(), alt.abs().to_string()));
        tags.push((
            "GPSAltitudeRef".to_string(),
            if alt >= 0.0 { "0" } else { "1" }.to_string(),
        ));
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::test_helpers::fake_tool;
    use assert_matches::assert_matches;

    #[test]
    fn missing_binary_is_tool_not_found() {
        let tool = ExifTool::with_executable(Path::new("no-such-exiftool-anywhere"));
        assert_matches!(tool.version(), Err(TagSweepError::ToolNotFound));
    }

    #[test]
    fn warning_exit_code_is_success() {
        let (_dir, bin) = fake_tool("echo processed; exit 1");
        let tool = ExifTool::with_executable(&bin);
        assert_eq!(tool.run(["-x"]).unwrap().trim(), "processed");
    }

    #[test]
    fn hard_failure_surfaces_stderr() {
        let (_dir, bin) = fake_tool("echo boom >&2; exit 2");
        let tool = ExifTool::with_executable(&bin);
        assert_matches!(
            tool.run(["-x"]),
            Err(TagSweepError::ToolExecution { status: 2, ref stderr }) if stderr == "boom"
        );
    }

    #[test]
    fn read_returns_first_object() {
        let (_dir, bin) =
            fake_tool(r#"echo '[{"SourceFile":"x.jpg","EXIF":{"Artist":"Jane Doe"}}]'"#);
        let tool = ExifTool::with_executable(&bin);
        let tags = tool.read(Path::new("x.jpg")).unwrap();
        assert_eq!(
            tags.get("EXIF").and_then(|g| g.get("Artist")),
            Some(&serde_json::json!("Jane Doe"))
        );
    }

    #[test]
    fn read_of_empty_array_is_empty_map() {
        let (_dir, bin) = fake_tool("echo '[]'");
        let tool = ExifTool::with_executable(&bin);
        assert!(tool.read(Path::new("x.jpg")).unwrap().is_empty());
    }

    #[test]
    fn malformed_json_is_reported() {
        let (_dir, bin) = fake_tool("echo 'this is not json'");
        let tool = ExifTool::with_executable(&bin);
        assert_matches!(
            tool.read(Path::new("x.jpg")),
            Err(TagSweepError::MalformedOutput(_))
        );
    }

    #[test]
    fn strip_all_overwrites_in_place_unless_backup_kept() {
        let (_dir, bin) = fake_tool(r#"echo "$@""#);
        let tool = ExifTool::with_executable(&bin);

        let echoed = tool.strip_all(Path::new("a.jpg"), false).unwrap();
        assert!(echoed.contains("-all="));
        assert!(echoed.contains("-overwrite_original"));
        assert!(echoed.trim().ends_with("-- a.jpg"));

        let echoed = tool.strip_all(Path::new("a.jpg"), true).unwrap();
        assert!(!echoed.contains("-overwrite_original"));
    }

    #[test]
    fn dir_ops_add_recursion_and_extension_filters() {
        let (_dir, bin) = fake_tool(r#"echo "$@""#);
        let tool = ExifTool::with_executable(&bin);
        let exts = vec!["jpg".to_string(), "png".to_string()];

        let echoed = tool.strip_dir(Path::new("photos"), &exts, false).unwrap();
        assert!(echoed.contains("-all="));
        assert!(echoed.contains("-ext jpg"));
        assert!(echoed.contains("-ext png"));
        assert!(echoed.contains("-r"));
        assert!(echoed.trim().ends_with("-- photos"));
    }

    #[test]
    fn strip_to_copies_first_and_leaves_source_alone() {
        let (_dir, bin) = fake_tool("exit 0");
        let tool = ExifTool::with_executable(&bin);

        let work = tempfile::tempdir().unwrap();
        let src = work.path().join("orig.jpg");
        let dst = work.path().join("orig_clean.jpg");
        fs::write(&src, b"pretend jpeg bytes").unwrap();

        tool.strip_all_to(&src, &dst).unwrap();
        assert_eq!(fs::read(&src).unwrap(), b"pretend jpeg bytes");
        assert_eq!(fs::read(&dst).unwrap(), b"pretend jpeg bytes");
    }

    #[test]
    fn gps_reference_tags_follow_sign() {
        let tags = gps_tags(40.7128, -74.0060, Some(-3.0));
        let get = |name: &str| {
            tags.iter()
                .find(|(tag, _)| tag == name)
                .map(|(_, v)| v.as_str())
                .unwrap()
        };
        assert_eq!(get("GPSLatitude"), "40.7128");
        assert_eq!(get("GPSLatitudeRef"), "N");
        assert_eq!(get("GPSLongitude"), "74.006");
        assert_eq!(get("GPSLongitudeRef"), "W");
        assert_eq!(get("GPSAltitude"), "3");
        assert_eq!(get("GPSAltitudeRef"), "1");
    }

    #[test]
    fn gps_tags_skip_altitude_when_absent() {
        let tags = gps_tags(1.0, 2.0, None);
        assert_eq!(tags.len(), 4);
    }

    #[test]
    fn write_gps_rejects_out_of_range_coordinates() {
        let (_dir, bin) = fake_tool("exit 0");
        let tool = ExifTool::with_executable(&bin);
        assert_matches!(
            tool.write_gps(Path::new("a.jpg"), 95.0, 0.0, None, false),
            Err(TagSweepError::InvalidInput(_))
        );
        assert_matches!(
            tool.write_gps(Path::new("a.jpg"), 0.0, -200.0, None, false),
            Err(TagSweepError::InvalidInput(_))
        );
    }
}
