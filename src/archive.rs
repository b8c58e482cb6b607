use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use serde_json::Value;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{Result, TagSweepError};
use crate::exiftool::{ExifTool, TagSet};
use crate::util::absolutize;

/// Per-file outcome of [`inspect_zip`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    /// Path relative to the archive root.
    pub path: PathBuf,
    pub tag_count: usize,
}

/// Strips all metadata from every file inside `zip_in` and writes the
/// result to a fresh archive at `zip_out`. Returns the number of files
/// processed.
///
/// The input archive is never modified; the entries are extracted into a
/// temporary directory, stripped there via the external tool, and repacked.
/// The temp directory is removed on every exit path (RAII).
pub fn clean_zip(tool: &ExifTool, zip_in: &Path, zip_out: &Path) -> Result<usize> {
    clean_zip_in(tool, zip_in, zip_out, &std::env::temp_dir())
}

fn clean_zip_in(
    tool: &ExifTool,
    zip_in: &Path,
    zip_out: &Path,
    staging_root: &Path,
) -> Result<usize> {
    if absolutize(zip_in) == absolutize(zip_out) {
        return Err(TagSweepError::InvalidInput(
            "output path must differ from the input archive".to_string(),
        ));
    }

    let staging = tempfile::Builder::new()
        .prefix("tagsweep_")
        .tempdir_in(staging_root)?;
    extract_zip(zip_in, staging.path())?;
    tool.strip_dir(staging.path(), &[], false)?;
    pack_dir(staging.path(), zip_out)
}

/// Reads metadata for every file inside `zip_in` without writing anything
/// back. Reports are sorted by path; counts follow [`leaf_tag_count`].
pub fn inspect_zip(tool: &ExifTool, zip_in: &Path) -> Result<Vec<FileReport>> {
    let staging = tempfile::Builder::new().prefix("tagsweep_").tempdir()?;
    extract_zip(zip_in, staging.path())?;

    let mut reports: Vec<FileReport> = tool
        .read_dir(staging.path())?
        .into_iter()
        .map(|item| {
            let source = item
                .get("SourceFile")
                .and_then(Value::as_str)
                .unwrap_or_default();
            let rel = Path::new(source)
                .strip_prefix(staging.path())
                .unwrap_or_else(|_| Path::new(source));
            FileReport {
                path: rel.to_path_buf(),
                tag_count: leaf_tag_count(&item),
            }
        })
        .collect();
    reports.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(reports)
}

/// Counts leaf tags in one per-file JSON object: a nested mapping counts
/// each inner key, anything else counts as one. `SourceFile` and
/// `ExifToolVersion` are bookkeeping, not metadata.
pub fn leaf_tag_count(item: &TagSet) -> usize {
    item.iter()
        .filter(|(key, _)| key.as_str() != "SourceFile" && key.as_str() != "ExifToolVersion")
        .map(|(_, value)| match value {
            Value::Object(inner) => inner.len(),
            _ => 1,
        })
        .sum()
}

/// Number of non-directory entries in an archive, without extracting.
pub fn entry_count(zip_in: &Path) -> Result<usize> {
    let archive = ZipArchive::new(File::open(zip_in)?)?;
    Ok(archive
        .file_names()
        .filter(|name| !name.ends_with('/'))
        .count())
}

/// Extracts every entry of `archive_path` under `dest`, skipping entries
/// whose names would escape the destination root. Returns the number of
/// files written.
pub fn extract_zip(archive_path: &Path, dest: &Path) -> Result<usize> {
    let mut archive = ZipArchive::new(File::open(archive_path)?)?;
    let mut extracted = 0;
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        let Some(rel) = entry.enclosed_name() else {
            log::warn!("skipping archive entry with unsafe name: {}", entry.name());
            continue;
        };
        let target = dest.join(rel);
        if entry.is_dir() {
            fs::create_dir_all(&target)?;
            continue;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&target)?;
        io::copy(&mut entry, &mut out)?;
        extracted += 1;
    }
    Ok(extracted)
}

/// Packs every file under `dir` into a deflate ZIP at `zip_out`, entry
/// names relative to `dir` with forward slashes. Directory-only entries
/// are not written and not counted.
pub fn pack_dir(dir: &Path, zip_out: &Path) -> Result<usize> {
    let mut writer = ZipWriter::new(File::create(zip_out)?);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut count = 0;
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(rel) = entry.path().strip_prefix(dir) else {
            continue;
        };
        let name = rel.to_string_lossy().replace('\\', "/");
        writer.start_file(name, options)?;
        let mut file = File::open(entry.path())?;
        io::copy(&mut file, &mut writer)?;
        count += 1;
    }
    writer.finish()?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::test_helpers::fake_tool;
    use assert_matches::assert_matches;
    use std::io::Write;

    fn sample_zip(dir: &Path) -> PathBuf {
        let path = dir.join("sample.zip");
        let mut writer = ZipWriter::new(File::create(&path).unwrap());
        let options = SimpleFileOptions::default();
        writer.add_directory("sub/", options).unwrap();
        writer.start_file("a.txt", options).unwrap();
        writer.write_all(b"alpha").unwrap();
        writer.start_file("sub/b.txt", options).unwrap();
        writer.write_all(b"beta").unwrap();
        writer.finish().unwrap();
        path
    }

    #[test]
    fn clean_zip_counts_files_and_preserves_input() {
        let (_tool_dir, bin) = fake_tool("exit 0");
        let tool = ExifTool::with_executable(&bin);

        let work = tempfile::tempdir().unwrap();
        let input = sample_zip(work.path());
        let output = work.path().join("sample_clean.zip");
        let before = fs::read(&input).unwrap();

        let processed = clean_zip(&tool, &input, &output).unwrap();
        assert_eq!(processed, 2);
        assert_eq!(fs::read(&input).unwrap(), before);

        let archive = ZipArchive::new(File::open(&output).unwrap()).unwrap();
        let mut names: Vec<String> = archive.file_names().map(String::from).collect();
        names.sort();
        assert_eq!(names, vec!["a.txt".to_string(), "sub/b.txt".to_string()]);
    }

    #[test]
    fn clean_zip_rejects_same_input_and_output() {
        let (_tool_dir, bin) = fake_tool("exit 0");
        let tool = ExifTool::with_executable(&bin);

        let work = tempfile::tempdir().unwrap();
        let input = sample_zip(work.path());
        assert_matches!(
            clean_zip(&tool, &input, &input),
            Err(TagSweepError::InvalidInput(_))
        );
    }

    #[test]
    fn clean_zip_failure_still_removes_staging() {
        let (_tool_dir, bin) = fake_tool("exit 3");
        let tool = ExifTool::with_executable(&bin);

        let work = tempfile::tempdir().unwrap();
        let input = sample_zip(work.path());
        let output = work.path().join("out.zip");
        let staging_root = work.path().join("staging");
        fs::create_dir_all(&staging_root).unwrap();

        assert_matches!(
            clean_zip_in(&tool, &input, &output, &staging_root),
            Err(TagSweepError::ToolExecution { status: 3, .. })
        );
        assert_eq!(fs::read_dir(&staging_root).unwrap().count(), 0);
    }

    #[test]
    fn inspect_zip_reports_relative_paths_and_counts() {
        // The staging directory is the final argument; echo one file under it.
        let script = r#"for a in "$@"; do last="$a"; done
printf '[{"SourceFile":"%s/a.txt","EXIF":{"Artist":"Jane","Make":"X"},"Comment":"hi"}]\n' "$last""#;
        let (_tool_dir, bin) = fake_tool(script);
        let tool = ExifTool::with_executable(&bin);

        let work = tempfile::tempdir().unwrap();
        let input = sample_zip(work.path());
        let before = fs::read(&input).unwrap();

        let first = inspect_zip(&tool, &input).unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].path, PathBuf::from("a.txt"));
        assert_eq!(first[0].tag_count, 3);

        // Read-only and deterministic.
        let second = inspect_zip(&tool, &input).unwrap();
        assert_eq!(first, second);
        assert_eq!(fs::read(&input).unwrap(), before);
    }

    #[test]
    fn leaf_tag_count_excludes_bookkeeping_keys() {
        let item = match serde_json::json!({
            "SourceFile": "/tmp/x/a.jpg",
            "ExifToolVersion": 12.76,
            "EXIF": {"Artist": "Jane", "ISO": 100},
            "Orientation": 1,
        }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        assert_eq!(leaf_tag_count(&item), 3);
    }

    #[test]
    fn extract_skips_entries_escaping_the_root() {
        let work = tempfile::tempdir().unwrap();
        let path = work.path().join("evil.zip");
        let mut writer = ZipWriter::new(File::create(&path).unwrap());
        let options = SimpleFileOptions::default();
        writer.start_file("../evil.txt", options).unwrap();
        writer.write_all(b"nope").unwrap();
        writer.start_file("ok.txt", options).unwrap();
        writer.write_all(b"fine").unwrap();
        writer.finish().unwrap();

        let dest = work.path().join("unpacked");
        fs::create_dir_all(&dest).unwrap();
        let extracted = extract_zip(&path, &dest).unwrap();
        assert_eq!(extracted, 1);
        assert!(dest.join("ok.txt").exists());
        assert!(!work.path().join("evil.txt").exists());
    }

    #[test]
    fn entry_count_ignores_directory_entries() {
        let work = tempfile::tempdir().unwrap();
        let input = sample_zip(work.path());
        assert_eq!(entry_count(&input).unwrap(), 2);
    }
}
