use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use serde_json::Value;

use crate::error::Result;
use crate::exiftool::TagSet;
use crate::util::value_to_clean_string;

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    #[serde(rename = "Group")]
    group: &'a str,
    #[serde(rename = "Tag")]
    tag: &'a str,
    #[serde(rename = "Value")]
    value: String,
}

/// Pretty-printed UTF-8 JSON dump of a tag set.
pub fn write_json(tags: &TagSet, out: &Path) -> Result<()> {
    let mut writer = BufWriter::new(File::create(out)?);
    serde_json::to_writer_pretty(&mut writer, tags)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Flattens a grouped tag set to `(group, tag, value)` rows.
///
/// Grouped entries contribute one row per inner tag; scalar entries (such as
/// `SourceFile`) get a single row with an empty group column.
pub fn csv_rows(tags: &TagSet) -> Vec<(String, String, String)> {
    let mut rows = Vec::new();
    for (key, value) in tags {
        match value {
            Value::Object(inner) => {
                for (tag, v) in inner {
                    rows.push((key.clone(), tag.clone(), value_to_clean_string(v)));
                }
            }
            other => rows.push((String::new(), key.clone(), value_to_clean_string(other))),
        }
    }
    rows
}

/// CSV export: header `Group,Tag,Value`, one row per leaf tag.
pub fn write_csv(tags: &TagSet, out: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(out)?;
    for (group, tag, value) in csv_rows(tags) {
        writer.serialize(CsvRow {
            group: &group,
            tag: &tag,
            value,
        })?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> TagSet {
        match json!({
            "SourceFile": "x.jpg",
            "EXIF": {"Artist": "Jane Doe", "ISO": 200},
            "GPS": {"GPSLatitude": "40.7128"},
            "ExifToolVersion": 12.76,
        }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn row_count_is_sum_of_leaf_tags() {
        // 2 leaf tags + 1 leaf tag + 2 scalars
        let rows = csv_rows(&sample());
        assert_eq!(rows.len(), 5);
    }

    #[test]
    fn scalar_entries_have_empty_group() {
        let rows = csv_rows(&sample());
        let source = rows.iter().find(|(_, tag, _)| tag == "SourceFile").unwrap();
        assert_eq!(source.0, "");
        assert_eq!(source.2, "x.jpg");
    }

    #[test]
    fn grouped_entries_carry_their_group() {
        let rows = csv_rows(&sample());
        let artist = rows.iter().find(|(_, tag, _)| tag == "Artist").unwrap();
        assert_eq!(artist.0, "EXIF");
        assert_eq!(artist.2, "Jane Doe");
        let iso = rows.iter().find(|(_, tag, _)| tag == "ISO").unwrap();
        assert_eq!(iso.2, "200");
    }

    #[test]
    fn csv_file_has_header_and_one_line_per_row() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("meta.csv");
        let tags = sample();
        write_csv(&tags, &out).unwrap();

        let text = std::fs::read_to_string(&out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Group,Tag,Value");
        assert_eq!(lines.len(), csv_rows(&tags).len() + 1);
    }

    #[test]
    fn json_export_parses_back_identically() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("meta.json");
        let tags = sample();
        write_json(&tags, &out).unwrap();

        let text = std::fs::read_to_string(&out).unwrap();
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, Value::Object(tags));
    }
}
