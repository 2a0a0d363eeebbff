//! Append-only JSON time series, one file per (item, data type).
//!
//! Each file holds a JSON array of `SampleEntry`. Entries are appended in capture
//! order; readers sort by timestamp themselves. The whole array is rewritten on
//! every append through a temp file and a rename, so a concurrent reader sees
//! either the previous or the new contents.
//!
//! Existing entries are carried over verbatim, including rows in older formats
//! that the reader skips.
//!
//! Only one writer is supported. The scheduler is sequential, so no locking is done.

use anyhow::{anyhow, Context, Result};
use chrono::{Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::ser::{PrettyFormatter, Serializer};
use serde_json::Value;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;
use tempfile::NamedTempFile;

use crate::market::PriceRecord;

/// Format of bucket timestamps and screenshot directory names.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M";

/// Width of a timestamp bucket in minutes.
const BUCKET_MINUTES: u32 = 10;

/// One capture of one region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleEntry {
    pub timestamp: String,
    #[serde(default, deserialize_with = "deserialize_rows")]
    pub data: Vec<PriceRecord>,
}

/// Row written by earlier versions: the raw OCR strings.
#[derive(Deserialize)]
struct LegacyRow {
    ratio: String,
    count: String,
}

/// Accepts typed rows and legacy `{"ratio": "1:5", "count": "10"}` rows.
/// Rows that do not parse are skipped.
fn deserialize_rows<'de, D>(deserializer: D) -> Result<Vec<PriceRecord>, D::Error>
where
    D: Deserializer<'de>,
{
    let rows = Vec::<Value>::deserialize(deserializer)?;
    Ok(rows.iter().filter_map(parse_stored_row).collect())
}

fn parse_stored_row(row: &Value) -> Option<PriceRecord> {
    if let Ok(record) = PriceRecord::deserialize(row) {
        return Some(record);
    }
    let legacy = LegacyRow::deserialize(row).ok()?;
    PriceRecord::parse(&legacy.ratio, &legacy.count).ok()
}

/// Truncates a time to the start of its 10-minute window, formatted as
/// `YYYY-MM-DD_HH-MM`.
pub fn bucket_timestamp(at: NaiveDateTime) -> String {
    format!(
        "{}_{:02}-{:02}",
        at.format("%Y-%m-%d"),
        at.hour(),
        at.minute() / BUCKET_MINUTES * BUCKET_MINUTES
    )
}

/// Bucket for the current local time.
pub fn current_bucket() -> String {
    bucket_timestamp(Local::now().naive_local())
}

/// Appends `rows` under the current time bucket. Returns the new entry count.
pub fn append(path: &Path, rows: Vec<PriceRecord>) -> Result<usize> {
    append_at(path, rows, &current_bucket())
}

/// Appends `rows` under an explicit bucket timestamp. Returns the new entry count.
///
/// A missing file is created with a single entry. A file that cannot be parsed
/// is moved aside to `<name>.corrupt-<time>` and a fresh sequence is started.
pub fn append_at(path: &Path, rows: Vec<PriceRecord>, bucket: &str) -> Result<usize> {
    let mut entries = match fs::read_to_string(path) {
        Ok(contents) => match existing_entries(&contents) {
            Ok(entries) => entries,
            Err(e) => {
                let backup = backup_corrupt(path)?;
                log::warn!(
                    "{} is not a valid series ({}); moved to {} and starting a new one",
                    path.display(),
                    e,
                    backup.display()
                );
                Vec::new()
            }
        },
        Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read {}", path.display()));
        }
    };

    let entry = SampleEntry {
        timestamp: bucket.to_string(),
        data: rows,
    };
    entries.push(serde_json::to_value(entry).context("Failed to serialize entry")?);
    write_entries(path, &entries)?;

    Ok(entries.len())
}

/// Entries of an existing file, untouched. Fails if any element is not an entry.
fn existing_entries(contents: &str) -> serde_json::Result<Vec<Value>> {
    let entries: Vec<Value> = serde_json::from_str(contents)?;
    for entry in &entries {
        SampleEntry::deserialize(entry)?;
    }
    Ok(entries)
}

/// Reads the whole series. Missing or unreadable files yield an empty sequence.
pub fn read(path: &Path) -> Vec<SampleEntry> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => return Vec::new(),
        Err(e) => {
            log::warn!("Failed to read {}: {}", path.display(), e);
            return Vec::new();
        }
    };

    match serde_json::from_str(&contents) {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("Failed to parse {}: {}", path.display(), e);
            Vec::new()
        }
    }
}

/// Writes the full array: pretty-printed with 4-space indent, non-ASCII kept as-is.
fn write_entries(path: &Path, entries: &[Value]) -> Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        Some(_) => Path::new("."),
        None => return Err(anyhow!("{} is not a file path", path.display())),
    };
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;

    let mut buffer = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = Serializer::with_formatter(&mut buffer, formatter);
    entries
        .serialize(&mut serializer)
        .context("Failed to serialize series")?;

    let mut temp = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
    temp.write_all(&buffer)?;
    temp.persist(path)
        .with_context(|| format!("Failed to replace {}", path.display()))?;

    Ok(())
}

fn backup_corrupt(path: &Path) -> Result<std::path::PathBuf> {
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(format!(".corrupt-{}", stamp));
    let backup = path.with_file_name(name);

    fs::rename(path, &backup)
        .with_context(|| format!("Failed to move aside {}", path.display()))?;
    Ok(backup)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn at(hour: u32, minute: u32, second: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(hour, minute, second)
            .unwrap()
    }

    fn record(ratio: &str, count: &str) -> PriceRecord {
        PriceRecord::parse(ratio, count).unwrap()
    }

    #[test]
    fn test_bucket_truncates_to_ten_minutes() {
        assert_eq!(bucket_timestamp(at(10, 7, 59)), "2024-01-01_10-00");
        assert_eq!(bucket_timestamp(at(10, 0, 0)), "2024-01-01_10-00");
        assert_eq!(bucket_timestamp(at(9, 59, 59)), "2024-01-01_09-50");
        assert_eq!(bucket_timestamp(at(23, 45, 12)), "2024-01-01_23-40");
    }

    #[test]
    fn test_bucket_same_window_and_boundaries() {
        for start in (0..60).step_by(10) {
            let first = bucket_timestamp(at(14, start, 0));
            for offset in 0..10 {
                assert_eq!(bucket_timestamp(at(14, start + offset, 30)), first);
            }
            if start + 10 < 60 {
                assert_ne!(bucket_timestamp(at(14, start + 10, 0)), first);
            }
        }
        assert_ne!(bucket_timestamp(at(14, 59, 59)), bucket_timestamp(at(15, 0, 0)));
    }

    #[test]
    fn test_append_stamps_current_bucket() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("buy_c_results.json");

        let before = current_bucket();
        assert_eq!(append(&path, vec![record("1:5", "10")]).unwrap(), 1);
        assert_eq!(append(&path, Vec::new()).unwrap(), 2);
        let after = current_bucket();

        let entries = read(&path);
        assert_eq!(entries.len(), 2);
        for entry in &entries {
            assert!(entry.timestamp == before || entry.timestamp == after);
            assert_eq!(entry.timestamp.len(), "2024-01-01_10-00".len());
            assert!(entry.timestamp.ends_with('0'));
        }
        assert_eq!(entries[0].data, vec![record("1:5", "10")]);
        assert!(entries[1].data.is_empty());
    }

    #[test]
    fn test_append_creates_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("item").join("buy_c_results.json");

        let len = append_at(&path, vec![record("1:5", "10")], "2024-01-01_10-00").unwrap();

        assert_eq!(len, 1);
        let entries = read(&path);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].timestamp, "2024-01-01_10-00");
        assert_eq!(entries[0].data, vec![record("1:5", "10")]);
    }

    #[test]
    fn test_append_k_times_keeps_call_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sell_d_results.json");

        let buckets = ["2024-01-01_10-20", "2024-01-01_10-00", "2024-01-01_10-10"];
        for (i, bucket) in buckets.iter().enumerate() {
            let rows = vec![record(&format!("1:{}", i + 1), "1")];
            assert_eq!(append_at(&path, rows, bucket).unwrap(), i + 1);
        }

        let entries = read(&path);
        let timestamps: Vec<&str> = entries.iter().map(|e| e.timestamp.as_str()).collect();
        assert_eq!(timestamps, buckets.to_vec());
        assert_eq!(entries[2].data[0].ratio(), 3.0);
    }

    #[test]
    fn test_append_empty_rows_still_appends() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("buy_c_results.json");

        append_at(&path, Vec::new(), "2024-01-01_10-00").unwrap();

        let entries = read(&path);
        assert_eq!(entries.len(), 1);
        assert!(entries[0].data.is_empty());
    }

    #[test]
    fn test_same_window_appends_separate_entries() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("buy_c_results.json");
        std::fs::write(
            &path,
            r#"[{"timestamp": "2024-01-01_10-00", "data": [{"ratio": 5.0, "count": 10, "raw_ratio": "1:5"}]}]"#,
        )
        .unwrap();

        let bucket = bucket_timestamp(at(10, 7, 0));
        append_at(&path, vec![record("2:1", "7")], &bucket).unwrap();

        let entries = read(&path);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].timestamp, "2024-01-01_10-00");
        assert_eq!(entries[1].timestamp, "2024-01-01_10-00");
        assert_eq!(entries[0].data[0].ratio(), 5.0);
        assert_eq!(entries[1].data[0].ratio(), 0.5);
    }

    #[test]
    fn test_round_trip_preserves_values_and_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("buy_d_results.json");

        let written = vec![
            SampleEntry {
                timestamp: "2024-01-01_10-10".to_string(),
                data: vec![record("1:5", "10"), record("3:2", "4")],
            },
            SampleEntry {
                timestamp: "2024-01-01_10-00".to_string(),
                data: vec![],
            },
        ];
        for entry in &written {
            append_at(&path, entry.data.clone(), &entry.timestamp).unwrap();
        }

        assert_eq!(read(&path), written);
    }

    #[test]
    fn test_written_file_is_indented_and_keeps_unicode() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("buy_c_results.json");

        append_at(&path, vec![record("1:5", "10")], "2024-01-01_10-00").unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("[\n    {\n        \"timestamp\""));
        assert!(contents.contains("\"raw_ratio\": \"1:5\""));
    }

    #[test]
    fn test_read_missing_and_corrupt_files() {
        let dir = tempdir().unwrap();
        assert!(read(&dir.path().join("absent.json")).is_empty());

        let path = dir.path().join("broken.json");
        std::fs::write(&path, "[{\"timestamp\": ").unwrap();
        assert!(read(&path).is_empty());
    }

    #[test]
    fn test_append_to_corrupt_file_backs_it_up() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("buy_c_results.json");
        std::fs::write(&path, "not json").unwrap();

        let len = append_at(&path, vec![record("1:5", "10")], "2024-01-01_10-00").unwrap();

        assert_eq!(len, 1);
        let backups: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .flatten()
            .filter(|e| e.file_name().to_string_lossy().contains(".corrupt-"))
            .collect();
        assert_eq!(backups.len(), 1);
        assert_eq!(std::fs::read_to_string(backups[0].path()).unwrap(), "not json");
    }

    #[test]
    fn test_append_keeps_legacy_rows_verbatim() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("buy_c_results.json");
        let legacy = r#"[{"timestamp": "2024-01-01_10-00", "data": [
            {"ratio": "1:5", "count": "10"},
            {"ratio": "", "count": ""},
            {"ratio": "3:", "count": "4"}
        ]}]"#;
        std::fs::write(&path, legacy).unwrap();

        append_at(&path, vec![record("2:1", "7")], "2024-01-01_10-10").unwrap();

        let on_disk: Vec<Value> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let original: Vec<Value> = serde_json::from_str(legacy).unwrap();
        assert_eq!(on_disk.len(), 2);
        assert_eq!(on_disk[0], original[0]);

        let entries = read(&path);
        assert_eq!(entries[0].data, vec![record("1:5", "10")]);
        assert_eq!(entries[1].data, vec![record("2:1", "7")]);
    }

    #[test]
    fn test_append_to_file_with_foreign_elements_backs_it_up() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("buy_c_results.json");
        std::fs::write(&path, r#"[{"when": "yesterday"}]"#).unwrap();

        assert_eq!(append_at(&path, Vec::new(), "2024-01-01_10-00").unwrap(), 1);
        assert_eq!(read(&path).len(), 1);
    }

    #[test]
    fn test_read_raw_ocr_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("buy_c_results.json");
        std::fs::write(
            &path,
            r#"[
                {"timestamp": "2024-01-01_10-00", "data": [
                    {"ratio": "1:5", "count": "10"},
                    {"ratio": "", "count": ""},
                    {"ratio": "3:", "count": "4"},
                    {"ratio": "2:1", "count": "7"},
                    "garbage"
                ]},
                {"timestamp": "2024-01-01_10-10", "data": [{"ratio": "", "count": ""}]}
            ]"#,
        )
        .unwrap();

        let entries = read(&path);

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].data, vec![record("1:5", "10"), record("2:1", "7")]);
        assert!(entries[1].data.is_empty());
    }
}
