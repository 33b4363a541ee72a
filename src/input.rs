//! JSON dataset loading
//!
//! Both source datasets are stored as JSON Lines: one JSON object per line,
//! any number of lines per file. All files matching a pattern are decoded in
//! path order and merged into one table with a single inferred schema.

use crate::error::{Error, Result};
use crate::storage::{PathPattern, StorageLocation};
use crate::table::Table;
use serde_json::Value;

/// Decode a JSON Lines document, skipping blank lines
pub fn decode_json_lines(path: &str, body: &[u8]) -> Result<Vec<Value>> {
    let text = std::str::from_utf8(body).map_err(|e| Error::Decode {
        path: path.to_string(),
        line: 0,
        message: format!("not valid UTF-8: {e}"),
    })?;

    let mut records = Vec::new();
    for (line_num, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let value: Value = serde_json::from_str(line).map_err(|e| Error::Decode {
            path: path.to_string(),
            line: line_num + 1,
            message: e.to_string(),
        })?;
        records.push(value);
    }

    Ok(records)
}

/// Load every JSON file matching `pattern` under `location` into one table
///
/// Fails when nothing matches or any file is malformed.
pub async fn read_json_table(location: &StorageLocation, pattern: &str) -> Result<Table> {
    let pattern = PathPattern::new(pattern)?;
    let paths = location.list_matching(&pattern).await?;

    if paths.is_empty() {
        return Err(Error::NoInputFiles {
            pattern: location.display_path(pattern.as_str()),
        });
    }

    let mut records = Vec::new();
    for path in &paths {
        let body = location.read(path).await?;
        let decoded = decode_json_lines(path, &body)?;
        tracing::debug!("Read {} records from {path}", decoded.len());
        records.extend(decoded);
    }

    tracing::info!(
        "Loaded {} records from {} files matching {}",
        records.len(),
        paths.len(),
        location.display_path(pattern.as_str())
    );

    Table::from_json_records(&records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Credentials, StorageOptions};
    use serde_json::json;

    #[test]
    fn test_decode_single_object_file() {
        let body = br#"{"num_songs": 1, "song_id": "SOZCTXZ12AB0182364", "title": "Setanta matins"}"#;
        let records = decode_json_lines("a.json", body).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["song_id"], "SOZCTXZ12AB0182364");
    }

    #[test]
    fn test_decode_multiple_lines_with_blanks() {
        let body = b"{\"page\": \"Home\"}\n\n{\"page\": \"NextSong\"}\n";
        let records = decode_json_lines("events.json", body).unwrap();
        assert_eq!(records, vec![json!({"page": "Home"}), json!({"page": "NextSong"})]);
    }

    #[test]
    fn test_decode_reports_line() {
        let body = b"{\"ok\": 1}\n{broken\n";
        let err = decode_json_lines("events.json", body).unwrap_err();
        match err {
            Error::Decode { path, line, .. } => {
                assert_eq!(path, "events.json");
                assert_eq!(line, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_decode_rejects_invalid_utf8() {
        assert!(decode_json_lines("bad.json", &[0xff, 0xfe]).is_err());
    }

    #[tokio::test]
    async fn test_read_json_table_merges_files_in_path_order() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("log_data/2018/11")).unwrap();
        std::fs::write(
            root.join("log_data/2018/11/2018-11-02-events.json"),
            "{\"n\": 2}\n{\"n\": 3}\n",
        )
        .unwrap();
        std::fs::write(
            root.join("log_data/2018/11/2018-11-01-events.json"),
            "{\"n\": 1, \"extra\": \"x\"}\n",
        )
        .unwrap();

        let location = StorageLocation::open(
            root.to_str().unwrap(),
            &Credentials::new("k", "s"),
            &StorageOptions::default(),
        )
        .unwrap();

        let table = read_json_table(&location, "log_data/*/*/*.json").await.unwrap();
        assert_eq!(table.num_rows(), 3);
        assert_eq!(table.column_names(), vec!["extra", "n"]);
        let rows = table.to_json_rows().unwrap();
        assert_eq!(rows[0]["n"], 1);
        assert_eq!(rows[2]["n"], 3);
    }

    #[tokio::test]
    async fn test_read_json_table_no_files() {
        let dir = tempfile::tempdir().unwrap();
        let location = StorageLocation::open(
            dir.path().to_str().unwrap(),
            &Credentials::new("k", "s"),
            &StorageOptions::default(),
        )
        .unwrap();

        let err = read_json_table(&location, "song_data/A/A/*/*.json")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NoInputFiles { .. }));
    }
}
