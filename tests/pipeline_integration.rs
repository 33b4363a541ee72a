//! Integration tests over a local data lake
//!
//! Tests the full end-to-end flow: JSON files on disk → pipelines → partitioned
//! Parquet tables

use arrow::array::{Array, Int64Array, StringArray};
use arrow::compute::concat_batches;
use arrow::record_batch::RecordBatch;
use clap::Parser;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use sparkify_lake::cli::{Cli, Runner};
use sparkify_lake::pipeline::{self, process_log_data, process_song_data};
use sparkify_lake::{Credentials, Error, Session, SessionConfig};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ============================================================================
// Fixtures
// ============================================================================

const SETANTA_TS: i64 = 1_541_990_258_796;

struct Lake {
    input: TempDir,
    output: TempDir,
}

impl Lake {
    fn new() -> Self {
        Self {
            input: tempfile::tempdir().unwrap(),
            output: tempfile::tempdir().unwrap(),
        }
    }

    fn write_json(&self, relative: &str, records: &[Value]) {
        let path = self.input.path().join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        let lines: Vec<String> = records.iter().map(Value::to_string).collect();
        std::fs::write(path, lines.join("\n")).unwrap();
    }

    fn session(&self) -> Session {
        let config = SessionConfig::new(
            self.input.path().to_str().unwrap(),
            self.output.path().to_str().unwrap(),
        );
        Session::new(&Credentials::new("key", "secret"), &config).unwrap()
    }

    fn out(&self, relative: &str) -> PathBuf {
        self.output.path().join(relative)
    }

    /// Every output file, keyed by its path relative to the output root
    fn snapshot(&self) -> BTreeMap<String, Vec<u8>> {
        let mut files = BTreeMap::new();
        collect_files(self.output.path(), self.output.path(), &mut files);
        files
    }
}

fn collect_files(root: &Path, dir: &Path, files: &mut BTreeMap<String, Vec<u8>>) {
    for entry in std::fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        if path.is_dir() {
            collect_files(root, &path, files);
        } else {
            let relative = path.strip_prefix(root).unwrap().to_string_lossy().to_string();
            files.insert(relative, std::fs::read(&path).unwrap());
        }
    }
}

fn read_parquet(path: &Path) -> RecordBatch {
    let file = std::fs::File::open(path).unwrap();
    let builder = ParquetRecordBatchReaderBuilder::try_new(file).unwrap();
    let schema = builder.schema().clone();
    let batches: Vec<RecordBatch> = builder.build().unwrap().map(|b| b.unwrap()).collect();
    concat_batches(&schema, &batches).unwrap()
}

fn strings(batch: &RecordBatch, column: &str) -> Vec<String> {
    let col = batch.column_by_name(column).unwrap();
    let col = arrow::compute::cast(col, &arrow::datatypes::DataType::Utf8).unwrap();
    let arr = col.as_any().downcast_ref::<StringArray>().unwrap();
    arr.iter().map(|v| v.unwrap_or_default().to_string()).collect()
}

fn column_names(batch: &RecordBatch) -> Vec<String> {
    batch
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect()
}

fn song(song_id: &str, title: &str, artist_id: &str, year: i64, duration: f64) -> Value {
    json!({
        "num_songs": 1,
        "artist_id": artist_id,
        "artist_latitude": null,
        "artist_longitude": null,
        "artist_location": "",
        "artist_name": "Jonathan King",
        "song_id": song_id,
        "title": title,
        "duration": duration,
        "year": year
    })
}

fn event(page: &str, user: &str, song: Option<&str>, ts: i64) -> Value {
    json!({
        "artist": song.map(|_| "Jonathan King"),
        "auth": "Logged In",
        "firstName": "Sylvie",
        "gender": "F",
        "itemInSession": 0,
        "lastName": "Cruz",
        "length": 269.58,
        "level": "free",
        "location": "Washington-Arlington-Alexandria, DC-VA-MD-WV",
        "method": "PUT",
        "page": page,
        "registration": 1_540_266_185_796_i64,
        "sessionId": 345,
        "song": song,
        "status": 200,
        "ts": ts,
        "userAgent": "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_9_4)",
        "userId": user
    })
}

fn setanta_lake() -> Lake {
    let lake = Lake::new();
    lake.write_json(
        "song_data/A/A/A/TRAAAAW128F429D538.json",
        &[song(
            "SOZCTXZ12AB0182364",
            "Setanta matins",
            "AR5KOSW1187FB35FF4",
            0,
            269.58,
        )],
    );
    lake.write_json(
        "log_data/2018/11/2018-11-12-events.json",
        &[
            event("Home", "26", None, SETANTA_TS - 60_000),
            event("NextSong", "10", Some("Setanta matins"), SETANTA_TS),
        ],
    );
    lake
}

// ============================================================================
// End-to-end
// ============================================================================

#[tokio::test]
async fn test_single_song_single_play() {
    let lake = setanta_lake();
    let report = pipeline::run(&lake.session()).await.unwrap();
    assert_eq!(report.tables.len(), 5);

    // year is the song's release year, month the event's month
    let songplays = read_parquet(&lake.out(
        "songplays.parquet/year=0/month=11/part-00000.snappy.parquet",
    ));
    assert_eq!(songplays.num_rows(), 1);
    assert_eq!(
        column_names(&songplays),
        vec![
            "ts",
            "user_id",
            "level",
            "song_id",
            "artist_id",
            "session_id",
            "location",
            "user_agent",
            "songplay_id"
        ]
    );
    assert_eq!(strings(&songplays, "song_id"), vec!["SOZCTXZ12AB0182364"]);
    assert_eq!(strings(&songplays, "user_id"), vec!["10"]);
    assert_eq!(strings(&songplays, "artist_id"), vec!["AR5KOSW1187FB35FF4"]);

    let ids = songplays.column_by_name("songplay_id").unwrap();
    let ids = ids.as_any().downcast_ref::<Int64Array>().unwrap();
    assert_eq!(ids.null_count(), 0);
    assert_eq!(ids.value(0), 0);

    assert!(lake.out("songplays.parquet/_SUCCESS").exists());
}

#[tokio::test]
async fn test_songs_and_artists_layout() {
    let lake = setanta_lake();
    process_song_data(&lake.session()).await.unwrap();

    let songs = read_parquet(&lake.out(
        "songs.parquet/year=0/artist_id=AR5KOSW1187FB35FF4/part-00000.snappy.parquet",
    ));
    // Partition columns live in the directory names only
    assert_eq!(column_names(&songs), vec!["song_id", "title", "duration"]);
    assert_eq!(strings(&songs, "title"), vec!["Setanta matins"]);

    let artists = read_parquet(&lake.out("artists.parquet/part-00000.snappy.parquet"));
    assert_eq!(artists.num_rows(), 1);
    assert_eq!(
        column_names(&artists),
        vec![
            "artist_id",
            "artist_name",
            "artist_location",
            "artist_latitude",
            "artist_longitude"
        ]
    );
}

#[tokio::test]
async fn test_time_table_row() {
    let lake = setanta_lake();
    process_log_data(&lake.session()).await.unwrap();

    let time = read_parquet(&lake.out("time.parquet/year=2018/month=11/part-00000.snappy.parquet"));
    assert_eq!(column_names(&time), vec!["start_time", "hour", "day", "week"]);
    assert_eq!(strings(&time, "start_time"), vec!["2018-11-12 02:37:38.796000"]);
    assert_eq!(strings(&time, "hour"), vec!["2"]);
    assert_eq!(strings(&time, "day"), vec!["12"]);
    assert_eq!(strings(&time, "week"), vec!["46"]);
}

// ============================================================================
// Join semantics
// ============================================================================

#[tokio::test]
async fn test_duplicate_titles_fan_out() {
    let lake = Lake::new();
    lake.write_json(
        "song_data/A/A/B/TRAABXG128F9318EBD.json",
        &[song("SOAAAAA12A8C13B1A1", "Same Title", "ARAAAAA1187B9B1A1A", 1990, 180.0)],
    );
    lake.write_json(
        "song_data/A/A/C/TRAACCG128F92E8A55.json",
        &[song("SOBBBBB12A8C13B1B2", "Same Title", "ARBBBBB1187B9B1B2B", 2001, 200.0)],
    );
    lake.write_json(
        "log_data/2018/11/2018-11-12-events.json",
        &[event("NextSong", "10", Some("Same Title"), SETANTA_TS)],
    );

    let report = pipeline::run(&lake.session()).await.unwrap();
    let summary = report.table("songplays.parquet").unwrap();
    assert_eq!(summary.rows, 2);
    assert_eq!(
        summary.partitions,
        vec!["year=1990/month=11".to_string(), "year=2001/month=11".to_string()]
    );

    let first = read_parquet(&lake.out(
        "songplays.parquet/year=1990/month=11/part-00000.snappy.parquet",
    ));
    assert_eq!(strings(&first, "song_id"), vec!["SOAAAAA12A8C13B1A1"]);
    assert_eq!(strings(&first, "songplay_id"), vec!["0"]);

    let second = read_parquet(&lake.out(
        "songplays.parquet/year=2001/month=11/part-00000.snappy.parquet",
    ));
    assert_eq!(strings(&second, "song_id"), vec!["SOBBBBB12A8C13B1B2"]);
    assert_eq!(strings(&second, "songplay_id"), vec!["1"]);
}

#[tokio::test]
async fn test_unmatched_plays_give_empty_songplays() {
    let lake = Lake::new();
    lake.write_json(
        "song_data/A/A/A/TRAAAAW128F429D538.json",
        &[song("S1", "Known", "A1", 2000, 100.0)],
    );
    lake.write_json(
        "log_data/2018/11/2018-11-12-events.json",
        &[event("NextSong", "10", Some("Unknown"), SETANTA_TS)],
    );

    let report = pipeline::run(&lake.session()).await.unwrap();
    let songplays = report.table("songplays.parquet").unwrap();
    assert_eq!(songplays.rows, 0);
    assert!(songplays.partitions.is_empty());
    assert!(lake.out("songplays.parquet/_SUCCESS").exists());
}

// ============================================================================
// Filtering and deduplication
// ============================================================================

#[tokio::test]
async fn test_only_next_song_events_reach_outputs() {
    let lake = Lake::new();
    lake.write_json(
        "song_data/A/A/A/TRAAAAW128F429D538.json",
        &[song("S1", "One", "A1", 2000, 100.0)],
    );
    lake.write_json(
        "log_data/2018/11/2018-11-12-events.json",
        &[
            event("Home", "1", None, 1_541_990_000_000),
            event("NextSong", "2", Some("One"), 1_541_990_100_000),
            event("Logout", "3", None, 1_541_990_200_000),
        ],
    );
    lake.write_json(
        "log_data/2018/12/2018-12-01-events.json",
        &[event("Settings", "4", None, 1_543_622_400_000)],
    );

    let report = pipeline::run(&lake.session()).await.unwrap();

    let users = read_parquet(&lake.out("users.parquet/part-00000.snappy.parquet"));
    assert_eq!(strings(&users, "userId"), vec!["2"]);

    let time = report.table("time.parquet").unwrap();
    assert_eq!(time.rows, 1);
    assert_eq!(time.partitions, vec!["year=2018/month=11".to_string()]);
    assert!(!lake.out("time.parquet/year=2018/month=12").exists());
}

#[tokio::test]
async fn test_dedup_across_files_keeps_first() {
    let lake = Lake::new();
    lake.write_json(
        "song_data/A/A/A/TRAAAAA.json",
        &[song("S1", "First", "A1", 2000, 100.0)],
    );
    lake.write_json(
        "song_data/A/A/B/TRAAB.json",
        &[
            song("S1", "Second", "A1", 2000, 100.0),
            song("S2", "Other", "A1", 2000, 120.0),
        ],
    );

    let summaries = process_song_data(&lake.session()).await.unwrap();
    assert_eq!(summaries[0].rows, 2);
    assert_eq!(summaries[1].rows, 1);

    let songs = read_parquet(&lake.out(
        "songs.parquet/year=2000/artist_id=A1/part-00000.snappy.parquet",
    ));
    assert_eq!(strings(&songs, "song_id"), vec!["S1", "S2"]);
    assert_eq!(strings(&songs, "title"), vec!["First", "Other"]);
}

#[tokio::test]
async fn test_users_one_row_per_user() {
    let lake = setanta_lake();
    lake.write_json(
        "log_data/2018/11/2018-11-13-events.json",
        &[
            event("NextSong", "10", Some("Setanta matins"), SETANTA_TS + 86_400_000),
            event("NextSong", "11", Some("Setanta matins"), SETANTA_TS + 90_000_000),
        ],
    );

    process_log_data(&lake.session()).await.unwrap();
    let users = read_parquet(&lake.out("users.parquet/part-00000.snappy.parquet"));
    assert_eq!(strings(&users, "userId"), vec!["10", "11"]);
}

// ============================================================================
// Overwrite and determinism
// ============================================================================

#[tokio::test]
async fn test_rerun_is_byte_identical() {
    let lake = setanta_lake();
    pipeline::run(&lake.session()).await.unwrap();
    let first = lake.snapshot();

    pipeline::run(&lake.session()).await.unwrap();
    let second = lake.snapshot();

    assert_eq!(
        first.keys().collect::<Vec<_>>(),
        second.keys().collect::<Vec<_>>()
    );
    assert!(first == second, "output bytes differ between runs");
}

#[tokio::test]
async fn test_overwrite_drops_stale_partitions() {
    let lake = setanta_lake();
    pipeline::run(&lake.session()).await.unwrap();

    let stale = lake.out("time.parquet/year=1999/month=1");
    std::fs::create_dir_all(&stale).unwrap();
    std::fs::write(stale.join("part-00000.snappy.parquet"), b"old").unwrap();

    pipeline::run(&lake.session()).await.unwrap();
    assert!(!stale.join("part-00000.snappy.parquet").exists());
    assert!(lake
        .out("time.parquet/year=2018/month=11/part-00000.snappy.parquet")
        .exists());
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_missing_song_data_is_fatal() {
    let lake = Lake::new();
    lake.write_json(
        "log_data/2018/11/2018-11-12-events.json",
        &[event("NextSong", "10", Some("One"), SETANTA_TS)],
    );

    let err = pipeline::run(&lake.session()).await.unwrap_err();
    assert!(matches!(err, Error::NoInputFiles { .. }));
    assert!(!lake.out("songs.parquet").exists());
}

#[tokio::test]
async fn test_files_outside_pattern_are_ignored() {
    let lake = Lake::new();
    // One directory level short of song_data/A/A/*/*.json
    lake.write_json("song_data/A/A/TRAAAAW.json", &[song("S1", "One", "A1", 2000, 1.0)]);
    lake.write_json("song_data/B/A/A/TRBAA.json", &[song("S2", "Two", "A2", 2000, 1.0)]);

    let err = process_song_data(&lake.session()).await.unwrap_err();
    assert!(matches!(err, Error::NoInputFiles { .. }));
}

#[tokio::test]
async fn test_malformed_json_is_fatal() {
    let lake = setanta_lake();
    let path = lake.input.path().join("log_data/2018/11/2018-11-14-events.json");
    std::fs::write(path, "{\"page\": \"NextSong\"\n").unwrap();

    let err = process_log_data(&lake.session()).await.unwrap_err();
    assert!(matches!(err, Error::Decode { line: 1, .. }));
}

// ============================================================================
// CLI
// ============================================================================

#[tokio::test]
async fn test_runner_with_config_file() {
    let lake = setanta_lake();
    let cfg = lake.input.path().join("dl.cfg");
    std::fs::write(
        &cfg,
        format!(
            "[KEYS]\nAWS_ACCESS_KEY_ID = \"key\"\nAWS_SECRET_ACCESS_KEY = \"secret\"\n\n\
             [PATHS]\nINPUT_DATA = \"{}\"\nOUTPUT_DATA = \"{}\"\n",
            lake.input.path().display(),
            lake.output.path().display()
        ),
    )
    .unwrap();

    let cli = Cli::try_parse_from(["sparkify-lake", "--config", cfg.to_str().unwrap()]).unwrap();
    Runner::new(cli).run().await.unwrap();

    for table in [
        "songs.parquet",
        "artists.parquet",
        "users.parquet",
        "time.parquet",
        "songplays.parquet",
    ] {
        assert!(lake.out(table).join("_SUCCESS").exists(), "{table} missing");
    }
}
