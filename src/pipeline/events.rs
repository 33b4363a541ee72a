//! Event pipeline: `users`, `time` and `songplays`

use super::{LOG_DATA_PATTERN, SONGPLAYS_TABLE, SONG_DATA_PATTERN, TIME_TABLE, USERS_TABLE};
use crate::error::Result;
use crate::output::WriteSummary;
use crate::session::Session;
use crate::table::Table;
use crate::timestamp::TimeColumns;
use arrow::array::{ArrayRef, Int64Array};
use std::sync::Arc;

/// Page value marking an actual play
pub const NEXT_SONG_PAGE: &str = "NextSong";

/// Columns of the `users` table
pub const USER_COLUMNS: [&str; 5] = ["userId", "firstName", "lastName", "gender", "level"];

/// Partition columns of `time`
pub const TIME_PARTITION: [&str; 2] = ["year", "month"];

/// `(source, output)` column mapping of the `songplays` table
///
/// `year` is the matched song's release year from the catalog side of the
/// join; `month` is the event's calendar month.
pub const SONGPLAY_COLUMNS: [(&str, &str); 11] = [
    ("ts", "ts"),
    ("userId", "user_id"),
    ("level", "level"),
    ("song_id", "song_id"),
    ("artist_id", "artist_id"),
    ("sessionId", "session_id"),
    ("location", "location"),
    ("userAgent", "user_agent"),
    ("year", "year"),
    ("start_month", "month"),
    ("songplay_id", "songplay_id"),
];

/// Partition columns of `songplays`
pub const SONGPLAYS_PARTITION: [&str; 2] = ["year", "month"];

/// Play events with their derived time columns attached
#[derive(Debug, Clone)]
pub struct Plays {
    /// NextSong rows plus `timestamp`, `start_time` and `start_month`
    pub events: Table,
    /// Time columns aligned row for row with `events`
    pub time: TimeColumns,
}

/// Keep only play events
pub fn filter_plays(events: &Table) -> Result<Table> {
    events.filter_eq("page", NEXT_SONG_PAGE)
}

/// One row per userId
pub fn users_table(plays: &Table) -> Result<Table> {
    plays.select(&USER_COLUMNS)?.drop_duplicates(&["userId"])
}

/// Derive time columns from `ts` and attach the ones songplays need
pub fn with_time_columns(plays: &Table) -> Result<Plays> {
    let time = TimeColumns::from_ts(plays.column("ts")?)?;
    let events = plays
        .with_column("timestamp", Arc::clone(&time.epoch_seconds))?
        .with_column("start_time", Arc::clone(&time.start_time))?
        .with_column("start_month", Arc::clone(&time.month))?;
    Ok(Plays { events, time })
}

/// One row per start_time
pub fn time_table(time: &TimeColumns) -> Result<Table> {
    Table::from_columns(vec![
        ("start_time", Arc::clone(&time.start_time)),
        ("hour", Arc::clone(&time.hour)),
        ("day", Arc::clone(&time.day)),
        ("week", Arc::clone(&time.week)),
        ("month", Arc::clone(&time.month)),
        ("year", Arc::clone(&time.year)),
    ])?
    .drop_duplicates(&["start_time"])
}

/// Join plays to the catalog by title and shape the result as songplays
///
/// Matching is on title alone, so a title shared by several catalog songs
/// yields one songplay per song.
pub fn songplays_table(plays: &Table, catalog: &Table) -> Result<Table> {
    let joined = plays.inner_join(catalog, "song", "title")?;

    let ids: ArrayRef = Arc::new(Int64Array::from_iter_values(0..joined.num_rows() as i64));
    joined
        .with_column("songplay_id", ids)?
        .select_as(&SONGPLAY_COLUMNS)
}

/// Load the event logs and write `users`, `time` and `songplays`
pub async fn process_log_data(session: &Session) -> Result<Vec<WriteSummary>> {
    let events = session.read_json(LOG_DATA_PATTERN).await?;
    let plays = filter_plays(&events)?;
    tracing::info!(
        "Kept {} of {} events with page={NEXT_SONG_PAGE}",
        plays.num_rows(),
        events.num_rows()
    );

    let users = users_table(&plays)?;
    let users_summary = session.write_table(USERS_TABLE, &users, &[]).await?;

    let plays = with_time_columns(&plays)?;
    let time = time_table(&plays.time)?;
    let time_summary = session
        .write_table(TIME_TABLE, &time, &TIME_PARTITION)
        .await?;

    // Fresh read of the catalog for the join
    let catalog = session.read_json(SONG_DATA_PATTERN).await?;
    let songplays = songplays_table(&plays.events, &catalog)?;
    if songplays.is_empty() {
        tracing::warn!(
            "No play matched a catalog title; {} will be empty",
            SONGPLAYS_TABLE
        );
    } else {
        tracing::info!(
            "Matched {} songplays from {} plays",
            songplays.num_rows(),
            plays.events.num_rows()
        );
    }
    let songplays_summary = session
        .write_table(SONGPLAYS_TABLE, &songplays, &SONGPLAYS_PARTITION)
        .await?;

    Ok(vec![users_summary, time_summary, songplays_summary])
}
