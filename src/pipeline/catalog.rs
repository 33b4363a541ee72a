//! Catalog pipeline: `songs` and `artists`

use super::{ARTISTS_TABLE, SONGS_TABLE, SONG_DATA_PATTERN};
use crate::error::Result;
use crate::output::WriteSummary;
use crate::session::Session;
use crate::table::Table;

/// Columns of the `songs` table
pub const SONG_COLUMNS: [&str; 5] = ["song_id", "title", "artist_id", "year", "duration"];

/// Columns of the `artists` table
pub const ARTIST_COLUMNS: [&str; 5] = [
    "artist_id",
    "artist_name",
    "artist_location",
    "artist_latitude",
    "artist_longitude",
];

/// Partition columns of the `songs` table
pub const SONGS_PARTITION: [&str; 2] = ["year", "artist_id"];

/// One row per song_id
pub fn songs_table(catalog: &Table) -> Result<Table> {
    catalog.select(&SONG_COLUMNS)?.drop_duplicates(&["song_id"])
}

/// One row per artist_id
pub fn artists_table(catalog: &Table) -> Result<Table> {
    catalog.select(&ARTIST_COLUMNS)?.drop_duplicates(&["artist_id"])
}

/// Load the song catalog and write `songs` and `artists`
pub async fn process_song_data(session: &Session) -> Result<Vec<WriteSummary>> {
    let catalog = session.read_json(SONG_DATA_PATTERN).await?;

    let songs = songs_table(&catalog)?;
    let songs_summary = session
        .write_table(SONGS_TABLE, &songs, &SONGS_PARTITION)
        .await?;

    let artists = artists_table(&catalog)?;
    let artists_summary = session.write_table(ARTISTS_TABLE, &artists, &[]).await?;

    Ok(vec![songs_summary, artists_summary])
}
