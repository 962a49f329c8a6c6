use crate::ledger::{FeedItem, PositionedRecord, TargetRecord};

pub const LEDGER_HEADERS: [&str; 14] = [
    "",
    "Title",
    "Artist",
    "Album",
    "Art",
    "Link",
    "Acquirement Status",
    "Quality",
    "",
    "Triaged",
    "Notes",
    "Method Added",
    "Torrent Links",
    "Date Added",
];

pub fn row(cells: &[&str]) -> Vec<String> {
    cells.iter().map(|c| c.to_string()).collect()
}

/// A full worksheet: three banner rows, the header row, then `data`.
pub fn ledger_rows(data: &[Vec<String>]) -> Vec<Vec<String>> {
    let mut rows = vec![
        row(&["Music Saved Tracks"]),
        row(&[]),
        row(&[]),
        row(&LEDGER_HEADERS),
    ];
    rows.extend(data.iter().cloned());
    rows
}

pub fn feed_item(title: &str, artist: &str) -> FeedItem {
    FeedItem {
        title: title.to_string(),
        artist: artist.to_string(),
        album: format!("{} album", artist),
        uri: format!("spotify:track:{}", title.to_lowercase().replace(' ', "")),
    }
}

pub fn auto_added_row(title: &str, artist: &str) -> Vec<String> {
    feed_item(title, artist).to_ledger_row("January 29, 2024 at 01:05PM")
}

pub fn positioned(position: usize, title: &str, artist: &str) -> PositionedRecord {
    PositionedRecord {
        position,
        record: TargetRecord::new(title, artist),
    }
}
