//! Typed view over the remote ledger's rows.
//!
//! The worksheet has a three-row banner, the header on row 4 and data from row 5.
//! Headers are resolved once into a [`LedgerLayout`]; everything downstream works
//! with [`TargetRecord`]s and column indices.

use crate::error::ReconcileError;

/// 1-based sheet row holding the column headers.
pub const HEADER_ROW: usize = 4;
/// 1-based sheet row of the first record.
pub const FIRST_DATA_ROW: usize = 5;

pub const TITLE_HEADER: &str = "Title";
pub const ARTIST_HEADER: &str = "Artist";
pub const ALBUM_HEADER: &str = "Album";
pub const ACQUIREMENT_STATUS_HEADER: &str = "Acquirement Status";
pub const TRIAGED_HEADER: &str = "Triaged";
pub const METHOD_ADDED_HEADER: &str = "Method Added";
pub const DATE_ADDED_HEADER: &str = "Date Added";

pub const AUTO_ADDED: &str = "Auto Added";
pub const ACQUIRED: &str = "acquired";
pub const TRIAGED: &str = "triaged";

/// Width of an appended row: blank leading column through Date Added.
pub const ROW_WIDTH: usize = 14;

/// Fixed 1-based column positions used when appending rows. Status columns are
/// looked up by header instead.
pub mod columns {
    pub const TITLE: usize = 2;
    pub const ARTIST: usize = 3;
    pub const ALBUM: usize = 4;
    pub const LINK: usize = 6;
    pub const METHOD_ADDED: usize = 12;
    pub const DATE_ADDED: usize = 14;

    #[cfg(test)]
    pub const ACQUIREMENT_STATUS: usize = 7;
    #[cfg(test)]
    pub const TRIAGED: usize = 10;
}

/// A liked track pulled from the streaming service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedItem {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub uri: String,
}

impl FeedItem {
    /// Public web link for the track, derived from its `spotify:track:<id>` URI.
    pub fn link(&self) -> Option<String> {
        self.uri
            .split(':')
            .nth(2)
            .filter(|id| !id.is_empty())
            .map(|id| format!("https://open.spotify.com/track/{}", id))
    }

    /// Build the full ledger row for this item, stamped with `date_added`.
    pub fn to_ledger_row(&self, date_added: &str) -> Vec<String> {
        let mut row = vec![String::new(); ROW_WIDTH];
        row[columns::TITLE - 1] = self.title.clone();
        row[columns::ARTIST - 1] = self.artist.clone();
        row[columns::ALBUM - 1] = self.album.clone();
        row[columns::LINK - 1] = self.link().unwrap_or_default();
        row[columns::METHOD_ADDED - 1] = AUTO_ADDED.to_string();
        row[columns::DATE_ADDED - 1] = date_added.to_string();
        row
    }
}

/// Format a timestamp the way the ledger's Date Added column expects,
/// e.g. "January 29, 2024 at 01:05PM".
pub fn format_date_added<Tz: chrono::TimeZone>(at: &chrono::DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format("%B %d, %Y at %I:%M%p").to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetRecord {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub acquirement_status: Option<String>,
    pub triaged: Option<String>,
    pub method_added: Option<String>,
    pub date_added: Option<String>,
}

impl TargetRecord {
    pub fn new(title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            ..Default::default()
        }
    }

    /// Neither acquired nor triaged yet, so eligible for local matching.
    pub fn is_unresolved(&self) -> bool {
        let contains = |value: &Option<String>, needle: &str| {
            value
                .as_deref()
                .is_some_and(|v| v.to_lowercase().contains(needle))
        };
        !contains(&self.acquirement_status, ACQUIRED) && !contains(&self.triaged, TRIAGED)
    }

    pub fn is_auto_added(&self) -> bool {
        self.method_added.as_deref() == Some(AUTO_ADDED)
    }

    pub fn key(&self) -> RecordKey {
        RecordKey::new(&self.title, &self.artist)
    }
}

/// Identity of a ledger entry; not unique, duplicates are tolerated.
///
/// Both parts are trimmed, since cells read back from the ledger are trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordKey {
    pub title: String,
    pub artist: String,
}

impl RecordKey {
    pub fn new(title: impl AsRef<str>, artist: impl AsRef<str>) -> Self {
        Self {
            title: title.as_ref().trim().to_string(),
            artist: artist.as_ref().trim().to_string(),
        }
    }

    /// Whether a raw (untrimmed) title and artist pair identifies this key.
    pub fn matches(&self, title: &str, artist: &str) -> bool {
        self.title == title.trim() && self.artist == artist.trim()
    }
}

/// Header name to 0-based column index, resolved once from the header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerLayout {
    headers: Vec<String>,
    title: usize,
    artist: usize,
    album: Option<usize>,
    acquirement_status: Option<usize>,
    triaged: Option<usize>,
    method_added: Option<usize>,
    date_added: Option<usize>,
}

impl LedgerLayout {
    pub fn from_headers(headers: &[String]) -> Result<Self, ReconcileError> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);
        let require = |name: &str| {
            find(name).ok_or_else(|| {
                ReconcileError::schema(format!(
                    "required column '{}' is missing from header row {}",
                    name, HEADER_ROW
                ))
            })
        };

        Ok(Self {
            headers: headers.to_vec(),
            title: require(TITLE_HEADER)?,
            artist: require(ARTIST_HEADER)?,
            album: find(ALBUM_HEADER),
            acquirement_status: find(ACQUIREMENT_STATUS_HEADER),
            triaged: find(TRIAGED_HEADER),
            method_added: find(METHOD_ADDED_HEADER),
            date_added: find(DATE_ADDED_HEADER),
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// 1-based column indices of (Acquirement Status, Triaged), required to commit matches.
    pub fn status_columns(&self) -> Result<(usize, usize), ReconcileError> {
        let missing = |name: &str| {
            ReconcileError::schema(format!("required column '{}' is missing", name))
        };
        let acquirement = self
            .acquirement_status
            .ok_or_else(|| missing(ACQUIREMENT_STATUS_HEADER))?;
        let triaged = self.triaged.ok_or_else(|| missing(TRIAGED_HEADER))?;
        Ok((acquirement + 1, triaged + 1))
    }

    pub fn require_method_added(&self) -> Result<(), ReconcileError> {
        self.method_added.map(|_| ()).ok_or_else(|| {
            ReconcileError::schema(format!(
                "required column '{}' is missing",
                METHOD_ADDED_HEADER
            ))
        })
    }

    pub fn record(&self, row: &[String]) -> TargetRecord {
        let cell = |index: usize| row.get(index).map(|v| v.trim().to_string()).unwrap_or_default();
        let optional = |index: Option<usize>| {
            index
                .and_then(|i| row.get(i))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        TargetRecord {
            title: cell(self.title),
            artist: cell(self.artist),
            album: self.album.map(cell).unwrap_or_default(),
            acquirement_status: optional(self.acquirement_status),
            triaged: optional(self.triaged),
            method_added: optional(self.method_added),
            date_added: optional(self.date_added),
        }
    }
}

/// The ledger split into its layout and records, positions preserved.
#[derive(Debug, Clone)]
pub struct LedgerSnapshot {
    pub layout: LedgerLayout,
    /// Index `i` lives on sheet row `i + FIRST_DATA_ROW`.
    pub records: Vec<TargetRecord>,
    /// Raw data rows, padded to the header width.
    pub rows: Vec<Vec<String>>,
}

impl LedgerSnapshot {
    pub fn from_rows(all_rows: &[Vec<String>]) -> Result<Self, ReconcileError> {
        if all_rows.len() < HEADER_ROW {
            return Err(ReconcileError::schema(format!(
                "ledger has {} rows, expected the header on row {}",
                all_rows.len(),
                HEADER_ROW
            )));
        }

        let layout = LedgerLayout::from_headers(&all_rows[HEADER_ROW - 1])?;
        let width = layout.headers().len();
        let rows: Vec<Vec<String>> = all_rows[HEADER_ROW..]
            .iter()
            .map(|row| {
                let mut row = row.clone();
                if row.len() < width {
                    row.resize(width, String::new());
                }
                row
            })
            .collect();
        let records = rows.iter().map(|row| layout.record(row)).collect();

        Ok(Self {
            layout,
            records,
            rows,
        })
    }

    /// Records still waiting to be found locally, with their ledger positions.
    pub fn unresolved(&self) -> Vec<PositionedRecord> {
        self.records
            .iter()
            .enumerate()
            .filter(|(_, record)| record.is_unresolved())
            .map(|(position, record)| PositionedRecord {
                position,
                record: record.clone(),
            })
            .collect()
    }
}

/// A record together with its offset among the ledger's data rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionedRecord {
    pub position: usize,
    pub record: TargetRecord,
}

impl PositionedRecord {
    /// 1-based sheet row addressed by updates.
    pub fn sheet_row(&self) -> usize {
        self.position + FIRST_DATA_ROW
    }
}
