use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use umya_spreadsheet::{Spreadsheet, Worksheet};

use crate::error::ReconcileError;
use crate::ledger::{ARTIST_HEADER, RecordKey, TITLE_HEADER};
use crate::ports::mirror::LocalMirror;

const WORKSHEET_NAME: &str = "Music Saved Tracks";
const HEADER_ROW: u32 = 1;

/// Local mirror of the ledger as an `.xlsx` workbook: headers on row 1, records below.
#[derive(Debug, Clone)]
pub struct WorkbookMirror {
    path: PathBuf,
}

impl WorkbookMirror {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&self) -> Result<Spreadsheet, ReconcileError> {
        umya_spreadsheet::reader::xlsx::read(&self.path)
            .map_err(|e| self.error("read mirror", e))
    }

    fn save(&self, book: &Spreadsheet) -> Result<(), ReconcileError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| self.error("create directory", e))?;
        }
        umya_spreadsheet::writer::xlsx::write(book, &self.path)
            .map_err(|e| self.error("write mirror", e))
    }

    fn error(&self, operation: &str, e: impl std::fmt::Display) -> ReconcileError {
        ReconcileError::Filesystem {
            operation: operation.to_string(),
            path: self.path.display().to_string(),
            error_message: e.to_string(),
        }
    }

    fn worksheet<'b>(&self, book: &'b mut Spreadsheet) -> Result<&'b mut Worksheet, ReconcileError> {
        book.get_sheet_mut(&0)
            .ok_or_else(|| self.error("open worksheet", "workbook has no worksheets"))
    }

    fn try_append_row(&self, row: &[String]) -> Result<(), ReconcileError> {
        let mut book = self.open()?;
        let sheet = self.worksheet(&mut book)?;
        let next = sheet.get_highest_row().max(HEADER_ROW) + 1;
        write_row(sheet, next, row);
        self.save(&book)
    }

    fn try_update_row(
        &self,
        key: &RecordKey,
        updates: &BTreeMap<String, String>,
    ) -> Result<bool, ReconcileError> {
        let mut book = self.open()?;
        let sheet = self.worksheet(&mut book)?;

        let headers = read_row(sheet, HEADER_ROW, sheet.get_highest_column());
        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .map(|index| index as u32 + 1)
                .ok_or_else(|| {
                    ReconcileError::schema(format!(
                        "column '{}' is missing in {}",
                        name,
                        self.path.display()
                    ))
                })
        };
        let title_column = column(TITLE_HEADER)?;
        let artist_column = column(ARTIST_HEADER)?;
        let update_columns = updates
            .iter()
            .map(|(header, value)| -> Result<(u32, String), ReconcileError> {
                Ok((column(header.as_str())?, value.clone()))
            })
            .collect::<Result<Vec<_>, ReconcileError>>()?;

        let Some(row) = (HEADER_ROW + 1..=sheet.get_highest_row()).find(|&row| {
            key.matches(
                &sheet.get_value((title_column, row)),
                &sheet.get_value((artist_column, row)),
            )
        }) else {
            return Ok(false);
        };
        for (column, value) in update_columns {
            sheet.get_cell_mut((column, row)).set_value_string(value);
        }

        self.save(&book)?;
        Ok(true)
    }
}

/// Cells are always written as text so values like "007" survive a round trip.
fn write_row(sheet: &mut Worksheet, row: u32, cells: &[String]) {
    for (index, value) in cells.iter().enumerate() {
        sheet
            .get_cell_mut((index as u32 + 1, row))
            .set_value_string(value.clone());
    }
}

fn read_row(sheet: &Worksheet, row: u32, width: u32) -> Vec<String> {
    (1..=width).map(|column| sheet.get_value((column, row))).collect()
}

impl LocalMirror for WorkbookMirror {
    fn reset(&self, headers: &[String], rows: &[Vec<String>]) -> Result<(), ReconcileError> {
        tracing::info!("Resetting {} from the ledger", self.path.display());
        let mut book = umya_spreadsheet::new_file();
        let sheet = self.worksheet(&mut book)?;
        sheet.set_name(WORKSHEET_NAME);

        write_row(sheet, HEADER_ROW, headers);
        for (offset, row) in rows.iter().enumerate() {
            let mut row = row.clone();
            if row.len() < headers.len() {
                row.resize(headers.len(), String::new());
            }
            write_row(sheet, HEADER_ROW + 1 + offset as u32, &row);
        }
        if rows.is_empty() {
            tracing::info!("The ledger has no data below the header row; the mirror only has headers");
        }

        self.save(&book)
    }

    fn append_row(&self, row: &[String]) {
        if !self.path.exists() {
            tracing::warn!(
                "{} not found. Run `reset-mirror` first to create it",
                self.path.display()
            );
            return;
        }

        match self.try_append_row(row) {
            Ok(()) => tracing::debug!("Appended new row to {}", self.path.display()),
            Err(e) => tracing::error!("Failed to append a row to the mirror: {}", e),
        }
    }

    fn update_row(&self, key: &RecordKey, updates: &BTreeMap<String, String>) {
        if !self.path.exists() {
            tracing::warn!("{} not found. Cannot update", self.path.display());
            return;
        }

        match self.try_update_row(key, updates) {
            Ok(true) => tracing::debug!("Updated row for '{}' in {}", key.title, self.path.display()),
            Ok(false) => tracing::warn!(
                "Could not find row for '{}' by '{}' in {}",
                key.title,
                key.artist,
                self.path.display()
            ),
            Err(e) => tracing::error!("Failed to update a row in the mirror: {}", e),
        }
    }
}
