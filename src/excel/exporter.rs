//! Table writer - frames to Excel worksheets

use crate::error::{StatError, StatResult};
use crate::types::{Cell, Frame, IndexKey};
use colored::Colorize;
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Tables handed to [`TableWriter`]
#[derive(Debug, Clone)]
pub enum Tables {
    Single(Frame),
    Sequence(Vec<Frame>),
    /// Sheet name -> table, in order
    Named(Vec<(String, Frame)>),
}

impl From<Frame> for Tables {
    fn from(frame: Frame) -> Self {
        Tables::Single(frame)
    }
}

impl From<Vec<Frame>> for Tables {
    fn from(frames: Vec<Frame>) -> Self {
        Tables::Sequence(frames)
    }
}

impl From<Vec<(String, Frame)>> for Tables {
    fn from(named: Vec<(String, Frame)>) -> Self {
        Tables::Named(named)
    }
}

/// Worksheet names for [`TableWriter`]
#[derive(Debug, Clone, PartialEq)]
pub enum SheetNames {
    One(String),
    Many(Vec<String>),
}

impl From<&str> for SheetNames {
    fn from(name: &str) -> Self {
        SheetNames::One(name.to_string())
    }
}

impl From<String> for SheetNames {
    fn from(name: String) -> Self {
        SheetNames::One(name)
    }
}

impl From<Vec<String>> for SheetNames {
    fn from(names: Vec<String>) -> Self {
        SheetNames::Many(names)
    }
}

/// Result of a best-effort write
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOutcome {
    Written {
        path: PathBuf,
        /// Cells that could not be written and were left blank
        skipped_cells: usize,
    },
    /// The file could not be created, e.g. because it is open in Excel
    Skipped { path: PathBuf, reason: String },
}

impl WriteOutcome {
    pub fn is_written(&self) -> bool {
        matches!(self, WriteOutcome::Written { .. })
    }

    pub fn path(&self) -> &Path {
        match self {
            WriteOutcome::Written { path, .. } | WriteOutcome::Skipped { path, .. } => path,
        }
    }
}

/// Writes one worksheet per table.
///
/// Row 1 holds the key column name and the column names; each following row
/// holds a key and its cells. Missing cells are left blank.
#[derive(Debug, Clone)]
pub struct TableWriter {
    tables: Tables,
    sheet_names: Option<SheetNames>,
}

impl TableWriter {
    pub fn new(tables: impl Into<Tables>) -> Self {
        Self {
            tables: tables.into(),
            sheet_names: None,
        }
    }

    pub fn with_sheet_names(mut self, names: impl Into<SheetNames>) -> Self {
        self.sheet_names = Some(names.into());
        self
    }

    /// Write the workbook.
    ///
    /// Failing to create the file is reported and returned as
    /// [`WriteOutcome::Skipped`] instead of an error, so a batch of exports
    /// carries on past a workbook that is open elsewhere.
    pub fn write(&self, path: &Path) -> StatResult<WriteOutcome> {
        let mut workbook = Workbook::new();
        let sheets = self.plan_sheets();

        for (name, frame) in &sheets {
            let worksheet = workbook.add_worksheet();
            if let Some(name) = name {
                worksheet.set_name(name).map_err(|e| {
                    StatError::Write(format!("Invalid worksheet name '{}': {}", name, e))
                })?;
            }
            write_frame(worksheet, frame)?;
        }

        let outcome = save_workbook(&mut workbook, path, || {
            format!(
                "Could not write to Excel. Check that the worksheet with this file path is not in use. {}",
                path.display()
            )
        })?;
        if outcome.is_written() {
            info!(path = %path.display(), sheets = sheets.len(), "wrote workbook");
        }
        Ok(outcome)
    }

    /// Pair each table with its worksheet name; `None` keeps the default name
    fn plan_sheets(&self) -> Vec<(Option<String>, &Frame)> {
        match (&self.tables, &self.sheet_names) {
            (Tables::Single(frame), None) => vec![(None, frame)],
            (Tables::Single(frame), Some(SheetNames::One(name))) => {
                vec![(Some(name.clone()), frame)]
            }
            (Tables::Single(frame), Some(SheetNames::Many(names))) => {
                vec![(names.first().cloned(), frame)]
            }
            (Tables::Sequence(frames), None) => frames.iter().map(|f| (None, f)).collect(),
            (Tables::Sequence(frames), Some(SheetNames::One(name))) => frames
                .first()
                .map(|f| vec![(Some(name.clone()), f)])
                .unwrap_or_default(),
            (Tables::Sequence(frames), Some(SheetNames::Many(names))) => names
                .iter()
                .zip(frames)
                .map(|(name, f)| (Some(name.clone()), f))
                .collect(),
            (Tables::Named(named), names) => {
                if names.is_some() {
                    warn!("sheet names ignored: tables already carry their own names");
                }
                named.iter().map(|(name, f)| (Some(name.clone()), f)).collect()
            }
        }
    }
}

fn write_frame(worksheet: &mut Worksheet, frame: &Frame) -> StatResult<()> {
    worksheet
        .write_string(0, 0, &frame.index_name)
        .map_err(|e| StatError::Write(format!("Failed to write header: {}", e)))?;
    for (col_idx, name) in frame.columns.iter().enumerate() {
        worksheet
            .write_string(0, sheet_col(col_idx, 1)?, name)
            .map_err(|e| StatError::Write(format!("Failed to write header: {}", e)))?;
    }

    for (row_idx, (key, cells)) in frame.index.iter().zip(&frame.rows).enumerate() {
        let row = sheet_row(row_idx, 1)?;
        write_key(worksheet, row, 0, key)?;
        for (col_idx, cell) in cells.iter().enumerate() {
            write_cell(worksheet, row, sheet_col(col_idx, 1)?, cell, None)?;
        }
    }
    Ok(())
}

/// Worksheet row of the table row at `position`, placed `offset` rows down
pub(crate) fn sheet_row(position: usize, offset: u32) -> StatResult<u32> {
    u32::try_from(position)
        .ok()
        .and_then(|row| row.checked_add(offset))
        .ok_or_else(|| StatError::Write(format!("Row {} does not fit in a worksheet", position)))
}

/// Worksheet column of the table column at `position`, placed `offset` columns right
pub(crate) fn sheet_col(position: usize, offset: u16) -> StatResult<u16> {
    u16::try_from(position)
        .ok()
        .and_then(|col| col.checked_add(offset))
        .ok_or_else(|| {
            StatError::Write(format!("Column {} does not fit in a worksheet", position))
        })
}

pub(crate) fn write_key(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    key: &IndexKey,
) -> StatResult<()> {
    match key {
        IndexKey::Int(i) => worksheet.write_number(row, col, *i as f64),
        IndexKey::Text(s) => worksheet.write_string(row, col, s),
    }
    .map_err(|e| StatError::Write(format!("Failed to write row key '{}': {}", key, e)))?;
    Ok(())
}

/// Write a single cell; missing values, blank text and non-finite numbers stay empty
pub(crate) fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    cell: &Cell,
    format: Option<&Format>,
) -> StatResult<()> {
    let result = match (cell, format) {
        (Cell::Number(n), _) if !n.is_finite() => return Ok(()),
        (Cell::Number(n), Some(format)) => worksheet.write_number_with_format(row, col, *n, format),
        (Cell::Number(n), None) => worksheet.write_number(row, col, *n),
        (Cell::Text(s), _) if s.is_empty() => return Ok(()),
        (Cell::Text(s), _) => worksheet.write_string(row, col, s),
        (Cell::Missing, _) => return Ok(()),
    };
    result.map_err(|e| StatError::Write(format!("Failed to write cell ({}, {}): {}", row, col, e)))?;
    Ok(())
}

/// Save `workbook`, turning file-creation failures into a reported skip
pub(crate) fn save_workbook<F>(
    workbook: &mut Workbook,
    path: &Path,
    diagnostic: F,
) -> StatResult<WriteOutcome>
where
    F: FnOnce() -> String,
{
    match workbook.save(path) {
        Ok(()) => Ok(WriteOutcome::Written {
            path: path.to_path_buf(),
            skipped_cells: 0,
        }),
        Err(XlsxError::IoError(e)) => {
            eprintln!("{}", diagnostic().yellow());
            warn!(path = %path.display(), error = %e, "write skipped");
            Ok(WriteOutcome::Skipped {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
        }
        Err(e) => Err(StatError::Write(format!(
            "Failed to save '{}': {}",
            path.display(),
            e
        ))),
    }
}
