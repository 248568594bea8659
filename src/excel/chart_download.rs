//! Chart downloads - the data behind a published figure, in a fixed layout
//!
//! ```text
//! A1  Figure <N>: <name>
//! A2  <content>
//! A4  Notes   B4 <notes>
//! A5  Unit    B5 <unit>
//! B7  column headers
//! A8  row keys, B8.. values
//! ```

use crate::error::{StatError, StatResult};
use crate::excel::exporter::{
    save_workbook, sheet_col, sheet_row, write_cell, write_key, WriteOutcome,
};
use crate::types::{Cell, Frame};
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use std::path::Path;
use tracing::{debug, info};

const TITLE_ROW: u32 = 0;
const CONTENT_ROW: u32 = 1;
const NOTES_ROW: u32 = 3;
const UNIT_ROW: u32 = 4;
const HEADER_ROW: u32 = 6;
const FIRST_DATA_ROW: u32 = 7;

/// Writer for a single "Data download - Figure N.xlsx" workbook
#[derive(Debug, Clone)]
pub struct ChartDownloadWriter {
    figure_number: String,
    figure_name: String,
    figure_content: Option<String>,
    notes: Option<String>,
    unit: Option<String>,
    decimal_places: u8,
}

impl ChartDownloadWriter {
    pub fn new(figure_number: impl ToString, figure_name: impl Into<String>) -> Self {
        Self {
            figure_number: figure_number.to_string(),
            figure_name: figure_name.into(),
            figure_content: None,
            notes: None,
            unit: None,
            decimal_places: 1,
        }
    }

    /// Extra description, e.g. which years or industries the chart covers
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.figure_content = Some(content.into());
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn decimal_places(mut self, places: u8) -> Self {
        self.decimal_places = places;
        self
    }

    pub fn title(&self) -> String {
        format!("Figure {}: {}", self.figure_number, self.figure_name)
    }

    pub fn file_name(&self) -> String {
        format!("Data download - Figure {}.xlsx", self.figure_number)
    }

    /// Excel number format with a thousands separator and fixed decimals
    pub fn number_format(&self) -> String {
        if self.decimal_places > 0 {
            format!("#,##0.{}", "0".repeat(self.decimal_places as usize))
        } else {
            "#,##0".to_string()
        }
    }

    /// Write the chart download into `folder`.
    ///
    /// Cells that are missing or not numeric are left blank and counted in
    /// [`WriteOutcome::Written::skipped_cells`].
    pub fn write(&self, folder: &Path, data: &Frame) -> StatResult<WriteOutcome> {
        let path = folder.join(self.file_name());
        let format = Format::new().set_num_format(self.number_format());

        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet
            .set_name(format!("Figure_{}", self.figure_number))
            .map_err(|e| StatError::Write(format!("Invalid worksheet name: {}", e)))?;

        self.write_header(worksheet)?;
        let skipped_cells = self.write_data(worksheet, data, &format)?;

        let outcome = save_workbook(&mut workbook, &path, || {
            format!(
                "The data download '{}' could not be created. Check that a file with this file path is not already open.",
                path.display()
            )
        })?;

        Ok(match outcome {
            WriteOutcome::Written { path, .. } => {
                info!(path = %path.display(), skipped_cells, "wrote chart download");
                WriteOutcome::Written {
                    path,
                    skipped_cells,
                }
            }
            skipped => skipped,
        })
    }

    fn write_header(&self, worksheet: &mut Worksheet) -> StatResult<()> {
        let text = |s: &str| Cell::Text(s.to_string());
        let optional = |s: &Option<String>| s.as_deref().map_or(Cell::Missing, text);

        let cells = [
            (TITLE_ROW, 0, text(&self.title())),
            (CONTENT_ROW, 0, optional(&self.figure_content)),
            (NOTES_ROW, 0, text("Notes")),
            (NOTES_ROW, 1, optional(&self.notes)),
            (UNIT_ROW, 0, text("Unit")),
            (UNIT_ROW, 1, optional(&self.unit)),
        ];
        for (row, col, cell) in &cells {
            write_cell(worksheet, *row, *col, cell, None)?;
        }
        Ok(())
    }

    /// Write headers, keys and rounded values; returns the number of skipped cells
    fn write_data(&self, worksheet: &mut Worksheet, data: &Frame, format: &Format) -> StatResult<usize> {
        for (col_idx, name) in data.columns.iter().enumerate() {
            let col = sheet_col(col_idx, 1)?;
            write_cell(worksheet, HEADER_ROW, col, &Cell::Text(name.clone()), None)?;
        }

        let mut skipped = 0;
        for (row_idx, (key, cells)) in data.index.iter().zip(&data.rows).enumerate() {
            let row = sheet_row(row_idx, FIRST_DATA_ROW)?;
            write_key(worksheet, row, 0, key)?;

            for (col_idx, cell) in cells.iter().enumerate() {
                let col = sheet_col(col_idx, 1)?;
                let written = cell
                    .as_number()
                    .map(|n| round_half_even(n, self.decimal_places))
                    .filter(|n| n.is_finite())
                    .map(|n| write_cell(worksheet, row, col, &Cell::Number(n), Some(format)));

                match written {
                    Some(Ok(())) => {}
                    Some(Err(e)) => {
                        debug!(row, col, error = %e, "cell skipped");
                        skipped += 1;
                    }
                    None => {
                        debug!(row, col, "cell has no finite numeric value, skipped");
                        skipped += 1;
                    }
                }
            }
        }
        Ok(skipped)
    }
}

/// Round to `places` decimals, ties to even
pub fn round_half_even(value: f64, places: u8) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round_ties_even() / factor
}
