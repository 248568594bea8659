//! Country panel import (OECD dataset exports)
//!
//! OECD exports put a merged "Non-OECD Economies" cell over the partner
//! countries, so those columns come through with placeholder headers and
//! their real names one row further down. Between the data rows sit unit,
//! flag and source rows that have no year in the key column.

use crate::error::{StatError, StatResult};
use crate::excel::exporter::{SheetNames, TableWriter};
use crate::excel::reader;
use crate::pipeline::Pipeline;
use crate::types::{Cell, Frame, IndexKey, Panel};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::info;

const KEY_HEADER: &str = "Country";
const KEY_NAME: &str = "Year";
const STRAY_INDEX_COLUMN: &str = "i";
const MISSING_MARKER: &str = "..";

/// Verbose names replaced by short codes. Both EU entries exist because the
/// provider renamed the aggregate mid-series.
const CANONICAL_NAMES: [(&str, &str); 4] = [
    ("United Kingdom", "UK"),
    ("United States", "US"),
    ("European Union – 27 countries (from 01/02/2020)", "EU"),
    ("European Union (28 countries)", "EU"),
];

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"Non-OECD Economies$|Unnamed: [0-9]+$").expect("placeholder pattern is valid")
    })
}

fn year_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[0-9]{4}$").expect("year pattern is valid"))
}

/// True for headers left behind by a merged header cell
pub fn is_placeholder(name: &str) -> bool {
    placeholder_pattern().is_match(name)
}

/// Importer for year-by-country panel spreadsheets
#[derive(Debug, Clone)]
pub struct PanelImporter {
    path: PathBuf,
    header_row: usize,
    multiplier: f64,
    write_path: Option<PathBuf>,
    sheet_names: Option<SheetNames>,
}

impl PanelImporter {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            header_row: 5,
            multiplier: 1.0,
            write_path: None,
            sheet_names: None,
        }
    }

    /// Header line as numbered in Excel (row 1 is the first row)
    pub fn header_row(mut self, row: usize) -> Self {
        self.header_row = row;
        self
    }

    /// Scale every numeric cell, e.g. 100 to turn shares into percentages
    pub fn multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    pub fn write_to<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.write_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Worksheet name(s) used when writing the result
    pub fn sheet_names(mut self, names: impl Into<SheetNames>) -> Self {
        self.sheet_names = Some(names.into());
        self
    }

    pub fn import(&self) -> StatResult<Panel> {
        let raw = reader::read_with_header(&self.path, self.header_row)?;
        let panel = self.normalize(raw)?;
        info!(
            path = %self.path.display(),
            years = panel.height(),
            columns = panel.width(),
            "imported panel"
        );

        if let Some(write_path) = &self.write_path {
            let mut writer = TableWriter::new(panel.clone());
            if let Some(names) = &self.sheet_names {
                writer = writer.with_sheet_names(names.clone());
            }
            writer.write(write_path)?;
        }

        Ok(panel)
    }

    /// Run the normalization stages over a sheet read with its header row
    fn normalize(&self, raw: Frame) -> StatResult<Panel> {
        let multiplier = self.multiplier;

        let panel = Pipeline::new("panel")
            .stage("rename key column", |f| {
                if !f.has_column(KEY_HEADER) {
                    return Err(StatError::Read(format!(
                        "No '{}' column in header row {} of '{}'",
                        KEY_HEADER,
                        self.header_row,
                        self.path.display()
                    )));
                }
                Ok(f.rename_column(KEY_HEADER, KEY_NAME))
            })
            .map("resolve merged headers", resolve_merged_headers)
            .map("canonicalize names", canonicalize_names)
            .stage("index by year", |f| f.set_index(KEY_NAME))
            .map("keep year rows", |f| {
                f.filter_rows(|key| year_pattern().is_match(&key.label()))
            })
            .map("drop unlabelled columns", |f| {
                f.retain_columns(|name| !name.is_empty() && !is_placeholder(name))
            })
            .map("drop stray index column", |f| f.drop_column(STRAY_INDEX_COLUMN))
            .map("mark missing values", |f| f.map_cells(mark_missing))
            .map_if(multiplier != 1.0, "scale values", move |f| {
                f.map_cells(|cell| match cell {
                    Cell::Number(n) => Cell::Number(n * multiplier),
                    other => other,
                })
            })
            .stage("coerce year keys", |f| f.map_index(IndexKey::to_int))
            .run(raw);
        panel
    }
}

/// Take the real names of placeholder columns from the first data row
fn resolve_merged_headers(frame: Frame) -> Frame {
    let Some(first_row) = frame.rows.first().cloned() else {
        return frame;
    };
    frame.rename_with(|position, name| {
        let cell = first_row.get(position)?;
        (is_placeholder(name) && !cell.is_blank()).then(|| cell.label())
    })
}

fn canonicalize_names(frame: Frame) -> Frame {
    frame.rename_with(|_, name| {
        CANONICAL_NAMES
            .iter()
            .find(|(verbose, _)| *verbose == name)
            .map(|(_, code)| code.to_string())
    })
}

fn mark_missing(cell: Cell) -> Cell {
    match cell {
        Cell::Text(s) if s == MISSING_MARKER => Cell::Missing,
        other => other,
    }
}
