//! Single-series import (ONS time series downloads)
//!
//! A series sheet has period labels in column A and values in column B,
//! interleaved with metadata rows (`Title`, `CDID`, `PreUnit`, ...). The
//! `CDID` row carries the series identifier used as the default column name.

use crate::error::{StatError, StatResult};
use crate::excel::exporter::{SheetNames, TableWriter};
use crate::excel::reader;
use crate::period::{PeriodGranularity, PeriodOrdinal};
use crate::pipeline::Pipeline;
use crate::types::{Cell, Frame, NormalizedTimeSeries};
use std::path::{Path, PathBuf};
use tracing::info;

const LABEL_COLUMN: &str = "0";
const VALUE_COLUMN: &str = "1";
const IDENTIFIER_ROW: &str = "CDID";

/// Importer for single-series spreadsheets keyed by period label
#[derive(Debug, Clone)]
pub struct TimeSeriesImporter {
    path: PathBuf,
    column_name: Option<String>,
    granularity: PeriodGranularity,
    first_period: Option<String>,
    write_path: Option<PathBuf>,
}

impl TimeSeriesImporter {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            column_name: None,
            granularity: PeriodGranularity::default(),
            first_period: None,
            write_path: None,
        }
    }

    /// Name of the value column; defaults to the series identifier
    pub fn column_name(mut self, name: impl Into<String>) -> Self {
        self.column_name = Some(name.into());
        self
    }

    pub fn granularity(mut self, granularity: PeriodGranularity) -> Self {
        self.granularity = granularity;
        self
    }

    /// First period to keep, e.g. `1997 Q1` or `1997`
    pub fn first_period(mut self, period: impl Into<String>) -> Self {
        self.first_period = Some(period.into());
        self
    }

    /// Also write the result to this workbook, on a sheet named after the identifier
    pub fn write_to<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.write_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn import(&self) -> StatResult<NormalizedTimeSeries> {
        let first = self.checked_first_period()?;
        let raw = reader::read_raw(&self.path)?;

        let identifier = series_identifier(&raw)?;
        let series = self.normalize(raw, &identifier, first.as_ref())?;
        info!(
            path = %self.path.display(),
            identifier = %identifier,
            granularity = %self.granularity,
            rows = series.height(),
            "imported time series"
        );

        if let Some(write_path) = &self.write_path {
            TableWriter::new(series.clone())
                .with_sheet_names(SheetNames::One(identifier))
                .write(write_path)?;
        }

        Ok(series)
    }

    fn checked_first_period(&self) -> StatResult<Option<PeriodOrdinal>> {
        self.first_period
            .as_deref()
            .map(|p| self.granularity.validate_first_period(p))
            .transpose()
    }

    /// Run the normalization stages over a raw, header-less sheet
    fn normalize(
        &self,
        raw: Frame,
        identifier: &str,
        first: Option<&PeriodOrdinal>,
    ) -> StatResult<NormalizedTimeSeries> {
        let granularity = self.granularity;
        let key_name = granularity.display_name();
        let value_name = self
            .column_name
            .clone()
            .unwrap_or_else(|| identifier.to_string());

        let series = Pipeline::new("time_series")
            .map("label period column", |f| {
                f.rename_column(LABEL_COLUMN, key_name)
            })
            .stage("index by period", |f| f.set_index(key_name))
            .map("name value column", |f| {
                f.rename_column(VALUE_COLUMN, &value_name)
            })
            .map("keep period rows", |f| {
                f.filter_rows(|key| granularity.matches(&key.label()))
            })
            .stage("coerce period keys", |f| {
                f.map_index(|key| {
                    granularity.parse_key(&key.label()).ok_or_else(|| {
                        StatError::Read(format!("'{}' is not a {} period", key, granularity))
                    })
                })
            })
            .map_if(first.is_some(), "truncate to first period", |f| {
                match first {
                    Some(first) => truncate_from(f, granularity, first),
                    None => f,
                }
            })
            .stage("keep value column", |f| {
                if !f.has_column(&value_name) {
                    return Err(StatError::Read(format!(
                        "'{}' has no value column",
                        self.path.display()
                    )));
                }
                Ok(f.retain_columns(|c| c == value_name))
            })
            .run(raw);
        series
    }
}

/// Series identifier from the `CDID` metadata row
fn series_identifier(raw: &Frame) -> StatResult<String> {
    let labels = raw
        .column_values(LABEL_COLUMN)
        .ok_or_else(|| StatError::Read("Sheet has no label column".to_string()))?;
    let row = labels
        .iter()
        .position(|cell| cell.label() == IDENTIFIER_ROW)
        .ok_or_else(|| StatError::Read(format!("No '{}' row found", IDENTIFIER_ROW)))?;

    let identifier = raw
        .column_position(VALUE_COLUMN)
        .and_then(|col| raw.rows[row].get(col))
        .map(Cell::label)
        .unwrap_or_default();
    if identifier.is_empty() {
        return Err(StatError::Read(format!("'{}' row has no identifier", IDENTIFIER_ROW)));
    }
    Ok(identifier)
}

/// Keep the suffix of the series starting at the first period >= `first`
fn truncate_from(frame: Frame, granularity: PeriodGranularity, first: &PeriodOrdinal) -> Frame {
    let start = frame
        .index
        .iter()
        .position(|key| {
            granularity
                .ordinal(&key.label())
                .is_some_and(|ordinal| &ordinal >= first)
        })
        .unwrap_or(frame.height());
    frame.skip_rows(start)
}
