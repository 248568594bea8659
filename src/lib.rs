//! Statsheet - tidy economic statistics spreadsheets
//!
//! This library turns the spreadsheets published by statistics providers
//! into plain year- or period-indexed tables, and writes tables back out to
//! Excel, including publication "chart download" workbooks.
//!
//! # Features
//!
//! - ONS time series: keeps the annual, quarterly or monthly rows of a series
//! - OECD panels: resolves merged country headers, drops unit/source rows
//! - Workbook export with one worksheet per table
//! - Chart downloads with title, notes, unit and number formatting
//!
//! # Example
//!
//! ```no_run
//! use statsheet::excel::{ChartDownloadWriter, TimeSeriesImporter};
//! use statsheet::period::PeriodGranularity;
//! use std::path::Path;
//!
//! let series = TimeSeriesImporter::new("abmi.xlsx")
//!     .granularity(PeriodGranularity::Quarterly)
//!     .first_period("2010 Q1")
//!     .import()?;
//!
//! println!("{} quarters of {}", series.height(), series.columns[0]);
//!
//! ChartDownloadWriter::new(1, "Gross domestic product")
//!     .unit("£ million")
//!     .write(Path::new("downloads"), &series)?;
//! # Ok::<(), statsheet::error::StatError>(())
//! ```

pub mod cli;
pub mod error;
pub mod excel;
pub mod period;
pub mod pipeline;
pub mod types;

// Re-export commonly used types
pub use error::{StatError, StatResult};
pub use period::PeriodGranularity;
pub use types::{Cell, Frame, IndexKey, NormalizedTimeSeries, Panel};
