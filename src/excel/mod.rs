//! Excel import/export for statistics spreadsheets
//!
//! - Import: ONS single-series sheets and OECD country panels → [`Frame`](crate::types::Frame)
//! - Export: frames → one worksheet per table, and publication chart downloads

mod chart_download;
mod exporter;
mod panel;
pub mod reader;
mod time_series;

pub use chart_download::{round_half_even, ChartDownloadWriter};
pub use exporter::{SheetNames, TableWriter, Tables, WriteOutcome};
pub use panel::{is_placeholder, PanelImporter};
pub use time_series::TimeSeriesImporter;
