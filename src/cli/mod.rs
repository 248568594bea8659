//! CLI command handlers

pub mod commands;

pub use commands::{chart_download, panel, render, time_series, ChartArgs, OutputFormat};
