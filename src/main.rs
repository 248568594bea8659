use clap::{Parser, Subcommand};
use statsheet::cli::{self, ChartArgs, OutputFormat};
use statsheet::error::StatResult;
use statsheet::period::PeriodGranularity;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "statsheet")]
#[command(about = "Tidy ONS and OECD spreadsheets, and write chart downloads.")]
#[command(long_about = "Statsheet - economic statistics spreadsheet tools

COMMANDS:
  time-series     - Import an ONS time series download
  panel           - Import an OECD country panel
  chart-download  - Write a publication chart download from a table

EXAMPLES:
  statsheet time-series abmi.xlsx --period annual --first-period 1997
  statsheet panel oecd.xlsx --multiplier 100 -o panel.xlsx
  statsheet chart-download panel.xlsx -n 2 --figure-name \"GDP growth\" --folder out/

Logging: set RUST_LOG (e.g. RUST_LOG=statsheet=debug) or pass --verbose.")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(long_about = "Import an ONS time series download.

Keeps only the rows whose label matches the chosen period:
  annual     1997
  quarterly  1997 Q1
  monthly    1997 JAN

The value column is named after the series CDID unless --column is given.")]
    /// Import an ONS time series download
    TimeSeries {
        /// Path to the downloaded workbook (.xlsx, .xls)
        input: PathBuf,

        /// Name of the value column (default: the series CDID)
        #[arg(short, long)]
        column: Option<String>,

        /// Period rows to keep: annual, quarterly or monthly
        #[arg(short, long, default_value = "quarterly")]
        period: PeriodGranularity,

        /// First period to keep, e.g. "2010 Q1"
        #[arg(short, long)]
        first_period: Option<String>,

        /// Write the series to this workbook, on a sheet named after the column
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// How to print the series
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        /// Show verbose import steps
        #[arg(short, long)]
        verbose: bool,
    },

    #[command(long_about = "Import an OECD country panel.

Resolves the country names hidden under merged header cells, shortens
United Kingdom/United States/European Union to UK/US/EU, keeps only year
rows and turns '..' into empty cells.")]
    /// Import an OECD country panel
    Panel {
        /// Path to the downloaded workbook
        input: PathBuf,

        /// Row holding the column headers, as numbered in Excel
        #[arg(long, default_value = "5")]
        header_row: usize,

        /// Multiply every value by this number
        #[arg(short, long, default_value = "1")]
        multiplier: f64,

        /// Write the panel to this workbook
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Worksheet name for the written panel
        #[arg(long = "sheet-name")]
        sheet_names: Vec<String>,

        /// How to print the panel
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        /// Show verbose import steps
        #[arg(short, long)]
        verbose: bool,
    },

    #[command(long_about = "Write a publication chart download.

Reads a table written by this tool (headers in row 1, keys in column A) and
writes 'Data download - Figure <N>.xlsx' with the figure title, content,
notes and unit above the data. Values are rounded to --decimal-places.")]
    /// Write a publication chart download from a table
    ChartDownload {
        /// Workbook holding the chart data
        input: PathBuf,

        /// Folder the chart download is written to
        #[arg(long, env = "STATSHEET_CHART_FOLDER", default_value = ".")]
        folder: PathBuf,

        /// Figure number, used in the file name
        #[arg(short = 'n', long)]
        figure_number: String,

        /// Figure title
        #[arg(long)]
        figure_name: String,

        /// What the figure covers
        #[arg(long)]
        content: Option<String>,

        /// Notes about the figure or data
        #[arg(long)]
        notes: Option<String>,

        /// Unit of the data
        #[arg(long)]
        unit: Option<String>,

        /// Decimal places shown for every value
        #[arg(short, long, default_value = "1")]
        decimal_places: u8,

        /// Show verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

impl Commands {
    fn verbose(&self) -> bool {
        match self {
            Commands::TimeSeries { verbose, .. }
            | Commands::Panel { verbose, .. }
            | Commands::ChartDownload { verbose, .. } => *verbose,
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "statsheet=debug"
    } else {
        "statsheet=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> StatResult<()> {
    let cli = Cli::parse();
    init_logging(cli.command.verbose());

    match cli.command {
        Commands::TimeSeries {
            input,
            column,
            period,
            first_period,
            output,
            format,
            verbose,
        } => cli::time_series(input, column, period, first_period, output, format, verbose),

        Commands::Panel {
            input,
            header_row,
            multiplier,
            output,
            sheet_names,
            format,
            verbose,
        } => cli::panel(input, header_row, multiplier, output, sheet_names, format, verbose),

        Commands::ChartDownload {
            input,
            folder,
            figure_number,
            figure_name,
            content,
            notes,
            unit,
            decimal_places,
            verbose,
        } => cli::chart_download(
            input,
            &folder,
            ChartArgs {
                figure_number,
                figure_name,
                content,
                notes,
                unit,
                decimal_places,
            },
            verbose,
        ),
    }
}
