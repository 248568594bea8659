use crate::error::StatResult;
use crate::excel::{
    reader, ChartDownloadWriter, PanelImporter, SheetNames, TableWriter, TimeSeriesImporter,
    WriteOutcome,
};
use crate::period::PeriodGranularity;
use crate::types::{Cell, Frame};
use colored::Colorize;
use std::path::{Path, PathBuf};

/// How an imported table is printed to stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Aligned text table
    #[default]
    Table,
    Yaml,
    Json,
}

/// Render a frame in the requested format
pub fn render(frame: &Frame, format: OutputFormat) -> StatResult<String> {
    Ok(match format {
        OutputFormat::Table => render_table(frame),
        OutputFormat::Yaml => serde_yaml::to_string(frame)?,
        OutputFormat::Json => serde_json::to_string_pretty(frame)?,
    })
}

fn render_table(frame: &Frame) -> String {
    let mut lines: Vec<Vec<String>> = Vec::with_capacity(frame.height() + 1);
    lines.push(
        std::iter::once(frame.index_name.clone())
            .chain(frame.columns.iter().cloned())
            .collect(),
    );
    for (key, cells) in frame.index.iter().zip(&frame.rows) {
        lines.push(
            std::iter::once(key.label())
                .chain(cells.iter().map(format_cell))
                .collect(),
        );
    }

    let widths: Vec<usize> = (0..=frame.width())
        .map(|col| lines.iter().map(|l| l[col].chars().count()).max().unwrap_or(0))
        .collect();

    lines
        .iter()
        .map(|line| {
            line.iter()
                .zip(&widths)
                .enumerate()
                .map(|(i, (value, width))| {
                    if i == 0 {
                        format!("{:<width$}", value, width = width)
                    } else {
                        format!("{:>width$}", value, width = width)
                    }
                })
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_cell(cell: &Cell) -> String {
    match cell {
        Cell::Missing => "-".to_string(),
        other => other.label(),
    }
}

fn report_write(outcome: &WriteOutcome) {
    match outcome {
        WriteOutcome::Written {
            path,
            skipped_cells,
        } => {
            println!("{}", "✅ Written".bold().green());
            println!("   File: {}", path.display());
            if *skipped_cells > 0 {
                println!(
                    "   {}",
                    format!("{} non-numeric cells left blank", skipped_cells).yellow()
                );
            }
        }
        WriteOutcome::Skipped { path, reason } => {
            println!("{}", "⚠️  Not written".bold().yellow());
            println!("   File: {}", path.display());
            println!("   Reason: {}", reason);
        }
    }
}

/// Execute the time-series command
pub fn time_series(
    input: PathBuf,
    column: Option<String>,
    period: PeriodGranularity,
    first_period: Option<String>,
    output: Option<PathBuf>,
    format: OutputFormat,
    verbose: bool,
) -> StatResult<()> {
    if verbose {
        eprintln!("{}", "📖 Importing time series".cyan());
        eprintln!("   File: {}", input.display());
        eprintln!("   Period: {}", period);
    }

    let mut importer = TimeSeriesImporter::new(&input).granularity(period);
    if let Some(name) = column {
        importer = importer.column_name(name);
    }
    if let Some(first) = first_period {
        importer = importer.first_period(first);
    }
    let series = importer.import()?;

    println!("{}", render(&series, format)?);

    if let Some(output) = output {
        let sheet = series.columns.first().cloned().unwrap_or_default();
        let outcome = TableWriter::new(series).with_sheet_names(sheet).write(&output)?;
        report_write(&outcome);
    }
    Ok(())
}

/// Execute the panel command
pub fn panel(
    input: PathBuf,
    header_row: usize,
    multiplier: f64,
    output: Option<PathBuf>,
    sheet_names: Vec<String>,
    format: OutputFormat,
    verbose: bool,
) -> StatResult<()> {
    if verbose {
        eprintln!("{}", "📖 Importing panel".cyan());
        eprintln!("   File: {}", input.display());
        eprintln!("   Header row: {}", header_row);
        if multiplier != 1.0 {
            eprintln!("   Multiplier: {}", multiplier);
        }
    }

    let panel = PanelImporter::new(&input)
        .header_row(header_row)
        .multiplier(multiplier)
        .import()?;

    println!("{}", render(&panel, format)?);

    if let Some(output) = output {
        let mut writer = TableWriter::new(panel);
        if !sheet_names.is_empty() {
            writer = writer.with_sheet_names(SheetNames::Many(sheet_names));
        }
        report_write(&writer.write(&output)?);
    }
    Ok(())
}

/// Chart download settings taken from the command line
#[derive(Debug, Clone)]
pub struct ChartArgs {
    pub figure_number: String,
    pub figure_name: String,
    pub content: Option<String>,
    pub notes: Option<String>,
    pub unit: Option<String>,
    pub decimal_places: u8,
}

/// Execute the chart-download command
pub fn chart_download(input: PathBuf, folder: &Path, args: ChartArgs, verbose: bool) -> StatResult<()> {
    if verbose {
        eprintln!("{}", "📖 Reading table".cyan());
        eprintln!("   File: {}", input.display());
    }

    let data = reader::read_frame(&input)?;

    if verbose {
        eprintln!("   {} rows, {} columns", data.height(), data.width());
    }

    let mut writer = ChartDownloadWriter::new(args.figure_number, args.figure_name)
        .decimal_places(args.decimal_places);
    if let Some(content) = args.content {
        writer = writer.content(content);
    }
    if let Some(notes) = args.notes {
        writer = writer.notes(notes);
    }
    if let Some(unit) = args.unit {
        writer = writer.unit(unit);
    }

    report_write(&writer.write(folder, &data)?);
    Ok(())
}
