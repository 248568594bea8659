//! Excel import/export tests against real workbooks
//!
//! Fixture workbooks are built with rust_xlsxwriter in a temporary
//! directory, imported with the library and read back with calamine.

use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use pretty_assertions::assert_eq;
use rust_xlsxwriter::Workbook;
use statsheet::excel::{
    reader, ChartDownloadWriter, PanelImporter, SheetNames, TableWriter, TimeSeriesImporter,
    WriteOutcome,
};
use statsheet::{Cell, Frame, IndexKey, PeriodGranularity, StatError};
use std::io::Read;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ═══════════════════════════════════════════════════════════════════════════
// FIXTURES
// ═══════════════════════════════════════════════════════════════════════════

fn t(s: &str) -> Cell {
    Cell::Text(s.to_string())
}

fn n(v: f64) -> Cell {
    Cell::Number(v)
}

const E: Cell = Cell::Missing;

/// Write `rows` to the first worksheet of a new workbook
fn write_fixture(path: &Path, rows: &[Vec<Cell>]) {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    for (r, cells) in rows.iter().enumerate() {
        for (c, cell) in cells.iter().enumerate() {
            match cell {
                Cell::Number(v) => {
                    worksheet.write_number(r as u32, c as u16, *v).unwrap();
                }
                Cell::Text(s) => {
                    worksheet.write_string(r as u32, c as u16, s).unwrap();
                }
                Cell::Missing => {}
            }
        }
    }
    workbook.save(path).unwrap();
}

/// ONS-style series download: metadata rows, then annual, quarterly and monthly blocks
fn ons_fixture(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("abmi.xlsx");
    write_fixture(
        &path,
        &[
            vec![t("Title"), t("Gross Domestic Product: chained volume measures")],
            vec![t("CDID"), t("ABMI")],
            vec![t("PreUnit"), t("£")],
            vec![t("Unit"), t("m")],
            vec![t("Release date"), t("30-09-2022")],
            vec![t("1997"), n(1_400_000.0)],
            vec![t("1998"), n(1_450_000.0)],
            vec![n(1999.0), n(1_500_000.0)],
            vec![t("1997 Q1"), n(350_000.0)],
            vec![t("1997 Q2"), n(352_000.0)],
            vec![t("1997 Q3"), n(354_000.0)],
            vec![t("1997 Q4"), n(356_000.0)],
            vec![t("1998 Q1"), n(358_000.0)],
            vec![t("1997 JAN"), n(116_000.0)],
            vec![t("1997 FEB"), n(117_000.0)],
        ],
    );
    path
}

/// OECD-style panel: title block, header on row 5, names under a merged cell
fn oecd_fixture(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("oecd.xlsx");
    write_fixture(
        &path,
        &[
            vec![t("Dataset: Labour productivity growth")],
            vec![t("Measure"), t("Annual growth")],
            vec![],
            vec![t("Unit"), t("Percentage")],
            vec![
                t("Country"),
                t("United Kingdom"),
                t("United States"),
                t("European Union (28 countries)"),
                t("France"),
                t("Germany"),
                t("Non-OECD Economies"),
                E,
                t("i"),
                t("Japan"),
                t("Italy"),
                t("Spain"),
                E,
            ],
            vec![t("Time"), E, E, E, E, E, t("Brazil"), t("Mexico"), E, E, E, E, E],
            vec![t("Unit"), t("%"), t("%"), t("%"), t("%"), t("%"), t("%"), t("%")],
            vec![
                n(2019.0),
                n(1.5),
                n(2.25),
                n(1.75),
                n(0.5),
                n(0.25),
                t(".."),
                n(-0.5),
                t("i"),
                n(0.75),
                n(0.0),
                n(1.0),
                t("e"),
            ],
            vec![
                t("2020"),
                n(-9.75),
                n(-3.5),
                n(-6.0),
                n(-7.75),
                n(-4.5),
                n(-3.25),
                t(".."),
                E,
                n(-4.25),
                n(-9.0),
                n(-11.25),
                E,
            ],
            vec![t("Source: OECD")],
        ],
    );
    path
}

fn sample_frame() -> Frame {
    let mut frame = Frame::new("Year", vec!["UK".to_string(), "US".to_string()]);
    frame
        .push_row(IndexKey::Int(2019), vec![n(1.25), E])
        .unwrap();
    frame
        .push_row(IndexKey::Int(2020), vec![n(-9.75), t("n/a")])
        .unwrap();
    frame
}

fn first_sheet(path: &Path) -> (Vec<String>, Range<Data>) {
    let mut workbook: Xlsx<_> = open_workbook(path).unwrap();
    let names = workbook.sheet_names().to_vec();
    let range = workbook.worksheet_range(&names[0]).unwrap();
    (names, range)
}

fn value_at(range: &Range<Data>, row: u32, col: u32) -> Option<Data> {
    range.get_value((row, col)).cloned()
}

/// Raw XML of one part of an xlsx package
fn xlsx_part(path: &Path, part: &str) -> String {
    let mut archive = zip::ZipArchive::new(std::fs::File::open(path).unwrap()).unwrap();
    let mut xml = String::new();
    archive.by_name(part).unwrap().read_to_string(&mut xml).unwrap();
    xml
}

/// Cells inside the used range come back as `Data::Empty`, outside it as `None`
fn is_blank(range: &Range<Data>, row: u32, col: u32) -> bool {
    matches!(range.get_value((row, col)), None | Some(Data::Empty))
}

// ═══════════════════════════════════════════════════════════════════════════
// TIME SERIES IMPORTER TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_time_series_quarterly_default() {
    let dir = TempDir::new().unwrap();
    let series = TimeSeriesImporter::new(ons_fixture(&dir)).import().unwrap();

    assert_eq!(series.index_name, "Quarter");
    assert_eq!(series.columns, vec!["ABMI"]);
    let labels: Vec<String> = series.index.iter().map(IndexKey::label).collect();
    assert_eq!(
        labels,
        vec!["1997 Q1", "1997 Q2", "1997 Q3", "1997 Q4", "1998 Q1"]
    );
    assert_eq!(series.rows[0], vec![n(350_000.0)]);
}

#[test]
fn test_time_series_annual_keys_are_integers() {
    let dir = TempDir::new().unwrap();
    let series = TimeSeriesImporter::new(ons_fixture(&dir))
        .granularity(PeriodGranularity::Annual)
        .import()
        .unwrap();

    assert_eq!(
        series.index,
        vec![IndexKey::Int(1997), IndexKey::Int(1998), IndexKey::Int(1999)]
    );
}

#[test]
fn test_time_series_monthly_with_column_name() {
    let dir = TempDir::new().unwrap();
    let series = TimeSeriesImporter::new(ons_fixture(&dir))
        .granularity(PeriodGranularity::Monthly)
        .column_name("GDP")
        .import()
        .unwrap();

    assert_eq!(series.index_name, "Month");
    assert_eq!(series.columns, vec!["GDP"]);
    assert_eq!(series.height(), 2);
}

#[test]
fn test_time_series_first_period_is_suffix() {
    let dir = TempDir::new().unwrap();
    let path = ons_fixture(&dir);
    let full = TimeSeriesImporter::new(&path).import().unwrap();
    let truncated = TimeSeriesImporter::new(&path)
        .first_period("1997 Q3")
        .import()
        .unwrap();

    assert_eq!(truncated.index[0], IndexKey::Text("1997 Q3".to_string()));
    assert_eq!(truncated.index[..], full.index[2..]);
    assert_eq!(truncated.rows[..], full.rows[2..]);
}

#[test]
fn test_time_series_first_year() {
    let dir = TempDir::new().unwrap();
    let series = TimeSeriesImporter::new(ons_fixture(&dir))
        .granularity(PeriodGranularity::Annual)
        .first_period("1998")
        .import()
        .unwrap();

    assert_eq!(series.index, vec![IndexKey::Int(1998), IndexKey::Int(1999)]);
}

#[test]
fn test_time_series_period_mismatch() {
    let dir = TempDir::new().unwrap();
    let result = TimeSeriesImporter::new(ons_fixture(&dir))
        .first_period("1997 JAN")
        .import();

    match result {
        Err(StatError::Validation(msg)) => assert!(msg.contains("do not match up")),
        other => panic!("Expected validation error, got {:?}", other),
    }
}

#[test]
fn test_time_series_without_cdid_row() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("no_cdid.xlsx");
    write_fixture(&path, &[vec![t("Title"), t("x")], vec![t("1997 Q1"), n(1.0)]]);

    let result = TimeSeriesImporter::new(&path).import();
    assert!(matches!(result, Err(StatError::Read(_))));
}

#[test]
fn test_time_series_missing_file() {
    let result = TimeSeriesImporter::new("no/such/file.xlsx").import();
    assert!(matches!(result, Err(StatError::Read(_))));
}

#[test]
fn test_time_series_write_to_uses_identifier_sheet() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out.xlsx");
    TimeSeriesImporter::new(ons_fixture(&dir))
        .write_to(&output)
        .import()
        .unwrap();

    let (names, range) = first_sheet(&output);
    assert_eq!(names, vec!["ABMI"]);
    assert_eq!(value_at(&range, 0, 0), Some(Data::String("Quarter".to_string())));
    assert_eq!(value_at(&range, 0, 1), Some(Data::String("ABMI".to_string())));
    assert_eq!(value_at(&range, 1, 0), Some(Data::String("1997 Q1".to_string())));
    assert_eq!(value_at(&range, 1, 1), Some(Data::Float(350_000.0)));
}

// ═══════════════════════════════════════════════════════════════════════════
// PANEL IMPORTER TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_panel_columns_resolved_and_canonical() {
    let dir = TempDir::new().unwrap();
    let panel = PanelImporter::new(oecd_fixture(&dir)).import().unwrap();

    assert_eq!(panel.index_name, "Year");
    assert_eq!(
        panel.columns,
        vec!["UK", "US", "EU", "France", "Germany", "Brazil", "Mexico", "Japan", "Italy", "Spain"]
    );
}

#[test]
fn test_panel_keeps_only_year_rows() {
    let dir = TempDir::new().unwrap();
    let panel = PanelImporter::new(oecd_fixture(&dir)).import().unwrap();

    assert_eq!(panel.index, vec![IndexKey::Int(2019), IndexKey::Int(2020)]);
}

#[test]
fn test_panel_missing_marker() {
    let dir = TempDir::new().unwrap();
    let panel = PanelImporter::new(oecd_fixture(&dir)).import().unwrap();

    let brazil = panel.column_values("Brazil").unwrap();
    assert_eq!(brazil, vec![&E, &n(-3.25)]);
    let mexico = panel.column_values("Mexico").unwrap();
    assert_eq!(mexico, vec![&n(-0.5), &E]);
}

#[test]
fn test_panel_multiplier() {
    let dir = TempDir::new().unwrap();
    let path = oecd_fixture(&dir);
    let plain = PanelImporter::new(&path).import().unwrap();
    let scaled = PanelImporter::new(&path).multiplier(100.0).import().unwrap();

    assert_eq!(plain.columns, scaled.columns);
    for (before, after) in plain.rows.iter().flatten().zip(scaled.rows.iter().flatten()) {
        match (before, after) {
            (Cell::Number(b), Cell::Number(a)) => assert_eq!(*a, b * 100.0),
            (Cell::Missing, Cell::Missing) => {}
            other => panic!("Unexpected cell pair {:?}", other),
        }
    }
}

#[test]
fn test_panel_header_row_option() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("short.xlsx");
    write_fixture(
        &path,
        &[
            vec![t("Country"), t("United States"), t("Korea")],
            vec![E, E, E],
            vec![t("2021"), n(2.5), n(3.0)],
        ],
    );

    let panel = PanelImporter::new(&path).header_row(1).import().unwrap();
    assert_eq!(panel.columns, vec!["US", "Korea"]);
    assert_eq!(panel.index, vec![IndexKey::Int(2021)]);
}

#[test]
fn test_panel_wrong_header_row() {
    let dir = TempDir::new().unwrap();
    let result = PanelImporter::new(oecd_fixture(&dir)).header_row(4).import();
    assert!(matches!(result, Err(StatError::Read(_))));
}

#[test]
fn test_panel_header_row_zero() {
    let dir = TempDir::new().unwrap();
    let result = PanelImporter::new(oecd_fixture(&dir)).header_row(0).import();
    assert!(matches!(result, Err(StatError::Validation(_))));
}

#[test]
fn test_panel_header_row_past_end() {
    let dir = TempDir::new().unwrap();
    let result = PanelImporter::new(oecd_fixture(&dir)).header_row(500).import();
    assert!(matches!(result, Err(StatError::Read(_))));
}

#[test]
fn test_panel_write_to_with_sheet_name() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("panel.xlsx");
    PanelImporter::new(oecd_fixture(&dir))
        .write_to(&output)
        .sheet_names("Productivity")
        .import()
        .unwrap();

    let (names, range) = first_sheet(&output);
    assert_eq!(names, vec!["Productivity"]);
    assert_eq!(value_at(&range, 0, 0), Some(Data::String("Year".to_string())));
    assert_eq!(value_at(&range, 0, 1), Some(Data::String("UK".to_string())));
    assert_eq!(value_at(&range, 1, 0), Some(Data::Float(2019.0)));
    // Brazil 2019 was ".."
    assert!(is_blank(&range, 1, 6));
}

// ═══════════════════════════════════════════════════════════════════════════
// TABLE WRITER TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_table_writer_round_trip() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("table.xlsx");

    let outcome = TableWriter::new(sample_frame()).write(&output).unwrap();
    assert!(outcome.is_written());

    let frame = reader::read_frame(&output).unwrap();
    assert_eq!(frame.index_name, "Year");
    assert_eq!(frame.columns, vec!["UK", "US"]);
    assert_eq!(frame.index, vec![IndexKey::Int(2019), IndexKey::Int(2020)]);
    assert_eq!(frame.rows, sample_frame().rows);
}

#[test]
fn test_table_writer_default_sheet_names() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("many.xlsx");

    TableWriter::new(vec![sample_frame(), sample_frame()])
        .write(&output)
        .unwrap();

    let (names, _) = first_sheet(&output);
    assert_eq!(names, vec!["Sheet1", "Sheet2"]);
}

#[test]
fn test_table_writer_named_tables() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("named.xlsx");

    TableWriter::new(vec![
        ("Growth".to_string(), sample_frame()),
        ("Levels".to_string(), sample_frame()),
    ])
    .write(&output)
    .unwrap();

    let (names, _) = first_sheet(&output);
    assert_eq!(names, vec!["Growth", "Levels"]);
}

#[test]
fn test_table_writer_zips_sheet_names() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("zipped.xlsx");

    TableWriter::new(vec![sample_frame(), sample_frame()])
        .with_sheet_names(SheetNames::Many(vec!["A".to_string(), "B".to_string()]))
        .write(&output)
        .unwrap();

    let (names, _) = first_sheet(&output);
    assert_eq!(names, vec!["A", "B"]);
}

#[test]
fn test_table_writer_unwritable_path_is_skipped() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("missing-dir").join("table.xlsx");

    let outcome = TableWriter::new(sample_frame()).write(&output).unwrap();
    match outcome {
        WriteOutcome::Skipped { path, .. } => assert_eq!(path, output),
        other => panic!("Expected skipped write, got {:?}", other),
    }
    assert!(!output.exists());
}

#[test]
fn test_table_writer_invalid_sheet_name() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("bad.xlsx");

    let result = TableWriter::new(sample_frame())
        .with_sheet_names("bad[name]")
        .write(&output);
    assert!(matches!(result, Err(StatError::Write(_))));
}

// ═══════════════════════════════════════════════════════════════════════════
// CHART DOWNLOAD TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_chart_download_layout() {
    let dir = TempDir::new().unwrap();

    let outcome = ChartDownloadWriter::new(4, "Productivity growth")
        .content("G7 countries, 2019 to 2020")
        .notes("Whole economy")
        .unit("%")
        .write(dir.path(), &sample_frame())
        .unwrap();

    let path = dir.path().join("Data download - Figure 4.xlsx");
    assert_eq!(
        outcome,
        WriteOutcome::Written {
            path: path.clone(),
            skipped_cells: 2
        }
    );

    let (names, range) = first_sheet(&path);
    assert_eq!(names, vec!["Figure_4"]);
    let s = |v: &str| Some(Data::String(v.to_string()));
    assert_eq!(value_at(&range, 0, 0), s("Figure 4: Productivity growth"));
    assert_eq!(value_at(&range, 1, 0), s("G7 countries, 2019 to 2020"));
    assert_eq!(value_at(&range, 3, 0), s("Notes"));
    assert_eq!(value_at(&range, 3, 1), s("Whole economy"));
    assert_eq!(value_at(&range, 4, 0), s("Unit"));
    assert_eq!(value_at(&range, 4, 1), s("%"));
    assert_eq!(value_at(&range, 6, 1), s("UK"));
    assert_eq!(value_at(&range, 6, 2), s("US"));
    assert_eq!(value_at(&range, 7, 0), Some(Data::Float(2019.0)));
    assert_eq!(value_at(&range, 8, 0), Some(Data::Float(2020.0)));
}

#[test]
fn test_chart_download_rounds_and_skips_cells() {
    let dir = TempDir::new().unwrap();

    ChartDownloadWriter::new(1, "x")
        .write(dir.path(), &sample_frame())
        .unwrap();

    let (_, range) = first_sheet(&dir.path().join("Data download - Figure 1.xlsx"));
    // 1.25 rounds half to even, -9.75 to -9.8
    assert_eq!(value_at(&range, 7, 1), Some(Data::Float(1.2)));
    assert_eq!(value_at(&range, 8, 1), Some(Data::Float(-9.8)));
    // Missing and "n/a" are left blank
    assert!(is_blank(&range, 7, 2));
    assert!(is_blank(&range, 8, 2));
    // No content, notes or unit given
    assert!(is_blank(&range, 1, 0));
    assert!(is_blank(&range, 3, 1));
}

#[test]
fn test_chart_download_numeric_text_is_written() {
    let dir = TempDir::new().unwrap();
    let mut frame = Frame::new("Quarter", vec!["ABMI".to_string()]);
    frame
        .push_row(IndexKey::Text("2020 Q1".to_string()), vec![t(" 1234.5 ")])
        .unwrap();

    let outcome = ChartDownloadWriter::new(2, "GDP")
        .decimal_places(0)
        .write(dir.path(), &frame)
        .unwrap();
    assert!(matches!(
        outcome,
        WriteOutcome::Written {
            skipped_cells: 0,
            ..
        }
    ));

    let (_, range) = first_sheet(&dir.path().join("Data download - Figure 2.xlsx"));
    assert_eq!(value_at(&range, 7, 0), Some(Data::String("2020 Q1".to_string())));
    assert_eq!(value_at(&range, 7, 1), Some(Data::Float(1234.0)));
}

#[test]
fn test_chart_download_missing_folder_is_skipped() {
    let dir = TempDir::new().unwrap();
    let folder = dir.path().join("not-created");

    let outcome = ChartDownloadWriter::new(9, "x")
        .write(&folder, &sample_frame())
        .unwrap();
    assert!(!outcome.is_written());
    assert_eq!(outcome.path(), folder.join("Data download - Figure 9.xlsx"));
}

#[test]
fn test_chart_download_number_format_on_values() {
    let dir = TempDir::new().unwrap();
    ChartDownloadWriter::new(6, "x")
        .write(dir.path(), &sample_frame())
        .unwrap();

    let path = dir.path().join("Data download - Figure 6.xlsx");
    let styles = xlsx_part(&path, "xl/styles.xml");
    assert!(styles.contains(r##"formatCode="#,##0.0""##), "{styles}");

    // Values carry a style, row keys do not
    let sheet = xlsx_part(&path, "xl/worksheets/sheet1.xml");
    assert!(sheet.contains(r#"<c r="B8" s=""#), "{sheet}");
    assert!(sheet.contains(r#"<c r="A8">"#), "{sheet}");
}

#[test]
fn test_chart_download_decimal_places_format() {
    let dir = TempDir::new().unwrap();
    ChartDownloadWriter::new(7, "x")
        .decimal_places(3)
        .write(dir.path(), &sample_frame())
        .unwrap();

    let styles = xlsx_part(&dir.path().join("Data download - Figure 7.xlsx"), "xl/styles.xml");
    assert!(styles.contains(r##"formatCode="#,##0.000""##), "{styles}");
}

#[test]
fn test_chart_download_overflowing_value_is_counted() {
    let dir = TempDir::new().unwrap();
    let mut frame = Frame::new("Year", vec!["Level".to_string()]);
    frame
        .push_row(IndexKey::Int(2020), vec![n(1e300)])
        .unwrap();
    frame.push_row(IndexKey::Int(2021), vec![n(2.5)]).unwrap();

    let outcome = ChartDownloadWriter::new(8, "x")
        .decimal_places(20)
        .write(dir.path(), &frame)
        .unwrap();
    assert!(matches!(
        outcome,
        WriteOutcome::Written {
            skipped_cells: 1,
            ..
        }
    ));

    let (_, range) = first_sheet(&dir.path().join("Data download - Figure 8.xlsx"));
    assert!(is_blank(&range, 7, 1));
    assert_eq!(value_at(&range, 8, 1), Some(Data::Float(2.5)));
}

#[test]
fn test_table_writer_too_many_columns() {
    let dir = TempDir::new().unwrap();
    let width = 70_000;
    let mut frame = Frame::new("Year", (0..width).map(|i| format!("c{}", i)).collect());
    frame
        .push_row(IndexKey::Int(2020), vec![n(1.0); width])
        .unwrap();

    let result = TableWriter::new(frame).write(&dir.path().join("wide.xlsx"));
    assert!(matches!(result, Err(StatError::Write(_))));
}
