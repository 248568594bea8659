//! Worksheet reading - first sheet of a workbook into cells and frames

use crate::error::{StatError, StatResult};
use crate::types::{Cell, Frame, IndexKey};
use calamine::{open_workbook_auto, Data, Range, Reader};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Read the first worksheet as a rectangular grid anchored at A1.
///
/// Cells before the first used row/column are returned as missing, so row
/// numbers in the grid match the row numbers a user sees in Excel (minus one).
pub fn read_grid(path: &Path) -> StatResult<Vec<Vec<Cell>>> {
    let mut workbook = open_workbook_auto(path).map_err(|e| {
        StatError::Read(format!("Failed to open '{}': {}", path.display(), e))
    })?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| StatError::Read(format!("'{}' has no worksheets", path.display())))??;

    let grid = range_to_grid(&range);
    debug!(path = %path.display(), rows = grid.len(), "read worksheet");
    Ok(grid)
}

fn range_to_grid(range: &Range<Data>) -> Vec<Vec<Cell>> {
    let Some((end_row, end_col)) = range.end() else {
        return Vec::new();
    };

    (0..=end_row)
        .map(|row| {
            (0..=end_col)
                .map(|col| range.get_value((row, col)).map_or(Cell::Missing, to_cell))
                .collect()
        })
        .collect()
}

fn to_cell(data: &Data) -> Cell {
    match data {
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::String(s) => Cell::Text(s.clone()),
        Data::Bool(b) => Cell::Text(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(_) | Data::Empty => Cell::Missing,
    }
}

/// Read the first worksheet with no header row.
///
/// Columns are named by position (`0`, `1`, ...) and rows are keyed by their
/// zero-based row number.
pub fn read_raw(path: &Path) -> StatResult<Frame> {
    let grid = read_grid(path)?;
    let width = grid.iter().map(Vec::len).max().unwrap_or(0);

    let mut frame = Frame::new("", (0..width).map(|i| i.to_string()).collect());
    for (row_idx, cells) in grid.into_iter().enumerate() {
        frame.push_row(IndexKey::Int(row_idx as i64), cells)?;
    }
    Ok(frame)
}

/// Read the first worksheet using a 1-indexed header row.
///
/// Rows above the header are ignored and fully blank rows below it are
/// skipped. Blank header cells are named `Unnamed: N` after their zero-based
/// column position; repeated names get `.1`, `.2`, ... suffixes.
pub fn read_with_header(path: &Path, header_row: usize) -> StatResult<Frame> {
    if header_row == 0 {
        return Err(StatError::Validation(
            "Header row is 1-indexed; row 0 does not exist".to_string(),
        ));
    }

    let mut grid = read_grid(path)?;
    if header_row > grid.len() {
        return Err(StatError::Read(format!(
            "Header row {} is past the last row ({}) of '{}'",
            header_row,
            grid.len(),
            path.display()
        )));
    }

    let data = grid.split_off(header_row);
    let header = grid.pop().unwrap_or_default();
    let columns = header_names(&header);

    let mut frame = Frame::new("", columns);
    for (row_idx, cells) in data.into_iter().enumerate() {
        if cells.iter().all(Cell::is_blank) {
            continue;
        }
        frame.push_row(IndexKey::Int(row_idx as i64), cells)?;
    }
    Ok(frame)
}

fn header_names(header: &[Cell]) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    header
        .iter()
        .enumerate()
        .map(|(col, cell)| {
            let name = if cell.is_blank() {
                format!("Unnamed: {}", col)
            } else {
                cell.label()
            };
            let count = seen.entry(name.clone()).or_insert(0);
            let unique = if *count == 0 {
                name
            } else {
                format!("{}.{}", name, count)
            };
            *count += 1;
            unique
        })
        .collect()
}

/// Read a worksheet laid out the way `TableWriter` writes one: header in the
/// first row, row keys in the first column.
pub fn read_frame(path: &Path) -> StatResult<Frame> {
    let mut grid = read_grid(path)?.into_iter();
    let header = grid
        .next()
        .ok_or_else(|| StatError::Read(format!("'{}' is empty", path.display())))?;

    let (index_name, columns) = match header.split_first() {
        Some((first, rest)) => (first.label(), rest.iter().map(Cell::label).collect()),
        None => (String::new(), Vec::new()),
    };

    let mut frame = Frame::new(index_name, columns);
    for mut cells in grid {
        if cells.iter().all(Cell::is_blank) {
            continue;
        }
        let key = match cells.remove(0) {
            Cell::Number(n) if n.fract() == 0.0 => IndexKey::Int(n as i64),
            other => IndexKey::Text(other.label()),
        };
        frame.push_row(key, cells)?;
    }
    Ok(frame)
}
