use crate::error::{StatError, StatResult};
use serde::Serialize;
use std::fmt;

//==============================================================================
// Cells and Row Keys
//==============================================================================

/// A single table cell
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
    /// Empty cell, or a provider's explicit "no data" marker
    Missing,
}

impl Cell {
    /// Text form of the cell as it would be matched against label patterns.
    ///
    /// Whole numbers render without a fractional part, so a numeric `1997`
    /// cell has the label `1997` rather than `1997.0`.
    pub fn label(&self) -> String {
        match self {
            Cell::Number(n) => format_number(*n),
            Cell::Text(s) => s.clone(),
            Cell::Missing => String::new(),
        }
    }

    /// Numeric value of the cell; numeric text is parsed
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            Cell::Text(s) => s.trim().parse::<f64>().ok(),
            Cell::Missing => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    /// Empty cells and blank text both count as empty
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Missing => true,
            Cell::Text(s) => s.is_empty(),
            Cell::Number(_) => false,
        }
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

/// Row key of a [`Frame`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum IndexKey {
    Int(i64),
    Text(String),
}

impl IndexKey {
    pub fn label(&self) -> String {
        match self {
            IndexKey::Int(i) => i.to_string(),
            IndexKey::Text(s) => s.clone(),
        }
    }

    /// Coerce the key to an integer key, failing on non-numeric labels
    pub fn to_int(&self) -> StatResult<IndexKey> {
        match self {
            IndexKey::Int(i) => Ok(IndexKey::Int(*i)),
            IndexKey::Text(s) => s
                .parse::<i64>()
                .map(IndexKey::Int)
                .map_err(|_| StatError::Read(format!("Row key '{}' is not an integer", s))),
        }
    }
}

impl fmt::Display for IndexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexKey::Int(i) => write!(f, "{}", i),
            IndexKey::Text(s) => write!(f, "{}", s),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

//==============================================================================
// Frame
//==============================================================================

/// An ordered, row-keyed table.
///
/// Transformations consume the frame and return a new one, so a chain of
/// stages never observes a half-updated table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    pub index_name: String,
    pub columns: Vec<String>,
    pub index: Vec<IndexKey>,
    pub rows: Vec<Vec<Cell>>,
}

/// Time series with a single value column, keyed by period label
pub type NormalizedTimeSeries = Frame;

/// Year-indexed table with one column per country or region
pub type Panel = Frame;

impl Frame {
    pub fn new(index_name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            index_name: index_name.into(),
            columns,
            index: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Append a row; the number of cells must match the number of columns
    pub fn push_row(&mut self, key: IndexKey, cells: Vec<Cell>) -> StatResult<()> {
        if cells.len() != self.columns.len() {
            return Err(StatError::Read(format!(
                "Row '{}' has {} cells but the table has {} columns",
                key,
                cells.len(),
                self.columns.len()
            )));
        }
        self.index.push(key);
        self.rows.push(cells);
        Ok(())
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_position(name).is_some()
    }

    /// Cell at the first row whose key label equals `key`
    pub fn lookup(&self, key: &str, column: &str) -> Option<&Cell> {
        let col = self.column_position(column)?;
        let row = self.index.iter().position(|k| k.label() == key)?;
        self.rows.get(row).and_then(|cells| cells.get(col))
    }

    /// All cells of one column, top to bottom
    pub fn column_values(&self, name: &str) -> Option<Vec<&Cell>> {
        let col = self.column_position(name)?;
        Some(self.rows.iter().map(|cells| &cells[col]).collect())
    }

    /// Rename a single column; a no-op when `from` is absent
    pub fn rename_column(self, from: &str, to: &str) -> Self {
        self.rename_with(|_, name| (name == from).then(|| to.to_string()))
    }

    /// Rename every column for which `f(position, name)` returns a new name
    pub fn rename_with<F>(mut self, mut f: F) -> Self
    where
        F: FnMut(usize, &str) -> Option<String>,
    {
        for (position, name) in self.columns.iter_mut().enumerate() {
            if let Some(new_name) = f(position, name) {
                *name = new_name;
            }
        }
        self
    }

    /// Move a column into the row key, using each cell's label
    pub fn set_index(mut self, column: &str) -> StatResult<Self> {
        let col = self.column_position(column).ok_or_else(|| {
            StatError::Read(format!("Cannot index by missing column '{}'", column))
        })?;
        self.columns.remove(col);
        self.index = self
            .rows
            .iter_mut()
            .map(|cells| IndexKey::Text(cells.remove(col).label()))
            .collect();
        self.index_name = column.to_string();
        Ok(self)
    }

    /// Keep rows whose key satisfies `keep`, preserving order
    pub fn filter_rows<F>(self, keep: F) -> Self
    where
        F: Fn(&IndexKey) -> bool,
    {
        let (index, rows) = self
            .index
            .into_iter()
            .zip(self.rows)
            .filter(|(key, _)| keep(key))
            .unzip();
        Self {
            index_name: self.index_name,
            columns: self.columns,
            index,
            rows,
        }
    }

    /// Drop the first `n` rows
    pub fn skip_rows(mut self, n: usize) -> Self {
        let n = n.min(self.rows.len());
        self.index.drain(..n);
        self.rows.drain(..n);
        self
    }

    /// Keep columns whose name satisfies `keep`, preserving order
    pub fn retain_columns<F>(self, keep: F) -> Self
    where
        F: Fn(&str) -> bool,
    {
        let kept: Vec<usize> = (0..self.columns.len())
            .filter(|&i| keep(&self.columns[i]))
            .collect();
        let columns = kept.iter().map(|&i| self.columns[i].clone()).collect();
        let rows = self
            .rows
            .into_iter()
            .map(|cells| kept.iter().map(|&i| cells[i].clone()).collect())
            .collect();
        Self {
            index_name: self.index_name,
            columns,
            index: self.index,
            rows,
        }
    }

    pub fn drop_column(self, name: &str) -> Self {
        self.retain_columns(|c| c != name)
    }

    pub fn map_cells<F>(mut self, f: F) -> Self
    where
        F: Fn(Cell) -> Cell,
    {
        for cells in self.rows.iter_mut() {
            for cell in cells.iter_mut() {
                *cell = f(std::mem::replace(cell, Cell::Missing));
            }
        }
        self
    }

    pub fn map_index<F>(mut self, f: F) -> StatResult<Self>
    where
        F: Fn(&IndexKey) -> StatResult<IndexKey>,
    {
        self.index = self.index.iter().map(f).collect::<StatResult<_>>()?;
        Ok(self)
    }
}
