//! In-memory table model shared by every pipeline stage.
//!
//! A [`Table`] keeps each cell as the raw text read from the source
//! (`None` for an empty field). Numeric meaning is obtained on demand via
//! [`coerce_number`], so exports reproduce the source values byte for byte.

use std::fmt;

pub type Cell = Option<String>;
pub type Record = Vec<Cell>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Record>,
}

impl Table {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    pub fn with_rows(headers: Vec<String>, rows: Vec<Record>) -> Self {
        Self { headers, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Returns the cell text at `row`/`column`, treating missing trailing cells as null.
    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|record| record.get(column))
            .and_then(|cell| cell.as_deref())
    }

    /// Builds a new table holding the rows at `indices`, in the order given.
    pub fn select_rows(&self, indices: &[usize]) -> Table {
        let rows = indices
            .iter()
            .filter_map(|&idx| self.rows.get(idx).cloned())
            .collect();
        Table {
            headers: self.headers.clone(),
            rows,
        }
    }

    /// Projects every row onto `columns` (header indices).
    pub fn select_columns(&self, columns: &[usize]) -> Table {
        let headers = columns
            .iter()
            .map(|&idx| self.headers[idx].clone())
            .collect();
        let rows = self
            .rows
            .iter()
            .map(|record| {
                columns
                    .iter()
                    .map(|&idx| record.get(idx).cloned().flatten())
                    .collect()
            })
            .collect();
        Table { headers, rows }
    }

    pub fn display_rows(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|record| {
                (0..self.headers.len())
                    .map(|idx| {
                        record
                            .get(idx)
                            .and_then(|cell| cell.as_deref())
                            .unwrap_or("")
                            .to_string()
                    })
                    .collect()
            })
            .collect()
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} column(s) x {} row(s)",
            self.headers.len(),
            self.rows.len()
        )
    }
}

/// Converts raw cell text into a raw [`Cell`]; empty text becomes null.
pub fn cell_from_raw(raw: &str) -> Cell {
    if raw.is_empty() {
        None
    } else {
        Some(raw.to_string())
    }
}

/// Lenient numeric coercion: surrounding whitespace and thousands separators
/// are ignored, anything else that does not parse as a finite number yields `None`.
pub fn coerce_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let parsed = if trimmed.contains(',') {
        trimmed.replace(',', "").parse::<f64>().ok()
    } else {
        trimmed.parse::<f64>().ok()
    };
    parsed.filter(|value| value.is_finite())
}

pub fn coerce_cell(cell: Option<&str>) -> Option<f64> {
    cell.and_then(coerce_number)
}
