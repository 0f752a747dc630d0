//! In-memory worksheet grid.
//!
//! Workbooks are read with calamine and every worksheet is copied into a
//! `Sheet` with absolute (0-based) coordinates, so the layout heuristics
//! work on plain data and can be tested without a workbook file.

use calamine::{Data, Range};

/// A worksheet cell value, reduced to what the timetable layout uses.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
}

static EMPTY: Cell = Cell::Empty;

impl Cell {
    /// Text content, if this is a text cell.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    /// The trimmed display value of a non-blank cell.
    ///
    /// Whole numbers render without a fractional part.
    pub fn value_string(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => Some(format!("{}", *n as i64)),
            Cell::Number(n) => Some(n.to_string()),
            Cell::Text(s) => {
                let s = s.trim();
                (!s.is_empty()).then(|| s.to_string())
            }
        }
    }
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Int(i) => Cell::Number(*i as f64),
            Data::Float(f) => Cell::Number(*f),
            Data::String(s) => Cell::Text(s.clone()),
            Data::Bool(b) => Cell::Text(b.to_string()),
            Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
            _ => Cell::Empty,
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

/// One worksheet: its name and a row-major grid of cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    /// False for sheets hidden in the workbook.
    pub visible: bool,
    rows: Vec<Vec<Cell>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self {
            name: name.into(),
            visible: true,
            rows,
        }
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Copy a calamine range into absolute sheet coordinates.
    ///
    /// calamine ranges start at the first used cell; leading empty rows and
    /// columns are restored so that "first column" means column A.
    pub fn from_range(name: impl Into<String>, range: &Range<Data>) -> Self {
        let Some((row0, col0)) = range.start() else {
            return Self::new(name, Vec::new());
        };
        let (row0, col0) = (row0 as usize, col0 as usize);

        let mut rows: Vec<Vec<Cell>> = vec![Vec::new(); row0];
        for row in range.rows() {
            let mut cells = vec![Cell::Empty; col0];
            cells.extend(row.iter().map(Cell::from));
            rows.push(cells);
        }

        Self::new(name, rows)
    }

    /// The cell at (row, col); out-of-bounds positions read as empty.
    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Width of the widest row.
    pub fn col_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Cells of one row (empty slice when out of bounds).
    pub fn row(&self, row: usize) -> &[Cell] {
        self.rows.get(row).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Build a sheet from string rows; empty strings become empty cells.
#[cfg(test)]
pub(crate) fn sheet_from_strs(name: &str, rows: &[&[&str]]) -> Sheet {
    let rows = rows
        .iter()
        .map(|r| {
            r.iter()
                .map(|s| {
                    if s.is_empty() {
                        Cell::Empty
                    } else {
                        Cell::Text((*s).to_string())
                    }
                })
                .collect()
        })
        .collect();
    Sheet::new(name, rows)
}
