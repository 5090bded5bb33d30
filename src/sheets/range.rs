use crate::error::SheetError;
use serde::Serialize;
use std::fmt;

/// A cell value with its 1-based position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cell {
    pub row: u32,
    pub col: u32,
    pub value: String,
}

/// 1-based cell coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRef {
    pub row: u32,
    pub col: u32,
}

impl CellRef {
    pub fn new(row: u32, col: u32) -> Result<Self, SheetError> {
        if row == 0 || col == 0 {
            return Err(SheetError::InvalidRange(format!("R{}C{}", row, col)));
        }
        Ok(Self { row, col })
    }

    /// Parse an A1 reference such as `B12`. Letters are case-insensitive.
    pub fn parse(a1: &str) -> Result<Self, SheetError> {
        let invalid = || SheetError::InvalidRange(a1.to_string());

        let split = a1
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(invalid)?;
        let (letters, digits) = a1.split_at(split);
        if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(invalid());
        }

        let col = letters.chars().try_fold(0u32, |acc, c| {
            let digit = c.to_ascii_uppercase() as u32 - 'A' as u32 + 1;
            acc.checked_mul(26)?.checked_add(digit)
        });
        let row = digits.parse::<u32>().ok();

        match (row, col) {
            (Some(row), Some(col)) if row > 0 => Ok(Self { row, col }),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_letters(self.col), self.row)
    }
}

/// Column number (1-based) to letters: 1 -> A, 27 -> AA.
pub fn column_letters(mut col: u32) -> String {
    let mut letters = Vec::new();
    while col > 0 {
        let rem = (col - 1) % 26;
        letters.push(char::from(b'A' + rem as u8));
        col = (col - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// Inclusive rectangle of cells, normalized so `start` is the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    pub start: CellRef,
    pub end: CellRef,
}

impl CellRange {
    /// Parse `A1:C3`, or a single `B2`.
    pub fn parse(a1: &str) -> Result<Self, SheetError> {
        let a1 = a1.trim();
        let (first, second) = match a1.split_once(':') {
            Some((first, second)) => (CellRef::parse(first)?, CellRef::parse(second)?),
            None => {
                let cell = CellRef::parse(a1)?;
                (cell, cell)
            }
        };

        Ok(Self {
            start: CellRef {
                row: first.row.min(second.row),
                col: first.col.min(second.col),
            },
            end: CellRef {
                row: first.row.max(second.row),
                col: first.col.max(second.col),
            },
        })
    }

    pub fn single(cell: CellRef) -> Self {
        Self {
            start: cell,
            end: cell,
        }
    }

    /// Range qualified with a sheet title, quoted the way the Sheets API expects.
    pub fn qualified(&self, sheet_title: &str) -> String {
        format!("{}!{}", quote_sheet_title(sheet_title), self)
    }

    /// Lay `values` (as returned for this range) over the full rectangle.
    ///
    /// The API trims trailing blank rows and columns; those cells come back
    /// with an empty value.
    pub fn cells(&self, values: &[Vec<String>]) -> Vec<Cell> {
        let mut cells = Vec::new();
        for row in self.start.row..=self.end.row {
            let row_values = values.get((row - self.start.row) as usize);
            for col in self.start.col..=self.end.col {
                let value = row_values
                    .and_then(|r| r.get((col - self.start.col) as usize))
                    .cloned()
                    .unwrap_or_default();
                cells.push(Cell { row, col, value });
            }
        }
        cells
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}:{}", self.start, self.end)
        }
    }
}

pub fn quote_sheet_title(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cell_ref() {
        assert_eq!(CellRef::parse("A1").unwrap(), CellRef { row: 1, col: 1 });
        assert_eq!(CellRef::parse("c3").unwrap(), CellRef { row: 3, col: 3 });
        assert_eq!(CellRef::parse("AA10").unwrap(), CellRef { row: 10, col: 27 });
        assert!(CellRef::parse("A0").is_err());
        assert!(CellRef::parse("12").is_err());
        assert!(CellRef::parse("A").is_err());
        assert!(CellRef::parse("A1B").is_err());
        assert!(CellRef::parse("").is_err());
    }

    #[test]
    fn test_column_letters() {
        assert_eq!(column_letters(1), "A");
        assert_eq!(column_letters(26), "Z");
        assert_eq!(column_letters(27), "AA");
        assert_eq!(column_letters(702), "ZZ");
        assert_eq!(column_letters(703), "AAA");
    }

    #[test]
    fn test_parse_range_normalizes_corners() {
        let range = CellRange::parse("C3:A1").unwrap();
        assert_eq!(range.start, CellRef { row: 1, col: 1 });
        assert_eq!(range.end, CellRef { row: 3, col: 3 });
        assert_eq!(range.to_string(), "A1:C3");

        let single = CellRange::parse("B2").unwrap();
        assert_eq!(single.to_string(), "B2");
        assert!(CellRange::parse("A1:").is_err());
    }

    #[test]
    fn test_qualified_quotes_title() {
        let range = CellRange::parse("A1:B2").unwrap();
        assert_eq!(range.qualified("Sheet1"), "'Sheet1'!A1:B2");
        assert_eq!(range.qualified("Ken's lines"), "'Ken''s lines'!A1:B2");
    }

    #[test]
    fn test_cells_fill_trimmed_values() {
        let range = CellRange::parse("B2:C3").unwrap();
        let values = vec![vec!["x".to_string()]];
        let cells = range.cells(&values);

        assert_eq!(
            cells,
            vec![
                Cell { row: 2, col: 2, value: "x".to_string() },
                Cell { row: 2, col: 3, value: String::new() },
                Cell { row: 3, col: 2, value: String::new() },
                Cell { row: 3, col: 3, value: String::new() },
            ]
        );
    }
}
