//! In-memory grid backing a table window.

use unicode_width::UnicodeWidthStr;

use crate::delimited::{self, Delimiter};

#[derive(Debug, Clone, Default)]
pub struct Table {
    rows: Vec<Vec<String>>,
    delimiter: Delimiter,
    dirty: bool,
}

impl Table {
    pub fn new(delimiter: Delimiter) -> Self {
        Self {
            rows: Vec::new(),
            delimiter,
            dirty: false,
        }
    }

    pub fn parse(text: &str, delimiter: Delimiter) -> Self {
        Self {
            rows: delimited::parse(text, delimiter),
            delimiter,
            dirty: false,
        }
    }

    pub fn to_delimited(&self) -> String {
        delimited::write(&self.rows, self.delimiter)
    }

    pub fn delimiter(&self) -> Delimiter {
        self.delimiter
    }

    /// Changing the delimiter changes the file contents, so the table becomes dirty.
    pub fn set_delimiter(&mut self, delimiter: Delimiter) {
        if self.delimiter != delimiter {
            self.delimiter = delimiter;
            self.dirty = true;
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Width of the widest row; rows may be ragged.
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Sets a cell, growing the grid if needed. Returns whether anything changed.
    pub fn set_cell(&mut self, row: usize, col: usize, value: impl Into<String>) -> bool {
        let value = value.into();
        if self.cell(row, col) == value {
            return false;
        }

        if self.rows.len() <= row {
            self.rows.resize_with(row + 1, Vec::new);
        }
        let cells = &mut self.rows[row];
        if cells.len() <= col {
            cells.resize(col + 1, String::new());
        }
        cells[col] = value;
        self.dirty = true;
        true
    }

    pub fn insert_row(&mut self, at: usize) {
        let at = at.min(self.rows.len());
        let width = self.column_count().max(1);
        self.rows.insert(at, vec![String::new(); width]);
        self.dirty = true;
    }

    pub fn delete_row(&mut self, at: usize) -> bool {
        if at >= self.rows.len() {
            return false;
        }
        self.rows.remove(at);
        self.dirty = true;
        true
    }

    pub fn insert_column(&mut self, at: usize) {
        if self.rows.is_empty() {
            self.rows.push(vec![String::new()]);
        }
        let at = at.min(self.column_count());
        for cells in &mut self.rows {
            if at <= cells.len() {
                cells.insert(at, String::new());
            }
        }
        self.dirty = true;
    }

    pub fn delete_column(&mut self, at: usize) -> bool {
        if at >= self.column_count() {
            return false;
        }
        for cells in &mut self.rows {
            if at < cells.len() {
                cells.remove(at);
            }
        }
        self.dirty = true;
        true
    }

    /// Display width of the widest cell in `col`, clamped to `min..=max`.
    /// Multi-line cells count their widest line.
    pub fn column_width(&self, col: usize, min: usize, max: usize) -> usize {
        let widest = self
            .rows
            .iter()
            .filter_map(|r| r.get(col))
            .flat_map(|cell| cell.lines())
            .map(UnicodeWidthStr::width)
            .max()
            .unwrap_or(0);
        widest.clamp(min, max.max(min))
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::parse("name,age\nAda,36\nLinus\n", Delimiter::Comma)
    }

    #[test]
    fn test_parse_is_clean() {
        let table = sample();
        assert!(!table.is_dirty());
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.column_count(), 2);
        assert_eq!(table.cell(2, 0), "Linus");
        assert_eq!(table.cell(2, 1), "");
        assert_eq!(table.cell(10, 10), "");
    }

    #[test]
    fn test_set_cell_marks_dirty_only_on_change() {
        let mut table = sample();
        assert!(!table.set_cell(1, 0, "Ada"));
        assert!(!table.is_dirty());

        assert!(table.set_cell(1, 1, "37"));
        assert!(table.is_dirty());
        assert_eq!(table.cell(1, 1), "37");

        table.mark_saved();
        assert!(!table.is_dirty());
    }

    #[test]
    fn test_set_cell_grows_grid() {
        let mut table = Table::new(Delimiter::Comma);
        table.set_cell(2, 3, "x");
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.column_count(), 4);
        assert_eq!(table.cell(2, 3), "x");
        assert_eq!(table.cell(0, 0), "");
    }

    #[test]
    fn test_setting_empty_cell_to_empty_is_noop() {
        let mut table = Table::new(Delimiter::Comma);
        assert!(!table.set_cell(5, 5, ""));
        assert_eq!(table.row_count(), 0);
    }

    #[test]
    fn test_insert_and_delete_rows() {
        let mut table = sample();
        table.insert_row(1);
        assert_eq!(table.row_count(), 4);
        assert_eq!(table.cell(1, 0), "");
        assert_eq!(table.cell(2, 0), "Ada");

        assert!(table.delete_row(1));
        assert_eq!(table.cell(1, 0), "Ada");
        assert!(!table.delete_row(99));

        table.insert_row(99);
        assert_eq!(table.row_count(), 4);
    }

    #[test]
    fn test_insert_and_delete_columns() {
        let mut table = sample();
        table.insert_column(1);
        assert_eq!(table.column_count(), 3);
        assert_eq!(table.cell(0, 0), "name");
        assert_eq!(table.cell(0, 1), "");
        assert_eq!(table.cell(0, 2), "age");
        assert_eq!(table.cell(2, 0), "Linus");

        assert!(table.delete_column(0));
        assert_eq!(table.cell(0, 1), "age");
        assert_eq!(table.cell(2, 0), "");
        assert!(!table.delete_column(5));
    }

    #[test]
    fn test_insert_column_into_empty_table() {
        let mut table = Table::new(Delimiter::Tab);
        table.insert_column(0);
        assert_eq!(table.row_count(), 1);
        assert_eq!(table.column_count(), 2);
        assert!(table.is_dirty());
    }

    #[test]
    fn test_column_width() {
        let mut table = sample();
        assert_eq!(table.column_width(0, 3, 40), 5);
        assert_eq!(table.column_width(1, 3, 40), 3);
        assert_eq!(table.column_width(0, 1, 4), 4);

        table.set_cell(0, 1, "東京");
        assert_eq!(table.column_width(1, 1, 40), 4);

        table.set_cell(1, 1, "short\nmuch longer line");
        assert_eq!(table.column_width(1, 1, 40), 16);
    }

    #[test]
    fn test_set_delimiter() {
        let mut table = sample();
        table.set_delimiter(Delimiter::Comma);
        assert!(!table.is_dirty());
        table.set_delimiter(Delimiter::Tab);
        assert!(table.is_dirty());
        assert_eq!(table.to_delimited(), "name\tage\nAda\t36\nLinus\n");
    }
}
