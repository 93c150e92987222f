use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tablecore::{Delimiter, Table};

use crate::config::TableConfig;
use crate::editor_pane::EditAction;
use crate::text_width;

const MAX_OVERRIDE_WIDTH: usize = 120;
const WIDTH_STEP: usize = 2;
/// Blank columns between two cells.
pub const COLUMN_SPACING: usize = 1;

/// Table menu operations on the selected cell's row or column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableAction {
    InsertRowAbove,
    InsertRowBelow,
    DeleteRow,
    InsertColumnLeft,
    InsertColumnRight,
    DeleteColumn,
    WidenColumn,
    NarrowColumn,
    ToggleHeaderRow,
}

/// In-progress edit of the selected cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellEdit {
    pub buffer: String,
    /// Char offset inside `buffer`
    pub cursor: usize,
}

impl CellEdit {
    fn new(buffer: String) -> Self {
        let cursor = buffer.chars().count();
        Self { buffer, cursor }
    }

    fn byte_index(&self) -> usize {
        self.buffer
            .char_indices()
            .nth(self.cursor)
            .map(|(idx, _)| idx)
            .unwrap_or(self.buffer.len())
    }

    fn insert(&mut self, c: char) {
        let idx = self.byte_index();
        self.buffer.insert(idx, c);
        self.cursor += 1;
    }

    fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let idx = self.byte_index();
            self.buffer.remove(idx);
        }
    }

    fn delete(&mut self) {
        if self.cursor < self.buffer.chars().count() {
            let idx = self.byte_index();
            self.buffer.remove(idx);
        }
    }
}

/// Contents of a table window.
pub struct TablePane {
    pub table: Table,
    path: Option<PathBuf>,
    row: usize,
    col: usize,
    row_offset: usize,
    col_offset: usize,
    view_width: usize,
    view_height: usize,
    edit: Option<CellEdit>,
    width_overrides: HashMap<usize, usize>,
    header_row: bool,
    min_width: usize,
    max_width: usize,
    clipboard: String,
}

impl TablePane {
    pub fn new(table: Table, path: Option<PathBuf>, config: &TableConfig) -> Self {
        Self {
            table,
            path,
            row: 0,
            col: 0,
            row_offset: 0,
            col_offset: 0,
            view_width: 80,
            view_height: 20,
            edit: None,
            width_overrides: HashMap::new(),
            header_row: config.header_row,
            min_width: config.min_column_width,
            max_width: config.max_column_width,
            clipboard: String::new(),
        }
    }

    /// Builds a pane from file contents. CSV/TSV names pick their delimiter,
    /// anything else is sniffed.
    pub fn from_file(path: PathBuf, content: &str, config: &TableConfig) -> Self {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let delimiter = if tablecore::is_table_file(Some(&name)) {
            Delimiter::for_filename(&name)
        } else {
            Delimiter::sniff(content)
        };
        Self::new(Table::parse(content, delimiter), Some(path), config)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn set_path(&mut self, path: PathBuf) {
        if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
            if tablecore::is_table_file(Some(name)) {
                self.table.set_delimiter(Delimiter::for_filename(name));
            }
        }
        self.path = Some(path);
    }

    pub fn is_dirty(&self) -> bool {
        self.table.is_dirty()
    }

    /// Serialized table. A pending cell edit is committed first.
    pub fn content(&mut self) -> String {
        self.commit_edit();
        self.table.to_delimited()
    }

    pub fn mark_saved(&mut self) {
        self.table.mark_saved();
    }

    pub fn selection(&self) -> (usize, usize) {
        (self.row, self.col)
    }

    pub fn offsets(&self) -> (usize, usize) {
        (self.row_offset, self.col_offset)
    }

    pub fn editing(&self) -> Option<&CellEdit> {
        self.edit.as_ref()
    }

    pub fn header_row(&self) -> bool {
        self.header_row
    }

    /// Rows shown on screen; an empty table still shows one cell.
    pub fn display_rows(&self) -> usize {
        self.table.row_count().max(1)
    }

    pub fn display_columns(&self) -> usize {
        self.table.column_count().max(1)
    }

    pub fn column_width(&self, col: usize) -> usize {
        self.width_overrides
            .get(&col)
            .copied()
            .unwrap_or_else(|| self.table.column_width(col, self.min_width, self.max_width))
    }

    /// Columns that fit in `width` starting at the horizontal scroll offset,
    /// as `(column, width)`. The last one may be cut short.
    pub fn visible_columns(&self, width: usize) -> Vec<(usize, usize)> {
        let mut columns = Vec::new();
        let mut used = 0;
        for col in self.col_offset..self.display_columns() {
            if used >= width {
                break;
            }
            let w = self.column_width(col).min(width - used);
            columns.push((col, w));
            used += w + COLUMN_SPACING;
        }
        columns
    }

    pub fn set_viewport(&mut self, width: usize, height: usize) {
        self.view_width = width.max(1);
        self.view_height = height.max(1);
        self.scroll_to_selection();
    }

    /// Screen offset of the edit cursor inside the content area.
    pub fn cursor_offset(&self) -> Option<(usize, usize)> {
        let edit = self.edit.as_ref()?;
        let mut x = 0;
        for (col, w) in self.visible_columns(self.view_width) {
            if col == self.col {
                let inner = text_width::char_index_to_col(&edit.buffer, edit.cursor);
                return Some((x + inner.min(w), self.row.checked_sub(self.row_offset)?));
            }
            x += w + COLUMN_SPACING;
        }
        None
    }

    pub fn position_label(&self) -> String {
        format!(
            "R{} C{}  {}x{} {}",
            self.row + 1,
            self.col + 1,
            self.table.row_count(),
            self.table.column_count(),
            self.table.delimiter().name()
        )
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if self.edit.is_some() {
            return self.handle_edit_key(key);
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let alt = key.modifiers.contains(KeyModifiers::ALT);

        match key.code {
            KeyCode::Char(c) if ctrl => match c.to_ascii_lowercase() {
                'x' => self.edit(EditAction::Cut),
                'c' => self.edit(EditAction::Copy),
                'v' => self.edit(EditAction::Paste),
                _ => false,
            },
            KeyCode::Char(_) if alt => false,
            KeyCode::Char(c) => {
                self.edit = Some(CellEdit::new(c.to_string()));
                true
            }
            KeyCode::Enter | KeyCode::F(2) => {
                self.begin_edit();
                true
            }
            KeyCode::Delete => self.edit(EditAction::Clear),
            KeyCode::Up => self.select(self.row.saturating_sub(1), self.col),
            KeyCode::Down => self.select(self.row + 1, self.col),
            KeyCode::Left => self.select(self.row, self.col.saturating_sub(1)),
            KeyCode::Right => self.select(self.row, self.col + 1),
            KeyCode::Tab => self.tab_forward(),
            KeyCode::BackTab => self.tab_backward(),
            KeyCode::Home if ctrl => self.select(0, 0),
            KeyCode::End if ctrl => self.select(usize::MAX, usize::MAX),
            KeyCode::Home => self.select(self.row, 0),
            KeyCode::End => self.select(self.row, usize::MAX),
            KeyCode::PageUp => self.select(self.row.saturating_sub(self.view_height), self.col),
            KeyCode::PageDown => self.select(self.row + self.view_height, self.col),
            _ => false,
        }
    }

    fn handle_edit_key(&mut self, key: KeyEvent) -> bool {
        let Some(edit) = self.edit.as_mut() else {
            return false;
        };

        match key.code {
            KeyCode::Esc => {
                self.edit = None;
            }
            KeyCode::Enter => {
                self.commit_edit();
            }
            KeyCode::Tab => {
                self.commit_edit();
                self.tab_forward();
            }
            KeyCode::Up => {
                self.commit_edit();
                self.select(self.row.saturating_sub(1), self.col);
            }
            KeyCode::Down => {
                self.commit_edit();
                self.select(self.row + 1, self.col);
            }
            KeyCode::Char(_)
                if key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                return false;
            }
            KeyCode::Char(c) => edit.insert(c),
            KeyCode::Backspace => edit.backspace(),
            KeyCode::Delete => edit.delete(),
            KeyCode::Left => edit.cursor = edit.cursor.saturating_sub(1),
            KeyCode::Right => edit.cursor = (edit.cursor + 1).min(edit.buffer.chars().count()),
            KeyCode::Home => edit.cursor = 0,
            KeyCode::End => edit.cursor = edit.buffer.chars().count(),
            _ => return false,
        }
        true
    }

    pub fn begin_edit(&mut self) {
        let current = self.table.cell(self.row, self.col).to_string();
        self.edit = Some(CellEdit::new(current));
    }

    /// Writes the edit buffer into the table. Returns whether a change was made.
    pub fn commit_edit(&mut self) -> bool {
        match self.edit.take() {
            Some(edit) => self.table.set_cell(self.row, self.col, edit.buffer),
            None => false,
        }
    }

    pub fn cancel_edit(&mut self) {
        self.edit = None;
    }

    /// Moves the selection, clamped to the displayed grid.
    pub fn select(&mut self, row: usize, col: usize) -> bool {
        self.row = row.min(self.display_rows() - 1);
        self.col = col.min(self.display_columns() - 1);
        self.scroll_to_selection();
        true
    }

    fn tab_forward(&mut self) -> bool {
        if self.col + 1 < self.display_columns() {
            self.select(self.row, self.col + 1)
        } else if self.row + 1 < self.display_rows() {
            self.select(self.row + 1, 0)
        } else {
            true
        }
    }

    fn tab_backward(&mut self) -> bool {
        if self.col > 0 {
            self.select(self.row, self.col - 1)
        } else if self.row > 0 {
            self.select(self.row - 1, usize::MAX)
        } else {
            true
        }
    }

    fn scroll_to_selection(&mut self) {
        if self.row < self.row_offset {
            self.row_offset = self.row;
        } else if self.row >= self.row_offset + self.view_height {
            self.row_offset = self.row + 1 - self.view_height;
        }

        if self.col < self.col_offset {
            self.col_offset = self.col;
        }
        while self.col_offset < self.col {
            let span: usize = (self.col_offset..=self.col)
                .map(|col| self.column_width(col) + COLUMN_SPACING)
                .sum();
            if span <= self.view_width + COLUMN_SPACING {
                break;
            }
            self.col_offset += 1;
        }
    }

    pub fn edit(&mut self, action: EditAction) -> bool {
        match action {
            // Cell edits are committed immediately; there is no history
            EditAction::Undo | EditAction::Redo => false,
            EditAction::Copy => {
                self.clipboard = self.table.cell(self.row, self.col).to_string();
                true
            }
            EditAction::Cut => {
                self.clipboard = self.table.cell(self.row, self.col).to_string();
                self.table.set_cell(self.row, self.col, "");
                true
            }
            EditAction::Paste => {
                let value = self.clipboard.clone();
                self.table.set_cell(self.row, self.col, value);
                true
            }
            EditAction::Clear => {
                self.table.set_cell(self.row, self.col, "");
                true
            }
        }
    }

    pub fn apply(&mut self, action: TableAction) {
        self.commit_edit();
        match action {
            TableAction::InsertRowAbove => self.table.insert_row(self.row),
            TableAction::InsertRowBelow => {
                let at = (self.row + 1).min(self.table.row_count());
                self.table.insert_row(at);
                self.select(at, self.col);
            }
            TableAction::DeleteRow => {
                self.table.delete_row(self.row);
                self.select(self.row, self.col);
            }
            TableAction::InsertColumnLeft => {
                self.table.insert_column(self.col);
                self.shift_overrides(self.col, true);
            }
            TableAction::InsertColumnRight => {
                let at = (self.col + 1).min(self.table.column_count());
                self.table.insert_column(at);
                self.shift_overrides(at, true);
                self.select(self.row, at);
            }
            TableAction::DeleteColumn => {
                if self.table.delete_column(self.col) {
                    self.shift_overrides(self.col, false);
                }
                self.select(self.row, self.col);
            }
            TableAction::WidenColumn => {
                let width = (self.column_width(self.col) + WIDTH_STEP).min(MAX_OVERRIDE_WIDTH);
                self.width_overrides.insert(self.col, width);
            }
            TableAction::NarrowColumn => {
                let width = self.column_width(self.col).saturating_sub(WIDTH_STEP).max(1);
                self.width_overrides.insert(self.col, width);
            }
            TableAction::ToggleHeaderRow => self.header_row = !self.header_row,
        }
    }

    /// Keeps width overrides attached to their columns across inserts/deletes.
    fn shift_overrides(&mut self, at: usize, inserted: bool) {
        let old = std::mem::take(&mut self.width_overrides);
        for (col, width) in old {
            let moved = match (col.cmp(&at), inserted) {
                (std::cmp::Ordering::Less, _) => Some(col),
                (_, true) => Some(col + 1),
                (std::cmp::Ordering::Equal, false) => None,
                (std::cmp::Ordering::Greater, false) => Some(col - 1),
            };
            if let Some(col) = moved {
                self.width_overrides.insert(col, width);
            }
        }
    }

    /// Mouse click at an offset inside the content area.
    pub fn click(&mut self, x: usize, y: usize) {
        self.commit_edit();
        let row = self.row_offset + y;
        let mut start = 0;
        let mut target = None;
        for (col, w) in self.visible_columns(self.view_width) {
            if x < start + w + COLUMN_SPACING {
                target = Some(col);
                break;
            }
            start += w + COLUMN_SPACING;
        }
        let col = target.unwrap_or(self.display_columns() - 1);
        self.select(row, col);
    }

    pub fn scroll(&mut self, delta: isize) {
        let max_offset = self.display_rows().saturating_sub(1) as isize;
        self.row_offset = (self.row_offset as isize + delta).clamp(0, max_offset) as usize;
    }
}
