use ropey::Rope;
use std::cmp;

use crate::text_width;

const HISTORY_LIMIT: usize = 100;

/// A position in the buffer: line index and char offset within the line.
pub type Position = (usize, usize);

#[derive(Clone)]
pub struct Editor {
    rope: Rope,
    cursor_line: usize,
    cursor_col: usize,
    viewport_offset: usize,
    viewport_height: usize,
    // First visible display column
    viewport_col: usize,
    viewport_width: usize,
    modified: bool,
    clipboard: String,
    // Undo/Redo support
    history: Vec<EditorState>,
    history_index: usize,
    // Where a shift-selection started
    anchor: Option<Position>,
    tab_size: usize,
    use_spaces: bool,
}

#[derive(Clone)]
struct EditorState {
    content: String,
    cursor_line: usize,
    cursor_col: usize,
}

impl Editor {
    pub fn new() -> Self {
        Self {
            rope: Rope::new(),
            cursor_line: 0,
            cursor_col: 0,
            viewport_offset: 0,
            viewport_height: 24, // Default, updated on draw
            viewport_col: 0,
            viewport_width: 80,
            modified: false,
            clipboard: String::new(),
            history: vec![EditorState {
                content: String::new(),
                cursor_line: 0,
                cursor_col: 0,
            }],
            history_index: 0,
            anchor: None,
            tab_size: 4,
            use_spaces: true,
        }
    }

    pub fn set_content(&mut self, content: String) {
        self.rope = Rope::from_str(&content);
        self.cursor_line = 0;
        self.cursor_col = 0;
        self.viewport_offset = 0;
        self.viewport_col = 0;
        self.modified = false;
        self.anchor = None;

        self.history = vec![EditorState {
            content,
            cursor_line: 0,
            cursor_col: 0,
        }];
        self.history_index = 0;
    }

    pub fn get_content(&self) -> String {
        self.rope.to_string()
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn mark_saved(&mut self) {
        self.modified = false;
    }

    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    pub fn cursor_position(&self) -> Position {
        (self.cursor_line, self.cursor_col)
    }

    pub fn set_cursor_position(&mut self, line: usize, col: usize) {
        self.cursor_line = line.min(self.rope.len_lines().saturating_sub(1));
        self.cursor_col = col.min(self.line_len(self.cursor_line));
        self.adjust_viewport();
    }

    /// Line text without its line break.
    pub fn line_text(&self, line: usize) -> String {
        match self.rope.get_line(line) {
            Some(slice) => {
                let mut text = slice.to_string();
                while text.ends_with('\n') || text.ends_with('\r') {
                    text.pop();
                }
                text
            }
            None => String::new(),
        }
    }

    /// Screen column of the cursor within its line.
    pub fn cursor_display_col(&self) -> usize {
        text_width::char_index_to_col(&self.line_text(self.cursor_line), self.cursor_col)
    }

    pub fn set_tab_config(&mut self, tab_size: usize, use_spaces: bool) {
        self.tab_size = tab_size;
        self.use_spaces = use_spaces;
    }

    pub fn set_viewport_height(&mut self, height: usize) {
        self.viewport_height = height.max(1);
        self.adjust_viewport();
    }

    pub fn set_viewport_width(&mut self, width: usize) {
        self.viewport_width = width.max(1);
        self.adjust_viewport();
    }

    pub fn viewport_offset(&self) -> usize {
        self.viewport_offset
    }

    pub fn viewport_col(&self) -> usize {
        self.viewport_col
    }

    pub fn viewport_lines(&self) -> Vec<String> {
        let end_line = cmp::min(
            self.viewport_offset + self.viewport_height,
            self.rope.len_lines(),
        );
        (self.viewport_offset..end_line)
            .map(|i| self.line_text(i))
            .collect()
    }

    /// Scrolls the view without moving the cursor.
    pub fn scroll_by(&mut self, delta: isize) {
        let max_offset = self.rope.len_lines().saturating_sub(1);
        let offset = self.viewport_offset as isize + delta;
        self.viewport_offset = offset.clamp(0, max_offset as isize) as usize;
    }

    pub fn insert_char(&mut self, c: char) {
        self.delete_selection_inner();
        let char_idx = self.cursor_char_idx();
        self.rope.insert_char(char_idx, c);
        self.cursor_col += 1;
        self.modified = true;
        self.save_state();
    }

    pub fn insert_str(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.delete_selection_inner();
        let char_idx = self.cursor_char_idx();
        self.rope.insert(char_idx, text);
        let (line, col) = self.char_idx_to_position(char_idx + text.chars().count());
        self.cursor_line = line;
        self.cursor_col = col;
        self.modified = true;
        self.adjust_viewport();
        self.save_state();
    }

    pub fn insert_newline(&mut self) {
        self.delete_selection_inner();
        let char_idx = self.cursor_char_idx();
        self.rope.insert_char(char_idx, '\n');
        self.cursor_line += 1;
        self.cursor_col = 0;
        self.modified = true;
        self.adjust_viewport();
        self.save_state();
    }

    pub fn insert_tab(&mut self) {
        if self.use_spaces {
            let spaces = self.tab_size - (self.cursor_col % self.tab_size.max(1));
            self.insert_str(&" ".repeat(spaces));
        } else {
            self.insert_char('\t');
        }
    }

    pub fn delete_char_backward(&mut self) {
        if self.delete_selection_inner() {
            self.save_state();
            return;
        }

        let char_idx = self.cursor_char_idx();
        if char_idx == 0 {
            return;
        }
        let (line, col) = self.char_idx_to_position(char_idx - 1);
        self.rope.remove(char_idx - 1..char_idx);
        self.cursor_line = line;
        self.cursor_col = col;
        self.modified = true;
        self.adjust_viewport();
        self.save_state();
    }

    pub fn delete_char_forward(&mut self) {
        if self.delete_selection_inner() {
            self.save_state();
            return;
        }

        let char_idx = self.cursor_char_idx();
        if char_idx < self.rope.len_chars() {
            self.rope.remove(char_idx..char_idx + 1);
            self.modified = true;
            self.save_state();
        }
    }

    pub fn move_left(&mut self, select: bool) {
        self.begin_move(select);
        if self.cursor_col > 0 {
            self.cursor_col -= 1;
        } else if self.cursor_line > 0 {
            self.cursor_line -= 1;
            self.cursor_col = self.line_len(self.cursor_line);
        }
        self.adjust_viewport();
    }

    pub fn move_right(&mut self, select: bool) {
        self.begin_move(select);
        if self.cursor_col < self.line_len(self.cursor_line) {
            self.cursor_col += 1;
        } else if self.cursor_line + 1 < self.rope.len_lines() {
            self.cursor_line += 1;
            self.cursor_col = 0;
        }
        self.adjust_viewport();
    }

    pub fn move_up(&mut self, select: bool) {
        self.begin_move(select);
        if self.cursor_line > 0 {
            self.cursor_line -= 1;
            self.clamp_cursor_col();
            self.adjust_viewport();
        }
    }

    pub fn move_down(&mut self, select: bool) {
        self.begin_move(select);
        if self.cursor_line + 1 < self.rope.len_lines() {
            self.cursor_line += 1;
            self.clamp_cursor_col();
            self.adjust_viewport();
        }
    }

    pub fn move_to_line_start(&mut self, select: bool) {
        self.begin_move(select);
        self.cursor_col = 0;
        self.adjust_viewport();
    }

    pub fn move_to_line_end(&mut self, select: bool) {
        self.begin_move(select);
        self.cursor_col = self.line_len(self.cursor_line);
        self.adjust_viewport();
    }

    pub fn move_to_document_start(&mut self, select: bool) {
        self.begin_move(select);
        self.cursor_line = 0;
        self.cursor_col = 0;
        self.adjust_viewport();
    }

    pub fn move_to_document_end(&mut self, select: bool) {
        self.begin_move(select);
        self.cursor_line = self.rope.len_lines().saturating_sub(1);
        self.cursor_col = self.line_len(self.cursor_line);
        self.adjust_viewport();
    }

    pub fn page_up(&mut self, select: bool) {
        self.begin_move(select);
        self.cursor_line = self.cursor_line.saturating_sub(self.viewport_height);
        self.viewport_offset = self.viewport_offset.saturating_sub(self.viewport_height);
        self.clamp_cursor_col();
        self.adjust_viewport();
    }

    pub fn page_down(&mut self, select: bool) {
        self.begin_move(select);
        let max_line = self.rope.len_lines().saturating_sub(1);
        self.cursor_line = cmp::min(self.cursor_line + self.viewport_height, max_line);
        self.viewport_offset = cmp::min(
            self.viewport_offset + self.viewport_height,
            max_line.saturating_sub(self.viewport_height.saturating_sub(1)),
        );
        self.clamp_cursor_col();
        self.adjust_viewport();
    }

    /// Puts the cursor under a screen position relative to the text area.
    pub fn click_to(&mut self, screen_row: usize, display_col: usize) {
        self.anchor = None;
        let line = cmp::min(
            self.viewport_offset + screen_row,
            self.rope.len_lines().saturating_sub(1),
        );
        self.cursor_line = line;
        self.cursor_col = text_width::col_to_char_index(
            &self.line_text(line),
            self.viewport_col + display_col,
        );
        self.adjust_viewport();
    }

    pub fn select_all(&mut self) {
        self.anchor = Some((0, 0));
        self.cursor_line = self.rope.len_lines().saturating_sub(1);
        self.cursor_col = self.line_len(self.cursor_line);
        self.adjust_viewport();
    }

    pub fn clear_selection(&mut self) {
        self.anchor = None;
    }

    /// Ordered selection bounds, `None` when nothing is selected.
    pub fn selection(&self) -> Option<(Position, Position)> {
        let anchor = self.anchor?;
        let cursor = (self.cursor_line, self.cursor_col);
        match anchor.cmp(&cursor) {
            cmp::Ordering::Less => Some((anchor, cursor)),
            cmp::Ordering::Greater => Some((cursor, anchor)),
            cmp::Ordering::Equal => None,
        }
    }

    pub fn has_selection(&self) -> bool {
        self.selection().is_some()
    }

    pub fn selected_text(&self) -> String {
        match self.selection() {
            Some((start, end)) => {
                let start_idx = self.position_to_char_idx(start);
                let end_idx = self.position_to_char_idx(end);
                self.rope.slice(start_idx..end_idx).to_string()
            }
            None => String::new(),
        }
    }

    /// Edit > Clear: removes the selection without touching the clipboard.
    pub fn delete_selection(&mut self) -> bool {
        let deleted = self.delete_selection_inner();
        if deleted {
            self.save_state();
        }
        deleted
    }

    pub fn copy(&mut self) -> bool {
        if !self.has_selection() {
            return false;
        }
        self.clipboard = self.selected_text();
        true
    }

    pub fn cut(&mut self) -> bool {
        if !self.copy() {
            return false;
        }
        self.delete_selection()
    }

    pub fn paste(&mut self) {
        let text = self.clipboard.clone();
        self.insert_str(&text);
    }

    pub fn clipboard(&self) -> &str {
        &self.clipboard
    }

    pub fn can_undo(&self) -> bool {
        self.history_index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.history_index + 1 < self.history.len()
    }

    pub fn undo(&mut self) -> bool {
        if !self.can_undo() {
            return false;
        }
        self.history_index -= 1;
        self.restore_state();
        true
    }

    pub fn redo(&mut self) -> bool {
        if !self.can_redo() {
            return false;
        }
        self.history_index += 1;
        self.restore_state();
        true
    }

    fn restore_state(&mut self) {
        let state = &self.history[self.history_index];
        self.rope = Rope::from_str(&state.content);
        self.cursor_line = state.cursor_line;
        self.cursor_col = state.cursor_col;
        self.anchor = None;
        self.modified = true;
        self.adjust_viewport();
    }

    fn save_state(&mut self) {
        let content = self.rope.to_string();
        if self
            .history
            .get(self.history_index)
            .is_some_and(|last| last.content == content)
        {
            return;
        }

        self.history.truncate(self.history_index + 1);
        self.history.push(EditorState {
            content,
            cursor_line: self.cursor_line,
            cursor_col: self.cursor_col,
        });
        self.history_index += 1;

        if self.history.len() > HISTORY_LIMIT {
            self.history.remove(0);
            self.history_index -= 1;
        }
    }

    fn delete_selection_inner(&mut self) -> bool {
        let Some((start, end)) = self.selection() else {
            self.anchor = None;
            return false;
        };
        let start_idx = self.position_to_char_idx(start);
        let end_idx = self.position_to_char_idx(end);
        self.rope.remove(start_idx..end_idx);
        self.cursor_line = start.0;
        self.cursor_col = start.1;
        self.anchor = None;
        self.modified = true;
        self.adjust_viewport();
        true
    }

    fn begin_move(&mut self, select: bool) {
        if select {
            if self.anchor.is_none() {
                self.anchor = Some((self.cursor_line, self.cursor_col));
            }
        } else {
            self.anchor = None;
        }
    }

    fn line_len(&self, line: usize) -> usize {
        self.line_text(line).chars().count()
    }

    fn cursor_char_idx(&self) -> usize {
        self.position_to_char_idx((self.cursor_line, self.cursor_col))
    }

    fn position_to_char_idx(&self, (line, col): Position) -> usize {
        let line = line.min(self.rope.len_lines().saturating_sub(1));
        self.rope.line_to_char(line) + col.min(self.line_len(line))
    }

    fn char_idx_to_position(&self, char_idx: usize) -> Position {
        let char_idx = char_idx.min(self.rope.len_chars());
        let line = self.rope.char_to_line(char_idx);
        (line, char_idx - self.rope.line_to_char(line))
    }

    fn clamp_cursor_col(&mut self) {
        self.cursor_col = cmp::min(self.cursor_col, self.line_len(self.cursor_line));
    }

    fn adjust_viewport(&mut self) {
        if self.cursor_line < self.viewport_offset {
            self.viewport_offset = self.cursor_line;
        } else if self.cursor_line >= self.viewport_offset + self.viewport_height {
            self.viewport_offset = self.cursor_line + 1 - self.viewport_height;
        }

        let col = self.cursor_display_col();
        if col < self.viewport_col {
            self.viewport_col = col;
        } else if col >= self.viewport_col + self.viewport_width {
            self.viewport_col = col + 1 - self.viewport_width;
        }
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}
