use std::path::{Path, PathBuf};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::config::EditorConfig;
use crate::editor::Editor;
use crate::text_width;

/// Edit menu operations shared by editor and table windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditAction {
    Undo,
    Redo,
    Cut,
    Copy,
    Paste,
    Clear,
}

/// Contents of an editor window: a text buffer bound to an optional file.
pub struct EditorPane {
    pub editor: Editor,
    path: Option<PathBuf>,
    line_numbers: bool,
    pub syntax_highlighting: bool,
}

impl EditorPane {
    pub fn new(config: &EditorConfig) -> Self {
        let mut editor = Editor::new();
        editor.set_tab_config(config.tab_size, config.use_spaces);
        Self {
            editor,
            path: None,
            line_numbers: config.line_numbers,
            syntax_highlighting: config.syntax_highlighting,
        }
    }

    pub fn with_content(config: &EditorConfig, path: PathBuf, content: String) -> Self {
        let mut pane = Self::new(config);
        pane.editor.set_content(content);
        pane.path = Some(path);
        pane
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn set_path(&mut self, path: PathBuf) {
        self.path = Some(path);
    }

    pub fn is_dirty(&self) -> bool {
        self.editor.is_modified()
    }

    pub fn content(&self) -> String {
        self.editor.get_content()
    }

    pub fn mark_saved(&mut self) {
        self.editor.mark_saved();
    }

    /// Columns taken by the line number gutter, zero when disabled.
    pub fn gutter_width(&self) -> usize {
        if self.line_numbers {
            self.editor.line_count().to_string().len().max(3) + 1
        } else {
            0
        }
    }

    pub fn line_numbers(&self) -> bool {
        self.line_numbers
    }

    /// Sizes the viewport to a content area, gutter included in `width`.
    pub fn set_viewport(&mut self, width: usize, height: usize) {
        self.editor.set_viewport_height(height);
        self.editor
            .set_viewport_width(width.saturating_sub(self.gutter_width()));
    }

    /// Screen offset of the cursor inside the content area.
    pub fn cursor_offset(&self) -> (usize, usize) {
        let (line, _) = self.editor.cursor_position();
        let row = line.saturating_sub(self.editor.viewport_offset());
        let col = self
            .editor
            .cursor_display_col()
            .saturating_sub(self.editor.viewport_col());
        (self.gutter_width() + col, row)
    }

    pub fn position_label(&self) -> String {
        let (line, col) = self.editor.cursor_position();
        format!("Ln {}, Col {}", line + 1, col + 1)
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        let shift = key.modifiers.contains(KeyModifiers::SHIFT);
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let alt = key.modifiers.contains(KeyModifiers::ALT);

        match key.code {
            KeyCode::Char(c) if ctrl => match c.to_ascii_lowercase() {
                'z' => self.edit(EditAction::Undo),
                'y' => self.edit(EditAction::Redo),
                'x' => self.edit(EditAction::Cut),
                'c' => self.edit(EditAction::Copy),
                'v' => self.edit(EditAction::Paste),
                'a' => {
                    self.editor.select_all();
                    true
                }
                _ => false,
            },
            KeyCode::Char(_) if alt => false,
            KeyCode::Char(c) => {
                self.editor.insert_char(c);
                true
            }
            KeyCode::Enter => {
                self.editor.insert_newline();
                true
            }
            KeyCode::Tab => {
                self.editor.insert_tab();
                true
            }
            KeyCode::Backspace => {
                self.editor.delete_char_backward();
                true
            }
            KeyCode::Delete => {
                self.editor.delete_char_forward();
                true
            }
            KeyCode::Left => {
                self.editor.move_left(shift);
                true
            }
            KeyCode::Right => {
                self.editor.move_right(shift);
                true
            }
            KeyCode::Up => {
                self.editor.move_up(shift);
                true
            }
            KeyCode::Down => {
                self.editor.move_down(shift);
                true
            }
            KeyCode::Home if ctrl => {
                self.editor.move_to_document_start(shift);
                true
            }
            KeyCode::End if ctrl => {
                self.editor.move_to_document_end(shift);
                true
            }
            KeyCode::Home => {
                self.editor.move_to_line_start(shift);
                true
            }
            KeyCode::End => {
                self.editor.move_to_line_end(shift);
                true
            }
            KeyCode::PageUp => {
                self.editor.page_up(shift);
                true
            }
            KeyCode::PageDown => {
                self.editor.page_down(shift);
                true
            }
            _ => false,
        }
    }

    pub fn edit(&mut self, action: EditAction) -> bool {
        match action {
            EditAction::Undo => self.editor.undo(),
            EditAction::Redo => self.editor.redo(),
            EditAction::Cut => self.editor.cut(),
            EditAction::Copy => self.editor.copy(),
            EditAction::Paste => {
                self.editor.paste();
                true
            }
            EditAction::Clear => self.editor.delete_selection(),
        }
    }

    /// Mouse click at an offset inside the content area.
    pub fn click(&mut self, x: usize, y: usize) {
        let col = x.saturating_sub(self.gutter_width());
        self.editor.click_to(y, col);
    }

    pub fn scroll(&mut self, delta: isize) {
        self.editor.scroll_by(delta);
    }

    /// Visible lines cut to `width` columns from the horizontal scroll
    /// position, each with the char offset of its first shown char.
    pub fn visible_lines(&self, width: usize) -> Vec<(usize, String)> {
        let first_col = self.editor.viewport_col();
        self.editor
            .viewport_lines()
            .iter()
            .map(|line| {
                let (skipped, rest) = text_width::skip_cols(&line.replace('\t', " "), first_col);
                (skipped, text_width::truncate(&rest, width).to_string())
            })
            .collect()
    }
}
