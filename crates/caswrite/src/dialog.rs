//! Modal dialogs.
//!
//! Dialogs live on a stack above the desktop and take all input while open.
//! Each carries a [`DialogPurpose`] telling the application which flow to
//! resume once it returns an outcome.

use std::path::{Path, PathBuf};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::Rect;

use crate::menu::mnemonic;
use crate::text_width;
use crate::window::{rect_contains, WindowId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Buttons {
    Ok,
    YesNo,
    YesNoCancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogResult {
    Ok,
    Yes,
    No,
    Cancel,
}

impl Buttons {
    fn choices(self) -> &'static [(DialogResult, &'static str)] {
        match self {
            Buttons::Ok => &[(DialogResult::Ok, "&OK")],
            Buttons::YesNo => &[(DialogResult::Yes, "&Yes"), (DialogResult::No, "&No")],
            Buttons::YesNoCancel => &[
                (DialogResult::Yes, "&Yes"),
                (DialogResult::No, "&No"),
                (DialogResult::Cancel, "&Cancel"),
            ],
        }
    }

    /// Result for Esc.
    fn escape(self) -> DialogResult {
        match self {
            Buttons::Ok => DialogResult::Ok,
            Buttons::YesNo => DialogResult::No,
            Buttons::YesNoCancel => DialogResult::Cancel,
        }
    }
}

/// The flow a dialog belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogPurpose {
    Notice,
    OpenFile { force_table: bool },
    SaveAs { window: WindowId, close_after: bool },
    ConfirmClose { window: WindowId },
    ConfirmExit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogOutcome {
    Button(DialogResult),
    Path(PathBuf),
    Text(String),
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct MessageBox {
    pub title: String,
    pub message: String,
    pub buttons: Buttons,
    pub focused: usize,
}

impl MessageBox {
    pub fn new(title: impl Into<String>, message: impl Into<String>, buttons: Buttons) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            buttons,
            focused: 0,
        }
    }

    pub fn labels(&self) -> Vec<&'static str> {
        self.buttons.choices().iter().map(|(_, label)| *label).collect()
    }

    fn handle_key(&mut self, key: KeyEvent) -> Option<DialogOutcome> {
        let choices = self.buttons.choices();
        match key.code {
            KeyCode::Tab | KeyCode::Right => {
                self.focused = (self.focused + 1) % choices.len();
                None
            }
            KeyCode::BackTab | KeyCode::Left => {
                self.focused = (self.focused + choices.len() - 1) % choices.len();
                None
            }
            KeyCode::Enter | KeyCode::Char(' ') => {
                Some(DialogOutcome::Button(choices[self.focused].0))
            }
            KeyCode::Esc => Some(DialogOutcome::Button(self.buttons.escape())),
            KeyCode::Char(c) => choices
                .iter()
                .find(|(_, label)| mnemonic(label) == Some(c.to_ascii_lowercase()))
                .map(|(result, _)| DialogOutcome::Button(*result)),
            _ => None,
        }
    }

    pub fn rect(&self, screen: Rect) -> Rect {
        let text_width = self
            .message
            .lines()
            .map(text_width::str_width)
            .chain(std::iter::once(text_width::str_width(&self.title) + 4))
            .max()
            .unwrap_or(0) as u16;
        let lines = self.message.lines().count().max(1) as u16;
        centered(screen, (text_width + 4).max(30), lines + 5)
    }

    /// Button spans `(x, width)` on the button row.
    pub fn button_spans(&self, rect: Rect) -> Vec<(u16, u16)> {
        let labels = self.labels();
        let widths: Vec<u16> = labels
            .iter()
            .map(|label| crate::menu::display_label(label).chars().count() as u16 + 4)
            .collect();
        let total = widths.iter().sum::<u16>() + (widths.len() as u16 - 1) * 2;
        let mut x = rect.x + rect.width.saturating_sub(total) / 2;
        widths
            .into_iter()
            .map(|width| {
                let span = (x, width);
                x += width + 2;
                span
            })
            .collect()
    }

    pub fn button_row(rect: Rect) -> u16 {
        rect.y + rect.height.saturating_sub(2)
    }

    fn handle_click(&mut self, x: u16, y: u16, rect: Rect) -> Option<DialogOutcome> {
        if y != Self::button_row(rect) {
            return None;
        }
        let index = self
            .button_spans(rect)
            .iter()
            .position(|&(start, width)| x >= start && x < start + width)?;
        self.focused = index;
        Some(DialogOutcome::Button(self.buttons.choices()[index].0))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
}

#[derive(Debug, Clone)]
pub struct FileOpenBox {
    pub title: String,
    pub dir: PathBuf,
    pub entries: Vec<DirEntry>,
    pub selected: usize,
    pub offset: usize,
    pub field: String,
    pub error: Option<String>,
}

impl FileOpenBox {
    pub fn new(title: impl Into<String>, dir: impl AsRef<Path>) -> Self {
        let mut dialog = Self {
            title: title.into(),
            dir: PathBuf::new(),
            entries: Vec::new(),
            selected: 0,
            offset: 0,
            field: String::new(),
            error: None,
        };
        dialog.change_dir(dir.as_ref());
        dialog
    }

    fn change_dir(&mut self, dir: &Path) {
        let dir = std::fs::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf());
        match read_entries(&dir) {
            Ok(entries) => {
                self.entries = entries;
                self.dir = dir;
                self.selected = 0;
                self.offset = 0;
                self.field.clear();
                self.error = None;
            }
            Err(e) => {
                log::warn!("Cannot list {}: {}", dir.display(), e);
                self.error = Some(format!("Cannot open directory: {}", e));
            }
        }
    }

    fn select(&mut self, index: usize) {
        if let Some(entry) = self.entries.get(index) {
            self.selected = index;
            self.field = entry.name.clone();
        }
    }

    /// Runs Enter on the current field or selection.
    fn accept(&mut self) -> Option<DialogOutcome> {
        let name = if self.field.is_empty() {
            self.entries.get(self.selected)?.name.clone()
        } else {
            self.field.clone()
        };
        let target = self.dir.join(&name);
        if target.is_dir() {
            self.change_dir(&target);
            None
        } else {
            Some(DialogOutcome::Path(target))
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Option<DialogOutcome> {
        match key.code {
            KeyCode::Esc => Some(DialogOutcome::Cancelled),
            KeyCode::Enter => self.accept(),
            KeyCode::Up => {
                self.select(self.selected.saturating_sub(1));
                None
            }
            KeyCode::Down => {
                self.select((self.selected + 1).min(self.entries.len().saturating_sub(1)));
                None
            }
            KeyCode::Backspace => {
                self.field.pop();
                None
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.field.push(c);
                None
            }
            _ => None,
        }
    }

    pub fn rect(&self, screen: Rect) -> Rect {
        centered(screen, 60, 20)
    }

    /// Rows available for the listing inside `rect`.
    pub fn list_area(rect: Rect) -> Rect {
        Rect {
            x: rect.x + 1,
            y: rect.y + 3,
            width: rect.width.saturating_sub(2),
            height: rect.height.saturating_sub(5),
        }
    }

    /// Keeps the selected entry inside a list of `height` rows.
    pub fn scroll_into_view(&mut self, height: usize) {
        if self.selected < self.offset {
            self.offset = self.selected;
        } else if height > 0 && self.selected >= self.offset + height {
            self.offset = self.selected + 1 - height;
        }
    }

    fn handle_click(&mut self, x: u16, y: u16, rect: Rect) -> Option<DialogOutcome> {
        let list = Self::list_area(rect);
        if !rect_contains(list, x, y) {
            return None;
        }
        let index = self.offset + (y - list.y) as usize;
        if index >= self.entries.len() {
            return None;
        }
        // A second click on the selected entry opens it
        if index == self.selected && self.field == self.entries[index].name {
            return self.accept();
        }
        self.select(index);
        None
    }
}

/// Parent first, then directories, then files; each sorted by name.
fn read_entries(dir: &Path) -> std::io::Result<Vec<DirEntry>> {
    let mut dirs = Vec::new();
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if entry.path().is_dir() {
            dirs.push(DirEntry { name, is_dir: true });
        } else {
            files.push(DirEntry {
                name,
                is_dir: false,
            });
        }
    }
    dirs.sort_by(|a, b| a.name.cmp(&b.name));
    files.sort_by(|a, b| a.name.cmp(&b.name));

    let mut entries = Vec::with_capacity(dirs.len() + files.len() + 1);
    if dir.parent().is_some() {
        entries.push(DirEntry {
            name: "..".to_string(),
            is_dir: true,
        });
    }
    entries.extend(dirs);
    entries.extend(files);
    Ok(entries)
}

#[derive(Debug, Clone)]
pub struct InputBox {
    pub title: String,
    pub prompt: String,
    pub value: String,
}

impl InputBox {
    pub fn new(
        title: impl Into<String>,
        prompt: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            prompt: prompt.into(),
            value: value.into(),
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Option<DialogOutcome> {
        match key.code {
            KeyCode::Esc => Some(DialogOutcome::Cancelled),
            KeyCode::Enter if self.value.trim().is_empty() => None,
            KeyCode::Enter => Some(DialogOutcome::Text(self.value.trim().to_string())),
            KeyCode::Backspace => {
                self.value.pop();
                None
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.value.push(c);
                None
            }
            _ => None,
        }
    }

    pub fn rect(&self, screen: Rect) -> Rect {
        centered(screen, 60, 7)
    }
}

#[derive(Debug, Clone)]
pub enum DialogKind {
    Message(MessageBox),
    FileOpen(FileOpenBox),
    Input(InputBox),
}

#[derive(Debug, Clone)]
pub struct Dialog {
    pub purpose: DialogPurpose,
    pub kind: DialogKind,
}

impl Dialog {
    pub fn message(
        purpose: DialogPurpose,
        title: impl Into<String>,
        message: impl Into<String>,
        buttons: Buttons,
    ) -> Self {
        Self {
            purpose,
            kind: DialogKind::Message(MessageBox::new(title, message, buttons)),
        }
    }

    pub fn notice(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::message(DialogPurpose::Notice, title, message, Buttons::Ok)
    }

    pub fn file_open(force_table: bool, dir: impl AsRef<Path>) -> Self {
        let title = if force_table {
            "Open as Table"
        } else {
            "Open File"
        };
        Self {
            purpose: DialogPurpose::OpenFile { force_table },
            kind: DialogKind::FileOpen(FileOpenBox::new(title, dir)),
        }
    }

    pub fn save_as(window: WindowId, close_after: bool, current: &str) -> Self {
        Self {
            purpose: DialogPurpose::SaveAs {
                window,
                close_after,
            },
            kind: DialogKind::Input(InputBox::new("Save As", "File name:", current)),
        }
    }

    pub fn rect(&self, screen: Rect) -> Rect {
        match &self.kind {
            DialogKind::Message(dialog) => dialog.rect(screen),
            DialogKind::FileOpen(dialog) => dialog.rect(screen),
            DialogKind::Input(dialog) => dialog.rect(screen),
        }
    }

    /// `None` while the dialog stays open.
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<DialogOutcome> {
        match &mut self.kind {
            DialogKind::Message(dialog) => dialog.handle_key(key),
            DialogKind::FileOpen(dialog) => dialog.handle_key(key),
            DialogKind::Input(dialog) => dialog.handle_key(key),
        }
    }

    pub fn handle_click(&mut self, x: u16, y: u16, screen: Rect) -> Option<DialogOutcome> {
        let rect = self.rect(screen);
        match &mut self.kind {
            DialogKind::Message(dialog) => dialog.handle_click(x, y, rect),
            DialogKind::FileOpen(dialog) => dialog.handle_click(x, y, rect),
            DialogKind::Input(_) => None,
        }
    }
}

/// A `width` x `height` rectangle centered in `area`, shrunk to fit.
pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn screen() -> Rect {
        Rect::new(0, 0, 80, 24)
    }

    #[test]
    fn test_message_box_keys() {
        let mut dialog = Dialog::message(
            DialogPurpose::ConfirmClose { window: 1 },
            "Save Changes?",
            "The file has unsaved changes.",
            Buttons::YesNoCancel,
        );
        assert_eq!(dialog.handle_key(key(KeyCode::Tab)), None);
        assert_eq!(
            dialog.handle_key(key(KeyCode::Enter)),
            Some(DialogOutcome::Button(DialogResult::No))
        );
        assert_eq!(
            dialog.handle_key(key(KeyCode::Char('Y'))),
            Some(DialogOutcome::Button(DialogResult::Yes))
        );
        assert_eq!(
            dialog.handle_key(key(KeyCode::Esc)),
            Some(DialogOutcome::Button(DialogResult::Cancel))
        );
        assert_eq!(dialog.handle_key(key(KeyCode::Char('z'))), None);
    }

    #[test]
    fn test_escape_results() {
        let mut ok = MessageBox::new("t", "m", Buttons::Ok);
        assert_eq!(
            ok.handle_key(key(KeyCode::Esc)),
            Some(DialogOutcome::Button(DialogResult::Ok))
        );
        let mut yes_no = MessageBox::new("t", "m", Buttons::YesNo);
        assert_eq!(
            yes_no.handle_key(key(KeyCode::Esc)),
            Some(DialogOutcome::Button(DialogResult::No))
        );
    }

    #[test]
    fn test_message_box_click() {
        let mut dialog = Dialog::message(DialogPurpose::ConfirmExit, "Exit", "Quit?", Buttons::YesNo);
        let rect = dialog.rect(screen());
        let row = MessageBox::button_row(rect);
        let spans = match &dialog.kind {
            DialogKind::Message(message) => message.button_spans(rect),
            _ => unreachable!(),
        };
        assert_eq!(spans.len(), 2);
        assert_eq!(
            dialog.handle_click(spans[1].0 + 1, row, screen()),
            Some(DialogOutcome::Button(DialogResult::No))
        );
        assert_eq!(dialog.handle_click(spans[1].0 + 1, row - 1, screen()), None);
    }

    #[test]
    fn test_file_open_box_lists_and_navigates() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("b.txt"), "").unwrap();
        std::fs::write(dir.path().join("a.csv"), "").unwrap();
        std::fs::write(dir.path().join("sub").join("inner.tsv"), "").unwrap();

        let mut dialog = Dialog::file_open(true, dir.path());
        assert_eq!(dialog.purpose, DialogPurpose::OpenFile { force_table: true });
        let DialogKind::FileOpen(open) = &dialog.kind else {
            unreachable!()
        };
        let names: Vec<&str> = open.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["..", "sub", "a.csv", "b.txt"]);

        // Into "sub", then pick its only file
        dialog.handle_key(key(KeyCode::Down));
        assert_eq!(dialog.handle_key(key(KeyCode::Enter)), None);
        dialog.handle_key(key(KeyCode::Down));
        let outcome = dialog.handle_key(key(KeyCode::Enter));
        let expected = std::fs::canonicalize(dir.path().join("sub"))
            .unwrap()
            .join("inner.tsv");
        assert_eq!(outcome, Some(DialogOutcome::Path(expected)));
    }

    #[test]
    fn test_file_open_box_typed_name() {
        let dir = TempDir::new().unwrap();
        let mut dialog = Dialog::file_open(false, dir.path());
        for c in "new.txt".chars() {
            dialog.handle_key(key(KeyCode::Char(c)));
        }
        match dialog.handle_key(key(KeyCode::Enter)) {
            Some(DialogOutcome::Path(path)) => assert!(path.ends_with("new.txt")),
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(dialog.handle_key(key(KeyCode::Esc)), Some(DialogOutcome::Cancelled));
    }

    #[test]
    fn test_input_box() {
        let mut dialog = Dialog::save_as(3, true, "");
        assert_eq!(dialog.handle_key(key(KeyCode::Enter)), None);
        dialog.handle_key(key(KeyCode::Char('a')));
        dialog.handle_key(key(KeyCode::Char('b')));
        dialog.handle_key(key(KeyCode::Backspace));
        assert_eq!(
            dialog.handle_key(key(KeyCode::Enter)),
            Some(DialogOutcome::Text("a".to_string()))
        );
    }

    #[test]
    fn test_centered() {
        assert_eq!(centered(screen(), 50, 10), Rect::new(15, 7, 50, 10));
        assert_eq!(centered(Rect::new(0, 0, 20, 5), 50, 10), Rect::new(0, 0, 20, 5));
    }
}
