use std::path::{Path, PathBuf};

use anyhow::Result;
use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::layout::Rect;
use tokio::sync::mpsc;

use crate::command::{command_for_key, Command};
use crate::config::Config;
use crate::dialog::{Buttons, Dialog, DialogOutcome, DialogPurpose, DialogResult};
use crate::editor_pane::{EditAction, EditorPane};
use crate::file_manager::FileManager;
use crate::highlight::Highlighter;
use crate::menu::*;
use crate::status_manager::StatusManager;
use crate::table_pane::{TableAction, TablePane};
use crate::window::{Hit, Pane, WindowId, WindowManager};

const SCROLL_STEP: isize = 3;

/// Work handed to the UI loop from outside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deferred {
    OpenFile(PathBuf),
}

/// Cloneable sender for [`Deferred`] work; the loop drains it before each draw.
#[derive(Debug, Clone)]
pub struct AppHandle {
    tx: mpsc::UnboundedSender<Deferred>,
}

impl AppHandle {
    /// Queues work for the UI loop. Returns false once the app is gone.
    pub fn invoke_later(&self, work: Deferred) -> bool {
        self.tx.send(work).is_ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Drag {
    Move { id: WindowId, grab_x: u16, grab_y: u16 },
    Resize { id: WindowId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SaveOutcome {
    Saved,
    Failed,
    NeedsName,
}

pub struct App {
    pub config: Config,
    pub menu: MenuBar,
    pub windows: WindowManager,
    pub dialogs: Vec<Dialog>,
    pub status: StatusManager,
    pub highlighter: Option<Highlighter>,
    file_manager: FileManager,
    screen: Rect,
    last_save_enabled: bool,
    last_save_as_enabled: bool,
    untitled_count: usize,
    drag: Option<Drag>,
    handle: AppHandle,
    rx: mpsc::UnboundedReceiver<Deferred>,
    should_quit: bool,
    shell_requested: bool,
}

/// Desktop area: everything between the menu bar and the status line.
pub fn desktop_rect(screen: Rect) -> Rect {
    Rect {
        x: screen.x,
        y: screen.y.saturating_add(1),
        width: screen.width,
        height: screen.height.saturating_sub(2),
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn build_menu_bar() -> MenuBar {
    let mut menu = MenuBar::new();
    menu.add_menu("&System", vec![MenuItem::action(MID_SHELL, "&OS Shell")]);
    menu.add_menu(
        "&File",
        vec![
            MenuItem::with_shortcut(MID_NEW, "&New", "Ctrl+N"),
            MenuItem::with_shortcut(MID_OPEN_FILE, "&Open...", "F3"),
            MenuItem::action(MID_OPEN_AS_TABLE, "Open as &Table..."),
            MenuItem::with_shortcut(MID_SAVE_FILE, "&Save", "F2"),
            MenuItem::action(MID_SAVE_AS_FILE, "Save &As..."),
            MenuItem::Separator,
            MenuItem::with_shortcut(MID_EXIT, "E&xit", "Alt+X"),
        ],
    );
    menu.add_menu(
        "&Edit",
        vec![
            MenuItem::with_shortcut(MID_UNDO, "&Undo", "Ctrl+Z"),
            MenuItem::with_shortcut(MID_REDO, "&Redo", "Ctrl+Y"),
            MenuItem::Separator,
            MenuItem::with_shortcut(MID_CUT, "Cu&t", "Ctrl+X"),
            MenuItem::with_shortcut(MID_COPY, "&Copy", "Ctrl+C"),
            MenuItem::with_shortcut(MID_PASTE, "&Paste", "Ctrl+V"),
            MenuItem::with_shortcut(MID_CLEAR, "C&lear", "Del"),
        ],
    );
    menu.add_menu(
        "&Table",
        vec![
            MenuItem::action(MID_TABLE_INSERT_ROW_ABOVE, "Insert Row &Above"),
            MenuItem::action(MID_TABLE_INSERT_ROW_BELOW, "Insert Row &Below"),
            MenuItem::action(MID_TABLE_DELETE_ROW, "&Delete Row"),
            MenuItem::Separator,
            MenuItem::action(MID_TABLE_INSERT_COLUMN_LEFT, "Insert Column &Left"),
            MenuItem::action(MID_TABLE_INSERT_COLUMN_RIGHT, "Insert Column &Right"),
            MenuItem::action(MID_TABLE_DELETE_COLUMN, "Delete &Column"),
            MenuItem::Separator,
            MenuItem::action(MID_TABLE_WIDEN_COLUMN, "&Widen Column"),
            MenuItem::action(MID_TABLE_NARROW_COLUMN, "&Narrow Column"),
            MenuItem::Separator,
            MenuItem::action(MID_TABLE_HEADER_ROW, "&Header Row"),
        ],
    );
    menu.add_menu(
        "&Window",
        vec![
            MenuItem::action(MID_WINDOW_TILE, "&Tile"),
            MenuItem::action(MID_WINDOW_CASCADE, "C&ascade"),
            MenuItem::action(MID_WINDOW_ZOOM, "&Zoom"),
            MenuItem::Separator,
            MenuItem::with_shortcut(MID_WINDOW_NEXT, "&Next", "F6"),
            MenuItem::with_shortcut(MID_WINDOW_PREVIOUS, "&Previous", "Shift+F6"),
            MenuItem::with_shortcut(MID_WINDOW_CLOSE, "&Close", "Ctrl+W"),
            MenuItem::action(MID_WINDOW_CLOSE_ALL, "Close A&ll"),
        ],
    );
    menu
}

impl App {
    pub fn new(config: Config, screen: Rect) -> Self {
        let mut menu = build_menu_bar();
        // Nothing to save until a window exists
        menu.disable_item(MID_SAVE_FILE);
        menu.disable_item(MID_SAVE_AS_FILE);

        let highlighter = config
            .editor
            .syntax_highlighting
            .then(|| Highlighter::new(&config.editor.syntax_theme));
        let (tx, rx) = mpsc::unbounded_channel();

        Self {
            file_manager: FileManager::new(config.files.backup_on_save),
            config,
            menu,
            windows: WindowManager::new(desktop_rect(screen)),
            dialogs: Vec::new(),
            status: StatusManager::new(),
            highlighter,
            screen,
            last_save_enabled: false,
            last_save_as_enabled: false,
            untitled_count: 0,
            drag: None,
            handle: AppHandle { tx },
            rx,
            should_quit: false,
            shell_requested: false,
        }
    }

    pub fn handle(&self) -> AppHandle {
        self.handle.clone()
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn screen(&self) -> Rect {
        self.screen
    }

    /// Returns and clears a pending System > OS Shell request.
    pub fn take_shell_request(&mut self) -> bool {
        std::mem::take(&mut self.shell_requested)
    }

    pub fn top_dialog(&self) -> Option<&Dialog> {
        self.dialogs.last()
    }

    pub fn resize(&mut self, screen: Rect) {
        self.screen = screen;
        self.windows.set_desktop(desktop_rect(screen));
    }

    /// Runs queued [`Deferred`] work.
    pub async fn drain_deferred(&mut self) {
        while let Ok(work) = self.rx.try_recv() {
            match work {
                Deferred::OpenFile(path) => {
                    if let Err(e) = self.open_file_in_window(&path, false).await {
                        self.dialogs.push(Dialog::notice(
                            "Error Opening File",
                            format!("Failed to open '{}': {}", file_name(&path), e),
                        ));
                    }
                }
            }
        }
    }

    /// Per-frame bookkeeping before drawing.
    pub fn on_pre_draw(&mut self) {
        self.update_menu_states();
        self.status.update();
        let position = self
            .windows
            .active()
            .map(|window| window.pane.position_label())
            .unwrap_or_default();
        self.status.set_position(position);
    }

    /// Syncs Save / Save As with the active window, touching the menu only
    /// when a flag actually changes.
    pub fn update_menu_states(&mut self) {
        let has_window = self.windows.count() > 0;
        let save_enabled = has_window
            && self
                .windows
                .active()
                .is_some_and(|window| window.pane.is_dirty());
        let save_as_enabled = has_window;

        if save_enabled != self.last_save_enabled {
            if save_enabled {
                self.menu.enable_item(MID_SAVE_FILE);
            } else {
                self.menu.disable_item(MID_SAVE_FILE);
            }
            self.last_save_enabled = save_enabled;
        }

        if save_as_enabled != self.last_save_as_enabled {
            if save_as_enabled {
                self.menu.enable_item(MID_SAVE_AS_FILE);
            } else {
                self.menu.disable_item(MID_SAVE_AS_FILE);
            }
            self.last_save_as_enabled = save_as_enabled;
        }
    }

    pub async fn handle_event(&mut self, event: Event) -> Result<()> {
        match event {
            Event::Key(key) => self.handle_key(key).await,
            Event::Mouse(mouse) => self.handle_mouse(mouse).await,
            Event::Resize(width, height) => {
                log::info!("Terminal resized to {}x{}", width, height);
                self.resize(Rect::new(0, 0, width, height));
            }
            _ => {}
        }
        Ok(())
    }

    pub async fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        if let Some(dialog) = self.dialogs.last_mut() {
            if let Some(outcome) = dialog.handle_key(key) {
                self.finish_dialog(outcome).await;
            }
            return;
        }

        if self.menu.is_open() {
            if let MenuEvent::Selected(id) = self.menu.handle_key(key) {
                self.on_menu(id).await;
            }
            return;
        }

        if let Some(window) = self.windows.active_mut() {
            if window.pane.handle_key(key) {
                return;
            }
        }

        if let Some(command) = command_for_key(key) {
            self.on_command(command).await;
            return;
        }

        if let KeyCode::Char(c) = key.code {
            if key.modifiers.contains(KeyModifiers::ALT) {
                self.menu.open_by_mnemonic(c);
            }
        }
    }

    async fn finish_dialog(&mut self, outcome: DialogOutcome) {
        if let Some(dialog) = self.dialogs.pop() {
            self.on_dialog_result(dialog.purpose, outcome).await;
        }
    }

    pub async fn on_menu(&mut self, id: MenuId) {
        log::debug!("Menu item {}", id);
        match id {
            MID_NEW => {
                self.new_window();
            }
            MID_OPEN_FILE => self.dialogs.push(Dialog::file_open(false, ".")),
            MID_OPEN_AS_TABLE => self.dialogs.push(Dialog::file_open(true, ".")),
            MID_SAVE_FILE => self.on_command(Command::Save).await,
            MID_SAVE_AS_FILE => self.on_command(Command::SaveAs).await,
            MID_EXIT => self.on_command(Command::Exit).await,
            MID_SHELL => self.shell_requested = true,

            MID_UNDO => self.edit_active(EditAction::Undo),
            MID_REDO => self.edit_active(EditAction::Redo),
            MID_CUT => self.edit_active(EditAction::Cut),
            MID_COPY => self.edit_active(EditAction::Copy),
            MID_PASTE => self.edit_active(EditAction::Paste),
            MID_CLEAR => self.edit_active(EditAction::Clear),

            MID_TABLE_INSERT_ROW_ABOVE => self.table_active(TableAction::InsertRowAbove),
            MID_TABLE_INSERT_ROW_BELOW => self.table_active(TableAction::InsertRowBelow),
            MID_TABLE_DELETE_ROW => self.table_active(TableAction::DeleteRow),
            MID_TABLE_INSERT_COLUMN_LEFT => self.table_active(TableAction::InsertColumnLeft),
            MID_TABLE_INSERT_COLUMN_RIGHT => self.table_active(TableAction::InsertColumnRight),
            MID_TABLE_DELETE_COLUMN => self.table_active(TableAction::DeleteColumn),
            MID_TABLE_WIDEN_COLUMN => self.table_active(TableAction::WidenColumn),
            MID_TABLE_NARROW_COLUMN => self.table_active(TableAction::NarrowColumn),
            MID_TABLE_HEADER_ROW => self.table_active(TableAction::ToggleHeaderRow),

            MID_WINDOW_TILE => self.windows.tile(),
            MID_WINDOW_CASCADE => self.windows.cascade(),
            MID_WINDOW_ZOOM => {
                if let Some(id) = self.windows.active_id() {
                    self.windows.toggle_maximize(id);
                }
            }
            MID_WINDOW_NEXT => self.on_command(Command::WindowNext).await,
            MID_WINDOW_PREVIOUS => self.on_command(Command::WindowPrevious).await,
            MID_WINDOW_CLOSE => self.on_command(Command::WindowClose).await,
            MID_WINDOW_CLOSE_ALL => self.close_all(),
            _ => log::warn!("Unhandled menu id {}", id),
        }
    }

    pub async fn on_command(&mut self, command: Command) {
        match command {
            Command::Save => {
                if let Some(id) = self.windows.active_id() {
                    self.save_window(id, false).await;
                }
            }
            Command::SaveAs => {
                if let Some(window) = self.windows.active() {
                    let current = window
                        .pane
                        .path()
                        .map(|path| path.display().to_string())
                        .unwrap_or_default();
                    self.dialogs
                        .push(Dialog::save_as(window.id, false, &current));
                }
            }
            Command::Open => self.dialogs.push(Dialog::file_open(false, ".")),
            Command::New => {
                self.new_window();
            }
            Command::WindowClose => {
                if let Some(id) = self.windows.active_id() {
                    self.request_close(id);
                }
            }
            Command::WindowNext => self.windows.next(),
            Command::WindowPrevious => self.windows.previous(),
            Command::Menu => self.menu.open(0),
            Command::Exit => self.request_exit(),
        }
    }

    pub fn new_window(&mut self) -> WindowId {
        self.untitled_count += 1;
        let pane = EditorPane::new(&self.config.editor);
        self.windows
            .add(format!("Untitled {}", self.untitled_count), Pane::Editor(pane))
    }

    /// Opens `path` in a new window: a table window when forced or when the
    /// name ends in `.csv`/`.tsv`, otherwise an editor window.
    pub async fn open_file_in_window(&mut self, path: &Path, force_table: bool) -> Result<WindowId> {
        let opened = self.file_manager.open_file(path).await?;
        let name = file_name(path);

        let pane = if force_table || tablecore::is_table_file(Some(&name)) {
            Pane::Table(TablePane::from_file(
                opened.path,
                &opened.content,
                &self.config.table,
            ))
        } else {
            Pane::Editor(EditorPane::with_content(
                &self.config.editor,
                opened.path,
                opened.content,
            ))
        };

        let id = self.windows.add(name.clone(), pane);
        if opened.readonly {
            self.status.set_warning(format!("{} is read-only", name));
        } else {
            self.status.set_info(format!("Opened {}", name));
        }
        Ok(id)
    }

    async fn open_from_menu(&mut self, path: &Path, force_table: bool) {
        if let Err(e) = self.open_file_in_window(path, force_table).await {
            log::error!("Error opening {}: {}", path.display(), e);
            self.dialogs.push(Dialog::notice(
                "Error Opening File",
                format!("Error opening file: {}", e),
            ));
        }
    }

    fn edit_active(&mut self, action: EditAction) {
        if let Some(window) = self.windows.active_mut() {
            window.pane.edit(action);
        }
    }

    fn table_active(&mut self, action: TableAction) {
        match self.windows.active_mut().map(|window| &mut window.pane) {
            Some(Pane::Table(pane)) => pane.apply(action),
            _ => self.status.set_warning("The active window is not a table"),
        }
    }

    async fn save_window(&mut self, id: WindowId, close_after: bool) -> SaveOutcome {
        let Some(window) = self.windows.get_mut(id) else {
            return SaveOutcome::Failed;
        };
        let Some(path) = window.pane.path().map(Path::to_path_buf) else {
            self.dialogs.push(Dialog::save_as(id, close_after, ""));
            return SaveOutcome::NeedsName;
        };
        let content = window.pane.content();

        match self.file_manager.save_file(&path, &content).await {
            Ok(()) => {
                if let Some(window) = self.windows.get_mut(id) {
                    window.pane.mark_saved();
                }
                self.status.set_saved(&file_name(&path));
                SaveOutcome::Saved
            }
            Err(e) => {
                self.status.set_error(format!("Save failed: {}", e));
                SaveOutcome::Failed
            }
        }
    }

    /// Closes a window, asking first when it has unsaved changes.
    pub fn request_close(&mut self, id: WindowId) {
        let Some(window) = self.windows.get(id) else {
            return;
        };
        if window.pane.is_dirty() {
            self.windows.activate(id);
            self.dialogs.push(Dialog::message(
                DialogPurpose::ConfirmClose { window: id },
                "Save Changes?",
                "The file has unsaved changes. Do you want to save before closing?",
                Buttons::YesNoCancel,
            ));
        } else {
            self.windows.close(id);
        }
    }

    /// Closes a window after a save attempt, unless the save left it dirty.
    fn finish_close(&mut self, id: WindowId) {
        let still_dirty = self
            .windows
            .get(id)
            .is_some_and(|window| window.pane.is_dirty());
        if still_dirty {
            self.dialogs.push(Dialog::notice(
                "Save Failed",
                "The file could not be saved. The window will remain open.",
            ));
        } else {
            self.windows.close(id);
        }
    }

    fn close_all(&mut self) {
        // Confirmations stack up; the bottom-most window is asked about last
        for id in self.windows.ids() {
            self.request_close(id);
        }
    }

    fn request_exit(&mut self) {
        if self.windows.any_dirty() {
            self.dialogs.push(Dialog::message(
                DialogPurpose::ConfirmExit,
                "Exit CasWrite",
                "There are unsaved changes. Exit anyway?",
                Buttons::YesNo,
            ));
        } else {
            log::info!("Exit requested");
            self.should_quit = true;
        }
    }

    async fn on_dialog_result(&mut self, purpose: DialogPurpose, outcome: DialogOutcome) {
        match (purpose, outcome) {
            (DialogPurpose::OpenFile { force_table }, DialogOutcome::Path(path)) => {
                self.open_from_menu(&path, force_table).await;
            }
            (
                DialogPurpose::SaveAs {
                    window,
                    close_after,
                },
                DialogOutcome::Text(name),
            ) => {
                let Some(target) = self.windows.get_mut(window) else {
                    return;
                };
                target.pane.set_path(PathBuf::from(name));
                self.save_window(window, false).await;
                if close_after {
                    self.finish_close(window);
                }
            }
            (
                DialogPurpose::SaveAs {
                    window,
                    close_after: true,
                },
                DialogOutcome::Cancelled,
            ) => self.finish_close(window),
            (DialogPurpose::ConfirmClose { window }, DialogOutcome::Button(result)) => {
                match result {
                    DialogResult::Yes => match self.save_window(window, true).await {
                        SaveOutcome::NeedsName => {}
                        SaveOutcome::Saved | SaveOutcome::Failed => self.finish_close(window),
                    },
                    DialogResult::No => {
                        self.windows.close(window);
                    }
                    DialogResult::Cancel | DialogResult::Ok => {}
                }
            }
            (DialogPurpose::ConfirmExit, DialogOutcome::Button(DialogResult::Yes)) => {
                log::info!("Exit confirmed with unsaved changes");
                self.should_quit = true;
            }
            _ => {}
        }
    }

    pub async fn handle_mouse(&mut self, mouse: MouseEvent) {
        let (x, y) = (mouse.column, mouse.row);

        if let Some(dialog) = self.dialogs.last_mut() {
            if mouse.kind == MouseEventKind::Down(MouseButton::Left) {
                if let Some(outcome) = dialog.handle_click(x, y, self.screen) {
                    self.finish_dialog(outcome).await;
                }
            }
            return;
        }

        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if y == 0 || self.menu.is_open() {
                    match self.menu.handle_click(x, y, self.screen) {
                        MenuEvent::Selected(id) => self.on_menu(id).await,
                        MenuEvent::Ignored | MenuEvent::Consumed | MenuEvent::Closed => {}
                    }
                    return;
                }
                self.press_on_desktop(x, y);
            }
            MouseEventKind::Drag(MouseButton::Left) => match self.drag {
                Some(Drag::Move { id, grab_x, grab_y }) => {
                    self.windows
                        .move_to(id, x.saturating_sub(grab_x), y.saturating_sub(grab_y));
                }
                Some(Drag::Resize { id }) => {
                    if let Some(rect) = self.windows.get(id).map(|window| window.rect) {
                        let width = x.saturating_add(1).saturating_sub(rect.x);
                        let height = y.saturating_add(1).saturating_sub(rect.y);
                        self.windows.resize_to(id, width, height);
                    }
                }
                None => {}
            },
            MouseEventKind::Up(MouseButton::Left) => self.drag = None,
            MouseEventKind::ScrollUp => self.scroll_at(x, y, -SCROLL_STEP),
            MouseEventKind::ScrollDown => self.scroll_at(x, y, SCROLL_STEP),
            _ => {}
        }
    }

    fn press_on_desktop(&mut self, x: u16, y: u16) {
        let Some(id) = self.windows.window_at(x, y) else {
            return;
        };
        self.windows.activate(id);
        let Some((hit, rect)) = self.windows.get(id).map(|window| (window.hit(x, y), window.rect))
        else {
            return;
        };

        match hit {
            Some(Hit::CloseBox) => self.request_close(id),
            Some(Hit::TitleBar) => {
                self.drag = Some(Drag::Move {
                    id,
                    grab_x: x - rect.x,
                    grab_y: y - rect.y,
                });
            }
            Some(Hit::ResizeCorner) => self.drag = Some(Drag::Resize { id }),
            Some(Hit::Content(cx, cy)) => {
                if let Some(window) = self.windows.get_mut(id) {
                    window.pane.click(cx as usize, cy as usize);
                }
            }
            Some(Hit::Border) | None => {}
        }
    }

    fn scroll_at(&mut self, x: u16, y: u16, delta: isize) {
        if let Some(id) = self.windows.window_at(x, y) {
            if let Some(window) = self.windows.get_mut(id) {
                window.pane.scroll(delta);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialog::DialogKind;
    use crossterm::event::KeyEventState;
    use tempfile::TempDir;

    fn test_app() -> App {
        let mut config = Config::default();
        config.editor.syntax_highlighting = false;
        App::new(config, Rect::new(0, 0, 100, 30))
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn top_message(app: &App) -> (String, String) {
        match app.top_dialog().map(|dialog| &dialog.kind) {
            Some(DialogKind::Message(message)) => (message.title.clone(), message.message.clone()),
            _ => panic!("expected a message box"),
        }
    }

    fn type_into_active(app: &mut App, text: &str) {
        let window = app.windows.active_mut().unwrap();
        for c in text.chars() {
            window.pane.handle_key(key(KeyCode::Char(c)));
        }
    }

    #[test]
    fn test_initial_menu_state() {
        let app = test_app();
        assert_eq!(app.menu.menus().len(), 5);
        assert_eq!(app.menu.menus()[1].title, "&File");
        assert!(!app.menu.is_enabled(MID_SAVE_FILE));
        assert!(!app.menu.is_enabled(MID_SAVE_AS_FILE));
        assert!(app.menu.is_enabled(MID_OPEN_AS_TABLE));
    }

    #[test]
    fn test_update_menu_states() {
        let mut app = test_app();
        app.new_window();
        app.update_menu_states();
        assert!(!app.menu.is_enabled(MID_SAVE_FILE));
        assert!(app.menu.is_enabled(MID_SAVE_AS_FILE));

        type_into_active(&mut app, "x");
        app.update_menu_states();
        assert!(app.menu.is_enabled(MID_SAVE_FILE));

        let id = app.windows.active_id().unwrap();
        app.windows.close(id);
        app.update_menu_states();
        assert!(!app.menu.is_enabled(MID_SAVE_FILE));
        assert!(!app.menu.is_enabled(MID_SAVE_AS_FILE));
    }

    #[test]
    fn test_menu_only_touched_on_change() {
        let mut app = test_app();
        // Cached flags say "disabled", so a matching update leaves the item alone
        app.menu.enable_item(MID_SAVE_FILE);
        app.update_menu_states();
        assert!(app.menu.is_enabled(MID_SAVE_FILE));
    }

    #[tokio::test]
    async fn test_open_errors() {
        let mut app = test_app();
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.txt");

        let err = app.open_file_in_window(&missing, false).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("File does not exist: {}", missing.display())
        );

        let err = app.open_file_in_window(dir.path(), false).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("Not a regular file: {}", dir.path().display())
        );
        assert_eq!(app.windows.count(), 0);
    }

    #[tokio::test]
    async fn test_open_chooses_window_kind() {
        let mut app = test_app();
        let dir = TempDir::new().unwrap();
        let csv = dir.path().join("DATA.CSV");
        let txt = dir.path().join("notes.txt");
        std::fs::write(&csv, "a,b\n1,2\n").unwrap();
        std::fs::write(&txt, "a,b\n").unwrap();

        let id = app.open_file_in_window(&csv, false).await.unwrap();
        assert!(matches!(app.windows.get(id).unwrap().pane, Pane::Table(_)));

        let id = app.open_file_in_window(&txt, false).await.unwrap();
        assert!(matches!(app.windows.get(id).unwrap().pane, Pane::Editor(_)));

        let id = app.open_file_in_window(&txt, true).await.unwrap();
        match &app.windows.get(id).unwrap().pane {
            Pane::Table(pane) => assert_eq!(pane.table.cell(0, 1), "b"),
            Pane::Editor(_) => panic!("forced table opened as text"),
        }
        assert_eq!(app.windows.count(), 3);
    }

    #[tokio::test]
    async fn test_menu_open_failure_shows_dialog() {
        let mut app = test_app();
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("gone.csv");

        app.on_dialog_result(
            DialogPurpose::OpenFile { force_table: true },
            DialogOutcome::Path(missing.clone()),
        )
        .await;

        let (title, message) = top_message(&app);
        assert_eq!(title, "Error Opening File");
        assert_eq!(
            message,
            format!("Error opening file: File does not exist: {}", missing.display())
        );
    }

    #[tokio::test]
    async fn test_invoke_later_opens_files() {
        let mut app = test_app();
        let dir = TempDir::new().unwrap();
        let good = dir.path().join("good.tsv");
        std::fs::write(&good, "a\tb\n").unwrap();
        let bad = dir.path().join("bad.txt");

        let handle = app.handle();
        assert!(handle.invoke_later(Deferred::OpenFile(good)));
        assert!(handle.invoke_later(Deferred::OpenFile(bad.clone())));
        assert_eq!(app.windows.count(), 0);

        app.drain_deferred().await;
        assert_eq!(app.windows.count(), 1);
        let (title, message) = top_message(&app);
        assert_eq!(title, "Error Opening File");
        assert_eq!(
            message,
            format!("Failed to open 'bad.txt': File does not exist: {}", bad.display())
        );
    }

    #[tokio::test]
    async fn test_close_clean_window() {
        let mut app = test_app();
        app.new_window();
        app.handle_key(KeyEvent::new(KeyCode::Char('w'), KeyModifiers::CONTROL))
            .await;
        assert_eq!(app.windows.count(), 0);
        assert!(app.top_dialog().is_none());
    }

    #[tokio::test]
    async fn test_close_dirty_window_answers() {
        let mut app = test_app();
        app.new_window();
        type_into_active(&mut app, "draft");

        app.on_command(Command::WindowClose).await;
        let (title, message) = top_message(&app);
        assert_eq!(title, "Save Changes?");
        assert_eq!(
            message,
            "The file has unsaved changes. Do you want to save before closing?"
        );

        // Cancel keeps everything
        app.handle_key(key(KeyCode::Char('c'))).await;
        assert!(app.top_dialog().is_none());
        assert_eq!(app.windows.count(), 1);

        // No discards
        app.on_command(Command::WindowClose).await;
        app.handle_key(key(KeyCode::Char('n'))).await;
        assert_eq!(app.windows.count(), 0);
    }

    #[tokio::test]
    async fn test_close_with_save() {
        let mut app = test_app();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("keep.txt");
        std::fs::write(&path, "old").unwrap();

        app.open_file_in_window(&path, false).await.unwrap();
        type_into_active(&mut app, "new ");
        app.on_command(Command::WindowClose).await;
        app.handle_key(key(KeyCode::Char('y'))).await;

        assert_eq!(app.windows.count(), 0);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new old");
    }

    #[tokio::test]
    async fn test_close_with_failed_save_keeps_window() {
        let mut app = test_app();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("table.csv");
        std::fs::write(&path, "a\n").unwrap();

        let id = app.open_file_in_window(&path, false).await.unwrap();
        type_into_active(&mut app, "z");
        app.handle_key(key(KeyCode::Enter)).await;
        // Saving onto a directory fails
        app.windows
            .get_mut(id)
            .unwrap()
            .pane
            .set_path(dir.path().to_path_buf());

        app.on_command(Command::WindowClose).await;
        app.handle_key(key(KeyCode::Char('y'))).await;

        let (title, message) = top_message(&app);
        assert_eq!(title, "Save Failed");
        assert_eq!(
            message,
            "The file could not be saved. The window will remain open."
        );
        assert_eq!(app.windows.count(), 1);
    }

    #[tokio::test]
    async fn test_close_untitled_goes_through_save_as() {
        let mut app = test_app();
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("fresh.txt");

        app.new_window();
        type_into_active(&mut app, "hi");
        app.on_command(Command::WindowClose).await;
        app.handle_key(key(KeyCode::Char('y'))).await;

        assert!(matches!(
            app.top_dialog().map(|dialog| dialog.purpose),
            Some(DialogPurpose::SaveAs {
                close_after: true,
                ..
            })
        ));
        for c in target.display().to_string().chars() {
            app.handle_key(key(KeyCode::Char(c))).await;
        }
        app.handle_key(key(KeyCode::Enter)).await;

        assert_eq!(app.windows.count(), 0);
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "hi");
    }

    #[tokio::test]
    async fn test_close_untitled_with_cancelled_save_as_keeps_window() {
        let mut app = test_app();
        app.new_window();
        type_into_active(&mut app, "x");
        app.on_command(Command::WindowClose).await;
        app.handle_key(key(KeyCode::Char('y'))).await;
        app.handle_key(key(KeyCode::Esc)).await;

        let (title, message) = top_message(&app);
        assert_eq!(title, "Save Failed");
        assert_eq!(
            message,
            "The file could not be saved. The window will remain open."
        );
        assert_eq!(app.windows.count(), 1);
        assert!(app.windows.active().unwrap().pane.is_dirty());
    }

    #[tokio::test]
    async fn test_exit_confirms_only_when_dirty() {
        let mut app = test_app();
        app.new_window();
        type_into_active(&mut app, "x");
        app.handle_key(KeyEvent::new(KeyCode::Char('x'), KeyModifiers::ALT))
            .await;
        assert!(!app.should_quit());
        assert_eq!(top_message(&app).0, "Exit CasWrite");
        app.handle_key(key(KeyCode::Char('y'))).await;
        assert!(app.should_quit());

        let mut clean = test_app();
        clean.on_menu(MID_EXIT).await;
        assert!(clean.should_quit());
    }

    #[tokio::test]
    async fn test_menu_keyboard_flow() {
        let mut app = test_app();
        app.handle_key(key(KeyCode::F(10))).await;
        assert_eq!(app.menu.open_index(), Some(0));
        app.handle_key(key(KeyCode::Right)).await;
        app.handle_key(key(KeyCode::Char('n'))).await;
        assert_eq!(app.windows.count(), 1);
        assert!(!app.menu.is_open());

        app.handle_key(KeyEvent::new(KeyCode::Char('w'), KeyModifiers::ALT))
            .await;
        assert_eq!(app.menu.open_index(), Some(4));
    }

    #[tokio::test]
    async fn test_key_release_is_ignored() {
        let mut app = test_app();
        let release = KeyEvent {
            code: KeyCode::F(10),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        };
        app.handle_key(release).await;
        assert!(!app.menu.is_open());
    }

    #[tokio::test]
    async fn test_mouse_close_box_and_drag() {
        let mut app = test_app();
        let first = app.new_window();
        let second = app.new_window();
        let rect = app.windows.get(second).unwrap().rect;

        let press = |kind, column, row| MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        };

        // Drag the title bar two columns right and one row down
        app.handle_mouse(press(MouseEventKind::Down(MouseButton::Left), rect.x + 10, rect.y))
            .await;
        app.handle_mouse(press(MouseEventKind::Drag(MouseButton::Left), rect.x + 12, rect.y + 1))
            .await;
        app.handle_mouse(press(MouseEventKind::Up(MouseButton::Left), rect.x + 12, rect.y + 1))
            .await;
        let moved = app.windows.get(second).unwrap().rect;
        assert_eq!((moved.x, moved.y), (rect.x + 2, rect.y + 1));

        // Clicking the lower window raises it
        let first_rect = app.windows.get(first).unwrap().rect;
        app.handle_mouse(press(
            MouseEventKind::Down(MouseButton::Left),
            first_rect.x,
            first_rect.y + 1,
        ))
        .await;
        assert_eq!(app.windows.active_id(), Some(first));

        app.handle_mouse(press(
            MouseEventKind::Down(MouseButton::Left),
            first_rect.x + 2,
            first_rect.y,
        ))
        .await;
        assert!(app.windows.get(first).is_none());
    }

    #[tokio::test]
    async fn test_table_menu_on_text_window_warns() {
        let mut app = test_app();
        app.new_window();
        app.on_menu(MID_TABLE_DELETE_ROW).await;
        assert_eq!(
            app.status.current_message().unwrap().content,
            "The active window is not a table"
        );
    }

    #[test]
    fn test_shell_request_is_taken_once() {
        let mut app = test_app();
        app.shell_requested = true;
        assert!(app.take_shell_request());
        assert!(!app.take_shell_request());
    }
}
