//! Menu bar with drop-down menus.
//!
//! Labels mark their mnemonic with `&`: `"&File"` opens with Alt+F and
//! `"E&xit"` is chosen with `x` while its menu is open.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::Rect;

use crate::window::rect_contains;

pub type MenuId = u32;

pub const MID_SHELL: MenuId = 1;
pub const MID_EXIT: MenuId = 2;

pub const MID_NEW: MenuId = 10;
pub const MID_OPEN_FILE: MenuId = 11;
pub const MID_SAVE_FILE: MenuId = 12;
pub const MID_SAVE_AS_FILE: MenuId = 13;
/// Opens any file in a table window.
pub const MID_OPEN_AS_TABLE: MenuId = 2000;

pub const MID_UNDO: MenuId = 20;
pub const MID_REDO: MenuId = 21;
pub const MID_CUT: MenuId = 22;
pub const MID_COPY: MenuId = 23;
pub const MID_PASTE: MenuId = 24;
pub const MID_CLEAR: MenuId = 25;

pub const MID_TABLE_INSERT_ROW_ABOVE: MenuId = 30;
pub const MID_TABLE_INSERT_ROW_BELOW: MenuId = 31;
pub const MID_TABLE_DELETE_ROW: MenuId = 32;
pub const MID_TABLE_INSERT_COLUMN_LEFT: MenuId = 33;
pub const MID_TABLE_INSERT_COLUMN_RIGHT: MenuId = 34;
pub const MID_TABLE_DELETE_COLUMN: MenuId = 35;
pub const MID_TABLE_WIDEN_COLUMN: MenuId = 36;
pub const MID_TABLE_NARROW_COLUMN: MenuId = 37;
pub const MID_TABLE_HEADER_ROW: MenuId = 38;

pub const MID_WINDOW_TILE: MenuId = 40;
pub const MID_WINDOW_CASCADE: MenuId = 41;
pub const MID_WINDOW_ZOOM: MenuId = 42;
pub const MID_WINDOW_NEXT: MenuId = 43;
pub const MID_WINDOW_PREVIOUS: MenuId = 44;
pub const MID_WINDOW_CLOSE: MenuId = 45;
pub const MID_WINDOW_CLOSE_ALL: MenuId = 46;

#[derive(Debug, Clone)]
pub enum MenuItem {
    Action {
        id: MenuId,
        label: String,
        shortcut: Option<String>,
        enabled: bool,
    },
    Separator,
}

impl MenuItem {
    pub fn action(id: MenuId, label: &str) -> Self {
        MenuItem::Action {
            id,
            label: label.to_string(),
            shortcut: None,
            enabled: true,
        }
    }

    pub fn with_shortcut(id: MenuId, label: &str, shortcut: &str) -> Self {
        MenuItem::Action {
            id,
            label: label.to_string(),
            shortcut: Some(shortcut.to_string()),
            enabled: true,
        }
    }

    fn id(&self) -> Option<MenuId> {
        match self {
            MenuItem::Action { id, .. } => Some(*id),
            MenuItem::Separator => None,
        }
    }

    fn is_selectable(&self) -> bool {
        matches!(self, MenuItem::Action { .. })
    }
}

#[derive(Debug, Clone)]
pub struct Menu {
    pub title: String,
    pub items: Vec<MenuItem>,
}

/// Outcome of feeding input to the menu bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuEvent {
    /// Input was used for navigation.
    Consumed,
    Selected(MenuId),
    Closed,
    Ignored,
}

#[derive(Debug, Clone, Default)]
pub struct MenuBar {
    menus: Vec<Menu>,
    open: Option<usize>,
    highlighted: usize,
}

/// Label without the `&` marker.
pub fn display_label(label: &str) -> String {
    label.replacen('&', "", 1)
}

/// Lowercased char following `&`.
pub fn mnemonic(label: &str) -> Option<char> {
    let idx = label.find('&')?;
    label[idx + 1..]
        .chars()
        .next()
        .map(|c| c.to_ascii_lowercase())
}

impl MenuBar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_menu(&mut self, title: &str, items: Vec<MenuItem>) {
        self.menus.push(Menu {
            title: title.to_string(),
            items,
        });
    }

    pub fn menus(&self) -> &[Menu] {
        &self.menus
    }

    pub fn open_index(&self) -> Option<usize> {
        self.open
    }

    pub fn highlighted(&self) -> usize {
        self.highlighted
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    fn item_mut(&mut self, wanted: MenuId) -> Option<&mut MenuItem> {
        self.menus
            .iter_mut()
            .flat_map(|menu| menu.items.iter_mut())
            .find(|item| item.id() == Some(wanted))
    }

    fn set_enabled(&mut self, id: MenuId, value: bool) {
        match self.item_mut(id) {
            Some(MenuItem::Action { enabled, .. }) => *enabled = value,
            _ => log::warn!("No menu item with id {}", id),
        }
    }

    pub fn enable_item(&mut self, id: MenuId) {
        self.set_enabled(id, true);
    }

    pub fn disable_item(&mut self, id: MenuId) {
        self.set_enabled(id, false);
    }

    pub fn is_enabled(&self, wanted: MenuId) -> bool {
        self.menus
            .iter()
            .flat_map(|menu| menu.items.iter())
            .any(|item| {
                matches!(item, MenuItem::Action { id, enabled: true, .. } if *id == wanted)
            })
    }

    pub fn open(&mut self, index: usize) {
        if index < self.menus.len() {
            self.open = Some(index);
            self.highlighted = self.first_selectable(index);
        }
    }

    pub fn close(&mut self) {
        self.open = None;
    }

    /// Opens the menu whose title mnemonic is `c` (Alt+letter).
    pub fn open_by_mnemonic(&mut self, c: char) -> bool {
        let c = c.to_ascii_lowercase();
        match self
            .menus
            .iter()
            .position(|menu| mnemonic(&menu.title) == Some(c))
        {
            Some(index) => {
                self.open(index);
                true
            }
            None => false,
        }
    }

    fn first_selectable(&self, index: usize) -> usize {
        self.menus[index]
            .items
            .iter()
            .position(MenuItem::is_selectable)
            .unwrap_or(0)
    }

    fn step_highlight(&mut self, forward: bool) {
        let Some(index) = self.open else {
            return;
        };
        let items = &self.menus[index].items;
        if items.is_empty() {
            return;
        }
        let len = items.len();
        let mut pos = self.highlighted;
        for _ in 0..len {
            pos = if forward { (pos + 1) % len } else { (pos + len - 1) % len };
            if items[pos].is_selectable() {
                self.highlighted = pos;
                return;
            }
        }
    }

    fn activate(&mut self, item_index: usize) -> MenuEvent {
        let Some(index) = self.open else {
            return MenuEvent::Ignored;
        };
        match self.menus[index].items.get(item_index) {
            Some(MenuItem::Action {
                id, enabled: true, ..
            }) => {
                let id = *id;
                self.close();
                MenuEvent::Selected(id)
            }
            // Disabled items and separators stay put
            _ => MenuEvent::Consumed,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> MenuEvent {
        let Some(index) = self.open else {
            return MenuEvent::Ignored;
        };
        let count = self.menus.len();

        match key.code {
            KeyCode::Esc | KeyCode::F(10) => {
                self.close();
                MenuEvent::Closed
            }
            KeyCode::Left => {
                self.open((index + count - 1) % count);
                MenuEvent::Consumed
            }
            KeyCode::Right => {
                self.open((index + 1) % count);
                MenuEvent::Consumed
            }
            KeyCode::Up => {
                self.step_highlight(false);
                MenuEvent::Consumed
            }
            KeyCode::Down => {
                self.step_highlight(true);
                MenuEvent::Consumed
            }
            KeyCode::Enter => self.activate(self.highlighted),
            KeyCode::Char(c) => {
                let c = c.to_ascii_lowercase();
                let found = self.menus[index].items.iter().position(|item| match item {
                    MenuItem::Action { label, .. } => mnemonic(label) == Some(c),
                    MenuItem::Separator => false,
                });
                match found {
                    Some(item_index) => {
                        self.highlighted = item_index;
                        self.activate(item_index)
                    }
                    None => MenuEvent::Consumed,
                }
            }
            _ => MenuEvent::Consumed,
        }
    }

    /// Screen spans of the titles on the bar as `(x, width)`.
    pub fn title_spans(&self) -> Vec<(u16, u16)> {
        let mut x = 1;
        self.menus
            .iter()
            .map(|menu| {
                let width = display_label(&menu.title).chars().count() as u16 + 2;
                let span = (x, width);
                x += width;
                span
            })
            .collect()
    }

    /// Area of the open drop-down, borders included.
    pub fn dropdown_rect(&self, screen: Rect) -> Option<Rect> {
        let index = self.open?;
        let menu = &self.menus[index];
        let (x, _) = self.title_spans()[index];
        let inner = menu
            .items
            .iter()
            .map(|item| match item {
                MenuItem::Action {
                    label, shortcut, ..
                } => {
                    display_label(label).chars().count()
                        + shortcut.as_ref().map_or(0, |s| s.chars().count() + 2)
                }
                MenuItem::Separator => 0,
            })
            .max()
            .unwrap_or(0) as u16;
        let width = (inner + 4).min(screen.width);
        let height = (menu.items.len() as u16 + 2).min(screen.height.saturating_sub(1));
        let x = x.min(screen.width.saturating_sub(width));
        Some(Rect::new(x, 1, width, height))
    }

    /// Mouse press at a screen position.
    pub fn handle_click(&mut self, x: u16, y: u16, screen: Rect) -> MenuEvent {
        if y == 0 {
            let hit = self
                .title_spans()
                .iter()
                .position(|&(start, width)| x >= start && x < start + width);
            return match hit {
                Some(index) if self.open == Some(index) => {
                    self.close();
                    MenuEvent::Closed
                }
                Some(index) => {
                    self.open(index);
                    MenuEvent::Consumed
                }
                None if self.is_open() => {
                    self.close();
                    MenuEvent::Closed
                }
                None => MenuEvent::Ignored,
            };
        }

        let Some(rect) = self.dropdown_rect(screen) else {
            return MenuEvent::Ignored;
        };
        if rect_contains(rect, x, y) {
            let row = y.saturating_sub(rect.y + 1) as usize;
            if y > rect.y && y < rect.y + rect.height - 1 {
                self.highlighted = row;
                return self.activate(row);
            }
            return MenuEvent::Consumed;
        }

        self.close();
        MenuEvent::Closed
    }
}
