//! Overlapping windows on the desktop.
//!
//! The manager keeps windows in z-order: the last entry is topmost and is
//! the active window.

use std::path::{Path, PathBuf};

use crossterm::event::KeyEvent;
use ratatui::layout::Rect;

use crate::editor_pane::{EditAction, EditorPane};
use crate::table_pane::TablePane;

pub const MIN_WIDTH: u16 = 20;
pub const MIN_HEIGHT: u16 = 6;
const CASCADE_STEPS: u16 = 8;

pub type WindowId = usize;

/// What a window shows.
pub enum Pane {
    Editor(EditorPane),
    Table(TablePane),
}

impl Pane {
    pub fn is_dirty(&self) -> bool {
        match self {
            Pane::Editor(pane) => pane.is_dirty(),
            Pane::Table(pane) => pane.is_dirty(),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            Pane::Editor(pane) => pane.path(),
            Pane::Table(pane) => pane.path(),
        }
    }

    pub fn set_path(&mut self, path: PathBuf) {
        match self {
            Pane::Editor(pane) => pane.set_path(path),
            Pane::Table(pane) => pane.set_path(path),
        }
    }

    /// Text to write to disk.
    pub fn content(&mut self) -> String {
        match self {
            Pane::Editor(pane) => pane.content(),
            Pane::Table(pane) => pane.content(),
        }
    }

    pub fn mark_saved(&mut self) {
        match self {
            Pane::Editor(pane) => pane.mark_saved(),
            Pane::Table(pane) => pane.mark_saved(),
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        match self {
            Pane::Editor(pane) => pane.handle_key(key),
            Pane::Table(pane) => pane.handle_key(key),
        }
    }

    pub fn edit(&mut self, action: EditAction) -> bool {
        match self {
            Pane::Editor(pane) => pane.edit(action),
            Pane::Table(pane) => pane.edit(action),
        }
    }

    pub fn click(&mut self, x: usize, y: usize) {
        match self {
            Pane::Editor(pane) => pane.click(x, y),
            Pane::Table(pane) => pane.click(x, y),
        }
    }

    pub fn scroll(&mut self, delta: isize) {
        match self {
            Pane::Editor(pane) => pane.scroll(delta),
            Pane::Table(pane) => pane.scroll(delta),
        }
    }

    pub fn position_label(&self) -> String {
        match self {
            Pane::Editor(pane) => pane.position_label(),
            Pane::Table(pane) => pane.position_label(),
        }
    }
}

/// Part of a window under the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hit {
    CloseBox,
    TitleBar,
    ResizeCorner,
    /// Offset inside the content area
    Content(u16, u16),
    Border,
}

pub struct Window {
    pub id: WindowId,
    title: String,
    pub rect: Rect,
    pub pane: Pane,
    pub closable: bool,
    restore_rect: Option<Rect>,
}

impl Window {
    /// File name when the pane has one, else the title given at creation.
    pub fn title(&self) -> String {
        let name = self
            .pane
            .path()
            .and_then(|path| path.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.title.clone());
        if self.pane.is_dirty() {
            format!("*{}", name)
        } else {
            name
        }
    }

    pub fn is_maximized(&self) -> bool {
        self.restore_rect.is_some()
    }

    /// Area inside the border.
    pub fn content_rect(&self) -> Rect {
        Rect {
            x: self.rect.x.saturating_add(1),
            y: self.rect.y.saturating_add(1),
            width: self.rect.width.saturating_sub(2),
            height: self.rect.height.saturating_sub(2),
        }
    }

    pub fn contains(&self, x: u16, y: u16) -> bool {
        rect_contains(self.rect, x, y)
    }

    pub fn hit(&self, x: u16, y: u16) -> Option<Hit> {
        if !self.contains(x, y) {
            return None;
        }
        let right = self.rect.x + self.rect.width - 1;
        let bottom = self.rect.y + self.rect.height - 1;

        if y == self.rect.y {
            if self.closable && x > self.rect.x && x <= self.rect.x + 3 {
                return Some(Hit::CloseBox);
            }
            return Some(Hit::TitleBar);
        }
        if x == right && y == bottom {
            return Some(Hit::ResizeCorner);
        }
        let content = self.content_rect();
        if rect_contains(content, x, y) {
            return Some(Hit::Content(x - content.x, y - content.y));
        }
        Some(Hit::Border)
    }
}

pub fn rect_contains(rect: Rect, x: u16, y: u16) -> bool {
    x >= rect.x
        && y >= rect.y
        && (x as u32) < rect.x as u32 + rect.width as u32
        && (y as u32) < rect.y as u32 + rect.height as u32
}

pub struct WindowManager {
    windows: Vec<Window>,
    desktop: Rect,
    next_id: WindowId,
    placed: u16,
}

impl WindowManager {
    pub fn new(desktop: Rect) -> Self {
        Self {
            windows: Vec::new(),
            desktop,
            next_id: 1,
            placed: 0,
        }
    }

    pub fn desktop(&self) -> Rect {
        self.desktop
    }

    /// Adds a window on top, cascading from the desktop origin.
    pub fn add(&mut self, title: impl Into<String>, pane: Pane) -> WindowId {
        let step = self.placed % CASCADE_STEPS;
        self.placed = self.placed.wrapping_add(1);

        let width = self.desktop.width.saturating_sub(CASCADE_STEPS * 2).max(MIN_WIDTH);
        let height = self.desktop.height.saturating_sub(CASCADE_STEPS).max(MIN_HEIGHT);
        let rect = self.clamp(Rect {
            x: self.desktop.x + step * 2,
            y: self.desktop.y + step,
            width,
            height,
        });

        let id = self.next_id;
        self.next_id += 1;
        self.windows.push(Window {
            id,
            title: title.into(),
            rect,
            pane,
            closable: true,
            restore_rect: None,
        });
        log::debug!("Opened window {} at {:?}", id, rect);
        id
    }

    pub fn count(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Windows bottom to top.
    pub fn windows(&self) -> &[Window] {
        &self.windows
    }

    pub fn windows_mut(&mut self) -> impl Iterator<Item = &mut Window> {
        self.windows.iter_mut()
    }

    pub fn active(&self) -> Option<&Window> {
        self.windows.last()
    }

    pub fn active_mut(&mut self) -> Option<&mut Window> {
        self.windows.last_mut()
    }

    pub fn active_id(&self) -> Option<WindowId> {
        self.active().map(|window| window.id)
    }

    pub fn get(&self, id: WindowId) -> Option<&Window> {
        self.windows.iter().find(|window| window.id == id)
    }

    pub fn get_mut(&mut self, id: WindowId) -> Option<&mut Window> {
        self.windows.iter_mut().find(|window| window.id == id)
    }

    pub fn ids(&self) -> Vec<WindowId> {
        self.windows.iter().map(|window| window.id).collect()
    }

    pub fn any_dirty(&self) -> bool {
        self.windows.iter().any(|window| window.pane.is_dirty())
    }

    /// Raises a window to the top.
    pub fn activate(&mut self, id: WindowId) -> bool {
        match self.windows.iter().position(|window| window.id == id) {
            Some(index) => {
                let window = self.windows.remove(index);
                self.windows.push(window);
                true
            }
            None => false,
        }
    }

    /// Brings the bottom window to the top.
    pub fn next(&mut self) {
        if self.windows.len() > 1 {
            let window = self.windows.remove(0);
            self.windows.push(window);
        }
    }

    /// Sends the active window to the bottom.
    pub fn previous(&mut self) {
        if let Some(window) = self.windows.pop() {
            self.windows.insert(0, window);
        }
    }

    pub fn close(&mut self, id: WindowId) -> Option<Window> {
        let index = self.windows.iter().position(|window| window.id == id)?;
        log::debug!("Closed window {}", id);
        Some(self.windows.remove(index))
    }

    /// Topmost window under a screen position.
    pub fn window_at(&self, x: u16, y: u16) -> Option<WindowId> {
        self.windows
            .iter()
            .rev()
            .find(|window| window.contains(x, y))
            .map(|window| window.id)
    }

    pub fn move_to(&mut self, id: WindowId, x: u16, y: u16) {
        let desktop = self.desktop;
        if let Some(window) = self.get_mut(id) {
            let rect = Rect { x, y, ..window.rect };
            window.rect = clamp_rect(rect, desktop);
            window.restore_rect = None;
        }
    }

    pub fn move_by(&mut self, id: WindowId, dx: i32, dy: i32) {
        if let Some(rect) = self.get(id).map(|window| window.rect) {
            let x = (rect.x as i32 + dx).max(0) as u16;
            let y = (rect.y as i32 + dy).max(0) as u16;
            self.move_to(id, x, y);
        }
    }

    /// Resizes keeping the top-left corner; never below 20x6.
    pub fn resize_to(&mut self, id: WindowId, width: u16, height: u16) {
        let desktop = self.desktop;
        if let Some(window) = self.get_mut(id) {
            let max_width = (desktop.x + desktop.width).saturating_sub(window.rect.x);
            let max_height = (desktop.y + desktop.height).saturating_sub(window.rect.y);
            window.rect.width = width.min(max_width).max(MIN_WIDTH);
            window.rect.height = height.min(max_height).max(MIN_HEIGHT);
            window.rect = clamp_rect(window.rect, desktop);
            window.restore_rect = None;
        }
    }

    pub fn toggle_maximize(&mut self, id: WindowId) {
        let desktop = self.desktop;
        if let Some(window) = self.get_mut(id) {
            match window.restore_rect.take() {
                Some(rect) => window.rect = clamp_rect(rect, desktop),
                None => {
                    window.restore_rect = Some(window.rect);
                    window.rect = desktop;
                }
            }
        }
    }

    /// Lays windows out in a grid covering the desktop.
    pub fn tile(&mut self) {
        let count = self.windows.len() as u16;
        if count == 0 {
            return;
        }
        let mut cols = 1;
        while cols * cols < count {
            cols += 1;
        }
        let rows = count.div_ceil(cols);
        let desktop = self.desktop;
        let cell_width = (desktop.width / cols).max(1);
        let cell_height = (desktop.height / rows).max(1);

        for (index, window) in self.windows.iter_mut().enumerate() {
            let index = index as u16;
            let (row, col) = (index / cols, index % cols);
            // Last column and row absorb the remainder
            let width = if col == cols - 1 {
                desktop.width - cell_width * col
            } else {
                cell_width
            };
            let height = if row == rows - 1 {
                desktop.height - cell_height * row
            } else {
                cell_height
            };
            window.restore_rect = None;
            window.rect = Rect {
                x: desktop.x + cell_width * col,
                y: desktop.y + cell_height * row,
                width,
                height,
            };
        }
    }

    pub fn cascade(&mut self) {
        let desktop = self.desktop;
        let count = self.windows.len() as u16;
        let width = desktop
            .width
            .saturating_sub(count.saturating_sub(1) * 2)
            .max(MIN_WIDTH);
        let height = desktop
            .height
            .saturating_sub(count.saturating_sub(1))
            .max(MIN_HEIGHT);

        for (index, window) in self.windows.iter_mut().enumerate() {
            let index = index as u16;
            window.restore_rect = None;
            window.rect = clamp_rect(
                Rect {
                    x: desktop.x + index * 2,
                    y: desktop.y + index,
                    width,
                    height,
                },
                desktop,
            );
        }
        self.placed = count;
    }

    /// Updates the desktop area and pulls windows back inside it.
    pub fn set_desktop(&mut self, desktop: Rect) {
        self.desktop = desktop;
        for window in &mut self.windows {
            if window.restore_rect.is_some() {
                window.rect = desktop;
            } else {
                window.rect = clamp_rect(window.rect, desktop);
            }
        }
    }

    fn clamp(&self, rect: Rect) -> Rect {
        clamp_rect(rect, self.desktop)
    }
}

/// Shrinks and shifts `rect` so it lies inside `bounds`.
fn clamp_rect(rect: Rect, bounds: Rect) -> Rect {
    let width = rect.width.min(bounds.width);
    let height = rect.height.min(bounds.height);
    let max_x = bounds.x + bounds.width - width;
    let max_y = bounds.y + bounds.height - height;
    Rect {
        x: rect.x.clamp(bounds.x, max_x),
        y: rect.y.clamp(bounds.y, max_y),
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn desktop() -> Rect {
        Rect::new(0, 1, 80, 22)
    }

    fn editor() -> Pane {
        Pane::Editor(EditorPane::new(&Config::default().editor))
    }

    fn manager_with(count: usize) -> (WindowManager, Vec<WindowId>) {
        let mut manager = WindowManager::new(desktop());
        let ids = (0..count)
            .map(|i| manager.add(format!("Untitled {}", i + 1), editor()))
            .collect();
        (manager, ids)
    }

    #[test]
    fn test_add_cascades_and_activates() {
        let (manager, ids) = manager_with(2);
        assert_eq!(manager.count(), 2);
        assert_eq!(manager.active_id(), Some(ids[1]));

        let first = manager.get(ids[0]).unwrap().rect;
        let second = manager.get(ids[1]).unwrap().rect;
        assert_eq!((first.x, first.y), (0, 1));
        assert_eq!((second.x, second.y), (2, 2));
        assert_eq!(first.width, 64);
    }

    #[test]
    fn test_next_previous_and_activate() {
        let (mut manager, ids) = manager_with(3);
        manager.next();
        assert_eq!(manager.active_id(), Some(ids[0]));
        manager.previous();
        assert_eq!(manager.active_id(), Some(ids[2]));
        assert!(manager.activate(ids[1]));
        assert_eq!(manager.active_id(), Some(ids[1]));
        assert!(!manager.activate(999));
    }

    #[test]
    fn test_close() {
        let (mut manager, ids) = manager_with(2);
        assert!(manager.close(ids[1]).is_some());
        assert_eq!(manager.active_id(), Some(ids[0]));
        assert!(manager.close(ids[1]).is_none());
        manager.close(ids[0]);
        assert!(manager.is_empty());
        assert!(manager.active().is_none());
    }

    #[test]
    fn test_window_at_prefers_topmost() {
        let (manager, ids) = manager_with(2);
        assert_eq!(manager.window_at(5, 5), Some(ids[1]));
        assert_eq!(manager.window_at(0, 1), Some(ids[0]));
        assert_eq!(manager.window_at(79, 0), None);
    }

    #[test]
    fn test_hit_regions() {
        let (manager, ids) = manager_with(1);
        let window = manager.get(ids[0]).unwrap();
        let rect = window.rect;
        assert_eq!(window.hit(rect.x + 2, rect.y), Some(Hit::CloseBox));
        assert_eq!(window.hit(rect.x + 10, rect.y), Some(Hit::TitleBar));
        assert_eq!(
            window.hit(rect.x + rect.width - 1, rect.y + rect.height - 1),
            Some(Hit::ResizeCorner)
        );
        assert_eq!(window.hit(rect.x + 3, rect.y + 2), Some(Hit::Content(2, 1)));
        assert_eq!(window.hit(rect.x, rect.y + 2), Some(Hit::Border));
        assert_eq!(window.hit(rect.x + rect.width, rect.y), None);
    }

    #[test]
    fn test_move_and_resize_are_clamped() {
        let (mut manager, ids) = manager_with(1);
        let id = ids[0];
        manager.move_to(id, 500, 500);
        let rect = manager.get(id).unwrap().rect;
        assert_eq!(rect.x + rect.width, 80);
        assert_eq!(rect.y + rect.height, 23);

        manager.move_by(id, -100, -100);
        let rect = manager.get(id).unwrap().rect;
        assert_eq!((rect.x, rect.y), (0, 1));

        manager.resize_to(id, 3, 2);
        let rect = manager.get(id).unwrap().rect;
        assert_eq!((rect.width, rect.height), (MIN_WIDTH, MIN_HEIGHT));
    }

    #[test]
    fn test_toggle_maximize_restores() {
        let (mut manager, ids) = manager_with(1);
        let before = manager.get(ids[0]).unwrap().rect;
        manager.toggle_maximize(ids[0]);
        assert_eq!(manager.get(ids[0]).unwrap().rect, desktop());
        assert!(manager.get(ids[0]).unwrap().is_maximized());
        manager.toggle_maximize(ids[0]);
        assert_eq!(manager.get(ids[0]).unwrap().rect, before);
    }

    #[test]
    fn test_tile_covers_desktop() {
        let (mut manager, _) = manager_with(3);
        manager.tile();
        let rects: Vec<Rect> = manager.windows().iter().map(|w| w.rect).collect();
        assert_eq!(rects[0], Rect::new(0, 1, 40, 11));
        assert_eq!(rects[1], Rect::new(40, 1, 40, 11));
        assert_eq!(rects[2], Rect::new(0, 12, 40, 11));
    }

    #[test]
    fn test_set_desktop_clamps_windows() {
        let (mut manager, ids) = manager_with(1);
        manager.move_to(ids[0], 16, 10);
        manager.set_desktop(Rect::new(0, 1, 40, 10));
        let rect = manager.get(ids[0]).unwrap().rect;
        assert!(rect.x + rect.width <= 40);
        assert!(rect.y + rect.height <= 11);
        assert!(rect.y >= 1);
    }

    #[test]
    fn test_title_marks_dirty_and_uses_file_name() {
        let (mut manager, ids) = manager_with(1);
        assert_eq!(manager.get(ids[0]).unwrap().title(), "Untitled 1");

        let window = manager.get_mut(ids[0]).unwrap();
        if let Pane::Editor(pane) = &mut window.pane {
            pane.editor.insert_char('x');
        }
        window.pane.set_path(PathBuf::from("/tmp/notes.txt"));
        assert_eq!(window.title(), "*notes.txt");
        assert!(manager.any_dirty());
    }
}
