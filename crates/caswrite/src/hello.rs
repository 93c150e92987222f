//! A single modal window with a few labels and an Exit button.

use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
    Frame,
};

use crate::dialog::centered;
use crate::window::rect_contains;

pub const WINDOW_WIDTH: u16 = 50;
pub const WINDOW_HEIGHT: u16 = 10;
pub const TITLE: &str = "Hello World";
pub const LABELS: [&str; 4] = [
    "Hello World from CasWrite!",
    "",
    "This is a simple TUI application",
    "built with ratatui and crossterm.",
];
const BUTTON: &str = "[ Exit ]";

#[derive(Debug, Default)]
pub struct HelloApp {
    should_quit: bool,
}

impl HelloApp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn window_rect(screen: Rect) -> Rect {
        centered(screen, WINDOW_WIDTH, WINDOW_HEIGHT)
    }

    pub fn button_rect(screen: Rect) -> Rect {
        let window = Self::window_rect(screen);
        let width = BUTTON.len() as u16;
        Rect::new(
            window.x + window.width.saturating_sub(width) / 2,
            window.y + window.height.saturating_sub(2),
            width.min(window.width),
            1,
        )
    }

    pub fn handle_event(&mut self, event: Event, screen: Rect) {
        match event {
            Event::Key(key) => self.handle_key(key),
            Event::Mouse(mouse) => self.handle_mouse(mouse, screen),
            _ => {}
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        let exit = match key.code {
            KeyCode::Enter | KeyCode::Char(' ') => true,
            KeyCode::Char(c) => {
                c.eq_ignore_ascii_case(&'e') && !key.modifiers.contains(KeyModifiers::CONTROL)
            }
            _ => false,
        };
        if exit {
            log::info!("Exit pressed");
            self.should_quit = true;
        }
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent, screen: Rect) {
        if mouse.kind == MouseEventKind::Down(MouseButton::Left)
            && rect_contains(Self::button_rect(screen), mouse.column, mouse.row)
        {
            self.should_quit = true;
        }
    }
}

pub fn draw(f: &mut Frame, _app: &HelloApp) {
    let screen = f.size();
    f.render_widget(Block::default().style(Style::default().bg(Color::Blue)), screen);

    let area = HelloApp::window_rect(screen).intersection(screen);
    f.render_widget(Clear, area);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .title(Line::from(TITLE).alignment(Alignment::Center))
        .style(Style::default().bg(Color::Gray).fg(Color::Black));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let lines: Vec<Line> = LABELS.iter().map(|label| Line::from(*label)).collect();
    f.render_widget(
        Paragraph::new(lines).alignment(Alignment::Center),
        Rect {
            y: inner.y + 1,
            height: inner.height.saturating_sub(1),
            ..inner
        },
    );

    let button = HelloApp::button_rect(screen).intersection(inner);
    let style = Style::default().bg(Color::Blue).fg(Color::White);
    f.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled("[ ", style),
            Span::styled("E", style.add_modifier(Modifier::UNDERLINED)),
            Span::styled("xit ]", style),
        ])),
        button,
    );
}
