use ratatui::{
    layout::{Alignment, Constraint, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Cell, Clear, Paragraph, Row, Table},
    Frame,
};

use crate::app::{desktop_rect, App};
use crate::config::Theme;
use crate::dialog::{Dialog, DialogKind, FileOpenBox, MessageBox};
use crate::editor::Position;
use crate::editor_pane::EditorPane;
use crate::highlight::Highlighter;
use crate::menu::{display_label, mnemonic, MenuBar, MenuItem};
use crate::status_manager::{MessageType, StatusManager};
use crate::table_pane::{TablePane, COLUMN_SPACING};
use crate::text_width;
use crate::window::{Pane, Window};

/// Colors resolved from the configured theme.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub desktop: Color,
    pub window: Color,
    pub active_border: Color,
    pub menu: Color,
}

impl Palette {
    pub fn from_theme(theme: &Theme) -> Self {
        let pick = |value: &Option<String>, fallback: Color| {
            value.as_deref().and_then(parse_hex_color).unwrap_or(fallback)
        };
        Self {
            desktop: pick(&theme.desktop_background, Color::Blue),
            window: pick(&theme.window_background, Color::Black),
            active_border: pick(&theme.active_border, Color::Yellow),
            menu: pick(&theme.menu_background, Color::Gray),
        }
    }
}

/// `#RRGGBB` to an RGB color.
pub fn parse_hex_color(value: &str) -> Option<Color> {
    let hex = value.strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
    Some(Color::Rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

pub fn draw(f: &mut Frame, app: &mut App) {
    let screen = f.size();
    if screen != app.screen() {
        app.resize(screen);
    }
    let palette = Palette::from_theme(&app.config.theme);

    let desktop = desktop_rect(screen);
    f.render_widget(
        Block::default().style(Style::default().bg(palette.desktop)),
        desktop,
    );

    let modal = !app.dialogs.is_empty() || app.menu.is_open();
    let active_id = app.windows.active_id();
    let highlighter = app.highlighter.as_ref();
    let mut cursor = None;
    for window in app.windows.windows_mut() {
        let is_active = Some(window.id) == active_id;
        let window_cursor = draw_window(f, window, is_active, highlighter, &palette, screen);
        if is_active && !modal {
            cursor = window_cursor;
        }
    }

    draw_menu_bar(f, &app.menu, Rect { height: 1, ..screen }, &palette);
    draw_status_line(f, &app.status, screen, &palette);
    draw_dropdown(f, &app.menu, screen, &palette);

    let dialog_count = app.dialogs.len();
    for (index, dialog) in app.dialogs.iter_mut().enumerate() {
        let dialog_cursor = draw_dialog(f, dialog, screen, &palette);
        if index + 1 == dialog_count {
            cursor = dialog_cursor;
        }
    }

    if let Some((x, y)) = cursor {
        f.set_cursor(x, y);
    }
}

fn draw_window(
    f: &mut Frame,
    window: &mut Window,
    is_active: bool,
    highlighter: Option<&Highlighter>,
    palette: &Palette,
    screen: Rect,
) -> Option<(u16, u16)> {
    let area = window.rect.intersection(screen);
    if area.width < 3 || area.height < 3 {
        return None;
    }
    f.render_widget(Clear, area);

    let mut title = String::new();
    if window.closable {
        title.push_str("[■] ");
    }
    title.push_str(&window.title());
    if window.is_maximized() {
        title.push_str(" [max]");
    }

    let (border_type, border_style) = if is_active {
        (BorderType::Double, Style::default().fg(palette.active_border))
    } else {
        (BorderType::Plain, Style::default().fg(Color::DarkGray))
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(border_type)
        .border_style(border_style)
        .title(Span::styled(title, border_style.add_modifier(Modifier::BOLD)))
        .style(Style::default().bg(palette.window).fg(Color::White));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let offset = match &mut window.pane {
        Pane::Editor(pane) => draw_editor_pane(f, pane, inner, highlighter),
        Pane::Table(pane) => draw_table_pane(f, pane, inner),
    }?;
    let x = inner.x + offset.0 as u16;
    let y = inner.y + offset.1 as u16;
    (x < inner.x + inner.width && y < inner.y + inner.height).then_some((x, y))
}

fn draw_editor_pane(
    f: &mut Frame,
    pane: &mut EditorPane,
    area: Rect,
    highlighter: Option<&Highlighter>,
) -> Option<(usize, usize)> {
    pane.set_viewport(area.width as usize, area.height as usize);
    let gutter = pane.gutter_width();
    let text_width = (area.width as usize).saturating_sub(gutter);
    let lines = pane.visible_lines(text_width);
    let first_line = pane.editor.viewport_offset();
    let selection = pane.editor.selection();

    let mut rendered: Vec<Line> = match (selection, highlighter) {
        (None, Some(highlighter)) if pane.syntax_highlighting => {
            let syntax = highlighter.syntax_for_path(pane.path());
            let text: Vec<String> = lines.into_iter().map(|(_, line)| line).collect();
            highlighter.highlight(&text, syntax)
        }
        _ => lines
            .iter()
            .enumerate()
            .map(|(i, (skipped, line))| {
                selection_line(line, first_line + i, shift_selection(selection, *skipped))
            })
            .collect(),
    };

    if pane.line_numbers() {
        for (i, line) in rendered.iter_mut().enumerate() {
            let number = format!("{:>width$} ", first_line + i + 1, width = gutter - 1);
            line.spans
                .insert(0, Span::styled(number, Style::default().fg(Color::DarkGray)));
        }
    }

    f.render_widget(Paragraph::new(rendered), area);
    Some(pane.cursor_offset())
}

/// Selection columns relative to a line whose first `skipped` chars are
/// scrolled out of view.
fn shift_selection(
    selection: Option<(Position, Position)>,
    skipped: usize,
) -> Option<(Position, Position)> {
    selection.map(|((start_line, start_col), (end_line, end_col))| {
        (
            (start_line, start_col.saturating_sub(skipped)),
            (end_line, end_col.saturating_sub(skipped)),
        )
    })
}

/// Plain line with the selected part shown reversed.
fn selection_line(line: &str, line_idx: usize, selection: Option<(Position, Position)>) -> Line<'static> {
    let Some(((start_line, start_col), (end_line, end_col))) = selection else {
        return Line::from(line.to_string());
    };
    if line_idx < start_line || line_idx > end_line {
        return Line::from(line.to_string());
    }

    let len = line.chars().count();
    let from = if line_idx == start_line { start_col.min(len) } else { 0 };
    let to = if line_idx == end_line { end_col.min(len) } else { len };
    let chars: Vec<char> = line.chars().collect();
    let before: String = chars[..from].iter().collect();
    let selected: String = chars[from..to.max(from)].iter().collect();
    let after: String = chars[to.max(from)..].iter().collect();

    Line::from(vec![
        Span::raw(before),
        Span::styled(selected, Style::default().add_modifier(Modifier::REVERSED)),
        Span::raw(after),
    ])
}

fn draw_table_pane(f: &mut Frame, pane: &mut TablePane, area: Rect) -> Option<(usize, usize)> {
    pane.set_viewport(area.width as usize, area.height as usize);
    let columns = pane.visible_columns(area.width as usize);
    let (row_offset, _) = pane.offsets();
    let (sel_row, sel_col) = pane.selection();
    let last_row = (row_offset + area.height as usize).min(pane.display_rows());

    let rows: Vec<Row> = (row_offset..last_row)
        .map(|r| {
            let cells: Vec<Cell> = columns
                .iter()
                .map(|&(c, _)| {
                    let text = match pane.editing() {
                        Some(edit) if (r, c) == (sel_row, sel_col) => edit.buffer.clone(),
                        _ => pane.table.cell(r, c).to_string(),
                    };
                    let text = text.replace(|ch| ch == '\r' || ch == '\n', " ");
                    let mut style = Style::default();
                    if (r, c) == (sel_row, sel_col) {
                        style = if pane.editing().is_some() {
                            style.bg(Color::White).fg(Color::Black)
                        } else {
                            style.add_modifier(Modifier::REVERSED)
                        };
                    }
                    Cell::from(text).style(style)
                })
                .collect();
            let row = Row::new(cells);
            if r == 0 && pane.header_row() {
                row.style(
                    Style::default()
                        .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
                )
            } else {
                row
            }
        })
        .collect();

    let widths: Vec<Constraint> = columns
        .iter()
        .map(|&(_, width)| Constraint::Length(width as u16))
        .collect();
    let table = Table::new(rows, widths).column_spacing(COLUMN_SPACING as u16);
    f.render_widget(table, area);

    pane.cursor_offset()
}

fn draw_menu_bar(f: &mut Frame, menu: &MenuBar, area: Rect, palette: &Palette) {
    let base = Style::default().bg(palette.menu).fg(Color::Black);
    let mut spans = vec![Span::styled(" ", base)];
    for (index, item) in menu.menus().iter().enumerate() {
        let style = if menu.open_index() == Some(index) {
            base.add_modifier(Modifier::REVERSED)
        } else {
            base
        };
        spans.push(Span::styled(" ", style));
        spans.extend(mnemonic_spans(&item.title, style));
        spans.push(Span::styled(" ", style));
    }
    f.render_widget(Paragraph::new(Line::from(spans)).style(base), area);
}

/// Label split so the mnemonic letter is underlined.
fn mnemonic_spans(label: &str, style: Style) -> Vec<Span<'static>> {
    match label.find('&') {
        Some(idx) if mnemonic(label).is_some() => {
            let rest = &label[idx + 1..];
            let key_len = rest.chars().next().map_or(0, char::len_utf8);
            vec![
                Span::styled(label[..idx].to_string(), style),
                Span::styled(
                    rest[..key_len].to_string(),
                    style.add_modifier(Modifier::UNDERLINED),
                ),
                Span::styled(rest[key_len..].to_string(), style),
            ]
        }
        _ => vec![Span::styled(label.to_string(), style)],
    }
}

fn draw_dropdown(f: &mut Frame, menu: &MenuBar, screen: Rect, palette: &Palette) {
    let (Some(index), Some(rect)) = (menu.open_index(), menu.dropdown_rect(screen)) else {
        return;
    };
    let rect = rect.intersection(screen);
    if rect.width < 3 || rect.height < 3 {
        return;
    }
    let base = Style::default().bg(palette.menu).fg(Color::Black);
    let block = Block::default()
        .borders(Borders::ALL)
        .style(base);
    let inner = block.inner(rect);
    f.render_widget(Clear, rect);
    f.render_widget(block, rect);

    let width = inner.width as usize;
    let lines: Vec<Line> = menu.menus()[index]
        .items
        .iter()
        .enumerate()
        .map(|(i, item)| match item {
            MenuItem::Separator => Line::styled("─".repeat(width), base),
            MenuItem::Action {
                label,
                shortcut,
                enabled,
                ..
            } => {
                let mut style = if *enabled {
                    base
                } else {
                    base.fg(Color::DarkGray)
                };
                if i == menu.highlighted() {
                    style = style.add_modifier(Modifier::REVERSED);
                }
                let shortcut = shortcut.as_deref().unwrap_or("");
                let label_width = display_label(label).chars().count();
                let gap = width.saturating_sub(label_width + shortcut.chars().count() + 2);

                let mut spans = vec![Span::styled(" ", style)];
                spans.extend(mnemonic_spans(label, style));
                spans.push(Span::styled(" ".repeat(gap), style));
                spans.push(Span::styled(format!("{} ", shortcut), style));
                Line::from(spans)
            }
        })
        .collect();
    f.render_widget(Paragraph::new(lines), inner);
}

fn draw_status_line(f: &mut Frame, status: &StatusManager, screen: Rect, palette: &Palette) {
    if screen.height < 2 {
        return;
    }
    let area = Rect {
        y: screen.y + screen.height - 1,
        height: 1,
        ..screen
    };
    let style = match status.current_message().map(|message| message.message_type) {
        Some(MessageType::Error) => Style::default().bg(Color::Red).fg(Color::White),
        Some(MessageType::Warning) => Style::default().bg(Color::Yellow).fg(Color::Black),
        Some(MessageType::Success) => Style::default().bg(Color::Green).fg(Color::Black),
        Some(MessageType::Info) | None => Style::default().bg(palette.menu).fg(Color::Black),
    };

    let position = status.position();
    let right_width = text_width::str_width(position) + 1;
    let left_width = (area.width as usize).saturating_sub(right_width);
    let text = format!(
        " {}{} ",
        text_width::fit(status.left_text(), left_width.saturating_sub(1)),
        position
    );
    f.render_widget(Paragraph::new(text).style(style), area);
}

fn draw_dialog(
    f: &mut Frame,
    dialog: &mut Dialog,
    screen: Rect,
    palette: &Palette,
) -> Option<(u16, u16)> {
    let rect = dialog.rect(screen).intersection(screen);
    if rect.width < 3 || rect.height < 3 {
        return None;
    }
    let base = Style::default().bg(palette.menu).fg(Color::Black);
    let title = match &dialog.kind {
        DialogKind::Message(message) => message.title.clone(),
        DialogKind::FileOpen(open) => open.title.clone(),
        DialogKind::Input(input) => input.title.clone(),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .title(Line::from(format!(" {} ", title)).alignment(Alignment::Center))
        .style(base);
    let inner = block.inner(rect);
    f.render_widget(Clear, rect);
    f.render_widget(block, rect);

    match &mut dialog.kind {
        DialogKind::Message(message) => {
            draw_message_box(f, message, rect, inner, base);
            None
        }
        DialogKind::FileOpen(open) => draw_file_open_box(f, open, rect, inner, base),
        DialogKind::Input(input) => {
            if inner.height < 3 {
                return None;
            }
            f.render_widget(
                Paragraph::new(input.prompt.as_str()),
                Rect { height: 1, ..inner },
            );
            let field = Rect {
                y: inner.y + 2,
                height: 1,
                ..inner
            };
            let visible = tail_fit(&input.value, field.width.saturating_sub(1) as usize);
            let cursor_x = field.x + text_width::str_width(visible) as u16;
            f.render_widget(
                Paragraph::new(visible.to_string())
                    .style(Style::default().bg(Color::Black).fg(Color::White)),
                field,
            );
            Some((cursor_x, field.y))
        }
    }
}

fn draw_message_box(f: &mut Frame, message: &MessageBox, rect: Rect, inner: Rect, base: Style) {
    let text_area = Rect {
        y: inner.y + 1,
        height: inner.height.saturating_sub(3),
        ..inner
    };
    f.render_widget(
        Paragraph::new(message.message.as_str()).alignment(Alignment::Center),
        text_area,
    );

    let row = MessageBox::button_row(rect);
    for (i, ((x, width), label)) in message
        .button_spans(rect)
        .into_iter()
        .zip(message.labels())
        .enumerate()
    {
        let style = if i == message.focused {
            base.bg(Color::Blue).fg(Color::White)
        } else {
            base.bg(Color::Green)
        };
        let mut spans = vec![Span::styled("[ ", style)];
        spans.extend(mnemonic_spans(label, style));
        spans.push(Span::styled(" ]", style));
        let area = Rect::new(x, row, width, 1).intersection(rect);
        f.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}

fn draw_file_open_box(
    f: &mut Frame,
    open: &mut FileOpenBox,
    rect: Rect,
    inner: Rect,
    base: Style,
) -> Option<(u16, u16)> {
    if inner.height < 4 {
        return None;
    }
    let dir_line = format!("Dir: {}", open.dir.display());
    f.render_widget(
        Paragraph::new(tail_fit(&dir_line, inner.width as usize).to_string()),
        Rect { height: 1, ..inner },
    );

    let field = Rect {
        y: inner.y + 1,
        height: 1,
        ..inner
    };
    let label = "Name: ";
    let visible = tail_fit(&open.field, (field.width as usize).saturating_sub(label.len() + 1));
    f.render_widget(
        Paragraph::new(Line::from(vec![
            Span::raw(label),
            Span::styled(
                visible.to_string(),
                Style::default().bg(Color::Black).fg(Color::White),
            ),
        ])),
        field,
    );
    let cursor = (
        field.x + (label.len() + text_width::str_width(visible)) as u16,
        field.y,
    );

    let list = FileOpenBox::list_area(rect).intersection(inner);
    open.scroll_into_view(list.height as usize);
    let lines: Vec<Line> = open
        .entries
        .iter()
        .enumerate()
        .skip(open.offset)
        .take(list.height as usize)
        .map(|(i, entry)| {
            let name = if entry.is_dir {
                format!("{}/", entry.name)
            } else {
                entry.name.clone()
            };
            let style = if i == open.selected {
                base.add_modifier(Modifier::REVERSED)
            } else {
                base
            };
            Line::styled(text_width::fit(&name, list.width as usize), style)
        })
        .collect();
    f.render_widget(Paragraph::new(lines), list);

    if let Some(error) = &open.error {
        let row = Rect {
            y: inner.y + inner.height - 1,
            height: 1,
            ..inner
        };
        f.render_widget(
            Paragraph::new(error.as_str()).style(base.fg(Color::Red)),
            row,
        );
    }
    Some(cursor)
}

/// Longest suffix of `text` that fits in `width` columns.
fn tail_fit(text: &str, width: usize) -> &str {
    let mut start = text.len();
    let mut used = 0;
    for (idx, c) in text.char_indices().rev() {
        let w = text_width::str_width(&text[idx..idx + c.len_utf8()]);
        if used + w > width {
            break;
        }
        used += w;
        start = idx;
    }
    &text[start..]
}
