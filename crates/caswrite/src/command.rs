use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Commands posted to the application from keys or menus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Save,
    SaveAs,
    Open,
    New,
    WindowClose,
    WindowNext,
    WindowPrevious,
    Menu,
    Exit,
}

/// Global key bindings, checked after the active window had its chance.
pub fn command_for_key(key: KeyEvent) -> Option<Command> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);
    let shift = key.modifiers.contains(KeyModifiers::SHIFT);

    match key.code {
        KeyCode::F(2) => Some(Command::Save),
        KeyCode::F(3) if alt => Some(Command::WindowClose),
        KeyCode::F(3) => Some(Command::Open),
        KeyCode::F(6) if shift => Some(Command::WindowPrevious),
        KeyCode::F(6) => Some(Command::WindowNext),
        KeyCode::F(10) => Some(Command::Menu),
        KeyCode::Char(c) if ctrl => match c.to_ascii_lowercase() {
            's' => Some(Command::Save),
            'n' => Some(Command::New),
            'w' => Some(Command::WindowClose),
            _ => None,
        },
        KeyCode::Char(c) if alt && c.eq_ignore_ascii_case(&'x') => Some(Command::Exit),
        _ => None,
    }
}
