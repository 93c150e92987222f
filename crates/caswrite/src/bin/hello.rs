use anyhow::Result;
use caswrite::{
    hello::{self, HelloApp},
    terminal,
};
use crossterm::event;
use std::time::Duration;

fn main() -> Result<()> {
    if let Err(e) = caswrite::logging::init("hello") {
        eprintln!("Logging disabled: {}", e);
    }

    let mut terminal = terminal::init()?;
    let res = run(&mut terminal);
    terminal::restore()?;
    res
}

fn run(terminal: &mut terminal::Tui) -> Result<()> {
    let mut app = HelloApp::new();
    while !app.should_quit() {
        if let Err(e) = terminal.draw(|f| hello::draw(f, &app)) {
            log::error!("Terminal draw error: {}", e);
        }
        if event::poll(Duration::from_millis(100))? {
            let screen = terminal.size()?;
            app.handle_event(event::read()?, screen);
        }
    }
    Ok(())
}
