use anyhow::Result;
use caswrite::{
    app::{App, Deferred},
    config::Config,
    shell, terminal, ui,
};
use crossterm::event;
use std::{env, path::PathBuf, time::Duration};

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = caswrite::logging::init("caswrite") {
        eprintln!("Logging disabled: {}", e);
    }

    let config = match Config::load().await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration, using defaults: {}", e);
            log::warn!("Config load failed: {}", e);
            Config::default()
        }
    };

    let mut terminal = match terminal::init() {
        Ok(terminal) => terminal,
        Err(e) => {
            eprintln!("Failed to initialize the terminal: {}", e);
            return Err(e);
        }
    };

    let size = terminal.size()?;
    let mut app = App::new(config, size);
    log::info!("CasWrite started ({}x{})", size.width, size.height);

    let handle = app.handle();
    for arg in env::args().skip(1) {
        handle.invoke_later(Deferred::OpenFile(PathBuf::from(arg)));
    }

    let res = run_app(&mut terminal, &mut app).await;

    terminal::restore()?;

    if let Err(err) = res {
        log::error!("Application error: {}", err);
        eprintln!("CasWrite stopped with an error: {}", err);
        return Err(err);
    }

    log::info!("CasWrite exited");
    Ok(())
}

async fn run_app(terminal: &mut terminal::Tui, app: &mut App) -> Result<()> {
    loop {
        app.drain_deferred().await;
        app.on_pre_draw();

        if let Err(e) = terminal.draw(|f| ui::draw(f, app)) {
            log::error!("Terminal draw error: {}", e);
        }

        if app.should_quit() {
            log::info!("Application shutdown requested");
            break;
        }

        if app.take_shell_request() {
            match shell::run_shell(terminal) {
                Ok(_) => app.status.set_info("Returned from shell"),
                Err(e) => app.status.set_error(format!("Shell failed: {}", e)),
            }
            continue;
        }

        if event::poll(Duration::from_millis(100))? {
            let event = event::read()?;
            if let Err(e) = app.handle_event(event).await {
                log::error!("Event handling error: {}", e);
                app.status.set_error(format!("Error: {}", e));
            }
        }
    }
    Ok(())
}
