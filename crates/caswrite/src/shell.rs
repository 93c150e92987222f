//! System > OS Shell: runs the user's shell with the TUI suspended.

use anyhow::{Context, Result};
use std::process::{Command, ExitStatus};

use crate::terminal::{self, Tui};

#[cfg(windows)]
const SHELL_VAR: &str = "COMSPEC";
#[cfg(windows)]
const DEFAULT_SHELL: &str = "cmd.exe";

#[cfg(not(windows))]
const SHELL_VAR: &str = "SHELL";
#[cfg(not(windows))]
const DEFAULT_SHELL: &str = "/bin/sh";

/// Shell program named by `$SHELL` (`%COMSPEC%` on Windows).
pub fn shell_program() -> String {
    program_from(std::env::var(SHELL_VAR).ok())
}

fn program_from(value: Option<String>) -> String {
    value
        .filter(|shell| !shell.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_SHELL.to_string())
}

/// Leaves the TUI, waits for the shell to exit, then resumes.
pub fn run_shell(tui: &mut Tui) -> Result<ExitStatus> {
    let program = shell_program();
    log::info!("Starting OS shell: {}", program);

    let status = terminal::suspend(tui, || {
        println!("Type 'exit' to return to CasWrite.");
        Command::new(&program).status()
    })?
    .with_context(|| format!("Failed to run shell {}", program))?;

    log::info!("Shell exited with {}", status);
    Ok(status)
}
