//! CasWrite: a windowed terminal text editor that also edits CSV and TSV
//! files as tables.

pub mod app;
pub mod command;
pub mod config;
pub mod dialog;
pub mod editor;
pub mod editor_pane;
pub mod file_manager;
pub mod hello;
pub mod highlight;
pub mod logging;
pub mod menu;
pub mod shell;
pub mod status_manager;
pub mod table_pane;
pub mod terminal;
pub mod text_width;
pub mod ui;
pub mod window;
