//! Logger setup. The terminal belongs to the UI, so log output goes to a file.

use anyhow::Result;
use directories::ProjectDirs;
use log::LevelFilter;
use std::fs::OpenOptions;
use std::path::PathBuf;

/// Initializes `env_logger` writing to `$CASWRITE_LOG_FILE` or to
/// `<data dir>/<app_name>.log`. `RUST_LOG` overrides the default filter.
pub fn init(app_name: &str) -> Result<PathBuf> {
    let path = log_path(app_name)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    let mut logger = env_logger::Builder::from_default_env();
    if std::env::var_os("RUST_LOG").is_none() {
        logger.filter_level(LevelFilter::Info);
        logger.filter_module("caswrite", LevelFilter::Debug);
    }
    logger
        .target(env_logger::Target::Pipe(Box::new(file)))
        .format_timestamp_millis()
        .try_init()?;

    Ok(path)
}

fn log_path(app_name: &str) -> Result<PathBuf> {
    if let Ok(path) = std::env::var("CASWRITE_LOG_FILE") {
        return Ok(PathBuf::from(path));
    }
    let dirs = ProjectDirs::from("io.github", "crramirez", "caswrite")
        .ok_or_else(|| anyhow::anyhow!("Could not determine a data directory for logs"))?;
    Ok(dirs.data_dir().join(format!("{}.log", app_name)))
}
