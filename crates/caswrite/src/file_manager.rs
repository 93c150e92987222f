use anyhow::{anyhow, Result};
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

const LARGE_FILE_THRESHOLD: u64 = 10 * 1024 * 1024; // 10MB

/// Contents of a file read from disk.
#[derive(Debug, Clone)]
pub struct OpenedFile {
    pub path: PathBuf,
    pub content: String,
    pub readonly: bool,
}

/// Reads and writes documents for editor and table windows.
#[derive(Debug, Clone, Default)]
pub struct FileManager {
    backup_on_save: bool,
}

impl FileManager {
    pub fn new(backup_on_save: bool) -> Self {
        Self { backup_on_save }
    }

    /// Checks that `path` names an existing regular file.
    pub async fn validate(path: &Path) -> Result<()> {
        let metadata = match fs::metadata(path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(anyhow!("File does not exist: {}", path.display()));
            }
            Err(e) => return Err(anyhow!("Cannot access {}: {}", path.display(), e)),
        };

        if !metadata.is_file() {
            return Err(anyhow!("Not a regular file: {}", path.display()));
        }
        Ok(())
    }

    pub async fn open_file(&self, path: &Path) -> Result<OpenedFile> {
        Self::validate(path).await?;

        let mut readonly = false;
        match fs::metadata(path).await {
            Ok(metadata) => {
                readonly = metadata.permissions().readonly();
                if metadata.len() > LARGE_FILE_THRESHOLD {
                    log::warn!(
                        "Large file detected ({} bytes): {}",
                        metadata.len(),
                        path.display()
                    );
                }
            }
            Err(e) => log::warn!("Failed to get file metadata: {}", e),
        }

        let content = fs::read_to_string(path).await.map_err(|e| {
            let message = match e.kind() {
                ErrorKind::PermissionDenied => {
                    format!("Permission denied: {}", path.display())
                }
                ErrorKind::InvalidData => {
                    format!("File is not valid UTF-8 text: {}", path.display())
                }
                _ => format!("Failed to read {}: {}", path.display(), e),
            };
            anyhow!(message)
        })?;

        if content.contains('\0') {
            return Err(anyhow!("File appears to be binary: {}", path.display()));
        }

        log::info!("Opened file: {}", path.display());
        Ok(OpenedFile {
            path: path.to_path_buf(),
            content,
            readonly,
        })
    }

    pub async fn save_file(&self, path: &Path, content: &str) -> Result<()> {
        match fs::metadata(path).await {
            Ok(metadata) => {
                if metadata.permissions().readonly() {
                    return Err(anyhow!("File is read-only: {}", path.display()));
                }
                if self.backup_on_save && metadata.len() > 0 {
                    let backup_path = backup_path(path);
                    match fs::copy(path, &backup_path).await {
                        Ok(_) => log::info!("Created backup: {}", backup_path.display()),
                        Err(e) => log::warn!("Failed to create backup: {}", e),
                    }
                }
            }
            Err(_) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    fs::create_dir_all(parent).await.map_err(|e| {
                        anyhow!("Failed to create directory {}: {}", parent.display(), e)
                    })?;
                }
            }
        }

        fs::write(path, content.as_bytes()).await.map_err(|e| {
            let message = match e.kind() {
                ErrorKind::PermissionDenied => {
                    format!("Permission denied: {}", path.display())
                }
                _ => format!("Failed to write {}: {}", path.display(), e),
            };
            anyhow!(message)
        })?;

        log::info!("Saved file: {}", path.display());
        Ok(())
    }
}

/// `notes.txt` -> `notes.txt.bak`
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".bak");
    PathBuf::from(name)
}
