use anyhow::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs::try_exists;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub theme: Theme,
    pub editor: EditorConfig,
    pub table: TableConfig,
    #[serde(default)]
    pub files: FilesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub name: String,
    #[serde(default)]
    pub desktop_background: Option<String>,
    #[serde(default)]
    pub window_background: Option<String>,
    #[serde(default)]
    pub active_border: Option<String>,
    #[serde(default)]
    pub menu_background: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorConfig {
    pub tab_size: usize,
    pub use_spaces: bool,
    pub line_numbers: bool,
    pub syntax_highlighting: bool,
    pub syntax_theme: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableConfig {
    pub min_column_width: usize,
    pub max_column_width: usize,
    /// Render the first row as a header
    pub header_row: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilesConfig {
    /// Copy the previous contents to `<name>.bak` before overwriting
    pub backup_on_save: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: Theme {
                name: String::from("classic"),
                desktop_background: Some(String::from("#005F87")),
                window_background: Some(String::from("#1E1E1E")),
                active_border: Some(String::from("#FFD166")),
                menu_background: Some(String::from("#C0C0C0")),
            },
            editor: EditorConfig {
                tab_size: 4,
                use_spaces: true,
                line_numbers: false,
                syntax_highlighting: true,
                syntax_theme: String::from("base16-ocean.dark"),
            },
            table: TableConfig {
                min_column_width: 3,
                max_column_width: 30,
                header_row: true,
            },
            files: FilesConfig::default(),
        }
    }
}

impl Config {
    pub async fn load() -> Result<Self> {
        let Some(config_path) = Self::config_path() else {
            return Ok(Self::default());
        };

        if !try_exists(&config_path).await? {
            log::info!("Config file does not exist, creating default");
            let default_config = Self::default();
            let _ = default_config.save().await;
            return Ok(default_config);
        }

        let content = match tokio::fs::read_to_string(&config_path).await {
            Ok(content) => content,
            Err(e) => {
                log::error!("Failed to read config file: {}", e);
                return Ok(Self::default());
            }
        };

        if content.trim().is_empty() {
            log::warn!("Config file is empty, creating new one");
            let default_config = Self::default();
            let _ = default_config.save().await;
            return Ok(default_config);
        }

        match serde_json::from_str::<Self>(&content) {
            Ok(mut config) => {
                config.validate();
                log::info!("Loaded config from: {}", config_path.display());
                Ok(config)
            }
            Err(json_err) => {
                log::error!("Failed to parse config file: {}", json_err);

                let backup_path = config_path.with_extension("bak");
                match tokio::fs::copy(&config_path, &backup_path).await {
                    Ok(_) => log::info!("Backed up broken config to: {}", backup_path.display()),
                    Err(e) => log::warn!("Failed to backup broken config: {}", e),
                }

                let default_config = Self::default();
                let _ = default_config.save().await;
                Ok(default_config)
            }
        }
    }

    pub async fn save(&self) -> Result<()> {
        let Some(config_path) = Self::config_path() else {
            return Ok(());
        };

        let mut config_to_save = self.clone();
        config_to_save.validate();

        if let Some(parent) = config_path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                anyhow::anyhow!(
                    "Failed to create config directory {}: {}",
                    parent.display(),
                    e
                )
            })?;
        }

        let content = serde_json::to_string_pretty(&config_to_save)?;
        tokio::fs::write(&config_path, content).await.map_err(|e| {
            anyhow::anyhow!(
                "Failed to write config file {}: {}",
                config_path.display(),
                e
            )
        })?;
        log::info!("Saved config to: {}", config_path.display());
        Ok(())
    }

    /// Replaces out-of-range values with defaults.
    pub fn validate(&mut self) {
        let defaults = Self::default();
        let mut has_issues = false;

        if self.editor.tab_size == 0 || self.editor.tab_size > 16 {
            log::warn!("Invalid tab size: {}, using default", self.editor.tab_size);
            self.editor.tab_size = defaults.editor.tab_size;
            has_issues = true;
        }

        if self.editor.syntax_theme.is_empty() {
            log::warn!("Empty syntax theme, using default");
            self.editor.syntax_theme = defaults.editor.syntax_theme;
            has_issues = true;
        }

        if self.table.min_column_width == 0 {
            self.table.min_column_width = defaults.table.min_column_width;
            has_issues = true;
        }

        if self.table.max_column_width < self.table.min_column_width {
            log::warn!(
                "max_column_width {} is below min_column_width {}",
                self.table.max_column_width,
                self.table.min_column_width
            );
            self.table.max_column_width = self
                .table
                .min_column_width
                .max(defaults.table.max_column_width);
            has_issues = true;
        }

        if self.theme.name.is_empty() {
            self.theme.name = defaults.theme.name;
            has_issues = true;
        }

        if has_issues {
            log::info!("Configuration validation completed with corrections");
        }
    }

    fn config_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("CASWRITE_CONFIG_PATH") {
            return Some(PathBuf::from(path));
        }

        if let Ok(dir) = std::env::var("CASWRITE_CONFIG_DIR") {
            return Some(PathBuf::from(dir).join("config.json"));
        }

        ProjectDirs::from("io.github", "crramirez", "caswrite")
            .map(|dirs| dirs.config_dir().join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, OnceLock};
    use tempfile::TempDir;

    fn config_test_lock() -> &'static Mutex<()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(()))
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.editor.tab_size, 4);
        assert!(config.editor.use_spaces);
        assert!(config.editor.syntax_highlighting);
        assert_eq!(config.table.min_column_width, 3);
        assert_eq!(config.table.max_column_width, 30);
        assert!(config.table.header_row);
        assert!(!config.files.backup_on_save);
        assert_eq!(config.theme.active_border.as_deref(), Some("#FFD166"));
    }

    #[test]
    fn test_validate_fixes_bad_values() {
        let mut config = Config::default();
        config.editor.tab_size = 0;
        config.table.min_column_width = 10;
        config.table.max_column_width = 2;
        config.editor.syntax_theme.clear();

        config.validate();

        assert_eq!(config.editor.tab_size, 4);
        assert_eq!(config.table.max_column_width, 30);
        assert_eq!(config.editor.syntax_theme, "base16-ocean.dark");
    }

    #[test]
    fn test_files_section_is_optional() {
        let mut value = serde_json::to_value(Config::default()).unwrap();
        value.as_object_mut().unwrap().remove("files");

        let config: Config = serde_json::from_value(value).unwrap();
        assert!(!config.files.backup_on_save);
    }

    #[tokio::test]
    async fn test_load_creates_default_then_recovers_from_garbage() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        let previous = {
            let _guard = config_test_lock().lock().unwrap();
            let previous = std::env::var("CASWRITE_CONFIG_PATH").ok();
            std::env::set_var("CASWRITE_CONFIG_PATH", &config_path);
            previous
        };

        let config = Config::load().await.unwrap();
        assert_eq!(config.editor.tab_size, 4);
        assert!(config_path.exists());

        std::fs::write(&config_path, "{ not json").unwrap();
        let config = Config::load().await.unwrap();
        assert_eq!(config.table.max_column_width, 30);
        assert!(config_path.with_extension("bak").exists());

        match previous {
            Some(value) => std::env::set_var("CASWRITE_CONFIG_PATH", value),
            None => std::env::remove_var("CASWRITE_CONFIG_PATH"),
        }
    }
}
