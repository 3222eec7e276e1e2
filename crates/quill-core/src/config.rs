// Configuration loading and parsing (config.toml).

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::Deserialize;
use thiserror::Error;

/// The config file written on first run.
pub const DEFAULT_CONFIG: &str = include_str!("../defaults/config.toml");

const CONFIG_FILE_NAME: &str = "config.toml";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },

    #[error("could not determine a home directory for config and data")]
    NoHomeDirectory,
}

// ---------------------------------------------------------------------------
// config.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_state_file")]
    pub state_file: String,
    /// Overrides the platform data directory.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            state_file: default_state_file(),
            data_dir: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LayoutConfig {
    #[serde(default = "default_resize_debounce_ms")]
    pub resize_debounce_ms: u64,
    #[serde(default = "default_drag_header_rows")]
    pub drag_header_rows: i32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        LayoutConfig {
            resize_debounce_ms: default_resize_debounce_ms(),
            drag_header_rows: default_drag_header_rows(),
        }
    }
}

impl LayoutConfig {
    pub fn resize_debounce(&self) -> Duration {
        Duration::from_millis(self.resize_debounce_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            filter: default_log_filter(),
        }
    }
}

fn default_state_file() -> String {
    "quill-state.json".to_string()
}

fn default_resize_debounce_ms() -> u64 {
    150
}

fn default_drag_header_rows() -> i32 {
    1
}

fn default_log_filter() -> String {
    "quill=info,quill_core=info,quill_tui=info,warn".to_string()
}

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

/// Where config, state and logs live.
#[derive(Debug, Clone, PartialEq)]
pub struct AppPaths {
    pub config_dir: PathBuf,
    pub data_dir: PathBuf,
}

impl AppPaths {
    /// Platform directories under the user's home.
    pub fn discover() -> Result<Self, ConfigError> {
        let dirs = ProjectDirs::from("", "", "quill").ok_or(ConfigError::NoHomeDirectory)?;
        Ok(AppPaths {
            config_dir: dirs.config_dir().to_path_buf(),
            data_dir: dirs.data_dir().to_path_buf(),
        })
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE_NAME)
    }

    /// Data directory after applying the config override.
    pub fn effective_data_dir(&self, config: &Config) -> PathBuf {
        config
            .storage
            .data_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.clone())
    }

    pub fn state_file(&self, config: &Config) -> PathBuf {
        self.effective_data_dir(config).join(&config.storage.state_file)
    }

    pub fn log_dir(&self, config: &Config) -> PathBuf {
        self.effective_data_dir(config).join("logs")
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate a config file.
///
/// This is the lower-level loading primitive that does not write defaults.
/// Prefer `load_config()` which handles first-run initialization.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })?;
    let config: Config = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;
    validate(&config)?;
    Ok(config)
}

/// Write the default config into `config_dir` unless a config file is
/// already there. Returns the path written, if any.
pub fn ensure_config_file(config_dir: &Path) -> Result<Option<PathBuf>, ConfigError> {
    std::fs::create_dir_all(config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let target = config_dir.join(CONFIG_FILE_NAME);
    match std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&target)
    {
        Ok(mut dest) => {
            std::io::Write::write_all(&mut dest, DEFAULT_CONFIG.as_bytes()).map_err(|e| {
                ConfigError::DefaultsCopyError {
                    message: format!("failed to write {}: {e}", target.display()),
                }
            })?;
            Ok(Some(target))
        }
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(None),
        Err(e) => Err(ConfigError::DefaultsCopyError {
            message: format!("failed to create {}: {e}", target.display()),
        }),
    }
}

/// Convenience wrapper: discovers platform paths, writes the default config
/// on first run, then loads it.
pub fn load_config() -> Result<(Config, AppPaths), ConfigError> {
    let paths = AppPaths::discover()?;
    ensure_config_file(&paths.config_dir)?;
    let config = load_config_from(&paths.config_file())?;
    Ok((config, paths))
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    let state_file = &config.storage.state_file;
    if state_file.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "storage.state_file".into(),
            message: "must not be empty".into(),
        });
    }
    if Path::new(state_file).components().count() != 1 {
        return Err(ConfigError::ValidationError {
            field: "storage.state_file".into(),
            message: format!("must be a plain file name, got `{state_file}`"),
        });
    }

    if config.layout.resize_debounce_ms > 5_000 {
        return Err(ConfigError::ValidationError {
            field: "layout.resize_debounce_ms".into(),
            message: format!(
                "must be at most 5000, got {}",
                config.layout.resize_debounce_ms
            ),
        });
    }

    let rows = config.layout.drag_header_rows;
    if !(1..=5).contains(&rows) {
        return Err(ConfigError::ValidationError {
            field: "layout.drag_header_rows".into(),
            message: format!("must be between 1 and 5 inclusive, got {rows}"),
        });
    }

    if config.logging.filter.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "logging.filter".into(),
            message: "must not be empty".into(),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
