use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration from taskdeck.toml
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub focus: FocusConfig,
    #[serde(default)]
    pub overlay: OverlayConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the collection files. Default: `<data dir>/taskdeck`
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    /// Hand saves to a background writer instead of writing inline
    #[serde(default = "default_true")]
    pub write_behind: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            data_dir: None,
            write_behind: true,
        }
    }
}

impl StorageConfig {
    /// The configured data directory, or the platform default.
    pub fn resolved_data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("taskdeck")
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusConfig {
    #[serde(default = "default_focus_duration")]
    pub duration_secs: u64,
    #[serde(default = "default_focus_extend")]
    pub extend_secs: u64,
}

impl Default for FocusConfig {
    fn default() -> Self {
        FocusConfig {
            duration_secs: default_focus_duration(),
            extend_secs: default_focus_extend(),
        }
    }
}

/// How the live overlay shows completions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShowMode {
    #[default]
    Permanent,
    Temporary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayConfig {
    /// Group whose tasks are shown on the overlay
    #[serde(default)]
    pub stream_group: Option<String>,
    #[serde(default)]
    pub show_mode: ShowMode,
    /// Seconds a completion pulse stays visible in temporary mode
    #[serde(default = "default_display_secs")]
    pub display_secs: u64,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        OverlayConfig {
            stream_group: None,
            show_mode: ShowMode::default(),
            display_secs: default_display_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    /// `tracing` filter directive; `RUST_LOG` takes precedence
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            filter: default_log_filter(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_focus_duration() -> u64 {
    20 * 60
}

fn default_focus_extend() -> u64 {
    5 * 60
}

fn default_display_secs() -> u64 {
    6
}

fn default_log_filter() -> String {
    "info".to_string()
}
