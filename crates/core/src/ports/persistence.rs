use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration store interface
pub trait ConfigStore: Send + Sync {
    /// Load configuration from storage
    fn load(&self) -> Result<AppConfig>;

    /// Save configuration to storage
    fn save(&self, config: &AppConfig) -> Result<()>;
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub version: u32,
    #[serde(default)]
    pub coordinator: CoordinatorConfig,
    #[serde(default)]
    pub ui: UiConfig,
    /// Most recently opened repositories, newest first
    #[serde(default)]
    pub recent_repositories: Vec<PathBuf>,
}

/// Timing and capacity knobs of the operation coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Delay after an operation completes before it stops counting as running
    pub settle_delay_ms: u64,
    /// How long an operation must run before the processing indicator shows
    pub processing_delay_ms: u64,
    pub refresh_bus_capacity: usize,
    pub task_bus_capacity: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeName {
    #[default]
    Dark,
    Light,
}

/// UI configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub theme: ThemeName,
    /// Maximum number of commits loaded into the log
    pub log_limit: usize,
    pub diff_context_lines: u32,
}

impl AppConfig {
    pub const MAX_RECENT_REPOSITORIES: usize = 10;

    /// Move `path` to the front of the recent list
    pub fn remember_repository(&mut self, path: PathBuf) {
        self.recent_repositories.retain(|p| p != &path);
        self.recent_repositories.insert(0, path);
        self.recent_repositories.truncate(Self::MAX_RECENT_REPOSITORIES);
    }
}

impl CoordinatorConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn processing_delay(&self) -> Duration {
        Duration::from_millis(self.processing_delay_ms)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: 1,
            coordinator: CoordinatorConfig::default(),
            ui: UiConfig::default(),
            recent_repositories: Vec::new(),
        }
    }
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: 500,
            processing_delay_ms: 300,
            refresh_bus_capacity: 64,
            task_bus_capacity: 16,
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            theme: ThemeName::Dark,
            log_limit: 500,
            diff_context_lines: 3,
        }
    }
}
