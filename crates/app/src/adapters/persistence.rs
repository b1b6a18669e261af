use anyhow::{Context, Result};
use directories::ProjectDirs;
use gitpane_core::ports::{AppConfig, ConfigStore};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// File-based configuration store that implements ConfigStore
pub struct FileConfigStore {
    config_path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Result<Self> {
        let config_path = Self::get_default_config_path()?;
        Ok(Self { config_path })
    }

    pub fn with_path<P: AsRef<Path>>(config_path: P) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    fn get_default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("", "", "gitpane")
            .context("Failed to determine project directories")?;

        let config_dir = proj_dirs.config_dir();
        Ok(config_dir.join("gitpane.toml"))
    }

    /// Create default config if it doesn't exist
    fn ensure_config_exists(&self) -> Result<()> {
        if !self.config_path.exists() {
            info!("Creating default config at {}", self.config_path.display());
            self.save(&AppConfig::default())?;
        }
        Ok(())
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Result<AppConfig> {
        self.ensure_config_exists()?;

        let contents = fs::read_to_string(&self.config_path)
            .with_context(|| format!("Failed to read config file: {}", self.config_path.display()))?;

        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", self.config_path.display()))?;

        Ok(config)
    }

    fn save(&self, config: &AppConfig) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(config)
            .context("Failed to serialize config to TOML")?;

        fs::write(&self.config_path, contents)
            .with_context(|| format!("Failed to write config file: {}", self.config_path.display()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gitpane_core::ports::ThemeName;
    use tempfile::TempDir;

    #[test]
    fn test_config_load_nonexistent_creates_default() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("nested").join("gitpane.toml");

        let store = FileConfigStore::with_path(&config_path);
        let config = store.load()?;

        assert_eq!(config, AppConfig::default());
        assert!(config_path.exists());

        Ok(())
    }

    #[test]
    fn test_config_save_and_load() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let store = FileConfigStore::with_path(temp_dir.path().join("test.toml"));

        let mut config = AppConfig::default();
        config.coordinator.settle_delay_ms = 250;
        config.ui.theme = ThemeName::Light;
        config.remember_repository(PathBuf::from("/work/repo"));

        store.save(&config)?;
        let loaded_config = store.load()?;

        assert_eq!(config, loaded_config);

        Ok(())
    }

    #[test]
    fn test_config_parse_error_names_file() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("broken.toml");
        fs::write(&config_path, "version = \"not a number\"")?;

        let err = FileConfigStore::with_path(&config_path).load().unwrap_err();
        assert!(err.to_string().contains("broken.toml"));

        Ok(())
    }

    #[test]
    fn test_get_default_config_path() -> Result<()> {
        let path = FileConfigStore::get_default_config_path()?;
        assert!(path.ends_with("gitpane.toml"));
        Ok(())
    }
}
