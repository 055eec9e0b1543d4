//! Configuration management for shellcache

pub mod schema;

pub use schema::Config;

use crate::error::{ShellCacheError, ShellCacheResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("shellcache")
            .join("config.toml")
    }

    /// Get the state directory path
    pub fn state_dir() -> PathBuf {
        dirs::state_dir()
            .or_else(dirs::data_local_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("shellcache")
    }

    /// Get the default bucket storage root
    pub fn default_storage_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("shellcache")
            .join("buckets")
    }

    /// Get the storage root for a configuration
    pub fn storage_dir(config: &Config) -> PathBuf {
        config
            .storage
            .path
            .clone()
            .unwrap_or_else(Self::default_storage_dir)
    }

    /// Get the audit log path
    pub fn audit_log_path() -> PathBuf {
        Self::state_dir().join("audit.log")
    }

    /// Load configuration, creating default if not exists
    pub async fn load(&self) -> ShellCacheResult<Config> {
        if !self.config_path.exists() {
            debug!("Config file not found, using defaults");
            return Ok(Config::default());
        }

        self.load_from_file(&self.config_path).await
    }

    /// Load configuration from a specific file
    pub async fn load_from_file(&self, path: &Path) -> ShellCacheResult<Config> {
        let content = fs::read_to_string(path).await.map_err(|e| {
            ShellCacheError::io(format!("reading config from {}", path.display()), e)
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ShellCacheError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        Self::validate(&config).map_err(|reason| ShellCacheError::ConfigInvalid {
            path: path.to_path_buf(),
            reason,
        })?;

        Ok(config)
    }

    /// Check invariants serde cannot express
    fn validate(config: &Config) -> Result<(), String> {
        let id = &config.app.id;
        if id.is_empty() {
            return Err("app.id must not be empty".to_string());
        }
        if id.contains(['/', '\\']) || id.contains("..") {
            return Err(format!("app.id contains path characters: {}", id));
        }
        if config.app.manifest.is_empty() {
            return Err("app.manifest must list at least one asset".to_string());
        }
        let manifest = &config.app.manifest;
        if let Some((i, path)) = manifest
            .iter()
            .enumerate()
            .find(|(i, path)| manifest[..*i].contains(path))
        {
            return Err(format!("app.manifest[{}] repeats {}", i, path));
        }
        if !matches!(config.general.log_format.as_str(), "text" | "json") {
            return Err(format!(
                "general.log_format must be \"text\" or \"json\", got {}",
                config.general.log_format
            ));
        }
        Ok(())
    }

    /// Save configuration to file
    pub async fn save(&self, config: &Config) -> ShellCacheResult<()> {
        self.ensure_config_dir().await?;

        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content).await.map_err(|e| {
            ShellCacheError::io(
                format!("writing config to {}", self.config_path.display()),
                e,
            )
        })?;

        info!("Configuration saved to {}", self.config_path.display());
        Ok(())
    }

    /// Ensure the config directory exists
    async fn ensure_config_dir(&self) -> ShellCacheResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ShellCacheError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }
        Ok(())
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_default_when_missing() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nonexistent.toml");
        let manager = ConfigManager::with_path(path);

        let config = manager.load().await.unwrap();
        assert_eq!(config.app.id, "shekhawats");
    }

    #[tokio::test]
    async fn save_and_load_roundtrip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        let manager = ConfigManager::with_path(path);

        let mut config = Config::default();
        config.app.version = 9;

        manager.save(&config).await.unwrap();
        let loaded = manager.load().await.unwrap();

        assert_eq!(loaded.app.version, 9);
    }

    #[tokio::test]
    async fn rejects_empty_manifest() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "[app]\nmanifest = []\n").unwrap();

        let err = ConfigManager::with_path(path).load().await.unwrap_err();
        assert!(matches!(err, ShellCacheError::ConfigInvalid { .. }));
    }

    #[tokio::test]
    async fn rejects_repeated_manifest_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(
            &path,
            "[app]\nmanifest = [\"/app/\", \"/app/index.html\", \"/app/\"]\n",
        )
        .unwrap();

        let err = ConfigManager::with_path(path).load().await.unwrap_err();
        assert!(err.to_string().contains("app.manifest[2] repeats /app/"));
    }

    #[tokio::test]
    async fn rejects_path_like_app_id() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "[app]\nid = \"../escape\"\n").unwrap();

        let err = ConfigManager::with_path(path).load().await.unwrap_err();
        assert!(err.to_string().contains("app.id"));
    }

    #[test]
    fn storage_dir_prefers_configured_path() {
        let mut config = Config::default();
        config.storage.path = Some(PathBuf::from("/tmp/buckets"));
        assert_eq!(
            ConfigManager::storage_dir(&config),
            PathBuf::from("/tmp/buckets")
        );
    }
}
