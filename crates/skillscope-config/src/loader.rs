//! Configuration loader with inheritance support.
//!
//! Loads configuration from multiple sources and merges them:
//! 1. Global config: `~/.skillscope/config.toml`
//! 2. Local config: `.skillscope/config.toml` (in working directory)
//! 3. CLI overrides
//!
//! Later sources override earlier ones. Merging is per-section: a section
//! present in a later source replaces the whole section from earlier ones.

use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::{ConfigOverrides, EngineConfig};

/// Configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Configuration directory name (both global and local).
const CONFIG_DIR: &str = ".skillscope";

/// Configuration loader with caching support.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Global config directory (e.g., `~/.skillscope`)
    global_config_dir: Option<PathBuf>,

    /// Cached global config
    global_config: Option<EngineConfig>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader.
    ///
    /// Automatically detects the global config directory (`~/.skillscope`).
    pub fn new() -> Self {
        let global_config_dir = dirs::home_dir().map(|h| h.join(CONFIG_DIR));

        Self {
            global_config_dir,
            global_config: None,
        }
    }

    /// Create a loader with a custom global config directory.
    ///
    /// Useful for testing.
    pub fn with_global_dir(global_dir: impl Into<PathBuf>) -> Self {
        Self {
            global_config_dir: Some(global_dir.into()),
            global_config: None,
        }
    }

    /// Get the global config file path.
    pub fn global_config_path(&self) -> Option<PathBuf> {
        self.global_config_dir
            .as_ref()
            .map(|d| d.join(CONFIG_FILE_NAME))
    }

    /// Get the local config file path for a working directory.
    pub fn local_config_path(&self, working_dir: &Path) -> PathBuf {
        working_dir.join(CONFIG_DIR).join(CONFIG_FILE_NAME)
    }

    /// Load configuration with optional CLI overrides.
    ///
    /// Merges config in order: global → local → overrides, then validates.
    pub fn load(
        &mut self,
        working_dir: &Path,
        overrides: Option<&ConfigOverrides>,
    ) -> Result<EngineConfig, ConfigError> {
        let mut config = EngineConfig::default();

        if let Some(global_config) = self.load_global()? {
            config = global_config;
        }

        let local_path = self.local_config_path(working_dir);
        if local_path.exists() {
            debug!("Loading local config from {:?}", local_path);
            config = read_config_file(&local_path)?;
        }

        if let Some(ovr) = overrides {
            config.apply_overrides(ovr);
        }

        config.validate()?;
        Ok(config)
    }

    /// Load only the global configuration.
    pub fn load_global(&mut self) -> Result<Option<EngineConfig>, ConfigError> {
        if let Some(ref config) = self.global_config {
            return Ok(Some(config.clone()));
        }

        let Some(global_path) = self.global_config_path() else {
            debug!("No home directory found, skipping global config");
            return Ok(None);
        };

        if !global_path.exists() {
            trace!("Global config not found at {:?}", global_path);
            return Ok(None);
        }

        debug!("Loading global config from {:?}", global_path);
        let config = read_config_file(&global_path)?;
        self.global_config = Some(config.clone());
        Ok(Some(config))
    }
}

/// Read and parse a single TOML config file.
fn read_config_file(path: &Path) -> Result<EngineConfig, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;

    toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(dir: &Path, contents: &str) {
        std::fs::create_dir_all(dir).unwrap();
        std::fs::write(dir.join(CONFIG_FILE_NAME), contents).unwrap();
    }

    #[test]
    fn test_load_defaults_when_no_files() {
        let tmp = tempfile::tempdir().unwrap();
        let mut loader = ConfigLoader::with_global_dir(tmp.path().join("nonexistent"));

        let config = loader.load(tmp.path(), None).unwrap();
        assert_eq!(config.qdrant.collection, "competencies");
    }

    #[test]
    fn test_local_overrides_global() {
        let tmp = tempfile::tempdir().unwrap();
        let global_dir = tmp.path().join("home").join(CONFIG_DIR);
        write_config(
            &global_dir,
            r#"
            [qdrant]
            collection = "global-collection"
            "#,
        );

        let workspace = tmp.path().join("workspace");
        write_config(
            &workspace.join(CONFIG_DIR),
            r#"
            [qdrant]
            collection = "local-collection"
            "#,
        );

        let mut loader = ConfigLoader::with_global_dir(global_dir);
        let config = loader.load(&workspace, None).unwrap();
        assert_eq!(config.qdrant.collection, "local-collection");
    }

    #[test]
    fn test_overrides_win_over_files() {
        let tmp = tempfile::tempdir().unwrap();
        let workspace = tmp.path().join("workspace");
        write_config(
            &workspace.join(CONFIG_DIR),
            r#"
            [qdrant]
            url = "http://file:6334"
            "#,
        );

        let overrides = ConfigOverrides {
            qdrant_url: Some("http://cli:6334".to_string()),
            ..Default::default()
        };

        let mut loader = ConfigLoader::with_global_dir(tmp.path().join("nohome"));
        let config = loader.load(&workspace, Some(&overrides)).unwrap();
        assert_eq!(config.qdrant.url, "http://cli:6334");
    }

    #[test]
    fn test_invalid_file_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let workspace = tmp.path().join("workspace");
        write_config(&workspace.join(CONFIG_DIR), "not toml [");

        let mut loader = ConfigLoader::with_global_dir(tmp.path().join("nohome"));
        let err = loader.load(&workspace, None).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_dimension_mismatch_fails_at_load() {
        let tmp = tempfile::tempdir().unwrap();
        let workspace = tmp.path().join("workspace");
        write_config(
            &workspace.join(CONFIG_DIR),
            r#"
            [qdrant]
            vector_dimension = 1024

            [encoding]
            vector_dimension = 768
            "#,
        );

        let mut loader = ConfigLoader::with_global_dir(tmp.path().join("nohome"));
        let err = loader.load(&workspace, None).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }
}
