//! Configuration module

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use directories::UserDirs;
use serde::{Deserialize, Serialize};

use crate::core::corroboration::{CorroborationConfig, Detector};
use crate::core::decay::{DecayConfig, DecayEngine};
use crate::core::embedding::EmbeddingConfig;
use crate::core::recall::{RecallConfig, RecallEngine};
use crate::core::trust::{TrustConfig, TrustModel};

/// Name of the per-project and per-user data directory
pub const DATA_DIR: &str = ".trove";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub user: UserConfig,

    #[serde(default)]
    pub trust: TrustConfig,

    #[serde(default)]
    pub decay: DecayConfig,

    #[serde(default)]
    pub corroboration: CorroborationConfig,

    #[serde(default)]
    pub recall: RecallConfig,

    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserConfig {
    /// Name of the agent owning this memory; the actor for first-hand facts
    #[serde(default = "default_user_name")]
    pub name: String,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            name: default_user_name(),
        }
    }
}

fn default_user_name() -> String {
    "agent".to_string()
}

impl Config {
    /// Load config from default locations
    pub fn load() -> Result<Self> {
        // Try local config first, then global
        if let Some(local) = Self::find_local_config() {
            return Self::load_from(&local);
        }

        if let Some(global) = Self::global_config_path() {
            if global.exists() {
                return Self::load_from(&global);
            }
        }

        Ok(Self::default())
    }

    /// Load from an explicit path when given, otherwise from default locations
    pub fn load_with(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => Self::load(),
        }
    }

    /// Load config from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        Ok(config)
    }

    /// Save config to a file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Find local .trove/config.toml walking up directories
    pub fn find_local_config() -> Option<PathBuf> {
        Self::find_local(|dir| dir.join("config.toml"))
    }

    /// Find local .trove/data.db walking up directories
    pub fn find_local_db() -> Option<PathBuf> {
        Self::find_local(|dir| dir.join("data.db"))
    }

    fn find_local(file: impl Fn(&Path) -> PathBuf) -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;

        loop {
            let candidate = file(&current.join(DATA_DIR));
            if candidate.exists() {
                return Some(candidate);
            }

            if !current.pop() {
                break;
            }
        }

        None
    }

    /// Global data directory (~/.trove)
    pub fn global_dir() -> Option<PathBuf> {
        UserDirs::new().map(|dirs| dirs.home_dir().join(DATA_DIR))
    }

    /// Get global config path (~/.trove/config.toml)
    pub fn global_config_path() -> Option<PathBuf> {
        Self::global_dir().map(|d| d.join("config.toml"))
    }

    /// Get global database path (~/.trove/data.db)
    pub fn global_db_path() -> Option<PathBuf> {
        Self::global_dir().map(|d| d.join("data.db"))
    }

    /// Get database path with priority:
    /// 1. TROVE_DATABASE env var
    /// 2. Local .trove/data.db (walking up from CWD)
    /// 3. Global ~/.trove/data.db
    /// 4. ./.trove/data.db
    pub fn data_dir(&self) -> PathBuf {
        if let Ok(env_path) = std::env::var("TROVE_DATABASE") {
            return PathBuf::from(env_path);
        }

        if let Some(local_db) = Self::find_local_db() {
            return local_db;
        }

        // A local .trove/ with only a config still claims the database
        if let Some(dir) = Self::find_local_config().as_deref().and_then(Path::parent) {
            return dir.join("data.db");
        }

        if let Some(global) = Self::global_db_path() {
            return global;
        }

        PathBuf::from(DATA_DIR).join("data.db")
    }

    pub fn trust_model(&self) -> TrustModel {
        TrustModel::with_config(self.trust.clone())
    }

    pub fn decay_engine(&self) -> DecayEngine {
        DecayEngine::with_config(self.decay.clone())
    }

    pub fn detector(&self) -> Detector {
        Detector::with_config(self.corroboration.clone(), self.trust_model())
    }

    pub fn recall_engine(&self) -> RecallEngine {
        RecallEngine::with_config(self.recall.clone())
            .with_timeout(Duration::from_secs(self.embedding.timeout_secs.max(1)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() -> Result<()> {
        let config: Config = toml::from_str(
            r#"
            [user]
            name = "scout"

            [trust]
            told_base = 0.55

            [decay.category_rates]
            event = 0.5

            [embedding]
            endpoint = "http://localhost:8080/v1"
            "#,
        )?;

        assert_eq!(config.user.name, "scout");
        assert_eq!(config.trust.told_base, 0.55);
        assert_eq!(config.trust.experienced_base, 0.90);
        assert_eq!(config.decay.category_rates.event, 0.5);
        assert_eq!(config.decay.category_rates.fact, 0.10);
        assert_eq!(config.decay.hot_days, 7);
        assert_eq!(config.recall.noise_floor, 0.15);
        assert_eq!(config.embedding.timeout_secs, 5);
        assert_eq!(config.embedding.endpoint.as_deref(), Some("http://localhost:8080/v1"));
        Ok(())
    }

    #[test]
    fn test_save_and_load() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join(DATA_DIR).join("config.toml");

        let mut config = Config::default();
        config.corroboration.verify_step = 0.1;
        config.save_to(&path)?;

        let loaded = Config::load_from(&path)?;
        assert_eq!(loaded.corroboration.verify_step, 0.1);
        assert_eq!(loaded.user.name, "agent");
        Ok(())
    }

    #[test]
    fn test_config_drives_engines() {
        let mut config = Config::default();
        config.trust.told_base = 0.7;
        let model = config.trust_model();
        assert_eq!(
            model
                .initial_trust(crate::core::fact::ProvenanceKind::Told, false)
                .score,
            0.7
        );
        assert_eq!(config.recall_engine().config().default_limit, 10);
    }
}
