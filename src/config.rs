//! Installation configuration and workspace layout.
//!
//! Stored in a machine-readable TOML file located at:
//!   %APPDATA%/Cuentame/config.toml on Windows
//!   $XDG_DATA_HOME/Cuentame/config.toml on Linux
//!   ~/Library/Application Support/Cuentame/config.toml on macOS
//!
//! The config tracks classifier connection settings and the demo-seed policy
//! applied the first time the profile collection is initialized.

use anyhow::{Context, Result};
use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

/// Root configuration persisted per installation.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Connection settings for the external classification model.
    #[serde(default)]
    pub classifier: ClassifierSettings,
    /// Storage initialization policy.
    #[serde(default)]
    pub storage: StorageSettings,
}

/// Settings for the external conversational/classification model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierSettings {
    /// Model identifier sent to the provider.
    #[serde(default = "default_model")]
    pub model: String,
    /// Base URL of the generative-language endpoint.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Environment variable holding the API key; never stored in the file.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Wall-clock timeout (seconds) for a single model request.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            model: default_model(),
            endpoint: default_endpoint(),
            api_key_env: default_api_key_env(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_model() -> String {
    "gemini-2.5-flash".into()
}

fn default_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".into()
}

fn default_api_key_env() -> String {
    "CUENTAME_API_KEY".into()
}

const fn default_request_timeout_secs() -> u64 {
    30
}

/// Storage initialization policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Whether to seed the demo accounts when the profile collection is
    /// first created. Never applied again after the first write.
    #[serde(default = "default_seed_demo_accounts")]
    pub seed_demo_accounts: bool,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            seed_demo_accounts: default_seed_demo_accounts(),
        }
    }
}

const fn default_seed_demo_accounts() -> bool {
    true
}

/// Standard relative path to the config file (resolved per OS at runtime).
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Returns the root directory where CUÉNTAME stores data.
///
/// Order of precedence:
/// 1. `CUENTAME_HOME` environment variable.
/// 2. OS-specific data directory via `directories::BaseDirs`.
pub fn workspace_root() -> Result<PathBuf> {
    if let Ok(path) = env::var("CUENTAME_HOME") {
        return Ok(PathBuf::from(path));
    }
    let base_dirs = BaseDirs::new().context("Unable to determine OS data directory")?;
    Ok(base_dirs.data_dir().join("Cuentame"))
}

/// Returns the config directory (same as workspace root for now).
pub fn config_dir() -> Result<PathBuf> {
    let root = workspace_root()?;
    Ok(root.join("config"))
}

/// Path to the config file.
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Loads the configuration from disk or returns defaults.
pub fn load_or_default() -> Result<AppConfig> {
    let path = config_file_path()?;
    if path.exists() {
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let cfg: AppConfig = toml::from_str(&data)
            .with_context(|| format!("Failed to parse config file {:?}", path))?;
        Ok(cfg)
    } else {
        Ok(AppConfig::default())
    }
}

/// Persists the configuration to disk.
pub fn save(config: &AppConfig) -> Result<()> {
    let dir = config_dir()?;
    fs::create_dir_all(&dir)?;
    let path = config_file_path()?;
    let data = toml::to_string_pretty(config)?;
    fs::write(&path, data)?;
    Ok(())
}

/// Ensures the workspace structure exists and returns its paths.
pub fn ensure_workspace_structure() -> Result<WorkspacePaths> {
    let root = workspace_root()?;
    let store_dir = root.join("store");
    let reports_dir = root.join("reports");
    fs::create_dir_all(&store_dir)?;
    fs::create_dir_all(&reports_dir)?;
    Ok(WorkspacePaths {
        root,
        store_dir,
        reports_dir,
    })
}

/// Convenience struct exposing important workspace paths.
#[derive(Debug, Clone)]
pub struct WorkspacePaths {
    pub root: PathBuf,
    pub store_dir: PathBuf,
    pub reports_dir: PathBuf,
}

impl WorkspacePaths {
    pub fn profiles_path(&self) -> PathBuf {
        self.store_dir.join("profiles.json")
    }

    pub fn cases_path(&self) -> PathBuf {
        self.store_dir.join("cases.json")
    }

    pub fn events_path(&self) -> PathBuf {
        self.store_dir.join("events.jsonl")
    }
}
