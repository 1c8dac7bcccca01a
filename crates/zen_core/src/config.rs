//! Zen Writer configuration persistence.
//!
//! The config file lives at `~/.zen_writer/config.json` and stores:
//! - The model identifier and API endpoint
//! - A reference to the API key (never the key itself, unless inline)
//! - Analysis timing (debounce period, minimum text length)
//! - The initial editor pane width
//!
//! Missing fields fall back to their defaults so older files keep loading.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::panel_resize::DEFAULT_PANEL_WIDTH_PERCENT;

pub const CONFIG_VERSION: u32 = 1;
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_API_KEY_VAR: &str = "GEMINI_API_KEY";
pub const DEFAULT_DEBOUNCE_MS: u64 = 1000;
/// Texts of this many characters or fewer are never analyzed.
pub const DEFAULT_MIN_ANALYSIS_CHARS: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ZenConfig {
    /// Schema version for forward compatibility.
    pub version: u32,

    /// Model identifier sent with every request.
    pub model: String,

    /// Base URL of the generative-language API.
    pub api_url: String,

    /// Where to find the API key.
    pub api_key: ProviderKeyRef,

    /// Quiet period after the last edit before analysis runs.
    pub debounce_ms: u64,

    pub min_analysis_chars: usize,

    pub panel_width_percent: f32,
}

impl Default for ZenConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            model: DEFAULT_MODEL.into(),
            api_url: DEFAULT_API_URL.into(),
            api_key: ProviderKeyRef::from_env(DEFAULT_API_KEY_VAR),
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            min_analysis_chars: DEFAULT_MIN_ANALYSIS_CHARS,
            panel_width_percent: DEFAULT_PANEL_WIDTH_PERCENT,
        }
    }
}

impl ZenConfig {
    /// Load config from the default path. A missing file yields defaults.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Load config from a specific path. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                log::info!("no config file at {}, running with defaults", path.display());
                return Ok(Self::default());
            }
            Err(error) => {
                return Err(error).with_context(|| format!("could not open {}", path.display()));
            }
        };

        let config: Self = serde_json::from_str(&contents)
            .with_context(|| format!("{} is not a valid Zen Writer config", path.display()))?;

        if config.version > CONFIG_VERSION {
            log::warn!(
                "{} has version {}, this build understands up to {CONFIG_VERSION}",
                path.display(),
                config.version
            );
        }

        log::debug!("read config from {}", path.display());
        Ok(config)
    }

    /// Write the config as pretty JSON, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("could not create {}", parent.display()))?;
        }

        let mut contents = serde_json::to_string_pretty(self)?;
        contents.push('\n');
        std::fs::write(path, contents)
            .with_context(|| format!("could not write {}", path.display()))?;

        log::info!("wrote config to {}", path.display());
        Ok(())
    }

    /// `~/.zen_writer/config.json`.
    pub fn config_path() -> Result<PathBuf> {
        Ok(zen_home_dir()?.join("config.json"))
    }

    /// `~/.zen_writer/preferences.json`, backing the persistent key-value store.
    pub fn preferences_path() -> Result<PathBuf> {
        Ok(zen_home_dir()?.join("preferences.json"))
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key.resolve()
    }
}

/// Where to find the API key, not the key itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ProviderKeyRef {
    /// Key is in an environment variable.
    #[serde(rename = "env")]
    EnvVar { var_name: String },

    /// Key is stored inline in the config file (development only).
    #[serde(rename = "inline")]
    Inline { key: String },
}

impl ProviderKeyRef {
    pub fn from_env(var_name: impl Into<String>) -> Self {
        Self::EnvVar {
            var_name: var_name.into(),
        }
    }

    pub fn from_inline(key: impl Into<String>) -> Self {
        Self::Inline { key: key.into() }
    }

    /// Resolve to the key. Blank keys count as missing.
    pub fn resolve(&self) -> Option<String> {
        let key = match self {
            ProviderKeyRef::EnvVar { var_name } => std::env::var(var_name).ok()?,
            ProviderKeyRef::Inline { key } => key.clone(),
        };
        let key = key.trim();
        if key.is_empty() {
            None
        } else {
            Some(key.to_string())
        }
    }

    pub fn is_plaintext(&self) -> bool {
        matches!(self, ProviderKeyRef::Inline { .. })
    }

    /// Human-readable description of where the key is expected.
    pub fn describe(&self) -> String {
        match self {
            ProviderKeyRef::EnvVar { var_name } => format!("environment variable {var_name}"),
            ProviderKeyRef::Inline { .. } => "inline config value".to_string(),
        }
    }
}

/// `~/.zen_writer/`, or `$ZEN_WRITER_HOME` when set.
fn zen_home_dir() -> Result<PathBuf> {
    if let Ok(home) = std::env::var("ZEN_WRITER_HOME") {
        return Ok(PathBuf::from(home));
    }

    let home = home_dir().context("no home directory found, set ZEN_WRITER_HOME")?;
    Ok(home.join(".zen_writer"))
}

fn home_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE").ok().map(PathBuf::from)
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME").ok().map(PathBuf::from)
    }
}
