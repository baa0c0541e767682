//! Configuration management for Chatvault
//!
//! This module handles loading, parsing, validating, and saving
//! configuration from files and environment variables.

use crate::error::{ChatvaultError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure for Chatvault
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Bearer token for the summarization API
    #[serde(default)]
    pub api_key: String,

    /// Subfolder of the chosen folder that notes are written into
    #[serde(default = "default_subfolder")]
    pub subfolder: String,

    /// Whether the host may use directory access at all
    ///
    /// When disabled every save reports an unsupported platform and the CLI
    /// falls back to the downloads folder.
    #[serde(default = "default_directory_access")]
    pub directory_access: bool,

    /// Summarization API settings
    #[serde(default)]
    pub summarizer: SummarizerConfig,

    /// Override for the downloads folder used by the fallback save path
    #[serde(default)]
    pub downloads_dir: Option<PathBuf>,
}

/// Summarization API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizerConfig {
    /// Base URL of the chat completions API
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Model used for summaries
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Deadline for one summary request in seconds (0 disables it)
    #[serde(default)]
    pub timeout_seconds: u64,
}

/// Default subfolder name for saved notes
pub const DEFAULT_SUBFOLDER: &str = "ChatGPT_Summary";

fn default_subfolder() -> String {
    DEFAULT_SUBFOLDER.to_string()
}

fn default_directory_access() -> bool {
    true
}

fn default_api_base() -> String {
    "https://open.bigmodel.cn/api/paas/v4".to_string()
}

fn default_model() -> String {
    "glm-4-plus".to_string()
}

fn default_temperature() -> f32 {
    0.3
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            model: default_model(),
            temperature: default_temperature(),
            timeout_seconds: 0,
        }
    }
}

impl Config {
    /// Load configuration from file with environment overrides
    ///
    /// A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();

        Ok(config)
    }

    /// Load only what the file says, without environment overrides
    ///
    /// A missing file yields the defaults. Used by anything that writes the
    /// configuration back, so overrides never end up on disk.
    pub(crate) fn load_file_only(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ChatvaultError::Config(format!("Failed to read config file: {}", e)))?;
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        let config = serde_yaml::from_str(&contents).map_err(ChatvaultError::Yaml)?;
        Ok(config)
    }

    /// Write the configuration back as YAML
    ///
    /// # Errors
    ///
    /// Returns error if the file or its parent directory cannot be written
    pub fn save(&self, path: &str) -> Result<()> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    ChatvaultError::Config(format!("Failed to create config directory: {}", e))
                })?;
            }
        }
        let contents = serde_yaml::to_string(self).map_err(ChatvaultError::Yaml)?;
        std::fs::write(path, contents)
            .map_err(|e| ChatvaultError::Config(format!("Failed to write config file: {}", e)))?;
        tracing::debug!("Config saved to {}", path);
        Ok(())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(api_key) = std::env::var("CHATVAULT_API_KEY") {
            self.api_key = api_key;
        }

        if let Ok(subfolder) = std::env::var("CHATVAULT_SUBFOLDER") {
            self.subfolder = subfolder;
        }

        if let Ok(api_base) = std::env::var("CHATVAULT_API_BASE") {
            self.summarizer.api_base = api_base;
        }

        if let Ok(model) = std::env::var("CHATVAULT_MODEL") {
            self.summarizer.model = model;
        }

        if let Ok(access) = std::env::var("CHATVAULT_DIRECTORY_ACCESS") {
            match access.to_lowercase().as_str() {
                "1" | "true" | "yes" => self.directory_access = true,
                "0" | "false" | "no" => self.directory_access = false,
                other => tracing::warn!("Ignoring invalid CHATVAULT_DIRECTORY_ACCESS: {}", other),
            }
        }
    }

    /// Set the subfolder, falling back to the default for blank input
    pub fn set_subfolder(&mut self, subfolder: &str) {
        let trimmed = subfolder.trim();
        self.subfolder = if trimmed.is_empty() {
            default_subfolder()
        } else {
            trimmed.to_string()
        };
    }

    /// Validate the configuration
    ///
    /// The API key is not required here; a save without one is reported as
    /// a classified failure instead.
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        let subfolder = self.subfolder.trim();
        if subfolder.is_empty() {
            return Err(ChatvaultError::Config("subfolder cannot be empty".to_string()).into());
        }

        if subfolder.contains('/')
            || subfolder.contains('\\')
            || subfolder == "."
            || subfolder == ".."
        {
            return Err(ChatvaultError::Config(format!(
                "subfolder must be a single folder name: {}",
                self.subfolder
            ))
            .into());
        }

        if !(0.0..=2.0).contains(&self.summarizer.temperature) {
            return Err(ChatvaultError::Config(
                "summarizer.temperature must be between 0.0 and 2.0".to_string(),
            )
            .into());
        }

        if self.summarizer.model.trim().is_empty() {
            return Err(
                ChatvaultError::Config("summarizer.model cannot be empty".to_string()).into(),
            );
        }

        let url = url::Url::parse(&self.summarizer.api_base).map_err(|e| {
            ChatvaultError::Config(format!(
                "Invalid summarizer.api_base {}: {}",
                self.summarizer.api_base, e
            ))
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ChatvaultError::Config(format!(
                "summarizer.api_base must use http or https: {}",
                self.summarizer.api_base
            ))
            .into());
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            subfolder: default_subfolder(),
            directory_access: default_directory_access(),
            summarizer: SummarizerConfig::default(),
            downloads_dir: None,
        }
    }
}
