//! Configuration Loader (Figment-based)
//!
//! Loads and merges configuration from multiple sources using Figment:
//! 1. Built-in defaults (Serialized)
//! 2. Global config (~/.config/siteforge/config.toml)
//! 3. Project config (.siteforge/config.toml)
//! 4. Environment variables (SITEFORGE_* prefix, `__` between levels)

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::types::Config;
use crate::types::{ForgeError, Result};

const APP_NAME: &str = "siteforge";
const CACHE_FILE: &str = "api_cache.db";

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with full resolution chain using Figment:
    /// defaults → global → project → env vars
    pub fn load() -> Result<Config> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            debug!("Loading global config from: {}", global_path.display());
            figment = figment.merge(Toml::file(&global_path));
        }

        let project_path = Self::project_config_path();
        if project_path.exists() {
            debug!("Loading project config from: {}", project_path.display());
            figment = figment.merge(Toml::file(&project_path));
        }

        // e.g. SITEFORGE_LLM__MODEL_HEAVY -> llm.model_heavy
        figment = figment.merge(Env::prefixed("SITEFORGE_").split("__"));

        Self::extract(figment)
    }

    /// Load configuration from a specific file only
    pub fn load_from_file(path: &Path) -> Result<Config> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path));
        Self::extract(figment)
    }

    fn extract(figment: Figment) -> Result<Config> {
        let config: Config = figment
            .extract()
            .map_err(|e| ForgeError::Config(format!("Configuration error: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    // =========================================================================
    // Path Management
    // =========================================================================

    /// Get path to global config directory (~/.config/siteforge/)
    pub fn global_dir() -> Option<PathBuf> {
        env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                env::var("HOME")
                    .ok()
                    .map(|home| PathBuf::from(home).join(".config"))
            })
            .map(|p| p.join(APP_NAME))
    }

    /// Get path to global config file
    pub fn global_config_path() -> Option<PathBuf> {
        Self::global_dir().map(|dir| dir.join("config.toml"))
    }

    /// Get path to the user cache directory
    pub fn global_cache_dir() -> Option<PathBuf> {
        directories::BaseDirs::new().map(|dirs| dirs.cache_dir().join(APP_NAME))
    }

    /// Get path to project config file
    pub fn project_config_path() -> PathBuf {
        Self::project_dir().join("config.toml")
    }

    /// Get project data directory
    pub fn project_dir() -> PathBuf {
        PathBuf::from(".siteforge")
    }

    /// Response cache location: configured path, else the user cache dir,
    /// else the project directory
    pub fn cache_path(config: &Config) -> PathBuf {
        config.cache.path.clone().unwrap_or_else(|| {
            Self::global_cache_dir()
                .unwrap_or_else(Self::project_dir)
                .join(CACHE_FILE)
        })
    }

    // =========================================================================
    // Config Commands
    // =========================================================================

    /// Render the effective configuration as TOML or JSON
    pub fn render(config: &Config, as_json: bool) -> Result<String> {
        if as_json {
            Ok(serde_json::to_string_pretty(config)?)
        } else {
            toml::to_string_pretty(config).map_err(|e| ForgeError::Config(e.to_string()))
        }
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    /// Write a commented default config file, returning its path
    ///
    /// Existing files are left alone unless `force` is set.
    pub fn init(global: bool, force: bool) -> Result<PathBuf> {
        let dir = if global {
            Self::global_dir().ok_or_else(|| {
                ForgeError::Config("Cannot determine global config directory".to_string())
            })?
        } else {
            Self::project_dir()
        };

        fs::create_dir_all(&dir)?;

        let config_path = dir.join("config.toml");
        if !config_path.exists() || force {
            fs::write(&config_path, Self::default_config_template())?;
            info!("Created config: {}", config_path.display());
        } else {
            info!("Config exists: {}", config_path.display());
        }

        Ok(config_path)
    }

    /// Default config content (TOML)
    fn default_config_template() -> String {
        r#"# siteforge configuration
# Project settings in .siteforge/config.toml override ~/.config/siteforge/config.toml.
# Any key can also be set from the environment, e.g. SITEFORGE_LLM__PROVIDER=openai.

[llm]
provider = "anthropic"
# api_key is read from ANTHROPIC_API_KEY / OPENAI_API_KEY when unset
model_heavy = "claude-3-5-sonnet-20241022"
model_css = "claude-3-5-haiku-20241022"
model_js = "claude-3-5-haiku-20241022"
max_tokens = 8000
timeout_secs = 300

[generation]
# "chunked" or "structural"
strategy = "chunked"
chunk_assets = false
concurrency = 2
min_asset_tokens = 100
# "code_aware", "char_based" or "word_based"
estimator = "code_aware"

[retry]
max_attempts = 5
base_delay_ms = 5000
max_delay_ms = 60000
pacing_delay_ms = 1000
overload_multiplier = 2
request_timeout_secs = 300

[output]
dir = "generated_website"
"#
        .to_string()
    }
}
