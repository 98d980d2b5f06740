//! Config Command
//!
//! Manage siteforge configuration.
//!
//! Usage:
//!   siteforge config show [-f json]
//!   siteforge config path
//!   siteforge config init [-g] [--force]

use crate::cli::Output;
use crate::config::ConfigLoader;
use crate::types::{ForgeError, Result};

/// Print the merged effective configuration
pub fn show(format: &str) -> Result<()> {
    let as_json = match format {
        "toml" => false,
        "json" => true,
        other => {
            return Err(ForgeError::Config(format!(
                "Unknown format: {}. Valid values: toml, json",
                other
            )));
        }
    };

    let config = ConfigLoader::load()?;
    println!("{}", ConfigLoader::render(&config, as_json)?);
    Ok(())
}

/// Show configuration and cache paths
pub fn path() -> Result<()> {
    let out = Output::new();
    let config = ConfigLoader::load()?;

    out.section("Configuration Paths");
    match ConfigLoader::global_config_path() {
        Some(global) => out.detail("Global", mark_existing(&global)),
        None => out.detail("Global", "(unavailable)"),
    }
    out.detail("Project", mark_existing(&ConfigLoader::project_config_path()));
    out.detail("Cache", mark_existing(&ConfigLoader::cache_path(&config)));
    Ok(())
}

fn mark_existing(path: &std::path::Path) -> String {
    if path.exists() {
        path.display().to_string()
    } else {
        format!("{} (not found)", path.display())
    }
}

/// Write a default config file
pub fn init(global: bool, force: bool) -> Result<()> {
    let out = Output::new();
    let path = ConfigLoader::init(global, force)?;
    let scope = if global { "global" } else { "project" };
    out.success(&format!("Initialized {} configuration", scope));
    out.detail("Config", path.display());
    Ok(())
}
