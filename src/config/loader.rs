//! Configuration loader with XDG-compliant path resolution
//!
//! Loads configuration from multiple locations with layered priority:
//! 1. `/etc/sitebuilder/config.toml` (lowest priority)
//! 2. `~/.config/sitebuilder/config.toml`
//! 3. `~/.sitebuilder.toml`
//! 4. `./.sitebuilder.toml`
//! 5. `--config <file>`
//! 6. `SITEBUILDER_*` environment variables (highest priority)

use std::path::PathBuf;

use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use super::interpolate::interpolate_config;
use super::model::Config;

/// Application name used for XDG directories
const APP_NAME: &str = "sitebuilder";

/// Get XDG config search paths in priority order (lowest to highest)
pub fn config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    paths.push(PathBuf::from(format!("/etc/{}/config.toml", APP_NAME)));

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join(APP_NAME).join("config.toml"));
    }

    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(format!(".{}.toml", APP_NAME)));
    }

    paths.push(PathBuf::from(format!(".{}.toml", APP_NAME)));

    paths
}

/// Load configuration with XDG layering
///
/// Later files override earlier ones. Environment variables with prefix
/// `SITEBUILDER_` override all file-based configuration, e.g.
/// `SITEBUILDER_PATHS__CLONE_DIR=/work/repo` sets `paths.clone_dir`.
/// Path values are expanded (`~`, `$VAR`) after merging.
pub fn load_config(override_path: Option<&str>) -> Result<Config> {
    let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

    for path in config_paths() {
        if path.exists() {
            tracing::debug!("Loading config from: {}", path.display());
            figment = figment.merge(Toml::file(&path));
        }
    }

    if let Some(path) = override_path {
        let path = PathBuf::from(path);
        if path.exists() {
            tracing::debug!("Loading override config from: {}", path.display());
            figment = figment.merge(Toml::file(&path));
        } else {
            tracing::warn!("Override config not found: {}", path.display());
        }
    }

    figment = figment.merge(Env::prefixed("SITEBUILDER_").split("__"));

    let mut config: Config = figment.extract().context("Failed to load configuration")?;
    interpolate_config(&mut config);
    config.paths.validate()?;
    Ok(config)
}

/// Find all existing config files (for introspection)
pub fn find_config_files() -> Vec<PathBuf> {
    config_paths().into_iter().filter(|p| p.exists()).collect()
}
