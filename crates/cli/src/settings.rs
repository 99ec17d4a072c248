//! Configuration loading for the loft CLI.

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Toml};
use figment::Figment;
use loft_core::config::{RemoteConfig, StoreConfig};
use serde::Deserialize;
use std::path::Path;

/// Full CLI configuration: the remote endpoint plus store tuning.
#[derive(Debug, Deserialize)]
pub struct Settings {
    pub remote: RemoteConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

/// Load settings from an optional TOML file merged with `LOFT_`-prefixed
/// environment variables (`LOFT_REMOTE__TOKEN`, `LOFT_STORE__ROOT`, ...).
pub fn load(config_path: &str) -> Result<Settings> {
    let mut figment = Figment::new();
    if Path::new(config_path).exists() {
        tracing::debug!(config_path, "loading configuration from file");
        figment = figment.merge(Toml::file(config_path));
    }

    let settings: Settings = figment
        .merge(Env::prefixed("LOFT_").split("__"))
        .extract()
        .context("failed to load configuration")?;

    settings.remote.validate()?;
    settings.store.validate()?;
    Ok(settings)
}
