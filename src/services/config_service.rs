use std::fs;
use serde::{Deserialize, Serialize};

use super::store_service::get_app_data_dir;
use crate::error::Result;
use crate::models::catalog;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    /// URL of the timestamped version manifest; the update probe is disabled
    /// when unset
    #[serde(default)]
    pub update_url: Option<String>,
}

fn get_config_path() -> Result<std::path::PathBuf> {
    Ok(get_app_data_dir()?.join("config.json"))
}

pub fn load_config() -> Result<Config> {
    let config_path = get_config_path()?;

    if !config_path.exists() {
        return Ok(Config::default());
    }

    let content = fs::read_to_string(&config_path)?;
    Ok(serde_json::from_str(&content)?)
}

pub fn save_config(config: &Config) -> Result<()> {
    let config_path = get_config_path()?;
    let content = serde_json::to_string_pretty(config)?;
    fs::write(&config_path, content)?;
    Ok(())
}

pub fn get_api_key() -> Result<Option<String>> {
    let config = load_config()?;
    Ok(config.api_key)
}

pub fn set_api_key(key: &str) -> Result<()> {
    let mut config = load_config().unwrap_or_default();
    config.api_key = Some(key.to_string());
    save_config(&config)
}

pub fn clear_api_key() -> Result<()> {
    let mut config = load_config().unwrap_or_default();
    config.api_key = None;
    save_config(&config)
}

pub fn get_base_url() -> Result<Option<String>> {
    let config = load_config()?;
    Ok(config.base_url)
}

pub fn set_base_url(url: &str) -> Result<()> {
    let mut config = load_config().unwrap_or_default();
    config.base_url = Some(url.to_string());
    save_config(&config)
}

pub fn get_model() -> Result<Option<String>> {
    let config = load_config()?;
    Ok(config.model)
}

pub fn set_model(model: &str) -> Result<()> {
    let mut config = load_config().unwrap_or_default();
    config.model = Some(model.to_string());
    save_config(&config)
}

pub fn get_update_url() -> Result<Option<String>> {
    let config = load_config()?;
    Ok(config.update_url)
}

pub fn set_update_url(url: &str) -> Result<()> {
    let mut config = load_config().unwrap_or_default();
    config.update_url = Some(url.to_string());
    save_config(&config)
}

pub fn get_full_config() -> Result<Config> {
    load_config()
}

/// Resolve (base_url, model, api_key) with defaults applied
pub fn get_effective_config() -> Result<(String, String, String)> {
    let config = load_config()?;
    Ok((
        config.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        config.model.unwrap_or_else(|| catalog::DEFAULT_MODEL.to_string()),
        config.api_key.unwrap_or_default(),
    ))
}
