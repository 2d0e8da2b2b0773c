//! Configuration commands

use crate::error::{Error, Result};
use crate::models::catalog;
use crate::services::config_service;

pub fn get_model() -> Result<Option<String>> {
    config_service::get_model()
}

/// Pin the preferred model; must name a catalog entry
pub fn set_model(model: &str) -> Result<()> {
    if catalog::find(model).is_none() {
        return Err(Error::Config(format!(
            "unknown model: {} (see `bimehyar status` for the catalog)",
            model
        )));
    }
    config_service::set_model(model)
}

pub fn get_base_url() -> Result<Option<String>> {
    config_service::get_base_url()
}

pub fn set_base_url(url: &str) -> Result<()> {
    config_service::set_base_url(url)
}

pub fn get_update_url() -> Result<Option<String>> {
    config_service::get_update_url()
}

pub fn set_update_url(url: &str) -> Result<()> {
    config_service::set_update_url(url)
}

pub fn get_config() -> Result<config_service::Config> {
    config_service::get_full_config()
}
