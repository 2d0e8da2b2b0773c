//! Credential commands

use serde::Serialize;

use crate::error::Result;
use crate::services::auth_service;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthStatus {
    pub is_configured: bool,
    /// First characters of the stored key, for display
    pub key_preview: Option<String>,
}

/// Validate and store a credential; the cleaned key is returned so the
/// caller can confirm what was saved.
pub fn set_api_key(input: &str) -> Result<String> {
    auth_service::set_api_key(input)
}

/// Drop the stored credential; the app returns to the must-configure state
pub fn reset_api_key() -> Result<()> {
    auth_service::reset_api_key()
}

pub fn auth_status() -> Result<AuthStatus> {
    let key = auth_service::api_key()?;

    Ok(AuthStatus {
        is_configured: key.is_some(),
        key_preview: key.map(|k| format!("{}...", k.chars().take(8).collect::<String>())),
    })
}
