//! Local validation and storage of the user-supplied API credential.
//!
//! Keys are pasted into an RTL interface, which means hidden non-ASCII
//! characters and visually (or actually) reversed strings are common.
//! Sanitization handles both before the syntactic check.

use regex::Regex;

use super::config_service;
use crate::error::{Error, Result};

/// Literal prefix every valid key starts with
pub const KEY_PREFIX: &str = "AIza";

/// A valid key must be strictly longer than this
const MIN_KEY_LEN: usize = 20;

/// Strip non-ASCII characters, trim whitespace, and un-reverse keys that end
/// with the reversed prefix.
pub fn sanitize_key(input: &str) -> String {
    let ascii_only = Regex::new(r"[^\x00-\x7F]")
        .unwrap()
        .replace_all(input, "");
    let mut key = ascii_only.trim().to_string();

    let reversed_prefix: String = KEY_PREFIX.chars().rev().collect();
    if !key.starts_with(KEY_PREFIX) && key.ends_with(&reversed_prefix) {
        key = key.chars().rev().collect();
    }

    key
}

/// Sanitize and syntactically validate a credential. Returns the cleaned key
/// or a user-facing rejection.
pub fn validate_key(input: &str) -> Result<String> {
    let key = sanitize_key(input);

    if key.len() > MIN_KEY_LEN && key.starts_with(KEY_PREFIX) {
        Ok(key)
    } else {
        Err(Error::Auth(format!(
            "API key is invalid. It must start with \"{}\" and be longer than {} characters.",
            KEY_PREFIX, MIN_KEY_LEN
        )))
    }
}

/// Validate and persist the credential. The config file is the record of
/// truth; nothing is kept in memory beyond the running command.
pub fn set_api_key(input: &str) -> Result<String> {
    let key = validate_key(input)?;
    config_service::set_api_key(&key)?;
    Ok(key)
}

pub fn reset_api_key() -> Result<()> {
    config_service::clear_api_key()
}

pub fn api_key() -> Result<Option<String>> {
    config_service::get_api_key()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_key_is_accepted() {
        let key = validate_key("AIzaTESTKEY1234567890").unwrap();
        assert_eq!(key, "AIzaTESTKEY1234567890");
    }

    #[test]
    fn test_reversed_key_is_recovered() {
        let key = validate_key("0987654321YEKTSETazIA").unwrap();
        assert_eq!(key, "AIzaTESTKEY1234567890");
    }

    #[test]
    fn test_short_key_is_rejected() {
        assert!(validate_key("short").is_err());
    }

    #[test]
    fn test_wrong_prefix_is_rejected() {
        assert!(validate_key("XYzaTESTKEY1234567890").is_err());
    }

    #[test]
    fn test_hidden_characters_are_stripped() {
        // Persian characters and padding mixed into a pasted key
        let key = validate_key("  AIzaTEST\u{200f}KEY1234567890 بیمه ").unwrap();
        assert_eq!(key, "AIzaTESTKEY1234567890");
    }
}
