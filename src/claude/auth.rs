//! API key lookup: environment first, then the system keyring

use std::fmt;

use keyring::Entry;

use super::error::ClaudeError;

const SERVICE_NAME: &str = "discursiva";
const API_KEY_ENTRY: &str = "anthropic-api-key";
/// Environment variable that overrides the keyring
pub const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

/// Where the key in use was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    Env,
    Keyring,
}

impl fmt::Display for KeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeySource::Env => write!(f, "${}", API_KEY_ENV),
            KeySource::Keyring => f.write_str("system keyring"),
        }
    }
}

/// Manages the Claude API key
pub struct ApiKeyManager;

impl ApiKeyManager {
    /// Resolve the API key from the environment or the system keyring
    pub fn get_api_key() -> Result<String, ClaudeError> {
        Self::resolve().map(|(key, _)| key)
    }

    /// The key in use and where it came from
    pub fn resolve() -> Result<(String, KeySource), ClaudeError> {
        if let Some(key) = Self::key_from_env(std::env::var(API_KEY_ENV).ok()) {
            return Ok((key, KeySource::Env));
        }
        let key = Self::entry()?.get_password().map_err(|e| match e {
            keyring::Error::NoEntry => ClaudeError::ApiKeyNotFound,
            _ => ClaudeError::KeyringError(e.to_string()),
        })?;
        Ok((key, KeySource::Keyring))
    }

    /// Store the API key in the system keyring
    pub fn set_api_key(key: &str) -> Result<(), ClaudeError> {
        if !Self::validate_key_format(key) {
            return Err(ClaudeError::InvalidApiKey);
        }
        Self::entry()?.set_password(key).map_err(|e| ClaudeError::KeyringError(e.to_string()))
    }

    /// Remove the key from the system keyring
    pub fn delete_api_key() -> Result<(), ClaudeError> {
        Self::entry()?.delete_credential().map_err(|e| match e {
            keyring::Error::NoEntry => ClaudeError::ApiKeyNotFound,
            _ => ClaudeError::KeyringError(e.to_string()),
        })
    }

    fn entry() -> Result<Entry, ClaudeError> {
        Entry::new(SERVICE_NAME, API_KEY_ENTRY).map_err(|e| ClaudeError::KeyringError(e.to_string()))
    }

    /// Non-blank value of the environment override
    fn key_from_env(value: Option<String>) -> Option<String> {
        value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
    }

    /// Anthropic keys start with "sk-ant-"
    fn validate_key_format(key: &str) -> bool {
        key.starts_with("sk-ant-") && key.len() > 20
    }

    /// Mask a key for display, keeping the first 8 and last 4 characters
    pub fn mask_key(key: &str) -> String {
        let chars: Vec<char> = key.chars().collect();
        if chars.len() <= 12 {
            return "*".repeat(chars.len());
        }
        let prefix: String = chars[..8].iter().collect();
        let suffix: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", prefix, suffix)
    }
}
