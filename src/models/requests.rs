//! Request DTOs for the key-value API
//!
//! Defines the structure of incoming HTTP request bodies and query strings.

use serde::Deserialize;

/// Maximum allowed key length in bytes (the store's key column width)
pub const MAX_KEY_LENGTH: usize = 255;

/// Maximum allowed value size in bytes
pub const MAX_VALUE_SIZE: usize = 1024 * 1024; // 1 MB

/// Request body for POST /kv
#[derive(Debug, Clone, Deserialize)]
pub struct CreateRequest {
    /// The key to store
    pub key: String,
    /// The value to store
    pub value: String,
}

impl CreateRequest {
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        validate_key(&self.key).or_else(|| validate_value(&self.value))
    }
}

/// Request body for PUT /kv/*key
#[derive(Debug, Clone, Deserialize)]
pub struct PutBody {
    pub value: String,
}

/// Query string for PUT /kv/*key, used when no JSON body is sent.
///
/// Accepts `?value=` or the short form `?v=`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PutQuery {
    #[serde(alias = "v")]
    pub value: Option<String>,
}

/// Returns an error message if the key is empty or too long.
pub fn validate_key(key: &str) -> Option<String> {
    if key.is_empty() {
        return Some("Key cannot be empty".to_string());
    }
    if key.len() > MAX_KEY_LENGTH {
        return Some(format!(
            "Key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        ));
    }
    None
}

/// Returns an error message if the value is too large.
pub fn validate_value(value: &str) -> Option<String> {
    if value.len() > MAX_VALUE_SIZE {
        return Some(format!(
            "Value exceeds maximum size of {} bytes",
            MAX_VALUE_SIZE
        ));
    }
    None
}
