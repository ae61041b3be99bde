//! Secret Generator
//!
//! Produces API key secrets from the operating system CSPRNG. Output looks
//! like `LT_API_<base64url>` so operators can recognise a key in logs or UIs.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::{rngs::OsRng, RngCore};

/// Prefix carried by every generated API key.
pub const API_KEY_PREFIX: &str = "LT_API_";

/// 256 bits of entropy minimum.
pub const MIN_SECRET_BYTES: usize = 32;

#[derive(Debug, Clone)]
pub struct SecretGenerator {
    prefix: String,
    byte_len: usize,
}

impl Default for SecretGenerator {
    fn default() -> Self {
        Self::new(API_KEY_PREFIX, MIN_SECRET_BYTES)
    }
}

impl SecretGenerator {
    /// Lengths below [`MIN_SECRET_BYTES`] are raised to it.
    pub fn new(prefix: impl Into<String>, byte_len: usize) -> Self {
        Self {
            prefix: prefix.into(),
            byte_len: byte_len.max(MIN_SECRET_BYTES),
        }
    }

    pub fn generate(&self) -> String {
        let mut bytes = vec![0u8; self.byte_len];
        OsRng.fill_bytes(&mut bytes);
        format!("{}{}", self.prefix, URL_SAFE_NO_PAD.encode(&bytes))
    }

    /// Cheap shape check so obviously foreign values never reach the store.
    pub fn is_well_formed(&self, candidate: &str) -> bool {
        candidate
            .strip_prefix(self.prefix.as_str())
            .and_then(|body| URL_SAFE_NO_PAD.decode(body).ok())
            .map(|bytes| bytes.len() >= MIN_SECRET_BYTES)
            .unwrap_or(false)
    }
}
