//! Key material generation and loading
//!
//! A key is 32 bytes of cryptographically secure random data, stored on
//! disk as a base64url string. The whole `.key` file is the encoded key;
//! there is no header and no versioning. Key material is never derived
//! from a passphrase in this system - it is pure random material the user
//! must safeguard as a file.

use crate::error::{ErrorCategory, ErrorKind, Result, ShadeboxError};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;
use rand::rngs::OsRng;
use std::fs;
use std::io;
use std::path::Path;
use zeroize::Zeroizing;

/// Length of raw key material in bytes.
pub const KEY_LEN: usize = 32;

/// A 256-bit symmetric key. The raw bytes are wiped from memory on drop.
#[derive(Debug)]
pub struct KeyMaterial {
    bytes: Zeroizing<[u8; KEY_LEN]>,
}

impl KeyMaterial {
    /// Draws fresh key material from the OS random source.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        OsRng.fill_bytes(&mut bytes);
        Self {
            bytes: Zeroizing::new(bytes),
        }
    }

    /// Builds key material from raw bytes. Intended for tests and for
    /// callers that manage raw bytes themselves.
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self {
            bytes: Zeroizing::new(bytes),
        }
    }

    /// Parses the base64url encoded form.
    ///
    /// Surrounding ASCII whitespace and trailing `=` padding are tolerated
    /// so that key files written by padded encoders still load.
    pub fn from_encoded(encoded: &str) -> Result<Self> {
        let trimmed = encoded.trim_matches(|c: char| c.is_ascii_whitespace());
        let trimmed = trimmed.trim_end_matches('=');
        let decoded = URL_SAFE_NO_PAD.decode(trimmed).map_err(|e| {
            ShadeboxError::with_kind_and_source(
                ErrorCategory::User,
                ErrorKind::InvalidKeyFormat,
                format!("key is not valid base64url: {}", e),
                e,
            )
        })?;
        let bytes: [u8; KEY_LEN] = decoded.as_slice().try_into().map_err(|_| {
            ShadeboxError::with_kind(
                ErrorCategory::User,
                ErrorKind::InvalidKeyFormat,
                format!("key must be {} bytes, got {}", KEY_LEN, decoded.len()),
            )
        })?;
        Ok(Self {
            bytes: Zeroizing::new(bytes),
        })
    }

    /// The base64url (no padding) encoding, ready to persist as a `.key` file.
    pub fn encoded(&self) -> String {
        URL_SAFE_NO_PAD.encode(*self.bytes)
    }

    /// The raw key bytes.
    pub fn bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }
}

/// Loads key material from a `.key` file.
///
/// Fails with `KeyFileNotFound` when the path is missing or unreadable and
/// with `InvalidKeyFormat` when the contents do not decode to exactly 32
/// bytes.
pub fn load(path: &Path) -> Result<KeyMaterial> {
    let contents = fs::read(path).map_err(|e| {
        let category = if e.kind() == io::ErrorKind::NotFound {
            ErrorCategory::User
        } else {
            ErrorCategory::Internal
        };
        ShadeboxError::with_kind_and_source(
            category,
            ErrorKind::KeyFileNotFound,
            format!("failed to read key file {}", path.display()),
            e,
        )
    })?;
    let encoded = String::from_utf8(contents).map_err(|e| {
        ShadeboxError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::InvalidKeyFormat,
            format!("key file {} is not ASCII text", path.display()),
            e,
        )
    })?;
    KeyMaterial::from_encoded(&encoded)
        .map_err(|e| e.with_context(format!("invalid key file {}", path.display())))
}
