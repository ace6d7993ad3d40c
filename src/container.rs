//! Authenticated image containers using XSalsa20Poly1305
//!
//! A container is the on-disk `.enc` representation of one image. The
//! canonical image bytes are sealed with NaCl secretbox under the 32-byte
//! key; a fresh random nonce per seal guarantees that encrypting the same
//! plaintext twice yields different containers.
//!
//! The binary format is:
//! - magic: 10 bytes, the ASCII string "shadebox1:"
//! - nonce: 24 bytes
//! - length: 8 bytes (big-endian signed int64)
//! - sealed box: variable length (includes 16-byte Poly1305 MAC)
//!
//! Every byte is either validated during parsing (magic, length, trailing
//! data) or covered by the MAC (nonce, sealed box), so any bit flip makes
//! `open` fail without surfacing partial plaintext.

use crate::error::{ErrorCategory, ErrorKind, Result, ShadeboxError};
use crate::keystore::KeyMaterial;
use crypto_secretbox::aead::{Aead, KeyInit};
use crypto_secretbox::{Nonce, XSalsa20Poly1305};
use rand::RngCore;
use rand::rngs::OsRng;
use std::mem::size_of;

/// Magic prefix shared by all shadebox container versions
const MAGIC_PREFIX: &[u8] = b"shadebox";

/// Version 1 magic marker
const V1_MAGIC: &[u8] = b"shadebox1:";

/// Length of nonce in bytes
pub const NONCE_LEN: usize = 24;

fn malformed(msg: impl Into<String>) -> ShadeboxError {
    ShadeboxError::with_kind(ErrorCategory::User, ErrorKind::MalformedContainer, msg)
}

/// Seal plaintext into a container using a fresh random nonce
pub fn seal(key: &KeyMaterial, plaintext: &[u8]) -> Result<Vec<u8>> {
    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);

    seal_with_nonce(key, plaintext, &nonce)
}

/// Seal plaintext into a container using a provided nonce
///
/// This function is ONLY for testing purposes to generate deterministic
/// output. NEVER use this in production - always use `seal()` which
/// generates a random nonce.
pub fn seal_with_nonce(
    key: &KeyMaterial,
    plaintext: &[u8],
    nonce: &[u8; NONCE_LEN],
) -> Result<Vec<u8>> {
    let cipher = XSalsa20Poly1305::new(key.bytes().into());

    let nonce_obj = Nonce::from(*nonce);
    let sealed_box = cipher.encrypt(&nonce_obj, plaintext).map_err(|e| {
        ShadeboxError::with_kind(
            ErrorCategory::Internal,
            ErrorKind::SealFailure,
            format!("sealing failed: {}", e),
        )
    })?;

    let sealed_box_len = sealed_box.len() as i64;
    let mut output = Vec::with_capacity(
        V1_MAGIC.len() + NONCE_LEN + size_of::<i64>() + sealed_box.len(),
    );
    output.extend_from_slice(V1_MAGIC);
    output.extend_from_slice(nonce);
    output.extend_from_slice(&sealed_box_len.to_be_bytes()); // big-endian i64
    output.extend_from_slice(&sealed_box);

    Ok(output)
}

/// Open a container, returning the canonical image bytes
///
/// Fails with `MalformedContainer` when the blob is truncated, carries an
/// unrecognized version tag, or violates the binary layout, and with
/// `AuthenticationFailed` when the Poly1305 tag does not verify (wrong key
/// or tampered bytes). No plaintext is returned on any failure.
pub fn open(key: &KeyMaterial, container: &[u8]) -> Result<Vec<u8>> {
    let mut pos = 0;

    if container.len() < V1_MAGIC.len() {
        return Err(malformed("input smaller than magic marker; likely truncated"));
    }
    if &container[..V1_MAGIC.len()] != V1_MAGIC {
        if container.starts_with(MAGIC_PREFIX) {
            return Err(malformed(
                "input claims to be a shadebox container, but not a version we support",
            ));
        }
        return Err(malformed("input unrecognized as a shadebox container"));
    }
    pos += V1_MAGIC.len();

    if container.len() < pos + NONCE_LEN {
        return Err(malformed("input likely truncated while reading nonce"));
    }
    let nonce: [u8; NONCE_LEN] = container[pos..pos + NONCE_LEN]
        .try_into()
        .map_err(|_| malformed("failed to read nonce"))?;
    pos += NONCE_LEN;

    if container.len() < pos + size_of::<i64>() {
        return Err(malformed("input likely truncated while reading sealed box"));
    }
    let length_bytes: [u8; 8] = container[pos..pos + size_of::<i64>()]
        .try_into()
        .map_err(|_| malformed("failed to read length"))?;
    let sealed_box_len = i64::from_be_bytes(length_bytes);
    pos += size_of::<i64>();

    if sealed_box_len < 0 {
        return Err(malformed(
            "negative sealed box length (when interpreted as a big-endian i64)",
        ));
    }

    // Check if length exceeds platform's maximum isize. *Valid* input
    // can fail this check if the platform's isize is small.
    if sealed_box_len > isize::MAX as i64 {
        return Err(malformed("sealed box length exceeds this system's max isize"));
    }

    let sealed_box_len = sealed_box_len as usize;

    if sealed_box_len > container.len() {
        return Err(malformed(
            "truncated or corrupt input; claimed length greater than available input",
        ));
    }

    if container.len() < pos + sealed_box_len {
        return Err(malformed("truncated or corrupt input (while reading sealed box)"));
    }
    let sealed_box = &container[pos..pos + sealed_box_len];
    pos += sealed_box_len;

    if pos < container.len() {
        return Err(malformed("invalid input: unexpected data after sealed box"));
    }

    let cipher = XSalsa20Poly1305::new(key.bytes().into());
    let nonce_obj = Nonce::from(nonce);
    let plaintext = cipher.decrypt(&nonce_obj, sealed_box).map_err(|_| {
        ShadeboxError::with_kind(
            ErrorCategory::User,
            ErrorKind::AuthenticationFailed,
            "corrupt container, tampered-with data, or wrong key",
        )
    })?;

    Ok(plaintext)
}
