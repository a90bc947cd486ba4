// src/crypto/legacy.rs
//! The `v1:` format: read-only support for data written before `v2`
//!
//! Layout before base64: `salt[8] || check[4] || body`, where `body` is the
//! plaintext XORed with a SHA-256 counter keystream and `check` is a short
//! fingerprint of the stretched key. There is no authentication of the body:
//! the check bytes only reject most wrong passwords early.
//!
//! The key comes from a chained MD5 → SHA-1 → SHA-256 stretch. It is weak by
//! modern standards and is kept solely so old records stay readable; the codec
//! never writes this format.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use md5::Md5;
use rand::RngCore;
use sha1::Sha1;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use crate::aliases::{LegacyKey32, Password};
use crate::consts::{
    KEY_LEN, LEGACY_CHECK_LEN, LEGACY_SALT_LEN, LEGACY_STRETCH_ROUNDS, LEGACY_TAG,
};
use crate::error::CodecError;

/// Produce a `v1:` blob
///
/// Only for building fixtures and migration tests. Production writes go
/// through [`Codec::encode`](crate::crypto::Codec::encode), which emits `v2:`.
pub fn encode(plaintext: &str, password: &Password) -> String {
    let mut salt = [0u8; LEGACY_SALT_LEN];
    rand::rng().fill_bytes(&mut salt);

    let key = stretch(password.expose_secret().as_bytes(), &salt);
    let mut body = plaintext.as_bytes().to_vec();
    apply_keystream(&key, &mut body);

    let mut raw = Vec::with_capacity(LEGACY_SALT_LEN + LEGACY_CHECK_LEN + body.len());
    raw.extend_from_slice(&salt);
    raw.extend_from_slice(&check_bytes(&key));
    raw.extend_from_slice(&body);
    format!("{LEGACY_TAG}{}", STANDARD.encode(&raw))
}

/// Open the payload of a `v1:` blob → plaintext bytes
pub(crate) fn open(payload: &str, password: &Password) -> Result<Vec<u8>, CodecError> {
    let raw = STANDARD
        .decode(payload)
        .map_err(|_| CodecError::Decryption)?;
    let (salt, rest) = raw
        .split_at_checked(LEGACY_SALT_LEN)
        .ok_or(CodecError::Decryption)?;
    let (check, body) = rest
        .split_at_checked(LEGACY_CHECK_LEN)
        .ok_or(CodecError::Decryption)?;

    let key = stretch(password.expose_secret().as_bytes(), salt);
    if !bool::from(check.ct_eq(&check_bytes(&key))) {
        return Err(CodecError::Decryption);
    }

    let mut plaintext = body.to_vec();
    apply_keystream(&key, &mut plaintext);
    Ok(plaintext)
}

fn stretch(password: &[u8], salt: &[u8]) -> LegacyKey32 {
    let mut state = [0u8; KEY_LEN];
    state.copy_from_slice(&Sha256::new().chain_update(salt).chain_update(password).finalize());

    for _ in 0..LEGACY_STRETCH_ROUNDS {
        let md5 = Md5::new().chain_update(state).chain_update(password).finalize();
        let sha1 = Sha1::new().chain_update(md5).chain_update(salt).finalize();
        let next = Sha256::new().chain_update(sha1).chain_update(state).finalize();
        state.copy_from_slice(&next);
    }

    let key = LegacyKey32::new(state);
    state.zeroize();
    key
}

fn check_bytes(key: &LegacyKey32) -> [u8; LEGACY_CHECK_LEN] {
    let digest = Sha256::new()
        .chain_update(b"check")
        .chain_update(key.expose_secret())
        .finalize();
    let mut check = [0u8; LEGACY_CHECK_LEN];
    check.copy_from_slice(&digest[..LEGACY_CHECK_LEN]);
    check
}

/// XOR in place with `SHA-256(key || counter_be)` blocks
fn apply_keystream(key: &LegacyKey32, data: &mut [u8]) {
    for (counter, chunk) in data.chunks_mut(KEY_LEN).enumerate() {
        let mut block = Sha256::new()
            .chain_update(key.expose_secret())
            .chain_update((counter as u64).to_be_bytes())
            .finalize();
        for (byte, pad) in chunk.iter_mut().zip(block.iter()) {
            *byte ^= pad;
        }
        block.as_mut_slice().zeroize();
    }
}
