// src/crypto/encrypt.rs
use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, Key, KeyInit, Nonce};
use argon2::Params;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::RngCore;

use crate::aliases::Password;
use crate::consts::CURRENT_TAG;
use crate::crypto::kdf::derive_key;
use crate::error::CodecError;

/// Seal plaintext → `v2:` blob with a fresh salt and nonce
///
/// Layout before base64: `salt || nonce || ciphertext || tag`.
pub(crate) fn seal(
    argon: &Params,
    salt_len: usize,
    nonce_len: usize,
    plaintext: &[u8],
    password: &Password,
) -> Result<String, CodecError> {
    let mut rng = rand::rng();
    let mut header = vec![0u8; salt_len + nonce_len];
    rng.fill_bytes(&mut header);
    let (salt, nonce) = header.split_at(salt_len);

    let key = derive_key(argon, password, salt)?;
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.expose_secret()));
    let sealed = cipher
        .encrypt(Nonce::from_slice(nonce), plaintext)
        .map_err(|_| CodecError::Encryption)?;

    header.extend_from_slice(&sealed);
    Ok(format!("{CURRENT_TAG}{}", STANDARD.encode(&header)))
}
