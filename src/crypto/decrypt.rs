// src/crypto/decrypt.rs
use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, Key, KeyInit, Nonce};
use argon2::Params;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::aliases::Password;
use crate::consts::TAG_LEN;
use crate::crypto::kdf::derive_key;
use crate::error::CodecError;

/// Open the payload of a `v2:` blob → plaintext bytes
///
/// The GCM tag is the only integrity check. Anything that cannot even be split
/// into salt and nonce fails the same way a bad tag does.
pub(crate) fn open(
    argon: &Params,
    salt_len: usize,
    nonce_len: usize,
    payload: &str,
    password: &Password,
) -> Result<Vec<u8>, CodecError> {
    let raw = STANDARD
        .decode(payload)
        .map_err(|_| CodecError::Decryption)?;
    let (salt, rest) = raw
        .split_at_checked(salt_len)
        .ok_or(CodecError::Decryption)?;
    let (nonce, sealed) = rest
        .split_at_checked(nonce_len)
        .ok_or(CodecError::Decryption)?;
    if sealed.len() < TAG_LEN {
        return Err(CodecError::Decryption);
    }

    let key = derive_key(argon, password, salt)?;
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.expose_secret()));
    cipher
        .decrypt(Nonce::from_slice(nonce), sealed)
        .map_err(|_| CodecError::Decryption)
}
