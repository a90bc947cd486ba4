// src/crypto/kdf.rs
//! Argon2id password stretching for the `v2` format

use argon2::{Algorithm, Argon2, Params, Version};
use zeroize::Zeroize;

use crate::aliases::{DerivedKey32, Password};
use crate::consts::KEY_LEN;
use crate::crypto::params::CodecParams;
use crate::error::CodecError;

/// Translate codec parameters into Argon2 parameters, once per codec
pub(crate) fn argon2_params(params: &CodecParams) -> Result<Params, CodecError> {
    Params::new(
        params.memory_kib,
        params.iterations,
        params.parallelism,
        Some(params.key_len),
    )
    .map_err(|e| CodecError::InvalidParams(format!("Invalid Argon2 params: {e}")))
}

/// Derive the 256-bit AES key for one blob
pub(crate) fn derive_key(
    params: &Params,
    password: &Password,
    salt: &[u8],
) -> Result<DerivedKey32, CodecError> {
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params.clone());

    let mut bytes = [0u8; KEY_LEN];
    argon2
        .hash_password_into(password.expose_secret().as_bytes(), salt, &mut bytes)
        .map_err(|e| CodecError::KeyDerivation(format!("Argon2 failed: {e}")))?;

    let key = DerivedKey32::new(bytes);
    bytes.zeroize();
    Ok(key)
}
