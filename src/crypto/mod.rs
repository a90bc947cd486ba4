// src/crypto/mod.rs
//! Pure cryptographic operations, no I/O and no database
//!
//! [`Codec`] turns a UTF-8 secret plus a password into a self-describing blob
//! and back. `encode` always writes the current `v2:` format; `decode` reads
//! both `v2:` and the legacy `v1:` format, dispatching on the prefix tag.
mod decrypt;
mod encrypt;
mod kdf;
pub mod legacy;
mod params;
mod rotate;

pub use params::CodecParams;

use argon2::Params;

use crate::aliases::{Password, SecretValue};
use crate::enums::FormatVersion;
use crate::error::CodecError;

pub type Result<T> = std::result::Result<T, CodecError>;

/// Versioned password-based encryption of secret values
///
/// Cheap to clone; the parameters are validated once in [`Codec::new`].
#[derive(Debug, Clone)]
pub struct Codec {
    params: CodecParams,
    argon: Params,
}

impl Codec {
    pub fn new(params: CodecParams) -> Result<Self> {
        params.validate()?;
        let argon = kdf::argon2_params(&params)?;
        Ok(Self { params, argon })
    }

    pub fn params(&self) -> &CodecParams {
        &self.params
    }

    /// Encrypt plaintext → `v2:` blob
    pub fn encode(&self, plaintext: &str, password: &Password) -> Result<String> {
        encrypt::seal(
            &self.argon,
            self.params.salt_len,
            self.params.nonce_len,
            plaintext.as_bytes(),
            password,
        )
    }

    /// Decrypt any supported blob → plaintext
    pub fn decode(&self, blob: &str, password: &Password) -> Result<SecretValue> {
        let bytes = match FormatVersion::split(blob) {
            Some((FormatVersion::Current, payload)) => decrypt::open(
                &self.argon,
                self.params.salt_len,
                self.params.nonce_len,
                payload,
                password,
            )?,
            Some((FormatVersion::Legacy, payload)) => legacy::open(payload, password)?,
            None => return Err(CodecError::UnknownVersion),
        };

        String::from_utf8(bytes)
            .map(|text| SecretValue::new(text))
            .map_err(|err| {
                zeroize::Zeroize::zeroize(&mut err.into_bytes());
                CodecError::Decryption
            })
    }
}
