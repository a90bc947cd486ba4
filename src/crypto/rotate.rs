// src/crypto/rotate.rs
use crate::aliases::Password;

use super::{Codec, Result};

impl Codec {
    /// Pure in-memory re-encryption: old password → new password
    ///
    /// `Ok(None)` means `old_password` does not open the blob, which for the
    /// rotation engine simply marks a record that belongs to someone else.
    pub fn reencrypt(
        &self,
        blob: &str,
        old_password: &Password,
        new_password: &Password,
    ) -> Result<Option<String>> {
        let Ok(plaintext) = self.decode(blob, old_password) else {
            return Ok(None);
        };
        self.encode(plaintext.expose_secret(), new_password).map(Some)
    }
}
