// src/enums.rs
//! Public enum types used throughout the crate
//!
//! Central location for the enums that represent user-visible choices:
//! ciphertext formats, codec presets, purge modes, rotation execution modes.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::consts::{CURRENT_TAG, LEGACY_TAG};
use crate::error::ConfigError;

/// Ciphertext blob formats, keyed by their prefix tag
///
/// Adding a format means adding one variant here and one arm in
/// [`Codec::decode`](crate::crypto::Codec::decode).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum FormatVersion {
    /// `v1:` chained-hash stretch + XOR keystream, decode-only
    Legacy,
    /// `v2:` Argon2id + AES-256-GCM
    Current,
}

impl FormatVersion {
    pub const fn tag(self) -> &'static str {
        match self {
            FormatVersion::Legacy => LEGACY_TAG,
            FormatVersion::Current => CURRENT_TAG,
        }
    }

    /// Split a blob into its format and the payload after the tag
    pub fn split(blob: &str) -> Option<(Self, &str)> {
        [FormatVersion::Legacy, FormatVersion::Current]
            .into_iter()
            .find_map(|version| blob.strip_prefix(version.tag()).map(|rest| (version, rest)))
    }

    pub fn detect(blob: &str) -> Option<Self> {
        Self::split(blob).map(|(version, _)| version)
    }
}

/// Named Argon2id parameter sets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum CodecPreset {
    #[default]
    Default,
    HighSecurity,
    Lightweight,
}

impl FromStr for CodecPreset {
    type Err = ConfigError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "default" => Ok(CodecPreset::Default),
            "high-security" => Ok(CodecPreset::HighSecurity),
            "lightweight" => Ok(CodecPreset::Lightweight),
            other => Err(ConfigError::UnknownPreset(other.to_string())),
        }
    }
}

/// How `purge_expired` removes expired records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PurgeMode {
    /// Set `soft_deleted_at`, keep the row
    Soft,
    /// Physically delete the row
    Hard,
}

/// Which rotation path handled a working set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    Sequential,
    Parallel,
}
