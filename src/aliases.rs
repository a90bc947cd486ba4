// src/aliases.rs
//! Re-exports secure-gate's ergonomic secret types
//!
//! These are the canonical secret-holding types used throughout encrypted-token-vault.
//! Everything here zeroizes on drop and prints as `[REDACTED]` in `Debug`.

pub use secure_gate::{dynamic_alias, fixed_alias};

// Fixed-size secrets
fixed_alias!(DerivedKey32, 32); // Argon2id output → AES-256-GCM key
fixed_alias!(LegacyKey32, 32); // v1 stretched key (decode-only format)

// Dynamic secrets
dynamic_alias!(Password, String); // Caller password, never logged
dynamic_alias!(SecretValue, String); // Decrypted plaintext handed back to callers
