// src/consts.rs
//! Shared constants: format tags, security parameters and defaults

/// Prefix tag of the legacy XOR format (decode-only)
pub const LEGACY_TAG: &str = "v1:";

/// Prefix tag of the current Argon2id + AES-256-GCM format
pub const CURRENT_TAG: &str = "v2:";

/// AES-256 key length in bytes
pub const KEY_LEN: usize = 32;

/// AES-GCM nonce length in bytes (96 bits)
pub const NONCE_LEN: usize = 12;

/// AES-GCM authentication tag length in bytes
pub const TAG_LEN: usize = 16;

/// Default per-blob salt length for Argon2id
pub const DEFAULT_SALT_LEN: usize = 16;

/// Smallest salt accepted by config validation
pub const MIN_SALT_LEN: usize = 8;

/// Argon2id defaults: 3 passes over 64 MiB with 4 lanes
pub const DEFAULT_KDF_ITERATIONS: u32 = 3;
pub const DEFAULT_KDF_MEMORY_KIB: u32 = 64 * 1024;
pub const DEFAULT_KDF_PARALLELISM: u32 = 4;

/// Legacy v1 layout: salt || check || body
pub const LEGACY_SALT_LEN: usize = 8;
pub const LEGACY_CHECK_LEN: usize = 4;

/// Rounds of the chained MD5 → SHA-1 → SHA-256 legacy stretch
pub const LEGACY_STRETCH_ROUNDS: u32 = 1_000;

/// Every generated token starts with this
pub const TOKEN_PREFIX: &str = "tk_";

/// Default bounds for generated token length
pub const MIN_TOKEN_LENGTH: usize = 15;
pub const MAX_TOKEN_LENGTH: usize = 40;
pub const DEFAULT_TOKEN_LENGTH: usize = 32;

/// Width of the base-32 millisecond timestamp (covers dates until year ~3000)
pub const TIMESTAMP_WIDTH: usize = 9;

/// The timestamp may be truncated down to this many characters to make room
pub const MIN_TIMESTAMP_LEN: usize = 6;

/// Random suffix is never shorter than this
pub const MIN_RANDOM_LEN: usize = 6;

/// Crockford base-32: no I, L, O, U; sorts in ASCII order
pub const TIMESTAMP_ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

/// Random suffix alphabet: lowercase + digits minus 0, 1, i, l, o
pub const RANDOM_ALPHABET: &[u8; 31] = b"23456789abcdefghjkmnpqrstuvwxyz";

/// Token-collision retries in `TokenVault::create`
pub const DEFAULT_CREATE_ATTEMPTS: u32 = 3;

/// Above this many records, rotation pages through the table
pub const DEFAULT_PAGING_THRESHOLD: usize = 1_000;
pub const DEFAULT_PAGE_SIZE: usize = 1_000;

/// Above this many records, rotation fans out to the worker pool
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 10_000;
pub const DEFAULT_BATCH_SIZE: usize = 100;
pub const DEFAULT_WORKERS: usize = 10;

/// Pending batches the dispatcher may queue ahead of the workers
pub const DEFAULT_QUEUE_DEPTH: usize = 20;

/// Environment variable naming the TOML config file
pub const CONFIG_ENV_VAR: &str = "ETV_CONFIG";
