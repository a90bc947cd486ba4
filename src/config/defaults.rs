// src/config/defaults.rs
use crate::config::app::{RotationConfig, TokenConfig};
use crate::consts::{
    DEFAULT_BATCH_SIZE, DEFAULT_CREATE_ATTEMPTS, DEFAULT_PAGE_SIZE, DEFAULT_PAGING_THRESHOLD,
    DEFAULT_PARALLEL_THRESHOLD, DEFAULT_QUEUE_DEPTH, DEFAULT_TOKEN_LENGTH, DEFAULT_WORKERS,
    MAX_TOKEN_LENGTH, MIN_TOKEN_LENGTH,
};

pub const DEFAULT_CONFIG_FILE: &str = "etv-config.toml";

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            min_length: MIN_TOKEN_LENGTH,
            max_length: MAX_TOKEN_LENGTH,
            default_length: DEFAULT_TOKEN_LENGTH,
            create_attempts: DEFAULT_CREATE_ATTEMPTS,
        }
    }
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            paging_threshold: DEFAULT_PAGING_THRESHOLD,
            page_size: DEFAULT_PAGE_SIZE,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
            batch_size: DEFAULT_BATCH_SIZE,
            workers: DEFAULT_WORKERS,
            queue_depth: DEFAULT_QUEUE_DEPTH,
        }
    }
}
