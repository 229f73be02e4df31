//! Configuration for huffstream

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodecConfig {
    pub chunk_size: usize,
    pub max_workers: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1024,
            max_workers: 10,
        }
    }
}
