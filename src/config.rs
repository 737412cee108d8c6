use crate::error::{FastqError, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_WORKERS: usize = 4;
pub const DEFAULT_CHUNK_SIZE: usize = 1_000_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Worker threads running chunk transforms.
    pub workers: usize,
    /// Records per chunk.
    pub chunk_size: usize,
    /// Chunks allowed to wait for a free worker; 0 picks twice the worker count.
    pub queue_depth: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        ReaderConfig {
            workers: DEFAULT_WORKERS,
            chunk_size: DEFAULT_CHUNK_SIZE,
            queue_depth: 0,
        }
    }
}

impl ReaderConfig {
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(FastqError::InvalidConfig {
                msg: "workers must be at least 1".to_string(),
            });
        }
        if self.chunk_size == 0 {
            return Err(FastqError::InvalidConfig {
                msg: "chunk_size must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn effective_queue_depth(&self) -> usize {
        if self.queue_depth == 0 {
            self.workers.saturating_mul(2).max(1)
        } else {
            self.queue_depth
        }
    }
}
