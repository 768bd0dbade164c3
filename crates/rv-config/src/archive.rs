//! Archive codec tuning.

use serde::{Deserialize, Serialize};

const fn default_compression_level() -> u32 {
    6
}

/// 64 KiB.
const fn default_chunk_size() -> usize {
    64 * 1024
}

/// 256 MiB.
const fn default_max_entry_bytes() -> u64 {
    256 * 1024 * 1024
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArchiveConfig {
    /// gzip level, 0 (store) to 9 (best).
    #[serde(default = "default_compression_level")]
    pub compression_level: u32,

    /// Size of the byte chunks yielded by archive export.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Archive entries larger than this are rejected on import.
    #[serde(default = "default_max_entry_bytes")]
    pub max_entry_bytes: u64,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            compression_level: default_compression_level(),
            chunk_size: default_chunk_size(),
            max_entry_bytes: default_max_entry_bytes(),
        }
    }
}
