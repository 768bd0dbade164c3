//! Edit lock settings.

use serde::{Deserialize, Serialize};

const fn default_expiry_secs() -> u64 {
    90
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LocksConfig {
    /// Seconds after which an unrefreshed lock no longer counts.
    #[serde(default = "default_expiry_secs")]
    pub expiry_secs: u64,
}

impl Default for LocksConfig {
    fn default() -> Self {
        Self {
            expiry_secs: default_expiry_secs(),
        }
    }
}
