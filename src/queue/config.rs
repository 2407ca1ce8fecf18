//! Engine configuration and defaults.
//!
//! # Examples
//!
//! ```rust
//! use rangefetch::queue::EngineConfig;
//!
//! let config = EngineConfig {
//!     max_concurrent_downloads: 2,
//!     ..EngineConfig::default()
//! };
//! assert_eq!(config.max_connections_per_download, 8);
//! assert_eq!(config.split_threshold, 5 * 1024 * 1024);
//! ```

use crate::downloader::DEFAULT_PROGRESS_INTERVAL;
use std::time::Duration;

/// Smallest resource worth splitting into ranges: 5 MiB.
pub const DEFAULT_SPLIT_THRESHOLD: u64 = 5 * 1024 * 1024;

/// Tunables of the download engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Number of transfers allowed in `Started`/`Running` at once.
    pub max_concurrent_downloads: usize,
    /// Number of ranges a parallel transfer is split into.
    pub max_connections_per_download: usize,
    /// Extra attempts a failing chunk gets before it is reported as failed.
    pub max_retries: u32,
    /// Minimum size, in bytes, for a range-capable resource to be split.
    pub split_threshold: u64,
    /// Minimum delay between two `Running` events of the same id.
    pub progress_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_downloads: 3,
            max_connections_per_download: 8,
            max_retries: 3,
            split_threshold: DEFAULT_SPLIT_THRESHOLD,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

impl EngineConfig {
    /// Clamp the counts to at least one.
    ///
    /// A cap of zero would never admit anything and zero connections would
    /// produce a ranged transfer without ranges.
    pub fn normalized(mut self) -> Self {
        self.max_concurrent_downloads = self.max_concurrent_downloads.max(1);
        self.max_connections_per_download = self.max_connections_per_download.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.max_concurrent_downloads, 3);
        assert_eq!(config.max_connections_per_download, 8);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.split_threshold, DEFAULT_SPLIT_THRESHOLD);
    }

    #[test]
    fn test_normalized() {
        let config = EngineConfig {
            max_concurrent_downloads: 0,
            max_connections_per_download: 0,
            ..EngineConfig::default()
        }
        .normalized();
        assert_eq!(config.max_concurrent_downloads, 1);
        assert_eq!(config.max_connections_per_download, 1);
    }
}
