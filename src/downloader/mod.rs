//! Transfer strategies.
//!
//! A transfer is executed either by a [`SingleDownloader`] (one streamed GET)
//! or by a [`ParallelDownloader`] (N concurrent ranged GETs into a pre-sized
//! file). Which one is used is decided by [`select_strategy`], a pure function
//! of the resource metadata and the configured split threshold; the
//! strategies themselves know nothing about it.
//!
//! # Examples
//!
//! ```rust
//! use rangefetch::downloader::{select_strategy, Strategy};
//!
//! const MIB: u64 = 1024 * 1024;
//!
//! assert_eq!(select_strategy(5 * MIB, true, 5 * MIB), Strategy::Parallel);
//! assert_eq!(select_strategy(5 * MIB - 1, true, 5 * MIB), Strategy::Single);
//! assert_eq!(select_strategy(100 * MIB, false, 5 * MIB), Strategy::Single);
//! ```

pub mod parallel;
pub mod single;

pub use parallel::ParallelDownloader;
pub use single::SingleDownloader;

use crate::download::ResourceDescriptor;
use crate::error::Result;
use crate::observer::{EventEmitter, EventSource};
use crate::queue::EngineConfig;

use reqwest_middleware::ClientWithMiddleware;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::fs::File;

/// Default minimum delay between two `Running` events of the same id.
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_millis(200);

/// What to transfer and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOptions {
    /// URL of the resource.
    pub url: String,
    /// Destination file.
    pub output_path: PathBuf,
    /// Size of the resource, `0` if unknown.
    pub content_size: u64,
}

impl DownloadOptions {
    /// Options for saving `resource` at `output_path`.
    pub fn new(resource: &ResourceDescriptor, output_path: impl Into<PathBuf>) -> Self {
        Self {
            url: resource.url.clone(),
            output_path: output_path.into(),
            content_size: resource.content_size,
        }
    }
}

/// The two transfer strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// One streamed request.
    Single,
    /// Concurrent ranged requests.
    Parallel,
}

/// Pick the strategy for a resource.
///
/// Ranged transfers are only worth it, and only possible, when the server
/// supports ranges and the resource is at least `split_threshold` bytes. An
/// unknown size (`0`) therefore always means [`Strategy::Single`].
pub fn select_strategy(content_size: u64, accepts_ranges: bool, split_threshold: u64) -> Strategy {
    if accepts_ranges && content_size > 0 && content_size >= split_threshold {
        Strategy::Parallel
    } else {
        Strategy::Single
    }
}

/// A transfer strategy ready to run.
#[derive(Debug, Clone)]
pub enum Downloader {
    /// See [`SingleDownloader`].
    Single(SingleDownloader),
    /// See [`ParallelDownloader`].
    Parallel(ParallelDownloader),
}

impl Downloader {
    /// Build the downloader [`select_strategy`] picks for `resource`.
    pub fn for_resource(
        resource: &ResourceDescriptor,
        config: &EngineConfig,
        client: ClientWithMiddleware,
    ) -> Self {
        match select_strategy(
            resource.content_size,
            resource.accepts_ranges,
            config.split_threshold,
        ) {
            Strategy::Single => Downloader::Single(
                SingleDownloader::new(client).with_progress_interval(config.progress_interval),
            ),
            Strategy::Parallel => Downloader::Parallel(
                ParallelDownloader::new(client, config.max_connections_per_download)
                    .with_max_retries(config.max_retries)
                    .with_progress_interval(config.progress_interval),
            ),
        }
    }

    /// The strategy this downloader implements.
    pub fn strategy(&self) -> Strategy {
        match self {
            Downloader::Single(_) => Strategy::Single,
            Downloader::Parallel(_) => Strategy::Parallel,
        }
    }

    /// Run the transfer. See the strategy types for the events emitted.
    pub async fn download(&self, options: &DownloadOptions) -> Result<()> {
        match self {
            Downloader::Single(d) => d.download(options).await,
            Downloader::Parallel(d) => d.download(options).await,
        }
    }
}

impl EventSource for Downloader {
    fn emitter(&self) -> &EventEmitter {
        match self {
            Downloader::Single(d) => d.emitter(),
            Downloader::Parallel(d) => d.emitter(),
        }
    }
}

/// Create (or truncate) `path` and size it to exactly `size` bytes.
///
/// This is the precondition of [`ParallelDownloader::download`]: chunk tasks
/// only ever open the file for writing and seek inside it.
pub async fn preallocate(path: &Path, size: u64) -> Result<()> {
    let file = File::create(path).await?;
    file.set_len(size).await?;
    Ok(())
}

/// Rate limiter for `Running` events.
#[derive(Debug)]
pub(crate) struct ProgressTicker {
    interval: Duration,
    last: Instant,
}

impl ProgressTicker {
    pub(crate) fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Instant::now(),
        }
    }

    /// `true` at most once per interval.
    pub(crate) fn ready(&mut self) -> bool {
        if self.last.elapsed() >= self.interval {
            self.last = Instant::now();
            true
        } else {
            false
        }
    }
}
