//! rangefetch is a concurrent HTTP download engine.
//!
//! Every URL is first probed for its size and byte-range support. Large
//! range-capable resources are split into ranges fetched concurrently into
//! disjoint regions of a pre-sized file; everything else is streamed with a
//! single request. A queue admits downloads under a global concurrency cap and
//! publishes their progress as events, so any presentation layer can follow
//! along without the engine knowing about it.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use rangefetch::{DownloadQueueBuilder, Error, Status};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Error> {
//! let queue = DownloadQueueBuilder::new()
//!     .max_concurrent_downloads(3)
//!     .max_connections_per_download(8)
//!     .build()?;
//!
//! let id = queue.submit(
//!     "https://github.com/seanmonstar/reqwest/archive/refs/tags/v0.11.9.zip",
//!     "output",
//! )?;
//! queue.wait_idle().await;
//!
//! let entry = queue.entry(id).unwrap();
//! assert_eq!(entry.status, Status::Finished);
//! # Ok(())
//! # }
//! ```
//!
//! # Module Organization
//!
//! - [`download`] - Resource probing, byte ranges and transfer events
//! - [`downloader`] - The single and parallel transfer strategies
//! - [`observer`] - Fan-out of transfer events to observers
//! - [`queue`] - The admission-controlled `DownloadQueue` and its builder
//! - [`error`] - Centralized error handling with the `Error` enum
//! - [`http`] - HTTP client construction
//! - [`progress`] - Optional `indicatif` rendering of queue progress
//! - [`utils`] - Header and filename helpers

pub mod download;
pub mod downloader;
pub mod error;
pub mod http;
pub mod observer;
pub mod progress;
pub mod queue;
pub mod utils;

pub use download::{partition, probe, ByteRange, ResourceDescriptor, Status, TransferEvent};
pub use downloader::{select_strategy, DownloadOptions, Downloader, Strategy};
pub use error::{Error, Result};
pub use http::{create_http_client, HttpClientConfig};
pub use observer::{EventEmitter, EventSource, ObserverId, TracingObserver, TransferObserver};
pub use progress::{ProgressBarOpts, ProgressDisplay, StyleOptions};
pub use queue::{
    ChunkState, DownloadEntry, DownloadQueue, DownloadQueueBuilder, EngineConfig, EntryEvent,
    EntryId, EntrySubscription,
};
