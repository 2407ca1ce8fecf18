//! Download queue: admission control and progress aggregation.
//!
//! The queue owns every [`DownloadEntry`]. Submitting a URL creates a
//! `Pending` entry; admission promotes the oldest pending entries while fewer
//! than `max_concurrent_downloads` are `Started` or `Running`. An admitted
//! entry is probed, a strategy is selected, and the transfer's events are fed
//! back through [`DownloadQueue::on_event`], which is where all aggregation
//! happens. When an entry reaches a terminal status the freed slot is handed
//! to the next pending entry.

pub mod builder;
pub mod config;
pub mod entry;
#[allow(clippy::module_inception)]
pub mod queue;

pub use builder::{DownloadQueueBuilder, DEFAULT_EVENT_CAPACITY};
pub use config::{EngineConfig, DEFAULT_SPLIT_THRESHOLD};
pub use entry::{ChunkState, DownloadEntry, EntryId};
pub use queue::{DownloadQueue, EntryEvent, EntrySubscription};
