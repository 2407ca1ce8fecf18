//! The admission-controlled download queue.
//!
//! # Examples
//!
//! ```rust,no_run
//! use rangefetch::queue::DownloadQueueBuilder;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), rangefetch::Error> {
//! let queue = DownloadQueueBuilder::new()
//!     .max_concurrent_downloads(2)
//!     .max_connections_per_download(4)
//!     .build()?;
//!
//! let mut events = queue.subscribe();
//! tokio::spawn(async move {
//!     while let Ok(update) = events.recv().await {
//!         println!("{} {}", update.entry_id, update.event.status);
//!     }
//! });
//!
//! queue.submit("https://example.com/big.iso", "downloads")?;
//! queue.submit("https://example.com/small.txt", "downloads")?;
//! queue.wait_idle().await;
//!
//! for entry in queue.list_entries() {
//!     println!("{} {} {}", entry.id, entry.filename, entry.status);
//! }
//! # Ok(())
//! # }
//! ```

use super::config::EngineConfig;
use super::entry::{DownloadEntry, EntryId};
use crate::download::{probe, Status, TransferEvent};
use crate::downloader::{preallocate, DownloadOptions, Downloader, Strategy};
use crate::error::{Error, Result};
use crate::observer::{EventSource, TracingObserver, TransferObserver};
use crate::utils::filename_from_url;

use reqwest::Url;
use reqwest_middleware::ClientWithMiddleware;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::runtime::Handle;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, error, info, warn};

/// A transfer event tagged with the entry it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryEvent {
    /// Entry the event was emitted for.
    pub entry_id: EntryId,
    /// The event itself.
    pub event: TransferEvent,
}

/// Holds every submitted download and admits them under a concurrency cap.
///
/// Cloning the queue yields another handle on the same state. Entries are
/// never removed and stay queryable after they finish.
#[derive(Clone)]
pub struct DownloadQueue {
    inner: Arc<Inner>,
}

struct Inner {
    state: Mutex<QueueState>,
    client: ClientWithMiddleware,
    events: broadcast::Sender<EntryEvent>,
    runtime: Handle,
}

struct QueueState {
    config: EngineConfig,
    next_id: u64,
    /// Submission order, which is also id order.
    entries: Vec<DownloadEntry>,
}

/// An admitted entry waiting to be spawned.
#[derive(Debug)]
struct Launch {
    id: EntryId,
    url: String,
    output_dir: PathBuf,
    config: EngineConfig,
}

impl QueueState {
    fn entry_mut(&mut self, id: EntryId) -> Option<&mut DownloadEntry> {
        self.entries.iter_mut().find(|entry| entry.id == id)
    }

    /// Another active entry already writing to `path`.
    fn path_owner(&self, id: EntryId, path: &Path) -> Option<EntryId> {
        self.entries
            .iter()
            .find(|entry| entry.id != id && entry.status.is_active() && entry.output_path == path)
            .map(|entry| entry.id)
    }

    /// Strict FIFO admission under the global cap.
    fn admit(&mut self) -> Vec<Launch> {
        let cap = self.config.max_concurrent_downloads;
        let mut active = self
            .entries
            .iter()
            .filter(|entry| entry.status.is_active())
            .count();

        let mut launches = Vec::new();
        for entry in self.entries.iter_mut() {
            if active >= cap {
                break;
            }
            if entry.status == Status::Pending {
                entry.status = Status::Started;
                active += 1;
                launches.push(Launch {
                    id: entry.id,
                    url: entry.url.clone(),
                    output_dir: entry.output_dir.clone(),
                    config: self.config.clone(),
                });
            }
        }
        launches
    }
}

impl fmt::Debug for DownloadQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("DownloadQueue")
            .field("config", &state.config)
            .field("entries", &state.entries.len())
            .finish()
    }
}

impl DownloadQueue {
    pub(crate) fn new(
        config: EngineConfig,
        client: ClientWithMiddleware,
        event_capacity: usize,
        runtime: Handle,
    ) -> Self {
        let (events, _) = broadcast::channel(event_capacity.max(1));
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(QueueState {
                    config: config.normalized(),
                    next_id: 0,
                    entries: Vec::new(),
                }),
                client,
                events,
                runtime,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        // Every mutation leaves the state consistent, so a poisoned lock is still usable.
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue `url` for download into `output_dir` and run admission.
    ///
    /// The entry is created `Pending`; if a slot is free it is immediately
    /// marked `Started` and its probe and transfer are spawned.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidUrl`] if `url` is not an absolute HTTP(S) URL.
    pub fn submit(&self, url: &str, output_dir: impl AsRef<Path>) -> Result<EntryId> {
        let parsed = Url::parse(url).map_err(|e| {
            Error::InvalidUrl(format!("The url \"{}\" cannot be parsed: {}", url, e))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::InvalidUrl(format!(
                "The url \"{}\" is not an HTTP(S) url",
                url
            )));
        }

        let (id, launches) = {
            let mut state = self.lock();
            let id = EntryId(state.next_id);
            state.next_id += 1;
            state.entries.push(DownloadEntry::new(
                id,
                url.to_string(),
                filename_from_url(url),
                output_dir.as_ref().to_path_buf(),
            ));
            (id, state.admit())
        };

        info!(entry = %id, url, "Download queued");
        self.launch(launches);
        Ok(id)
    }

    /// Fold a transfer event into the entry `id`.
    ///
    /// This is the only path that mutates entries. The entry and its chunk
    /// map are updated, and the downloaded bytes recomputed, in a single
    /// critical section. A transfer-level terminal status triggers admission
    /// of pending entries. Newly admitted transfers are spawned, and the event
    /// is broadcast to subscribers, after the lock is released.
    pub fn on_event(&self, id: EntryId, event: &TransferEvent) {
        let launches = {
            let mut state = self.lock();
            let Some(entry) = state.entry_mut(id) else {
                warn!(entry = %id, "Event for an unknown entry");
                return;
            };
            if entry.apply(event) {
                info!(
                    entry = %id,
                    status = %entry.status,
                    bytes = entry.bytes_downloaded,
                    elapsed = entry.elapsed_seconds,
                    "Download ended"
                );
                state.admit()
            } else {
                Vec::new()
            }
        };

        self.launch(launches);

        // Sending only fails when nobody is subscribed.
        let _ = self.inner.events.send(EntryEvent {
            entry_id: id,
            event: event.clone(),
        });
    }

    /// Replace the configuration and run admission again.
    ///
    /// Transfers already running keep the settings they were started with.
    pub fn configure(&self, config: EngineConfig) {
        let launches = {
            let mut state = self.lock();
            state.config = config.normalized();
            debug!(config = ?state.config, "Queue reconfigured");
            state.admit()
        };
        self.launch(launches);
    }

    /// Current configuration.
    pub fn config(&self) -> EngineConfig {
        self.lock().config.clone()
    }

    /// Snapshots of every entry, in submission order.
    pub fn list_entries(&self) -> Vec<DownloadEntry> {
        self.lock().entries.clone()
    }

    /// Snapshot of a single entry.
    pub fn entry(&self, id: EntryId) -> Option<DownloadEntry> {
        self.lock().entries.iter().find(|entry| entry.id == id).cloned()
    }

    /// Number of entries in `Started` or `Running`.
    pub fn active_count(&self) -> usize {
        self.count(Status::is_active)
    }

    /// Number of entries waiting for admission.
    pub fn pending_count(&self) -> usize {
        self.count(|status| status == Status::Pending)
    }

    fn count(&self, predicate: impl Fn(Status) -> bool) -> usize {
        self.lock()
            .entries
            .iter()
            .filter(|entry| predicate(entry.status))
            .count()
    }

    /// Whether every entry has reached a terminal status.
    pub fn is_idle(&self) -> bool {
        self.lock()
            .entries
            .iter()
            .all(|entry| entry.status.is_terminal())
    }

    /// Receive every event of every entry.
    ///
    /// Dropping the receiver unsubscribes. A receiver that falls more than
    /// the configured capacity behind gets [`RecvError::Lagged`].
    pub fn subscribe(&self) -> broadcast::Receiver<EntryEvent> {
        self.inner.events.subscribe()
    }

    /// Receive the events of a single entry.
    pub fn subscribe_entry(&self, id: EntryId) -> EntrySubscription {
        EntrySubscription {
            id,
            receiver: self.subscribe(),
        }
    }

    /// Wait until every submitted entry is `Finished` or `Failed`.
    pub async fn wait_idle(&self) {
        let mut receiver = self.subscribe();
        loop {
            if self.is_idle() {
                return;
            }
            match receiver.recv().await {
                Ok(_) | Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => return,
            }
        }
    }

    fn launch(&self, launches: Vec<Launch>) {
        for launch in launches {
            let id = launch.id;
            debug!(entry = %id, url = %launch.url, "Download admitted");

            let handle = self.inner.runtime.spawn(self.clone().run_transfer(launch));

            // A panic in the transfer task must not hold its slot forever.
            let queue = self.clone();
            self.inner.runtime.spawn(async move {
                if let Err(e) = handle.await {
                    error!(entry = %id, error = %e, "Download task fault");
                    queue.on_event(id, &TransferEvent::transfer(Status::Failed, 0, 0, 0.0));
                }
            });
        }
    }

    async fn run_transfer(self, launch: Launch) {
        let Launch {
            id,
            url,
            output_dir,
            config,
        } = launch;

        let resource = probe(&self.inner.client, &url).await;
        let output_path = {
            let mut state = self.lock();
            let Some(entry) = state.entry_mut(id) else {
                return;
            };
            entry.apply_resource(&resource);
            let output_path = entry.output_path.clone();
            if let Some(owner) = state.path_owner(id, &output_path) {
                warn!(
                    entry = %id,
                    owner = %owner,
                    path = %output_path.display(),
                    "Destination already used by an active download"
                );
            }
            output_path
        };

        let downloader = Downloader::for_resource(&resource, &config, self.inner.client.clone());
        info!(
            entry = %id,
            strategy = ?downloader.strategy(),
            size = resource.content_size,
            path = %output_path.display(),
            "Download starting"
        );

        if let Err(e) = prepare_destination(
            &output_dir,
            &output_path,
            downloader.strategy(),
            resource.content_size,
        )
        .await
        {
            error!(entry = %id, error = %e, path = %output_path.display(), "Cannot prepare destination");
            self.on_event(
                id,
                &TransferEvent::transfer(Status::Failed, 0, resource.content_size, 0.0),
            );
            return;
        }

        downloader.add_observer(Arc::new(QueueObserver {
            queue: self.clone(),
            id,
        }));
        downloader.add_observer(Arc::new(TracingObserver::new(format!(
            "{} {}",
            id, resource.filename
        ))));

        let options = DownloadOptions::new(&resource, output_path);
        if let Err(e) = downloader.download(&options).await {
            error!(entry = %id, error = %e, "Download aborted");
            // No-op if the downloader already reported a terminal status.
            self.on_event(
                id,
                &TransferEvent::transfer(Status::Failed, 0, resource.content_size, 0.0),
            );
        }
    }
}

async fn prepare_destination(
    output_dir: &Path,
    output_path: &Path,
    strategy: Strategy,
    size: u64,
) -> Result<()> {
    debug!("Creating destination directory {:?}", output_dir);
    tokio::fs::create_dir_all(output_dir).await?;
    if strategy == Strategy::Parallel {
        preallocate(output_path, size).await?;
    }
    Ok(())
}

/// Forwards a transfer's events into the queue.
struct QueueObserver {
    queue: DownloadQueue,
    id: EntryId,
}

impl TransferObserver for QueueObserver {
    fn on_update(&self, event: &TransferEvent) {
        self.queue.on_event(self.id, event);
    }
}

/// The events of one entry, see [`DownloadQueue::subscribe_entry`].
#[derive(Debug)]
pub struct EntrySubscription {
    id: EntryId,
    receiver: broadcast::Receiver<EntryEvent>,
}

impl EntrySubscription {
    /// Entry this subscription follows.
    pub fn id(&self) -> EntryId {
        self.id
    }

    /// Next event of the entry, or `None` once the queue is gone.
    ///
    /// Lagging behind skips the missed events rather than failing.
    pub async fn recv(&mut self) -> Option<TransferEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(update) if update.entry_id == self.id => return Some(update.event),
                Ok(_) => continue,
                Err(RecvError::Lagged(missed)) => {
                    warn!(entry = %self.id, missed, "Subscriber lagged behind");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::DownloadQueueBuilder;

    // Spawned transfers only run once the test awaits, so admission is
    // observable deterministically on the current-thread runtime.
    fn queue(cap: usize) -> DownloadQueue {
        DownloadQueueBuilder::new()
            .max_concurrent_downloads(cap)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_admission_respects_cap() {
        let queue = queue(2);
        let a = queue.submit("http://127.0.0.1:9/a", "/tmp").unwrap();
        let b = queue.submit("http://127.0.0.1:9/b", "/tmp").unwrap();
        let c = queue.submit("http://127.0.0.1:9/c", "/tmp").unwrap();

        assert_eq!(queue.active_count(), 2);
        assert_eq!(queue.pending_count(), 1);
        assert_eq!(queue.entry(a).unwrap().status, Status::Started);
        assert_eq!(queue.entry(b).unwrap().status, Status::Started);
        assert_eq!(queue.entry(c).unwrap().status, Status::Pending);

        queue.on_event(a, &TransferEvent::transfer(Status::Finished, 1, 1, 0.1));
        assert_eq!(queue.entry(c).unwrap().status, Status::Started);
        assert_eq!(queue.active_count(), 2);
        assert_eq!(queue.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_invalid_url() {
        let queue = queue(1);
        assert!(matches!(
            queue.submit("not a url", "/tmp"),
            Err(Error::InvalidUrl(_))
        ));
        assert!(matches!(
            queue.submit("ftp://domain.com/file", "/tmp"),
            Err(Error::InvalidUrl(_))
        ));
        assert!(queue.list_entries().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_entry_is_ignored() {
        let queue = queue(1);
        queue.on_event(EntryId(42), &TransferEvent::transfer(Status::Failed, 0, 0, 0.0));
        assert!(queue.is_idle());
    }

    #[tokio::test]
    async fn test_configure_admits_more() {
        let queue = queue(1);
        for name in ["a", "b", "c"] {
            queue.submit(&format!("http://127.0.0.1:9/{}", name), "/tmp").unwrap();
        }
        assert_eq!(queue.active_count(), 1);

        queue.configure(EngineConfig {
            max_concurrent_downloads: 3,
            ..queue.config()
        });
        assert_eq!(queue.active_count(), 3);
        assert_eq!(queue.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_path_owner_finds_active_entry() {
        let queue = queue(2);
        let a = queue.submit("http://127.0.0.1:9/same.bin", "/tmp").unwrap();
        let b = queue.submit("http://127.0.0.1:9/other/same.bin", "/tmp").unwrap();
        let path = PathBuf::from("/tmp/same.bin");

        assert_eq!(queue.lock().path_owner(b, &path), Some(a));
        assert_eq!(queue.lock().path_owner(a, &path), Some(b));
        assert_eq!(queue.lock().path_owner(a, Path::new("/tmp/else.bin")), None);

        queue.on_event(a, &TransferEvent::transfer(Status::Finished, 1, 1, 0.1));
        assert_eq!(queue.lock().path_owner(b, &path), None);
    }

    #[tokio::test]
    async fn test_events_are_broadcast() {
        let queue = queue(1);
        let id = queue.submit("http://127.0.0.1:9/a", "/tmp").unwrap();
        let mut subscription = queue.subscribe_entry(id);

        let event = TransferEvent::chunk(0, Status::Running, 10, 100, 0.1);
        queue.on_event(id, &event);
        assert_eq!(subscription.recv().await, Some(event));
    }
}
