//! Terminal rendering of queue progress.
//!
//! [`ProgressDisplay`] is a listener like any other subscriber: it reads
//! entry snapshots after the queue released its lock and draws them with
//! `indicatif`. Nothing in the engine depends on it.
//!
//! ```rust,no_run
//! use rangefetch::progress::{ProgressDisplay, StyleOptions};
//! use rangefetch::queue::DownloadQueueBuilder;
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), rangefetch::Error> {
//! let queue = DownloadQueueBuilder::new().build()?;
//! let display = Arc::new(ProgressDisplay::new(StyleOptions::default()));
//! let listener = display.clone().attach(&queue);
//!
//! queue.submit("https://example.com/big.iso", "downloads")?;
//! queue.wait_idle().await;
//!
//! listener.abort();
//! display.finish();
//! # Ok(())
//! # }
//! ```

use super::StyleOptions;
use crate::download::Status;
use crate::queue::{DownloadEntry, DownloadQueue, EntryId};

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::debug;

/// One bar per active entry plus an overall bar of finished entries.
pub struct ProgressDisplay {
    multi: MultiProgress,
    main: ProgressBar,
    style_options: StyleOptions,
    bars: Mutex<HashMap<EntryId, ProgressBar>>,
}

impl ProgressDisplay {
    /// Create a display drawing to stderr, or nowhere if `style_options` is disabled.
    pub fn new(style_options: StyleOptions) -> Self {
        let multi = if style_options.is_enabled() {
            MultiProgress::new()
        } else {
            MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
        };
        let main = multi.add(style_options.main().to_progress_bar(0));

        Self {
            multi,
            main,
            style_options,
            bars: Mutex::new(HashMap::new()),
        }
    }

    /// The overall bar: position is the number of ended entries.
    pub fn main(&self) -> &ProgressBar {
        &self.main
    }

    /// Number of entries currently drawn.
    pub fn active_bars(&self) -> usize {
        self.bars
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Draw the state of `entries`, typically [`DownloadQueue::list_entries`].
    pub fn render(&self, entries: &[DownloadEntry]) {
        let done = entries.iter().filter(|e| e.status.is_terminal()).count();
        self.main.set_length(entries.len() as u64);
        self.main.set_position(done as u64);

        for entry in entries {
            self.render_entry(entry);
        }
    }

    /// Draw a single entry snapshot.
    pub fn render_entry(&self, entry: &DownloadEntry) {
        let mut bars = self.bars.lock().unwrap_or_else(PoisonError::into_inner);

        if entry.status.is_terminal() {
            if let Some(bar) = bars.remove(&entry.id) {
                bar.set_position(entry.bytes_downloaded);
                self.finish_child(bar, entry);
            }
            return;
        }
        if entry.status == Status::Pending {
            return;
        }

        let bar = bars.entry(entry.id).or_insert_with(|| {
            debug!(entry = %entry.id, "Adding progress bar");
            self.multi
                .add(self.style_options.child().to_progress_bar(entry.content_size))
        });
        bar.set_length(entry.content_size);
        bar.set_position(entry.bytes_downloaded);
        bar.set_message(entry.filename.clone());
    }

    fn finish_child(&self, bar: ProgressBar, entry: &DownloadEntry) {
        if entry.status == Status::Failed {
            bar.abandon_with_message(format!("{} failed", entry.filename));
        } else if self.style_options.child().clear {
            bar.finish_and_clear();
        } else {
            bar.finish_with_message(entry.filename.clone());
        }
    }

    /// Redraw on every queue event until the returned task is aborted.
    pub fn attach(self: std::sync::Arc<Self>, queue: &DownloadQueue) -> JoinHandle<()> {
        let mut receiver = queue.subscribe();
        let queue = queue.clone();
        tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(_) | Err(RecvError::Lagged(_)) => self.render(&queue.list_entries()),
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }

    /// Finish the overall bar and drop any bar still drawn.
    pub fn finish(&self) {
        let mut bars = self.bars.lock().unwrap_or_else(PoisonError::into_inner);
        for (_, bar) in bars.drain() {
            bar.finish_and_clear();
        }
        if self.style_options.main().clear {
            self.main.finish_and_clear();
        } else {
            self.main.finish();
        }
    }
}
