//! Queue-owned download records.

use crate::download::{ResourceDescriptor, Status, TransferEvent};

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Identifier of a queued download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryId(pub u64);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Progress of one chunk of a parallel transfer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChunkState {
    /// Chunk status.
    pub status: Status,
    /// Bytes written for this chunk so far.
    pub bytes_downloaded: u64,
    /// Length of the chunk's range.
    pub total_bytes: u64,
    /// Seconds since the chunk started.
    pub elapsed_seconds: f64,
}

/// A download tracked by the queue.
///
/// Instances handed out by the queue are snapshots; the live record is only
/// mutated through [`DownloadQueue::on_event`](super::DownloadQueue::on_event).
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadEntry {
    /// Queue-assigned identifier.
    pub id: EntryId,
    /// URL of the resource.
    pub url: String,
    /// Resolved file name; derived from the URL until the probe completes.
    pub filename: String,
    /// Directory the file is written to.
    pub output_dir: PathBuf,
    /// `output_dir` joined with `filename`.
    pub output_path: PathBuf,
    /// Whether the server advertised range support.
    pub accepts_ranges: bool,
    /// Transfer status.
    pub status: Status,
    /// Size of the resource, `0` if unknown.
    pub content_size: u64,
    /// Bytes downloaded so far, aggregated over chunks when there are any.
    pub bytes_downloaded: u64,
    /// Seconds since the transfer started.
    pub elapsed_seconds: f64,
    /// Per-chunk progress, keyed by range index.
    pub chunks: BTreeMap<usize, ChunkState>,
}

impl DownloadEntry {
    pub(crate) fn new(id: EntryId, url: String, filename: String, output_dir: PathBuf) -> Self {
        let output_path = output_dir.join(&filename);
        Self {
            id,
            url,
            filename,
            output_dir,
            output_path,
            accepts_ranges: false,
            status: Status::Pending,
            content_size: 0,
            bytes_downloaded: 0,
            elapsed_seconds: 0.0,
            chunks: BTreeMap::new(),
        }
    }

    /// Fraction of the resource downloaded, if the size is known.
    pub fn progress(&self) -> Option<f64> {
        (self.content_size > 0).then(|| self.bytes_downloaded as f64 / self.content_size as f64)
    }

    /// Record the result of the resource probe.
    pub(crate) fn apply_resource(&mut self, resource: &ResourceDescriptor) {
        self.filename = resource.filename.clone();
        self.output_path = self.output_dir.join(&self.filename);
        self.accepts_ranges = resource.accepts_ranges;
        self.content_size = resource.content_size;
    }

    /// Fold one event into the record.
    ///
    /// Terminal statuses are sticky for both the transfer and its chunks.
    /// Returns `true` if the transfer-level status became terminal with this
    /// event.
    pub(crate) fn apply(&mut self, event: &TransferEvent) -> bool {
        let mut became_terminal = false;

        match event.chunk_id {
            Some(chunk_id) => {
                let chunk = self.chunks.entry(chunk_id).or_default();
                if !chunk.status.is_terminal() {
                    chunk.status = event.status;
                    chunk.bytes_downloaded = event.bytes_this_update;
                    chunk.total_bytes = event.chunk_total_bytes;
                    chunk.elapsed_seconds = event.elapsed_seconds;
                }
                if event.status == Status::Running && self.status == Status::Started {
                    self.status = Status::Running;
                }
            }
            None => {
                if !self.status.is_terminal() {
                    self.status = event.status;
                    self.elapsed_seconds = event.elapsed_seconds;
                    became_terminal = event.status.is_terminal();
                    if self.chunks.is_empty() {
                        self.bytes_downloaded = event.bytes_this_update;
                    }
                    if self.content_size == 0 && event.status == Status::Finished {
                        self.content_size = event.chunk_total_bytes;
                    }
                }
            }
        }

        if !self.chunks.is_empty() {
            self.bytes_downloaded = self.chunks.values().map(|c| c.bytes_downloaded).sum();
        }

        became_terminal
    }
}
