//! An observer that writes every event to the `tracing` subscriber.

use super::TransferObserver;
use crate::download::{Status, TransferEvent};

use tracing::{debug, info, warn};

/// Logs transfer events, tagged with a label identifying the transfer.
///
/// Progress (`Running`) is logged at debug level, lifecycle changes at info
/// level and failures as warnings.
#[derive(Debug, Clone)]
pub struct TracingObserver {
    label: String,
}

impl TracingObserver {
    /// Create an observer that tags its log lines with `label`.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }

    /// Label attached to every log line.
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl TransferObserver for TracingObserver {
    fn on_update(&self, event: &TransferEvent) {
        let label = self.label.as_str();
        let bytes = event.bytes_this_update;
        let total = event.chunk_total_bytes;
        let elapsed = event.elapsed_seconds;
        match event.status {
            Status::Running => {
                debug!(label, chunk_id = ?event.chunk_id, bytes, total, elapsed, "transfer progress")
            }
            Status::Failed => {
                warn!(label, chunk_id = ?event.chunk_id, bytes, total, elapsed, "transfer failed")
            }
            status => {
                info!(label, chunk_id = ?event.chunk_id, %status, bytes, total, elapsed, "transfer status")
            }
        }
    }
}
