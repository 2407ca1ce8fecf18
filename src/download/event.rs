//! Transfer status and progress events.
//!
//! A transfer, and each chunk of a parallel transfer, moves through
//! `Pending → Started → Running* → Finished | Failed`. Progress is reported
//! as a stream of [`TransferEvent`]s; they are observations only and are never
//! retracted.
//!
//! # Examples
//!
//! ```rust
//! use rangefetch::download::{Status, TransferEvent};
//!
//! let whole = TransferEvent::transfer(Status::Started, 0, 1024, 0.0);
//! assert!(whole.chunk_id.is_none());
//!
//! let chunk = TransferEvent::chunk(2, Status::Finished, 256, 256, 0.5);
//! assert_eq!(chunk.chunk_id, Some(2));
//! assert!(chunk.status.is_terminal());
//! ```

use std::fmt;

/// Lifecycle status of a transfer or of one of its chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Status {
    /// Queued, not admitted yet.
    #[default]
    Pending,
    /// Admitted, or announced before any data arrived.
    Started,
    /// Data is flowing.
    Running,
    /// Completed successfully.
    Finished,
    /// Completed unsuccessfully.
    Failed,
}

impl Status {
    /// `Finished` and `Failed` are never left once reached.
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Finished | Status::Failed)
    }

    /// Whether the status counts against the concurrency cap.
    pub fn is_active(self) -> bool {
        matches!(self, Status::Started | Status::Running)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Status::Pending => "PENDING",
            Status::Started => "STARTED",
            Status::Running => "RUNNING",
            Status::Finished => "FINISHED",
            Status::Failed => "FAILED",
        };
        f.write_str(name)
    }
}

/// One progress observation.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferEvent {
    /// Status of the transfer or chunk at the time of the event.
    pub status: Status,
    /// Bytes transferred so far for the transfer or chunk this event describes.
    pub bytes_this_update: u64,
    /// Expected size of the transfer or chunk.
    pub chunk_total_bytes: u64,
    /// Wall-clock seconds since the transfer or chunk started.
    pub elapsed_seconds: f64,
    /// `None` for whole-transfer events, the range index for chunk events.
    pub chunk_id: Option<usize>,
}

impl TransferEvent {
    /// Create an event describing the whole transfer.
    pub fn transfer(status: Status, bytes: u64, total: u64, elapsed_seconds: f64) -> Self {
        Self {
            status,
            bytes_this_update: bytes,
            chunk_total_bytes: total,
            elapsed_seconds,
            chunk_id: None,
        }
    }

    /// Create an event describing a single chunk.
    pub fn chunk(
        chunk_id: usize,
        status: Status,
        bytes: u64,
        total: u64,
        elapsed_seconds: f64,
    ) -> Self {
        Self {
            status,
            bytes_this_update: bytes,
            chunk_total_bytes: total,
            elapsed_seconds,
            chunk_id: Some(chunk_id),
        }
    }

    /// Whether the event describes the whole transfer.
    pub fn is_transfer_level(&self) -> bool {
        self.chunk_id.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_and_active() {
        assert!(Status::Finished.is_terminal());
        assert!(Status::Failed.is_terminal());
        assert!(!Status::Running.is_terminal());

        assert!(Status::Started.is_active());
        assert!(Status::Running.is_active());
        assert!(!Status::Pending.is_active());
        assert!(!Status::Finished.is_active());
    }

    #[test]
    fn test_status_display() {
        assert_eq!(Status::Pending.to_string(), "PENDING");
        assert_eq!(Status::Failed.to_string(), "FAILED");
        assert_eq!(Status::default(), Status::Pending);
    }

    #[test]
    fn test_event_constructors() {
        let event = TransferEvent::transfer(Status::Finished, 10, 10, 1.5);
        assert!(event.is_transfer_level());
        assert_eq!(event.bytes_this_update, 10);

        let event = TransferEvent::chunk(3, Status::Running, 4, 8, 0.25);
        assert!(!event.is_transfer_level());
        assert_eq!(event.chunk_id, Some(3));
        assert_eq!(event.chunk_total_bytes, 8);
    }
}
