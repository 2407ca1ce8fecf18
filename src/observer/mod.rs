//! Progress observer protocol.
//!
//! Transfers never return progress; they emit [`TransferEvent`]s to whatever
//! observers are registered on their [`EventEmitter`]. Observers run on the
//! task that produced the event. For a parallel transfer that means several
//! chunk tasks may call the same observer at once, so observers must be
//! internally synchronized.
//!
//! # Examples
//!
//! ```rust
//! use rangefetch::download::{Status, TransferEvent};
//! use rangefetch::observer::EventEmitter;
//! use std::sync::atomic::{AtomicU64, Ordering};
//! use std::sync::Arc;
//!
//! let received = Arc::new(AtomicU64::new(0));
//! let counter = received.clone();
//!
//! let emitter = EventEmitter::new();
//! let id = emitter.add_observer(Arc::new(move |event: &TransferEvent| {
//!     counter.store(event.bytes_this_update, Ordering::SeqCst);
//! }));
//!
//! emitter.emit(&TransferEvent::transfer(Status::Running, 512, 1024, 0.1));
//! assert_eq!(received.load(Ordering::SeqCst), 512);
//! emitter.remove_observer(id);
//! ```

pub mod emitter;
pub mod logging;

pub use emitter::{EventEmitter, ObserverId};
pub use logging::TracingObserver;

use crate::download::TransferEvent;
use std::sync::Arc;

/// A listener for transfer events.
///
/// The return value of a notification is never consulted: observers cannot
/// influence the transfer.
pub trait TransferObserver: Send + Sync {
    /// Called once for every event emitted by the observed transfer.
    fn on_update(&self, event: &TransferEvent);
}

impl<F> TransferObserver for F
where
    F: Fn(&TransferEvent) + Send + Sync,
{
    fn on_update(&self, event: &TransferEvent) {
        self(event)
    }
}

/// Something that produces transfer events.
pub trait EventSource {
    /// The emitter events are published on.
    fn emitter(&self) -> &EventEmitter;

    /// Register an observer.
    fn add_observer(&self, observer: Arc<dyn TransferObserver>) -> ObserverId {
        self.emitter().add_observer(observer)
    }

    /// Unregister an observer.
    fn remove_observer(&self, id: ObserverId) -> bool {
        self.emitter().remove_observer(id)
    }

    /// Notify every registered observer.
    fn emit(&self, event: &TransferEvent) {
        self.emitter().emit(event)
    }
}
