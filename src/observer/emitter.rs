//! Thread-safe observer registry.

use super::TransferObserver;
use crate::download::TransferEvent;

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::warn;

/// Handle returned by [`EventEmitter::add_observer`], used to remove it again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

type Registry = Vec<(ObserverId, Arc<dyn TransferObserver>)>;

/// Fans events out to every registered observer.
///
/// Cloning an emitter yields a handle on the same registry, so chunk tasks
/// can each hold one and emit concurrently.
#[derive(Clone, Default)]
pub struct EventEmitter {
    observers: Arc<RwLock<Registry>>,
    next_id: Arc<AtomicU64>,
}

impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter")
            .field("observers", &self.len())
            .finish()
    }
}

impl EventEmitter {
    /// Create an emitter without observers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer. Observers are notified in registration order.
    pub fn add_observer(&self, observer: Arc<dyn TransferObserver>) -> ObserverId {
        let id = ObserverId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, observer));
        id
    }

    /// Unregister an observer. Returns `false` if it was not registered.
    pub fn remove_observer(&self, id: ObserverId) -> bool {
        let mut observers = self
            .observers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = observers.len();
        observers.retain(|(registered, _)| *registered != id);
        observers.len() != before
    }

    /// Number of registered observers.
    pub fn len(&self) -> usize {
        self.observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no observer is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Notify every observer synchronously, on the calling task.
    ///
    /// The registry is snapshotted first, so observers may add or remove
    /// observers from inside a callback. A panicking observer is logged and
    /// skipped; it never aborts the transfer emitting the event.
    pub fn emit(&self, event: &TransferEvent) {
        let snapshot: Vec<_> = self
            .observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect();

        for observer in snapshot {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| observer.on_update(event)));
            if outcome.is_err() {
                warn!(status = %event.status, chunk_id = ?event.chunk_id, "Observer panicked while handling an event");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::Status;
    use std::sync::Mutex;

    fn recorder(log: &Arc<Mutex<Vec<String>>>, name: &'static str) -> Arc<dyn TransferObserver> {
        let log = Arc::clone(log);
        Arc::new(move |event: &TransferEvent| {
            log.lock().unwrap().push(format!("{}:{}", name, event.status));
        })
    }

    #[test]
    fn test_emit_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let emitter = EventEmitter::new();
        emitter.add_observer(recorder(&log, "a"));
        emitter.add_observer(recorder(&log, "b"));

        emitter.emit(&TransferEvent::transfer(Status::Started, 0, 1, 0.0));

        assert_eq!(*log.lock().unwrap(), vec!["a:STARTED", "b:STARTED"]);
    }

    #[test]
    fn test_remove_observer() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let emitter = EventEmitter::new();
        let a = emitter.add_observer(recorder(&log, "a"));
        emitter.add_observer(recorder(&log, "b"));

        assert!(emitter.remove_observer(a));
        assert!(!emitter.remove_observer(a));
        assert_eq!(emitter.len(), 1);

        emitter.emit(&TransferEvent::transfer(Status::Finished, 1, 1, 0.1));
        assert_eq!(*log.lock().unwrap(), vec!["b:FINISHED"]);
    }

    #[test]
    fn test_panicking_observer_is_isolated() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let emitter = EventEmitter::new();
        emitter.add_observer(Arc::new(|_: &TransferEvent| panic!("observer bug")));
        emitter.add_observer(recorder(&log, "ok"));

        emitter.emit(&TransferEvent::transfer(Status::Running, 5, 10, 0.1));
        emitter.emit(&TransferEvent::transfer(Status::Finished, 10, 10, 0.2));

        assert_eq!(*log.lock().unwrap(), vec!["ok:RUNNING", "ok:FINISHED"]);
    }

    #[test]
    fn test_clones_share_registry() {
        let emitter = EventEmitter::new();
        let clone = emitter.clone();
        clone.add_observer(Arc::new(|_: &TransferEvent| {}));
        assert_eq!(emitter.len(), 1);
        assert!(!emitter.is_empty());
    }
}
