//! Signals announcing form display changes.
//!
//! A [`Signal<Args>`] keeps a list of listeners and calls each of them, in
//! connection order, when the signal is emitted. Forms use signals to tell the
//! renderer that a widget's displayed text changed or that an edit was
//! rejected.
//!
//! Listeners run on the emitting thread. The list is copied before the calls,
//! so a listener may connect or disconnect listeners on the same signal.
//!
//! ```
//! use horizon_forms_core::Signal;
//!
//! let restored = Signal::<String>::new();
//! let id = restored.connect(|text| println!("widget shows {text:?} again"));
//!
//! restored.emit("20".to_string());
//! assert!(restored.disconnect(id));
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use slotmap::{SlotMap, new_key_type};

use crate::logging::targets;

new_key_type! {
    /// Handle returned by [`Signal::connect`].
    pub struct ConnectionId;
}

type Listener<Args> = Arc<dyn Fn(&Args) + Send + Sync>;

/// Listeners tagged with a connection sequence number. Slot keys are reused
/// after a disconnect, so the sequence number is what orders calls.
struct Listeners<Args> {
    slots: SlotMap<ConnectionId, (u64, Listener<Args>)>,
    next_seq: u64,
}

/// A list of listeners for one kind of announcement.
pub struct Signal<Args> {
    listeners: Mutex<Listeners<Args>>,
    muted: AtomicBool,
}

impl<Args> Default for Signal<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args> Signal<Args> {
    pub fn new() -> Self {
        Self {
            listeners: Mutex::new(Listeners {
                slots: SlotMap::with_key(),
                next_seq: 0,
            }),
            muted: AtomicBool::new(false),
        }
    }

    /// Adds a listener.
    pub fn connect<F>(&self, listener: F) -> ConnectionId
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        let mut listeners = self.listeners.lock();
        let seq = listeners.next_seq;
        listeners.next_seq += 1;
        listeners.slots.insert((seq, Arc::new(listener)))
    }

    /// Removes a listener. Returns `false` if `id` was not connected.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        self.listeners.lock().slots.remove(id).is_some()
    }

    pub fn disconnect_all(&self) {
        self.listeners.lock().slots.clear();
    }

    pub fn connection_count(&self) -> usize {
        self.listeners.lock().slots.len()
    }

    /// While blocked, [`emit`](Self::emit) does nothing.
    pub fn set_blocked(&self, blocked: bool) {
        self.muted.store(blocked, Ordering::Release);
    }

    pub fn is_blocked(&self) -> bool {
        self.muted.load(Ordering::Acquire)
    }

    /// Calls every listener with `args`.
    #[tracing::instrument(skip_all, target = "horizon_forms_core::signal", level = "trace")]
    pub fn emit(&self, args: Args) {
        if self.is_blocked() {
            tracing::trace!(target: targets::SIGNAL, "blocked");
            return;
        }

        let mut listeners: Vec<(u64, Listener<Args>)> =
            self.listeners.lock().slots.values().cloned().collect();
        listeners.sort_unstable_by_key(|(seq, _)| *seq);
        tracing::trace!(target: targets::SIGNAL, listeners = listeners.len(), "emit");
        for (_, listener) in &listeners {
            listener(&args);
        }
    }
}

impl<Args> fmt::Debug for Signal<Args> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("listeners", &self.connection_count())
            .field("blocked", &self.is_blocked())
            .finish()
    }
}

static_assertions::assert_impl_all!(Signal<String>: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder<T: Clone + Send + 'static>(signal: &Signal<T>) -> Arc<Mutex<Vec<T>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        signal.connect(move |value: &T| sink.lock().push(value.clone()));
        seen
    }

    #[test]
    fn test_listeners_receive_in_order() {
        let signal = Signal::<&'static str>::new();
        let seen = recorder(&signal);

        signal.emit("20");
        signal.emit("21");
        assert_eq!(*seen.lock(), vec!["20", "21"]);
    }

    #[test]
    fn test_disconnected_listener_is_silent() {
        let signal = Signal::<u32>::new();
        let seen = recorder(&signal);
        let late = Arc::new(Mutex::new(0));
        let counter = late.clone();
        let id = signal.connect(move |_| *counter.lock() += 1);

        signal.emit(1);
        assert!(signal.disconnect(id));
        assert!(!signal.disconnect(id));
        signal.emit(2);

        assert_eq!(*seen.lock(), vec![1, 2]);
        assert_eq!(*late.lock(), 1);
    }

    #[test]
    fn test_blocked_signal_drops_emits() {
        let signal = Signal::<u32>::new();
        let seen = recorder(&signal);

        signal.set_blocked(true);
        signal.emit(7);
        assert!(seen.lock().is_empty());

        signal.set_blocked(false);
        signal.emit(8);
        assert_eq!(*seen.lock(), vec![8]);
    }

    #[test]
    fn test_listener_may_connect_during_emit() {
        let signal = Arc::new(Signal::<u8>::new());
        let inner = signal.clone();
        signal.connect(move |_| {
            inner.connect(|_| {});
        });

        signal.emit(0);
        assert_eq!(signal.connection_count(), 2);

        signal.disconnect_all();
        assert_eq!(signal.connection_count(), 0);
    }

    #[test]
    fn test_reconnected_listener_runs_last() {
        let signal = Signal::<()>::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        let connect = |name: &'static str| {
            let order = order.clone();
            signal.connect(move |_| order.lock().push(name))
        };

        let first = connect("first");
        connect("second");
        assert!(signal.disconnect(first));
        connect("third");

        signal.emit(());
        assert_eq!(*order.lock(), vec!["second", "third"]);
    }
}
