//! Process-wide connectivity state with de-duplicated change notifications.
//!
//! The monitor caches the platform's last-known network state and answers
//! reads synchronously - it never blocks on a live probe. Platform glue
//! feeds raw network events into [`ConnectivityMonitor::update`]; the
//! monitor de-duplicates them so subscribers see exactly one message per
//! connected/disconnected transition, and the coordinator never needs its
//! own debounce.

use parking_lot::RwLock;
use std::sync::mpsc::{self, Receiver, Sender};
use tracing::debug;

/// The cached connectivity state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectivityState {
    /// Whether the device currently has a usable network path.
    pub connected: bool,
    /// Transport-type tag reported by the platform ("wifi", "cellular", ...).
    pub transport: String,
}

impl ConnectivityState {
    /// A connected state over the given transport.
    #[must_use]
    pub fn online(transport: impl Into<String>) -> Self {
        Self {
            connected: true,
            transport: transport.into(),
        }
    }

    /// A disconnected state.
    #[must_use]
    pub fn offline() -> Self {
        Self {
            connected: false,
            transport: "none".into(),
        }
    }
}

/// Process-wide signal of online/offline state.
///
/// Initialized with the result of an immediate probe at process start
/// (performed by platform glue, not the monitor), then updated continuously
/// for the process lifetime. Reads are answered from the cached state.
pub struct ConnectivityMonitor {
    state: RwLock<ConnectivityState>,
    subscribers: RwLock<Vec<Sender<ConnectivityState>>>,
}

impl ConnectivityMonitor {
    /// Creates a monitor with the given initial (probed) state.
    #[must_use]
    pub fn new(initial: ConnectivityState) -> Self {
        Self {
            state: RwLock::new(initial),
            subscribers: RwLock::new(Vec::new()),
        }
    }

    /// Returns the last-known state. Never blocks on a live probe.
    #[must_use]
    pub fn current(&self) -> ConnectivityState {
        self.state.read().clone()
    }

    /// Subscribes to state transitions.
    ///
    /// The receiver gets exactly one message per connected/disconnected
    /// transition - repeated platform events that leave the boolean state
    /// unchanged are not delivered.
    pub fn subscribe(&self) -> Receiver<ConnectivityState> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.write().push(tx);
        rx
    }

    /// Feeds a raw platform network event into the monitor.
    ///
    /// The cached state is always refreshed (so transport-tag changes are
    /// visible to [`current`](Self::current)), but subscribers are notified
    /// only when the `connected` flag flips. Returns whether a transition
    /// occurred.
    pub fn update(&self, state: ConnectivityState) -> bool {
        let transitioned = {
            let mut cached = self.state.write();
            let transitioned = cached.connected != state.connected;
            *cached = state.clone();
            transitioned
        };

        if transitioned {
            debug!(
                connected = state.connected,
                transport = %state.transport,
                "connectivity transition"
            );
            self.subscribers
                .write()
                .retain(|tx| tx.send(state.clone()).is_ok());
        }
        transitioned
    }

    /// Number of live subscribers (diagnostics).
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }
}
