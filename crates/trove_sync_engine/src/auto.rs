//! Background bridge from connectivity transitions to drain passes.

use crate::coordinator::SyncCoordinator;
use crate::gateway::RemoteGateway;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

/// A background thread that consumes the monitor's de-duplicated
/// connectivity transitions and triggers a drain pass on each transition to
/// connected.
///
/// Callers that own an event loop can instead call
/// [`SyncCoordinator::handle_transition`] directly and skip this thread.
///
/// The thread runs until the connectivity monitor is dropped (which closes
/// the subscription channel); in practice that is the process lifetime.
pub struct AutoSync {
    handle: JoinHandle<()>,
}

impl AutoSync {
    /// Spawns the bridge thread for the given coordinator.
    ///
    /// # Errors
    ///
    /// Returns an error if the OS refuses to spawn the thread.
    pub fn spawn<G: RemoteGateway + 'static>(
        coordinator: Arc<SyncCoordinator<G>>,
    ) -> std::io::Result<Self> {
        let transitions = coordinator.subscribe_connectivity();
        let handle = thread::Builder::new()
            .name("trove-auto-sync".into())
            .spawn(move || {
                while let Ok(state) = transitions.recv() {
                    if !state.connected {
                        debug!("connectivity lost");
                        continue;
                    }
                    debug!(transport = %state.transport, "connectivity regained, draining");
                    if let Err(err) = coordinator.trigger_sync() {
                        warn!(error = %err, "auto drain failed");
                    }
                }
            })?;

        Ok(Self { handle })
    }

    /// Returns true if the bridge thread has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SyncConfig;
    use crate::connectivity::{ConnectivityMonitor, ConnectivityState};
    use crate::coordinator::Mutation;
    use crate::gateway::MockGateway;
    use std::time::{Duration, Instant};
    use trove_core::{ItemDraft, ItemStatus, LocalStore, OfflineQueue, SyncStatus};
    use trove_storage::MemoryBackend;

    #[test]
    fn drains_on_reconnect() {
        let backend = Arc::new(MemoryBackend::new());
        let store = Arc::new(LocalStore::open(Arc::clone(&backend) as _).unwrap());
        let queue = Arc::new(OfflineQueue::open(backend).unwrap());
        let monitor = Arc::new(ConnectivityMonitor::new(ConnectivityState::offline()));
        let coordinator = Arc::new(SyncCoordinator::new(
            SyncConfig::new(),
            store,
            queue,
            MockGateway::new(),
            Arc::clone(&monitor),
        ));

        let _bridge = AutoSync::spawn(Arc::clone(&coordinator)).unwrap();

        let draft = ItemDraft::new("Wallet", "desc", ItemStatus::Lost, "Library", 7);
        coordinator.mutate(Mutation::Create(draft)).unwrap();
        assert_eq!(coordinator.queue().len(), 1);

        monitor.update(ConnectivityState::online("wifi"));

        // The bridge thread drains asynchronously; wait for it
        let deadline = Instant::now() + Duration::from_secs(5);
        while !coordinator.queue().is_empty() {
            assert!(Instant::now() < deadline, "drain did not happen in time");
            thread::sleep(Duration::from_millis(10));
        }

        let items = coordinator.items().unwrap();
        assert_eq!(items[0].sync_status, SyncStatus::Synced);
        assert_eq!(items[0].id, 501);
    }
}
