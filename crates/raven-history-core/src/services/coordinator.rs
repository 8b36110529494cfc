use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::PaneHost;
use crate::config::HistoryConfig;
use crate::error::{HistoryError, HostError};
use crate::messages::{Direction, HistoryEvent};
use crate::state::{HistoryLedger, PaneKey, RendezvousGate};
use crate::store::LedgerStore;

/// Point-in-time view of the coordinator for status reporting
#[derive(Debug, Clone)]
pub struct HistorySnapshot {
    pub ledger: HistoryLedger,
    pub traversing: bool,
    pub gate_armed: bool,
}

struct CoordinatorState {
    ledger: HistoryLedger,
    gate: RendezvousGate,
    /// Traversals whose actuation is still in flight; activations are
    /// ignored while this is non-zero
    traversals: usize,
    config: HistoryConfig,
}

struct Inner<H> {
    host: H,
    state: Mutex<CoordinatorState>,
    snapshots: watch::Sender<HistoryLedger>,
}

/// Translates host events and commands into ledger operations.
///
/// Every ledger mutation happens synchronously under one lock that is never
/// held across an await. Operations that have to wait (a removal of the
/// focused window, a traversal's actuation) do their synchronous part when
/// called and hand back a future for the rest, so event order is preserved
/// even though the waiting halves run as separate tasks.
pub struct HistoryCoordinator<H> {
    inner: Arc<Inner<H>>,
}

impl<H> Clone for HistoryCoordinator<H> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

enum TraverseStep<H: PaneHost> {
    Noop,
    Reseed,
    Actuate(PaneKey, TraversalGuard<H>),
}

/// Keeps the traversing flag raised until dropped, on every exit path
struct TraversalGuard<H: PaneHost> {
    inner: Arc<Inner<H>>,
}

impl<H: PaneHost> Drop for TraversalGuard<H> {
    fn drop(&mut self) {
        let mut state = self.inner.state.lock();
        state.traversals = state.traversals.saturating_sub(1);
    }
}

impl<H: PaneHost> HistoryCoordinator<H> {
    pub fn new(host: H, ledger: HistoryLedger, config: HistoryConfig) -> Self {
        let (snapshots, _) = watch::channel(ledger.clone());
        Self {
            inner: Arc::new(Inner {
                host,
                state: Mutex::new(CoordinatorState {
                    ledger,
                    gate: RendezvousGate::new(),
                    traversals: 0,
                    config,
                }),
                snapshots,
            }),
        }
    }

    /// Restore the ledger from `store`, or seed it from the host's focused pane
    pub async fn bootstrap(host: H, store: &dyn LedgerStore, config: HistoryConfig) -> Self {
        let restored = match store.load() {
            Ok(Some(ledger)) if !ledger.is_empty() => Some(ledger),
            Ok(_) => None,
            Err(e) => {
                warn!("Discarding stored history: {}", e);
                None
            }
        };

        if let Some(ledger) = restored {
            info!("Restored {} history entries", ledger.len());
            return Self::new(host, ledger, config);
        }

        let coordinator = Self::new(host, HistoryLedger::new(), config);
        coordinator.inner.seed_from_host().await;
        coordinator
    }

    pub fn host(&self) -> &H {
        &self.inner.host
    }

    /// Ledger snapshots, published after every mutation
    pub fn subscribe(&self) -> watch::Receiver<HistoryLedger> {
        self.inner.snapshots.subscribe()
    }

    pub fn snapshot(&self) -> HistorySnapshot {
        let state = self.inner.state.lock();
        HistorySnapshot {
            ledger: state.ledger.clone(),
            traversing: state.traversals > 0,
            gate_armed: state.gate.is_armed(),
        }
    }

    pub fn ledger(&self) -> HistoryLedger {
        self.inner.state.lock().ledger.clone()
    }

    pub fn is_traversing(&self) -> bool {
        self.inner.state.lock().traversals > 0
    }

    /// Handle a pane activation.
    ///
    /// Ignored while a traversal is actuating. An activation of the key that
    /// is already present is also ignored unless a removal is waiting on it,
    /// so a repeated focus event does not truncate the future.
    pub fn record_visit(&self, key: PaneKey) {
        let mut state = self.inner.state.lock();

        if state.traversals > 0 {
            debug!("Ignoring activation of {} caused by traversal", key);
            return;
        }
        if state.ledger.is_present(key) && !state.gate.is_armed() {
            debug!("{} is already the present entry", key);
            return;
        }

        state.ledger.record_visit(key);
        let max_entries = state.config.max_entries;
        let dropped = state.ledger.truncate_past(max_entries);
        if dropped > 0 {
            debug!("Dropped {} oldest history entries", dropped);
        }

        let woken = state.gate.fulfill(key);
        if woken > 0 {
            debug!("Activation of {} released {} pending removal(s)", key, woken);
        }

        self.inner.publish(&state.ledger);
    }

    /// Handle a pane removal.
    ///
    /// If `key` is the present entry, the returned future waits for the
    /// replacement activation (bounded by `rendezvous_timeout_ms`) before
    /// removing it; otherwise the removal has already happened when this
    /// returns and the future completes immediately.
    pub fn remove_item(
        &self,
        key: PaneKey,
    ) -> impl Future<Output = Result<(), HistoryError>> + Send + 'static {
        let inner = self.inner.clone();

        let pending = {
            let mut state = inner.state.lock();
            if state.ledger.is_present(key) {
                debug!("Focused window {} removed, waiting for its replacement", key);
                Some((state.gate.arm(), state.config.rendezvous_timeout()))
            } else {
                if state.ledger.remove_all(key) > 0 {
                    debug!("Removed {} from history", key);
                    inner.publish(&state.ledger);
                }
                None
            }
        };

        async move {
            let Some((replacement, wait)) = pending else {
                return Ok(());
            };

            match tokio::time::timeout(wait, replacement).await {
                Ok(Ok(next)) => debug!("{} replaced by {}", key, next),
                Ok(Err(_)) => debug!("Rendezvous for {} was cancelled", key),
                Err(_) => {
                    {
                        let mut state = inner.state.lock();
                        state.gate.disarm();
                        state.ledger.clear();
                        inner.publish(&state.ledger);
                    }
                    let err = HistoryError::RendezvousTimeout { key, waited: wait };
                    warn!("{}", err);
                    return Err(err);
                }
            }

            let mut state = inner.state.lock();
            if state.ledger.remove_all(key) > 0 {
                debug!("Removed {} from history", key);
                inner.publish(&state.ledger);
            }
            Ok(())
        }
    }

    /// Step through history.
    ///
    /// The ledger is re-centered before this returns; the future performs the
    /// host actuation with the traversing flag raised and resolves to the new
    /// present key, or `None` if there was nothing in that direction. A failed
    /// actuation leaves the ledger re-centered.
    pub fn traverse(
        &self,
        direction: Direction,
    ) -> impl Future<Output = Result<Option<PaneKey>, HistoryError>> + Send + 'static {
        let inner = self.inner.clone();

        let step = {
            let mut state = inner.state.lock();
            if state.ledger.locate_present().is_none() {
                TraverseStep::Reseed
            } else {
                match state.ledger.recenter(direction) {
                    Some(target) => {
                        state.traversals += 1;
                        // The host's replacement activation will be swallowed
                        // by the traversal, so the new present releases any
                        // pending removal instead
                        let woken = state.gate.fulfill(target);
                        if woken > 0 {
                            debug!("Traversal to {} released {} pending removal(s)", target, woken);
                        }
                        inner.publish(&state.ledger);
                        TraverseStep::Actuate(
                            target,
                            TraversalGuard {
                                inner: inner.clone(),
                            },
                        )
                    }
                    None => TraverseStep::Noop,
                }
            }
        };

        async move {
            match step {
                TraverseStep::Noop => {
                    debug!("Nothing further {} in history", direction);
                    Ok(None)
                }
                TraverseStep::Reseed => {
                    warn!("No present history entry, seeding from the focused window");
                    inner.seed_from_host().await;
                    Ok(None)
                }
                TraverseStep::Actuate(target, guard) => {
                    debug!("Traversing {} to {}", direction, target);
                    let result = inner.actuate(target).await;
                    drop(guard);
                    result
                        .map(|()| Some(target))
                        .map_err(|source| HistoryError::Actuation {
                            key: target,
                            source,
                        })
                }
            }
        }
    }

    /// Forget all history
    pub fn clear(&self) {
        let mut state = self.inner.state.lock();
        state.gate.disarm();
        state.ledger.clear();
        self.inner.publish(&state.ledger);
        info!("History cleared");
    }

    /// Apply a reloaded config; takes effect for the next operation
    pub fn apply_config(&self, config: HistoryConfig) {
        let mut state = self.inner.state.lock();
        if state.config != config {
            info!(
                "History config updated (timeout {}ms, max {} entries)",
                config.rendezvous_timeout_ms, config.max_entries
            );
            state.config = config;
        }
    }

    /// Seed from the host if there is no present entry yet
    pub async fn seed_if_empty(&self) {
        let has_present = self.inner.state.lock().ledger.locate_present().is_some();
        if !has_present {
            self.inner.seed_from_host().await;
        }
    }

    /// Run one event. Synchronous work happens here in event order; waiting
    /// work is spawned onto the runtime.
    pub fn dispatch(&self, event: HistoryEvent) {
        match event {
            HistoryEvent::Activated(key) => self.record_visit(key),

            HistoryEvent::Removed(key) => {
                let removal = self.remove_item(key);
                tokio::spawn(async move {
                    // Timeouts are already logged
                    let _ = removal.await;
                });
            }

            HistoryEvent::Command(direction) => {
                let traversal = self.traverse(direction);
                tokio::spawn(async move {
                    if let Err(e) = traversal.await {
                        warn!("{}", e);
                    }
                });
            }

            HistoryEvent::HostConnected => {
                let coordinator = self.clone();
                tokio::spawn(async move { coordinator.seed_if_empty().await });
            }

            HistoryEvent::HostDisconnected => {
                debug!("Pane host disconnected");
            }

            HistoryEvent::ConfigReloaded(config) => self.apply_config(config),
        }
    }

    /// Dispatch events until every sender is gone
    pub async fn run(self, events: async_channel::Receiver<HistoryEvent>) {
        info!("History coordinator running");
        while let Ok(event) = events.recv().await {
            self.dispatch(event);
        }
        debug!("Event channel closed, coordinator stopping");
    }
}

impl<H: PaneHost> Inner<H> {
    fn publish(&self, ledger: &HistoryLedger) {
        self.snapshots.send_replace(ledger.clone());
    }

    async fn actuate(&self, target: PaneKey) -> Result<(), HostError> {
        self.host.focus_container(target.container_id).await?;
        self.host.activate_pane(target.pane_id).await
    }

    async fn seed_from_host(&self) {
        let current = match self.host.query_current_pane().await {
            Ok(current) => current,
            Err(e) => {
                warn!("Could not query focused window: {}", e);
                return;
            }
        };

        let mut state = self.state.lock();
        // An activation may have landed while the host was being queried
        if state.ledger.locate_present().is_some() {
            return;
        }
        match current {
            Some(key) => {
                info!("Seeding history with {}", key);
                state.ledger = HistoryLedger::seeded(key);
            }
            None => state.ledger.clear(),
        }
        self.publish(&state.ledger);
    }
}
