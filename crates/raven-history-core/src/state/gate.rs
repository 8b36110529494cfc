use smallvec::SmallVec;
use tokio::sync::oneshot;

use super::PaneKey;

/// One-shot signal between the removal of the present pane and the
/// activation the host emits to replace it.
///
/// There is only ever one gate. A removal that arrives while it is armed
/// joins the existing gate instead of creating a second one, and a single
/// fulfillment wakes every waiter.
#[derive(Debug, Default)]
pub struct RendezvousGate {
    waiters: SmallVec<[oneshot::Sender<PaneKey>; 1]>,
}

impl RendezvousGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the gate (or join it if already armed) and get a receiver that
    /// resolves with the key of the replacement activation
    pub fn arm(&mut self) -> oneshot::Receiver<PaneKey> {
        let (tx, rx) = oneshot::channel();
        self.waiters.push(tx);
        rx
    }

    /// Whether anyone is still waiting on the gate
    pub fn is_armed(&self) -> bool {
        self.waiters.iter().any(|tx| !tx.is_closed())
    }

    /// Release every waiter with `key` and clear the gate.
    ///
    /// Returns the number of waiters that were still listening.
    pub fn fulfill(&mut self, key: PaneKey) -> usize {
        self.waiters
            .drain(..)
            .filter_map(|tx| tx.send(key).ok())
            .count()
    }

    /// Drop every waiter without a key; their receivers observe cancellation
    pub fn disarm(&mut self) {
        self.waiters.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: PaneKey = PaneKey { pane_id: 7, container_id: 1 };

    #[test]
    fn fulfill_wakes_all_waiters_once() {
        let mut gate = RendezvousGate::new();
        assert!(!gate.is_armed());

        let mut first = gate.arm();
        let mut second = gate.arm();
        assert!(gate.is_armed());

        assert_eq!(gate.fulfill(KEY), 2);
        assert!(!gate.is_armed());
        assert_eq!(first.try_recv(), Ok(KEY));
        assert_eq!(second.try_recv(), Ok(KEY));

        // Nothing left to fulfill
        assert_eq!(gate.fulfill(KEY), 0);
    }

    #[test]
    fn dropped_receivers_do_not_keep_gate_armed() {
        let mut gate = RendezvousGate::new();
        let rx = gate.arm();
        drop(rx);
        assert!(!gate.is_armed());
        assert_eq!(gate.fulfill(KEY), 0);
    }

    #[test]
    fn disarm_cancels_waiters() {
        let mut gate = RendezvousGate::new();
        let mut rx = gate.arm();
        gate.disarm();
        assert!(!gate.is_armed());
        assert!(matches!(
            rx.try_recv(),
            Err(oneshot::error::TryRecvError::Closed)
        ));
    }
}
