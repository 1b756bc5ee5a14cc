use tokio::sync::watch;

/// The engine's observable lifecycle state. `Cancelled` and `Completed` are
/// terminal: no transition leaves them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Downloading,
    Paused,
    Cancelled,
    Completed,
}

/// Broadcasts [`Phase`] transitions. Replay-latest, like [`crate::progress::ProgressPublisher`];
/// emits only on an actual change of value.
#[derive(Clone)]
pub struct StatePublisher {
    tx: watch::Sender<Phase>,
}

impl StatePublisher {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(Phase::Idle);
        Self { tx }
    }

    pub fn current(&self) -> Phase {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Phase> {
        self.tx.subscribe()
    }

    /// Transitions to `phase`, emitting only if it differs from the current
    /// value.
    pub fn transition(&self, phase: Phase) {
        if *self.tx.borrow() == phase {
            return;
        }
        tracing::debug!(?phase, "state transition");
        let _ = self.tx.send(phase);
    }
}

impl Default for StatePublisher {
    fn default() -> Self {
        Self::new()
    }
}
