use tokio::sync::watch;

/// The last control signal observed by the engine.
///
/// Valid transitions are `None -> Pause`, `Pause -> Resume`, and any state
/// to `Cancel`. Once `Cancel` is latched, further `pause`/`resume` calls are
/// silently ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    None,
    Pause,
    Resume,
    Cancel,
}

/// Carries pause/resume/cancel signals from any caller into the engine.
///
/// Cheap to clone and safe to share: mutation goes through a
/// [`tokio::sync::watch`] sender, so observers never block and a late
/// subscriber immediately sees the latched value.
#[derive(Clone)]
pub struct ControlToken {
    tx: watch::Sender<ControlEvent>,
}

impl ControlToken {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(ControlEvent::None);
        Self { tx }
    }

    pub fn pause(&self) {
        self.latch(ControlEvent::Pause);
    }

    pub fn resume(&self) {
        if *self.tx.borrow() == ControlEvent::Pause {
            self.latch(ControlEvent::Resume);
        }
    }

    pub fn cancel(&self) {
        self.latch(ControlEvent::Cancel);
    }

    pub fn current(&self) -> ControlEvent {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ControlEvent> {
        self.tx.subscribe()
    }

    fn latch(&self, event: ControlEvent) {
        if *self.tx.borrow() == ControlEvent::Cancel {
            return;
        }
        let _ = self.tx.send(event);
    }
}

impl Default for ControlToken {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pause_then_resume_round_trips() {
        let token = ControlToken::new();
        assert_eq!(token.current(), ControlEvent::None);

        token.pause();
        assert_eq!(token.current(), ControlEvent::Pause);

        token.resume();
        assert_eq!(token.current(), ControlEvent::Resume);
    }

    #[test]
    fn resume_is_ignored_unless_currently_paused() {
        let token = ControlToken::new();
        token.resume();
        assert_eq!(token.current(), ControlEvent::None);
    }

    #[test]
    fn cancel_latches_and_blocks_further_signals() {
        let token = ControlToken::new();
        token.pause();
        token.cancel();
        assert_eq!(token.current(), ControlEvent::Cancel);

        token.resume();
        token.pause();
        assert_eq!(token.current(), ControlEvent::Cancel);
    }

    #[test]
    fn idempotent_cancel() {
        let token = ControlToken::new();
        token.cancel();
        token.cancel();
        assert_eq!(token.current(), ControlEvent::Cancel);
    }

    #[test]
    fn late_subscriber_replays_latest_value() {
        let token = ControlToken::new();
        token.pause();

        let rx = token.subscribe();
        assert_eq!(*rx.borrow(), ControlEvent::Pause);
    }
}
