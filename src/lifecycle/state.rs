//! Server lifecycle state machine.
//!
//! ```text
//! Starting ──bind ok──▶ Serving ──signal──▶ ShuttingDown ──drained/deadline──▶ Stopped
//! ```
//!
//! `Starting` may also go straight to `Stopped` when startup fails, and
//! `Serving` when the listener dies. Nothing leaves `Stopped`.

use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Starting,
    Serving,
    ShuttingDown,
    Stopped,
}

impl LifecycleState {
    pub fn can_transition_to(self, next: LifecycleState) -> bool {
        use LifecycleState::*;
        matches!(
            (self, next),
            (Starting, Serving)
                | (Serving, ShuttingDown)
                | (ShuttingDown, Stopped)
                | (Starting, Stopped)
                | (Serving, Stopped)
        )
    }
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LifecycleState::Starting => "starting",
            LifecycleState::Serving => "serving",
            LifecycleState::ShuttingDown => "shutting_down",
            LifecycleState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("illegal lifecycle transition {from} -> {to}")]
pub struct TransitionError {
    pub from: LifecycleState,
    pub to: LifecycleState,
}

/// Owner of the process lifecycle state. Observers get a `watch` receiver.
#[derive(Debug)]
pub struct StateHandle {
    tx: watch::Sender<LifecycleState>,
}

impl StateHandle {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(LifecycleState::Starting);
        Self { tx }
    }

    pub fn current(&self) -> LifecycleState {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.tx.subscribe()
    }

    /// Move to `next`, rejecting transitions the state machine does not allow.
    pub fn advance(&self, next: LifecycleState) -> Result<(), TransitionError> {
        let mut result = Ok(());
        self.tx.send_if_modified(|state| {
            if state.can_transition_to(next) {
                tracing::debug!(from = %state, to = %next, "Lifecycle transition");
                *state = next;
                true
            } else {
                result = Err(TransitionError { from: *state, to: next });
                false
            }
        });
        result
    }
}

impl Default for StateHandle {
    fn default() -> Self {
        Self::new()
    }
}
