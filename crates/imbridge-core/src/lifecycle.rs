use std::fmt;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;

/// How the native unit terminated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitStatus {
    Clean,
    Failed(String),
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitStatus::Clean => write!(f, "clean exit"),
            ExitStatus::Failed(detail) => write!(f, "failed: {detail}"),
        }
    }
}

/// Process-wide state of the native unit. `Exited` is terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitState {
    NotStarted,
    Running,
    Exited(ExitStatus),
}

/// Tracks whether the native unit can accept calls.
///
/// State lives in a `watch` channel so that the transition to `Exited` is
/// pushed to every waiter instead of being polled. Transitions are made with
/// `send_if_modified`, which is atomic with respect to readers: once a reader
/// has seen `Exited` no later reader can see `Running`.
pub struct LifecycleGuard {
    state: watch::Sender<UnitState>,
}

impl LifecycleGuard {
    pub fn new() -> Self {
        let (state, _) = watch::channel(UnitState::NotStarted);
        Self { state }
    }

    pub fn state(&self) -> UnitState {
        self.state.borrow().clone()
    }

    pub fn is_ready(&self) -> bool {
        matches!(*self.state.borrow(), UnitState::Running)
    }

    /// `NotStarted -> Running`. Returns false if the unit already ran or exited.
    pub fn mark_running(&self) -> bool {
        self.state.send_if_modified(|state| {
            if *state == UnitState::NotStarted {
                *state = UnitState::Running;
                true
            } else {
                false
            }
        })
    }

    /// Move to `Exited`. Returns false if the unit had already exited, in
    /// which case the first recorded status is kept.
    pub fn mark_exited(&self, status: ExitStatus) -> bool {
        self.state.send_if_modified(move |state| {
            if matches!(state, UnitState::Exited(_)) {
                false
            } else {
                *state = UnitState::Exited(status);
                true
            }
        })
    }

    /// One-shot notification that resolves once the unit has exited.
    ///
    /// The subscription is taken when this is called, not when the future is
    /// first polled, so an exit that lands in between is never missed.
    pub fn observe_exit(&self) -> impl Future<Output = ExitStatus> + Send + 'static {
        let mut rx = self.state.subscribe();
        async move {
            loop {
                let exited = match &*rx.borrow_and_update() {
                    UnitState::Exited(status) => Some(status.clone()),
                    _ => None,
                };
                if let Some(status) = exited {
                    return status;
                }
                if rx.changed().await.is_err() {
                    return ExitStatus::Failed("lifecycle guard dropped".into());
                }
            }
        }
    }
}

impl Default for LifecycleGuard {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle the native unit uses to report its own termination.
#[derive(Clone)]
pub struct ExitSignal {
    guard: Arc<LifecycleGuard>,
}

impl ExitSignal {
    pub fn new(guard: Arc<LifecycleGuard>) -> Self {
        Self { guard }
    }

    pub fn signal(&self, status: ExitStatus) {
        if self.guard.mark_exited(status.clone()) {
            tracing::info!(status = %status, "Native unit signalled exit");
        }
    }

    pub fn has_exited(&self) -> bool {
        matches!(self.guard.state(), UnitState::Exited(_))
    }
}

impl fmt::Debug for ExitSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExitSignal")
            .field("state", &self.guard.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn starts_not_ready() {
        let guard = LifecycleGuard::new();
        assert_eq!(guard.state(), UnitState::NotStarted);
        assert!(!guard.is_ready());
    }

    #[test]
    fn running_then_exited_is_terminal() {
        let guard = LifecycleGuard::new();
        assert!(guard.mark_running());
        assert!(guard.is_ready());

        assert!(guard.mark_exited(ExitStatus::Failed("trap".into())));
        assert!(!guard.is_ready());

        // No way back, and the first exit status wins.
        assert!(!guard.mark_running());
        assert!(!guard.mark_exited(ExitStatus::Clean));
        assert_eq!(guard.state(), UnitState::Exited(ExitStatus::Failed("trap".into())));
    }

    #[test]
    fn exit_before_start_skips_running() {
        let guard = LifecycleGuard::new();
        assert!(guard.mark_exited(ExitStatus::Clean));
        assert!(!guard.mark_running());
        assert!(!guard.is_ready());
    }

    #[tokio::test]
    async fn observe_exit_resolves_on_transition() {
        let guard = Arc::new(LifecycleGuard::new());
        guard.mark_running();

        let waiter = tokio::spawn(guard.observe_exit());
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!waiter.is_finished());

        ExitSignal::new(Arc::clone(&guard)).signal(ExitStatus::Clean);
        assert_eq!(waiter.await.unwrap(), ExitStatus::Clean);
    }

    #[tokio::test]
    async fn observe_exit_after_exit_resolves_immediately() {
        let guard = LifecycleGuard::new();
        guard.mark_exited(ExitStatus::Failed("boom".into()));
        assert_eq!(guard.observe_exit().await, ExitStatus::Failed("boom".into()));
    }

    #[tokio::test]
    async fn exit_between_subscribe_and_poll_is_seen() {
        let guard = LifecycleGuard::new();
        guard.mark_running();
        let pending = guard.observe_exit();
        guard.mark_exited(ExitStatus::Clean);
        assert_eq!(pending.await, ExitStatus::Clean);
    }
}
