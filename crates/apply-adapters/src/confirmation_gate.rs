//! Confirmation Gate: a one-shot tri-state (pending/confirmed/cancelled)
//! signal a Worker awaits before submitting an application (SPEC_FULL.md
//! §4.2, §9 Redesign Flags: "cooperative gate -> one-shot tri-state signal
//! selected against timeout and cancel").
//!
//! Grounded on `examples/original_source/apply_engine/engine.py`'s
//! `threading.Event`-based `_confirmations` map, reimplemented with
//! `tokio::sync::watch` so the Worker can `select!` the gate against a
//! timeout and the Session's cancellation signal.

use tokio::sync::watch;
use tokio::time::Duration;

use apply_domain::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GateState {
    Pending,
    Confirmed,
    Cancelled,
}

/// Outcome of waiting on a `ConfirmationGate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationOutcome {
    Confirmed,
    Cancelled,
}

/// A single-use confirmation signal. Resolves exactly once, to either
/// `confirm()` or `cancel()`; subsequent calls are no-ops (idempotence per
/// SPEC_FULL.md §8's "confirmation idempotence" property).
pub struct ConfirmationGate {
    tx: watch::Sender<GateState>,
    rx: watch::Receiver<GateState>,
}

impl ConfirmationGate {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(GateState::Pending);
        Self { tx, rx }
    }

    /// Resolve the gate to confirmed. Idempotent: a gate already resolved
    /// (confirmed or cancelled) is left unchanged.
    pub fn confirm(&self) -> bool {
        self.resolve(GateState::Confirmed)
    }

    /// Resolve the gate to cancelled. Idempotent, same as `confirm`.
    pub fn cancel(&self) -> bool {
        self.resolve(GateState::Cancelled)
    }

    fn resolve(&self, target: GateState) -> bool {
        let mut resolved = false;
        self.tx.send_if_modified(|state| {
            if *state == GateState::Pending {
                *state = target;
                resolved = true;
                true
            } else {
                false
            }
        });
        resolved
    }

    /// Wait for resolution or timeout. Grounded on `_apply_browser`'s
    /// `wait_for_confirmation(timeout=300)`.
    pub async fn wait(&self, timeout: Duration) -> Result<ConfirmationOutcome, DomainError> {
        let mut rx = self.rx.clone();
        if *rx.borrow() != GateState::Pending {
            return Ok(Self::outcome_of(*rx.borrow()));
        }
        let waited = tokio::time::timeout(timeout, rx.changed()).await;
        match waited {
            Err(_) => Err(DomainError::ConfirmationTimedOut {
                seconds: timeout.as_secs(),
            }),
            Ok(Err(_)) => Err(DomainError::ConfirmationCancelled),
            Ok(Ok(())) => {
                let state = *rx.borrow();
                match state {
                    GateState::Pending => unreachable!("watch fired without a state change"),
                    GateState::Confirmed | GateState::Cancelled => Ok(Self::outcome_of(state)),
                }
            }
        }
    }

    fn outcome_of(state: GateState) -> ConfirmationOutcome {
        match state {
            GateState::Confirmed => ConfirmationOutcome::Confirmed,
            _ => ConfirmationOutcome::Cancelled,
        }
    }
}

impl Default for ConfirmationGate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn confirm_resolves_wait() {
        let gate = ConfirmationGate::new();
        gate.confirm();
        let outcome = gate.wait(Duration::from_millis(50)).await.unwrap();
        assert_eq!(outcome, ConfirmationOutcome::Confirmed);
    }

    #[tokio::test]
    async fn cancel_resolves_wait() {
        let gate = ConfirmationGate::new();
        gate.cancel();
        let outcome = gate.wait(Duration::from_millis(50)).await.unwrap();
        assert_eq!(outcome, ConfirmationOutcome::Cancelled);
    }

    #[tokio::test]
    async fn second_resolution_is_a_no_op() {
        let gate = ConfirmationGate::new();
        assert!(gate.confirm());
        assert!(!gate.cancel());
        let outcome = gate.wait(Duration::from_millis(50)).await.unwrap();
        assert_eq!(outcome, ConfirmationOutcome::Confirmed);
    }

    #[tokio::test]
    async fn unresolved_gate_times_out() {
        let gate = ConfirmationGate::new();
        let result = gate.wait(Duration::from_millis(20)).await;
        assert!(matches!(result, Err(DomainError::ConfirmationTimedOut { .. })));
    }
}
