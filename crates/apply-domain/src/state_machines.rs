//! The Session state machine. §3 / §5 of SPEC_FULL.md.

use crate::errors::DomainError;

/// Lifecycle state of a Session. The `ConfirmGate` below tracks the
/// finer-grained tri-state resolution; this tracks the Session as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Worker launched, has not yet reached a confirmation gate (or the
    /// flow requires none).
    Active,
    /// Worker is blocked on the Confirmation Gate.
    AwaitingConfirm,
    /// Gate resolved to `confirmed`; Worker is proceeding to submit.
    Confirmed,
    /// Gate resolved to `cancelled`, or cancellation was requested directly.
    Cancelled,
    /// Terminal: the `done` event has been enqueued. The Session is
    /// eligible for removal from the Registry.
    Done,
}

#[derive(Debug, Clone, Copy)]
pub enum SessionTransition {
    EnterAwaitingConfirm,
    Confirm,
    Cancel,
    Finish,
}

pub struct SessionStateMachine;

impl SessionStateMachine {
    /// Validate and compute the next state for a Session transition.
    pub fn transition(
        current: SessionState,
        event: SessionTransition,
    ) -> Result<SessionState, DomainError> {
        use SessionState::*;
        use SessionTransition::*;

        match (current, event) {
            (Active, EnterAwaitingConfirm) => Ok(AwaitingConfirm),
            (AwaitingConfirm, Confirm) => Ok(Confirmed),
            (AwaitingConfirm, Cancel) => Ok(Cancelled),
            // Cancellation is observable from any non-terminal state, not
            // only while parked at the gate (§5: "A Worker executing
            // adapter I/O checks cancellation at well-defined checkpoints").
            (Active, Cancel) | (Confirmed, Cancel) => Ok(Cancelled),
            // `done` is reachable from any non-terminal state: the
            // finally-equivalent path always emits exactly one `done`.
            (Active, Finish)
            | (AwaitingConfirm, Finish)
            | (Confirmed, Finish)
            | (Cancelled, Finish) => Ok(Done),

            (state, transition) => Err(DomainError::InvalidTransition {
                current_state: format!("{state:?}"),
                attempted_transition: format!("{transition:?}"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use SessionState::*;
    use SessionTransition::*;

    #[test]
    fn happy_path_sequence() {
        let s = SessionStateMachine::transition(Active, EnterAwaitingConfirm).unwrap();
        assert_eq!(s, AwaitingConfirm);
        let s = SessionStateMachine::transition(s, Confirm).unwrap();
        assert_eq!(s, Confirmed);
        let s = SessionStateMachine::transition(s, Finish).unwrap();
        assert_eq!(s, Done);
    }

    #[test]
    fn cancel_from_active_without_gate() {
        let s = SessionStateMachine::transition(Active, Cancel).unwrap();
        assert_eq!(s, Cancelled);
        let s = SessionStateMachine::transition(s, Finish).unwrap();
        assert_eq!(s, Done);
    }

    #[test]
    fn done_is_terminal_no_further_transitions() {
        let s = SessionStateMachine::transition(Active, Finish).unwrap();
        assert_eq!(s, Done);
        assert!(SessionStateMachine::transition(s, Confirm).is_err());
        assert!(SessionStateMachine::transition(s, Finish).is_err());
    }
}
