//! Session lifecycle state machine

use serde::{Deserialize, Serialize};

use crate::{ProtocolError, Result};

/// Which side of a transfer a session represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// This peer is sending the file
    Send,
    /// This peer is receiving the file
    Receive,
}

/// Session lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// Created but not yet connected/negotiated
    Pending,
    /// Actively transferring chunks
    Active,
    /// Paused by the operator or by flow control
    Paused,
    /// All chunks received and Merkle root verified
    Completed,
    /// Terminated by an unrecoverable error
    Failed,
}

impl SessionState {
    /// Whether this state has no legal outgoing transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Validate a transition from `self` to `next` per the session lifecycle:
    /// `Pending -> {Active, Failed}`; `Active -> {Paused, Completed, Failed}`;
    /// `Paused -> {Active, Failed}`; terminal states have no outgoing edges.
    pub fn validate_transition(&self, next: SessionState) -> Result<()> {
        let valid = matches!(
            (self, next),
            (SessionState::Pending, SessionState::Active)
                | (SessionState::Pending, SessionState::Failed)
                | (SessionState::Active, SessionState::Paused)
                | (SessionState::Active, SessionState::Completed)
                | (SessionState::Active, SessionState::Failed)
                | (SessionState::Paused, SessionState::Active)
                | (SessionState::Paused, SessionState::Failed)
        );

        if !valid {
            return Err(ProtocolError::InvalidStateTransition {
                from: format!("{self:?}"),
                to: format!("{next:?}"),
            });
        }
        Ok(())
    }
}

/// Small wrapper that enforces [`SessionState::validate_transition`] on every
/// mutation.
#[derive(Debug, Clone, Copy)]
pub struct SessionStateMachine {
    state: SessionState,
}

impl SessionStateMachine {
    /// A fresh state machine in [`SessionState::Pending`].
    pub fn new() -> Self {
        Self { state: SessionState::Pending }
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Attempt a transition, applying it only if legal.
    pub fn transition(&mut self, next: SessionState) -> Result<()> {
        self.state.validate_transition(next)?;
        self.state = next;
        Ok(())
    }
}

impl Default for SessionStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_can_activate() {
        let mut sm = SessionStateMachine::new();
        sm.transition(SessionState::Active).unwrap();
        assert_eq!(sm.state(), SessionState::Active);
    }

    #[test]
    fn active_can_pause_and_resume() {
        let mut sm = SessionStateMachine::new();
        sm.transition(SessionState::Active).unwrap();
        sm.transition(SessionState::Paused).unwrap();
        sm.transition(SessionState::Active).unwrap();
        assert_eq!(sm.state(), SessionState::Active);
    }

    #[test]
    fn any_nonterminal_state_can_fail() {
        for start in [SessionState::Pending, SessionState::Active, SessionState::Paused] {
            let mut sm = SessionStateMachine { state: start };
            sm.transition(SessionState::Failed).unwrap();
        }
    }

    #[test]
    fn terminal_states_reject_all_transitions() {
        for terminal in [SessionState::Completed, SessionState::Failed] {
            for next in [SessionState::Pending, SessionState::Active, SessionState::Paused, SessionState::Completed, SessionState::Failed] {
                if next == terminal {
                    continue;
                }
                let mut sm = SessionStateMachine { state: terminal };
                assert!(sm.transition(next).is_err());
            }
        }
    }

    #[test]
    fn pending_cannot_jump_to_completed() {
        let mut sm = SessionStateMachine::new();
        assert!(sm.transition(SessionState::Completed).is_err());
    }

    #[test]
    fn paused_cannot_complete_directly() {
        let mut sm = SessionStateMachine::new();
        sm.transition(SessionState::Active).unwrap();
        sm.transition(SessionState::Paused).unwrap();
        assert!(sm.transition(SessionState::Completed).is_err());
    }
}
