//! Turn counting and the fixed notice schedule
//!
//! Everything here is local and synchronous. The admission check runs
//! before any remote call so a closed session never reaches the network.

use super::state::{Notice, Phase, SessionState, Turn};
use thiserror::Error;

pub const DEFAULT_REST_AT: u32 = 5;
pub const DEFAULT_TURN_LIMIT: u32 = 7;

/// Reasons a submission is refused without touching the remote service
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TurnRejected {
    #[error("This conversation has ended ({limit} of {limit} turns used)")]
    Closed { limit: u32 },
    #[error("Message is empty")]
    EmptyMessage,
}

/// Thresholds for the rest notice and the hard stop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecyclePolicy {
    pub rest_at: u32,
    pub turn_limit: u32,
}

impl Default for LifecyclePolicy {
    fn default() -> Self {
        Self {
            rest_at: DEFAULT_REST_AT,
            turn_limit: DEFAULT_TURN_LIMIT,
        }
    }
}

impl LifecyclePolicy {
    pub fn phase(&self, state: &SessionState) -> Phase {
        let count = state.user_turn_count;
        if count >= self.turn_limit {
            Phase::Closed
        } else if count >= self.rest_at {
            Phase::Resting
        } else if count == 0 && !state.intro_shown {
            Phase::Fresh
        } else {
            Phase::Active
        }
    }

    /// Check whether a submission may proceed
    pub fn admit(&self, state: &SessionState, text: &str) -> Result<(), TurnRejected> {
        if !self.phase(state).accepts_input() {
            return Err(TurnRejected::Closed {
                limit: self.turn_limit,
            });
        }
        if text.trim().is_empty() {
            return Err(TurnRejected::EmptyMessage);
        }
        Ok(())
    }

    /// Admit a submission and record it: the intro on first contact, then
    /// the user turn. Advances the count by exactly one.
    pub fn open_turn(&self, state: &mut SessionState, text: &str) -> Result<(), TurnRejected> {
        self.admit(state, text)?;

        if !state.intro_shown {
            state.log.append(Turn::notice(Notice::Intro));
            state.intro_shown = true;
        }
        state.user_turn_count += 1;
        state.log.append(Turn::user(text));
        Ok(())
    }

    /// Record the outcome of an opened turn: the assistant reply if one was
    /// produced, then the rest notice if this turn reached the threshold.
    /// Returns whether the rest notice was appended.
    pub fn close_turn(&self, state: &mut SessionState, reply: Option<Turn>) -> bool {
        if let Some(reply) = reply {
            state.log.append(reply);
        }
        // The count moves by one per accepted turn, so equality holds once
        if state.user_turn_count == self.rest_at {
            state.log.append(Turn::notice(Notice::Rest));
            true
        } else {
            false
        }
    }
}
