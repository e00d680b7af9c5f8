//! Lifecycle of a single check.
//!
//! ```text
//! idle → connecting → connected → executing → comparing → done
//!                              ↘ done (login check)
//! any non-terminal phase → failed
//! ```
//!
//! `done` and `failed` are terminal. A check never retries internally.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckPhase {
    Idle,
    Connecting,
    Connected,
    Executing,
    Comparing,
    Done,
    Failed,
}

impl CheckPhase {
    /// Valid next phases from the current phase.
    #[must_use]
    pub const fn allowed_next_states(self) -> &'static [Self] {
        match self {
            Self::Idle => &[Self::Connecting, Self::Failed],
            Self::Connecting => &[Self::Connected, Self::Failed],
            Self::Connected => &[Self::Executing, Self::Done, Self::Failed],
            Self::Executing => &[Self::Comparing, Self::Failed],
            Self::Comparing => &[Self::Done, Self::Failed],
            Self::Done | Self::Failed => &[],
        }
    }

    /// Check whether transitioning to `next` is allowed.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.allowed_next_states().contains(&next)
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Executing => "executing",
            Self::Comparing => "comparing",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for CheckPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_check_path_is_valid() {
        let path = [
            CheckPhase::Idle,
            CheckPhase::Connecting,
            CheckPhase::Connected,
            CheckPhase::Executing,
            CheckPhase::Comparing,
            CheckPhase::Done,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn login_check_may_finish_after_connect() {
        assert!(CheckPhase::Connected.can_transition_to(CheckPhase::Done));
    }

    #[test]
    fn terminal_phases_have_no_exits() {
        for phase in [CheckPhase::Done, CheckPhase::Failed] {
            assert!(phase.is_terminal());
            assert!(phase.allowed_next_states().is_empty());
        }
    }

    #[test]
    fn cannot_skip_connecting() {
        assert!(!CheckPhase::Idle.can_transition_to(CheckPhase::Executing));
        assert!(!CheckPhase::Connecting.can_transition_to(CheckPhase::Done));
    }

    #[test]
    fn every_live_phase_can_fail() {
        for phase in [
            CheckPhase::Idle,
            CheckPhase::Connecting,
            CheckPhase::Connected,
            CheckPhase::Executing,
            CheckPhase::Comparing,
        ] {
            assert!(phase.can_transition_to(CheckPhase::Failed));
        }
    }
}
