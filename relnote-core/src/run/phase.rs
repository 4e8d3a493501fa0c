//! Run phase machine
//!
//! Tracks where a run is in its lifecycle and rejects out-of-order
//! transitions. Short-circuit paths (no tickets fetched, nothing
//! customer-worthy) jump straight to `Committed`; customer runs skip
//! `Grouping`. `Failed` is reachable from every working phase and is
//! terminal.

use std::fmt;

use tracing::info;

use crate::{Error, Result};

/// Lifecycle phase of a single run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Fetching,
    Filtering,
    Grouping,
    Drafting,
    Publishing,
    Committed,
    Failed,
}

impl RunPhase {
    /// Whether the run can make no further progress from this phase
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunPhase::Committed | RunPhase::Failed)
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunPhase::Idle => "idle",
            RunPhase::Fetching => "fetching",
            RunPhase::Filtering => "filtering",
            RunPhase::Grouping => "grouping",
            RunPhase::Drafting => "drafting",
            RunPhase::Publishing => "publishing",
            RunPhase::Committed => "committed",
            RunPhase::Failed => "failed",
        };
        f.write_str(name)
    }
}

const TRANSITIONS: &[(RunPhase, RunPhase)] = &[
    (RunPhase::Idle, RunPhase::Fetching),
    (RunPhase::Fetching, RunPhase::Filtering),
    // Empty window: nothing to filter
    (RunPhase::Fetching, RunPhase::Committed),
    (RunPhase::Filtering, RunPhase::Grouping),
    // Nothing customer-worthy survived the filter
    (RunPhase::Filtering, RunPhase::Committed),
    // Customer runs draft directly from the filter outcome
    (RunPhase::Filtering, RunPhase::Drafting),
    (RunPhase::Grouping, RunPhase::Drafting),
    (RunPhase::Drafting, RunPhase::Publishing),
    // Preview runs commit without delivering
    (RunPhase::Drafting, RunPhase::Committed),
    (RunPhase::Publishing, RunPhase::Committed),
];

/// State machine over [`RunPhase`]
#[derive(Debug, Clone)]
pub struct PhaseMachine {
    current: RunPhase,
}

impl PhaseMachine {
    /// Create a machine in the idle phase
    pub fn new() -> Self {
        Self {
            current: RunPhase::Idle,
        }
    }

    /// Current phase
    pub fn current(&self) -> RunPhase {
        self.current
    }

    /// Check whether a transition is allowed without performing it
    pub fn can_transition_to(&self, phase: RunPhase) -> bool {
        if phase == RunPhase::Failed {
            return !self.current.is_terminal();
        }
        TRANSITIONS
            .iter()
            .any(|(from, to)| *from == self.current && *to == phase)
    }

    /// Advance to a new phase
    ///
    /// Returns an error and leaves the machine unchanged when the
    /// transition is not in the table.
    pub fn transition_to(&mut self, phase: RunPhase) -> Result<()> {
        if !self.can_transition_to(phase) {
            return Err(Error::Other(format!(
                "invalid run transition from {} to {}",
                self.current, phase
            )));
        }

        info!(from = %self.current, to = %phase, "Run phase transition");
        self.current = phase;
        Ok(())
    }
}

impl Default for PhaseMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn advance(machine: &mut PhaseMachine, phases: &[RunPhase]) {
        for phase in phases {
            machine.transition_to(*phase).unwrap();
        }
    }

    #[test]
    fn test_full_run_path() {
        let mut machine = PhaseMachine::new();
        advance(
            &mut machine,
            &[
                RunPhase::Fetching,
                RunPhase::Filtering,
                RunPhase::Grouping,
                RunPhase::Drafting,
                RunPhase::Publishing,
                RunPhase::Committed,
            ],
        );
        assert!(machine.current().is_terminal());
    }

    #[test]
    fn test_short_circuit_paths() {
        let mut empty = PhaseMachine::new();
        advance(&mut empty, &[RunPhase::Fetching, RunPhase::Committed]);

        let mut nothing_worthy = PhaseMachine::new();
        advance(
            &mut nothing_worthy,
            &[RunPhase::Fetching, RunPhase::Filtering, RunPhase::Committed],
        );

        let mut customer = PhaseMachine::new();
        advance(
            &mut customer,
            &[
                RunPhase::Fetching,
                RunPhase::Filtering,
                RunPhase::Drafting,
                RunPhase::Committed,
            ],
        );
    }

    #[test]
    fn test_out_of_order_rejected() {
        let mut machine = PhaseMachine::new();
        assert!(machine.transition_to(RunPhase::Publishing).is_err());
        assert_eq!(machine.current(), RunPhase::Idle);

        machine.transition_to(RunPhase::Fetching).unwrap();
        assert!(machine.transition_to(RunPhase::Drafting).is_err());
    }

    #[test]
    fn test_failed_is_absorbing() {
        let mut machine = PhaseMachine::new();
        advance(&mut machine, &[RunPhase::Fetching, RunPhase::Failed]);
        assert!(machine.transition_to(RunPhase::Filtering).is_err());
        assert!(machine.transition_to(RunPhase::Failed).is_err());
    }

    #[test]
    fn test_committed_is_terminal() {
        let mut machine = PhaseMachine::new();
        advance(&mut machine, &[RunPhase::Fetching, RunPhase::Committed]);
        assert!(!machine.can_transition_to(RunPhase::Failed));
        assert!(machine.transition_to(RunPhase::Filtering).is_err());
    }
}
