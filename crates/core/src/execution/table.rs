// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed transition table for the workflow state machine
//!
//! Retry and catch policy is a first-class data structure: a row per
//! `(state, outcome)` pair mapping to the next state, testable on its own
//! rather than embedded in match arms.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A workflow state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExecutionState {
    /// Invoking the registrar worker (initial)
    Invoke,
    /// Terminal success
    Succeed,
    /// Terminal failure via the catch transition
    Fail,
}

impl ExecutionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, ExecutionState::Succeed | ExecutionState::Fail)
    }
}

impl fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionState::Invoke => write!(f, "invoke"),
            ExecutionState::Succeed => write!(f, "succeed"),
            ExecutionState::Fail => write!(f, "fail"),
        }
    }
}

/// The classified result of one step in a state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// Worker invocation succeeded
    Succeeded,
    /// Service-level failure with retry budget remaining
    RetryableFailure,
    /// Permanent failure, or a retryable one after budget exhaustion
    FatalFailure,
    /// Execution-level timeout elapsed
    DeadlineExceeded,
}

/// One row of the transition table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRule {
    pub from: ExecutionState,
    pub on: Outcome,
    pub to: ExecutionState,
}

/// state x outcome -> next state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionTable {
    rules: Vec<TransitionRule>,
}

impl TransitionTable {
    pub fn new(rules: Vec<TransitionRule>) -> Self {
        Self { rules }
    }

    /// The backup workflow: invoke once, retry service failures while
    /// budget remains, catch everything else into the failure state.
    pub fn standard() -> Self {
        use ExecutionState::*;
        use Outcome::*;
        Self::new(vec![
            TransitionRule { from: Invoke, on: Succeeded, to: Succeed },
            TransitionRule { from: Invoke, on: RetryableFailure, to: Invoke },
            TransitionRule { from: Invoke, on: FatalFailure, to: Fail },
            TransitionRule { from: Invoke, on: DeadlineExceeded, to: Fail },
        ])
    }

    /// Look up the next state for the first matching rule
    pub fn next(&self, from: ExecutionState, on: Outcome) -> Option<ExecutionState> {
        self.rules
            .iter()
            .find(|rule| rule.from == from && rule.on == on)
            .map(|rule| rule.to)
    }

    pub fn rules(&self) -> &[TransitionRule] {
        &self.rules
    }
}

impl Default for TransitionTable {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
#[path = "table_tests.rs"]
mod tests;
