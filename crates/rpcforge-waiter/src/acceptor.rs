// SPDX-License-Identifier: MIT OR Apache-2.0
//! Acceptors: a matcher paired with the waiter state it drives the caller
//! to.

use crate::matcher::{Matcher, PollOutcome};
use rpcforge_serde::Document;

/// The terminal (or continuation) state an acceptor drives a waiter to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptorState {
    /// The wait condition is satisfied; return the output to the caller.
    Success,
    /// Keep polling after the configured backoff.
    Retry,
    /// The wait condition failed terminally; raise a waiter error.
    Failure,
}

/// One `{state, matcher}` pair. A waiter evaluates its acceptors in order
/// against each poll outcome.
pub struct Acceptor {
    /// The state this acceptor drives to when it matches.
    pub state: AcceptorState,
    /// The matcher that decides whether this acceptor applies.
    pub matcher: Matcher,
}

impl Acceptor {
    /// Construct an acceptor from a state and matcher.
    #[must_use]
    pub fn new(state: AcceptorState, matcher: Matcher) -> Self {
        Self { state, matcher }
    }
}

/// Evaluate `acceptors` in order against `outcome`, returning the first
/// match's state. `None` means no acceptor matched ("Retry" per
/// the engine's default when nothing matches).
#[must_use]
pub fn evaluate_acceptors(acceptors: &[Acceptor], input: &Document, outcome: &PollOutcome<'_>) -> Option<AcceptorState> {
    acceptors.iter().find(|acceptor| acceptor.matcher.matches(input, outcome)).map(|acceptor| acceptor.state)
}
