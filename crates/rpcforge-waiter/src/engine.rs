// SPDX-License-Identifier: MIT OR Apache-2.0
//! The poll-evaluate-backoff loop a waiter runs.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use rpcforge_serde::Document;
use tracing::{debug, trace};

use crate::acceptor::{evaluate_acceptors, Acceptor, AcceptorState};
use crate::error::WaiterError;
use crate::matcher::PollOutcome;

/// Backoff bounds and the overall time budget for a wait.
#[derive(Debug, Clone, Copy)]
pub struct WaiterConfig {
    /// Smallest delay ever slept between polls.
    pub min_delay: Duration,
    /// Largest delay ever slept between polls.
    pub max_delay: Duration,
    /// Total wall-clock budget across every poll and sleep.
    pub total_timeout: Duration,
}

impl Default for WaiterConfig {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_millis(2),
            max_delay: Duration::from_secs(120),
            total_timeout: Duration::from_secs(600),
        }
    }
}

/// A single poll's raw result, before acceptor evaluation.
pub enum PollResult {
    /// The operation returned a decoded output.
    Output(Document),
    /// The operation failed with a modeled error shape.
    Error {
        /// The bare error shape name.
        shape_id: String,
    },
}

/// Invokes the operation being waited on.
pub trait Poller {
    /// Run one poll.
    fn poll(&mut self) -> PollResult;
}

/// Run the poll/evaluate/backoff loop until an acceptor reaches
/// [`AcceptorState::Success`] or [`AcceptorState::Failure`], or the time
/// budget is exhausted.
///
/// # Errors
///
/// [`WaiterError::Matched`] if a `Failure` acceptor matched;
/// [`WaiterError::TimedOut`] if `config.total_timeout` elapsed with no
/// terminal match.
pub fn run_waiter(
    acceptors: &[Acceptor],
    input: &Document,
    poller: &mut dyn Poller,
    config: &WaiterConfig,
) -> Result<Document, WaiterError> {
    let start = Instant::now();
    let mut attempt: u32 = 0;

    loop {
        let result = poller.poll();
        let outcome = match &result {
            PollResult::Output(output) => PollOutcome::Output(output),
            PollResult::Error { shape_id } => PollOutcome::Error { shape_id },
        };

        match evaluate_acceptors(acceptors, input, &outcome) {
            Some(AcceptorState::Success) => {
                debug!(target: "rpcforge_waiter::engine", attempt, "waiter succeeded");
                return Ok(match result {
                    PollResult::Output(output) => output,
                    PollResult::Error { .. } => Document::Null,
                });
            }
            Some(AcceptorState::Failure) => {
                debug!(target: "rpcforge_waiter::engine", attempt, "waiter reached failure acceptor");
                return Err(WaiterError::Matched);
            }
            Some(AcceptorState::Retry) | None => {}
        }

        let elapsed = start.elapsed();
        if elapsed >= config.total_timeout {
            return Err(WaiterError::TimedOut { elapsed_ms: elapsed.as_millis() as u64 });
        }

        let remaining = config.total_timeout - elapsed;
        let delay = backoff_delay(config, attempt).min(remaining);
        trace!(target: "rpcforge_waiter::engine", attempt, delay_ms = delay.as_millis() as u64, "waiter sleeping before next poll");
        std::thread::sleep(delay);
        attempt += 1;
    }
}

/// Exponential backoff with jitter, floored at `min_delay` and capped at
/// `max_delay`.
fn backoff_delay(config: &WaiterConfig, attempt: u32) -> Duration {
    let exp = 2u64.saturating_pow(attempt);
    let base_ms = config.min_delay.as_millis() as u64;
    let capped_ms = base_ms.saturating_mul(exp).min(config.max_delay.as_millis() as u64);
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().subsec_nanos() as u64;
    let pseudo = nanos.wrapping_mul(attempt as u64 + 1);
    let jittered = pseudo % (capped_ms.saturating_sub(base_ms) + 1);
    Duration::from_millis(base_ms + jittered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::{Comparator, Matcher};

    struct ScriptedPoller {
        outcomes: Vec<PollResult>,
    }

    impl Poller for ScriptedPoller {
        fn poll(&mut self) -> PollResult {
            if self.outcomes.len() > 1 {
                self.outcomes.remove(0)
            } else {
                match &self.outcomes[0] {
                    PollResult::Output(d) => PollResult::Output(d.clone()),
                    PollResult::Error { shape_id } => PollResult::Error { shape_id: shape_id.clone() },
                }
            }
        }
    }

    #[test]
    fn succeeds_once_jmespath_acceptor_matches() {
        let mut state = std::collections::BTreeMap::new();
        state.insert("Status".to_string(), Document::from("RUNNING"));
        let acceptors = vec![Acceptor::new(
            AcceptorState::Success,
            Matcher::JmesPath { path: "output.Status".to_string(), expected: Document::from("RUNNING"), comparator: Comparator::StringEquals },
        )];
        let mut poller = ScriptedPoller { outcomes: vec![PollResult::Output(Document::Map(state))] };
        let config = WaiterConfig { min_delay: Duration::from_millis(1), max_delay: Duration::from_millis(2), total_timeout: Duration::from_secs(1) };
        let result = run_waiter(&acceptors, &Document::Null, &mut poller, &config).unwrap();
        assert_eq!(result.get("Status"), Some(&Document::from("RUNNING")));
    }

    #[test]
    fn failure_acceptor_is_terminal() {
        let acceptors = vec![Acceptor::new(AcceptorState::Failure, Matcher::Error { shape_id: "ResourceDeletedException".to_string() })];
        let mut poller = ScriptedPoller { outcomes: vec![PollResult::Error { shape_id: "ResourceDeletedException".to_string() }] };
        let config = WaiterConfig { min_delay: Duration::from_millis(1), max_delay: Duration::from_millis(2), total_timeout: Duration::from_secs(1) };
        let err = run_waiter(&acceptors, &Document::Null, &mut poller, &config).unwrap_err();
        assert!(matches!(err, WaiterError::Matched));
    }

    #[test]
    fn times_out_when_nothing_ever_matches() {
        let acceptors: Vec<Acceptor> = Vec::new();
        let mut poller = ScriptedPoller { outcomes: vec![PollResult::Output(Document::Null)] };
        let config = WaiterConfig { min_delay: Duration::from_millis(1), max_delay: Duration::from_millis(2), total_timeout: Duration::from_millis(5) };
        let err = run_waiter(&acceptors, &Document::Null, &mut poller, &config).unwrap_err();
        assert!(matches!(err, WaiterError::TimedOut { .. }));
    }
}
