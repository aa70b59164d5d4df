// SPDX-License-Identifier: MIT OR Apache-2.0
#![warn(missing_docs)]

//! Polling waiters: acceptors evaluated over a minimal JMESPath subset,
//! with exponential-backoff-with-jitter polling.

pub mod acceptor;
pub mod engine;
pub mod error;
pub mod jmespath;
pub mod matcher;

pub use acceptor::{evaluate_acceptors, Acceptor, AcceptorState};
pub use engine::{run_waiter, PollResult, Poller, WaiterConfig};
pub use error::WaiterError;
pub use matcher::{Comparator, Matcher, PollOutcome};
