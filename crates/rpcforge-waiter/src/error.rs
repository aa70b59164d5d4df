// SPDX-License-Identifier: MIT OR Apache-2.0
//! Waiter failure modes.

use rpcforge_error::ErrorCode;

/// Why a waiter stopped without returning a successful output.
#[derive(Debug, thiserror::Error)]
pub enum WaiterError {
    /// A `Failure`-state acceptor matched.
    #[error("waiter reached a terminal failure state")]
    Matched,
    /// The total time budget elapsed with no acceptor reaching `Success`
    /// or `Failure`.
    #[error("waiter timed out after {elapsed_ms}ms with no matching acceptor")]
    TimedOut {
        /// Milliseconds spent polling before giving up.
        elapsed_ms: u64,
    },
}

impl WaiterError {
    /// The stable catalog code for this failure.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Matched => ErrorCode::UnmodeledFault,
            Self::TimedOut { .. } => ErrorCode::DeadlineExceeded,
        }
    }
}
