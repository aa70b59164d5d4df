// SPDX-License-Identifier: MIT OR Apache-2.0
//! Errors raised while resolving an endpoint.

use rpcforge_error::ErrorCode;

/// A fatal endpoint resolution failure.
#[derive(Debug, thiserror::Error)]
pub enum EndpointError {
    /// A `hostLabel` member was required but absent from the input.
    #[error("host label `{member}` is required but was not provided")]
    MissingHostLabel {
        /// The member name.
        member: String,
    },
    /// A `hostLabel` value failed DNS-label validation.
    #[error("host label `{member}` value `{value}` is not a valid DNS label: {reason}")]
    InvalidHostLabel {
        /// The member name.
        member: String,
        /// The offending value.
        value: String,
        /// Why it was rejected.
        reason: String,
    },
    /// The assembled endpoint was not a valid URI.
    #[error("resolved endpoint is not a valid URI: {0}")]
    InvalidUri(String),
}

impl EndpointError {
    /// The stable catalog code for this failure.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::MissingHostLabel { .. } | Self::InvalidHostLabel { .. } => ErrorCode::InvalidHostLabel,
            Self::InvalidUri(_) => ErrorCode::BindingMismatch,
        }
    }
}
