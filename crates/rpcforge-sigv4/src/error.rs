// SPDX-License-Identifier: MIT OR Apache-2.0
//! Errors raised while signing a request.

use rpcforge_error::ErrorCode;

/// A signing failure. These are always fatal and never retryable — a
/// missing region or an unparseable clock indicates a caller or
/// configuration bug, not a transient server condition.
#[derive(Debug, thiserror::Error)]
pub enum SigningError {
    /// No region was supplied and none could be derived from context.
    #[error("signing region is required")]
    MissingRegion,
    /// No service name was supplied and none could be derived from context.
    #[error("signing service name is required")]
    MissingService,
    /// The identity used for signing had no secret access key.
    #[error("identity has no secret access key to sign with")]
    MissingSecretKey,
    /// A header value supplied for signing was not valid ASCII/UTF-8 HTTP
    /// header content.
    #[error("header {name} has a value that cannot be used in a signature: {message}")]
    InvalidHeaderValue {
        /// The offending header name.
        name: String,
        /// Why the value was rejected.
        message: String,
    },
}

impl SigningError {
    /// The stable catalog code for this failure.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::MissingRegion | Self::MissingService | Self::MissingSecretKey => {
                ErrorCode::MissingSigningContext
            }
            Self::InvalidHeaderValue { .. } => ErrorCode::MissingSigningContext,
        }
    }
}
