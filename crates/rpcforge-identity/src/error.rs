// SPDX-License-Identifier: MIT OR Apache-2.0
//! Errors raised while resolving an identity.

use rpcforge_error::ErrorCode;

/// A single resolver's failure. `NotFound` lets a chain continue to the
/// next resolver; every other variant aborts the chain immediately.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// This resolver has no identity to offer; a chain should try the next.
    #[error("{reason}")]
    NotFound {
        /// Why this resolver had nothing to offer, for chain diagnostics.
        reason: String,
    },
    /// The resolver found credential material but it was malformed, or an
    /// external provider call failed outright.
    #[error("identity provider failed: {message}")]
    ProviderFailed {
        /// Description of the underlying failure.
        message: String,
    },
}

impl IdentityError {
    /// Build a [`Self::NotFound`] from any displayable reason.
    pub fn not_found(reason: impl Into<String>) -> Self {
        Self::NotFound { reason: reason.into() }
    }

    /// Build a [`Self::ProviderFailed`] from any displayable message.
    pub fn provider_failed(message: impl Into<String>) -> Self {
        Self::ProviderFailed { message: message.into() }
    }

    /// Whether a chain resolver should continue past this failure.
    #[must_use]
    pub fn is_continuable(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// The stable catalog code for this failure.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound { .. } => ErrorCode::IdentityNotFound,
            Self::ProviderFailed { .. } => ErrorCode::IdentityProviderFailure,
        }
    }
}

/// All resolvers in a chain reported "not found".
#[derive(Debug, thiserror::Error)]
#[error("no identity resolver produced an identity ({} tried)", diagnostics.len())]
pub struct ChainExhausted {
    /// Diagnostic message from each resolver, in trial order.
    pub diagnostics: Vec<String>,
}
