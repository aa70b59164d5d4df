// SPDX-License-Identifier: MIT OR Apache-2.0
//! Errors raised while binding a shape to, or extracting it from, an HTTP
//! message. These are fatal — never retried — per the binding contract.

use rpcforge_error::ErrorCode;

/// A failure to project a shape onto, or out of, an HTTP message.
#[derive(Debug, thiserror::Error)]
pub enum BindingError {
    /// A required `httpLabel` member was absent or rendered to an empty
    /// string.
    #[error("required label `{member}` in URI template `{template}` was missing or empty")]
    MissingLabel {
        /// The URI template being filled in.
        template: String,
        /// The member name bound to the missing label.
        member: String,
    },
    /// The operation's `http` trait was absent, or its URI template
    /// referenced a label with no matching bound member.
    #[error("{0}")]
    BindingMismatch(String),
    /// A member's value could not be rendered into the position its trait
    /// requires (e.g. a structure where a scalar was expected).
    #[error("member `{member}` has a value kind unsupported at this HTTP binding position")]
    UnsupportedValueKind {
        /// The offending member name.
        member: String,
    },
    /// The underlying codec failed while encoding or decoding a body.
    #[error(transparent)]
    Codec(#[from] rpcforge_codec::CodecError),
}

impl BindingError {
    /// The stable catalog code this error maps to.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::MissingLabel { .. } => ErrorCode::MissingLabel,
            Self::BindingMismatch(_) | Self::UnsupportedValueKind { .. } => ErrorCode::BindingMismatch,
            Self::Codec(e) => e.code(),
        }
    }
}
