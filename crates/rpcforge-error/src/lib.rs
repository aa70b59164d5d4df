// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]

//! Error taxonomy for the rpcforge client runtime.
//!
//! Every failure a call can surface is one of the kinds in [`ErrorKind`].
//! Each kind carries an [`ErrorCode`] drawn from a stable catalog
//! (`RPC-X###`, `X` a category letter) so structured logs and diagnostics
//! can key on a code without matching the full enum.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

// ---------------------------------------------------------------------------
// ErrorCode catalog
// ---------------------------------------------------------------------------

/// Stable catalog of error codes, one per failure mode named in the error
/// taxonomy. Categories:
///
/// - **V** — Validation errors
/// - **S** — Serialization/codec errors
/// - **B** — HTTP binding errors
/// - **I** — Identity resolution errors
/// - **G** — Signing errors
/// - **T** — Transport errors
/// - **M** — Modeled (service) errors
/// - **U** — Unmodeled protocol errors
/// - **O** — Timeout/cancellation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// A required member was absent.
    RequiredMemberMissing,
    /// A value violated a length, range, or pattern trait.
    ConstraintViolated,
    /// A string did not match any known enum variant during strict validation.
    UnrecognizedEnumValue,
    /// A codec could not encode or decode a value for the given schema.
    CodecFailure,
    /// A decode would lose numeric precision.
    LossyNumericConversion,
    /// A required `httpLabel` member was missing or empty.
    MissingLabel,
    /// A member could not be projected onto an HTTP message part.
    BindingMismatch,
    /// No identity resolver in a chain produced an identity.
    IdentityNotFound,
    /// An identity resolver failed with something other than "not found",
    /// aborting the chain instead of letting it continue.
    IdentityProviderFailure,
    /// Required signing context (region, service, clock) was absent.
    MissingSigningContext,
    /// I/O failure while sending or receiving over the transport.
    TransportIo,
    /// The transport reported a connection reset before any bytes arrived.
    ConnectionResetEarly,
    /// A modeled (service-defined) error shape was decoded.
    ModeledError,
    /// The response indicated failure with no recognized error discriminator.
    UnmodeledFault,
    /// The per-call deadline elapsed.
    DeadlineExceeded,
    /// The call was cancelled by the caller.
    Cancelled,
    /// A modeled error was classified as throttling.
    Throttling,
    /// A host label failed DNS-label validation.
    InvalidHostLabel,
}

impl ErrorCode {
    /// The stable `RPC-X###` string for this code.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RequiredMemberMissing => "RPC-V001",
            Self::ConstraintViolated => "RPC-V002",
            Self::UnrecognizedEnumValue => "RPC-V003",
            Self::CodecFailure => "RPC-S001",
            Self::LossyNumericConversion => "RPC-S002",
            Self::MissingLabel => "RPC-B001",
            Self::BindingMismatch => "RPC-B002",
            Self::IdentityNotFound => "RPC-I001",
            Self::IdentityProviderFailure => "RPC-I002",
            Self::MissingSigningContext => "RPC-G001",
            Self::TransportIo => "RPC-T001",
            Self::ConnectionResetEarly => "RPC-T002",
            Self::ModeledError => "RPC-M001",
            Self::UnmodeledFault => "RPC-U001",
            Self::DeadlineExceeded => "RPC-O001",
            Self::Cancelled => "RPC-O002",
            Self::Throttling => "RPC-M002",
            Self::InvalidHostLabel => "RPC-B003",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ErrorKind
// ---------------------------------------------------------------------------

/// The taxonomy of failures a call can surface, per the error handling
/// design: each kind is a category, not a concrete Rust type, so callers
/// classify on `kind()` rather than downcasting.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ErrorKind {
    /// Input or output violated a schema constraint. Fatal, not retried.
    #[error("validation failed: {message}")]
    Validation {
        /// Human-readable description of the violated constraint.
        message: String,
        /// Fully-qualified identifier of the offending shape or member.
        shape_id: String,
    },

    /// A codec could not encode or decode a value.
    #[error("serialization failed for {shape_id}: {message}")]
    Serialization {
        /// Fully-qualified identifier of the offending shape.
        shape_id: String,
        /// Human-readable description of the failure.
        message: String,
    },

    /// A trait-level HTTP projection failed (missing label, payload mismatch).
    /// Fatal, not retried.
    #[error("http binding failed: {message}")]
    Binding {
        /// Human-readable description of the failure.
        message: String,
    },

    /// Every identity resolver in a chain reported "not found".
    #[error("no identity resolver produced an identity ({attempted} tried)")]
    IdentityNotFound {
        /// Number of resolvers that were tried.
        attempted: usize,
        /// Diagnostic messages from each failed resolver, in trial order.
        diagnostics: Vec<String>,
    },

    /// Required signing context (region, service, clock) was missing. Fatal.
    #[error("signing failed: {message}")]
    Signing {
        /// Human-readable description of what was missing.
        message: String,
    },

    /// I/O failure during transport send/receive.
    #[error("transport error: {message}")]
    Transport {
        /// Human-readable description of the failure.
        message: String,
        /// `true` when no response bytes were received, or the transport
        /// signaled a connection reset before any bytes arrived.
        retryable: bool,
    },

    /// A successfully-decoded service-defined error shape.
    #[error("modeled error {code}: {message}")]
    Modeled {
        /// The service-defined error shape identifier.
        code: String,
        /// The error's message member, if present.
        message: String,
        /// Retryability taken from the error shape's `retryable` trait.
        retryable: bool,
        /// `true` when the error's `retryable` trait carries `throttling: true`.
        throttling: bool,
    },

    /// HTTP status indicated failure but no recognized discriminator was found.
    #[error("unmodeled fault (status {status})")]
    Unmodeled {
        /// The HTTP status code of the response.
        status: u16,
        /// `true` for a 5xx status, `false` for 4xx.
        is_server_fault: bool,
    },

    /// The per-call deadline elapsed before the call completed.
    #[error("deadline exceeded after {elapsed_ms}ms")]
    Timeout {
        /// Milliseconds elapsed before the deadline fired.
        elapsed_ms: u64,
    },

    /// The call was cancelled by the caller.
    #[error("call cancelled")]
    Cancelled,
}

impl ErrorKind {
    /// The stable [`ErrorCode`] for this kind.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Validation { .. } => ErrorCode::RequiredMemberMissing,
            Self::Serialization { .. } => ErrorCode::CodecFailure,
            Self::Binding { .. } => ErrorCode::BindingMismatch,
            Self::IdentityNotFound { .. } => ErrorCode::IdentityNotFound,
            Self::Signing { .. } => ErrorCode::MissingSigningContext,
            Self::Transport { retryable, .. } => {
                if *retryable {
                    ErrorCode::ConnectionResetEarly
                } else {
                    ErrorCode::TransportIo
                }
            }
            Self::Modeled { throttling, .. } => {
                if *throttling {
                    ErrorCode::Throttling
                } else {
                    ErrorCode::ModeledError
                }
            }
            Self::Unmodeled { .. } => ErrorCode::UnmodeledFault,
            Self::Timeout { .. } => ErrorCode::DeadlineExceeded,
            Self::Cancelled => ErrorCode::Cancelled,
        }
    }

    /// Whether the retry orchestrator should consider this kind for retry,
    /// independent of operation-level idempotency traits.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { retryable, .. } => *retryable,
            Self::Modeled { retryable, .. } => *retryable,
            Self::Unmodeled { is_server_fault, .. } => *is_server_fault,
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// ErrorContext
// ---------------------------------------------------------------------------

/// Call-level diagnostic context attached to every [`SdkError`].
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Snapshot of select context-bag entries at the time of failure
    /// (operation name, region, request id, ...).
    pub snapshot: BTreeMap<String, String>,
    /// Number of attempts made before this error was returned.
    pub attempts: u32,
    /// Wall-clock time spent across all attempts.
    pub elapsed: Duration,
}

impl ErrorContext {
    /// Start a context with zero attempts and zero elapsed time.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic key/value pair, returning `self` for chaining.
    #[must_use]
    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.snapshot.insert(key.into(), value.into());
        self
    }
}

// ---------------------------------------------------------------------------
// SdkError
// ---------------------------------------------------------------------------

/// The error type every `rpcforge-client` call future resolves to on
/// failure. Generic over the operation's modeled-error type `E` so callers
/// can match a decoded service error without losing the rest of the
/// taxonomy.
#[derive(Debug)]
pub struct SdkError<E> {
    kind: ErrorKind,
    modeled: Option<E>,
    context: ErrorContext,
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl<E> SdkError<E> {
    /// Construct an error from a kind and context, with no modeled payload
    /// or underlying source.
    #[must_use]
    pub fn new(kind: ErrorKind, context: ErrorContext) -> Self {
        Self {
            kind,
            modeled: None,
            context,
            source: None,
        }
    }

    /// Attach the decoded modeled-error payload.
    #[must_use]
    pub fn with_modeled(mut self, modeled: E) -> Self {
        self.modeled = Some(modeled);
        self
    }

    /// Attach an underlying cause (e.g. a transport I/O error).
    #[must_use]
    pub fn with_source(
        mut self,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// The error kind.
    #[must_use]
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// The stable error code for this error's kind.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        self.kind.code()
    }

    /// The decoded modeled-error payload, if this was a [`ErrorKind::Modeled`]
    /// failure and the caller's codec successfully decoded it.
    #[must_use]
    pub fn as_modeled(&self) -> Option<&E> {
        self.modeled.as_ref()
    }

    /// Consume the error and return the modeled payload, if present.
    #[must_use]
    pub fn into_modeled(self) -> Option<E> {
        self.modeled
    }

    /// Diagnostic context captured at the point of failure.
    #[must_use]
    pub fn context(&self) -> &ErrorContext {
        &self.context
    }

    /// Whether the retry orchestrator considered (or would consider) this
    /// error retryable in isolation. The orchestrator additionally weighs
    /// operation-level idempotency traits before actually retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

impl<E: fmt::Debug> fmt::Display for SdkError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) after {} attempt(s), {:?} elapsed",
            self.kind,
            self.code(),
            self.context.attempts.max(1),
            self.context.elapsed
        )
    }
}

impl<E: fmt::Debug> std::error::Error for SdkError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn throttling_modeled_error_is_retryable_and_coded() {
        let err: SdkError<()> = SdkError::new(
            ErrorKind::Modeled {
                code: "ThrottlingException".into(),
                message: "slow down".into(),
                retryable: true,
                throttling: true,
            },
            ErrorContext::new(),
        );
        assert!(err.is_retryable());
        assert_eq!(err.code(), ErrorCode::Throttling);
    }

    #[test]
    fn binding_error_is_not_retryable() {
        let err: SdkError<()> = SdkError::new(
            ErrorKind::Binding {
                message: "missing required label `name`".into(),
            },
            ErrorContext::new(),
        );
        assert!(!err.is_retryable());
        assert_eq!(err.code(), ErrorCode::BindingMismatch);
    }

    #[test]
    fn connection_reset_before_bytes_is_retryable() {
        let err: SdkError<()> = SdkError::new(
            ErrorKind::Transport {
                message: "connection reset by peer".into(),
                retryable: true,
            },
            ErrorContext::new(),
        );
        assert!(err.is_retryable());
    }

    #[test]
    fn display_includes_attempt_count_and_code() {
        let ctx = ErrorContext::new().with_entry("operation", "GetWidget");
        let err: SdkError<()> = SdkError::new(
            ErrorKind::Timeout { elapsed_ms: 500 },
            ErrorContext {
                attempts: 3,
                ..ctx
            },
        );
        let text = err.to_string();
        assert!(text.contains("RPC-O001"));
        assert!(text.contains('3'));
    }
}
