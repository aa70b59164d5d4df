// SPDX-License-Identifier: MIT OR Apache-2.0
//! Codec-level error type.

use rpcforge_error::ErrorCode;

/// An error raised while encoding or decoding a shape.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// A required member was absent from the wire data.
    #[error("required member `{member}` of {shape_id} was missing from the wire payload")]
    RequiredMemberMissing {
        /// The owning structure's identifier.
        shape_id: String,
        /// The missing member's name.
        member: String,
    },
    /// A numeric value could not be represented in the target type without
    /// losing precision.
    #[error("numeric value {value} does not fit in target type {target_type} without loss of precision")]
    LossyNumericConversion {
        /// The source value, rendered for diagnostics.
        value: String,
        /// The target Rust type name.
        target_type: &'static str,
    },
    /// An enum or intEnum value was not one of the shape's declared values.
    #[error("`{value}` is not a recognized value of enum {shape_id}")]
    UnrecognizedEnumValue {
        /// The enum shape's identifier.
        shape_id: String,
        /// The offending value.
        value: String,
    },
    /// The underlying byte stream was not well-formed JSON or CBOR.
    #[error("malformed {format} payload: {message}")]
    Malformed {
        /// `"json"` or `"cbor"`.
        format: &'static str,
        /// Parser-reported detail.
        message: String,
    },
    /// A timestamp string or epoch value could not be parsed in the format
    /// the schema's `timestampFormat` trait demands.
    #[error("failed to parse timestamp `{value}` as {format}")]
    InvalidTimestamp {
        /// The raw value that failed to parse.
        value: String,
        /// The expected format, e.g. `"date-time"`.
        format: &'static str,
    },
}

impl CodecError {
    /// The stable catalog code this error maps to.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::RequiredMemberMissing { .. } => ErrorCode::RequiredMemberMissing,
            Self::LossyNumericConversion { .. } => ErrorCode::LossyNumericConversion,
            Self::UnrecognizedEnumValue { .. } => ErrorCode::UnrecognizedEnumValue,
            Self::Malformed { .. } | Self::InvalidTimestamp { .. } => ErrorCode::CodecFailure,
        }
    }
}
