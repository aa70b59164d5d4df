// SPDX-License-Identifier: MIT OR Apache-2.0
#![warn(missing_docs)]

//! JSON and CBOR wire codecs built on the schema-driven serde core.
//!
//! Both codecs share [`tree::DocumentSerializer`]/[`tree::DocumentDeserializer`]
//! to walk a shape graph into (or out of) a [`rpcforge_serde::Document`];
//! [`json`] and [`cbor`] differ only in how that document turns into bytes.

pub mod cbor;
pub mod error;
pub mod json;
pub mod numeric;
pub mod timestamp;
pub mod tree;

pub use cbor::CborCodec;
pub use error::CodecError;
pub use json::JsonCodec;

use rpcforge_schema::{ResolvedSchema, Trait, TraitKey};
use rpcforge_schema::TimestampFormat;

/// The timestamp format that applies to `schema`: its own
/// [`Trait::TimestampFormat`] if present, otherwise `date-time`.
#[must_use]
pub fn effective_timestamp_format(schema: ResolvedSchema<'_>) -> TimestampFormat {
    match schema.effective_trait(TraitKey::TimestampFormat) {
        Some(Trait::TimestampFormat(format)) => *format,
        _ => TimestampFormat::DateTime,
    }
}
