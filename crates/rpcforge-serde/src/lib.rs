// SPDX-License-Identifier: MIT OR Apache-2.0
#![warn(missing_docs)]

//! Format-agnostic shape serialization and deserialization.
//!
//! [`ser::ShapeSerializer`] and [`de::ShapeDeserializer`] are the two halves
//! of the visitor API a wire codec (JSON, CBOR, ...) implements once;
//! generated structures drive them through [`ser::SerializableStruct`] and
//! [`de::DeserializableStruct`]. [`document::Document`] is the polymorphic
//! value type used for `Document`-shaped members and for diagnostic
//! rendering via [`redact::redact_for_diagnostics`].

pub mod de;
pub mod document;
pub mod redact;
pub mod ser;

pub use de::{DeserializableStruct, ShapeDeserializer};
pub use document::{Document, Number};
pub use redact::redact_for_diagnostics;
pub use ser::{SerializableStruct, ShapeSerializer};
