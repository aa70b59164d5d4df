// SPDX-License-Identifier: MIT OR Apache-2.0
//! The shape deserializer interface.

use rpcforge_schema::ResolvedSchema;

use crate::document::Document;

/// Deserializes Smithy-style shapes from a wire format.
///
/// Aggregate reads use the "consumer" pattern: the deserializer calls back
/// into a `FnMut` with the current state (typically a builder) and the
/// member/element just encountered, and the callback returns the updated
/// state. This sidesteps `dyn` visitor trait objects entirely.
pub trait ShapeDeserializer {
    /// The error type returned by deserialization operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Reads a structure. `consumer` is invoked once per member *present on
    /// the wire*, identified by its member schema; members absent from the
    /// wire data are simply never passed to `consumer`, and members present
    /// on the wire but unknown to `schema` are skipped without invoking it.
    fn read_struct<T, F>(&mut self, schema: ResolvedSchema<'_>, state: T, consumer: F) -> Result<T, Self::Error>
    where
        F: FnMut(T, ResolvedSchema<'_>, &mut Self) -> Result<T, Self::Error>;

    /// Reads a list, invoking `consumer` once per element.
    fn read_list<T, F>(&mut self, schema: ResolvedSchema<'_>, state: T, consumer: F) -> Result<T, Self::Error>
    where
        F: FnMut(T, &mut Self) -> Result<T, Self::Error>;

    /// Reads a map, invoking `consumer` once per entry with its decoded key.
    fn read_map<T, F>(&mut self, schema: ResolvedSchema<'_>, state: T, consumer: F) -> Result<T, Self::Error>
    where
        F: FnMut(T, String, &mut Self) -> Result<T, Self::Error>;

    /// Reads a boolean.
    fn read_boolean(&mut self, schema: ResolvedSchema<'_>) -> Result<bool, Self::Error>;
    /// Reads an 8-bit signed integer.
    fn read_byte(&mut self, schema: ResolvedSchema<'_>) -> Result<i8, Self::Error>;
    /// Reads a 16-bit signed integer.
    fn read_short(&mut self, schema: ResolvedSchema<'_>) -> Result<i16, Self::Error>;
    /// Reads a 32-bit signed integer.
    fn read_integer(&mut self, schema: ResolvedSchema<'_>) -> Result<i32, Self::Error>;
    /// Reads a 64-bit signed integer.
    fn read_long(&mut self, schema: ResolvedSchema<'_>) -> Result<i64, Self::Error>;
    /// Reads a 32-bit float.
    fn read_float(&mut self, schema: ResolvedSchema<'_>) -> Result<f32, Self::Error>;
    /// Reads a 64-bit float.
    fn read_double(&mut self, schema: ResolvedSchema<'_>) -> Result<f64, Self::Error>;
    /// Reads a UTF-8 string.
    fn read_string(&mut self, schema: ResolvedSchema<'_>) -> Result<String, Self::Error>;
    /// Reads raw binary data.
    fn read_blob(&mut self, schema: ResolvedSchema<'_>) -> Result<Vec<u8>, Self::Error>;
    /// Reads a timestamp, parsed per the schema's `timestampFormat` trait.
    fn read_timestamp(&mut self, schema: ResolvedSchema<'_>) -> Result<String, Self::Error>;
    /// Reads a polymorphic [`Document`] value.
    fn read_document(&mut self, schema: ResolvedSchema<'_>) -> Result<Document, Self::Error>;

    /// `true` if the value about to be read is an explicit null.
    fn is_null(&self) -> bool;

    /// The size of the current container, if the format exposes one
    /// up-front (a JSON array does not; a length-prefixed format does).
    fn container_size(&self) -> Option<usize>;
}

/// Implemented by structures that know how to drive a [`ShapeDeserializer`]
/// to build themselves.
pub trait DeserializableStruct: Sized {
    /// Deserializes a new instance from `deserializer`.
    fn deserialize<D: ShapeDeserializer>(schema: ResolvedSchema<'_>, deserializer: &mut D) -> Result<Self, D::Error>;
}
