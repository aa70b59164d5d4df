// SPDX-License-Identifier: MIT OR Apache-2.0
//! The shape serializer interface.

use rpcforge_schema::ResolvedSchema;

use crate::document::Document;

/// Serializes Smithy-style shapes to a target wire format.
///
/// A format (JSON, CBOR, ...) implements this trait once; generated (or
/// hand-written) structures drive it through [`SerializableStruct::serialize`].
/// Struct/list/map serialization is driven by a `FnOnce` callback rather
/// than a trait object, so hot-path serialization never allocates a vtable.
pub trait ShapeSerializer {
    /// The serialization target type (e.g. `Vec<u8>`).
    type Output;
    /// The error type returned by serialization operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Finalizes serialization, returning the encoded output.
    fn finish(self) -> Result<Self::Output, Self::Error>;

    /// Writes a structure. `schema` must be the structure's own schema, not
    /// a member schema — member schemas are observed individually inside
    /// `write_members` as each field is written.
    fn write_struct<F>(&mut self, schema: ResolvedSchema<'_>, write_members: F) -> Result<(), Self::Error>
    where
        F: FnOnce(&mut Self) -> Result<(), Self::Error>;

    /// Writes a list. `size_hint` lets formats that need a length prefix
    /// (or that want to preallocate) avoid a separate counting pass.
    fn write_list<F>(
        &mut self,
        schema: ResolvedSchema<'_>,
        size_hint: Option<usize>,
        write_elements: F,
    ) -> Result<(), Self::Error>
    where
        F: FnOnce(&mut Self) -> Result<(), Self::Error>;

    /// Writes a map. Inside `write_entries`, each entry must call
    /// [`ShapeSerializer::write_map_key`] immediately before writing the
    /// entry's value.
    fn write_map<F>(
        &mut self,
        schema: ResolvedSchema<'_>,
        size_hint: Option<usize>,
        write_entries: F,
    ) -> Result<(), Self::Error>
    where
        F: FnOnce(&mut Self) -> Result<(), Self::Error>;

    /// Writes a map entry's key. Must be called exactly once before each
    /// entry's value inside a [`ShapeSerializer::write_map`] callback.
    fn write_map_key(&mut self, key: &str) -> Result<(), Self::Error>;

    /// Writes a boolean. `schema` must be the *member* schema when writing a
    /// struct field, so implementations can read member-level traits
    /// (`sensitive`, `jsonName`, ...) without a second lookup.
    fn write_boolean(&mut self, schema: ResolvedSchema<'_>, value: bool) -> Result<(), Self::Error>;
    /// Writes an 8-bit signed integer.
    fn write_byte(&mut self, schema: ResolvedSchema<'_>, value: i8) -> Result<(), Self::Error>;
    /// Writes a 16-bit signed integer.
    fn write_short(&mut self, schema: ResolvedSchema<'_>, value: i16) -> Result<(), Self::Error>;
    /// Writes a 32-bit signed integer.
    fn write_integer(&mut self, schema: ResolvedSchema<'_>, value: i32) -> Result<(), Self::Error>;
    /// Writes a 64-bit signed integer.
    fn write_long(&mut self, schema: ResolvedSchema<'_>, value: i64) -> Result<(), Self::Error>;
    /// Writes a 32-bit float.
    fn write_float(&mut self, schema: ResolvedSchema<'_>, value: f32) -> Result<(), Self::Error>;
    /// Writes a 64-bit float.
    fn write_double(&mut self, schema: ResolvedSchema<'_>, value: f64) -> Result<(), Self::Error>;
    /// Writes a UTF-8 string.
    fn write_string(&mut self, schema: ResolvedSchema<'_>, value: &str) -> Result<(), Self::Error>;
    /// Writes raw binary data.
    fn write_blob(&mut self, schema: ResolvedSchema<'_>, value: &[u8]) -> Result<(), Self::Error>;
    /// Writes a timestamp, rendered per the schema's `timestampFormat` trait.
    fn write_timestamp(&mut self, schema: ResolvedSchema<'_>, value: &str) -> Result<(), Self::Error>;
    /// Writes a polymorphic [`Document`] value.
    fn write_document(&mut self, schema: ResolvedSchema<'_>, value: &Document) -> Result<(), Self::Error>;
    /// Writes an explicit null, for sparse collections.
    fn write_null(&mut self, schema: ResolvedSchema<'_>) -> Result<(), Self::Error>;
}

/// Implemented by structures that know how to drive a [`ShapeSerializer`].
pub trait SerializableStruct {
    /// Serializes `self` by calling back into `serializer`.
    ///
    /// `schema` is the schema this value is being written *as*: the
    /// structure's own top-level schema when serializing a request or
    /// response body directly, or the enclosing member's schema when this
    /// value is nested inside another structure, list, or map. Passing the
    /// right one is what lets [`ShapeSerializer::write_struct`] observe
    /// member-level traits for a nested structure the same way it does for
    /// a scalar member.
    fn serialize<S: ShapeSerializer>(&self, schema: ResolvedSchema<'_>, serializer: &mut S) -> Result<(), S::Error>;
}
