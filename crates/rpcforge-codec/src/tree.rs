// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shared `Document`-tree builder/reader used by both the JSON and CBOR
//! codecs — each codec differs only in how it turns a [`Document`] into
//! bytes and back, not in how it walks a shape graph.

use std::collections::BTreeMap;

use rpcforge_schema::{ResolvedSchema, TraitKey};
use rpcforge_serde::{Document, Number, ShapeDeserializer, ShapeSerializer};

use crate::error::CodecError;
use crate::numeric::float_to_i64;
use crate::timestamp;

enum Frame {
    Struct(BTreeMap<String, Document>),
    List(Vec<Document>),
    Map {
        entries: BTreeMap<String, Document>,
        pending_key: Option<String>,
    },
}

/// Builds a [`Document`] by walking a [`rpcforge_serde::SerializableStruct`].
#[derive(Default)]
pub struct DocumentSerializer {
    stack: Vec<Frame>,
    result: Option<Document>,
}

impl DocumentSerializer {
    /// A fresh, empty serializer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn emit(&mut self, schema: ResolvedSchema<'_>, value: Document) -> Result<(), CodecError> {
        let value = if schema.effective_trait(TraitKey::Sensitive).is_some() {
            rpcforge_serde::redact_for_diagnostics(schema.registry(), schema.schema_ref(), &value)
        } else {
            value
        };
        match self.stack.last_mut() {
            Some(Frame::Struct(map)) => {
                let name = schema
                    .id()
                    .member_name()
                    .expect("write_struct members must be written against their member schema")
                    .to_string();
                map.insert(name, value);
            }
            Some(Frame::List(items)) => items.push(value),
            Some(Frame::Map { entries, pending_key }) => {
                let key = pending_key.take().expect("write_map_key must precede each entry value");
                entries.insert(key, value);
            }
            None => self.result = Some(value),
        }
        Ok(())
    }

    /// Takes the built document, leaving `Document::Null` in its place.
    pub fn into_document(mut self) -> Document {
        self.result.take().unwrap_or(Document::Null)
    }
}

impl ShapeSerializer for DocumentSerializer {
    type Output = Document;
    type Error = CodecError;

    fn finish(self) -> Result<Document, CodecError> {
        Ok(self.into_document())
    }

    fn write_struct<F>(&mut self, schema: ResolvedSchema<'_>, write_members: F) -> Result<(), CodecError>
    where
        F: FnOnce(&mut Self) -> Result<(), CodecError>,
    {
        self.stack.push(Frame::Struct(BTreeMap::new()));
        write_members(self)?;
        let Some(Frame::Struct(map)) = self.stack.pop() else {
            unreachable!("write_struct frame mismatch")
        };
        self.emit(schema, Document::Map(map))
    }

    fn write_list<F>(&mut self, schema: ResolvedSchema<'_>, _size_hint: Option<usize>, write_elements: F) -> Result<(), CodecError>
    where
        F: FnOnce(&mut Self) -> Result<(), CodecError>,
    {
        self.stack.push(Frame::List(Vec::new()));
        write_elements(self)?;
        let Some(Frame::List(items)) = self.stack.pop() else {
            unreachable!("write_list frame mismatch")
        };
        self.emit(schema, Document::Array(items))
    }

    fn write_map<F>(&mut self, schema: ResolvedSchema<'_>, _size_hint: Option<usize>, write_entries: F) -> Result<(), CodecError>
    where
        F: FnOnce(&mut Self) -> Result<(), CodecError>,
    {
        self.stack.push(Frame::Map {
            entries: BTreeMap::new(),
            pending_key: None,
        });
        write_entries(self)?;
        let Some(Frame::Map { entries, .. }) = self.stack.pop() else {
            unreachable!("write_map frame mismatch")
        };
        self.emit(schema, Document::Map(entries))
    }

    fn write_map_key(&mut self, key: &str) -> Result<(), CodecError> {
        match self.stack.last_mut() {
            Some(Frame::Map { pending_key, .. }) => {
                *pending_key = Some(key.to_string());
                Ok(())
            }
            _ => panic!("write_map_key called outside a write_map callback"),
        }
    }

    fn write_boolean(&mut self, schema: ResolvedSchema<'_>, value: bool) -> Result<(), CodecError> {
        self.emit(schema, Document::Bool(value))
    }

    fn write_byte(&mut self, schema: ResolvedSchema<'_>, value: i8) -> Result<(), CodecError> {
        self.emit(schema, Document::from_i64(i64::from(value)))
    }

    fn write_short(&mut self, schema: ResolvedSchema<'_>, value: i16) -> Result<(), CodecError> {
        self.emit(schema, Document::from_i64(i64::from(value)))
    }

    fn write_integer(&mut self, schema: ResolvedSchema<'_>, value: i32) -> Result<(), CodecError> {
        self.emit(schema, Document::from_i64(i64::from(value)))
    }

    fn write_long(&mut self, schema: ResolvedSchema<'_>, value: i64) -> Result<(), CodecError> {
        self.emit(schema, Document::from_i64(value))
    }

    fn write_float(&mut self, schema: ResolvedSchema<'_>, value: f32) -> Result<(), CodecError> {
        self.emit(schema, Document::from_f64(f64::from(value)))
    }

    fn write_double(&mut self, schema: ResolvedSchema<'_>, value: f64) -> Result<(), CodecError> {
        self.emit(schema, Document::from_f64(value))
    }

    fn write_string(&mut self, schema: ResolvedSchema<'_>, value: &str) -> Result<(), CodecError> {
        self.emit(schema, Document::String(value.to_string()))
    }

    fn write_blob(&mut self, schema: ResolvedSchema<'_>, value: &[u8]) -> Result<(), CodecError> {
        self.emit(schema, Document::Blob(value.to_vec()))
    }

    fn write_timestamp(&mut self, schema: ResolvedSchema<'_>, value: &str) -> Result<(), CodecError> {
        self.emit(schema, Document::Timestamp(value.to_string()))
    }

    fn write_document(&mut self, schema: ResolvedSchema<'_>, value: &Document) -> Result<(), CodecError> {
        self.emit(schema, value.clone())
    }

    fn write_null(&mut self, schema: ResolvedSchema<'_>) -> Result<(), CodecError> {
        self.emit(schema, Document::Null)
    }
}

/// Reads a structure/list/map out of an already-decoded [`Document`] tree.
pub struct DocumentDeserializer<'a> {
    current: &'a Document,
}

impl<'a> DocumentDeserializer<'a> {
    /// Begin reading from the root of `document`.
    #[must_use]
    pub fn new(document: &'a Document) -> Self {
        Self { current: document }
    }

    fn scoped(&self, value: &'a Document) -> Self {
        Self { current: value }
    }

    fn required_map(&self, shape_id: &str) -> Result<&'a BTreeMap<String, Document>, CodecError> {
        self.current.as_map().ok_or_else(|| CodecError::Malformed {
            format: "document",
            message: format!("expected a map for {shape_id}"),
        })
    }
}

impl<'a> ShapeDeserializer for DocumentDeserializer<'a> {
    type Error = CodecError;

    fn read_struct<T, F>(&mut self, schema: ResolvedSchema<'_>, mut state: T, mut consumer: F) -> Result<T, CodecError>
    where
        F: FnMut(T, ResolvedSchema<'_>, &mut Self) -> Result<T, CodecError>,
    {
        let map = self.required_map(&schema.id().to_string())?;
        let Some(layout) = schema.kind().structure_layout() else {
            return Err(CodecError::Malformed {
                format: "document",
                message: format!("{} is not a structure or union", schema.id()),
            });
        };
        for (name, value) in map {
            let Some(idx) = layout.index_of(name) else {
                continue;
            };
            let member_ref = layout.members[idx].member_ref;
            let member_schema = rpcforge_schema::ResolvedSchema::from_parts(schema.registry(), member_ref);
            let mut nested = self.scoped(value);
            state = consumer(state, member_schema, &mut nested)?;
        }
        Ok(state)
    }

    fn read_list<T, F>(&mut self, _schema: ResolvedSchema<'_>, mut state: T, mut consumer: F) -> Result<T, CodecError>
    where
        F: FnMut(T, &mut Self) -> Result<T, CodecError>,
    {
        let items = self.current.as_array().ok_or_else(|| CodecError::Malformed {
            format: "document",
            message: "expected an array".to_string(),
        })?;
        for item in items {
            let mut nested = self.scoped(item);
            state = consumer(state, &mut nested)?;
        }
        Ok(state)
    }

    fn read_map<T, F>(&mut self, _schema: ResolvedSchema<'_>, mut state: T, mut consumer: F) -> Result<T, CodecError>
    where
        F: FnMut(T, String, &mut Self) -> Result<T, CodecError>,
    {
        let entries = self.current.as_map().ok_or_else(|| CodecError::Malformed {
            format: "document",
            message: "expected a map".to_string(),
        })?;
        for (key, value) in entries {
            let mut nested = self.scoped(value);
            state = consumer(state, key.clone(), &mut nested)?;
        }
        Ok(state)
    }

    fn read_boolean(&mut self, _schema: ResolvedSchema<'_>) -> Result<bool, CodecError> {
        match self.current {
            Document::Bool(b) => Ok(*b),
            _ => Err(type_mismatch("boolean")),
        }
    }

    fn read_byte(&mut self, schema: ResolvedSchema<'_>) -> Result<i8, CodecError> {
        crate::numeric::narrow_i8(self.read_long(schema)?)
    }

    fn read_short(&mut self, schema: ResolvedSchema<'_>) -> Result<i16, CodecError> {
        crate::numeric::narrow_i16(self.read_long(schema)?)
    }

    fn read_integer(&mut self, schema: ResolvedSchema<'_>) -> Result<i32, CodecError> {
        crate::numeric::narrow_i32(self.read_long(schema)?)
    }

    fn read_long(&mut self, _schema: ResolvedSchema<'_>) -> Result<i64, CodecError> {
        match self.current {
            Document::Number(Number::Int(i)) => Ok(*i),
            Document::Number(Number::Float(f)) => float_to_i64(*f),
            _ => Err(type_mismatch("number")),
        }
    }

    fn read_float(&mut self, schema: ResolvedSchema<'_>) -> Result<f32, CodecError> {
        crate::numeric::narrow_f32(self.read_double(schema)?)
    }

    fn read_double(&mut self, _schema: ResolvedSchema<'_>) -> Result<f64, CodecError> {
        match self.current {
            Document::Number(n) => Ok(n.as_f64()),
            _ => Err(type_mismatch("number")),
        }
    }

    fn read_string(&mut self, _schema: ResolvedSchema<'_>) -> Result<String, CodecError> {
        match self.current {
            Document::String(s) => Ok(s.clone()),
            _ => Err(type_mismatch("string")),
        }
    }

    fn read_blob(&mut self, _schema: ResolvedSchema<'_>) -> Result<Vec<u8>, CodecError> {
        match self.current {
            Document::Blob(b) => Ok(b.clone()),
            _ => Err(type_mismatch("blob")),
        }
    }

    fn read_timestamp(&mut self, schema: ResolvedSchema<'_>) -> Result<String, CodecError> {
        match self.current {
            Document::Timestamp(s) => Ok(s.clone()),
            Document::String(s) => {
                let format = crate::effective_timestamp_format(schema);
                timestamp::parse(s, format)
            }
            Document::Number(n) => timestamp::parse_epoch_number(n.as_f64()),
            _ => Err(type_mismatch("timestamp")),
        }
    }

    fn read_document(&mut self, _schema: ResolvedSchema<'_>) -> Result<Document, CodecError> {
        Ok(self.current.clone())
    }

    fn is_null(&self) -> bool {
        self.current.is_null()
    }

    fn container_size(&self) -> Option<usize> {
        match self.current {
            Document::Array(items) => Some(items.len()),
            Document::Map(m) => Some(m.len()),
            _ => None,
        }
    }
}

fn type_mismatch(expected: &'static str) -> CodecError {
    CodecError::Malformed {
        format: "document",
        message: format!("expected a {expected} value"),
    }
}
