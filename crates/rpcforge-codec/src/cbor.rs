// SPDX-License-Identifier: MIT OR Apache-2.0
//! RFC 8949 CBOR codec, matching the rpcv2 wire convention of definite-length
//! maps/arrays and tag 1 (epoch timestamp) for `Timestamp` values.

use ciborium::value::{Integer, Value};
use rpcforge_schema::ResolvedSchema;
use rpcforge_serde::{Document, Number, SerializableStruct};

use crate::error::CodecError;
use crate::timestamp;
use crate::tree::{DocumentDeserializer, DocumentSerializer};

const EPOCH_TIMESTAMP_TAG: u64 = 1;

/// A `(Serializer, Deserializer)` pair over the serde core, encoding
/// [`Document`] values as RFC 8949 CBOR.
#[derive(Debug, Default, Clone, Copy)]
pub struct CborCodec;

impl CborCodec {
    /// Serialize a structure to a CBOR byte buffer.
    pub fn encode<T: SerializableStruct>(value: &T, schema: ResolvedSchema<'_>) -> Result<Vec<u8>, CodecError> {
        let mut ser = DocumentSerializer::new();
        value.serialize(schema, &mut ser)?;
        let document = ser.into_document();
        let cbor_value = document_to_cbor(&document)?;
        let mut bytes = Vec::new();
        ciborium::into_writer(&cbor_value, &mut bytes).map_err(|e| CodecError::Malformed {
            format: "cbor",
            message: e.to_string(),
        })?;
        Ok(bytes)
    }

    /// Serialize an already-built [`Document`] directly, bypassing
    /// [`SerializableStruct`] — used by binding layers that assemble a
    /// virtual struct of unbound members at runtime.
    pub fn encode_document(document: &Document) -> Result<Vec<u8>, CodecError> {
        let cbor_value = document_to_cbor(document)?;
        let mut bytes = Vec::new();
        ciborium::into_writer(&cbor_value, &mut bytes).map_err(|e| CodecError::Malformed {
            format: "cbor",
            message: e.to_string(),
        })?;
        Ok(bytes)
    }

    /// Parse a CBOR byte buffer into a [`Document`] tree.
    pub fn decode(bytes: &[u8]) -> Result<Document, CodecError> {
        let value: Value = ciborium::from_reader(bytes).map_err(|e| CodecError::Malformed {
            format: "cbor",
            message: e.to_string(),
        })?;
        cbor_to_document(&value)
    }

    /// Build a [`DocumentDeserializer`] reading `document`'s root.
    #[must_use]
    pub fn reader(document: &Document) -> DocumentDeserializer<'_> {
        DocumentDeserializer::new(document)
    }
}

fn document_to_cbor(doc: &Document) -> Result<Value, CodecError> {
    Ok(match doc {
        Document::Null => Value::Null,
        Document::Redacted => Value::Text("*REDACTED*".to_string()),
        Document::Bool(b) => Value::Bool(*b),
        Document::Number(Number::Int(i)) => Value::Integer(Integer::from(*i)),
        Document::Number(Number::Float(f)) => Value::Float(*f),
        Document::String(s) => Value::Text(s.clone()),
        Document::Blob(b) => Value::Bytes(b.clone()),
        Document::Timestamp(s) => {
            let epoch = timestamp::to_epoch_number(s)?;
            Value::Tag(EPOCH_TIMESTAMP_TAG, Box::new(Value::Float(epoch)))
        }
        Document::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(document_to_cbor(item)?);
            }
            Value::Array(out)
        }
        Document::Map(entries) => {
            let mut out = Vec::with_capacity(entries.len());
            for (k, v) in entries {
                out.push((Value::Text(k.clone()), document_to_cbor(v)?));
            }
            Value::Map(out)
        }
    })
}

fn cbor_to_document(value: &Value) -> Result<Document, CodecError> {
    Ok(match value {
        Value::Null => Document::Null,
        Value::Bool(b) => Document::Bool(*b),
        Value::Integer(i) => Document::from_i64(i64::try_from(*i).map_err(|_| CodecError::Malformed {
            format: "cbor",
            message: "integer out of i64 range".to_string(),
        })?),
        Value::Float(f) => Document::from_f64(*f),
        Value::Text(s) => Document::String(s.clone()),
        Value::Bytes(b) => Document::Blob(b.clone()),
        Value::Tag(EPOCH_TIMESTAMP_TAG, inner) => {
            let epoch = match inner.as_ref() {
                Value::Integer(i) => i64::try_from(*i).unwrap_or_default() as f64,
                Value::Float(f) => *f,
                _ => {
                    return Err(CodecError::Malformed {
                        format: "cbor",
                        message: "tag 1 payload must be a number".to_string(),
                    })
                }
            };
            Document::Timestamp(timestamp::parse_epoch_number(epoch)?)
        }
        Value::Tag(_, inner) => cbor_to_document(inner)?,
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(cbor_to_document(item)?);
            }
            Document::Array(out)
        }
        Value::Map(entries) => {
            let mut out = std::collections::BTreeMap::new();
            for (k, v) in entries {
                let key = k.as_text().ok_or_else(|| CodecError::Malformed {
                    format: "cbor",
                    message: "map keys must be text".to_string(),
                })?;
                out.insert(key.to_string(), cbor_to_document(v)?);
            }
            Document::Map(out)
        }
        other => {
            return Err(CodecError::Malformed {
                format: "cbor",
                message: format!("unsupported CBOR major type: {other:?}"),
            })
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_tag_round_trips_through_document() {
        let doc = Document::Timestamp("2020-10-16T12:00:00+00:00".to_string());
        let value = document_to_cbor(&doc).unwrap();
        assert!(matches!(value, Value::Tag(EPOCH_TIMESTAMP_TAG, _)));
        let back = cbor_to_document(&value).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn plain_map_round_trips() {
        let mut map = std::collections::BTreeMap::new();
        map.insert("x".to_string(), Document::from_i64(42));
        let doc = Document::Map(map);
        let value = document_to_cbor(&doc).unwrap();
        let back = cbor_to_document(&value).unwrap();
        assert_eq!(back, doc);
    }
}
