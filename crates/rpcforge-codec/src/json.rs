// SPDX-License-Identifier: MIT OR Apache-2.0
//! RFC 8259 JSON codec.

use rpcforge_schema::ResolvedSchema;
use rpcforge_serde::{Document, Number, SerializableStruct};

use crate::error::CodecError;
use crate::timestamp;
use crate::tree::{DocumentDeserializer, DocumentSerializer};

/// A `(Serializer, Deserializer)` pair over the serde core, encoding
/// [`rpcforge_serde::Document`] values as RFC 8259 JSON text.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonCodec;

impl JsonCodec {
    /// Serialize a structure to a JSON byte buffer.
    pub fn encode<T: SerializableStruct>(value: &T, schema: ResolvedSchema<'_>) -> Result<Vec<u8>, CodecError> {
        let mut ser = DocumentSerializer::new();
        value.serialize(schema, &mut ser)?;
        let document = ser.into_document();
        let json = document_to_json(&document)?;
        serde_json::to_vec(&json).map_err(|e| CodecError::Malformed {
            format: "json",
            message: e.to_string(),
        })
    }

    /// Serialize an already-built [`Document`] directly, bypassing
    /// [`rpcforge_serde::SerializableStruct`] — used by binding layers that
    /// assemble a virtual struct of unbound members at runtime.
    pub fn encode_document(document: &Document) -> Result<Vec<u8>, CodecError> {
        let json = document_to_json(document)?;
        serde_json::to_vec(&json).map_err(|e| CodecError::Malformed {
            format: "json",
            message: e.to_string(),
        })
    }

    /// Parse a JSON byte buffer into a [`Document`] tree, ready to be read
    /// with a [`DocumentDeserializer`].
    pub fn decode(bytes: &[u8]) -> Result<Document, CodecError> {
        tracing::trace!(target: "rpcforge_codec::json", bytes = bytes.len(), "decoding json body");
        let value: serde_json::Value = serde_json::from_slice(bytes).map_err(|e| CodecError::Malformed {
            format: "json",
            message: e.to_string(),
        })?;
        json_to_document(&value)
    }

    /// Build a [`DocumentDeserializer`] reading `document`'s root.
    #[must_use]
    pub fn reader(document: &Document) -> DocumentDeserializer<'_> {
        DocumentDeserializer::new(document)
    }
}

fn document_to_json(doc: &Document) -> Result<serde_json::Value, CodecError> {
    Ok(match doc {
        Document::Null => serde_json::Value::Null,
        Document::Redacted => serde_json::Value::String("*REDACTED*".to_string()),
        Document::Bool(b) => serde_json::Value::Bool(*b),
        Document::Number(Number::Int(i)) => serde_json::Value::Number((*i).into()),
        Document::Number(Number::Float(f)) => serde_json::Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .ok_or_else(|| CodecError::Malformed {
                format: "json",
                message: format!("{f} is not representable as a JSON number"),
            })?,
        Document::String(s) => serde_json::Value::String(s.clone()),
        Document::Blob(b) => serde_json::Value::String(base64_encode(b)),
        Document::Timestamp(s) => serde_json::Value::String(timestamp::render(s, rpcforge_schema::TimestampFormat::DateTime)?),
        Document::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(document_to_json(item)?);
            }
            serde_json::Value::Array(out)
        }
        Document::Map(entries) => {
            let mut out = serde_json::Map::with_capacity(entries.len());
            for (k, v) in entries {
                out.insert(k.clone(), document_to_json(v)?);
            }
            serde_json::Value::Object(out)
        }
    })
}

fn json_to_document(value: &serde_json::Value) -> Result<Document, CodecError> {
    Ok(match value {
        serde_json::Value::Null => Document::Null,
        serde_json::Value::Bool(b) => Document::Bool(*b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Document::from_i64(i)
            } else {
                Document::from_f64(n.as_f64().ok_or_else(|| CodecError::Malformed {
                    format: "json",
                    message: format!("{n} is not representable as f64"),
                })?)
            }
        }
        serde_json::Value::String(s) => Document::String(s.clone()),
        serde_json::Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(json_to_document(item)?);
            }
            Document::Array(out)
        }
        serde_json::Value::Object(entries) => {
            let mut out = std::collections::BTreeMap::new();
            for (k, v) in entries {
                out.insert(k.clone(), json_to_document(v)?);
            }
            Document::Map(out)
        }
    })
}

fn base64_encode(bytes: &[u8]) -> String {
    const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
    let mut out = String::with_capacity(bytes.len().div_ceil(3) * 4);
    for chunk in bytes.chunks(3) {
        let b0 = chunk[0];
        let b1 = chunk.get(1).copied();
        let b2 = chunk.get(2).copied();
        out.push(ALPHABET[(b0 >> 2) as usize] as char);
        out.push(ALPHABET[(((b0 & 0x03) << 4) | (b1.unwrap_or(0) >> 4)) as usize] as char);
        out.push(match b1 {
            Some(b1) => ALPHABET[(((b1 & 0x0f) << 2) | (b2.unwrap_or(0) >> 6)) as usize] as char,
            None => '=',
        });
        out.push(match b2 {
            Some(b2) => ALPHABET[(b2 & 0x3f) as usize] as char,
            None => '=',
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_blob_base64_encodes_to_empty_string() {
        assert_eq!(base64_encode(&[]), "");
    }

    #[test]
    fn base64_encode_matches_known_vector() {
        assert_eq!(base64_encode(b"hello"), "aGVsbG8=");
    }

    #[test]
    fn json_round_trips_nested_containers() {
        let mut obj = serde_json::Map::new();
        obj.insert("a".to_string(), serde_json::Value::from(1));
        obj.insert("b".to_string(), serde_json::Value::from(vec!["x", "y"]));
        let value = serde_json::Value::Object(obj);
        let doc = json_to_document(&value).unwrap();
        let back = document_to_json(&doc).unwrap();
        assert_eq!(value, back);
    }
}
