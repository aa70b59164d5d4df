// SPDX-License-Identifier: MIT OR Apache-2.0
//! The wire codec a protocol binds bodies with.

use rpcforge_codec::{CborCodec, CodecError, JsonCodec};
use rpcforge_serde::Document;

/// Which codec a protocol uses to encode/decode unbound-member and
/// `httpPayload` bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyCodec {
    /// RFC 8259 JSON.
    Json,
    /// RFC 8949 CBOR.
    Cbor,
}

impl BodyCodec {
    /// The `Content-Type` this codec implies absent a member-level
    /// `mediaType` override.
    #[must_use]
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Cbor => "application/cbor",
        }
    }

    /// Encode a document as this codec's wire bytes.
    pub fn encode(self, document: &Document) -> Result<Vec<u8>, CodecError> {
        match self {
            Self::Json => JsonCodec::encode_document(document),
            Self::Cbor => CborCodec::encode_document(document),
        }
    }

    /// Decode wire bytes into a document.
    pub fn decode(self, bytes: &[u8]) -> Result<Document, CodecError> {
        match self {
            Self::Json => JsonCodec::decode(bytes),
            Self::Cbor => CborCodec::decode(bytes),
        }
    }
}
