// SPDX-License-Identifier: MIT OR Apache-2.0
//! Response parsing: the dual of [`crate::request::build_request`].

use std::collections::BTreeMap;

use bytes::Bytes;
use rpcforge_schema::{ResolvedSchema, Trait, TraitKey};
use rpcforge_serde::Document;

use crate::body::BodyCodec;
use crate::error::BindingError;

/// Parse `response` into a [`Document`] matching `output_schema`, projecting
/// headers, the response status, and the body per each member's trait.
pub fn parse_response(
    output_schema: ResolvedSchema<'_>,
    response: &http::Response<Bytes>,
    codec: BodyCodec,
) -> Result<Document, BindingError> {
    let layout = output_schema
        .kind()
        .structure_layout()
        .ok_or_else(|| BindingError::BindingMismatch(format!("{} is not a structure", output_schema.id())))?;

    let mut fields = BTreeMap::new();
    let mut payload_member = None;

    for member in &layout.members {
        let member_schema = ResolvedSchema::from_parts(output_schema.registry(), member.member_ref);

        if let Some(Trait::HttpHeader { name }) = member_schema.effective_trait(TraitKey::HttpHeader) {
            if let Some(value) = response.headers().get(name).and_then(|v| v.to_str().ok()) {
                fields.insert(member.name.clone(), Document::String(value.to_string()));
            }
            continue;
        }
        if let Some(Trait::HttpPrefixHeaders { prefix }) = member_schema.effective_trait(TraitKey::HttpPrefixHeaders) {
            let mut prefixed = BTreeMap::new();
            for (name, value) in response.headers() {
                if let Some(suffix) = name.as_str().strip_prefix(prefix.as_str()) {
                    if let Ok(value) = value.to_str() {
                        prefixed.insert(suffix.to_string(), Document::String(value.to_string()));
                    }
                }
            }
            if !prefixed.is_empty() {
                fields.insert(member.name.clone(), Document::Map(prefixed));
            }
            continue;
        }
        if member_schema.effective_trait(TraitKey::HttpResponseCode).is_some() {
            fields.insert(member.name.clone(), Document::from_i64(i64::from(response.status().as_u16())));
            continue;
        }
        if member_schema.effective_trait(TraitKey::HttpPayload).is_some() {
            payload_member = Some(member.name.clone());
        }
    }

    let body = response.body();
    if let Some(name) = payload_member {
        if !body.is_empty() {
            fields.insert(name, codec.decode(body)?);
        }
    } else if !body.is_empty() {
        if let Document::Map(entries) = codec.decode(body)? {
            fields.extend(entries);
        }
    }

    Ok(Document::Map(fields))
}

/// The error shape name and HTTP status recovered from a failed response,
/// used to pick which modeled error type (if any) to deserialize into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorDiscriminator {
    /// The bare error shape name, stripped of any namespace/version prefix.
    pub code: String,
    /// The response's HTTP status.
    pub http_status: u16,
}

/// Recover the modeled error discriminator from a failed response, trying
/// (a) `header_name` if the protocol configures one, then (b) a `__type` or
/// `code` field in the decoded body, then (c) a status-derived fallback.
#[must_use]
pub fn extract_error_discriminator(
    response: &http::Response<Bytes>,
    body: Option<&Document>,
    header_name: Option<&str>,
) -> ErrorDiscriminator {
    let http_status = response.status().as_u16();

    if let Some(header_name) = header_name {
        if let Some(raw) = response.headers().get(header_name).and_then(|v| v.to_str().ok()) {
            return ErrorDiscriminator {
                code: bare_shape_name(raw),
                http_status,
            };
        }
    }

    if let Some(body) = body {
        let field = body.get("__type").or_else(|| body.get("code"));
        if let Some(Document::String(raw)) = field {
            return ErrorDiscriminator {
                code: bare_shape_name(raw),
                http_status,
            };
        }
    }

    ErrorDiscriminator {
        code: format!("UnknownError{http_status}"),
        http_status,
    }
}

/// Strip a `namespace#` prefix and a trailing `:version` suffix, matching
/// the `X-Amzn-Errortype` / `__type` conventions.
fn bare_shape_name(raw: &str) -> String {
    let without_version = raw.split(':').next().unwrap_or(raw);
    without_version.rsplit('#').next().unwrap_or(without_version).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response_with_status(status: u16) -> http::Response<Bytes> {
        http::Response::builder().status(status).body(Bytes::new()).unwrap()
    }

    #[test]
    fn header_discriminator_strips_namespace_and_version() {
        let mut response = response_with_status(400);
        response
            .headers_mut()
            .insert("x-amzn-errortype", "com.example#ThrottlingException:http://...".parse().unwrap());
        let disc = extract_error_discriminator(&response, None, Some("x-amzn-errortype"));
        assert_eq!(disc.code, "ThrottlingException");
        assert_eq!(disc.http_status, 400);
    }

    #[test]
    fn body_type_field_used_when_no_header_configured() {
        let response = response_with_status(400);
        let mut body = BTreeMap::new();
        body.insert("__type".to_string(), Document::String("com.example#ValidationException".to_string()));
        let disc = extract_error_discriminator(&response, Some(&Document::Map(body)), None);
        assert_eq!(disc.code, "ValidationException");
    }

    #[test]
    fn falls_back_to_status_derived_code() {
        let response = response_with_status(503);
        let disc = extract_error_discriminator(&response, None, None);
        assert_eq!(disc.code, "UnknownError503");
    }
}
