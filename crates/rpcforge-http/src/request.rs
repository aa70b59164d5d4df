// SPDX-License-Identifier: MIT OR Apache-2.0
//! Request construction: member-trait-driven projection onto an
//! [`http::Request`].

use std::collections::BTreeMap;

use bytes::Bytes;
use rpcforge_schema::{ResolvedSchema, Trait, TraitKey};
use rpcforge_serde::Document;

use crate::body::BodyCodec;
use crate::encode::{percent_encode_label, percent_encode_query, render_header_value, render_query_values};
use crate::error::BindingError;

/// Build an [`http::Request`] for `operation`, binding `input` (already a
/// [`Document`] matching `input_schema`) per each member's HTTP trait.
///
/// `base_uri` supplies the scheme and authority; the operation's `http`
/// trait supplies the method and path template.
pub fn build_request(
    operation: ResolvedSchema<'_>,
    input_schema: ResolvedSchema<'_>,
    input: &Document,
    base_uri: &http::Uri,
    codec: BodyCodec,
) -> Result<http::Request<Bytes>, BindingError> {
    let (method, uri_template) = operation_http_trait(operation)?;
    let layout = input_schema.kind().structure_layout().ok_or_else(|| {
        BindingError::BindingMismatch(format!("{} is not a structure", input_schema.id()))
    })?;
    let empty = BTreeMap::new();
    let input_map = input.as_map().unwrap_or(&empty);

    let mut bound = std::collections::HashSet::new();
    let mut query_pairs = Vec::new();
    let mut headers = http::HeaderMap::new();
    let mut payload_member: Option<(String, rpcforge_schema::SchemaRef)> = None;
    let mut unbound = BTreeMap::new();

    for member in &layout.members {
        let member_schema = ResolvedSchema::from_parts(input_schema.registry(), member.member_ref);
        let value = input_map.get(&member.name);

        if member_schema.effective_trait(TraitKey::HttpLabel).is_some() {
            bound.insert(member.name.clone());
            continue;
        }
        if let Some(Trait::HttpQuery { name }) = member_schema.effective_trait(TraitKey::HttpQuery) {
            bound.insert(member.name.clone());
            if let Some(value) = value {
                for rendered in render_query_values(value) {
                    query_pairs.push((name.clone(), rendered));
                }
            }
            continue;
        }
        if member_schema.effective_trait(TraitKey::HttpQueryParams).is_some() {
            bound.insert(member.name.clone());
            if let Some(Document::Map(entries)) = value {
                for (k, v) in entries {
                    if let Some(rendered) = crate::encode::scalar_to_string(v) {
                        query_pairs.push((k.clone(), rendered));
                    }
                }
            }
            continue;
        }
        if let Some(Trait::HttpHeader { name }) = member_schema.effective_trait(TraitKey::HttpHeader) {
            bound.insert(member.name.clone());
            if let Some(rendered) = value.and_then(render_header_value) {
                insert_header(&mut headers, name, &rendered)?;
            }
            continue;
        }
        if let Some(Trait::HttpPrefixHeaders { prefix }) = member_schema.effective_trait(TraitKey::HttpPrefixHeaders) {
            bound.insert(member.name.clone());
            if let Some(Document::Map(entries)) = value {
                for (k, v) in entries {
                    if let Some(rendered) = crate::encode::scalar_to_string(v) {
                        insert_header(&mut headers, &format!("{prefix}{k}"), &rendered)?;
                    }
                }
            }
            continue;
        }
        if member_schema.effective_trait(TraitKey::HttpPayload).is_some() {
            bound.insert(member.name.clone());
            payload_member = Some((member.name.clone(), member.member_ref));
            continue;
        }
        if let Some(value) = value {
            unbound.insert(member.name.clone(), value.clone());
        }
    }

    let path = substitute_labels(&uri_template, layout, input_map)?;
    let uri = append_query(build_absolute_uri(base_uri, &path)?, &query_pairs);

    let omit_empty = input_schema.effective_trait(TraitKey::OmitEmptyPayload).is_some();
    let (content_type, body) = match payload_member {
        Some((name, member_ref)) => {
            let member_schema = ResolvedSchema::from_parts(input_schema.registry(), member_ref);
            let value = input_map.get(&name).cloned().unwrap_or(Document::Null);
            let media_type = member_schema.effective_trait(TraitKey::MediaType);
            let content_type = match media_type {
                Some(Trait::MediaType(mt)) => mt.clone(),
                _ => codec.content_type().to_string(),
            };
            let bytes = match &value {
                Document::Blob(b) => b.clone(),
                Document::String(s) => s.clone().into_bytes(),
                other => codec.encode(other)?,
            };
            (Some(content_type), bytes)
        }
        None if unbound.is_empty() && omit_empty => (None, Vec::new()),
        None => (
            Some(codec.content_type().to_string()),
            codec.encode(&Document::Map(unbound))?,
        ),
    };

    let mut builder = http::Request::builder().method(method.as_str()).uri(uri);
    for (name, value) in headers.iter() {
        builder = builder.header(name, value);
    }
    if let Some(content_type) = content_type {
        builder = builder.header(http::header::CONTENT_TYPE, content_type);
    }
    builder
        .body(Bytes::from(body))
        .map_err(|e| BindingError::BindingMismatch(e.to_string()))
}

fn operation_http_trait(operation: ResolvedSchema<'_>) -> Result<(String, String), BindingError> {
    match operation.registry().direct_traits(operation.schema_ref()).get(TraitKey::Http) {
        Some(Trait::Http { method, uri, .. }) => Ok((method.clone(), uri.clone())),
        _ => Err(BindingError::BindingMismatch(format!(
            "operation {} carries no http trait",
            operation.id()
        ))),
    }
}

fn substitute_labels(
    template: &str,
    layout: &rpcforge_schema::StructureLayout,
    input_map: &BTreeMap<String, Document>,
) -> Result<String, BindingError> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();
    while let Some((_, c)) = chars.next() {
        if c != '{' {
            out.push(c);
            continue;
        }
        let mut label = String::new();
        for (_, c) in chars.by_ref() {
            if c == '}' {
                break;
            }
            label.push(c);
        }
        let greedy = label.ends_with('+');
        let name = label.trim_end_matches('+');
        if layout.index_of(name).is_none() {
            return Err(BindingError::BindingMismatch(format!(
                "uri template `{template}` references unknown label `{name}`"
            )));
        }
        let rendered = input_map
            .get(name)
            .and_then(crate::encode::scalar_to_string)
            .filter(|s| !s.is_empty());
        let Some(rendered) = rendered else {
            return Err(BindingError::MissingLabel {
                template: template.to_string(),
                member: name.to_string(),
            });
        };
        out.push_str(&percent_encode_label(&rendered, greedy));
    }
    Ok(out)
}

fn build_absolute_uri(base: &http::Uri, path: &str) -> Result<http::Uri, BindingError> {
    let mut parts = base.clone().into_parts();
    parts.path_and_query = Some(path.parse().map_err(|_| BindingError::BindingMismatch(format!("invalid path `{path}`")))?);
    http::Uri::from_parts(parts).map_err(|e| BindingError::BindingMismatch(e.to_string()))
}

fn append_query(uri: http::Uri, pairs: &[(String, String)]) -> http::Uri {
    if pairs.is_empty() {
        return uri;
    }
    let mut parts = uri.clone().into_parts();
    let existing_path = parts
        .path_and_query
        .as_ref()
        .map(|pq| pq.path().to_string())
        .unwrap_or_else(|| "/".to_string());
    let existing_query = parts.path_and_query.as_ref().and_then(|pq| pq.query()).unwrap_or("");
    let mut query = existing_query.to_string();
    for (k, v) in pairs {
        if !query.is_empty() {
            query.push('&');
        }
        query.push_str(&percent_encode_query(k));
        query.push('=');
        query.push_str(&percent_encode_query(v));
    }
    let path_and_query = format!("{existing_path}?{query}");
    parts.path_and_query = Some(path_and_query.parse().expect("percent-encoded query is a valid PathAndQuery"));
    http::Uri::from_parts(parts).unwrap_or(uri)
}

fn insert_header(headers: &mut http::HeaderMap, name: &str, value: &str) -> Result<(), BindingError> {
    let header_name = http::header::HeaderName::try_from(name).map_err(|e| BindingError::BindingMismatch(e.to_string()))?;
    let header_value = http::header::HeaderValue::try_from(value).map_err(|e| BindingError::BindingMismatch(e.to_string()))?;
    headers.append(header_name, header_value);
    Ok(())
}
