// SPDX-License-Identifier: MIT OR Apache-2.0
//! Endpoint resolvers: a fixed static endpoint, and a host-label resolver
//! that composes a host prefix from `hostLabel`-annotated input members.

use rpcforge_schema::{ResolvedSchema, TraitKey};
use rpcforge_serde::Document;

use crate::dns_label;
use crate::error::EndpointError;

/// A resolved endpoint a request should be sent to.
#[derive(Debug, Clone)]
pub struct Endpoint {
    /// The resolved base URI (scheme + authority + optional base path).
    pub uri: http::Uri,
}

impl Endpoint {
    /// Wrap a fixed URI.
    #[must_use]
    pub fn new(uri: http::Uri) -> Self {
        Self { uri }
    }
}

/// Per-call context an [`EndpointResolver`] may use (currently just the
/// operation id; host-label values come from the input document itself).
#[derive(Debug, Clone, Default)]
pub struct EndpointParams {
    /// The operation being invoked, for resolvers that vary by operation.
    pub operation_id: Option<String>,
}

/// Resolves an [`Endpoint`] for a call.
pub trait EndpointResolver: Send + Sync {
    /// Resolve the endpoint `input` should be sent to.
    ///
    /// # Errors
    ///
    /// Any [`EndpointError`]; a resolver failure is always fatal.
    fn resolve(&self, params: &EndpointParams, input_schema: ResolvedSchema<'_>, input: &Document) -> Result<Endpoint, EndpointError>;
}

/// Always returns the same fixed endpoint.
#[derive(Debug, Clone)]
pub struct StaticEndpointResolver {
    endpoint: Endpoint,
}

impl StaticEndpointResolver {
    /// Wrap a fixed endpoint.
    #[must_use]
    pub fn new(endpoint: Endpoint) -> Self {
        Self { endpoint }
    }
}

impl EndpointResolver for StaticEndpointResolver {
    fn resolve(&self, _params: &EndpointParams, _input_schema: ResolvedSchema<'_>, _input: &Document) -> Result<Endpoint, EndpointError> {
        Ok(self.endpoint.clone())
    }
}

/// Composes a static host with a prefix built from `hostLabel`-annotated
/// input members, substituted into `host_prefix_template` the same way
/// [`rpcforge_http`] substitutes `httpLabel` members into a URI template.
#[derive(Debug, Clone)]
pub struct HostLabelEndpointResolver {
    base_uri: http::Uri,
    host_prefix_template: String,
}

impl HostLabelEndpointResolver {
    /// `base_uri` supplies the scheme and the fixed part of the host;
    /// `host_prefix_template` is prepended to its authority, e.g.
    /// `"{bucket}."` for `{bucket}.s3.amazonaws.com`.
    #[must_use]
    pub fn new(base_uri: http::Uri, host_prefix_template: impl Into<String>) -> Self {
        Self { base_uri, host_prefix_template: host_prefix_template.into() }
    }
}

impl EndpointResolver for HostLabelEndpointResolver {
    fn resolve(&self, _params: &EndpointParams, input_schema: ResolvedSchema<'_>, input: &Document) -> Result<Endpoint, EndpointError> {
        let empty = std::collections::BTreeMap::new();
        let input_map = input.as_map().unwrap_or(&empty);
        let layout = input_schema.kind().structure_layout();

        let mut prefix = String::with_capacity(self.host_prefix_template.len());
        let mut chars = self.host_prefix_template.char_indices().peekable();
        while let Some((_, c)) = chars.next() {
            if c != '{' {
                prefix.push(c);
                continue;
            }
            let mut name = String::new();
            for (_, c) in chars.by_ref() {
                if c == '}' {
                    break;
                }
                name.push(c);
            }
            if let Some(layout) = layout {
                if let Some(idx) = layout.index_of(&name) {
                    let member_schema = ResolvedSchema::from_parts(input_schema.registry(), layout.members[idx].member_ref);
                    if member_schema.effective_trait(TraitKey::HostLabel).is_none() {
                        return Err(EndpointError::InvalidHostLabel {
                            member: name.clone(),
                            value: String::new(),
                            reason: "member is not marked as a host label".to_string(),
                        });
                    }
                }
            }
            let value = input_map
                .get(&name)
                .and_then(|v| match v {
                    Document::String(s) => Some(s.clone()),
                    _ => None,
                })
                .ok_or_else(|| EndpointError::MissingHostLabel { member: name.clone() })?;
            dns_label::validate(&value).map_err(|reason| EndpointError::InvalidHostLabel {
                member: name.clone(),
                value: value.clone(),
                reason,
            })?;
            prefix.push_str(&value);
        }

        let mut parts = self.base_uri.clone().into_parts();
        if let Some(authority) = parts.authority.take() {
            let prefixed = format!("{prefix}{authority}");
            parts.authority = Some(prefixed.parse().map_err(|_| EndpointError::InvalidUri(format!("invalid authority `{prefixed}`")))?);
        }
        let uri = http::Uri::from_parts(parts).map_err(|e| EndpointError::InvalidUri(e.to_string()))?;
        Ok(Endpoint::new(uri))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rpcforge_schema::{builder, SchemaBuilder, SchemaIndex, ShapeId, ShapeKind, Trait, TraitMap};
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn bucket_input_fixture() -> (Arc<rpcforge_schema::SchemaRegistry>, ShapeId) {
        let mut b = SchemaBuilder::new();
        let ns = "demo.storage";
        let string_ref = b.define_new(ShapeId::new(ns, "String"), ShapeKind::String, TraitMap::new()).unwrap();
        let mut bucket_traits = builder::member_traits(true, [Trait::HostLabel]);
        bucket_traits.insert(Trait::Required);
        let bucket_member = b
            .define_new(ShapeId::member(ns, "PutObjectInput", "bucket"), ShapeKind::Member { target: string_ref }, bucket_traits)
            .unwrap();
        let input_id = ShapeId::new(ns, "PutObjectInput");
        let layout = SchemaBuilder::layout(vec![("bucket".to_string(), bucket_member, true)]);
        b.define_new(input_id.clone(), ShapeKind::Structure(layout), TraitMap::new()).unwrap();
        (Arc::new(b.build().unwrap()), input_id)
    }

    #[test]
    fn host_label_is_substituted_into_prefix() {
        let (registry, input_id) = bucket_input_fixture();
        let index = SchemaIndex::single(registry);
        let input_schema = index.get(&input_id).unwrap();

        let mut fields = BTreeMap::new();
        fields.insert("bucket".to_string(), Document::String("my-bucket".to_string()));

        let resolver = HostLabelEndpointResolver::new("https://s3.amazonaws.com".parse().unwrap(), "{bucket}.");
        let endpoint = resolver.resolve(&EndpointParams::default(), input_schema, &Document::Map(fields)).unwrap();
        assert_eq!(endpoint.uri.authority().unwrap().as_str(), "my-bucket.s3.amazonaws.com");
    }

    #[test]
    fn invalid_dns_label_is_fatal() {
        let (registry, input_id) = bucket_input_fixture();
        let index = SchemaIndex::single(registry);
        let input_schema = index.get(&input_id).unwrap();

        let mut fields = BTreeMap::new();
        fields.insert("bucket".to_string(), Document::String("not_a_valid_label".to_string()));

        let resolver = HostLabelEndpointResolver::new("https://s3.amazonaws.com".parse().unwrap(), "{bucket}.");
        let err = resolver.resolve(&EndpointParams::default(), input_schema, &Document::Map(fields)).unwrap_err();
        assert!(matches!(err, EndpointError::InvalidHostLabel { .. }));
    }

    #[test]
    fn missing_host_label_value_is_fatal() {
        let (registry, input_id) = bucket_input_fixture();
        let index = SchemaIndex::single(registry);
        let input_schema = index.get(&input_id).unwrap();

        let resolver = HostLabelEndpointResolver::new("https://s3.amazonaws.com".parse().unwrap(), "{bucket}.");
        let err = resolver
            .resolve(&EndpointParams::default(), input_schema, &Document::Map(BTreeMap::new()))
            .unwrap_err();
        assert!(matches!(err, EndpointError::MissingHostLabel { .. }));
    }
}
