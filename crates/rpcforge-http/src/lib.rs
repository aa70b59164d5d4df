// SPDX-License-Identifier: MIT OR Apache-2.0
#![warn(missing_docs)]

//! Projects shape members onto and out of HTTP messages per their
//! `httpLabel`/`httpQuery`/`httpHeader`/`httpPayload`/... traits.
//!
//! Binding failures ([`error::BindingError`]) are always fatal — a missing
//! required label or an unserializable value kind indicates a client bug,
//! not a transient condition, and the retry orchestrator must never retry
//! one.

pub mod body;
pub mod encode;
pub mod error;
pub mod request;
pub mod response;

pub use body::BodyCodec;
pub use error::BindingError;
pub use request::build_request;
pub use response::{extract_error_discriminator, parse_response, ErrorDiscriminator};

#[cfg(test)]
mod tests {
    use rpcforge_schema::{builder, ResolvedSchema, SchemaBuilder, SchemaIndex, ShapeId, ShapeKind, Trait, TraitMap};
    use rpcforge_serde::Document;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use crate::body::BodyCodec;
    use crate::error::BindingError;
    use crate::request::build_request;

    fn get_person_fixture() -> (Arc<rpcforge_schema::SchemaRegistry>, ShapeId, ShapeId) {
        let mut b = SchemaBuilder::new();
        let ns = "demo.people";
        let string_ref = b.define_new(ShapeId::new(ns, "String"), ShapeKind::String, TraitMap::new()).unwrap();

        let mut id_traits = builder::member_traits(true, [Trait::HttpLabel { greedy: false }]);
        id_traits.insert(Trait::Required);
        let id_member = b
            .define_new(ShapeId::member(ns, "GetPersonInput", "id"), ShapeKind::Member { target: string_ref }, id_traits)
            .unwrap();
        let name_member = b
            .define_new(
                ShapeId::member(ns, "GetPersonInput", "name"),
                ShapeKind::Member { target: string_ref },
                builder::member_traits(false, [Trait::HttpQuery { name: "name".to_string() }]),
            )
            .unwrap();

        let input_id = ShapeId::new(ns, "GetPersonInput");
        let layout = SchemaBuilder::layout(vec![
            ("id".to_string(), id_member, true),
            ("name".to_string(), name_member, false),
        ]);
        b.define_new(input_id.clone(), ShapeKind::Structure(layout), TraitMap::new()).unwrap();

        let mut http_traits = TraitMap::new();
        http_traits.insert(Trait::Http {
            method: "GET".to_string(),
            uri: "/persons/{id}".to_string(),
            code: 200,
        });
        let operation_id = ShapeId::new(ns, "GetPerson");
        b.define_new(operation_id.clone(), ShapeKind::Operation, http_traits).unwrap();

        (Arc::new(b.build().unwrap()), operation_id, input_id)
    }

    #[test]
    fn get_request_substitutes_label_and_query() {
        let (registry, operation_id, input_id) = get_person_fixture();
        let index = SchemaIndex::single(registry.clone());
        let operation = index.get(&operation_id).unwrap();
        let input_schema = index.get(&input_id).unwrap();

        let mut input = BTreeMap::new();
        input.insert("id".to_string(), Document::from("abc 123"));
        input.insert("name".to_string(), Document::from("Ada"));

        let request = build_request(
            operation,
            input_schema,
            &Document::Map(input),
            &"https://example.com".parse().unwrap(),
            BodyCodec::Json,
        )
        .unwrap();

        assert_eq!(request.method(), "GET");
        assert_eq!(request.uri().path(), "/persons/abc%20123");
        assert_eq!(request.uri().query(), Some("name=Ada"));
    }

    #[test]
    fn missing_required_label_is_binding_error() {
        let (registry, operation_id, input_id) = get_person_fixture();
        let index = SchemaIndex::single(registry.clone());
        let operation = index.get(&operation_id).unwrap();
        let input_schema = index.get(&input_id).unwrap();

        let err = build_request(
            operation,
            input_schema,
            &Document::Map(BTreeMap::new()),
            &"https://example.com".parse().unwrap(),
            BodyCodec::Json,
        )
        .unwrap_err();
        assert!(matches!(err, BindingError::MissingLabel { .. }));
    }

    #[test]
    fn resolved_schema_round_trips_through_from_parts() {
        let (registry, _, input_id) = get_person_fixture();
        let schema_ref = registry.resolve(&input_id).unwrap();
        let resolved = ResolvedSchema::from_parts(&registry, schema_ref);
        assert_eq!(resolved.id(), &input_id);
    }
}
