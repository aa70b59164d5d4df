//! A minimal, hand-built schema registry for exercising the runtime
//! without a generated client.
//!
//! `echo_operation_schemas` models a single `PUT /items/{id}` operation
//! whose input has one `httpLabel` member, one `httpQuery` member, and
//! one unbound body member — small enough to reason about in a test,
//! rich enough to exercise every HTTP-binding trait kind at once.

use rpcforge_schema::builder::{member_traits, SchemaBuilder};
use rpcforge_schema::shape::{ShapeId, ShapeKind};
use rpcforge_schema::traits::{Trait, TraitMap};
use rpcforge_schema::SchemaRegistry;

const NAMESPACE: &str = "testkit.fixture";

/// The three shape identifiers [`echo_operation_schemas`] builds, so
/// callers can look them up in the returned registry.
pub struct EchoShapeIds {
    /// The operation shape.
    pub operation: ShapeId,
    /// The operation's input structure.
    pub input: ShapeId,
    /// The operation's output structure.
    pub output: ShapeId,
}

/// Build a registry containing one `PUT /items/{id}?tag={tag}` operation
/// plus its input/output structures.
#[must_use]
pub fn echo_operation_schemas() -> (SchemaRegistry, EchoShapeIds) {
    let mut b = SchemaBuilder::new();

    let string_ref = b.define_new(ShapeId::new(NAMESPACE, "String"), ShapeKind::String, TraitMap::new()).unwrap();

    let id_member = b
        .define_new(
            ShapeId::member(NAMESPACE, "EchoInput", "id"),
            ShapeKind::Member { target: string_ref },
            member_traits(true, [Trait::HttpLabel { greedy: false }]),
        )
        .unwrap();
    let tag_member = b
        .define_new(
            ShapeId::member(NAMESPACE, "EchoInput", "tag"),
            ShapeKind::Member { target: string_ref },
            member_traits(false, [Trait::HttpQuery { name: "tag".to_string() }]),
        )
        .unwrap();
    let body_member = b
        .define_new(
            ShapeId::member(NAMESPACE, "EchoInput", "body"),
            ShapeKind::Member { target: string_ref },
            member_traits(false, []),
        )
        .unwrap();

    let input_id = ShapeId::new(NAMESPACE, "EchoInput");
    let input_layout = SchemaBuilder::layout(vec![
        ("id".to_string(), id_member, true),
        ("tag".to_string(), tag_member, false),
        ("body".to_string(), body_member, false),
    ]);
    b.define_new(input_id.clone(), ShapeKind::Structure(input_layout), TraitMap::new()).unwrap();

    let result_member = b
        .define_new(
            ShapeId::member(NAMESPACE, "EchoOutput", "result"),
            ShapeKind::Member { target: string_ref },
            member_traits(false, []),
        )
        .unwrap();
    let output_id = ShapeId::new(NAMESPACE, "EchoOutput");
    let output_layout = SchemaBuilder::layout(vec![("result".to_string(), result_member, false)]);
    b.define_new(output_id.clone(), ShapeKind::Structure(output_layout), TraitMap::new()).unwrap();

    let mut operation_traits = TraitMap::new();
    operation_traits.insert(Trait::Http { method: "PUT".to_string(), uri: "/items/{id}".to_string(), code: 200 });
    operation_traits.insert(Trait::Idempotent);
    let operation_id = ShapeId::new(NAMESPACE, "EchoOperation");
    b.define_new(operation_id.clone(), ShapeKind::Operation, operation_traits).unwrap();

    let registry = b.build().unwrap();
    (registry, EchoShapeIds { operation: operation_id, input: input_id, output: output_id })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_a_resolvable_registry() {
        let (registry, ids) = echo_operation_schemas();
        assert!(registry.resolve(&ids.operation).is_some());
        assert!(registry.resolve(&ids.input).is_some());
        assert!(registry.resolve(&ids.output).is_some());
    }
}
