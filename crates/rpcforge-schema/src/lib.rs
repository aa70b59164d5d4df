// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Precompiled, reference-stable shape graph for the rpcforge client
//! runtime.
//!
//! Shapes are built once (by generated code or a dynamic loader) via
//! [`builder::SchemaBuilder`], then frozen into an immutable
//! [`registry::SchemaRegistry`] that every other crate in the workspace
//! queries by [`SchemaRef`](registry::SchemaRef) rather than by name —
//! trait lookup, member ordering, and required-member validation are all
//! O(1) against the frozen arena.

pub mod builder;
pub mod registry;
pub mod shape;
pub mod traits;

pub use builder::{SchemaBuildError, SchemaBuilder};
pub use registry::{ResolvedSchema, SchemaIndex, SchemaRef, SchemaRegistry};
pub use shape::{ShapeId, ShapeKind, StructMember, StructureLayout};
pub use traits::{Trait, TraitKey, TraitMap, TimestampFormat};

#[cfg(test)]
mod tests {
    use super::*;

    fn build_person_schema() -> (SchemaRegistry, ShapeId) {
        let mut b = SchemaBuilder::new();

        let ns = "demo.person";
        let string_ref = b
            .define_new(ShapeId::new(ns, "String"), ShapeKind::String, TraitMap::new())
            .unwrap();
        let int_ref = b
            .define_new(ShapeId::new(ns, "Integer"), ShapeKind::Integer, TraitMap::new())
            .unwrap();

        let name_member = b
            .define_new(
                ShapeId::member(ns, "Person", "name"),
                ShapeKind::Member { target: string_ref },
                builder::member_traits(true, []),
            )
            .unwrap();
        let age_member = b
            .define_new(
                ShapeId::member(ns, "Person", "age"),
                ShapeKind::Member { target: int_ref },
                builder::member_traits(false, []),
            )
            .unwrap();

        let person_id = ShapeId::new(ns, "Person");
        let layout = SchemaBuilder::layout(vec![
            ("name".to_string(), name_member, true),
            ("age".to_string(), age_member, false),
        ]);
        b.define_new(person_id.clone(), ShapeKind::Structure(layout), TraitMap::new())
            .unwrap();

        (b.build().unwrap(), person_id)
    }

    #[test]
    fn required_bitmask_has_one_bit_per_required_member() {
        let (registry, person_id) = build_person_schema();
        let person_ref = registry.resolve(&person_id).unwrap();
        assert_eq!(registry.required_bitmask(person_ref), 0b01);
    }

    #[test]
    fn member_target_resolves_through_member_schema() {
        let (registry, person_id) = build_person_schema();
        let person_ref = registry.resolve(&person_id).unwrap();
        let (_, name_ref) = registry.struct_member(person_ref, "name").unwrap();
        let target = registry.member_target(name_ref);
        assert!(matches!(registry.kind_of(target), ShapeKind::String));
    }

    #[test]
    fn unresolved_member_target_fails_build() {
        let mut b = SchemaBuilder::new();
        let dangling = b.reserve(ShapeId::new("demo", "Dangling"));
        b.define_new(
            ShapeId::member("demo", "Widget", "target"),
            ShapeKind::Member { target: dangling },
            TraitMap::new(),
        )
        .unwrap();
        let err = b.build().unwrap_err();
        assert!(matches!(err, SchemaBuildError::Undefined(_)));
    }

    #[test]
    fn recursive_structures_build_successfully() {
        // LinkedNode { value: String, next: LinkedNode (optional) }
        let mut b = SchemaBuilder::new();
        let ns = "demo.recursive";
        let string_ref = b
            .define_new(ShapeId::new(ns, "String"), ShapeKind::String, TraitMap::new())
            .unwrap();

        let node_id = ShapeId::new(ns, "LinkedNode");
        let node_ref = b.reserve(node_id.clone());

        let value_member = b
            .define_new(
                ShapeId::member(ns, "LinkedNode", "value"),
                ShapeKind::Member { target: string_ref },
                builder::member_traits(true, []),
            )
            .unwrap();
        let next_member = b
            .define_new(
                ShapeId::member(ns, "LinkedNode", "next"),
                ShapeKind::Member { target: node_ref },
                builder::member_traits(false, []),
            )
            .unwrap();

        let layout = SchemaBuilder::layout(vec![
            ("value".to_string(), value_member, true),
            ("next".to_string(), next_member, false),
        ]);
        b.define(node_ref, ShapeKind::Structure(layout), TraitMap::new())
            .unwrap();

        let registry = b.build().unwrap();
        let resolved = registry.resolve(&node_id).unwrap();
        let (_, next_ref) = registry.struct_member(resolved, "next").unwrap();
        assert_eq!(registry.member_target(next_ref), resolved);
    }

    #[test]
    fn trait_lookup_prefers_member_over_target() {
        let mut b = SchemaBuilder::new();
        let ns = "demo.traits";
        let mut string_traits = TraitMap::new();
        string_traits.insert(Trait::Sensitive);
        let string_ref = b
            .define_new(ShapeId::new(ns, "String"), ShapeKind::String, string_traits)
            .unwrap();

        // member overrides with no sensitive trait of its own -> falls back to target
        let member_ref = b
            .define_new(
                ShapeId::member(ns, "Widget", "plain"),
                ShapeKind::Member { target: string_ref },
                TraitMap::new(),
            )
            .unwrap();
        let registry = b.build().unwrap();
        assert!(registry
            .effective_trait(member_ref, TraitKey::Sensitive)
            .is_some());
    }

    #[test]
    fn schema_index_reports_first_registered_wins_on_collision() {
        let mut a = SchemaBuilder::new();
        a.define_new(ShapeId::new("demo", "Dup"), ShapeKind::String, TraitMap::new())
            .unwrap();
        let reg_a = std::sync::Arc::new(a.build().unwrap());

        let mut b = SchemaBuilder::new();
        b.define_new(ShapeId::new("demo", "Dup"), ShapeKind::Integer, TraitMap::new())
            .unwrap();
        let reg_b = std::sync::Arc::new(b.build().unwrap());

        let (index, conflicts) = SchemaIndex::union(vec![reg_a, reg_b]);
        assert_eq!(conflicts, vec![ShapeId::new("demo", "Dup")]);
        let resolved = index.get(&ShapeId::new("demo", "Dup")).unwrap();
        assert!(matches!(resolved.kind(), ShapeKind::String));
    }
}
