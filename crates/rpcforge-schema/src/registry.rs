// SPDX-License-Identifier: MIT OR Apache-2.0
//! The frozen, arena-backed shape graph and its query surface.

use std::collections::HashMap;
use std::sync::Arc;

use crate::shape::{ShapeId, ShapeKind};
use crate::traits::{Trait, TraitKey, TraitMap};

/// A stable, `Copy`-able index into a [`SchemaRegistry`]'s arena.
///
/// Two `SchemaRef`s compare equal iff they index the same slot in the same
/// registry; the registry never reuses or relocates a slot after `build()`,
/// so references stay valid for the registry's lifetime. Comparing refs
/// from two different registries is meaningless and not guarded against —
/// callers that combine registries should go through [`SchemaIndex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SchemaRef(pub(crate) u32);

impl SchemaRef {
    /// The raw arena index. Exposed for diagnostics; not meaningful across
    /// registries.
    #[must_use]
    pub fn index(self) -> u32 {
        self.0
    }
}

#[derive(Debug, Clone)]
pub(crate) struct SchemaData {
    pub(crate) id: ShapeId,
    pub(crate) kind: ShapeKind,
    pub(crate) traits: TraitMap,
}

/// An immutable, frozen shape graph.
///
/// Built once via [`crate::builder::SchemaBuilder`], then shared freely —
/// all query methods take `&self` and never mutate the arena.
#[derive(Debug)]
pub struct SchemaRegistry {
    pub(crate) arena: Vec<SchemaData>,
    pub(crate) index: HashMap<ShapeId, SchemaRef>,
}

impl SchemaRegistry {
    /// Look up a schema by its shape identifier.
    #[must_use]
    pub fn resolve(&self, id: &ShapeId) -> Option<SchemaRef> {
        self.index.get(id).copied()
    }

    /// The shape identifier of a schema.
    #[must_use]
    pub fn id_of(&self, schema: SchemaRef) -> &ShapeId {
        &self.data(schema).id
    }

    /// The shape kind of a schema.
    #[must_use]
    pub fn kind_of(&self, schema: SchemaRef) -> &ShapeKind {
        &self.data(schema).kind
    }

    /// The target schema a member schema resolves to.
    ///
    /// # Panics
    ///
    /// Panics if `schema` is not a [`ShapeKind::Member`] — callers that
    /// don't already know the schema is a member should check
    /// [`ShapeKind::is_member`] first.
    #[must_use]
    pub fn member_target(&self, schema: SchemaRef) -> SchemaRef {
        match self.kind_of(schema) {
            ShapeKind::Member { target } => *target,
            other => panic!("member_target called on non-member shape kind {other:?}"),
        }
    }

    /// The effective trait for `key` on `schema`.
    ///
    /// For a member schema, the member's own (direct) traits take priority;
    /// if absent there, the target's traits are consulted. For any other
    /// schema, only its own traits are consulted.
    #[must_use]
    pub fn effective_trait(&self, schema: SchemaRef, key: TraitKey) -> Option<&Trait> {
        let data = self.data(schema);
        if let Some(t) = data.traits.get(key) {
            return Some(t);
        }
        if let ShapeKind::Member { target } = data.kind {
            return self.data(target).traits.get(key);
        }
        None
    }

    /// The direct traits of `schema`, ignoring any member target.
    #[must_use]
    pub fn direct_traits(&self, schema: SchemaRef) -> &TraitMap {
        &self.data(schema).traits
    }

    /// The required-bitmask words for a structure or union schema.
    ///
    /// Returns an empty slice for any other shape kind.
    #[must_use]
    pub fn required_words(&self, schema: SchemaRef) -> &[u64] {
        match self.kind_of(schema) {
            ShapeKind::Structure(layout) | ShapeKind::Union(layout) => &layout.required_words,
            _ => &[],
        }
    }

    /// The single-word required bitmask for a structure with at most 64
    /// required members. Structures with more must use
    /// [`SchemaRegistry::required_words`].
    #[must_use]
    pub fn required_bitmask(&self, schema: SchemaRef) -> u64 {
        self.required_words(schema).first().copied().unwrap_or(0)
    }

    /// The allowed string values of an `Enum` shape, in declaration order.
    #[must_use]
    pub fn string_enum_values(&self, schema: SchemaRef) -> Option<&[String]> {
        match self.kind_of(schema) {
            ShapeKind::Enum { values } => Some(values),
            _ => None,
        }
    }

    /// The allowed integer values of an `IntEnum` shape, in declaration order.
    #[must_use]
    pub fn int_enum_values(&self, schema: SchemaRef) -> Option<&[i32]> {
        match self.kind_of(schema) {
            ShapeKind::IntEnum { values } => Some(values),
            _ => None,
        }
    }

    /// Resolve a member of a structure or union by name, returning its
    /// member schema ref and declaration index.
    #[must_use]
    pub fn struct_member(&self, schema: SchemaRef, name: &str) -> Option<(usize, SchemaRef)> {
        let layout = self.kind_of(schema).structure_layout()?;
        let idx = layout.index_of(name)?;
        Some((idx, layout.members[idx].member_ref))
    }

    /// Number of schemas in the arena.
    #[must_use]
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    /// `true` if the arena holds no schemas.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    fn data(&self, schema: SchemaRef) -> &SchemaData {
        &self.arena[schema.0 as usize]
    }
}

/// A schema resolved through a [`SchemaIndex`], bundling the owning
/// registry with the ref so callers don't need to thread both around.
#[derive(Clone, Copy)]
pub struct ResolvedSchema<'a> {
    registry: &'a SchemaRegistry,
    schema_ref: SchemaRef,
}

impl<'a> ResolvedSchema<'a> {
    /// Bundle a registry reference with a ref known to be valid in it.
    ///
    /// Used by consumers (binding layers, codecs) that already hold a
    /// `&SchemaRegistry` and a `SchemaRef` obtained from it directly —
    /// e.g. a member ref returned by [`SchemaRegistry::struct_member`] —
    /// without going through a [`SchemaIndex`].
    #[must_use]
    pub fn from_parts(registry: &'a SchemaRegistry, schema_ref: SchemaRef) -> Self {
        Self { registry, schema_ref }
    }

    /// The underlying registry.
    #[must_use]
    pub fn registry(&self) -> &'a SchemaRegistry {
        self.registry
    }

    /// The underlying schema ref, valid within [`ResolvedSchema::registry`].
    #[must_use]
    pub fn schema_ref(&self) -> SchemaRef {
        self.schema_ref
    }

    /// The shape identifier.
    #[must_use]
    pub fn id(&self) -> &'a ShapeId {
        self.registry.id_of(self.schema_ref)
    }

    /// The shape kind.
    #[must_use]
    pub fn kind(&self) -> &'a ShapeKind {
        self.registry.kind_of(self.schema_ref)
    }

    /// The effective trait for `key`, per [`SchemaRegistry::effective_trait`].
    #[must_use]
    pub fn effective_trait(&self, key: TraitKey) -> Option<&'a Trait> {
        self.registry.effective_trait(self.schema_ref, key)
    }
}

/// A union of independently-built [`SchemaRegistry`]s, queryable by shape
/// identifier as though they were one registry.
///
/// On identifier collision across input registries, the first-registered
/// definition wins; collisions are reported back to the caller via
/// [`SchemaIndex::union`]'s return value rather than silently dropped.
pub struct SchemaIndex {
    registries: Vec<Arc<SchemaRegistry>>,
    lookup: HashMap<ShapeId, (usize, SchemaRef)>,
}

impl SchemaIndex {
    /// Combine multiple registries into one lookup surface.
    ///
    /// Returns the index plus the list of shape identifiers that were
    /// defined in more than one input registry (the first registry's
    /// definition is kept for each).
    #[must_use]
    pub fn union(registries: Vec<Arc<SchemaRegistry>>) -> (Self, Vec<ShapeId>) {
        let mut lookup = HashMap::new();
        let mut conflicts = Vec::new();
        for (reg_idx, registry) in registries.iter().enumerate() {
            for (id, schema_ref) in &registry.index {
                if lookup.contains_key(id) {
                    conflicts.push(id.clone());
                    continue;
                }
                lookup.insert(id.clone(), (reg_idx, *schema_ref));
            }
        }
        (
            Self {
                registries,
                lookup,
            },
            conflicts,
        )
    }

    /// Build an index over a single registry (no possibility of conflict).
    #[must_use]
    pub fn single(registry: Arc<SchemaRegistry>) -> Self {
        let (index, conflicts) = Self::union(vec![registry]);
        debug_assert!(conflicts.is_empty());
        index
    }

    /// Resolve a shape identifier to its schema, across every combined registry.
    #[must_use]
    pub fn get(&self, id: &ShapeId) -> Option<ResolvedSchema<'_>> {
        let (reg_idx, schema_ref) = *self.lookup.get(id)?;
        Some(ResolvedSchema {
            registry: &self.registries[reg_idx],
            schema_ref,
        })
    }

    /// Number of distinct shape identifiers visible through this index.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lookup.len()
    }

    /// `true` if the index has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lookup.is_empty()
    }
}
