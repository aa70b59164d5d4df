// SPDX-License-Identifier: MIT OR Apache-2.0
//! Builder for constructing (possibly recursive) shape graphs.

use std::collections::HashMap;

use crate::registry::{SchemaData, SchemaRef, SchemaRegistry};
use crate::shape::{ShapeId, ShapeKind, StructMember, StructureLayout};
use crate::traits::{Trait, TraitKey, TraitMap};

/// Errors raised while building a [`SchemaRegistry`].
#[derive(Debug, Clone, thiserror::Error)]
pub enum SchemaBuildError {
    /// [`SchemaBuilder::define`] was called on a ref that was never reserved.
    #[error("schema ref {0:?} was never reserved")]
    UnknownRef(SchemaRef),
    /// [`SchemaBuilder::define`] was called twice on the same ref.
    #[error("shape {0} was already defined")]
    AlreadyDefined(ShapeId),
    /// [`SchemaBuilder::build`] was called while a reserved ref had no definition.
    #[error("shape {0} was reserved but never defined")]
    Undefined(ShapeId),
    /// A structure declared more than 64 required members in one word and
    /// the caller used the single-word convenience accessor.
    #[error("structure {0} has {1} members, exceeding the per-word bitmask capacity")]
    TooManyMembersForWord(ShapeId, usize),
}

/// Builds a [`SchemaRegistry`], accepting forward references to
/// not-yet-defined shapes so that recursive shape graphs can be expressed.
///
/// ```
/// use rpcforge_schema::builder::SchemaBuilder;
/// use rpcforge_schema::shape::{ShapeId, ShapeKind};
/// use rpcforge_schema::traits::TraitMap;
///
/// let mut b = SchemaBuilder::new();
/// let string_id = ShapeId::new("demo", "String");
/// let string_ref = b.reserve(string_id.clone());
/// b.define(string_ref, ShapeKind::String, TraitMap::new()).unwrap();
/// let registry = b.build().unwrap();
/// assert!(registry.resolve(&string_id).is_some());
/// ```
pub struct SchemaBuilder {
    slots: Vec<Option<(ShapeKind, TraitMap)>>,
    ids: Vec<ShapeId>,
    index: HashMap<ShapeId, SchemaRef>,
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaBuilder {
    /// An empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            ids: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Reserve a slot for `id`, returning a [`SchemaRef`] usable as a member
    /// target before the shape itself is defined.
    ///
    /// Calling `reserve` again with an identifier already reserved returns
    /// the existing ref rather than allocating a new slot, so peer shapes
    /// may reference each other in either order.
    pub fn reserve(&mut self, id: ShapeId) -> SchemaRef {
        if let Some(existing) = self.index.get(&id) {
            return *existing;
        }
        let idx = self.slots.len();
        self.slots.push(None);
        self.ids.push(id.clone());
        let schema_ref = SchemaRef(idx as u32);
        self.index.insert(id, schema_ref);
        schema_ref
    }

    /// Reserve and immediately define a shape in one call, for the common
    /// non-recursive case.
    pub fn define_new(
        &mut self,
        id: ShapeId,
        kind: ShapeKind,
        traits: TraitMap,
    ) -> Result<SchemaRef, SchemaBuildError> {
        let schema_ref = self.reserve(id);
        self.define(schema_ref, kind, traits)?;
        Ok(schema_ref)
    }

    /// Fill in a previously [`reserve`](Self::reserve)d slot.
    pub fn define(
        &mut self,
        schema_ref: SchemaRef,
        kind: ShapeKind,
        traits: TraitMap,
    ) -> Result<(), SchemaBuildError> {
        let idx = schema_ref.0 as usize;
        let id = self
            .ids
            .get(idx)
            .cloned()
            .ok_or(SchemaBuildError::UnknownRef(schema_ref))?;
        let slot = self
            .slots
            .get_mut(idx)
            .ok_or(SchemaBuildError::UnknownRef(schema_ref))?;
        if slot.is_some() {
            return Err(SchemaBuildError::AlreadyDefined(id));
        }
        *slot = Some((kind, traits));
        Ok(())
    }

    /// Build a structure (or union) member list into a [`StructureLayout`],
    /// computing the member-index map and required-bitmask words.
    ///
    /// `members` is `(name, member_schema_ref, is_required)` in declaration
    /// order; `is_required` should reflect whether the member carries the
    /// `required` trait directly (the caller is expected to have put that
    /// trait on the member's own [`TraitMap`] when defining it).
    #[must_use]
    pub fn layout(members: Vec<(String, SchemaRef, bool)>) -> StructureLayout {
        let mut member_index = HashMap::with_capacity(members.len());
        let mut required_words = vec![0u64; members.len().div_ceil(64).max(1)];
        let mut struct_members = Vec::with_capacity(members.len());

        for (i, (name, member_ref, required)) in members.into_iter().enumerate() {
            member_index.insert(name.clone(), i);
            if required {
                required_words[i / 64] |= 1 << (i % 64);
            }
            struct_members.push(StructMember {
                name,
                member_ref,
            });
        }

        StructureLayout {
            members: struct_members,
            member_index,
            required_words,
        }
    }

    /// Freeze the builder into an immutable [`SchemaRegistry`].
    ///
    /// Fails if any reserved ref was never [`define`](Self::define)d.
    pub fn build(self) -> Result<SchemaRegistry, SchemaBuildError> {
        let mut arena = Vec::with_capacity(self.slots.len());
        for (idx, slot) in self.slots.into_iter().enumerate() {
            match slot {
                Some((kind, traits)) => arena.push(SchemaData {
                    id: self.ids[idx].clone(),
                    kind,
                    traits,
                }),
                None => return Err(SchemaBuildError::Undefined(self.ids[idx].clone())),
            }
        }
        Ok(SchemaRegistry {
            arena,
            index: self.index,
        })
    }
}

/// Convenience constructor for a member's own [`TraitMap`], setting
/// [`Trait::Required`] when `required` is `true`.
#[must_use]
pub fn member_traits(required: bool, extra: impl IntoIterator<Item = Trait>) -> TraitMap {
    let mut map = TraitMap::new();
    if required {
        map.insert(Trait::Required);
    }
    for t in extra {
        map.insert(t);
    }
    map
}

/// `true` if a member's trait map carries [`Trait::Required`] directly.
#[must_use]
pub fn is_required(traits: &TraitMap) -> bool {
    traits.has(TraitKey::Required)
}
