// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shape identifiers and the closed sum of shape kinds.

use std::fmt;

/// A fully-qualified shape identifier: `namespace#name` or `namespace#name$member`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShapeId {
    namespace: Box<str>,
    name: Box<str>,
    member: Option<Box<str>>,
}

impl ShapeId {
    /// Construct a top-level shape identifier (no member component).
    #[must_use]
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into().into_boxed_str(),
            name: name.into().into_boxed_str(),
            member: None,
        }
    }

    /// Construct a member identifier: `namespace#name$member`.
    #[must_use]
    pub fn member(namespace: impl Into<String>, name: impl Into<String>, member: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into().into_boxed_str(),
            name: name.into().into_boxed_str(),
            member: Some(member.into().into_boxed_str()),
        }
    }

    /// The namespace component.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The shape name component (without namespace or member).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The member name, if this identifier refers to a member.
    #[must_use]
    pub fn member_name(&self) -> Option<&str> {
        self.member.as_deref()
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.namespace, self.name)?;
        if let Some(member) = &self.member {
            write!(f, "${member}")?;
        }
        Ok(())
    }
}

/// A single ordered member of a [`ShapeKind::Structure`] or [`ShapeKind::Union`].
#[derive(Debug, Clone)]
pub struct StructMember {
    /// The member's declared name (Rust-side field name).
    pub name: String,
    /// The [`crate::registry::SchemaRef`] of the member schema (itself a
    /// [`ShapeKind::Member`] pointing at the member's target).
    pub member_ref: crate::registry::SchemaRef,
}

/// Precomputed metadata for a structure or union shape.
#[derive(Debug, Clone, Default)]
pub struct StructureLayout {
    /// Members in declaration order.
    pub members: Vec<StructMember>,
    /// Member name to index in `members`, for O(1) lookup.
    pub member_index: std::collections::HashMap<String, usize>,
    /// One 64-bit word per 64 members; bit `i` is set iff `members[i]` (mod
    /// 64 within its word) carries the `required` trait directly.
    pub required_words: Vec<u64>,
}

impl StructureLayout {
    /// The index of a member by name, if present.
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.member_index.get(name).copied()
    }

    /// `true` if the member at `index` is required.
    #[must_use]
    pub fn is_required(&self, index: usize) -> bool {
        let word = index / 64;
        let bit = index % 64;
        self.required_words
            .get(word)
            .is_some_and(|w| w & (1 << bit) != 0)
    }

    /// The combined required bitmask, valid only when `members.len() <= 64`.
    /// Structures with more than 64 required members must use
    /// [`StructureLayout::required_words`] directly.
    #[must_use]
    pub fn required_bitmask(&self) -> u64 {
        self.required_words.first().copied().unwrap_or(0)
    }
}

/// The closed sum of Smithy-style shape kinds a [`crate::registry::Schema`]
/// can describe.
#[derive(Debug, Clone)]
pub enum ShapeKind {
    /// Arbitrary binary data.
    Blob,
    /// A boolean.
    Boolean,
    /// An 8-bit signed integer.
    Byte,
    /// A 16-bit signed integer.
    Short,
    /// A 32-bit signed integer.
    Integer,
    /// A 64-bit signed integer.
    Long,
    /// A 32-bit IEEE-754 float.
    Float,
    /// A 64-bit IEEE-754 float.
    Double,
    /// An arbitrary-precision integer.
    BigInteger,
    /// An arbitrary-precision decimal.
    BigDecimal,
    /// A UTF-8 string.
    String,
    /// A point in time.
    Timestamp,
    /// A polymorphic, lazily-typed value.
    Document,
    /// A homogeneous ordered sequence.
    List {
        /// Schema of the member shape (a [`ShapeKind::Member`]).
        member: crate::registry::SchemaRef,
    },
    /// A homogeneous string-keyed map.
    Map {
        /// Schema of the key shape (a [`ShapeKind::Member`]).
        key: crate::registry::SchemaRef,
        /// Schema of the value shape (a [`ShapeKind::Member`]).
        value: crate::registry::SchemaRef,
    },
    /// A homogeneous unordered collection with unique members.
    Set {
        /// Schema of the member shape (a [`ShapeKind::Member`]).
        member: crate::registry::SchemaRef,
    },
    /// A heterogeneous, named aggregate of members.
    Structure(StructureLayout),
    /// A tagged union of exactly-one-of a set of members.
    Union(StructureLayout),
    /// A closed set of named string values.
    Enum {
        /// The allowed values, in declaration order.
        values: Vec<String>,
    },
    /// A closed set of named integer values.
    IntEnum {
        /// The allowed values, in declaration order.
        values: Vec<i32>,
    },
    /// A modeled service.
    Service,
    /// A modeled operation.
    Operation,
    /// A modeled resource.
    Resource,
    /// A member of a structure, union, list, map, or set; resolves to a
    /// target schema via [`crate::registry::SchemaRegistry::member_target`].
    Member {
        /// The schema this member refers to.
        target: crate::registry::SchemaRef,
    },
}

impl ShapeKind {
    /// `true` for [`ShapeKind::Member`].
    #[must_use]
    pub fn is_member(&self) -> bool {
        matches!(self, Self::Member { .. })
    }

    /// The structure layout, if this is a [`ShapeKind::Structure`] or
    /// [`ShapeKind::Union`].
    #[must_use]
    pub fn structure_layout(&self) -> Option<&StructureLayout> {
        match self {
            Self::Structure(layout) | Self::Union(layout) => Some(layout),
            _ => None,
        }
    }
}
