// SPDX-License-Identifier: MIT OR Apache-2.0
//! Trait metadata attached to shapes and members.

/// A single piece of typed metadata attached to a shape or member.
///
/// Traits are looked up by their [`TraitKey`] discriminant, not by the full
/// value, so a schema can hold at most one instance of each trait kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Trait {
    /// The member must be present for the structure to be valid.
    Required,
    /// Rendered values for this shape/member are redacted in diagnostics.
    Sensitive,
    /// The member fills a `{label}` segment of the operation's URI template.
    HttpLabel {
        /// Whether `/` in the value is preserved rather than percent-encoded.
        greedy: bool,
    },
    /// The member is bound to a single query string parameter.
    HttpQuery {
        /// The query parameter name.
        name: String,
    },
    /// The member (a map) absorbs all query parameters not otherwise bound.
    HttpQueryParams,
    /// The member is bound to a single HTTP header.
    HttpHeader {
        /// The header name.
        name: String,
    },
    /// The member (a map) is bound to headers sharing a key prefix.
    HttpPrefixHeaders {
        /// The shared header-name prefix.
        prefix: String,
    },
    /// The member is the entire HTTP message body.
    HttpPayload,
    /// The member (an integer) is set from the HTTP response status code.
    HttpResponseCode,
    /// Operation-level method/URI-template/default-status binding.
    Http {
        /// The HTTP method (`GET`, `PUT`, ...).
        method: String,
        /// The URI template, e.g. `/persons/{name}`.
        uri: String,
        /// Default success status code.
        code: u16,
    },
    /// The member contributes a segment to the endpoint host prefix.
    HostLabel,
    /// Marks a structure as a modeled error shape.
    Error {
        /// Whether clients should retry on this error.
        retryable: bool,
        /// Whether the error should receive throttling-specific backoff.
        throttling: bool,
        /// The HTTP status this error maps to, if fixed.
        http_status: Option<u16>,
    },
    /// The operation is safe to retry because it has no side effects.
    Readonly,
    /// The operation is safe to retry because repeating it is a no-op.
    Idempotent,
    /// Omit the request body entirely when no unbound members are present.
    OmitEmptyPayload,
    /// Controls how a timestamp member is rendered/parsed on the wire.
    TimestampFormat(TimestampFormat),
    /// Overrides the `Content-Type` used when this member is the payload.
    MediaType(String),
    /// Overrides the wire name used for this member (vs. its Rust name).
    JsonName(String),
    /// Minimum/maximum length constraint (strings, lists, maps, blobs).
    Length {
        /// Inclusive minimum length, if any.
        min: Option<u64>,
        /// Inclusive maximum length, if any.
        max: Option<u64>,
    },
    /// Minimum/maximum numeric range constraint.
    Range {
        /// Inclusive minimum value, if any.
        min: Option<i64>,
        /// Inclusive maximum value, if any.
        max: Option<i64>,
    },
    /// A regular-expression constraint on a string value.
    Pattern(String),
}

/// Wire-format representation for a `Timestamp` shape or member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampFormat {
    /// RFC 3339 date-time string.
    DateTime,
    /// RFC 7231 HTTP-date string.
    HttpDate,
    /// Seconds since the Unix epoch, as a number.
    EpochSeconds,
}

/// Discriminant-only key used to index [`Trait`] values in a [`TraitMap`].
///
/// One variant per [`Trait`] variant; carries no data so it is cheap to use
/// as a hash map key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraitKey {
    /// See [`Trait::Required`].
    Required,
    /// See [`Trait::Sensitive`].
    Sensitive,
    /// See [`Trait::HttpLabel`].
    HttpLabel,
    /// See [`Trait::HttpQuery`].
    HttpQuery,
    /// See [`Trait::HttpQueryParams`].
    HttpQueryParams,
    /// See [`Trait::HttpHeader`].
    HttpHeader,
    /// See [`Trait::HttpPrefixHeaders`].
    HttpPrefixHeaders,
    /// See [`Trait::HttpPayload`].
    HttpPayload,
    /// See [`Trait::HttpResponseCode`].
    HttpResponseCode,
    /// See [`Trait::Http`].
    Http,
    /// See [`Trait::HostLabel`].
    HostLabel,
    /// See [`Trait::Error`].
    Error,
    /// See [`Trait::Readonly`].
    Readonly,
    /// See [`Trait::Idempotent`].
    Idempotent,
    /// See [`Trait::OmitEmptyPayload`].
    OmitEmptyPayload,
    /// See [`Trait::TimestampFormat`].
    TimestampFormat,
    /// See [`Trait::MediaType`].
    MediaType,
    /// See [`Trait::JsonName`].
    JsonName,
    /// See [`Trait::Length`].
    Length,
    /// See [`Trait::Range`].
    Range,
    /// See [`Trait::Pattern`].
    Pattern,
}

impl Trait {
    /// The discriminant key for this trait value.
    #[must_use]
    pub fn key(&self) -> TraitKey {
        match self {
            Self::Required => TraitKey::Required,
            Self::Sensitive => TraitKey::Sensitive,
            Self::HttpLabel { .. } => TraitKey::HttpLabel,
            Self::HttpQuery { .. } => TraitKey::HttpQuery,
            Self::HttpQueryParams => TraitKey::HttpQueryParams,
            Self::HttpHeader { .. } => TraitKey::HttpHeader,
            Self::HttpPrefixHeaders { .. } => TraitKey::HttpPrefixHeaders,
            Self::HttpPayload => TraitKey::HttpPayload,
            Self::HttpResponseCode => TraitKey::HttpResponseCode,
            Self::Http { .. } => TraitKey::Http,
            Self::HostLabel => TraitKey::HostLabel,
            Self::Error { .. } => TraitKey::Error,
            Self::Readonly => TraitKey::Readonly,
            Self::Idempotent => TraitKey::Idempotent,
            Self::OmitEmptyPayload => TraitKey::OmitEmptyPayload,
            Self::TimestampFormat(_) => TraitKey::TimestampFormat,
            Self::MediaType(_) => TraitKey::MediaType,
            Self::JsonName(_) => TraitKey::JsonName,
            Self::Length { .. } => TraitKey::Length,
            Self::Range { .. } => TraitKey::Range,
            Self::Pattern(_) => TraitKey::Pattern,
        }
    }
}

/// An O(1)-lookup collection of a shape or member's direct traits.
#[derive(Debug, Clone, Default)]
pub struct TraitMap {
    entries: std::collections::HashMap<TraitKey, Trait>,
}

impl TraitMap {
    /// An empty trait map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a trait map from an iterator of traits. Later entries with the
    /// same key overwrite earlier ones.
    #[must_use]
    pub fn from_iter(traits: impl IntoIterator<Item = Trait>) -> Self {
        let mut map = Self::new();
        for t in traits {
            map.insert(t);
        }
        map
    }

    /// Insert a trait, overwriting any existing value with the same key.
    pub fn insert(&mut self, t: Trait) {
        self.entries.insert(t.key(), t);
    }

    /// Look up a trait by key.
    #[must_use]
    pub fn get(&self, key: TraitKey) -> Option<&Trait> {
        self.entries.get(&key)
    }

    /// `true` if a trait with the given key is present.
    #[must_use]
    pub fn has(&self, key: TraitKey) -> bool {
        self.entries.contains_key(&key)
    }

    /// Iterate over all traits in this map.
    pub fn iter(&self) -> impl Iterator<Item = &Trait> {
        self.entries.values()
    }
}
