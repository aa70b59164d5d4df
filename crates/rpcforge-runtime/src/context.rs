//! The typed, per-call property bag that flows through every interceptor
//! phase and into the signer.
//!
//! Keys are types, not strings: any `Send + Sync + 'static` value can be
//! stashed and later retrieved by its own type, the same storage model
//! `http::Extensions` already gives request/response objects elsewhere in
//! this workspace.

use std::collections::BTreeMap;

/// Per-call context: a type-keyed extension bag plus a string snapshot used
/// to populate [`rpcforge_error::ErrorContext`] on failure.
#[derive(Default)]
pub struct CallContext {
    extensions: http::Extensions,
    snapshot: BTreeMap<String, String>,
}

impl CallContext {
    /// Start an empty context for `operation_id`.
    #[must_use]
    pub fn new(operation_id: impl Into<String>) -> Self {
        let mut ctx = Self::default();
        ctx.snapshot.insert("operation".to_string(), operation_id.into());
        ctx
    }

    /// Insert a typed value, overwriting any existing value of the same type.
    pub fn insert<T: Clone + Send + Sync + 'static>(&mut self, value: T) {
        self.extensions.insert(value);
    }

    /// Look up a value by type.
    #[must_use]
    pub fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions.get::<T>()
    }

    /// Record a diagnostic key/value pair surfaced in error reporting.
    pub fn record(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.snapshot.insert(key.into(), value.into());
    }

    /// The diagnostic snapshot recorded so far.
    #[must_use]
    pub fn snapshot(&self) -> &BTreeMap<String, String> {
        &self.snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_value_round_trips() {
        let mut ctx = CallContext::new("GetWidget");
        ctx.insert(42u32);
        assert_eq!(ctx.get::<u32>(), Some(&42));
    }

    #[test]
    fn snapshot_seeds_operation_name() {
        let ctx = CallContext::new("GetWidget");
        assert_eq!(ctx.snapshot().get("operation").map(String::as_str), Some("GetWidget"));
    }

    #[test]
    fn missing_type_is_none() {
        let ctx = CallContext::new("GetWidget");
        assert_eq!(ctx.get::<u64>(), None);
    }
}
