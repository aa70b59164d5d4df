// SPDX-License-Identifier: MIT OR Apache-2.0
//! Identity resolvers and the chain that aggregates them.

use std::collections::BTreeMap;

use tracing::trace;

use crate::error::{ChainExhausted, IdentityError};
use crate::identity::{AwsCredentials, Identity, TokenIdentity};

/// Context a resolver may consult — currently free-form key/value pairs
/// (e.g. a configured profile name), kept deliberately open-ended since
/// individual resolvers each care about different inputs.
#[derive(Debug, Clone, Default)]
pub struct IdentityParams {
    values: BTreeMap<String, String>,
}

impl IdentityParams {
    /// An empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a named parameter, returning `self` for chaining.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Read a named parameter, if set.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

/// Produces an [`Identity`], or reports why it could not.
pub trait IdentityResolver: Send + Sync {
    /// Attempt to resolve an identity from this source.
    ///
    /// # Errors
    ///
    /// [`IdentityError::NotFound`] if this source simply has nothing to
    /// offer (a chain should try the next resolver); any other variant is
    /// fatal and aborts the chain.
    fn resolve(&self, params: &IdentityParams) -> Result<Identity, IdentityError>;

    /// A short name for diagnostics and logging.
    fn name(&self) -> &'static str;
}

/// Reads `AWS_ACCESS_KEY_ID` / `AWS_SECRET_ACCESS_KEY` / `AWS_SESSION_TOKEN`
/// from the process environment.
#[derive(Debug, Clone, Default)]
pub struct EnvironmentVariableResolver;

impl EnvironmentVariableResolver {
    /// Construct the resolver.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl IdentityResolver for EnvironmentVariableResolver {
    fn resolve(&self, _params: &IdentityParams) -> Result<Identity, IdentityError> {
        let access_key_id = std::env::var("AWS_ACCESS_KEY_ID")
            .map_err(|_| IdentityError::not_found("AWS_ACCESS_KEY_ID is not set"))?;
        let secret_access_key = std::env::var("AWS_SECRET_ACCESS_KEY")
            .map_err(|_| IdentityError::not_found("AWS_SECRET_ACCESS_KEY is not set"))?;
        let session_token = std::env::var("AWS_SESSION_TOKEN").ok();

        Ok(Identity::AwsCredentials(AwsCredentials {
            access_key_id,
            secret_access_key,
            session_token,
            expiration: None,
        }))
    }

    fn name(&self) -> &'static str {
        "environment"
    }
}

/// Always returns a fixed, caller-supplied identity. Used for static
/// process-wide configuration.
#[derive(Debug, Clone)]
pub struct StaticIdentityResolver {
    identity: Identity,
}

impl StaticIdentityResolver {
    /// Wrap a fixed identity.
    #[must_use]
    pub fn new(identity: Identity) -> Self {
        Self { identity }
    }
}

impl IdentityResolver for StaticIdentityResolver {
    fn resolve(&self, _params: &IdentityParams) -> Result<Identity, IdentityError> {
        Ok(self.identity.clone())
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

/// Adapts an external SDK's credential provider — any closure returning a
/// [`Result<Identity, IdentityError>`] — into an [`IdentityResolver`].
pub struct ExternalProviderResolver {
    name: &'static str,
    provider: Box<dyn Fn(&IdentityParams) -> Result<Identity, IdentityError> + Send + Sync>,
}

impl ExternalProviderResolver {
    /// Wrap `provider`, labeling it `name` for diagnostics.
    pub fn new(
        name: &'static str,
        provider: impl Fn(&IdentityParams) -> Result<Identity, IdentityError> + Send + Sync + 'static,
    ) -> Self {
        Self { name, provider: Box::new(provider) }
    }
}

impl IdentityResolver for ExternalProviderResolver {
    fn resolve(&self, params: &IdentityParams) -> Result<Identity, IdentityError> {
        (self.provider)(params)
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

/// Tries each resolver in order, short-circuiting on the first success.
/// `NotFound` failures are collected as diagnostics and the chain moves on;
/// any other failure aborts and propagates immediately.
#[derive(Default)]
pub struct IdentityResolverChain {
    resolvers: Vec<Box<dyn IdentityResolver>>,
}

impl IdentityResolverChain {
    /// An empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a resolver, returning `self` for chaining.
    #[must_use]
    pub fn with_resolver(mut self, resolver: impl IdentityResolver + 'static) -> Self {
        self.resolvers.push(Box::new(resolver));
        self
    }

    /// Try each resolver in order.
    ///
    /// # Errors
    ///
    /// [`IdentityError::ProviderFailed`] if a resolver fails with a
    /// non-continuable error; a synthesized [`ChainExhausted`], reported
    /// as [`IdentityError::NotFound`] with the aggregated diagnostics, if
    /// every resolver reports "not found".
    pub fn resolve(&self, params: &IdentityParams) -> Result<Identity, IdentityError> {
        let mut diagnostics = Vec::new();
        for resolver in &self.resolvers {
            match resolver.resolve(params) {
                Ok(identity) => {
                    trace!(target: "rpcforge_identity::chain", resolver = resolver.name(), "identity resolved");
                    return Ok(identity);
                }
                Err(err) if err.is_continuable() => {
                    trace!(target: "rpcforge_identity::chain", resolver = resolver.name(), %err, "resolver declined, continuing");
                    diagnostics.push(format!("{}: {err}", resolver.name()));
                }
                Err(err) => return Err(err),
            }
        }
        let exhausted = ChainExhausted { diagnostics };
        Err(IdentityError::not_found(exhausted.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_short_circuits_on_first_success() {
        let identity = Identity::AwsCredentials(AwsCredentials {
            access_key_id: "AKID".to_string(),
            secret_access_key: "secret".to_string(),
            session_token: None,
            expiration: None,
        });
        let chain = IdentityResolverChain::new()
            .with_resolver(ExternalProviderResolver::new("always-fails", |_| {
                Err(IdentityError::not_found("no config file"))
            }))
            .with_resolver(StaticIdentityResolver::new(identity));

        let resolved = chain.resolve(&IdentityParams::new()).unwrap();
        assert_eq!(resolved.type_name(), "aws.credentials");
    }

    #[test]
    fn chain_aborts_immediately_on_non_continuable_error() {
        let chain = IdentityResolverChain::new()
            .with_resolver(ExternalProviderResolver::new("broken-provider", |_| {
                Err(IdentityError::provider_failed("malformed config file"))
            }))
            .with_resolver(StaticIdentityResolver::new(Identity::AwsCredentials(AwsCredentials {
                access_key_id: "AKID".to_string(),
                secret_access_key: "secret".to_string(),
                session_token: None,
                expiration: None,
            })));

        let err = chain.resolve(&IdentityParams::new()).unwrap_err();
        assert!(matches!(err, IdentityError::ProviderFailed { .. }));
    }

    #[test]
    fn chain_exhaustion_aggregates_diagnostics() {
        let chain = IdentityResolverChain::new()
            .with_resolver(ExternalProviderResolver::new("a", |_| Err(IdentityError::not_found("no a"))))
            .with_resolver(ExternalProviderResolver::new("b", |_| Err(IdentityError::not_found("no b"))));

        let err = chain.resolve(&IdentityParams::new()).unwrap_err();
        let IdentityError::NotFound { reason } = err else {
            panic!("expected NotFound");
        };
        assert!(reason.contains("a: no a"));
        assert!(reason.contains("b: no b"));
    }

    #[test]
    fn chain_falls_through_two_empty_resolvers_to_a_static_token_identity() {
        let chain = IdentityResolverChain::new()
            .with_resolver(ExternalProviderResolver::new("empty-a", |_| Err(IdentityError::not_found("empty"))))
            .with_resolver(ExternalProviderResolver::new("empty-b", |_| Err(IdentityError::not_found("empty"))))
            .with_resolver(StaticIdentityResolver::new(Identity::TokenIdentity(TokenIdentity {
                token: "tok".to_string(),
                expiration: None,
            })));

        let resolved = chain.resolve(&IdentityParams::new()).unwrap();
        let Identity::TokenIdentity(token) = resolved else {
            panic!("expected TokenIdentity");
        };
        assert_eq!(token.token, "tok");
    }
}
