//! Client construction: the option set the builder accepts and a client's
//! frozen, shareable configuration.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use rpcforge_endpoint::EndpointResolver;
use rpcforge_http::BodyCodec;
use rpcforge_identity::{AuthScheme, IdentityResolverChain};
use rpcforge_retry::{RetryStrategy, StandardRetryStrategy};
use rpcforge_runtime::{Interceptor, InterceptorChain, ReqwestTransport, Transport};
use rpcforge_schema::SchemaIndex;
use rpcforge_sigv4::Signer;

/// Builds a [`crate::Client`] from its component parts.
///
/// Once [`build`](ClientBuilder::build) is called the result is
/// effectively read-only: nothing about a built client's signing,
/// retry, or interceptor configuration can change afterward, only
/// per-call overrides layered on top by [`crate::CallConfigOverrides`].
pub struct ClientBuilder {
    schemas: SchemaIndex,
    endpoint_resolver: Option<Arc<dyn EndpointResolver>>,
    auth_schemes: BTreeMap<String, AuthScheme>,
    identity_chain: IdentityResolverChain,
    retry_strategy: Option<Arc<dyn RetryStrategy>>,
    interceptors: InterceptorChain,
    transport: Option<Arc<dyn Transport>>,
    default_timeout: Duration,
    body_codec: BodyCodec,
    region: Option<String>,
    signing_key_cache_capacity: usize,
}

impl ClientBuilder {
    /// Start a builder over the given schema index. The index is the one
    /// piece of configuration every operation lookup depends on, so it's
    /// required up front rather than defaulted.
    #[must_use]
    pub fn new(schemas: SchemaIndex) -> Self {
        Self {
            schemas,
            endpoint_resolver: None,
            auth_schemes: BTreeMap::new(),
            identity_chain: IdentityResolverChain::new(),
            retry_strategy: None,
            interceptors: InterceptorChain::new(),
            transport: None,
            default_timeout: Duration::from_secs(30),
            body_codec: BodyCodec::Json,
            region: None,
            signing_key_cache_capacity: 256,
        }
    }

    /// Set the endpoint resolver. Required; [`build`](Self::build) fails
    /// without one.
    #[must_use]
    pub fn endpoint_resolver(mut self, resolver: impl EndpointResolver + 'static) -> Self {
        self.endpoint_resolver = Some(Arc::new(resolver));
        self
    }

    /// Register an auth scheme by its scheme identifier, matching what
    /// operations list in their `AuthSchemeOption::scheme_id`.
    #[must_use]
    pub fn auth_scheme(mut self, scheme: AuthScheme) -> Self {
        self.auth_schemes.insert(scheme.scheme_id.clone(), scheme);
        self
    }

    /// Append an identity resolver to the chain, tried in registration order.
    #[must_use]
    pub fn identity_resolver(mut self, resolver: impl rpcforge_identity::IdentityResolver + 'static) -> Self {
        self.identity_chain = self.identity_chain.with_resolver(resolver);
        self
    }

    /// Override the default retry strategy (exponential backoff with full
    /// jitter over a token bucket).
    #[must_use]
    pub fn retry_strategy(mut self, strategy: impl RetryStrategy + 'static) -> Self {
        self.retry_strategy = Some(Arc::new(strategy));
        self
    }

    /// Append an interceptor, firing in registration order.
    #[must_use]
    pub fn interceptor(mut self, interceptor: impl Interceptor + 'static) -> Self {
        self.interceptors = self.interceptors.with_interceptor(interceptor);
        self
    }

    /// Override the transport. Defaults to [`ReqwestTransport`].
    #[must_use]
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Set the per-call deadline used when a call doesn't override it.
    #[must_use]
    pub fn default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Select the wire codec (and therefore the protocol's body format).
    #[must_use]
    pub fn body_codec(mut self, codec: BodyCodec) -> Self {
        self.body_codec = codec;
        self
    }

    /// Set the default signing region, used when an operation's auth
    /// scheme option doesn't carry its own region override.
    #[must_use]
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Override the signing-key LRU cache capacity.
    #[must_use]
    pub fn signing_key_cache_capacity(mut self, capacity: usize) -> Self {
        self.signing_key_cache_capacity = capacity;
        self
    }

    /// Finalize the builder into a [`crate::Client`].
    ///
    /// # Errors
    ///
    /// Fails if no endpoint resolver was configured.
    pub fn build(self) -> Result<crate::Client, ClientBuildError> {
        let endpoint_resolver = self.endpoint_resolver.ok_or(ClientBuildError::MissingEndpointResolver)?;
        let transport = self.transport.unwrap_or_else(|| Arc::new(ReqwestTransport::default()));
        let retry_strategy = self.retry_strategy.unwrap_or_else(|| Arc::new(StandardRetryStrategy::default()));

        let components = rpcforge_runtime::RuntimeComponents {
            auth_schemes: self.auth_schemes,
            identity_chain: self.identity_chain,
            endpoint_resolver,
            retry_strategy,
            interceptors: self.interceptors,
            transport,
            body_codec: self.body_codec,
            metrics: rpcforge_telemetry::MetricsCollector::default(),
            default_timeout: self.default_timeout,
            signer: Signer::with_cache_capacity(self.signing_key_cache_capacity),
        };

        Ok(crate::Client { schemas: Arc::new(self.schemas), components: Arc::new(components), region: self.region })
    }
}

/// Why [`ClientBuilder::build`] refused to produce a client.
#[derive(Debug, thiserror::Error)]
pub enum ClientBuildError {
    /// No endpoint resolver was registered.
    #[error("client requires an endpoint resolver")]
    MissingEndpointResolver,
}

/// Per-call overrides layered on top of the client's default configuration.
///
/// Unset fields fall back to the client's defaults; this is the `per-call-config`
/// argument operations accept alongside their input.
#[derive(Debug, Clone, Default)]
pub struct CallConfigOverrides {
    /// Overrides the client's default per-call deadline.
    pub timeout: Option<Duration>,
}
