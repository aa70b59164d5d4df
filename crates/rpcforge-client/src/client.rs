//! The generated-client surface: a frozen set of runtime components plus
//! the generic `call` entry point every operation goes through.

use std::future::Future;
use std::sync::Arc;

use rpcforge_error::{ErrorContext, ErrorKind, SdkError};
use rpcforge_identity::AuthSchemeOption;
use rpcforge_runtime::{CancellationToken, OperationConfig, RuntimeComponents};
use rpcforge_schema::SchemaIndex;
use rpcforge_serde::Document;
use rpcforge_waiter::{run_waiter, Acceptor, PollResult, Poller, WaiterConfig, WaiterError};

use crate::config::CallConfigOverrides;
use crate::operation::Operation;

/// A constructed client: immutable configuration shared across every call
/// made through it. Cheap to clone — internally an `Arc`.
#[derive(Clone)]
pub struct Client {
    pub(crate) schemas: Arc<SchemaIndex>,
    pub(crate) components: Arc<RuntimeComponents>,
    pub(crate) region: Option<String>,
}

impl Client {
    /// Start building a client over the given schema index.
    #[must_use]
    pub fn builder(schemas: SchemaIndex) -> crate::ClientBuilder {
        crate::ClientBuilder::new(schemas)
    }

    /// Invoke an operation: encode the typed input, run it through the
    /// call orchestrator (identity, signing, transport, retry,
    /// interceptors), and decode the result back into the operation's
    /// typed output or error.
    ///
    /// # Errors
    ///
    /// Returns [`SdkError<O::Error>`] for anything from a validation
    /// failure on the input to a modeled error returned by the service.
    pub async fn call<O: Operation>(
        &self,
        input: O::Input,
        overrides: Option<CallConfigOverrides>,
    ) -> Result<O::Output, SdkError<O::Error>> {
        let operation = self.resolve(O::shape_id()).map_err(|e| self.into_typed_error::<O>(e))?;
        let input_schema = self.resolve(O::input_shape_id()).map_err(|e| self.into_typed_error::<O>(e))?;
        let output_schema = self.resolve(O::output_shape_id()).map_err(|e| self.into_typed_error::<O>(e))?;

        let input_document = O::encode_input(&input, input_schema);
        let auth_options = self.with_default_region(O::auth_options());

        let config = OperationConfig {
            operation,
            input_schema,
            output_schema,
            auth_options,
            error_discriminator_header: O::error_discriminator_header().map(str::to_string),
            error_retry_info: O::error_retry_info(),
        };

        let timeout = overrides.and_then(|o| o.timeout);
        let outcome = rpcforge_runtime::execute_call(
            &self.components,
            &config,
            O::operation_id(),
            input_document,
            CancellationToken::new(),
            timeout,
        )
        .await;

        match outcome {
            Ok(output) => O::decode_output(output, output_schema).map_err(|kind| {
                SdkError::new(kind, ErrorContext::new())
            }),
            Err(sdk_error) => Err(self.into_typed_error::<O>(sdk_error)),
        }
    }

    /// Poll an operation until one of `acceptors` reaches a terminal
    /// state, or `config.total_timeout` elapses.
    ///
    /// The waiter's poll/evaluate/backoff loop is synchronous by design
    /// (it sleeps the calling thread between polls); this runs it on a
    /// blocking-friendly task so it never stalls the async runtime, and
    /// bridges each poll back into `poll_operation`, an async closure
    /// that typically wraps a single [`Client::call`].
    ///
    /// # Errors
    ///
    /// [`WaiterError::Matched`] if a failure acceptor matched;
    /// [`WaiterError::TimedOut`] if the time budget ran out first.
    pub async fn wait_until<F, Fut>(
        &self,
        acceptors: Vec<Acceptor>,
        input: Document,
        config: WaiterConfig,
        poll_operation: F,
    ) -> Result<Document, WaiterError>
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = PollResult> + Send,
    {
        let handle = tokio::runtime::Handle::current();
        tokio::task::spawn_blocking(move || {
            let mut bridge = BlockingPoller { handle, poll_operation };
            run_waiter(&acceptors, &input, &mut bridge, &config)
        })
        .await
        .expect("waiter task panicked")
    }

    fn resolve(&self, shape_id: rpcforge_schema::ShapeId) -> Result<rpcforge_schema::ResolvedSchema<'_>, SdkError<Document>> {
        self.schemas.get(&shape_id).ok_or_else(|| {
            let kind = ErrorKind::Binding { message: format!("shape `{shape_id:?}` not found in schema index") };
            SdkError::new(kind, ErrorContext::new())
        })
    }

    fn with_default_region(&self, mut options: Vec<AuthSchemeOption>) -> Vec<AuthSchemeOption> {
        for option in &mut options {
            if option.signer_overrides.region.is_none() {
                option.signer_overrides.region = self.region.clone();
            }
        }
        options
    }

    fn into_typed_error<O: Operation>(&self, error: SdkError<Document>) -> SdkError<O::Error> {
        let kind = error.kind().clone();
        let modeled = match &kind {
            ErrorKind::Modeled { code, message, .. } => Some(O::decode_error(code, message)),
            _ => None,
        };
        let context = error.context().clone();
        let mut typed = SdkError::new(kind, context);
        if let Some(modeled) = modeled {
            typed = typed.with_modeled(modeled);
        }
        typed
    }
}

/// Adapts an async poll closure into the synchronous [`Poller`] the
/// waiter engine drives, by blocking the current (blocking-pool) thread
/// on the client's tokio runtime handle.
struct BlockingPoller<F> {
    handle: tokio::runtime::Handle,
    poll_operation: F,
}

impl<F, Fut> Poller for BlockingPoller<F>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = PollResult>,
{
    fn poll(&mut self) -> PollResult {
        self.handle.block_on((self.poll_operation)())
    }
}

