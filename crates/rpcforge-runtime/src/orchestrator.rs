//! The call state machine: wires identity resolution, endpoint resolution,
//! signing, transport, retry, and the interceptor pipeline into the single
//! sequence a call follows from input to output.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rpcforge_error::{ErrorCode, ErrorContext, ErrorKind, SdkError};
use rpcforge_http::BodyCodec;
use rpcforge_identity::{select_auth_scheme, AuthScheme, AuthSchemeOption, IdentityError, IdentityResolverChain};
use rpcforge_endpoint::{EndpointParams, EndpointResolver};
use rpcforge_retry::{is_safe_to_retry, ErrorClassification, OperationRetrySafety, RetryError, RetryStrategy};
use rpcforge_schema::{ResolvedSchema, TraitKey};
use rpcforge_serde::Document;
use rpcforge_sigv4::{Signer, SigningIdentity, SigningParams};
use rpcforge_telemetry::{log, CallRecord, MetricsCollector};
use tracing::{debug, warn};

use crate::cancel::CancellationToken;
use crate::context::CallContext;
use crate::interceptor::{InterceptorChain, InterceptorContext};
use crate::transport::{Transport, TransportError};

/// What the registered error shape for a discriminator code says about
/// retry safety. Populated by the caller (ultimately `rpcforge-client`)
/// from each error shape's `Error` trait.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorRetryInfo {
    /// `Trait::Error { retryable, .. }`.
    pub retryable: bool,
    /// `Trait::Error { throttling, .. }`.
    pub throttling: bool,
}

/// Everything the orchestrator needs to know about the operation being
/// invoked, beyond the input document itself.
pub struct OperationConfig<'a> {
    /// The operation shape (carries the `http` trait and `readonly`/`idempotent`).
    pub operation: ResolvedSchema<'a>,
    /// The input structure's schema.
    pub input_schema: ResolvedSchema<'a>,
    /// The output structure's schema.
    pub output_schema: ResolvedSchema<'a>,
    /// Candidate auth scheme options for this operation, most preferred first.
    pub auth_options: Vec<AuthSchemeOption>,
    /// Header carrying the error discriminator, if the protocol uses one.
    pub error_discriminator_header: Option<String>,
    /// Retry safety info per modeled error discriminator code.
    pub error_retry_info: BTreeMap<String, ErrorRetryInfo>,
}

impl OperationConfig<'_> {
    fn retry_safety(&self) -> OperationRetrySafety {
        OperationRetrySafety {
            readonly: self.operation.effective_trait(TraitKey::Readonly).is_some(),
            idempotent: self.operation.effective_trait(TraitKey::Idempotent).is_some(),
        }
    }
}

/// The shared, immutable-after-construction machinery every call uses.
/// Built once by `rpcforge-client`'s `ClientBuilder` and shared across
/// every call made through a client.
pub struct RuntimeComponents {
    /// Auth schemes configured for the client, by scheme id.
    pub auth_schemes: BTreeMap<String, AuthScheme>,
    /// Identity resolver chain.
    pub identity_chain: IdentityResolverChain,
    /// Endpoint resolver.
    pub endpoint_resolver: Arc<dyn EndpointResolver>,
    /// Retry strategy.
    pub retry_strategy: Arc<dyn RetryStrategy>,
    /// Interceptor chain.
    pub interceptors: InterceptorChain,
    /// HTTP transport.
    pub transport: Arc<dyn Transport>,
    /// Request/response body codec.
    pub body_codec: BodyCodec,
    /// Call-level metrics collector.
    pub metrics: MetricsCollector,
    /// Default per-call deadline, used when a call doesn't override it.
    pub default_timeout: Duration,
    /// Signer, shared so its signing-key cache is reused across calls.
    pub signer: Signer,
}

/// Execute one call end to end: interceptor phases 1-4, the attempt loop
/// (phases 5-12), and phase 14, which always runs.
///
/// # Errors
///
/// An [`SdkError<Document>`] wrapping whichever [`ErrorKind`] the call
/// ultimately failed with; `as_modeled()` carries the decoded error body
/// when the failure was a modeled service error.
pub async fn execute_call(
    components: &RuntimeComponents,
    config: &OperationConfig<'_>,
    operation_id: &str,
    input: Document,
    cancellation: CancellationToken,
    timeout: Option<Duration>,
) -> Result<Document, SdkError<Document>> {
    let start = Instant::now();
    let deadline = timeout.unwrap_or(components.default_timeout);
    let mut call_context = CallContext::new(operation_id);
    let retry_safety = config.retry_safety();

    let mut ctx = InterceptorContext {
        operation_id,
        input,
        request: None,
        response: None,
        output: None,
        error: None,
        attempt: 1,
        call_context: &mut call_context,
    };

    // Phases 1-4 run once, ahead of the attempt loop. A failure here still
    // has to reach phase 14, so every early exit breaks out of this block
    // with its `ErrorKind` rather than returning directly.
    let outcome: Result<Document, ErrorKind> = 'call: {
        if let Err(e) = components.interceptors.read_before_execution(&ctx).await {
            break 'call Err(ErrorKind::Binding { message: e.to_string() });
        }

        if let Err(e) = components.interceptors.modify_before_serialization(&mut ctx).await {
            break 'call Err(ErrorKind::Binding { message: e.to_string() });
        }
        if let Err(e) = components.interceptors.read_before_serialization(&ctx).await {
            break 'call Err(ErrorKind::Binding { message: e.to_string() });
        }

        let endpoint_params = EndpointParams { operation_id: Some(operation_id.to_string()) };
        let endpoint = match components.endpoint_resolver.resolve(&endpoint_params, config.input_schema, &ctx.input) {
            Ok(endpoint) => endpoint,
            Err(e) => break 'call Err(ErrorKind::Binding { message: format!("endpoint resolution failed: {e}") }),
        };

        let request = match rpcforge_http::build_request(config.operation, config.input_schema, &ctx.input, &endpoint.uri, components.body_codec) {
            Ok(request) => request,
            Err(e) => break 'call Err(ErrorKind::Binding { message: e.to_string() }),
        };
        ctx.request = Some(request);

        if let Err(e) = components.interceptors.read_after_serialization(&ctx).await {
            break 'call Err(ErrorKind::Binding { message: e.to_string() });
        }
        if let Err(e) = components.interceptors.modify_before_retry_loop(&mut ctx).await {
            break 'call Err(ErrorKind::Binding { message: e.to_string() });
        }

        let mut token = components.retry_strategy.acquire_initial_retry_token();
        loop {
            ctx.attempt = token.attempt() + 1;
            if cancellation.is_cancelled() {
                break Err(ErrorKind::Cancelled);
            }
            if start.elapsed() >= deadline {
                break Err(ErrorKind::Timeout { elapsed_ms: start.elapsed().as_millis() as u64 });
            }

            if let Err(e) = components.interceptors.read_before_attempt(&ctx).await {
                break Err(ErrorKind::Binding { message: e.to_string() });
            }

            match run_attempt(components, config, &mut ctx, deadline.saturating_sub(start.elapsed()), &cancellation).await {
                Ok(output) => {
                    components.retry_strategy.record_success(token);
                    ctx.output = Some(output.clone());
                    if let Err(e) = components.interceptors.modify_before_attempt_completion(&mut ctx).await {
                        break Err(ErrorKind::Binding { message: e.to_string() });
                    }
                    let _ = components.interceptors.read_after_attempt(&ctx).await;
                    break Ok(output);
                }
                Err((kind, classification)) => {
                    ctx.error = Some(kind.clone());
                    let _ = components.interceptors.modify_before_attempt_completion(&mut ctx).await;
                    let _ = components.interceptors.read_after_attempt(&ctx).await;

                    if !is_safe_to_retry(retry_safety, classification) {
                        break Err(kind);
                    }
                    match components.retry_strategy.refresh_retry_token_for_retry(token, classification) {
                        Ok((next_token, delay)) => {
                            log::log_attempt_retry(operation_id, token.attempt() + 1, delay.as_millis() as u64, kind.code().as_str());
                            token = next_token;
                            let remaining = deadline.saturating_sub(start.elapsed());
                            let sleep_for = delay.min(remaining);
                            tokio::select! {
                                () = tokio::time::sleep(sleep_for) => {}
                                () = cancellation.cancelled() => break Err(ErrorKind::Cancelled),
                            }
                        }
                        Err(RetryError::AttemptsExhausted { .. }) => break Err(kind),
                        Err(RetryError::BucketExhausted(_)) => break Err(kind),
                    }
                }
            }
        }
    };

    match outcome {
        Ok(output) => {
            ctx.output = Some(output);
            let _ = components.interceptors.modify_before_completion(&mut ctx).await;
            let _ = components.interceptors.read_after_execution(&ctx).await;
            finish_telemetry(components, operation_id, start, ctx.attempt, true, None);
            Ok(ctx.output.take().unwrap_or(Document::Null))
        }
        Err(kind) => {
            ctx.error = Some(kind.clone());
            let _ = components.interceptors.modify_before_completion(&mut ctx).await;
            let _ = components.interceptors.read_after_execution(&ctx).await;
            Err(build_sdk_error(components, &ctx, operation_id, start, ctx.attempt, kind))
        }
    }
}

/// Run the signing/transmit/deserialize subphases (6-12) of one attempt.
async fn run_attempt(
    components: &RuntimeComponents,
    config: &OperationConfig<'_>,
    ctx: &mut InterceptorContext<'_>,
    remaining: Duration,
    cancellation: &CancellationToken,
) -> Result<Document, (ErrorKind, ErrorClassification)> {
    let selected = select_auth_scheme(&config.auth_options, &components.auth_schemes, &components.identity_chain)
        .map_err(|e| (identity_error_kind(e), ErrorClassification::NotRetryable))?;

    if let Err(e) = components.interceptors.modify_before_signing(ctx).await {
        return Err((ErrorKind::Binding { message: e.to_string() }, ErrorClassification::NotRetryable));
    }
    if let Err(e) = components.interceptors.read_before_signing(ctx).await {
        return Err((ErrorKind::Binding { message: e.to_string() }, ErrorClassification::NotRetryable));
    }

    let rpcforge_identity::Identity::AwsCredentials(credentials) = &selected.identity else {
        return Err((
            ErrorKind::Signing { message: format!("no signer for identity type `{}`", selected.identity.type_name()) },
            ErrorClassification::NotRetryable,
        ));
    };
    let identity = SigningIdentity::from(credentials);
    let params = SigningParams {
        region: selected.signer_overrides.region.clone().unwrap_or_default(),
        service: selected.signer_overrides.service.clone().unwrap_or_default(),
        timestamp: chrono::Utc::now(),
        double_encode_path: true,
        unsigned_payload: false,
        sign_payload: false,
    };

    let request = ctx.request.as_mut().expect("request bound before attempt loop starts");
    components
        .signer
        .sign_request(request, &identity, &params)
        .map_err(|e| (ErrorKind::Signing { message: e.to_string() }, ErrorClassification::NotRetryable))?;

    let _ = components.interceptors.read_after_signing(ctx).await;
    if let Err(e) = components.interceptors.modify_before_transmit(ctx).await {
        return Err((ErrorKind::Binding { message: e.to_string() }, ErrorClassification::NotRetryable));
    }
    let _ = components.interceptors.read_before_transmit(ctx).await;

    let request = ctx.request.clone().expect("request present");
    let response = tokio::select! {
        result = tokio::time::timeout(remaining, components.transport.send(request)) => {
            match result {
                Ok(Ok(response)) => response,
                Ok(Err(TransportError::ResetBeforeBytes)) => {
                    return Err((
                        ErrorKind::Transport { message: "connection reset before any bytes arrived".to_string(), retryable: true },
                        ErrorClassification::TransportResetBeforeBytes,
                    ));
                }
                Ok(Err(TransportError::Io(message))) => {
                    return Err((ErrorKind::Transport { message, retryable: false }, ErrorClassification::NotRetryable));
                }
                Err(_) => return Err((ErrorKind::Timeout { elapsed_ms: remaining.as_millis() as u64 }, ErrorClassification::NotRetryable)),
            }
        }
        () = cancellation.cancelled() => return Err((ErrorKind::Cancelled, ErrorClassification::NotRetryable)),
    };

    ctx.response = Some(response);
    let _ = components.interceptors.read_after_transmit(ctx).await;
    if let Err(e) = components.interceptors.modify_before_deserialization(ctx).await {
        return Err((ErrorKind::Binding { message: e.to_string() }, ErrorClassification::NotRetryable));
    }
    let _ = components.interceptors.read_before_deserialization(ctx).await;

    let response = ctx.response.as_ref().expect("response bound after transmit");
    if response.status().is_success() {
        let output = rpcforge_http::parse_response(config.output_schema, response, components.body_codec)
            .map_err(|e| (ErrorKind::Binding { message: e.to_string() }, ErrorClassification::NotRetryable))?;
        let _ = components.interceptors.read_after_deserialization(ctx).await;
        return Ok(output);
    }

    let body = components.body_codec.decode(response.body()).ok();
    let discriminator = rpcforge_http::extract_error_discriminator(response, body.as_ref(), config.error_discriminator_header.as_deref());
    let _ = components.interceptors.read_after_deserialization(ctx).await;

    let info = config.error_retry_info.get(&discriminator.code).copied().unwrap_or_default();
    let is_server_fault = discriminator.http_status >= 500;
    let kind = ErrorKind::Modeled {
        code: discriminator.code.clone(),
        message: body.as_ref().and_then(|b| b.get("message")).and_then(Document::as_str).unwrap_or_default().to_string(),
        retryable: info.retryable || is_server_fault,
        throttling: info.throttling,
    };
    let classification = if info.throttling {
        ErrorClassification::Throttling
    } else if info.retryable || is_server_fault {
        ErrorClassification::Retryable
    } else {
        ErrorClassification::NotRetryable
    };
    Err((kind, classification))
}

fn identity_error_kind(error: IdentityError) -> ErrorKind {
    match error {
        IdentityError::NotFound { reason } => ErrorKind::IdentityNotFound { attempted: 1, diagnostics: vec![reason] },
        IdentityError::ProviderFailed { message } => ErrorKind::Signing { message },
    }
}

fn build_sdk_error(
    components: &RuntimeComponents,
    ctx: &InterceptorContext<'_>,
    operation_id: &str,
    start: Instant,
    attempts: u32,
    kind: ErrorKind,
) -> SdkError<Document> {
    let code = kind.code();
    finish_telemetry(components, operation_id, start, attempts, false, Some(code));
    let context = ErrorContext { snapshot: ctx.call_context.snapshot().clone(), attempts, elapsed: start.elapsed() };
    warn!(target: "rpcforge_runtime::orchestrator", operation_id, attempts, code = code.as_str(), "call failed");
    SdkError::new(kind, context)
}

fn finish_telemetry(components: &RuntimeComponents, operation_id: &str, start: Instant, attempts: u32, success: bool, error_code: Option<ErrorCode>) {
    let duration_ms = start.elapsed().as_millis() as u64;
    log::log_call_complete(operation_id, attempts, duration_ms, success);
    components.metrics.record(CallRecord {
        operation_id: operation_id.to_string(),
        duration_ms,
        attempts,
        success,
        error_code: error_code.map(|c| c.as_str().to_string()),
    });
    debug!(target: "rpcforge_runtime::orchestrator", operation_id, attempts, duration_ms, success, "call complete");
}
