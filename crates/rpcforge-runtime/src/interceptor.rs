//! The 14-phase interceptor pipeline a call traverses from input to output.
//!
//! One trait ([`Interceptor`]) carries every hook as a no-op-by-default
//! method rather than 14 separate traits — composition is just an ordered
//! `Vec<Arc<dyn Interceptor>>` ([`InterceptorChain`]), built once at client
//! construction and never mutated afterward.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use rpcforge_error::ErrorKind;
use rpcforge_serde::Document;

use crate::context::CallContext;

/// Boxed error type every hook reports failures through, mirroring how the
/// rest of this workspace's extension points (lifecycle hooks, pipeline
/// stages) report hook-local failures without a shared error enum.
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

/// The mutable state a call carries through the interceptor pipeline.
///
/// Not every field is meaningful at every phase — `request` is `None`
/// until serialization has run, `response`/`output` are `None` until an
/// attempt completes — hooks are expected to only touch fields valid at
/// the phase they were invoked for.
pub struct InterceptorContext<'a> {
    /// The operation being invoked.
    pub operation_id: &'a str,
    /// The input document, mutable so `modifyBeforeSerialization` can edit it.
    pub input: Document,
    /// The transport request, present from `modifyBeforeSigning` onward.
    pub request: Option<http::Request<Bytes>>,
    /// The transport response, present from `readAfterTransmit` onward.
    pub response: Option<http::Response<Bytes>>,
    /// The decoded output document, present from `modifyBeforeDeserialization`'s
    /// completion onward on the success path.
    pub output: Option<Document>,
    /// The terminal error, present once the call has taken the error path.
    pub error: Option<ErrorKind>,
    /// The current attempt number, starting at 1.
    pub attempt: u32,
    /// Per-call context shared with the signer and retry strategy.
    pub call_context: &'a mut CallContext,
}

/// Extension point invoked at each of the 14 phases of a call's lifecycle.
///
/// All methods default to a no-op so an interceptor only needs to override
/// the hooks it cares about.
#[async_trait]
pub trait Interceptor: Send + Sync {
    /// Phase 1: before anything else happens.
    async fn read_before_execution(&self, _ctx: &InterceptorContext<'_>) -> Result<(), HookError> { Ok(()) }

    /// Phase 2: may rewrite the input document before it is serialized.
    async fn modify_before_serialization(&self, _ctx: &mut InterceptorContext<'_>) -> Result<(), HookError> { Ok(()) }
    /// Phase 2: observes the input document immediately before serialization.
    async fn read_before_serialization(&self, _ctx: &InterceptorContext<'_>) -> Result<(), HookError> { Ok(()) }

    /// Phase 3: observes the request produced by binding.
    async fn read_after_serialization(&self, _ctx: &InterceptorContext<'_>) -> Result<(), HookError> { Ok(()) }

    /// Phase 4: runs once, before the attempt loop begins.
    async fn modify_before_retry_loop(&self, _ctx: &mut InterceptorContext<'_>) -> Result<(), HookError> { Ok(()) }

    /// Phase 5: runs at the top of every attempt.
    async fn read_before_attempt(&self, _ctx: &InterceptorContext<'_>) -> Result<(), HookError> { Ok(()) }

    /// Phase 6: may rewrite the request before it is signed.
    async fn modify_before_signing(&self, _ctx: &mut InterceptorContext<'_>) -> Result<(), HookError> { Ok(()) }
    /// Phase 6: observes the request immediately before signing.
    async fn read_before_signing(&self, _ctx: &InterceptorContext<'_>) -> Result<(), HookError> { Ok(()) }

    /// Phase 7: observes the signed request.
    async fn read_after_signing(&self, _ctx: &InterceptorContext<'_>) -> Result<(), HookError> { Ok(()) }

    /// Phase 8: may rewrite the request before it is sent.
    async fn modify_before_transmit(&self, _ctx: &mut InterceptorContext<'_>) -> Result<(), HookError> { Ok(()) }

    /// Phase 9: observes the request immediately before it is sent.
    async fn read_before_transmit(&self, _ctx: &InterceptorContext<'_>) -> Result<(), HookError> { Ok(()) }
    /// Phase 9: observes the raw response immediately after it is received.
    async fn read_after_transmit(&self, _ctx: &InterceptorContext<'_>) -> Result<(), HookError> { Ok(()) }

    /// Phase 10: may rewrite the response before it is deserialized.
    async fn modify_before_deserialization(&self, _ctx: &mut InterceptorContext<'_>) -> Result<(), HookError> { Ok(()) }

    /// Phase 11: observes the response immediately before deserialization.
    async fn read_before_deserialization(&self, _ctx: &InterceptorContext<'_>) -> Result<(), HookError> { Ok(()) }
    /// Phase 11: observes the decoded output.
    async fn read_after_deserialization(&self, _ctx: &InterceptorContext<'_>) -> Result<(), HookError> { Ok(()) }

    /// Phase 12: may rewrite the output before the attempt is recorded complete.
    async fn modify_before_attempt_completion(&self, _ctx: &mut InterceptorContext<'_>) -> Result<(), HookError> { Ok(()) }
    /// Phase 12: observes the final state of a completed attempt.
    async fn read_after_attempt(&self, _ctx: &InterceptorContext<'_>) -> Result<(), HookError> { Ok(()) }

    /// Phase 14: may rewrite the output after the retry loop ends.
    async fn modify_before_completion(&self, _ctx: &mut InterceptorContext<'_>) -> Result<(), HookError> { Ok(()) }
    /// Phase 14: always runs exactly once, whether the call succeeded,
    /// failed, or was cancelled.
    async fn read_after_execution(&self, _ctx: &InterceptorContext<'_>) -> Result<(), HookError> { Ok(()) }
}

/// An ordered, immutable-after-construction chain of [`Interceptor`]s.
pub struct InterceptorChain {
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl Default for InterceptorChain {
    fn default() -> Self {
        Self::new()
    }
}

/// Declares one `fire_*` driver method on [`InterceptorChain`] for a single
/// hook. `$continue_on_error` selects between the `read*` rule (run every
/// interceptor, surface the first error at the end) and the `modify*` rule
/// (stop at the first error, since later interceptors see earlier edits).
macro_rules! fire {
    ($name:ident, $hook:ident, mut, continue_on_error = $continue:literal) => {
        /// Run every interceptor's corresponding hook in registration order.
        pub async fn $name(&self, ctx: &mut InterceptorContext<'_>) -> Result<(), HookError> {
            let mut first_err = None;
            for interceptor in &self.interceptors {
                if let Err(e) = interceptor.$hook(ctx).await {
                    if first_err.is_none() {
                        first_err = Some(e);
                    }
                    if !$continue {
                        break;
                    }
                }
            }
            first_err.map_or(Ok(()), Err)
        }
    };
    ($name:ident, $hook:ident, ref, continue_on_error = $continue:literal) => {
        /// Run every interceptor's corresponding hook in registration order.
        pub async fn $name(&self, ctx: &InterceptorContext<'_>) -> Result<(), HookError> {
            let mut first_err = None;
            for interceptor in &self.interceptors {
                if let Err(e) = interceptor.$hook(ctx).await {
                    if first_err.is_none() {
                        first_err = Some(e);
                    }
                    if !$continue {
                        break;
                    }
                }
            }
            first_err.map_or(Ok(()), Err)
        }
    };
}

impl InterceptorChain {
    /// An empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self { interceptors: Vec::new() }
    }

    /// Append an interceptor (builder pattern). Interceptors fire in the
    /// order they are registered.
    #[must_use]
    pub fn with_interceptor(mut self, interceptor: impl Interceptor + 'static) -> Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    /// Number of registered interceptors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    /// `true` if no interceptors are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }

    fire!(read_before_execution, read_before_execution, ref, continue_on_error = true);
    fire!(modify_before_serialization, modify_before_serialization, mut, continue_on_error = false);
    fire!(read_before_serialization, read_before_serialization, ref, continue_on_error = true);
    fire!(read_after_serialization, read_after_serialization, ref, continue_on_error = true);
    fire!(modify_before_retry_loop, modify_before_retry_loop, mut, continue_on_error = false);
    fire!(read_before_attempt, read_before_attempt, ref, continue_on_error = true);
    fire!(modify_before_signing, modify_before_signing, mut, continue_on_error = false);
    fire!(read_before_signing, read_before_signing, ref, continue_on_error = true);
    fire!(read_after_signing, read_after_signing, ref, continue_on_error = true);
    fire!(modify_before_transmit, modify_before_transmit, mut, continue_on_error = false);
    fire!(read_before_transmit, read_before_transmit, ref, continue_on_error = true);
    fire!(read_after_transmit, read_after_transmit, ref, continue_on_error = true);
    fire!(modify_before_deserialization, modify_before_deserialization, mut, continue_on_error = false);
    fire!(read_before_deserialization, read_before_deserialization, ref, continue_on_error = true);
    fire!(read_after_deserialization, read_after_deserialization, ref, continue_on_error = true);
    fire!(modify_before_attempt_completion, modify_before_attempt_completion, mut, continue_on_error = false);
    fire!(read_after_attempt, read_after_attempt, ref, continue_on_error = true);
    fire!(modify_before_completion, modify_before_completion, mut, continue_on_error = false);
    fire!(read_after_execution, read_after_execution, ref, continue_on_error = true);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingInterceptor {
        before_execution: Arc<AtomicUsize>,
        after_execution: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Interceptor for CountingInterceptor {
        async fn read_before_execution(&self, _ctx: &InterceptorContext<'_>) -> Result<(), HookError> {
            self.before_execution.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn read_after_execution(&self, _ctx: &InterceptorContext<'_>) -> Result<(), HookError> {
            self.after_execution.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn fixture_context<'a>(call_context: &'a mut CallContext) -> InterceptorContext<'a> {
        InterceptorContext {
            operation_id: "GetWidget",
            input: Document::Null,
            request: None,
            response: None,
            output: None,
            error: None,
            attempt: 1,
            call_context,
        }
    }

    #[tokio::test]
    async fn every_registered_interceptor_fires() {
        let before = Arc::new(AtomicUsize::new(0));
        let after = Arc::new(AtomicUsize::new(0));
        let chain = InterceptorChain::new()
            .with_interceptor(CountingInterceptor { before_execution: before.clone(), after_execution: after.clone() })
            .with_interceptor(CountingInterceptor { before_execution: before.clone(), after_execution: after.clone() });

        let mut call_context = CallContext::new("GetWidget");
        let ctx = fixture_context(&mut call_context);
        chain.read_before_execution(&ctx).await.unwrap();
        chain.read_after_execution(&ctx).await.unwrap();

        assert_eq!(before.load(Ordering::SeqCst), 2);
        assert_eq!(after.load(Ordering::SeqCst), 2);
    }

    struct FailingInterceptor;

    #[async_trait]
    impl Interceptor for FailingInterceptor {
        async fn read_before_execution(&self, _ctx: &InterceptorContext<'_>) -> Result<(), HookError> {
            Err("boom".into())
        }
    }

    #[tokio::test]
    async fn read_hooks_continue_after_an_error_but_still_surface_it() {
        let before = Arc::new(AtomicUsize::new(0));
        let after = Arc::new(AtomicUsize::new(0));
        let chain = InterceptorChain::new()
            .with_interceptor(FailingInterceptor)
            .with_interceptor(CountingInterceptor { before_execution: before.clone(), after_execution: after.clone() });

        let mut call_context = CallContext::new("GetWidget");
        let ctx = fixture_context(&mut call_context);
        let result = chain.read_before_execution(&ctx).await;

        assert!(result.is_err());
        assert_eq!(before.load(Ordering::SeqCst), 1, "second interceptor must still run");
    }

    struct FailingModifyInterceptor {
        ran: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Interceptor for FailingModifyInterceptor {
        async fn modify_before_serialization(&self, _ctx: &mut InterceptorContext<'_>) -> Result<(), HookError> {
            self.ran.fetch_add(1, Ordering::SeqCst);
            Err("invalid".into())
        }
    }

    struct NeverRunsInterceptor {
        ran: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Interceptor for NeverRunsInterceptor {
        async fn modify_before_serialization(&self, _ctx: &mut InterceptorContext<'_>) -> Result<(), HookError> {
            self.ran.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn modify_hooks_stop_at_first_error() {
        let first_ran = Arc::new(AtomicUsize::new(0));
        let second_ran = Arc::new(AtomicUsize::new(0));
        let chain = InterceptorChain::new()
            .with_interceptor(FailingModifyInterceptor { ran: first_ran.clone() })
            .with_interceptor(NeverRunsInterceptor { ran: second_ran.clone() });

        let mut call_context = CallContext::new("GetWidget");
        let mut ctx = fixture_context(&mut call_context);
        let result = chain.modify_before_serialization(&mut ctx).await;

        assert!(result.is_err());
        assert_eq!(first_ran.load(Ordering::SeqCst), 1);
        assert_eq!(second_ran.load(Ordering::SeqCst), 0);
    }
}
