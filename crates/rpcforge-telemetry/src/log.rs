//! Structured logging of call lifecycle events via `tracing`.
//!
//! These are free functions rather than a hook trait: the interceptor
//! pipeline already gives callers a single extension point, and a dedicated
//! `LoggingInterceptor` would only turn around and call these.

/// Target used for every event emitted from this module.
pub const TARGET: &str = "rpcforge_telemetry::call";

/// Log that an attempt is about to be sent.
pub fn log_attempt_start(operation_id: &str, attempt: u32) {
    tracing::debug!(target: TARGET, operation_id, attempt, "sending attempt");
}

/// Log that an attempt failed and will be retried after `delay_ms`.
pub fn log_attempt_retry(operation_id: &str, attempt: u32, delay_ms: u64, error_code: &str) {
    tracing::warn!(target: TARGET, operation_id, attempt, delay_ms, error_code, "attempt failed, retrying");
}

/// Log that a call finished, successfully or not.
pub fn log_call_complete(operation_id: &str, attempts: u32, duration_ms: u64, success: bool) {
    if success {
        tracing::info!(target: TARGET, operation_id, attempts, duration_ms, "call succeeded");
    } else {
        tracing::error!(target: TARGET, operation_id, attempts, duration_ms, "call failed");
    }
}
