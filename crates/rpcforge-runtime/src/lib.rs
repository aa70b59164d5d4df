#![deny(unsafe_code)]
#![warn(missing_docs)]

//! The call orchestrator: interceptor pipeline, transport seam, and the
//! attempt loop that ties signing, identity, endpoint, and retry together
//! into a single call.

/// Cancellation token shared between a call future and its attempt loop.
pub mod cancel;
/// The per-call typed context bag.
pub mod context;
/// The 14-phase interceptor pipeline.
pub mod interceptor;
/// The call state machine.
pub mod orchestrator;
/// The transport seam and its `reqwest`-backed default.
pub mod transport;

pub use cancel::CancellationToken;
pub use context::CallContext;
pub use interceptor::{HookError, Interceptor, InterceptorChain, InterceptorContext};
pub use orchestrator::{execute_call, ErrorRetryInfo, OperationConfig, RuntimeComponents};
pub use transport::{ReqwestTransport, Transport, TransportError};
