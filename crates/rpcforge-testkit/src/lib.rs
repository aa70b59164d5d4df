#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Fixtures for testing the call runtime without a live service: a
//! scripted [`Transport`](rpcforge_runtime::Transport), a scripted
//! [`Poller`](rpcforge_waiter::Poller), and a minimal hand-built schema
//! registry.

/// A hand-built schema registry small enough to reason about in a test.
pub mod fixture;
/// A scripted `Poller` for the waiter engine.
pub mod poller;
/// A scripted `Transport` for the call orchestrator.
pub mod transport;

pub use fixture::{echo_operation_schemas, EchoShapeIds};
pub use poller::ScriptedPoller;
pub use transport::{ScriptedResponse, ScriptedTransport};
