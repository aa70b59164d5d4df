#![deny(unsafe_code)]
#![warn(missing_docs)]

//! The generated-client surface: a `Client`/`ClientBuilder` pair and the
//! `Operation` trait that lets `Client::call` stay generic over every
//! operation a service exposes, instead of hand-writing one method per
//! operation against the orchestrator directly.

/// Client construction and per-call override types.
pub mod config;
/// The `Client` type and its `call`/`wait_until` methods.
pub mod client;
/// The `Operation` trait bridging typed request/response pairs to the
/// document-centric runtime.
pub mod operation;

pub use client::Client;
pub use config::{CallConfigOverrides, ClientBuildError, ClientBuilder};
pub use operation::Operation;
