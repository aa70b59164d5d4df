// SPDX-License-Identifier: MIT OR Apache-2.0
#![warn(missing_docs)]

//! Endpoint resolution: a fixed static endpoint, or a host-label resolver
//! that composes a host prefix from `hostLabel`-annotated input members.
//! An unresolved or invalid host label is always fatal.

pub mod dns_label;
pub mod endpoint;
pub mod error;

pub use endpoint::{Endpoint, EndpointParams, EndpointResolver, HostLabelEndpointResolver, StaticEndpointResolver};
pub use error::EndpointError;
