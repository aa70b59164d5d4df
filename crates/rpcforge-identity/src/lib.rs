// SPDX-License-Identifier: MIT OR Apache-2.0
#![warn(missing_docs)]

//! Identity resolution and auth scheme selection.
//!
//! A chain of [`resolver::IdentityResolver`]s is tried in order; "not
//! found" failures let the chain continue and are aggregated for
//! diagnostics, any other failure aborts it immediately. An
//! [`scheme::AuthSchemeResolver`] produces ordered candidate schemes per
//! operation, and [`scheme::select_auth_scheme`] picks the first whose
//! identity resolves.

pub mod error;
pub mod identity;
pub mod resolver;
pub mod scheme;

pub use error::{ChainExhausted, IdentityError};
pub use identity::{AwsCredentials, Identity, LoginIdentity, TokenIdentity};
pub use resolver::{EnvironmentVariableResolver, ExternalProviderResolver, IdentityParams, IdentityResolver, IdentityResolverChain, StaticIdentityResolver};
pub use scheme::{select_auth_scheme, AuthScheme, AuthSchemeOption, AuthSchemeResolver, SelectedAuthScheme, SignerKind, SignerOverrides, StaticAuthSchemeResolver};
