// SPDX-License-Identifier: MIT OR Apache-2.0
#![warn(missing_docs)]

//! AWS Signature Version 4 request signing: canonical request construction,
//! the derived-key HMAC cascade, and a bounded cache of derived signing
//! keys keyed by `(secret, date, region, service)`.
//!
//! Signing failures are always fatal — [`error::SigningError`] never maps
//! to a retryable [`rpcforge_error::ErrorCode`].

pub mod canonical;
pub mod error;
pub mod keycache;
pub mod sign;

pub use canonical::{body_hash, canonical_headers, canonical_path, canonical_query, canonical_request, UNSIGNED_PAYLOAD};
pub use error::SigningError;
pub use keycache::SigningKeyCache;
pub use sign::{Signer, SigningIdentity, SigningParams, ALGORITHM};
