// SPDX-License-Identifier: MIT OR Apache-2.0
//! The identity types a resolver can produce.

use chrono::{DateTime, Utc};
use rpcforge_sigv4::SigningIdentity;

/// Static or temporary AWS-style credentials.
#[derive(Debug, Clone)]
pub struct AwsCredentials {
    /// The access key id.
    pub access_key_id: String,
    /// The secret access key. Never included in `Debug`/logging output.
    pub secret_access_key: String,
    /// A session token for temporary credentials, if any.
    pub session_token: Option<String>,
    /// When these credentials stop being valid, if known.
    pub expiration: Option<DateTime<Utc>>,
}

impl AwsCredentials {
    /// `true` when `expiration` is set and in the past relative to `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiration.is_some_and(|exp| exp <= now)
    }
}

impl From<&AwsCredentials> for SigningIdentity {
    fn from(creds: &AwsCredentials) -> Self {
        SigningIdentity {
            access_key_id: creds.access_key_id.clone(),
            secret_access_key: creds.secret_access_key.clone(),
            session_token: creds.session_token.clone(),
        }
    }
}

/// A bearer token identity, used by auth schemes that sign (or simply
/// attach) a single opaque token rather than a SigV4 key pair.
#[derive(Debug, Clone)]
pub struct TokenIdentity {
    /// The bearer token itself. Never included in `Debug`/logging output.
    pub token: String,
    /// When this token stops being valid, if known.
    pub expiration: Option<DateTime<Utc>>,
}

impl TokenIdentity {
    /// `true` when `expiration` is set and in the past relative to `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiration.is_some_and(|exp| exp <= now)
    }
}

/// A username/password identity, for basic-auth-style schemes.
#[derive(Debug, Clone)]
pub struct LoginIdentity {
    /// The username.
    pub user: String,
    /// The password. Never included in `Debug`/logging output.
    pub password: String,
}

/// The kinds of identity an [`crate::resolver::IdentityResolver`] can
/// produce. New variants are additive as new auth schemes are supported.
#[derive(Debug, Clone)]
pub enum Identity {
    /// SigV4 credentials.
    AwsCredentials(AwsCredentials),
    /// A bearer token.
    TokenIdentity(TokenIdentity),
    /// A username/password pair.
    LoginIdentity(LoginIdentity),
    /// No identity at all, for unauthenticated operations.
    Anonymous,
}

impl Identity {
    /// The identity type name, as referenced by [`crate::scheme::AuthScheme::identity_type`].
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::AwsCredentials(_) => "aws.credentials",
            Self::TokenIdentity(_) => "token",
            Self::LoginIdentity(_) => "login",
            Self::Anonymous => "anonymous",
        }
    }
}
