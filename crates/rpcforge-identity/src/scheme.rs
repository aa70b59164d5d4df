// SPDX-License-Identifier: MIT OR Apache-2.0
//! Auth scheme declarations and selection.

use std::collections::BTreeMap;

use crate::error::IdentityError;
use crate::identity::Identity;
use crate::resolver::{IdentityParams, IdentityResolverChain};

/// The signing algorithms an [`AuthScheme`] can reference. Only SigV4 is
/// wired up today; new variants are additive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignerKind {
    /// AWS Signature Version 4.
    SigV4,
}

/// A declared auth scheme: a signing algorithm paired with the identity
/// type and request/response shapes it applies to.
#[derive(Debug, Clone)]
pub struct AuthScheme {
    /// The scheme identifier, e.g. `aws.auth#sigv4`.
    pub scheme_id: String,
    /// The protocol/request type this scheme signs, e.g. `http`.
    pub request_type: String,
    /// The identity type this scheme expects, matching [`Identity::type_name`].
    pub identity_type: String,
    /// The signer this scheme uses.
    pub signer: SignerKind,
}

/// Per-candidate overrides an [`AuthSchemeOption`] applies on top of the
/// client's default signing context.
#[derive(Debug, Clone, Default)]
pub struct SignerOverrides {
    /// Overrides the signing region, if set.
    pub region: Option<String>,
    /// Overrides the signing service name, if set.
    pub service: Option<String>,
}

/// One candidate produced by an [`AuthSchemeResolver`]: a scheme id plus
/// the identity/signer overrides to apply if it is selected.
#[derive(Debug, Clone, Default)]
pub struct AuthSchemeOption {
    /// The candidate scheme's identifier, looked up in the scheme table.
    pub scheme_id: String,
    /// Parameters passed to the identity chain when resolving this option.
    pub identity_overrides: IdentityParams,
    /// Signer-level overrides applied if this option is selected.
    pub signer_overrides: SignerOverrides,
}

/// Produces an ordered list of auth scheme candidates for an operation.
pub trait AuthSchemeResolver: Send + Sync {
    /// List candidates for `operation_id`, most preferred first.
    fn resolve(&self, operation_id: &str) -> Vec<AuthSchemeOption>;
}

/// Returns the same fixed, ordered candidate list for every operation —
/// the common case for a client with one configured auth scheme.
#[derive(Debug, Clone, Default)]
pub struct StaticAuthSchemeResolver {
    options: Vec<AuthSchemeOption>,
}

impl StaticAuthSchemeResolver {
    /// Build a resolver that always returns `options`.
    #[must_use]
    pub fn new(options: Vec<AuthSchemeOption>) -> Self {
        Self { options }
    }
}

impl AuthSchemeResolver for StaticAuthSchemeResolver {
    fn resolve(&self, _operation_id: &str) -> Vec<AuthSchemeOption> {
        self.options.clone()
    }
}

/// The result of selecting an auth scheme: the resolved identity, the
/// scheme it was resolved against, and that option's signer overrides.
#[derive(Debug, Clone)]
pub struct SelectedAuthScheme {
    /// The resolved identity.
    pub identity: Identity,
    /// The scheme the identity was resolved for.
    pub scheme: AuthScheme,
    /// The winning option's signer overrides.
    pub signer_overrides: SignerOverrides,
}

/// Walk `options` in order, trying to resolve an identity for each against
/// `chain`; the first option whose identity resolves successfully wins.
///
/// # Errors
///
/// [`IdentityError::NotFound`] if every option's identity resolution was
/// continuable and none succeeded; any other error aborts immediately, as
/// does referencing a `scheme_id` absent from `schemes`.
pub fn select_auth_scheme(
    options: &[AuthSchemeOption],
    schemes: &BTreeMap<String, AuthScheme>,
    chain: &IdentityResolverChain,
) -> Result<SelectedAuthScheme, IdentityError> {
    let mut diagnostics = Vec::new();
    for option in options {
        let Some(scheme) = schemes.get(&option.scheme_id) else {
            diagnostics.push(format!("{}: no such auth scheme configured", option.scheme_id));
            continue;
        };
        match chain.resolve(&option.identity_overrides) {
            Ok(identity) => {
                return Ok(SelectedAuthScheme {
                    identity,
                    scheme: scheme.clone(),
                    signer_overrides: option.signer_overrides.clone(),
                })
            }
            Err(err) if err.is_continuable() => {
                diagnostics.push(format!("{}: {err}", option.scheme_id));
            }
            Err(err) => return Err(err),
        }
    }
    Err(IdentityError::not_found(format!(
        "no auth scheme option resolved an identity ({} tried: {})",
        diagnostics.len(),
        diagnostics.join("; ")
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::AwsCredentials;
    use crate::resolver::StaticIdentityResolver;

    fn schemes() -> BTreeMap<String, AuthScheme> {
        let mut map = BTreeMap::new();
        map.insert(
            "aws.auth#sigv4".to_string(),
            AuthScheme {
                scheme_id: "aws.auth#sigv4".to_string(),
                request_type: "http".to_string(),
                identity_type: "aws.credentials".to_string(),
                signer: SignerKind::SigV4,
            },
        );
        map
    }

    #[test]
    fn first_resolvable_option_wins() {
        let chain = IdentityResolverChain::new().with_resolver(StaticIdentityResolver::new(Identity::AwsCredentials(
            AwsCredentials { access_key_id: "AKID".into(), secret_access_key: "s".into(), session_token: None, expiration: None },
        )));
        let options = vec![AuthSchemeOption { scheme_id: "aws.auth#sigv4".to_string(), ..Default::default() }];
        let selected = select_auth_scheme(&options, &schemes(), &chain).unwrap();
        assert_eq!(selected.scheme.scheme_id, "aws.auth#sigv4");
    }

    #[test]
    fn unconfigured_scheme_id_is_skipped_not_fatal() {
        let chain = IdentityResolverChain::new().with_resolver(StaticIdentityResolver::new(Identity::AwsCredentials(
            AwsCredentials { access_key_id: "AKID".into(), secret_access_key: "s".into(), session_token: None, expiration: None },
        )));
        let options = vec![
            AuthSchemeOption { scheme_id: "unknown#scheme".to_string(), ..Default::default() },
            AuthSchemeOption { scheme_id: "aws.auth#sigv4".to_string(), ..Default::default() },
        ];
        let selected = select_auth_scheme(&options, &schemes(), &chain).unwrap();
        assert_eq!(selected.scheme.scheme_id, "aws.auth#sigv4");
    }
}
