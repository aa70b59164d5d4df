// SPDX-License-Identifier: MIT OR Apache-2.0
//! Top-level SigV4 request signing: string-to-sign construction, the
//! derived-key HMAC cascade, and header injection.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::canonical::{body_hash, canonical_request, UNSIGNED_PAYLOAD};
use crate::error::SigningError;
use crate::keycache::SigningKeyCache;

type HmacSha256 = Hmac<Sha256>;

/// The fixed SigV4 algorithm identifier.
pub const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// The credential material a signature is computed against.
#[derive(Debug, Clone)]
pub struct SigningIdentity {
    /// The access key id placed in the `Credential` component.
    pub access_key_id: String,
    /// The secret key the derived signing key is built from. Never logged.
    pub secret_access_key: String,
    /// An optional session token, sent as `x-amz-security-token` when present.
    pub session_token: Option<String>,
}

/// Per-request signing context that a caller must supply explicitly —
/// SigV4 has no way to infer a region or service from the request alone.
#[derive(Debug, Clone)]
pub struct SigningParams {
    /// The signing region, e.g. `us-east-1`.
    pub region: String,
    /// The signing service name, e.g. `iam`.
    pub service: String,
    /// The signing timestamp. Callers pass this explicitly (rather than
    /// reading the system clock here) so the signer stays deterministic
    /// and testable.
    pub timestamp: DateTime<Utc>,
    /// Whether path segments should be percent-encoded twice, per the
    /// default SigV4 rule. Some services (S3) set this `false`.
    pub double_encode_path: bool,
    /// When `true`, the body hash is the literal `UNSIGNED-PAYLOAD`
    /// placeholder instead of a SHA-256 digest, for streaming bodies.
    pub unsigned_payload: bool,
    /// Whether the target service requires `x-amz-content-sha256` as an
    /// explicit signed header. Most services don't; S3 and a handful of
    /// others do. When `false`, the header is omitted entirely rather than
    /// sent unsigned.
    pub sign_payload: bool,
}

/// Signs requests, caching derived `kSigning` keys across calls.
pub struct Signer {
    cache: SigningKeyCache,
}

impl Signer {
    /// A signer with the default-capacity signing-key cache.
    #[must_use]
    pub fn new() -> Self {
        Self { cache: SigningKeyCache::new() }
    }

    /// A signer with a caller-chosen cache capacity.
    #[must_use]
    pub fn with_cache_capacity(capacity: usize) -> Self {
        Self { cache: SigningKeyCache::with_capacity(capacity) }
    }

    /// Sign `request` in place: injects `x-amz-date`,
    /// `x-amz-security-token` (if the identity carries a session token),
    /// `x-amz-content-sha256` (if `params.sign_payload` is set), and finally
    /// `authorization`, in that order.
    pub fn sign_request(
        &self,
        request: &mut http::Request<Bytes>,
        identity: &SigningIdentity,
        params: &SigningParams,
    ) -> Result<(), SigningError> {
        if params.region.is_empty() {
            return Err(SigningError::MissingRegion);
        }
        if params.service.is_empty() {
            return Err(SigningError::MissingService);
        }
        if identity.secret_access_key.is_empty() {
            return Err(SigningError::MissingSecretKey);
        }

        let amz_date = params.timestamp.format("%Y%m%dT%H%M%SZ").to_string();
        let date_stamp = params.timestamp.format("%Y%m%d").to_string();
        let content_hash = if params.unsigned_payload {
            UNSIGNED_PAYLOAD.to_string()
        } else {
            body_hash(Some(request.body()))
        };

        ensure_host_header(request)?;
        inject_lambda_trace_header(request)?;
        insert_header(request, "x-amz-date", &amz_date)?;
        if let Some(token) = &identity.session_token {
            insert_header(request, "x-amz-security-token", token)?;
        }
        if params.sign_payload {
            insert_header(request, "x-amz-content-sha256", &content_hash)?;
        }

        let headers: Vec<(String, String)> = request
            .headers()
            .iter()
            .map(|(name, value)| {
                let value = value.to_str().map_err(|e| SigningError::InvalidHeaderValue {
                    name: name.to_string(),
                    message: e.to_string(),
                })?;
                Ok((name.to_string(), value.to_string()))
            })
            .collect::<Result<_, SigningError>>()?;
        let query_pairs = parse_query(request.uri().query());

        let (canonical, signed_headers) = canonical_request(
            request.method().as_str(),
            request.uri().path(),
            &query_pairs,
            &headers,
            &content_hash,
            params.double_encode_path,
        );
        let hashed_canonical = hex_sha256(canonical.as_bytes());

        let scope = format!("{date_stamp}/{}/{}/aws4_request", params.region, params.service);
        let string_to_sign = format!("{ALGORITHM}\n{amz_date}\n{scope}\n{hashed_canonical}");

        let signing_key = self.signing_key(identity, &date_stamp, &params.region, &params.service);
        let signature = hex_encode(&hmac(&signing_key, string_to_sign.as_bytes()));

        let authorization = format!(
            "{ALGORITHM} Credential={}/{scope}, SignedHeaders={signed_headers}, Signature={signature}",
            identity.access_key_id
        );
        insert_header(request, "authorization", &authorization)?;

        Ok(())
    }

    fn signing_key(&self, identity: &SigningIdentity, date_stamp: &str, region: &str, service: &str) -> [u8; 32] {
        if let Some(cached) = self.cache.get(&identity.secret_access_key, date_stamp, region, service) {
            return cached;
        }
        let k_date = hmac(format!("AWS4{}", identity.secret_access_key).as_bytes(), date_stamp.as_bytes());
        let k_region = hmac(&k_date, region.as_bytes());
        let k_service = hmac(&k_region, service.as_bytes());
        let k_signing = hmac(&k_service, b"aws4_request");
        self.cache.insert(&identity.secret_access_key, date_stamp, region, service, k_signing);
        k_signing
    }
}

impl Default for Signer {
    fn default() -> Self {
        Self::new()
    }
}

fn ensure_host_header(request: &mut http::Request<Bytes>) -> Result<(), SigningError> {
    if request.headers().contains_key(http::header::HOST) {
        return Ok(());
    }
    let authority = request
        .uri()
        .authority()
        .map(ToString::to_string)
        .ok_or_else(|| SigningError::InvalidHeaderValue {
            name: "host".to_string(),
            message: "request URI has no authority to derive a host header from".to_string(),
        })?;
    insert_header(request, "host", &authority)
}

/// The Lambda runtime sets this for every invocation; its presence is how
/// a signer tells it's running inside a Lambda function at all.
const LAMBDA_FUNCTION_NAME_VAR: &str = "AWS_LAMBDA_FUNCTION_NAME";
/// The Lambda runtime propagates the active X-Ray trace id through this
/// variable, refreshing it for every invocation.
const LAMBDA_TRACE_ID_VAR: &str = "_X_AMZN_TRACE_ID";

/// Adds `x-amzn-trace-id` ahead of the rest of the signing headers so it
/// ends up in the signed-headers set, not appended after the fact. Lambda
/// uses this header to detect a function recursively invoking itself
/// through its own SDK calls; outside Lambda neither environment variable
/// is set and this is a no-op.
fn inject_lambda_trace_header(request: &mut http::Request<Bytes>) -> Result<(), SigningError> {
    if request.headers().contains_key("x-amzn-trace-id") {
        return Ok(());
    }
    if std::env::var_os(LAMBDA_FUNCTION_NAME_VAR).is_none() {
        return Ok(());
    }
    let Ok(trace_id) = std::env::var(LAMBDA_TRACE_ID_VAR) else {
        return Ok(());
    };
    insert_header(request, "x-amzn-trace-id", &trace_id)
}

fn insert_header(request: &mut http::Request<Bytes>, name: &str, value: &str) -> Result<(), SigningError> {
    let header_name = http::HeaderName::from_bytes(name.as_bytes()).map_err(|e| SigningError::InvalidHeaderValue {
        name: name.to_string(),
        message: e.to_string(),
    })?;
    let header_value = http::HeaderValue::from_str(value).map_err(|e| SigningError::InvalidHeaderValue {
        name: name.to_string(),
        message: e.to_string(),
    })?;
    request.headers_mut().insert(header_name, header_value);
    Ok(())
}

fn parse_query(query: Option<&str>) -> Vec<(String, String)> {
    let Some(query) = query else {
        return Vec::new();
    };
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((k, v)) => (k.to_string(), v.to_string()),
            None => (pair.to_string(), String::new()),
        })
        .collect()
}

fn hmac(key: &[u8], data: &[u8]) -> [u8; 32] {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(data);
    mac.finalize().into_bytes().into()
}

fn hex_sha256(data: &[u8]) -> String {
    use sha2::Digest;
    hex_encode(&Sha256::digest(data))
}

fn hex_encode(bytes: impl AsRef<[u8]>) -> String {
    let mut out = String::with_capacity(bytes.as_ref().len() * 2);
    for b in bytes.as_ref() {
        out.push_str(&format!("{b:02x}"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn identity() -> SigningIdentity {
        SigningIdentity {
            access_key_id: "AKIDEXAMPLE".to_string(),
            secret_access_key: "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY".to_string(),
            session_token: None,
        }
    }

    fn params() -> SigningParams {
        SigningParams {
            region: "us-east-1".to_string(),
            service: "iam".to_string(),
            timestamp: Utc.with_ymd_and_hms(2015, 8, 30, 12, 36, 0).unwrap(),
            double_encode_path: true,
            unsigned_payload: false,
            sign_payload: false,
        }
    }

    #[test]
    fn documented_aws_get_vanilla_vector_matches_known_signature() {
        // The `get-vanilla` vector from AWS's published SigV4 test suite:
        // a bare `GET /` with no query, signed against the canonical
        // `service`/`us-east-1` example credentials.
        let mut request =
            http::Request::builder().method("GET").uri("http://example.amazonaws.com/").body(Bytes::new()).unwrap();

        let mut vector_params = params();
        vector_params.service = "service".to_string();

        let signer = Signer::new();
        signer.sign_request(&mut request, &identity(), &vector_params).unwrap();

        let authorization = request.headers().get("authorization").unwrap().to_str().unwrap();
        assert_eq!(
            authorization,
            "AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20150830/us-east-1/service/aws4_request, \
             SignedHeaders=host;x-amz-date, \
             Signature=5fa00fa31553b73ebf1942676e86291e8372ff2a2260956d9b8aae1d763fbf31"
        );
        assert_eq!(request.headers().get("x-amz-date").unwrap(), "20150830T123600Z");
    }

    #[test]
    fn worked_get_example_with_query_matches_known_signature() {
        let mut request = http::Request::builder()
            .method("GET")
            .uri("https://iam.amazonaws.com/?Action=ListUsers&Version=2010-05-08")
            .body(Bytes::new())
            .unwrap();

        let signer = Signer::new();
        signer.sign_request(&mut request, &identity(), &params()).unwrap();

        let authorization = request.headers().get("authorization").unwrap().to_str().unwrap();
        assert_eq!(
            authorization,
            "AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20150830/us-east-1/iam/aws4_request, \
             SignedHeaders=host;x-amz-date, \
             Signature=5d672d79c15b13162d9279b0855cfba6789a8edb4c82c400e6f5e5311be250e9"
        );
        assert_eq!(request.headers().get("x-amz-date").unwrap(), "20150830T123600Z");
    }

    #[test]
    fn sign_payload_adds_content_sha256_to_signed_headers() {
        let mut request = http::Request::builder().uri("https://s3.amazonaws.com/").body(Bytes::new()).unwrap();
        let mut p = params();
        p.sign_payload = true;

        let signer = Signer::new();
        signer.sign_request(&mut request, &identity(), &p).unwrap();

        assert!(request.headers().contains_key("x-amz-content-sha256"));
        let authorization = request.headers().get("authorization").unwrap().to_str().unwrap();
        assert!(authorization.contains("SignedHeaders=host;x-amz-content-sha256;x-amz-date"));
    }

    #[test]
    fn session_token_is_injected_and_signed() {
        let mut request = http::Request::builder()
            .method("GET")
            .uri("https://iam.amazonaws.com/")
            .body(Bytes::new())
            .unwrap();
        let mut id = identity();
        id.session_token = Some("TOKEN123".to_string());

        let signer = Signer::new();
        signer.sign_request(&mut request, &id, &params()).unwrap();

        assert_eq!(request.headers().get("x-amz-security-token").unwrap(), "TOKEN123");
        let authorization = request.headers().get("authorization").unwrap().to_str().unwrap();
        assert!(authorization.contains("x-amz-security-token"));
    }

    #[test]
    fn repeated_signing_within_the_same_day_reuses_the_cached_key() {
        let signer = Signer::new();
        let mut first = http::Request::builder().uri("https://iam.amazonaws.com/").body(Bytes::new()).unwrap();
        let mut second = http::Request::builder().uri("https://iam.amazonaws.com/").body(Bytes::new()).unwrap();
        signer.sign_request(&mut first, &identity(), &params()).unwrap();
        assert_eq!(signer.cache.len(), 1);
        signer.sign_request(&mut second, &identity(), &params()).unwrap();
        assert_eq!(signer.cache.len(), 1);
    }

    #[test]
    fn lambda_trace_header_is_added_and_signed_when_running_in_lambda() {
        // SAFETY-sensitive only in the sense that env vars are process-global;
        // this test doesn't run concurrently with anything else that reads
        // these two names.
        unsafe {
            std::env::set_var(LAMBDA_FUNCTION_NAME_VAR, "my-function");
            std::env::set_var(LAMBDA_TRACE_ID_VAR, "Root=1-5e1b4151-5ac6c58f");
        }

        let mut request = http::Request::builder().uri("https://iam.amazonaws.com/").body(Bytes::new()).unwrap();
        Signer::new().sign_request(&mut request, &identity(), &params()).unwrap();

        assert_eq!(request.headers().get("x-amzn-trace-id").unwrap(), "Root=1-5e1b4151-5ac6c58f");
        let authorization = request.headers().get("authorization").unwrap().to_str().unwrap();
        assert!(authorization.contains("x-amzn-trace-id"));

        unsafe {
            std::env::remove_var(LAMBDA_FUNCTION_NAME_VAR);
            std::env::remove_var(LAMBDA_TRACE_ID_VAR);
        }
    }

    #[test]
    fn lambda_trace_header_is_absent_outside_lambda() {
        unsafe {
            std::env::remove_var(LAMBDA_FUNCTION_NAME_VAR);
        }
        let mut request = http::Request::builder().uri("https://iam.amazonaws.com/").body(Bytes::new()).unwrap();
        Signer::new().sign_request(&mut request, &identity(), &params()).unwrap();
        assert!(request.headers().get("x-amzn-trace-id").is_none());
    }

    #[test]
    fn empty_region_is_a_fatal_signing_error() {
        let mut request = http::Request::builder().uri("https://iam.amazonaws.com/").body(Bytes::new()).unwrap();
        let mut p = params();
        p.region = String::new();
        let err = Signer::new().sign_request(&mut request, &identity(), &p).unwrap_err();
        assert!(matches!(err, SigningError::MissingRegion));
    }
}
