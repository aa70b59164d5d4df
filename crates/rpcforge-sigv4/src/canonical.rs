// SPDX-License-Identifier: MIT OR Apache-2.0
//! Canonical request construction per the SigV4 algorithm.

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use sha2::{Digest, Sha256};

/// SigV4's unreserved set: `A-Z a-z 0-9 - _ . ~`.
const UNRESERVED: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'!')
    .add(b'"')
    .add(b'#')
    .add(b'$')
    .add(b'%')
    .add(b'&')
    .add(b'\'')
    .add(b'(')
    .add(b')')
    .add(b'*')
    .add(b'+')
    .add(b',')
    .add(b'/')
    .add(b':')
    .add(b';')
    .add(b'<')
    .add(b'=')
    .add(b'>')
    .add(b'?')
    .add(b'@')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// The literal body-hash placeholder for unsigned-payload requests.
pub const UNSIGNED_PAYLOAD: &str = "UNSIGNED-PAYLOAD";

/// Percent-encode a single path segment using SigV4's unreserved set.
#[must_use]
pub fn encode_path_segment(segment: &str) -> String {
    utf8_percent_encode(segment, UNRESERVED).to_string()
}

/// Canonicalize a URI path: `/` is preserved, every other character outside
/// the unreserved set is percent-encoded, and (per SigV4's default
/// "double-url-encode" rule) segments that are already percent-encoded are
/// encoded a second time unless `double_encode` is `false`.
#[must_use]
pub fn canonical_path(path: &str, double_encode: bool) -> String {
    if path.is_empty() {
        return "/".to_string();
    }
    let segments: Vec<String> = path
        .split('/')
        .map(|segment| {
            if double_encode {
                encode_path_segment(&encode_path_segment(&decode_once(segment)))
            } else {
                encode_path_segment(&decode_once(segment))
            }
        })
        .collect();
    segments.join("/")
}

fn decode_once(segment: &str) -> String {
    percent_encoding::percent_decode_str(segment)
        .decode_utf8()
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| segment.to_string())
}

/// Canonicalize a query string: parameters sorted by `(name, value)` in
/// byte order, each percent-encoded.
#[must_use]
pub fn canonical_query(pairs: &[(String, String)]) -> String {
    let mut encoded: Vec<(String, String)> = pairs
        .iter()
        .map(|(k, v)| (encode_path_segment(k), encode_path_segment(v)))
        .collect();
    encoded.sort();
    encoded.into_iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>().join("&")
}

/// Canonicalize headers: lowercase names, interior whitespace runs
/// collapsed to a single space, sorted by name. Returns
/// `(canonical_headers_block, signed_headers_list)`.
#[must_use]
pub fn canonical_headers(headers: &[(String, String)]) -> (String, String) {
    let mut collapsed: Vec<(String, String)> = headers
        .iter()
        .map(|(name, value)| (name.to_ascii_lowercase(), collapse_whitespace(value)))
        .collect();
    collapsed.sort_by(|a, b| a.0.cmp(&b.0));

    let mut block = String::new();
    let mut names = Vec::with_capacity(collapsed.len());
    for (name, value) in &collapsed {
        block.push_str(name);
        block.push(':');
        block.push_str(value);
        block.push('\n');
        names.push(name.clone());
    }
    (block, names.join(";"))
}

fn collapse_whitespace(value: &str) -> String {
    let trimmed = value.trim();
    let mut out = String::with_capacity(trimmed.len());
    let mut last_was_space = false;
    for c in trimmed.chars() {
        if c.is_whitespace() {
            if !last_was_space {
                out.push(' ');
            }
            last_was_space = true;
        } else {
            out.push(c);
            last_was_space = false;
        }
    }
    out
}

/// Hex-encoded SHA-256 of `body`, or [`UNSIGNED_PAYLOAD`] when `body` is
/// `None` (a streaming, unsigned-payload request).
#[must_use]
pub fn body_hash(body: Option<&[u8]>) -> String {
    match body {
        Some(bytes) => hex::encode(Sha256::digest(bytes)),
        None => UNSIGNED_PAYLOAD.to_string(),
    }
}

/// Assemble the canonical request string that gets SHA-256 hashed for the
/// string-to-sign.
#[must_use]
pub fn canonical_request(
    method: &str,
    path: &str,
    query_pairs: &[(String, String)],
    headers: &[(String, String)],
    body_hash: &str,
    double_encode_path: bool,
) -> (String, String) {
    let (header_block, signed_headers) = canonical_headers(headers);
    let request = format!(
        "{method}\n{path}\n{query}\n{header_block}\n{signed_headers}\n{body_hash}",
        path = canonical_path(path, double_encode_path),
        query = canonical_query(query_pairs),
    );
    (request, signed_headers)
}

/// Minimal hex encoder, avoiding an extra dependency for a handful of call
/// sites.
mod hex {
    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        let mut out = String::with_capacity(bytes.as_ref().len() * 2);
        for b in bytes.as_ref() {
            out.push_str(&format!("{b:02x}"));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_query_sorts_by_name_then_value() {
        let pairs = vec![("b".to_string(), "2".to_string()), ("a".to_string(), "1".to_string())];
        assert_eq!(canonical_query(&pairs), "a=1&b=2");
    }

    #[test]
    fn canonical_headers_collapses_whitespace_and_sorts() {
        let headers = vec![
            ("Host".to_string(), "iam.amazonaws.com".to_string()),
            ("X-Amz-Date".to_string(), "  20150830T123600Z  ".to_string()),
        ];
        let (block, signed) = canonical_headers(&headers);
        assert_eq!(block, "host:iam.amazonaws.com\nx-amz-date:20150830T123600Z\n");
        assert_eq!(signed, "host;x-amz-date");
    }

    #[test]
    fn body_hash_of_empty_body_matches_known_sha256() {
        assert_eq!(
            body_hash(Some(b"")),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn unsigned_payload_placeholder_used_when_no_body() {
        assert_eq!(body_hash(None), UNSIGNED_PAYLOAD);
    }
}
