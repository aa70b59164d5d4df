// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scalar rendering shared by label, query, and header binding.

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use rpcforge_serde::{Document, Number};

/// RFC 3986 unreserved characters are left alone; everything else is
/// percent-encoded, matching Smithy's `encodeUnreserved`.
const UNRESERVED: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'/')
    .add(b'\\')
    .add(b'^')
    .add(b'|')
    .add(b'[')
    .add(b']')
    .add(b'!')
    .add(b'$')
    .add(b'&')
    .add(b'\'')
    .add(b'(')
    .add(b')')
    .add(b'*')
    .add(b'+')
    .add(b',')
    .add(b';')
    .add(b'=')
    .add(b':')
    .add(b'@');

/// Render a scalar [`Document`] (bool, number, string, timestamp) to its
/// plain string form. Returns `None` for containers and null, which have no
/// scalar rendering.
#[must_use]
pub fn scalar_to_string(value: &Document) -> Option<String> {
    match value {
        Document::Null | Document::Redacted => None,
        Document::Bool(b) => Some(b.to_string()),
        Document::Number(Number::Int(i)) => Some(i.to_string()),
        Document::Number(Number::Float(f)) => Some(f.to_string()),
        Document::String(s) => Some(s.clone()),
        Document::Timestamp(s) => Some(s.clone()),
        Document::Blob(_) | Document::Array(_) | Document::Map(_) => None,
    }
}

/// Percent-encode a label segment value. When `greedy`, `/` is preserved so
/// the value can span multiple path segments.
#[must_use]
pub fn percent_encode_label(value: &str, greedy: bool) -> String {
    if greedy {
        value
            .split('/')
            .map(|segment| utf8_percent_encode(segment, UNRESERVED).to_string())
            .collect::<Vec<_>>()
            .join("/")
    } else {
        utf8_percent_encode(value, UNRESERVED).to_string()
    }
}

/// Percent-encode a query string component (both keys and values).
#[must_use]
pub fn percent_encode_query(value: &str) -> String {
    utf8_percent_encode(value, UNRESERVED).to_string()
}

/// Render a value bound to a single `httpQuery` parameter, producing one
/// string per value — an array produces one entry per element, preserving
/// declaration order, so the caller can emit repeated `key=value` pairs.
#[must_use]
pub fn render_query_values(value: &Document) -> Vec<String> {
    match value {
        Document::Array(items) => items.iter().filter_map(scalar_to_string).collect(),
        other => scalar_to_string(other).into_iter().collect(),
    }
}

/// Render a value bound to a single `httpHeader`. A list value is
/// comma-joined, quoting any element containing a comma or double quote per
/// the HTTP binding's list-header convention. Returns `None` when the
/// header should be omitted (null, or an empty list).
#[must_use]
pub fn render_header_value(value: &Document) -> Option<String> {
    match value {
        Document::Array(items) => {
            if items.is_empty() {
                return None;
            }
            let rendered = items
                .iter()
                .filter_map(scalar_to_string)
                .map(|item| quote_header_item_if_needed(&item))
                .collect::<Vec<_>>();
            Some(rendered.join(","))
        }
        other => scalar_to_string(other),
    }
}

fn quote_header_item_if_needed(item: &str) -> String {
    if item.contains(',') || item.contains('"') {
        format!("\"{}\"", item.replace('"', "\\\""))
    } else {
        item.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greedy_label_preserves_slashes() {
        assert_eq!(percent_encode_label("a/b c", true), "a/b%20c");
        assert_eq!(percent_encode_label("a/b c", false), "a%2Fb%20c");
    }

    #[test]
    fn header_list_quotes_items_with_commas() {
        let value = Document::Array(vec![Document::from("a,b"), Document::from("plain")]);
        assert_eq!(render_header_value(&value).unwrap(), "\"a,b\",plain");
    }

    #[test]
    fn empty_header_list_is_omitted() {
        assert_eq!(render_header_value(&Document::Array(vec![])), None);
    }

    #[test]
    fn null_header_is_omitted() {
        assert_eq!(render_header_value(&Document::Null), None);
    }
}
