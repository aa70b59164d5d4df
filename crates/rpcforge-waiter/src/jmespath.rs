// SPDX-License-Identifier: MIT OR Apache-2.0
//! A minimal JMESPath-compatible evaluator.
//!
//! Supports dotted field access and `[index]` list indexing — enough to
//! express the paths a waiter acceptor needs — not the full JMESPath
//! grammar (no filters, functions, or slices).

use rpcforge_serde::Document;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Field(String),
    Index(usize),
}

fn parse(expr: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    for dotted in expr.split('.') {
        let mut rest = dotted;
        if let Some(bracket) = rest.find('[') {
            let (name, tail) = rest.split_at(bracket);
            if !name.is_empty() {
                segments.push(Segment::Field(name.to_string()));
            }
            rest = tail;
            while let Some(close) = rest.find(']') {
                let index_str = &rest[1..close];
                if let Ok(index) = index_str.parse::<usize>() {
                    segments.push(Segment::Index(index));
                }
                rest = &rest[close + 1..];
            }
        } else if !rest.is_empty() {
            segments.push(Segment::Field(rest.to_string()));
        }
    }
    segments
}

/// Evaluate `expr` against `document`, returning the matched value.
///
/// Waiters build `document` as `{"input": <input>, "output": <output>}` so
/// `input.Foo` and `output.Bar[0]` dispatch to the respective sub-document,
/// per the root-dispatch convention.
#[must_use]
pub fn evaluate<'a>(expr: &str, document: &'a Document) -> Option<&'a Document> {
    let mut current = document;
    for segment in parse(expr) {
        current = match segment {
            Segment::Field(name) => current.as_map()?.get(&name)?,
            Segment::Index(index) => current.as_array()?.get(index)?,
        };
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn fixture() -> Document {
        let mut state = BTreeMap::new();
        state.insert("Name".to_string(), Document::String("running".to_string()));
        let mut instance = BTreeMap::new();
        instance.insert("State".to_string(), Document::Map(state));
        let mut output = BTreeMap::new();
        output.insert("Instances".to_string(), Document::Array(vec![Document::Map(instance)]));
        let mut root = BTreeMap::new();
        root.insert("output".to_string(), Document::Map(output));
        Document::Map(root)
    }

    #[test]
    fn dotted_field_and_index_resolve() {
        let doc = fixture();
        let value = evaluate("output.Instances[0].State.Name", &doc).unwrap();
        assert_eq!(value, &Document::String("running".to_string()));
    }

    #[test]
    fn missing_path_segment_yields_none() {
        let doc = fixture();
        assert!(evaluate("output.Instances[5].State.Name", &doc).is_none());
        assert!(evaluate("output.Nope", &doc).is_none());
    }
}
