// SPDX-License-Identifier: MIT OR Apache-2.0
//! Acceptor matchers: output predicates, error-shape matches, and
//! JMESPath path/value/comparator checks.

use rpcforge_serde::Document;

use crate::jmespath;

/// The comparators a JMESPath matcher can use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    /// The matched value, as a string, equals the expected string.
    StringEquals,
    /// The matched value, as a boolean, equals the expected boolean.
    BooleanEquals,
    /// The matched value is a list and every element equals the expected
    /// string.
    AllStringEquals,
    /// The matched value is a list and at least one element equals the
    /// expected string.
    AnyStringEquals,
}

/// One way an acceptor can recognize a poll outcome.
pub enum Matcher {
    /// A predicate over the decoded output. Only consulted on success.
    Output(Box<dyn Fn(&Document) -> bool + Send + Sync>),
    /// Matches when a failed poll decoded to this modeled error shape.
    Error {
        /// The bare error shape name to match against.
        shape_id: String,
    },
    /// A JMESPath path evaluated against `{input, output}`, compared to an
    /// expected value with `comparator`.
    JmesPath {
        /// The path expression.
        path: String,
        /// The value to compare the matched node against.
        expected: Document,
        /// How to compare.
        comparator: Comparator,
    },
}

/// The result of one poll, as seen by the matcher layer.
pub enum PollOutcome<'a> {
    /// The operation returned a decoded output.
    Output(&'a Document),
    /// The operation failed with a modeled error shape.
    Error {
        /// The bare error shape name.
        shape_id: &'a str,
    },
}

impl Matcher {
    /// `true` if this matcher recognizes `outcome`, given the original
    /// `input` (for JMESPath root dispatch).
    #[must_use]
    pub fn matches(&self, input: &Document, outcome: &PollOutcome<'_>) -> bool {
        match self {
            Self::Output(predicate) => match outcome {
                PollOutcome::Output(output) => predicate(output),
                PollOutcome::Error { .. } => false,
            },
            Self::Error { shape_id } => match outcome {
                PollOutcome::Error { shape_id: actual } => actual == shape_id,
                PollOutcome::Output(_) => false,
            },
            Self::JmesPath { path, expected, comparator } => {
                let PollOutcome::Output(output) = outcome else {
                    return false;
                };
                let mut root = std::collections::BTreeMap::new();
                root.insert("input".to_string(), input.clone());
                root.insert("output".to_string(), (*output).clone());
                let document = Document::Map(root);
                let Some(matched) = jmespath::evaluate(path, &document) else {
                    return false;
                };
                compare(matched, expected, *comparator)
            }
        }
    }
}

fn compare(actual: &Document, expected: &Document, comparator: Comparator) -> bool {
    match comparator {
        Comparator::StringEquals => matches!((actual, expected), (Document::String(a), Document::String(e)) if a == e),
        Comparator::BooleanEquals => matches!((actual, expected), (Document::Bool(a), Document::Bool(e)) if a == e),
        Comparator::AllStringEquals => {
            let Document::String(expected) = expected else { return false };
            let Some(items) = actual.as_array() else { return false };
            !items.is_empty() && items.iter().all(|item| matches!(item, Document::String(s) if s == expected))
        }
        Comparator::AnyStringEquals => {
            let Document::String(expected) = expected else { return false };
            let Some(items) = actual.as_array() else { return false };
            items.iter().any(|item| matches!(item, Document::String(s) if s == expected))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_string_equals_requires_every_element_to_match() {
        let actual = Document::Array(vec![Document::from("running"), Document::from("running")]);
        assert!(compare(&actual, &Document::from("running"), Comparator::AllStringEquals));
        let mixed = Document::Array(vec![Document::from("running"), Document::from("pending")]);
        assert!(!compare(&mixed, &Document::from("running"), Comparator::AllStringEquals));
    }

    #[test]
    fn any_string_equals_requires_one_match() {
        let mixed = Document::Array(vec![Document::from("running"), Document::from("pending")]);
        assert!(compare(&mixed, &Document::from("pending"), Comparator::AnyStringEquals));
    }

    #[test]
    fn error_matcher_compares_bare_shape_id() {
        let matcher = Matcher::Error { shape_id: "ResourceNotFoundException".to_string() };
        let outcome = PollOutcome::Error { shape_id: "ResourceNotFoundException" };
        assert!(matcher.matches(&Document::Null, &outcome));
    }
}
