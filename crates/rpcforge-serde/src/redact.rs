// SPDX-License-Identifier: MIT OR Apache-2.0
//! Diagnostic redaction of [`Document`] values carrying the `sensitive` trait.

use std::collections::BTreeMap;

use rpcforge_schema::{SchemaRef, SchemaRegistry, ShapeKind, TraitKey};

use crate::document::Document;

/// Render `value` (already decoded against `schema`) for diagnostics,
/// replacing any sub-value whose schema carries the `sensitive` trait
/// (directly, or via the target of a member) with [`Document::Redacted`].
///
/// Structures, unions, lists, sets, maps, and blobs are all honored per the
/// member/element schema that produced them; a sensitive container redacts
/// wholesale rather than recursing into its children.
#[must_use]
pub fn redact_for_diagnostics(registry: &SchemaRegistry, schema: SchemaRef, value: &Document) -> Document {
    if registry.effective_trait(schema, TraitKey::Sensitive).is_some() {
        return Document::Redacted;
    }

    match (registry.kind_of(schema), value) {
        (ShapeKind::Member { target }, _) => redact_for_diagnostics(registry, *target, value),
        (ShapeKind::List { member } | ShapeKind::Set { member }, Document::Array(items)) => Document::Array(
            items
                .iter()
                .map(|item| redact_for_diagnostics(registry, *member, item))
                .collect(),
        ),
        (ShapeKind::Map { value: value_schema, .. }, Document::Map(entries)) => Document::Map(
            entries
                .iter()
                .map(|(k, v)| (k.clone(), redact_for_diagnostics(registry, *value_schema, v)))
                .collect(),
        ),
        (ShapeKind::Structure(layout) | ShapeKind::Union(layout), Document::Map(entries)) => {
            let mut out = BTreeMap::new();
            for (name, value) in entries {
                let rendered = match layout.index_of(name) {
                    Some(idx) => redact_for_diagnostics(registry, layout.members[idx].member_ref, value),
                    None => value.clone(),
                };
                out.insert(name.clone(), rendered);
            }
            Document::Map(out)
        }
        _ => value.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rpcforge_schema::{builder, SchemaBuilder, ShapeId, TraitMap};

    #[test]
    fn sensitive_member_is_redacted_but_siblings_survive() {
        let mut b = SchemaBuilder::new();
        let ns = "demo.redact";
        let string_ref = b
            .define_new(ShapeId::new(ns, "String"), ShapeKind::String, TraitMap::new())
            .unwrap();

        let mut sensitive_traits = builder::member_traits(false, []);
        sensitive_traits.insert(rpcforge_schema::Trait::Sensitive);
        let password_member = b
            .define_new(
                ShapeId::member(ns, "Login", "password"),
                ShapeKind::Member { target: string_ref },
                sensitive_traits,
            )
            .unwrap();
        let username_member = b
            .define_new(
                ShapeId::member(ns, "Login", "username"),
                ShapeKind::Member { target: string_ref },
                builder::member_traits(true, []),
            )
            .unwrap();

        let login_id = ShapeId::new(ns, "Login");
        let layout = SchemaBuilder::layout(vec![
            ("username".to_string(), username_member, true),
            ("password".to_string(), password_member, false),
        ]);
        let login_ref = b
            .define_new(login_id, ShapeKind::Structure(layout), TraitMap::new())
            .unwrap();
        let registry = b.build().unwrap();

        let mut value = BTreeMap::new();
        value.insert("username".to_string(), Document::from("alice"));
        value.insert("password".to_string(), Document::from("hunter2"));
        let rendered = redact_for_diagnostics(&registry, login_ref, &Document::Map(value));

        let rendered_map = rendered.as_map().unwrap();
        assert_eq!(rendered_map.get("username"), Some(&Document::from("alice")));
        assert_eq!(rendered_map.get("password"), Some(&Document::Redacted));
    }

    #[test]
    fn sensitive_list_element_target_redacts_every_entry() {
        let mut b = SchemaBuilder::new();
        let ns = "demo.redact.list";
        let mut secret_traits = TraitMap::new();
        secret_traits.insert(rpcforge_schema::Trait::Sensitive);
        let secret_string_ref = b
            .define_new(ShapeId::new(ns, "SecretString"), ShapeKind::String, secret_traits)
            .unwrap();
        let list_member = b
            .define_new(
                ShapeId::member(ns, "Secrets", "member"),
                ShapeKind::Member { target: secret_string_ref },
                TraitMap::new(),
            )
            .unwrap();
        let list_ref = b
            .define_new(
                ShapeId::new(ns, "Secrets"),
                ShapeKind::List { member: list_member },
                TraitMap::new(),
            )
            .unwrap();
        let registry = b.build().unwrap();

        let value = Document::Array(vec![Document::from("a"), Document::from("b")]);
        let rendered = redact_for_diagnostics(&registry, list_ref, &value);
        assert_eq!(
            rendered,
            Document::Array(vec![Document::Redacted, Document::Redacted])
        );
    }
}
