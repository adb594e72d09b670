//! Property tests for the merge engine.
//!
//! - Replace is idempotent: applying the same proposal twice equals applying it once.
//! - Append accumulates: N appends of scalars to an array grow it by N, in order.
//! - Merge never drops keys that the proposal does not mention.
//! - A failed proposal leaves the document untouched.

use cedit_document::{Document, FieldPath};
use cedit_merge::{MergeEngine, MergeStrategy, UpdateProposal};
use proptest::prelude::*;
use serde_json::{json, Map, Value};

fn arb_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::Bool),
        any::<i32>().prop_map(|n| json!(n)),
        "[a-z]{0,6}".prop_map(Value::String),
    ]
}

fn arb_object() -> impl Strategy<Value = Map<String, Value>> {
    prop::collection::btree_map("[a-e]{1,2}", arb_scalar(), 0..5).prop_map(|m| m.into_iter().collect())
}

fn arb_path() -> impl Strategy<Value = FieldPath> {
    prop::collection::vec("[a-c]{1,2}", 1..4).prop_map(|keys| keys.join(".").parse().unwrap())
}

proptest! {
    #[test]
    fn prop_replace_is_idempotent(base in arb_object(), path in arb_path(), value in arb_scalar()) {
        let engine = MergeEngine::new();
        let update = UpdateProposal::new("s", path, value);
        let doc = Document::from(Value::Object(base));

        if let Ok(once) = engine.apply(&doc, &update, None) {
            let twice = engine.apply(&once.document, &update, None).unwrap();
            prop_assert_eq!(&twice.document, &once.document);
            prop_assert!(twice.change.is_noop());
        }
    }

    #[test]
    fn prop_append_accumulates(values in prop::collection::vec(any::<i32>(), 1..8)) {
        let engine = MergeEngine::new();
        let updates: Vec<_> = values
            .iter()
            .map(|v| {
                UpdateProposal::new("s", "items".parse().unwrap(), json!(v))
                    .with_strategy(MergeStrategy::Append)
            })
            .collect();

        let out = engine.apply_batch(&Document::empty_object(), &updates, None);
        prop_assert!(out.failures.is_empty());
        prop_assert_eq!(out.document, Document::from(json!({ "items": values })));
    }

    #[test]
    fn prop_merge_keeps_unmentioned_keys(current in arb_object(), incoming in arb_object()) {
        let engine = MergeEngine::new();
        let doc = Document::from(json!({ "v": current.clone() }));
        let update = UpdateProposal::new("s", "v".parse().unwrap(), Value::Object(incoming.clone()))
            .with_strategy(MergeStrategy::Merge);

        let out = engine.apply(&doc, &update, None).unwrap();
        let merged = out.document.to_json();
        for (k, v) in &current {
            let expected = incoming.get(k).unwrap_or(v);
            prop_assert_eq!(&merged["v"][k], expected);
        }
        for (k, v) in &incoming {
            prop_assert_eq!(&merged["v"][k], v);
        }
    }

    #[test]
    fn prop_failed_proposal_is_atomic(base in arb_object(), value in arb_scalar()) {
        let engine = MergeEngine::new();
        let doc = Document::from(json!({ "n": 7, "rest": Value::Object(base) }));
        let update = UpdateProposal::new("s", "n".parse().unwrap(), value)
            .with_strategy(MergeStrategy::Merge);

        let out = engine.apply_batch(&doc, [&update], None);
        prop_assert_eq!(out.failures.len(), 1);
        prop_assert_eq!(out.document, doc);
    }
}

#[test]
fn append_string_accumulates_with_separator() {
    let engine = MergeEngine::new();
    let updates: Vec<_> = ["chest pain", "worse on exertion"]
        .iter()
        .map(|v| UpdateProposal::new("s", "hpi".parse().unwrap(), *v).with_strategy(MergeStrategy::Append))
        .collect();

    let out = engine.apply_batch(&Document::empty_object(), &updates, None);
    assert_eq!(
        out.document,
        Document::from(json!({"hpi": "chest pain worse on exertion"}))
    );
}
