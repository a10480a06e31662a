// Copyright 2024 The DocAssert Authors
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Property-based tests for the JSON differ.

use json_patch_assert::json_diff::{diff, render, Config, IgnoreRules, Key, Operation, Path};
use proptest::collection::{btree_map, vec};
use proptest::prelude::*;
use proptest::string::string_regex;
use serde_json::{json, Map, Value};

fn arb_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        "[a-zA-Z0-9 ]{0,8}".prop_map(Value::String),
    ]
}

fn arb_key() -> impl Strategy<Value = String> {
    string_regex("[a-z]{1,6}").unwrap()
}

fn arb_json_value() -> impl Strategy<Value = Value> {
    arb_scalar().prop_recursive(4, 32, 5, move |inner| {
        prop_oneof![
            vec(inner.clone(), 0..5).prop_map(Value::Array),
            btree_map(arb_key(), inner, 0..5)
                .prop_map(|map| Value::Object(map.into_iter().collect::<Map<String, Value>>())),
        ]
    })
}

/// Rules over paths that the generated documents are likely to contain.
fn arb_rules() -> impl Strategy<Value = IgnoreRules> {
    let pointers = prop_oneof![
        Just(""),
        Just("/a"),
        Just("/a/0"),
        Just("/b"),
        Just("/0"),
        Just("/1/a"),
    ];
    (vec(pointers.clone(), 0..3), vec(pointers, 0..3)).prop_map(|(values, orders)| {
        IgnoreRules::new()
            .ignore_values_for(values)
            .and_then(|rules| rules.ignore_order_for(orders))
            .unwrap()
    })
}

/// Array elements drawn from a small pool, so arrays share values and
/// elements get kept, paired, moved and duplicated.
fn arb_element() -> impl Strategy<Value = Value> {
    prop_oneof![
        (0..4i64).prop_map(Value::from),
        (0..3i64).prop_map(|n| json!({ "n": n })),
        vec(0..3i64, 0..3).prop_map(|items| json!(items)),
    ]
}

/// Applies the operations in order, as an RFC 6902 consumer would.
fn apply(document: &mut Value, operations: &[Operation]) -> Result<(), String> {
    for operation in operations {
        match operation {
            Operation::Add { path, value } => add(document, path, value.clone())?,
            Operation::Remove { path, .. } => {
                remove(document, path)?;
            }
            Operation::Replace { path, value } => *node_mut(document, path)? = value.clone(),
            Operation::Move { from, path } => {
                let value = remove(document, from)?;
                add(document, path, value)?;
            }
        }
    }
    Ok(())
}

fn child_mut<'v>(node: &'v mut Value, key: &Key) -> Option<&'v mut Value> {
    match node {
        Value::Array(items) => items.get_mut(key.as_index()?),
        Value::Object(members) => members.get_mut(key.segment().as_ref()),
        _ => None,
    }
}

fn node_mut<'v>(document: &'v mut Value, path: &Path) -> Result<&'v mut Value, String> {
    path.keys()
        .into_iter()
        .try_fold(document, |node, key| {
            child_mut(node, key).ok_or_else(|| format!("no node at {}", path))
        })
}

fn add(document: &mut Value, path: &Path, value: Value) -> Result<(), String> {
    let Some((parent, key)) = path.split_last() else {
        *document = value;
        return Ok(());
    };
    match node_mut(document, parent)? {
        Value::Array(items) => match key.as_index() {
            Some(at) if at <= items.len() => {
                items.insert(at, value);
                Ok(())
            }
            _ => Err(format!("cannot insert at {}", path)),
        },
        Value::Object(members) => {
            members.insert(key.segment().into_owned(), value);
            Ok(())
        }
        _ => Err(format!("no container at {}", parent)),
    }
}

fn remove(document: &mut Value, path: &Path) -> Result<Value, String> {
    let (parent, key) = path.split_last().ok_or("cannot remove the root")?;
    match node_mut(document, parent)? {
        Value::Array(items) => match key.as_index() {
            Some(at) if at < items.len() => Ok(items.remove(at)),
            _ => Err(format!("nothing to remove at {}", path)),
        },
        Value::Object(members) => members
            .remove(key.segment().as_ref())
            .ok_or_else(|| format!("nothing to remove at {}", path)),
        _ => Err(format!("no container at {}", parent)),
    }
}

#[test]
fn apply_follows_rfc_6902_indices() {
    let operations = diff(
        &json!({ "array": ["x", "a", "b"] }),
        &json!({ "array": ["a", "b", "y", "x"] }),
        &Config::new(),
    );
    let mut patched = json!({ "array": ["x", "a", "b"] });

    assert_eq!(apply(&mut patched, &operations), Ok(()));
    assert_eq!(patched, json!({ "array": ["a", "b", "y", "x"] }));
}

proptest! {
    #[test]
    fn identical_documents_produce_empty_diff(json in arb_json_value(), rules in arb_rules()) {
        let config = Config::new().rules(rules);
        let operations = diff(&json, &json.clone(), &config);
        prop_assert!(operations.is_empty(), "unexpected patch {}", render(&operations));
    }

    #[test]
    fn empty_diff_means_equal_documents(actual in arb_json_value(), expected in arb_json_value()) {
        let operations = diff(&actual, &expected, &Config::new());
        prop_assert_eq!(operations.is_empty(), actual == expected);
    }

    #[test]
    fn ignoring_the_differing_leaf_hides_it(
        base in btree_map(arb_key(), arb_json_value(), 0..5),
        key in arb_key(),
        actual_leaf in arb_scalar(),
        expected_leaf in arb_scalar(),
    ) {
        let mut actual = base.clone().into_iter().collect::<Map<String, Value>>();
        let mut expected = base.into_iter().collect::<Map<String, Value>>();
        actual.insert(key.clone(), actual_leaf.clone());
        expected.insert(key.clone(), expected_leaf.clone());
        let (actual, expected) = (Value::Object(actual), Value::Object(expected));

        let operations = diff(&actual, &expected, &Config::new());
        if actual_leaf == expected_leaf {
            prop_assert!(operations.is_empty());
        } else {
            prop_assert_eq!(operations.len(), 1);
            let is_replace = matches!(&operations[0], Operation::Replace { value, .. } if *value == expected_leaf);
            prop_assert!(is_replace);
            prop_assert_eq!(operations[0].path().to_string(), format!("/{}", key));
        }

        let config = Config::new().rules(IgnoreRules::new().ignore_values_for([format!("/{}", key)]).unwrap());
        prop_assert!(diff(&actual, &expected, &config).is_empty());
    }

    #[test]
    fn order_ignored_arrays_accept_any_permutation(
        (items, shuffled) in vec(arb_scalar(), 0..8).prop_flat_map(|items| {
            let shuffled = Just(items.clone()).prop_shuffle();
            (Just(items), shuffled)
        }),
    ) {
        let actual = serde_json::json!({ "items": shuffled });
        let expected = serde_json::json!({ "items": items });
        let config = Config::new().rules(IgnoreRules::new().ignore_order_for(["/items"]).unwrap());

        let operations = diff(&actual, &expected, &config);
        prop_assert!(operations.is_empty(), "unexpected patch {}", render(&operations));
    }

    #[test]
    fn patch_turns_actual_into_expected(actual in arb_json_value(), expected in arb_json_value()) {
        let operations = diff(&actual, &expected, &Config::new());
        let mut patched = actual.clone();

        prop_assert_eq!(apply(&mut patched, &operations), Ok(()), "patch {}", render(&operations));
        prop_assert_eq!(patched, expected, "patch {}", render(&operations));
    }

    #[test]
    fn patch_turns_actual_array_into_expected(
        actual in vec(arb_element(), 0..8),
        expected in vec(arb_element(), 0..8),
    ) {
        let (actual, expected) = (json!({ "array": actual }), json!({ "array": expected }));
        let operations = diff(&actual, &expected, &Config::new());
        let mut patched = actual.clone();

        prop_assert_eq!(apply(&mut patched, &operations), Ok(()), "patch {}", render(&operations));
        prop_assert_eq!(patched, expected, "patch {}", render(&operations));
    }
}
