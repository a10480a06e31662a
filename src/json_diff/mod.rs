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

//! Structural comparison of two JSON documents.
//!
//! [`diff`] walks both documents in lock-step and returns the
//! [`Operation`]s that turn the actual document into the expected one.
//! [`IgnoreRules`] mask the values of given paths or the ordering of given
//! arrays, and [`report`] turns the result into a pass or a
//! [`PatchMismatch`].

mod numeric;
mod operation;
pub mod path;
mod report;
mod rules;
mod sequence;

pub use numeric::NumericMode;
pub use operation::Operation;
pub use path::{JsonPointer, Key, Path, PathError};
pub use report::{render, report, PatchMismatch, MISMATCH_PREAMBLE};
pub use rules::IgnoreRules;

use serde_json::{Map, Value};
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::debug;

/// Configuration for how JSON values should be compared.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    rules: IgnoreRules,
    numeric_mode: NumericMode,
    member_moves: bool,
}

impl Config {
    /// Create a new [`Config`] with no ignore rules.
    ///
    /// The default `numeric_mode` is [`NumericMode::Exact`] and member moves
    /// are off.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the ignore rules.
    pub fn rules(mut self, rules: IgnoreRules) -> Self {
        self.rules = rules;
        self
    }

    /// Change the config's numeric mode.
    pub fn numeric_mode(mut self, numeric_mode: NumericMode) -> Self {
        self.numeric_mode = numeric_mode;
        self
    }

    /// Report an object member that disappeared from one place and shows up
    /// with the same value at another as a single `move`.
    pub fn member_moves(mut self, enabled: bool) -> Self {
        self.member_moves = enabled;
        self
    }

    /// Add a value-ignored path to the rules.
    pub fn ignore_value(mut self, path: Path) -> Self {
        self.rules = self.rules.ignore_value(path);
        self
    }

    /// Add an order-ignored array path to the rules.
    pub fn ignore_order(mut self, path: Path) -> Self {
        self.rules = self.rules.ignore_order(path);
        self
    }

    /// The ignore rules in effect.
    pub fn ignore_rules(&self) -> &IgnoreRules {
        &self.rules
    }
}

/// The text handed over as a JSON document is not valid JSON.
#[derive(Debug, Error)]
#[error("malformed JSON document: {0}")]
pub struct MalformedJsonError(#[from] serde_json::Error);

pub fn parse(text: &str) -> Result<Value, MalformedJsonError> {
    Ok(serde_json::from_str(text)?)
}

/// Computes the operations that transform `actual` into `expected`.
///
/// The result is empty when the documents are equivalent under `config`.
/// Operations are ordered by a pre-order walk of the documents, object
/// members in ascending key order.
///
/// # Examples
///
/// ```
/// use json_patch_assert::json_diff::{diff, render, Config, JsonPointer};
/// use serde_json::json;
///
/// let actual = json!({ "key": "kyle1", "surname": "pullicino" });
/// let expected = json!({ "key": "kyle", "surname": "pullicino" });
///
/// let operations = diff(&actual, &expected, &Config::new());
/// assert_eq!(
///     render(&operations),
///     r#"[{"op":"replace","path":"/key","value":"kyle"}]"#
/// );
///
/// let config = Config::new().ignore_value("/key".pointer().unwrap());
/// assert!(diff(&actual, &expected, &config).is_empty());
/// ```
pub fn diff(actual: &Value, expected: &Value, config: &Config) -> Vec<Operation> {
    let differ = Differ::new(config);
    let mut operations = differ.diff_at(&Path::root(), actual, expected);

    if config.member_moves {
        collapse_member_moves(&differ, &mut operations);
    }

    debug!(
        operations = operations.len(),
        ignore_rules = !config.rules.is_empty(),
        "compared JSON documents"
    );
    operations
}

/// Collapses a removed and an added object member carrying equivalent values
/// into a move, placed where the earlier of the two was. Members below an
/// array are left alone.
fn collapse_member_moves(differ: &Differ<'_>, operations: &mut Vec<Operation>) {
    let mut i = 0;
    while i < operations.len() {
        if let Some(j) = member_move_partner(differ, operations, i) {
            let partner = operations.remove(j);
            if let Some(moved) = operations[i].paired_move(&partner) {
                operations[i] = moved;
            }
        }
        i += 1;
    }
}

fn member_move_partner(differ: &Differ<'_>, operations: &[Operation], i: usize) -> Option<usize> {
    let candidate = &operations[i];
    if !candidate.path().is_member_path() {
        return None;
    }

    operations
        .iter()
        .enumerate()
        .skip(i + 1)
        .find(|&(_, other)| {
            other.path().is_member_path()
                && match (candidate, other) {
                    (Operation::Remove { value: removed, .. }, Operation::Add { path, value })
                    | (Operation::Add { path, value }, Operation::Remove { value: removed, .. }) => {
                        differ.equivalent(path, removed, value)
                    }
                    _ => false,
                }
        })
        .map(|(j, _)| j)
}

/// Recursive walk over both documents for one comparison.
pub(crate) struct Differ<'c> {
    config: &'c Config,
}

impl<'c> Differ<'c> {
    pub(crate) fn new(config: &'c Config) -> Self {
        Self { config }
    }

    pub(crate) fn rules(&self) -> &IgnoreRules {
        &self.config.rules
    }

    pub(crate) fn diff_at(&self, path: &Path, actual: &Value, expected: &Value) -> Vec<Operation> {
        if self.rules().is_value_ignored(path) {
            return vec![];
        }

        match (actual, expected) {
            (Value::Object(actual), Value::Object(expected)) => {
                self.diff_objects(path, actual, expected)
            }
            (Value::Array(actual), Value::Array(expected)) => {
                sequence::align(self, path, actual, expected)
            }
            (Value::Number(a), Value::Number(e)) if self.config.numeric_mode.equal(a, e) => vec![],
            (Value::String(a), Value::String(e)) if a == e => vec![],
            (Value::Bool(a), Value::Bool(e)) if a == e => vec![],
            (Value::Null, Value::Null) => vec![],
            _ => vec![Operation::Replace {
                path: path.clone(),
                value: expected.clone(),
            }],
        }
    }

    fn diff_objects(
        &self,
        path: &Path,
        actual: &Map<String, Value>,
        expected: &Map<String, Value>,
    ) -> Vec<Operation> {
        union_keys(actual, expected)
            .into_iter()
            .flat_map(|key| {
                let child = path.append(Key::Field(key.clone()));
                match (actual.get(key), expected.get(key)) {
                    // an ignored member may also be missing on either side
                    _ if self.rules().is_value_ignored(&child) => vec![],
                    (Some(a), Some(e)) => self.diff_at(&child, a, e),
                    (Some(a), None) => vec![Operation::Remove {
                        path: child,
                        value: a.clone(),
                    }],
                    (None, Some(e)) => vec![Operation::Add {
                        path: child,
                        value: e.clone(),
                    }],
                    (None, None) => vec![],
                }
            })
            .collect()
    }

    /// Deep equality with value-ignored paths masked out and order-ignored
    /// arrays compared as multisets.
    pub(crate) fn equivalent(&self, path: &Path, actual: &Value, expected: &Value) -> bool {
        if self.rules().is_empty() && self.config.numeric_mode == NumericMode::Exact {
            return actual == expected;
        }
        if self.rules().is_value_ignored(path) {
            return true;
        }

        match (actual, expected) {
            (Value::Object(a), Value::Object(e)) => union_keys(a, e).into_iter().all(|key| {
                let child = path.append(Key::Field(key.clone()));
                if self.rules().is_value_ignored(&child) {
                    return true;
                }
                match (a.get(key), e.get(key)) {
                    (Some(a), Some(e)) => self.equivalent(&child, a, e),
                    _ => false,
                }
            }),
            (Value::Array(a), Value::Array(e)) if self.rules().is_order_ignored(path) => {
                sequence::is_permutation(self, path, a, e)
            }
            (Value::Array(a), Value::Array(e)) => {
                a.len() == e.len()
                    && a.iter()
                        .zip(e)
                        .enumerate()
                        .all(|(j, (a, e))| self.equivalent(&path.append(Key::Idx(j)), a, e))
            }
            (Value::Number(a), Value::Number(e)) => self.config.numeric_mode.equal(a, e),
            _ => actual == expected,
        }
    }
}

fn union_keys<'v>(a: &'v Map<String, Value>, e: &'v Map<String, Value>) -> BTreeSet<&'v String> {
    a.keys().chain(e.keys()).collect()
}
