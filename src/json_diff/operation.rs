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

use super::path::Path;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// One edit needed to turn the actual document into the expected one.
///
/// Serializes to the RFC-6902 object shape, e.g.
/// `{"op":"move","from":"/array/0","path":"/array/2"}`. Unlike RFC-6902,
/// `remove` also carries the value being removed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Operation {
    Add { path: Path, value: Value },
    Remove { path: Path, value: Value },
    Replace { path: Path, value: Value },
    Move { from: Path, path: Path },
}

impl Operation {
    /// Target path of the operation.
    pub fn path(&self) -> &Path {
        match self {
            Operation::Add { path, .. }
            | Operation::Remove { path, .. }
            | Operation::Replace { path, .. }
            | Operation::Move { path, .. } => path,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Operation::Add { .. } => "add",
            Operation::Remove { .. } => "remove",
            Operation::Replace { .. } => "replace",
            Operation::Move { .. } => "move",
        }
    }

    /// Turns a remove/add pair carrying the same value into a move.
    pub(crate) fn paired_move(&self, other: &Operation) -> Option<Operation> {
        match (self, other) {
            (Operation::Remove { path: from, .. }, Operation::Add { path, .. })
            | (Operation::Add { path, .. }, Operation::Remove { path: from, .. }) => {
                Some(Operation::Move {
                    from: from.clone(),
                    path: path.clone(),
                })
            }
            _ => None,
        }
    }

    /// The operation with every path below `from` moved below `to`.
    pub(crate) fn rebased(self, from: &Path, to: &Path) -> Operation {
        match self {
            Operation::Add { path, value } => Operation::Add {
                path: path.rebase(from, to),
                value,
            },
            Operation::Remove { path, value } => Operation::Remove {
                path: path.rebase(from, to),
                value,
            },
            Operation::Replace { path, value } => Operation::Replace {
                path: path.rebase(from, to),
                value,
            },
            Operation::Move { from: source, path } => Operation::Move {
                from: source.rebase(from, to),
                path: path.rebase(from, to),
            },
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        write!(f, "{}", json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json_diff::path::JsonPointer;
    use serde_json::json;

    #[test]
    fn test_serialized_shape() {
        let replace = Operation::Replace {
            path: "/id".pointer().unwrap(),
            value: json!(999),
        };
        assert_eq!(replace.to_string(), r#"{"op":"replace","path":"/id","value":999}"#);

        let remove = Operation::Remove {
            path: "/array".pointer().unwrap(),
            value: json!([1, 2]),
        };
        assert_eq!(
            remove.to_string(),
            r#"{"op":"remove","path":"/array","value":[1,2]}"#
        );

        let moved = Operation::Move {
            from: "/array/0".pointer().unwrap(),
            path: "/array/2".pointer().unwrap(),
        };
        assert_eq!(
            moved.to_string(),
            r#"{"op":"move","from":"/array/0","path":"/array/2"}"#
        );
        assert_eq!(moved.kind(), "move");
        assert_eq!(moved.path().to_string(), "/array/2");
    }

    #[test]
    fn test_paired_move() {
        let remove = Operation::Remove {
            path: "/a/0".pointer().unwrap(),
            value: json!("x"),
        };
        let add = Operation::Add {
            path: "/a/3".pointer().unwrap(),
            value: json!("x"),
        };
        let expected = Operation::Move {
            from: "/a/0".pointer().unwrap(),
            path: "/a/3".pointer().unwrap(),
        };

        assert_eq!(remove.paired_move(&add), Some(expected.clone()));
        assert_eq!(add.paired_move(&remove), Some(expected));
        assert_eq!(add.paired_move(&add), None);
    }

    #[test]
    fn test_rebased() {
        let moved = Operation::Move {
            from: "/a/1/b/0".pointer().unwrap(),
            path: "/a/1/b/2".pointer().unwrap(),
        };
        let rebased = moved.rebased(&"/a/1".pointer().unwrap(), &"/a/3".pointer().unwrap());

        assert_eq!(
            rebased.to_string(),
            r#"{"op":"move","from":"/a/3/b/0","path":"/a/3/b/2"}"#
        );
    }
}
