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

use super::operation::Operation;
use thiserror::Error;

pub const MISMATCH_PREAMBLE: &str = "Actual response body is not as expected. The following JSON Patch (as per RFC-6902) tells you what operations you need to perform to transform the actual response body into the expected response body:";

/// The actual document differs from the expected one.
///
/// The message is the preamble followed by the rendered patch on its own
/// line, which is what test reports show verbatim.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{preamble}\n {patch}", preamble = MISMATCH_PREAMBLE)]
pub struct PatchMismatch {
    operations: Vec<Operation>,
    patch: String,
}

impl PatchMismatch {
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Rendered patch without the preamble.
    pub fn patch(&self) -> &str {
        &self.patch
    }
}

/// Renders operations as a compact JSON array, keeping their order.
pub fn render(operations: &[Operation]) -> String {
    let rendered = operations
        .iter()
        .map(|op| op.to_string())
        .collect::<Vec<String>>()
        .join(",");
    format!("[{}]", rendered)
}

/// Passes on an empty patch, fails with the rendered patch otherwise.
pub fn report(operations: Vec<Operation>) -> Result<(), PatchMismatch> {
    if operations.is_empty() {
        return Ok(());
    }

    let patch = render(&operations);
    Err(PatchMismatch { operations, patch })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json_diff::path::JsonPointer;
    use serde_json::json;

    #[test]
    fn test_empty_patch_passes() {
        assert!(report(vec![]).is_ok());
        assert_eq!(render(&[]), "[]");
    }

    #[test]
    fn test_failure_message() {
        let operations = vec![
            Operation::Remove {
                path: "/array/0".pointer().unwrap(),
                value: json!("third"),
            },
            Operation::Replace {
                path: "/array/2".pointer().unwrap(),
                value: json!("third"),
            },
        ];

        let mismatch = report(operations.clone()).unwrap_err();

        assert_eq!(mismatch.operations(), operations.as_slice());
        assert_eq!(
            mismatch.patch(),
            r#"[{"op":"remove","path":"/array/0","value":"third"},{"op":"replace","path":"/array/2","value":"third"}]"#
        );
        assert_eq!(
            mismatch.to_string(),
            format!(
                "{}\n {}",
                MISMATCH_PREAMBLE,
                r#"[{"op":"remove","path":"/array/0","value":"third"},{"op":"replace","path":"/array/2","value":"third"}]"#
            )
        );
    }
}
