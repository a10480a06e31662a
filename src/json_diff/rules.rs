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

use super::path::{Path, PathError};
use std::collections::HashSet;

/// Paths whose values, or whose array ordering, take no part in a comparison.
///
/// Matching is exact: ignoring `/user` does not ignore `/user/name`, the
/// differ simply never descends below an ignored node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreRules {
    value_ignored: HashSet<Path>,
    order_ignored: HashSet<Path>,
}

impl IgnoreRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare the node at `path` as equal whatever its content, including
    /// when it exists on one side only.
    pub fn ignore_value(mut self, path: Path) -> Self {
        self.value_ignored.insert(path);
        self
    }

    /// Compare the array at `path` as a multiset.
    pub fn ignore_order(mut self, path: Path) -> Self {
        self.order_ignored.insert(path);
        self
    }

    /// Parses each pointer and adds it with [`IgnoreRules::ignore_value`].
    pub fn ignore_values_for<I, S>(self, pointers: I) -> Result<Self, PathError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        pointers.into_iter().try_fold(self, |rules, pointer| {
            Ok(rules.ignore_value(Path::from_pointer(pointer.as_ref())?))
        })
    }

    /// Parses each pointer and adds it with [`IgnoreRules::ignore_order`].
    pub fn ignore_order_for<I, S>(self, pointers: I) -> Result<Self, PathError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        pointers.into_iter().try_fold(self, |rules, pointer| {
            Ok(rules.ignore_order(Path::from_pointer(pointer.as_ref())?))
        })
    }

    pub fn is_value_ignored(&self, path: &Path) -> bool {
        !self.value_ignored.is_empty() && self.value_ignored.contains(path)
    }

    pub fn is_order_ignored(&self, path: &Path) -> bool {
        !self.order_ignored.is_empty() && self.order_ignored.contains(path)
    }

    pub fn is_empty(&self) -> bool {
        self.value_ignored.is_empty() && self.order_ignored.is_empty()
    }
}
