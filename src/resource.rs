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

use std::fs;
use std::io;
use std::path::PathBuf;

use thiserror::Error;
use tracing::debug;

use crate::variables::{TemplateError, Variables};

const FILE_SCHEME: &str = "file:";

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("unable to read resource {reference:?}: {source}")]
    Unreadable {
        reference: String,
        #[source]
        source: io::Error,
    },
    #[error("resource {reference:?} cannot be rendered: {source}")]
    Template {
        reference: String,
        #[source]
        source: TemplateError,
    },
}

/// Resolves a resource reference into text.
///
/// A reference is a file path, optionally written with a `file:` prefix.
/// Relative paths resolve against the working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLoader {
    reference: String,
}

impl ResourceLoader {
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
        }
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    fn location(&self) -> PathBuf {
        PathBuf::from(
            self.reference
                .strip_prefix(FILE_SCHEME)
                .unwrap_or(&self.reference),
        )
    }

    pub fn load(&self) -> Result<String, ResourceError> {
        let location = self.location();
        debug!(resource = %location.display(), "loading resource");
        fs::read_to_string(&location).map_err(|source| ResourceError::Unreadable {
            reference: self.reference.clone(),
            source,
        })
    }

    /// Loads the resource and fills its `{{name}}` placeholders.
    pub fn load_template(&self, variables: &Variables) -> Result<String, ResourceError> {
        let template = self.load()?;
        variables
            .render(&template)
            .map_err(|source| ResourceError::Template {
                reference: self.reference.clone(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_with_and_without_scheme() {
        let plain = ResourceLoader::new("tests/data/test-body.json").load().unwrap();
        let prefixed = ResourceLoader::new("file:tests/data/test-body.json")
            .load()
            .unwrap();

        assert_eq!(plain, prefixed);
        assert!(plain.contains("\"timestamp\""));
    }

    #[test]
    fn test_missing_resource() {
        let err = ResourceLoader::new("file:tests/data/missing.json")
            .load()
            .unwrap_err();

        assert!(matches!(err, ResourceError::Unreadable { ref reference, .. } if reference == "file:tests/data/missing.json"));
    }

    #[test]
    fn test_load_template() {
        let mut variables = Variables::new();
        variables.insert_string("name".to_string(), "john".to_string());

        let loader = ResourceLoader::new("tests/data/test-template-body.json");
        let rendered = loader.load_template(&variables).unwrap();
        assert!(rendered.contains(r#""name": "john""#));

        let err = loader.load_template(&Variables::new()).unwrap_err();
        assert!(matches!(err, ResourceError::Template { .. }));
    }
}
