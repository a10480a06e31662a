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

use std::collections::HashMap;

use regex::{Captures, Regex};
use serde_json::Value;
use thiserror::Error;

const PLACEHOLDER_PATTERN: &str = r"\{\{\s*([A-Za-z0-9_.\-]+)\s*\}\}";

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("variables must be a JSON object")]
    NotAnObject,
    #[error("unresolved template placeholders: {}", names.join(", "))]
    Unresolved { names: Vec<String> },
    #[error(transparent)]
    Pattern(#[from] regex::Error),
}

/// Values substituted into `{{name}}` placeholders of templated resources.
///
/// Strings are inserted as they are, so a template decides itself whether
/// a string lands inside quotes. Any other value is inserted as JSON text.
///
/// # Examples
///
/// ```
/// use json_patch_assert::variables::Variables;
///
/// let mut variables = Variables::new();
/// variables.insert_string("name".to_string(), "john".to_string());
/// variables.insert_int("age".to_string(), 30);
///
/// let rendered = variables
///     .render(r#"{"name": "{{name}}", "age": {{ age }}}"#)
///     .unwrap();
/// assert_eq!(rendered, r#"{"name": "john", "age": 30}"#);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Variables {
    map: HashMap<String, Value>,
}

impl Variables {
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    /// Constructs `Variables` from the members of a JSON object.
    pub fn from_json(json: &Value) -> Result<Self, TemplateError> {
        match json {
            Value::Object(obj) => Ok(Self {
                map: obj
                    .iter()
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect(),
            }),
            _ => Err(TemplateError::NotAnObject),
        }
    }

    /// Inserts a `Value`, overwriting any previous value of that name.
    pub fn insert_value(&mut self, name: String, value: Value) {
        self.map.insert(name, value);
    }

    pub fn insert_string(&mut self, name: String, value: String) {
        self.map.insert(name, Value::String(value));
    }

    pub fn insert_int(&mut self, name: String, value: i64) {
        self.map
            .insert(name, Value::Number(serde_json::Number::from(value)));
    }

    /// Inserts an `f64`. Values JSON cannot represent become `null`.
    pub fn insert_float(&mut self, name: String, value: f64) {
        let value = serde_json::Number::from_f64(value).map_or(Value::Null, Value::Number);
        self.map.insert(name, value);
    }

    pub fn insert_bool(&mut self, name: String, value: bool) {
        self.map.insert(name, Value::Bool(value));
    }

    pub fn insert_null(&mut self, name: String) {
        self.map.insert(name, Value::Null);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.map.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Replaces every placeholder of `template`. Fails naming each
    /// placeholder that has no variable.
    pub fn render(&self, template: &str) -> Result<String, TemplateError> {
        let placeholder = Regex::new(PLACEHOLDER_PATTERN)?;
        let mut unresolved = vec![];

        let rendered = placeholder.replace_all(template, |caps: &Captures| match self.map.get(&caps[1]) {
            Some(Value::String(value)) => value.clone(),
            Some(value) => value.to_string(),
            None => {
                unresolved.push(caps[1].to_string());
                caps[0].to_string()
            }
        });

        if !unresolved.is_empty() {
            return Err(TemplateError::Unresolved { names: unresolved });
        }

        Ok(rendered.into_owned())
    }
}
