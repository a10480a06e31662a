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

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::domain::{Response, APPLICATION_JSON};
use crate::json_diff::{
    self, Config, IgnoreRules, MalformedJsonError, NumericMode, PatchMismatch, PathError,
};
use crate::resource::{ResourceError, ResourceLoader};
use crate::variables::Variables;

/// The expected document or the response could not be turned into JSON.
///
/// This is a broken fixture or a broken response, never a difference
/// between two valid documents.
#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("expected JSON is not valid: {0}")]
    ExpectedJson(#[source] MalformedJsonError),
    #[error("response body is not valid JSON: {0}")]
    ResponseJson(#[source] MalformedJsonError),
    #[error(transparent)]
    Resource(#[from] ResourceError),
    #[error("invalid property path: {0}")]
    Path(#[from] PathError),
    #[error("expected model cannot be serialized: {0}")]
    Model(#[source] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum AssertionError {
    #[error(transparent)]
    Fixture(#[from] FixtureError),
    #[error(transparent)]
    Mismatch(#[from] PatchMismatch),
    #[error("{0}")]
    Failed(String),
}

/// Checks run against a received [`Response`].
pub trait Assertions: Send + Sync {
    fn execute(&self, response: &Response) -> Result<(), AssertionError>;
}

/// Passes when the response status is one of the given codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusCodeAssertions {
    expected: Vec<u16>,
}

impl StatusCodeAssertions {
    pub fn expecting(codes: &[u16]) -> Self {
        Self {
            expected: codes.to_vec(),
        }
    }
}

impl Assertions for StatusCodeAssertions {
    fn execute(&self, response: &Response) -> Result<(), AssertionError> {
        if self.expected.contains(&response.status) {
            return Ok(());
        }
        Err(AssertionError::Failed(format!(
            "Actual response status code is {} but one of {:?} was expected",
            response.status, self.expected
        )))
    }
}

/// Asserts that a response carries the expected status, a JSON content
/// type and a body equivalent to the expected document.
///
/// On a body mismatch the error is an [`AssertionError::Mismatch`] whose
/// message holds the JSON Patch that turns the actual body into the
/// expected one.
///
/// # Examples
///
/// ```
/// use json_patch_assert::assertions::{AssertionError, JsonResponseAssertions};
///
/// let assertions = JsonResponseAssertions::from_string(200, r#"{"key": "kyle", "surname": "pullicino"}"#)
///     .unwrap()
///     .ignore_values_for_properties(["/key"])
///     .unwrap();
///
/// assert!(assertions.compare(r#"{"key": "kyle1", "surname": "pullicino"}"#).is_ok());
///
/// let err = assertions.compare(r#"{"key": "kyle", "surname": "smith"}"#).unwrap_err();
/// assert!(matches!(err, AssertionError::Mismatch(_)));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct JsonResponseAssertions {
    status: u16,
    expected: Value,
    config: Config,
    content_type: String,
}

impl JsonResponseAssertions {
    fn new(status: u16, expected: Value) -> Self {
        Self {
            status,
            expected,
            config: Config::new(),
            content_type: APPLICATION_JSON.to_string(),
        }
    }

    pub fn from_string(status: u16, expected_json: &str) -> Result<Self, FixtureError> {
        let expected = json_diff::parse(expected_json).map_err(FixtureError::ExpectedJson)?;
        Ok(Self::new(status, expected))
    }

    pub fn from_resource(status: u16, reference: &str) -> Result<Self, FixtureError> {
        let text = ResourceLoader::new(reference).load()?;
        Self::from_string(status, &text)
    }

    /// Like [`JsonResponseAssertions::from_resource`], filling the
    /// resource's `{{name}}` placeholders first.
    pub fn from_template(
        status: u16,
        reference: &str,
        variables: &Variables,
    ) -> Result<Self, FixtureError> {
        let text = ResourceLoader::new(reference).load_template(variables)?;
        Self::from_string(status, &text)
    }

    /// Expects the JSON serialization of `model`.
    pub fn from_model<T: Serialize>(status: u16, model: &T) -> Result<Self, FixtureError> {
        let expected = serde_json::to_value(model).map_err(FixtureError::Model)?;
        Ok(Self::new(status, expected))
    }

    pub fn ignore_values_for_properties<I, S>(mut self, pointers: I) -> Result<Self, FixtureError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rules = self.config.ignore_rules().clone().ignore_values_for(pointers)?;
        self.config = self.config.rules(rules);
        Ok(self)
    }

    pub fn ignore_order_for_array_properties<I, S>(
        mut self,
        pointers: I,
    ) -> Result<Self, FixtureError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rules = self.config.ignore_rules().clone().ignore_order_for(pointers)?;
        self.config = self.config.rules(rules);
        Ok(self)
    }

    pub fn ignore_rules(mut self, rules: IgnoreRules) -> Self {
        self.config = self.config.rules(rules);
        self
    }

    pub fn numeric_mode(mut self, numeric_mode: NumericMode) -> Self {
        self.config = self.config.numeric_mode(numeric_mode);
        self
    }

    pub fn detect_member_moves(mut self, enabled: bool) -> Self {
        self.config = self.config.member_moves(enabled);
        self
    }

    /// Expect another content type than `application/json`. The body is
    /// still read as JSON.
    pub fn override_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    pub fn expected(&self) -> &Value {
        &self.expected
    }

    /// Compares a response body with the expected document.
    pub fn compare(&self, body: &str) -> Result<(), AssertionError> {
        let actual = json_diff::parse(body).map_err(FixtureError::ResponseJson)?;
        let operations = json_diff::diff(&actual, &self.expected, &self.config);
        debug!(operations = operations.len(), "compared response body");
        json_diff::report(operations)?;
        Ok(())
    }

    fn assert_status(&self, response: &Response) -> Result<(), AssertionError> {
        if response.status == self.status {
            return Ok(());
        }
        Err(AssertionError::Failed(format!(
            "Actual response status code is {} but {} was expected",
            response.status, self.status
        )))
    }

    fn assert_content_type(&self, response: &Response) -> Result<(), AssertionError> {
        match response.content_type() {
            None => Err(AssertionError::Failed(
                "Response content-type should not be missing.".to_string(),
            )),
            Some(actual) if !actual.eq_ignore_ascii_case(&self.content_type) => {
                Err(AssertionError::Failed(format!(
                    "Response content-type should be \"{}\" but got \"{}\" instead",
                    self.content_type, actual
                )))
            }
            Some(_) => Ok(()),
        }
    }
}

impl Assertions for JsonResponseAssertions {
    fn execute(&self, response: &Response) -> Result<(), AssertionError> {
        self.assert_status(response)?;
        self.assert_content_type(response)?;
        self.compare(&response.body)
    }
}
