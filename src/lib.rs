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

#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/README.md"))]

use thiserror::Error;
use tracing::debug;

use crate::assertions::{AssertionError, Assertions};
use crate::domain::{Request, Response};
use crate::executor::TransportError;

pub mod assertions;
pub mod domain;
pub mod executor;
pub mod json_diff;
pub mod resource;
pub mod variables;

pub use variables::Variables;

/// One request together with the assertions its response must pass.
///
/// # Examples
///
/// ```
/// # #![allow(unused_mut)]
/// use json_patch_assert::assertions::StatusCodeAssertions;
/// use json_patch_assert::domain::Request;
/// use json_patch_assert::ApiCall;
///
/// async fn test() {
///     let call = ApiCall::new(Request::get("http://localhost:8080/sushi"))
///         .named("List sushi")
///         .with_assertions(StatusCodeAssertions::expecting(&[200]));
///     match call.call().await {
///         Ok(response) => {
///             // inspect the response
///         }
///         Err(err) => {
///             // handle error
///         }
///     };
/// }
/// ```
pub struct ApiCall {
    name: String,
    request: Request,
    assertions: Vec<Box<dyn Assertions>>,
}

impl ApiCall {
    /// Constructs a call named after the request method and URL.
    pub fn new(request: Request) -> Self {
        Self {
            name: format!("{} {}", request.method, request.url),
            request,
            assertions: vec![],
        }
    }

    /// Name shown in errors.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Adds assertions. They run in the order they were added and the first
    /// failure stops the call.
    pub fn with_assertions<A: Assertions + 'static>(mut self, assertions: A) -> Self {
        self.assertions.push(Box::new(assertions));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sends the request and runs every assertion against the response.
    pub async fn call(&self) -> Result<Response, CallError> {
        debug!(name = %self.name, "calling");
        let response = executor::execute(&self.request)
            .await
            .map_err(|source| CallError::Transport {
                name: self.name.clone(),
                source,
            })?;

        for assertions in &self.assertions {
            assertions
                .execute(&response)
                .map_err(|source| CallError::Assertion {
                    name: self.name.clone(),
                    source,
                })?;
        }

        debug!(name = %self.name, status = response.status, "call passed");
        Ok(response)
    }
}

#[derive(Debug, Error)]
pub enum CallError {
    #[error("{name}: {source}")]
    Transport {
        name: String,
        #[source]
        source: TransportError,
    },
    #[error("{name}: {source}")]
    Assertion {
        name: String,
        #[source]
        source: AssertionError,
    },
}

impl CallError {
    pub fn assertion_error(&self) -> Option<&AssertionError> {
        match self {
            CallError::Assertion { source, .. } => Some(source),
            CallError::Transport { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assertions::{JsonResponseAssertions, StatusCodeAssertions};
    use crate::domain::APPLICATION_JSON;

    async fn sushi_server() -> mockito::ServerGuard {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/sushi/1")
            .with_status(200)
            .with_header("content-type", APPLICATION_JSON)
            .with_body(r#"{"id":1,"name":"Salmon Nigiri","type":"NIGIRI","price":50}"#)
            .create_async()
            .await;
        server
    }

    #[tokio::test]
    async fn test_call_passes() {
        let server = sushi_server().await;
        let assertions = JsonResponseAssertions::from_string(
            200,
            r#"{"id":7,"name":"Salmon Nigiri","type":"NIGIRI","price":50}"#,
        )
        .unwrap()
        .ignore_values_for_properties(["/id"])
        .unwrap();

        let response = ApiCall::new(Request::get(format!("{}/sushi/1", server.url())))
            .with_assertions(StatusCodeAssertions::expecting(&[200]))
            .with_assertions(assertions)
            .call()
            .await
            .unwrap();

        assert_eq!(response.status, 200);
    }

    #[tokio::test]
    async fn test_call_fails_with_patch() {
        let server = sushi_server().await;
        let assertions = JsonResponseAssertions::from_string(
            200,
            r#"{"id":1,"name":"Tuna Nigiri","type":"NIGIRI","price":50}"#,
        )
        .unwrap();

        let err = ApiCall::new(Request::get(format!("{}/sushi/1", server.url())))
            .named("Get Sushi")
            .with_assertions(assertions)
            .call()
            .await
            .unwrap_err();

        match err.assertion_error() {
            Some(AssertionError::Mismatch(mismatch)) => assert_eq!(
                mismatch.patch(),
                r#"[{"op":"replace","path":"/name","value":"Tuna Nigiri"}]"#
            ),
            other => panic!("expected a patch mismatch, got {:?}", other),
        }
        assert!(err.to_string().starts_with("Get Sushi: Actual response body"));
    }

    #[tokio::test]
    async fn test_first_failing_assertion_stops_the_call() {
        let server = sushi_server().await;

        let err = ApiCall::new(Request::get(format!("{}/sushi/1", server.url())))
            .with_assertions(StatusCodeAssertions::expecting(&[404]))
            .with_assertions(JsonResponseAssertions::from_string(200, "[]").unwrap())
            .call()
            .await
            .unwrap_err();

        assert!(matches!(
            err.assertion_error(),
            Some(AssertionError::Failed(_))
        ));
    }

    #[tokio::test]
    async fn test_transport_error() {
        let err = ApiCall::new(Request::get("http://127.0.0.1:1/unreachable"))
            .call()
            .await
            .unwrap_err();

        assert!(matches!(err, CallError::Transport { .. }));
        assert!(err.assertion_error().is_none());
    }
}
