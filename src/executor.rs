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

use std::str::FromStr;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Body, Client, Method};
use thiserror::Error;
use tracing::debug;

use crate::domain::{HttpMethod, Request, Response};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid header {name:?}: {reason}")]
    InvalidHeader { name: String, reason: String },
    #[error("error executing request: {0}")]
    Http(#[from] reqwest::Error),
}

/// Sends `request` once and reads the whole response body.
pub async fn execute(request: &Request) -> Result<Response, TransportError> {
    let url = request.resolved_url();
    let mut request_builder = Client::new()
        .request(map_method(&request.method), url.as_str())
        .headers(map_headers(request)?);

    if !request.query_params.is_empty() {
        request_builder = request_builder.query(&request.query_params);
    }
    if let Some(timeout) = request.timeout {
        request_builder = request_builder.timeout(timeout);
    }
    if let Some(body) = &request.body {
        request_builder = request_builder.body(Body::from(body.clone()));
    }

    debug!(method = %request.method, url = %url, "sending request");
    let response = request_builder.send().await?;

    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect();
    let body = response.text().await?;

    debug!(status, bytes = body.len(), "received response");
    Ok(Response {
        status,
        headers,
        body,
    })
}

fn map_headers(request: &Request) -> Result<HeaderMap, TransportError> {
    let mut header_map = HeaderMap::new();
    for (key, value) in &request.headers {
        let invalid = |reason: String| TransportError::InvalidHeader {
            name: key.clone(),
            reason,
        };
        let header_name = HeaderName::from_str(key).map_err(|e| invalid(e.to_string()))?;
        let header_value = HeaderValue::from_str(value).map_err(|e| invalid(e.to_string()))?;
        header_map.append(header_name, header_value);
    }

    if let Some(content_type) = &request.content_type {
        if !request.has_header(CONTENT_TYPE.as_str()) {
            let header_value =
                HeaderValue::from_str(content_type).map_err(|e| TransportError::InvalidHeader {
                    name: CONTENT_TYPE.to_string(),
                    reason: e.to_string(),
                })?;
            header_map.insert(CONTENT_TYPE, header_value);
        }
    }

    Ok(header_map)
}

fn map_method(http_method: &HttpMethod) -> Method {
    match http_method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
        HttpMethod::Options => Method::OPTIONS,
        HttpMethod::Head => Method::HEAD,
    }
}
