// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # HTTP Transport
//!
//! The only seam through which the library talks to the network. Callers can
//! swap in their own [`HttpTransport`], which is how tests stub the service and
//! how hosts without a global HTTP client supply a per-request one.

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Client, Method};
use std::sync::{Arc, OnceLock};
use thiserror::Error;
use tracing::debug;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A request with an optional bearer token and URL-encoded form body
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub bearer_token: Option<String>,
    pub form: Vec<(String, String)>,
}

impl HttpRequest {
    /// Form-encoded POST without authentication
    pub fn post_form(url: impl Into<String>, form: Vec<(String, String)>) -> Self {
        Self {
            method: Method::POST,
            url: url.into(),
            bearer_token: None,
            form,
        }
    }

    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Value of a form field, if present
    pub fn form_value(&self, name: &str) -> Option<&str> {
        self.form
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Fully buffered response
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status / 100 == 2
    }

    pub fn is_server_error(&self) -> bool {
        self.status / 100 == 5
    }
}

/// Network-level failure: no response was received
#[derive(Debug, Error)]
#[error("HTTP transport failure: {source}")]
pub struct TransportError {
    #[source]
    source: BoxError,
}

impl TransportError {
    /// Wraps any transport-specific error
    pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
        Self {
            source: Box::new(src),
        }
    }

    /// Transport failure described only by a message
    pub fn new(message: impl Into<String>) -> Self {
        let message: String = message.into();
        Self {
            source: message.into(),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        Self::network(e)
    }
}

#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Default transport backed by `reqwest`
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an already configured client (timeouts, proxies, TLS)
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        debug!(method = %request.method, url = %request.url, "sending request");

        let mut builder = self.client.request(request.method, &request.url);
        if let Some(token) = &request.bearer_token {
            builder = builder.bearer_auth(token);
        }
        if !request.form.is_empty() {
            builder = builder.form(&request.form);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

static SHARED_TRANSPORT: OnceLock<Arc<ReqwestTransport>> = OnceLock::new();

/// Process-wide transport used when the caller does not supply one
pub fn default_transport() -> Arc<dyn HttpTransport> {
    SHARED_TRANSPORT
        .get_or_init(|| Arc::new(ReqwestTransport::new()))
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classes() {
        assert!(HttpResponse::new(200, "").is_success());
        assert!(HttpResponse::new(204, "").is_success());
        assert!(!HttpResponse::new(302, "").is_success());
        assert!(HttpResponse::new(502, "").is_server_error());
        assert!(!HttpResponse::new(401, "").is_server_error());
    }

    #[test]
    fn test_form_value_lookup() {
        let request = HttpRequest::post_form(
            "https://example.com/oauth/token",
            vec![("code".to_string(), "abc".to_string())],
        )
        .with_bearer_token("token");

        assert_eq!(request.form_value("code"), Some("abc"));
        assert_eq!(request.form_value("client_id"), None);
        assert_eq!(request.bearer_token.as_deref(), Some("token"));
    }

    #[test]
    fn test_default_transport_is_shared() {
        let first = default_transport();
        let second = default_transport();
        assert!(Arc::ptr_eq(&first, &second));
    }
}
