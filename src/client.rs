// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Bearer-authenticated calls against the Strava API

use crate::constants::api::{DEAUTHORIZE_PATH, STRAVA_API_BASE};
use crate::errors::{Error, Result};
use crate::logging::AppLogger;
use crate::models::ErrorResponse;
use crate::transport::{default_transport, HttpRequest, HttpTransport};
use reqwest::Method;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// API client carrying an access token obtained from the OAuth exchange
#[derive(Clone)]
pub struct Client {
    access_token: String,
    base_path: String,
    transport: Arc<dyn HttpTransport>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_path", &self.base_path)
            .finish_non_exhaustive()
    }
}

impl Client {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            base_path: STRAVA_API_BASE.to_string(),
            transport: default_transport(),
        }
    }

    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }

    pub fn with_transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = transport;
        self
    }

    /// Issue an authenticated request and return the raw body on success.
    ///
    /// 5xx maps to [`Error::Server`]; every other failure status to
    /// [`Error::Api`] carrying whatever error body could be parsed.
    pub async fn run(
        &self,
        method: Method,
        path: &str,
        params: Vec<(String, String)>,
    ) -> Result<Vec<u8>> {
        let url = format!("{}{}", self.base_path.trim_end_matches('/'), path);
        let request = HttpRequest {
            method: method.clone(),
            url,
            bearer_token: Some(self.access_token.clone()),
            form: params,
        };

        let started = Instant::now();
        let response = self.transport.execute(request).await?;
        AppLogger::log_api_request(
            method.as_str(),
            path,
            response.status,
            u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        );

        if response.is_success() {
            return Ok(response.body);
        }
        if response.is_server_error() {
            return Err(Error::Server {
                status: response.status,
            });
        }
        Err(Error::Api {
            status: response.status,
            response: ErrorResponse::from_body_lenient(&response.body),
        })
    }
}

/// OAuth endpoints that require an existing access token
#[derive(Debug)]
pub struct OAuthService<'a> {
    client: &'a Client,
}

impl<'a> OAuthService<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Revoke the client's access token
    pub fn deauthorize(&self) -> DeauthorizeCall<'a> {
        DeauthorizeCall {
            client: self.client,
        }
    }
}

#[derive(Debug)]
pub struct DeauthorizeCall<'a> {
    client: &'a Client,
}

impl DeauthorizeCall<'_> {
    pub async fn send(self) -> Result<()> {
        self.client
            .run(Method::POST, DEAUTHORIZE_PATH, Vec::new())
            .await
            .map(|_| ())
    }
}
