// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Shared helpers for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use std::sync::{Arc, Mutex};
use strava_oauth::config::Credentials;
use strava_oauth::models::{AthleteSummary, AuthorizationResponse};
use strava_oauth::oauth::OAuthAuthenticator;
use strava_oauth::transport::{HttpRequest, HttpResponse, HttpTransport, TransportError};

pub const CLIENT_ID: i64 = 1234;
pub const CLIENT_SECRET: &str = "test-client-secret";
pub const CALLBACK_URL: &str = "http://localhost:8089/strava/callback";

pub fn authenticator() -> OAuthAuthenticator {
    OAuthAuthenticator::new(Credentials::new(CLIENT_ID, CLIENT_SECRET), CALLBACK_URL)
}

/// Token response as documented by Strava
pub fn token_body() -> serde_json::Value {
    json!({
        "token_type": "Bearer",
        "expires_at": 1_568_775_134,
        "expires_in": 21600,
        "refresh_token": "e5n567567",
        "access_token": "a4b945687g",
        "athlete": {
            "id": 227_615,
            "username": "marianne_t",
            "firstname": "Marianne",
            "lastname": "Teutenberg",
            "city": "San Francisco",
            "state": "CA",
            "country": "US",
            "sex": "F",
            "premium": true,
            "summit": true,
            "friend": null,
            "follower": null,
            "created_at": "2017-11-14T02:30:05Z",
            "updated_at": "2018-02-06T19:32:20Z",
            "profile_medium": "https://example.cloudfront.net/pictures/athletes/227615/medium.jpg",
            "profile": "https://example.cloudfront.net/pictures/athletes/227615/large.jpg"
        }
    })
}

/// What [`token_body`] must decode to
pub fn expected_tokens() -> AuthorizationResponse {
    let timestamp = |s: &str| s.parse::<DateTime<Utc>>().unwrap();

    AuthorizationResponse {
        access_token: "a4b945687g".to_string(),
        refresh_token: "e5n567567".to_string(),
        expires_at: 1_568_775_134,
        expires_in: 21600,
        athlete: AthleteSummary {
            id: 227_615,
            username: Some("marianne_t".to_string()),
            firstname: Some("Marianne".to_string()),
            lastname: Some("Teutenberg".to_string()),
            profile_medium: Some(
                "https://example.cloudfront.net/pictures/athletes/227615/medium.jpg".to_string(),
            ),
            profile: Some(
                "https://example.cloudfront.net/pictures/athletes/227615/large.jpg".to_string(),
            ),
            city: Some("San Francisco".to_string()),
            state: Some("CA".to_string()),
            country: Some("US".to_string()),
            sex: Some("F".to_string()),
            friend: None,
            follower: None,
            premium: Some(true),
            summit: Some(true),
            created_at: Some(timestamp("2017-11-14T02:30:05Z")),
            updated_at: Some(timestamp("2018-02-06T19:32:20Z")),
        },
        state: String::new(),
    }
}

pub fn error_body(resource: &str) -> String {
    json!({
        "message": "Bad Request",
        "errors": [{ "resource": resource, "field": "code", "code": "invalid" }]
    })
    .to_string()
}

/// Returns a canned response and records every request it receives
pub struct StubTransport {
    status: u16,
    body: String,
    requests: Mutex<Vec<HttpRequest>>,
}

impl StubTransport {
    pub fn new(status: u16, body: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            status,
            body: body.into(),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn success() -> Arc<Self> {
        Self::new(200, token_body().to_string())
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl HttpTransport for StubTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(request);
        Ok(HttpResponse::new(self.status, self.body.clone()))
    }
}

/// Fails the test if any request reaches it
pub struct PanickingTransport;

#[async_trait]
impl HttpTransport for PanickingTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        panic!("no network call expected, got request to {}", request.url);
    }
}

/// Simulates a connection that never produces a response
pub struct FailingTransport;

#[async_trait]
impl HttpTransport for FailingTransport {
    async fn execute(&self, _request: HttpRequest) -> Result<HttpResponse, TransportError> {
        Err(TransportError::network(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "connection refused",
        )))
    }
}
