// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Constants Module
//!
//! Endpoint paths, wire parameter names and environment keys used by the
//! OAuth flow. Environment lookups live in [`env_config`].

/// Strava API endpoints
pub mod api {
    /// Default API base path. OAuth endpoints hang off this path too.
    pub const STRAVA_API_BASE: &str = "https://www.strava.com/api/v3";

    /// Browser-facing consent page
    pub const AUTHORIZE_PATH: &str = "/oauth/authorize";

    /// Server-to-server token exchange
    pub const TOKEN_PATH: &str = "/oauth/token";

    /// Token revocation
    pub const DEAUTHORIZE_PATH: &str = "/oauth/deauthorize";
}

/// OAuth wire parameters and well-known values
pub mod oauth {
    pub const CLIENT_ID: &str = "client_id";
    pub const CLIENT_SECRET: &str = "client_secret";
    pub const RESPONSE_TYPE: &str = "response_type";
    pub const REDIRECT_URI: &str = "redirect_uri";
    pub const SCOPE: &str = "scope";
    pub const STATE: &str = "state";
    pub const APPROVAL_PROMPT: &str = "approval_prompt";
    pub const CODE: &str = "code";
    pub const REFRESH_TOKEN: &str = "refresh_token";
    pub const ERROR: &str = "error";

    pub const RESPONSE_TYPE_CODE: &str = "code";
    pub const APPROVAL_PROMPT_FORCE: &str = "force";

    /// Value of the `error` callback parameter when the athlete declines consent
    pub const ACCESS_DENIED: &str = "access_denied";

    /// Error resource reported when the client id or secret is wrong
    pub const APPLICATION_RESOURCE: &str = "Application";

    /// Error resource reported for a bad, expired or reused code
    pub const REQUEST_TOKEN_RESOURCE: &str = "RequestToken";

    /// Tokens expiring within this many seconds are considered stale
    pub const EXPIRY_LEEWAY_SECONDS: i64 = 300;
}

/// Environment variable names
pub mod env_keys {
    pub const CLIENT_ID: &str = "STRAVA_CLIENT_ID";
    pub const CLIENT_SECRET: &str = "STRAVA_CLIENT_SECRET";
    pub const API_BASE: &str = "STRAVA_API_BASE";
    pub const REDIRECT_URI: &str = "STRAVA_REDIRECT_URI";
    pub const SCOPES: &str = "STRAVA_SCOPES";
}

/// Environment-based defaults
pub mod env_config {
    use super::{api, env_keys};
    use std::env;

    /// Get the API base path from environment or default
    pub fn api_base() -> String {
        env::var(env_keys::API_BASE).unwrap_or_else(|_| api::STRAVA_API_BASE.to_string())
    }

    /// Get the OAuth redirect URI from environment or default
    pub fn redirect_uri() -> String {
        env::var(env_keys::REDIRECT_URI)
            .unwrap_or_else(|_| "http://localhost:8089/oauth/callback".to_string())
    }

    /// Get log level from environment or default
    pub fn log_level() -> String {
        env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string())
    }
}
