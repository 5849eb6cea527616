// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Strava OAuth
//!
//! Client library for the Strava API v3 OAuth2 authorization-code flow.
//!
//! ## Features
//!
//! - **Authorization URL**: build the consent page URL for an application
//! - **Token exchange**: trade an authorization code or refresh token for tokens,
//!   with Strava's error bodies classified into typed errors
//! - **Callback handling**: turn the redirect back from Strava into a success or
//!   failure continuation, with an optional `warp` route
//! - **Deauthorize**: revoke an access token
//! - **Pluggable transport**: every request goes through [`transport::HttpTransport`]
//!
//! The library keeps no tokens, schedules no refreshes and never retries.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use strava_oauth::config::Credentials;
//! use strava_oauth::models::Permission;
//! use strava_oauth::oauth::OAuthAuthenticator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let authenticator = OAuthAuthenticator::new(
//!         Credentials::new(1234, "client-secret"),
//!         "http://localhost:8089/oauth/callback",
//!     );
//!
//!     let url = authenticator.authorization_url(&Permission::ALL, Some("csrf-token"), false)?;
//!     println!("Visit: {url}");
//!
//!     // After the redirect delivers `code`:
//!     let tokens = authenticator.authorize("code-from-redirect", None).await?;
//!     println!("Athlete {} expires at {}", tokens.athlete.id, tokens.expires_at);
//!     Ok(())
//! }
//! ```

/// Bearer-authenticated API client and deauthorize call
pub mod client;

/// Credentials and configuration loading
pub mod config;

/// Endpoint paths, wire parameter names and environment keys
pub mod constants;

/// Error kinds returned to callers
pub mod errors;

/// Structured logging setup
pub mod logging;

/// Wire data models
pub mod models;

/// Authorization URL, token exchange and callback handling
pub mod oauth;

/// `warp` route for the OAuth callback
pub mod routes;

/// Pluggable HTTP transport
pub mod transport;

pub use config::Credentials;
pub use errors::{Error, Result};
pub use models::{AuthorizationResponse, Permission};
pub use oauth::{CallbackHandler, CallbackRequest, OAuthAuthenticator};
