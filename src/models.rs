// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Data Models
//!
//! Wire types for the OAuth exchange with the Strava API.
//!
//! ## Core Models
//!
//! - [`Permission`]: scope requested on the authorization page
//! - [`AuthorizationResponse`]: result of a successful token exchange
//! - [`AthleteSummary`]: athlete record embedded in the token response
//! - [`ErrorResponse`] / [`ErrorDetail`]: structured error body returned by the API

use crate::constants::oauth::EXPIRY_LEEWAY_SECONDS;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::borrow::Cow;
use std::fmt;
use thiserror::Error;

/// Access requested for an access token.
///
/// Strava encodes scopes as a comma-joined string; the library passes the
/// value through untouched as the `scope` query parameter.
///
/// # Examples
///
/// ```rust
/// use strava_oauth::models::Permission;
///
/// assert_eq!(Permission::WRITE_VIEW_PRIVATE.as_str(), "write,view_private");
/// let custom = Permission::from_scopes(&["read", "activity:read_all"]);
/// assert_eq!(custom.as_str(), "read,activity:read_all");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub const PUBLIC: Self = Self(Cow::Borrowed("public"));
    pub const VIEW_PRIVATE: Self = Self(Cow::Borrowed("view_private"));
    pub const WRITE: Self = Self(Cow::Borrowed("write"));
    pub const WRITE_VIEW_PRIVATE: Self = Self(Cow::Borrowed("write,view_private"));
    /// Every granular read and write permission
    pub const ALL: Self = Self(Cow::Borrowed(
        "read,read_all,profile:read_all,profile:write,activity:read,activity:read_all,activity:write",
    ));

    /// Arbitrary scope string, e.g. `read,activity:read_all`
    pub fn new(scope: impl Into<String>) -> Self {
        Self(Cow::Owned(scope.into()))
    }

    /// Joins granular scopes with commas
    pub fn from_scopes<S: AsRef<str>>(scopes: &[S]) -> Self {
        let joined = scopes
            .iter()
            .map(|s| s.as_ref().trim())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(",");
        Self::new(joined)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Athlete record embedded in the token exchange response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AthleteSummary {
    pub id: i64,
    pub username: Option<String>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    /// Medium-size avatar URL
    pub profile_medium: Option<String>,
    /// Large avatar URL
    pub profile: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    /// `M` or `F`
    pub sex: Option<String>,
    /// `pending`, `accepted`, `blocked` or absent, relative to the token owner
    pub friend: Option<String>,
    pub follower: Option<String>,
    pub premium: Option<bool>,
    pub summit: Option<bool>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Result of a successful token exchange.
///
/// Ownership passes entirely to the caller; the library keeps no copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorizationResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Expiry as seconds since the Unix epoch
    pub expires_at: i64,
    /// Seconds until expiry at the time of the exchange
    pub expires_in: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub athlete: AthleteSummary,
    /// CSRF value echoed back from the callback; set only by the callback handler
    #[serde(rename = "State", default, deserialize_with = "null_as_default")]
    pub state: String,
}

/// Treats an explicit JSON `null` like a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl AuthorizationResponse {
    /// Expiry as a UTC timestamp, if `expires_at` is in range
    pub fn expires_at_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.expires_at, 0)
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at_datetime()
            .is_some_and(|expires_at| expires_at <= Utc::now())
    }

    /// True when the access token expires within the next five minutes
    pub fn will_expire_soon(&self) -> bool {
        self.expires_at_datetime().is_some_and(|expires_at| {
            expires_at <= Utc::now() + Duration::seconds(EXPIRY_LEEWAY_SECONDS)
        })
    }
}

/// One element of a server-reported validation error list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorDetail {
    pub code: String,
    pub field: String,
    pub resource: String,
}

/// Error body returned by the Strava API
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(default)]
#[error("{message}")]
pub struct ErrorResponse {
    pub errors: Vec<ErrorDetail>,
    pub message: String,
}

impl ErrorResponse {
    /// Parses an error body, falling back to an empty response on malformed JSON
    pub fn from_body_lenient(body: &[u8]) -> Self {
        serde_json::from_slice(body).unwrap_or_default()
    }

    /// Resource named by the first reported error
    pub fn first_resource(&self) -> Option<&str> {
        self.errors.first().map(|detail| detail.resource.as_str())
    }
}
