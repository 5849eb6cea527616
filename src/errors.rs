// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Error kinds returned by the OAuth flow and the authenticated client

use crate::models::ErrorResponse;
use crate::transport::TransportError;
use thiserror::Error;

/// Crate-wide result type
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Every failure the library reports to its caller.
///
/// Nothing is logged and swallowed: each variant is returned synchronously
/// from the call that produced it.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or invalid client id, callback URL, scope or base path
    #[error("OAuth configuration error: {reason}")]
    Configuration { reason: String },

    /// The athlete declined consent on the authorization page
    #[error("authorization denied by the athlete")]
    AuthorizationDenied,

    /// The authorization code was empty, invalid, expired or already used
    #[error("authorization code is invalid")]
    InvalidCode,

    /// The service rejected the client id or client secret
    #[error("client id or client secret is invalid")]
    InvalidCredentials,

    /// 5xx response or an error body with nothing to classify
    #[error("Strava server error (HTTP {status})")]
    Server { status: u16 },

    /// Structured error the service reported for any other reason
    #[error("Strava API error (HTTP {status}): {response}")]
    Api { status: u16, response: ErrorResponse },

    /// A successful response whose body does not have the expected shape
    #[error("malformed response body")]
    MalformedResponse {
        #[source]
        source: serde_json::Error,
    },

    /// The request never produced a response
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl Error {
    pub(crate) fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    /// Whether repeating the same call later could succeed without changing it
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Server { .. } | Self::Transport(_))
    }

    /// HTTP status attached to the error, if the service answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Server { status } | Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}
