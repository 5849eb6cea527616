// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # OAuth authorization-code flow
//!
//! 1. Send the athlete's browser to [`OAuthAuthenticator::authorization_url`].
//! 2. Strava redirects back to the callback URL with `code` and `state`.
//! 3. [`OAuthAuthenticator::handle_callback`] (or the [`CallbackHandler`] built
//!    by [`OAuthAuthenticator::handler`]) exchanges the code for tokens.

use crate::config::Credentials;
use crate::constants::api::{AUTHORIZE_PATH, STRAVA_API_BASE, TOKEN_PATH};
use crate::constants::oauth;
use crate::errors::{Error, Result};
use crate::logging::AppLogger;
use crate::models::{AuthorizationResponse, ErrorResponse, Permission};
use crate::transport::{default_transport, HttpRequest, HttpResponse, HttpTransport};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

/// Builds the transport used for a single inbound callback request.
///
/// Needed on hosts that have no process-wide HTTP client and scope one to the
/// incoming request instead.
pub type ClientFactory = Arc<dyn Fn(&CallbackRequest) -> Arc<dyn HttpTransport> + Send + Sync>;

/// Construct the URL an athlete visits to grant access to the application.
///
/// Only the public client id goes into the URL; the secret never does.
pub fn authorization_url(
    base_path: &str,
    client_id: i64,
    callback_url: &str,
    scope: &Permission,
    state: Option<&str>,
    force_reapproval: bool,
) -> Result<String> {
    if client_id <= 0 {
        return Err(Error::configuration("client id is empty"));
    }
    if callback_url.is_empty() {
        return Err(Error::configuration("callback URL is empty"));
    }
    if scope.is_empty() {
        return Err(Error::configuration("scope is empty"));
    }

    let mut url = endpoint(base_path, AUTHORIZE_PATH)?;
    {
        let mut query = url.query_pairs_mut();
        query
            .append_pair(oauth::CLIENT_ID, &client_id.to_string())
            .append_pair(oauth::RESPONSE_TYPE, oauth::RESPONSE_TYPE_CODE)
            .append_pair(oauth::REDIRECT_URI, callback_url)
            .append_pair(oauth::SCOPE, scope.as_str());

        if let Some(state) = state.filter(|s| !s.is_empty()) {
            query.append_pair(oauth::STATE, state);
        }
        if force_reapproval {
            query.append_pair(oauth::APPROVAL_PROMPT, oauth::APPROVAL_PROMPT_FORCE);
        }
    }

    Ok(url.to_string())
}

fn endpoint(base_path: &str, path: &str) -> Result<Url> {
    let raw = format!("{}{}", base_path.trim_end_matches('/'), path);
    Url::parse(&raw).map_err(|e| Error::configuration(format!("invalid API base path {base_path}: {e}")))
}

/// Map a non-2xx token response to a domain error
pub(crate) fn classify_token_failure(response: &HttpResponse) -> Error {
    if response.is_server_error() {
        return Error::Server {
            status: response.status,
        };
    }

    // Malformed error bodies degrade to an empty error list
    let error_response = ErrorResponse::from_body_lenient(&response.body);

    match error_response.first_resource() {
        None => Error::Server {
            status: response.status,
        },
        Some(oauth::APPLICATION_RESOURCE) => Error::InvalidCredentials,
        Some(oauth::REQUEST_TOKEN_RESOURCE) => Error::InvalidCode,
        Some(_) => Error::Api {
            status: response.status,
            response: error_response,
        },
    }
}

/// Holds how OAuth requests for one application are authenticated
#[derive(Clone)]
pub struct OAuthAuthenticator {
    credentials: Credentials,
    base_path: String,
    callback_url: String,
    client_factory: Option<ClientFactory>,
}

impl fmt::Debug for OAuthAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthAuthenticator")
            .field("credentials", &self.credentials)
            .field("base_path", &self.base_path)
            .field("callback_url", &self.callback_url)
            .field("client_factory", &self.client_factory.is_some())
            .finish()
    }
}

impl OAuthAuthenticator {
    pub fn new(credentials: Credentials, callback_url: impl Into<String>) -> Self {
        Self {
            credentials,
            base_path: STRAVA_API_BASE.to_string(),
            callback_url: callback_url.into(),
            client_factory: None,
        }
    }

    /// Point at a different API host, e.g. a mock server in tests
    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }

    pub fn with_client_factory<G>(mut self, factory: G) -> Self
    where
        G: Fn(&CallbackRequest) -> Arc<dyn HttpTransport> + Send + Sync + 'static,
    {
        self.client_factory = Some(Arc::new(factory));
        self
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    pub fn callback_url(&self) -> &str {
        &self.callback_url
    }

    /// Path portion of the callback URL, for mounting the callback route
    pub fn callback_path(&self) -> Result<String> {
        if self.callback_url.is_empty() {
            return Err(Error::configuration("callback URL is empty"));
        }
        let url = Url::parse(&self.callback_url)
            .map_err(|e| Error::configuration(format!("invalid callback URL: {e}")))?;
        Ok(url.path().to_string())
    }

    pub fn authorization_url(
        &self,
        scope: &Permission,
        state: Option<&str>,
        force_reapproval: bool,
    ) -> Result<String> {
        authorization_url(
            &self.base_path,
            self.credentials.client_id,
            &self.callback_url,
            scope,
            state,
            force_reapproval,
        )
    }

    /// POST the given grant parameters to the token endpoint.
    ///
    /// `client_id` and `client_secret` are always injected here; any values the
    /// caller put in `values` under those names are discarded. The `state`
    /// field of the result is left empty.
    pub async fn exchange_token(
        &self,
        transport: &dyn HttpTransport,
        values: Vec<(String, String)>,
    ) -> Result<AuthorizationResponse> {
        let mut form: Vec<(String, String)> = values
            .into_iter()
            .filter(|(key, _)| key != oauth::CLIENT_ID && key != oauth::CLIENT_SECRET)
            .collect();
        form.push((oauth::CLIENT_ID.to_string(), self.credentials.client_id.to_string()));
        form.push((
            oauth::CLIENT_SECRET.to_string(),
            self.credentials.client_secret.clone(),
        ));

        let url = endpoint(&self.base_path, TOKEN_PATH)?;
        debug!(url = %url, "exchanging token");

        let response = transport
            .execute(HttpRequest::post_form(url.as_str(), form))
            .await
            .map_err(|e| {
                warn!("Token request failed before a response: {}", e);
                Error::from(e)
            })?;

        if !response.is_success() {
            let err = classify_token_failure(&response);
            warn!(status = response.status, "Token exchange rejected: {}", err);
            return Err(err);
        }

        serde_json::from_slice(&response.body).map_err(|source| {
            warn!("Token response did not decode: {}", source);
            Error::MalformedResponse { source }
        })
    }

    /// Exchange an authorization code for tokens.
    ///
    /// The athlete has already granted access on Strava and been redirected
    /// back with `code`. Falls back to the shared transport when none is given.
    pub async fn authorize(
        &self,
        code: &str,
        transport: Option<Arc<dyn HttpTransport>>,
    ) -> Result<AuthorizationResponse> {
        if code.is_empty() {
            return Err(Error::InvalidCode);
        }

        let transport = transport.unwrap_or_else(default_transport);
        let result = self
            .exchange_token(
                transport.as_ref(),
                vec![(oauth::CODE.to_string(), code.to_string())],
            )
            .await;

        match &result {
            Ok(response) => {
                info!("Authorized Strava athlete {}", response.athlete.id);
                AppLogger::log_oauth_event("authorization_code", true, None);
            }
            Err(e) => {
                AppLogger::log_oauth_event("authorization_code", false, Some(e.to_string().as_str()));
            }
        }
        result
    }

    /// Trade a refresh token for a fresh access token
    pub async fn refresh(
        &self,
        refresh_token: &str,
        transport: Option<Arc<dyn HttpTransport>>,
    ) -> Result<AuthorizationResponse> {
        if refresh_token.is_empty() {
            return Err(Error::configuration("refresh token is empty"));
        }

        let transport = transport.unwrap_or_else(default_transport);
        let result = self
            .exchange_token(
                transport.as_ref(),
                vec![(oauth::REFRESH_TOKEN.to_string(), refresh_token.to_string())],
            )
            .await;

        AppLogger::log_oauth_event(
            "refresh_token",
            result.is_ok(),
            result.as_ref().err().map(ToString::to_string).as_deref(),
        );
        result
    }

    fn transport_for(&self, request: &CallbackRequest) -> Arc<dyn HttpTransport> {
        self.client_factory
            .as_ref()
            .map_or_else(default_transport, |factory| factory(request))
    }

    /// Complete the exchange for one inbound redirect.
    ///
    /// Exactly one of the continuations runs. A declined consent goes straight
    /// to `on_failure` without touching the network.
    pub async fn handle_callback<R, S, F>(
        &self,
        request: &CallbackRequest,
        on_success: S,
        on_failure: F,
    ) -> R
    where
        S: FnOnce(AuthorizationResponse, &CallbackRequest) -> R,
        F: FnOnce(Error, &CallbackRequest) -> R,
    {
        if request.param(oauth::ERROR) == oauth::ACCESS_DENIED {
            info!("Athlete denied authorization");
            return on_failure(Error::AuthorizationDenied, request);
        }

        let transport = self.transport_for(request);

        match self.authorize(request.param(oauth::CODE), Some(transport)).await {
            Ok(mut response) => {
                response.state = request.param(oauth::STATE).to_string();
                on_success(response, request)
            }
            Err(e) => on_failure(e, request),
        }
    }

    /// Reusable callback handler sharing this authenticator's configuration
    pub fn handler<S, F>(&self, on_success: S, on_failure: F) -> CallbackHandler<S, F> {
        CallbackHandler {
            authenticator: Arc::new(self.clone()),
            on_success,
            on_failure,
        }
    }
}

/// Transport-neutral view of the redirect Strava sends back
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallbackRequest {
    pub path: String,
    pub query: HashMap<String, String>,
    /// Header names are stored lower-cased
    pub headers: HashMap<String, String>,
}

impl CallbackRequest {
    pub fn new(query: HashMap<String, String>) -> Self {
        Self {
            query,
            ..Self::default()
        }
    }

    /// Build from a raw `application/x-www-form-urlencoded` query string.
    ///
    /// A repeated key keeps its first value.
    pub fn from_query(raw_query: &str) -> Self {
        Self::new(first_values(url::form_urlencoded::parse(raw_query.as_bytes())))
    }

    /// Parse a request target such as `/oauth/callback?code=abc&state=xyz`
    pub fn from_uri(uri: &str) -> Result<Self> {
        let base = Url::parse("http://localhost")
            .map_err(|e| Error::configuration(e.to_string()))?;
        let url = base
            .join(uri)
            .map_err(|e| Error::configuration(format!("invalid callback URI: {e}")))?;

        Ok(Self {
            path: url.path().to_string(),
            query: first_values(url.query_pairs()),
            headers: HashMap::new(),
        })
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Query parameter value, empty when absent
    pub fn param(&self, name: &str) -> &str {
        self.query.get(name).map_or("", String::as_str)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

fn first_values<'a>(pairs: impl Iterator<Item = (Cow<'a, str>, Cow<'a, str>)>) -> HashMap<String, String> {
    let mut query = HashMap::new();
    for (key, value) in pairs {
        query
            .entry(key.into_owned())
            .or_insert_with(|| value.into_owned());
    }
    query
}

/// Callback handler with its success and failure continuations attached.
///
/// Cheap to clone and safe to share across concurrent requests.
#[derive(Clone)]
pub struct CallbackHandler<S, F> {
    authenticator: Arc<OAuthAuthenticator>,
    on_success: S,
    on_failure: F,
}

impl<S, F> CallbackHandler<S, F> {
    pub fn authenticator(&self) -> &OAuthAuthenticator {
        &self.authenticator
    }

    pub async fn call<R>(&self, request: CallbackRequest) -> R
    where
        S: Fn(AuthorizationResponse, &CallbackRequest) -> R,
        F: Fn(Error, &CallbackRequest) -> R,
    {
        self.authenticator
            .handle_callback(
                &request,
                |response, req| (self.on_success)(response, req),
                |err, req| (self.on_failure)(err, req),
            )
            .await
    }
}
