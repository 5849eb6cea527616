// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Configuration for the Strava OAuth client

pub mod environment;

use crate::constants::api::STRAVA_API_BASE;
use crate::errors::{Error, Result};
use crate::models::Permission;
use crate::oauth::OAuthAuthenticator;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Application credentials issued by Strava.
///
/// Passed explicitly to every exchange; the secret is only ever sent in the
/// server-to-server token request.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub client_id: i64,
    pub client_secret: String,
}

impl Credentials {
    pub fn new(client_id: i64, client_secret: impl Into<String>) -> Self {
        Self {
            client_id,
            client_secret: client_secret.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

#[derive(Clone, Deserialize, Serialize)]
pub struct Config {
    pub client_id: i64,
    pub client_secret: String,
    #[serde(default = "default_base_path")]
    pub base_path: String,
    #[serde(default)]
    pub callback_url: Option<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("base_path", &self.base_path)
            .field("callback_url", &self.callback_url)
            .field("scopes", &self.scopes)
            .finish()
    }
}

fn default_base_path() -> String {
    STRAVA_API_BASE.to_string()
}

impl Config {
    /// Load from a TOML file, falling back to environment variables when no
    /// file exists at the given (or default) location
    pub fn load(path: Option<String>) -> Result<Self> {
        let config_path = path.map_or_else(default_config_path, PathBuf::from);

        let config = if config_path.exists() {
            info!("Loading Strava configuration from {}", config_path.display());
            Self::from_file(&config_path)?
        } else {
            debug!("No config file at {}, using environment", config_path.display());
            environment::config_from_env()?
        };

        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::configuration(format!("failed to read {}: {e}", path.display()))
        })?;
        toml::from_str(&content).map_err(|e| {
            Error::configuration(format!("failed to parse {}: {e}", path.display()))
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.client_id <= 0 {
            return Err(Error::configuration("client id must be a positive integer"));
        }
        if self.client_secret.trim().is_empty() {
            return Err(Error::configuration("client secret is empty"));
        }
        if self.base_path.trim().is_empty() {
            return Err(Error::configuration("API base path is empty"));
        }
        Ok(())
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.client_id, self.client_secret.clone())
    }

    /// Scope from the configured list, or `None` when nothing is configured
    pub fn permission(&self) -> Option<Permission> {
        let permission = Permission::from_scopes(self.scopes.as_slice());
        (!permission.is_empty()).then_some(permission)
    }

    /// Authenticator for the configured callback URL
    pub fn authenticator(&self) -> Result<OAuthAuthenticator> {
        let callback_url = self
            .callback_url
            .clone()
            .ok_or_else(|| Error::configuration("callback URL is not configured"))?;

        Ok(OAuthAuthenticator::new(self.credentials(), callback_url)
            .with_base_path(self.base_path.clone()))
    }
}

fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|p| p.join("strava-oauth/config.toml"))
        .unwrap_or_else(|| "config.toml".into())
}
