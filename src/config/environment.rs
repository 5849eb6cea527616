// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Environment-based configuration

use super::Config;
use crate::constants::{env_config, env_keys};
use crate::errors::{Error, Result};
use std::env;
use tracing::{info, warn};

/// Build a [`Config`] from `STRAVA_*` environment variables, reading `.env` first
pub fn config_from_env() -> Result<Config> {
    info!("Loading Strava configuration from environment variables");

    if let Err(e) = dotenv::dotenv() {
        warn!("No .env file found or failed to load: {}", e);
    }

    let client_id = required_var(env_keys::CLIENT_ID)?
        .trim()
        .parse::<i64>()
        .map_err(|_| Error::configuration(format!("Invalid {} value", env_keys::CLIENT_ID)))?;

    Ok(Config {
        client_id,
        client_secret: required_var(env_keys::CLIENT_SECRET)?,
        base_path: env_config::api_base(),
        callback_url: env::var(env_keys::REDIRECT_URI).ok(),
        scopes: parse_scopes(&env_var_or(env_keys::SCOPES, "read,activity:read_all")),
    })
}

fn required_var(key: &str) -> Result<String> {
    env::var(key).map_err(|_| Error::configuration(format!("{key} is not set")))
}

/// Get environment variable or default value
fn env_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse comma-separated scopes
fn parse_scopes(scopes_str: &str) -> Vec<String> {
    scopes_str
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
