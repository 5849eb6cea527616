// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Obtain, refresh or revoke Strava tokens from the command line

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::time::Duration;
use strava_oauth::client::{Client, OAuthService};
use strava_oauth::config::Config;
use strava_oauth::logging;
use strava_oauth::models::{AuthorizationResponse, Permission};
use strava_oauth::routes::oauth_callback_route;
use strava_oauth::{CallbackRequest, Error};
use tokio::sync::mpsc;
use tracing::{error, info};
use warp::http::StatusCode;
use warp::reply::{self, WithStatus};

#[derive(Parser)]
#[command(name = "auth-setup")]
#[command(about = "Set up OAuth2 authentication with Strava")]
struct Cli {
    /// Configuration file (defaults to the user config dir, then environment)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the authorization URL and wait for the redirect
    Authorize {
        /// Local address to serve the callback on
        #[arg(long, default_value = "127.0.0.1:8089")]
        listen: SocketAddr,

        /// Scope to request; defaults to the configured scopes
        #[arg(long)]
        scope: Option<String>,

        /// Ask Strava to show the consent page even if already granted
        #[arg(long)]
        force: bool,

        /// Seconds to wait for the redirect
        #[arg(long, default_value = "120")]
        timeout: u64,
    },
    /// Exchange a refresh token for a new access token
    Refresh {
        #[arg(long)]
        refresh_token: String,
    },
    /// Revoke an access token
    Deauthorize {
        #[arg(long)]
        access_token: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_from_env()?;

    let cli = Cli::parse();
    let config = Config::load(cli.config).context("Failed to load Strava configuration")?;

    match cli.command {
        Commands::Authorize {
            listen,
            scope,
            force,
            timeout,
        } => authorize(&config, listen, scope, force, timeout).await,
        Commands::Refresh { refresh_token } => {
            let tokens = config.authenticator()?.refresh(&refresh_token, None).await?;
            print_tokens(&tokens);
            Ok(())
        }
        Commands::Deauthorize { access_token } => {
            let client = Client::new(access_token).with_base_path(config.base_path.clone());
            OAuthService::new(&client).deauthorize().send().await?;
            println!("Access token revoked.");
            Ok(())
        }
    }
}

type Outcome = Result<AuthorizationResponse, Error>;

async fn authorize(
    config: &Config,
    listen: SocketAddr,
    scope: Option<String>,
    force: bool,
    timeout: u64,
) -> Result<()> {
    let authenticator = config.authenticator()?;
    let scope = scope
        .map(Permission::new)
        .or_else(|| config.permission())
        .unwrap_or(Permission::ALL);
    let state = uuid::Uuid::new_v4().to_string();

    let url = authenticator.authorization_url(&scope, Some(&state), force)?;
    println!("\nPlease visit this URL to authorize the application:");
    println!("{url}\n");

    let (tx, mut rx) = mpsc::unbounded_channel::<Outcome>();
    let success_tx = tx.clone();
    let handler = authenticator.handler(
        move |response: AuthorizationResponse, _req: &CallbackRequest| -> WithStatus<String> {
            let _ = success_tx.send(Ok(response));
            reply::with_status(
                "Authorization successful! You can close this window.".to_string(),
                StatusCode::OK,
            )
        },
        move |err: Error, _req: &CallbackRequest| -> WithStatus<String> {
            let body = format!("Authorization failed: {err}");
            let _ = tx.send(Err(err));
            reply::with_status(body, StatusCode::BAD_REQUEST)
        },
    );

    let route = oauth_callback_route(handler)?;
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let (addr, server) = warp::serve(route)
        .try_bind_with_graceful_shutdown(listen, async {
            shutdown_rx.await.ok();
        })
        .with_context(|| format!("Failed to bind callback server on {listen}"))?;
    let server = tokio::spawn(server);
    info!("Listening for OAuth callback on {}", addr);

    let outcome = tokio::time::timeout(Duration::from_secs(timeout), rx.recv()).await;
    let _ = shutdown_tx.send(());
    server.await.ok();

    match outcome {
        Ok(Some(Ok(tokens))) => {
            if tokens.state != state {
                error!("State mismatch on OAuth callback");
                anyhow::bail!("OAuth state mismatch; possible CSRF attempt");
            }
            print_tokens(&tokens);
            Ok(())
        }
        Ok(Some(Err(e))) => Err(e.into()),
        Ok(None) | Err(_) => {
            error!("No authorization callback received within {} seconds", timeout);
            anyhow::bail!("OAuth2 authorization timed out")
        }
    }
}

fn print_tokens(tokens: &AuthorizationResponse) {
    println!("\nStrava authentication successful!");
    println!("Athlete:       {}", tokens.athlete.id);
    println!("Access token:  {}", tokens.access_token);
    println!("Refresh token: {}", tokens.refresh_token);
    match tokens.expires_at_datetime() {
        Some(expires_at) => println!("Expires at:    {expires_at}"),
        None => println!("Expires in:    {}s", tokens.expires_in),
    }
}
