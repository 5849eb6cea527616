// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! HTTP route for the OAuth redirect callback

use crate::errors::{Error, Result};
use crate::models::AuthorizationResponse;
use crate::oauth::{CallbackHandler, CallbackRequest};
use tracing::debug;
use warp::http::HeaderMap;
use warp::path::FullPath;
use warp::{Filter, Rejection, Reply};

/// `GET <callback path>` filter that completes the token exchange.
///
/// The path is taken from the authenticator's callback URL. Requests to any
/// other path are rejected with `404` so the filter can be combined with
/// other routes.
pub fn oauth_callback_route<S, F, R>(
    handler: CallbackHandler<S, F>,
) -> Result<impl Filter<Extract = (R,), Error = Rejection> + Clone>
where
    S: Fn(AuthorizationResponse, &CallbackRequest) -> R + Clone + Send + Sync + 'static,
    F: Fn(Error, &CallbackRequest) -> R + Clone + Send + Sync + 'static,
    R: Reply + Send + 'static,
{
    let callback_path = handler.authenticator().callback_path()?;
    debug!("Mounting OAuth callback route at {}", callback_path);

    let route = warp::get()
        .and(warp::path::full())
        .and_then(move |full: FullPath| {
            let matches = full.as_str() == callback_path;
            async move {
                if matches {
                    Ok::<_, Rejection>(full)
                } else {
                    Err(warp::reject::not_found())
                }
            }
        })
        .and(
            warp::query::raw()
                .or(warp::any().map(String::new))
                .unify(),
        )
        .and(warp::header::headers_cloned())
        .and_then(
            move |full: FullPath, raw_query: String, headers: HeaderMap| {
                let handler = handler.clone();
                async move {
                    let request = callback_request(full.as_str(), &raw_query, &headers);
                    Ok::<R, Rejection>(handler.call(request).await)
                }
            },
        );

    Ok(route)
}

fn callback_request(path: &str, raw_query: &str, headers: &HeaderMap) -> CallbackRequest {
    let mut request = CallbackRequest::from_query(raw_query).with_path(path);
    for (name, value) in headers {
        if let Ok(value) = value.to_str() {
            request = request.with_header(name.as_str(), value);
        }
    }
    request
}
