// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Integration tests for the token exchange and its error classification

mod common;

use anyhow::Result;
use common::{
    authenticator, error_body, expected_tokens, token_body, FailingTransport, PanickingTransport,
    StubTransport, CLIENT_ID, CLIENT_SECRET,
};
use mockito::{Matcher, Server};
use std::sync::Arc;
use strava_oauth::models::AthleteSummary;
use strava_oauth::transport::{HttpTransport, ReqwestTransport};
use strava_oauth::Error;

fn reqwest_transport() -> Option<Arc<dyn HttpTransport>> {
    Some(Arc::new(ReqwestTransport::new()))
}

#[tokio::test]
async fn test_authorize_against_mock_server() -> Result<()> {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("POST", "/oauth/token")
        .match_header("content-type", "application/x-www-form-urlencoded")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("client_id".into(), CLIENT_ID.to_string()),
            Matcher::UrlEncoded("client_secret".into(), CLIENT_SECRET.into()),
            Matcher::UrlEncoded("code".into(), "auth-code".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(token_body().to_string())
        .create_async()
        .await;

    let tokens = authenticator()
        .with_base_path(server.url())
        .authorize("auth-code", reqwest_transport())
        .await?;

    mock.assert_async().await;
    assert_eq!(tokens, expected_tokens());
    assert!(tokens.state.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_invalid_credentials_from_server() -> Result<()> {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/oauth/token")
        .with_status(401)
        .with_body(error_body("Application"))
        .create_async()
        .await;

    let result = authenticator()
        .with_base_path(server.url())
        .authorize("auth-code", reqwest_transport())
        .await;

    assert!(matches!(result, Err(Error::InvalidCredentials)));
    Ok(())
}

#[tokio::test]
async fn test_invalid_code_from_server() {
    let transport = StubTransport::new(400, error_body("RequestToken"));

    let result = authenticator().authorize("used-code", Some(transport.clone())).await;

    assert!(matches!(result, Err(Error::InvalidCode)));
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn test_empty_code_never_reaches_transport() {
    let result = authenticator()
        .authorize("", Some(Arc::new(PanickingTransport)))
        .await;

    assert!(matches!(result, Err(Error::InvalidCode)));
}

#[tokio::test]
async fn test_other_resource_is_api_error() {
    let transport = StubTransport::new(400, error_body("Athlete"));

    match authenticator().authorize("code", Some(transport)).await {
        Err(Error::Api { status, response }) => {
            assert_eq!(status, 400);
            assert_eq!(response.message, "Bad Request");
            assert_eq!(response.errors[0].resource, "Athlete");
            assert_eq!(response.errors[0].field, "code");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_server_errors() {
    // 5xx is never parsed, even with a classifiable body
    let transport = StubTransport::new(502, error_body("Application"));
    let result = authenticator().authorize("code", Some(transport)).await;
    assert!(matches!(result, Err(Error::Server { status: 502 })));

    let transport = StubTransport::new(400, "<html>Bad Request</html>");
    let result = authenticator().authorize("code", Some(transport)).await;
    assert!(matches!(result, Err(Error::Server { status: 400 })));

    let transport = StubTransport::new(403, r#"{"message":"Forbidden","errors":[]}"#);
    let result = authenticator().authorize("code", Some(transport)).await;
    assert!(matches!(result, Err(Error::Server { status: 403 })));
}

#[tokio::test]
async fn test_malformed_success_body() {
    let transport = StubTransport::new(200, "{ not json");
    let result = authenticator().authorize("code", Some(transport)).await;
    assert!(matches!(result, Err(Error::MalformedResponse { .. })));

    let transport = StubTransport::new(200, r#"{"access_token": 42}"#);
    let result = authenticator().authorize("code", Some(transport)).await;
    assert!(matches!(result, Err(Error::MalformedResponse { .. })));
}

#[tokio::test]
async fn test_null_athlete_decodes_as_default() -> Result<()> {
    let transport = StubTransport::new(
        200,
        r#"{"access_token":"a","refresh_token":"r","expires_at":1,"expires_in":1,"athlete":null,"State":null}"#,
    );

    let tokens = authenticator().authorize("c", Some(transport)).await?;

    assert_eq!(tokens.access_token, "a");
    assert_eq!(tokens.refresh_token, "r");
    assert_eq!(tokens.athlete, AthleteSummary::default());
    assert!(tokens.state.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_transport_failure_surfaces_cause() {
    let err = authenticator()
        .authorize("code", Some(Arc::new(FailingTransport)))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Transport(_)));
    assert!(err.is_retryable());
    assert!(err.to_string().contains("connection refused"));
}

#[tokio::test]
async fn test_exchange_owns_credential_injection() -> Result<()> {
    let transport = StubTransport::success();

    authenticator()
        .exchange_token(
            &*transport,
            vec![
                ("client_id".to_string(), "999".to_string()),
                ("client_secret".to_string(), "forged".to_string()),
                ("code".to_string(), "abc".to_string()),
            ],
        )
        .await?;

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert!(request.url.ends_with("/api/v3/oauth/token"));
    assert!(request.bearer_token.is_none());
    assert_eq!(request.form_value("client_id"), Some("1234"));
    assert_eq!(request.form_value("client_secret"), Some(CLIENT_SECRET));
    assert_eq!(request.form_value("code"), Some("abc"));
    assert_eq!(
        request.form.iter().filter(|(k, _)| k == "client_secret").count(),
        1
    );

    Ok(())
}

#[tokio::test]
async fn test_refresh_grant() -> Result<()> {
    let transport = StubTransport::success();

    let tokens = authenticator()
        .refresh("e5n567567", Some(transport.clone()))
        .await?;

    assert_eq!(tokens.access_token, "a4b945687g");
    let requests = transport.requests();
    let request = &requests[0];
    assert_eq!(request.form_value("refresh_token"), Some("e5n567567"));
    assert_eq!(request.form_value("code"), None);

    let empty = authenticator()
        .refresh("", Some(Arc::new(PanickingTransport)))
        .await;
    assert!(matches!(empty, Err(Error::Configuration { .. })));

    Ok(())
}
