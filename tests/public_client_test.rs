mod common;

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use axum::{Form, Json, Router, extract::State, http::StatusCode, routing::post};
use chrono::Utc;
use serde_json::{Value, json};

use common::{account, scopes, serve};
use mstodo::{
    config::Settings,
    error::Error,
    identity::{CredentialClient, PublicClient, SilentOutcome, TokenCache},
    types::CachedToken,
};

/// Canned token endpoint recording every grant it receives.
struct TokenEndpoint {
    status: u16,
    body: Value,
    grants: Vec<HashMap<String, String>>,
}

type SharedEndpoint = Arc<Mutex<TokenEndpoint>>;

async fn token(
    State(endpoint): State<SharedEndpoint>,
    Form(grant): Form<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    let mut endpoint = endpoint.lock().unwrap();
    endpoint.grants.push(grant);
    (
        StatusCode::from_u16(endpoint.status).unwrap(),
        Json(endpoint.body.clone()),
    )
}

async fn identity_platform(status: u16, body: Value) -> (PublicClient, SharedEndpoint) {
    let endpoint = Arc::new(Mutex::new(TokenEndpoint {
        status,
        body,
        grants: Vec::new(),
    }));
    let router = Router::new()
        .route("/common/oauth2/v2.0/token", post(token))
        .with_state(Arc::clone(&endpoint));
    let base = serve(router).await;

    (client_for(&base), endpoint)
}

fn client_for(login_url: &str) -> PublicClient {
    let settings = Settings::from_lookup(|key| match key {
        "MSTODO_LOGIN_URL" => Some(login_url.to_string()),
        "MSTODO_CLIENT_ID" => Some("test-client".to_string()),
        _ => None,
    })
    .unwrap();
    PublicClient::new(&settings)
}

/// A clean cache holding `account()` with a token expiring in `expires_in`
/// seconds.
fn cache_with(expires_in: i64, refresh_token: Option<&str>, scopes: Vec<String>) -> TokenCache {
    let mut cache = TokenCache::new();
    cache.upsert(
        account(),
        CachedToken {
            access_token: "cached-access-token".to_string(),
            refresh_token: refresh_token.map(str::to_string),
            scopes,
            expires_at: Utc::now().timestamp() + expires_in,
        },
    );
    cache.mark_clean();
    cache
}

fn grants(endpoint: &SharedEndpoint) -> Vec<HashMap<String, String>> {
    endpoint.lock().unwrap().grants.clone()
}

#[tokio::test]
async fn test_valid_cached_token_is_reused() {
    let (client, endpoint) = identity_platform(500, json!({})).await;
    let mut cache = cache_with(3600, Some("refresh-1"), scopes());

    let outcome = client
        .acquire_token_silent(&mut cache, &scopes(), Some(&account()))
        .await
        .unwrap();

    match outcome {
        SilentOutcome::Acquired(session) => {
            assert_eq!(session.access_token, "cached-access-token")
        }
        other => panic!("expected cached token, got {other:?}"),
    }
    assert!(grants(&endpoint).is_empty());
    assert!(!cache.has_state_changed());
}

#[tokio::test]
async fn test_resource_qualified_scopes_cover_short_names() {
    let (client, endpoint) = identity_platform(500, json!({})).await;
    let granted = vec![
        "https://graph.microsoft.com/User.Read".to_string(),
        "https://graph.microsoft.com/Tasks.ReadWrite".to_string(),
    ];
    let mut cache = cache_with(3600, Some("refresh-1"), granted);

    let outcome = client
        .acquire_token_silent(&mut cache, &scopes(), Some(&account()))
        .await
        .unwrap();

    assert!(matches!(outcome, SilentOutcome::Acquired(_)));
    assert!(grants(&endpoint).is_empty());
}

#[tokio::test]
async fn test_token_close_to_expiry_is_refreshed() {
    let (client, endpoint) = identity_platform(
        200,
        json!({
            "access_token": "fresh-access-token",
            "refresh_token": "refresh-2",
            "expires_in": 3600,
            "scope": "User.Read Tasks.ReadWrite openid profile"
        }),
    )
    .await;
    // inside the five minute margin
    let mut cache = cache_with(60, Some("refresh-1"), scopes());

    let outcome = client
        .acquire_token_silent(&mut cache, &scopes(), Some(&account()))
        .await
        .unwrap();

    match outcome {
        SilentOutcome::Acquired(session) => assert_eq!(session.access_token, "fresh-access-token"),
        other => panic!("expected refreshed token, got {other:?}"),
    }

    let grants = grants(&endpoint);
    assert_eq!(grants.len(), 1);
    assert_eq!(grants[0]["grant_type"], "refresh_token");
    assert_eq!(grants[0]["refresh_token"], "refresh-1");
    assert_eq!(grants[0]["client_id"], "test-client");
    assert!(grants[0]["scope"].contains("offline_access"));
    assert!(grants[0]["scope"].contains("Tasks.ReadWrite"));

    assert!(cache.has_state_changed());
    let stored = cache.token("oid-1.tid-1").unwrap();
    assert_eq!(stored.refresh_token.as_deref(), Some("refresh-2"));
    assert_eq!(stored.scopes.len(), 4);
}

#[tokio::test]
async fn test_refresh_keeps_previous_refresh_token() {
    let (client, _endpoint) = identity_platform(
        200,
        json!({ "access_token": "fresh-access-token", "expires_in": 3600 }),
    )
    .await;
    let mut cache = cache_with(-10, Some("refresh-1"), scopes());

    client
        .acquire_token_silent(&mut cache, &scopes(), Some(&account()))
        .await
        .unwrap();

    let stored = cache.token("oid-1.tid-1").unwrap();
    assert_eq!(stored.refresh_token.as_deref(), Some("refresh-1"));
    assert_eq!(stored.scopes, scopes());
}

#[tokio::test]
async fn test_missing_scope_forces_refresh() {
    let (client, endpoint) = identity_platform(
        200,
        json!({ "access_token": "fresh-access-token", "expires_in": 3600 }),
    )
    .await;
    let mut cache = cache_with(3600, Some("refresh-1"), vec!["User.Read".to_string()]);

    client
        .acquire_token_silent(&mut cache, &scopes(), Some(&account()))
        .await
        .unwrap();

    assert_eq!(grants(&endpoint).len(), 1);
}

#[tokio::test]
async fn test_user_fixable_errors_need_interaction() {
    for code in [
        "invalid_grant",
        "interaction_required",
        "login_required",
        "consent_required",
    ] {
        let (client, endpoint) = identity_platform(
            400,
            json!({ "error": code, "error_description": "AADSTS50173: the grant has expired" }),
        )
        .await;
        let mut cache = cache_with(-10, Some("refresh-1"), scopes());

        let outcome = client
            .acquire_token_silent(&mut cache, &scopes(), Some(&account()))
            .await
            .unwrap();

        assert!(
            matches!(outcome, SilentOutcome::NeedsInteraction),
            "{code} should ask for interaction"
        );
        assert_eq!(grants(&endpoint).len(), 1);
        assert!(!cache.has_state_changed());
    }
}

#[tokio::test]
async fn test_other_errors_are_reported() {
    let (client, _endpoint) = identity_platform(
        400,
        json!({
            "error": "invalid_client",
            "error_description": "AADSTS700016: application not found"
        }),
    )
    .await;
    let mut cache = cache_with(-10, Some("refresh-1"), scopes());

    match client
        .acquire_token_silent(&mut cache, &scopes(), Some(&account()))
        .await
    {
        Err(Error::Auth(message)) => {
            assert!(message.starts_with("invalid_client"));
            assert!(message.contains("AADSTS700016"));
        }
        other => panic!("expected auth error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unreadable_error_answer_is_reported() {
    let (client, _endpoint) = identity_platform(503, json!("maintenance")).await;
    let mut cache = cache_with(-10, Some("refresh-1"), scopes());

    let result = client
        .acquire_token_silent(&mut cache, &scopes(), Some(&account()))
        .await;
    assert!(matches!(result, Err(Error::Auth(_))));
}

#[tokio::test]
async fn test_unreachable_identity_platform_is_a_network_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let client = client_for(&base);
    let mut cache = cache_with(-10, Some("refresh-1"), scopes());

    let result = client
        .acquire_token_silent(&mut cache, &scopes(), Some(&account()))
        .await;
    assert!(matches!(result, Err(Error::Network(_))));
}

#[tokio::test]
async fn test_nothing_to_redeem_needs_interaction() {
    let (client, endpoint) = identity_platform(500, json!({})).await;

    let mut empty = TokenCache::new();
    let outcome = client
        .acquire_token_silent(&mut empty, &scopes(), None)
        .await
        .unwrap();
    assert!(matches!(outcome, SilentOutcome::NeedsInteraction));

    let mut no_refresh = cache_with(-10, None, scopes());
    let outcome = client
        .acquire_token_silent(&mut no_refresh, &scopes(), Some(&account()))
        .await
        .unwrap();
    assert!(matches!(outcome, SilentOutcome::NeedsInteraction));

    assert!(grants(&endpoint).is_empty());
}

#[test]
fn test_remove_unknown_account_fails() {
    let client = client_for("http://127.0.0.1:9");
    let mut cache = TokenCache::new();

    assert!(matches!(
        client.remove_account(&mut cache, &account()),
        Err(Error::Storage(_))
    ));

    let mut cache = cache_with(3600, None, scopes());
    client.remove_account(&mut cache, &account()).unwrap();
    assert!(cache.is_empty());
}
