use chrono::{Duration, Utc};
use spotctl::{
    config::Endpoints,
    error::AuthError,
    management::{CredentialStore, MemoryBackend, StoredState, TokenAction, TokenManager},
    types::{Credentials, TokenRecord},
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_string_contains, method, path},
};

fn endpoints(server: &MockServer) -> Endpoints {
    Endpoints {
        authorize_url: "https://accounts.example.com/authorize".to_string(),
        token_url: format!("{}/api/token", server.uri()),
    }
}

fn credentials() -> Credentials {
    Credentials::new("client-id", "client-secret", "http://127.0.0.1:8888/callback")
}

async fn manager_with(token: TokenRecord, server: &MockServer) -> TokenManager<MemoryBackend> {
    let backend = MemoryBackend::new(Some(StoredState {
        credentials: credentials(),
        token,
    }));
    let store = CredentialStore::open(backend).await.unwrap();
    TokenManager::new(store, credentials(), &endpoints(server))
}

#[tokio::test]
async fn test_valid_token_is_reused() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let token = TokenRecord::new(
        "current",
        "Bearer",
        Some("refresh".into()),
        Some(Utc::now() + Duration::hours(1)),
    );
    let mut manager = manager_with(token, &server).await;

    assert_eq!(manager.next_action(), TokenAction::Reuse);
    assert_eq!(manager.get_valid_token().await.unwrap(), "current");
}

#[tokio::test]
async fn test_expiring_token_is_refreshed_and_persisted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=old-refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "fresh",
            "token_type": "Bearer",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&server)
        .await;

    let token = TokenRecord::new(
        "stale",
        "Bearer",
        Some("old-refresh".into()),
        Some(Utc::now() + Duration::minutes(2)),
    );
    let mut manager = manager_with(token, &server).await;

    assert_eq!(manager.next_action(), TokenAction::Refresh);
    assert_eq!(manager.get_valid_token().await.unwrap(), "fresh");

    let saved = manager.store().backend().snapshot().unwrap();
    assert_eq!(saved.token.access_token, "fresh");
    // provider did not rotate the refresh token
    assert_eq!(saved.token.refresh_token.as_deref(), Some("old-refresh"));
    assert_eq!(saved.credentials, credentials());
}

#[tokio::test]
async fn test_malformed_expiry_triggers_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "fresh",
            "refresh_token": "rotated",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&server)
        .await;

    let token = TokenRecord {
        access_token: "stale".into(),
        refresh_token: Some("old-refresh".into()),
        token_type: "Bearer".into(),
        expires_at: Some("invalid-time".into()),
    };
    let mut manager = manager_with(token, &server).await;

    assert_eq!(manager.next_action(), TokenAction::Refresh);
    assert_eq!(manager.get_valid_token().await.unwrap(), "fresh");
    assert_eq!(
        manager.store().token().refresh_token.as_deref(),
        Some("rotated")
    );
}

#[tokio::test]
async fn test_expired_application_token_is_reacquired() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("grant_type=client_credentials"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "new-app-token",
            "token_type": "Bearer",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&server)
        .await;

    let token = TokenRecord::new(
        "old-app-token",
        "Bearer",
        None,
        Some(Utc::now() - Duration::minutes(1)),
    );
    let mut manager = manager_with(token, &server).await;

    assert_eq!(manager.next_action(), TokenAction::Acquire);
    assert_eq!(manager.get_valid_token().await.unwrap(), "new-app-token");
    assert!(manager.store().token().refresh_token.is_none());
}

#[tokio::test]
async fn test_failed_refresh_keeps_stored_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": "invalid_grant"
        })))
        .mount(&server)
        .await;

    let token = TokenRecord::new(
        "stale",
        "Bearer",
        Some("revoked".into()),
        Some(Utc::now() + Duration::minutes(1)),
    );
    let mut manager = manager_with(token.clone(), &server).await;

    let err = manager.get_valid_token().await.unwrap_err();
    assert!(matches!(err, AuthError::TokenExchange(_)));
    assert_eq!(manager.store().token(), &token);
}

#[tokio::test]
async fn test_refresh_without_refresh_token() {
    let server = MockServer::start().await;
    let mut manager = manager_with(TokenRecord::default(), &server).await;

    let err = manager.refresh().await.unwrap_err();
    assert!(matches!(err, AuthError::NotAuthenticated));
}
