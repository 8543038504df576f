use chrono::{Duration, Utc};
use spotctl::{management::TokenStatus, types::TokenRecord};

fn record(access: &str, refresh: Option<&str>, expires_at: Option<String>) -> TokenRecord {
    TokenRecord {
        access_token: access.to_string(),
        refresh_token: refresh.map(String::from),
        token_type: "Bearer".to_string(),
        expires_at,
    }
}

#[test]
fn test_valid_token_one_hour_ahead() {
    let now = Utc::now();
    let token = TokenRecord::new("access", "Bearer", None, Some(now + Duration::hours(1)));
    let status = TokenStatus::evaluate(&token, now);

    assert!(status.authenticated);
    assert!(!status.expired);
    assert!(!status.expiring_soon);
    assert!(!status.refreshable);
    assert!(status.expires_at.is_some());
}

#[test]
fn test_expiring_within_five_minutes() {
    let now = Utc::now();
    let token = TokenRecord::new(
        "access",
        "Bearer",
        Some("refresh".into()),
        Some(now + Duration::minutes(4)),
    );
    let status = token.status(now);

    assert!(status.authenticated);
    assert!(!status.expired);
    assert!(status.expiring_soon);
    assert!(status.refreshable);
}

#[test]
fn test_expired_token() {
    let now = Utc::now();
    let token = TokenRecord::new("access", "Bearer", None, Some(now - Duration::seconds(1)));

    assert!(token.is_expired(now));
    assert!(token.is_expiring_soon(now));
    assert!(!token.status(now).authenticated);
}

#[test]
fn test_expiry_equal_to_now_is_expired() {
    let now = Utc::now();
    let token = record("access", None, Some(now.to_rfc3339()));
    let status = token.status(now);

    assert!(status.expired);
    assert!(!status.authenticated);
}

#[test]
fn test_malformed_expiry_fails_closed() {
    let now = Utc::now();
    let token = record("access", Some("refresh"), Some("invalid-time".into()));
    let status = TokenStatus::evaluate(&token, now);

    assert!(token.expiry().is_err());
    assert!(status.expired);
    assert!(status.expiring_soon);
    assert!(!status.authenticated);
    assert!(status.refreshable);
}

#[test]
fn test_empty_access_token_is_never_authenticated() {
    let now = Utc::now();

    let no_expiry = record("", None, None);
    assert!(!no_expiry.status(now).authenticated);

    let future = record("", None, Some((now + Duration::hours(1)).to_rfc3339()));
    assert!(!future.status(now).authenticated);
}

#[test]
fn test_absent_expiry() {
    let now = Utc::now();
    let token = record("access", Some(""), None);
    let status = token.status(now);

    assert!(status.authenticated);
    assert!(!status.expired);
    assert!(!status.expiring_soon);
    assert!(!status.refreshable);
}

#[test]
fn test_offset_timestamps_are_accepted() {
    let now = Utc::now();
    let in_two_hours = (now + Duration::hours(2))
        .with_timezone(&chrono::FixedOffset::east_opt(3600).unwrap())
        .to_rfc3339();
    let token = record("access", None, Some(in_two_hours));

    assert!(token.status(now).authenticated);
    assert!(!token.status(now).expiring_soon);
}
