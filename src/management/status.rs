use chrono::{DateTime, Duration, Utc};
use tracing::warn;

use crate::types::TokenRecord;

/// Window before expiry in which a token counts as expiring soon.
pub const EXPIRY_LOOKAHEAD_SECS: i64 = 5 * 60;

/// Predicates deciding whether a stored token can be reused.
///
/// An `expires_at` that does not parse fails closed: the token is expired
/// and expiring soon, never authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenStatus {
    pub authenticated: bool,
    pub expired: bool,
    pub expiring_soon: bool,
    pub refreshable: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

enum Expiry {
    Absent,
    At(DateTime<Utc>),
    Malformed,
}

impl TokenStatus {
    pub fn evaluate(record: &TokenRecord, now: DateTime<Utc>) -> Self {
        let expiry = match record.expiry() {
            Ok(None) => Expiry::Absent,
            Ok(Some(at)) => Expiry::At(at),
            Err(e) => {
                warn!("{}, treating token as expired", e);
                Expiry::Malformed
            }
        };

        let lookahead = Duration::seconds(EXPIRY_LOOKAHEAD_SECS);
        let (authenticated, expired, expiring_soon, expires_at) = match expiry {
            Expiry::Absent => (true, false, false, None),
            Expiry::At(at) => (now < at, at <= now, at - now <= lookahead, Some(at)),
            Expiry::Malformed => (false, true, true, None),
        };

        TokenStatus {
            authenticated: authenticated && !record.access_token.is_empty(),
            expired,
            expiring_soon,
            refreshable: record.has_refresh_token(),
            expires_at,
        }
    }
}

impl TokenRecord {
    pub fn status(&self, now: DateTime<Utc>) -> TokenStatus {
        TokenStatus::evaluate(self, now)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.status(now).expired
    }

    pub fn is_expiring_soon(&self, now: DateTime<Utc>) -> bool {
        self.status(now).expiring_soon
    }
}
