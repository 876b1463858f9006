//! Session model

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Server-side login session. The id doubles as the bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Session ID (token)
    pub id: String,
    /// Associated user ID
    pub user_id: i64,
    /// Expiration timestamp
    pub expires_at: DateTime<Utc>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Issue a fresh session for `user_id` that lives for `lifetime`
    pub fn issue(user_id: i64, lifetime: Duration) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id,
            expires_at: now + lifetime,
            created_at: now,
        }
    }

    /// Check if the session has expired
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_sets_lifetime() {
        let session = Session::issue(3, Duration::days(7));
        assert_eq!(session.user_id, 3);
        assert!(!session.is_expired());
        assert!(session.expires_at - session.created_at == Duration::days(7));
    }

    #[test]
    fn test_issued_tokens_are_unique() {
        let a = Session::issue(1, Duration::days(1));
        let b = Session::issue(1, Duration::days(1));
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_negative_lifetime_is_expired() {
        let session = Session::issue(1, Duration::seconds(-1));
        assert!(session.is_expired());
    }
}
