//! Login session

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Lifetime of a login session
pub const SESSION_TTL_DAYS: i64 = 7;

/// Session row backing a bearer token or `session` cookie
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Opaque token handed to the client
    pub id: String,
    pub profile_id: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Start a fresh session for a profile
    pub fn start(profile_id: &str) -> Self {
        let now = Utc::now();
        Self {
            id: format!("{}{}", uuid::Uuid::new_v4().simple(), uuid::Uuid::new_v4().simple()),
            profile_id: profile_id.to_string(),
            expires_at: now + Duration::days(SESSION_TTL_DAYS),
            created_at: now,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_session() {
        let session = Session::start("p1");
        assert_eq!(session.id.len(), 64);
        assert_eq!(session.profile_id, "p1");
        assert!(!session.is_expired());
        assert_eq!((session.expires_at - session.created_at).num_days(), SESSION_TTL_DAYS);
    }

    #[test]
    fn test_expired_session() {
        let mut session = Session::start("p1");
        session.expires_at = Utc::now() - Duration::seconds(1);
        assert!(session.is_expired());
    }
}
