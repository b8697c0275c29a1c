use chrono::{DateTime, Duration, Utc};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Token {
    pub id: i64,
    pub token: Uuid,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}

impl Token {
    /// A token stays valid while `now - created_at <= ttl`.
    pub fn is_live_at(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        self.created_at >= now - ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_created_at(created_at: DateTime<Utc>) -> Token {
        Token {
            id: 1,
            token: Uuid::new_v4(),
            user_id: 1,
            created_at,
        }
    }

    #[test]
    fn liveness_is_inclusive_at_the_ttl_boundary() {
        let created = Utc::now();
        let token = token_created_at(created);
        let ttl = Duration::seconds(3600);

        assert!(token.is_live_at(created, ttl));
        assert!(token.is_live_at(created + ttl, ttl));
        assert!(!token.is_live_at(created + ttl + Duration::milliseconds(1), ttl));
    }
}
