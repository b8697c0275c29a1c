use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use chrono::{DateTime, Duration, Utc};
use sqlx::pool::PoolConnection;
use sqlx::{Sqlite, SqliteConnection};
use uuid::Uuid;

use crate::app::AppState;
use crate::config::AuthConfig;
use crate::errors::{AppError, AppResult};
use crate::models::token::Token;
use crate::models::user::User;
use crate::store;
use crate::utils::utc_now;

/// Header carrying the bearer token.
pub const TOKEN_HEADER: &str = "x-token";

/// Issues opaque session tokens and resolves them back to users.
#[derive(Debug, Clone)]
pub struct TokenService {
    ttl: Duration,
}

impl TokenService {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(config.token_ttl)
    }

    pub async fn issue(&self, conn: &mut SqliteConnection, user_id: i64) -> AppResult<Token> {
        self.issue_at(conn, user_id, utc_now()).await
    }

    pub async fn issue_at(
        &self,
        conn: &mut SqliteConnection,
        user_id: i64,
        created_at: DateTime<Utc>,
    ) -> AppResult<Token> {
        let token = store::tokens::insert(conn, user_id, created_at).await?;
        tracing::debug!(user_id, token_id = token.id, "token issued");
        Ok(token)
    }

    pub async fn resolve(&self, conn: &mut SqliteConnection, raw: &str) -> AppResult<User> {
        self.resolve_at(conn, raw, utc_now()).await
    }

    /// Resolves `raw` to its user as of `now`. Malformed, unknown and expired
    /// tokens all fail with the same `Unauthenticated` error.
    pub async fn resolve_at(
        &self,
        conn: &mut SqliteConnection,
        raw: &str,
        now: DateTime<Utc>,
    ) -> AppResult<User> {
        let value = Uuid::parse_str(raw.trim()).map_err(|_| AppError::unauthenticated())?;

        let token = store::tokens::find(conn, value)
            .await?
            .filter(|token| token.is_live_at(now, self.ttl))
            .ok_or_else(AppError::unauthenticated)?;

        store::users::find_by_id(conn, token.user_id)
            .await?
            .ok_or_else(AppError::unauthenticated)
    }
}

/// An authenticated request: the caller's user plus the request's own
/// storage connection, acquired once and released when the request ends.
pub struct Authenticated {
    pub user: User,
    pub conn: PoolConnection<Sqlite>,
}

#[async_trait]
impl FromRequestParts<AppState> for Authenticated {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(TOKEN_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(AppError::unauthenticated)?;

        let mut conn = state.pool.acquire().await?;
        let user = state.tokens.resolve(&mut conn, raw).await?;

        Ok(Authenticated { user, conn })
    }
}
