use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::errors::AppResult;
use crate::models::token::Token;

pub async fn insert(
    conn: &mut SqliteConnection,
    user_id: i64,
    created_at: DateTime<Utc>,
) -> AppResult<Token> {
    let token = Uuid::new_v4();

    let result = sqlx::query("INSERT INTO tokens (token, user_id, created_at) VALUES (?, ?, ?)")
        .bind(token)
        .bind(user_id)
        .bind(created_at)
        .execute(&mut *conn)
        .await?;

    Ok(Token {
        id: result.last_insert_rowid(),
        token,
        user_id,
        created_at,
    })
}

pub async fn find(conn: &mut SqliteConnection, token: Uuid) -> AppResult<Option<Token>> {
    let token = sqlx::query_as::<_, Token>(
        "SELECT id, token, user_id, created_at FROM tokens WHERE token = ?",
    )
    .bind(token)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(token)
}
