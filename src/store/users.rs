use chrono::{DateTime, Utc};
use sqlx::{Connection, SqliteConnection};

use crate::errors::{AppError, AppResult};
use crate::models::user::{DbUser, User};
use crate::store::catalog;

const NAME_TAKEN: &str = "user name already taken";

pub async fn find_by_name(conn: &mut SqliteConnection, name: &str) -> AppResult<Option<DbUser>> {
    let user = sqlx::query_as::<_, DbUser>(
        "SELECT id, name, password_hash, created_at FROM users WHERE name = ?",
    )
    .bind(name)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(user)
}

pub async fn find_by_id(conn: &mut SqliteConnection, user_id: i64) -> AppResult<Option<User>> {
    let user = sqlx::query_as::<_, DbUser>(
        "SELECT id, name, password_hash, created_at FROM users WHERE id = ?",
    )
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(user.map(User::from))
}

pub async fn get(conn: &mut SqliteConnection, user_id: i64) -> AppResult<User> {
    find_by_id(conn, user_id)
        .await?
        .ok_or_else(|| AppError::not_found("user not found"))
}

pub async fn insert(
    conn: &mut SqliteConnection,
    name: &str,
    password_hash: &str,
    created_at: DateTime<Utc>,
) -> AppResult<User> {
    let result = sqlx::query("INSERT INTO users (name, password_hash, created_at) VALUES (?, ?, ?)")
        .bind(name)
        .bind(password_hash)
        .bind(created_at)
        .execute(&mut *conn)
        .await
        .map_err(|err| AppError::from_insert(err, NAME_TAKEN))?;

    Ok(User {
        id: result.last_insert_rowid(),
        name: name.to_string(),
        created_at,
    })
}

/// Inserts a user and assigns `role_name` in one transaction, so a failed
/// assignment never leaves a role-less account behind.
pub async fn insert_with_role(
    conn: &mut SqliteConnection,
    name: &str,
    password_hash: &str,
    role_name: &str,
    created_at: DateTime<Utc>,
) -> AppResult<User> {
    let mut tx = conn.begin().await?;

    let role = catalog::find_role_by_name(&mut tx, role_name)
        .await?
        .ok_or_else(|| AppError::internal(format!("role {} is not provisioned", role_name)))?;
    let user = insert(&mut tx, name, password_hash, created_at).await?;
    catalog::assign_role(&mut tx, user.id, role.id).await?;

    tx.commit().await?;
    Ok(user)
}

/// Writes the user's name and, when given, a new password digest.
pub async fn update(
    conn: &mut SqliteConnection,
    user: &User,
    password_hash: Option<&str>,
) -> AppResult<()> {
    sqlx::query("UPDATE users SET name = ?, password_hash = COALESCE(?, password_hash) WHERE id = ?")
        .bind(&user.name)
        .bind(password_hash)
        .bind(user.id)
        .execute(&mut *conn)
        .await
        .map_err(|err| AppError::from_insert(err, NAME_TAKEN))?;

    Ok(())
}

/// Deletes the user; tokens, advertisements and role assignments go with it.
pub async fn delete(conn: &mut SqliteConnection, user_id: i64) -> AppResult<()> {
    let affected = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(user_id)
        .execute(&mut *conn)
        .await?;

    if affected.rows_affected() == 0 {
        return Err(AppError::not_found("user not found"));
    }

    Ok(())
}
