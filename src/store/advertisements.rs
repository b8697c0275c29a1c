use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use crate::errors::{AppError, AppResult};
use crate::models::advertisement::{
    Advertisement, AdvertisementFilter, CreateAdvertisementRequest, SearchValue,
};

const COLUMNS: &str = "id, title, description, price, user_id, created_at";

pub async fn get(conn: &mut SqliteConnection, id: i64) -> AppResult<Advertisement> {
    let sql = format!("SELECT {} FROM advertisements WHERE id = ?", COLUMNS);
    sqlx::query_as::<_, Advertisement>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::not_found("advertisement not found"))
}

pub async fn insert(
    conn: &mut SqliteConnection,
    user_id: i64,
    payload: &CreateAdvertisementRequest,
    created_at: DateTime<Utc>,
) -> AppResult<Advertisement> {
    let result = sqlx::query(
        "INSERT INTO advertisements (title, description, price, user_id, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&payload.title)
    .bind(&payload.description)
    .bind(payload.price)
    .bind(user_id)
    .bind(created_at)
    .execute(&mut *conn)
    .await?;

    Ok(Advertisement {
        id: result.last_insert_rowid(),
        title: payload.title.clone(),
        description: payload.description.clone(),
        price: payload.price,
        user_id,
        created_at,
    })
}

pub async fn update(conn: &mut SqliteConnection, ad: &Advertisement) -> AppResult<()> {
    sqlx::query("UPDATE advertisements SET title = ?, description = ?, price = ? WHERE id = ?")
        .bind(&ad.title)
        .bind(&ad.description)
        .bind(ad.price)
        .bind(ad.id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

pub async fn delete(conn: &mut SqliteConnection, id: i64) -> AppResult<()> {
    let affected = sqlx::query("DELETE FROM advertisements WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    if affected.rows_affected() == 0 {
        return Err(AppError::not_found("advertisement not found"));
    }

    Ok(())
}

pub async fn search(
    conn: &mut SqliteConnection,
    filter: &AdvertisementFilter,
) -> AppResult<Vec<Advertisement>> {
    let sql = format!(
        "SELECT {} FROM advertisements WHERE {} = ? ORDER BY id",
        COLUMNS,
        filter.field.column()
    );

    let query = sqlx::query_as::<_, Advertisement>(&sql);
    let query = match &filter.value {
        SearchValue::Integer(value) => query.bind(*value),
        SearchValue::Real(value) => query.bind(*value),
        SearchValue::Text(value) => query.bind(value.as_str()),
        SearchValue::Timestamp(value) => query.bind(*value),
    };

    Ok(query.fetch_all(&mut *conn).await?)
}
