use axum::extract::State;
use axum::Json;

use crate::app::AppState;
use crate::db::DbSession;
use crate::errors::{AppError, AppResult};
use crate::models::user::{LoginRequest, LoginResponse};
use crate::store::users;
use crate::utils::verify_password;

#[utoipa::path(
    post,
    path = "/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    DbSession(mut conn): DbSession,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let db_user = users::find_by_name(&mut conn, &payload.name)
        .await?
        .ok_or_else(invalid_credentials)?;

    if !verify_password(&payload.password, &db_user.password_hash)? {
        return Err(invalid_credentials());
    }

    let token = state.tokens.issue(&mut conn, db_user.id).await?;
    Ok(Json(LoginResponse { token: token.token }))
}

fn invalid_credentials() -> AppError {
    AppError::Unauthenticated("user or password is incorrect".to_string())
}
