use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::app::AppState;
use crate::authz::{Action, ProtectedEntity};
use crate::db::DbSession;
use crate::errors::AppResult;
use crate::models::advertisement::{IdResponse, StatusResponse};
use crate::models::user::{CreateUserRequest, UpdateUserRequest, UserResponse};
use crate::store::users;
use crate::token::Authenticated;
use crate::utils::{hash_password, utc_now, validate_name, validate_password};

#[utoipa::path(
    post,
    path = "/user",
    tag = "Users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = IdResponse),
        (status = 400, description = "Name or password rejected"),
        (status = 409, description = "Name already taken")
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    DbSession(mut conn): DbSession,
    Json(payload): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<IdResponse>)> {
    validate_name(&payload.name)?;
    validate_password(&payload.password)?;
    let password_hash = hash_password(&payload.password)?;

    let user = users::insert_with_role(
        &mut conn,
        &payload.name,
        &password_hash,
        &state.auth.default_role,
        utc_now(),
    )
    .await?;

    tracing::info!(user_id = user.id, "user registered");
    Ok((StatusCode::CREATED, Json(IdResponse { id: user.id })))
}

#[utoipa::path(
    get,
    path = "/user/{id}",
    tag = "Users",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "User", body = UserResponse),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(DbSession(mut conn): DbSession, Path(id): Path<i64>) -> AppResult<Json<UserResponse>> {
    let user = users::get(&mut conn, id).await?;
    Ok(Json(user.into()))
}

#[utoipa::path(
    patch,
    path = "/user/{id}",
    tag = "Users",
    params(("id" = i64, Path, description = "User id")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = IdResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Access denied"),
        (status = 404, description = "User not found")
    ),
    security(("token" = []))
)]
pub async fn update_user(
    State(state): State<AppState>,
    Authenticated { user: actor, mut conn }: Authenticated,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateUserRequest>,
) -> AppResult<Json<IdResponse>> {
    let mut target = users::get(&mut conn, id).await?;
    state
        .authorizer
        .require(&mut *conn, &actor, ProtectedEntity::User(&target), Action::Write)
        .await?;

    if let Some(name) = payload.name.as_deref() {
        validate_name(name)?;
    }
    let password_hash = match payload.password.as_deref() {
        Some(password) => {
            validate_password(password)?;
            Some(hash_password(password)?)
        }
        None => None,
    };
    if let Some(name) = payload.name {
        target.name = name;
    }

    users::update(&mut conn, &target, password_hash.as_deref()).await?;
    Ok(Json(IdResponse { id: target.id }))
}

#[utoipa::path(
    delete,
    path = "/user/{id}",
    tag = "Users",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "User deleted", body = StatusResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Access denied"),
        (status = 404, description = "User not found")
    ),
    security(("token" = []))
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Authenticated { user: actor, mut conn }: Authenticated,
    Path(id): Path<i64>,
) -> AppResult<Json<StatusResponse>> {
    let target = users::get(&mut conn, id).await?;
    state
        .authorizer
        .require(&mut *conn, &actor, ProtectedEntity::User(&target), Action::Write)
        .await?;

    users::delete(&mut conn, target.id).await?;
    tracing::info!(user_id = target.id, actor_id = actor.id, "user deleted");
    Ok(Json(StatusResponse::success()))
}
