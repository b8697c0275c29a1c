use axum::extract::{Path, Query, RawQuery, State};
use axum::http::StatusCode;
use axum::Json;

use crate::app::AppState;
use crate::authz::{Action, ProtectedEntity};
use crate::db::DbSession;
use crate::errors::AppResult;
use crate::models::advertisement::{
    Advertisement, AdvertisementFilter, CreateAdvertisementRequest, IdResponse, StatusResponse,
    UpdateAdvertisementRequest,
};
use crate::store::advertisements;
use crate::token::Authenticated;
use crate::utils::utc_now;

/// Searches advertisements by exactly one `field=value` query parameter.
#[utoipa::path(
    get,
    path = "/advertisement",
    tag = "Advertisements",
    responses(
        (status = 200, description = "Matching advertisements", body = [Advertisement]),
        (status = 400, description = "Malformed, unknown or more than one query parameter")
    )
)]
pub async fn search_advertisements(
    DbSession(mut conn): DbSession,
    RawQuery(raw_query): RawQuery,
    Query(params): Query<Vec<(String, String)>>,
) -> AppResult<Json<Vec<Advertisement>>> {
    let filter = AdvertisementFilter::from_query(raw_query.as_deref(), &params)?;
    let ads = advertisements::search(&mut conn, &filter).await?;
    Ok(Json(ads))
}

#[utoipa::path(
    get,
    path = "/advertisement/{id}",
    tag = "Advertisements",
    params(("id" = i64, Path, description = "Advertisement id")),
    responses(
        (status = 200, description = "Advertisement", body = Advertisement),
        (status = 404, description = "Advertisement not found")
    )
)]
pub async fn get_advertisement(
    DbSession(mut conn): DbSession,
    Path(id): Path<i64>,
) -> AppResult<Json<Advertisement>> {
    let ad = advertisements::get(&mut conn, id).await?;
    Ok(Json(ad))
}

#[utoipa::path(
    post,
    path = "/advertisement",
    tag = "Advertisements",
    request_body = CreateAdvertisementRequest,
    responses(
        (status = 201, description = "Advertisement created", body = IdResponse),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("token" = []))
)]
pub async fn create_advertisement(
    Authenticated { user, mut conn }: Authenticated,
    Json(payload): Json<CreateAdvertisementRequest>,
) -> AppResult<(StatusCode, Json<IdResponse>)> {
    payload.validate()?;
    let ad = advertisements::insert(&mut conn, user.id, &payload, utc_now()).await?;
    Ok((StatusCode::CREATED, Json(IdResponse { id: ad.id })))
}

#[utoipa::path(
    patch,
    path = "/advertisement/{id}",
    tag = "Advertisements",
    params(("id" = i64, Path, description = "Advertisement id")),
    request_body = UpdateAdvertisementRequest,
    responses(
        (status = 200, description = "Advertisement updated", body = IdResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Access denied"),
        (status = 404, description = "Advertisement not found")
    ),
    security(("token" = []))
)]
pub async fn update_advertisement(
    State(state): State<AppState>,
    Authenticated { user, mut conn }: Authenticated,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateAdvertisementRequest>,
) -> AppResult<Json<IdResponse>> {
    let mut ad = advertisements::get(&mut conn, id).await?;
    state
        .authorizer
        .require(&mut *conn, &user, ProtectedEntity::Advertisement(&ad), Action::Write)
        .await?;

    payload.apply_to(&mut ad)?;
    advertisements::update(&mut conn, &ad).await?;
    Ok(Json(IdResponse { id: ad.id }))
}

#[utoipa::path(
    delete,
    path = "/advertisement/{id}",
    tag = "Advertisements",
    params(("id" = i64, Path, description = "Advertisement id")),
    responses(
        (status = 200, description = "Advertisement deleted", body = StatusResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Access denied"),
        (status = 404, description = "Advertisement not found")
    ),
    security(("token" = []))
)]
pub async fn delete_advertisement(
    State(state): State<AppState>,
    Authenticated { user, mut conn }: Authenticated,
    Path(id): Path<i64>,
) -> AppResult<Json<StatusResponse>> {
    let ad = advertisements::get(&mut conn, id).await?;
    state
        .authorizer
        .require(&mut *conn, &user, ProtectedEntity::Advertisement(&ad), Action::Write)
        .await?;

    advertisements::delete(&mut conn, ad.id).await?;
    Ok(Json(StatusResponse::success()))
}
