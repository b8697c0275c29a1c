use std::sync::Arc;

use axum::http::Method;
use axum::routing::{get, post};
use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::authz::Authorizer;
use crate::config::AuthConfig;
use crate::docs;
use crate::routes::{advertisements, auth, health, users};
use crate::token::TokenService;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub auth: Arc<AuthConfig>,
    pub tokens: TokenService,
    pub authorizer: Authorizer,
}

impl AppState {
    pub fn new(pool: SqlitePool, auth: AuthConfig) -> Self {
        Self {
            pool,
            tokens: TokenService::from_config(&auth),
            authorizer: Authorizer::from_config(&auth),
            auth: Arc::new(auth),
        }
    }
}

pub fn create_app(pool: SqlitePool, auth: AuthConfig) -> Router {
    let state = AppState::new(pool, auth);

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE, Method::OPTIONS])
        .allow_origin(Any)
        .allow_headers(Any);

    let user_routes = Router::new()
        .route("/", post(users::create_user))
        .route(
            "/:id",
            get(users::get_user)
                .patch(users::update_user)
                .delete(users::delete_user),
        );

    let advertisement_routes = Router::new()
        .route(
            "/",
            get(advertisements::search_advertisements).post(advertisements::create_advertisement),
        )
        .route(
            "/:id",
            get(advertisements::get_advertisement)
                .patch(advertisements::update_advertisement)
                .delete(advertisements::delete_advertisement),
        );

    Router::new()
        .route("/login", post(auth::login))
        .route("/api/health", get(health::health))
        .nest("/user", user_routes)
        .nest("/advertisement", advertisement_routes)
        .with_state(state)
        .merge(docs::swagger_routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
