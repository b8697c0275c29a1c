use axum::Router;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::models;
use crate::routes;
use crate::token::TOKEN_HEADER;

#[derive(OpenApi)]
#[openapi(
	paths(
		routes::auth::login,
		routes::users::create_user,
		routes::users::get_user,
		routes::users::update_user,
		routes::users::delete_user,
		routes::advertisements::search_advertisements,
		routes::advertisements::get_advertisement,
		routes::advertisements::create_advertisement,
		routes::advertisements::update_advertisement,
		routes::advertisements::delete_advertisement,
		routes::health::health
	),
	components(
		schemas(
			models::user::CreateUserRequest,
			models::user::UpdateUserRequest,
			models::user::UserResponse,
			models::user::LoginRequest,
			models::user::LoginResponse,
			models::advertisement::Advertisement,
			models::advertisement::CreateAdvertisementRequest,
			models::advertisement::UpdateAdvertisementRequest,
			models::advertisement::IdResponse,
			models::advertisement::StatusResponse,
			routes::health::HealthResponse
		)
	),
	modifiers(&TokenSecurity),
	tags(
		(name = "Auth", description = "Token issuance"),
		(name = "Users", description = "User accounts"),
		(name = "Advertisements", description = "Listings"),
		(name = "Health", description = "Liveness")
	)
)]
pub struct ApiDoc;

/// Registers the `x-token` header scheme referenced by protected operations.
struct TokenSecurity;

impl Modify for TokenSecurity {
	fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
		if let Some(components) = openapi.components.as_mut() {
			components.add_security_scheme(
				"token",
				SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(TOKEN_HEADER))),
			);
		}
	}
}

pub fn build_openapi() -> utoipa::openapi::OpenApi {
	ApiDoc::openapi()
}

pub fn swagger_routes() -> Router {
	Router::new().merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", build_openapi()))
}
