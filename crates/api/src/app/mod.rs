//! HTTP application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store selection and the order service
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request DTOs and their mapping to domain inputs
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use storefront_infra::{StoreError, config::Settings};

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::AppServices;

/// Build the full HTTP router from process settings (entrypoint used by `main.rs`).
pub async fn build_app(settings: &Settings) -> Result<Router, StoreError> {
    let services = services::build_services(settings).await?;
    Ok(build_app_with_services(services, settings.jwt_secret.clone()))
}

/// Build the router around already-constructed services.
pub fn build_app_with_services(services: AppServices, jwt_secret: String) -> Router {
    let jwt = Arc::new(storefront_auth::Hs256JwtValidator::new(jwt_secret.into_bytes()));
    let auth_state = middleware::AuthState { jwt };

    // Protected routes: require a valid bearer token.
    let protected = routes::protected_router().layer(axum::middleware::from_fn_with_state(
        auth_state,
        middleware::auth_middleware,
    ));

    let api = Router::new().merge(routes::public_router()).merge(protected);

    Router::new()
        .route("/health", get(routes::system::health))
        .nest("/api/v1", api)
        .layer(Extension(Arc::new(services)))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}
