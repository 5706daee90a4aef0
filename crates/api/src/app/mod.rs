//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store, directory, recorder and aggregator wiring
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: query DTOs and their mapping to domain filters
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use crate::config::ApiConfig;
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

use services::{AppServices, ServiceError};

/// Per-process HTTP limits handed to handlers.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct HttpLimits {
    pub max_page_limit: u32,
}

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub async fn build_app(config: &ApiConfig) -> Result<Router, ServiceError> {
    let services = Arc::new(AppServices::from_config(config).await?);
    Ok(build_app_with(config, services))
}

/// Build the router around already-wired services.
pub fn build_app_with(config: &ApiConfig, services: Arc<AppServices>) -> Router {
    let jwt = Arc::new(campus_auth::Hs256JwtValidator::new(
        config.jwt_secret.clone().into_bytes(),
    ));
    let auth_state = middleware::AuthState { jwt };
    let limits = HttpLimits {
        max_page_limit: config.max_page_limit,
    };

    // Protected routes: require a valid bearer token.
    let protected = routes::router().layer(
        ServiceBuilder::new()
            .layer(Extension(services))
            .layer(Extension(limits))
            .layer(axum::middleware::from_fn_with_state(
                auth_state,
                middleware::auth_middleware,
            )),
    );

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(protected)
}
