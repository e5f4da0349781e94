//! PharmaX - medical records REST backend
//!
//! Patients, maladies, medicaments and consultations over a SQLite-backed
//! document store.

pub mod config;
pub mod handlers;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{delete, get},
    Router,
};
use pharmax_store::DocumentStore;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

/// Application state
pub struct AppState {
    pub store: DocumentStore,
    pub config: config::ServerConfig,
}

/// CORS for the configured frontend origin. Preflight requests are answered
/// by the layer itself and never reach a handler.
fn cors_layer(config: &config::ServerConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    match config.cors.frontend_origin.parse::<HeaderValue>() {
        Ok(origin) => cors.allow_origin(origin),
        Err(_) => {
            tracing::warn!(
                origin = %config.cors.frontend_origin,
                "invalid frontend origin, allowing any origin"
            );
            cors.allow_origin(Any)
        }
    }
}

/// Build the application router with all routes and middleware
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        // Health check and stats
        .route("/health", get(handlers::meta::health))
        .route("/api/stats", get(handlers::meta::stats))
        // Patients
        .route(
            "/api/patients",
            get(handlers::patients::list).post(handlers::patients::create),
        )
        .route("/api/patients/{id}", get(handlers::patients::get))
        // Maladies
        .route(
            "/api/maladies",
            get(handlers::maladies::list).post(handlers::maladies::create),
        )
        .route("/api/maladies/{id}", delete(handlers::maladies::delete))
        // Medicaments (the by-malady route must come before {id})
        .route(
            "/api/medicaments",
            get(handlers::medicaments::list).post(handlers::medicaments::create),
        )
        .route(
            "/api/medicaments/malady/{malady_id}",
            get(handlers::medicaments::list_by_malady),
        )
        .route("/api/medicaments/{id}", delete(handlers::medicaments::delete))
        // Consultations
        .route(
            "/api/consultations",
            get(handlers::consultations::list).post(handlers::consultations::create),
        )
        .route(
            "/api/consultations/patient/{patient_id}",
            get(handlers::consultations::list_by_patient),
        )
        .route(
            "/api/consultations/{id}",
            delete(handlers::consultations::delete),
        )
        // Middleware
        .layer(RequestBodyLimitLayer::new(1024 * 1024)) // 1MB
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
