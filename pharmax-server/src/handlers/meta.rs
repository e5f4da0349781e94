use axum::{extract::State, response::Json};
use pharmax_core::{Consultation, Malady, Medicament, Patient};
use serde_json::{json, Value};
use std::sync::Arc;

use super::{storage_failure, now, HandlerError};
use crate::AppState;

/// Health check (GET /health)
///
/// Always 200: a down database is reported in the body, not as a 500, so
/// the process stays behind its load balancer in degraded mode.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    let database = match state.store.ping() {
        Ok(()) => "connected",
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            "unavailable"
        }
    };

    Json(json!({
        "status": "OK",
        "message": "PharmaX Server is running",
        "timestamp": now(),
        "database": database,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Per-collection record counts (GET /api/stats)
pub async fn stats(State(state): State<Arc<AppState>>) -> Result<Json<Value>, HandlerError> {
    let counts = state
        .store
        .count_by_collection()
        .map_err(|e| storage_failure("stats", "count", &e, "Failed to fetch stats"))?;

    let count_of = |collection: &str| {
        counts
            .iter()
            .find(|(c, _)| c == collection)
            .map(|(_, n)| *n)
            .unwrap_or(0)
    };

    Ok(Json(json!({
        "patients": count_of(Patient::COLLECTION),
        "maladies": count_of(Malady::COLLECTION),
        "medicaments": count_of(Medicament::COLLECTION),
        "consultations": count_of(Consultation::COLLECTION),
    })))
}
