use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::Json,
};
use pharmax_core::{validate, Patient};
use pharmax_store::StoreError;
use serde_json::{json, Value};
use std::sync::Arc;

use super::{
    error_body, not_found, now, storage_failure, validation_failure, HandlerError,
};
use crate::AppState;

/// List all patients (GET /api/patients)
pub async fn list(State(state): State<Arc<AppState>>) -> Result<Json<Value>, HandlerError> {
    let patients = state
        .store
        .find_many(Patient::COLLECTION, None)
        .map_err(|e| storage_failure("patient", "list", &e, "Failed to fetch patients"))?;

    Ok(Json(json!({"patients": patients, "count": patients.len()})))
}

/// Look up a single patient (GET /api/patients/{id})
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, HandlerError> {
    match state.store.find_by_id(Patient::COLLECTION, &id) {
        Ok(Some(patient)) => Ok(Json(json!({"patient": patient}))),
        Ok(None) => Err(not_found("Patient not found")),
        Err(e) => Err(storage_failure("patient", "get", &e, "Failed to fetch patient")),
    }
}

/// Create a patient (POST /api/patients)
pub async fn create(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), HandlerError> {
    // A missing or malformed body falls through to field validation.
    let body = body.map(|Json(v)| v).unwrap_or(Value::Null);
    let input = validate::patient_input(&body).map_err(|e| validation_failure("patient", e))?;

    let created_at = now();
    let patient = Patient {
        id: uuid::Uuid::new_v4().to_string(),
        first_name: input.first_name,
        last_name: input.last_name,
        email: input.email,
        is_deleted: false,
        created_at: created_at.clone(),
        updated_at: created_at.clone(),
    };

    let doc = serde_json::to_value(&patient)
        .map_err(|e| storage_failure("patient", "create", &e.into(), "Failed to create patient"))?;

    match state.store.insert(
        Patient::COLLECTION,
        &patient.id,
        Some(&patient.email),
        &created_at,
        &doc,
    ) {
        Ok(()) => {
            tracing::info!(id = %patient.id, "patient created");
            Ok((StatusCode::CREATED, Json(json!({"patient": doc}))))
        }
        Err(StoreError::Duplicate { .. }) => {
            Err((StatusCode::BAD_REQUEST, error_body("Email already exists")))
        }
        Err(e) => Err(storage_failure("patient", "create", &e, "Failed to create patient")),
    }
}
