use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::Json,
};
use pharmax_core::{validate, Consultation, Malady, Medicament, Patient};
use pharmax_store::FieldFilter;
use serde_json::{json, Value};
use std::sync::Arc;

use super::{
    not_found, now, resolve_reference, storage_failure, str_of, validation_failure,
    HandlerError,
};
use crate::AppState;

/// Attach the projected patient, malady and medicament to a consultation
/// document.
fn with_references(state: &AppState, mut doc: Value) -> Value {
    let patient_id = str_of(&doc, "patientId").to_string();
    let malady_id = str_of(&doc, "maladyId").to_string();
    let medicament_id = str_of(&doc, "medicamentId").to_string();

    doc["patient"] = resolve_reference(
        &state.store,
        Patient::COLLECTION,
        &patient_id,
        &["firstName", "lastName", "email"],
    );
    doc["malady"] = resolve_reference(
        &state.store,
        Malady::COLLECTION,
        &malady_id,
        &["maladyName"],
    );
    doc["medicament"] = resolve_reference(
        &state.store,
        Medicament::COLLECTION,
        &medicament_id,
        &["medicamentName"],
    );
    doc
}

/// List all consultations, fully resolved (GET /api/consultations)
pub async fn list(State(state): State<Arc<AppState>>) -> Result<Json<Value>, HandlerError> {
    let consultations = state
        .store
        .find_many(Consultation::COLLECTION, None)
        .map_err(|e| storage_failure("consultation", "list", &e, "Failed to fetch consultations"))?;

    let consultations: Vec<Value> = consultations
        .into_iter()
        .map(|doc| with_references(&state, doc))
        .collect();

    Ok(Json(json!({
        "consultations": consultations,
        "count": consultations.len()
    })))
}

/// List consultations for one patient
/// (GET /api/consultations/patient/{patient_id})
pub async fn list_by_patient(
    State(state): State<Arc<AppState>>,
    Path(patient_id): Path<String>,
) -> Result<Json<Value>, HandlerError> {
    let filter = FieldFilter {
        field: "patientId",
        value: &patient_id,
    };
    let consultations = state
        .store
        .find_many(Consultation::COLLECTION, Some(filter))
        .map_err(|e| {
            storage_failure("consultation", "list_by_patient", &e, "Failed to fetch consultations")
        })?;

    let consultations: Vec<Value> = consultations
        .into_iter()
        .map(|doc| with_references(&state, doc))
        .collect();

    Ok(Json(json!({
        "consultations": consultations,
        "count": consultations.len()
    })))
}

/// Create a consultation (POST /api/consultations)
pub async fn create(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), HandlerError> {
    let body = body.map(|Json(v)| v).unwrap_or(Value::Null);
    let input =
        validate::consultation_input(&body).map_err(|e| validation_failure("consultation", e))?;

    let created_at = now();
    let consultation = Consultation {
        id: uuid::Uuid::new_v4().to_string(),
        patient_id: input.patient_id,
        malady_id: input.malady_id,
        medicament_id: input.medicament_id,
        date: input.date.unwrap_or_else(|| created_at.clone()),
        notes: input.notes,
        is_deleted: false,
        created_at: created_at.clone(),
        updated_at: created_at.clone(),
    };

    let doc = serde_json::to_value(&consultation).map_err(|e| {
        storage_failure("consultation", "create", &e.into(), "Failed to create consultation")
    })?;

    state
        .store
        .insert(Consultation::COLLECTION, &consultation.id, None, &created_at, &doc)
        .map_err(|e| {
            storage_failure("consultation", "create", &e, "Failed to create consultation")
        })?;

    tracing::info!(id = %consultation.id, "consultation created");
    let resolved = with_references(&state, doc);
    Ok((StatusCode::CREATED, Json(json!({"consultation": resolved}))))
}

/// Delete a consultation, echoing the deleted record
/// (DELETE /api/consultations/{id})
pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, HandlerError> {
    let existing = state
        .store
        .find_by_id(Consultation::COLLECTION, &id)
        .map_err(|e| storage_failure("consultation", "delete", &e, "Failed to delete consultation"))?;

    let Some(mut doc) = existing else {
        return Err(not_found("Consultation not found"));
    };

    match state.store.soft_delete(Consultation::COLLECTION, &id) {
        Ok(true) => {
            tracing::info!(id = %id, "consultation deleted");
            doc["isDeleted"] = json!(true);
            Ok(Json(json!({
                "message": "Consultation deleted successfully",
                "consultation": doc
            })))
        }
        Ok(false) => Err(not_found("Consultation not found")),
        Err(e) => Err(storage_failure("consultation", "delete", &e, "Failed to delete consultation")),
    }
}
