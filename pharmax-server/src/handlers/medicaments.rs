use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::Json,
};
use pharmax_core::{validate, Malady, Medicament};
use pharmax_store::FieldFilter;
use serde_json::{json, Value};
use std::sync::Arc;

use super::{
    not_found, now, resolve_reference, storage_failure, str_of, validation_failure,
    HandlerError,
};
use crate::AppState;

/// Attach the projected malady to a medicament document.
fn with_malady(state: &AppState, mut doc: Value) -> Value {
    let malady_id = str_of(&doc, "maladyId").to_string();
    doc["malady"] = resolve_reference(
        &state.store,
        Malady::COLLECTION,
        &malady_id,
        &["maladyName"],
    );
    doc
}

/// List all medicaments with their malady resolved (GET /api/medicaments)
pub async fn list(State(state): State<Arc<AppState>>) -> Result<Json<Value>, HandlerError> {
    let medicaments = state
        .store
        .find_many(Medicament::COLLECTION, None)
        .map_err(|e| storage_failure("medicament", "list", &e, "Failed to fetch medicaments"))?;

    let medicaments: Vec<Value> = medicaments
        .into_iter()
        .map(|doc| with_malady(&state, doc))
        .collect();

    Ok(Json(json!({"medicaments": medicaments, "count": medicaments.len()})))
}

/// List medicaments for one malady (GET /api/medicaments/malady/{malady_id})
pub async fn list_by_malady(
    State(state): State<Arc<AppState>>,
    Path(malady_id): Path<String>,
) -> Result<Json<Value>, HandlerError> {
    let filter = FieldFilter {
        field: "maladyId",
        value: &malady_id,
    };
    let medicaments = state
        .store
        .find_many(Medicament::COLLECTION, Some(filter))
        .map_err(|e| storage_failure("medicament", "list_by_malady", &e, "Failed to fetch medicaments"))?;

    let medicaments: Vec<Value> = medicaments
        .into_iter()
        .map(|doc| with_malady(&state, doc))
        .collect();

    Ok(Json(json!({"medicaments": medicaments, "count": medicaments.len()})))
}

/// Create a medicament (POST /api/medicaments)
///
/// The malady reference is required but its existence is not checked, so a
/// dangling reference is accepted and later resolves to null.
pub async fn create(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), HandlerError> {
    let body = body.map(|Json(v)| v).unwrap_or(Value::Null);
    let input =
        validate::medicament_input(&body).map_err(|e| validation_failure("medicament", e))?;

    let created_at = now();
    let medicament = Medicament {
        id: uuid::Uuid::new_v4().to_string(),
        medicament_name: input.medicament_name,
        malady_id: input.malady_id,
        is_deleted: false,
        created_at: created_at.clone(),
        updated_at: created_at.clone(),
    };

    let doc = serde_json::to_value(&medicament).map_err(|e| {
        storage_failure("medicament", "create", &e.into(), "Failed to create medicament")
    })?;

    state
        .store
        .insert(Medicament::COLLECTION, &medicament.id, None, &created_at, &doc)
        .map_err(|e| storage_failure("medicament", "create", &e, "Failed to create medicament"))?;

    tracing::info!(id = %medicament.id, "medicament created");
    Ok((StatusCode::CREATED, Json(json!({"medicament": doc}))))
}

/// Delete a medicament (DELETE /api/medicaments/{id})
pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, HandlerError> {
    match state.store.soft_delete(Medicament::COLLECTION, &id) {
        Ok(true) => {
            tracing::info!(id = %id, "medicament deleted");
            Ok(Json(json!({"message": "Medicament deleted successfully"})))
        }
        Ok(false) => Err(not_found("Medicament not found")),
        Err(e) => Err(storage_failure("medicament", "delete", &e, "Failed to delete medicament")),
    }
}
