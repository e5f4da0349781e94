use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::Json,
};
use pharmax_core::{validate, Malady, Medicament};
use pharmax_store::StoreError;
use serde_json::{json, Value};
use std::sync::Arc;

use super::{
    error_body, not_found, now, storage_failure, validation_failure, HandlerError,
};
use crate::AppState;

/// List all maladies (GET /api/maladies)
pub async fn list(State(state): State<Arc<AppState>>) -> Result<Json<Value>, HandlerError> {
    let maladies = state
        .store
        .find_many(Malady::COLLECTION, None)
        .map_err(|e| storage_failure("malady", "list", &e, "Failed to fetch maladies"))?;

    Ok(Json(json!({"maladies": maladies, "count": maladies.len()})))
}

/// Create a malady (POST /api/maladies)
pub async fn create(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), HandlerError> {
    let body = body.map(|Json(v)| v).unwrap_or(Value::Null);
    let input = validate::malady_input(&body).map_err(|e| validation_failure("malady", e))?;

    let created_at = now();
    let malady = Malady {
        id: uuid::Uuid::new_v4().to_string(),
        malady_name: input.malady_name,
        is_deleted: false,
        created_at: created_at.clone(),
        updated_at: created_at.clone(),
    };

    let doc = serde_json::to_value(&malady)
        .map_err(|e| storage_failure("malady", "create", &e.into(), "Failed to create malady"))?;

    match state.store.insert(
        Malady::COLLECTION,
        &malady.id,
        Some(&malady.malady_name),
        &created_at,
        &doc,
    ) {
        Ok(()) => {
            tracing::info!(id = %malady.id, "malady created");
            Ok((StatusCode::CREATED, Json(json!({"malady": doc}))))
        }
        Err(StoreError::Duplicate { .. }) => {
            Err((StatusCode::BAD_REQUEST, error_body("Malady already exists")))
        }
        Err(e) => Err(storage_failure("malady", "create", &e, "Failed to create malady")),
    }
}

/// Delete a malady and every medicament referencing it
/// (DELETE /api/maladies/{id})
///
/// Both marks happen in one SQLite transaction, so the cascade can never
/// leave a malady deleted with its medicaments still live.
pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, HandlerError> {
    let result = state.store.in_transaction(|ops| {
        if !ops.soft_delete(Malady::COLLECTION, &id)? {
            return Ok(None);
        }
        let cascaded = ops.soft_delete_where(Medicament::COLLECTION, "maladyId", &id)?;
        Ok(Some(cascaded))
    });

    match result {
        Ok(Some(cascaded)) => {
            tracing::info!(id = %id, cascaded, "malady deleted");
            Ok(Json(json!({
                "message": "Malady and associated medicaments deleted successfully"
            })))
        }
        Ok(None) => Err(not_found("Malady not found")),
        Err(e) => Err(storage_failure("malady", "delete", &e, "Failed to delete malady")),
    }
}
