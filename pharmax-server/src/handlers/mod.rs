pub mod consultations;
pub mod maladies;
pub mod medicaments;
pub mod meta;
pub mod patients;

use axum::{http::StatusCode, response::Json};
use pharmax_store::{DocumentStore, StoreError};
use serde_json::{json, Value};

/// Error responses carry a stable `{"error": "..."}` body.
pub type HandlerError = (StatusCode, Json<Value>);

pub fn error_body(message: impl Into<String>) -> Json<Value> {
    Json(json!({"error": message.into()}))
}

/// Log a persistence failure with its context and return the generic 500.
/// The underlying error never reaches the client.
pub fn storage_failure(
    entity: &str,
    operation: &str,
    err: &StoreError,
    message: &str,
) -> HandlerError {
    tracing::error!(entity, operation, error = %err, "storage operation failed");
    (StatusCode::INTERNAL_SERVER_ERROR, error_body(message))
}

pub fn validation_failure(entity: &str, err: pharmax_core::ValidationError) -> HandlerError {
    tracing::warn!(entity, field = err.field, "validation failed: {}", err.message);
    (StatusCode::BAD_REQUEST, error_body(err.message))
}

pub fn not_found(message: &str) -> HandlerError {
    (StatusCode::NOT_FOUND, error_body(message))
}

/// Current instant, RFC 3339, used for ids' timestamps and default dates.
pub fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Explicit join step: look up a referenced document and project its `id`
/// plus the given display fields. A dangling or unreadable reference
/// resolves to null instead of failing the surrounding request.
pub fn resolve_reference(
    store: &DocumentStore,
    collection: &str,
    id: &str,
    fields: &[&str],
) -> Value {
    match store.find_by_id(collection, id) {
        Ok(Some(doc)) => {
            let mut projected = serde_json::Map::new();
            projected.insert("id".to_string(), doc["id"].clone());
            for field in fields {
                if let Some(v) = doc.get(*field) {
                    projected.insert((*field).to_string(), v.clone());
                }
            }
            Value::Object(projected)
        }
        Ok(None) => Value::Null,
        Err(e) => {
            tracing::warn!(collection, id, error = %e, "reference lookup failed");
            Value::Null
        }
    }
}

/// String value of a field inside a stored document, empty when absent.
pub fn str_of<'a>(doc: &'a Value, field: &str) -> &'a str {
    doc.get(field).and_then(Value::as_str).unwrap_or("")
}
