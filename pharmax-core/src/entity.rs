use serde::{Deserialize, Serialize};

/// A patient record as stored and returned over the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    /// Normalized at validation time: trimmed and lowercased. Unique among
    /// non-deleted patients.
    pub email: String,
    #[serde(default)]
    pub is_deleted: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// A medical condition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Malady {
    pub id: String,
    /// Trimmed; unique among non-deleted maladies.
    pub malady_name: String,
    #[serde(default)]
    pub is_deleted: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// A drug, tied to exactly one malady.
///
/// `malady_id` is a plain reference: the store does not enforce that the
/// malady exists, so a dangling id is representable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Medicament {
    pub id: String,
    pub medicament_name: String,
    pub malady_id: String,
    #[serde(default)]
    pub is_deleted: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// A visit linking one patient, one malady and one medicament.
/// Immutable after creation except for deletion.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Consultation {
    pub id: String,
    pub patient_id: String,
    pub malady_id: String,
    pub medicament_id: String,
    /// Defaults to the creation instant when omitted from the request.
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub is_deleted: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl Patient {
    pub const COLLECTION: &'static str = "patients";
}

impl Malady {
    pub const COLLECTION: &'static str = "maladies";
}

impl Medicament {
    pub const COLLECTION: &'static str = "medicaments";
}

impl Consultation {
    pub const COLLECTION: &'static str = "consultations";
}
