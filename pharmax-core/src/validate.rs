//! Request-body validation
//!
//! Each entity has one entry point taking the raw JSON body and returning
//! either a normalized input or the first failing rule. Validation always
//! runs before any store call.

use crate::error::{Result, ValidationError};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\w+([.-]?\w+)*@\w+([.-]?\w+)*(\.\w{2,})+$").unwrap()
});

/// Validated patient fields, trimmed and with the email lowercased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaladyInput {
    pub malady_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MedicamentInput {
    pub medicament_name: String,
    pub malady_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsultationInput {
    pub patient_id: String,
    pub malady_id: String,
    pub medicament_id: String,
    pub date: Option<String>,
    pub notes: Option<String>,
}

/// Validate a POST /api/patients body.
pub fn patient_input(body: &Value) -> Result<PatientInput> {
    let first_name = name_field(body, "firstName", "First name")?;
    let last_name = name_field(body, "lastName", "Last name")?;

    let email = str_field(body, "email")
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ValidationError::new("email", "Email is required"))?;

    if !EMAIL_PATTERN.is_match(&email) {
        return Err(ValidationError::new("email", "Invalid email format"));
    }

    Ok(PatientInput {
        first_name,
        last_name,
        email,
    })
}

/// Validate a POST /api/maladies body.
pub fn malady_input(body: &Value) -> Result<MaladyInput> {
    let malady_name = required_field(body, "maladyName", "Malady name is required")?;
    Ok(MaladyInput { malady_name })
}

/// Validate a POST /api/medicaments body.
pub fn medicament_input(body: &Value) -> Result<MedicamentInput> {
    let medicament_name = required_field(body, "medicamentName", "Medicament name is required")?;
    let malady_id = required_field(body, "maladyId", "Malady ID is required")?;
    Ok(MedicamentInput {
        medicament_name,
        malady_id,
    })
}

/// Validate a POST /api/consultations body.
///
/// Reference ids are checked for presence only; existence is the caller's
/// concern (and is deliberately not enforced).
pub fn consultation_input(body: &Value) -> Result<ConsultationInput> {
    let patient_id = required_field(body, "patientId", "Patient ID is required")?;
    let malady_id = required_field(body, "maladyId", "Malady ID is required")?;
    let medicament_id = required_field(body, "medicamentId", "Medicament ID is required")?;

    let date = str_field(body, "date")
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(String::from);
    let notes = str_field(body, "notes")
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(String::from);

    Ok(ConsultationInput {
        patient_id,
        malady_id,
        medicament_id,
        date,
        notes,
    })
}

fn str_field<'a>(body: &'a Value, key: &str) -> Option<&'a str> {
    body.get(key).and_then(Value::as_str)
}

/// Required, non-blank after trim.
fn required_field(body: &Value, key: &'static str, message: &str) -> Result<String> {
    str_field(body, key)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(String::from)
        .ok_or_else(|| ValidationError::new(key, message))
}

/// Required, non-blank after trim, at least two characters.
fn name_field(body: &Value, key: &'static str, label: &str) -> Result<String> {
    let value = str_field(body, key)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(String::from)
        .ok_or_else(|| ValidationError::new(key, format!("{} is required", label)))?;

    if value.chars().count() < 2 {
        return Err(ValidationError::new(
            key,
            format!("{} must be at least 2 characters", label),
        ));
    }

    Ok(value)
}
