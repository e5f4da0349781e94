pub mod entity;
pub mod error;
pub mod validate;

pub use entity::{Consultation, Malady, Medicament, Patient};
pub use error::{Result, ValidationError};
pub use validate::{ConsultationInput, MaladyInput, MedicamentInput, PatientInput};
