pub mod document_store;
pub mod error;

pub use document_store::{DocumentStore, FieldFilter, TransactionOps};
pub use error::{Result, StoreError};
