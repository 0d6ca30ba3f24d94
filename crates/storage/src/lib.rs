pub mod backend;
pub mod error;
mod models;
mod path;

pub use crate::backend::DocumentStore;
pub use crate::models::DocumentInfo;
pub use crate::path::{DOCUMENT_EXTENSION, is_document, validate as validate_path};
use std::sync::Arc;

pub type StoreHandle = Arc<dyn DocumentStore + Send + Sync>;
