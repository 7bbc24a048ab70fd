//! # Resource Schemas
//!
//! Resource-type descriptors and document validation. Endpoints are never
//! hand-written per resource; everything is driven by these schemas.

pub mod catalog;
pub mod types;
pub mod validator;

pub use types::{CrossFieldCheck, FieldDef, FieldKind, ResourceSchema, IDENTITY_FIELD};
pub use validator::{validate_create, validate_update};
