//! # User Controller
//!
//! Plain factory CRUD over the user profile surface. No hooks; credential
//! and session mechanics are out of scope for this service.

use std::sync::Arc;

use crate::rest::ResourceHandler;
use crate::schema::catalog;
use crate::store::DocumentStore;

/// Build the user handler
pub fn handler(store: Arc<dyn DocumentStore>) -> ResourceHandler {
    ResourceHandler::new(catalog::users(), store)
}
