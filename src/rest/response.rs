//! # Result Envelope
//!
//! The uniform response shape every handler returns:
//! `{status, data, results?}`. Failure envelopes are produced by the
//! central error responder, never here.

use serde_json::{json, Value};

/// List envelope with a result count
pub fn list(collection: &str, docs: Vec<Value>) -> Value {
    json!({
        "status": "success",
        "results": docs.len(),
        "data": { collection: docs },
    })
}

/// Single-document envelope keyed by the singular resource name
pub fn one(name: &str, doc: Value) -> Value {
    json!({
        "status": "success",
        "data": { name: doc },
    })
}

/// Empty success envelope (deletes)
pub fn empty() -> Value {
    json!({
        "status": "success",
        "data": null,
    })
}
