//! # HTTP Layer
//!
//! Router, request handlers, and the server runtime.

pub mod routes;
pub mod server;

pub use routes::{router, AppState, SIGNATURE_HEADER};
pub use server::serve;
