//! # Domain Controllers
//!
//! Thin per-resource wiring over the generic factory: hooks, populate
//! rules, base filters, and the flows that do not fit plain CRUD
//! (checkout, analytics presets).

pub mod bookings;
pub mod reviews;
pub mod tours;
pub mod users;
