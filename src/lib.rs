//! trailhead - a tour-booking REST API with schema-driven endpoints
//!
//! One generic CRUD factory parameterized by resource schemas, a query
//! pipeline over URL criteria, an in-memory aggregation builder for the
//! analytics endpoints, and a signed-webhook checkout flow.

pub mod aggregate;
pub mod config;
pub mod domain;
pub mod error;
pub mod http;
pub mod payments;
pub mod query;
pub mod rest;
pub mod schema;
pub mod store;
