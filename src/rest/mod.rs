//! # Generic REST Layer
//!
//! The schema-parameterized handler factory and the uniform Result
//! Envelope. Domain controllers wrap these with resource-specific hooks.

pub mod factory;
pub mod response;

pub use factory::{
    AfterWriteHook, BeforeCreateHook, PopulateRule, ResourceHandler, WriteOp,
};
