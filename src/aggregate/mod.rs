//! # Aggregation Report Builder
//!
//! An in-memory, typed analogue of a document-database aggregation
//! pipeline: tagged stages, a validating builder, and the canned reports
//! the analytics endpoints serve.

pub mod pipeline;
pub mod reports;
pub mod stage;

pub use pipeline::{Pipeline, PipelineBuilder};
pub use reports::{
    distances, monthly_plan, parse_latlng, ratings_summary, tours_within, DistanceUnit,
    EARTH_RADIUS_KILOMETERS, EARTH_RADIUS_MILES,
};
pub use stage::{Accumulator, AccumulatorOp, GroupKey, Stage};
