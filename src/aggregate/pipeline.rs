//! # Aggregation Pipeline
//!
//! Ordered stage list with a typed builder. Validation happens at build
//! time so a malformed pipeline never touches the document stream.

use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::query::FilterSet;

use super::stage::{Accumulator, GroupKey, Stage};

/// An ordered, validated sequence of stages
#[derive(Debug, Clone)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder { stages: Vec::new() }
    }

    /// Run every stage in order over a snapshot of documents
    pub fn execute(&self, documents: &[Value]) -> Vec<Value> {
        self.stages
            .iter()
            .fold(documents.to_vec(), |docs, stage| stage.apply(docs))
    }
}

/// Builds a [`Pipeline`], rejecting stage orders the executor cannot honor
pub struct PipelineBuilder {
    stages: Vec<Stage>,
}

impl PipelineBuilder {
    pub fn match_docs(mut self, filters: FilterSet) -> Self {
        self.stages.push(Stage::Match(filters));
        self
    }

    pub fn unwind(mut self, field: impl Into<String>) -> Self {
        self.stages.push(Stage::Unwind {
            field: field.into(),
        });
        self
    }

    pub fn group(
        mut self,
        key: GroupKey,
        key_as: impl Into<String>,
        accumulators: Vec<Accumulator>,
    ) -> Self {
        self.stages.push(Stage::Group {
            key,
            key_as: key_as.into(),
            accumulators,
        });
        self
    }

    pub fn project(mut self, include: &[&str]) -> Self {
        self.stages.push(Stage::Project {
            include: include.iter().map(|s| s.to_string()).collect(),
        });
        self
    }

    pub fn sort_asc(mut self, field: impl Into<String>) -> Self {
        self.stages.push(Stage::Sort {
            field: field.into(),
            ascending: true,
        });
        self
    }

    pub fn sort_desc(mut self, field: impl Into<String>) -> Self {
        self.stages.push(Stage::Sort {
            field: field.into(),
            ascending: false,
        });
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.stages.push(Stage::Limit(n));
        self
    }

    pub fn geo_near(
        mut self,
        center: (f64, f64),
        key: impl Into<String>,
        distance_field: impl Into<String>,
        distance_multiplier: f64,
    ) -> Self {
        self.stages.push(Stage::GeoNear {
            center,
            key: key.into(),
            distance_field: distance_field.into(),
            distance_multiplier,
        });
        self
    }

    pub fn build(self) -> AppResult<Pipeline> {
        for (idx, stage) in self.stages.iter().enumerate() {
            if matches!(stage, Stage::GeoNear { .. }) && idx != 0 {
                return Err(AppError::validation(
                    "geoNear is only valid as the first stage of a pipeline",
                ));
            }
        }
        Ok(Pipeline {
            stages: self.stages,
        })
    }
}
