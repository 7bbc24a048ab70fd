//! # Pipeline Stages
//!
//! Tagged stage descriptors and their document-stream transformations.
//! Each stage is a pure function over the stream; ordering is enforced by
//! the pipeline, not here.

use chrono::Datelike;
use serde_json::{Map, Number, Value};

use crate::query::FilterSet;

/// Mean Earth radius used when converting central angles to meters
pub const EARTH_RADIUS_METERS: f64 = 6_378_100.0;

/// How group keys are derived from a document
#[derive(Debug, Clone)]
pub enum GroupKey {
    /// Single group over the whole stream
    All,
    /// Group by a field value as-is
    Field(String),
    /// Group by an uppercased string field
    UpperField(String),
    /// Group by the calendar month (1-12) of a date field
    MonthOf(String),
}

impl GroupKey {
    fn evaluate(&self, doc: &Value) -> Option<Value> {
        match self {
            GroupKey::All => Some(Value::Null),
            GroupKey::Field(field) => doc.get(field).cloned(),
            GroupKey::UpperField(field) => doc
                .get(field)
                .and_then(Value::as_str)
                .map(|s| Value::String(s.to_uppercase())),
            GroupKey::MonthOf(field) => doc
                .get(field)
                .and_then(Value::as_str)
                .and_then(parse_month)
                .map(|m| Value::Number(m.into())),
        }
    }
}

/// Per-group statistic
#[derive(Debug, Clone)]
pub enum AccumulatorOp {
    Count,
    Sum(String),
    Avg(String),
    Min(String),
    Max(String),
    Push(String),
}

/// A named accumulator within a group stage
#[derive(Debug, Clone)]
pub struct Accumulator {
    pub output: String,
    pub op: AccumulatorOp,
}

impl Accumulator {
    pub fn new(output: impl Into<String>, op: AccumulatorOp) -> Self {
        Self {
            output: output.into(),
            op,
        }
    }
}

/// A single pipeline stage
#[derive(Debug, Clone)]
pub enum Stage {
    /// Keep documents matching every filter
    Match(FilterSet),
    /// Expand an array field into one document per element
    Unwind { field: String },
    /// Group by a key, computing accumulators; the key lands in `key_as`
    Group {
        key: GroupKey,
        key_as: String,
        accumulators: Vec<Accumulator>,
    },
    /// Keep only the named fields (plus the identity)
    Project { include: Vec<String> },
    /// Sort by one field
    Sort { field: String, ascending: bool },
    /// Cap the stream
    Limit(usize),
    /// Compute great-circle distance from a point into `distance_field`
    /// (scaled by `distance_multiplier`) and order nearest-first. Must be
    /// the first stage of a pipeline.
    GeoNear {
        center: (f64, f64),
        key: String,
        distance_field: String,
        distance_multiplier: f64,
    },
}

impl Stage {
    /// Apply this stage to the document stream
    pub fn apply(&self, docs: Vec<Value>) -> Vec<Value> {
        match self {
            Stage::Match(filters) => docs.into_iter().filter(|d| filters.matches(d)).collect(),
            Stage::Unwind { field } => unwind(docs, field),
            Stage::Group {
                key,
                key_as,
                accumulators,
            } => group(docs, key, key_as, accumulators),
            Stage::Project { include } => project(docs, include),
            Stage::Sort { field, ascending } => {
                let mut docs = docs;
                crate::query::executor::sort(
                    &mut docs,
                    &[if *ascending {
                        crate::query::SortKey::asc(field.clone())
                    } else {
                        crate::query::SortKey::desc(field.clone())
                    }],
                );
                docs
            }
            Stage::Limit(n) => docs.into_iter().take(*n).collect(),
            Stage::GeoNear {
                center,
                key,
                distance_field,
                distance_multiplier,
            } => geo_near(docs, *center, key, distance_field, *distance_multiplier),
        }
    }
}

fn unwind(docs: Vec<Value>, field: &str) -> Vec<Value> {
    let mut out = Vec::new();
    for doc in docs {
        let Some(elements) = doc.get(field).and_then(Value::as_array).cloned() else {
            continue;
        };
        for element in elements {
            let mut clone = doc.clone();
            if let Some(obj) = clone.as_object_mut() {
                obj.insert(field.to_string(), element);
            }
            out.push(clone);
        }
    }
    out
}

fn group(docs: Vec<Value>, key: &GroupKey, key_as: &str, accs: &[Accumulator]) -> Vec<Value> {
    // First-seen key order keeps the output deterministic.
    let mut groups: Vec<(Value, Vec<Value>)> = Vec::new();

    for doc in docs {
        let Some(key_value) = key.evaluate(&doc) else {
            continue;
        };
        match groups.iter_mut().find(|(k, _)| *k == key_value) {
            Some((_, members)) => members.push(doc),
            None => groups.push((key_value, vec![doc])),
        }
    }

    groups
        .into_iter()
        .map(|(key_value, members)| {
            let mut row = Map::new();
            row.insert(key_as.to_string(), key_value);
            for acc in accs {
                row.insert(acc.output.clone(), accumulate(&members, &acc.op));
            }
            Value::Object(row)
        })
        .collect()
}

fn accumulate(members: &[Value], op: &AccumulatorOp) -> Value {
    let numbers = |field: &str| -> Vec<f64> {
        members
            .iter()
            .filter_map(|d| d.get(field).and_then(Value::as_f64))
            .collect()
    };

    match op {
        AccumulatorOp::Count => Value::Number((members.len() as i64).into()),
        AccumulatorOp::Sum(field) => number_value(numbers(field).iter().sum()),
        AccumulatorOp::Avg(field) => {
            let values = numbers(field);
            if values.is_empty() {
                Value::Null
            } else {
                number_value(values.iter().sum::<f64>() / values.len() as f64)
            }
        }
        AccumulatorOp::Min(field) => numbers(field)
            .into_iter()
            .fold(None::<f64>, |min, v| Some(min.map_or(v, |m| m.min(v))))
            .map(number_value)
            .unwrap_or(Value::Null),
        AccumulatorOp::Max(field) => numbers(field)
            .into_iter()
            .fold(None::<f64>, |max, v| Some(max.map_or(v, |m| m.max(v))))
            .map(number_value)
            .unwrap_or(Value::Null),
        AccumulatorOp::Push(field) => Value::Array(
            members
                .iter()
                .filter_map(|d| d.get(field).cloned())
                .collect(),
        ),
    }
}

fn project(docs: Vec<Value>, include: &[String]) -> Vec<Value> {
    docs.into_iter()
        .map(|doc| {
            let Value::Object(obj) = doc else { return doc };
            Value::Object(
                obj.into_iter()
                    .filter(|(key, _)| key == "id" || include.contains(key))
                    .collect(),
            )
        })
        .collect()
}

fn geo_near(
    docs: Vec<Value>,
    center: (f64, f64),
    key: &str,
    distance_field: &str,
    multiplier: f64,
) -> Vec<Value> {
    let mut out: Vec<(f64, Value)> = docs
        .into_iter()
        .filter_map(|mut doc| {
            let point = geo_coordinates(doc.get(key)?)?;
            let meters = angular_distance(center, point) * EARTH_RADIUS_METERS;
            let distance = meters * multiplier;
            doc.as_object_mut()?
                .insert(distance_field.to_string(), number_value(distance));
            Some((distance, doc))
        })
        .collect();

    out.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
    out.into_iter().map(|(_, doc)| doc).collect()
}

/// Extract `(lng, lat)` from a GeoJSON-style point
pub fn geo_coordinates(value: &Value) -> Option<(f64, f64)> {
    let coords = value.get("coordinates")?.as_array()?;
    if coords.len() != 2 {
        return None;
    }
    Some((coords[0].as_f64()?, coords[1].as_f64()?))
}

/// Central angle in radians between two `(lng, lat)` points (haversine)
pub fn angular_distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    let (lng1, lat1) = (a.0.to_radians(), a.1.to_radians());
    let (lng2, lat2) = (b.0.to_radians(), b.1.to_radians());

    let dlat = lat2 - lat1;
    let dlng = lng2 - lng1;

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    2.0 * h.sqrt().asin()
}

/// Month number (1-12) of a date string
fn parse_month(s: &str) -> Option<u32> {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(dt.month());
    }
    chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .map(|d| d.month())
}

/// Emit whole numbers as integers, everything else as floats
fn number_value(f: f64) -> Value {
    if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Value::Number((f as i64).into())
    } else {
        Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
    }
}
