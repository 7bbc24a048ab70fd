//! # Canned Reports
//!
//! The analytics endpoints expressed as fixed pipelines: ratings summary,
//! monthly plan, radius search, and per-tour distances. Geo inputs are
//! validated here, before any pipeline runs.

use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::query::{FilterExpr, FilterSet};

use super::pipeline::Pipeline;
use super::stage::{angular_distance, geo_coordinates, Accumulator, AccumulatorOp, GroupKey};

/// Earth radius in miles, for radius-search conversions
pub const EARTH_RADIUS_MILES: f64 = 3963.2;
/// Earth radius in kilometers, for radius-search conversions
pub const EARTH_RADIUS_KILOMETERS: f64 = 6378.1;

const METERS_TO_MILES: f64 = 0.000621371;
const METERS_TO_KILOMETERS: f64 = 0.001;

/// Distance unit for the geo endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceUnit {
    Miles,
    Kilometers,
}

impl DistanceUnit {
    /// `"mi"` selects miles; anything else falls back to kilometers
    pub fn from_param(unit: &str) -> Self {
        if unit == "mi" {
            DistanceUnit::Miles
        } else {
            DistanceUnit::Kilometers
        }
    }

    fn earth_radius(self) -> f64 {
        match self {
            DistanceUnit::Miles => EARTH_RADIUS_MILES,
            DistanceUnit::Kilometers => EARTH_RADIUS_KILOMETERS,
        }
    }

    fn meters_multiplier(self) -> f64 {
        match self {
            DistanceUnit::Miles => METERS_TO_MILES,
            DistanceUnit::Kilometers => METERS_TO_KILOMETERS,
        }
    }
}

/// Parse a `lat,lng` path segment into `(lat, lng)`
pub fn parse_latlng(raw: &str) -> AppResult<(f64, f64)> {
    let invalid =
        || AppError::validation("Please provide latitude and longitude in the format lat,lng.");

    let (lat, lng) = raw.split_once(',').ok_or_else(invalid)?;
    let lat: f64 = lat.trim().parse().map_err(|_| invalid())?;
    let lng: f64 = lng.trim().parse().map_err(|_| invalid())?;
    Ok((lat, lng))
}

/// Per-difficulty statistics over well-rated tours.
///
/// Only tours with `ratingsAverage >= 4.5` contribute; groups are keyed by
/// uppercased difficulty and ordered by ascending average price.
pub fn ratings_summary(tours: &[Value]) -> AppResult<Vec<Value>> {
    let pipeline = Pipeline::builder()
        .match_docs(FilterSet::new().and(FilterExpr::gte("ratingsAverage", json!(4.5))))
        .group(
            GroupKey::UpperField("difficulty".into()),
            "difficulty",
            vec![
                Accumulator::new("numTours", AccumulatorOp::Count),
                Accumulator::new("numRatings", AccumulatorOp::Sum("ratingsQuantity".into())),
                Accumulator::new("avgRating", AccumulatorOp::Avg("ratingsAverage".into())),
                Accumulator::new("avgPrice", AccumulatorOp::Avg("price".into())),
                Accumulator::new("minPrice", AccumulatorOp::Min("price".into())),
                Accumulator::new("maxPrice", AccumulatorOp::Max("price".into())),
            ],
        )
        .sort_asc("avgPrice")
        .build()?;

    Ok(pipeline.execute(tours))
}

/// Tour starts per calendar month of one year, busiest month first.
pub fn monthly_plan(tours: &[Value], year: i32) -> AppResult<Vec<Value>> {
    let from = format!("{year}-01-01");
    let until = format!("{year}-12-31");

    let pipeline = Pipeline::builder()
        .unwind("startDates")
        .match_docs(
            FilterSet::new()
                .and(FilterExpr::gte("startDates", json!(from)))
                .and(FilterExpr::lte("startDates", json!(until))),
        )
        .group(
            GroupKey::MonthOf("startDates".into()),
            "month",
            vec![
                Accumulator::new("numTourStarts", AccumulatorOp::Count),
                Accumulator::new("tours", AccumulatorOp::Push("name".into())),
            ],
        )
        .sort_desc("numTourStarts")
        .limit(12)
        .build()?;

    Ok(pipeline.execute(tours))
}

/// Tours whose start location lies within `distance` of `lat,lng`.
///
/// The radius is the distance divided by the Earth radius in the chosen
/// unit, giving a central angle comparable against the haversine angle.
pub fn tours_within(
    tours: &[Value],
    distance: f64,
    latlng: &str,
    unit: &str,
) -> AppResult<Vec<Value>> {
    let (lat, lng) = parse_latlng(latlng)?;
    let radius = distance / DistanceUnit::from_param(unit).earth_radius();

    Ok(tours
        .iter()
        .filter(|tour| {
            tour.get("startLocation")
                .and_then(geo_coordinates)
                .is_some_and(|point| angular_distance((lng, lat), point) <= radius)
        })
        .cloned()
        .collect())
}

/// Distance from `lat,lng` to every tour's start location, nearest first.
///
/// Output rows carry only `distance` and `name` (plus the identity).
pub fn distances(tours: &[Value], latlng: &str, unit: &str) -> AppResult<Vec<Value>> {
    let (lat, lng) = parse_latlng(latlng)?;
    let multiplier = DistanceUnit::from_param(unit).meters_multiplier();

    let pipeline = Pipeline::builder()
        .geo_near((lng, lat), "startLocation", "distance", multiplier)
        .project(&["distance", "name"])
        .build()?;

    Ok(pipeline.execute(tours))
}
