//! Query Pipeline Invariant Tests
//!
//! End-to-end tests over parse + execute:
//! - Filtering always precedes sorting, projection, and pagination
//! - Sorting is stable and multi-key
//! - Pages partition the filtered, sorted stream without overlap
//! - Limits are clamped, never exceeded
//! - Unknown operators are rejected before execution

use std::collections::HashMap;

use serde_json::{json, Value};

use trailhead::query::{self, executor, MAX_LIMIT};
use trailhead::schema::catalog;

// =============================================================================
// Helper Functions
// =============================================================================

fn criteria(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn sample_tours() -> Vec<Value> {
    (0..30)
        .map(|i| {
            json!({
                "id": format!("t{i:02}"),
                "name": format!("Tour number {i:02}"),
                "price": 100.0 + (i % 5) as f64 * 100.0,
                "duration": 3 + (i % 7),
                "difficulty": (["easy", "medium", "difficult"][i % 3]),
                "ratingsAverage": 3.0 + (i % 4) as f64 * 0.5,
            })
        })
        .collect()
}

fn run(docs: &[Value], pairs: &[(&str, &str)]) -> Vec<Value> {
    let descriptor = query::parse(&criteria(pairs), &catalog::tours()).unwrap();
    executor::execute(docs, &descriptor, &[])
}

// =============================================================================
// Ordering Invariants
// =============================================================================

/// Range filters narrow the stream before pagination counts anything.
#[test]
fn test_filter_applies_before_pagination() {
    let docs = sample_tours();
    let page = run(&docs, &[("price[gte]", "400"), ("limit", "3"), ("page", "1")]);

    assert_eq!(page.len(), 3);
    for doc in &page {
        assert!(doc["price"].as_f64().unwrap() >= 400.0);
    }
}

/// Multi-key sort: primary descending, secondary ascending tiebreak.
#[test]
fn test_multi_key_sort() {
    let docs = sample_tours();
    let sorted = run(&docs, &[("sort", "-price,name"), ("limit", "1000")]);

    let pairs: Vec<(f64, String)> = sorted
        .iter()
        .map(|d| {
            (
                d["price"].as_f64().unwrap(),
                d["name"].as_str().unwrap().to_string(),
            )
        })
        .collect();

    for w in pairs.windows(2) {
        assert!(
            w[0].0 > w[1].0 || (w[0].0 == w[1].0 && w[0].1 <= w[1].1),
            "order violated: {:?} before {:?}",
            w[0],
            w[1]
        );
    }
}

/// Default order is by identity ascending, so runs are reproducible.
#[test]
fn test_default_sort_is_identity() {
    let mut docs = sample_tours();
    docs.reverse();

    let out = run(&docs, &[("limit", "1000")]);
    let ids: Vec<&str> = out.iter().map(|d| d["id"].as_str().unwrap()).collect();
    let mut expected = ids.clone();
    expected.sort();
    assert_eq!(ids, expected);
}

// =============================================================================
// Pagination Invariants
// =============================================================================

/// Consecutive pages concatenate back to the full filtered stream.
#[test]
fn test_pages_partition_the_stream() {
    let docs = sample_tours();
    let full = run(&docs, &[("limit", "1000")]);

    let mut stitched = Vec::new();
    for page in 1..=4 {
        let page = page.to_string();
        stitched.extend(run(&docs, &[("limit", "8"), ("page", page.as_str())]));
    }

    assert_eq!(stitched, full);
}

/// Requests over the limit ceiling are rejected, and the ceiling itself
/// is accepted.
#[test]
fn test_limit_ceiling() {
    assert!(query::parse(&criteria(&[("limit", "999999")]), &catalog::tours()).is_err());

    let at_max = criteria(&[("limit", &MAX_LIMIT.to_string())]);
    let descriptor = query::parse(&at_max, &catalog::tours()).unwrap();
    assert_eq!(descriptor.limit, MAX_LIMIT);
}

/// Page zero and page one read the same window.
#[test]
fn test_page_clamped_to_first() {
    let docs = sample_tours();
    let zero = run(&docs, &[("limit", "5"), ("page", "0")]);
    let one = run(&docs, &[("limit", "5"), ("page", "1")]);
    assert_eq!(zero, one);
}

/// A page past the end is empty, not an error.
#[test]
fn test_page_past_end_is_empty() {
    let docs = sample_tours();
    let far = run(&docs, &[("limit", "10"), ("page", "99")]);
    assert!(far.is_empty());
}

// =============================================================================
// Rejection Invariants
// =============================================================================

/// Unknown bracket operators never reach the executor.
#[test]
fn test_unknown_operator_rejected() {
    let result = query::parse(&criteria(&[("price[regex]", "x")]), &catalog::tours());
    assert!(result.is_err());
}

/// Non-numeric pagination values are a client error.
#[test]
fn test_non_numeric_page_rejected() {
    assert!(query::parse(&criteria(&[("page", "abc")]), &catalog::tours()).is_err());
    assert!(query::parse(&criteria(&[("limit", "ten")]), &catalog::tours()).is_err());
}

/// Filters on names the schema does not know match nothing rather than
/// erroring, so clients cannot probe for fields.
#[test]
fn test_unknown_field_matches_nothing() {
    let docs = sample_tours();
    let out = run(&docs, &[("nonexistent", "1")]);
    assert!(out.is_empty());
}

// =============================================================================
// Projection Invariants
// =============================================================================

/// Projection keeps the identity along with the requested fields.
#[test]
fn test_projection_keeps_identity() {
    let docs = sample_tours();
    let out = run(&docs, &[("fields", "name,price"), ("limit", "5")]);

    for doc in &out {
        let keys: Vec<&String> = doc.as_object().unwrap().keys().collect();
        assert_eq!(keys.len(), 3);
        assert!(doc.get("id").is_some());
        assert!(doc.get("duration").is_none());
    }
}
