//! # Filter Expression AST
//!
//! Represents the comparison filters a Query Descriptor carries and
//! evaluates them against JSON documents.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Filter operators.
///
/// The query-string parser only ever produces the first five; `Ne` exists
/// for controller-injected base filters (e.g. excluding secret tours) and
/// is not reachable from client criteria.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterOperator {
    /// Equals
    #[serde(rename = "eq")]
    Eq,

    /// Greater than
    #[serde(rename = "gt")]
    Gt,

    /// Greater than or equal
    #[serde(rename = "gte")]
    Gte,

    /// Less than
    #[serde(rename = "lt")]
    Lt,

    /// Less than or equal
    #[serde(rename = "lte")]
    Lte,

    /// Not equals (internal only)
    #[serde(rename = "ne")]
    Ne,
}

impl FilterOperator {
    /// Parse a range-operator name from a bracketed criteria key.
    ///
    /// Only the client-facing range operators are accepted here.
    pub fn from_range_key(s: &str) -> Option<Self> {
        match s {
            "gt" => Some(FilterOperator::Gt),
            "gte" => Some(FilterOperator::Gte),
            "lt" => Some(FilterOperator::Lt),
            "lte" => Some(FilterOperator::Lte),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Eq => "eq",
            FilterOperator::Gt => "gt",
            FilterOperator::Gte => "gte",
            FilterOperator::Lt => "lt",
            FilterOperator::Lte => "lte",
            FilterOperator::Ne => "ne",
        }
    }
}

/// A single (field, operator, value) filter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterExpr {
    pub field: String,
    pub operator: FilterOperator,
    pub value: Value,
}

impl FilterExpr {
    pub fn new(field: impl Into<String>, operator: FilterOperator, value: Value) -> Self {
        Self {
            field: field.into(),
            operator,
            value,
        }
    }

    pub fn eq(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, FilterOperator::Eq, value)
    }

    pub fn gte(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, FilterOperator::Gte, value)
    }

    pub fn lte(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, FilterOperator::Lte, value)
    }

    pub fn ne(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, FilterOperator::Ne, value)
    }

    /// Check whether a document matches this filter.
    ///
    /// A document without the field never matches (except `Ne`, which
    /// treats an absent field as "not equal"). Unknown field names thus
    /// simply match nothing; this permissiveness is deliberate.
    pub fn matches(&self, doc: &Value) -> bool {
        let field_value = match doc.get(&self.field) {
            Some(v) => v,
            None => return self.operator == FilterOperator::Ne,
        };

        match self.operator {
            FilterOperator::Eq => field_value == &self.value,
            FilterOperator::Ne => field_value != &self.value,
            FilterOperator::Gt => compare_json_values(field_value, &self.value)
                .map(std::cmp::Ordering::is_gt)
                .unwrap_or(false),
            FilterOperator::Gte => compare_json_values(field_value, &self.value)
                .map(std::cmp::Ordering::is_ge)
                .unwrap_or(false),
            FilterOperator::Lt => compare_json_values(field_value, &self.value)
                .map(std::cmp::Ordering::is_lt)
                .unwrap_or(false),
            FilterOperator::Lte => compare_json_values(field_value, &self.value)
                .map(std::cmp::Ordering::is_le)
                .unwrap_or(false),
        }
    }
}

/// Compare two JSON values for ordering; `None` for incomparable types.
pub fn compare_json_values(a: &Value, b: &Value) -> Option<std::cmp::Ordering> {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => {
            let a_f = a.as_f64()?;
            let b_f = b.as_f64()?;
            a_f.partial_cmp(&b_f)
        }
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// A set of filters combined with logical AND
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    pub filters: Vec<FilterExpr>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn and(mut self, filter: FilterExpr) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn extend(&mut self, filters: impl IntoIterator<Item = FilterExpr>) {
        self.filters.extend(filters);
    }

    /// Check whether a document matches every filter
    pub fn matches(&self, doc: &Value) -> bool {
        self.filters.iter().all(|f| f.matches(doc))
    }
}

/// Parse a raw criteria value into a typed JSON value.
///
/// Numbers and booleans are coerced so range filters compare numerically;
/// everything else stays a string.
pub fn coerce_value(value: &str) -> Value {
    if value == "true" {
        return Value::Bool(true);
    }
    if value == "false" {
        return Value::Bool(false);
    }

    if let Ok(n) = value.parse::<i64>() {
        return Value::Number(n.into());
    }
    if let Ok(n) = value.parse::<f64>() {
        if let Some(num) = serde_json::Number::from_f64(n) {
            return Value::Number(num);
        }
    }

    Value::String(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_eq_filter() {
        let filter = FilterExpr::eq("difficulty", json!("easy"));

        assert!(filter.matches(&json!({"difficulty": "easy"})));
        assert!(!filter.matches(&json!({"difficulty": "difficult"})));
    }

    #[test]
    fn test_range_filters() {
        let filter = FilterExpr::new("price", FilterOperator::Gt, json!(400));

        assert!(filter.matches(&json!({"price": 497})));
        assert!(!filter.matches(&json!({"price": 400})));
        assert!(!filter.matches(&json!({"price": 297})));
    }

    #[test]
    fn test_missing_field_matches_nothing() {
        let filter = FilterExpr::eq("nonexistent", json!("x"));
        assert!(!filter.matches(&json!({"price": 100})));
    }

    #[test]
    fn test_ne_treats_missing_as_unequal() {
        let filter = FilterExpr::ne("secretTour", json!(true));

        assert!(filter.matches(&json!({"name": "no flag at all"})));
        assert!(filter.matches(&json!({"secretTour": false})));
        assert!(!filter.matches(&json!({"secretTour": true})));
    }

    #[test]
    fn test_incomparable_types_never_match_range() {
        let filter = FilterExpr::gte("price", json!(100));
        assert!(!filter.matches(&json!({"price": "cheap"})));
    }

    #[test]
    fn test_filter_set_is_conjunction() {
        let filters = FilterSet::new()
            .and(FilterExpr::gte("price", json!(100)))
            .and(FilterExpr::lte("price", json!(500)));

        assert!(filters.matches(&json!({"price": 300})));
        assert!(!filters.matches(&json!({"price": 50})));
        assert!(!filters.matches(&json!({"price": 900})));
    }

    #[test]
    fn test_coerce_value() {
        assert_eq!(coerce_value("5"), json!(5));
        assert_eq!(coerce_value("4.7"), json!(4.7));
        assert_eq!(coerce_value("true"), json!(true));
        assert_eq!(coerce_value("easy"), json!("easy"));
    }

    #[test]
    fn test_range_key_parsing() {
        assert_eq!(
            FilterOperator::from_range_key("gte"),
            Some(FilterOperator::Gte)
        );
        assert_eq!(FilterOperator::from_range_key("ne"), None);
        assert_eq!(FilterOperator::from_range_key("eq"), None);
    }
}
