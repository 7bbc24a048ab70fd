//! # Query Criteria Parser
//!
//! Turns raw request criteria (a flat string map, conceptually the URL
//! query string) into a normalized [`QueryDescriptor`].

use std::collections::HashMap;

use crate::error::{AppError, AppResult};
use crate::schema::ResourceSchema;

use super::filter::{coerce_value, FilterExpr, FilterOperator};

/// Maximum number of records a single page may request
pub const MAX_LIMIT: usize = 1000;

/// Default page size if not specified
pub const DEFAULT_LIMIT: usize = 100;

/// Reserved control keys, extracted before filters and never part of them
pub const RESERVED_KEYS: [&str; 4] = ["sort", "fields", "page", "limit"];

/// A (field, direction) sort key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub ascending: bool,
}

impl SortKey {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            ascending: true,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            ascending: false,
        }
    }
}

/// Normalized, per-request query description
#[derive(Debug, Clone)]
pub struct QueryDescriptor {
    /// Conjunction of comparison filters
    pub filters: Vec<FilterExpr>,

    /// Sort keys, applied in order
    pub sort: Vec<SortKey>,

    /// Field whitelist (None = all fields)
    pub projection: Option<Vec<String>>,

    /// Fields stripped from every response regardless of the whitelist
    pub hidden: Vec<String>,

    /// 1-based page number
    pub page: usize,

    /// Page size
    pub limit: usize,
}

impl QueryDescriptor {
    /// Skip offset derived from page and limit
    pub fn skip(&self) -> usize {
        (self.page - 1) * self.limit
    }
}

/// Parse raw criteria against a resource type's field list.
///
/// Reserved keys (`sort`, `fields`, `page`, `limit`) are popped off first.
/// Remaining keys become equality filters, or range filters when the key
/// carries a bracketed operator (`price[gte]=100`). Unknown field names
/// are allowed through unchanged: they match nothing downstream, and that
/// permissiveness is part of the API contract.
pub fn parse(
    params: &HashMap<String, String>,
    schema: &ResourceSchema,
) -> AppResult<QueryDescriptor> {
    let mut descriptor = QueryDescriptor {
        filters: Vec::new(),
        sort: Vec::new(),
        projection: None,
        hidden: schema.hidden_fields(),
        page: 1,
        limit: DEFAULT_LIMIT,
    };

    for (key, value) in params {
        match key.as_str() {
            "sort" => {
                descriptor.sort = parse_sort(value);
            }
            "fields" => {
                descriptor.projection = Some(parse_fields(value)?);
            }
            "page" => {
                descriptor.page = parse_positive_int(key, value)?;
            }
            "limit" => {
                descriptor.limit = parse_positive_int(key, value)?;
            }
            _ => {
                descriptor.filters.push(parse_filter(key, value)?);
            }
        }
    }

    if descriptor.limit > MAX_LIMIT {
        return Err(AppError::validation(format!(
            "limit {} exceeds maximum {}",
            descriptor.limit, MAX_LIMIT
        )));
    }

    // Stable default ordering by the identity field keeps pagination
    // consistent without injecting a secondary key into explicit sorts.
    if descriptor.sort.is_empty() {
        descriptor.sort.push(SortKey::asc(schema.identity_field()));
    }

    Ok(descriptor)
}

/// Parse the sort parameter: comma-separated names, leading `-` = descending
fn parse_sort(value: &str) -> Vec<SortKey> {
    value
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty() && *part != "-")
        .map(|part| match part.strip_prefix('-') {
            Some(field) => SortKey::desc(field),
            None => SortKey::asc(part),
        })
        .collect()
}

/// Parse the fields parameter (comma-separated whitelist)
fn parse_fields(value: &str) -> AppResult<Vec<String>> {
    if value == "*" {
        return Ok(vec!["*".to_string()]);
    }

    let fields: Vec<String> = value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if fields.is_empty() {
        return Err(AppError::validation("fields cannot be empty"));
    }

    Ok(fields)
}

/// Coerce page/limit to an integer >= 1
fn parse_positive_int(key: &str, value: &str) -> AppResult<usize> {
    let parsed: i64 = value
        .parse()
        .map_err(|_| AppError::validation(format!("invalid {}: {}", key, value)))?;

    Ok(parsed.max(1) as usize)
}

/// Parse a single filter entry, resolving a bracketed range operator
fn parse_filter(key: &str, value: &str) -> AppResult<FilterExpr> {
    if let Some((field, rest)) = key.split_once('[') {
        let op_name = rest.strip_suffix(']').ok_or_else(|| {
            AppError::validation(format!("malformed filter key: {}", key))
        })?;

        let operator = FilterOperator::from_range_key(op_name).ok_or_else(|| {
            AppError::validation(format!("unsupported filter operator: {}", op_name))
        })?;

        return Ok(FilterExpr::new(field, operator, coerce_value(value)));
    }

    Ok(FilterExpr::eq(key, coerce_value(value)))
}
