//! # Query Executor
//!
//! Applies a [`QueryDescriptor`] to a set of documents in the fixed order
//! filter -> sort -> project -> paginate.

use serde_json::Value;

use super::filter::{compare_json_values, FilterExpr, FilterSet};
use super::parser::{QueryDescriptor, SortKey};

/// Execute a descriptor over a document slice.
///
/// Extra filters (controller-injected base filters such as the secret-tour
/// exclusion) are AND-ed with the descriptor's own. Paginating past the
/// last page yields an empty vector, never an error.
pub fn execute(
    documents: &[Value],
    descriptor: &QueryDescriptor,
    base_filters: &[FilterExpr],
) -> Vec<Value> {
    let mut filter_set = FilterSet {
        filters: base_filters.to_vec(),
    };
    filter_set.extend(descriptor.filters.iter().cloned());

    let mut matched: Vec<Value> = documents
        .iter()
        .filter(|doc| filter_set.matches(doc))
        .cloned()
        .collect();

    sort(&mut matched, &descriptor.sort);

    let matched = project(matched, descriptor);

    matched
        .into_iter()
        .skip(descriptor.skip())
        .take(descriptor.limit)
        .collect()
}

/// Stable multi-key sort. Ties fall back to the incoming order; no
/// secondary key is injected beyond what the descriptor specifies.
pub fn sort(documents: &mut [Value], keys: &[SortKey]) {
    if keys.is_empty() {
        return;
    }

    documents.sort_by(|a, b| {
        for key in keys {
            let ordering = match (a.get(&key.field), b.get(&key.field)) {
                (Some(a_val), Some(b_val)) => {
                    compare_json_values(a_val, b_val).unwrap_or(std::cmp::Ordering::Equal)
                }
                (None, Some(_)) => std::cmp::Ordering::Less,
                (Some(_), None) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            };

            let ordering = if key.ascending {
                ordering
            } else {
                ordering.reverse()
            };
            if ordering != std::cmp::Ordering::Equal {
                return ordering;
            }
        }
        std::cmp::Ordering::Equal
    });
}

/// Apply the projection: hidden fields are stripped unconditionally, then
/// the whitelist (if any) keeps only the named fields plus the identity.
fn project(documents: Vec<Value>, descriptor: &QueryDescriptor) -> Vec<Value> {
    let whitelist = match &descriptor.projection {
        Some(fields) if !(fields.len() == 1 && fields[0] == "*") => Some(fields),
        _ => None,
    };

    if whitelist.is_none() && descriptor.hidden.is_empty() {
        return documents;
    }

    documents
        .into_iter()
        .map(|doc| {
            let Value::Object(obj) = doc else { return doc };

            let filtered: serde_json::Map<String, Value> = obj
                .into_iter()
                .filter(|(key, _)| {
                    if descriptor.hidden.contains(key) {
                        return false;
                    }
                    match whitelist {
                        Some(fields) => key == "id" || fields.contains(key),
                        None => true,
                    }
                })
                .collect();
            Value::Object(filtered)
        })
        .collect()
}
