//! # Query Pipeline
//!
//! The generic query-feature pipeline: raw criteria are parsed into a
//! [`QueryDescriptor`](parser::QueryDescriptor), which the executor applies
//! to a collection in filter -> sort -> project -> paginate order.

pub mod executor;
pub mod filter;
pub mod parser;

pub use filter::{FilterExpr, FilterOperator, FilterSet};
pub use parser::{parse, QueryDescriptor, SortKey, DEFAULT_LIMIT, MAX_LIMIT};
