//! # Resource Type Descriptors
//!
//! A resource type is a named schema: a field list with declared kinds and
//! constraints, plus cross-field validators carried as plain function
//! values. Every resource type has exactly one identity field (`id`),
//! assigned on create and immutable afterwards.

use serde_json::{Map, Value};

/// Identity field shared by every resource type
pub const IDENTITY_FIELD: &str = "id";

/// Declared kind of a schema field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// UTF-8 string with optional length bounds
    String {
        min_len: Option<usize>,
        max_len: Option<usize>,
    },
    /// Numeric value with optional bounds
    Number { min: Option<f64>, max: Option<f64> },
    /// Boolean
    Boolean,
    /// Date string (RFC 3339 or YYYY-MM-DD)
    Date,
    /// One of a fixed set of string values
    Enum { values: &'static [&'static str] },
    /// GeoJSON-style point: `{type: "Point", coordinates: [lng, lat]}`
    GeoPoint,
    /// Identity of a document in another resource type
    Reference { resource: &'static str },
    /// Homogeneous array
    Array(Box<FieldKind>),
}

impl FieldKind {
    pub fn string() -> Self {
        FieldKind::String {
            min_len: None,
            max_len: None,
        }
    }

    pub fn string_bounded(min_len: usize, max_len: usize) -> Self {
        FieldKind::String {
            min_len: Some(min_len),
            max_len: Some(max_len),
        }
    }

    pub fn number() -> Self {
        FieldKind::Number {
            min: None,
            max: None,
        }
    }

    pub fn number_bounded(min: f64, max: f64) -> Self {
        FieldKind::Number {
            min: Some(min),
            max: Some(max),
        }
    }

    /// Kind name for error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            FieldKind::String { .. } => "string",
            FieldKind::Number { .. } => "number",
            FieldKind::Boolean => "boolean",
            FieldKind::Date => "date",
            FieldKind::Enum { .. } => "enum",
            FieldKind::GeoPoint => "geo point",
            FieldKind::Reference { .. } => "reference",
            FieldKind::Array(_) => "array",
        }
    }
}

/// A single field definition
#[derive(Debug, Clone)]
pub struct FieldDef {
    pub name: &'static str,
    pub kind: FieldKind,
    /// Whether the field must be present on create
    pub required: bool,
    /// Value applied on create when the field is absent
    pub default: Option<Value>,
    /// Hidden fields never appear in responses, whitelisted or not
    pub hidden: bool,
}

impl FieldDef {
    pub fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: true,
            default: None,
            hidden: false,
        }
    }

    pub fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
            default: None,
            hidden: false,
        }
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }
}

/// Cross-field validator: inspects the whole document, returns the failing
/// constraint as a message
pub type CrossFieldCheck = fn(&Map<String, Value>) -> Result<(), String>;

/// A named resource type exposed through the uniform CRUD surface
#[derive(Debug, Clone)]
pub struct ResourceSchema {
    /// Singular name used in envelopes and errors ("tour")
    pub name: &'static str,
    /// Collection name used in storage and routes ("tours")
    pub collection: &'static str,
    pub fields: Vec<FieldDef>,
    pub validators: Vec<CrossFieldCheck>,
}

impl ResourceSchema {
    pub fn new(name: &'static str, collection: &'static str, fields: Vec<FieldDef>) -> Self {
        Self {
            name,
            collection,
            fields,
            validators: Vec::new(),
        }
    }

    pub fn with_validator(mut self, check: CrossFieldCheck) -> Self {
        self.validators.push(check);
        self
    }

    pub fn identity_field(&self) -> &'static str {
        IDENTITY_FIELD
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Names of fields stripped from every response
    pub fn hidden_fields(&self) -> Vec<String> {
        self.fields
            .iter()
            .filter(|f| f.hidden)
            .map(|f| f.name.to_string())
            .collect()
    }
}
