//! # Document Validation
//!
//! Validates payloads against a resource type before persistence.
//!
//! Create: unknown fields are stripped (never rejected), defaults applied,
//! required fields enforced, every present field checked against its kind,
//! then cross-field validators run over the whole document.
//!
//! Update: only the changed fields are re-checked; cross-field validators
//! run over the merged view of existing document + patch, so constraints
//! like "discount below price" hold whichever side the patch touches.

use chrono::NaiveDate;
use serde_json::{Map, Value};

use crate::error::{AppError, AppResult};

use super::types::{FieldKind, ResourceSchema, IDENTITY_FIELD};

/// Validate and normalize a create payload in place.
pub fn validate_create(schema: &ResourceSchema, payload: &mut Value) -> AppResult<()> {
    let obj = as_object_mut(schema, payload)?;

    strip_unknown_fields(schema, obj);
    apply_defaults(schema, obj);

    for field in &schema.fields {
        match obj.get(field.name) {
            Some(value) => validate_value(field.name, &field.kind, value)?,
            None if field.required => {
                return Err(AppError::validation(format!(
                    "A {} must have a {}",
                    schema.name, field.name
                )));
            }
            None => {}
        }
    }

    run_cross_field_checks(schema, obj)
}

/// Validate a partial update against the existing document.
///
/// Returns the sanitized patch; the store performs the actual merge.
pub fn validate_update(
    schema: &ResourceSchema,
    existing: &Value,
    patch: &Value,
) -> AppResult<Value> {
    let mut patch = patch.clone();
    let obj = as_object_mut(schema, &mut patch)?;

    // The identity field is immutable after creation.
    if let Some(new_id) = obj.remove(IDENTITY_FIELD) {
        if Some(&new_id) != existing.get(IDENTITY_FIELD) {
            return Err(AppError::validation(format!(
                "the {} id is immutable",
                schema.name
            )));
        }
    }

    strip_unknown_fields(schema, obj);

    for field in &schema.fields {
        if let Some(value) = obj.get(field.name) {
            validate_value(field.name, &field.kind, value)?;
        }
    }

    // Cross-field constraints see the patched document as a whole.
    let mut merged = existing
        .as_object()
        .cloned()
        .unwrap_or_default();
    for (key, value) in obj.iter() {
        merged.insert(key.clone(), value.clone());
    }
    run_cross_field_checks(schema, &merged)?;

    Ok(patch)
}

fn as_object_mut<'a>(
    schema: &ResourceSchema,
    payload: &'a mut Value,
) -> AppResult<&'a mut Map<String, Value>> {
    payload.as_object_mut().ok_or_else(|| {
        AppError::validation(format!("a {} payload must be a JSON object", schema.name))
    })
}

/// Unknown fields are silently dropped, mirroring the permissive contract
/// of the filter parser.
fn strip_unknown_fields(schema: &ResourceSchema, obj: &mut Map<String, Value>) {
    obj.retain(|key, _| key == IDENTITY_FIELD || schema.field(key).is_some());
}

fn apply_defaults(schema: &ResourceSchema, obj: &mut Map<String, Value>) {
    for field in &schema.fields {
        if let Some(default) = &field.default {
            obj.entry(field.name.to_string())
                .or_insert_with(|| default.clone());
        }
    }
}

fn run_cross_field_checks(schema: &ResourceSchema, obj: &Map<String, Value>) -> AppResult<()> {
    for check in &schema.validators {
        check(obj).map_err(AppError::validation)?;
    }
    Ok(())
}

/// Validate a single value against its declared kind.
fn validate_value(field: &str, kind: &FieldKind, value: &Value) -> AppResult<()> {
    if value.is_null() {
        return Err(AppError::validation(format!("{} must not be null", field)));
    }

    match kind {
        FieldKind::String { min_len, max_len } => {
            let s = value
                .as_str()
                .ok_or_else(|| kind_error(field, kind, value))?;
            let len = s.chars().count();
            if let Some(min) = min_len {
                if len < *min {
                    return Err(AppError::validation(format!(
                        "{} must have more or equal than {} characters",
                        field, min
                    )));
                }
            }
            if let Some(max) = max_len {
                if len > *max {
                    return Err(AppError::validation(format!(
                        "{} must have less or equal than {} characters",
                        field, max
                    )));
                }
            }
        }
        FieldKind::Number { min, max } => {
            let n = value
                .as_f64()
                .ok_or_else(|| kind_error(field, kind, value))?;
            if let Some(min) = min {
                if n < *min {
                    return Err(AppError::validation(format!(
                        "{} must be above {}",
                        field, min
                    )));
                }
            }
            if let Some(max) = max {
                if n > *max {
                    return Err(AppError::validation(format!(
                        "{} must be below {}",
                        field, max
                    )));
                }
            }
        }
        FieldKind::Boolean => {
            if !value.is_boolean() {
                return Err(kind_error(field, kind, value));
            }
        }
        FieldKind::Date => {
            let s = value
                .as_str()
                .ok_or_else(|| kind_error(field, kind, value))?;
            if !is_valid_date(s) {
                return Err(AppError::validation(format!(
                    "{} must be a valid date",
                    field
                )));
            }
        }
        FieldKind::Enum { values } => {
            let s = value
                .as_str()
                .ok_or_else(|| kind_error(field, kind, value))?;
            if !values.contains(&s) {
                return Err(AppError::validation(format!(
                    "{} is either: {}",
                    field,
                    values.join(", ")
                )));
            }
        }
        FieldKind::GeoPoint => {
            let valid = value.get("type").and_then(Value::as_str) == Some("Point")
                && value
                    .get("coordinates")
                    .and_then(Value::as_array)
                    .map(|c| c.len() == 2 && c.iter().all(Value::is_number))
                    .unwrap_or(false);
            if !valid {
                return Err(AppError::validation(format!(
                    "{} must be a GeoJSON point with [lng, lat] coordinates",
                    field
                )));
            }
        }
        FieldKind::Reference { .. } => {
            if !value.is_string() {
                return Err(kind_error(field, kind, value));
            }
        }
        FieldKind::Array(element) => {
            let arr = value
                .as_array()
                .ok_or_else(|| kind_error(field, kind, value))?;
            for (i, elem) in arr.iter().enumerate() {
                validate_value(&format!("{}[{}]", field, i), element, elem)?;
            }
        }
    }

    Ok(())
}

/// Accepts RFC 3339 timestamps and plain calendar dates.
pub fn is_valid_date(s: &str) -> bool {
    chrono::DateTime::parse_from_rfc3339(s).is_ok()
        || NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

fn kind_error(field: &str, kind: &FieldKind, value: &Value) -> AppError {
    AppError::validation(format!(
        "{} must be a {}, got {}",
        field,
        kind.kind_name(),
        json_type_name(value)
    ))
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
