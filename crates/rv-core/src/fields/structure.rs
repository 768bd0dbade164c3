//! Structural repair of custom-field data against a field definition.
//!
//! `ensure_defined_structure` never fails: missing fields are filled, values
//! of the wrong type are replaced, and undefined fields are kept or dropped.
//! An explicit `null` counts as a cleared value and is kept. Imported data from an older or foreign schema goes through it
//! before it is shown.

use std::collections::HashMap;

use serde_json::Value;

use super::{FieldData, FieldDefinition, FieldMap, FieldType};

/// How to fill a defined field that is missing (or of the wrong type) in the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HandleUndefined {
    /// Fill with `null` (lists become `[]`, objects are recursed).
    FillNone,
    /// Fill with the field's declared default.
    #[default]
    FillDefault,
}

/// Reconcile `value` against `definition`.
///
/// Every defined field appears in the output. Fields present in `value` but
/// absent from `definition` are kept when `include_undefined` is set and
/// dropped otherwise. Nested objects and lists of objects are reconciled with
/// their sub-schemas using the same options.
#[must_use]
pub fn ensure_defined_structure(
    value: &FieldData,
    definition: &FieldMap,
    handle_undefined: HandleUndefined,
    include_undefined: bool,
) -> FieldData {
    let mut out = if include_undefined {
        value
            .iter()
            .filter(|(key, _)| !definition.contains_key(*key))
            .map(|(key, v)| (key.clone(), v.clone()))
            .collect()
    } else {
        FieldData::new()
    };

    for (id, field) in definition {
        out.insert(
            id.clone(),
            ensure_field(value.get(id), field, handle_undefined, include_undefined),
        );
    }
    out
}

fn ensure_field(
    value: Option<&Value>,
    definition: &FieldDefinition,
    handle_undefined: HandleUndefined,
    include_undefined: bool,
) -> Value {
    match definition.field_type {
        FieldType::Object => {
            let empty = FieldData::new();
            let nested = value.and_then(Value::as_object).unwrap_or(&empty);
            Value::Object(ensure_defined_structure(
                nested,
                &definition.properties,
                handle_undefined,
                include_undefined,
            ))
        }
        FieldType::List => match value {
            Some(Value::Array(items)) => Value::Array(
                items
                    .iter()
                    .map(|item| match &definition.items {
                        Some(item_def) => {
                            ensure_field(Some(item), item_def, handle_undefined, include_undefined)
                        }
                        None => item.clone(),
                    })
                    .collect(),
            ),
            _ => match (handle_undefined, &definition.default) {
                (HandleUndefined::FillDefault, Some(default @ Value::Array(_))) => default.clone(),
                _ => Value::Array(Vec::new()),
            },
        },
        _ => match value {
            Some(Value::Null) => Value::Null,
            Some(v) if leaf_is_valid(v, definition) => v.clone(),
            _ => fill(definition, handle_undefined),
        },
    }
}

fn leaf_is_valid(value: &Value, definition: &FieldDefinition) -> bool {
    match definition.field_type {
        FieldType::String
        | FieldType::Markdown
        | FieldType::Cvss
        | FieldType::Date
        | FieldType::Combobox
        | FieldType::User => value.is_string(),
        FieldType::Number => value.is_number(),
        FieldType::Boolean => value.is_boolean(),
        FieldType::Enum => value.as_str().is_some_and(|s| {
            definition.choices.is_empty() || definition.choices.iter().any(|c| c.value == s)
        }),
        FieldType::Object | FieldType::List => false,
    }
}

fn fill(definition: &FieldDefinition, handle_undefined: HandleUndefined) -> Value {
    match handle_undefined {
        HandleUndefined::FillNone => Value::Null,
        HandleUndefined::FillDefault => definition.default.clone().unwrap_or(Value::Null),
    }
}

/// Collect the user ids stored in `user` fields of `value`, in schema order.
///
/// Recurses into objects and lists. Ids are returned once each.
#[must_use]
pub fn collect_user_references(value: &FieldData, definition: &FieldMap) -> Vec<String> {
    let mut out = Vec::new();
    collect_from_map(value, definition, &mut out);
    out
}

fn collect_from_map(value: &FieldData, definition: &FieldMap, out: &mut Vec<String>) {
    for (id, field) in definition {
        if let Some(v) = value.get(id) {
            collect_from_value(v, field, out);
        }
    }
}

fn collect_from_value(value: &Value, definition: &FieldDefinition, out: &mut Vec<String>) {
    match (definition.field_type, value) {
        (FieldType::User, Value::String(id)) if !id.is_empty() => {
            if !out.contains(id) {
                out.push(id.clone());
            }
        }
        (FieldType::Object, Value::Object(nested)) => {
            collect_from_map(nested, &definition.properties, out);
        }
        (FieldType::List, Value::Array(items)) => {
            if let Some(item_def) = &definition.items {
                for item in items {
                    collect_from_value(item, item_def, out);
                }
            }
        }
        _ => {}
    }
}

/// Replace user ids in `user` fields of `value` according to `mapping`.
///
/// Walks the same fields as [`collect_user_references`]. Ids without an
/// entry in `mapping` are left alone.
pub fn rewrite_user_references(
    value: &mut FieldData,
    definition: &FieldMap,
    mapping: &HashMap<String, String>,
) {
    for (id, field) in definition {
        if let Some(v) = value.get_mut(id) {
            rewrite_value(v, field, mapping);
        }
    }
}

fn rewrite_value(value: &mut Value, definition: &FieldDefinition, mapping: &HashMap<String, String>) {
    match (definition.field_type, value) {
        (FieldType::User, Value::String(id)) => {
            if let Some(local) = mapping.get(id.as_str()) {
                id.clone_from(local);
            }
        }
        (FieldType::Object, Value::Object(nested)) => {
            rewrite_user_references(nested, &definition.properties, mapping);
        }
        (FieldType::List, Value::Array(items)) => {
            if let Some(item_def) = &definition.items {
                for item in items {
                    rewrite_value(item, item_def, mapping);
                }
            }
        }
        _ => {}
    }
}
