//! Custom-field schema.
//!
//! A document's `data` is a dynamically typed JSON object whose shape is
//! described by a tree of [`FieldDefinition`]s owned by its project type (or,
//! for finding templates, by the predefined finding field set).
//!
//! The definition tree is stored and archived as JSON:
//!
//! ```json
//! {
//!   "title": {"type": "string", "label": "Title", "default": "TODO"},
//!   "tags":  {"type": "list", "items": {"type": "string"}},
//!   "owner": {"type": "object", "properties": {"name": {"type": "string"}}}
//! }
//! ```

mod predefined;
mod structure;

pub use predefined::{
    finding_field_order_default, finding_fields_default, report_fields_default,
    report_sections_default,
};
pub use structure::{
    HandleUndefined, collect_user_references, ensure_defined_structure, rewrite_user_references,
};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Ordered mapping of field id to definition.
pub type FieldMap = IndexMap<String, FieldDefinition>;

/// The persisted custom-field document of a project, finding, or template.
pub type FieldData = serde_json::Map<String, Value>;

/// Type tag of a custom field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    String,
    Markdown,
    Cvss,
    Date,
    Number,
    Boolean,
    Enum,
    Combobox,
    User,
    Object,
    List,
}

/// One selectable value of an `enum` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumChoice {
    pub value: String,
    pub label: String,
}

/// Definition of a single custom field, possibly nested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    #[serde(rename = "type")]
    pub field_type: FieldType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    /// Allowed values for `enum` fields.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<EnumChoice>,

    /// Suggested values for `combobox` fields.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,

    /// Sub-schema of `object` fields.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub properties: FieldMap,

    /// Item schema of `list` fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<FieldDefinition>>,
}

impl FieldDefinition {
    #[must_use]
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            label: None,
            default: None,
            choices: Vec::new(),
            suggestions: Vec::new(),
            properties: FieldMap::new(),
            items: None,
        }
    }

    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub fn default_value(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    #[must_use]
    pub fn choices<'a>(mut self, choices: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        self.choices = choices
            .into_iter()
            .map(|(value, label)| EnumChoice {
                value: value.to_string(),
                label: label.to_string(),
            })
            .collect();
        self
    }

    #[must_use]
    pub fn suggestions<'a>(mut self, suggestions: impl IntoIterator<Item = &'a str>) -> Self {
        self.suggestions = suggestions.into_iter().map(String::from).collect();
        self
    }

    #[must_use]
    pub fn object(properties: FieldMap) -> Self {
        let mut def = Self::new(FieldType::Object);
        def.properties = properties;
        def
    }

    #[must_use]
    pub fn list(items: Self) -> Self {
        let mut def = Self::new(FieldType::List);
        def.items = Some(Box::new(items));
        def
    }
}

/// Definition of a report section: a labelled group of report fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionDefinition {
    pub id: String,
    pub label: String,
    pub fields: Vec<String>,
}

/// Shallow-merge `patch` into `base`; keys in `patch` win.
#[must_use]
pub fn merge_data(base: &FieldData, patch: &FieldData) -> FieldData {
    let mut merged = base.clone();
    for (key, value) in patch {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn definition_json_shape() {
        let def = FieldDefinition::new(FieldType::Enum)
            .label("Severity")
            .choices([("low", "Low"), ("high", "High")])
            .default_value(json!("low"));

        let value = serde_json::to_value(&def).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "enum",
                "label": "Severity",
                "default": "low",
                "choices": [
                    {"value": "low", "label": "Low"},
                    {"value": "high", "label": "High"}
                ]
            })
        );
    }

    #[test]
    fn nested_definitions_parse() {
        let fields: FieldMap = serde_json::from_value(json!({
            "field_list_objects": {
                "type": "list",
                "label": "List of nested objects",
                "items": {
                    "type": "object",
                    "properties": {
                        "nested1": {"type": "string", "label": "Nested object field", "default": null}
                    }
                }
            }
        }))
        .unwrap();

        let def = &fields["field_list_objects"];
        assert_eq!(def.field_type, FieldType::List);
        let items = def.items.as_ref().unwrap();
        assert_eq!(items.field_type, FieldType::Object);
        assert_eq!(items.properties["nested1"].default, None);
    }

    #[test]
    fn merge_overrides_keys() {
        let base = json!({"a": 1, "b": 2}).as_object().cloned().unwrap();
        let patch = json!({"b": 3, "c": 4}).as_object().cloned().unwrap();
        let merged = merge_data(&base, &patch);
        assert_eq!(serde_json::Value::Object(merged), json!({"a": 1, "b": 3, "c": 4}));
    }
}
