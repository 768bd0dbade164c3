//! Built-in field sets used when a project type does not define its own, and
//! as the schema governing finding templates.

use serde_json::json;

use super::{FieldDefinition, FieldMap, FieldType, SectionDefinition};

#[must_use]
pub fn report_fields_default() -> FieldMap {
    let mut fields = FieldMap::new();
    fields.insert(
        "title".into(),
        FieldDefinition::new(FieldType::String)
            .label("Title")
            .default_value(json!("TODO report title")),
    );
    fields.insert(
        "executive_summary".into(),
        FieldDefinition::new(FieldType::Markdown)
            .label("Executive Summary")
            .default_value(json!("**TODO: write executive summary**")),
    );
    fields.insert(
        "scope".into(),
        FieldDefinition::new(FieldType::Markdown)
            .label("Scope")
            .default_value(json!("**TODO: define scope**")),
    );
    fields.insert(
        "customer".into(),
        FieldDefinition::new(FieldType::String)
            .label("Customer")
            .default_value(json!("TODO company")),
    );
    fields.insert(
        "report_date".into(),
        FieldDefinition::new(FieldType::Date).label("Report Date"),
    );
    fields
}

#[must_use]
pub fn report_sections_default() -> Vec<SectionDefinition> {
    vec![
        SectionDefinition {
            id: "executive_summary".into(),
            label: "Executive Summary".into(),
            fields: vec!["executive_summary".into()],
        },
        SectionDefinition {
            id: "scope".into(),
            label: "Scope".into(),
            fields: vec!["scope".into()],
        },
        SectionDefinition {
            id: "customer".into(),
            label: "Customer".into(),
            fields: vec!["customer".into()],
        },
        SectionDefinition {
            id: "other".into(),
            label: "Other".into(),
            fields: vec!["title".into(), "report_date".into()],
        },
    ]
}

#[must_use]
pub fn finding_fields_default() -> FieldMap {
    let mut fields = FieldMap::new();
    fields.insert(
        "title".into(),
        FieldDefinition::new(FieldType::String)
            .label("Title")
            .default_value(json!("TODO: Finding Title")),
    );
    fields.insert(
        "cvss".into(),
        FieldDefinition::new(FieldType::Cvss)
            .label("CVSS")
            .default_value(json!("n/a")),
    );
    fields.insert(
        "summary".into(),
        FieldDefinition::new(FieldType::Markdown).label("Summary"),
    );
    fields.insert(
        "description".into(),
        FieldDefinition::new(FieldType::Markdown)
            .label("Technical Description")
            .default_value(json!("TODO: detailed technical description")),
    );
    fields.insert(
        "recommendation".into(),
        FieldDefinition::new(FieldType::Markdown)
            .label("Recommendation")
            .default_value(json!("TODO: how to fix the vulnerability")),
    );
    fields.insert(
        "affected_components".into(),
        FieldDefinition::list(FieldDefinition::new(FieldType::String).label("Component"))
            .label("Affected Components"),
    );
    fields.insert(
        "references".into(),
        FieldDefinition::list(FieldDefinition::new(FieldType::String).label("Reference"))
            .label("References"),
    );
    fields
}

#[must_use]
pub fn finding_field_order_default() -> Vec<String> {
    finding_fields_default().keys().cloned().collect()
}
