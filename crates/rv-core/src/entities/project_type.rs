use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::SourceEnum;
use crate::errors::CoreError;
use crate::fields::{FieldData, FieldMap, SectionDefinition};

/// A report template: field schemas, section layout, and rendering sources.
///
/// `linked_project` is set on project types that were re-created as an
/// imported dependency of a single project. Deleting that project deletes the
/// project type too, unless another project still uses it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectType {
    pub id: String,
    pub name: String,
    pub language: String,
    pub report_fields: FieldMap,
    pub report_sections: Vec<SectionDefinition>,
    pub finding_fields: FieldMap,
    pub finding_field_order: Vec<String>,
    pub report_template: String,
    pub report_styles: String,
    /// Sample report data used when rendering a preview of the template.
    pub report_preview_data: FieldData,
    pub source: SourceEnum,
    pub linked_project: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProjectType {
    /// Ids of the report fields belonging to section `section_id`.
    #[must_use]
    pub fn section_fields(&self, section_id: &str) -> &[String] {
        self.report_sections
            .iter()
            .find(|s| s.id == section_id)
            .map_or(&[], |s| s.fields.as_slice())
    }

    /// Check that sections and the finding field order only name defined
    /// fields, and name each field at most once.
    ///
    /// Report fields outside every section are allowed.
    pub fn validate(&self) -> Result<(), CoreError> {
        let mut seen_sections = Vec::new();
        let mut seen_fields: Vec<&str> = Vec::new();
        for section in &self.report_sections {
            if seen_sections.contains(&section.id.as_str()) {
                return Err(CoreError::Validation(format!(
                    "duplicate report section {}",
                    section.id
                )));
            }
            seen_sections.push(section.id.as_str());

            for field in &section.fields {
                if !self.report_fields.contains_key(field) {
                    return Err(CoreError::Validation(format!(
                        "section {} references undefined report field {field}",
                        section.id
                    )));
                }
                if seen_fields.contains(&field.as_str()) {
                    return Err(CoreError::Validation(format!(
                        "report field {field} belongs to more than one section"
                    )));
                }
                seen_fields.push(field.as_str());
            }
        }

        let mut seen_order: Vec<&str> = Vec::new();
        for field in &self.finding_field_order {
            if !self.finding_fields.contains_key(field) {
                return Err(CoreError::Validation(format!(
                    "finding field order references undefined field {field}"
                )));
            }
            if seen_order.contains(&field.as_str()) {
                return Err(CoreError::Validation(format!(
                    "finding field {field} appears twice in the field order"
                )));
            }
            seen_order.push(field.as_str());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{
        FieldDefinition, FieldType, finding_field_order_default, finding_fields_default,
        report_fields_default, report_sections_default,
    };

    fn project_type() -> ProjectType {
        ProjectType {
            id: "ptp-1".into(),
            name: "Default".into(),
            language: "en-US".into(),
            report_fields: report_fields_default(),
            report_sections: report_sections_default(),
            finding_fields: finding_fields_default(),
            finding_field_order: finding_field_order_default(),
            report_template: String::new(),
            report_styles: String::new(),
            report_preview_data: FieldData::new(),
            source: SourceEnum::Created,
            linked_project: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn predefined_layout_is_valid() {
        assert!(project_type().validate().is_ok());
    }

    #[test]
    fn unsectioned_report_fields_are_allowed() {
        let mut pt = project_type();
        pt.report_fields
            .insert("extra".into(), FieldDefinition::new(FieldType::String));
        assert!(pt.validate().is_ok());
    }

    #[test]
    fn section_with_undefined_field_is_rejected() {
        let mut pt = project_type();
        pt.report_sections[0].fields.push("nope".into());
        let err = pt.validate().unwrap_err();
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn field_in_two_sections_is_rejected() {
        let mut pt = project_type();
        pt.report_sections[1].fields.push("executive_summary".into());
        assert!(pt.validate().is_err());
    }

    #[test]
    fn finding_order_must_name_defined_fields_once() {
        let mut pt = project_type();
        pt.finding_field_order.push("unknown".into());
        assert!(pt.validate().is_err());

        let mut pt = project_type();
        pt.finding_field_order.push("title".into());
        assert!(pt.validate().is_err());
    }

    #[test]
    fn section_fields_lookup() {
        let pt = project_type();
        assert_eq!(pt.section_fields("other"), ["title", "report_date"]);
        assert!(pt.section_fields("missing").is_empty());
    }
}
