//! Project update builder.

use serde::Serialize;

#[derive(Debug, Clone, Default, Serialize)]
pub struct ProjectUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub readonly: Option<bool>,
}

pub struct ProjectUpdateBuilder(ProjectUpdate);

impl ProjectUpdateBuilder {
    pub fn new() -> Self {
        Self(ProjectUpdate::default())
    }

    pub fn name(mut self, val: impl Into<String>) -> Self {
        self.0.name = Some(val.into());
        self
    }

    pub fn language(mut self, val: impl Into<String>) -> Self {
        self.0.language = Some(val.into());
        self
    }

    pub fn readonly(mut self, val: bool) -> Self {
        self.0.readonly = Some(val);
        self
    }

    pub fn build(self) -> ProjectUpdate {
        self.0
    }
}
