//! Finding update builder.

use rv_core::enums::ReviewStatus;
use serde::Serialize;

#[derive(Debug, Clone, Default, Serialize)]
pub struct FindingUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_id: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ReviewStatus>,
}

pub struct FindingUpdateBuilder(FindingUpdate);

impl FindingUpdateBuilder {
    pub fn new() -> Self {
        Self(FindingUpdate::default())
    }

    pub fn assignee(mut self, val: Option<String>) -> Self {
        self.0.assignee_id = Some(val);
        self
    }

    pub fn template(mut self, val: Option<String>) -> Self {
        self.0.template_id = Some(val);
        self
    }

    pub fn status(mut self, val: ReviewStatus) -> Self {
        self.0.status = Some(val);
        self
    }

    pub fn build(self) -> FindingUpdate {
        self.0
    }
}
