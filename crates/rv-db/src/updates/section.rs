//! Report section update builder.

use rv_core::enums::ReviewStatus;
use serde::Serialize;

#[derive(Debug, Clone, Default, Serialize)]
pub struct SectionUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ReviewStatus>,
}

pub struct SectionUpdateBuilder(SectionUpdate);

impl SectionUpdateBuilder {
    pub fn new() -> Self {
        Self(SectionUpdate::default())
    }

    pub fn assignee(mut self, val: Option<String>) -> Self {
        self.0.assignee_id = Some(val);
        self
    }

    pub fn status(mut self, val: ReviewStatus) -> Self {
        self.0.status = Some(val);
        self
    }

    pub fn build(self) -> SectionUpdate {
        self.0
    }
}
