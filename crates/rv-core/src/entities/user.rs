use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user of this installation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub mobile: Option<String>,
    pub title_before: Option<String>,
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub title_after: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Display name assembled from the name parts, e.g. `"Dr. Herbert Testinger MSc"`.
    ///
    /// Falls back to the username when no name part is set.
    #[must_use]
    pub fn name(&self) -> String {
        let parts: Vec<&str> = [
            &self.title_before,
            &self.first_name,
            &self.middle_name,
            &self.last_name,
            &self.title_after,
        ]
        .into_iter()
        .filter_map(|p| p.as_deref())
        .filter(|p| !p.is_empty())
        .collect();

        if parts.is_empty() {
            self.username.clone()
        } else {
            parts.join(" ")
        }
    }
}
