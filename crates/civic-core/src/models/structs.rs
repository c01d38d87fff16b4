use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A console user as seen by identifier maintenance.
///
/// `custom_id` is the human-facing identifier and must be unique across the
/// whole collection (exact, case-sensitive match). `gender` is kept as the raw
/// value the console stored; see [`crate::GenderToken`] for how it is read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: Uuid,
    pub full_name: Option<String>,
    pub gender: Option<String>,
    pub custom_id: String,
    pub row_version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRecord {
    #[must_use]
    pub fn new(custom_id: impl Into<String>, gender: Option<&str>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            full_name: None,
            gender: gender.map(str::to_string),
            custom_id: custom_id.into(),
            row_version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    #[must_use]
    pub fn with_full_name(mut self, full_name: impl Into<String>) -> Self {
        self.full_name = Some(full_name.into());
        self
    }
}
