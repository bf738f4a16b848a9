use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Audit columns shared by every persisted record.
///
/// Embedded in each entity (flattened in both JSON and row mapping) instead of
/// an inheritance hierarchy. `id`, `created_at` and `created_by` are fixed at
/// creation; `updated_at` is refreshed on every mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Audit {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: String,
}

impl Audit {
    /// Audit block for a record that has not been persisted yet.
    ///
    /// A missing id becomes the nil UUID; the create path replaces it with a
    /// fresh v4 and stamps both timestamps, so the values here are placeholders.
    pub fn pending(id: Option<Uuid>, created_by: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.unwrap_or(Uuid::nil()),
            created_at: now,
            updated_at: now,
            created_by: created_by.into(),
        }
    }
}
