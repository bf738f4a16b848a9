use serde::{Deserialize, Serialize};

use crate::models::Audit;

/// Login account. Email is unique across the table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Account {
    #[serde(flatten)]
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub audit: Audit,
    pub email: String,
    pub password_hash: String,
    pub is_active: bool,
}
