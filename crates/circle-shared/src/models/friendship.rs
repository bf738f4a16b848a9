use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Audit;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "friendship_status", rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum FriendshipStatus {
    Pending,
    Accepted,
    Declined,
    Blocked,
}

/// Directed friendship edge between two accounts.
/// The pair `(user_id, friend_id)` is unique.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Friendship {
    #[serde(flatten)]
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub audit: Audit,
    pub user_id: Uuid,
    pub friend_id: Uuid,
    pub status: FriendshipStatus,
}
