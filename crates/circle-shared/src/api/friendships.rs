use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::FriendshipStatus;

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateFriendshipRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub user_id: Uuid,
    pub friend_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<FriendshipStatus>,
    pub created_by: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateFriendshipRequest {
    pub user_id: Uuid,
    pub friend_id: Uuid,
    pub status: FriendshipStatus,
}
