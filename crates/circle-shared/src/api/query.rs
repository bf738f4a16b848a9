use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Query parameters for the paged list endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    /// When present, restrict the listing to records owned by this creator.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
}

/// Query parameters for `GET /created`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedRangeParams {
    pub start: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<Utc>>,
}

/// Query parameters for `GET /changes`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangesParams {
    pub since: DateTime<Utc>,
}

/// Optional creator scope for count/exists endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreatorParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountResponse {
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExistsResponse {
    pub exists: bool,
}
