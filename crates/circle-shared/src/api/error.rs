use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Uniform error envelope returned by every endpoint.
///
/// `path` is filled in at the router boundary; handlers and services only
/// decide the code/message/field errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub path: String,
    #[serde(rename = "fieldErrors", skip_serializing_if = "Option::is_none")]
    pub field_errors: Option<Vec<FieldError>>,
}

/// One offending request-body field inside a validation failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
    #[serde(rename = "rejectedValue", skip_serializing_if = "Option::is_none")]
    pub rejected_value: Option<serde_json::Value>,
}
