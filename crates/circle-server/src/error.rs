use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Request,
    },
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use circle_shared::api::{ErrorResponse, FieldError};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{entity} not found with id {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    #[error("{0}")]
    IllegalArgument(String),

    #[error("Malformed request: {0}")]
    BodyRejection(#[from] JsonRejection),

    #[error("Malformed query string: {0}")]
    QueryRejection(#[from] QueryRejection),

    #[error("Malformed path parameter: {0}")]
    PathRejection(#[from] PathRejection),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<Vec<FieldError>> for AppError {
    fn from(errors: Vec<FieldError>) -> Self {
        AppError::Validation(errors)
    }
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String, Option<Vec<FieldError>>) {
        match self {
            AppError::NotFound { .. } => (
                StatusCode::NOT_FOUND,
                "RESOURCE_NOT_FOUND",
                self.to_string(),
                None,
            ),
            AppError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                "Validation failed".to_string(),
                Some(errors.clone()),
            ),
            AppError::IllegalArgument(msg) => {
                (StatusCode::BAD_REQUEST, "ILLEGAL_ARGUMENT", msg.clone(), None)
            }
            AppError::BodyRejection(rejection) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                rejection.body_text(),
                None,
            ),
            AppError::QueryRejection(rejection) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                rejection.body_text(),
                None,
            ),
            AppError::PathRejection(rejection) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                rejection.body_text(),
                None,
            ),
            AppError::Database(sqlx::Error::Database(e))
                if e.is_unique_violation()
                    || e.is_foreign_key_violation()
                    || e.is_check_violation() =>
            {
                let message = match e.constraint() {
                    Some(name) => format!("Constraint violation: {name}"),
                    None => "Constraint violation".to_string(),
                };
                (StatusCode::BAD_REQUEST, "CONSTRAINT_VIOLATION", message, None)
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_SERVER_ERROR",
                    "An unexpected error occurred".to_string(),
                    None,
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_SERVER_ERROR",
                    "An unexpected error occurred".to_string(),
                    None,
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, field_errors) = self.parts();

        let envelope = ErrorResponse {
            code: code.to_string(),
            message,
            timestamp: Utc::now(),
            // Filled in by the error_envelope middleware.
            path: String::new(),
            field_errors,
        };

        let mut response = (status, Json(envelope.clone())).into_response();
        response.extensions_mut().insert(envelope);
        response
    }
}

/// Router-level middleware that stamps the request path onto error envelopes.
///
/// `IntoResponse` has no access to the request, so it parks the envelope in the
/// response extensions and this layer rewrites the body with the path set.
pub async fn error_envelope(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_owned();
    let mut response = next.run(request).await;

    if let Some(mut envelope) = response.extensions_mut().remove::<ErrorResponse>() {
        envelope.path = path;
        return (response.status(), Json(envelope)).into_response();
    }

    response
}

#[cfg(test)]
mod tests {
    use axum::{middleware, routing::get, Router};
    use serde_json::json;
    use tower::ServiceExt;

    use super::*;

    #[test]
    fn not_found_maps_to_404() {
        let err = AppError::NotFound {
            entity: "Account",
            id: "42".to_string(),
        };
        let (status, code, message, _) = err.parts();
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(code, "RESOURCE_NOT_FOUND");
        assert_eq!(message, "Account not found with id 42");
    }

    #[test]
    fn validation_carries_field_errors() {
        let err = AppError::Validation(vec![FieldError {
            field: "email".to_string(),
            message: "must not be blank".to_string(),
            rejected_value: Some(json!("")),
        }]);
        let (status, code, _, field_errors) = err.parts();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(code, "VALIDATION_ERROR");
        assert_eq!(field_errors.unwrap()[0].field, "email");
    }

    #[test]
    fn illegal_argument_maps_to_400() {
        let err = AppError::IllegalArgument("user_id and friend_id must differ".to_string());
        let (status, code, message, _) = err.parts();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(code, "ILLEGAL_ARGUMENT");
        assert_eq!(message, "user_id and friend_id must differ");
    }

    #[test]
    fn unexpected_errors_map_to_500_without_details() {
        let err = AppError::Internal(anyhow::anyhow!("pool exhausted"));
        let (status, code, message, _) = err.parts();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(code, "INTERNAL_SERVER_ERROR");
        assert!(!message.contains("pool exhausted"));
    }

    #[tokio::test]
    async fn middleware_fills_the_request_path() {
        async fn failing() -> Result<(), AppError> {
            Err(AppError::NotFound {
                entity: "Account",
                id: "42".to_string(),
            })
        }

        let app = Router::new()
            .route("/api/v1/accounts/42", get(failing))
            .layer(middleware::from_fn(error_envelope));

        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .uri("/api/v1/accounts/42")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], "RESOURCE_NOT_FOUND");
        assert_eq!(body["path"], "/api/v1/accounts/42");
        assert!(body.get("fieldErrors").is_none());
    }

    #[tokio::test]
    async fn field_errors_serialize_under_the_camel_case_key() {
        async fn failing() -> Result<(), AppError> {
            Err(AppError::Validation(vec![FieldError {
                field: "email".to_string(),
                message: "must not be blank".to_string(),
                rejected_value: Some(json!("")),
            }]))
        }

        let app = Router::new()
            .route("/api/v1/accounts", get(failing))
            .layer(middleware::from_fn(error_envelope));

        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .uri("/api/v1/accounts")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["fieldErrors"][0]["field"], "email");
        assert_eq!(body["fieldErrors"][0]["rejectedValue"], "");
    }
}
