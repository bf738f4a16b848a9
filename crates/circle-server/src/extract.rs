use axum::extract::{FromRequest, FromRequestParts};

use crate::error::AppError;

/// `axum::Json` with deserialization failures routed through [`AppError`], so
/// malformed bodies come back in the shared error envelope instead of axum's
/// plain-text rejection.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// `axum::extract::Query` with the same envelope treatment.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct AppQuery<T>(pub T);

/// `axum::extract::Path` with the same envelope treatment.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct AppPath<T>(pub T);
