use std::sync::OnceLock;

use axum::{extract::State, http::StatusCode, Json};
use regex::Regex;
use serde_json::json;
use uuid::Uuid;

use circle_shared::api::{
    ChangesParams, CountResponse, CreateAccountRequest, CreatedRangeParams, CreatorParams,
    ExistsResponse, ListParams, Page, UpdateAccountRequest, Violations,
};
use circle_shared::{Account, Audit};

use crate::error::AppError;
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::routes::AppState;

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap())
}

fn check_email(violations: &mut Violations, email: &str) {
    violations.require("email", email);
    if !email.trim().is_empty() && !email_regex().is_match(email) {
        violations.reject("email", "must be a valid email address", Some(json!(email)));
    }
}

/// POST /api/v1/accounts
pub async fn create_account(
    State(state): State<AppState>,
    AppJson(req): AppJson<CreateAccountRequest>,
) -> Result<(StatusCode, Json<Account>), AppError> {
    let mut violations = Violations::new();
    check_email(&mut violations, &req.email);
    violations.require("password_hash", &req.password_hash);
    violations.require("created_by", &req.created_by);
    violations.check()?;

    let account = Account {
        audit: Audit::pending(req.id, req.created_by),
        email: req.email,
        password_hash: req.password_hash,
        is_active: req.is_active.unwrap_or(true),
    };

    let created = state.accounts.create(account).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /api/v1/accounts/:id
pub async fn update_account(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<UpdateAccountRequest>,
) -> Result<Json<Account>, AppError> {
    let mut violations = Violations::new();
    check_email(&mut violations, &req.email);
    violations.require("password_hash", &req.password_hash);
    violations.check()?;

    // Audit fields are replaced from the stored row by the service.
    let account = Account {
        audit: Audit::pending(Some(id), String::new()),
        email: req.email,
        password_hash: req.password_hash,
        is_active: req.is_active.unwrap_or(true),
    };

    Ok(Json(state.accounts.update(id, account).await?))
}

/// GET /api/v1/accounts
pub async fn list_accounts(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<ListParams>,
) -> Result<Json<Page<Account>>, AppError> {
    Ok(Json(super::list(&state.accounts, &params).await?))
}

/// GET /api/v1/accounts/:id
pub async fn get_account(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<Account>, AppError> {
    Ok(Json(state.accounts.get(id).await?))
}

/// DELETE /api/v1/accounts/:id
pub async fn delete_account(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<StatusCode, AppError> {
    state.accounts.delete_by_id(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/accounts/by-email/:email
pub async fn get_account_by_email(
    State(state): State<AppState>,
    AppPath(email): AppPath<String>,
) -> Result<Json<Account>, AppError> {
    let account = state
        .accounts
        .repo()
        .find_by_email(&email)
        .await?
        .ok_or(AppError::NotFound {
            entity: "Account",
            id: email,
        })?;
    Ok(Json(account))
}

/// GET /api/v1/accounts/count
pub async fn count_accounts(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<CreatorParams>,
) -> Result<Json<CountResponse>, AppError> {
    Ok(Json(super::count(&state.accounts, &params).await?))
}

/// GET /api/v1/accounts/:id/exists
pub async fn account_exists(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppQuery(params): AppQuery<CreatorParams>,
) -> Result<Json<ExistsResponse>, AppError> {
    Ok(Json(super::exists(&state.accounts, id, &params).await?))
}

/// GET /api/v1/accounts/created
pub async fn accounts_created(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<CreatedRangeParams>,
) -> Result<Json<Vec<Account>>, AppError> {
    Ok(Json(super::created_in(&state.accounts, &params).await?))
}

/// GET /api/v1/accounts/changes
pub async fn account_changes(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<ChangesParams>,
) -> Result<Json<Vec<Account>>, AppError> {
    Ok(Json(state.accounts.find_updated_after(params.since).await?))
}
