use axum::{extract::State, http::StatusCode, Json};
use uuid::Uuid;

use circle_shared::api::{
    ChangesParams, CountResponse, CreateProfileRequest, CreatedRangeParams, CreatorParams,
    ExistsResponse, ListParams, Page, ProfileSearchParams, UpdateProfileRequest, Violations,
};
use circle_shared::{Audit, UserProfile};

use crate::error::AppError;
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::routes::AppState;

/// POST /api/v1/user-profiles
pub async fn create_profile(
    State(state): State<AppState>,
    AppJson(req): AppJson<CreateProfileRequest>,
) -> Result<(StatusCode, Json<UserProfile>), AppError> {
    let mut violations = Violations::new();
    violations.require("full_name", &req.full_name);
    violations.require("created_by", &req.created_by);
    violations.check()?;

    let profile = UserProfile {
        audit: Audit::pending(req.id, req.created_by),
        account_id: req.account_id,
        full_name: req.full_name,
        avatar_url: req.avatar_url,
    };

    let created = state.profiles.create(profile).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /api/v1/user-profiles/:id
pub async fn update_profile(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<UpdateProfileRequest>,
) -> Result<Json<UserProfile>, AppError> {
    let mut violations = Violations::new();
    violations.require("full_name", &req.full_name);
    violations.check()?;

    let profile = UserProfile {
        audit: Audit::pending(Some(id), String::new()),
        account_id: req.account_id,
        full_name: req.full_name,
        avatar_url: req.avatar_url,
    };

    Ok(Json(state.profiles.update(id, profile).await?))
}

/// GET /api/v1/user-profiles
pub async fn list_profiles(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<ListParams>,
) -> Result<Json<Page<UserProfile>>, AppError> {
    Ok(Json(super::list(&state.profiles, &params).await?))
}

/// GET /api/v1/user-profiles/:id
pub async fn get_profile(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<UserProfile>, AppError> {
    Ok(Json(state.profiles.get(id).await?))
}

/// DELETE /api/v1/user-profiles/:id
pub async fn delete_profile(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<StatusCode, AppError> {
    state.profiles.delete_by_id(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/user-profiles/by-account/:account_id
pub async fn get_profile_by_account(
    State(state): State<AppState>,
    AppPath(account_id): AppPath<Uuid>,
) -> Result<Json<UserProfile>, AppError> {
    let profile = state
        .profiles
        .repo()
        .find_by_account_id(account_id)
        .await?
        .ok_or(AppError::NotFound {
            entity: "User profile",
            id: account_id.to_string(),
        })?;
    Ok(Json(profile))
}

/// GET /api/v1/user-profiles/by-account/:account_id/exists
pub async fn profile_exists_for_account(
    State(state): State<AppState>,
    AppPath(account_id): AppPath<Uuid>,
) -> Result<Json<ExistsResponse>, AppError> {
    let exists = state
        .profiles
        .repo()
        .exists_by_account_id(account_id)
        .await?;
    Ok(Json(ExistsResponse { exists }))
}

/// GET /api/v1/user-profiles/search?name=
pub async fn search_profiles(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<ProfileSearchParams>,
) -> Result<Json<Vec<UserProfile>>, AppError> {
    let profiles = state
        .profiles
        .repo()
        .find_by_full_name_containing(&params.name)
        .await?;
    Ok(Json(profiles))
}

/// GET /api/v1/user-profiles/with-avatar
pub async fn profiles_with_avatar(
    State(state): State<AppState>,
) -> Result<Json<Vec<UserProfile>>, AppError> {
    Ok(Json(state.profiles.repo().find_with_avatar().await?))
}

/// GET /api/v1/user-profiles/count
pub async fn count_profiles(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<CreatorParams>,
) -> Result<Json<CountResponse>, AppError> {
    Ok(Json(super::count(&state.profiles, &params).await?))
}

/// GET /api/v1/user-profiles/:id/exists
pub async fn profile_exists(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppQuery(params): AppQuery<CreatorParams>,
) -> Result<Json<ExistsResponse>, AppError> {
    Ok(Json(super::exists(&state.profiles, id, &params).await?))
}

/// GET /api/v1/user-profiles/created
pub async fn profiles_created(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<CreatedRangeParams>,
) -> Result<Json<Vec<UserProfile>>, AppError> {
    Ok(Json(super::created_in(&state.profiles, &params).await?))
}

/// GET /api/v1/user-profiles/changes
pub async fn profile_changes(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<ChangesParams>,
) -> Result<Json<Vec<UserProfile>>, AppError> {
    Ok(Json(state.profiles.find_updated_after(params.since).await?))
}
