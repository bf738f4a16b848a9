use axum::{extract::State, http::StatusCode, Json};
use uuid::Uuid;

use circle_shared::api::{
    ChangesParams, CountResponse, CreateFriendshipRequest, CreatedRangeParams, CreatorParams,
    ExistsResponse, ListParams, Page, UpdateFriendshipRequest, Violations,
};
use circle_shared::{Audit, Friendship, FriendshipStatus};

use crate::error::AppError;
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::routes::AppState;

fn check_pair(user_id: Uuid, friend_id: Uuid) -> Result<(), AppError> {
    if user_id == friend_id {
        return Err(AppError::IllegalArgument(
            "user_id and friend_id must differ".to_string(),
        ));
    }
    Ok(())
}

/// POST /api/v1/friendships
pub async fn create_friendship(
    State(state): State<AppState>,
    AppJson(req): AppJson<CreateFriendshipRequest>,
) -> Result<(StatusCode, Json<Friendship>), AppError> {
    let mut violations = Violations::new();
    violations.require("created_by", &req.created_by);
    violations.check()?;
    check_pair(req.user_id, req.friend_id)?;

    let friendship = Friendship {
        audit: Audit::pending(req.id, req.created_by),
        user_id: req.user_id,
        friend_id: req.friend_id,
        status: req.status.unwrap_or(FriendshipStatus::Pending),
    };

    let created = state.friendships.create(friendship).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /api/v1/friendships/:id
pub async fn update_friendship(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<UpdateFriendshipRequest>,
) -> Result<Json<Friendship>, AppError> {
    check_pair(req.user_id, req.friend_id)?;

    let friendship = Friendship {
        audit: Audit::pending(Some(id), String::new()),
        user_id: req.user_id,
        friend_id: req.friend_id,
        status: req.status,
    };

    Ok(Json(state.friendships.update(id, friendship).await?))
}

/// GET /api/v1/friendships
pub async fn list_friendships(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<ListParams>,
) -> Result<Json<Page<Friendship>>, AppError> {
    Ok(Json(super::list(&state.friendships, &params).await?))
}

/// GET /api/v1/friendships/:id
pub async fn get_friendship(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<Friendship>, AppError> {
    Ok(Json(state.friendships.get(id).await?))
}

/// DELETE /api/v1/friendships/:id
pub async fn delete_friendship(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<StatusCode, AppError> {
    state.friendships.delete_by_id(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/friendships/of/:user_id
pub async fn friendships_of(
    State(state): State<AppState>,
    AppPath(user_id): AppPath<Uuid>,
) -> Result<Json<Vec<Friendship>>, AppError> {
    Ok(Json(
        state.friendships.repo().find_by_user_id(user_id).await?,
    ))
}

/// GET /api/v1/friendships/count
pub async fn count_friendships(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<CreatorParams>,
) -> Result<Json<CountResponse>, AppError> {
    Ok(Json(super::count(&state.friendships, &params).await?))
}

/// GET /api/v1/friendships/:id/exists
pub async fn friendship_exists(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppQuery(params): AppQuery<CreatorParams>,
) -> Result<Json<ExistsResponse>, AppError> {
    Ok(Json(super::exists(&state.friendships, id, &params).await?))
}

/// GET /api/v1/friendships/created
pub async fn friendships_created(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<CreatedRangeParams>,
) -> Result<Json<Vec<Friendship>>, AppError> {
    Ok(Json(super::created_in(&state.friendships, &params).await?))
}

/// GET /api/v1/friendships/changes
pub async fn friendship_changes(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<ChangesParams>,
) -> Result<Json<Vec<Friendship>>, AppError> {
    Ok(Json(
        state.friendships.find_updated_after(params.since).await?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_friendship_is_rejected() {
        let id = Uuid::new_v4();
        let err = check_pair(id, id).unwrap_err();
        assert!(matches!(err, AppError::IllegalArgument(_)));
    }

    #[test]
    fn distinct_pair_passes() {
        assert!(check_pair(Uuid::new_v4(), Uuid::new_v4()).is_ok());
    }
}
