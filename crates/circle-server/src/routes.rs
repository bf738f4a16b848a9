use axum::{middleware, routing::get, Router};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use circle_shared::{Account, Friendship, UserProfile};

use crate::db::DbPool;
use crate::error::error_envelope;
use crate::handlers::{accounts, friendships, profiles};
use crate::repo::PgRepository;
use crate::service::CrudService;

#[derive(Clone)]
pub struct AppState {
    pub accounts: CrudService<Account, PgRepository<Account>>,
    pub profiles: CrudService<UserProfile, PgRepository<UserProfile>>,
    pub friendships: CrudService<Friendship, PgRepository<Friendship>>,
}

impl AppState {
    pub fn new(db: DbPool) -> Self {
        Self {
            accounts: CrudService::new(PgRepository::new(db.clone())),
            profiles: CrudService::new(PgRepository::new(db.clone())),
            friendships: CrudService::new(PgRepository::new(db)),
        }
    }
}

pub fn create_router(db: DbPool) -> Router {
    let state = AppState::new(db);

    let account_routes = Router::new()
        .route(
            "/",
            get(accounts::list_accounts).post(accounts::create_account),
        )
        .route("/count", get(accounts::count_accounts))
        .route("/created", get(accounts::accounts_created))
        .route("/changes", get(accounts::account_changes))
        .route("/by-email/:email", get(accounts::get_account_by_email))
        .route(
            "/:id",
            get(accounts::get_account)
                .put(accounts::update_account)
                .delete(accounts::delete_account),
        )
        .route("/:id/exists", get(accounts::account_exists));

    let profile_routes = Router::new()
        .route(
            "/",
            get(profiles::list_profiles).post(profiles::create_profile),
        )
        .route("/count", get(profiles::count_profiles))
        .route("/created", get(profiles::profiles_created))
        .route("/changes", get(profiles::profile_changes))
        .route("/search", get(profiles::search_profiles))
        .route("/with-avatar", get(profiles::profiles_with_avatar))
        .route(
            "/by-account/:account_id",
            get(profiles::get_profile_by_account),
        )
        .route(
            "/by-account/:account_id/exists",
            get(profiles::profile_exists_for_account),
        )
        .route(
            "/:id",
            get(profiles::get_profile)
                .put(profiles::update_profile)
                .delete(profiles::delete_profile),
        )
        .route("/:id/exists", get(profiles::profile_exists));

    let friendship_routes = Router::new()
        .route(
            "/",
            get(friendships::list_friendships).post(friendships::create_friendship),
        )
        .route("/count", get(friendships::count_friendships))
        .route("/created", get(friendships::friendships_created))
        .route("/changes", get(friendships::friendship_changes))
        .route("/of/:user_id", get(friendships::friendships_of))
        .route(
            "/:id",
            get(friendships::get_friendship)
                .put(friendships::update_friendship)
                .delete(friendships::delete_friendship),
        )
        .route("/:id/exists", get(friendships::friendship_exists));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1/accounts", account_routes)
        .nest("/api/v1/user-profiles", profile_routes)
        .nest("/api/v1/friendships", friendship_routes)
        .layer(middleware::from_fn(error_envelope))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use super::*;

    // Lazy pool: no connection is made until a query runs, and the extractor
    // failures under test reject before any handler touches the database.
    fn app() -> Router {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/circle")
            .expect("valid connection string");
        create_router(pool)
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn malformed_query_string_gets_the_error_envelope() {
        // `start` is required on /created.
        let (status, body) = get_json(app(), "/api/v1/accounts/created").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["path"], "/api/v1/accounts/created");
    }

    #[tokio::test]
    async fn malformed_path_parameter_gets_the_error_envelope() {
        let (status, body) = get_json(app(), "/api/v1/accounts/not-a-uuid").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["path"], "/api/v1/accounts/not-a-uuid");
    }
}
