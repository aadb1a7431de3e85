pub mod auth;
pub mod buckets;
pub mod filters;
pub mod health;
pub mod link_shares;
pub mod lists;
pub mod namespaces;
pub mod sharing;
pub mod tasks;
pub mod teams;
pub mod users;

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::FromRef,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use serde::Serialize;
use tasklane_api::ListParams;
use tasklane_api::service::{self, Pagination};
use tasklane_models::Page;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::metrics::Metrics;
use crate::storage::Db;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub config: Arc<Config>,
    pub metrics: Metrics,
}

impl FromRef<AppState> for Db {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}

impl FromRef<AppState> for Arc<Config> {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for Metrics {
    fn from_ref(state: &AppState) -> Self {
        state.metrics.clone()
    }
}

impl AppState {
    /// Limit and offset for a collection request.
    pub fn pagination(&self, params: &ListParams) -> Pagination {
        service::pagination(params.page, params.per_page, self.config.service.max_items_per_page)
    }
}

/// Collection response with the pagination headers clients page by.
pub fn paged<T: Serialize>(page: Page<T>, pagination: Pagination) -> Response {
    let total_pages = pagination.total_pages(page.total);
    let result_count = page.items.len();
    (
        [
            ("x-pagination-total-pages", total_pages.to_string()),
            ("x-pagination-result-count", result_count.to_string()),
        ],
        Json(page.items),
    )
        .into_response()
}

/// Seconds since the Unix epoch.
pub fn now_unix() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}

pub fn router(state: AppState) -> Router {
    let mut api = Router::new()
        // Instance
        .route("/health", get(health::health))
        .route("/info", get(health::info))
        // Accounts
        .route("/register", post(users::register))
        .route("/login", post(users::login))
        .route("/user", get(users::me))
        .route("/user/confirm", post(users::confirm_email))
        .route("/user/password", post(users::change_password))
        .route("/user/password/token", post(users::request_password_reset))
        .route("/user/password/reset", post(users::reset_password))
        .route("/user/token", post(users::renew_token))
        .route("/users", get(users::search))
        .route("/shares/{hash}/auth", post(users::link_share_auth))
        // Namespaces
        .route("/namespaces", get(namespaces::list).post(namespaces::create))
        .route(
            "/namespaces/{id}",
            get(namespaces::get).put(namespaces::update).delete(namespaces::delete),
        )
        .route("/namespaces/{id}/lists", get(namespaces::lists))
        .route(
            "/namespaces/{id}/teams",
            get(sharing::namespace_teams).post(sharing::namespace_team_create),
        )
        .route(
            "/namespaces/{id}/teams/{team}",
            put(sharing::namespace_team_update).delete(sharing::namespace_team_delete),
        )
        .route(
            "/namespaces/{id}/users",
            get(sharing::namespace_users).post(sharing::namespace_user_create),
        )
        .route(
            "/namespaces/{id}/users/{username}",
            put(sharing::namespace_user_update).delete(sharing::namespace_user_delete),
        )
        // Lists
        .route("/lists", get(lists::list).post(lists::create))
        .route("/lists/{id}", get(lists::get).put(lists::update).delete(lists::delete))
        .route("/lists/{id}/tasks", get(tasks::list).post(tasks::create))
        .route("/lists/{id}/buckets", get(buckets::list).post(buckets::create))
        .route(
            "/lists/{id}/buckets/{bucket}",
            put(buckets::update).delete(buckets::delete),
        )
        .route("/lists/{id}/teams", get(sharing::list_teams).post(sharing::list_team_create))
        .route(
            "/lists/{id}/teams/{team}",
            put(sharing::list_team_update).delete(sharing::list_team_delete),
        )
        .route("/lists/{id}/users", get(sharing::list_users).post(sharing::list_user_create))
        .route(
            "/lists/{id}/users/{username}",
            put(sharing::list_user_update).delete(sharing::list_user_delete),
        )
        .route("/lists/{id}/shares", get(link_shares::list).post(link_shares::create))
        .route(
            "/lists/{id}/shares/{share}",
            get(link_shares::get).delete(link_shares::delete),
        )
        // Tasks
        .route("/tasks/{id}", get(tasks::get).put(tasks::update).delete(tasks::delete))
        .route("/tasks/{id}/assignees", get(tasks::assignees).post(tasks::assign))
        .route("/tasks/{id}/assignees/bulk", post(tasks::assign_bulk))
        .route(
            "/tasks/{id}/assignees/{user}",
            axum::routing::delete(tasks::unassign),
        )
        // Teams
        .route("/teams", get(teams::list).post(teams::create))
        .route("/teams/{id}", get(teams::get).put(teams::update).delete(teams::delete))
        .route("/teams/{id}/members", post(teams::member_create))
        .route(
            "/teams/{id}/members/{username}",
            put(teams::member_update).delete(teams::member_delete),
        )
        // Saved filters
        .route("/filters", get(filters::list).post(filters::create))
        .route(
            "/filters/{id}",
            get(filters::get).put(filters::update).delete(filters::delete),
        );

    if state.metrics.enabled() {
        api = api.route("/metrics", get(health::metrics));
    }

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([
            axum::http::HeaderName::from_static("x-pagination-total-pages"),
            axum::http::HeaderName::from_static("x-pagination-result-count"),
        ]);

    Router::new()
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Router over the fixture database plus request helpers.

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tasklane_api::User;
    use tower::ServiceExt;

    use super::*;
    use crate::keyvalue::KeyValue;

    pub const SECRET: &str = "test-secret";

    pub fn state_with(configure: impl FnOnce(&mut Config)) -> AppState {
        let mut config = Config::default();
        config.service.jwt_secret = SECRET.into();
        configure(&mut config);
        let metrics = Metrics::new(KeyValue::memory(), config.service.enable_metrics);
        AppState {
            db: Db::new(tasklane_models::testing::fixtures()),
            config: Arc::new(config),
            metrics,
        }
    }

    pub fn state() -> AppState {
        state_with(|_| {})
    }

    /// Bearer token for fixture user `id`.
    pub fn token(id: i64) -> String {
        let user = User {
            id,
            username: format!("user{id}"),
            ..Default::default()
        };
        service::user_token(&user, SECRET, 3600, now_unix()).unwrap()
    }

    pub async fn send(
        state: &AppState,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, axum::http::HeaderMap, serde_json::Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header("authorization", format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = router(state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| serde_json::Value::String(String::from_utf8_lossy(&bytes).into()))
        };
        (status, headers, json)
    }

    pub async fn get_as(state: &AppState, user: i64, uri: &str) -> (StatusCode, serde_json::Value) {
        let (status, _, json) = send(state, "GET", uri, Some(&token(user)), None).await;
        (status, json)
    }

    pub async fn send_as(
        state: &AppState,
        user: i64,
        method: &str,
        uri: &str,
        body: serde_json::Value,
    ) -> (StatusCode, serde_json::Value) {
        let (status, _, json) = send(state, method, uri, Some(&token(user)), Some(body)).await;
        (status, json)
    }
}
