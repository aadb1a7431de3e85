use axum::{
    Json,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use tasklane_api::{HealthResponse, InfoResponse};

use super::AppState;
use crate::error::ApiErr;

/// GET /api/v1/health: server liveness check.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /api/v1/info: what this instance allows, readable before login.
pub async fn info(State(state): State<AppState>) -> Json<InfoResponse> {
    let service = &state.config.service;
    Json(InfoResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        max_items_per_page: service.max_items_per_page,
        registration_enabled: service.enable_registration,
        link_sharing_enabled: service.enable_link_sharing,
        metrics_enabled: service.enable_metrics,
    })
}

/// GET /api/v1/metrics: Prometheus text exposition.
pub async fn metrics(State(state): State<AppState>) -> Result<Response, ApiErr> {
    let body = state.metrics.render(super::now_unix() as i64).await?;
    Ok(([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body).into_response())
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use tasklane_models::counts;

    use crate::routes::test_support::{self, send};

    #[tokio::test]
    async fn health_and_info() {
        let state = test_support::state();
        let (status, _, body) = send(&state, "GET", "/api/v1/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");

        let (status, _, body) = send(&state, "GET", "/api/v1/info", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["max_items_per_page"], 50);
        assert_eq!(body["registration_enabled"], true);
        assert_eq!(body["metrics_enabled"], false);
    }

    #[tokio::test]
    async fn metrics_mounted_only_when_enabled() {
        let state = test_support::state();
        let (status, _, _) = send(&state, "GET", "/api/v1/metrics", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let state = test_support::state_with(|c| c.service.enable_metrics = true);
        let totals = counts::totals(&state.db.conn()).unwrap();
        state.metrics.init_counts(totals).await.unwrap();
        let (status, _, body) = send(&state, "GET", "/api/v1/metrics", None, None).await;
        assert_eq!(status, StatusCode::OK);
        let text = body.as_str().unwrap();
        assert!(text.contains("tasklane_list_count 12"), "{text}");
        assert!(text.contains("tasklane_namespace_count 8"), "{text}");
    }
}
