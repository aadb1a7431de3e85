use axum::{
    Json,
    extract::{Path, Query, State},
    response::Response,
};
use tasklane_api::{List, ListParams, Message, Namespace};
use tasklane_models::counts::{LIST_COUNT_KEY, NAMESPACE_COUNT_KEY, TASK_COUNT_KEY};
use tasklane_models::{Permissions, namespaces};

use super::auth::AuthUser;
use super::{AppState, paged};
use crate::error::{ApiErr, Payload};

fn by_id(id: i64) -> Namespace {
    Namespace {
        id,
        ..Default::default()
    }
}

/// GET /namespaces: every namespace the caller sees, with its lists.
pub async fn list(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Query(params): Query<ListParams>,
) -> Result<Response, ApiErr> {
    let pagination = state.pagination(&params);
    let conn = state.db.conn();
    let page = namespaces::read_all(
        &conn,
        &auth,
        params.search(),
        params.is_archived.unwrap_or(false),
        pagination,
    )?;
    Ok(paged(page, pagination))
}

pub async fn create(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Payload(ns): Payload<Namespace>,
) -> Result<Json<Namespace>, ApiErr> {
    let created = {
        let conn = state.db.conn();
        if !ns.can_create(&conn, &auth)? {
            return Err(ApiErr::forbidden());
        }
        namespaces::create(&conn, &auth, &ns)?
    };
    state.metrics.incr(NAMESPACE_COUNT_KEY).await;
    Ok(Json(created))
}

pub async fn get(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Namespace>, ApiErr> {
    let conn = state.db.conn();
    if by_id(id).can_read(&conn, &auth)?.is_none() {
        return Err(ApiErr::forbidden());
    }
    Ok(Json(namespaces::read_one(&conn, &auth, id)?))
}

pub async fn update(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path(id): Path<i64>,
    Payload(mut ns): Payload<Namespace>,
) -> Result<Json<Namespace>, ApiErr> {
    ns.id = id;
    let conn = state.db.conn();
    if !ns.can_update(&conn, &auth)? {
        return Err(ApiErr::forbidden());
    }
    Ok(Json(namespaces::update(&conn, &auth, &ns)?))
}

pub async fn delete(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Message>, ApiErr> {
    let deleted = {
        let conn = state.db.conn();
        if !by_id(id).can_delete(&conn, &auth)? {
            return Err(ApiErr::forbidden());
        }
        namespaces::delete(&conn, id)?
    };
    state.metrics.decr(NAMESPACE_COUNT_KEY).await;
    state.metrics.adjust(LIST_COUNT_KEY, -deleted.lists).await;
    state.metrics.adjust(TASK_COUNT_KEY, -deleted.tasks).await;
    Ok(Json(Message::new("The namespace was successfully deleted.")))
}

/// GET /namespaces/{id}/lists
pub async fn lists(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Vec<List>>, ApiErr> {
    let conn = state.db.conn();
    if by_id(id).can_read(&conn, &auth)?.is_none() {
        return Err(ApiErr::forbidden());
    }
    Ok(Json(namespaces::lists_by_namespace(&conn, &auth, id)?))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;
    use tasklane_models::counts;

    use crate::routes::test_support::{self, get_as, send, send_as, token};

    fn ids(body: &serde_json::Value) -> Vec<i64> {
        body.as_array()
            .unwrap()
            .iter()
            .map(|ns| ns["id"].as_i64().unwrap())
            .collect()
    }

    #[tokio::test]
    async fn list_orders_pseudo_namespaces_first() {
        let state = test_support::state();
        let (status, headers, body) =
            test_support::send(&state, "GET", "/api/v1/namespaces", Some(&token(1)), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ids(&body), vec![-3, -2, -1, 1, 5, 6]);
        assert_eq!(headers["x-pagination-total-pages"], "1");
        assert_eq!(headers["x-pagination-result-count"], "6");

        let (_, body) = get_as(&state, 1, "/api/v1/namespaces?is_archived=true").await;
        assert!(ids(&body).contains(&4));
    }

    #[tokio::test]
    async fn crud_round() {
        let state = test_support::state_with(|c| c.service.enable_metrics = true);
        let totals = counts::totals(&state.db.conn()).unwrap();
        state.metrics.init_counts(totals).await.unwrap();

        let (status, body) = send_as(&state, 1, "POST", "/api/v1/namespaces", json!({"title": "home"})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["owner"]["id"], 1);
        let id = body["id"].as_i64().unwrap();
        assert_eq!(state.metrics.count(counts::NAMESPACE_COUNT_KEY).await.unwrap(), 9);

        let (status, body) = send_as(
            &state,
            1,
            "PUT",
            &format!("/api/v1/namespaces/{id}"),
            json!({"title": "home, renamed"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["title"], "home, renamed");

        let (status, _) = get_as(&state, 2, &format!("/api/v1/namespaces/{id}")).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _, _) = send(
            &state,
            "DELETE",
            &format!("/api/v1/namespaces/{id}"),
            Some(&token(1)),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(state.metrics.count(counts::NAMESPACE_COUNT_KEY).await.unwrap(), 8);

        let (status, body) = get_as(&state, 1, &format!("/api/v1/namespaces/{id}")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], 5001);
    }

    #[tokio::test]
    async fn empty_title_is_rejected() {
        let state = test_support::state();
        let (status, body) = send_as(&state, 1, "POST", "/api/v1/namespaces", json!({"title": ""})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], 5006);
    }

    #[tokio::test]
    async fn only_admins_update_or_delete() {
        let state = test_support::state();
        // user1 holds a read share on namespace 5.
        let (status, _) = send_as(&state, 1, "PUT", "/api/v1/namespaces/5", json!({"title": "mine now"})).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _, _) = send(&state, "DELETE", "/api/v1/namespaces/5", Some(&token(1)), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn lists_of_a_namespace() {
        let state = test_support::state();
        let (status, body) = get_as(&state, 1, "/api/v1/namespaces/1/lists").await;
        assert_eq!(status, StatusCode::OK);
        let titles: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|l| l["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles, vec!["Test1", "Test2"]);

        let (status, _) = get_as(&state, 3, "/api/v1/namespaces/1/lists").await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }
}
