use axum::{
    Json,
    extract::{Path, Query, State},
    response::Response,
};
use tasklane_api::{LinkSharing, ListParams, Message};
use tasklane_models::{Permissions, link_shares};

use super::auth::AuthUser;
use super::{AppState, paged};
use crate::error::{ApiErr, Payload};

fn of_list(list_id: i64) -> LinkSharing {
    LinkSharing {
        list_id,
        ..Default::default()
    }
}

fn ensure_enabled(state: &AppState) -> Result<(), ApiErr> {
    if state.config.service.enable_link_sharing {
        Ok(())
    } else {
        Err(ApiErr::not_found("link sharing is disabled"))
    }
}

pub async fn list(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path(list_id): Path<i64>,
    Query(params): Query<ListParams>,
) -> Result<Response, ApiErr> {
    ensure_enabled(&state)?;
    let pagination = state.pagination(&params);
    let conn = state.db.conn();
    if of_list(list_id).can_read(&conn, &auth)?.is_none() {
        return Err(ApiErr::forbidden());
    }
    let page = link_shares::read_all(&conn, list_id, params.search(), pagination)?;
    Ok(paged(page, pagination))
}

pub async fn create(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path(list_id): Path<i64>,
    Payload(mut share): Payload<LinkSharing>,
) -> Result<Json<LinkSharing>, ApiErr> {
    ensure_enabled(&state)?;
    share.list_id = list_id;
    let conn = state.db.conn();
    if !share.can_create(&conn, &auth)? {
        return Err(ApiErr::forbidden());
    }
    Ok(Json(link_shares::create(&conn, &auth, &share)?))
}

pub async fn get(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path((list_id, id)): Path<(i64, i64)>,
) -> Result<Json<LinkSharing>, ApiErr> {
    ensure_enabled(&state)?;
    let conn = state.db.conn();
    if of_list(list_id).can_read(&conn, &auth)?.is_none() {
        return Err(ApiErr::forbidden());
    }
    let share = link_shares::read_one(&conn, id)?;
    if share.list_id != list_id {
        return Err(tasklane_models::Error::ListShareDoesNotExist.into());
    }
    Ok(Json(share))
}

pub async fn delete(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path((list_id, id)): Path<(i64, i64)>,
) -> Result<Json<Message>, ApiErr> {
    ensure_enabled(&state)?;
    let conn = state.db.conn();
    let share = LinkSharing {
        id,
        list_id,
        ..Default::default()
    };
    if !share.can_delete(&conn, &auth)? {
        return Err(ApiErr::forbidden());
    }
    link_shares::delete(&conn, list_id, id)?;
    Ok(Json(Message::new("The link share was successfully deleted.")))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::routes::test_support::{self, get_as, send, send_as, token};

    #[tokio::test]
    async fn shares_of_a_list() {
        let state = test_support::state();
        let (status, body) = get_as(&state, 1, "/api/v1/lists/2/shares").await;
        assert_eq!(status, StatusCode::OK);
        let hashes: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["hash"].as_str().unwrap())
            .collect();
        assert_eq!(hashes, vec!["test2", "test3"]);

        let (status, body) = get_as(&state, 1, "/api/v1/lists/2/shares/3").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["right"], 2);
        assert_eq!(body["shared_by"]["id"], 1);

        let (status, body) = get_as(&state, 1, "/api/v1/lists/1/shares/3").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], 3007);
    }

    #[tokio::test]
    async fn create_and_delete() {
        let state = test_support::state();
        let (status, body) = send_as(&state, 1, "POST", "/api/v1/lists/1/shares", json!({"right": 1})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["hash"].as_str().unwrap().len(), 40);
        let id = body["id"].as_i64().unwrap();

        let (status, _, _) =
            send(&state, "DELETE", &format!("/api/v1/lists/1/shares/{id}"), Some(&token(1)), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn link_shares_cannot_share_further() {
        let state = test_support::state();
        let (_, _, body) = send(&state, "POST", "/api/v1/shares/test3/auth", None, None).await;
        let share_token = body["token"].as_str().unwrap().to_string();
        let (status, _, _) = send(
            &state,
            "POST",
            "/api/v1/lists/2/shares",
            Some(&share_token),
            Some(json!({"right": 0})),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn disabled_link_sharing_hides_endpoints() {
        let state = test_support::state_with(|c| c.service.enable_link_sharing = false);
        let (status, _) = get_as(&state, 1, "/api/v1/lists/2/shares").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _, _) = send(&state, "POST", "/api/v1/shares/test/auth", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
