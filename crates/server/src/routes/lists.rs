use axum::{
    Json,
    extract::{Path, Query, State},
    response::Response,
};
use tasklane_api::{List, ListParams, Message};
use tasklane_models::counts::{LIST_COUNT_KEY, TASK_COUNT_KEY};
use tasklane_models::{Permissions, lists};

use super::auth::AuthUser;
use super::{AppState, paged};
use crate::error::{ApiErr, Payload};

fn by_id(id: i64) -> List {
    List {
        id,
        ..Default::default()
    }
}

pub async fn list(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Query(params): Query<ListParams>,
) -> Result<Response, ApiErr> {
    let pagination = state.pagination(&params);
    let conn = state.db.conn();
    let page = lists::read_all(
        &conn,
        &auth,
        params.search(),
        params.is_archived.unwrap_or(false),
        pagination,
    )?;
    Ok(paged(page, pagination))
}

/// POST /lists: the target namespace comes from `namespace_id` in the body.
pub async fn create(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Payload(list): Payload<List>,
) -> Result<Json<List>, ApiErr> {
    let created = {
        let conn = state.db.conn();
        if !list.can_create(&conn, &auth)? {
            return Err(ApiErr::forbidden());
        }
        lists::create(&conn, &auth, &list)?
    };
    state.metrics.incr(LIST_COUNT_KEY).await;
    Ok(Json(created))
}

pub async fn get(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<List>, ApiErr> {
    let conn = state.db.conn();
    if by_id(id).can_read(&conn, &auth)?.is_none() {
        return Err(ApiErr::forbidden());
    }
    Ok(Json(lists::read_one(&conn, id)?))
}

pub async fn update(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path(id): Path<i64>,
    Payload(mut list): Payload<List>,
) -> Result<Json<List>, ApiErr> {
    list.id = id;
    let conn = state.db.conn();
    if !list.can_update(&conn, &auth)? {
        return Err(ApiErr::forbidden());
    }
    Ok(Json(lists::update(&conn, &list)?))
}

pub async fn delete(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Message>, ApiErr> {
    let tasks = {
        let conn = state.db.conn();
        if !by_id(id).can_delete(&conn, &auth)? {
            return Err(ApiErr::forbidden());
        }
        lists::delete(&conn, id)?
    };
    state.metrics.decr(LIST_COUNT_KEY).await;
    state.metrics.adjust(TASK_COUNT_KEY, -tasks).await;
    Ok(Json(Message::new("The list was successfully deleted.")))
}
