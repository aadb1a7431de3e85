use axum::{
    Json,
    extract::{Path, State},
};
use tasklane_api::{Bucket, List, Message};
use tasklane_models::{Permissions, buckets};

use super::AppState;
use super::auth::AuthUser;
use crate::error::{ApiErr, Payload};

fn bucket(list_id: i64, id: i64) -> Bucket {
    Bucket {
        id,
        list_id,
        ..Default::default()
    }
}

/// GET /lists/{id}/buckets: the kanban board with every task placed.
pub async fn list(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path(list_id): Path<i64>,
) -> Result<Json<Vec<Bucket>>, ApiErr> {
    let conn = state.db.conn();
    let list = List {
        id: list_id,
        ..Default::default()
    };
    if list.can_read(&conn, &auth)?.is_none() {
        return Err(ApiErr::forbidden());
    }
    Ok(Json(buckets::read_all(&conn, list_id)?))
}

pub async fn create(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path(list_id): Path<i64>,
    Payload(mut body): Payload<Bucket>,
) -> Result<Json<Bucket>, ApiErr> {
    body.list_id = list_id;
    let conn = state.db.conn();
    if !body.can_create(&conn, &auth)? {
        return Err(ApiErr::forbidden());
    }
    Ok(Json(buckets::create(&conn, &auth, &body)?))
}

pub async fn update(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path((list_id, id)): Path<(i64, i64)>,
    Payload(mut body): Payload<Bucket>,
) -> Result<Json<Bucket>, ApiErr> {
    body.id = id;
    body.list_id = list_id;
    let conn = state.db.conn();
    if !body.can_update(&conn, &auth)? {
        return Err(ApiErr::forbidden());
    }
    Ok(Json(buckets::update(&conn, list_id, &body)?))
}

pub async fn delete(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path((list_id, id)): Path<(i64, i64)>,
) -> Result<Json<Message>, ApiErr> {
    let conn = state.db.conn();
    if !bucket(list_id, id).can_delete(&conn, &auth)? {
        return Err(ApiErr::forbidden());
    }
    buckets::delete(&conn, list_id, id)?;
    Ok(Json(Message::new("The bucket was successfully deleted.")))
}
