use axum::{
    Json,
    extract::{Path, State},
};
use tasklane_api::{Message, SavedFilter};
use tasklane_models::{Permissions, auth, saved_filters};

use super::AppState;
use super::auth::AuthUser;
use crate::error::{ApiErr, Payload};

fn by_id(id: i64) -> SavedFilter {
    SavedFilter {
        id,
        ..Default::default()
    }
}

/// GET /filters: the caller's saved filters.
pub async fn list(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
) -> Result<Json<Vec<SavedFilter>>, ApiErr> {
    if auth.is_link_share() {
        return Err(tasklane_models::Error::SavedFilterNotAvailableForLinkShare.into());
    }
    let conn = state.db.conn();
    let owner = auth::user_from_auth(&conn, &auth)?;
    Ok(Json(saved_filters::for_owner(&conn, &owner)?))
}

pub async fn create(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Payload(filter): Payload<SavedFilter>,
) -> Result<Json<SavedFilter>, ApiErr> {
    let conn = state.db.conn();
    if !filter.can_create(&conn, &auth)? {
        return Err(ApiErr::forbidden());
    }
    Ok(Json(saved_filters::create(&conn, &auth, &filter)?))
}

pub async fn get(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<SavedFilter>, ApiErr> {
    let conn = state.db.conn();
    if by_id(id).can_read(&conn, &auth)?.is_none() {
        return Err(ApiErr::forbidden());
    }
    Ok(Json(saved_filters::read_one(&conn, id)?))
}

pub async fn update(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path(id): Path<i64>,
    Payload(mut filter): Payload<SavedFilter>,
) -> Result<Json<SavedFilter>, ApiErr> {
    filter.id = id;
    let conn = state.db.conn();
    if !filter.can_update(&conn, &auth)? {
        return Err(ApiErr::forbidden());
    }
    Ok(Json(saved_filters::update(&conn, &filter)?))
}

pub async fn delete(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Message>, ApiErr> {
    let conn = state.db.conn();
    if !by_id(id).can_delete(&conn, &auth)? {
        return Err(ApiErr::forbidden());
    }
    saved_filters::delete(&conn, id)?;
    Ok(Json(Message::new("The filter was deleted successfully.")))
}
