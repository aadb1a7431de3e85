//! Team and user shares of namespaces and lists.
//!
//! The sixteen handlers differ only in which share type they build from the
//! path; the generic helpers below do the work.

use axum::{
    Json,
    extract::{Path, Query, State},
    response::Response,
};
use serde::Serialize;
use tasklane_api::db::shares::ShareKind;
use tasklane_api::{ListParams, ListUser, Message, NamespaceUser, TeamList, TeamNamespace};
use tasklane_models::sharing::{self, Share};
use tasklane_models::{Auth, Permissions};

use super::auth::AuthUser;
use super::{AppState, paged};
use crate::error::{ApiErr, Payload};

async fn create_share<S>(state: &AppState, auth: &Auth, share: S) -> Result<Json<S>, ApiErr>
where
    S: Share + Permissions + Serialize,
{
    let conn = state.db.conn();
    if !share.can_create(&conn, auth)? {
        return Err(ApiErr::forbidden());
    }
    Ok(Json(sharing::create(&conn, &share)?))
}

async fn update_share<S>(state: &AppState, auth: &Auth, share: S) -> Result<Json<S>, ApiErr>
where
    S: Share + Permissions + Serialize,
{
    let conn = state.db.conn();
    if !share.can_update(&conn, auth)? {
        return Err(ApiErr::forbidden());
    }
    Ok(Json(sharing::update(&conn, &share)?))
}

async fn delete_share<S>(state: &AppState, auth: &Auth, share: S) -> Result<Json<Message>, ApiErr>
where
    S: Share + Permissions,
{
    let conn = state.db.conn();
    if !share.can_delete(&conn, auth)? {
        return Err(ApiErr::forbidden());
    }
    sharing::delete(&conn, &share)?;
    Ok(Json(Message::new("The share was successfully deleted.")))
}

async fn teams_of<S: Permissions>(
    state: &AppState,
    auth: &Auth,
    probe: S,
    kind: ShareKind,
    object_id: i64,
    params: &ListParams,
) -> Result<Response, ApiErr> {
    let pagination = state.pagination(params);
    let conn = state.db.conn();
    if probe.can_read(&conn, auth)?.is_none() {
        return Err(ApiErr::forbidden());
    }
    let page = sharing::teams_with_right(&conn, kind, object_id, params.search(), pagination)?;
    Ok(paged(page, pagination))
}

async fn users_of<S: Permissions>(
    state: &AppState,
    auth: &Auth,
    probe: S,
    kind: ShareKind,
    object_id: i64,
    params: &ListParams,
) -> Result<Response, ApiErr> {
    let pagination = state.pagination(params);
    let conn = state.db.conn();
    if probe.can_read(&conn, auth)?.is_none() {
        return Err(ApiErr::forbidden());
    }
    let page = sharing::users_with_right(&conn, kind, object_id, params.search(), pagination)?;
    Ok(paged(page, pagination))
}

fn team_namespace(namespace_id: i64, team_id: i64) -> TeamNamespace {
    TeamNamespace {
        namespace_id,
        team_id,
        ..Default::default()
    }
}

fn team_list(list_id: i64, team_id: i64) -> TeamList {
    TeamList {
        list_id,
        team_id,
        ..Default::default()
    }
}

fn namespace_user(namespace_id: i64, username: String) -> NamespaceUser {
    NamespaceUser {
        namespace_id,
        username,
        ..Default::default()
    }
}

fn list_user(list_id: i64, username: String) -> ListUser {
    ListUser {
        list_id,
        username,
        ..Default::default()
    }
}

// ── Namespace × team ──────────────────────────────────────────────────────

pub async fn namespace_teams(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path(id): Path<i64>,
    Query(params): Query<ListParams>,
) -> Result<Response, ApiErr> {
    teams_of(&state, &auth, team_namespace(id, 0), ShareKind::TeamNamespace, id, &params).await
}

pub async fn namespace_team_create(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path(id): Path<i64>,
    Payload(mut share): Payload<TeamNamespace>,
) -> Result<Json<TeamNamespace>, ApiErr> {
    share.namespace_id = id;
    create_share(&state, &auth, share).await
}

pub async fn namespace_team_update(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path((id, team_id)): Path<(i64, i64)>,
    Payload(mut share): Payload<TeamNamespace>,
) -> Result<Json<TeamNamespace>, ApiErr> {
    share.namespace_id = id;
    share.team_id = team_id;
    update_share(&state, &auth, share).await
}

pub async fn namespace_team_delete(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path((id, team_id)): Path<(i64, i64)>,
) -> Result<Json<Message>, ApiErr> {
    delete_share(&state, &auth, team_namespace(id, team_id)).await
}

// ── Namespace × user ──────────────────────────────────────────────────────

pub async fn namespace_users(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path(id): Path<i64>,
    Query(params): Query<ListParams>,
) -> Result<Response, ApiErr> {
    users_of(
        &state,
        &auth,
        namespace_user(id, String::new()),
        ShareKind::UserNamespace,
        id,
        &params,
    )
    .await
}

pub async fn namespace_user_create(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path(id): Path<i64>,
    Payload(mut share): Payload<NamespaceUser>,
) -> Result<Json<NamespaceUser>, ApiErr> {
    share.namespace_id = id;
    create_share(&state, &auth, share).await
}

pub async fn namespace_user_update(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path((id, username)): Path<(i64, String)>,
    Payload(mut share): Payload<NamespaceUser>,
) -> Result<Json<NamespaceUser>, ApiErr> {
    share.namespace_id = id;
    share.username = username;
    update_share(&state, &auth, share).await
}

pub async fn namespace_user_delete(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path((id, username)): Path<(i64, String)>,
) -> Result<Json<Message>, ApiErr> {
    delete_share(&state, &auth, namespace_user(id, username)).await
}

// ── List × team ───────────────────────────────────────────────────────────

pub async fn list_teams(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path(id): Path<i64>,
    Query(params): Query<ListParams>,
) -> Result<Response, ApiErr> {
    teams_of(&state, &auth, team_list(id, 0), ShareKind::TeamList, id, &params).await
}

pub async fn list_team_create(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path(id): Path<i64>,
    Payload(mut share): Payload<TeamList>,
) -> Result<Json<TeamList>, ApiErr> {
    share.list_id = id;
    create_share(&state, &auth, share).await
}

pub async fn list_team_update(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path((id, team_id)): Path<(i64, i64)>,
    Payload(mut share): Payload<TeamList>,
) -> Result<Json<TeamList>, ApiErr> {
    share.list_id = id;
    share.team_id = team_id;
    update_share(&state, &auth, share).await
}

pub async fn list_team_delete(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path((id, team_id)): Path<(i64, i64)>,
) -> Result<Json<Message>, ApiErr> {
    delete_share(&state, &auth, team_list(id, team_id)).await
}

// ── List × user ───────────────────────────────────────────────────────────

pub async fn list_users(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path(id): Path<i64>,
    Query(params): Query<ListParams>,
) -> Result<Response, ApiErr> {
    users_of(&state, &auth, list_user(id, String::new()), ShareKind::UserList, id, &params).await
}

pub async fn list_user_create(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path(id): Path<i64>,
    Payload(mut share): Payload<ListUser>,
) -> Result<Json<ListUser>, ApiErr> {
    share.list_id = id;
    create_share(&state, &auth, share).await
}

pub async fn list_user_update(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path((id, username)): Path<(i64, String)>,
    Payload(mut share): Payload<ListUser>,
) -> Result<Json<ListUser>, ApiErr> {
    share.list_id = id;
    share.username = username;
    update_share(&state, &auth, share).await
}

pub async fn list_user_delete(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path((id, username)): Path<(i64, String)>,
) -> Result<Json<Message>, ApiErr> {
    delete_share(&state, &auth, list_user(id, username)).await
}
