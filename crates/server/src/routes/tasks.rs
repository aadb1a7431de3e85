use axum::{
    Json,
    extract::{Path, Query, State},
    response::Response,
};
use tasklane_api::{BulkAssignees, List, ListParams, Message, Task, TaskAssignee, User};
use tasklane_models::counts::TASK_COUNT_KEY;
use tasklane_models::{Permissions, assignees, tasks};

use super::auth::AuthUser;
use super::{AppState, paged};
use crate::error::{ApiErr, Payload};

fn by_id(id: i64) -> Task {
    Task {
        id,
        ..Default::default()
    }
}

/// GET /lists/{id}/tasks: also serves the favorites and saved-filter lists.
pub async fn list(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path(list_id): Path<i64>,
    Query(params): Query<ListParams>,
) -> Result<Response, ApiErr> {
    let pagination = state.pagination(&params);
    let conn = state.db.conn();
    let list = List {
        id: list_id,
        ..Default::default()
    };
    if list.can_read(&conn, &auth)?.is_none() {
        return Err(ApiErr::forbidden());
    }
    let page = tasks::read_all_for_list(&conn, &auth, list_id, params.search(), pagination)?;
    Ok(paged(page, pagination))
}

pub async fn create(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path(list_id): Path<i64>,
    Payload(mut task): Payload<Task>,
) -> Result<Json<Task>, ApiErr> {
    task.list_id = list_id;
    let created = {
        let conn = state.db.conn();
        if !task.can_create(&conn, &auth)? {
            return Err(ApiErr::forbidden());
        }
        tasks::create(&conn, &auth, &task)?
    };
    state.metrics.incr(TASK_COUNT_KEY).await;
    Ok(Json(created))
}

pub async fn get(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Task>, ApiErr> {
    let conn = state.db.conn();
    if by_id(id).can_read(&conn, &auth)?.is_none() {
        return Err(ApiErr::forbidden());
    }
    Ok(Json(tasks::read_one(&conn, id)?))
}

pub async fn update(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path(id): Path<i64>,
    Payload(mut task): Payload<Task>,
) -> Result<Json<Task>, ApiErr> {
    task.id = id;
    let conn = state.db.conn();
    if !task.can_update(&conn, &auth)? {
        return Err(ApiErr::forbidden());
    }
    Ok(Json(tasks::update(&conn, &auth, &task)?))
}

pub async fn delete(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Message>, ApiErr> {
    {
        let conn = state.db.conn();
        if !by_id(id).can_delete(&conn, &auth)? {
            return Err(ApiErr::forbidden());
        }
        tasks::delete(&conn, id)?;
    }
    state.metrics.decr(TASK_COUNT_KEY).await;
    Ok(Json(Message::new("The task was successfully deleted.")))
}

// ── Assignees ─────────────────────────────────────────────────────────────

fn assignee(task_id: i64, user_id: i64) -> TaskAssignee {
    TaskAssignee {
        task_id,
        user_id,
        ..Default::default()
    }
}

pub async fn assignees(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path(task_id): Path<i64>,
    Query(params): Query<ListParams>,
) -> Result<Response, ApiErr> {
    let pagination = state.pagination(&params);
    let conn = state.db.conn();
    if assignee(task_id, 0).can_read(&conn, &auth)?.is_none() {
        return Err(ApiErr::forbidden());
    }
    let page = assignees::read_all(&conn, task_id, params.search(), pagination)?;
    Ok(paged(page, pagination))
}

pub async fn assign(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path(task_id): Path<i64>,
    Payload(body): Payload<TaskAssignee>,
) -> Result<Json<TaskAssignee>, ApiErr> {
    let wanted = assignee(task_id, body.user_id);
    let conn = state.db.conn();
    if !wanted.can_create(&conn, &auth)? {
        return Err(ApiErr::forbidden());
    }
    Ok(Json(assignees::create(&conn, &wanted)?))
}

/// POST /tasks/{id}/assignees/bulk: replace all assignees at once.
pub async fn assign_bulk(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path(task_id): Path<i64>,
    Payload(body): Payload<BulkAssignees>,
) -> Result<Json<Vec<User>>, ApiErr> {
    let conn = state.db.conn();
    if !assignee(task_id, 0).can_create(&conn, &auth)? {
        return Err(ApiErr::forbidden());
    }
    Ok(Json(assignees::bulk(&conn, task_id, &body.assignees)?))
}

pub async fn unassign(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path((task_id, user_id)): Path<(i64, i64)>,
) -> Result<Json<Message>, ApiErr> {
    let conn = state.db.conn();
    if !assignee(task_id, user_id).can_delete(&conn, &auth)? {
        return Err(ApiErr::forbidden());
    }
    assignees::delete(&conn, task_id, user_id)?;
    Ok(Json(Message::new("The assignee was successfully deleted.")))
}
