use axum::{
    Json,
    extract::{Path, Query, State},
    response::Response,
};
use tasklane_api::{ListParams, Message, Team, TeamMember};
use tasklane_models::counts::TEAM_COUNT_KEY;
use tasklane_models::{Permissions, teams};

use super::auth::AuthUser;
use super::{AppState, paged};
use crate::error::{ApiErr, Payload};

fn by_id(id: i64) -> Team {
    Team {
        id,
        ..Default::default()
    }
}

fn member(team_id: i64, username: String) -> TeamMember {
    TeamMember {
        team_id,
        username,
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
    let page = teams::read_all(&conn, &auth, params.search(), pagination)?;
    Ok(paged(page, pagination))
}

pub async fn create(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Payload(team): Payload<Team>,
) -> Result<Json<Team>, ApiErr> {
    let created = {
        let conn = state.db.conn();
        if !team.can_create(&conn, &auth)? {
            return Err(ApiErr::forbidden());
        }
        teams::create(&conn, &auth, &team)?
    };
    state.metrics.incr(TEAM_COUNT_KEY).await;
    Ok(Json(created))
}

pub async fn get(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Team>, ApiErr> {
    let conn = state.db.conn();
    if by_id(id).can_read(&conn, &auth)?.is_none() {
        return Err(ApiErr::forbidden());
    }
    Ok(Json(teams::read_one(&conn, id)?))
}

pub async fn update(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path(id): Path<i64>,
    Payload(mut team): Payload<Team>,
) -> Result<Json<Team>, ApiErr> {
    team.id = id;
    let conn = state.db.conn();
    if !team.can_update(&conn, &auth)? {
        return Err(ApiErr::forbidden());
    }
    Ok(Json(teams::update(&conn, &team)?))
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
        teams::delete(&conn, id)?;
    }
    state.metrics.decr(TEAM_COUNT_KEY).await;
    Ok(Json(Message::new("The team was successfully deleted.")))
}

pub async fn member_create(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path(team_id): Path<i64>,
    Payload(mut body): Payload<TeamMember>,
) -> Result<Json<TeamMember>, ApiErr> {
    body.team_id = team_id;
    let conn = state.db.conn();
    if !body.can_create(&conn, &auth)? {
        return Err(ApiErr::forbidden());
    }
    Ok(Json(teams::member_create(&conn, &body)?))
}

/// PUT /teams/{id}/members/{username}: flips the admin flag; the body is ignored.
pub async fn member_update(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path((team_id, username)): Path<(i64, String)>,
) -> Result<Json<TeamMember>, ApiErr> {
    let conn = state.db.conn();
    if !member(team_id, username.clone()).can_update(&conn, &auth)? {
        return Err(ApiErr::forbidden());
    }
    Ok(Json(teams::member_toggle_admin(&conn, team_id, &username)?))
}

pub async fn member_delete(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path((team_id, username)): Path<(i64, String)>,
) -> Result<Json<Message>, ApiErr> {
    let conn = state.db.conn();
    if !member(team_id, username.clone()).can_delete(&conn, &auth)? {
        return Err(ApiErr::forbidden());
    }
    teams::member_delete(&conn, team_id, &username)?;
    Ok(Json(Message::new("The user was successfully removed from the team.")))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::routes::test_support::{self, get_as, send, send_as, token};

    #[tokio::test]
    async fn teams_of_the_caller() {
        let state = test_support::state();
        let (status, body) = get_as(&state, 1, "/api/v1/teams").await;
        assert_eq!(status, StatusCode::OK);
        let names: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["testteam1", "testteam3"]);

        let (status, _) = get_as(&state, 1, "/api/v1/teams/2").await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn create_makes_creator_admin() {
        let state = test_support::state();
        let (status, body) = send_as(&state, 2, "POST", "/api/v1/teams", json!({"name": "crew"})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["members"][0]["username"], "user2");
        assert_eq!(body["members"][0]["admin"], true);

        let (status, body) = send_as(&state, 2, "POST", "/api/v1/teams", json!({"name": ""})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], 6001);
    }

    #[tokio::test]
    async fn only_admins_manage() {
        let state = test_support::state();
        // user2 is a plain member of team 1.
        let (status, _) = send_as(&state, 2, "PUT", "/api/v1/teams/1", json!({"name": "taken over"})).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = send_as(&state, 1, "PUT", "/api/v1/teams/1", json!({"name": "renamed"})).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _, _) = send(&state, "DELETE", "/api/v1/teams/3", Some(&token(2)), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _, _) = send(&state, "DELETE", "/api/v1/teams/3", Some(&token(1)), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn members() {
        let state = test_support::state();
        let (status, body) =
            send_as(&state, 1, "POST", "/api/v1/teams/1/members", json!({"username": "user3"})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["admin"], false);

        let (status, body) =
            send_as(&state, 1, "POST", "/api/v1/teams/1/members", json!({"username": "user3"})).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], 6005);

        let (status, body) =
            send_as(&state, 1, "PUT", "/api/v1/teams/1/members/user3", json!({"admin": false})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["admin"], true);

        let (status, _, _) =
            send(&state, "DELETE", "/api/v1/teams/1/members/user3", Some(&token(1)), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _, body) =
            send(&state, "DELETE", "/api/v1/teams/3/members/user1", Some(&token(1)), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], 6006);
    }
}
