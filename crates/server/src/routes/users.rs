use axum::{
    Json,
    extract::{Path, Query, State},
};
use tasklane_api::{
    EmailConfirmRequest, LinkShareToken, ListParams, LoginRequest, Message, PasswordChangeRequest,
    PasswordResetRequest, PasswordTokenRequest, RegisterRequest, Token, User, service,
};
use tasklane_models::counts::USER_COUNT_KEY;
use tasklane_models::{Auth, auth, link_shares, users};

use super::auth::AuthUser;
use super::{AppState, now_unix};
use crate::error::{ApiErr, Payload};

pub async fn register(
    State(state): State<AppState>,
    Payload(req): Payload<RegisterRequest>,
) -> Result<Json<User>, ApiErr> {
    if !state.config.service.enable_registration {
        return Err(ApiErr::not_found("registration is disabled"));
    }
    let registered = {
        let conn = state.db.conn();
        users::register(&conn, &req, state.config.mailer.enabled)?
    };
    if registered.confirm_token.is_some() {
        tracing::info!(
            user_id = registered.user.id,
            "email confirmation pending for {}",
            registered.user.username
        );
    }
    state.metrics.incr(USER_COUNT_KEY).await;
    Ok(Json(registered.user))
}

pub async fn login(
    State(state): State<AppState>,
    Payload(req): Payload<LoginRequest>,
) -> Result<Json<Token>, ApiErr> {
    let user = {
        let conn = state.db.conn();
        users::check_login(&conn, &req)?
    };
    let token = service::user_token(
        &user,
        &state.config.service.jwt_secret,
        state.config.service.jwt_ttl_secs,
        now_unix(),
    )?;
    tracing::debug!(user_id = user.id, "user logged in");
    Ok(Json(Token { token }))
}

pub async fn me(State(state): State<AppState>, AuthUser(auth): AuthUser) -> Result<Json<User>, ApiErr> {
    let conn = state.db.conn();
    Ok(Json(auth::user_from_auth(&conn, &auth)?))
}

pub async fn confirm_email(
    State(state): State<AppState>,
    Payload(req): Payload<EmailConfirmRequest>,
) -> Result<Json<Message>, ApiErr> {
    let conn = state.db.conn();
    let user = users::confirm_email(&conn, &req.token)?;
    tracing::info!(user_id = user.id, "email confirmed");
    Ok(Json(Message::new("The email was confirmed successfully.")))
}

pub async fn request_password_reset(
    State(state): State<AppState>,
    Payload(req): Payload<PasswordTokenRequest>,
) -> Result<Json<Message>, ApiErr> {
    let conn = state.db.conn();
    let (user, _token) = users::request_password_reset(&conn, &req.email)?;
    tracing::info!(user_id = user.id, "password reset requested for {}", user.username);
    Ok(Json(Message::new("Token was sent.")))
}

pub async fn reset_password(
    State(state): State<AppState>,
    Payload(req): Payload<PasswordResetRequest>,
) -> Result<Json<Message>, ApiErr> {
    let conn = state.db.conn();
    users::reset_password(&conn, &req)?;
    Ok(Json(Message::new("The password was updated successfully.")))
}

pub async fn change_password(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Payload(req): Payload<PasswordChangeRequest>,
) -> Result<Json<Message>, ApiErr> {
    let conn = state.db.conn();
    let user = auth::user_from_auth(&conn, &auth)?;
    users::change_password(&conn, user.id, &req)?;
    Ok(Json(Message::new("The password was updated successfully.")))
}

/// A fresh token for the same principal. Link-share tokens are re-issued
/// from the share as stored now.
pub async fn renew_token(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
) -> Result<Json<Token>, ApiErr> {
    let service_cfg = &state.config.service;
    let now = now_unix();
    let token = {
        let conn = state.db.conn();
        match &auth {
            Auth::LinkShare { id, .. } => {
                let share = link_shares::get_by_id(&conn, *id)?;
                service::link_share_token(&share, &service_cfg.jwt_secret, service_cfg.jwt_ttl_secs, now)?
            }
            Auth::User { .. } => {
                let user = auth::user_from_auth(&conn, &auth)?;
                service::user_token(&user, &service_cfg.jwt_secret, service_cfg.jwt_ttl_secs, now)?
            }
        }
    };
    Ok(Json(Token { token }))
}

/// Users whose username contains `s`, for share and assignee dialogs.
pub async fn search(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<User>>, ApiErr> {
    if auth.is_link_share() {
        return Err(ApiErr::forbidden());
    }
    let conn = state.db.conn();
    let mut found = users::search(&conn, params.search())?;
    for user in &mut found {
        user.email.clear();
    }
    Ok(Json(found))
}

/// Exchange a share hash for a link-share token.
pub async fn link_share_auth(
    State(state): State<AppState>,
    Path(hash): Path<String>,
) -> Result<Json<LinkShareToken>, ApiErr> {
    if !state.config.service.enable_link_sharing {
        return Err(ApiErr::not_found("link sharing is disabled"));
    }
    let share = {
        let conn = state.db.conn();
        link_shares::get_by_hash(&conn, &hash)?
    };
    let token = service::link_share_token(
        &share,
        &state.config.service.jwt_secret,
        state.config.service.jwt_ttl_secs,
        now_unix(),
    )?;
    Ok(Json(LinkShareToken {
        token,
        list_id: share.list_id,
    }))
}
