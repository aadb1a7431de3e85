//! Users: registration, login, password management and lookups.

use std::collections::HashMap;

use rusqlite::{Connection, Row};
use tasklane_api::crypto;
use tasklane_api::db::users as q;
use tasklane_api::service;
use tasklane_api::{LoginRequest, PasswordChangeRequest, PasswordResetRequest, RegisterRequest, User};

use crate::{Error, Result, sq};

/// Map the public user columns starting at `start`.
pub(crate) fn user_at(row: &Row<'_>, start: usize) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(start)?,
        username: row.get(start + 1)?,
        email: row.get(start + 2)?,
        created: row.get(start + 3)?,
        updated: row.get(start + 4)?,
    })
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    user_at(row, 0)
}

struct Credentials {
    user: User,
    password_hash: String,
    password_salt: String,
    is_active: bool,
}

fn credentials_from_row(row: &Row<'_>) -> rusqlite::Result<Credentials> {
    Ok(Credentials {
        user: user_at(row, 0)?,
        password_hash: row.get(5)?,
        password_salt: row.get(6)?,
        is_active: row.get(7)?,
    })
}

// ── Lookups ───────────────────────────────────────────────────────────────

pub fn get_by_id(conn: &Connection, id: i64) -> Result<User> {
    sq::query_opt(conn, q::get_by_id(id), user_from_row)?.ok_or(Error::UserDoesNotExist)
}

pub fn get_by_username(conn: &Connection, username: &str) -> Result<User> {
    sq::query_opt(conn, q::get_by_username(username), user_from_row)?
        .ok_or(Error::UserDoesNotExist)
}

/// Users by id. Ids without a user are absent from the map.
pub fn get_many(conn: &Connection, ids: &[i64]) -> Result<HashMap<i64, User>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let users = sq::query_map(conn, q::get_many(ids), user_from_row)?;
    Ok(users.into_iter().map(|u| (u.id, u)).collect())
}

/// Active users whose username contains `search`.
pub fn search(conn: &Connection, search: &str) -> Result<Vec<User>> {
    Ok(sq::query_map(conn, q::search(search, 50), user_from_row)?)
}

pub fn count(conn: &Connection) -> Result<i64> {
    Ok(sq::count(conn, q::count())?)
}

// ── Registration ──────────────────────────────────────────────────────────

/// A freshly registered user and, when confirmation is required, the token
/// that activates it.
#[derive(Debug)]
pub struct Registered {
    pub user: User,
    pub confirm_token: Option<String>,
}

/// Create a user. With `require_confirmation` the account starts inactive
/// until [`confirm_email`] is called with the returned token.
pub fn register(
    conn: &Connection,
    req: &RegisterRequest,
    require_confirmation: bool,
) -> Result<Registered> {
    if req.username.trim().is_empty() || req.password.is_empty() || req.email.trim().is_empty() {
        return Err(Error::NoUsernamePassword);
    }
    let username = service::validate_username(&req.username)?;
    let email = service::validate_email(&req.email)?;
    service::validate_password(&req.password)?;

    if sq::count(conn, q::count_by_username(&username))? > 0 {
        return Err(Error::UsernameExists);
    }
    if sq::count(conn, q::count_by_email(&email))? > 0 {
        return Err(Error::EmailExists);
    }

    let (hash, salt) = crypto::hash_password(&req.password)?;
    let confirm_token = if require_confirmation {
        Some(crypto::generate_token()?)
    } else {
        None
    };
    let id = sq::insert(
        conn,
        q::insert(
            &username,
            &email,
            &hash,
            &salt,
            !require_confirmation,
            confirm_token.as_deref(),
        ),
    )?;
    tracing::info!(user_id = id, "registered user {username}");

    Ok(Registered {
        user: get_by_id(conn, id)?,
        confirm_token,
    })
}

/// Activate the account holding `token`.
pub fn confirm_email(conn: &Connection, token: &str) -> Result<User> {
    if token.is_empty() {
        return Err(Error::InvalidEmailConfirmToken);
    }
    let user = sq::query_opt(conn, q::get_by_confirm_token(token), user_from_row)?
        .ok_or(Error::InvalidEmailConfirmToken)?;
    sq::execute(conn, q::confirm_email(user.id))?;
    Ok(user)
}

// ── Login & passwords ─────────────────────────────────────────────────────

/// Check a username/password pair.
pub fn check_login(conn: &Connection, req: &LoginRequest) -> Result<User> {
    if req.username.is_empty() || req.password.is_empty() {
        return Err(Error::NoUsernamePassword);
    }
    let creds = sq::query_opt(
        conn,
        q::get_credentials_by_username(&req.username),
        credentials_from_row,
    )?
    .ok_or(Error::WrongUsernameOrPassword)?;

    if !crypto::verify_password(&req.password, &creds.password_hash, &creds.password_salt) {
        return Err(Error::WrongUsernameOrPassword);
    }
    if !creds.is_active {
        return Err(Error::EmailNotConfirmed);
    }
    Ok(creds.user)
}

/// Store a fresh reset token for the user with `email` and return it.
pub fn request_password_reset(conn: &Connection, email: &str) -> Result<(User, String)> {
    if email.trim().is_empty() {
        return Err(Error::NoUsernamePassword);
    }
    let email = email.trim().to_lowercase();
    let user =
        sq::query_opt(conn, q::get_by_email(&email), user_from_row)?.ok_or(Error::UserDoesNotExist)?;
    let token = crypto::generate_token()?;
    sq::execute(conn, q::set_reset_token(user.id, &token))?;
    Ok((user, token))
}

/// Set a new password using a reset token. The token is consumed.
pub fn reset_password(conn: &Connection, req: &PasswordResetRequest) -> Result<()> {
    if req.new_password.is_empty() {
        return Err(Error::NoUsernamePassword);
    }
    if req.token.is_empty() {
        return Err(Error::InvalidPasswordResetToken);
    }
    let user = sq::query_opt(conn, q::get_by_reset_token(&req.token), user_from_row)?
        .ok_or(Error::InvalidPasswordResetToken)?;
    service::validate_password(&req.new_password)?;
    let (hash, salt) = crypto::hash_password(&req.new_password)?;
    sq::execute(conn, q::update_password(user.id, &hash, &salt))?;
    tracing::info!(user_id = user.id, "password reset");
    Ok(())
}

/// Change the password of a logged-in user after checking the old one.
pub fn change_password(conn: &Connection, user_id: i64, req: &PasswordChangeRequest) -> Result<()> {
    if req.new_password.is_empty() {
        return Err(Error::EmptyNewPassword);
    }
    let creds = sq::query_opt(conn, q::get_credentials_by_id(user_id), credentials_from_row)?
        .ok_or(Error::UserDoesNotExist)?;
    if !crypto::verify_password(&req.old_password, &creds.password_hash, &creds.password_salt) {
        return Err(Error::WrongUsernameOrPassword);
    }
    service::validate_password(&req.new_password)?;
    let (hash, salt) = crypto::hash_password(&req.new_password)?;
    sq::execute(conn, q::update_password(user_id, &hash, &salt))?;
    Ok(())
}
