//! User query builders.

use sea_query::{Alias, Asterisk, Expr, Func, Order, Query, SelectStatement, SqliteQueryBuilder};

use super::Built;
use super::tables::Users;

// ── Column helpers ────────────────────────────────────────────────────────

/// Public user columns: id, username, email, created, updated.
pub fn user_columns(q: &mut SelectStatement) -> &mut SelectStatement {
    q.column((Users::Table, Users::Id))
        .column((Users::Table, Users::Username))
        .column((Users::Table, Users::Email))
        .column((Users::Table, Users::Created))
        .column((Users::Table, Users::Updated))
}

/// Public columns followed by password_hash, password_salt, is_active.
fn credential_columns(q: &mut SelectStatement) -> &mut SelectStatement {
    user_columns(q)
        .column((Users::Table, Users::PasswordHash))
        .column((Users::Table, Users::PasswordSalt))
        .column((Users::Table, Users::IsActive))
}

// ── Inserts ───────────────────────────────────────────────────────────────

/// INSERT a new user.
pub fn insert(
    username: &str,
    email: &str,
    password_hash: &str,
    password_salt: &str,
    is_active: bool,
    email_confirm_token: Option<&str>,
) -> Built {
    Query::insert()
        .into_table(Users::Table)
        .columns([
            Users::Username,
            Users::Email,
            Users::PasswordHash,
            Users::PasswordSalt,
            Users::IsActive,
            Users::EmailConfirmToken,
        ])
        .values_panic([
            username.into(),
            email.into(),
            password_hash.into(),
            password_salt.into(),
            is_active.into(),
            email_confirm_token.map(|s| s.to_string()).into(),
        ])
        .build(SqliteQueryBuilder)
}

// ── Lookups ───────────────────────────────────────────────────────────────

/// SELECT a user by id.
pub fn get_by_id(id: i64) -> Built {
    let mut q = Query::select().to_owned();
    user_columns(&mut q);
    q.from(Users::Table)
        .and_where(Expr::col((Users::Table, Users::Id)).eq(id))
        .build(SqliteQueryBuilder)
}

/// SELECT several users by id.
pub fn get_many(ids: &[i64]) -> Built {
    let mut q = Query::select().to_owned();
    user_columns(&mut q);
    q.from(Users::Table)
        .and_where(Expr::col((Users::Table, Users::Id)).is_in(ids.iter().copied()))
        .build(SqliteQueryBuilder)
}

/// SELECT a user by username.
pub fn get_by_username(username: &str) -> Built {
    let mut q = Query::select().to_owned();
    user_columns(&mut q);
    q.from(Users::Table)
        .and_where(Expr::col((Users::Table, Users::Username)).eq(username))
        .build(SqliteQueryBuilder)
}

/// SELECT a user by email.
pub fn get_by_email(email: &str) -> Built {
    let mut q = Query::select().to_owned();
    user_columns(&mut q);
    q.from(Users::Table)
        .and_where(Expr::col((Users::Table, Users::Email)).eq(email))
        .build(SqliteQueryBuilder)
}

/// SELECT user + credentials by username (login).
pub fn get_credentials_by_username(username: &str) -> Built {
    let mut q = Query::select().to_owned();
    credential_columns(&mut q);
    q.from(Users::Table)
        .and_where(Expr::col((Users::Table, Users::Username)).eq(username))
        .build(SqliteQueryBuilder)
}

/// SELECT user + credentials by id (password change).
pub fn get_credentials_by_id(id: i64) -> Built {
    let mut q = Query::select().to_owned();
    credential_columns(&mut q);
    q.from(Users::Table)
        .and_where(Expr::col((Users::Table, Users::Id)).eq(id))
        .build(SqliteQueryBuilder)
}

/// SELECT a user holding a password reset token.
pub fn get_by_reset_token(token: &str) -> Built {
    let mut q = Query::select().to_owned();
    user_columns(&mut q);
    q.from(Users::Table)
        .and_where(Expr::col((Users::Table, Users::PasswordResetToken)).eq(token))
        .build(SqliteQueryBuilder)
}

/// SELECT a user holding an email confirmation token.
pub fn get_by_confirm_token(token: &str) -> Built {
    let mut q = Query::select().to_owned();
    user_columns(&mut q);
    q.from(Users::Table)
        .and_where(Expr::col((Users::Table, Users::EmailConfirmToken)).eq(token))
        .build(SqliteQueryBuilder)
}

/// Count users with the given username.
pub fn count_by_username(username: &str) -> Built {
    Query::select()
        .expr_as(Func::count(Expr::col(Asterisk)), Alias::new("count"))
        .from(Users::Table)
        .and_where(Expr::col(Users::Username).eq(username))
        .build(SqliteQueryBuilder)
}

/// Count users with the given email.
pub fn count_by_email(email: &str) -> Built {
    Query::select()
        .expr_as(Func::count(Expr::col(Asterisk)), Alias::new("count"))
        .from(Users::Table)
        .and_where(Expr::col(Users::Email).eq(email))
        .build(SqliteQueryBuilder)
}

/// Users whose username contains `search`, for share dialogs.
pub fn search(search: &str, limit: u64) -> Built {
    let mut q = Query::select().to_owned();
    user_columns(&mut q);
    q.from(Users::Table)
        .and_where(Expr::col((Users::Table, Users::Username)).like(format!("%{search}%")))
        .and_where(Expr::col((Users::Table, Users::IsActive)).eq(true))
        .order_by((Users::Table, Users::Username), Order::Asc)
        .limit(limit)
        .build(SqliteQueryBuilder)
}

/// Total number of users.
pub fn count() -> Built {
    Query::select()
        .expr_as(Func::count(Expr::col(Asterisk)), Alias::new("count"))
        .from(Users::Table)
        .build(SqliteQueryBuilder)
}

// ── Updates ───────────────────────────────────────────────────────────────

/// Replace a user's password hash and salt; clears any pending reset token.
pub fn update_password(id: i64, password_hash: &str, password_salt: &str) -> Built {
    Query::update()
        .table(Users::Table)
        .value(Users::PasswordHash, password_hash)
        .value(Users::PasswordSalt, password_salt)
        .value(Users::PasswordResetToken, Option::<String>::None)
        .value(Users::Updated, Expr::cust("datetime('now')"))
        .and_where(Expr::col(Users::Id).eq(id))
        .build(SqliteQueryBuilder)
}

/// Store a password reset token.
pub fn set_reset_token(id: i64, token: &str) -> Built {
    Query::update()
        .table(Users::Table)
        .value(Users::PasswordResetToken, token)
        .and_where(Expr::col(Users::Id).eq(id))
        .build(SqliteQueryBuilder)
}

/// Activate a user and drop their confirmation token.
pub fn confirm_email(id: i64) -> Built {
    Query::update()
        .table(Users::Table)
        .value(Users::IsActive, true)
        .value(Users::EmailConfirmToken, Option::<String>::None)
        .value(Users::Updated, Expr::cust("datetime('now')"))
        .and_where(Expr::col(Users::Id).eq(id))
        .build(SqliteQueryBuilder)
}
