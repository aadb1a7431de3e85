//! Shared business logic: framework-agnostic pure functions.
//!
//! Route handlers and the domain layer call these so validation rules, token
//! issuance and pagination math live in one place.

use crate::crypto::{self, AUTH_TYPE_LINK_SHARE, AUTH_TYPE_USER, Claims};
use crate::{LinkSharing, ServiceError, User};

// ─── Validation ─────────────────────────────────────────────────────────────

/// Maximum length (in characters) of titles and names.
pub const MAX_TITLE_LEN: usize = 250;

/// Validate and normalize an email address. Returns the lowercased, trimmed email.
pub fn validate_email(email: &str) -> Result<String, ServiceError> {
    let email = email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') || email.len() > 250 {
        return Err(ServiceError::BadRequest("invalid email address".into()));
    }
    Ok(email)
}

/// Validate a password (8-72 bytes).
pub fn validate_password(password: &str) -> Result<(), ServiceError> {
    if password.len() < 8 {
        return Err(ServiceError::BadRequest(
            "password must be at least 8 characters".into(),
        ));
    }
    if password.len() > 72 {
        return Err(ServiceError::BadRequest(
            "password must be at most 72 bytes".into(),
        ));
    }
    Ok(())
}

/// Validate and normalize a username. Returns the trimmed username.
pub fn validate_username(username: &str) -> Result<String, ServiceError> {
    let trimmed = username.trim().to_string();
    if trimmed.is_empty() || trimmed.chars().count() > MAX_TITLE_LEN {
        return Err(ServiceError::BadRequest(
            "username must be 1-250 characters".into(),
        ));
    }
    if trimmed.contains(char::is_whitespace) {
        return Err(ServiceError::BadRequest(
            "username must not contain spaces".into(),
        ));
    }
    Ok(trimmed)
}

/// Check the length of a title or name. Emptiness is checked by the caller,
/// which owns the matching domain error.
pub fn validate_title(field: &str, title: &str) -> Result<(), ServiceError> {
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(ServiceError::BadRequest(format!(
            "{field} must be at most {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(())
}

/// Validate a hex color (without `#`, at most six characters).
pub fn validate_hex_color(color: &str) -> Result<(), ServiceError> {
    if color.chars().count() > 6 {
        return Err(ServiceError::BadRequest(
            "hex_color must be at most 6 characters".into(),
        ));
    }
    Ok(())
}

/// Validate a list identifier (at most ten characters).
pub fn validate_identifier(identifier: &str) -> Result<(), ServiceError> {
    if identifier.chars().count() > 10 {
        return Err(ServiceError::BadRequest(
            "identifier must be at most 10 characters".into(),
        ));
    }
    Ok(())
}

// ─── Pagination ─────────────────────────────────────────────────────────────

/// LIMIT/OFFSET derived from `page` and `per_page`. `limit == None` returns everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pagination {
    pub limit: Option<u64>,
    pub offset: u64,
}

impl Pagination {
    /// No limit at all.
    pub fn all() -> Self {
        Self::default()
    }

    /// Number of pages needed for `total` items.
    pub fn total_pages(&self, total: i64) -> i64 {
        match self.limit {
            Some(limit) if limit > 0 => (total + limit as i64 - 1) / limit as i64,
            _ => 1,
        }
    }
}

/// Resolve a page index into a limit and offset.
///
/// A page below 1 disables pagination; a missing or non-positive `per_page`
/// falls back to `max_per_page`, and larger values are capped by it.
pub fn pagination(page: Option<i64>, per_page: Option<i64>, max_per_page: i64) -> Pagination {
    let page = page.unwrap_or(1);
    if page < 1 {
        return Pagination::all();
    }
    let per_page = match per_page {
        Some(p) if p > 0 && p <= max_per_page => p,
        _ => max_per_page,
    };
    let limit = per_page.max(0) as u64;
    // SQLite takes OFFSET as a signed 64-bit integer.
    let offset = limit.saturating_mul(page as u64 - 1).min(i64::MAX as u64);
    Pagination {
        limit: Some(limit),
        offset,
    }
}

// ─── Saved filter ids ───────────────────────────────────────────────────────

/// List id under which a saved filter appears (`-id - 1`).
pub fn list_id_from_saved_filter_id(filter_id: i64) -> i64 {
    -filter_id - 1
}

/// Saved filter behind a pseudo list id, or 0 when the list is not a filter.
pub fn saved_filter_id_from_list_id(list_id: i64) -> i64 {
    let filter_id = -list_id - 1;
    if filter_id > 0 { filter_id } else { 0 }
}

// ─── Tokens ─────────────────────────────────────────────────────────────────

/// Length of a link-share hash.
pub const LINK_SHARE_HASH_LEN: usize = 40;

/// Issue a token for a logged-in user.
pub fn user_token(user: &User, secret: &str, ttl_secs: u64, now_unix: u64) -> Result<String, ServiceError> {
    let claims = Claims {
        kind: AUTH_TYPE_USER,
        id: user.id,
        username: user.username.clone(),
        hash: String::new(),
        list_id: 0,
        right: 0,
        iat: now_unix,
        exp: now_unix + ttl_secs,
    };
    crypto::sign_jwt(&claims, secret)
}

/// Issue a token for a link share.
pub fn link_share_token(
    share: &LinkSharing,
    secret: &str,
    ttl_secs: u64,
    now_unix: u64,
) -> Result<String, ServiceError> {
    let claims = Claims {
        kind: AUTH_TYPE_LINK_SHARE,
        id: share.id,
        username: String::new(),
        hash: share.hash.clone(),
        list_id: share.list_id,
        right: share.right.as_i64(),
        iat: now_unix,
        exp: now_unix + ttl_secs,
    };
    crypto::sign_jwt(&claims, secret)
}

/// Current time formatted the way SQLite's `datetime('now')` stores it.
pub fn now_sqlite() -> String {
    chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username() {
        assert!(validate_username("alice").is_ok());
        assert_eq!(validate_username("  bob  ").unwrap(), "bob");
        assert!(validate_username("").is_err());
        assert!(validate_username("a b").is_err());
        assert!(validate_username(&"x".repeat(251)).is_err());
        assert!(validate_username(&"x".repeat(250)).is_ok());
    }

    #[test]
    fn test_validate_title_counts_characters() {
        assert!(validate_title("title", &"ж".repeat(250)).is_ok());
        assert!(validate_title("title", &"ж".repeat(251)).is_err());
    }

    #[test]
    fn test_pagination() {
        assert_eq!(pagination(Some(1), Some(20), 50), Pagination { limit: Some(20), offset: 0 });
        assert_eq!(pagination(Some(3), Some(20), 50), Pagination { limit: Some(20), offset: 40 });
        assert_eq!(pagination(Some(2), None, 50), Pagination { limit: Some(50), offset: 50 });
        assert_eq!(pagination(Some(1), Some(-1), 50), Pagination { limit: Some(50), offset: 0 });
        assert_eq!(pagination(Some(1), Some(500), 50), Pagination { limit: Some(50), offset: 0 });
        assert_eq!(pagination(Some(0), Some(20), 50), Pagination::all());
        assert_eq!(pagination(None, None, 50).limit, Some(50));
    }

    #[test]
    fn test_pagination_huge_page_saturates() {
        let p = pagination(Some(i64::MAX), Some(50), 50);
        assert_eq!(p.limit, Some(50));
        assert_eq!(p.offset, i64::MAX as u64);
    }

    #[test]
    fn test_total_pages() {
        let p = pagination(Some(1), Some(20), 50);
        assert_eq!(p.total_pages(0), 0);
        assert_eq!(p.total_pages(20), 1);
        assert_eq!(p.total_pages(21), 2);
        assert_eq!(Pagination::all().total_pages(300), 1);
    }

    #[test]
    fn test_saved_filter_ids() {
        assert_eq!(list_id_from_saved_filter_id(1), -2);
        assert_eq!(saved_filter_id_from_list_id(-2), 1);
        assert_eq!(saved_filter_id_from_list_id(-1), 0);
        assert_eq!(saved_filter_id_from_list_id(5), 0);
    }
}
