//! The rights interface every entity implements.

use rusqlite::Connection;
use tasklane_api::Right;

use crate::{Auth, Result};

/// Per-entity authorization checks.
///
/// Handlers call the matching check before running an operation and answer
/// 403 when it comes back false. Checks that need the stored entity load it
/// themselves and fail with the entity's "does not exist" error.
pub trait Permissions {
    fn can_create(&self, _conn: &Connection, _auth: &Auth) -> Result<bool> {
        Ok(false)
    }

    /// Highest right the principal holds, or `None` without read access.
    fn can_read(&self, _conn: &Connection, _auth: &Auth) -> Result<Option<Right>> {
        Ok(None)
    }

    fn can_update(&self, _conn: &Connection, _auth: &Auth) -> Result<bool> {
        Ok(false)
    }

    fn can_delete(&self, _conn: &Connection, _auth: &Auth) -> Result<bool> {
        Ok(false)
    }
}

/// Highest of the rights found, ignoring values that do not name a right.
pub(crate) fn max_right(values: impl IntoIterator<Item = Option<i64>>) -> Option<Right> {
    values
        .into_iter()
        .flatten()
        .filter_map(|v| Right::try_from(v).ok())
        .max()
}
