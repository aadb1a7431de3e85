use rusqlite::Connection;
use tasklane_api::{LinkSharing, Right, User};

use crate::{Error, Result, users};

/// The principal a request acts as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Auth {
    /// A logged-in user.
    User { id: i64, username: String },
    /// Anonymous access through a link share; bound to one list.
    LinkShare {
        id: i64,
        hash: String,
        list_id: i64,
        right: Right,
        shared_by: i64,
    },
}

impl Auth {
    pub fn user(user: &User) -> Self {
        Self::User {
            id: user.id,
            username: user.username.clone(),
        }
    }

    pub fn link_share(share: &LinkSharing) -> Self {
        Self::LinkShare {
            id: share.id,
            hash: share.hash.clone(),
            list_id: share.list_id,
            right: share.right,
            shared_by: share.shared_by_id,
        }
    }

    /// Id of the user, or of the link share.
    pub fn id(&self) -> i64 {
        match self {
            Self::User { id, .. } | Self::LinkShare { id, .. } => *id,
        }
    }

    pub fn user_id(&self) -> Option<i64> {
        match self {
            Self::User { id, .. } => Some(*id),
            Self::LinkShare { .. } => None,
        }
    }

    pub fn is_link_share(&self) -> bool {
        matches!(self, Self::LinkShare { .. })
    }

    /// User recorded as author of things created through this principal.
    /// Link shares act as the user who created the share.
    pub fn acting_user_id(&self) -> i64 {
        match self {
            Self::User { id, .. } => *id,
            Self::LinkShare { shared_by, .. } => *shared_by,
        }
    }
}

/// Resolve a user principal to its stored user.
pub fn user_from_auth(conn: &Connection, auth: &Auth) -> Result<User> {
    match auth {
        Auth::User { id, .. } => users::get_by_id(conn, *id),
        Auth::LinkShare { .. } => Err(Error::GenericForbidden),
    }
}
