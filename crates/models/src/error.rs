use tasklane_api::{InvalidRight, ServiceError};

/// Everything a domain operation can fail with.
///
/// Each variant carries a stable numeric [`code`](Error::code) and an HTTP
/// [`status`](Error::status_code); the server renders both.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("forbidden")]
    GenericForbidden,

    // ── users ──
    #[error("a user with this username already exists")]
    UsernameExists,
    #[error("a user with this email address already exists")]
    EmailExists,
    #[error("please specify a username and a password")]
    NoUsernamePassword,
    #[error("the user does not exist")]
    UserDoesNotExist,
    #[error("invalid email confirm token")]
    InvalidEmailConfirmToken,
    #[error("invalid password reset token")]
    InvalidPasswordResetToken,
    #[error("wrong username or password")]
    WrongUsernameOrPassword,
    #[error("the email address of this user is not confirmed")]
    EmailNotConfirmed,
    #[error("please specify a new password")]
    EmptyNewPassword,

    #[error("invalid data: {0}")]
    InvalidData(String),

    // ── lists ──
    #[error("list {id} does not exist")]
    ListDoesNotExist { id: i64 },
    #[error("you must provide a title for the list")]
    ListTitleCannotBeEmpty,
    #[error("the list share does not exist")]
    ListShareDoesNotExist,
    #[error("a list with this identifier already exists")]
    ListIdentifierIsNotUnique,
    #[error("list {id} is archived")]
    ListIsArchived { id: i64 },

    // ── tasks ──
    #[error("you must provide a title for the task")]
    TaskCannotBeEmpty,
    #[error("task {id} does not exist")]
    TaskDoesNotExist { id: i64 },
    #[error("this user is already assigned to that task")]
    UserAlreadyAssigned,

    // ── namespaces ──
    #[error("namespace {id} does not exist")]
    NamespaceDoesNotExist { id: i64 },
    #[error("you must provide a title for the namespace")]
    NamespaceNameCannotBeEmpty,
    #[error("namespace {id} is archived")]
    NamespaceIsArchived { id: i64 },

    // ── teams ──
    #[error("you must provide a name for the team")]
    TeamNameCannotBeEmpty,
    #[error("team {id} does not exist")]
    TeamDoesNotExist { id: i64 },
    #[error("this team already has access")]
    TeamAlreadyHasAccess,
    #[error("this user is already a member of that team")]
    UserIsMemberOfTeam,
    #[error("cannot delete the last team member")]
    CannotDeleteLastTeamMember,
    #[error("this team does not have access to the namespace")]
    TeamDoesNotHaveAccessToNamespace,
    #[error("this team does not have access to the list")]
    TeamDoesNotHaveAccessToList,

    // ── user shares ──
    #[error("this user already has access")]
    UserAlreadyHasAccess,
    #[error("this user does not have access to the list")]
    UserDoesNotHaveAccessToList,
    #[error("this user does not have access to the namespace")]
    UserDoesNotHaveAccessToNamespace,

    #[error("invalid right {0}")]
    InvalidRight(i64),

    // ── kanban ──
    #[error("bucket {id} does not exist")]
    BucketDoesNotExist { id: i64 },
    #[error("bucket {bucket_id} does not belong to list {list_id}")]
    BucketDoesNotBelongToList { bucket_id: i64, list_id: i64 },
    #[error("you cannot remove the last bucket of a list")]
    CannotRemoveLastBucket,

    // ── saved filters ──
    #[error("saved filter {id} does not exist")]
    SavedFilterDoesNotExist { id: i64 },
    #[error("saved filters are not available for link shares")]
    SavedFilterNotAvailableForLinkShare,

    // ── infrastructure ──
    #[error("{0}")]
    Service(#[from] ServiceError),
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<InvalidRight> for Error {
    fn from(err: InvalidRight) -> Self {
        Self::InvalidRight(err.0)
    }
}

impl Error {
    /// Stable error code sent to clients. Infrastructure failures use 0.
    pub fn code(&self) -> i64 {
        match self {
            Self::GenericForbidden => 0,
            Self::UsernameExists => 1001,
            Self::EmailExists => 1002,
            Self::NoUsernamePassword => 1004,
            Self::UserDoesNotExist => 1005,
            Self::InvalidEmailConfirmToken => 1009,
            Self::InvalidPasswordResetToken => 1010,
            Self::WrongUsernameOrPassword => 1011,
            Self::EmailNotConfirmed => 1012,
            Self::EmptyNewPassword => 1013,
            Self::InvalidData(_) => 2002,
            Self::ListDoesNotExist { .. } => 3001,
            Self::ListTitleCannotBeEmpty => 3006,
            Self::ListShareDoesNotExist => 3007,
            Self::ListIdentifierIsNotUnique => 3008,
            Self::ListIsArchived { .. } => 3009,
            Self::TaskCannotBeEmpty => 4001,
            Self::TaskDoesNotExist { .. } => 4002,
            Self::UserAlreadyAssigned => 4007,
            Self::NamespaceDoesNotExist { .. } => 5001,
            Self::NamespaceNameCannotBeEmpty => 5006,
            Self::NamespaceIsArchived { .. } => 5012,
            Self::TeamNameCannotBeEmpty => 6001,
            Self::TeamDoesNotExist { .. } => 6002,
            Self::TeamAlreadyHasAccess => 6004,
            Self::UserIsMemberOfTeam => 6005,
            Self::CannotDeleteLastTeamMember => 6006,
            Self::TeamDoesNotHaveAccessToNamespace => 6007,
            Self::TeamDoesNotHaveAccessToList => 6008,
            Self::UserAlreadyHasAccess => 7002,
            Self::UserDoesNotHaveAccessToList => 7003,
            Self::UserDoesNotHaveAccessToNamespace => 7004,
            Self::InvalidRight(_) => 9001,
            Self::BucketDoesNotExist { .. } => 10001,
            Self::BucketDoesNotBelongToList { .. } => 10002,
            Self::CannotRemoveLastBucket => 10003,
            Self::SavedFilterDoesNotExist { .. } => 11001,
            Self::SavedFilterNotAvailableForLinkShare => 11002,
            Self::Service(ServiceError::BadRequest(_)) => 2002,
            Self::Service(_) | Self::Database(_) | Self::Json(_) | Self::Io(_) => 0,
        }
    }

    /// HTTP status as a `u16`.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::GenericForbidden
            | Self::WrongUsernameOrPassword
            | Self::TeamDoesNotHaveAccessToNamespace
            | Self::UserDoesNotHaveAccessToList
            | Self::UserDoesNotHaveAccessToNamespace => 403,

            Self::UserDoesNotExist
            | Self::ListDoesNotExist { .. }
            | Self::ListShareDoesNotExist
            | Self::TaskDoesNotExist { .. }
            | Self::NamespaceDoesNotExist { .. }
            | Self::TeamDoesNotExist { .. }
            | Self::BucketDoesNotExist { .. }
            | Self::SavedFilterDoesNotExist { .. } => 404,

            Self::TeamAlreadyHasAccess | Self::UserIsMemberOfTeam | Self::UserAlreadyHasAccess => {
                409
            }

            Self::EmailNotConfirmed
            | Self::EmptyNewPassword
            | Self::ListIsArchived { .. }
            | Self::NamespaceIsArchived { .. }
            | Self::CannotRemoveLastBucket
            | Self::SavedFilterNotAvailableForLinkShare => 412,

            Self::Service(e) => e.status_code(),
            Self::Database(_) | Self::Json(_) | Self::Io(_) => 500,

            _ => 400,
        }
    }

    /// Whether the error is an infrastructure failure rather than a domain outcome.
    pub fn is_internal(&self) -> bool {
        self.status_code() >= 500
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_and_statuses() {
        assert_eq!(Error::ListDoesNotExist { id: 3 }.code(), 3001);
        assert_eq!(Error::ListDoesNotExist { id: 3 }.status_code(), 404);
        assert_eq!(Error::NamespaceIsArchived { id: 1 }.status_code(), 412);
        assert_eq!(Error::TeamAlreadyHasAccess.status_code(), 409);
        assert_eq!(Error::TeamDoesNotHaveAccessToList.status_code(), 400);
        assert_eq!(Error::CannotDeleteLastTeamMember.code(), 6006);
        assert_eq!(Error::GenericForbidden.status_code(), 403);
    }

    #[test]
    fn infrastructure_errors_are_internal() {
        let err = Error::from(rusqlite::Error::InvalidQuery);
        assert!(err.is_internal());
        assert_eq!(err.code(), 0);

        let err = Error::from(ServiceError::BadRequest("too long".into()));
        assert!(!err.is_internal());
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.code(), 2002);
    }

    #[test]
    fn invalid_right_converts() {
        let err: Error = tasklane_api::Right::try_from(7).unwrap_err().into();
        assert!(matches!(err, Error::InvalidRight(7)));
        assert_eq!(err.to_string(), "invalid right 7");
    }
}
