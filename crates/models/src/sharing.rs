//! Team and user shares of namespaces and lists.
//!
//! The four share kinds differ only in their subject (team or user) and
//! object (namespace or list). [`Share`] captures those differences so one
//! set of operations serves all of them.

use rusqlite::Connection;
use tasklane_api::db::shares::{self as q, ShareKind};
use tasklane_api::service::Pagination;
use tasklane_api::{
    List, ListUser, Namespace, NamespaceUser, Right, TeamList, TeamNamespace, TeamWithRight, User,
    UserWithRight,
};

use crate::{Auth, Error, Page, Permissions, Result, lists, namespaces, sq, teams, users};

/// A share row as the API sees it.
pub trait Share: Clone {
    const KIND: ShareKind;

    fn object_id(&self) -> i64;
    fn right(&self) -> Right;

    /// Id of the team or user the share is for. Fails when it does not exist.
    fn resolve_subject(&mut self, conn: &Connection) -> Result<i64>;

    /// Fill in the stored columns.
    fn stored(&mut self, id: i64, right: Right, created: String, updated: String);
}

fn missing_share(kind: ShareKind) -> Error {
    match kind {
        ShareKind::TeamNamespace => Error::TeamDoesNotHaveAccessToNamespace,
        ShareKind::TeamList => Error::TeamDoesNotHaveAccessToList,
        ShareKind::UserNamespace => Error::UserDoesNotHaveAccessToNamespace,
        ShareKind::UserList => Error::UserDoesNotHaveAccessToList,
    }
}

fn already_shared(kind: ShareKind) -> Error {
    if kind.is_team() {
        Error::TeamAlreadyHasAccess
    } else {
        Error::UserAlreadyHasAccess
    }
}

/// Owner of the shared object; fails when the object does not exist.
fn object_owner(conn: &Connection, kind: ShareKind, object_id: i64) -> Result<i64> {
    Ok(match kind {
        ShareKind::TeamNamespace | ShareKind::UserNamespace => {
            namespaces::get_simple(conn, object_id)?.owner_id
        }
        ShareKind::TeamList | ShareKind::UserList => lists::stored(conn, object_id)?.owner_id,
    })
}

fn is_object_admin(conn: &Connection, auth: &Auth, kind: ShareKind, object_id: i64) -> Result<bool> {
    match kind {
        ShareKind::TeamNamespace | ShareKind::UserNamespace => namespaces::is_admin(conn, auth, object_id),
        ShareKind::TeamList | ShareKind::UserList => lists::is_admin(conn, auth, object_id),
    }
}

fn object_right(conn: &Connection, auth: &Auth, kind: ShareKind, object_id: i64) -> Result<Option<Right>> {
    match kind {
        ShareKind::TeamNamespace | ShareKind::UserNamespace => Namespace {
            id: object_id,
            ..Default::default()
        }
        .can_read(conn, auth),
        ShareKind::TeamList | ShareKind::UserList => List {
            id: object_id,
            ..Default::default()
        }
        .can_read(conn, auth),
    }
}

fn load<S: Share>(conn: &Connection, share: &mut S, subject_id: i64) -> Result<S> {
    let (id, right, created, updated) = sq::query_opt(conn, q::get(S::KIND, subject_id, share.object_id()), |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, i64>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
        ))
    })?
    .ok_or_else(|| missing_share(S::KIND))?;
    share.stored(id, Right::try_from(right)?, created, updated);
    Ok(share.clone())
}

/// Grant access. Sharing with whoever owns the object is rejected.
pub fn create<S: Share>(conn: &Connection, share: &S) -> Result<S> {
    let mut share = share.clone();
    let subject_id = share.resolve_subject(conn)?;
    let owner_id = object_owner(conn, S::KIND, share.object_id())?;
    if !S::KIND.is_team() && owner_id == subject_id {
        return Err(Error::UserAlreadyHasAccess);
    }
    if sq::count(conn, q::exists(S::KIND, subject_id, share.object_id()))? > 0 {
        return Err(already_shared(S::KIND));
    }
    sq::insert(
        conn,
        q::insert(S::KIND, subject_id, share.object_id(), share.right().as_i64()),
    )?;
    tracing::debug!(kind = ?S::KIND, subject_id, object_id = share.object_id(), "created share");
    load(conn, &mut share, subject_id)
}

/// Change the right of an existing share.
pub fn update<S: Share>(conn: &Connection, share: &S) -> Result<S> {
    let mut share = share.clone();
    let subject_id = share.resolve_subject(conn)?;
    object_owner(conn, S::KIND, share.object_id())?;
    if sq::count(conn, q::exists(S::KIND, subject_id, share.object_id()))? == 0 {
        return Err(missing_share(S::KIND));
    }
    sq::execute(
        conn,
        q::update_right(S::KIND, subject_id, share.object_id(), share.right().as_i64()),
    )?;
    load(conn, &mut share, subject_id)
}

pub fn delete<S: Share>(conn: &Connection, share: &S) -> Result<()> {
    let mut share = share.clone();
    let subject_id = share.resolve_subject(conn)?;
    if sq::execute(conn, q::delete(S::KIND, subject_id, share.object_id()))? == 0 {
        return Err(missing_share(S::KIND));
    }
    Ok(())
}

/// Teams with access to a namespace or list, with their rights.
pub fn teams_with_right(
    conn: &Connection,
    kind: ShareKind,
    object_id: i64,
    search: &str,
    pagination: Pagination,
) -> Result<Page<TeamWithRight>> {
    object_owner(conn, kind, object_id)?;
    let rows = sq::query_map(conn, q::teams_with_right(kind, object_id, search), |row| {
        Ok((teams::team_from_row(row)?, row.get::<_, i64>(6)?))
    })?;
    let mut found = Vec::with_capacity(rows.len());
    for (team, right) in rows {
        found.push(TeamWithRight {
            team,
            right: Right::try_from(right)?,
        });
    }
    Ok(Page::slice(found, pagination))
}

/// Users with a direct share on a namespace or list, with their rights.
pub fn users_with_right(
    conn: &Connection,
    kind: ShareKind,
    object_id: i64,
    search: &str,
    pagination: Pagination,
) -> Result<Page<UserWithRight>> {
    object_owner(conn, kind, object_id)?;
    let rows = sq::query_map(conn, q::users_with_right(kind, object_id, search), |row| {
        Ok((users::user_at(row, 0)?, row.get::<_, i64>(5)?))
    })?;
    let mut found = Vec::with_capacity(rows.len());
    for (user, right) in rows {
        found.push(UserWithRight {
            user,
            right: Right::try_from(right)?,
        });
    }
    Ok(Page::slice(found, pagination))
}

// ── Share kinds ───────────────────────────────────────────────────────────

fn user_by_name(conn: &Connection, username: &str) -> Result<User> {
    users::get_by_username(conn, username)
}

impl Share for TeamNamespace {
    const KIND: ShareKind = ShareKind::TeamNamespace;

    fn object_id(&self) -> i64 {
        self.namespace_id
    }

    fn right(&self) -> Right {
        self.right
    }

    fn resolve_subject(&mut self, conn: &Connection) -> Result<i64> {
        Ok(teams::get_simple(conn, self.team_id)?.id)
    }

    fn stored(&mut self, id: i64, right: Right, created: String, updated: String) {
        self.id = id;
        self.right = right;
        self.created = created;
        self.updated = updated;
    }
}

impl Share for TeamList {
    const KIND: ShareKind = ShareKind::TeamList;

    fn object_id(&self) -> i64 {
        self.list_id
    }

    fn right(&self) -> Right {
        self.right
    }

    fn resolve_subject(&mut self, conn: &Connection) -> Result<i64> {
        Ok(teams::get_simple(conn, self.team_id)?.id)
    }

    fn stored(&mut self, id: i64, right: Right, created: String, updated: String) {
        self.id = id;
        self.right = right;
        self.created = created;
        self.updated = updated;
    }
}

impl Share for NamespaceUser {
    const KIND: ShareKind = ShareKind::UserNamespace;

    fn object_id(&self) -> i64 {
        self.namespace_id
    }

    fn right(&self) -> Right {
        self.right
    }

    fn resolve_subject(&mut self, conn: &Connection) -> Result<i64> {
        let user = user_by_name(conn, &self.username)?;
        self.user_id = user.id;
        Ok(user.id)
    }

    fn stored(&mut self, id: i64, right: Right, created: String, updated: String) {
        self.id = id;
        self.right = right;
        self.created = created;
        self.updated = updated;
    }
}

impl Share for ListUser {
    const KIND: ShareKind = ShareKind::UserList;

    fn object_id(&self) -> i64 {
        self.list_id
    }

    fn right(&self) -> Right {
        self.right
    }

    fn resolve_subject(&mut self, conn: &Connection) -> Result<i64> {
        let user = user_by_name(conn, &self.username)?;
        self.user_id = user.id;
        Ok(user.id)
    }

    fn stored(&mut self, id: i64, right: Right, created: String, updated: String) {
        self.id = id;
        self.right = right;
        self.created = created;
        self.updated = updated;
    }
}

/// Managing a share needs admin on the shared object; listing the shares of
/// an object needs read access to it.
macro_rules! share_permissions {
    ($($ty:ty),+) => {$(
        impl Permissions for $ty {
            fn can_create(&self, conn: &Connection, auth: &Auth) -> Result<bool> {
                is_object_admin(conn, auth, <$ty as Share>::KIND, self.object_id())
            }

            fn can_read(&self, conn: &Connection, auth: &Auth) -> Result<Option<Right>> {
                object_right(conn, auth, <$ty as Share>::KIND, self.object_id())
            }

            fn can_update(&self, conn: &Connection, auth: &Auth) -> Result<bool> {
                is_object_admin(conn, auth, <$ty as Share>::KIND, self.object_id())
            }

            fn can_delete(&self, conn: &Connection, auth: &Auth) -> Result<bool> {
                is_object_admin(conn, auth, <$ty as Share>::KIND, self.object_id())
            }
        }
    )+};
}

share_permissions!(TeamNamespace, TeamList, NamespaceUser, ListUser);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    fn team_list(team_id: i64, list_id: i64, right: Right) -> TeamList {
        TeamList {
            team_id,
            list_id,
            right,
            ..Default::default()
        }
    }

    fn namespace_user(username: &str, namespace_id: i64, right: Right) -> NamespaceUser {
        NamespaceUser {
            username: username.into(),
            namespace_id,
            right,
            ..Default::default()
        }
    }

    #[test]
    fn test_team_list_share() {
        let conn = testing::fixtures();
        let created = create(&conn, &team_list(2, 1, Right::Write)).unwrap();
        assert!(created.id > 0);
        assert_eq!(created.right, Right::Write);
        // user3 is in team 2
        let list = List {
            id: 1,
            ..Default::default()
        };
        assert_eq!(list.can_read(&conn, &testing::user3()).unwrap(), Some(Right::Write));

        assert!(matches!(
            create(&conn, &team_list(2, 1, Right::Read)).unwrap_err(),
            Error::TeamAlreadyHasAccess
        ));
        assert!(matches!(
            create(&conn, &team_list(9999, 1, Right::Read)).unwrap_err(),
            Error::TeamDoesNotExist { id: 9999 }
        ));
        assert!(matches!(
            create(&conn, &team_list(2, 9999, Right::Read)).unwrap_err(),
            Error::ListDoesNotExist { id: 9999 }
        ));

        let updated = update(&conn, &team_list(2, 1, Right::Admin)).unwrap();
        assert_eq!(updated.right, Right::Admin);

        delete(&conn, &team_list(2, 1, Right::Read)).unwrap();
        assert!(matches!(
            delete(&conn, &team_list(2, 1, Right::Read)).unwrap_err(),
            Error::TeamDoesNotHaveAccessToList
        ));
        assert!(matches!(
            update(&conn, &team_list(2, 1, Right::Read)).unwrap_err(),
            Error::TeamDoesNotHaveAccessToList
        ));
    }

    #[test]
    fn test_user_namespace_share() {
        let conn = testing::fixtures();
        let created = create(&conn, &namespace_user("user3", 1, Right::Read)).unwrap();
        assert_eq!(created.user_id, 3);
        assert_eq!(created.username, "user3");

        assert!(matches!(
            create(&conn, &namespace_user("user3", 1, Right::Read)).unwrap_err(),
            Error::UserAlreadyHasAccess
        ));
        // user1 owns namespace 1
        assert!(matches!(
            create(&conn, &namespace_user("user1", 1, Right::Read)).unwrap_err(),
            Error::UserAlreadyHasAccess
        ));
        assert!(matches!(
            create(&conn, &namespace_user("nobody", 1, Right::Read)).unwrap_err(),
            Error::UserDoesNotExist
        ));
        assert!(matches!(
            delete(&conn, &namespace_user("user4", 1, Right::Read)).unwrap_err(),
            Error::UserDoesNotHaveAccessToNamespace
        ));
    }

    #[test]
    fn test_listings() {
        let conn = testing::fixtures();
        let page = teams_with_right(&conn, ShareKind::TeamList, 4, "", Pagination::all()).unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].team.id, 1);
        assert_eq!(page.items[0].right, Right::Write);

        let page = users_with_right(&conn, ShareKind::UserList, 10, "", Pagination::all()).unwrap();
        assert_eq!(page.items[0].user.username, "user1");
        assert_eq!(page.items[0].right, Right::Admin);
        assert!(users_with_right(&conn, ShareKind::UserList, 10, "zzz", Pagination::all())
            .unwrap()
            .items
            .is_empty());

        let page = users_with_right(&conn, ShareKind::UserNamespace, 5, "", Pagination::all()).unwrap();
        assert_eq!(page.items[0].right, Right::Read);

        assert!(matches!(
            teams_with_right(&conn, ShareKind::TeamNamespace, 9999, "", Pagination::all()).unwrap_err(),
            Error::NamespaceDoesNotExist { id: 9999 }
        ));
    }

    #[test]
    fn test_rights() {
        let conn = testing::fixtures();
        assert!(team_list(2, 1, Right::Read).can_create(&conn, &testing::user1()).unwrap());
        assert!(!team_list(2, 3, Right::Read).can_create(&conn, &testing::user1()).unwrap());
        // user1 holds admin on list 10 through a direct share
        assert!(team_list(2, 10, Right::Read).can_update(&conn, &testing::user1()).unwrap());
        assert!(!namespace_user("user3", 1, Right::Read).can_delete(&conn, &testing::user2()).unwrap());
        assert_eq!(
            namespace_user("user3", 6, Right::Read).can_read(&conn, &testing::user1()).unwrap(),
            Some(Right::Write)
        );
    }
}
