//! Lists, including the favorites and saved-filter pseudo lists.

use rusqlite::{Connection, Row};
use tasklane_api::db::lists::{self as q, ListValues};
use tasklane_api::db::{buckets as bucket_q, tasks as task_q};
use tasklane_api::service::{self, Pagination};
use tasklane_api::{
    FAVORITES_LIST_ID, FAVORITES_NAMESPACE_ID, List, Right, SAVED_FILTERS_NAMESPACE_ID, SavedFilter,
};

use crate::rights::max_right;
use crate::{Auth, Error, Page, Permissions, Result, auth, namespaces, saved_filters, sq, users};

/// Title of the bucket every new list starts with.
pub const DEFAULT_BUCKET_TITLE: &str = "Backlog";

pub(crate) fn list_from_row(row: &Row<'_>) -> rusqlite::Result<List> {
    Ok(List {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        identifier: row.get(3)?,
        hex_color: row.get(4)?,
        owner_id: row.get(5)?,
        namespace_id: row.get(6)?,
        is_archived: row.get(7)?,
        is_favorite: row.get(8)?,
        owner: None,
        created: row.get(9)?,
        updated: row.get(10)?,
    })
}

/// Fill in the `owner` of each list with one query.
pub(crate) fn attach_owners(conn: &Connection, lists: &mut [List]) -> Result<()> {
    let ids: Vec<i64> = lists.iter().map(|l| l.owner_id).collect();
    let owners = users::get_many(conn, &ids)?;
    for list in lists.iter_mut() {
        list.owner = owners.get(&list.owner_id).cloned();
    }
    Ok(())
}

// ── Pseudo lists ──────────────────────────────────────────────────────────

/// The list holding every favorited task.
pub fn favorites_pseudo_list() -> List {
    List {
        id: FAVORITES_LIST_ID,
        title: "Favorites".into(),
        description: "This list has all tasks marked as favorites.".into(),
        namespace_id: FAVORITES_NAMESPACE_ID,
        ..Default::default()
    }
}

/// A saved filter presented as a list.
pub fn saved_filter_list(filter: &SavedFilter) -> List {
    List {
        id: service::list_id_from_saved_filter_id(filter.id),
        title: filter.title.clone(),
        description: filter.description.clone(),
        namespace_id: SAVED_FILTERS_NAMESPACE_ID,
        owner_id: filter.owner_id,
        owner: filter.owner.clone(),
        is_favorite: filter.is_favorite,
        created: filter.created.clone(),
        updated: filter.updated.clone(),
        ..Default::default()
    }
}

fn is_pseudo(id: i64) -> bool {
    id < 0
}

// ── Lookups ───────────────────────────────────────────────────────────────

/// A stored list without its owner. Pseudo ids do not resolve here.
pub fn stored(conn: &Connection, id: i64) -> Result<List> {
    if id <= 0 {
        return Err(Error::ListDoesNotExist { id });
    }
    sq::query_opt(conn, q::get_by_id(id), list_from_row)?.ok_or(Error::ListDoesNotExist { id })
}

/// A list without its owner. The favorites list and saved-filter lists
/// resolve to their pseudo lists.
pub fn get_simple(conn: &Connection, id: i64) -> Result<List> {
    if id == FAVORITES_LIST_ID {
        return Ok(favorites_pseudo_list());
    }
    let filter_id = service::saved_filter_id_from_list_id(id);
    if filter_id > 0 {
        return match saved_filters::get_simple(conn, filter_id) {
            Ok(filter) => Ok(saved_filter_list(&filter)),
            Err(Error::SavedFilterDoesNotExist { .. }) => Err(Error::ListDoesNotExist { id }),
            Err(err) => Err(err),
        };
    }
    stored(conn, id)
}

/// A list with its owner.
pub fn read_one(conn: &Connection, id: i64) -> Result<List> {
    let mut list = get_simple(conn, id)?;
    if list.owner_id != 0 {
        list.owner = Some(users::get_by_id(conn, list.owner_id)?);
    }
    Ok(list)
}

// ── Rights ────────────────────────────────────────────────────────────────

/// Highest right a user holds on a stored list, through ownership of the
/// list or its namespace or through any share on either.
pub(crate) fn user_right(conn: &Connection, list: &List, user_id: i64) -> Result<Option<Right>> {
    if list.owner_id == user_id {
        return Ok(Some(Right::Admin));
    }
    let ns = namespaces::get_simple(conn, list.namespace_id)?;
    if ns.owner_id == user_id {
        return Ok(Some(Right::Admin));
    }
    let list_right = max_right([
        sq::max_opt(conn, q::user_share_right(list.id, user_id))?,
        sq::max_opt(conn, q::team_share_right(list.id, user_id))?,
    ]);
    Ok(list_right.max(namespaces::user_right(conn, &ns, user_id)?))
}

/// Highest right the principal holds on `list`.
pub(crate) fn right_of(conn: &Connection, auth: &Auth, list: &List) -> Result<Option<Right>> {
    let user_id = match auth {
        Auth::LinkShare { list_id, right, .. } => {
            return Ok((*list_id == list.id).then_some(*right));
        }
        Auth::User { id, .. } => *id,
    };
    if list.id == FAVORITES_LIST_ID {
        return Ok(Some(Right::Read));
    }
    if service::saved_filter_id_from_list_id(list.id) > 0 {
        return Ok((list.owner_id == user_id).then_some(Right::Admin));
    }
    user_right(conn, list, user_id)
}

fn check_archived(conn: &Connection, list: &List) -> Result<()> {
    if list.is_archived {
        return Err(Error::ListIsArchived { id: list.id });
    }
    let ns = namespaces::get_simple(conn, list.namespace_id)?;
    if ns.is_archived {
        return Err(Error::NamespaceIsArchived { id: ns.id });
    }
    Ok(())
}

/// Whether the principal may change a list or its tasks. Archived lists and
/// lists in archived namespaces fail with the matching error.
pub fn can_write(conn: &Connection, auth: &Auth, id: i64) -> Result<bool> {
    let list = get_simple(conn, id)?;
    if is_pseudo(list.id) {
        return Ok(false);
    }
    check_archived(conn, &list)?;
    Ok(right_of(conn, auth, &list)? >= Some(Right::Write))
}

/// Whether the principal holds admin on a list. Archive state is ignored.
pub fn is_admin(conn: &Connection, auth: &Auth, id: i64) -> Result<bool> {
    let list = get_simple(conn, id)?;
    Ok(right_of(conn, auth, &list)? == Some(Right::Admin))
}

/// Ids of every list the principal can read, archived ones included.
pub fn readable_ids(conn: &Connection, auth: &Auth) -> Result<Vec<i64>> {
    match auth {
        Auth::LinkShare { list_id, .. } => Ok(vec![*list_id]),
        Auth::User { id, .. } => {
            let built = q::visible_for_user(*id, "", true, None, 0);
            Ok(sq::query_map(conn, built.select_query, |row| row.get(0))?)
        }
    }
}

impl Permissions for List {
    fn can_create(&self, conn: &Connection, auth: &Auth) -> Result<bool> {
        if auth.is_link_share() {
            return Ok(false);
        }
        namespaces::can_write(conn, auth, self.namespace_id)
    }

    fn can_read(&self, conn: &Connection, auth: &Auth) -> Result<Option<Right>> {
        let list = get_simple(conn, self.id)?;
        right_of(conn, auth, &list)
    }

    fn can_update(&self, conn: &Connection, auth: &Auth) -> Result<bool> {
        let current = get_simple(conn, self.id)?;
        if service::saved_filter_id_from_list_id(self.id) > 0 {
            return Ok(right_of(conn, auth, &current)?.is_some());
        }
        if is_pseudo(current.id) {
            return Ok(false);
        }
        if self.namespace_id != 0
            && self.namespace_id != current.namespace_id
            && !namespaces::can_write(conn, auth, self.namespace_id)?
        {
            return Ok(false);
        }
        match can_write(conn, auth, self.id) {
            // Un-archiving is the one change allowed on an archived list.
            Err(Error::ListIsArchived { .. }) if !self.is_archived => {
                Ok(right_of(conn, auth, &current)? >= Some(Right::Write))
            }
            other => other,
        }
    }

    fn can_delete(&self, conn: &Connection, auth: &Auth) -> Result<bool> {
        is_admin(conn, auth, self.id)
    }
}

// ── CRUD ──────────────────────────────────────────────────────────────────

fn validate(list: &List) -> Result<()> {
    if list.title.trim().is_empty() {
        return Err(Error::ListTitleCannotBeEmpty);
    }
    service::validate_title("title", &list.title)?;
    service::validate_hex_color(&list.hex_color)?;
    service::validate_identifier(&list.identifier)?;
    Ok(())
}

fn check_identifier(conn: &Connection, identifier: &str, list_id: i64) -> Result<()> {
    if !identifier.is_empty() && sq::count(conn, q::identifier_count(identifier, list_id))? > 0 {
        return Err(Error::ListIdentifierIsNotUnique);
    }
    Ok(())
}

fn values(list: &List, namespace_id: i64) -> ListValues<'_> {
    ListValues {
        title: &list.title,
        description: &list.description,
        identifier: &list.identifier,
        hex_color: &list.hex_color,
        namespace_id,
        is_archived: list.is_archived,
        is_favorite: list.is_favorite,
    }
}

/// Create a list owned by the caller, together with its first kanban bucket.
pub fn create(conn: &Connection, auth: &Auth, list: &List) -> Result<List> {
    validate(list)?;
    namespaces::get_simple(conn, list.namespace_id)?;
    check_identifier(conn, &list.identifier, 0)?;
    let owner = users::get_by_id(conn, auth.acting_user_id())?;

    let tx = conn.unchecked_transaction()?;
    let id = sq::insert(&tx, q::insert(owner.id, &values(list, list.namespace_id)))?;
    sq::insert(&tx, bucket_q::insert(DEFAULT_BUCKET_TITLE, id, owner.id))?;
    tx.commit()?;
    tracing::debug!(list_id = id, namespace_id = list.namespace_id, "created list");

    let mut created = stored(conn, id)?;
    created.owner = Some(owner);
    Ok(created)
}

/// Update a list. A saved-filter list updates the filter behind it.
pub fn update(conn: &Connection, list: &List) -> Result<List> {
    let filter_id = service::saved_filter_id_from_list_id(list.id);
    if filter_id > 0 {
        let mut filter = saved_filters::get_simple(conn, filter_id)?;
        filter.title = list.title.clone();
        filter.description = list.description.clone();
        filter.is_favorite = list.is_favorite;
        let filter = saved_filters::update(conn, &filter)?;
        return Ok(saved_filter_list(&filter));
    }

    validate(list)?;
    let current = stored(conn, list.id)?;
    check_identifier(conn, &list.identifier, list.id)?;
    let namespace_id = match list.namespace_id {
        0 => current.namespace_id,
        id if id == current.namespace_id => id,
        id => namespaces::get_simple(conn, id)?.id,
    };
    sq::execute(conn, q::update(list.id, &values(list, namespace_id)))?;
    read_one(conn, list.id)
}

/// Delete a list with its tasks, buckets, shares and link shares.
/// Returns the number of tasks removed.
pub fn delete(conn: &Connection, id: i64) -> Result<i64> {
    stored(conn, id)?;
    let tx = conn.unchecked_transaction()?;
    let tasks = sq::count(&tx, task_q::count_by_lists(&[id]))?;
    sq::execute(&tx, task_q::delete_by_lists(&[id]))?;
    sq::execute(&tx, bucket_q::delete_by_lists(&[id]))?;
    sq::execute(&tx, q::delete(id))?;
    tx.commit()?;
    tracing::debug!(list_id = id, tasks, "deleted list");
    Ok(tasks)
}

/// Every list the caller can see. A link share sees exactly its own list.
pub fn read_all(
    conn: &Connection,
    auth: &Auth,
    search: &str,
    is_archived: bool,
    pagination: Pagination,
) -> Result<Page<List>> {
    if let Auth::LinkShare { list_id, .. } = auth {
        let list = read_one(conn, *list_id)?;
        return Ok(Page {
            items: vec![list],
            total: 1,
        });
    }
    let doer = auth::user_from_auth(conn, auth)?;

    let built = q::visible_for_user(doer.id, search, is_archived, pagination.limit, pagination.offset);
    let total = sq::count(conn, built.count_query)?;
    let mut found = sq::query_map(conn, built.select_query, list_from_row)?;
    attach_owners(conn, &mut found)?;
    Ok(Page { items: found, total })
}

pub fn count(conn: &Connection) -> Result<i64> {
    Ok(sq::count(conn, q::count())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{buckets, testing};

    fn ids(lists: &[List]) -> Vec<i64> {
        lists.iter().map(|l| l.id).collect()
    }

    fn list(id: i64) -> List {
        List {
            id,
            ..Default::default()
        }
    }

    #[test]
    fn test_read_all() {
        let conn = testing::fixtures();
        let page = read_all(&conn, &testing::user1(), "", false, Pagination::all()).unwrap();
        assert_eq!(ids(&page.items), vec![1, 2, 3, 4, 7, 8, 10]);
        assert_eq!(page.total, 7);
        assert!(page.items.iter().all(|l| l.owner.is_some()));

        let page = read_all(&conn, &testing::user1(), "", true, Pagination::all()).unwrap();
        assert_eq!(page.items.len(), 9);

        let page = read_all(&conn, &testing::user1(), "Test1", false, Pagination::all()).unwrap();
        assert_eq!(ids(&page.items), vec![1, 10]);

        let page = read_all(&conn, &testing::link_share(2), "", false, Pagination::all()).unwrap();
        assert_eq!(ids(&page.items), vec![2]);
    }

    #[test]
    fn test_read_one_and_pseudo_lists() {
        let conn = testing::fixtures();
        let found = read_one(&conn, 1).unwrap();
        assert_eq!(found.title, "Test1");
        assert_eq!(found.identifier, "test1");
        assert_eq!(found.owner.unwrap().username, "user1");

        let favorites = read_one(&conn, FAVORITES_LIST_ID).unwrap();
        assert_eq!(favorites.title, "Favorites");

        let filter = read_one(&conn, -2).unwrap();
        assert_eq!(filter.title, "testfilter1");
        assert_eq!(filter.namespace_id, SAVED_FILTERS_NAMESPACE_ID);

        assert!(matches!(read_one(&conn, 9999).unwrap_err(), Error::ListDoesNotExist { id: 9999 }));
        assert!(matches!(read_one(&conn, -50).unwrap_err(), Error::ListDoesNotExist { id: -50 }));
    }

    #[test]
    fn test_read_rights() {
        let conn = testing::fixtures();
        let user1 = testing::user1();
        assert_eq!(list(1).can_read(&conn, &user1).unwrap(), Some(Right::Admin));
        assert_eq!(list(3).can_read(&conn, &user1).unwrap(), Some(Right::Read));
        assert_eq!(list(4).can_read(&conn, &user1).unwrap(), Some(Right::Write));
        assert_eq!(list(7).can_read(&conn, &user1).unwrap(), Some(Right::Read));
        assert_eq!(list(8).can_read(&conn, &user1).unwrap(), Some(Right::Write));
        assert_eq!(list(10).can_read(&conn, &user1).unwrap(), Some(Right::Admin));
        assert_eq!(list(9).can_read(&conn, &user1).unwrap(), None);
        assert_eq!(list(-1).can_read(&conn, &testing::user3()).unwrap(), Some(Right::Read));
        assert_eq!(list(-2).can_read(&conn, &user1).unwrap(), Some(Right::Admin));
        assert_eq!(list(-2).can_read(&conn, &testing::user2()).unwrap(), None);

        let share = testing::link_share(1);
        assert_eq!(list(1).can_read(&conn, &share).unwrap(), Some(Right::Read));
        assert_eq!(list(2).can_read(&conn, &share).unwrap(), None);
    }

    #[test]
    fn test_write_rights() {
        let conn = testing::fixtures();
        let user1 = testing::user1();
        assert!(can_write(&conn, &user1, 1).unwrap());
        assert!(!can_write(&conn, &user1, 3).unwrap());
        assert!(can_write(&conn, &user1, 4).unwrap());
        assert!(matches!(
            can_write(&conn, &user1, 6).unwrap_err(),
            Error::ListIsArchived { id: 6 }
        ));
        assert!(matches!(
            can_write(&conn, &user1, 5).unwrap_err(),
            Error::NamespaceIsArchived { id: 4 }
        ));
        assert!(!can_write(&conn, &testing::link_share(1), 1).unwrap());
        assert!(can_write(&conn, &testing::link_share(2), 2).unwrap());
        assert!(!can_write(&conn, &user1, FAVORITES_LIST_ID).unwrap());

        assert!(list(1).can_delete(&conn, &user1).unwrap());
        assert!(!list(4).can_delete(&conn, &user1).unwrap());
        assert!(list(10).can_delete(&conn, &user1).unwrap());
        // Admin checks ignore the archive flag.
        assert!(list(6).can_delete(&conn, &user1).unwrap());

        let new_list = List {
            namespace_id: 1,
            ..Default::default()
        };
        assert!(new_list.can_create(&conn, &user1).unwrap());
        assert!(!new_list.can_create(&conn, &testing::link_share(3)).unwrap());
        let in_shared = List {
            namespace_id: 5,
            ..Default::default()
        };
        assert!(!in_shared.can_create(&conn, &user1).unwrap());
    }

    #[test]
    fn test_update_rights() {
        let conn = testing::fixtures();
        let user1 = testing::user1();

        let mut archived = stored(&conn, 6).unwrap();
        assert!(matches!(
            archived.can_update(&conn, &user1).unwrap_err(),
            Error::ListIsArchived { id: 6 }
        ));
        archived.is_archived = false;
        assert!(archived.can_update(&conn, &user1).unwrap());

        let mut moved = stored(&conn, 1).unwrap();
        moved.namespace_id = 5;
        assert!(!moved.can_update(&conn, &user1).unwrap());
        moved.namespace_id = 6;
        assert!(moved.can_update(&conn, &user1).unwrap());

        assert!(list(-2).can_update(&conn, &user1).unwrap());
        assert!(!list(-2).can_update(&conn, &testing::user2()).unwrap());
    }

    #[test]
    fn test_create() {
        let conn = testing::fixtures();
        let input = List {
            title: "Lorem ü".into(),
            description: "Lorem Ipsum".into(),
            namespace_id: 1,
            ..Default::default()
        };
        let created = create(&conn, &testing::user1(), &input).unwrap();
        assert_eq!(created.title, "Lorem ü");
        assert_eq!(created.owner_id, 1);
        let backlog = buckets::read_all(&conn, created.id).unwrap();
        assert_eq!(backlog.len(), 1);
        assert_eq!(backlog[0].title, DEFAULT_BUCKET_TITLE);

        let empty = List {
            namespace_id: 1,
            ..Default::default()
        };
        assert!(matches!(
            create(&conn, &testing::user1(), &empty).unwrap_err(),
            Error::ListTitleCannotBeEmpty
        ));

        let nowhere = List {
            namespace_id: 9999,
            ..input.clone()
        };
        assert!(matches!(
            create(&conn, &testing::user1(), &nowhere).unwrap_err(),
            Error::NamespaceDoesNotExist { id: 9999 }
        ));

        let duplicate = List {
            identifier: "test1".into(),
            ..input.clone()
        };
        assert!(matches!(
            create(&conn, &testing::user1(), &duplicate).unwrap_err(),
            Error::ListIdentifierIsNotUnique
        ));

        let gone = Auth::User {
            id: 9999,
            username: "gone".into(),
        };
        assert!(matches!(create(&conn, &gone, &input).unwrap_err(), Error::UserDoesNotExist));
    }

    #[test]
    fn test_update() {
        let conn = testing::fixtures();
        let user1 = testing::user1();
        let mut current = stored(&conn, 1).unwrap();
        current.title = "updated".into();
        current.description = "new description".into();
        let updated = update(&conn, &current).unwrap();
        assert_eq!(updated.title, "updated");
        assert_eq!(updated.description, "new description");
        // Keeping its own identifier is fine.
        assert_eq!(updated.identifier, "test1");

        current.identifier = "test2".into();
        assert!(matches!(
            update(&conn, &current).unwrap_err(),
            Error::ListIdentifierIsNotUnique
        ));

        current.identifier = "test1".into();
        current.namespace_id = 9999;
        assert!(matches!(
            update(&conn, &current).unwrap_err(),
            Error::NamespaceDoesNotExist { id: 9999 }
        ));

        let missing = List {
            id: 9999,
            title: "x".into(),
            ..Default::default()
        };
        assert!(matches!(
            update(&conn, &missing).unwrap_err(),
            Error::ListDoesNotExist { id: 9999 }
        ));

        let filter = List {
            id: -2,
            title: "renamed filter".into(),
            ..Default::default()
        };
        assert_eq!(update(&conn, &filter).unwrap().title, "renamed filter");
        assert_eq!(saved_filters::get_simple(&conn, 1).unwrap().title, "renamed filter");
    }

    #[test]
    fn test_delete() {
        let conn = testing::fixtures();
        assert_eq!(delete(&conn, 1).unwrap(), 2);
        assert!(matches!(stored(&conn, 1).unwrap_err(), Error::ListDoesNotExist { id: 1 }));
        assert!(matches!(delete(&conn, 9999).unwrap_err(), Error::ListDoesNotExist { id: 9999 }));
        assert!(matches!(delete(&conn, -2).unwrap_err(), Error::ListDoesNotExist { id: -2 }));
    }

    #[test]
    fn test_readable_ids() {
        let conn = testing::fixtures();
        let ids = readable_ids(&conn, &testing::user1()).unwrap();
        assert_eq!(ids, vec![1, 2, 3, 4, 5, 6, 7, 8, 10]);
        assert_eq!(readable_ids(&conn, &testing::link_share(1)).unwrap(), vec![1]);
    }
}
