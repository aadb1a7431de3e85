//! Namespaces and the namespace overview.
//!
//! [`read_all`] is the main aggregation of the crate: it merges owned and
//! shared namespaces with the pseudo namespaces for individually shared
//! lists, favorites and saved filters.

use std::collections::{BTreeMap, HashSet};

use rusqlite::{Connection, Row};
use tasklane_api::db::lists as list_q;
use tasklane_api::db::namespaces as q;
use tasklane_api::service::{self, Pagination};
use tasklane_api::{
    FAVORITES_NAMESPACE_ID, List, Namespace, NamespaceWithLists, Right, SAVED_FILTERS_NAMESPACE_ID,
    SHARED_LISTS_NAMESPACE_ID, User,
};

use crate::rights::max_right;
use crate::{Auth, Error, Page, Permissions, Result, auth, lists, saved_filters, sq, users};

pub(crate) fn namespace_from_row(row: &Row<'_>) -> rusqlite::Result<Namespace> {
    Ok(Namespace {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        owner_id: row.get(3)?,
        hex_color: row.get(4)?,
        is_archived: row.get(5)?,
        owner: None,
        created: row.get(6)?,
        updated: row.get(7)?,
    })
}

// ── Pseudo namespaces ─────────────────────────────────────────────────────

fn pseudo_namespace(id: i64, title: &str, description: &str) -> Namespace {
    Namespace {
        id,
        title: title.into(),
        description: description.into(),
        ..Default::default()
    }
}

/// The namespace for pseudo id `id`, if it is one.
pub fn pseudo(id: i64) -> Option<Namespace> {
    match id {
        SHARED_LISTS_NAMESPACE_ID => Some(pseudo_namespace(
            id,
            "Shared Lists",
            "Lists of other users shared with you via teams or directly.",
        )),
        FAVORITES_NAMESPACE_ID => Some(pseudo_namespace(id, "Favorites", "Favorite lists and tasks.")),
        SAVED_FILTERS_NAMESPACE_ID => Some(pseudo_namespace(id, "Filters", "Saved filters.")),
        _ => None,
    }
}

// ── Lookups ───────────────────────────────────────────────────────────────

/// A stored namespace without its owner. Pseudo ids do not resolve here.
pub fn get_simple(conn: &Connection, id: i64) -> Result<Namespace> {
    if id <= 0 {
        return Err(Error::NamespaceDoesNotExist { id });
    }
    sq::query_opt(conn, q::get_by_id(id), namespace_from_row)?
        .ok_or(Error::NamespaceDoesNotExist { id })
}

/// A namespace with its owner. Pseudo namespaces are owned by the caller.
pub fn read_one(conn: &Connection, auth: &Auth, id: i64) -> Result<Namespace> {
    if let Some(mut ns) = pseudo(id) {
        if let Some(user_id) = auth.user_id() {
            ns.owner_id = user_id;
            ns.owner = Some(users::get_by_id(conn, user_id)?);
        }
        return Ok(ns);
    }
    let mut ns = get_simple(conn, id)?;
    ns.owner = Some(users::get_by_id(conn, ns.owner_id)?);
    Ok(ns)
}

// ── Rights ────────────────────────────────────────────────────────────────

/// Highest right a user holds on a stored namespace.
pub(crate) fn user_right(conn: &Connection, ns: &Namespace, user_id: i64) -> Result<Option<Right>> {
    if ns.owner_id == user_id {
        return Ok(Some(Right::Admin));
    }
    Ok(max_right([
        sq::max_opt(conn, q::user_share_right(ns.id, user_id))?,
        sq::max_opt(conn, q::team_share_right(ns.id, user_id))?,
    ]))
}

/// Whether the principal may add to or change things inside a namespace.
/// Archived namespaces fail with [`Error::NamespaceIsArchived`].
pub fn can_write(conn: &Connection, auth: &Auth, id: i64) -> Result<bool> {
    let Some(user_id) = auth.user_id() else {
        return Ok(false);
    };
    if pseudo(id).is_some() {
        return Ok(false);
    }
    let ns = get_simple(conn, id)?;
    if ns.is_archived {
        return Err(Error::NamespaceIsArchived { id });
    }
    Ok(user_right(conn, &ns, user_id)? >= Some(Right::Write))
}

/// Owner or holder of an admin share.
pub fn is_admin(conn: &Connection, auth: &Auth, id: i64) -> Result<bool> {
    let Some(user_id) = auth.user_id() else {
        return Ok(false);
    };
    if pseudo(id).is_some() {
        return Ok(false);
    }
    let ns = get_simple(conn, id)?;
    Ok(user_right(conn, &ns, user_id)? == Some(Right::Admin))
}

impl Permissions for Namespace {
    fn can_create(&self, _conn: &Connection, auth: &Auth) -> Result<bool> {
        Ok(!auth.is_link_share())
    }

    fn can_read(&self, conn: &Connection, auth: &Auth) -> Result<Option<Right>> {
        let Some(user_id) = auth.user_id() else {
            return Ok(None);
        };
        if pseudo(self.id).is_some() {
            return Ok(Some(Right::Read));
        }
        let ns = get_simple(conn, self.id)?;
        user_right(conn, &ns, user_id)
    }

    fn can_update(&self, conn: &Connection, auth: &Auth) -> Result<bool> {
        is_admin(conn, auth, self.id)
    }

    fn can_delete(&self, conn: &Connection, auth: &Auth) -> Result<bool> {
        is_admin(conn, auth, self.id)
    }
}

// ── CRUD ──────────────────────────────────────────────────────────────────

fn validate(ns: &Namespace) -> Result<()> {
    if ns.title.trim().is_empty() {
        return Err(Error::NamespaceNameCannotBeEmpty);
    }
    service::validate_title("title", &ns.title)?;
    service::validate_hex_color(&ns.hex_color)?;
    Ok(())
}

/// Create a namespace owned by the caller. The id in `ns` is ignored.
pub fn create(conn: &Connection, auth: &Auth, ns: &Namespace) -> Result<Namespace> {
    validate(ns)?;
    let owner = auth::user_from_auth(conn, auth)?;
    let id = sq::insert(
        conn,
        q::insert(&ns.title, &ns.description, owner.id, &ns.hex_color, ns.is_archived),
    )?;
    tracing::debug!(namespace_id = id, owner_id = owner.id, "created namespace");

    let mut created = get_simple(conn, id)?;
    created.owner = Some(owner);
    Ok(created)
}

/// Update title, color, archive flag and owner. The description is only
/// replaced when a non-empty one is given.
pub fn update(conn: &Connection, auth: &Auth, ns: &Namespace) -> Result<Namespace> {
    validate(ns)?;
    let current = get_simple(conn, ns.id)?;
    if current.is_archived && ns.is_archived {
        return Err(Error::NamespaceIsArchived { id: ns.id });
    }

    let owner_id = match &ns.owner {
        Some(owner) if owner.id != 0 && owner.id != current.owner_id => users::get_by_id(conn, owner.id)?.id,
        _ => current.owner_id,
    };
    let description = (!ns.description.is_empty()).then_some(ns.description.as_str());
    sq::execute(
        conn,
        q::update(ns.id, &ns.title, ns.is_archived, &ns.hex_color, owner_id, description),
    )?;
    read_one(conn, auth, ns.id)
}

/// What a cascading delete removed besides the entity itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Deleted {
    pub lists: i64,
    pub tasks: i64,
}

/// Delete a namespace with its lists, their tasks, buckets and shares.
pub fn delete(conn: &Connection, id: i64) -> Result<Deleted> {
    get_simple(conn, id)?;
    let list_ids: Vec<i64> =
        sq::query_map(conn, list_q::by_namespaces(&[id], true), |row| row.get(0))?;

    let tx = conn.unchecked_transaction()?;
    let mut deleted = Deleted::default();
    for list_id in &list_ids {
        deleted.tasks += lists::delete(&tx, *list_id)?;
        deleted.lists += 1;
    }
    sq::execute(&tx, q::delete(id))?;
    tx.commit()?;

    tracing::debug!(namespace_id = id, lists = deleted.lists, tasks = deleted.tasks, "deleted namespace");
    Ok(deleted)
}

// ── Overview ──────────────────────────────────────────────────────────────

fn with_lists(namespace: Namespace) -> NamespaceWithLists {
    NamespaceWithLists {
        namespace,
        lists: Vec::new(),
    }
}

fn pseudo_owned_by(id: i64, doer: &User) -> Namespace {
    let mut ns = pseudo(id).unwrap_or_default();
    ns.owner_id = doer.id;
    ns.owner = Some(doer.clone());
    ns
}

/// Lists shared one by one whose namespace the user cannot see.
///
/// Checked against every visible namespace, not just one page of them.
fn shared_lists(conn: &Connection, user_id: i64, is_archived: bool) -> Result<Vec<List>> {
    let visible: HashSet<i64> = sq::query_map(
        conn,
        q::visible_for_user(user_id, "", is_archived, None, 0).select_query,
        namespace_from_row,
    )?
    .into_iter()
    .map(|ns| ns.id)
    .collect();
    let mut shared: Vec<List> = sq::query_map(
        conn,
        list_q::individually_shared(user_id, is_archived),
        lists::list_from_row,
    )?
    .into_iter()
    .filter(|list| !visible.contains(&list.namespace_id))
    .collect();
    lists::attach_owners(conn, &mut shared)?;
    Ok(shared)
}

/// Every namespace the caller can see, each with its lists.
///
/// Pseudo namespaces come first: saved filters (-3), favorites (-2) and
/// individually shared lists (-1), each only when it has something in it.
/// `total` counts the caller's non-archived namespaces and ignores paging;
/// pseudo namespaces are never counted.
pub fn read_all(
    conn: &Connection,
    auth: &Auth,
    search: &str,
    is_archived: bool,
    pagination: Pagination,
) -> Result<Page<NamespaceWithLists>> {
    if auth.is_link_share() {
        return Err(Error::GenericForbidden);
    }
    let doer = auth::user_from_auth(conn, auth)?;

    let built = q::visible_for_user(doer.id, search, is_archived, pagination.limit, pagination.offset);
    let total = sq::count(conn, built.count_query)?;
    let namespaces = sq::query_map(conn, built.select_query, namespace_from_row)?;

    let owner_ids: Vec<i64> = namespaces.iter().map(|ns| ns.owner_id).collect();
    let owners = users::get_many(conn, &owner_ids)?;
    let mut all: BTreeMap<i64, NamespaceWithLists> = namespaces
        .into_iter()
        .map(|mut ns| {
            ns.owner = owners.get(&ns.owner_id).cloned();
            (ns.id, with_lists(ns))
        })
        .collect();
    let namespace_ids: Vec<i64> = all.keys().copied().collect();

    let mut namespace_lists = if namespace_ids.is_empty() {
        Vec::new()
    } else {
        sq::query_map(
            conn,
            list_q::by_namespaces(&namespace_ids, is_archived),
            lists::list_from_row,
        )?
    };

    let shared = shared_lists(conn, doer.id, is_archived)?;
    lists::attach_owners(conn, &mut namespace_lists)?;

    let mut favorites = vec![lists::favorites_pseudo_list()];
    favorites.extend(
        namespace_lists
            .iter()
            .chain(shared.iter())
            .filter(|list| list.is_favorite)
            .cloned(),
    );

    for list in namespace_lists {
        if let Some(ns) = all.get_mut(&list.namespace_id) {
            ns.lists.push(list);
        }
    }

    if !shared.is_empty() {
        let mut ns = with_lists(pseudo_owned_by(SHARED_LISTS_NAMESPACE_ID, &doer));
        ns.lists = shared;
        all.insert(SHARED_LISTS_NAMESPACE_ID, ns);
    }

    let favorite_tasks = if namespace_ids.is_empty() {
        0
    } else {
        sq::count(conn, q::favorite_task_count(&namespace_ids))?
    };
    if favorite_tasks == 0 {
        favorites.remove(0);
    }
    if !favorites.is_empty() {
        let mut ns = with_lists(pseudo_owned_by(FAVORITES_NAMESPACE_ID, &doer));
        ns.lists = favorites;
        all.insert(FAVORITES_NAMESPACE_ID, ns);
    }

    let filters = saved_filters::for_owner(conn, &doer)?;
    if !filters.is_empty() {
        let mut ns = with_lists(pseudo_owned_by(SAVED_FILTERS_NAMESPACE_ID, &doer));
        ns.lists = filters.iter().map(lists::saved_filter_list).collect();
        all.insert(SAVED_FILTERS_NAMESPACE_ID, ns);
    }

    Ok(Page {
        items: all.into_values().collect(),
        total,
    })
}

/// Non-archived lists of one namespace, pseudo namespaces included.
pub fn lists_by_namespace(conn: &Connection, auth: &Auth, id: i64) -> Result<Vec<List>> {
    let mut found = match id {
        SHARED_LISTS_NAMESPACE_ID => {
            let doer = auth::user_from_auth(conn, auth)?;
            return shared_lists(conn, doer.id, false);
        }
        FAVORITES_NAMESPACE_ID => {
            let visible = lists::read_all(conn, auth, "", false, Pagination::all())?;
            let mut favorites = vec![lists::favorites_pseudo_list()];
            favorites.extend(visible.items.into_iter().filter(|list| list.is_favorite));
            return Ok(favorites);
        }
        SAVED_FILTERS_NAMESPACE_ID => {
            let doer = auth::user_from_auth(conn, auth)?;
            let filters = saved_filters::for_owner(conn, &doer)?;
            return Ok(filters.iter().map(lists::saved_filter_list).collect());
        }
        _ => {
            get_simple(conn, id)?;
            sq::query_map(conn, list_q::by_namespaces(&[id], false), lists::list_from_row)?
        }
    };
    lists::attach_owners(conn, &mut found)?;
    Ok(found)
}

pub fn count(conn: &Connection) -> Result<i64> {
    Ok(sq::count(conn, q::count())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    fn ids(page: &Page<NamespaceWithLists>) -> Vec<i64> {
        page.items.iter().map(|ns| ns.namespace.id).collect()
    }

    fn list_ids(ns: &NamespaceWithLists) -> Vec<i64> {
        ns.lists.iter().map(|l| l.id).collect()
    }

    #[test]
    fn test_read_all_normal() {
        let conn = testing::fixtures();
        let page = read_all(&conn, &testing::user1(), "", false, Pagination::all()).unwrap();
        assert_eq!(ids(&page), vec![-3, -2, -1, 1, 5, 6]);
        assert_eq!(page.total, 3);

        // Owned namespace lists skip the archived list 6.
        assert_eq!(list_ids(&page.items[3]), vec![1, 2]);
        // Lists shared one by one land in the shared pseudo namespace.
        assert_eq!(list_ids(&page.items[2]), vec![3, 4, 10]);
        // Favorites: the pseudo list plus favorited list 2.
        assert_eq!(list_ids(&page.items[1]), vec![-1, 2]);
        // The saved filter shows up as list -2.
        assert_eq!(list_ids(&page.items[0]), vec![-2]);

        for pseudo in &page.items[..3] {
            assert_eq!(pseudo.namespace.owner_id, 1);
            assert_eq!(pseudo.namespace.owner.as_ref().unwrap().username, "user1");
        }
        assert_eq!(page.items[4].namespace.owner.as_ref().unwrap().id, 2);
        assert_eq!(page.items[3].lists[0].owner.as_ref().unwrap().id, 1);
    }

    #[test]
    fn test_read_all_archived() {
        let conn = testing::fixtures();
        let page = read_all(&conn, &testing::user1(), "", true, Pagination::all()).unwrap();
        assert_eq!(ids(&page), vec![-3, -2, -1, 1, 4, 5, 6]);
        assert_eq!(page.total, 3);
        let ns1 = page.items.iter().find(|ns| ns.namespace.id == 1).unwrap();
        assert_eq!(list_ids(ns1), vec![1, 2, 6]);
    }

    #[test]
    fn test_read_all_without_favorites() {
        let conn = testing::fixtures();
        let page = read_all(&conn, &testing::user3(), "", false, Pagination::all()).unwrap();
        assert_eq!(ids(&page), vec![3]);
        assert_eq!(page.total, 1);
    }

    #[test]
    fn test_read_all_favorite_list_without_favorite_tasks() {
        let conn = testing::fixtures();
        let page = read_all(&conn, &testing::user4(), "", false, Pagination::all()).unwrap();
        assert_eq!(ids(&page), vec![-2, 8]);
        assert_eq!(list_ids(&page.items[0]), vec![12]);
    }

    #[test]
    fn test_read_all_search_and_paging() {
        let conn = testing::fixtures();
        let page = read_all(&conn, &testing::user1(), "testnamespace5", false, Pagination::all()).unwrap();
        assert!(ids(&page).contains(&5));
        assert!(!ids(&page).contains(&1));
        assert_eq!(page.total, 1);

        let page = read_all(
            &conn,
            &testing::user1(),
            "",
            false,
            service::pagination(Some(1), Some(1), 50),
        )
        .unwrap();
        let real: Vec<i64> = ids(&page).into_iter().filter(|id| *id > 0).collect();
        assert_eq!(real, vec![1]);
        assert_eq!(page.total, 3);
    }

    #[test]
    fn test_shared_lists_do_not_depend_on_the_page() {
        // user1 holds a direct share on list 7, which sits in namespace 5
        // that user1 already sees, so it never lands in the shared namespace.
        let conn = testing::fixtures();
        let user1 = testing::user1();
        for pagination in [
            Pagination::all(),
            service::pagination(Some(1), Some(1), 50),
            service::pagination(Some(3), Some(1), 50),
            service::pagination(Some(9), Some(1), 50),
        ] {
            let page = read_all(&conn, &user1, "", false, pagination).unwrap();
            let shared = page
                .items
                .iter()
                .find(|ns| ns.namespace.id == SHARED_LISTS_NAMESPACE_ID)
                .unwrap();
            assert_eq!(list_ids(shared), vec![3, 4, 10]);
        }
        let shared = lists_by_namespace(&conn, &user1, SHARED_LISTS_NAMESPACE_ID).unwrap();
        assert_eq!(shared.iter().map(|l| l.id).collect::<Vec<_>>(), vec![3, 4, 10]);
    }

    #[test]
    fn test_read_all_rejects_link_shares() {
        let conn = testing::fixtures();
        let err = read_all(&conn, &testing::link_share(1), "", false, Pagination::all()).unwrap_err();
        assert!(matches!(err, Error::GenericForbidden));
    }

    #[test]
    fn test_read_one() {
        let conn = testing::fixtures();
        let ns = read_one(&conn, &testing::user1(), 1).unwrap();
        assert_eq!(ns.title, "testnamespace");
        assert_eq!(ns.owner.unwrap().id, 1);

        let shared = read_one(&conn, &testing::user1(), SHARED_LISTS_NAMESPACE_ID).unwrap();
        assert_eq!(shared.title, "Shared Lists");
        assert_eq!(shared.owner_id, 1);

        assert!(matches!(
            read_one(&conn, &testing::user1(), 9999).unwrap_err(),
            Error::NamespaceDoesNotExist { id: 9999 }
        ));
        assert!(matches!(
            read_one(&conn, &testing::user1(), 0).unwrap_err(),
            Error::NamespaceDoesNotExist { id: 0 }
        ));
    }

    #[test]
    fn test_rights() {
        let conn = testing::fixtures();
        let user1 = testing::user1();
        let ns = |id| Namespace {
            id,
            ..Default::default()
        };

        assert_eq!(ns(1).can_read(&conn, &user1).unwrap(), Some(Right::Admin));
        assert_eq!(ns(5).can_read(&conn, &user1).unwrap(), Some(Right::Read));
        assert_eq!(ns(6).can_read(&conn, &user1).unwrap(), Some(Right::Write));
        assert_eq!(ns(2).can_read(&conn, &user1).unwrap(), None);
        assert_eq!(ns(-2).can_read(&conn, &user1).unwrap(), Some(Right::Read));
        assert_eq!(ns(1).can_read(&conn, &testing::link_share(1)).unwrap(), None);

        assert!(can_write(&conn, &user1, 6).unwrap());
        assert!(!can_write(&conn, &user1, 5).unwrap());
        assert!(matches!(
            can_write(&conn, &user1, 4).unwrap_err(),
            Error::NamespaceIsArchived { id: 4 }
        ));

        assert!(ns(1).can_update(&conn, &user1).unwrap());
        assert!(!ns(6).can_update(&conn, &user1).unwrap());
        assert!(!ns(-1).can_delete(&conn, &user1).unwrap());
        assert!(ns(1).can_create(&conn, &user1).unwrap());
        assert!(!ns(1).can_create(&conn, &testing::link_share(3)).unwrap());
        assert!(matches!(
            ns(9999).can_read(&conn, &user1).unwrap_err(),
            Error::NamespaceDoesNotExist { .. }
        ));
    }

    #[test]
    fn test_create() {
        let conn = testing::fixtures();
        let input = Namespace {
            id: 42,
            title: "Test".into(),
            description: "Lorem".into(),
            ..Default::default()
        };
        let created = create(&conn, &testing::user1(), &input).unwrap();
        assert_ne!(created.id, 42);
        assert_eq!(created.owner_id, 1);
        assert_eq!(created.owner.unwrap().username, "user1");

        let empty = Namespace::default();
        assert!(matches!(
            create(&conn, &testing::user1(), &empty).unwrap_err(),
            Error::NamespaceNameCannotBeEmpty
        ));

        let gone = Auth::User {
            id: 9999,
            username: "gone".into(),
        };
        assert!(matches!(create(&conn, &gone, &input).unwrap_err(), Error::UserDoesNotExist));

        let long = Namespace {
            title: "x".repeat(251),
            ..Default::default()
        };
        assert!(matches!(
            create(&conn, &testing::user1(), &long).unwrap_err(),
            Error::Service(_)
        ));
    }

    #[test]
    fn test_update() {
        let conn = testing::fixtures();
        let user1 = testing::user1();
        let mut ns = get_simple(&conn, 1).unwrap();
        ns.title = "renamed".into();
        ns.description = String::new();
        let updated = update(&conn, &user1, &ns).unwrap();
        assert_eq!(updated.title, "renamed");
        // An empty description leaves the stored one alone.
        assert_eq!(updated.description, "Lorem Ipsum");

        ns.owner = Some(User {
            id: 9999,
            ..Default::default()
        });
        assert!(matches!(update(&conn, &user1, &ns).unwrap_err(), Error::UserDoesNotExist));

        ns.owner = Some(User {
            id: 2,
            ..Default::default()
        });
        assert_eq!(update(&conn, &user1, &ns).unwrap().owner_id, 2);

        let mut archived = get_simple(&conn, 4).unwrap();
        assert!(matches!(
            update(&conn, &user1, &archived).unwrap_err(),
            Error::NamespaceIsArchived { id: 4 }
        ));
        archived.is_archived = false;
        assert!(!update(&conn, &user1, &archived).unwrap().is_archived);

        let missing = Namespace {
            id: 9999,
            title: "x".into(),
            ..Default::default()
        };
        assert!(matches!(
            update(&conn, &user1, &missing).unwrap_err(),
            Error::NamespaceDoesNotExist { id: 9999 }
        ));
    }

    #[test]
    fn test_delete_cascades() {
        let conn = testing::fixtures();
        let deleted = delete(&conn, 1).unwrap();
        assert_eq!(deleted, Deleted { lists: 3, tasks: 4 });
        assert!(matches!(get_simple(&conn, 1).unwrap_err(), Error::NamespaceDoesNotExist { .. }));
        assert!(matches!(
            lists::get_simple(&conn, 1).unwrap_err(),
            Error::ListDoesNotExist { id: 1 }
        ));
        assert!(matches!(delete(&conn, 1).unwrap_err(), Error::NamespaceDoesNotExist { .. }));
    }

    #[test]
    fn test_lists_by_namespace() {
        let conn = testing::fixtures();
        let user1 = testing::user1();
        let found = lists_by_namespace(&conn, &user1, 1).unwrap();
        assert_eq!(found.iter().map(|l| l.id).collect::<Vec<_>>(), vec![1, 2]);

        let shared = lists_by_namespace(&conn, &user1, SHARED_LISTS_NAMESPACE_ID).unwrap();
        assert_eq!(shared.iter().map(|l| l.id).collect::<Vec<_>>(), vec![3, 4, 10]);

        let favorites = lists_by_namespace(&conn, &user1, FAVORITES_NAMESPACE_ID).unwrap();
        assert_eq!(favorites.iter().map(|l| l.id).collect::<Vec<_>>(), vec![-1, 2]);

        let filters = lists_by_namespace(&conn, &user1, SAVED_FILTERS_NAMESPACE_ID).unwrap();
        assert_eq!(filters.len(), 1);
        assert_eq!(filters[0].id, -2);
    }
}
