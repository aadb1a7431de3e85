//! Saved filters. Each one also shows up as a pseudo list in the
//! "Filters" namespace.

use rusqlite::types::Type;
use rusqlite::{Connection, Row};
use tasklane_api::db::saved_filters as q;
use tasklane_api::{Right, SavedFilter, TaskFilter, User};

use crate::{Auth, Error, Permissions, Result, auth, sq, users};

fn filter_from_row(row: &Row<'_>) -> rusqlite::Result<SavedFilter> {
    let raw: String = row.get(3)?;
    let filters: TaskFilter = serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?;
    Ok(SavedFilter {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        filters,
        owner_id: row.get(4)?,
        owner: None,
        is_favorite: row.get(5)?,
        created: row.get(6)?,
        updated: row.get(7)?,
    })
}

pub fn get_simple(conn: &Connection, id: i64) -> Result<SavedFilter> {
    sq::query_opt(conn, q::get_by_id(id), filter_from_row)?
        .ok_or(Error::SavedFilterDoesNotExist { id })
}

pub fn read_one(conn: &Connection, id: i64) -> Result<SavedFilter> {
    let mut filter = get_simple(conn, id)?;
    filter.owner = Some(users::get_by_id(conn, filter.owner_id)?);
    Ok(filter)
}

/// Filters owned by `owner`, oldest first.
pub fn for_owner(conn: &Connection, owner: &User) -> Result<Vec<SavedFilter>> {
    let mut filters = sq::query_map(conn, q::by_owner(owner.id, ""), filter_from_row)?;
    for filter in &mut filters {
        filter.owner = Some(owner.clone());
    }
    Ok(filters)
}

fn owned_by(conn: &Connection, auth: &Auth, id: i64) -> Result<bool> {
    let Auth::User { id: user_id, .. } = auth else {
        return Err(Error::SavedFilterNotAvailableForLinkShare);
    };
    Ok(get_simple(conn, id)?.owner_id == *user_id)
}

impl Permissions for SavedFilter {
    fn can_create(&self, _conn: &Connection, auth: &Auth) -> Result<bool> {
        if auth.is_link_share() {
            return Err(Error::SavedFilterNotAvailableForLinkShare);
        }
        Ok(true)
    }

    fn can_read(&self, conn: &Connection, auth: &Auth) -> Result<Option<Right>> {
        Ok(owned_by(conn, auth, self.id)?.then_some(Right::Admin))
    }

    fn can_update(&self, conn: &Connection, auth: &Auth) -> Result<bool> {
        owned_by(conn, auth, self.id)
    }

    fn can_delete(&self, conn: &Connection, auth: &Auth) -> Result<bool> {
        owned_by(conn, auth, self.id)
    }
}

fn validate(filter: &SavedFilter) -> Result<()> {
    if filter.title.trim().is_empty() {
        return Err(Error::InvalidData("a saved filter needs a title".into()));
    }
    tasklane_api::service::validate_title("title", &filter.title)?;
    Ok(())
}

pub fn create(conn: &Connection, auth: &Auth, filter: &SavedFilter) -> Result<SavedFilter> {
    validate(filter)?;
    let owner = auth::user_from_auth(conn, auth)?;
    let filters = serde_json::to_string(&filter.filters)?;
    let id = sq::insert(
        conn,
        q::insert(&filter.title, &filter.description, &filters, owner.id, filter.is_favorite),
    )?;
    let mut created = get_simple(conn, id)?;
    created.owner = Some(owner);
    Ok(created)
}

/// Update a filter. The owner never changes.
pub fn update(conn: &Connection, filter: &SavedFilter) -> Result<SavedFilter> {
    validate(filter)?;
    get_simple(conn, filter.id)?;
    let filters = serde_json::to_string(&filter.filters)?;
    sq::execute(
        conn,
        q::update(filter.id, &filter.title, &filter.description, &filters, filter.is_favorite),
    )?;
    read_one(conn, filter.id)
}

pub fn delete(conn: &Connection, id: i64) -> Result<()> {
    get_simple(conn, id)?;
    sq::execute(conn, q::delete(id))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[test]
    fn test_read() {
        let conn = testing::fixtures();
        let filter = read_one(&conn, 1).unwrap();
        assert_eq!(filter.title, "testfilter1");
        assert_eq!(filter.filters.done, Some(false));
        assert_eq!(filter.owner.unwrap().id, 1);
        assert!(matches!(
            read_one(&conn, 9999).unwrap_err(),
            Error::SavedFilterDoesNotExist { id: 9999 }
        ));

        let user1 = users::get_by_id(&conn, 1).unwrap();
        assert_eq!(for_owner(&conn, &user1).unwrap().len(), 1);
        let user2 = users::get_by_id(&conn, 2).unwrap();
        assert!(for_owner(&conn, &user2).unwrap().is_empty());
    }

    #[test]
    fn test_create_update_delete() {
        let conn = testing::fixtures();
        let filter = SavedFilter {
            title: "urgent".into(),
            filters: TaskFilter {
                search: "task".into(),
                list_ids: vec![1, 3],
                ..Default::default()
            },
            ..Default::default()
        };
        let created = create(&conn, &testing::user2(), &filter).unwrap();
        assert_eq!(created.owner_id, 2);
        assert_eq!(created.filters.list_ids, vec![1, 3]);

        let mut changed = created.clone();
        changed.filters.done = Some(true);
        changed.is_favorite = true;
        let updated = update(&conn, &changed).unwrap();
        assert_eq!(updated.filters.done, Some(true));
        assert!(updated.is_favorite);
        assert_eq!(updated.owner_id, 2);

        delete(&conn, created.id).unwrap();
        assert!(matches!(get_simple(&conn, created.id).unwrap_err(), Error::SavedFilterDoesNotExist { .. }));

        let untitled = SavedFilter::default();
        assert!(matches!(create(&conn, &testing::user1(), &untitled).unwrap_err(), Error::InvalidData(_)));
    }

    #[test]
    fn test_rights() {
        let conn = testing::fixtures();
        let filter = SavedFilter {
            id: 1,
            ..Default::default()
        };
        assert_eq!(filter.can_read(&conn, &testing::user1()).unwrap(), Some(Right::Admin));
        assert_eq!(filter.can_read(&conn, &testing::user2()).unwrap(), None);
        assert!(filter.can_update(&conn, &testing::user1()).unwrap());
        assert!(!filter.can_delete(&conn, &testing::user2()).unwrap());
        assert!(matches!(
            filter.can_read(&conn, &testing::link_share(1)).unwrap_err(),
            Error::SavedFilterNotAvailableForLinkShare
        ));
        assert!(matches!(
            filter.can_create(&conn, &testing::link_share(1)).unwrap_err(),
            Error::SavedFilterNotAvailableForLinkShare
        ));
    }
}
