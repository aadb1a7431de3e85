//! Link shares: anonymous access to one list through a random hash.

use rusqlite::{Connection, Row};
use tasklane_api::db::link_shares as q;
use tasklane_api::service::{LINK_SHARE_HASH_LEN, Pagination};
use tasklane_api::{LinkSharing, List, Right, SHARING_TYPE_WITHOUT_PASSWORD, crypto};

use crate::{Auth, Error, Page, Permissions, Result, lists, sq, users};

/// Raw row; the right column is checked after mapping.
fn share_from_row(row: &Row<'_>) -> rusqlite::Result<(LinkSharing, i64)> {
    Ok((
        LinkSharing {
            id: row.get(0)?,
            hash: row.get(1)?,
            list_id: row.get(2)?,
            right: Right::Read,
            sharing_type: row.get(4)?,
            shared_by_id: row.get(5)?,
            shared_by: None,
            created: row.get(6)?,
            updated: row.get(7)?,
        },
        row.get(3)?,
    ))
}

fn with_right((mut share, right): (LinkSharing, i64)) -> Result<LinkSharing> {
    share.right = Right::try_from(right)?;
    Ok(share)
}

pub fn get_by_id(conn: &Connection, id: i64) -> Result<LinkSharing> {
    let row = sq::query_opt(conn, q::get_by_id(id), share_from_row)?.ok_or(Error::ListShareDoesNotExist)?;
    with_right(row)
}

/// The share behind a hash, as presented by an anonymous client.
pub fn get_by_hash(conn: &Connection, hash: &str) -> Result<LinkSharing> {
    let row = sq::query_opt(conn, q::get_by_hash(hash), share_from_row)?.ok_or(Error::ListShareDoesNotExist)?;
    with_right(row)
}

fn attach_sharers(conn: &Connection, shares: &mut [LinkSharing]) -> Result<()> {
    let ids: Vec<i64> = shares.iter().map(|s| s.shared_by_id).collect();
    let sharers = users::get_many(conn, &ids)?;
    for share in shares.iter_mut() {
        share.shared_by = sharers.get(&share.shared_by_id).cloned();
    }
    Ok(())
}

/// Managing a share needs write on the list, or admin for admin shares.
fn can_manage(conn: &Connection, auth: &Auth, list_id: i64, right: Right) -> Result<bool> {
    if auth.is_link_share() {
        return Ok(false);
    }
    if right == Right::Admin {
        return lists::is_admin(conn, auth, list_id);
    }
    lists::can_write(conn, auth, list_id)
}

impl Permissions for LinkSharing {
    fn can_create(&self, conn: &Connection, auth: &Auth) -> Result<bool> {
        can_manage(conn, auth, self.list_id, self.right)
    }

    fn can_read(&self, conn: &Connection, auth: &Auth) -> Result<Option<Right>> {
        if auth.is_link_share() {
            return Ok(None);
        }
        List {
            id: self.list_id,
            ..Default::default()
        }
        .can_read(conn, auth)
    }

    fn can_delete(&self, conn: &Connection, auth: &Auth) -> Result<bool> {
        let stored = get_by_id(conn, self.id)?;
        can_manage(conn, auth, stored.list_id, stored.right)
    }
}

/// Create a share for a list with a fresh random hash.
pub fn create(conn: &Connection, auth: &Auth, share: &LinkSharing) -> Result<LinkSharing> {
    lists::stored(conn, share.list_id)?;
    let sharer = users::get_by_id(conn, auth.acting_user_id())?;
    let hash = crypto::random_string(LINK_SHARE_HASH_LEN)?;
    let id = sq::insert(
        conn,
        q::insert(
            &hash,
            share.list_id,
            share.right.as_i64(),
            SHARING_TYPE_WITHOUT_PASSWORD,
            sharer.id,
        ),
    )?;
    tracing::debug!(share_id = id, list_id = share.list_id, right = %share.right, "created link share");
    let mut created = get_by_id(conn, id)?;
    created.shared_by = Some(sharer);
    Ok(created)
}

pub fn read_one(conn: &Connection, id: i64) -> Result<LinkSharing> {
    let mut share = get_by_id(conn, id)?;
    attach_sharers(conn, std::slice::from_mut(&mut share))?;
    Ok(share)
}

/// Shares of a list. `search` matches the hash.
pub fn read_all(conn: &Connection, list_id: i64, search: &str, pagination: Pagination) -> Result<Page<LinkSharing>> {
    lists::stored(conn, list_id)?;
    let rows = sq::query_map(conn, q::by_list(list_id), share_from_row)?;
    let mut shares = rows.into_iter().map(with_right).collect::<Result<Vec<_>>>()?;
    shares.retain(|share| share.hash.contains(search));
    attach_sharers(conn, &mut shares)?;
    Ok(Page::slice(shares, pagination))
}

pub fn delete(conn: &Connection, list_id: i64, id: i64) -> Result<()> {
    if sq::execute(conn, q::delete(id, list_id))? == 0 {
        return Err(Error::ListShareDoesNotExist);
    }
    Ok(())
}
