//! Kanban buckets.

use rusqlite::{Connection, Row};
use tasklane_api::db::buckets as q;
use tasklane_api::db::tasks::{self as task_q, TaskQuery};
use tasklane_api::{Bucket, List, Right};

use crate::lists::DEFAULT_BUCKET_TITLE;
use crate::{Auth, Error, Permissions, Result, lists, sq, tasks, users};

fn bucket_from_row(row: &Row<'_>) -> rusqlite::Result<Bucket> {
    Ok(Bucket {
        id: row.get(0)?,
        title: row.get(1)?,
        list_id: row.get(2)?,
        tasks: Vec::new(),
        created_by_id: row.get(3)?,
        created_by: None,
        created: row.get(4)?,
        updated: row.get(5)?,
    })
}

pub fn get_simple(conn: &Connection, id: i64) -> Result<Bucket> {
    sq::query_opt(conn, q::get_by_id(id), bucket_from_row)?.ok_or(Error::BucketDoesNotExist { id })
}

/// A bucket that must belong to `list_id`.
pub fn get_in_list(conn: &Connection, id: i64, list_id: i64) -> Result<Bucket> {
    let bucket = get_simple(conn, id)?;
    if bucket.list_id != list_id {
        return Err(Error::BucketDoesNotBelongToList {
            bucket_id: id,
            list_id,
        });
    }
    Ok(bucket)
}

/// Id of the list's first bucket, creating a default one if it has none.
pub fn ensure_default(conn: &Connection, list_id: i64, created_by_id: i64) -> Result<i64> {
    if let Some(id) = sq::query_opt(conn, q::first_of_list(list_id, 0), |row| row.get(0))? {
        return Ok(id);
    }
    let id = sq::insert(conn, q::insert(DEFAULT_BUCKET_TITLE, list_id, created_by_id))?;
    tracing::debug!(bucket_id = id, list_id, "created default bucket");
    Ok(id)
}

impl Permissions for Bucket {
    fn can_create(&self, conn: &Connection, auth: &Auth) -> Result<bool> {
        lists::can_write(conn, auth, self.list_id)
    }

    fn can_read(&self, conn: &Connection, auth: &Auth) -> Result<Option<Right>> {
        let bucket = get_simple(conn, self.id)?;
        List {
            id: bucket.list_id,
            ..Default::default()
        }
        .can_read(conn, auth)
    }

    fn can_update(&self, conn: &Connection, auth: &Auth) -> Result<bool> {
        let bucket = get_simple(conn, self.id)?;
        lists::can_write(conn, auth, bucket.list_id)
    }

    fn can_delete(&self, conn: &Connection, auth: &Auth) -> Result<bool> {
        self.can_update(conn, auth)
    }
}

fn validate_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(Error::InvalidData("a bucket needs a title".into()));
    }
    tasklane_api::service::validate_title("title", title)?;
    Ok(())
}

pub fn create(conn: &Connection, auth: &Auth, bucket: &Bucket) -> Result<Bucket> {
    validate_title(&bucket.title)?;
    lists::stored(conn, bucket.list_id)?;
    let creator = users::get_by_id(conn, auth.acting_user_id())?;
    let id = sq::insert(conn, q::insert(&bucket.title, bucket.list_id, creator.id))?;
    let mut created = get_simple(conn, id)?;
    created.created_by = Some(creator);
    Ok(created)
}

/// Every bucket of a list with its tasks. Tasks whose bucket is gone show up
/// in the first bucket.
pub fn read_all(conn: &Connection, list_id: i64) -> Result<Vec<Bucket>> {
    lists::stored(conn, list_id)?;
    let mut buckets = sq::query_map(conn, q::by_list(list_id), bucket_from_row)?;
    if buckets.is_empty() {
        return Ok(buckets);
    }

    let creator_ids: Vec<i64> = buckets.iter().map(|b| b.created_by_id).collect();
    let creators = users::get_many(conn, &creator_ids)?;
    for bucket in &mut buckets {
        bucket.created_by = creators.get(&bucket.created_by_id).cloned();
    }

    let built = task_q::collection(&[list_id], &TaskQuery::default(), None, 0);
    let mut list_tasks = sq::query_map(conn, built.select_query, tasks::task_from_row)?;
    tasks::add_details(conn, &mut list_tasks)?;
    for task in list_tasks {
        let slot = buckets
            .iter()
            .position(|b| b.id == task.bucket_id)
            .unwrap_or(0);
        buckets[slot].tasks.push(task);
    }
    Ok(buckets)
}

/// Rename a bucket of `list_id`.
pub fn update(conn: &Connection, list_id: i64, bucket: &Bucket) -> Result<Bucket> {
    validate_title(&bucket.title)?;
    get_in_list(conn, bucket.id, list_id)?;
    sq::execute(conn, q::update_title(bucket.id, &bucket.title))?;
    get_simple(conn, bucket.id)
}

/// Delete a bucket, moving its tasks to the list's first remaining bucket.
/// A list always keeps at least one bucket.
pub fn delete(conn: &Connection, list_id: i64, id: i64) -> Result<()> {
    get_in_list(conn, id, list_id)?;
    if sq::count(conn, q::count_by_list(list_id))? <= 1 {
        return Err(Error::CannotRemoveLastBucket);
    }
    let tx = conn.unchecked_transaction()?;
    let target: i64 = sq::query_row(&tx, q::first_of_list(list_id, id), |row| row.get(0))?;
    sq::execute(&tx, task_q::move_bucket(id, target))?;
    sq::execute(&tx, q::delete(id))?;
    tx.commit()?;
    tracing::debug!(bucket_id = id, moved_to = target, "deleted bucket");
    Ok(())
}
