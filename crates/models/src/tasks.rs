//! Tasks and task collections.

use std::collections::HashMap;

use rusqlite::{Connection, Row};
use tasklane_api::db::assignees as assignee_q;
use tasklane_api::db::tasks::{self as q, TaskQuery, TaskValues};
use tasklane_api::service::{self, Pagination};
use tasklane_api::{FAVORITES_LIST_ID, List, Right, Task, User};

use crate::{Auth, Error, Page, Permissions, Result, buckets, lists, saved_filters, sq, users};

pub(crate) fn task_from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        done: row.get(3)?,
        done_at: row.get(4)?,
        due_date: row.get(5)?,
        priority: row.get(6)?,
        list_id: row.get(7)?,
        bucket_id: row.get(8)?,
        is_favorite: row.get(9)?,
        created_by_id: row.get(10)?,
        created_by: None,
        assignees: Vec::new(),
        created: row.get(11)?,
        updated: row.get(12)?,
    })
}

/// Attach creators and assignees with one query each.
pub(crate) fn add_details(conn: &Connection, tasks: &mut [Task]) -> Result<()> {
    if tasks.is_empty() {
        return Ok(());
    }
    let creator_ids: Vec<i64> = tasks.iter().map(|t| t.created_by_id).collect();
    let creators = users::get_many(conn, &creator_ids)?;

    let task_ids: Vec<i64> = tasks.iter().map(|t| t.id).collect();
    let rows = sq::query_map(conn, assignee_q::users_of_tasks(&task_ids), |row| {
        Ok((row.get::<_, i64>(0)?, users::user_at(row, 1)?))
    })?;
    let mut assignees: HashMap<i64, Vec<User>> = HashMap::new();
    for (task_id, user) in rows {
        assignees.entry(task_id).or_default().push(user);
    }

    for task in tasks.iter_mut() {
        task.created_by = creators.get(&task.created_by_id).cloned();
        task.assignees = assignees.remove(&task.id).unwrap_or_default();
    }
    Ok(())
}

/// A task without creator or assignees.
pub fn get_simple(conn: &Connection, id: i64) -> Result<Task> {
    sq::query_opt(conn, q::get_by_id(id), task_from_row)?.ok_or(Error::TaskDoesNotExist { id })
}

/// A task with its creator and assignees.
pub fn read_one(conn: &Connection, id: i64) -> Result<Task> {
    let mut task = get_simple(conn, id)?;
    add_details(conn, std::slice::from_mut(&mut task))?;
    Ok(task)
}

fn list_ref(id: i64) -> List {
    List {
        id,
        ..Default::default()
    }
}

impl Permissions for Task {
    fn can_create(&self, conn: &Connection, auth: &Auth) -> Result<bool> {
        lists::can_write(conn, auth, self.list_id)
    }

    fn can_read(&self, conn: &Connection, auth: &Auth) -> Result<Option<Right>> {
        let task = get_simple(conn, self.id)?;
        list_ref(task.list_id).can_read(conn, auth)
    }

    fn can_update(&self, conn: &Connection, auth: &Auth) -> Result<bool> {
        let current = get_simple(conn, self.id)?;
        if !lists::can_write(conn, auth, current.list_id)? {
            return Ok(false);
        }
        if self.list_id != 0 && self.list_id != current.list_id {
            return lists::can_write(conn, auth, self.list_id);
        }
        Ok(true)
    }

    fn can_delete(&self, conn: &Connection, auth: &Auth) -> Result<bool> {
        let current = get_simple(conn, self.id)?;
        lists::can_write(conn, auth, current.list_id)
    }
}

// ── CRUD ──────────────────────────────────────────────────────────────────

fn validate(task: &Task) -> Result<()> {
    if task.title.trim().is_empty() {
        return Err(Error::TaskCannotBeEmpty);
    }
    service::validate_title("title", &task.title)?;
    Ok(())
}

fn values<'a>(task: &'a Task, list_id: i64, bucket_id: i64, done_at: Option<&'a str>) -> TaskValues<'a> {
    TaskValues {
        title: &task.title,
        description: &task.description,
        done: task.done,
        done_at,
        due_date: task.due_date.as_deref(),
        priority: task.priority,
        list_id,
        bucket_id,
        is_favorite: task.is_favorite,
    }
}

/// Create a task. Link shares create tasks in the name of the user who
/// shared the list. Without a bucket the task lands in the list's first one.
pub fn create(conn: &Connection, auth: &Auth, task: &Task) -> Result<Task> {
    validate(task)?;
    let list = lists::stored(conn, task.list_id)?;
    let creator = users::get_by_id(conn, auth.acting_user_id())?;
    let bucket_id = match task.bucket_id {
        0 => buckets::ensure_default(conn, list.id, creator.id)?,
        id => buckets::get_in_list(conn, id, list.id)?.id,
    };
    let done_at = task.done.then(service::now_sqlite);

    let id = sq::insert(
        conn,
        q::insert(creator.id, &values(task, list.id, bucket_id, done_at.as_deref())),
    )?;
    tracing::debug!(task_id = id, list_id = list.id, "created task");
    read_one(conn, id)
}

/// Update a task. Marking it done stamps `done_at`, undoing clears it.
/// A task moved to another list goes to that list's first bucket unless a
/// bucket of the new list is given.
pub fn update(conn: &Connection, auth: &Auth, task: &Task) -> Result<Task> {
    validate(task)?;
    let current = get_simple(conn, task.id)?;

    let list_id = match task.list_id {
        0 => current.list_id,
        id if id == current.list_id => id,
        id => lists::stored(conn, id)?.id,
    };
    let moved = list_id != current.list_id;
    let bucket_id = if task.bucket_id != 0 && !(moved && task.bucket_id == current.bucket_id) {
        buckets::get_in_list(conn, task.bucket_id, list_id)?.id
    } else if moved || current.bucket_id == 0 {
        buckets::ensure_default(conn, list_id, auth.acting_user_id())?
    } else {
        current.bucket_id
    };

    let done_at = match (task.done, current.done) {
        (true, false) => Some(service::now_sqlite()),
        (true, true) => current.done_at.clone(),
        (false, _) => None,
    };

    sq::execute(conn, q::update(task.id, &values(task, list_id, bucket_id, done_at.as_deref())))?;
    read_one(conn, task.id)
}

/// Delete a task and its assignees.
pub fn delete(conn: &Connection, id: i64) -> Result<()> {
    get_simple(conn, id)?;
    let tx = conn.unchecked_transaction()?;
    sq::execute(&tx, assignee_q::delete_by_task(id))?;
    sq::execute(&tx, q::delete(id))?;
    tx.commit()?;
    Ok(())
}

/// Tasks of one list. The favorites list collects favorited tasks from every
/// list the principal can read; a saved-filter list applies its criteria
/// across the same lists.
pub fn read_all_for_list(
    conn: &Connection,
    auth: &Auth,
    list_id: i64,
    search: &str,
    pagination: Pagination,
) -> Result<Page<Task>> {
    let filter_id = service::saved_filter_id_from_list_id(list_id);
    let (list_ids, criteria) = if list_id == FAVORITES_LIST_ID {
        let criteria = TaskQuery {
            search,
            favorites_only: true,
            ..Default::default()
        };
        (lists::readable_ids(conn, auth)?, criteria)
    } else if filter_id > 0 {
        let filter = saved_filters::get_simple(conn, filter_id)?;
        let readable = lists::readable_ids(conn, auth)?;
        let list_ids = if filter.filters.list_ids.is_empty() {
            readable
        } else {
            readable
                .into_iter()
                .filter(|id| filter.filters.list_ids.contains(id))
                .collect()
        };
        let search = if search.is_empty() {
            filter.filters.search.clone()
        } else {
            search.to_string()
        };
        return collection(conn, &list_ids, &TaskQuery {
            search: &search,
            done: filter.filters.done,
            favorites_only: false,
        }, pagination);
    } else {
        lists::stored(conn, list_id)?;
        let criteria = TaskQuery {
            search,
            ..Default::default()
        };
        (vec![list_id], criteria)
    };
    collection(conn, &list_ids, &criteria, pagination)
}

fn collection(
    conn: &Connection,
    list_ids: &[i64],
    criteria: &TaskQuery<'_>,
    pagination: Pagination,
) -> Result<Page<Task>> {
    if list_ids.is_empty() {
        return Ok(Page {
            items: Vec::new(),
            total: 0,
        });
    }
    let built = q::collection(list_ids, criteria, pagination.limit, pagination.offset);
    let total = sq::count(conn, built.count_query)?;
    let mut tasks = sq::query_map(conn, built.select_query, task_from_row)?;
    add_details(conn, &mut tasks)?;
    Ok(Page { items: tasks, total })
}

pub fn count(conn: &Connection) -> Result<i64> {
    Ok(sq::count(conn, q::count())?)
}
