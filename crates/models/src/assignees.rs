//! Users assigned to tasks.

use rusqlite::Connection;
use tasklane_api::db::assignees as q;
use tasklane_api::service::{self, Pagination};
use tasklane_api::{Right, TaskAssignee, User};

use crate::{Auth, Error, Page, Permissions, Result, lists, sq, tasks, users};

fn list_of_task(conn: &Connection, task_id: i64) -> Result<i64> {
    Ok(tasks::get_simple(conn, task_id)?.list_id)
}

impl Permissions for TaskAssignee {
    fn can_create(&self, conn: &Connection, auth: &Auth) -> Result<bool> {
        lists::can_write(conn, auth, list_of_task(conn, self.task_id)?)
    }

    fn can_read(&self, conn: &Connection, auth: &Auth) -> Result<Option<Right>> {
        let list = lists::get_simple(conn, list_of_task(conn, self.task_id)?)?;
        lists::right_of(conn, auth, &list)
    }

    fn can_delete(&self, conn: &Connection, auth: &Auth) -> Result<bool> {
        self.can_create(conn, auth)
    }
}

/// Fails unless `user` can read the list of the task.
fn check_access(conn: &Connection, list_id: i64, user: &User) -> Result<()> {
    let list = lists::get_simple(conn, list_id)?;
    if lists::right_of(conn, &Auth::user(user), &list)?.is_none() {
        return Err(Error::UserDoesNotHaveAccessToList);
    }
    Ok(())
}

/// Assign a user to a task. Only users who can read the task's list qualify.
pub fn create(conn: &Connection, assignee: &TaskAssignee) -> Result<TaskAssignee> {
    let list_id = list_of_task(conn, assignee.task_id)?;
    let user = users::get_by_id(conn, assignee.user_id)?;
    check_access(conn, list_id, &user)?;
    if sq::count(conn, q::exists(assignee.task_id, user.id))? > 0 {
        return Err(Error::UserAlreadyAssigned);
    }
    let id = sq::insert(conn, q::insert(assignee.task_id, user.id))?;
    Ok(TaskAssignee {
        id,
        task_id: assignee.task_id,
        user_id: user.id,
        created: service::now_sqlite(),
    })
}

pub fn delete(conn: &Connection, task_id: i64, user_id: i64) -> Result<()> {
    tasks::get_simple(conn, task_id)?;
    sq::execute(conn, q::delete(task_id, user_id))?;
    Ok(())
}

/// Users assigned to a task whose username contains `search`.
pub fn read_all(conn: &Connection, task_id: i64, search: &str, pagination: Pagination) -> Result<Page<User>> {
    tasks::get_simple(conn, task_id)?;
    let assigned = sq::query_map(conn, q::users_of_tasks(&[task_id]), |row| users::user_at(row, 1))?;
    let search = search.to_lowercase();
    let matching = assigned
        .into_iter()
        .filter(|u| u.username.to_lowercase().contains(&search))
        .collect();
    Ok(Page::slice(matching, pagination))
}

/// Replace every assignee of a task. Users are matched by id, or by
/// username when no id is given.
pub fn bulk(conn: &Connection, task_id: i64, wanted: &[User]) -> Result<Vec<User>> {
    let list_id = list_of_task(conn, task_id)?;
    let mut resolved: Vec<User> = Vec::with_capacity(wanted.len());
    for candidate in wanted {
        let user = if candidate.id > 0 {
            users::get_by_id(conn, candidate.id)?
        } else {
            users::get_by_username(conn, &candidate.username)?
        };
        check_access(conn, list_id, &user)?;
        if !resolved.iter().any(|u| u.id == user.id) {
            resolved.push(user);
        }
    }

    let tx = conn.unchecked_transaction()?;
    sq::execute(&tx, q::delete_by_task(task_id))?;
    for user in &resolved {
        sq::insert(&tx, q::insert(task_id, user.id))?;
    }
    tx.commit()?;
    tracing::debug!(task_id, assignees = resolved.len(), "replaced assignees");
    Ok(resolved)
}
