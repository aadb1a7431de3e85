//! Task assignee query builders.

use sea_query::{Alias, Asterisk, Expr, Func, Order, Query, SqliteQueryBuilder};

use super::Built;
use super::tables::{TaskAssignees, Users};
use super::users::user_columns;

/// INSERT an assignee row.
pub fn insert(task_id: i64, user_id: i64) -> Built {
    Query::insert()
        .into_table(TaskAssignees::Table)
        .columns([TaskAssignees::TaskId, TaskAssignees::UserId])
        .values_panic([task_id.into(), user_id.into()])
        .build(SqliteQueryBuilder)
}

/// DELETE one assignee of a task.
pub fn delete(task_id: i64, user_id: i64) -> Built {
    Query::delete()
        .from_table(TaskAssignees::Table)
        .and_where(Expr::col(TaskAssignees::TaskId).eq(task_id))
        .and_where(Expr::col(TaskAssignees::UserId).eq(user_id))
        .build(SqliteQueryBuilder)
}

/// DELETE every assignee of a task.
pub fn delete_by_task(task_id: i64) -> Built {
    Query::delete()
        .from_table(TaskAssignees::Table)
        .and_where(Expr::col(TaskAssignees::TaskId).eq(task_id))
        .build(SqliteQueryBuilder)
}

/// Whether a user is already assigned to a task.
pub fn exists(task_id: i64, user_id: i64) -> Built {
    Query::select()
        .expr_as(Func::count(Expr::col(Asterisk)), Alias::new("count"))
        .from(TaskAssignees::Table)
        .and_where(Expr::col(TaskAssignees::TaskId).eq(task_id))
        .and_where(Expr::col(TaskAssignees::UserId).eq(user_id))
        .build(SqliteQueryBuilder)
}

/// Users assigned to any of the given tasks, each row prefixed with the task id.
pub fn users_of_tasks(task_ids: &[i64]) -> Built {
    let mut q = Query::select()
        .column((TaskAssignees::Table, TaskAssignees::TaskId))
        .to_owned();
    user_columns(&mut q);
    q.from(TaskAssignees::Table)
        .inner_join(
            Users::Table,
            Expr::col((Users::Table, Users::Id)).equals((TaskAssignees::Table, TaskAssignees::UserId)),
        )
        .and_where(
            Expr::col((TaskAssignees::Table, TaskAssignees::TaskId)).is_in(task_ids.iter().copied()),
        )
        .order_by((TaskAssignees::Table, TaskAssignees::Id), Order::Asc)
        .build(SqliteQueryBuilder)
}
