//! Task query builders.

use sea_query::{Alias, Asterisk, Expr, Func, Order, Query, SelectStatement, SqliteQueryBuilder};

use super::tables::Tasks;
use super::{Built, BuiltListQuery};

/// Column values written on insert and update.
pub struct TaskValues<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub done: bool,
    pub done_at: Option<&'a str>,
    pub due_date: Option<&'a str>,
    pub priority: i64,
    pub list_id: i64,
    pub bucket_id: i64,
    pub is_favorite: bool,
}

/// Criteria for a task collection.
#[derive(Debug, Clone, Default)]
pub struct TaskQuery<'a> {
    pub search: &'a str,
    pub done: Option<bool>,
    pub favorites_only: bool,
}

// ── Column helpers ────────────────────────────────────────────────────────

/// id, title, description, done, done_at, due_date, priority, list_id,
/// bucket_id, is_favorite, created_by_id, created, updated.
pub fn task_columns(q: &mut SelectStatement) -> &mut SelectStatement {
    q.column((Tasks::Table, Tasks::Id))
        .column((Tasks::Table, Tasks::Title))
        .column((Tasks::Table, Tasks::Description))
        .column((Tasks::Table, Tasks::Done))
        .column((Tasks::Table, Tasks::DoneAt))
        .column((Tasks::Table, Tasks::DueDate))
        .column((Tasks::Table, Tasks::Priority))
        .column((Tasks::Table, Tasks::ListId))
        .column((Tasks::Table, Tasks::BucketId))
        .column((Tasks::Table, Tasks::IsFavorite))
        .column((Tasks::Table, Tasks::CreatedById))
        .column((Tasks::Table, Tasks::Created))
        .column((Tasks::Table, Tasks::Updated))
}

// ── CRUD ──────────────────────────────────────────────────────────────────

/// INSERT a task.
pub fn insert(created_by_id: i64, v: &TaskValues<'_>) -> Built {
    Query::insert()
        .into_table(Tasks::Table)
        .columns([
            Tasks::Title,
            Tasks::Description,
            Tasks::Done,
            Tasks::DoneAt,
            Tasks::DueDate,
            Tasks::Priority,
            Tasks::ListId,
            Tasks::BucketId,
            Tasks::IsFavorite,
            Tasks::CreatedById,
        ])
        .values_panic([
            v.title.into(),
            v.description.into(),
            v.done.into(),
            v.done_at.map(|s| s.to_string()).into(),
            v.due_date.map(|s| s.to_string()).into(),
            v.priority.into(),
            v.list_id.into(),
            v.bucket_id.into(),
            v.is_favorite.into(),
            created_by_id.into(),
        ])
        .build(SqliteQueryBuilder)
}

/// SELECT a task by id.
pub fn get_by_id(id: i64) -> Built {
    let mut q = Query::select().to_owned();
    task_columns(&mut q);
    q.from(Tasks::Table)
        .and_where(Expr::col((Tasks::Table, Tasks::Id)).eq(id))
        .build(SqliteQueryBuilder)
}

/// UPDATE every editable column of a task.
pub fn update(id: i64, v: &TaskValues<'_>) -> Built {
    Query::update()
        .table(Tasks::Table)
        .value(Tasks::Title, v.title)
        .value(Tasks::Description, v.description)
        .value(Tasks::Done, v.done)
        .value(Tasks::DoneAt, v.done_at.map(|s| s.to_string()))
        .value(Tasks::DueDate, v.due_date.map(|s| s.to_string()))
        .value(Tasks::Priority, v.priority)
        .value(Tasks::ListId, v.list_id)
        .value(Tasks::BucketId, v.bucket_id)
        .value(Tasks::IsFavorite, v.is_favorite)
        .value(Tasks::Updated, Expr::cust("datetime('now')"))
        .and_where(Expr::col(Tasks::Id).eq(id))
        .build(SqliteQueryBuilder)
}

/// DELETE a task.
pub fn delete(id: i64) -> Built {
    Query::delete()
        .from_table(Tasks::Table)
        .and_where(Expr::col(Tasks::Id).eq(id))
        .build(SqliteQueryBuilder)
}

/// DELETE every task of the given lists.
pub fn delete_by_lists(list_ids: &[i64]) -> Built {
    Query::delete()
        .from_table(Tasks::Table)
        .and_where(Expr::col(Tasks::ListId).is_in(list_ids.iter().copied()))
        .build(SqliteQueryBuilder)
}

/// Total number of tasks.
pub fn count() -> Built {
    Query::select()
        .expr_as(Func::count(Expr::col(Asterisk)), Alias::new("count"))
        .from(Tasks::Table)
        .build(SqliteQueryBuilder)
}

/// Number of tasks in the given lists, used to keep metrics in step with
/// cascading deletes.
pub fn count_by_lists(list_ids: &[i64]) -> Built {
    Query::select()
        .expr_as(Func::count(Expr::col(Asterisk)), Alias::new("count"))
        .from(Tasks::Table)
        .and_where(Expr::col(Tasks::ListId).is_in(list_ids.iter().copied()))
        .build(SqliteQueryBuilder)
}

/// Move every task of one bucket into another.
pub fn move_bucket(from_bucket_id: i64, to_bucket_id: i64) -> Built {
    Query::update()
        .table(Tasks::Table)
        .value(Tasks::BucketId, to_bucket_id)
        .and_where(Expr::col(Tasks::BucketId).eq(from_bucket_id))
        .build(SqliteQueryBuilder)
}

// ── Collections ───────────────────────────────────────────────────────────

fn collection_filter(q: &mut SelectStatement, list_ids: &[i64], filter: &TaskQuery<'_>) {
    q.from(Tasks::Table)
        .and_where(Expr::col((Tasks::Table, Tasks::ListId)).is_in(list_ids.iter().copied()));
    if !filter.search.is_empty() {
        let like = format!("%{}%", filter.search);
        q.and_where(
            Expr::col((Tasks::Table, Tasks::Title))
                .like(like.clone())
                .or(Expr::col((Tasks::Table, Tasks::Description)).like(like)),
        );
    }
    if let Some(done) = filter.done {
        q.and_where(Expr::col((Tasks::Table, Tasks::Done)).eq(done));
    }
    if filter.favorites_only {
        q.and_where(Expr::col((Tasks::Table, Tasks::IsFavorite)).eq(true));
    }
}

/// Tasks of the given lists matching `filter`, oldest first.
pub fn collection(
    list_ids: &[i64],
    filter: &TaskQuery<'_>,
    limit: Option<u64>,
    offset: u64,
) -> BuiltListQuery {
    let mut select_q = Query::select().to_owned();
    task_columns(&mut select_q);
    collection_filter(&mut select_q, list_ids, filter);
    select_q.order_by((Tasks::Table, Tasks::Id), Order::Asc);
    if let Some(limit) = limit {
        select_q.limit(limit).offset(offset);
    }

    let mut count_q = Query::select()
        .expr_as(Func::count(Expr::col(Asterisk)), Alias::new("count"))
        .to_owned();
    collection_filter(&mut count_q, list_ids, filter);

    BuiltListQuery {
        count_query: count_q.build(SqliteQueryBuilder),
        select_query: select_q.build(SqliteQueryBuilder),
    }
}
