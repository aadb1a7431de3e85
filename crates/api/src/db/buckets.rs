//! Kanban bucket query builders.

use sea_query::{Alias, Asterisk, Expr, Func, Order, Query, SelectStatement, SqliteQueryBuilder};

use super::Built;
use super::tables::Buckets;

/// id, title, list_id, created_by_id, created, updated.
pub fn bucket_columns(q: &mut SelectStatement) -> &mut SelectStatement {
    q.column((Buckets::Table, Buckets::Id))
        .column((Buckets::Table, Buckets::Title))
        .column((Buckets::Table, Buckets::ListId))
        .column((Buckets::Table, Buckets::CreatedById))
        .column((Buckets::Table, Buckets::Created))
        .column((Buckets::Table, Buckets::Updated))
}

/// INSERT a bucket.
pub fn insert(title: &str, list_id: i64, created_by_id: i64) -> Built {
    Query::insert()
        .into_table(Buckets::Table)
        .columns([Buckets::Title, Buckets::ListId, Buckets::CreatedById])
        .values_panic([title.into(), list_id.into(), created_by_id.into()])
        .build(SqliteQueryBuilder)
}

/// SELECT a bucket by id.
pub fn get_by_id(id: i64) -> Built {
    let mut q = Query::select().to_owned();
    bucket_columns(&mut q);
    q.from(Buckets::Table)
        .and_where(Expr::col((Buckets::Table, Buckets::Id)).eq(id))
        .build(SqliteQueryBuilder)
}

/// Rename a bucket.
pub fn update_title(id: i64, title: &str) -> Built {
    Query::update()
        .table(Buckets::Table)
        .value(Buckets::Title, title)
        .value(Buckets::Updated, Expr::cust("datetime('now')"))
        .and_where(Expr::col(Buckets::Id).eq(id))
        .build(SqliteQueryBuilder)
}

/// DELETE a bucket.
pub fn delete(id: i64) -> Built {
    Query::delete()
        .from_table(Buckets::Table)
        .and_where(Expr::col(Buckets::Id).eq(id))
        .build(SqliteQueryBuilder)
}

/// DELETE every bucket of the given lists.
pub fn delete_by_lists(list_ids: &[i64]) -> Built {
    Query::delete()
        .from_table(Buckets::Table)
        .and_where(Expr::col(Buckets::ListId).is_in(list_ids.iter().copied()))
        .build(SqliteQueryBuilder)
}

/// Buckets of a list in creation order.
pub fn by_list(list_id: i64) -> Built {
    let mut q = Query::select().to_owned();
    bucket_columns(&mut q);
    q.from(Buckets::Table)
        .and_where(Expr::col((Buckets::Table, Buckets::ListId)).eq(list_id))
        .order_by((Buckets::Table, Buckets::Id), Order::Asc)
        .build(SqliteQueryBuilder)
}

/// Number of buckets in a list.
pub fn count_by_list(list_id: i64) -> Built {
    Query::select()
        .expr_as(Func::count(Expr::col(Asterisk)), Alias::new("count"))
        .from(Buckets::Table)
        .and_where(Expr::col(Buckets::ListId).eq(list_id))
        .build(SqliteQueryBuilder)
}

/// Id of the oldest bucket of a list, skipping `exclude_id`.
pub fn first_of_list(list_id: i64, exclude_id: i64) -> Built {
    Query::select()
        .column(Buckets::Id)
        .from(Buckets::Table)
        .and_where(Expr::col(Buckets::ListId).eq(list_id))
        .and_where(Expr::col(Buckets::Id).ne(exclude_id))
        .order_by(Buckets::Id, Order::Asc)
        .limit(1)
        .build(SqliteQueryBuilder)
}
