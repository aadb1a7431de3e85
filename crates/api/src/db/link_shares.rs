//! Link share query builders.

use sea_query::{Expr, Order, Query, SelectStatement, SqliteQueryBuilder};

use super::Built;
use super::tables::LinkShares;

/// id, hash, list_id, right, sharing_type, shared_by_id, created, updated.
pub fn link_share_columns(q: &mut SelectStatement) -> &mut SelectStatement {
    q.column((LinkShares::Table, LinkShares::Id))
        .column((LinkShares::Table, LinkShares::Hash))
        .column((LinkShares::Table, LinkShares::ListId))
        .column((LinkShares::Table, LinkShares::Right))
        .column((LinkShares::Table, LinkShares::SharingType))
        .column((LinkShares::Table, LinkShares::SharedById))
        .column((LinkShares::Table, LinkShares::Created))
        .column((LinkShares::Table, LinkShares::Updated))
}

/// INSERT a link share.
pub fn insert(hash: &str, list_id: i64, right: i64, sharing_type: i64, shared_by_id: i64) -> Built {
    Query::insert()
        .into_table(LinkShares::Table)
        .columns([
            LinkShares::Hash,
            LinkShares::ListId,
            LinkShares::Right,
            LinkShares::SharingType,
            LinkShares::SharedById,
        ])
        .values_panic([
            hash.into(),
            list_id.into(),
            right.into(),
            sharing_type.into(),
            shared_by_id.into(),
        ])
        .build(SqliteQueryBuilder)
}

/// SELECT a link share by id.
pub fn get_by_id(id: i64) -> Built {
    let mut q = Query::select().to_owned();
    link_share_columns(&mut q);
    q.from(LinkShares::Table)
        .and_where(Expr::col((LinkShares::Table, LinkShares::Id)).eq(id))
        .build(SqliteQueryBuilder)
}

/// SELECT a link share by its public hash.
pub fn get_by_hash(hash: &str) -> Built {
    let mut q = Query::select().to_owned();
    link_share_columns(&mut q);
    q.from(LinkShares::Table)
        .and_where(Expr::col((LinkShares::Table, LinkShares::Hash)).eq(hash))
        .build(SqliteQueryBuilder)
}

/// Link shares of a list, oldest first.
pub fn by_list(list_id: i64) -> Built {
    let mut q = Query::select().to_owned();
    link_share_columns(&mut q);
    q.from(LinkShares::Table)
        .and_where(Expr::col((LinkShares::Table, LinkShares::ListId)).eq(list_id))
        .order_by((LinkShares::Table, LinkShares::Id), Order::Asc)
        .build(SqliteQueryBuilder)
}

/// DELETE a link share of a list.
pub fn delete(id: i64, list_id: i64) -> Built {
    Query::delete()
        .from_table(LinkShares::Table)
        .and_where(Expr::col(LinkShares::Id).eq(id))
        .and_where(Expr::col(LinkShares::ListId).eq(list_id))
        .build(SqliteQueryBuilder)
}
