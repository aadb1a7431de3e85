//! Saved filter query builders.

use sea_query::{Expr, Order, Query, SelectStatement, SqliteQueryBuilder};

use super::Built;
use super::tables::SavedFilters;

/// id, title, description, filters, owner_id, is_favorite, created, updated.
pub fn saved_filter_columns(q: &mut SelectStatement) -> &mut SelectStatement {
    q.column((SavedFilters::Table, SavedFilters::Id))
        .column((SavedFilters::Table, SavedFilters::Title))
        .column((SavedFilters::Table, SavedFilters::Description))
        .column((SavedFilters::Table, SavedFilters::Filters))
        .column((SavedFilters::Table, SavedFilters::OwnerId))
        .column((SavedFilters::Table, SavedFilters::IsFavorite))
        .column((SavedFilters::Table, SavedFilters::Created))
        .column((SavedFilters::Table, SavedFilters::Updated))
}

/// INSERT a saved filter; `filters` is the JSON-encoded criteria.
pub fn insert(title: &str, description: &str, filters: &str, owner_id: i64, is_favorite: bool) -> Built {
    Query::insert()
        .into_table(SavedFilters::Table)
        .columns([
            SavedFilters::Title,
            SavedFilters::Description,
            SavedFilters::Filters,
            SavedFilters::OwnerId,
            SavedFilters::IsFavorite,
        ])
        .values_panic([
            title.into(),
            description.into(),
            filters.into(),
            owner_id.into(),
            is_favorite.into(),
        ])
        .build(SqliteQueryBuilder)
}

/// SELECT a saved filter by id.
pub fn get_by_id(id: i64) -> Built {
    let mut q = Query::select().to_owned();
    saved_filter_columns(&mut q);
    q.from(SavedFilters::Table)
        .and_where(Expr::col((SavedFilters::Table, SavedFilters::Id)).eq(id))
        .build(SqliteQueryBuilder)
}

/// UPDATE title, description, criteria and favorite flag.
pub fn update(id: i64, title: &str, description: &str, filters: &str, is_favorite: bool) -> Built {
    Query::update()
        .table(SavedFilters::Table)
        .value(SavedFilters::Title, title)
        .value(SavedFilters::Description, description)
        .value(SavedFilters::Filters, filters)
        .value(SavedFilters::IsFavorite, is_favorite)
        .value(SavedFilters::Updated, Expr::cust("datetime('now')"))
        .and_where(Expr::col(SavedFilters::Id).eq(id))
        .build(SqliteQueryBuilder)
}

/// DELETE a saved filter.
pub fn delete(id: i64) -> Built {
    Query::delete()
        .from_table(SavedFilters::Table)
        .and_where(Expr::col(SavedFilters::Id).eq(id))
        .build(SqliteQueryBuilder)
}

/// Filters owned by a user whose title contains `search`.
pub fn by_owner(owner_id: i64, search: &str) -> Built {
    let mut q = Query::select().to_owned();
    saved_filter_columns(&mut q);
    q.from(SavedFilters::Table)
        .and_where(Expr::col((SavedFilters::Table, SavedFilters::OwnerId)).eq(owner_id))
        .and_where(Expr::col((SavedFilters::Table, SavedFilters::Title)).like(format!("%{search}%")))
        .order_by((SavedFilters::Table, SavedFilters::Id), Order::Asc)
        .build(SqliteQueryBuilder)
}
