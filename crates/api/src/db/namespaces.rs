//! Namespace query builders, including the visibility joins behind the
//! namespace overview.

use sea_query::{Alias, Asterisk, Expr, Func, Order, Query, SelectStatement, SqliteQueryBuilder};

use super::tables::{Lists, Namespaces, TeamMembers, TeamNamespaces, Tasks, UsersNamespaces};
use super::{Built, BuiltListQuery};

// ── Column helpers ────────────────────────────────────────────────────────

/// id, title, description, owner_id, hex_color, is_archived, created, updated.
pub fn namespace_columns(q: &mut SelectStatement) -> &mut SelectStatement {
    q.column((Namespaces::Table, Namespaces::Id))
        .column((Namespaces::Table, Namespaces::Title))
        .column((Namespaces::Table, Namespaces::Description))
        .column((Namespaces::Table, Namespaces::OwnerId))
        .column((Namespaces::Table, Namespaces::HexColor))
        .column((Namespaces::Table, Namespaces::IsArchived))
        .column((Namespaces::Table, Namespaces::Created))
        .column((Namespaces::Table, Namespaces::Updated))
}

// ── CRUD ──────────────────────────────────────────────────────────────────

/// INSERT a namespace.
pub fn insert(title: &str, description: &str, owner_id: i64, hex_color: &str, is_archived: bool) -> Built {
    Query::insert()
        .into_table(Namespaces::Table)
        .columns([
            Namespaces::Title,
            Namespaces::Description,
            Namespaces::OwnerId,
            Namespaces::HexColor,
            Namespaces::IsArchived,
        ])
        .values_panic([
            title.into(),
            description.into(),
            owner_id.into(),
            hex_color.into(),
            is_archived.into(),
        ])
        .build(SqliteQueryBuilder)
}

/// SELECT a namespace by id.
pub fn get_by_id(id: i64) -> Built {
    let mut q = Query::select().to_owned();
    namespace_columns(&mut q);
    q.from(Namespaces::Table)
        .and_where(Expr::col((Namespaces::Table, Namespaces::Id)).eq(id))
        .build(SqliteQueryBuilder)
}

/// UPDATE title, archive flag, color and owner. The description is only
/// written when one is given.
pub fn update(
    id: i64,
    title: &str,
    is_archived: bool,
    hex_color: &str,
    owner_id: i64,
    description: Option<&str>,
) -> Built {
    let mut q = Query::update();
    q.table(Namespaces::Table)
        .value(Namespaces::Title, title)
        .value(Namespaces::IsArchived, is_archived)
        .value(Namespaces::HexColor, hex_color)
        .value(Namespaces::OwnerId, owner_id)
        .value(Namespaces::Updated, Expr::cust("datetime('now')"));
    if let Some(description) = description {
        q.value(Namespaces::Description, description);
    }
    q.and_where(Expr::col(Namespaces::Id).eq(id))
        .build(SqliteQueryBuilder)
}

/// DELETE a namespace row.
pub fn delete(id: i64) -> Built {
    Query::delete()
        .from_table(Namespaces::Table)
        .and_where(Expr::col(Namespaces::Id).eq(id))
        .build(SqliteQueryBuilder)
}

/// Total number of namespaces.
pub fn count() -> Built {
    Query::select()
        .expr_as(Func::count(Expr::col(Asterisk)), Alias::new("count"))
        .from(Namespaces::Table)
        .build(SqliteQueryBuilder)
}

// ── Visibility ────────────────────────────────────────────────────────────

/// Joins and ownership/share condition shared by the overview and its count.
fn visible_base(q: &mut SelectStatement, user_id: i64, search: &str) {
    q.from(Namespaces::Table)
        .left_join(
            TeamNamespaces::Table,
            Expr::col((TeamNamespaces::Table, TeamNamespaces::NamespaceId))
                .equals((Namespaces::Table, Namespaces::Id)),
        )
        .left_join(
            TeamMembers::Table,
            Expr::col((TeamMembers::Table, TeamMembers::TeamId))
                .equals((TeamNamespaces::Table, TeamNamespaces::TeamId)),
        )
        .left_join(
            UsersNamespaces::Table,
            Expr::col((UsersNamespaces::Table, UsersNamespaces::NamespaceId))
                .equals((Namespaces::Table, Namespaces::Id)),
        )
        .and_where(
            Expr::col((TeamMembers::Table, TeamMembers::UserId))
                .eq(user_id)
                .or(Expr::col((Namespaces::Table, Namespaces::OwnerId)).eq(user_id))
                .or(Expr::col((UsersNamespaces::Table, UsersNamespaces::UserId)).eq(user_id)),
        )
        .and_where(Expr::col((Namespaces::Table, Namespaces::Title)).like(format!("%{search}%")));
}

/// Namespaces owned by, shared with, or team-shared with a user.
///
/// The page honors `include_archived`; the count always covers non-archived
/// namespaces only.
pub fn visible_for_user(
    user_id: i64,
    search: &str,
    include_archived: bool,
    limit: Option<u64>,
    offset: u64,
) -> BuiltListQuery {
    let mut select_q = Query::select().to_owned();
    namespace_columns(&mut select_q);
    visible_base(&mut select_q, user_id, search);
    if !include_archived {
        select_q.and_where(Expr::col((Namespaces::Table, Namespaces::IsArchived)).eq(false));
    }
    select_q
        .group_by_col((Namespaces::Table, Namespaces::Id))
        .order_by((Namespaces::Table, Namespaces::Id), Order::Asc);
    if let Some(limit) = limit {
        select_q.limit(limit).offset(offset);
    }

    let mut count_q = Query::select()
        .expr_as(
            Expr::cust(r#"COUNT(DISTINCT "namespaces"."id")"#),
            Alias::new("count"),
        )
        .to_owned();
    visible_base(&mut count_q, user_id, search);
    count_q.and_where(Expr::col((Namespaces::Table, Namespaces::IsArchived)).eq(false));

    BuiltListQuery {
        count_query: count_q.build(SqliteQueryBuilder),
        select_query: select_q.build(SqliteQueryBuilder),
    }
}

/// Highest right a user holds on a namespace through a direct share.
pub fn user_share_right(namespace_id: i64, user_id: i64) -> Built {
    Query::select()
        .expr(Func::max(Expr::col(UsersNamespaces::Right)))
        .from(UsersNamespaces::Table)
        .and_where(Expr::col(UsersNamespaces::NamespaceId).eq(namespace_id))
        .and_where(Expr::col(UsersNamespaces::UserId).eq(user_id))
        .build(SqliteQueryBuilder)
}

/// Highest right a user holds on a namespace through any of their teams.
pub fn team_share_right(namespace_id: i64, user_id: i64) -> Built {
    Query::select()
        .expr(Func::max(Expr::col((TeamNamespaces::Table, TeamNamespaces::Right))))
        .from(TeamNamespaces::Table)
        .inner_join(
            TeamMembers::Table,
            Expr::col((TeamMembers::Table, TeamMembers::TeamId))
                .equals((TeamNamespaces::Table, TeamNamespaces::TeamId)),
        )
        .and_where(Expr::col((TeamNamespaces::Table, TeamNamespaces::NamespaceId)).eq(namespace_id))
        .and_where(Expr::col((TeamMembers::Table, TeamMembers::UserId)).eq(user_id))
        .build(SqliteQueryBuilder)
}

/// Number of favorited tasks in lists of the given namespaces.
pub fn favorite_task_count(namespace_ids: &[i64]) -> Built {
    Query::select()
        .expr_as(Func::count(Expr::col((Tasks::Table, Tasks::Id))), Alias::new("count"))
        .from(Tasks::Table)
        .inner_join(
            Lists::Table,
            Expr::col((Lists::Table, Lists::Id)).equals((Tasks::Table, Tasks::ListId)),
        )
        .and_where(Expr::col((Tasks::Table, Tasks::IsFavorite)).eq(true))
        .and_where(Expr::col((Lists::Table, Lists::NamespaceId)).is_in(namespace_ids.iter().copied()))
        .build(SqliteQueryBuilder)
}
