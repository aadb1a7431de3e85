//! List query builders.

use sea_query::{
    Alias, Asterisk, Expr, Func, JoinType, Order, Query, SelectStatement, SqliteQueryBuilder,
};

use super::tables::{
    Lists, Namespaces, TeamLists, TeamMembers, TeamNamespaces, UsersLists, UsersNamespaces,
};
use super::{Built, BuiltListQuery};

/// Column values written on insert and update.
pub struct ListValues<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub identifier: &'a str,
    pub hex_color: &'a str,
    pub namespace_id: i64,
    pub is_archived: bool,
    pub is_favorite: bool,
}

// ── Column helpers ────────────────────────────────────────────────────────

/// id, title, description, identifier, hex_color, owner_id, namespace_id,
/// is_archived, is_favorite, created, updated.
pub fn list_columns(q: &mut SelectStatement) -> &mut SelectStatement {
    q.column((Lists::Table, Lists::Id))
        .column((Lists::Table, Lists::Title))
        .column((Lists::Table, Lists::Description))
        .column((Lists::Table, Lists::Identifier))
        .column((Lists::Table, Lists::HexColor))
        .column((Lists::Table, Lists::OwnerId))
        .column((Lists::Table, Lists::NamespaceId))
        .column((Lists::Table, Lists::IsArchived))
        .column((Lists::Table, Lists::IsFavorite))
        .column((Lists::Table, Lists::Created))
        .column((Lists::Table, Lists::Updated))
}

// ── CRUD ──────────────────────────────────────────────────────────────────

/// INSERT a list.
pub fn insert(owner_id: i64, v: &ListValues<'_>) -> Built {
    Query::insert()
        .into_table(Lists::Table)
        .columns([
            Lists::Title,
            Lists::Description,
            Lists::Identifier,
            Lists::HexColor,
            Lists::OwnerId,
            Lists::NamespaceId,
            Lists::IsArchived,
            Lists::IsFavorite,
        ])
        .values_panic([
            v.title.into(),
            v.description.into(),
            v.identifier.into(),
            v.hex_color.into(),
            owner_id.into(),
            v.namespace_id.into(),
            v.is_archived.into(),
            v.is_favorite.into(),
        ])
        .build(SqliteQueryBuilder)
}

/// SELECT a list by id.
pub fn get_by_id(id: i64) -> Built {
    let mut q = Query::select().to_owned();
    list_columns(&mut q);
    q.from(Lists::Table)
        .and_where(Expr::col((Lists::Table, Lists::Id)).eq(id))
        .build(SqliteQueryBuilder)
}

/// UPDATE every editable column of a list.
pub fn update(id: i64, v: &ListValues<'_>) -> Built {
    Query::update()
        .table(Lists::Table)
        .value(Lists::Title, v.title)
        .value(Lists::Description, v.description)
        .value(Lists::Identifier, v.identifier)
        .value(Lists::HexColor, v.hex_color)
        .value(Lists::NamespaceId, v.namespace_id)
        .value(Lists::IsArchived, v.is_archived)
        .value(Lists::IsFavorite, v.is_favorite)
        .value(Lists::Updated, Expr::cust("datetime('now')"))
        .and_where(Expr::col(Lists::Id).eq(id))
        .build(SqliteQueryBuilder)
}

/// DELETE a list row.
pub fn delete(id: i64) -> Built {
    Query::delete()
        .from_table(Lists::Table)
        .and_where(Expr::col(Lists::Id).eq(id))
        .build(SqliteQueryBuilder)
}

/// Total number of lists.
pub fn count() -> Built {
    Query::select()
        .expr_as(Func::count(Expr::col(Asterisk)), Alias::new("count"))
        .from(Lists::Table)
        .build(SqliteQueryBuilder)
}

/// Lists of the given namespaces, archived ones only when asked for.
pub fn by_namespaces(namespace_ids: &[i64], include_archived: bool) -> Built {
    let mut q = Query::select().to_owned();
    list_columns(&mut q);
    q.from(Lists::Table)
        .and_where(Expr::col((Lists::Table, Lists::NamespaceId)).is_in(namespace_ids.iter().copied()));
    if !include_archived {
        q.and_where(Expr::col((Lists::Table, Lists::IsArchived)).eq(false));
    }
    q.order_by((Lists::Table, Lists::Id), Order::Asc)
        .build(SqliteQueryBuilder)
}

/// Number of other lists already using `identifier`.
pub fn identifier_count(identifier: &str, exclude_id: i64) -> Built {
    Query::select()
        .expr_as(Func::count(Expr::col(Asterisk)), Alias::new("count"))
        .from(Lists::Table)
        .and_where(Expr::col(Lists::Identifier).eq(identifier))
        .and_where(Expr::col(Lists::Id).ne(exclude_id))
        .build(SqliteQueryBuilder)
}

// ── Visibility ────────────────────────────────────────────────────────────

/// Lists shared with a user directly or through a team, ignoring namespaces.
pub fn individually_shared(user_id: i64, include_archived: bool) -> Built {
    let mut q = Query::select().to_owned();
    list_columns(&mut q);
    q.from(Lists::Table)
        .left_join(
            TeamLists::Table,
            Expr::col((TeamLists::Table, TeamLists::ListId)).equals((Lists::Table, Lists::Id)),
        )
        .left_join(
            TeamMembers::Table,
            Expr::col((TeamMembers::Table, TeamMembers::TeamId))
                .equals((TeamLists::Table, TeamLists::TeamId)),
        )
        .left_join(
            UsersLists::Table,
            Expr::col((UsersLists::Table, UsersLists::ListId)).equals((Lists::Table, Lists::Id)),
        )
        .and_where(
            Expr::col((TeamMembers::Table, TeamMembers::UserId))
                .eq(user_id)
                .or(Expr::col((UsersLists::Table, UsersLists::UserId)).eq(user_id)),
        );
    if !include_archived {
        q.and_where(Expr::col((Lists::Table, Lists::IsArchived)).eq(false));
    }
    q.group_by_col((Lists::Table, Lists::Id))
        .order_by((Lists::Table, Lists::Id), Order::Asc)
        .build(SqliteQueryBuilder)
}

fn visible_base(q: &mut SelectStatement, user_id: i64, search: &str, include_archived: bool) {
    let tm_list = Alias::new("tm_list");
    let tm_ns = Alias::new("tm_ns");
    q.from(Lists::Table)
        .left_join(
            Namespaces::Table,
            Expr::col((Namespaces::Table, Namespaces::Id)).equals((Lists::Table, Lists::NamespaceId)),
        )
        .left_join(
            TeamLists::Table,
            Expr::col((TeamLists::Table, TeamLists::ListId)).equals((Lists::Table, Lists::Id)),
        )
        .join_as(
            JoinType::LeftJoin,
            TeamMembers::Table,
            tm_list.clone(),
            Expr::col((tm_list.clone(), TeamMembers::TeamId))
                .equals((TeamLists::Table, TeamLists::TeamId)),
        )
        .left_join(
            TeamNamespaces::Table,
            Expr::col((TeamNamespaces::Table, TeamNamespaces::NamespaceId))
                .equals((Lists::Table, Lists::NamespaceId)),
        )
        .join_as(
            JoinType::LeftJoin,
            TeamMembers::Table,
            tm_ns.clone(),
            Expr::col((tm_ns.clone(), TeamMembers::TeamId))
                .equals((TeamNamespaces::Table, TeamNamespaces::TeamId)),
        )
        .left_join(
            UsersLists::Table,
            Expr::col((UsersLists::Table, UsersLists::ListId)).equals((Lists::Table, Lists::Id)),
        )
        .left_join(
            UsersNamespaces::Table,
            Expr::col((UsersNamespaces::Table, UsersNamespaces::NamespaceId))
                .equals((Lists::Table, Lists::NamespaceId)),
        )
        .and_where(
            Expr::col((tm_list, TeamMembers::UserId))
                .eq(user_id)
                .or(Expr::col((tm_ns, TeamMembers::UserId)).eq(user_id))
                .or(Expr::col((UsersLists::Table, UsersLists::UserId)).eq(user_id))
                .or(Expr::col((UsersNamespaces::Table, UsersNamespaces::UserId)).eq(user_id))
                .or(Expr::col((Lists::Table, Lists::OwnerId)).eq(user_id))
                .or(Expr::col((Namespaces::Table, Namespaces::OwnerId)).eq(user_id)),
        );
    if !search.is_empty() {
        q.and_where(Expr::col((Lists::Table, Lists::Title)).like(format!("%{search}%")));
    }
    if !include_archived {
        q.and_where(Expr::col((Lists::Table, Lists::IsArchived)).eq(false))
            .and_where(Expr::col((Namespaces::Table, Namespaces::IsArchived)).eq(false));
    }
}

/// Every list a user reaches through ownership or any kind of share.
pub fn visible_for_user(
    user_id: i64,
    search: &str,
    include_archived: bool,
    limit: Option<u64>,
    offset: u64,
) -> BuiltListQuery {
    let mut select_q = Query::select().to_owned();
    list_columns(&mut select_q);
    visible_base(&mut select_q, user_id, search, include_archived);
    select_q
        .group_by_col((Lists::Table, Lists::Id))
        .order_by((Lists::Table, Lists::Id), Order::Asc);
    if let Some(limit) = limit {
        select_q.limit(limit).offset(offset);
    }

    let mut count_q = Query::select()
        .expr_as(Expr::cust(r#"COUNT(DISTINCT "lists"."id")"#), Alias::new("count"))
        .to_owned();
    visible_base(&mut count_q, user_id, search, include_archived);

    BuiltListQuery {
        count_query: count_q.build(SqliteQueryBuilder),
        select_query: select_q.build(SqliteQueryBuilder),
    }
}

/// Highest right a user holds on a list through a direct share.
pub fn user_share_right(list_id: i64, user_id: i64) -> Built {
    Query::select()
        .expr(Func::max(Expr::col(UsersLists::Right)))
        .from(UsersLists::Table)
        .and_where(Expr::col(UsersLists::ListId).eq(list_id))
        .and_where(Expr::col(UsersLists::UserId).eq(user_id))
        .build(SqliteQueryBuilder)
}

/// Highest right a user holds on a list through any of their teams.
pub fn team_share_right(list_id: i64, user_id: i64) -> Built {
    Query::select()
        .expr(Func::max(Expr::col((TeamLists::Table, TeamLists::Right))))
        .from(TeamLists::Table)
        .inner_join(
            TeamMembers::Table,
            Expr::col((TeamMembers::Table, TeamMembers::TeamId))
                .equals((TeamLists::Table, TeamLists::TeamId)),
        )
        .and_where(Expr::col((TeamLists::Table, TeamLists::ListId)).eq(list_id))
        .and_where(Expr::col((TeamMembers::Table, TeamMembers::UserId)).eq(user_id))
        .build(SqliteQueryBuilder)
}
