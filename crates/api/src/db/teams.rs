//! Team + member query builders.

use sea_query::{Alias, Asterisk, Expr, Func, Order, Query, SelectStatement, SqliteQueryBuilder};

use super::Built;
use super::tables::{TeamMembers, Teams, Users};
use super::users::user_columns;

// ── Team columns helper ───────────────────────────────────────────────────

/// id, name, description, created_by_id, created, updated.
pub fn team_columns(q: &mut SelectStatement) -> &mut SelectStatement {
    q.column((Teams::Table, Teams::Id))
        .column((Teams::Table, Teams::Name))
        .column((Teams::Table, Teams::Description))
        .column((Teams::Table, Teams::CreatedById))
        .column((Teams::Table, Teams::Created))
        .column((Teams::Table, Teams::Updated))
}

// ── Team queries ──────────────────────────────────────────────────────────

/// INSERT a new team.
pub fn insert(name: &str, description: &str, created_by_id: i64) -> Built {
    Query::insert()
        .into_table(Teams::Table)
        .columns([Teams::Name, Teams::Description, Teams::CreatedById])
        .values_panic([name.into(), description.into(), created_by_id.into()])
        .build(SqliteQueryBuilder)
}

/// SELECT a single team by id.
pub fn get_by_id(id: i64) -> Built {
    let mut q = Query::select().to_owned();
    team_columns(&mut q);
    q.from(Teams::Table)
        .and_where(Expr::col((Teams::Table, Teams::Id)).eq(id))
        .build(SqliteQueryBuilder)
}

/// Teams a user belongs to whose name contains `search`.
pub fn for_user(user_id: i64, search: &str) -> Built {
    let mut q = Query::select().to_owned();
    team_columns(&mut q);
    q.from(Teams::Table)
        .inner_join(
            TeamMembers::Table,
            Expr::col((TeamMembers::Table, TeamMembers::TeamId)).equals((Teams::Table, Teams::Id)),
        )
        .and_where(Expr::col((TeamMembers::Table, TeamMembers::UserId)).eq(user_id))
        .and_where(Expr::col((Teams::Table, Teams::Name)).like(format!("%{search}%")))
        .order_by((Teams::Table, Teams::Id), Order::Asc)
        .build(SqliteQueryBuilder)
}

/// Update name and description.
pub fn update(id: i64, name: &str, description: &str) -> Built {
    Query::update()
        .table(Teams::Table)
        .value(Teams::Name, name)
        .value(Teams::Description, description)
        .value(Teams::Updated, Expr::cust("datetime('now')"))
        .and_where(Expr::col(Teams::Id).eq(id))
        .build(SqliteQueryBuilder)
}

/// DELETE a team; members and shares cascade.
pub fn delete(id: i64) -> Built {
    Query::delete()
        .from_table(Teams::Table)
        .and_where(Expr::col(Teams::Id).eq(id))
        .build(SqliteQueryBuilder)
}

/// Total number of teams.
pub fn count() -> Built {
    Query::select()
        .expr_as(Func::count(Expr::col(Asterisk)), Alias::new("count"))
        .from(Teams::Table)
        .build(SqliteQueryBuilder)
}

// ── Member queries ────────────────────────────────────────────────────────

/// INSERT a team member.
pub fn member_insert(team_id: i64, user_id: i64, admin: bool) -> Built {
    Query::insert()
        .into_table(TeamMembers::Table)
        .columns([TeamMembers::TeamId, TeamMembers::UserId, TeamMembers::Admin])
        .values_panic([team_id.into(), user_id.into(), admin.into()])
        .build(SqliteQueryBuilder)
}

/// DELETE a team member.
pub fn member_delete(team_id: i64, user_id: i64) -> Built {
    Query::delete()
        .from_table(TeamMembers::Table)
        .and_where(Expr::col(TeamMembers::TeamId).eq(team_id))
        .and_where(Expr::col(TeamMembers::UserId).eq(user_id))
        .build(SqliteQueryBuilder)
}

/// Members of the given teams: team_id, user columns, admin.
pub fn member_list(team_ids: &[i64]) -> Built {
    let mut q = Query::select()
        .column((TeamMembers::Table, TeamMembers::TeamId))
        .to_owned();
    user_columns(&mut q);
    q.column((TeamMembers::Table, TeamMembers::Admin))
        .from(TeamMembers::Table)
        .inner_join(
            Users::Table,
            Expr::col((Users::Table, Users::Id)).equals((TeamMembers::Table, TeamMembers::UserId)),
        )
        .and_where(Expr::col((TeamMembers::Table, TeamMembers::TeamId)).is_in(team_ids.iter().copied()))
        .order_by((TeamMembers::Table, TeamMembers::Id), Order::Asc)
        .build(SqliteQueryBuilder)
}

/// A membership row: id, created, admin. Empty when the user is not a member.
pub fn member_get(team_id: i64, user_id: i64) -> Built {
    Query::select()
        .column(TeamMembers::Id)
        .column(TeamMembers::Created)
        .column(TeamMembers::Admin)
        .from(TeamMembers::Table)
        .and_where(Expr::col(TeamMembers::TeamId).eq(team_id))
        .and_where(Expr::col(TeamMembers::UserId).eq(user_id))
        .build(SqliteQueryBuilder)
}

/// Set the admin flag of a membership.
pub fn member_set_admin(team_id: i64, user_id: i64, admin: bool) -> Built {
    Query::update()
        .table(TeamMembers::Table)
        .value(TeamMembers::Admin, admin)
        .and_where(Expr::col(TeamMembers::TeamId).eq(team_id))
        .and_where(Expr::col(TeamMembers::UserId).eq(user_id))
        .build(SqliteQueryBuilder)
}

/// Count members in a team.
pub fn member_count(team_id: i64) -> Built {
    Query::select()
        .expr_as(Func::count(Expr::col(Asterisk)), Alias::new("count"))
        .from(TeamMembers::Table)
        .and_where(Expr::col(TeamMembers::TeamId).eq(team_id))
        .build(SqliteQueryBuilder)
}
