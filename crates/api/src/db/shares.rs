//! Query builders for the four share tables.
//!
//! `team_namespaces`, `team_lists`, `users_namespaces` and `users_lists` all
//! have the same shape: a subject (team or user), an object (namespace or
//! list) and a right. One set of builders serves all of them.

use sea_query::{Alias, Asterisk, Expr, Func, Order, Query, SqliteQueryBuilder};

use super::Built;
use super::tables::{Teams, Users};
use super::teams::team_columns;
use super::users::user_columns;

/// Which share table a builder targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareKind {
    TeamNamespace,
    TeamList,
    UserNamespace,
    UserList,
}

impl ShareKind {
    fn table(self) -> Alias {
        Alias::new(match self {
            Self::TeamNamespace => "team_namespaces",
            Self::TeamList => "team_lists",
            Self::UserNamespace => "users_namespaces",
            Self::UserList => "users_lists",
        })
    }

    fn subject(self) -> Alias {
        Alias::new(if self.is_team() { "team_id" } else { "user_id" })
    }

    fn object(self) -> Alias {
        Alias::new(match self {
            Self::TeamNamespace | Self::UserNamespace => "namespace_id",
            Self::TeamList | Self::UserList => "list_id",
        })
    }

    pub fn is_team(self) -> bool {
        matches!(self, Self::TeamNamespace | Self::TeamList)
    }
}

fn right_col() -> Alias {
    Alias::new("right")
}

/// INSERT a share.
pub fn insert(kind: ShareKind, subject_id: i64, object_id: i64, right: i64) -> Built {
    Query::insert()
        .into_table(kind.table())
        .columns([kind.subject(), kind.object(), right_col()])
        .values_panic([subject_id.into(), object_id.into(), right.into()])
        .build(SqliteQueryBuilder)
}

/// A share row: id, right, created, updated.
pub fn get(kind: ShareKind, subject_id: i64, object_id: i64) -> Built {
    Query::select()
        .column(Alias::new("id"))
        .column(right_col())
        .column(Alias::new("created"))
        .column(Alias::new("updated"))
        .from(kind.table())
        .and_where(Expr::col(kind.subject()).eq(subject_id))
        .and_where(Expr::col(kind.object()).eq(object_id))
        .build(SqliteQueryBuilder)
}

/// Number of shares between a subject and an object (0 or 1).
pub fn exists(kind: ShareKind, subject_id: i64, object_id: i64) -> Built {
    Query::select()
        .expr_as(Func::count(Expr::col(Asterisk)), Alias::new("count"))
        .from(kind.table())
        .and_where(Expr::col(kind.subject()).eq(subject_id))
        .and_where(Expr::col(kind.object()).eq(object_id))
        .build(SqliteQueryBuilder)
}

/// Change the right of an existing share.
pub fn update_right(kind: ShareKind, subject_id: i64, object_id: i64, right: i64) -> Built {
    Query::update()
        .table(kind.table())
        .value(right_col(), right)
        .value(Alias::new("updated"), Expr::cust("datetime('now')"))
        .and_where(Expr::col(kind.subject()).eq(subject_id))
        .and_where(Expr::col(kind.object()).eq(object_id))
        .build(SqliteQueryBuilder)
}

/// DELETE a share.
pub fn delete(kind: ShareKind, subject_id: i64, object_id: i64) -> Built {
    Query::delete()
        .from_table(kind.table())
        .and_where(Expr::col(kind.subject()).eq(subject_id))
        .and_where(Expr::col(kind.object()).eq(object_id))
        .build(SqliteQueryBuilder)
}

/// Teams holding a share on an object: team columns followed by the right.
pub fn teams_with_right(kind: ShareKind, object_id: i64, search: &str) -> Built {
    let table = kind.table();
    let mut q = Query::select().to_owned();
    team_columns(&mut q);
    q.column((table.clone(), right_col()))
        .from(table.clone())
        .inner_join(
            Teams::Table,
            Expr::col((Teams::Table, Teams::Id)).equals((table.clone(), kind.subject())),
        )
        .and_where(Expr::col((table.clone(), kind.object())).eq(object_id))
        .and_where(Expr::col((Teams::Table, Teams::Name)).like(format!("%{search}%")))
        .order_by((table, Alias::new("id")), Order::Asc)
        .build(SqliteQueryBuilder)
}

/// Users holding a share on an object: user columns followed by the right.
pub fn users_with_right(kind: ShareKind, object_id: i64, search: &str) -> Built {
    let table = kind.table();
    let mut q = Query::select().to_owned();
    user_columns(&mut q);
    q.column((table.clone(), right_col()))
        .from(table.clone())
        .inner_join(
            Users::Table,
            Expr::col((Users::Table, Users::Id)).equals((table.clone(), kind.subject())),
        )
        .and_where(Expr::col((table.clone(), kind.object())).eq(object_id))
        .and_where(Expr::col((Users::Table, Users::Username)).like(format!("%{search}%")))
        .order_by((table, Alias::new("id")), Order::Asc)
        .build(SqliteQueryBuilder)
}
