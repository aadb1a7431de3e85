//! Entity totals backing the usage metrics.

use rusqlite::Connection;

use crate::{Result, lists, namespaces, tasks, teams, users};

pub const LIST_COUNT_KEY: &str = "listcount";
pub const USER_COUNT_KEY: &str = "usercount";
pub const NAMESPACE_COUNT_KEY: &str = "namespacecount";
pub const TASK_COUNT_KEY: &str = "taskcount";
pub const TEAM_COUNT_KEY: &str = "teamcount";

/// Row counts of the counted tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Totals {
    pub lists: i64,
    pub users: i64,
    pub namespaces: i64,
    pub tasks: i64,
    pub teams: i64,
}

impl Totals {
    /// Each total paired with its counter key.
    pub fn entries(&self) -> [(&'static str, i64); 5] {
        [
            (LIST_COUNT_KEY, self.lists),
            (USER_COUNT_KEY, self.users),
            (NAMESPACE_COUNT_KEY, self.namespaces),
            (TASK_COUNT_KEY, self.tasks),
            (TEAM_COUNT_KEY, self.teams),
        ]
    }
}

pub fn totals(conn: &Connection) -> Result<Totals> {
    Ok(Totals {
        lists: lists::count(conn)?,
        users: users::count(conn)?,
        namespaces: namespaces::count(conn)?,
        tasks: tasks::count(conn)?,
        teams: teams::count(conn)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[test]
    fn totals_match_fixtures() {
        let conn = testing::fixtures();
        let totals = totals(&conn).unwrap();
        assert_eq!(
            totals,
            Totals {
                lists: 12,
                users: 7,
                namespaces: 8,
                tasks: 8,
                teams: 3,
            }
        );
        assert_eq!(totals.entries()[3], (TASK_COUNT_KEY, 8));
    }
}
