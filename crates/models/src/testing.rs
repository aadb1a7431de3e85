//! Seeded database and principals for tests.
//!
//! Compiled for this crate's own tests and, through the `testing` feature,
//! for the server's route tests.

use rusqlite::Connection;
use tasklane_api::Right;

use crate::{Auth, store};

/// Password of every fixture user.
pub const PASSWORD: &str = "12345678";
/// Pending email confirmation of the inactive `user5`.
pub const USER5_CONFIRM_TOKEN: &str = "tiepiQueed8ahc7zeeFe1eveiy4Ein8osooxegiephauph2Ael";
/// Pending password reset of `user7`.
pub const USER7_RESET_TOKEN: &str = "passwordresettesttoken";

const FIXTURES: &str = include_str!("fixtures.sql");

/// A migrated in-memory database loaded with the fixture rows.
pub fn fixtures() -> Connection {
    let conn = store::open_in_memory().expect("open in-memory database");
    conn.execute_batch(FIXTURES).expect("load fixtures");
    conn
}

fn user(id: i64) -> Auth {
    Auth::User {
        id,
        username: format!("user{id}"),
    }
}

pub fn user1() -> Auth {
    user(1)
}

pub fn user2() -> Auth {
    user(2)
}

pub fn user3() -> Auth {
    user(3)
}

pub fn user4() -> Auth {
    user(4)
}

/// One of the three fixture link shares, all created by `user1`.
pub fn link_share(id: i64) -> Auth {
    let (hash, list_id, right) = match id {
        1 => ("test", 1, Right::Read),
        2 => ("test2", 2, Right::Write),
        3 => ("test3", 2, Right::Admin),
        other => panic!("no fixture link share {other}"),
    };
    Auth::LinkShare {
        id,
        hash: hash.into(),
        list_id,
        right,
        shared_by: 1,
    }
}
