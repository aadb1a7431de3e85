use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use rusqlite::Connection;

/// Shared database state
#[derive(Clone)]
pub struct Db {
    conn: Arc<Mutex<Connection>>,
}

impl Db {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    pub fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }
}

/// Open the database file and apply pending migrations.
pub fn init_db(path: &Path) -> Result<Db> {
    let conn = tasklane_models::store::open(path)
        .with_context(|| format!("opening SQLite database at {}", path.display()))?;
    Ok(Db::new(conn))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("tasklane.db");
        let db = init_db(&path).unwrap();
        assert!(path.exists());
        let users: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
            .unwrap();
        assert_eq!(users, 0);
    }
}
