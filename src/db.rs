//! SQLite store for the vup roster and the bilibili cookie.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

use crate::models::{ConfigEntry, Vup};
use crate::Result;

/// Key of the single `config` row this module touches. The misspelling is
/// load-bearing: existing databases were written with this exact key.
const BILIBILI_COOKIE_KEY: &str = "bilbili_cookie";

pub struct VupDb {
    conn: Mutex<Connection>,
}

impl VupDb {
    /// Open (creating if absent) the roster database at `path`.
    /// `":memory:"` opens an in-memory database for tests.
    pub fn open(path: &str) -> Result<Self> {
        let conn = if path == ":memory:" {
            Connection::open_in_memory()?
        } else {
            if let Some(parent) = Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            if !Path::new(path).exists() {
                std::fs::File::create(path)?;
            }
            Connection::open(path)?
        };
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.create_tables()?;
        Ok(db)
    }

    fn create_tables(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "CREATE TABLE IF NOT EXISTS vup (
                mid INTEGER PRIMARY KEY,
                uname TEXT,
                roomid INTEGER
            )",
            [],
        )?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS config (
                key TEXT PRIMARY KEY,
                value TEXT
            )",
            [],
        )?;
        Ok(())
    }

    /// Insert a roster row unless `mid` already exists. Existing rows are
    /// left untouched, so the first endpoint to report a mid wins.
    pub fn insert_vup_by_mid(&self, mid: i64, uname: &str, roomid: i64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let existing: Option<i64> = conn
            .query_row("SELECT mid FROM vup WHERE mid = ?1", [mid], |row| {
                row.get(0)
            })
            .optional()?;
        if existing.is_none() {
            conn.execute(
                "INSERT INTO vup (mid, uname, roomid) VALUES (?1, ?2, ?3)",
                params![mid, uname, roomid],
            )?;
        }
        Ok(())
    }

    /// All roster rows whose mid is in `mids`, in storage order.
    pub fn filter_vups(&self, mids: &[i64]) -> Result<Vec<Vup>> {
        if mids.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.conn.lock().unwrap();
        let placeholders = vec!["?"; mids.len()].join(", ");
        let sql = format!(
            "SELECT mid, uname, roomid FROM vup WHERE mid IN ({})",
            placeholders
        );
        let mut stmt = conn.prepare(&sql)?;
        let vups = stmt
            .query_map(params_from_iter(mids.iter()), |row| {
                Ok(Vup {
                    mid: row.get(0)?,
                    uname: row.get(1)?,
                    roomid: row.get(2)?,
                })
            })?
            .filter_map(|r| r.ok())
            .collect();
        Ok(vups)
    }

    /// Total number of roster rows.
    pub fn count_vups(&self) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        let count = conn.query_row("SELECT COUNT(*) FROM vup", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Store the bilibili cookie, overwriting any previous value.
    pub fn set_cookie(&self, cookie: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let rows = conn.execute(
            "UPDATE config SET value = ?1 WHERE key = ?2",
            params![cookie, BILIBILI_COOKIE_KEY],
        )?;
        if rows == 0 {
            conn.execute(
                "INSERT INTO config (key, value) VALUES (?1, ?2)",
                params![BILIBILI_COOKIE_KEY, cookie],
            )?;
        }
        Ok(())
    }

    /// The stored cookie row. An unset cookie and a failed lookup both come
    /// back as the zero-value entry; callers cannot tell them apart.
    pub fn get_cookie(&self) -> ConfigEntry {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT key, value FROM config WHERE key = ?1",
            [BILIBILI_COOKIE_KEY],
            |row| {
                Ok(ConfigEntry {
                    key: row.get(0)?,
                    value: row.get(1)?,
                })
            },
        )
        .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_open_creates_file_and_reopen_is_idempotent() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("vup.db");
        let path = db_path.to_str().unwrap();

        let db = VupDb::open(path).expect("Failed to open database");
        assert!(db_path.exists());
        db.insert_vup_by_mid(1, "alice", 10).expect("insert");
        drop(db);

        // Reopening must not recreate tables or drop data
        let db = VupDb::open(path).expect("Failed to reopen database");
        assert_eq!(db.count_vups().expect("count"), 1);
        let rows = db.filter_vups(&[1]).expect("filter");
        assert_eq!(rows[0].uname, "alice");
    }

    #[test]
    fn test_insert_is_first_writer_wins() {
        let db = VupDb::open(":memory:").expect("open");
        db.insert_vup_by_mid(42, "Alice", 100).expect("insert");
        db.insert_vup_by_mid(42, "Bob", 200).expect("second insert");

        let rows = db.filter_vups(&[42]).expect("filter");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].uname, "Alice");
        assert_eq!(rows[0].roomid, 100);
    }

    #[test]
    fn test_filter_returns_only_known_mids() {
        let db = VupDb::open(":memory:").expect("open");
        db.insert_vup_by_mid(42, "Alice", 100).expect("insert");

        let rows = db.filter_vups(&[42, 99]).expect("filter");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].mid, 42);
    }

    #[test]
    fn test_filter_empty_input() {
        let db = VupDb::open(":memory:").expect("open");
        let rows = db.filter_vups(&[]).expect("filter");
        assert!(rows.is_empty());
    }

    #[test]
    fn test_cookie_set_and_overwrite() {
        let db = VupDb::open(":memory:").expect("open");
        db.set_cookie("abc").expect("set");
        assert_eq!(db.get_cookie().value, "abc");

        db.set_cookie("xyz").expect("overwrite");
        let entry = db.get_cookie();
        assert_eq!(entry.key, BILIBILI_COOKIE_KEY);
        assert_eq!(entry.value, "xyz");
    }

    #[test]
    fn test_cookie_unset_is_zero_value() {
        let db = VupDb::open(":memory:").expect("open");
        let entry = db.get_cookie();
        assert_eq!(entry, ConfigEntry::default());
    }

    #[test]
    fn test_count_vups() {
        let db = VupDb::open(":memory:").expect("open");
        assert_eq!(db.count_vups().expect("count"), 0);
        db.insert_vup_by_mid(1, "a", 1).expect("insert");
        db.insert_vup_by_mid(2, "b", 2).expect("insert");
        db.insert_vup_by_mid(1, "dup", 3).expect("insert");
        assert_eq!(db.count_vups().expect("count"), 2);
    }
}
