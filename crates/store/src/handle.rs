use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::Connection;

use crate::error::StoreError;
use crate::schema;

/// An open store. Reads borrow it shared; writes take `&mut self`, so one
/// handle never has two writes in flight.
pub struct Store {
    conn: Connection,
    path: PathBuf,
}

impl Store {
    /// Open an existing store. A missing file is an error, never an empty store.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if !path.is_file() {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                message: "store not found (run the pipeline first)".into(),
            });
        }
        let conn = Connection::open(path)?;
        schema::enable_foreign_keys(&conn)?;
        // Other processes may hold the write lock briefly.
        conn.busy_timeout(Duration::from_secs(5))?;
        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn close(self) -> Result<(), StoreError> {
        self.conn.close().map_err(|(_, e)| StoreError::Sqlite(e))
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    pub(crate) fn conn_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    /// Rows that break a declared foreign key. Empty for any store this crate built.
    pub fn foreign_key_violations(&self) -> Result<Vec<(String, i64)>, StoreError> {
        foreign_key_violations(&self.conn)
    }
}

pub(crate) fn foreign_key_violations(conn: &Connection) -> Result<Vec<(String, i64)>, StoreError> {
    let mut stmt = conn.prepare("PRAGMA foreign_key_check")?;
    let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?;
    Ok(rows.collect::<Result<_, _>>()?)
}
