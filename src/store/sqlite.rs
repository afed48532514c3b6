//! Read-only access to the SQLite evidence stores.

use std::path::{Path, PathBuf};

use rusqlite::types::ValueRef;
use rusqlite::{params_from_iter, Connection, OpenFlags};
use tracing::debug;

use crate::error::{EvidenceError, Result};
use crate::model::table::{Cell, Row};
use crate::query::CompiledQuery;

/// A SQLite store opened strictly read-only.
///
/// The database is opened through an `immutable=1` URI, so SQLite neither
/// writes journal/WAL files next to the evidence nor takes locks on it.
pub struct EvidenceStore {
    path: PathBuf,
    conn: Connection,
}

impl EvidenceStore {
    /// Open the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.is_file() {
            return Err(EvidenceError::io(
                &path,
                std::io::Error::new(std::io::ErrorKind::NotFound, "database file not found"),
            ));
        }
        let conn = Connection::open_with_flags(
            immutable_uri(&path),
            OpenFlags::SQLITE_OPEN_READ_ONLY
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        debug!(path = %path.display(), "Opened evidence store");
        Ok(Self { path, conn })
    }

    /// Run a compiled query and collect every row.
    pub fn query(&self, query: &CompiledQuery) -> Result<Vec<Row>> {
        debug!(
            store = %self.path.display(),
            params = query.params.len(),
            sql = %query.sql,
            "Running query"
        );
        let mut stmt = self.conn.prepare(&query.sql)?;
        let columns = stmt.column_count();
        let rows = stmt.query_map(params_from_iter(query.params.iter()), |row| {
            (0..columns)
                .map(|i| row.get_ref(i).map(cell_from_value))
                .collect::<rusqlite::Result<Row>>()
        })?;
        let rows = rows.collect::<rusqlite::Result<Vec<Row>>>()?;
        debug!(rows = rows.len(), "Query finished");
        Ok(rows)
    }
}

/// Convert a SQLite value to a cell. Text that is not valid UTF-8 is
/// decoded lossily; blobs are shown as hex.
fn cell_from_value(value: ValueRef<'_>) -> Cell {
    match value {
        ValueRef::Null => Cell::Null,
        ValueRef::Integer(n) => Cell::Integer(n),
        ValueRef::Real(f) => Cell::Text(f.to_string()),
        ValueRef::Text(bytes) => Cell::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Cell::Text(hex::encode(bytes)),
    }
}

/// `file:` URI opening `path` immutable.
fn immutable_uri(path: &Path) -> String {
    let mut uri = String::from("file:");
    for ch in path.to_string_lossy().chars() {
        match ch {
            '%' => uri.push_str("%25"),
            '?' => uri.push_str("%3f"),
            '#' => uri.push_str("%23"),
            _ => uri.push(ch),
        }
    }
    uri.push_str("?immutable=1");
    uri
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::types::Value;

    fn fixture(dir: &Path) -> PathBuf {
        let path = dir.join("t.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT, score REAL, raw BLOB);
             INSERT INTO t VALUES (1, 'alice', 1.5, x'00ff');
             INSERT INTO t VALUES (2, NULL, NULL, NULL);",
        )
        .unwrap();
        path
    }

    #[test]
    fn test_query_maps_cells() {
        let dir = tempfile::tempdir().unwrap();
        let store = EvidenceStore::open(fixture(dir.path())).unwrap();
        let rows = store
            .query(&CompiledQuery {
                sql: "SELECT id, name, score, raw FROM t WHERE id >= ? ORDER BY id".into(),
                params: vec![Value::Integer(1)],
            })
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0],
            vec![
                Cell::Integer(1),
                Cell::text("alice"),
                Cell::text("1.5"),
                Cell::text("00ff")
            ]
        );
        assert_eq!(rows[1][1], Cell::Null);
    }

    #[test]
    fn test_store_is_read_only() {
        let dir = tempfile::tempdir().unwrap();
        let store = EvidenceStore::open(fixture(dir.path())).unwrap();
        let result = store.query(&CompiledQuery {
            sql: "DELETE FROM t".into(),
            params: Vec::new(),
        });
        assert!(matches!(result, Err(EvidenceError::Store(_))));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            EvidenceStore::open(dir.path().join("none.db")),
            Err(EvidenceError::Io { .. })
        ));
    }

    #[test]
    fn test_uri_escaping() {
        assert_eq!(
            immutable_uri(Path::new("/a b/c?d#e%f")),
            "file:/a b/c%3fd%23e%25f?immutable=1"
        );
    }
}
