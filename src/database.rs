use std::path::Path;

use rusqlite::{Connection, OptionalExtension, Result as SqliteResult};

use crate::models::error::{Result, TkConfigError};
use crate::settings::{SettingValue, SettingsStore};

/// Initialize the database and create tables if they don't exist
pub fn init_database(path: &Path) -> SqliteResult<Connection> {
    let conn = Connection::open(path)?;
    create_tables(&conn)?;
    Ok(conn)
}

fn create_tables(conn: &Connection) -> SqliteResult<()> {
    // One row per preference key, value stored as tagged JSON
    conn.execute(
        "CREATE TABLE IF NOT EXISTS preferences (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
        [],
    )?;
    Ok(())
}

fn encode(key: &str, value: &SettingValue) -> Result<String> {
    // JSON has no NaN or infinity; serde_json would write them as null
    if let SettingValue::Float(v) = value {
        if !v.is_finite() {
            return Err(TkConfigError::InvalidOperation {
                message: format!("Preference {} is not a finite number: {}", key, v),
            });
        }
    }
    serde_json::to_string(value).map_err(|e| TkConfigError::Internal(e.to_string()))
}

fn decode(key: &str, json: &str) -> Option<SettingValue> {
    match serde_json::from_str(json) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("Ignoring unreadable preference {}: {}", key, e);
            None
        }
    }
}

/// Preferences persisted in a SQLite database.
pub struct SqliteSettings {
    conn: Connection,
}

impl SqliteSettings {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = init_database(path)?;
        Ok(Self { conn })
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        create_tables(&conn)?;
        Ok(Self { conn })
    }
}

impl SettingsStore for SqliteSettings {
    fn get(&self, key: &str) -> Result<Option<SettingValue>> {
        let json: Option<String> = self
            .conn
            .query_row("SELECT value FROM preferences WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(json.and_then(|j| decode(key, &j)))
    }

    fn put(&mut self, key: &str, value: SettingValue) -> Result<()> {
        let json = encode(key, &value)?;
        self.conn.execute(
            "INSERT INTO preferences (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = ?2",
            (key, &json),
        )?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM preferences WHERE key = ?1", [key])?;
        Ok(())
    }

    fn entries(&self) -> Result<Vec<(String, SettingValue)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT key, value FROM preferences ORDER BY key ASC")?;

        let rows = stmt
            .query_map([], |row| {
                let key: String = row.get(0)?;
                let json: String = row.get(1)?;
                Ok((key, json))
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(rows
            .into_iter()
            .filter_map(|(key, json)| decode(&key, &json).map(|value| (key, value)))
            .collect())
    }

    fn remove_prefixed(&mut self, prefix: &str) -> Result<()> {
        self.conn.execute(
            "DELETE FROM preferences WHERE substr(key, 1, length(?1)) = ?1",
            [prefix],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod db_tests {
    use super::*;

    fn setup_db() -> SqliteSettings {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let store = SqliteSettings::open(&db_path).unwrap();
        // Leak the dir so it lives for the lifetime of the test
        std::mem::forget(dir);
        store
    }

    #[test]
    fn test_init_database_creates_tables() {
        let store = setup_db();
        let count: i64 = store
            .conn
            .query_row("SELECT COUNT(*) FROM preferences", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_put_get_overwrite() {
        let mut store = setup_db();
        store.put_string("speed", "080").unwrap();
        assert_eq!(store.get_string("speed", "").unwrap(), "080");

        store.put_string("speed", "100").unwrap();
        assert_eq!(store.get_string("speed", "").unwrap(), "100");

        store.put_bool("contact_0_selected", true).unwrap();
        assert_eq!(
            store.get("contact_0_selected").unwrap(),
            Some(SettingValue::Bool(true))
        );
    }

    #[test]
    fn test_remove_and_missing() {
        let mut store = setup_db();
        store.put_int("commands", 2).unwrap();
        store.remove("commands").unwrap();
        assert_eq!(store.get("commands").unwrap(), None);
        assert_eq!(store.get_int("commands", 0).unwrap(), 0);

        // removing a missing key is not an error
        store.remove("nothing").unwrap();
    }

    #[test]
    fn test_entries_sorted() {
        let mut store = setup_db();
        store.put_string("b", "2").unwrap();
        store.put_string("a", "1").unwrap();
        store.put_long("c", 3).unwrap();

        let entries = store.entries().unwrap();
        let keys: Vec<_> = entries.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
        assert_eq!(entries[2].1, SettingValue::Long(3));
    }

    #[test]
    fn test_remove_prefixed_is_exact() {
        let mut store = SqliteSettings::in_memory().unwrap();
        store.put_string("history_0_cmd", "imei").unwrap();
        store.put_string("history_1_number", "1").unwrap();
        store.put_string("historyX", "keep").unwrap();
        store.put_int("histories", 2).unwrap();

        store.remove_prefixed("history_").unwrap();
        assert_eq!(
            store.keys().unwrap(),
            vec!["histories".to_string(), "historyX".to_string()]
        );
    }

    #[test]
    fn test_non_finite_float_rejected() {
        let mut store = setup_db();
        store.put("ratio", SettingValue::Float(0.25)).unwrap();

        for bad in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
            let err = store.put("ratio", SettingValue::Float(bad)).unwrap_err();
            assert!(matches!(err, TkConfigError::InvalidOperation { .. }));
        }
        assert_eq!(store.get("ratio").unwrap(), Some(SettingValue::Float(0.25)));
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("prefs.db");
        {
            let mut store = SqliteSettings::open(&db_path).unwrap();
            store.put_string("apn-name", "internet").unwrap();
        }
        let store = SqliteSettings::open(&db_path).unwrap();
        assert_eq!(store.get_string("apn-name", "").unwrap(), "internet");
    }
}
