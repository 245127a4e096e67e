//! Named cache stores and their entries.
//!
//! Stores are created on first write and listed in creation order. Entries
//! are keyed by request identity within a store; a write replaces the whole
//! entry (last write wins), and a store published through
//! [`CacheDb::publish_store`] is either fully present or absent.

use super::connection::CacheDb;
use super::hash::compute_request_key;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;
use url::Url;

/// A stored response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub store: String,
    pub request_key: String,
    pub url: String,
    pub method: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub headers_json: Option<String>,
    pub body: Vec<u8>,
    pub cached_at: String,
}

impl CacheEntry {
    /// Build an entry for `method url`, stamped with the current time.
    pub fn new(store: impl Into<String>, method: &str, url: &Url, status: u16, body: Vec<u8>) -> Self {
        Self {
            store: store.into(),
            request_key: compute_request_key(method, url),
            url: url.to_string(),
            method: method.to_ascii_uppercase(),
            status,
            content_type: None,
            headers_json: None,
            body,
            cached_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn with_content_type(mut self, content_type: Option<String>) -> Self {
        self.content_type = content_type;
        self
    }

    pub fn with_headers_json(mut self, headers_json: Option<String>) -> Self {
        self.headers_json = headers_json;
        self
    }
}

const ENTRY_COLUMNS: &str =
    "store, request_key, url, method, status, content_type, headers_json, body, cached_at";

fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<CacheEntry> {
    Ok(CacheEntry {
        store: row.get(0)?,
        request_key: row.get(1)?,
        url: row.get(2)?,
        method: row.get(3)?,
        status: row.get(4)?,
        content_type: row.get(5)?,
        headers_json: row.get(6)?,
        body: row.get(7)?,
        cached_at: row.get(8)?,
    })
}

fn insert_store(conn: &rusqlite::Connection, name: &str) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO cache_stores (name, created_at) VALUES (?1, ?2)",
        params![name, chrono::Utc::now().to_rfc3339()],
    )?;
    Ok(())
}

fn upsert_entry(conn: &rusqlite::Connection, entry: &CacheEntry) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO cache_entries (
            store, request_key, url, method, status, content_type, headers_json, body, cached_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        ON CONFLICT(store, request_key) DO UPDATE SET
            url = excluded.url,
            method = excluded.method,
            status = excluded.status,
            content_type = excluded.content_type,
            headers_json = excluded.headers_json,
            body = excluded.body,
            cached_at = excluded.cached_at",
        params![
            &entry.store,
            &entry.request_key,
            &entry.url,
            &entry.method,
            entry.status,
            &entry.content_type,
            &entry.headers_json,
            &entry.body,
            &entry.cached_at,
        ],
    )?;
    Ok(())
}

impl CacheDb {
    /// Create the named store if it does not exist yet.
    pub async fn open_store(&self, name: &str) -> Result<(), Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                insert_store(conn, &name)?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    pub async fn has_store(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let exists = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM cache_stores WHERE name = ?1)",
                    params![name],
                    |row| row.get(0),
                )?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    /// All store names, oldest first.
    pub async fn store_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM cache_stores ORDER BY rowid ASC")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a store and every entry in it.
    ///
    /// Returns whether the store existed.
    pub async fn delete_store(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute("DELETE FROM cache_stores WHERE name = ?1", params![name])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Insert or replace a single entry, creating its store on demand.
    pub async fn put_entry(&self, entry: &CacheEntry) -> Result<(), Error> {
        let entry = entry.clone();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                insert_store(&tx, &entry.store)?;
                upsert_entry(&tx, &entry)?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Write a whole store in one transaction.
    ///
    /// Any previous content of the store is replaced. If any write fails the
    /// transaction rolls back and the store is left as it was.
    pub async fn publish_store(&self, name: &str, entries: Vec<CacheEntry>) -> Result<(), Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                tx.execute("DELETE FROM cache_stores WHERE name = ?1", params![&name])?;
                insert_store(&tx, &name)?;
                for mut entry in entries {
                    entry.store = name.clone();
                    upsert_entry(&tx, &entry)?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Look up an entry in one store.
    pub async fn match_entry(&self, store: &str, request_key: &str) -> Result<Option<CacheEntry>, Error> {
        let store = store.to_string();
        let request_key = request_key.to_string();
        self.conn
            .call(move |conn| -> Result<Option<CacheEntry>, Error> {
                let sql = format!("SELECT {ENTRY_COLUMNS} FROM cache_entries WHERE store = ?1 AND request_key = ?2");
                let result = conn.query_row(&sql, params![store, request_key], row_to_entry);

                match result {
                    Ok(entry) => Ok(Some(entry)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Look up an entry across every store, oldest store first.
    pub async fn match_any(&self, request_key: &str) -> Result<Option<CacheEntry>, Error> {
        let request_key = request_key.to_string();
        self.conn
            .call(move |conn| -> Result<Option<CacheEntry>, Error> {
                let result = conn.query_row(
                    "SELECT e.store, e.request_key, e.url, e.method, e.status, e.content_type,
                            e.headers_json, e.body, e.cached_at
                     FROM cache_entries e
                     JOIN cache_stores s ON s.name = e.store
                     WHERE e.request_key = ?1
                     ORDER BY s.rowid ASC
                     LIMIT 1",
                    params![request_key],
                    row_to_entry,
                );

                match result {
                    Ok(entry) => Ok(Some(entry)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    pub async fn entry_count(&self, store: &str) -> Result<u64, Error> {
        let store = store.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM cache_entries WHERE store = ?1", params![store], |row| {
                        row.get(0)
                    })?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(path: &str) -> Url {
        Url::parse("https://yunoxia.one").unwrap().join(path).unwrap()
    }

    fn entry(store: &str, path: &str, body: &str) -> CacheEntry {
        CacheEntry::new(store, "GET", &url(path), 200, body.as_bytes().to_vec())
            .with_content_type(Some("text/html".into()))
    }

    #[tokio::test]
    async fn test_put_and_match() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let stored = entry("yunoxia-runtime", "/about.html", "<main>About</main>");
        db.put_entry(&stored).await.unwrap();

        let found = db.match_entry("yunoxia-runtime", &stored.request_key).await.unwrap().unwrap();
        assert_eq!(found.body, b"<main>About</main>");
        assert_eq!(found.content_type.as_deref(), Some("text/html"));
        assert!(db.has_store("yunoxia-runtime").await.unwrap());
    }

    #[tokio::test]
    async fn test_put_overwrites_same_key() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put_entry(&entry("rt", "/a.css", "old")).await.unwrap();
        db.put_entry(&entry("rt", "/a.css", "new")).await.unwrap();

        let key = compute_request_key("GET", &url("/a.css"));
        let found = db.match_entry("rt", &key).await.unwrap().unwrap();
        assert_eq!(found.body, b"new");
        assert_eq!(db.entry_count("rt").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_match_missing() {
        let db = CacheDb::open_in_memory().await.unwrap();
        assert!(db.match_entry("rt", "nonexistent").await.unwrap().is_none());
        assert!(db.match_any("nonexistent").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_match_any_prefers_oldest_store() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_store("first").await.unwrap();
        db.open_store("second").await.unwrap();
        db.put_entry(&entry("second", "/", "second")).await.unwrap();
        db.put_entry(&entry("first", "/", "first")).await.unwrap();

        let key = compute_request_key("GET", &url("/"));
        let found = db.match_any(&key).await.unwrap().unwrap();
        assert_eq!(found.store, "first");
    }

    #[tokio::test]
    async fn test_store_names_in_creation_order() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_store("b").await.unwrap();
        db.open_store("a").await.unwrap();
        db.open_store("b").await.unwrap();
        assert_eq!(db.store_names().await.unwrap(), vec!["b".to_string(), "a".to_string()]);
    }

    #[tokio::test]
    async fn test_delete_store_cascades() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let stored = entry("yunoxia-v1", "/", "home");
        db.put_entry(&stored).await.unwrap();

        assert!(db.delete_store("yunoxia-v1").await.unwrap());
        assert!(!db.delete_store("yunoxia-v1").await.unwrap());
        assert!(db.match_any(&stored.request_key).await.unwrap().is_none());
        assert_eq!(db.entry_count("yunoxia-v1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_publish_store_replaces_content() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put_entry(&entry("yunoxia-v1", "/stale.html", "stale")).await.unwrap();

        db.publish_store("yunoxia-v1", vec![entry("ignored", "/", "home"), entry("ignored", "/about.html", "about")])
            .await
            .unwrap();

        assert_eq!(db.entry_count("yunoxia-v1").await.unwrap(), 2);
        let stale_key = compute_request_key("GET", &url("/stale.html"));
        assert!(db.match_entry("yunoxia-v1", &stale_key).await.unwrap().is_none());
        assert!(!db.has_store("ignored").await.unwrap());
    }
}
