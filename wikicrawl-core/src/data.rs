use rusqlite::{Connection, OptionalExtension, Result, params};
use std::path::Path;
use tracing::debug;

/// Durable set of visited article URLs.
///
/// Backed by a single `links` table keyed on `url`. Writes are idempotent:
/// inserting a URL that is already stored is a no-op, never an error.
pub struct LinkStore {
    conn: Connection,
}

impl LinkStore {
    pub fn exists(path: &Path) -> bool {
        path.exists()
    }

    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
            ",
        )?;

        let store = LinkStore { conn };
        store.ensure_schema()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        let store = LinkStore {
            conn: Connection::open_in_memory()?,
        };
        store.ensure_schema()?;
        Ok(store)
    }

    pub fn ensure_schema(&self) -> Result<()> {
        self.conn
            .execute_batch("CREATE TABLE IF NOT EXISTS links (url TEXT PRIMARY KEY);")?;
        Ok(())
    }

    /// Stores one URL. Returns `true` if it was not already present.
    pub fn upsert(&self, url: &str) -> Result<bool> {
        let inserted = self
            .conn
            .execute("INSERT OR IGNORE INTO links (url) VALUES (?1)", params![url])?;
        Ok(inserted > 0)
    }

    /// Stores every URL in a single transaction and returns how many were new.
    pub fn upsert_all<I, S>(&mut self, urls: I) -> Result<usize>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tx = self.conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare("INSERT OR IGNORE INTO links (url) VALUES (?1)")?;
            for url in urls {
                inserted += stmt.execute(params![url.as_ref()])?;
            }
        }
        tx.commit()?;

        debug!("Stored {} new links", inserted);
        Ok(inserted)
    }

    /// Removes every stored URL and returns how many rows were deleted.
    pub fn clear(&self) -> Result<usize> {
        self.conn.execute("DELETE FROM links", [])
    }

    pub fn urls(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT url FROM links ORDER BY url")?;
        let urls = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>>>()?;
        Ok(urls)
    }

    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM links", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn contains(&self, url: &str) -> Result<bool> {
        let found = self
            .conn
            .query_row("SELECT 1 FROM links WHERE url = ?1", params![url], |_| Ok(()))
            .optional()?;
        Ok(found.is_some())
    }

    /// Closes the connection, surfacing any error from the final flush.
    /// Dropping the store also closes it, silently.
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| e)
    }
}
