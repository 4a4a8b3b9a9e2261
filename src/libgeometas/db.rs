use log::{debug, error, info};
use rusqlite::{params, Connection, OptionalExtension, Result};
use std::path::Path;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Durable HTTP response cache, one row per request URL.
pub struct ResponseCache {
    conn: Connection,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    pub url: String,
    pub body: String,
    pub fetched_at: u64,
}

impl CachedResponse {
    fn from_row(row: &rusqlite::Row) -> Result<CachedResponse> {
        Ok(CachedResponse {
            url: row.get(0)?,
            body: row.get(1)?,
            fetched_at: row.get::<usize, i64>(2)? as u64,
        })
    }

    pub fn is_fresh(&self, ttl: Duration, now: u64) -> bool {
        now.saturating_sub(self.fetched_at) < ttl.as_secs()
    }
}

pub fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

impl ResponseCache {
    pub fn create_or_open(src: &Path) -> Result<ResponseCache> {
        let now = Instant::now();
        if src.exists() {
            info!("[DB] Opening existing response cache");
        } else {
            info!("[DB] Creating new response cache");
        }
        let conn = Connection::open(src)?;
        let cache = Self::init(conn)?;
        debug!("[DB] Opening took {} ms.", now.elapsed().as_millis());
        Ok(cache)
    }

    #[cfg(test)]
    pub fn in_memory() -> Result<ResponseCache> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<ResponseCache> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS Response (
              url TEXT NOT NULL PRIMARY KEY,
              body TEXT NOT NULL,
              fetchedAt INTEGER NOT NULL
            )",
            (),
        )?;
        Ok(ResponseCache { conn })
    }

    pub fn get(&self, url: &str) -> Result<Option<CachedResponse>> {
        let mut statement = self
            .conn
            .prepare("SELECT url, body, fetchedAt FROM Response WHERE url = :url LIMIT 1")?;
        statement
            .query_row(&[(":url", url)], CachedResponse::from_row)
            .optional()
    }

    /// Returns the body stored for `url` if it is younger than `ttl`.
    pub fn get_fresh(&self, url: &str, ttl: Duration) -> Result<Option<String>> {
        self.get_fresh_at(url, ttl, now_secs())
    }

    pub fn get_fresh_at(&self, url: &str, ttl: Duration, now: u64) -> Result<Option<String>> {
        Ok(self
            .get(url)?
            .filter(|cached| cached.is_fresh(ttl, now))
            .map(|cached| cached.body))
    }

    pub fn put(&self, url: &str, body: &str) -> Result<()> {
        self.put_at(url, body, now_secs())
    }

    pub fn put_at(&self, url: &str, body: &str, fetched_at: u64) -> Result<()> {
        match self.conn.execute(
            "INSERT OR REPLACE INTO Response(url, body, fetchedAt) VALUES (?1, ?2, ?3)",
            params![url, body, fetched_at as i64],
        ) {
            Ok(_) => {
                debug!("[DB] Cached {} ({} bytes)", url, body.len());
                Ok(())
            }
            Err(err) => {
                error!("[DB] Error while caching {}: {:?}", url, err);
                Err(err)
            }
        }
    }

    /// Deletes every row older than `ttl`, returning how many went.
    pub fn purge_expired(&self, ttl: Duration) -> Result<usize> {
        let cutoff = now_secs().saturating_sub(ttl.as_secs()) as i64;
        let removed = self
            .conn
            .execute("DELETE FROM Response WHERE fetchedAt <= ?1", params![cutoff])?;
        debug!("[DB] Purged {} expired responses", removed);
        Ok(removed)
    }

    pub fn len(&self) -> Result<usize> {
        self.conn
            .query_row("SELECT COUNT(*) FROM Response", [], |row| row.get::<usize, i64>(0))
            .map(|n| n as usize)
    }

    pub fn close(self) -> Result<()> {
        info!("[DB] Closing response cache");
        self.conn.close().map_err(|(_, err)| {
            error!("[DB] Cannot close connection: {:?}", err);
            err
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: u64 = 60 * 60 * 24;

    #[test]
    fn miss_on_empty_cache() {
        let cache = ResponseCache::in_memory().unwrap();
        assert_eq!(cache.get_fresh("https://x/", Duration::from_secs(DAY)).unwrap(), None);
        assert_eq!(cache.len().unwrap(), 0);
    }

    #[test]
    fn fresh_entry_is_returned() {
        let cache = ResponseCache::in_memory().unwrap();
        cache.put_at("https://x/", "<html/>", 1_000).unwrap();
        let hit = cache
            .get_fresh_at("https://x/", Duration::from_secs(DAY), 1_000 + DAY - 1)
            .unwrap();
        assert_eq!(hit.as_deref(), Some("<html/>"));
    }

    #[test]
    fn stale_entry_is_ignored() {
        let cache = ResponseCache::in_memory().unwrap();
        cache.put_at("https://x/", "<html/>", 1_000).unwrap();
        let hit = cache
            .get_fresh_at("https://x/", Duration::from_secs(DAY), 1_000 + DAY)
            .unwrap();
        assert_eq!(hit, None);
    }

    #[test]
    fn put_replaces_previous_body() {
        let cache = ResponseCache::in_memory().unwrap();
        cache.put("https://x/", "old").unwrap();
        cache.put("https://x/", "new").unwrap();
        assert_eq!(cache.len().unwrap(), 1);
        assert_eq!(cache.get("https://x/").unwrap().unwrap().body, "new");
    }

    #[test]
    fn purge_drops_only_expired_rows() {
        let cache = ResponseCache::in_memory().unwrap();
        cache.put_at("https://old/", "a", 0).unwrap();
        cache.put("https://new/", "b").unwrap();
        assert_eq!(cache.purge_expired(Duration::from_secs(DAY)).unwrap(), 1);
        assert!(cache.get("https://old/").unwrap().is_none());
        assert!(cache.get("https://new/").unwrap().is_some());
    }

    #[test]
    fn survives_reopen() {
        let path = std::env::temp_dir().join("geometas_cache_reopen.sqlite");
        let _ = std::fs::remove_file(&path);
        let cache = ResponseCache::create_or_open(&path).unwrap();
        cache.put("https://x/", "body").unwrap();
        cache.close().unwrap();

        let cache = ResponseCache::create_or_open(&path).unwrap();
        assert_eq!(
            cache.get_fresh("https://x/", Duration::from_secs(DAY)).unwrap().as_deref(),
            Some("body")
        );
        cache.close().unwrap();
        let _ = std::fs::remove_file(&path);
    }
}
