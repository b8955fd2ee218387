//! Persistent translation cache backed by SQLite.
//! Key: blake3 hash of (text | target language). Entries never expire.
//! Sits behind the in-memory tier in `cache.rs`.

use std::path::Path;

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info, warn};

use super::Language;
use crate::error::StoreError;

/// Compute the cache key for a (text, target language) pair.
/// Any byte difference in `text` yields a different key.
pub fn compute_key(text: &str, target: Language) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(text.as_bytes());
    // unit separator: cannot occur in a language code
    hasher.update(&[0x1f]);
    hasher.update(target.code().as_bytes());
    hasher.finalize().to_hex().to_string()
}

/// SQLite-backed translation cache.
pub struct SqliteCache {
    conn: Mutex<Connection>,
}

impl SqliteCache {
    /// Open (or create) the SQLite cache database at the given path.
    pub fn open(db_path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(db_path)?;
        // WAL mode for better concurrent read performance
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        let cache = Self::with_connection(conn)?;
        info!(path = %db_path.display(), "SQLite translation cache opened");
        Ok(cache)
    }

    /// Private, non-persistent database. Used by tests and as a fallback.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS translations (
                text_hash TEXT PRIMARY KEY,
                original_text TEXT NOT NULL,
                target_lang TEXT NOT NULL,
                translated_text TEXT NOT NULL,
                created_at INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_hash_lang
                ON translations(text_hash, target_lang);",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Look up a cached translation by key.
    pub fn get(&self, key: &str, target: Language) -> Result<Option<String>, StoreError> {
        let conn = self.conn.lock();
        let result: Option<String> = conn
            .query_row(
                "SELECT translated_text FROM translations
                 WHERE text_hash = ?1 AND target_lang = ?2",
                params![key, target.code()],
                |row| row.get(0),
            )
            .optional()?;

        if result.is_some() {
            debug!(lang = %target, "SQLite cache hit");
        }
        Ok(result)
    }

    /// Upsert a translation. Last write wins for the same key.
    pub fn insert(
        &self,
        key: &str,
        original_text: &str,
        target: Language,
        translated_text: &str,
    ) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT OR REPLACE INTO translations
             (text_hash, original_text, target_lang, translated_text, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![key, original_text, target.code(), translated_text, now_unix()],
        )?;
        Ok(())
    }

    /// Number of stored entries (all languages).
    pub fn len(&self) -> usize {
        let conn = self.conn.lock();
        match conn.query_row("SELECT COUNT(*) FROM translations", [], |row| {
            row.get::<_, i64>(0)
        }) {
            Ok(n) => n as usize,
            Err(e) => {
                warn!(error = %e, "SQLite cache count failed");
                0
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Current time as Unix timestamp (seconds).
fn now_unix() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_depends_on_exact_text_and_language() {
        let a = compute_key("Welcome", Language::Hn);
        assert_eq!(a, compute_key("Welcome", Language::Hn));
        assert_ne!(a, compute_key("Welcome ", Language::Hn));
        assert_ne!(a, compute_key("Welcome", Language::Fn));
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn insert_then_get() {
        let cache = SqliteCache::open_in_memory().unwrap();
        let key = compute_key("Gallery", Language::Fn);
        assert_eq!(cache.get(&key, Language::Fn).unwrap(), None);

        cache.insert(&key, "Gallery", Language::Fn, "Galerie").unwrap();
        assert_eq!(cache.get(&key, Language::Fn).unwrap().as_deref(), Some("Galerie"));

        cache.insert(&key, "Gallery", Language::Fn, "La galerie").unwrap();
        assert_eq!(cache.get(&key, Language::Fn).unwrap().as_deref(), Some("La galerie"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("translations.db");
        let key = compute_key("Tickets", Language::Ka);
        {
            let cache = SqliteCache::open(&path).unwrap();
            cache.insert(&key, "Tickets", Language::Ka, "ಟಿಕೆಟ್‌ಗಳು").unwrap();
        }
        let cache = SqliteCache::open(&path).unwrap();
        assert_eq!(
            cache.get(&key, Language::Ka).unwrap().as_deref(),
            Some("ಟಿಕೆಟ್‌ಗಳು")
        );
    }
}
