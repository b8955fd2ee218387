//! Two-tier translation cache: bounded in-memory LRU in front of SQLite.
//! The memory tier may evict; the SQLite tier never does, so an entry once
//! stored stays retrievable for the life of the database.

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;
use tracing::warn;

use super::sqlite_cache::{compute_key, SqliteCache};
use super::Language;

pub struct TranslationCache {
    memory: Mutex<LruCache<String, String>>,
    persistent: Arc<SqliteCache>,
}

impl TranslationCache {
    /// `capacity` bounds the memory tier only. Zero is treated as one.
    pub fn new(persistent: Arc<SqliteCache>, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            memory: Mutex::new(LruCache::new(capacity)),
            persistent,
        }
    }

    /// Cached translation of `text` into `target`, if any.
    /// A failing SQLite read is logged and reported as a miss.
    ///
    /// The memory lock is held across the SQLite read and the fill so a
    /// concurrent `store` cannot be overwritten by the older row.
    pub fn lookup(&self, text: &str, target: Language) -> Option<String> {
        let key = compute_key(text, target);
        let mut memory = self.memory.lock();
        if let Some(hit) = memory.get(&key) {
            return Some(hit.clone());
        }

        match self.persistent.get(&key, target) {
            Ok(Some(translated)) => {
                memory.put(key, translated.clone());
                Some(translated)
            }
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "translation cache read failed, treating as miss");
                None
            }
        }
    }

    /// Record a successful translation. Returns whether anything was written.
    ///
    /// Empty input, empty output and output identical to the input are
    /// ignored so a failed or no-op translation is never served as a hit.
    /// Both tiers are updated under the memory lock, in the same order as
    /// `lookup` takes them.
    pub fn store(&self, text: &str, target: Language, translated: &str) -> bool {
        if text.is_empty() || translated.is_empty() || translated == text {
            return false;
        }

        let key = compute_key(text, target);
        let mut memory = self.memory.lock();
        if let Err(e) = self.persistent.insert(&key, text, target, translated) {
            warn!(error = %e, "translation cache write failed");
            return false;
        }
        memory.put(key, translated.to_string());
        true
    }

    pub fn persistent(&self) -> &Arc<SqliteCache> {
        &self.persistent
    }
}
