//! Original (source-language) text snapshots, one per page.
//! Backed by a single JSON file `{page_id: [fragment, ...]}` that is rewritten
//! in full on every accepted save. First write wins per page.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::error::StoreError;

pub struct OriginalTextStore {
    path: PathBuf,
    /// Mirror of the file contents; the lock also serializes file rewrites.
    pages: Mutex<BTreeMap<String, Vec<String>>>,
}

impl OriginalTextStore {
    /// Open the snapshot file, creating an empty one if missing.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let pages = if path.exists() {
            let content = fs::read_to_string(path)?;
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            let empty = BTreeMap::new();
            write_atomically(path, &empty)?;
            empty
        };

        info!(path = %path.display(), pages = pages.len(), "original text store opened");
        Ok(Self {
            path: path.to_path_buf(),
            pages: Mutex::new(pages),
        })
    }

    /// Persist `fragments` for `page_id` unless a snapshot already exists.
    /// Returns true if this call created the snapshot.
    pub fn save(&self, page_id: &str, fragments: &[String]) -> Result<bool, StoreError> {
        let mut pages = self.pages.lock();
        if pages.contains_key(page_id) {
            debug!(page_id, "snapshot exists, keeping first capture");
            return Ok(false);
        }

        pages.insert(page_id.to_string(), fragments.to_vec());
        if let Err(e) = write_atomically(&self.path, &pages) {
            // keep memory and disk in agreement
            pages.remove(page_id);
            return Err(e);
        }
        info!(page_id, fragments = fragments.len(), "original text snapshot saved");
        Ok(true)
    }

    /// Stored fragments for `page_id`, or an empty list.
    pub fn get(&self, page_id: &str) -> Vec<String> {
        self.pages.lock().get(page_id).cloned().unwrap_or_default()
    }

    pub fn contains(&self, page_id: &str) -> bool {
        self.pages.lock().contains_key(page_id)
    }
}

/// Write the whole map to a sibling temp file, then rename over `path`.
fn write_atomically(path: &Path, pages: &BTreeMap<String, Vec<String>>) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(pages)?;
    let tmp = path.with_extension("json.tmp");
    {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}
