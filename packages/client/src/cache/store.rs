//! Key/value store backing the session cache.

use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use serde_json::{Map, Value};

use super::CacheError;

/// The session entry: one JSON object, one slot per cache key.
pub type Entry = Map<String, Value>;

#[derive(Debug, Default)]
struct StoreInner {
    entry: Entry,
    /// Session file the entry is flushed to on every replace
    path: Option<PathBuf>,
}

/// Shared handle to a session entry.
///
/// Cloning the handle shares the entry. Writes replace the entry in place;
/// there is no history of previous entries.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    inner: Arc<Mutex<StoreInner>>,
}

impl SessionStore {
    /// Create a store that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open a store backed by a session file.
    ///
    /// A missing file yields an empty entry. A file that does not hold a JSON
    /// object (or is not JSON at all) is also treated as an empty entry and
    /// will be overwritten on the next write.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Io`] if the file exists but cannot be read.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let path = path.into();

        let entry = match fs::read_to_string(&path) {
            Ok(text) => parse_entry(&path, &text),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("Session file '{}' not found, starting empty", path.display());
                Entry::new()
            }
            Err(source) => return Err(CacheError::Io { path, source }),
        };

        tracing::debug!(
            "Opened session file '{}' with {} key(s)",
            path.display(),
            entry.len()
        );

        Ok(Self {
            inner: Arc::new(Mutex::new(StoreInner {
                entry,
                path: Some(path),
            })),
        })
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the whole entry.
    pub fn entry(&self) -> Entry {
        self.lock().entry.clone()
    }

    /// Raw value stored under `key`.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.lock().entry.get(key).cloned()
    }

    /// Session file backing this store, if any.
    pub fn path(&self) -> Option<PathBuf> {
        self.lock().path.clone()
    }

    /// Replace the whole entry.
    pub fn replace(&self, entry: Entry) -> Result<(), CacheError> {
        self.modify(|current| *current = entry)
    }

    /// Edit the entry under a single lock, then flush it.
    pub fn modify(&self, edit: impl FnOnce(&mut Entry)) -> Result<(), CacheError> {
        let mut inner = self.lock();
        edit(&mut inner.entry);

        if let Some(path) = &inner.path {
            flush(path, &inner.entry)?;
        }

        Ok(())
    }
}

fn parse_entry(path: &Path, text: &str) -> Entry {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(entry)) => entry,
        Ok(_) => {
            tracing::warn!(
                "Session file '{}' does not hold an object, starting empty",
                path.display()
            );
            Entry::new()
        }
        Err(e) => {
            tracing::warn!(
                "Session file '{}' is not valid JSON ({}), starting empty",
                path.display(),
                e
            );
            Entry::new()
        }
    }
}

/// Write the entry next to the session file, then rename it into place.
fn flush(path: &Path, entry: &Entry) -> Result<(), CacheError> {
    let json = serde_json::to_string(entry).map_err(CacheError::Encode)?;
    let staging = path.with_extension("tmp");

    fs::write(&staging, json).map_err(|source| CacheError::Io {
        path: staging.clone(),
        source,
    })?;
    fs::rename(&staging, path).map_err(|source| CacheError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::trace!("Flushed session entry to '{}'", path.display());
    Ok(())
}
