//! State cell persisted into a [`SessionStore`] under a string key.

use serde::{Serialize, de::DeserializeOwned};

use super::{CacheError, SessionStore};

/// Bookkeeping field removed from the entry whenever the active key changes.
///
/// Only this literal field is removed; the previous key's own slot is kept.
pub const PREVIOUS_CACHE_KEY_FIELD: &str = "previousCacheKey";

/// A value bound to one key of a [`SessionStore`].
///
/// Every change is written back to the store synchronously, merged with the
/// other keys already there.
///
/// # Example
///
/// ```
/// use hiroba_client::cache::{CachedState, SessionStore};
///
/// let store = SessionStore::in_memory();
/// let mut count = CachedState::new(store.clone(), "count", 0_i64).unwrap();
/// count.update(|n| n + 1).unwrap();
///
/// // Re-binding the same key resumes from the stored value
/// let count = CachedState::new(store, "count", 0_i64).unwrap();
/// assert_eq!(*count.get(), 1);
/// ```
#[derive(Debug)]
pub struct CachedState<T> {
    store: SessionStore,
    key: String,
    /// Key the value was last written under
    persisted_key: String,
    value: T,
}

impl<T> CachedState<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Bind a state cell to `key`.
    ///
    /// The value is the one stored under `key` if present (and not `null`),
    /// otherwise `initial`. The resolved value is written to the store right
    /// away.
    pub fn new(store: SessionStore, key: impl Into<String>, initial: T) -> Result<Self, CacheError> {
        Self::new_with(store, key, move || initial)
    }

    /// Like [`CachedState::new`], but the initial value is produced lazily,
    /// only when nothing usable is stored under `key`.
    pub fn new_with(
        store: SessionStore,
        key: impl Into<String>,
        initial: impl FnOnce() -> T,
    ) -> Result<Self, CacheError> {
        let key = key.into();
        let value = match restore(&store, &key) {
            Some(value) => value,
            None => initial(),
        };

        let mut state = Self {
            store,
            persisted_key: key.clone(),
            key,
            value,
        };
        state.persist()?;
        Ok(state)
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Replace the value.
    pub fn set(&mut self, value: T) -> Result<(), CacheError> {
        self.value = value;
        self.persist()
    }

    /// Derive the next value from the current one.
    pub fn update(&mut self, next: impl FnOnce(&T) -> T) -> Result<(), CacheError> {
        self.value = next(&self.value);
        self.persist()
    }

    /// Edit the value in place.
    pub fn modify(&mut self, edit: impl FnOnce(&mut T)) -> Result<(), CacheError> {
        edit(&mut self.value);
        self.persist()
    }

    /// Move the current value to another key.
    pub fn set_key(&mut self, key: impl Into<String>) -> Result<(), CacheError> {
        self.key = key.into();
        self.persist()
    }

    fn persist(&mut self) -> Result<(), CacheError> {
        let value = serde_json::to_value(&self.value).map_err(|source| CacheError::Serialize {
            key: self.key.clone(),
            source,
        })?;
        let key_changed = self.persisted_key != self.key;

        self.store.modify(|entry| {
            entry.insert(self.key.clone(), value);
            if key_changed {
                entry.remove(PREVIOUS_CACHE_KEY_FIELD);
            }
        })?;

        if key_changed {
            tracing::debug!("Cache key changed: '{}' -> '{}'", self.persisted_key, self.key);
            self.persisted_key = self.key.clone();
        }
        Ok(())
    }
}

fn restore<T: DeserializeOwned>(store: &SessionStore, key: &str) -> Option<T> {
    let raw = store.get(key).filter(|value| !value.is_null())?;

    match serde_json::from_value(raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::debug!("Ignoring cached value under '{}': {}", key, e);
            None
        }
    }
}
