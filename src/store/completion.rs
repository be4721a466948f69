use std::collections::{BTreeSet, HashMap, HashSet};

use crate::store::kv::{KeyValueStorage, StorageError};

/// Which tests have been submitted at least once, per category.
///
/// Storage failures are logged and otherwise ignored: the in-memory record
/// stays authoritative for the rest of the run. A category whose stored
/// record could not be read is never written back until a later read of it
/// succeeds, so an outage cannot replace earlier completions.
pub struct CompletionStore {
    backend: Option<Box<dyn KeyValueStorage>>,
    cache: HashMap<String, BTreeSet<String>>,
    unread: HashSet<String>,
}

impl CompletionStore {
    pub fn new(backend: Box<dyn KeyValueStorage>) -> Self {
        Self {
            backend: Some(backend),
            cache: HashMap::new(),
            unread: HashSet::new(),
        }
    }

    /// A store with no persistence at all.
    pub fn in_memory() -> Self {
        Self {
            backend: None,
            cache: HashMap::new(),
            unread: HashSet::new(),
        }
    }

    pub fn storage_key(category: &str) -> String {
        format!("completed-{category}")
    }

    pub fn load(&mut self, category: &str) -> BTreeSet<String> {
        self.entry(category).clone()
    }

    pub fn is_complete(&mut self, category: &str, test_id: &str) -> bool {
        self.entry(category).contains(test_id)
    }

    /// Record `test_id` as completed. Returns true the first time.
    pub fn mark_complete(&mut self, category: &str, test_id: &str) -> bool {
        let inserted = self.entry(category).insert(test_id.to_string());
        if inserted {
            self.persist(category);
        }
        inserted
    }

    fn entry(&mut self, category: &str) -> &mut BTreeSet<String> {
        if !self.cache.contains_key(category) {
            let loaded = match self.read(category) {
                Ok(ids) => ids,
                Err(e) => {
                    tracing::warn!(
                        "completion storage unavailable for {}: {e}",
                        Self::storage_key(category)
                    );
                    self.unread.insert(category.to_string());
                    BTreeSet::new()
                }
            };
            self.cache.insert(category.to_string(), loaded);
        }
        self.cache.entry(category.to_string()).or_default()
    }

    fn read(&self, category: &str) -> Result<BTreeSet<String>, StorageError> {
        let Some(backend) = self.backend.as_ref() else {
            return Ok(BTreeSet::new());
        };
        let key = Self::storage_key(category);
        let Some(raw) = backend.get(&key)? else {
            return Ok(BTreeSet::new());
        };
        match serde_json::from_str::<Vec<String>>(&raw) {
            Ok(ids) => Ok(ids.into_iter().collect()),
            Err(e) => {
                tracing::warn!("ignoring unreadable completion record {key}: {e}");
                Ok(BTreeSet::new())
            }
        }
    }

    fn persist(&mut self, category: &str) {
        let key = Self::storage_key(category);
        if self.unread.contains(category) {
            match self.read(category) {
                Ok(stored) => {
                    self.unread.remove(category);
                    self.cache
                        .entry(category.to_string())
                        .or_default()
                        .extend(stored);
                }
                Err(e) => {
                    tracing::warn!("not overwriting unread completion record {key}: {e}");
                    return;
                }
            }
        }
        let Some(ids) = self.cache.get(category) else {
            return;
        };
        let Some(backend) = self.backend.as_mut() else {
            return;
        };
        let ids: Vec<&String> = ids.iter().collect();
        let result = serde_json::to_string(&ids)
            .map_err(|e| e.to_string())
            .and_then(|json| backend.set(&key, &json).map_err(|e| e.to_string()));
        if let Err(e) = result {
            tracing::warn!("completion for {key} kept in memory only: {e}");
        }
    }
}
