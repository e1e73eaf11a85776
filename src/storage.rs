/// Local history persistence (window.localStorage)

use std::cell::RefCell;

use serde::{Deserialize, Serialize};

use crate::analysis::AnalysisRecord;
use crate::error::StoreError;

/// Maximum number of records kept locally
pub const LOCAL_HISTORY_CAP: usize = 50;

/// localStorage key holding the serialized history list
pub const LOCAL_STORAGE_KEY: &str = "utubext_cloud_history_v2";

/// Bounded, newest-first list of analysis records.
/// Serialized as a plain JSON array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryVault {
    records: Vec<AnalysisRecord>,
}

impl HistoryVault {
    pub fn new() -> Self {
        HistoryVault {
            records: Vec::new(),
        }
    }

    /// Build from an already newest-first list, dropping anything past the cap
    pub fn from_records(mut records: Vec<AnalysisRecord>) -> Self {
        records.truncate(LOCAL_HISTORY_CAP);
        HistoryVault { records }
    }

    /// Decode a stored JSON array. Entries that no longer decode as a
    /// record are skipped.
    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        let entries: Vec<serde_json::Value> =
            serde_json::from_str(json).map_err(|e| StoreError::Decode(e.to_string()))?;

        let records = entries
            .into_iter()
            .enumerate()
            .filter_map(|(i, entry)| match serde_json::from_value::<AnalysisRecord>(entry) {
                Ok(record) => Some(record),
                Err(e) => {
                    log::warn!("utubext: skipping unreadable local record #{}: {}", i, e);
                    None
                }
            })
            .collect();

        Ok(Self::from_records(records))
    }

    /// Prepend a record, evicting the oldest entries beyond the cap.
    /// Returns how many records were evicted.
    pub fn push_front(&mut self, record: AnalysisRecord) -> usize {
        self.records.insert(0, record);
        let evicted = self.records.len().saturating_sub(LOCAL_HISTORY_CAP);
        self.records.truncate(LOCAL_HISTORY_CAP);
        evicted
    }

    /// The first `count` records, newest first
    pub fn recent(&self, count: usize) -> Vec<AnalysisRecord> {
        self.records.iter().take(count).cloned().collect()
    }

    /// Give the record stored under `from` the id `to`.
    /// Returns false when no record has id `from`.
    pub fn relabel(&mut self, from: &str, to: &str) -> bool {
        match self.records.iter_mut().find(|r| r.id == from) {
            Some(record) => {
                record.id = to.to_string();
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: &str) -> Option<&AnalysisRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn records(&self) -> &[AnalysisRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Whole-list persistence of the local history
pub trait LocalStore {
    fn load(&self) -> Result<HistoryVault, StoreError>;

    fn store(&self, vault: &HistoryVault) -> Result<(), StoreError>;
}

/// History kept in the page's localStorage under a single key
pub struct WebLocalStore {
    storage: web_sys::Storage,
    key: String,
}

impl WebLocalStore {
    pub fn open() -> Result<Self, StoreError> {
        Self::open_with_key(LOCAL_STORAGE_KEY)
    }

    pub fn open_with_key(key: &str) -> Result<Self, StoreError> {
        let window = web_sys::window()
            .ok_or_else(|| StoreError::Unavailable("no window".to_string()))?;

        let storage = window
            .local_storage()
            .map_err(|e| StoreError::Unavailable(format!("{:?}", e)))?
            .ok_or_else(|| StoreError::Unavailable("localStorage disabled".to_string()))?;

        Ok(WebLocalStore {
            storage,
            key: key.to_string(),
        })
    }
}

impl LocalStore for WebLocalStore {
    fn load(&self) -> Result<HistoryVault, StoreError> {
        let raw = self
            .storage
            .get_item(&self.key)
            .map_err(|e| StoreError::Unavailable(format!("{:?}", e)))?;

        match raw {
            None => Ok(HistoryVault::new()),
            Some(json) => HistoryVault::from_json(&json),
        }
    }

    fn store(&self, vault: &HistoryVault) -> Result<(), StoreError> {
        let json = serde_json::to_string(vault)?;

        self.storage
            .set_item(&self.key, &json)
            .map_err(|e| StoreError::Unavailable(format!("{:?}", e)))
    }
}

/// In-memory history, used when localStorage is unavailable
#[derive(Debug, Default)]
pub struct MemoryLocalStore {
    vault: RefCell<HistoryVault>,
}

impl MemoryLocalStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStore for MemoryLocalStore {
    fn load(&self) -> Result<HistoryVault, StoreError> {
        Ok(self.vault.borrow().clone())
    }

    fn store(&self, vault: &HistoryVault) -> Result<(), StoreError> {
        *self.vault.borrow_mut() = vault.clone();
        Ok(())
    }
}
