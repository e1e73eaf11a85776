/// Recorder: persists analyses and reads back recent history

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::analysis::{Analysis, AnalysisRecord};
use crate::config::RemoteStoreConfig;
use crate::error::StoreError;
use crate::remote::{FirestoreStore, RemoteStore};
use crate::storage::{HistoryVault, LocalStore, MemoryLocalStore, WebLocalStore};

/// Records requested when the caller has no preference
pub const DEFAULT_RECENT_COUNT: usize = 6;

/// Local persistence always runs; the remote store is best-effort on write
/// and preferred on read. Store failures are logged and swallowed.
pub struct Recorder {
    remote: Option<Box<dyn RemoteStore>>,
    local: Box<dyn LocalStore>,
}

impl Recorder {
    pub fn new(remote: Option<Box<dyn RemoteStore>>, local: Box<dyn LocalStore>) -> Recorder {
        Recorder { remote, local }
    }

    /// Firestore when configured, localStorage (or memory if that is
    /// unavailable) for the local copy
    pub fn from_config(config: &RemoteStoreConfig) -> Recorder {
        let remote = FirestoreStore::from_config(config).map(|store| Box::new(store) as Box<dyn RemoteStore>);

        let local: Box<dyn LocalStore> = match WebLocalStore::open() {
            Ok(store) => Box::new(store),
            Err(e) => {
                log::warn!("utubext: local vault unavailable ({}), history kept in memory", e);
                Box::new(MemoryLocalStore::new())
            }
        };

        Recorder::new(remote, local)
    }

    pub fn remote_enabled(&self) -> bool {
        self.remote.is_some()
    }

    /// Persist an analysis and return the id of the stored copy.
    ///
    /// The local copy is written first under a generated `local_` id. When
    /// the remote insert succeeds the local copy is relabelled with the
    /// remote id. None only when neither copy was written.
    pub async fn save(&self, analysis: &Analysis) -> Option<String> {
        let timestamp = Utc::now();
        let local_id = local_id(timestamp);
        let record = AnalysisRecord::new(local_id.clone(), timestamp, analysis.clone());

        let local_saved = match self.save_local(record) {
            Ok(()) => true,
            Err(e) => {
                log::error!("utubext: local vault save failed: {}", e);
                false
            }
        };

        let Some(remote) = &self.remote else {
            return local_saved.then_some(local_id);
        };

        match remote.insert(analysis, timestamp).await {
            Ok(remote_id) => {
                if local_saved {
                    if let Err(e) = self.relabel_local(&local_id, &remote_id) {
                        log::warn!("utubext: local copy keeps id {}: {}", local_id, e);
                    }
                }
                Some(remote_id)
            }
            Err(e) => {
                log::error!("utubext: cloud save failed: {}", e);
                if e.is_permission_denied() {
                    log::warn!("utubext: check the Firestore security rules");
                }
                local_saved.then_some(local_id)
            }
        }
    }

    /// Most recent `count` records, newest first. Remote results win; an
    /// empty or failed remote read falls back to the local vault.
    pub async fn fetch_recent(&self, count: usize) -> Vec<AnalysisRecord> {
        let mut results = Vec::new();

        if let Some(remote) = &self.remote {
            match remote.recent(count).await {
                Ok(records) => results = records,
                Err(e) => log::warn!("utubext: cloud fetch failed, reverting to local vault: {}", e),
            }
        }

        if results.is_empty() {
            match self.local.load() {
                Ok(vault) => results = vault.recent(count),
                Err(e) => log::error!("utubext: local vault read failed: {}", e),
            }
        }

        results.truncate(count);
        results
    }

    fn save_local(&self, record: AnalysisRecord) -> Result<(), StoreError> {
        let mut vault = match self.local.load() {
            Ok(vault) => vault,
            Err(StoreError::Decode(e)) => {
                log::warn!("utubext: local vault unreadable, starting a new one: {}", e);
                HistoryVault::new()
            }
            Err(e) => return Err(e),
        };

        vault.push_front(record);
        self.local.store(&vault)
    }

    fn relabel_local(&self, from: &str, to: &str) -> Result<(), StoreError> {
        let mut vault = self.local.load()?;
        if vault.relabel(from, to) {
            self.local.store(&vault)?;
        }
        Ok(())
    }
}

/// Identifier for records that only exist locally
fn local_id(timestamp: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("local_{}_{}", timestamp.timestamp_millis(), &suffix[..8])
}
