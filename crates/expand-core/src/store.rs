//! Shared synced key-value store with change notifications.
//!
//! In-process stand-in for the platform's synced storage area: one JSON
//! document, any number of subscribed contexts. Every successful write is
//! diffed per top-level key and the resulting `ChangeSet` broadcast to all
//! subscribers, which drain their channel on their own event loop. Writes
//! from two contexts at nearly the same time are last-writer-wins at the
//! granularity of the keys written.

use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Mutex, MutexGuard};

use serde_json::Value;
use tracing::{debug, warn};

use crate::merge::{self, FieldPatch, StorageKey, StoragePatch};
use crate::settings::{defaults, StorageSettings};

/// Byte quota of the synced storage area.
pub const QUOTA_BYTES: usize = 102_400;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageArea {
    Sync,
    Local,
    Managed,
    Session,
}

/// One changed top-level key with its pre- and post-write values.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyChange {
    pub key: StorageKey,
    pub old_value: Value,
    pub new_value: Value,
}

/// Notification delivered to every subscriber after a write.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeSet {
    pub area: StorageArea,
    pub changes: Vec<KeyChange>,
}

impl ChangeSet {
    pub fn get(&self, key: StorageKey) -> Option<&KeyChange> {
        self.changes.iter().find(|c| c.key == key)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("document is {size} bytes, quota is {quota}")]
    QuotaExceeded { size: usize, quota: usize },
    #[error("serialization failed: {0}")]
    Serialize(String),
}

pub struct SyncStore {
    doc: Mutex<Value>,
    subscribers: Mutex<Vec<Sender<ChangeSet>>>,
    quota: usize,
}

impl Default for SyncStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncStore {
    /// A store seeded with the defaults template, as after a fresh install.
    pub fn new() -> Self {
        Self::with_document(
            serde_json::to_value(defaults()).unwrap_or(Value::Null),
        )
    }

    /// A store holding an arbitrary (possibly stale or partial) document,
    /// as found before an upgrade.
    pub fn with_document(doc: Value) -> Self {
        Self {
            doc: Mutex::new(doc),
            subscribers: Mutex::new(Vec::new()),
            quota: QUOTA_BYTES,
        }
    }

    pub fn with_quota(mut self, quota: usize) -> Self {
        self.quota = quota;
        self
    }

    /// Subscribe to change notifications. The receiver is dropped from the
    /// broadcast list once it disconnects.
    pub fn subscribe(&self) -> Receiver<ChangeSet> {
        let (tx, rx) = channel();
        self.lock(&self.subscribers).push(tx);
        rx
    }

    /// Fetch the full document. Absent or undecodable keys read as their
    /// defaults; a missing document is never fatal.
    pub fn get(&self) -> StorageSettings {
        merge::from_stored(&self.lock(&self.doc))
    }

    /// The raw stored document, exactly as last written.
    pub fn raw(&self) -> Value {
        self.lock(&self.doc).clone()
    }

    /// Install: write the defaults template wholesale.
    pub fn init(&self) -> Option<StorageSettings> {
        self.write(defaults().clone())
    }

    /// Write the full document.
    pub fn set(&self, doc: &StorageSettings) -> Option<StorageSettings> {
        self.write(doc.clone())
    }

    /// Merge one key into the stored document per its declared strategy.
    pub fn set_one(&self, patch: &FieldPatch, replace: bool) -> Option<StorageSettings> {
        let current = self.get();
        self.write(merge::set_one(&current, patch, replace))
    }

    /// Overwrite every key present in `patch` at key granularity.
    pub fn set_many(&self, patch: &StoragePatch) -> Option<StorageSettings> {
        let current = self.get();
        self.write(merge::set_many(&current, patch))
    }

    /// Extension update: re-derive the document from the defaults template,
    /// preserving user-authored expanders and forcing `active = false`.
    pub fn upgrade(&self) -> Option<StorageSettings> {
        let raw = self.raw();
        self.write(merge::upgrade(&raw))
    }

    /// Serialize, enforce quota, diff, swap, broadcast. Returns `None` on
    /// failure; the stored document is left untouched and callers keep
    /// their in-memory state (optimistic, re-synced by the next write).
    fn write(&self, updated: StorageSettings) -> Option<StorageSettings> {
        let new_value = match self.encode(&updated) {
            Ok(v) => v,
            Err(err) => {
                warn!(%err, "storage write failed");
                return None;
            }
        };

        let changes = {
            let mut doc = self.lock(&self.doc);
            let changes = diff(&doc, &new_value);
            *doc = new_value;
            changes
        };

        if !changes.is_empty() {
            debug!(keys = ?changes.iter().map(|c| c.key.name()).collect::<Vec<_>>(), "storage changed");
            self.broadcast(ChangeSet {
                area: StorageArea::Sync,
                changes,
            });
        }

        Some(updated)
    }

    fn encode(&self, doc: &StorageSettings) -> Result<Value, StoreError> {
        let text = serde_json::to_string(doc).map_err(|e| StoreError::Serialize(e.to_string()))?;
        if text.len() > self.quota {
            return Err(StoreError::QuotaExceeded {
                size: text.len(),
                quota: self.quota,
            });
        }
        serde_json::from_str(&text).map_err(|e| StoreError::Serialize(e.to_string()))
    }

    fn broadcast(&self, changes: ChangeSet) {
        let mut subscribers = self.lock(&self.subscribers);
        subscribers.retain(|tx| tx.send(changes.clone()).is_ok());
    }

    fn lock<'a, T>(&self, mutex: &'a Mutex<T>) -> MutexGuard<'a, T> {
        mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Per-key diff of two stored documents. Keys absent from a document read
/// as `Null` on that side.
fn diff(old: &Value, new: &Value) -> Vec<KeyChange> {
    StorageKey::ALL
        .iter()
        .filter_map(|&key| {
            let old_value = old.get(key.name()).cloned().unwrap_or(Value::Null);
            let new_value = new.get(key.name()).cloned().unwrap_or(Value::Null);
            (old_value != new_value).then_some(KeyChange {
                key,
                old_value,
                new_value,
            })
        })
        .collect()
}
