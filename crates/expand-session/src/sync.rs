//! Applies remote storage-change notifications to the local mirror.
//!
//! No merge logic here: the notification already carries the
//! authoritative post-write value for each changed key.

use expand_core::merge::StorageKey;
use expand_core::settings::{Expander, Settings};
use expand_core::store::{ChangeSet, StorageArea};
use tracing::debug;

use super::ExpanderSession;

impl ExpanderSession {
    /// Patch the cache from a change notification. Only the sync area
    /// carries the settings document; undecodable values are skipped and
    /// the key keeps its current mirror value until the next write.
    pub fn on_storage_changed(&mut self, changes: &ChangeSet) {
        if changes.area != StorageArea::Sync {
            return;
        }

        for change in &changes.changes {
            match change.key {
                StorageKey::Active => {
                    let Ok(active) = serde_json::from_value::<bool>(change.new_value.clone())
                    else {
                        continue;
                    };
                    if self.cache.active && !active {
                        self.buffer.clear();
                        self.timer.cancel();
                    }
                    self.cache.active = active;
                }
                StorageKey::Settings => {
                    let Ok(settings) =
                        serde_json::from_value::<Settings>(change.new_value.clone())
                    else {
                        continue;
                    };
                    self.cache.settings = settings;
                    self.invalidate_index();
                }
                StorageKey::Expanders => {
                    let Ok(expanders) =
                        serde_json::from_value::<Vec<Expander>>(change.new_value.clone())
                    else {
                        continue;
                    };
                    self.cache.expanders = expanders;
                    self.invalidate_index();
                }
            }
        }
        debug!(keys = changes.changes.len(), "mirror patched from notification");
    }
}
