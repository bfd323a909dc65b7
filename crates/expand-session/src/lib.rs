//! Stateful per-context expansion session.
//!
//! `ExpanderSession` owns one execution context's in-memory mirror of the
//! synced settings document and processes each key event, returning
//! responses that the host translates into field edits and timer
//! scheduling. A page context and the privileged context each hold their
//! own session over one shared `SyncStore`; the sessions converge through
//! the store's change notifications.

pub(crate) mod types;

mod activation;
mod applier;
mod buffer;
mod key_handlers;
mod sync;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use expand_core::index::TriggerIndex;
use expand_core::settings::StorageSettings;
use expand_core::store::SyncStore;

pub use applier::{apply_expansion, Replacement, TextField};
pub use types::{KeyEvent, KeyResponse, TargetKind, TimerAction, TimerHandle};

use types::DeactivationTimer;

/// Stateful expansion session encapsulating activation, the match buffer,
/// and storage synchronization for one context.
pub struct ExpanderSession {
    store: Arc<SyncStore>,

    /// In-memory mirror of the persisted document. Transiently stale
    /// between a remote write and its notification, never permanently.
    cache: StorageSettings,
    /// Lazily rebuilt view of the expander list; `None` after `expanders`
    /// or `casesensitive` changed.
    index: Option<TriggerIndex>,

    /// In-progress keystroke sequence being checked against trigger codes.
    /// Scoped to a single listening session; never persisted.
    buffer: String,
    timer: DeactivationTimer,
}

impl ExpanderSession {
    pub fn new(store: Arc<SyncStore>) -> Self {
        let cache = store.get();
        Self {
            store,
            cache,
            index: None,
            buffer: String::new(),
            timer: DeactivationTimer::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.cache.active
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn cache(&self) -> &StorageSettings {
        &self.cache
    }

    /// The cached trigger index, rebuilt on first use after invalidation.
    pub(crate) fn index(&mut self) -> &TriggerIndex {
        if self.index.is_none() {
            self.index = Some(TriggerIndex::build(
                &self.cache.expanders,
                self.cache.settings.casesensitive,
            ));
        }
        match &self.index {
            Some(index) => index,
            None => unreachable!("index rebuilt above"),
        }
    }

    pub(crate) fn invalidate_index(&mut self) {
        self.index = None;
    }
}
