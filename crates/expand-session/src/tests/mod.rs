
use std::sync::Arc;

use expand_core::settings::{defaults, Expander, StorageSettings};
use expand_core::store::SyncStore;

use super::applier::apply_expansion;
use super::types::{KeyEvent, KeyResponse, TargetKind};
use super::{ExpanderSession, TextField};

pub(super) fn exp(code: &str, expanded: &str) -> Expander {
    Expander {
        code: code.to_string(),
        expanded: expanded.to_string(),
        tags: Vec::new(),
    }
}

/// A store seeded with the defaults template, adjusted by `mutate`.
pub(super) fn make_store(mutate: impl FnOnce(&mut StorageSettings)) -> Arc<SyncStore> {
    let mut doc = defaults().clone();
    mutate(&mut doc);
    let store = SyncStore::new();
    store.set(&doc).unwrap();
    Arc::new(store)
}

pub(super) fn make_session(store: &Arc<SyncStore>) -> ExpanderSession {
    ExpanderSession::new(store.clone())
}

/// Press the configured enable hotkey (Ctrl + enableKey).
pub(super) fn press_enable(session: &mut ExpanderSession) -> KeyResponse {
    let key = session.cache().settings.enable_key;
    session.handle_key(KeyEvent::ctrl(key), TargetKind::SingleLine)
}

/// Press the configured disable hotkey (Ctrl + disableKey).
pub(super) fn press_disable(session: &mut ExpanderSession) -> KeyResponse {
    let key = session.cache().settings.disable_key;
    session.handle_key(KeyEvent::ctrl(key), TargetKind::SingleLine)
}

/// Simulate typing into a focused field one character at a time:
/// unconsumed characters land in the field, matches are applied.
pub(super) fn type_into(
    session: &mut ExpanderSession,
    field: &mut TextField,
    text: &str,
) -> Vec<KeyResponse> {
    let mut responses = Vec::new();
    for ch in text.chars() {
        let resp = session.handle_key(KeyEvent::plain(ch), TargetKind::SingleLine);
        if let Some(replacement) = &resp.replacement {
            apply_expansion(field, replacement);
        } else if !resp.consumed {
            field.value.push(ch);
            field.caret = field.value.len();
        }
        responses.push(resp);
    }
    responses
}
