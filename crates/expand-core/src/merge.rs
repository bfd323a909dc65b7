//! Settings merge engine: partial live updates and install/upgrade migration.
//!
//! Every top-level storage key declares its merge strategy explicitly, so a
//! partial update never has to inspect value shapes at runtime. All entry
//! points are pure; the store applies their results.

use serde_json::Value;

use crate::index::normalize;
use crate::settings::{defaults, Expander, Settings, StorageSettings};

/// Top-level keys of the persisted document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    Active,
    Settings,
    Expanders,
}

/// How a key merges during a non-replacing partial update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStrategy {
    /// Scalar: the new value wins outright.
    Replace,
    /// Nested object: present fields overlay the existing object.
    ShallowMerge,
    /// List keyed by `code`: new entries append, existing codes win.
    AppendDedupByCode,
}

impl StorageKey {
    pub const ALL: [StorageKey; 3] = [StorageKey::Active, StorageKey::Settings, StorageKey::Expanders];

    /// Keys carried over verbatim on upgrade instead of reset to the
    /// template (user-authored data).
    pub const PRESERVED: [StorageKey; 1] = [StorageKey::Expanders];

    pub fn name(&self) -> &'static str {
        match self {
            StorageKey::Active => "active",
            StorageKey::Settings => "settings",
            StorageKey::Expanders => "expanders",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "active" => Some(StorageKey::Active),
            "settings" => Some(StorageKey::Settings),
            "expanders" => Some(StorageKey::Expanders),
            _ => None,
        }
    }

    pub fn strategy(&self) -> MergeStrategy {
        match self {
            StorageKey::Active => MergeStrategy::Replace,
            StorageKey::Settings => MergeStrategy::ShallowMerge,
            StorageKey::Expanders => MergeStrategy::AppendDedupByCode,
        }
    }
}

/// Field-level patch for the nested `settings` object. Absent fields keep
/// their current (or, with `replace`, default) value.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub casesensitive: Option<bool>,
    #[serde(default, rename = "prefixKey", skip_serializing_if = "Option::is_none")]
    pub prefix_key: Option<char>,
    #[serde(default, rename = "enableKey", skip_serializing_if = "Option::is_none")]
    pub enable_key: Option<char>,
    #[serde(default, rename = "disableKey", skip_serializing_if = "Option::is_none")]
    pub disable_key: Option<char>,
}

impl SettingsPatch {
    /// Shallow-merge: overlay present fields onto `base`.
    pub fn apply(&self, base: &Settings) -> Settings {
        Settings {
            timeout: self.timeout.unwrap_or(base.timeout),
            casesensitive: self.casesensitive.unwrap_or(base.casesensitive),
            prefix_key: self.prefix_key.unwrap_or(base.prefix_key),
            enable_key: self.enable_key.unwrap_or(base.enable_key),
            disable_key: self.disable_key.unwrap_or(base.disable_key),
        }
    }
}

/// A single-key partial update, tagged by the key it targets.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldPatch {
    Active(bool),
    Settings(SettingsPatch),
    Expanders(Vec<Expander>),
}

impl FieldPatch {
    pub fn key(&self) -> StorageKey {
        match self {
            FieldPatch::Active(_) => StorageKey::Active,
            FieldPatch::Settings(_) => StorageKey::Settings,
            FieldPatch::Expanders(_) => StorageKey::Expanders,
        }
    }
}

/// Merge one key into `current` per its declared strategy.
///
/// With `replace`, the strategy is bypassed: the new value wholly replaces
/// the old (a settings patch then overlays the defaults template so the
/// result is always a complete object).
pub fn set_one(current: &StorageSettings, patch: &FieldPatch, replace: bool) -> StorageSettings {
    let mut updated = current.clone();
    match patch {
        FieldPatch::Active(value) => updated.active = *value,
        FieldPatch::Settings(p) => {
            updated.settings = if replace {
                p.apply(&defaults().settings)
            } else {
                p.apply(&updated.settings)
            };
        }
        FieldPatch::Expanders(list) => {
            if replace {
                updated.expanders = dedup_by_code(list.clone(), updated.settings.casesensitive);
            } else {
                let case = updated.settings.casesensitive;
                for exp in list {
                    let code = normalize(&exp.code, case);
                    let exists = updated
                        .expanders
                        .iter()
                        .any(|e| normalize(&e.code, case) == code);
                    if !exists {
                        updated.expanders.push(exp.clone());
                    }
                }
            }
        }
    }
    updated
}

/// Whole-object partial update: every present key overwrites outright at
/// key granularity, with no nested merging.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoragePatch {
    pub active: Option<bool>,
    pub settings: Option<Settings>,
    pub expanders: Option<Vec<Expander>>,
}

pub fn set_many(current: &StorageSettings, patch: &StoragePatch) -> StorageSettings {
    StorageSettings {
        active: patch.active.unwrap_or(current.active),
        settings: patch.settings.unwrap_or(current.settings),
        expanders: patch
            .expanders
            .clone()
            .unwrap_or_else(|| current.expanders.clone()),
    }
}

/// Decode a raw stored document leniently: recognized keys overwrite the
/// defaults template, absent or undecodable keys keep their defaults.
pub fn from_stored(stored: &Value) -> StorageSettings {
    let mut doc = defaults().clone();
    let Some(obj) = stored.as_object() else {
        return doc;
    };
    if let Some(active) = obj.get("active").and_then(Value::as_bool) {
        doc.active = active;
    }
    if let Some(settings) = obj.get("settings") {
        // Back-fill: sub-keys the stored document predates stay at their
        // template values.
        if let Ok(patch) = serde_json::from_value::<SettingsPatch>(settings.clone()) {
            doc.settings = patch.apply(&doc.settings);
        }
    }
    if let Some(expanders) = obj.get("expanders") {
        if let Ok(list) = serde_json::from_value::<Vec<Expander>>(expanders.clone()) {
            doc.expanders = list;
        }
    }
    doc
}

/// Re-derive the document on extension upgrade: defaults template plus
/// everything recognizable from the stored document, preserving the
/// user-authored expander list (deduplicated by code) and never resuming
/// a listening session.
pub fn upgrade(stored: &Value) -> StorageSettings {
    let mut doc = from_stored(stored);
    doc.expanders = dedup_by_code(doc.expanders, doc.settings.casesensitive);
    doc.active = false;
    doc
}

fn dedup_by_code(list: Vec<Expander>, case_sensitive: bool) -> Vec<Expander> {
    let mut seen = std::collections::HashSet::new();
    list.into_iter()
        .filter(|exp| seen.insert(normalize(&exp.code, case_sensitive)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn exp(code: &str, expanded: &str) -> Expander {
        Expander {
            code: code.to_string(),
            expanded: expanded.to_string(),
            tags: Vec::new(),
        }
    }

    #[test]
    fn strategies_per_key() {
        assert_eq!(StorageKey::Active.strategy(), MergeStrategy::Replace);
        assert_eq!(StorageKey::Settings.strategy(), MergeStrategy::ShallowMerge);
        assert_eq!(
            StorageKey::Expanders.strategy(),
            MergeStrategy::AppendDedupByCode
        );
    }

    #[test]
    fn key_names_round_trip() {
        for key in StorageKey::ALL {
            assert_eq!(StorageKey::from_name(key.name()), Some(key));
        }
        assert_eq!(StorageKey::from_name("icon"), None);
    }

    #[test]
    fn set_one_active_replaces() {
        let current = defaults().clone();
        let updated = set_one(&current, &FieldPatch::Active(true), false);
        assert!(updated.active);
        assert_eq!(updated.expanders, current.expanders);
    }

    #[test]
    fn set_one_settings_shallow_merges() {
        let current = defaults().clone();
        let patch = FieldPatch::Settings(SettingsPatch {
            timeout: Some(9000),
            ..SettingsPatch::default()
        });
        let updated = set_one(&current, &patch, false);
        assert_eq!(updated.settings.timeout, 9000);
        assert_eq!(updated.settings.enable_key, current.settings.enable_key);
        assert_eq!(updated.settings.disable_key, current.settings.disable_key);
        assert_eq!(updated.settings.casesensitive, current.settings.casesensitive);
        assert_eq!(updated.settings.prefix_key, current.settings.prefix_key);
    }

    #[test]
    fn set_one_settings_replace_overlays_defaults() {
        let mut current = defaults().clone();
        current.settings.timeout = 1234;
        current.settings.casesensitive = true;
        let patch = FieldPatch::Settings(SettingsPatch {
            timeout: Some(9000),
            ..SettingsPatch::default()
        });
        let updated = set_one(&current, &patch, true);
        assert_eq!(updated.settings.timeout, 9000);
        // Fields absent from the patch come from the template, not `current`.
        assert!(!updated.settings.casesensitive);
    }

    #[test]
    fn set_one_expanders_append_never_overwrites_existing() {
        let current = defaults().clone();
        let patch = FieldPatch::Expanders(vec![
            exp("/exp", "CLOBBERED"),
            exp("/new", "New Entry:"),
        ]);
        let updated = set_one(&current, &patch, false);
        assert_eq!(updated.expanders.len(), 3);
        // Existing entry wins, new code appended.
        assert_eq!(updated.expanders[0].expanded, "General Expense Fee:");
        assert_eq!(updated.expanders[2].code, "/new");
    }

    #[test]
    fn set_one_expanders_dedup_respects_case_rule() {
        let current = defaults().clone(); // casesensitive = false
        let patch = FieldPatch::Expanders(vec![exp("/EXP", "upper")]);
        let updated = set_one(&current, &patch, false);
        assert_eq!(updated.expanders.len(), 2);
    }

    #[test]
    fn set_one_expanders_replace_swaps_list() {
        let current = defaults().clone();
        let patch = FieldPatch::Expanders(vec![exp("/only", "x")]);
        let updated = set_one(&current, &patch, true);
        assert_eq!(updated.expanders.len(), 1);
        assert_eq!(updated.expanders[0].code, "/only");
    }

    #[test]
    fn set_many_overwrites_present_keys_only() {
        let current = defaults().clone();
        let updated = set_many(
            &current,
            &StoragePatch {
                active: Some(true),
                settings: None,
                expanders: Some(vec![exp("/a", "b")]),
            },
        );
        assert!(updated.active);
        assert_eq!(updated.settings, current.settings);
        assert_eq!(updated.expanders.len(), 1);
    }

    #[test]
    fn upgrade_preserves_user_expanders_verbatim() {
        let stored = json!({
            "active": true,
            "settings": { "timeout": 9000 },
            "expanders": [
                { "code": "/mine", "expanded": "Mine:", "tags": ["work"] }
            ]
        });
        let doc = upgrade(&stored);
        assert_eq!(doc.expanders.len(), 1);
        assert_eq!(doc.expanders[0].code, "/mine");
        assert_eq!(doc.expanders[0].tags, vec!["work".to_string()]);
        // Stored settings overwrite the template, missing sub-keys back-fill.
        assert_eq!(doc.settings.timeout, 9000);
        assert_eq!(doc.settings.enable_key, '[');
        // Never resumes a listening session.
        assert!(!doc.active);
    }

    #[test]
    fn upgrade_missing_keys_fall_back_to_defaults() {
        let doc = upgrade(&json!({}));
        assert_eq!(&doc, defaults());
        let doc = upgrade(&Value::Null);
        assert_eq!(&doc, defaults());
    }

    #[test]
    fn upgrade_dedups_stored_expanders_by_code() {
        let stored = json!({
            "expanders": [
                { "code": "/a", "expanded": "first" },
                { "code": "/A", "expanded": "second" }
            ]
        });
        let doc = upgrade(&stored);
        assert_eq!(doc.expanders.len(), 1);
        assert_eq!(doc.expanders[0].expanded, "first");
    }

    #[test]
    fn upgrade_is_idempotent_on_own_output() {
        let stored = json!({
            "active": true,
            "settings": { "timeout": 250, "casesensitive": true },
            "expanders": [ { "code": "/k", "expanded": "v" } ]
        });
        let once = upgrade(&stored);
        let twice = upgrade(&serde_json::to_value(&once).unwrap());
        assert_eq!(once, twice);
    }

    #[test]
    fn from_stored_ignores_undecodable_values() {
        let stored = json!({
            "active": "yes",
            "settings": 42,
            "expanders": "nope"
        });
        let doc = from_stored(&stored);
        assert_eq!(&doc, defaults());
    }
}
