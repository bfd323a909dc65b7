//! Persisted settings model and embedded defaults template.
//!
//! - `defaults()` returns `&'static StorageSettings` (lazy-init singleton)
//! - Default values are embedded via `include_str!("default_settings.toml")`
//! - The same document round-trips as JSON in the synced store, so field
//!   names carry serde renames matching the persisted keys.

use std::collections::HashSet;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

pub const DEFAULT_SETTINGS_TOML: &str = include_str!("default_settings.toml");

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("TOML parse error: {0}")]
    Parse(String),
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// A single trigger-code -> replacement entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expander {
    pub code: String,
    pub expanded: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Matching and hotkey configuration nested under the `settings` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub timeout: i64,
    pub casesensitive: bool,
    #[serde(rename = "prefixKey")]
    pub prefix_key: char,
    #[serde(rename = "enableKey")]
    pub enable_key: char,
    #[serde(rename = "disableKey")]
    pub disable_key: char,
}

/// Three-way deactivation timeout semantics carried by `Settings::timeout`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutPolicy {
    /// `-1`: never auto-deactivate.
    Never,
    /// `0`: deactivate at the next quiescent point.
    Immediate,
    /// `> 0`: deactivate after this many milliseconds of inactivity.
    After(u64),
}

impl Settings {
    pub fn timeout_policy(&self) -> TimeoutPolicy {
        match self.timeout {
            t if t < 0 => TimeoutPolicy::Never,
            0 => TimeoutPolicy::Immediate,
            t => TimeoutPolicy::After(t as u64),
        }
    }
}

/// The complete persisted document: one logical owner (the synced store),
/// one in-memory mirror per open context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageSettings {
    pub active: bool,
    pub settings: Settings,
    /// Absent in a stored document reads as empty, not as a parse error.
    #[serde(default)]
    pub expanders: Vec<Expander>,
}

/// Get the defaults template parsed from the embedded TOML.
pub fn defaults() -> &'static StorageSettings {
    static INSTANCE: OnceLock<StorageSettings> = OnceLock::new();
    INSTANCE.get_or_init(|| {
        parse_settings_toml(DEFAULT_SETTINGS_TOML).expect("embedded defaults TOML must be valid")
    })
}

pub fn parse_settings_toml(toml_str: &str) -> Result<StorageSettings, SettingsError> {
    let s: StorageSettings =
        toml::from_str(toml_str).map_err(|e| SettingsError::Parse(e.to_string()))?;
    validate(&s)?;
    Ok(s)
}

fn validate(s: &StorageSettings) -> Result<(), SettingsError> {
    if s.settings.timeout < -1 {
        return Err(SettingsError::InvalidValue {
            field: "settings.timeout".to_string(),
            reason: "must be -1, 0, or a positive millisecond count".to_string(),
        });
    }

    // Codes must be unique under the active case rule.
    let mut seen = HashSet::new();
    for exp in &s.expanders {
        if exp.code.is_empty() {
            return Err(SettingsError::InvalidValue {
                field: "expanders.code".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        let code = if s.settings.casesensitive {
            exp.code.clone()
        } else {
            exp.code.to_lowercase()
        };
        if !seen.insert(code) {
            return Err(SettingsError::InvalidValue {
                field: "expanders.code".to_string(),
                reason: format!("duplicate code '{}'", exp.code),
            });
        }
    }

    Ok(())
}
