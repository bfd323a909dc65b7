//! Derived view of the expander list used by the match buffer.
//!
//! Pure function of the expander list and the case-sensitivity flag; the
//! session rebuilds it lazily after either changes. Membership tests are
//! O(1) afterward.

use std::collections::{HashMap, HashSet};

use crate::settings::Expander;

/// Normalize a code or typed buffer for comparison under the case rule.
pub fn normalize(text: &str, case_sensitive: bool) -> String {
    if case_sensitive {
        text.to_string()
    } else {
        text.to_lowercase()
    }
}

#[derive(Debug, Clone, Default)]
pub struct TriggerIndex {
    /// Normalized code -> expansion text. Duplicate codes collapse to the
    /// first occurrence, matching the append-dedup merge policy.
    expansions: HashMap<String, String>,
    /// First characters of every normalized code.
    prefixes: HashSet<char>,
    case_sensitive: bool,
}

impl TriggerIndex {
    pub fn build(expanders: &[Expander], case_sensitive: bool) -> Self {
        let mut expansions = HashMap::new();
        let mut prefixes = HashSet::new();
        for exp in expanders {
            let code = normalize(&exp.code, case_sensitive);
            let Some(first) = code.chars().next() else {
                continue;
            };
            prefixes.insert(first);
            expansions
                .entry(code)
                .or_insert_with(|| exp.expanded.clone());
        }
        Self {
            expansions,
            prefixes,
            case_sensitive,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.expansions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.expansions.len()
    }

    /// All normalized codes, unordered.
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.expansions.keys().map(String::as_str)
    }

    /// Whether `ch` is the first character of any known code.
    pub fn has_prefix(&self, ch: char) -> bool {
        let ch = if self.case_sensitive {
            ch
        } else {
            ch.to_lowercase().next().unwrap_or(ch)
        };
        self.prefixes.contains(&ch)
    }

    /// Whether `text` begins with a known prefix character.
    /// Empty text has no first character and never qualifies.
    pub fn starts_known(&self, text: &str) -> bool {
        text.chars().next().is_some_and(|c| self.has_prefix(c))
    }

    /// Exact-match lookup: the expansion for `typed` if it equals a known
    /// code under the case rule.
    pub fn expansion(&self, typed: &str) -> Option<&str> {
        self.expansions
            .get(&normalize(typed, self.case_sensitive))
            .map(String::as_str)
    }
}
