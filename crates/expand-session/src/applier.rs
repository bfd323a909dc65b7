//! Rewrites the focused field after a match.
//!
//! The matched keystroke is consumed, so its character was never inserted;
//! the rewrite appends it first, then replaces the first occurrence of the
//! typed trigger with the expansion.

/// A matched trigger ready to be applied: `typed` is the raw buffer
/// contents including the trailing character, exactly as the user typed
/// them (not the normalized code).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    pub typed: String,
    pub expansion: String,
}

/// A single- or multi-line text-entry surface. `caret` is a byte offset
/// into `value`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextField {
    pub value: String,
    pub caret: usize,
}

impl TextField {
    pub fn with_value(value: &str) -> Self {
        Self {
            caret: value.len(),
            value: value.to_string(),
        }
    }
}

/// Apply a matched expansion: exactly one replacement, caret left at the
/// end of the inserted expansion. If the trigger text is no longer present
/// (the field changed out from under the matcher) the field keeps the
/// trailing character and nothing else changes.
pub fn apply_expansion(field: &mut TextField, replacement: &Replacement) {
    if let Some(last) = replacement.typed.chars().last() {
        field.value.push(last);
    }
    match field.value.find(&replacement.typed) {
        Some(pos) => {
            field
                .value
                .replace_range(pos..pos + replacement.typed.len(), &replacement.expansion);
            field.caret = pos + replacement.expansion.len();
        }
        None => {
            field.caret = field.value.len();
        }
    }
}
