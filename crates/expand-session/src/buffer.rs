//! Incremental match buffer: extend, reset, or match on each character.

use tracing::debug;

use super::types::{KeyResponse, TargetKind};
use super::ExpanderSession;
use crate::applier::Replacement;

impl ExpanderSession {
    /// One printable character while listening. The buffer extends only
    /// while it (or the incoming character) can still begin a trigger
    /// code; an exact match emits a replacement and resets the buffer.
    ///
    /// Overlapping codes where one is a prefix of another are not
    /// disambiguated: the shorter code matches first and resets the
    /// buffer, so the longer one is unreachable as typed text continues.
    pub(super) fn handle_char(&mut self, ch: char, target: TargetKind) -> KeyResponse {
        let timer = self.rearm();

        let buffer_first = self.buffer.chars().next();
        let index = self.index();
        let in_trigger =
            buffer_first.is_some_and(|c| index.has_prefix(c)) || index.has_prefix(ch);
        if !in_trigger {
            // Ordinary text, not part of any trigger.
            self.buffer.clear();
            return KeyResponse::pass().with_timer(timer);
        }

        self.buffer.push(ch);
        let typed = self.buffer.clone();
        let Some(expansion) = self.index().expansion(&typed).map(str::to_string) else {
            return KeyResponse::pass().with_timer(timer);
        };

        debug!(trigger = %typed, "trigger matched");
        self.buffer.clear();

        if !target.is_editable() {
            // Precondition not met, not an error: the match still consumed
            // the buffer, the surface is untouched.
            return KeyResponse::pass().with_timer(timer);
        }

        let timer = self.rearm_after_expansion();
        KeyResponse {
            consumed: true,
            replacement: Some(Replacement { typed, expansion }),
            timer,
        }
    }
}
