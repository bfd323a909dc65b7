use tracing::debug_span;

use super::types::{KeyEvent, KeyResponse, TargetKind};
use super::ExpanderSession;

impl ExpanderSession {
    /// Process a key event. Returns a KeyResponse describing what the host
    /// should do with the event, the field, and the deactivation timer.
    pub fn handle_key(&mut self, event: KeyEvent, target: TargetKind) -> KeyResponse {
        let _span = debug_span!("handle_key", ?event).entered();

        match event {
            // Hotkey chords toggle listening; other chords never reach the
            // buffer (a modified key does not type text).
            KeyEvent::Char {
                ch,
                ctrl: true,
                repeat,
            } => self.handle_hotkey(ch, repeat),

            // Backspace shortens the buffer while listening; the field's
            // own deletion still happens (not consumed).
            KeyEvent::Backspace if self.is_active() => {
                self.buffer.pop();
                KeyResponse::pass().with_timer(self.rearm())
            }

            KeyEvent::Char { ch, .. } if self.is_active() => self.handle_char(ch, target),

            // Navigation and function keys still count as activity.
            KeyEvent::Other if self.is_active() => {
                KeyResponse::pass().with_timer(self.rearm())
            }

            // Everything else while inactive is ordinary typing.
            _ => KeyResponse::pass(),
        }
    }
}
