use crate::applier::Replacement;

/// A keyboard event as seen by the page context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEvent {
    /// A printable character, with the hotkey modifier and auto-repeat
    /// flags from the originating event.
    Char { ch: char, ctrl: bool, repeat: bool },
    Backspace,
    /// Navigation, function keys, bare modifiers: nothing the matcher
    /// cares about.
    Other,
}

impl KeyEvent {
    pub fn plain(ch: char) -> Self {
        KeyEvent::Char {
            ch,
            ctrl: false,
            repeat: false,
        }
    }

    pub fn ctrl(ch: char) -> Self {
        KeyEvent::Char {
            ch,
            ctrl: true,
            repeat: false,
        }
    }
}

/// What kind of surface currently holds focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    SingleLine,
    MultiLine,
    /// Plain text elsewhere is untouched; an expansion here is a no-op.
    NonEditable,
}

impl TargetKind {
    pub fn is_editable(&self) -> bool {
        matches!(self, TargetKind::SingleLine | TargetKind::MultiLine)
    }
}

/// Handle to one scheduled deactivation. Re-arming bumps the generation, so
/// a callback holding a superseded handle is rejected by `timer_fired`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerHandle {
    pub(crate) generation: u64,
    pub delay_ms: u64,
}

/// Timer instruction for the host, which owns the real clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerAction {
    /// Leave any scheduled deactivation as-is.
    Keep,
    /// Schedule `timer_fired(handle)` after `handle.delay_ms`; any earlier
    /// schedule is superseded.
    Arm(TimerHandle),
    /// Drop any scheduled deactivation.
    Cancel,
}

/// Response from `handle_key` / `timer_fired`, returned to the host.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyResponse {
    /// When true the host must prevent the event's default insertion.
    pub consumed: bool,
    /// A matched expansion to apply to the focused field.
    pub replacement: Option<Replacement>,
    pub timer: TimerAction,
}

impl KeyResponse {
    pub(crate) fn pass() -> Self {
        Self {
            consumed: false,
            replacement: None,
            timer: TimerAction::Keep,
        }
    }

    pub(crate) fn with_timer(mut self, timer: TimerAction) -> Self {
        self.timer = timer;
        self
    }
}

/// The single pending deactivation per context. Arming or cancelling bumps
/// the generation, so duplicate timers can never accumulate: at most one
/// handle is ever live.
pub(crate) struct DeactivationTimer {
    generation: u64,
    armed: bool,
}

impl DeactivationTimer {
    pub(crate) fn new() -> Self {
        Self {
            generation: 0,
            armed: false,
        }
    }

    pub(crate) fn arm(&mut self, delay_ms: u64) -> TimerHandle {
        self.generation += 1;
        self.armed = true;
        TimerHandle {
            generation: self.generation,
            delay_ms,
        }
    }

    pub(crate) fn cancel(&mut self) {
        self.generation += 1;
        self.armed = false;
    }

    pub(crate) fn is_live(&self, handle: TimerHandle) -> bool {
        self.armed && handle.generation == self.generation
    }
}
