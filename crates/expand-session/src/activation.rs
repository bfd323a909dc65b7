//! Activation state machine: enable/disable hotkeys and the inactivity
//! deactivation timer.

use expand_core::merge::FieldPatch;
use expand_core::settings::TimeoutPolicy;
use tracing::{debug, warn};

use super::types::{KeyResponse, TimerAction, TimerHandle};
use super::ExpanderSession;

impl ExpanderSession {
    pub(super) fn handle_hotkey(&mut self, ch: char, repeat: bool) -> KeyResponse {
        if !self.is_active() {
            // A held key auto-repeats its chord; only the first press toggles.
            if repeat {
                return KeyResponse::pass();
            }
            if ch == self.cache.settings.enable_key {
                return self.activate();
            }
            return KeyResponse::pass();
        }

        if ch == self.cache.settings.disable_key {
            return self.deactivate();
        }
        KeyResponse::pass()
    }

    fn activate(&mut self) -> KeyResponse {
        debug!("listening enabled");
        self.cache.active = true;
        self.persist_active(true);
        let timer = match self.cache.settings.timeout_policy() {
            TimeoutPolicy::After(ms) => TimerAction::Arm(self.arm(ms)),
            // Immediate deactivates at the next quiescent point, not at the
            // moment of activation; Never arms nothing at all.
            TimeoutPolicy::Immediate | TimeoutPolicy::Never => TimerAction::Keep,
        };
        KeyResponse::pass().with_timer(timer)
    }

    pub(super) fn deactivate(&mut self) -> KeyResponse {
        debug!("listening disabled");
        self.cache.active = false;
        self.buffer.clear();
        self.timer.cancel();
        self.persist_active(false);
        KeyResponse::pass().with_timer(TimerAction::Cancel)
    }

    /// Inactivity timeout expired. Handles from a superseded arm are
    /// ignored: a keystroke re-armed the timer after this one was
    /// scheduled.
    pub fn timer_fired(&mut self, handle: TimerHandle) -> KeyResponse {
        if !self.is_active() || !self.timer.is_live(handle) {
            return KeyResponse::pass();
        }
        debug!("inactivity timeout expired");
        self.deactivate()
    }

    /// The one shared re-arm point: every keystroke while listening resets
    /// the inactivity clock through here.
    pub(super) fn rearm(&mut self) -> TimerAction {
        match self.cache.settings.timeout_policy() {
            TimeoutPolicy::After(ms) => TimerAction::Arm(self.arm(ms)),
            TimeoutPolicy::Immediate | TimeoutPolicy::Never => TimerAction::Keep,
        }
    }

    /// Re-arm at a quiescent point (a completed expansion). This is where
    /// `timeout == 0` takes effect: deactivate now instead of waiting.
    pub(super) fn rearm_after_expansion(&mut self) -> TimerAction {
        match self.cache.settings.timeout_policy() {
            TimeoutPolicy::After(ms) => TimerAction::Arm(self.arm(ms)),
            TimeoutPolicy::Immediate => self.deactivate().timer,
            TimeoutPolicy::Never => TimerAction::Keep,
        }
    }

    fn arm(&mut self, delay_ms: u64) -> TimerHandle {
        self.timer.arm(delay_ms)
    }

    /// Persist an activation transition. A failed write is logged and the
    /// in-memory state stands; the session trusts its local state for the
    /// rest of the session and relies on eventual re-sync.
    fn persist_active(&mut self, value: bool) {
        if self.store.set_one(&FieldPatch::Active(value), true).is_none() {
            warn!(active = value, "failed to persist activation state");
        }
    }
}
