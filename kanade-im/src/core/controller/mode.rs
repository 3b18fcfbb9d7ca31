//! Mode transitions (Off, Active(mode))

use tracing::{debug, info, warn};

use super::*;
use crate::core::translator::NormalizedKeyEvent;

/// How deep engine-driven mode changes may chain before they are ignored
const MAX_RESPONSE_DEPTH: u8 = 3;

/// Who asked for a mode change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Trigger {
    /// The host's mode indicator; the host already shows the new mode
    Host,
    /// A mode key typed by the user
    Key,
    /// The `mode` field of an engine response, `depth` responses deep
    Engine { depth: u8 },
}

impl Trigger {
    fn depth(self) -> u8 {
        match self {
            Trigger::Engine { depth } => depth,
            Trigger::Host | Trigger::Key => 0,
        }
    }
}

impl InputController {
    /// Move to `requested`, talking to the engine as the transition needs.
    ///
    /// Returns false if the engine could not be reached and the mode stayed
    /// where it was. Leaving composition always succeeds locally.
    pub(super) fn transition(
        &mut self,
        requested: CompositionMode,
        trigger: Trigger,
        host: &mut dyn HostClient,
    ) -> bool {
        let target = if requested == CompositionMode::HalfAscii && self.buffer.is_empty() {
            if let Trigger::Engine { .. } = trigger {
                warn!("engine asked for half_ascii with nothing composed, turning off");
            }
            CompositionMode::Off
        } else {
            requested
        };

        if target == self.mode {
            return true;
        }

        let depth = trigger.depth();
        if target.is_active() && depth >= MAX_RESPONSE_DEPTH {
            warn!(
                "ignoring engine mode change to {:?}: too many chained mode changes",
                target
            );
            return false;
        }

        let from = self.mode;
        let applied = match (from.is_active(), target.is_active()) {
            (false, _) => self.turn_on(target, depth, host),
            (true, false) => {
                self.turn_off(host);
                true
            }
            (true, true) => self.switch_input_mode(target, depth, host),
        };

        if applied {
            info!("mode {:?} -> {:?}", from, self.mode);
        }
        if trigger != Trigger::Host || self.mode != requested {
            host.select_input_mode(self.mode.host_id());
        }
        applied
    }

    /// Off → Active: the engine hears the turn-on key before any other key
    fn turn_on(&mut self, target: CompositionMode, depth: u8, host: &mut dyn HostClient) -> bool {
        match self.session.send_key(&NormalizedKeyEvent::turn_on(target), None) {
            Ok(response) => {
                self.enter_mode(target);
                self.drop_stale_composition(host);
                if response.consumed {
                    self.apply_response(response, depth + 1, host);
                } else {
                    debug!("engine did not consume turn-on for {:?}", target);
                }
                true
            }
            Err(e) => {
                warn!("could not turn on {:?}, staying off: {}", target, e);
                false
            }
        }
    }

    /// Active → Off. Any text the engine commits on the way out is inserted
    /// before the composition is dropped.
    fn turn_off(&mut self, host: &mut dyn HostClient) {
        match self.session.send_key(&NormalizedKeyEvent::turn_off(), None) {
            Ok(mut response) => {
                if let Some(text) = response.result.take() {
                    host.insert_text(&text);
                }
            }
            Err(e) => warn!("turn-off not acknowledged by engine: {}", e),
        }

        self.session.take_recreated();
        self.buffer.clear();
        host.set_marked_text(self.buffer.preedit());
        self.window.clear();
        self.enter_mode(CompositionMode::Off);
    }

    /// Record the new mode. A recreated engine session is turned on into it
    /// before anything else is sent.
    fn enter_mode(&mut self, mode: CompositionMode) {
        self.mode = mode;
        self.session
            .set_resume_key(mode.is_active().then(|| NormalizedKeyEvent::turn_on(mode)));
    }

    /// Active(A) → Active(B)
    fn switch_input_mode(
        &mut self,
        target: CompositionMode,
        depth: u8,
        host: &mut dyn HostClient,
    ) -> bool {
        match self
            .session
            .send_command(SessionCommand::SwitchInputMode { mode: target })
        {
            Ok(response) => {
                self.enter_mode(target);
                self.drop_stale_composition(host);
                if response.consumed {
                    self.apply_response(response, depth + 1, host);
                } else {
                    debug!("engine did not consume switch to {:?}", target);
                }
                true
            }
            Err(e) => {
                warn!("could not switch to {:?}: {}", target, e);
                false
            }
        }
    }
}
