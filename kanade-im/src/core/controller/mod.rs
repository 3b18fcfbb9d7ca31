//! Input controller - the per-session state machine
//!
//! `InputController` ties the pieces together: it translates host key
//! events, keeps the composition mode, talks to the conversion engine and
//! pushes every engine response back out to the host and the candidate
//! window.

mod mode;

#[cfg(test)]
mod tests;

use tracing::{debug, trace, warn};

use super::buffer::CompositionBuffer;
use super::candidate::CandidateId;
use super::dispatch;
use super::host::HostClient;
use super::keycode::RawKeyEvent;
use super::mode::CompositionMode;
use super::preedit::Preedit;
use super::protocol::{EngineResponse, SessionCommand, ToolKind};
use super::session::{ConversionEngine, ConversionSession};
use super::translator::{self, SpecialKey};
use super::window::{CandidateWindow, Renderer};
use crate::config::Settings;

/// Controller behavior knobs, usually taken from [`Settings`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Mode entered by a bare On key
    pub initial_mode: CompositionMode,
    /// Send the typed-input accumulator along with key requests
    pub track_original_input: bool,
    /// Keep the candidate window anchored while it stays visible
    pub freeze_position: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            initial_mode: CompositionMode::Hiragana,
            track_original_input: true,
            freeze_position: true,
        }
    }
}

impl From<&Settings> for ControllerConfig {
    fn from(settings: &Settings) -> Self {
        let initial_mode = if settings.input.initial_mode.is_active() {
            settings.input.initial_mode
        } else {
            warn!("initial_mode cannot be off, using hiragana");
            CompositionMode::Hiragana
        };
        Self {
            initial_mode,
            track_original_input: settings.input.track_original_input,
            freeze_position: settings.candidate_window.freeze_position,
        }
    }
}

/// Commands the host issues outside of key events (menus, mode indicator)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCommand {
    /// The user picked an input mode in the host's indicator
    SelectMode(String),
    /// Commit whatever is being composed
    Commit,
    /// Launch an auxiliary tool
    LaunchTool(ToolKind),
}

/// The per-session IME controller
pub struct InputController {
    session: ConversionSession,
    mode: CompositionMode,
    buffer: CompositionBuffer,
    window: CandidateWindow,
    config: ControllerConfig,
}

impl InputController {
    pub fn new(
        engine: Box<dyn ConversionEngine>,
        renderer: Box<dyn Renderer>,
        config: ControllerConfig,
    ) -> Self {
        Self {
            session: ConversionSession::new(engine),
            mode: CompositionMode::Off,
            buffer: CompositionBuffer::new(),
            window: CandidateWindow::new(renderer, config.freeze_position),
            config,
        }
    }

    pub fn mode(&self) -> CompositionMode {
        self.mode
    }

    pub fn buffer(&self) -> &CompositionBuffer {
        &self.buffer
    }

    pub fn window(&self) -> &CandidateWindow {
        &self.window
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Handle one raw host event. Returns true if it was consumed; false
    /// means the host should handle the event itself.
    pub fn handle_key(&mut self, event: &RawKeyEvent, host: &mut dyn HostClient) -> bool {
        trace!("handle_key: {:?}", event);

        let Some(key) = translator::translate(event) else {
            return false;
        };

        if !self.mode.is_active() {
            // Direct input: only the On key reaches the engine
            if key.special_key() == Some(SpecialKey::On) {
                return self.transition(self.config.initial_mode, mode::Trigger::Key, host);
            }
            return false;
        }

        match key.special_key() {
            Some(SpecialKey::Off) => {
                return self.transition(CompositionMode::HalfAscii, mode::Trigger::Key, host);
            }
            Some(SpecialKey::On) => {
                return self.transition(self.config.initial_mode, mode::Trigger::Key, host);
            }
            _ => {}
        }

        let mut original_input = if self.config.track_original_input {
            self.buffer.original_input_with(key.printable_char())
        } else {
            String::new()
        };
        let context = (!original_input.is_empty()).then_some(original_input.as_str());

        let result = self.session.send_key(&key, context);
        if self.drop_stale_composition(host) && self.config.track_original_input {
            original_input = self.buffer.original_input_with(key.printable_char());
        }
        let response = match result {
            Ok(response) => response,
            Err(e) => {
                warn!("key passed through, engine call failed: {}", e);
                return false;
            }
        };

        if !response.consumed {
            debug!("engine did not consume {:?}", key);
            return false;
        }

        if self.config.track_original_input {
            self.buffer.set_original_input(original_input);
        }
        self.apply_response(response, 0, host);
        true
    }

    /// Handle a host command
    pub fn handle_command(&mut self, command: HostCommand, host: &mut dyn HostClient) -> bool {
        debug!("handle_command: {:?}", command);
        match command {
            HostCommand::SelectMode(id) => self.select_input_mode(&id, host),
            HostCommand::Commit => {
                let composing = !self.buffer.is_empty();
                self.commit_composition(host);
                composing
            }
            HostCommand::LaunchTool(tool) => self.launch_tool(tool, host),
        }
    }

    /// The host selected an input mode by its opaque id. Returns false if
    /// the engine could not be reached and the mode did not change.
    pub fn select_input_mode(&mut self, mode_id: &str, host: &mut dyn HostClient) -> bool {
        let requested = CompositionMode::from_host_id(mode_id);
        debug!("host selected {} ({:?})", mode_id, requested);
        self.set_mode(requested, host)
    }

    /// Request a mode change on behalf of the host.
    ///
    /// `HalfAscii` with nothing composed turns composition off entirely.
    pub fn set_mode(&mut self, requested: CompositionMode, host: &mut dyn HostClient) -> bool {
        self.transition(requested, mode::Trigger::Host, host)
    }

    /// Commit the current composition as-is.
    ///
    /// Inserts the flattened preedit, tells the engine to submit, then
    /// clears the buffer and the window even if the submit failed.
    pub fn commit_composition(&mut self, host: &mut dyn HostClient) {
        if self.buffer.is_empty() {
            return;
        }

        let text = self.buffer.text();
        debug!("commit_composition: {:?}", text);
        host.insert_text(&text);

        // The response would only repeat the text inserted above
        if let Err(e) = self.session.send_command(SessionCommand::Submit) {
            warn!("submit failed, engine may still hold the composition: {}", e);
        }
        self.session.take_recreated();

        self.window.clear();
        self.buffer.clear();
        host.set_marked_text(&Preedit::new());
    }

    /// A candidate in the window was clicked. Returns false when `id` is not
    /// in the list currently shown (a stale click), the engine rejected the
    /// selection or the engine is unreachable.
    pub fn handle_selection(&mut self, id: CandidateId, host: &mut dyn HostClient) -> bool {
        if !self.window.contains(id) {
            debug!("ignoring click on unknown candidate {}", id);
            return false;
        }

        let result = self.session.send_command(SessionCommand::SelectCandidate { id });
        self.drop_stale_composition(host);
        match result {
            Ok(response) if response.consumed => {
                self.apply_response(response, 0, host);
                true
            }
            Ok(_) => {
                debug!("engine did not consume selection of candidate {}", id);
                false
            }
            Err(e) => {
                warn!("candidate selection failed: {}", e);
                false
            }
        }
    }

    /// Launch an auxiliary tool from the host menu
    pub fn launch_tool(&mut self, tool: ToolKind, host: &mut dyn HostClient) -> bool {
        if !dispatch::is_trusted_client(host.client_id()) {
            debug!("not launching {:?} in {}", tool, host.client_id());
            return false;
        }
        host.launch_tool(tool);
        true
    }

    /// Discard the composition without committing (host reset, focus moved
    /// by mouse click).
    pub fn reset(&mut self, host: &mut dyn HostClient) {
        if self.buffer.is_empty() && !self.window.is_visible() {
            return;
        }
        if let Err(e) = self.session.send_command(SessionCommand::Revert) {
            warn!("revert failed: {}", e);
        }
        self.session.take_recreated();
        self.window.clear();
        self.buffer.clear();
        host.set_marked_text(&Preedit::new());
    }

    /// The host text field lost focus: commit and hide the window
    pub fn deactivate(&mut self, host: &mut dyn HostClient) {
        self.commit_composition(host);
        self.window.clear();
    }

    /// Drop the engine session (host detached)
    pub fn detach(&mut self) {
        self.buffer.clear();
        self.window.clear();
        self.session.close();
    }

    /// After the engine recreated its session, drop the composition only the
    /// old session knew about. Returns true if the session was recreated.
    fn drop_stale_composition(&mut self, host: &mut dyn HostClient) -> bool {
        if !self.session.take_recreated() {
            return false;
        }
        warn!("engine session was recreated, dropping local composition");
        if !self.buffer.is_empty() || self.window.is_visible() {
            self.window.clear();
            self.buffer.clear();
            host.set_marked_text(&Preedit::new());
        }
        true
    }

    /// Push one engine response out to the host.
    ///
    /// Order: links, committed text and tools first, then the candidate
    /// window, then the inline composition, then any mode change the engine
    /// asked for.
    fn apply_response(&mut self, mut response: EngineResponse, depth: u8, host: &mut dyn HostClient) {
        dispatch::deliver(&mut response, host);

        self.window.update(Some(&response), &*host);

        self.buffer.rebuild(response.preedit.take());
        host.set_marked_text(self.buffer.preedit());

        if let Some(requested) = response.mode
            && requested != self.mode
        {
            self.transition(requested, mode::Trigger::Engine { depth }, host);
        }
    }
}
