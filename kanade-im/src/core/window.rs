//! Candidate window controller
//!
//! Owns what the candidate renderer shows: visibility, the candidate list and
//! the on-screen anchor. The renderer itself is external and only ever
//! receives complete [`RendererCommand`]s.

use crossbeam_channel::{Receiver, Sender};
use tracing::{debug, trace, warn};

use super::candidate::{CandidateId, CandidateList};
use super::host::{AnchorAccessor, Rect};
use super::protocol::EngineResponse;

/// One complete renderer update
#[derive(Debug, Clone, PartialEq)]
pub struct RendererCommand {
    pub visible: bool,
    /// Anchor rectangle in renderer coordinates (top-left origin)
    pub anchor: Option<Rect>,
    pub candidates: CandidateList,
    /// The engine output this update was derived from, for display details
    pub output: Option<EngineResponse>,
}

/// Candidate renderer. Commands are fire-and-forget and must be idempotent.
pub trait Renderer {
    fn exec(&mut self, command: RendererCommand);
}

/// Renderer that forwards every command over a channel.
///
/// The receiving end belongs to whatever actually draws (a renderer process
/// bridge, the FFI caches, a terminal printer).
pub struct ChannelRenderer {
    tx: Sender<RendererCommand>,
}

impl ChannelRenderer {
    pub fn channel() -> (Self, Receiver<RendererCommand>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (Self { tx }, rx)
    }
}

impl Renderer for ChannelRenderer {
    fn exec(&mut self, command: RendererCommand) {
        if self.tx.send(command).is_err() {
            trace!("renderer channel closed, dropping command");
        }
    }
}

/// What the renderer currently shows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RendererState {
    pub visible: bool,
    pub anchor: Option<Rect>,
    pub candidates: CandidateList,
}

/// Candidate window controller
pub struct CandidateWindow {
    state: RendererState,
    renderer: Box<dyn Renderer>,
    /// Keep the anchor fixed while the window stays visible
    freeze_position: bool,
}

impl CandidateWindow {
    pub fn new(renderer: Box<dyn Renderer>, freeze_position: bool) -> Self {
        Self {
            state: RendererState::default(),
            renderer,
            freeze_position,
        }
    }

    pub fn state(&self) -> &RendererState {
        &self.state
    }

    pub fn is_visible(&self) -> bool {
        self.state.visible
    }

    /// True if `id` is in the list currently shown
    pub fn contains(&self, id: CandidateId) -> bool {
        self.state.candidates.contains(id)
    }

    /// Apply an engine output, or clear with `None`.
    ///
    /// The anchor is only recomputed when the window goes from hidden to
    /// shown: several hosts report unstable coordinates while the window is
    /// up, and moving it on every keystroke makes it jitter.
    pub fn update(&mut self, output: Option<&EngineResponse>, accessor: &dyn AnchorAccessor) {
        let Some(output) = output else {
            self.clear();
            return;
        };

        let candidates = output.candidates.clone().unwrap_or_default();
        let visible = !candidates.is_empty();
        let anchor = if visible && (!self.state.visible || !self.freeze_position) {
            self.query_anchor(&candidates, accessor)
        } else {
            self.state.anchor
        };

        self.state = RendererState {
            visible,
            anchor,
            candidates,
        };
        self.send(Some(output.clone()));
    }

    /// Hide the window and drop its content
    pub fn clear(&mut self) {
        self.state.visible = false;
        self.state.candidates = CandidateList::default();
        self.send(None);
    }

    fn query_anchor(&self, candidates: &CandidateList, accessor: &dyn AnchorAccessor) -> Option<Rect> {
        match accessor.character_rect(candidates.position()) {
            Some(rect) if !rect.is_degenerate() => {
                let anchor = rect.flip_vertical(accessor.screen_height());
                debug!("candidate window anchored at {:?}", anchor);
                Some(anchor)
            }
            other => {
                warn!(
                    "no usable bounds for offset {} ({:?}), keeping last position",
                    candidates.position(),
                    other
                );
                self.state.anchor
            }
        }
    }

    fn send(&mut self, output: Option<EngineResponse>) {
        self.renderer.exec(RendererCommand {
            visible: self.state.visible,
            anchor: self.state.anchor,
            candidates: self.state.candidates.clone(),
            output,
        });
    }
}
