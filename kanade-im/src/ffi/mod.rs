//! C FFI interface for host integration
//!
//! This module provides C-compatible functions a native input-method
//! frontend calls into. The frontend pushes events in and then polls the
//! dirty flags for what changed (preedit, commit, candidates, mode, link,
//! tool launch).

use std::ffi::CString;
use std::sync::Once;

use crossbeam_channel::Receiver;

mod input;
mod lifecycle;
mod query;

#[cfg(test)]
mod tests;

/// Null-check + deref for `*const` FFI pointers. Returns `$default` if null.
macro_rules! ffi_ref {
    ($ptr:expr, $default:expr) => {{
        if $ptr.is_null() {
            return $default;
        }
        unsafe { &*$ptr }
    }};
}

/// Null-check + deref for `*mut` FFI pointers. Returns `$default` if null.
/// Use without default for void functions.
macro_rules! ffi_mut {
    ($ptr:expr) => {{
        if $ptr.is_null() {
            return;
        }
        unsafe { &mut *$ptr }
    }};
    ($ptr:expr, $default:expr) => {{
        if $ptr.is_null() {
            return $default;
        }
        unsafe { &mut *$ptr }
    }};
}

// Make macros available to submodules
pub(crate) use ffi_mut;
pub(crate) use ffi_ref;

use crate::client::HttpEngine;
use crate::config::Settings;
use crate::core::controller::{ControllerConfig, InputController};
use crate::core::host::{AnchorAccessor, HostClient, Rect};
use crate::core::preedit::{Annotation, Preedit};
use crate::core::protocol::ToolKind;
use crate::core::session::ConversionEngine;
use crate::core::window::{ChannelRenderer, RendererCommand};

static INIT_LOGGING: Once = Once::new();

fn init_logging() {
    INIT_LOGGING.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_writer(std::io::stderr)
            .init();
    });
}

/// One preedit segment as byte offsets into the cached text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct SegmentSpan {
    start: u32,
    end: u32,
    highlighted: bool,
}

/// Cached preedit text, caret and segments for FFI consumption.
#[derive(Default)]
struct PreeditCache {
    text: CString,
    /// Caret in bytes; `None` lets the frontend place its default caret
    caret_bytes: Option<u32>,
    segments: Vec<SegmentSpan>,
    dirty: bool,
}

/// Cached candidate window state for FFI consumption.
#[derive(Default)]
struct CandidateCache {
    texts: Vec<CString>,
    annotations: Vec<CString>,
    ids: Vec<u32>,
    focused: Option<usize>,
    anchor: Option<Rect>,
    visible: bool,
    dirty: bool,
}

/// Cached commit text for FFI consumption.
///
/// One call can commit more than once (text committed on turn-off, then a
/// result); the pieces are concatenated.
#[derive(Default)]
struct CommitCache {
    text: String,
    c_text: CString,
    dirty: bool,
}

/// A single pending string (mode id, link) for FFI consumption.
#[derive(Default)]
struct TextCache {
    text: CString,
    dirty: bool,
}

/// The frontend as seen by the controller.
///
/// Calls are recorded into caches the frontend polls afterwards. Geometry
/// comes from the last rectangle the frontend pushed.
#[derive(Default)]
struct FfiHost {
    client_id: String,
    anchor: Option<Rect>,
    screen_height: f64,
    preedit: PreeditCache,
    commit: CommitCache,
    mode: TextCache,
    link: TextCache,
    tool: Option<ToolKind>,
}

impl FfiHost {
    fn clear_flags(&mut self) {
        self.preedit.dirty = false;
        self.commit.dirty = false;
        self.commit.text.clear();
        self.mode.dirty = false;
        self.link.dirty = false;
        self.tool = None;
    }
}

impl AnchorAccessor for FfiHost {
    fn character_rect(&self, _offset: usize) -> Option<Rect> {
        self.anchor
    }

    fn screen_height(&self) -> f64 {
        self.screen_height
    }
}

impl HostClient for FfiHost {
    fn client_id(&self) -> &str {
        &self.client_id
    }

    fn insert_text(&mut self, text: &str) {
        self.commit.text.push_str(text);
        self.commit.c_text = CString::new(self.commit.text.as_str()).unwrap_or_default();
        self.commit.dirty = true;
    }

    fn set_marked_text(&mut self, preedit: &Preedit) {
        let text = preedit.text();
        let byte_offset = |chars: usize| {
            text.char_indices()
                .nth(chars)
                .map(|(i, _)| i)
                .unwrap_or(text.len()) as u32
        };
        self.preedit.caret_bytes = preedit.cursor().map(byte_offset);
        self.preedit.segments = preedit
            .attributes()
            .iter()
            .map(|attr| SegmentSpan {
                start: byte_offset(attr.start),
                end: byte_offset(attr.end),
                highlighted: attr.annotation == Annotation::Highlight,
            })
            .collect();
        self.preedit.text = CString::new(text.as_str()).unwrap_or_default();
        self.preedit.dirty = true;
    }

    fn select_input_mode(&mut self, mode_id: &str) {
        self.mode.text = CString::new(mode_id).unwrap_or_default();
        self.mode.dirty = true;
    }

    fn open_link(&mut self, url: &str) {
        self.link.text = CString::new(url).unwrap_or_default();
        self.link.dirty = true;
    }

    fn launch_tool(&mut self, tool: ToolKind) {
        self.tool = Some(tool);
    }
}

/// Opaque handle to one IME session
pub struct KanadeSession {
    controller: InputController,
    host: FfiHost,
    renderer: Receiver<RendererCommand>,
    candidates: CandidateCache,
}

impl KanadeSession {
    fn new() -> Self {
        // Load user settings from config.toml, fall back to defaults
        let settings = Settings::load().unwrap_or_else(|e| {
            tracing::warn!("Failed to load settings, using defaults: {}", e);
            Settings::default()
        });
        tracing::info!(
            "kanade session: endpoint={}, timeout={}ms",
            settings.engine.endpoint,
            settings.engine.timeout_ms
        );
        let engine = HttpEngine::from_settings(&settings.engine);
        Self::with_engine(Box::new(engine), ControllerConfig::from(&settings))
    }

    fn with_engine(engine: Box<dyn ConversionEngine>, config: ControllerConfig) -> Self {
        let (renderer, rx) = ChannelRenderer::channel();
        Self {
            controller: InputController::new(engine, Box::new(renderer), config),
            host: FfiHost::default(),
            renderer: rx,
            candidates: CandidateCache::default(),
        }
    }

    fn clear_flags(&mut self) {
        self.host.clear_flags();
        self.candidates.dirty = false;
    }

    /// Fold the renderer commands issued since the last call into the cache.
    /// Only the latest command matters; each one is complete.
    fn sync_candidates(&mut self) {
        let Some(command) = self.renderer.try_iter().last() else {
            return;
        };
        let list = &command.candidates;
        self.candidates.texts = list
            .candidates()
            .iter()
            .map(|c| CString::new(c.value.as_str()).unwrap_or_default())
            .collect();
        self.candidates.annotations = list
            .candidates()
            .iter()
            .map(|c| CString::new(c.annotation.as_deref().unwrap_or("")).unwrap_or_default())
            .collect();
        self.candidates.ids = list.candidates().iter().map(|c| c.id).collect();
        self.candidates.focused = list.focused();
        self.candidates.anchor = command.anchor;
        self.candidates.visible = command.visible;
        self.candidates.dirty = true;
    }
}
