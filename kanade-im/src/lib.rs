//! kanade-im: client-side bridge of a Japanese input method
//!
//! This crate sits between a text-input host (the editor or OS input
//! framework) and an out-of-process conversion engine. It owns the
//! composition-mode state machine, the request/response session with the
//! engine, and keeps the inline composition and candidate window in sync.

pub mod client;
pub mod config;
pub mod core;
pub mod ffi;

#[cfg(test)]
pub(crate) mod testing;

pub use core::controller::{ControllerConfig, HostCommand, InputController};
pub use core::keycode::{EventKind, KeyModifiers, Keysym, RawKeyEvent};
pub use core::mode::CompositionMode;
pub use core::protocol::{EngineResponse, SessionCommand, ToolKind};
