//! Core IME bridge functionality
//!
//! This module contains the mode state machine, the engine session and the
//! composition/candidate synchronization logic. Host and renderer specifics
//! live behind the traits in [`host`] and [`window`].

pub mod buffer;
pub mod candidate;
pub mod controller;
pub mod dispatch;
pub mod host;
pub mod keycode;
pub mod mode;
pub mod preedit;
pub mod protocol;
pub mod session;
pub mod translator;
pub mod window;
