#![allow(clippy::not_unsafe_ptr_arg_deref)]

use std::ffi::{CStr, c_char, c_double, c_int, c_uint};

use crate::core::host::Rect;
use crate::core::keycode::{EventKind, KeyModifiers, Keysym, RawKeyEvent};
use crate::core::protocol::ToolKind;

use super::{CandidateCache, KanadeSession, PreeditCache, ffi_mut};

/// Event kinds accepted by `kanade_session_process_key`
pub const KANADE_EVENT_KEY_DOWN: c_int = 0;
pub const KANADE_EVENT_MODIFIER_CHANGE: c_int = 1;
pub const KANADE_EVENT_CURSOR_UPDATE: c_int = 2;

/// Read a C string argument. Null or invalid UTF-8 yields None.
fn c_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    // SAFETY: ptr is non-null (checked above) and expected to be a valid C string from the frontend
    match unsafe { CStr::from_ptr(ptr) }.to_str() {
        Ok(s) => Some(s),
        Err(e) => {
            tracing::warn!("invalid UTF-8 from frontend: {}", e);
            None
        }
    }
}

/// Process a key event
/// Returns 1 if the key was consumed, 0 if the frontend should handle it
#[unsafe(no_mangle)]
pub extern "C" fn kanade_session_process_key(
    session: *mut KanadeSession,
    keysym: c_uint,
    state: c_uint,
    event_kind: c_int,
) -> c_int {
    let session = ffi_mut!(session, 0);
    session.clear_flags();

    let kind = match event_kind {
        KANADE_EVENT_KEY_DOWN => EventKind::KeyDown,
        KANADE_EVENT_MODIFIER_CHANGE => EventKind::ModifierChange,
        KANADE_EVENT_CURSOR_UPDATE => EventKind::CursorUpdate,
        other => {
            tracing::debug!("unknown event kind {}, ignoring", other);
            return 0;
        }
    };
    let modifiers = KeyModifiers::from_modifier_state(state);
    let event = RawKeyEvent::new(kind, Keysym(keysym), modifiers);

    let consumed = session.controller.handle_key(&event, &mut session.host);
    session.sync_candidates();

    if consumed { 1 } else { 0 }
}

/// Select an input mode by its host mode id (e.g. from the mode menu)
#[unsafe(no_mangle)]
pub extern "C" fn kanade_session_select_mode(session: *mut KanadeSession, mode_id: *const c_char) {
    let session = ffi_mut!(session);
    session.clear_flags();
    // An unreadable id maps to direct input like any unknown id
    let mode_id = c_str(mode_id).unwrap_or("");
    session
        .controller
        .select_input_mode(mode_id, &mut session.host);
    session.sync_candidates();
}

/// Commit the current composition
/// Returns 1 if text was committed, 0 otherwise
#[unsafe(no_mangle)]
pub extern "C" fn kanade_session_commit(session: *mut KanadeSession) -> c_int {
    let session = ffi_mut!(session, 0);
    session.clear_flags();
    session.controller.commit_composition(&mut session.host);
    session.sync_candidates();
    if session.host.commit.dirty { 1 } else { 0 }
}

/// A candidate was clicked in the candidate window
/// Returns 1 if the selection was sent to the engine, 0 if it was ignored
#[unsafe(no_mangle)]
pub extern "C" fn kanade_session_select_candidate(session: *mut KanadeSession, id: c_uint) -> c_int {
    let session = ffi_mut!(session, 0);
    session.clear_flags();
    let sent = session.controller.handle_selection(id, &mut session.host);
    session.sync_candidates();
    if sent { 1 } else { 0 }
}

/// Launch an auxiliary tool by code (1 config, 2 dictionary tool, 3 word
/// register, 4 character palette, 5 about)
/// Returns 1 if the launch was requested, 0 otherwise. Poll
/// `kanade_session_get_pending_tool` for the request.
#[unsafe(no_mangle)]
pub extern "C" fn kanade_session_launch_tool(session: *mut KanadeSession, code: c_uint) -> c_int {
    let session = ffi_mut!(session, 0);
    session.clear_flags();
    let Some(tool) = ToolKind::from_code(code) else {
        tracing::debug!("unknown tool code {}", code);
        return 0;
    };
    if session.controller.launch_tool(tool, &mut session.host) { 1 } else { 0 }
}

/// Set the identifier of the application owning the focused text field
#[unsafe(no_mangle)]
pub extern "C" fn kanade_session_set_client_id(session: *mut KanadeSession, client_id: *const c_char) {
    let session = ffi_mut!(session);
    session.host.client_id = c_str(client_id).unwrap_or("").to_string();
}

/// Set the caret rectangle (host coordinates, bottom-left origin) and the
/// height of the screen it is on. Used when the candidate window opens.
#[unsafe(no_mangle)]
pub extern "C" fn kanade_session_set_anchor_rect(
    session: *mut KanadeSession,
    x: c_double,
    y: c_double,
    width: c_double,
    height: c_double,
    screen_height: c_double,
) {
    let session = ffi_mut!(session);
    session.host.anchor = Some(Rect::new(x, y, width, height));
    session.host.screen_height = screen_height;
}

/// Focus left the text field: commit and hide the candidate window
#[unsafe(no_mangle)]
pub extern "C" fn kanade_session_deactivate(session: *mut KanadeSession) {
    let session = ffi_mut!(session);
    session.clear_flags();
    session.controller.deactivate(&mut session.host);
    session.sync_candidates();
}

/// Discard the composition without committing
#[unsafe(no_mangle)]
pub extern "C" fn kanade_session_reset(session: *mut KanadeSession) {
    let session = ffi_mut!(session);
    session.controller.reset(&mut session.host);
    session.host.preedit = PreeditCache::default();
    session.candidates = CandidateCache::default();
    session.host.clear_flags();
    // Drop renderer commands the reset itself produced
    session.renderer.try_iter().for_each(drop);
}
