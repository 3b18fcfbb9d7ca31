#![allow(clippy::not_unsafe_ptr_arg_deref)]

use std::ffi::{c_char, c_double, c_int, c_uint};
use std::ptr;

use super::{KanadeSession, ffi_ref};

// --- Preedit ---

/// Check if there's a preedit update pending
#[unsafe(no_mangle)]
pub extern "C" fn kanade_session_has_preedit(session: *const KanadeSession) -> c_int {
    let session = ffi_ref!(session, 0);
    if session.host.preedit.dirty { 1 } else { 0 }
}

/// Get the current preedit text
/// Returns a pointer to a null-terminated UTF-8 string (valid until the next input call)
#[unsafe(no_mangle)]
pub extern "C" fn kanade_session_get_preedit(session: *const KanadeSession) -> *const c_char {
    let session = ffi_ref!(session, ptr::null());
    session.host.preedit.text.as_ptr()
}

/// Get the preedit length in bytes
#[unsafe(no_mangle)]
pub extern "C" fn kanade_session_get_preedit_len(session: *const KanadeSession) -> c_uint {
    let session = ffi_ref!(session, 0);
    session.host.preedit.text.as_bytes().len() as c_uint
}

/// Get the preedit caret position in bytes, or -1 to use the frontend's default
#[unsafe(no_mangle)]
pub extern "C" fn kanade_session_get_preedit_caret(session: *const KanadeSession) -> c_int {
    let session = ffi_ref!(session, -1);
    session
        .host
        .preedit
        .caret_bytes
        .map_or(-1, |caret| caret as c_int)
}

/// Get the number of preedit segments
#[unsafe(no_mangle)]
pub extern "C" fn kanade_session_get_segment_count(session: *const KanadeSession) -> c_uint {
    let session = ffi_ref!(session, 0);
    session.host.preedit.segments.len() as c_uint
}

/// Get a preedit segment's byte range and whether it is highlighted
/// Returns 1 on success, 0 if index is out of range
#[unsafe(no_mangle)]
pub extern "C" fn kanade_session_get_segment(
    session: *const KanadeSession,
    index: c_uint,
    start: *mut c_uint,
    end: *mut c_uint,
    highlighted: *mut c_int,
) -> c_int {
    let session = ffi_ref!(session, 0);
    let Some(span) = session.host.preedit.segments.get(index as usize) else {
        return 0;
    };
    // SAFETY: each out pointer is checked for null and expected to point at writable storage
    unsafe {
        if !start.is_null() {
            *start = span.start;
        }
        if !end.is_null() {
            *end = span.end;
        }
        if !highlighted.is_null() {
            *highlighted = if span.highlighted { 1 } else { 0 };
        }
    }
    1
}

// --- Commit ---

/// Check if there's a commit pending
#[unsafe(no_mangle)]
pub extern "C" fn kanade_session_has_commit(session: *const KanadeSession) -> c_int {
    let session = ffi_ref!(session, 0);
    if session.host.commit.dirty { 1 } else { 0 }
}

/// Get the commit text
#[unsafe(no_mangle)]
pub extern "C" fn kanade_session_get_commit(session: *const KanadeSession) -> *const c_char {
    let session = ffi_ref!(session, ptr::null());
    session.host.commit.c_text.as_ptr()
}

/// Get the commit text length in bytes
#[unsafe(no_mangle)]
pub extern "C" fn kanade_session_get_commit_len(session: *const KanadeSession) -> c_uint {
    let session = ffi_ref!(session, 0);
    session.host.commit.c_text.as_bytes().len() as c_uint
}

// --- Candidates ---

/// Check if there's a candidate window update pending
#[unsafe(no_mangle)]
pub extern "C" fn kanade_session_has_candidates(session: *const KanadeSession) -> c_int {
    let session = ffi_ref!(session, 0);
    if session.candidates.dirty { 1 } else { 0 }
}

/// Check if the candidate window should be shown
#[unsafe(no_mangle)]
pub extern "C" fn kanade_session_candidates_visible(session: *const KanadeSession) -> c_int {
    let session = ffi_ref!(session, 0);
    if session.candidates.visible { 1 } else { 0 }
}

/// Get the number of candidates
#[unsafe(no_mangle)]
pub extern "C" fn kanade_session_get_candidate_count(session: *const KanadeSession) -> c_uint {
    let session = ffi_ref!(session, 0);
    session.candidates.texts.len() as c_uint
}

/// Get a candidate by index
/// Returns a pointer to a null-terminated UTF-8 string, or null if index is out of range
#[unsafe(no_mangle)]
pub extern "C" fn kanade_session_get_candidate(
    session: *const KanadeSession,
    index: c_uint,
) -> *const c_char {
    let session = ffi_ref!(session, ptr::null());
    session
        .candidates
        .texts
        .get(index as usize)
        .map(|c| c.as_ptr())
        .unwrap_or(ptr::null())
}

/// Get a candidate annotation by index
/// Returns a pointer to a null-terminated UTF-8 string, or null if index is out of range
#[unsafe(no_mangle)]
pub extern "C" fn kanade_session_get_candidate_annotation(
    session: *const KanadeSession,
    index: c_uint,
) -> *const c_char {
    let session = ffi_ref!(session, ptr::null());
    session
        .candidates
        .annotations
        .get(index as usize)
        .map(|c| c.as_ptr())
        .unwrap_or(ptr::null())
}

/// Get the id to pass to `kanade_session_select_candidate` for a candidate
/// Returns the id, or -1 if index is out of range
#[unsafe(no_mangle)]
pub extern "C" fn kanade_session_get_candidate_id(
    session: *const KanadeSession,
    index: c_uint,
) -> i64 {
    let session = ffi_ref!(session, -1);
    session
        .candidates
        .ids
        .get(index as usize)
        .map_or(-1, |&id| i64::from(id))
}

/// Get the focused candidate index, or -1 if none
#[unsafe(no_mangle)]
pub extern "C" fn kanade_session_get_candidate_focused(session: *const KanadeSession) -> c_int {
    let session = ffi_ref!(session, -1);
    session
        .candidates
        .focused
        .map_or(-1, |index| index as c_int)
}

/// Get where to place the candidate window (top-left origin)
/// Returns 1 and fills the out pointers if a position is known, 0 otherwise
#[unsafe(no_mangle)]
pub extern "C" fn kanade_session_get_candidate_anchor(
    session: *const KanadeSession,
    x: *mut c_double,
    y: *mut c_double,
    width: *mut c_double,
    height: *mut c_double,
) -> c_int {
    let session = ffi_ref!(session, 0);
    let Some(rect) = session.candidates.anchor else {
        return 0;
    };
    // SAFETY: each out pointer is checked for null and expected to point at writable storage
    unsafe {
        for (out, value) in [(x, rect.x), (y, rect.y), (width, rect.width), (height, rect.height)] {
            if !out.is_null() {
                *out = value;
            }
        }
    }
    1
}

// --- Mode, links, tools ---

/// Check if the frontend's mode indicator needs updating
#[unsafe(no_mangle)]
pub extern "C" fn kanade_session_has_mode(session: *const KanadeSession) -> c_int {
    let session = ffi_ref!(session, 0);
    if session.host.mode.dirty { 1 } else { 0 }
}

/// Get the host mode id to show in the mode indicator
#[unsafe(no_mangle)]
pub extern "C" fn kanade_session_get_mode_id(session: *const KanadeSession) -> *const c_char {
    let session = ffi_ref!(session, ptr::null());
    session.host.mode.text.as_ptr()
}

/// Check if composition is on (any mode but direct input)
#[unsafe(no_mangle)]
pub extern "C" fn kanade_session_is_active(session: *const KanadeSession) -> c_int {
    let session = ffi_ref!(session, 0);
    if session.controller.mode().is_active() { 1 } else { 0 }
}

/// Check if nothing is being composed
#[unsafe(no_mangle)]
pub extern "C" fn kanade_session_is_empty(session: *const KanadeSession) -> c_int {
    let session = ffi_ref!(session, 1);
    if session.controller.buffer().is_empty() { 1 } else { 0 }
}

/// Check if there's a link to open
#[unsafe(no_mangle)]
pub extern "C" fn kanade_session_has_link(session: *const KanadeSession) -> c_int {
    let session = ffi_ref!(session, 0);
    if session.host.link.dirty { 1 } else { 0 }
}

/// Get the link to open
#[unsafe(no_mangle)]
pub extern "C" fn kanade_session_get_link(session: *const KanadeSession) -> *const c_char {
    let session = ffi_ref!(session, ptr::null());
    session.host.link.text.as_ptr()
}

/// Get the tool the frontend should launch, 0 if none
#[unsafe(no_mangle)]
pub extern "C" fn kanade_session_get_pending_tool(session: *const KanadeSession) -> c_uint {
    let session = ffi_ref!(session, 0);
    session.host.tool.map_or(0, |tool| tool.code())
}
