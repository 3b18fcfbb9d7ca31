#![allow(clippy::not_unsafe_ptr_arg_deref)]

use super::{KanadeSession, init_logging};

/// Create a new session. The engine session itself is opened lazily on the
/// first key.
/// Returns a pointer to the session, or null on failure
#[unsafe(no_mangle)]
pub extern "C" fn kanade_session_new() -> *mut KanadeSession {
    init_logging();
    let session = Box::new(KanadeSession::new());
    Box::into_raw(session)
}

/// Destroy a session, closing its engine session
#[unsafe(no_mangle)]
pub extern "C" fn kanade_session_free(session: *mut KanadeSession) {
    if !session.is_null() {
        // SAFETY: Pointer is non-null (checked above) and was created by Box::into_raw in kanade_session_new
        let mut session = unsafe { Box::from_raw(session) };
        session.controller.detach();
    }
}
