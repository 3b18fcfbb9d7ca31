use super::*;
use input::*;
use lifecycle::*;
use query::*;
use std::cell::RefCell;
use std::ffi::{CStr, c_char};
use std::ptr;
use std::rc::Rc;

use crate::core::candidate::CandidateList;
use crate::core::mode::CompositionMode;
use crate::core::preedit::Segment;
use crate::core::protocol::EngineResponse;
use crate::testing::{EngineLog, FakeEngine};

// XKB keysyms for common keys
const XKB_KEY_K: u32 = 0x6b;
const XKB_KEY_SPACE: u32 = 0x20;
const XKB_KEY_RETURN: u32 = 0xff0d;
const XKB_KEY_KANA: u32 = 0xff27;
const XKB_KEY_SHIFT_L: u32 = 0xffe1;
const SHIFT_MASK: u32 = crate::core::keycode::KeyModifiers::SHIFT_MASK;

/// RAII wrapper around a raw `KanadeSession` pointer backed by a scripted engine.
/// Automatically frees the session on drop, preventing leaks in tests.
struct TestSession {
    ptr: *mut KanadeSession,
    log: Rc<RefCell<EngineLog>>,
}

impl TestSession {
    fn new() -> Self {
        let engine = FakeEngine::new();
        let log = engine.log();
        let session = KanadeSession::with_engine(Box::new(engine), ControllerConfig::default());
        Self {
            ptr: Box::into_raw(Box::new(session)),
            log,
        }
    }

    fn ptr(&self) -> *mut KanadeSession {
        self.ptr
    }

    fn respond(&self, response: EngineResponse) {
        self.log.borrow_mut().push(response);
    }

    /// Send a key press event. Returns true if consumed.
    fn press(&self, keysym: u32) -> bool {
        kanade_session_process_key(self.ptr, keysym, 0, KANADE_EVENT_KEY_DOWN) == 1
    }

    /// Turn composition on with the engine answering `preedit`
    fn turn_on(&self) {
        self.respond(EngineResponse::consumed().with_mode(CompositionMode::Hiragana));
        assert!(self.press(XKB_KEY_KANA));
    }

    fn compose(&self, text: &str) {
        self.respond(EngineResponse::consumed().with_preedit(Preedit::with_text(text)));
        assert!(self.press(XKB_KEY_K));
    }

    fn str_at(ptr: *const c_char) -> &'static str {
        if ptr.is_null() {
            return "";
        }
        unsafe { CStr::from_ptr(ptr) }.to_str().unwrap()
    }

    fn preedit(&self) -> &str {
        Self::str_at(kanade_session_get_preedit(self.ptr))
    }

    fn commit_text(&self) -> &str {
        Self::str_at(kanade_session_get_commit(self.ptr))
    }

    fn candidate(&self, index: u32) -> &str {
        Self::str_at(kanade_session_get_candidate(self.ptr, index))
    }

    fn mode_id(&self) -> &str {
        Self::str_at(kanade_session_get_mode_id(self.ptr))
    }

    fn has_preedit(&self) -> bool {
        kanade_session_has_preedit(self.ptr) == 1
    }

    fn has_commit(&self) -> bool {
        kanade_session_has_commit(self.ptr) == 1
    }

    fn has_candidates(&self) -> bool {
        kanade_session_has_candidates(self.ptr) == 1
    }
}

impl Drop for TestSession {
    fn drop(&mut self) {
        kanade_session_free(self.ptr);
    }
}

#[test]
fn test_session_lifecycle() {
    let session = kanade_session_new();
    assert!(!session.is_null());
    kanade_session_free(session);
}

#[test]
fn test_null_session_safety() {
    // All functions should handle null safely
    assert_eq!(
        kanade_session_process_key(ptr::null_mut(), XKB_KEY_K, 0, KANADE_EVENT_KEY_DOWN),
        0
    );
    assert_eq!(kanade_session_has_preedit(ptr::null()), 0);
    assert!(kanade_session_get_preedit(ptr::null()).is_null());
    assert_eq!(kanade_session_get_preedit_len(ptr::null()), 0);
    assert_eq!(kanade_session_get_preedit_caret(ptr::null()), -1);
    assert_eq!(kanade_session_has_commit(ptr::null()), 0);
    assert!(kanade_session_get_commit(ptr::null()).is_null());
    assert_eq!(kanade_session_has_candidates(ptr::null()), 0);
    assert_eq!(kanade_session_get_candidate_count(ptr::null()), 0);
    assert_eq!(kanade_session_get_candidate_id(ptr::null(), 0), -1);
    assert!(kanade_session_get_mode_id(ptr::null()).is_null());
    assert_eq!(kanade_session_get_pending_tool(ptr::null()), 0);
    assert_eq!(kanade_session_commit(ptr::null_mut()), 0);
    assert_eq!(kanade_session_select_candidate(ptr::null_mut(), 1), 0);
    kanade_session_select_mode(ptr::null_mut(), ptr::null());
    kanade_session_set_client_id(ptr::null_mut(), ptr::null());
    kanade_session_set_anchor_rect(ptr::null_mut(), 0.0, 0.0, 1.0, 1.0, 1.0);
    kanade_session_reset(ptr::null_mut());
    kanade_session_deactivate(ptr::null_mut());
    kanade_session_free(ptr::null_mut());
}

#[test]
fn test_keys_pass_through_while_off() {
    let s = TestSession::new();
    assert!(!s.press(XKB_KEY_K));
    assert!(!s.has_preedit());
    assert_eq!(s.log.borrow().requests(), 0);
}

#[test]
fn test_turn_on_reports_mode() {
    let s = TestSession::new();
    s.respond(EngineResponse::consumed().with_preedit(Preedit::with_text("か")));
    assert!(s.press(XKB_KEY_KANA));

    assert_eq!(kanade_session_is_active(s.ptr()), 1);
    assert_eq!(kanade_session_has_mode(s.ptr()), 1);
    assert_eq!(s.mode_id(), CompositionMode::Hiragana.host_id());
    assert!(s.has_preedit());
    assert_eq!(s.preedit(), "か");
    assert_eq!(kanade_session_get_preedit_len(s.ptr()), 3); // "か" is 3 bytes in UTF-8
    assert_eq!(kanade_session_get_preedit_caret(s.ptr()), 3);
}

#[test]
fn test_flags_cleared_between_calls() {
    let s = TestSession::new();
    s.turn_on();
    s.compose("か");
    assert!(s.has_preedit());

    // A modifier-only event changes nothing
    assert_eq!(
        kanade_session_process_key(s.ptr(), XKB_KEY_SHIFT_L, SHIFT_MASK, KANADE_EVENT_MODIFIER_CHANGE),
        0
    );
    assert!(!s.has_preedit());
    assert_eq!(kanade_session_has_mode(s.ptr()), 0);
    // The cached text is still readable
    assert_eq!(s.preedit(), "か");
}

#[test]
fn test_unknown_event_kind_ignored() {
    let s = TestSession::new();
    assert_eq!(kanade_session_process_key(s.ptr(), XKB_KEY_KANA, 0, 42), 0);
    assert_eq!(s.log.borrow().requests(), 0);
}

#[test]
fn test_preedit_segments_in_bytes() {
    let s = TestSession::new();
    s.turn_on();
    s.respond(EngineResponse::consumed().with_preedit(Preedit::from_segments(
        vec![Segment::highlighted("漢字"), Segment::underlined("を")],
        None,
    )));
    assert!(s.press(XKB_KEY_SPACE));

    assert_eq!(s.preedit(), "漢字を");
    assert_eq!(kanade_session_get_preedit_caret(s.ptr()), -1);
    assert_eq!(kanade_session_get_segment_count(s.ptr()), 2);

    let (mut start, mut end, mut highlighted) = (0u32, 0u32, 0i32);
    assert_eq!(
        kanade_session_get_segment(s.ptr(), 0, &mut start, &mut end, &mut highlighted),
        1
    );
    assert_eq!((start, end, highlighted), (0, 6, 1));
    assert_eq!(
        kanade_session_get_segment(s.ptr(), 1, &mut start, &mut end, &mut highlighted),
        1
    );
    assert_eq!((start, end, highlighted), (6, 9, 0));
    assert_eq!(
        kanade_session_get_segment(s.ptr(), 2, ptr::null_mut(), ptr::null_mut(), ptr::null_mut()),
        0
    );
}

#[test]
fn test_commit() {
    let s = TestSession::new();
    s.turn_on();
    s.compose("かな");

    assert_eq!(kanade_session_commit(s.ptr()), 1);
    assert!(s.has_commit());
    assert_eq!(s.commit_text(), "かな");
    assert_eq!(kanade_session_get_commit_len(s.ptr()), 6);
    assert!(s.has_preedit());
    assert_eq!(kanade_session_get_preedit_len(s.ptr()), 0);
    assert_eq!(kanade_session_is_empty(s.ptr()), 1);

    // Nothing left to commit
    assert_eq!(kanade_session_commit(s.ptr()), 0);
    assert!(!s.has_commit());
}

#[test]
fn test_engine_result_committed_on_enter() {
    let s = TestSession::new();
    s.turn_on();
    s.compose("かな");
    s.respond(EngineResponse::consumed().with_result("かな"));
    assert!(s.press(XKB_KEY_RETURN));
    assert!(s.has_commit());
    assert_eq!(s.commit_text(), "かな");
    assert_eq!(kanade_session_get_preedit_len(s.ptr()), 0);
}

#[test]
fn test_candidates_and_anchor() {
    let s = TestSession::new();
    kanade_session_set_anchor_rect(s.ptr(), 10.0, 500.0, 1.0, 20.0, 800.0);
    s.turn_on();
    s.respond(
        EngineResponse::consumed()
            .with_preedit(Preedit::with_text("かんじ"))
            .with_candidates(CandidateList::from_values(["漢字", "感じ"], 0).with_focused(1)),
    );
    assert!(s.press(XKB_KEY_SPACE));

    assert!(s.has_candidates());
    assert_eq!(kanade_session_candidates_visible(s.ptr()), 1);
    assert_eq!(kanade_session_get_candidate_count(s.ptr()), 2);
    assert_eq!(s.candidate(0), "漢字");
    assert_eq!(s.candidate(1), "感じ");
    assert!(kanade_session_get_candidate(s.ptr(), 2).is_null());
    assert_eq!(kanade_session_get_candidate_id(s.ptr(), 1), 1);
    assert_eq!(kanade_session_get_candidate_focused(s.ptr()), 1);

    let (mut x, mut y, mut w, mut h) = (0.0, 0.0, 0.0, 0.0);
    assert_eq!(
        kanade_session_get_candidate_anchor(s.ptr(), &mut x, &mut y, &mut w, &mut h),
        1
    );
    assert_eq!((x, y, w, h), (10.0, 280.0, 1.0, 20.0));
}

#[test]
fn test_select_candidate() {
    let s = TestSession::new();
    s.turn_on();
    s.respond(
        EngineResponse::consumed()
            .with_preedit(Preedit::with_text("かんじ"))
            .with_candidates(CandidateList::from_values(["漢字", "感じ"], 0)),
    );
    assert!(s.press(XKB_KEY_SPACE));

    // Unknown id is ignored
    assert_eq!(kanade_session_select_candidate(s.ptr(), 7), 0);
    assert!(!s.has_candidates());

    s.respond(EngineResponse::consumed().with_preedit(Preedit::with_text("感じ")));
    assert_eq!(kanade_session_select_candidate(s.ptr(), 1), 1);
    assert_eq!(s.preedit(), "感じ");
    assert!(s.has_candidates());
    assert_eq!(kanade_session_candidates_visible(s.ptr()), 0);
}

#[test]
fn test_select_mode_by_host_id() {
    let s = TestSession::new();
    let id = std::ffi::CString::new(CompositionMode::FullKatakana.host_id()).unwrap();
    kanade_session_select_mode(s.ptr(), id.as_ptr());
    assert_eq!(kanade_session_is_active(s.ptr()), 1);
    // The host chose the mode itself, nothing to echo back
    assert_eq!(kanade_session_has_mode(s.ptr()), 0);

    let unknown = std::ffi::CString::new("org.example.other").unwrap();
    kanade_session_select_mode(s.ptr(), unknown.as_ptr());
    assert_eq!(kanade_session_is_active(s.ptr()), 0);
}

#[test]
fn test_link_suppressed_in_untrusted_client() {
    let s = TestSession::new();
    s.turn_on();
    s.respond(EngineResponse::consumed().with_url("https://example.com"));
    assert!(s.press(XKB_KEY_K));
    assert_eq!(kanade_session_has_link(s.ptr()), 1);
    assert_eq!(
        TestSession::str_at(kanade_session_get_link(s.ptr())),
        "https://example.com"
    );

    let client = std::ffi::CString::new("com.apple.loginwindow").unwrap();
    kanade_session_set_client_id(s.ptr(), client.as_ptr());
    s.respond(EngineResponse::consumed().with_url("https://example.com"));
    assert!(s.press(XKB_KEY_K));
    assert_eq!(kanade_session_has_link(s.ptr()), 0);
}

#[test]
fn test_launch_tool() {
    let s = TestSession::new();
    assert_eq!(kanade_session_launch_tool(s.ptr(), ToolKind::WordRegister.code()), 1);
    assert_eq!(
        kanade_session_get_pending_tool(s.ptr()),
        ToolKind::WordRegister.code()
    );
    assert_eq!(kanade_session_launch_tool(s.ptr(), 99), 0);
    assert_eq!(kanade_session_get_pending_tool(s.ptr()), 0);
}

#[test]
fn test_reset() {
    let s = TestSession::new();
    s.turn_on();
    s.respond(
        EngineResponse::consumed()
            .with_preedit(Preedit::with_text("かんじ"))
            .with_candidates(CandidateList::from_values(["漢字"], 0)),
    );
    assert!(s.press(XKB_KEY_SPACE));

    kanade_session_reset(s.ptr());

    // Everything should be cleared
    assert_eq!(kanade_session_get_preedit_len(s.ptr()), 0);
    assert!(!s.has_preedit());
    assert!(!s.has_commit());
    assert!(!s.has_candidates());
    assert_eq!(kanade_session_get_candidate_count(s.ptr()), 0);
    assert_eq!(kanade_session_is_empty(s.ptr()), 1);
}

#[test]
fn test_deactivate_commits() {
    let s = TestSession::new();
    s.turn_on();
    s.compose("か");
    kanade_session_deactivate(s.ptr());
    assert!(s.has_commit());
    assert_eq!(s.commit_text(), "か");
}

#[test]
fn test_cstring_null_termination() {
    let s = TestSession::new();
    s.turn_on();
    s.compose("か");

    // Verify the pointer is valid and null-terminated
    let preedit_ptr = kanade_session_get_preedit(s.ptr());
    assert!(!preedit_ptr.is_null());

    // This should not crash - CStr::from_ptr requires null termination
    let preedit = unsafe { CStr::from_ptr(preedit_ptr) };
    assert!(!preedit.to_str().unwrap().is_empty());
}
