//! Tests for the input controller

use std::cell::RefCell;
use std::rc::Rc;

use crossbeam_channel::Receiver;

use super::*;
use crate::core::candidate::{Candidate, CandidateList};
use crate::core::keycode::Keysym;
use crate::core::window::{ChannelRenderer, RendererCommand};
use crate::testing::{EngineLog, FakeEngine, FakeHost, HostCall};


/// A controller wired to a scripted engine, a recording host and a renderer channel
struct Harness {
    controller: InputController,
    log: Rc<RefCell<EngineLog>>,
    host: FakeHost,
    rx: Receiver<RendererCommand>,
}

fn harness() -> Harness {
    harness_with(ControllerConfig::default())
}

fn harness_with(config: ControllerConfig) -> Harness {
    let engine = FakeEngine::new();
    let log = engine.log();
    let (renderer, rx) = ChannelRenderer::channel();
    Harness {
        controller: InputController::new(Box::new(engine), Box::new(renderer), config),
        log,
        host: FakeHost::new(),
        rx,
    }
}

impl Harness {
    /// Queue the engine's answer to the next request
    fn respond(&self, response: EngineResponse) {
        self.log.borrow_mut().push(response);
    }

    fn press(&mut self, ch: char) -> bool {
        self.press_key(Keysym(ch as u32))
    }

    fn press_key(&mut self, keysym: Keysym) -> bool {
        self.controller
            .handle_key(&RawKeyEvent::press(keysym), &mut self.host)
    }

    fn select_mode(&mut self, mode: CompositionMode) {
        self.controller
            .select_input_mode(mode.host_id(), &mut self.host);
    }

    /// Turn composition on with the kana key
    fn turn_on(&mut self) {
        self.respond(EngineResponse::consumed().with_mode(CompositionMode::Hiragana));
        assert!(self.press_key(Keysym::HIRAGANA_KATAKANA));
        assert_eq!(self.controller.mode(), CompositionMode::Hiragana);
    }

    /// Type a key the engine answers with `text` as the new preedit
    fn compose(&mut self, text: &str) {
        self.respond(EngineResponse::consumed().with_preedit(Preedit::with_text(text)));
        assert!(self.press('k'));
    }

    /// Press space; the engine answers with `text` and `candidates`
    fn convert(&mut self, text: &str, candidates: CandidateList) {
        self.respond(
            EngineResponse::consumed()
                .with_preedit(Preedit::with_text(text))
                .with_candidates(candidates),
        );
        assert!(self.press_key(Keysym::SPACE));
    }

    fn commands(&self) -> Vec<SessionCommand> {
        self.log.borrow().commands.clone()
    }

    /// Check the mode/buffer/window invariant
    fn assert_consistent(&self) {
        if !self.controller.mode().is_active() {
            assert!(self.controller.buffer().is_empty());
            assert!(!self.controller.window().is_visible());
        }
    }
}

fn three_candidates() -> CandidateList {
    CandidateList::new(
        vec![
            Candidate::new(1, "漢字"),
            Candidate::new(2, "感じ"),
            Candidate::new(3, "幹事"),
        ],
        0,
    )
}
