//! Test doubles shared by the unit tests: a scripted engine and a recording host.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use crate::core::host::{AnchorAccessor, HostClient, Rect};
use crate::core::preedit::Preedit;
use crate::core::protocol::{EngineResponse, KeyRequest, SessionCommand, ToolKind};
use crate::core::session::{ConversionEngine, SessionError, SessionId};

/// Everything the fake engine saw, plus knobs to make it misbehave
#[derive(Debug, Default)]
pub(crate) struct EngineLog {
    pub sessions_created: u32,
    pub sessions_deleted: Vec<SessionId>,
    pub keys: Vec<KeyRequest>,
    pub commands: Vec<SessionCommand>,
    /// Scripted responses, consumed in order; `consumed()` once exhausted
    pub responses: VecDeque<EngineResponse>,
    /// Fail the next key/command with a transport error
    pub fail_next: bool,
    /// Fail every call, including session creation
    pub fail_all: bool,
    /// Answer the next key/command with SessionNotFound
    pub forget_session: bool,
}

impl EngineLog {
    pub fn push(&mut self, response: EngineResponse) {
        self.responses.push_back(response);
    }

    /// Total requests answered (keys + commands)
    pub fn requests(&self) -> usize {
        self.keys.len() + self.commands.len()
    }
}

/// Scripted in-process engine
pub(crate) struct FakeEngine {
    log: Rc<RefCell<EngineLog>>,
    next_id: SessionId,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self {
            log: Rc::new(RefCell::new(EngineLog::default())),
            next_id: 1,
        }
    }

    pub fn log(&self) -> Rc<RefCell<EngineLog>> {
        Rc::clone(&self.log)
    }

    fn check(&mut self, id: SessionId) -> Result<(), SessionError> {
        let mut log = self.log.borrow_mut();
        if log.fail_all {
            return Err(SessionError::Transport("connection refused".to_string()));
        }
        if log.fail_next {
            log.fail_next = false;
            return Err(SessionError::Transport("connection reset".to_string()));
        }
        if log.forget_session {
            log.forget_session = false;
            return Err(SessionError::SessionNotFound(id));
        }
        Ok(())
    }

    fn next_response(&self) -> EngineResponse {
        self.log
            .borrow_mut()
            .responses
            .pop_front()
            .unwrap_or_else(EngineResponse::consumed)
    }
}

impl ConversionEngine for FakeEngine {
    fn create_session(&mut self) -> Result<SessionId, SessionError> {
        let mut log = self.log.borrow_mut();
        if log.fail_all {
            return Err(SessionError::Transport("connection refused".to_string()));
        }
        log.sessions_created += 1;
        let id = self.next_id;
        self.next_id += 1;
        Ok(id)
    }

    fn delete_session(&mut self, id: SessionId) -> Result<(), SessionError> {
        self.log.borrow_mut().sessions_deleted.push(id);
        Ok(())
    }

    fn send_key(
        &mut self,
        id: SessionId,
        request: &KeyRequest,
    ) -> Result<EngineResponse, SessionError> {
        self.check(id)?;
        self.log.borrow_mut().keys.push(request.clone());
        Ok(self.next_response())
    }

    fn send_command(
        &mut self,
        id: SessionId,
        command: &SessionCommand,
    ) -> Result<EngineResponse, SessionError> {
        self.check(id)?;
        self.log.borrow_mut().commands.push(command.clone());
        Ok(self.next_response())
    }
}

/// One recorded host call
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum HostCall {
    Insert(String),
    Marked(String, Option<usize>),
    SelectMode(String),
    OpenLink(String),
    LaunchTool(ToolKind),
}

/// Host that records every call
pub(crate) struct FakeHost {
    pub client_id: String,
    pub rect: Option<Rect>,
    pub screen_height: f64,
    pub rect_queries: Cell<u32>,
    pub calls: Vec<HostCall>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self {
            client_id: "org.example.editor".to_string(),
            rect: Some(Rect::new(0.0, 0.0, 1.0, 18.0)),
            screen_height: 800.0,
            rect_queries: Cell::new(0),
            calls: Vec::new(),
        }
    }

    /// Texts passed to `insert_text`, in order
    pub fn inserted(&self) -> Vec<String> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                HostCall::Insert(text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    /// Mode ids passed to `select_input_mode`, in order
    pub fn selected_modes(&self) -> Vec<String> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                HostCall::SelectMode(id) => Some(id.clone()),
                _ => None,
            })
            .collect()
    }

    /// The inline composition as last set
    pub fn marked_text(&self) -> Option<String> {
        self.calls.iter().rev().find_map(|c| match c {
            HostCall::Marked(text, _) => Some(text.clone()),
            _ => None,
        })
    }
}

impl AnchorAccessor for FakeHost {
    fn character_rect(&self, _offset: usize) -> Option<Rect> {
        self.rect_queries.set(self.rect_queries.get() + 1);
        self.rect
    }

    fn screen_height(&self) -> f64 {
        self.screen_height
    }
}

impl HostClient for FakeHost {
    fn client_id(&self) -> &str {
        &self.client_id
    }

    fn insert_text(&mut self, text: &str) {
        self.calls.push(HostCall::Insert(text.to_string()));
    }

    fn set_marked_text(&mut self, preedit: &Preedit) {
        self.calls
            .push(HostCall::Marked(preedit.text(), preedit.cursor()));
    }

    fn select_input_mode(&mut self, mode_id: &str) {
        self.calls.push(HostCall::SelectMode(mode_id.to_string()));
    }

    fn open_link(&mut self, url: &str) {
        self.calls.push(HostCall::OpenLink(url.to_string()));
    }

    fn launch_tool(&mut self, tool: ToolKind) {
        self.calls.push(HostCall::LaunchTool(tool));
    }
}
