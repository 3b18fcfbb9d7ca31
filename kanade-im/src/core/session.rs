//! Conversion session: the logical session with the out-of-process engine

use std::time::Duration;

use tracing::{debug, info, warn};

use super::protocol::{EngineResponse, KeyRequest, SessionCommand};
use super::translator::NormalizedKeyEvent;

/// Engine-assigned session identifier
pub type SessionId = u64;

/// Failures talking to the engine. None of these are fatal: the caller
/// treats the key as not consumed and leaves its state alone.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("engine unreachable: {0}")]
    Transport(String),

    #[error("engine did not answer within {0:?}")]
    Timeout(Duration),

    #[error("session {0} is unknown to the engine")]
    SessionNotFound(SessionId),

    #[error("malformed engine response: {0}")]
    Protocol(String),
}

/// Transport to a conversion engine.
///
/// Every call blocks until the engine answers or the transport gives up.
pub trait ConversionEngine {
    fn create_session(&mut self) -> Result<SessionId, SessionError>;

    fn delete_session(&mut self, id: SessionId) -> Result<(), SessionError>;

    fn send_key(
        &mut self,
        id: SessionId,
        request: &KeyRequest,
    ) -> Result<EngineResponse, SessionError>;

    fn send_command(
        &mut self,
        id: SessionId,
        command: &SessionCommand,
    ) -> Result<EngineResponse, SessionError>;
}

/// One host attachment's session with the engine.
///
/// The engine-side session is created lazily on the first request and reused
/// afterwards. If the engine forgets it (restart), it is recreated once, the
/// resume key (if any) is replayed on the new session, and the request is
/// retried. Taking `&mut self` keeps a single request in flight.
pub struct ConversionSession {
    engine: Box<dyn ConversionEngine>,
    id: Option<SessionId>,
    /// Key that puts a fresh engine session into the caller's mode
    resume: Option<NormalizedKeyEvent>,
    /// Set when the engine session was recreated; cleared by `take_recreated`
    recreated: bool,
}

impl ConversionSession {
    pub fn new(engine: Box<dyn ConversionEngine>) -> Self {
        Self {
            engine,
            id: None,
            resume: None,
            recreated: false,
        }
    }

    /// Key sent first on a recreated engine session, usually the turn-on
    /// signal for the current mode. `None` while composition is off.
    pub fn set_resume_key(&mut self, key: Option<NormalizedKeyEvent>) {
        self.resume = key;
    }

    /// True once after the engine session was recreated. Whatever the old
    /// session was composing is gone.
    pub fn take_recreated(&mut self) -> bool {
        std::mem::take(&mut self.recreated)
    }

    /// Current engine session id, if one has been created
    pub fn id(&self) -> Option<SessionId> {
        self.id
    }

    fn ensure(&mut self) -> Result<SessionId, SessionError> {
        if let Some(id) = self.id {
            return Ok(id);
        }
        let id = self.engine.create_session()?;
        info!("engine session {} created", id);
        self.id = Some(id);
        Ok(id)
    }

    fn call<F>(&mut self, mut request: F) -> Result<EngineResponse, SessionError>
    where
        F: FnMut(&mut dyn ConversionEngine, SessionId) -> Result<EngineResponse, SessionError>,
    {
        let id = self.ensure()?;
        match request(self.engine.as_mut(), id) {
            Err(SessionError::SessionNotFound(lost)) => {
                warn!("engine lost session {}, recreating", lost);
                self.id = None;
                self.recreated = true;
                let id = self.ensure()?;
                if let Some(key) = &self.resume {
                    let resume = KeyRequest {
                        key: key.clone(),
                        original_input: None,
                    };
                    // Only the engine's mode matters here, not its answer
                    self.engine.send_key(id, &resume)?;
                }
                request(self.engine.as_mut(), id)
            }
            other => other,
        }
    }

    /// Send a key event
    pub fn send_key(
        &mut self,
        key: &NormalizedKeyEvent,
        original_input: Option<&str>,
    ) -> Result<EngineResponse, SessionError> {
        let request = KeyRequest {
            key: key.clone(),
            original_input: original_input.map(str::to_owned),
        };
        debug!("send_key: {:?}", request);
        let response = self.call(|engine, id| engine.send_key(id, &request))?;
        debug!("send_key response: {:?}", response);
        Ok(response)
    }

    /// Send an explicit command
    pub fn send_command(&mut self, command: SessionCommand) -> Result<EngineResponse, SessionError> {
        debug!("send_command: {:?}", command);
        let response = self.call(|engine, id| engine.send_command(id, &command))?;
        debug!("send_command response: {:?}", response);
        Ok(response)
    }

    /// Delete the engine-side session. Errors are logged, not returned.
    pub fn close(&mut self) {
        if let Some(id) = self.id.take()
            && let Err(e) = self.engine.delete_session(id)
        {
            debug!("failed to delete engine session {}: {}", id, e);
        }
    }
}
