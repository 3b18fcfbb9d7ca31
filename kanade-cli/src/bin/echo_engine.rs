use anyhow::Context;
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};
use clap::Parser;
use kanade_im::core::candidate::{CandidateId, CandidateList};
use kanade_im::core::mode::CompositionMode;
use kanade_im::core::preedit::{Preedit, Segment};
use kanade_im::core::protocol::{EngineResponse, KeyRequest, SessionCreated, SessionCommand};
use kanade_im::core::translator::SpecialKey;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockWriteGuard};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Echo conversion engine for exercising the IME bridge
#[derive(Parser, Debug)]
#[command(name = "kanade-echo-engine")]
#[command(about = "Reference conversion engine that echoes what is typed", long_about = None)]
struct Args {
    /// Enable verbose logging (debug level)
    #[arg(short, long)]
    verbose: bool,

    /// Port to listen on
    #[arg(short, long, default_value = "7450")]
    port: u16,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,
}

/// One engine-side session: the text typed so far and the open candidate list
#[derive(Debug)]
struct EchoSession {
    mode: CompositionMode,
    composing: String,
    candidates: Option<CandidateList>,
}

impl Default for EchoSession {
    fn default() -> Self {
        Self {
            mode: CompositionMode::Off,
            composing: String::new(),
            candidates: None,
        }
    }
}

impl EchoSession {
    fn handle_key(&mut self, request: &KeyRequest) -> EngineResponse {
        let key = &request.key;
        if let Some(original) = &request.original_input {
            tracing::trace!("original input {:?}", original);
        }

        match key.special_key() {
            Some(SpecialKey::On) => {
                self.mode = key.mode().unwrap_or(CompositionMode::Hiragana);
                return self.state().with_mode(self.mode);
            }
            Some(SpecialKey::Off) => {
                let result = self.take_composing();
                self.mode = CompositionMode::HalfAscii;
                let response = self.state().with_mode(self.mode);
                return match result {
                    Some(text) => response.with_result(text),
                    None => response,
                };
            }
            _ => {}
        }

        if !self.mode.is_active() {
            return EngineResponse::not_consumed();
        }

        if let Some(ch) = key.printable_char() {
            self.composing.push(ch);
            self.candidates = None;
            return self.state();
        }

        // Everything below only acts on a composition
        if self.composing.is_empty() {
            return EngineResponse::not_consumed();
        }

        match key.special_key() {
            Some(SpecialKey::Space) => self.offer_candidates(),
            Some(SpecialKey::Enter) => self.submit(),
            Some(SpecialKey::Escape) => {
                if self.candidates.take().is_none() {
                    self.composing.clear();
                }
                self.state()
            }
            Some(SpecialKey::Backspace) => {
                self.composing.pop();
                self.candidates = None;
                self.state()
            }
            _ => self.state(),
        }
    }

    fn handle_command(&mut self, command: &SessionCommand) -> EngineResponse {
        match command {
            SessionCommand::Submit => self.submit(),
            SessionCommand::SelectCandidate { id } => self.select(*id),
            SessionCommand::SwitchInputMode { mode } => {
                self.mode = *mode;
                self.state()
            }
            SessionCommand::Revert => {
                self.composing.clear();
                self.candidates = None;
                self.state()
            }
        }
    }

    fn offer_candidates(&mut self) -> EngineResponse {
        let mut values = vec![
            self.composing.clone(),
            to_full_width(&self.composing),
            self.composing.to_uppercase(),
        ];
        values.dedup();
        let list = CandidateList::from_values(values, 0).with_focused(0);
        self.candidates = Some(list);
        self.state()
    }

    fn select(&mut self, id: CandidateId) -> EngineResponse {
        let picked = self
            .candidates
            .as_ref()
            .and_then(|list| list.get(id))
            .map(|candidate| candidate.value.clone());
        match picked {
            Some(value) => {
                self.composing = value;
                self.candidates = None;
            }
            None => tracing::debug!("ignoring unknown candidate {}", id),
        }
        self.state()
    }

    fn submit(&mut self) -> EngineResponse {
        match self.take_composing() {
            Some(text) => self.state().with_result(text),
            None => self.state(),
        }
    }

    fn take_composing(&mut self) -> Option<String> {
        self.candidates = None;
        if self.composing.is_empty() {
            return None;
        }
        Some(std::mem::take(&mut self.composing))
    }

    /// Consumed response describing the current composition
    fn state(&self) -> EngineResponse {
        let mut response = EngineResponse::consumed();
        if self.composing.is_empty() {
            return response;
        }
        response = match &self.candidates {
            Some(list) => response
                .with_preedit(Preedit::from_segments(
                    vec![Segment::highlighted(self.composing.as_str())],
                    None,
                ))
                .with_candidates(list.clone()),
            None => response.with_preedit(Preedit::with_text(self.composing.as_str())),
        };
        response
    }
}

/// ASCII to full-width forms (U+FF01..U+FF5E), space to the ideographic space
fn to_full_width(text: &str) -> String {
    text.chars()
        .map(|ch| match ch {
            ' ' => '\u{3000}',
            '!'..='~' => char::from_u32(ch as u32 + 0xFEE0).unwrap_or(ch),
            _ => ch,
        })
        .collect()
}

#[derive(Default)]
struct Sessions {
    next_id: u64,
    sessions: HashMap<u64, EchoSession>,
}

#[derive(Clone, Default)]
struct AppState {
    sessions: Arc<RwLock<Sessions>>,
}

impl AppState {
    fn lock(&self) -> Result<RwLockWriteGuard<'_, Sessions>, StatusCode> {
        self.sessions.write().map_err(|e| {
            tracing::error!("session table poisoned: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    // Default: info level, with --verbose: debug level
    let default_filter = if args.verbose {
        "kanade_echo_engine=debug,tower_http=debug"
    } else {
        "kanade_echo_engine=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let app = router(AppState::default());

    // Start server
    let bind_addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Echo engine listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .await
        .context("failed to run server")?;
    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/sessions", post(create_handler))
        .route("/v1/sessions/{id}", delete(delete_handler))
        .route("/v1/sessions/{id}/key", post(key_handler))
        .route("/v1/sessions/{id}/command", post(command_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "kanade-echo-engine"
    }))
}

async fn create_handler(State(state): State<AppState>) -> Result<Json<SessionCreated>, StatusCode> {
    let mut table = state.lock()?;
    table.next_id += 1;
    let session_id = table.next_id;
    table.sessions.insert(session_id, EchoSession::default());
    tracing::info!("session {} created", session_id);
    Ok(Json(SessionCreated { session_id }))
}

async fn delete_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<StatusCode, StatusCode> {
    let mut table = state.lock()?;
    match table.sessions.remove(&id) {
        Some(_) => {
            tracing::info!("session {} deleted", id);
            Ok(StatusCode::NO_CONTENT)
        }
        None => Err(StatusCode::NOT_FOUND),
    }
}

async fn key_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(req): Json<KeyRequest>,
) -> Result<Json<EngineResponse>, StatusCode> {
    let mut table = state.lock()?;
    let session = table.sessions.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    tracing::debug!("session {}: key {:?}", id, req.key);
    Ok(Json(session.handle_key(&req)))
}

async fn command_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(command): Json<SessionCommand>,
) -> Result<Json<EngineResponse>, StatusCode> {
    let mut table = state.lock()?;
    let session = table.sessions.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    tracing::debug!("session {}: command {:?}", id, command);
    Ok(Json(session.handle_command(&command)))
}
