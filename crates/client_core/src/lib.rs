use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use shared::{
    domain::{ChatMessage, ConnectionState, StoreCredentials},
    protocol::ChatRequest,
};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

pub mod api;
pub mod render;
pub mod upload;

pub use api::{ApiFailure, AssistantApi, HttpAssistantApi};
pub use upload::{AcceptList, FileUpload, UploadError};

pub const DEFAULT_USER_ID: &str = "user_123";
pub const CONNECT_FALLBACK: &str = "Failed to connect.";
pub const CHAT_FALLBACK: &str = "An unexpected error occurred.";
pub const UPLOAD_FALLBACK: &str = "File upload failed.";
pub const DISCONNECT_NOTICE: &str = "Successfully disconnected from the store.";

const EVENT_CAPACITY: usize = 256;

/// Why a session operation did not complete: a guard refused it before sending,
/// or, for `ConnectFailed`, the assistant rejected the credentials.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("connect to a store first")]
    NotConnected,
    #[error("already connected to a store; disconnect first")]
    AlreadyConnected,
    #[error("another request is still in flight")]
    RequestInFlight,
    #[error("{0}")]
    ConnectFailed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Success,
    Error,
}

/// Inline status shown next to the connection form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub kind: StatusKind,
    pub text: String,
}

impl StatusMessage {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Error,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum SessionEvent {
    ConnectionChanged(ConnectionState),
    MessageAppended(ChatMessage),
    PendingChanged(bool),
    StatusChanged(Option<StatusMessage>),
}

/// Read-only copy of the session handed to the presentation layer.
#[derive(Debug, Clone, Default)]
pub struct SessionSnapshot {
    pub connection: ConnectionState,
    pub store_name: String,
    pub credentials: Option<StoreCredentials>,
    pub context: Option<Value>,
    pub messages: Vec<ChatMessage>,
    pub pending: bool,
    pub status: Option<StatusMessage>,
}

impl SessionSnapshot {
    pub fn is_connected(&self) -> bool {
        self.connection == ConnectionState::Connected
    }

    /// Whether chat input and file upload should accept user actions.
    pub fn input_enabled(&self) -> bool {
        self.is_connected() && !self.pending
    }

    pub fn can_connect(&self) -> bool {
        self.connection == ConnectionState::Disconnected && !self.pending
    }
}

#[derive(Default)]
struct SessionState {
    connection: ConnectionState,
    credentials: Option<StoreCredentials>,
    store_name: String,
    context: Option<Value>,
    messages: Vec<ChatMessage>,
    pending: bool,
    status: Option<StatusMessage>,
    // Bumped on every connect and disconnect so late replies can tell their session ended.
    generation: u64,
}

impl SessionState {
    fn ensure_ready(&self) -> Result<(), SessionError> {
        if self.pending {
            return Err(SessionError::RequestInFlight);
        }
        if self.connection != ConnectionState::Connected {
            return Err(SessionError::NotConnected);
        }
        Ok(())
    }
}

/// Owns the conversation and store connection; the only writer of session state.
pub struct SessionController {
    api: Arc<dyn AssistantApi>,
    user_id: String,
    inner: Mutex<SessionState>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionController {
    pub fn new(api: Arc<dyn AssistantApi>) -> Arc<Self> {
        Self::with_user_id(api, DEFAULT_USER_ID)
    }

    pub fn with_user_id(api: Arc<dyn AssistantApi>, user_id: impl Into<String>) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Arc::new(Self {
            api,
            user_id: user_id.into(),
            inner: Mutex::new(SessionState::default()),
            events,
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.state();
        SessionSnapshot {
            connection: state.connection,
            store_name: state.store_name.clone(),
            credentials: state.credentials.clone(),
            context: state.context.clone(),
            messages: state.messages.clone(),
            pending: state.pending,
            status: state.status.clone(),
        }
    }

    /// Validates `credentials` with the assistant and, on success, keeps them for chat turns.
    pub async fn connect(&self, credentials: StoreCredentials) -> Result<String, SessionError> {
        {
            let mut state = self.state();
            if state.pending {
                return Err(SessionError::RequestInFlight);
            }
            if state.connection == ConnectionState::Connected {
                return Err(SessionError::AlreadyConnected);
            }
            state.pending = true;
            state.connection = ConnectionState::Connecting;
            state.status = None;
            self.emit(SessionEvent::PendingChanged(true));
            self.emit(SessionEvent::ConnectionChanged(ConnectionState::Connecting));
            self.emit(SessionEvent::StatusChanged(None));
        }

        info!(store_url = %credentials.store_url, "connecting to store");
        let result = self.api.connect(&credentials).await;

        let mut state = self.state();
        let outcome = match result {
            Ok(response) => {
                info!(store_name = %response.store_name, "store connected");
                state.connection = ConnectionState::Connected;
                state.store_name = response.store_name.clone();
                state.credentials = Some(credentials);
                state.context = None;
                state.generation += 1;
                state.status = Some(StatusMessage::success(response.message));
                Ok(response.store_name)
            }
            Err(failure) => {
                warn!(error = %failure, "store connection failed");
                let text = failure.user_message(CONNECT_FALLBACK);
                state.connection = ConnectionState::Disconnected;
                state.status = Some(StatusMessage::error(text.clone()));
                Err(SessionError::ConnectFailed(text))
            }
        };
        state.pending = false;
        self.emit(SessionEvent::ConnectionChanged(state.connection));
        self.emit(SessionEvent::StatusChanged(state.status.clone()));
        self.emit(SessionEvent::PendingChanged(false));
        outcome
    }

    /// Drops the store connection locally. Returns `false` when there was nothing to disconnect.
    pub fn disconnect(&self) -> bool {
        let mut state = self.state();
        if state.connection != ConnectionState::Connected {
            debug!(connection = ?state.connection, "disconnect ignored");
            return false;
        }

        info!(store_name = %state.store_name, "disconnecting from store");
        state.connection = ConnectionState::Disconnected;
        state.credentials = None;
        state.store_name.clear();
        state.context = None;
        state.status = None;
        state.generation += 1;
        let notice = ChatMessage::bot(DISCONNECT_NOTICE);
        state.messages.push(notice.clone());

        self.emit(SessionEvent::ConnectionChanged(ConnectionState::Disconnected));
        self.emit(SessionEvent::StatusChanged(None));
        self.emit(SessionEvent::MessageAppended(notice));
        true
    }

    /// Sends one chat turn. `Ok(None)` means blank input was ignored; otherwise the
    /// returned message is the bot reply (or error bubble) that was appended.
    pub async fn send_message(&self, text: &str) -> Result<Option<ChatMessage>, SessionError> {
        if text.trim().is_empty() {
            debug!("ignoring blank chat input");
            return Ok(None);
        }

        let (request, generation) = {
            let mut state = self.state();
            state.ensure_ready()?;
            self.begin(&mut state, ChatMessage::user(text));
            let request = ChatRequest {
                user_id: self.user_id.clone(),
                message: text.to_string(),
                credentials: state.credentials.clone(),
                context: state.context.clone(),
            };
            (request, state.generation)
        };

        debug!(has_context = request.context.is_some(), "sending chat turn");
        let result = self.api.chat(&request).await;

        let mut state = self.state();
        let reply = match result {
            Ok(response) => {
                if state.generation == generation {
                    state.context = response.data.clone();
                } else {
                    debug!("session changed while chat was in flight; context not carried");
                }
                ChatMessage::bot_reply(response.response_text, response.intent, response.data)
            }
            Err(failure) => {
                warn!(error = %failure, "chat request failed");
                ChatMessage::bot(failure.user_message(CHAT_FALLBACK))
            }
        };
        self.finish(&mut state, reply.clone());
        Ok(Some(reply))
    }

    /// Uploads the selected file. `Ok(None)` means no file was selected.
    pub async fn upload_file(
        &self,
        file: Option<FileUpload>,
    ) -> Result<Option<ChatMessage>, SessionError> {
        let Some(file) = file else {
            debug!("no file selected for upload");
            return Ok(None);
        };

        {
            let mut state = self.state();
            state.ensure_ready()?;
            self.begin(
                &mut state,
                ChatMessage::user(format!("Uploading file: {}", file.filename)),
            );
        }

        info!(
            filename = %file.filename,
            mime_type = %file.mime_type,
            size_bytes = file.bytes.len(),
            "uploading file"
        );
        let result = self.api.upload(file).await;

        let mut state = self.state();
        let reply = match result {
            Ok(response) => ChatMessage::bot(response.message),
            Err(failure) => {
                warn!(error = %failure, "file upload failed");
                ChatMessage::bot(failure.user_message(UPLOAD_FALLBACK))
            }
        };
        self.finish(&mut state, reply.clone());
        Ok(Some(reply))
    }

    fn begin(&self, state: &mut SessionState, provisional: ChatMessage) {
        state.messages.push(provisional.clone());
        state.pending = true;
        self.emit(SessionEvent::MessageAppended(provisional));
        self.emit(SessionEvent::PendingChanged(true));
    }

    fn finish(&self, state: &mut SessionState, reply: ChatMessage) {
        state.messages.push(reply.clone());
        state.pending = false;
        self.emit(SessionEvent::MessageAppended(reply));
        self.emit(SessionEvent::PendingChanged(false));
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine; the snapshot stays authoritative.
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
