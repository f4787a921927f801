//! Turn progression for one intake conversation.
//!
//! A turn is split into [`ConversationSession::begin_turn`] and
//! [`ConversationSession::complete_turn`] so that a host sharing sessions
//! between requests can release its lock while the model call is in flight
//! and still reject a second submission with [`SessionError::Busy`].

pub mod registry;

pub use registry::{SessionRegistry, SessionSnapshot};

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::ChatConfig;
use crate::llm::{
    models::{ChatOptions, ChatResponse, Message},
    LlmError, LlmProvider,
};
use crate::protocol::{self, Extraction};
use crate::store::{Ticket, TicketStore};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "kebab-case")]
pub enum SessionState {
    /// Only the canned greeting has been exchanged.
    Idle,
    AwaitingModel,
    Ready,
    /// The last model call failed. `unsent` is the user text that was rolled
    /// back out of the transcript.
    Failed { reason: String, unsent: String },
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("A reply is still being generated for this session")]
    Busy,
    #[error("Session has an uncleared error: {0}")]
    NotCleared(String),
    #[error("Message is empty")]
    EmptyMessage,
    #[error("No model call is in flight")]
    NoTurnInFlight,
    #[error("Model call failed: {0}")]
    Model(String),
    #[error("Session {0} not found")]
    NotFound(Uuid),
    #[error("Session registry lock poisoned")]
    Poisoned,
    #[error("Turn task ended abnormally: {0}")]
    TurnAborted(String),
}

/// Result of a successful turn.
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    /// The assistant's raw completion, marker included.
    pub reply: String,
    /// Set only on the turn that created the session's ticket.
    pub ticket: Option<Ticket>,
}

/// Everything a turn needs besides the session itself.
#[derive(Clone)]
pub struct SessionContext {
    pub llm: Arc<dyn LlmProvider>,
    pub store: Arc<dyn TicketStore>,
    pub options: ChatOptions,
    pub timeout: Duration,
    pub greeting: String,
}

impl SessionContext {
    pub fn new(llm: Arc<dyn LlmProvider>, store: Arc<dyn TicketStore>, chat: &ChatConfig) -> Self {
        Self {
            llm,
            store,
            options: ChatOptions {
                model: None,
                temperature: chat.temperature,
                max_tokens: chat.max_tokens,
                system_prompt: Some(protocol::system_policy()),
            },
            timeout: Duration::from_secs(chat.request_timeout_secs),
            greeting: chat.greeting.clone(),
        }
    }

    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.options.model = model;
        self
    }

    /// Sends the transcript with the system policy, bounded by the timeout.
    pub async fn dispatch(&self, messages: &[Message]) -> Result<ChatResponse, LlmError> {
        let call = self.llm.chat(messages, self.options.clone());
        let response = match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result?,
            Err(_) => return Err(LlmError::Timeout(self.timeout.as_secs())),
        };

        match &response.usage {
            Some(usage) => debug!(
                "{} answered with {} ({} prompt / {} completion tokens)",
                self.llm.name(),
                response.model,
                usage.input_tokens,
                usage.output_tokens
            ),
            None => debug!("{} answered with {}", self.llm.name(), response.model),
        }
        Ok(response)
    }

    pub fn new_session(&self) -> ConversationSession {
        ConversationSession::new(&self.greeting)
    }
}

#[derive(Debug, Clone)]
pub struct ConversationSession {
    id: Uuid,
    transcript: Vec<Message>,
    state: SessionState,
    ticket: Option<Ticket>,
}

impl ConversationSession {
    pub fn new(greeting: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            transcript: vec![Message::assistant(greeting)],
            state: SessionState::Idle,
            ticket: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn ticket(&self) -> Option<&Ticket> {
        self.ticket.as_ref()
    }

    pub fn ticket_created(&self) -> bool {
        self.ticket.is_some()
    }

    /// Appends the user's message and marks the session busy. Returns the
    /// transcript to send to the model.
    pub fn begin_turn(&mut self, text: &str) -> Result<Vec<Message>, SessionError> {
        match &self.state {
            SessionState::AwaitingModel => return Err(SessionError::Busy),
            SessionState::Failed { reason, .. } => return Err(SessionError::NotCleared(reason.clone())),
            SessionState::Idle | SessionState::Ready => {}
        }
        if text.trim().is_empty() {
            return Err(SessionError::EmptyMessage);
        }

        self.transcript.push(Message::user(text));
        self.state = SessionState::AwaitingModel;
        info!(
            "Session {} dispatching turn with {} messages",
            self.id,
            self.transcript.len()
        );
        Ok(self.transcript.clone())
    }

    /// Records the model's answer (or failure) for the turn in flight.
    pub fn complete_turn(
        &mut self,
        result: Result<ChatResponse, LlmError>,
        store: &dyn TicketStore,
    ) -> Result<TurnOutcome, SessionError> {
        if self.state != SessionState::AwaitingModel {
            return Err(SessionError::NoTurnInFlight);
        }

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                let reason = e.to_string();
                error!("Session {} model call failed: {}", self.id, reason);
                let unsent = self.transcript.pop().map(|m| m.content).unwrap_or_default();
                self.state = SessionState::Failed {
                    reason: reason.clone(),
                    unsent,
                };
                return Err(SessionError::Model(reason));
            }
        };

        self.transcript.push(Message::assistant(response.content.clone()));
        let ticket = self.accept_extraction(&response.content, store);
        self.state = SessionState::Ready;

        Ok(TurnOutcome {
            reply: response.content,
            ticket,
        })
    }

    fn accept_extraction(&mut self, completion: &str, store: &dyn TicketStore) -> Option<Ticket> {
        match protocol::extract(completion) {
            Extraction::NotFound => None,
            Extraction::Malformed(e) => {
                warn!("Session {} ticket marker ignored: {}", self.id, e);
                None
            }
            Extraction::Found(_) if self.ticket.is_some() => {
                warn!("Session {} already created a ticket; repeated marker ignored", self.id);
                None
            }
            Extraction::Found(draft) => match store.create(draft) {
                Ok(ticket) => {
                    info!("Session {} created ticket {}", self.id, ticket.id);
                    self.ticket = Some(ticket.clone());
                    Some(ticket)
                }
                Err(e) => {
                    error!("Session {} could not store extracted ticket: {}", self.id, e);
                    None
                }
            },
        }
    }

    /// Acknowledges a failed turn and re-enables input. Returns the text that
    /// was rolled back, if any.
    pub fn clear_error(&mut self) -> Option<String> {
        match std::mem::replace(&mut self.state, SessionState::Ready) {
            SessionState::Failed { unsent, .. } => Some(unsent),
            other => {
                self.state = other;
                None
            }
        }
    }

    /// Runs a whole turn for a caller that owns the session outright.
    pub async fn submit(&mut self, ctx: &SessionContext, text: &str) -> Result<TurnOutcome, SessionError> {
        let messages = self.begin_turn(text)?;
        let result = ctx.dispatch(&messages).await;
        self.complete_turn(result, ctx.store.as_ref())
    }
}
