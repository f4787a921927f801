use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{info, warn};
use uuid::Uuid;

use crate::llm::models::Message;
use crate::session::{ConversationSession, SessionContext, SessionError, SessionState, TurnOutcome};
use crate::store::Ticket;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub id: Uuid,
    #[serde(flatten)]
    pub state: SessionState,
    pub transcript: Vec<Message>,
    pub ticket_created: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket: Option<Ticket>,
}

impl From<&ConversationSession> for SessionSnapshot {
    fn from(session: &ConversationSession) -> Self {
        Self {
            id: session.id(),
            state: session.state().clone(),
            transcript: session.transcript().to_vec(),
            ticket_created: session.ticket_created(),
            ticket: session.ticket().cloned(),
        }
    }
}

type SessionMap = Mutex<HashMap<Uuid, ConversationSession>>;

fn lock(sessions: &SessionMap) -> Result<MutexGuard<'_, HashMap<Uuid, ConversationSession>>, SessionError> {
    sessions.lock().map_err(|_| SessionError::Poisoned)
}

/// Live sessions for the HTTP surface. The map lock is never held across a
/// model call.
pub struct SessionRegistry {
    ctx: SessionContext,
    sessions: Arc<SessionMap>,
}

impl SessionRegistry {
    pub fn new(ctx: SessionContext) -> Self {
        Self {
            ctx,
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn create(&self) -> Result<SessionSnapshot, SessionError> {
        let session = self.ctx.new_session();
        let snapshot = SessionSnapshot::from(&session);
        lock(&self.sessions)?.insert(session.id(), session);
        info!("Created intake session {}", snapshot.id);
        Ok(snapshot)
    }

    pub fn snapshot(&self, id: Uuid) -> Result<SessionSnapshot, SessionError> {
        let sessions = lock(&self.sessions)?;
        sessions
            .get(&id)
            .map(SessionSnapshot::from)
            .ok_or(SessionError::NotFound(id))
    }

    /// Runs one turn. The model call and its bookkeeping happen on a spawned
    /// task, so the session leaves `AwaitingModel` even if the caller stops
    /// polling (e.g. the HTTP client disconnects).
    pub async fn submit(&self, id: Uuid, text: &str) -> Result<TurnOutcome, SessionError> {
        let messages = {
            let mut sessions = lock(&self.sessions)?;
            let session = sessions.get_mut(&id).ok_or(SessionError::NotFound(id))?;
            session.begin_turn(text)?
        };

        let ctx = self.ctx.clone();
        let sessions = Arc::clone(&self.sessions);
        let turn = tokio::spawn(async move {
            let result = ctx.dispatch(&messages).await;

            let mut sessions = lock(&sessions)?;
            let Some(session) = sessions.get_mut(&id) else {
                warn!("Session {} was removed before its reply arrived; reply dropped", id);
                return Err(SessionError::NotFound(id));
            };
            session.complete_turn(result, ctx.store.as_ref())
        });

        turn.await.map_err(|e| SessionError::TurnAborted(e.to_string()))?
    }

    pub fn clear_error(&self, id: Uuid) -> Result<SessionSnapshot, SessionError> {
        let mut sessions = lock(&self.sessions)?;
        let session = sessions.get_mut(&id).ok_or(SessionError::NotFound(id))?;
        session.clear_error();
        Ok(SessionSnapshot::from(&*session))
    }

    pub fn remove(&self, id: Uuid) -> Result<bool, SessionError> {
        Ok(lock(&self.sessions)?.remove(&id).is_some())
    }
}
