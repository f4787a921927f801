#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

use ticketdesk::config::ChatConfig;
use ticketdesk::llm::models::{ChatOptions, ChatResponse, Message, Usage};
use ticketdesk::llm::{LlmError, LlmProvider};
use ticketdesk::protocol::TicketDraft;
use ticketdesk::session::SessionContext;
use ticketdesk::store::{MemoryTicketStore, TicketStore};

pub const TICKET_REPLY: &str = r#"Perfect! TICKET_CREATED:{"userName":"Jo","email":"jo@x.com","category":"Technical Issue","priority":"high","title":"Printer","description":"Won't connect"}"#;

/// Plays back canned completions in order and records what it was sent.
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    calls: Mutex<Vec<(Vec<Message>, Option<String>)>>,
    gate: Option<Arc<Notify>>,
    delay: Option<Duration>,
}

impl ScriptedProvider {
    pub fn new(replies: Vec<Result<String, LlmError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
            gate: None,
            delay: None,
        }
    }

    pub fn replying(replies: &[&str]) -> Self {
        Self::new(replies.iter().map(|r| Ok(r.to_string())).collect())
    }

    /// Every call blocks until `gate` is notified.
    pub fn gated(replies: &[&str], gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::replying(replies)
        }
    }

    pub fn slow(replies: &[&str], delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::replying(replies)
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn call(&self, index: usize) -> (Vec<Message>, Option<String>) {
        self.calls.lock().unwrap()[index].clone()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn chat(&self, messages: &[Message], options: ChatOptions) -> Result<ChatResponse, LlmError> {
        self.calls
            .lock()
            .unwrap()
            .push((messages.to_vec(), options.system_prompt.clone()));

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let next = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::Api("script exhausted".to_string())));

        next.map(|content| ChatResponse {
            usage: Some(Usage {
                input_tokens: messages.len() as u32,
                output_tokens: content.len() as u32,
            }),
            content,
            model: "scripted".to_string(),
        })
    }
}

pub fn context(provider: Arc<ScriptedProvider>, store: Arc<dyn TicketStore>) -> SessionContext {
    SessionContext::new(provider, store, &ChatConfig::default())
}

pub fn memory_store() -> Arc<dyn TicketStore> {
    Arc::new(MemoryTicketStore::new())
}

pub fn sample_draft(title: &str) -> TicketDraft {
    serde_json::from_value(serde_json::json!({
        "userName": "Ada Lovelace",
        "email": "ada@example.com",
        "category": "Bug Report",
        "priority": "medium",
        "title": title,
        "description": "The export button does nothing",
    }))
    .unwrap()
}
