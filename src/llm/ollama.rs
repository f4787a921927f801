use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::llm::{
    models::{ChatOptions, ChatResponse, Message, Usage},
    status_error, with_system_prompt, LlmError, LlmProvider,
};

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<serde_json::Value>,
    stream: bool,
    options: SamplingOptions,
}

#[derive(Serialize)]
struct SamplingOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct ChatBody {
    message: Option<ReplyMessage>,
    prompt_eval_count: Option<u32>,
    eval_count: Option<u32>,
}

#[derive(Deserialize)]
struct ReplyMessage {
    content: String,
}

/// Local models served by `ollama serve`. No API key.
pub struct OllamaProvider {
    client: Client,
    base_url: String,
    default_model: String,
}

impl OllamaProvider {
    pub fn new(base_url: String, default_model: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
            default_model,
        }
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn chat(&self, messages: &[Message], options: ChatOptions) -> Result<ChatResponse, LlmError> {
        let model = options.model.as_deref().unwrap_or(&self.default_model);
        let request = ChatRequest {
            model,
            messages: with_system_prompt(messages, options.system_prompt.as_deref()),
            stream: false,
            options: SamplingOptions {
                temperature: options.temperature.unwrap_or(0.7),
                num_predict: options.max_tokens.unwrap_or(4096),
            },
        };

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url.trim_end_matches('/')))
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(status_error("Ollama", response).await);
        }

        let body: ChatBody = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        let content = body
            .message
            .map(|m| m.content)
            .ok_or_else(|| LlmError::InvalidResponse("reply has no message".to_string()))?;

        // Token counts only arrive on the final (here: only) object.
        let usage = body
            .prompt_eval_count
            .zip(body.eval_count)
            .map(|(input_tokens, output_tokens)| Usage {
                input_tokens,
                output_tokens,
            });

        Ok(ChatResponse {
            content,
            model: model.to_string(),
            usage,
        })
    }
}
