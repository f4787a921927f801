use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use crate::llm::{
    models::{ChatOptions, ChatResponse, Message, Role, Usage},
    status_error, LlmError, LlmProvider,
};

const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct AnthropicProvider {
    client: Client,
    api_key: String,
    base_url: String,
    default_model: String,
}

impl AnthropicProvider {
    pub fn new(api_key: String, base_url: String, default_model: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url,
            default_model,
        }
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn chat(&self, messages: &[Message], options: ChatOptions) -> Result<ChatResponse, LlmError> {
        let model = options.model.as_deref().unwrap_or(&self.default_model);

        // The Messages API takes the system prompt as a top-level field and
        // expects the conversation to open with a user turn, so a leading
        // canned greeting is folded into the system prompt instead.
        let mut system = options.system_prompt.clone().unwrap_or_default();
        let leading_assistant = messages
            .iter()
            .take_while(|m| m.role == Role::Assistant)
            .count();
        for greeting in &messages[..leading_assistant] {
            system.push_str("\n\nYou opened the conversation with: ");
            system.push_str(&greeting.content);
        }

        let body = json!({
            "model": model,
            "messages": &messages[leading_assistant..],
            "system": system.trim(),
            "temperature": options.temperature.unwrap_or(0.7),
            "max_tokens": options.max_tokens.unwrap_or(4096),
        });

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(status_error("Anthropic", response).await);
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;

        // Concatenate every text block; tool_use blocks are not expected here.
        let content: String = json["content"]
            .as_array()
            .ok_or_else(|| LlmError::InvalidResponse("missing content blocks".to_string()))?
            .iter()
            .filter_map(|block| block["text"].as_str())
            .collect();

        let usage = json.get("usage").map(|u| Usage {
            input_tokens: u["input_tokens"].as_u64().unwrap_or(0) as u32,
            output_tokens: u["output_tokens"].as_u64().unwrap_or(0) as u32,
        });

        Ok(ChatResponse {
            content,
            model: model.to_string(),
            usage,
        })
    }
}
