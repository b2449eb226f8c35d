use crate::config::ResourceConfig;
use crate::engine::{Capability, CapabilityError};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

pub const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434";

const CHAT_TIMEOUT: Duration = Duration::from_secs(60);

pub struct OllamaCapability {
    agent: ureq::Agent,
}

impl OllamaCapability {
    pub fn new() -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(CHAT_TIMEOUT).build(),
        }
    }
}

impl Default for OllamaCapability {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    message: Option<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: String,
}

impl Capability for OllamaCapability {
    fn invoke(
        &self,
        instruction: &str,
        resource: &ResourceConfig,
    ) -> Result<String, CapabilityError> {
        let model = resource.model.as_deref().ok_or_else(|| {
            CapabilityError::Invocation(format!("resource `{}` declares no model", resource.id))
        })?;
        let base_url = resource
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_OLLAMA_BASE_URL);
        let url = format!("{}/api/chat", base_url.trim_end_matches('/'));

        let mut messages = Vec::new();
        if let Some(system_prompt) = resource.system_prompt.as_deref() {
            messages.push(json!({"role": "system", "content": system_prompt}));
        }
        messages.push(json!({"role": "user", "content": instruction}));

        let response = self
            .agent
            .post(&url)
            .send_json(json!({
                "model": model,
                "messages": messages,
                "stream": false,
            }))
            .map_err(|err| CapabilityError::Transport(err.to_string()))?;

        let body: ChatResponse = response.into_json().map_err(|err| {
            CapabilityError::Invocation(format!("undecodable chat response: {err}"))
        })?;
        Ok(body
            .message
            .map(|message| message.content)
            .unwrap_or_default())
    }
}
