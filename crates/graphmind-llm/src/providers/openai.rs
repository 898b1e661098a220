use futures::future::BoxFuture;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use graphmind_core::config::ModelConfig;
use graphmind_core::error::{GraphMindError, Result};
use graphmind_core::traits::CompletionClient;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI-compatible chat completions client.
///
/// Works with OpenAI, Ollama, Groq, Together, and any other endpoint that
/// speaks the `/chat/completions` protocol.
pub struct OpenAiClient {
    http: Client,
}

impl OpenAiClient {
    pub fn new(timeout_secs: u64) -> Self {
        Self {
            http: super::http_client(timeout_secs),
        }
    }
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatRequestMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatRequestMessage {
    role: String,
    content: String,
}

#[derive(Deserialize, Debug)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize, Debug)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize, Debug)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

impl CompletionClient for OpenAiClient {
    fn complete(
        &self,
        config: &ModelConfig,
        system_prompt: &str,
        user_prompt: &str,
    ) -> BoxFuture<'_, Result<String>> {
        let config = config.clone();
        let system_prompt = system_prompt.to_string();
        let user_prompt = user_prompt.to_string();

        Box::pin(async move {
            let base = config
                .base_url
                .as_deref()
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/');
            let url = format!("{}/chat/completions", base);

            let mut messages = Vec::new();
            if !system_prompt.is_empty() {
                messages.push(ChatRequestMessage {
                    role: "system".into(),
                    content: system_prompt,
                });
            }
            messages.push(ChatRequestMessage {
                role: "user".into(),
                content: user_prompt,
            });

            let mut req = self.http.post(&url).json(&ChatRequest {
                model: config.model_id.clone(),
                messages,
                max_tokens: config.max_tokens,
                temperature: config.temperature,
            });

            if let Some(ref key) = config.api_key {
                req = req.bearer_auth(key);
            }

            let resp = req
                .send()
                .await
                .map_err(|e| GraphMindError::Completion(e.to_string()))?;

            if !resp.status().is_success() {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                return Err(GraphMindError::Completion(format!(
                    "API error {}: {}",
                    status, body
                )));
            }

            let body: ChatResponse = resp
                .json()
                .await
                .map_err(|e| GraphMindError::Completion(format!("Invalid response: {}", e)))?;

            Ok(body
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
                .unwrap_or_default())
        })
    }
}
