use futures::future::BoxFuture;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use graphmind_core::config::ModelConfig;
use graphmind_core::error::{GraphMindError, Result};
use graphmind_core::traits::CompletionClient;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Google Gemini native API client (non-streaming `generateContent`).
pub struct GeminiClient {
    http: Client,
}

impl GeminiClient {
    pub fn new(timeout_secs: u64) -> Self {
        Self {
            http: super::http_client(timeout_secs),
        }
    }
}

// ── Request types ────────────────────────────────────────────────

#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize, Deserialize, Debug)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Deserialize, Debug)]
struct GeminiPart {
    text: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

// ── Response types ───────────────────────────────────────────────

#[derive(Deserialize, Debug)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize, Debug)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

impl CompletionClient for GeminiClient {
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
            let api_key = config
                .api_key
                .clone()
                .ok_or_else(|| GraphMindError::Completion("Gemini API key not set".into()))?;

            let base = config
                .base_url
                .as_deref()
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/');
            let url = format!("{}/models/{}:generateContent", base, config.model_id);

            let request = GeminiRequest {
                contents: vec![GeminiContent {
                    role: Some("user".into()),
                    parts: vec![GeminiPart { text: user_prompt }],
                }],
                system_instruction: (!system_prompt.is_empty()).then(|| GeminiContent {
                    role: None,
                    parts: vec![GeminiPart {
                        text: system_prompt,
                    }],
                }),
                generation_config: Some(GenerationConfig {
                    max_output_tokens: Some(config.max_tokens),
                    temperature: Some(config.temperature),
                }),
            };

            let resp = self
                .http
                .post(&url)
                .header("x-goog-api-key", api_key)
                .json(&request)
                .send()
                .await
                .map_err(|e| GraphMindError::Completion(e.to_string()))?;

            if !resp.status().is_success() {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                return Err(GraphMindError::Completion(format!(
                    "Gemini API error {}: {}",
                    status, body
                )));
            }

            let body: GeminiResponse = resp
                .json()
                .await
                .map_err(|e| GraphMindError::Completion(format!("Invalid response: {}", e)))?;

            let text = body
                .candidates
                .into_iter()
                .next()
                .and_then(|c| c.content)
                .map(|c| {
                    c.parts
                        .into_iter()
                        .map(|p| p.text)
                        .collect::<Vec<_>>()
                        .join("")
                })
                .unwrap_or_default();

            Ok(text)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization() {
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                role: Some("user".into()),
                parts: vec![GeminiPart {
                    text: "hello".into(),
                }],
            }],
            system_instruction: None,
            generation_config: Some(GenerationConfig {
                max_output_tokens: Some(1024),
                temperature: Some(0.0),
            }),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hello");
        assert!(json.get("system_instruction").is_none());
    }

    #[test]
    fn test_response_text_extraction() {
        let raw = r#"{"candidates": [{"content": {"role": "model", "parts": [{"text": "a"}, {"text": "b"}]}}]}"#;
        let resp: GeminiResponse = serde_json::from_str(raw).unwrap();
        let text: String = resp.candidates[0]
            .content
            .as_ref()
            .unwrap()
            .parts
            .iter()
            .map(|p| p.text.clone())
            .collect();
        assert_eq!(text, "ab");
    }
}
