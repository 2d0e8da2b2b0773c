use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::models::catalog;

/// One conversation turn in the Generative Language API wire format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    pub text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction>,
    contents: &'a [Content],
}

#[derive(Debug, Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

/// A completed generation and the model that actually produced it (which may
/// differ from the requested model after fallback).
#[derive(Debug, Clone)]
pub struct Answer {
    pub text: String,
    pub model: String,
}

/// Client for the Generative Language REST API
pub struct GeminiClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GeminiClient {
    /// Create a new client with the given configuration
    pub fn new(base_url: &str, api_key: &str, model: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(300)) // 5 minute timeout for long generations
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }

    /// Create a new client from the app's configuration
    pub fn from_config() -> Result<Self> {
        let (base_url, model, api_key) = super::config_service::get_effective_config()?;

        if api_key.is_empty() {
            return Err(Error::Config(
                "No API key configured. Please add your API key first.".to_string(),
            ));
        }

        Ok(Self::new(&base_url, &api_key, &model))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Generate an answer, walking the catalog fallback chain when a model
    /// is rate limited, erroring server-side, or unreachable.
    pub async fn generate(
        &self,
        system_instruction: &str,
        contents: &[Content],
    ) -> Result<Answer> {
        let mut last_err: Option<Error> = None;

        for model_id in catalog::fallback_chain(&self.model) {
            match self.generate_once(model_id, system_instruction, contents).await {
                Ok(text) => {
                    if model_id != self.model {
                        info!(requested = %self.model, used = model_id, "fell back to alternate model");
                    }
                    return Ok(Answer {
                        text,
                        model: model_id.to_string(),
                    });
                }
                Err(e) if e.is_retryable() => {
                    warn!(model = model_id, error = %e, "model unavailable, trying next");
                    last_err = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_err.unwrap_or_else(|| Error::Llm("no models available".to_string())))
    }

    async fn generate_once(
        &self,
        model: &str,
        system_instruction: &str,
        contents: &[Content],
    ) -> Result<String> {
        let request = GenerateContentRequest {
            system_instruction: if system_instruction.is_empty() {
                None
            } else {
                Some(SystemInstruction {
                    parts: vec![Part {
                        text: system_instruction.to_string(),
                    }],
                })
            },
            contents,
        };

        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url.trim_end_matches('/'),
            model,
            self.api_key
        );

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(Error::Api { status, message });
        }

        let completion: GenerateContentResponse = response.json().await?;

        let text: String = completion
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts)
            .unwrap_or_default()
            .into_iter()
            .map(|p| p.text)
            .collect();

        if text.is_empty() {
            return Err(Error::Llm("no response content".to_string()));
        }

        Ok(text)
    }

    /// Helper to create a user turn
    pub fn user_content(text: &str) -> Content {
        Content {
            role: "user".to_string(),
            parts: vec![Part {
                text: text.to_string(),
            }],
        }
    }

    /// Helper to create a model turn
    pub fn model_content(text: &str) -> Content {
        Content {
            role: "model".to_string(),
            parts: vec![Part {
                text: text.to_string(),
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_helpers_set_wire_roles() {
        assert_eq!(GeminiClient::user_content("q").role, "user");
        assert_eq!(GeminiClient::model_content("a").role, "model");
    }

    #[test]
    fn test_request_skips_empty_system_instruction() {
        let contents = vec![GeminiClient::user_content("q")];
        let request = GenerateContentRequest {
            system_instruction: None,
            contents: &contents,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("systemInstruction").is_none());
        assert_eq!(json["contents"][0]["role"], "user");
    }

    #[test]
    fn test_response_text_is_joined_from_parts() {
        let raw = r#"{
            "candidates": [
                {"content": {"parts": [{"text": "hello "}, {"text": "world"}]}}
            ]
        }"#;
        let parsed: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts)
            .unwrap_or_default()
            .into_iter()
            .map(|p| p.text)
            .collect();
        assert_eq!(text, "hello world");
    }
}
