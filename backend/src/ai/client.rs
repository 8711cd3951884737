use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

const GENERATIVE_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Thin client for single-turn prompt-completion calls. No retries and no
/// timeouts beyond reqwest's defaults; a failed call is reported once and
/// the user tries again.
#[derive(Clone)]
pub struct GenerativeClient {
    client: Client,
    api_key: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl GenerativeClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model,
        }
    }

    /// Free-form text completion.
    pub async fn generate_text(&self, prompt: &str) -> AppResult<String> {
        self.generate(prompt, None).await
    }

    /// Completion constrained to emit a JSON document.
    pub async fn generate_json(&self, prompt: &str) -> AppResult<String> {
        self.generate(prompt, Some("application/json")).await
    }

    async fn generate(&self, prompt: &str, mime_type: Option<&str>) -> AppResult<String> {
        let url = format!(
            "{}/{}:generateContent?key={}",
            GENERATIVE_API_URL, self.model, self.api_key
        );

        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: mime_type.map(|mime| GenerationConfig {
                response_mime_type: mime.to_string(),
            }),
        };

        let response = self.client.post(&url).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Assistant(format!(
                "Generative API returned {}: {}",
                status, body
            )));
        }

        let payload: GenerateContentResponse = response.json().await?;
        payload
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .and_then(|content| content.parts.into_iter().next())
            .map(|part| part.text)
            .ok_or_else(|| {
                AppError::Assistant("Generative API returned no candidates".to_string())
            })
    }
}
