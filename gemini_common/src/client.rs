use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chaya_common::Frame;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::rater::{RatingError, VisionModel};

const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-1.5-flash";
const DEFAULT_API_KEY_ENV: &str = "GEMINI_API_KEY";
const JPEG_QUALITY: u8 = 85;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct GeminiConfig {
    /// Base URL of the Generative Language API.
    pub endpoint: String,
    pub model: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Request timeout; `None` waits for as long as the service takes.
    pub timeout_secs: Option<u64>,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            timeout_secs: None,
        }
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text { text: &'a str },
    Image { inline_data: InlineData },
}

#[derive(Debug, Serialize)]
struct InlineData {
    mime_type: &'static str,
    data: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
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
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateResponse {
    /// Text parts of the first candidate, concatenated.
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

/// Blocking client for Gemini's `generateContent` endpoint.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: Client,
    config: GeminiConfig,
    api_key: Option<String>,
}

impl GeminiClient {
    /// Reads the API key from the configured environment variable. A missing
    /// key is not an error here; each request then reports it instead.
    pub fn from_config(config: GeminiConfig) -> Result<Self, RatingError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty());
        if api_key.is_none() {
            log::warn!(
                "{} is not set, model ratings will be unavailable",
                config.api_key_env
            );
        }
        Self::with_api_key(config, api_key)
    }

    pub fn with_api_key(
        config: GeminiConfig,
        api_key: Option<String>,
    ) -> Result<Self, RatingError> {
        let http = Client::builder()
            .timeout(config.timeout_secs.map(Duration::from_secs))
            .build()
            .map_err(|e| RatingError::ServiceFailure(e.to_string()))?;

        Ok(Self {
            http,
            config,
            api_key,
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model
        )
    }
}

fn request_body<'a>(prompt: &'a str, jpeg: &[u8]) -> GenerateRequest<'a> {
    GenerateRequest {
        contents: vec![Content {
            parts: vec![
                Part::Text { text: prompt },
                Part::Image {
                    inline_data: InlineData {
                        mime_type: "image/jpeg",
                        data: STANDARD.encode(jpeg),
                    },
                },
            ],
        }],
    }
}

impl VisionModel for GeminiClient {
    fn complete(&self, prompt: &str, image: &Frame) -> Result<String, RatingError> {
        let Some(api_key) = &self.api_key else {
            return Err(RatingError::MissingCredential(self.config.api_key_env.clone()));
        };

        let jpeg = image
            .to_jpeg(JPEG_QUALITY)
            .map_err(|e| RatingError::ServiceFailure(format!("could not encode image: {e}")))?;

        log::info!(
            "Asking {} about a {}x{} image ({} bytes)",
            self.config.model,
            image.width(),
            image.height(),
            jpeg.len()
        );

        let response = self
            .http
            .post(self.url())
            .header("x-goog-api-key", api_key)
            .json(&request_body(prompt, &jpeg))
            .send()
            .map_err(|e| RatingError::ServiceFailure(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(RatingError::ServiceFailure(format!(
                "unexpected status {status}: {body}"
            )));
        }

        let parsed: GenerateResponse = response
            .json()
            .map_err(|e| RatingError::ServiceFailure(format!("unreadable response: {e}")))?;
        parsed
            .text()
            .ok_or_else(|| RatingError::ServiceFailure("response contained no text".to_string()))
    }
}
