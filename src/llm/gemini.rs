//! Gemini `generateContent` client.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use super::error::LlmError;
use super::InferenceClient;

pub const DEFAULT_GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";

/// Gemini API client.
///
/// The API key is fixed at construction. A client built without a key is
/// still usable: every call fails with a configuration error and no request
/// leaves the process.
pub struct GeminiClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

impl GeminiClient {
    /// Create a client against the public endpoint with the default model.
    pub fn new(api_key: Option<String>) -> Self {
        Self::with_endpoint(api_key, DEFAULT_GEMINI_API_URL, DEFAULT_GEMINI_MODEL)
    }

    /// Create a client with a custom base URL and model.
    pub fn with_endpoint(api_key: Option<String>, base_url: &str, model: &str) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty()),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }

    pub fn has_credentials(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    /// Execute a single request without retry.
    async fn execute_request(
        &self,
        api_key: &str,
        request: &GeminiRequest<'_>,
    ) -> Result<String, LlmError> {
        let response = match self
            .client
            .post(self.endpoint())
            .query(&[("key", api_key)])
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                // The URL carries the API key.
                let e = e.without_url();
                if e.is_timeout() {
                    return Err(LlmError::network_error(format!("Request timeout: {}", e)));
                } else if e.is_connect() {
                    return Err(LlmError::network_error(format!("Connection failed: {}", e)));
                } else {
                    return Err(LlmError::network_error(format!("Request failed: {}", e)));
                }
            }
        };

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(LlmError::http_status(status.as_u16(), &body));
        }

        let envelope: Value = serde_json::from_str(&body).map_err(|e| {
            LlmError::parse_error(format!("Failed to parse response envelope: {}", e))
        })?;

        Ok(first_text(&envelope).unwrap_or_default().to_string())
    }
}

#[async_trait]
impl InferenceClient for GeminiClient {
    async fn infer(&self, prompt: &str) -> Result<String, LlmError> {
        let Some(api_key) = self.api_key.as_deref() else {
            tracing::error!("Gemini API key not configured");
            return Err(LlmError::configuration("Gemini API key not configured"));
        };

        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart { text: prompt }],
            }],
        };

        tracing::debug!("Sending request to Gemini: model={}", self.model);

        match self.execute_request(api_key, &request).await {
            Ok(text) => {
                if text.is_empty() {
                    tracing::debug!("Gemini response carried no text payload");
                }
                Ok(text)
            }
            Err(e) => {
                tracing::warn!("Gemini request failed: {}", e);
                Err(e)
            }
        }
    }
}

/// Gemini API request format.
#[derive(Debug, Serialize)]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiContent<'a> {
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

/// `candidates[0].content.parts[0].text`. Any level may be missing, null
/// or of another type; all of those mean "no text".
fn first_text(envelope: &Value) -> Option<&str> {
    envelope
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .get(0)?
        .get("text")?
        .as_str()
}
