//! Google Gemini adapter over the `generateContent` REST endpoint.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::GenerativeService;
use crate::config::GeminiSettings;
use crate::domain::ImageAsset;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini REST client
pub struct GeminiClient {
    api_key: String,
    text_model: String,
    image_model: String,
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: Vec<&'static str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<ResponseContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    text: Option<String>,
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

/// Error envelope returned with non-2xx responses
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: u16,
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

impl GeminiClient {
    /// Create a client; `timeout` bounds each HTTP request
    pub fn new(api_key: impl Into<String>, settings: &GeminiSettings, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            api_key: api_key.into(),
            text_model: settings.text_model.clone(),
            image_model: settings.image_model.clone(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }

    async fn generate_content(
        &self,
        model: &str,
        prompt: &str,
        modalities: Option<Vec<&'static str>>,
    ) -> Result<GenerateResponse> {
        let request = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: modalities.map(|response_modalities| GenerationConfig {
                response_modalities,
            }),
        };

        debug!(model, prompt_chars = prompt.len(), "Calling Gemini");

        let response = self
            .client
            .post(self.endpoint(model))
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .with_context(|| format!("Failed to reach Gemini model '{}'", model))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read Gemini response body")?;

        if !status.is_success() {
            let detail = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|b| format!("{} {} {}", b.error.code, b.error.status, b.error.message))
                .unwrap_or_else(|_| body.trim().to_string());
            anyhow::bail!("Gemini API error (HTTP {}): {}", status.as_u16(), detail.trim());
        }

        serde_json::from_str(&body).context("Failed to parse Gemini response")
    }
}

/// Concatenate the text parts of the first candidate
fn response_text(response: &GenerateResponse) -> Result<String> {
    let candidate = first_candidate(response)?;

    let text: String = candidate
        .content
        .iter()
        .flat_map(|c| c.parts.iter())
        .filter_map(|p| p.text.as_deref())
        .collect();

    if text.trim().is_empty() {
        anyhow::bail!(
            "Gemini returned no text (finish reason: {})",
            candidate.finish_reason.as_deref().unwrap_or("unknown")
        );
    }

    Ok(text)
}

/// Decode the first inline image of the first candidate
fn response_image(response: &GenerateResponse) -> Result<ImageAsset> {
    let candidate = first_candidate(response)?;

    let inline = candidate
        .content
        .iter()
        .flat_map(|c| c.parts.iter())
        .find_map(|p| p.inline_data.as_ref())
        .context("No image data in Gemini response")?;

    let bytes = STANDARD
        .decode(inline.data.as_bytes())
        .context("Gemini image data is not valid base64")?;

    if bytes.is_empty() {
        anyhow::bail!("Gemini returned an empty image");
    }

    Ok(ImageAsset::new(bytes, inline.mime_type.clone()))
}

fn first_candidate(response: &GenerateResponse) -> Result<&Candidate> {
    if let Some(reason) = response
        .prompt_feedback
        .as_ref()
        .and_then(|f| f.block_reason.as_deref())
    {
        anyhow::bail!("Gemini blocked the prompt: {}", reason);
    }

    response
        .candidates
        .first()
        .context("Gemini returned no candidates")
}

#[async_trait]
impl GenerativeService for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate_text(&self, prompt: &str) -> Result<String> {
        let response = self.generate_content(&self.text_model, prompt, None).await?;
        response_text(&response)
    }

    async fn generate_image(&self, prompt: &str) -> Result<ImageAsset> {
        let response = self
            .generate_content(&self.image_model, prompt, Some(vec!["TEXT", "IMAGE"]))
            .await?;
        response_image(&response)
    }
}
