// ABOUTME: External collaborator seams — prompt building and image generation providers.
// ABOUTME: The store never sees these; handlers compose them with the store for the generate flow.

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::{Map, Value, json};
use thiserror::Error;

/// Errors that can occur while talking to a generation provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("GENERATION_API_KEY not set")]
    MissingKey,

    #[error("provider request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("provider returned an error: {0}")]
    Api(String),

    #[error("provider response missing image data")]
    MissingImage,

    #[error("image payload decode failed: {0}")]
    Decode(#[from] base64::DecodeError),
}

/// Turns a frame's opaque parameter bag into prompt text for the
/// generation provider. The store passes the bag through untouched; only
/// this seam interprets it.
pub trait PromptBuilder: Send + Sync {
    fn build(&self, params: &Map<String, Value>) -> String;
}

/// Produces one image from a prompt plus optional reference images.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        reference_images: &[Vec<u8>],
    ) -> Result<Vec<u8>, ProviderError>;
}

/// Parameter keys rendered first, in a fixed order, so the same bag always
/// yields the same prompt.
const PROMPT_KEY_ORDER: [&str; 6] = ["subject", "style", "lighting", "mood", "camera", "backdrop"];

/// Template-based prompt builder: well-known keys in a fixed order, then
/// any remaining keys alphabetically, comma-joined.
pub struct TemplatePromptBuilder;

impl PromptBuilder for TemplatePromptBuilder {
    fn build(&self, params: &Map<String, Value>) -> String {
        let mut parts: Vec<String> = Vec::new();

        for key in PROMPT_KEY_ORDER {
            if let Some(value) = params.get(key) {
                parts.push(render_value(value));
            }
        }

        let mut rest: Vec<&String> = params
            .keys()
            .filter(|k| !PROMPT_KEY_ORDER.contains(&k.as_str()))
            .collect();
        rest.sort();
        for key in rest {
            parts.push(render_value(&params[key]));
        }

        parts.retain(|p| !p.is_empty());
        parts.join(", ")
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_MODEL: &str = "gpt-image-1";

/// OpenAI Images API adapter. Reference images are accepted by the trait
/// but not forwarded by this adapter; the generations endpoint is
/// prompt-only.
pub struct OpenAiImageProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiImageProvider {
    /// Create a provider reading configuration from environment variables.
    /// Required: `GENERATION_API_KEY`
    /// Optional: `GENERATION_BASE_URL` (defaults to https://api.openai.com)
    /// Optional: `GENERATION_MODEL` (defaults to gpt-image-1)
    pub fn from_env() -> Result<Self, ProviderError> {
        let api_key = std::env::var("GENERATION_API_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .ok_or(ProviderError::MissingKey)?;

        let base_url = std::env::var("GENERATION_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model =
            std::env::var("GENERATION_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        Ok(Self::new(api_key, base_url, model))
    }

    /// Create a provider with explicit configuration.
    pub fn new(api_key: String, base_url: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url,
            model,
        }
    }

    /// Build the JSON request body for the images endpoint.
    pub fn build_request_body(&self, prompt: &str) -> Value {
        json!({
            "model": self.model,
            "prompt": prompt,
            "n": 1,
            "size": "1024x1024",
        })
    }
}

#[async_trait]
impl GenerationProvider for OpenAiImageProvider {
    async fn generate(
        &self,
        prompt: &str,
        _reference_images: &[Vec<u8>],
    ) -> Result<Vec<u8>, ProviderError> {
        let response = self
            .client
            .post(format!("{}/v1/images/generations", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&self.build_request_body(prompt))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api(format!("{}: {}", status, body)));
        }

        let body: Value = response.json().await?;
        let b64 = body["data"][0]["b64_json"]
            .as_str()
            .ok_or(ProviderError::MissingImage)?;

        Ok(BASE64.decode(b64)?)
    }
}
