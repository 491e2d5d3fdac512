//! OpenAI-backed translator implementation.
//! Each subtitle block is sent as one chat completion request.

use super::{LanguagePair, Translator};
use crate::error::{Error, Result, TranslationError};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::trace;

/// Environment variable holding the API key.
pub const API_KEY_VAR: &str = "OPENAI_API_KEY";
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_TEMPERATURE: f64 = 0.1;

/// Endpoint and sampling settings for [`OpenAiTranslator`].
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_base: String,
    pub model: String,
    pub temperature: f64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

/// Translator that delegates to the OpenAI chat completion API.
pub struct OpenAiTranslator {
    client: Client,
    api_key: String,
    config: OpenAiConfig,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    content: Option<String>,
}

impl OpenAiTranslator {
    pub fn new(api_key: impl Into<String>, config: OpenAiConfig) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            config,
        }
    }

    /// Create a translator reading the API key from `OPENAI_API_KEY`.
    pub fn from_env(config: OpenAiConfig) -> Result<Self> {
        Self::from_key(std::env::var(API_KEY_VAR).ok(), config)
    }

    /// Create a translator from an optional key; absent or blank keys are rejected.
    pub fn from_key(api_key: Option<String>, config: OpenAiConfig) -> Result<Self> {
        match api_key {
            Some(key) if !key.trim().is_empty() => Ok(Self::new(key, config)),
            _ => Err(Error::MissingCredential(API_KEY_VAR)),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.api_base.trim_end_matches('/'))
    }
}

/// Instruction sent as the system message for every block.
pub fn system_prompt(languages: &LanguagePair) -> String {
    let LanguagePair { source, target } = languages;
    format!(
        "You are a professional translator specializing in {source} to {target} translations.\n\
         You must preserve all formatting and line breaks from the original text.\n\
         Translate only the text content; do not modify any numbers, timestamps, or special characters.\n\
         Your translations should sound natural and fluent in {target}.\n\
         Reply with the translation only."
    )
}

#[async_trait]
impl Translator for OpenAiTranslator {
    async fn translate(
        &self,
        text: &str,
        languages: &LanguagePair,
    ) -> std::result::Result<String, TranslationError> {
        trace!("translate len={} model={}", text.len(), self.config.model);
        let body = json!({
            "model": self.config.model,
            "temperature": self.config.temperature,
            "messages": [
                {"role": "system", "content": system_prompt(languages)},
                {"role": "user", "content": text},
            ],
        });
        let resp = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        let status = resp.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(TranslationError::RateLimited(resp.text().await.unwrap_or_default()));
        }
        if !status.is_success() {
            return Err(TranslationError::Status {
                status: status.as_u16(),
                body: resp.text().await.unwrap_or_default(),
            });
        }
        let raw = resp.text().await?;
        let parsed: ChatResponse =
            serde_json::from_str(&raw).map_err(|e| TranslationError::Malformed(e.to_string()))?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| TranslationError::Malformed("missing content".into()))?;
        let content = content.trim();
        if content.is_empty() {
            return Err(TranslationError::Empty);
        }
        Ok(content.to_string())
    }
}
