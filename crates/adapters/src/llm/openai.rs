//! OpenAI Responses API adapter

use async_trait::async_trait;
use autopost_domain::{ContentGenerator, DraftPost, GenerateError};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{LlmConfig, PromptRotation, SYSTEM_INSTRUCTION, parse_generation_response};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Post generator backed by the OpenAI Responses API
pub struct OpenAiGenerator {
    client: Client,
    api_key: SecretString,
    base_url: String,
    config: LlmConfig,
    prompts: PromptRotation,
}

impl OpenAiGenerator {
    pub fn new(api_key: SecretString, config: LlmConfig, prompts: PromptRotation) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL.to_string(), config, prompts)
    }

    pub fn with_base_url(
        api_key: SecretString,
        base_url: String,
        config: LlmConfig,
        prompts: PromptRotation,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            config,
            prompts,
        }
    }

    async fn call_api(&self, prompt: &str) -> Result<String, GenerateError> {
        let request = ResponsesRequest {
            model: &self.config.model,
            input: prompt,
            instructions: Some(SYSTEM_INSTRUCTION),
            temperature: Some(self.config.temperature),
            max_output_tokens: Some(self.config.max_output_tokens),
        };

        let url = format!("{}/responses", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GenerateError::Timeout
                } else {
                    GenerateError::Api(e.to_string())
                }
            })?;

        if response.status() == 429 {
            return Err(GenerateError::RateLimited);
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GenerateError::Api(format!(
                "API returned {}: {}",
                status, body
            )));
        }

        let api_response: ResponsesResponse = response
            .json()
            .await
            .map_err(|e| GenerateError::InvalidFormat(e.to_string()))?;

        let text = api_response
            .output
            .into_iter()
            .filter(|item| item.r#type == "message")
            .flat_map(|item| item.content)
            .filter(|c| c.r#type == "output_text")
            .map(|c| c.text)
            .collect::<String>();

        if text.is_empty() {
            return Err(GenerateError::InvalidFormat("Empty response".to_string()));
        }

        Ok(text)
    }
}

#[derive(Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    input: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    instructions: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct ResponsesResponse {
    output: Vec<OutputItem>,
}

#[derive(Deserialize)]
struct OutputItem {
    r#type: String,
    #[serde(default)]
    content: Vec<ContentItem>,
}

#[derive(Deserialize)]
struct ContentItem {
    r#type: String,
    #[serde(default)]
    text: String,
}

#[async_trait]
impl ContentGenerator for OpenAiGenerator {
    async fn generate(&self) -> Result<DraftPost, GenerateError> {
        let prompt = self.prompts.next_prompt();

        let mut last_error = None;
        for attempt in 0..=self.config.retries {
            if attempt > 0 {
                tracing::warn!(attempt, "Retrying generation");
                tokio::time::sleep(Duration::from_millis(500 * 2_u64.pow(attempt))).await;
            }

            match self.call_api(&prompt).await {
                Ok(text) => match parse_generation_response(&text) {
                    Ok(draft) => return Ok(draft),
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to parse response, will retry");
                        last_error = Some(GenerateError::InvalidFormat(e));
                    }
                },
                Err(GenerateError::RateLimited) => return Err(GenerateError::RateLimited),
                Err(e) => last_error = Some(e),
            }
        }

        Err(last_error.unwrap_or_else(|| GenerateError::Api("Unknown error".to_string())))
    }
}
