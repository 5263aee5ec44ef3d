//! Anthropic Messages API adapter

use async_trait::async_trait;
use autopost_domain::{ContentGenerator, DraftPost, GenerateError};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{LlmConfig, PromptRotation, SYSTEM_INSTRUCTION, parse_generation_response};

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
const API_VERSION: &str = "2023-06-01";

/// Post generator backed by the Anthropic Messages API
pub struct AnthropicGenerator {
    client: Client,
    api_key: SecretString,
    base_url: String,
    config: LlmConfig,
    prompts: PromptRotation,
}

impl AnthropicGenerator {
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
        let request = MessagesRequest {
            model: &self.config.model,
            max_tokens: self.config.max_output_tokens,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
            system: Some(SYSTEM_INSTRUCTION),
            temperature: Some(self.config.temperature),
        };

        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", API_VERSION)
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

        let api_response: MessagesResponse = response
            .json()
            .await
            .map_err(|e| GenerateError::InvalidFormat(e.to_string()))?;

        let text = api_response
            .content
            .into_iter()
            .filter(|c| c.r#type == "text")
            .map(|c| c.text)
            .collect::<String>();

        if text.is_empty() {
            return Err(GenerateError::InvalidFormat("Empty response".to_string()));
        }

        Ok(text)
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    r#type: String,
    #[serde(default)]
    text: String,
}

#[async_trait]
impl ContentGenerator for AnthropicGenerator {
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
                        tracing::warn!(error = %e, "Failed to parse response");
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

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn generator(uri: String, retries: u32) -> AnthropicGenerator {
        AnthropicGenerator::with_base_url(
            SecretString::new("test-key".into()),
            uri,
            LlmConfig {
                model: "claude-3-5-haiku-latest".to_string(),
                retries,
                ..Default::default()
            },
            PromptRotation::default(),
        )
    }

    #[tokio::test]
    async fn test_generate_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/messages"))
            .and(header("x-api-key", "test-key"))
            .and(header("anthropic-version", API_VERSION))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "content": [{
                    "type": "text",
                    "text": r#"{"title":"Lifetimes","content":"Regions of validity.","tags":["rust"]}"#
                }]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let draft = generator(mock_server.uri(), 0).generate().await.unwrap();

        assert_eq!(draft.title, "Lifetimes");
        assert!(draft.categories.is_empty());
    }

    #[tokio::test]
    async fn test_generate_retries_then_succeeds() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/messages"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "content": [{ "type": "text", "text": r#"{"title":"Traits","content":"Shared behavior."}"# }]
            })))
            .mount(&mock_server)
            .await;

        let draft = generator(mock_server.uri(), 1).generate().await.unwrap();

        assert_eq!(draft.title, "Traits");
    }

    #[tokio::test]
    async fn test_generate_rate_limited() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/messages"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&mock_server)
            .await;

        let result = generator(mock_server.uri(), 0).generate().await;

        assert!(matches!(result, Err(GenerateError::RateLimited)));
    }
}
