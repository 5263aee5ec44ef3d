//! LLM provider adapters

pub mod anthropic;
pub mod openai;
pub mod stub;

pub use anthropic::AnthropicGenerator;
pub use openai::OpenAiGenerator;
pub use stub::StubGenerator;

use autopost_domain::DraftPost;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};

const FALLBACK_TOPIC: &str = "software engineering";
const FALLBACK_TEMPLATE: &str = "an in-depth explanatory article";

/// Common LLM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Model name/ID
    pub model: String,
    /// Temperature (0.0-1.0)
    pub temperature: f64,
    /// Maximum output tokens
    pub max_output_tokens: u32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Number of retries on failure
    pub retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            temperature: 0.7,
            max_output_tokens: 2000,
            timeout_secs: 90,
            retries: 2,
        }
    }
}

/// What the generator writes about
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptConfig {
    /// Tech topics, used in rotation
    pub topics: Vec<String>,
    /// Narrative styles, used in rotation
    pub templates: Vec<String>,
    /// Output language
    pub language: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            topics: [
                "Rust async runtimes",
                "WebAssembly outside the browser",
                "database indexing strategies",
                "observability with OpenTelemetry",
                "container security",
                "edge computing",
                "large language model tooling",
                "type-driven API design",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            templates: [
                "a hands-on tutorial with code snippets",
                "an opinion piece weighing trade-offs",
                "a beginner-friendly explainer",
                "a case study of a production incident",
                "a comparison of competing tools",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            language: "English".to_string(),
        }
    }
}

/// Round-robin prompt source shared by the HTTP generators
#[derive(Debug)]
pub struct PromptRotation {
    config: PromptConfig,
    next: AtomicUsize,
}

impl PromptRotation {
    pub fn new(config: PromptConfig) -> Self {
        Self {
            config,
            next: AtomicUsize::new(0),
        }
    }

    /// Build the prompt for the next topic/template pair
    pub fn next_prompt(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        let topic = pick(&self.config.topics, n).unwrap_or(FALLBACK_TOPIC);
        let template = pick(&self.config.templates, n).unwrap_or(FALLBACK_TEMPLATE);

        tracing::debug!(topic, template, "Selected prompt");

        build_generation_prompt(topic, template, &self.config.language)
    }
}

impl Default for PromptRotation {
    fn default() -> Self {
        Self::new(PromptConfig::default())
    }
}

fn pick(items: &[String], n: usize) -> Option<&str> {
    if items.is_empty() {
        None
    } else {
        Some(items[n % items.len()].as_str())
    }
}

/// System instruction sent alongside every prompt
pub(crate) const SYSTEM_INSTRUCTION: &str =
    "You are a technical blog writer. Output only valid JSON.";

/// Build the blog post generation prompt
pub fn build_generation_prompt(topic: &str, template: &str, language: &str) -> String {
    let mut prompt = String::new();

    prompt.push_str("Write a new blog post for a technology blog.\n\n");

    prompt.push_str("## Assignment\n");
    prompt.push_str(&format!("Topic: {}\n", topic));
    prompt.push_str(&format!("Style: {}\n", template));
    prompt.push_str(&format!("Language: {}\n\n", language));

    prompt.push_str(
        r#"## Output Format
Respond with ONLY a JSON object matching this exact schema:
{
  "title": "Post title",
  "content": "Full post body in Markdown",
  "excerpt": "One or two sentence teaser",
  "categories": ["Category"],
  "tags": ["tag-one", "tag-two"]
}

Rules:
- The content must be at least 600 words
- Use 1-2 categories and 3-6 short lowercase tags
- Do not include the title inside the content
- Do not wrap the JSON in any commentary
"#,
    );

    prompt
}

/// Parse a generation response into a draft
pub fn parse_generation_response(response: &str) -> Result<DraftPost, String> {
    let json_str = extract_json(response);

    let draft: DraftPost =
        serde_json::from_str(json_str).map_err(|e| format!("Failed to parse JSON: {}", e))?;

    if draft.title.trim().is_empty() || draft.content.trim().is_empty() {
        return Err("Draft is missing a title or content".to_string());
    }

    Ok(draft)
}

/// Extract JSON from response (handles markdown code blocks)
fn extract_json(response: &str) -> &str {
    let trimmed = response.trim();

    if let Some(start) = trimmed.find("```json") {
        if let Some(end) = trimmed[start + 7..].find("```") {
            return trimmed[start + 7..start + 7 + end].trim();
        }
    }

    if let Some(start) = trimmed.find("```") {
        if let Some(end) = trimmed[start + 3..].find("```") {
            let content = trimmed[start + 3..start + 3 + end].trim();
            // Skip a language identifier line
            if let Some(newline) = content.find('\n') {
                if !content[..newline].starts_with('{') {
                    return content[newline + 1..].trim();
                }
            }
            return content;
        }
    }

    // Prose around a bare object
    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            return &trimmed[start..=end];
        }
    }

    trimmed
}
