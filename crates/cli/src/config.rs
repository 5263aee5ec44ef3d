//! Configuration loading and management

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub automation: AutomationSettings,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub llm: LlmSettings,

    #[serde(default)]
    pub content: ContentConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutomationSettings {
    #[serde(default = "default_interval_minutes")]
    pub default_interval_minutes: u32,

    /// Re-arm the timer on `serve` if the persisted status is running
    #[serde(default = "default_true")]
    pub resume_on_startup: bool,

    /// Cross-process generation lease; 0 disables it
    #[serde(default = "default_lease_ttl_secs")]
    pub lease_ttl_secs: u64,

    #[serde(default = "default_failure_alert_threshold")]
    pub failure_alert_threshold: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,

    #[serde(default = "default_admin_token_env")]
    pub admin_token_env: String,

    #[serde(default = "default_webhook_key_env")]
    pub webhook_key_env: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    #[serde(default = "default_provider")]
    pub provider: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_llm_retries")]
    pub retries: u32,

    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    #[serde(default)]
    pub openai: OpenAiConfig,

    #[serde(default)]
    pub anthropic: AnthropicConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    #[serde(default = "default_openai_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicConfig {
    #[serde(default = "default_anthropic_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_anthropic_base_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentConfig {
    #[serde(default = "default_topics")]
    pub topics: Vec<String>,

    #[serde(default = "default_templates")]
    pub templates: Vec<String>,

    #[serde(default = "default_language")]
    pub language: String,

    #[serde(default = "default_min_content_chars")]
    pub min_content_chars: usize,

    #[serde(default = "default_max_tags")]
    pub max_tags: usize,

    #[serde(default)]
    pub forbidden_patterns: Vec<String>,
}

// Default value functions
fn default_db_path() -> PathBuf {
    PathBuf::from("./autopost.sqlite")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_interval_minutes() -> u32 {
    autopost_domain::IntervalMinutes::DEFAULT.get()
}

fn default_lease_ttl_secs() -> u64 {
    600
}

fn default_failure_alert_threshold() -> u32 {
    3
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_admin_token_env() -> String {
    "AUTOPOST_ADMIN_TOKEN".to_string()
}

fn default_webhook_key_env() -> String {
    "AUTOPOST_CRON_KEY".to_string()
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_temperature() -> f64 {
    0.7
}

fn default_timeout() -> u64 {
    90
}

fn default_llm_retries() -> u32 {
    2
}

fn default_max_output_tokens() -> u32 {
    2000
}

fn default_openai_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_openai_base_url() -> String {
    autopost_adapters::llm::openai::DEFAULT_BASE_URL.to_string()
}

fn default_anthropic_api_key_env() -> String {
    "ANTHROPIC_API_KEY".to_string()
}

fn default_anthropic_base_url() -> String {
    autopost_adapters::llm::anthropic::DEFAULT_BASE_URL.to_string()
}

fn default_topics() -> Vec<String> {
    autopost_adapters::llm::PromptConfig::default().topics
}

fn default_templates() -> Vec<String> {
    autopost_adapters::llm::PromptConfig::default().templates
}

fn default_language() -> String {
    "English".to_string()
}

fn default_min_content_chars() -> usize {
    200
}

fn default_max_tags() -> usize {
    8
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            log_level: default_log_level(),
        }
    }
}

impl Default for AutomationSettings {
    fn default() -> Self {
        Self {
            default_interval_minutes: default_interval_minutes(),
            resume_on_startup: default_true(),
            lease_ttl_secs: default_lease_ttl_secs(),
            failure_alert_threshold: default_failure_alert_threshold(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            admin_token_env: default_admin_token_env(),
            webhook_key_env: default_webhook_key_env(),
        }
    }
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            temperature: default_temperature(),
            timeout_secs: default_timeout(),
            retries: default_llm_retries(),
            max_output_tokens: default_max_output_tokens(),
            openai: OpenAiConfig::default(),
            anthropic: AnthropicConfig::default(),
        }
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_openai_api_key_env(),
            base_url: default_openai_base_url(),
        }
    }
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_anthropic_api_key_env(),
            base_url: default_anthropic_base_url(),
        }
    }
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            topics: default_topics(),
            templates: default_templates(),
            language: default_language(),
            min_content_chars: default_min_content_chars(),
            max_tags: default_max_tags(),
            forbidden_patterns: vec![],
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        let default_path = PathBuf::from("./config.toml");
        let path = config_path.unwrap_or(&default_path);

        if path.exists() {
            builder = builder.add_source(config::File::from(path));
        } else if config_path.is_some() {
            anyhow::bail!("Config file not found: {}", path.display());
        }

        // AUTOPOST__SECTION__KEY
        builder = builder.add_source(
            config::Environment::with_prefix("AUTOPOST")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to render configuration")
    }

    /// Generate example configuration as TOML string
    pub fn example_toml() -> String {
        r#"# autopost configuration

[general]
db_path = "./autopost.sqlite"
log_level = "info"

[automation]
default_interval_minutes = 10
# Re-arm the timer on `serve` when the stored status says running
resume_on_startup = true
# Lease shared through the database so only one process generates at a time (0 = off)
lease_ttl_secs = 600
failure_alert_threshold = 3

[server]
bind = "127.0.0.1:8080"
# Environment variables holding the secrets (values are never stored here)
admin_token_env = "AUTOPOST_ADMIN_TOKEN"
webhook_key_env = "AUTOPOST_CRON_KEY"

[llm]
provider = "openai"  # openai, anthropic, stub
model = "gpt-4o-mini"
temperature = 0.7
timeout_secs = 90
retries = 2
max_output_tokens = 2000

[llm.openai]
api_key_env = "OPENAI_API_KEY"
base_url = "https://api.openai.com/v1"

[llm.anthropic]
api_key_env = "ANTHROPIC_API_KEY"
base_url = "https://api.anthropic.com/v1"

[content]
language = "English"
min_content_chars = 200
max_tags = 8
topics = ["Rust async runtimes", "database indexing strategies", "edge computing"]
templates = ["a hands-on tutorial with code snippets", "an opinion piece weighing trade-offs"]
# forbidden_patterns = ["lorem ipsum"]
"#
        .to_string()
    }
}
