//! Subcommands and the wiring they share

pub mod automation;
pub mod config;
pub mod doctor;
pub mod serve;

use anyhow::{Context, Result, bail};
use autopost_adapters::http::{SecretDigest, SharedController};
use autopost_adapters::llm::{
    AnthropicGenerator, LlmConfig, OpenAiGenerator, PromptConfig, PromptRotation, StubGenerator,
};
use autopost_adapters::sqlite::Database;
use autopost_domain::policy::{DraftPolicy, DraftPolicyConfig};
use autopost_domain::usecases::{AutomationConfig, LeaseConfig};
use autopost_domain::{ContentGenerator, IntervalMinutes, SystemClock};
use secrecy::SecretString;
use std::sync::Arc;
use std::time::Duration;
use time::OffsetDateTime;

use crate::config::AppConfig;

pub(crate) async fn open_database(config: &AppConfig) -> Result<Database> {
    Database::open(&config.general.db_path)
        .await
        .with_context(|| {
            format!(
                "Failed to open database at {}",
                config.general.db_path.display()
            )
        })
}

pub(crate) fn load_api_key(env_var: &str, provider: &str) -> Result<SecretString> {
    if env_var.trim().is_empty() {
        bail!("No API key env var configured for provider {}", provider);
    }

    let key = std::env::var(env_var).with_context(|| {
        format!(
            "Missing API key env var {} for provider {}",
            env_var, provider
        )
    })?;

    if key.trim().is_empty() {
        bail!(
            "API key env var {} is empty for provider {}",
            env_var,
            provider
        );
    }

    Ok(SecretString::new(key.into()))
}

/// Digest of the secret held in `env_var`, if it is set and non-empty
pub(crate) fn load_secret_digest(env_var: &str) -> Option<SecretDigest> {
    if env_var.trim().is_empty() {
        return None;
    }

    std::env::var(env_var)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(|value| SecretDigest::new(&SecretString::new(value.into())))
}

pub(crate) fn build_generator(config: &AppConfig) -> Result<Arc<dyn ContentGenerator>> {
    let llm = LlmConfig {
        model: config.llm.model.clone(),
        temperature: config.llm.temperature,
        max_output_tokens: config.llm.max_output_tokens,
        timeout_secs: config.llm.timeout_secs,
        retries: config.llm.retries,
    };
    let prompts = PromptRotation::new(PromptConfig {
        topics: config.content.topics.clone(),
        templates: config.content.templates.clone(),
        language: config.content.language.clone(),
    });

    let generator: Arc<dyn ContentGenerator> = match config.llm.provider.as_str() {
        "openai" => {
            let api_key = load_api_key(&config.llm.openai.api_key_env, "openai")?;
            Arc::new(OpenAiGenerator::with_base_url(
                api_key,
                config.llm.openai.base_url.clone(),
                llm,
                prompts,
            ))
        }
        "anthropic" => {
            let api_key = load_api_key(&config.llm.anthropic.api_key_env, "anthropic")?;
            Arc::new(AnthropicGenerator::with_base_url(
                api_key,
                config.llm.anthropic.base_url.clone(),
                llm,
                prompts,
            ))
        }
        "stub" => Arc::new(StubGenerator::numbered()),
        other => bail!("Unknown LLM provider: {}", other),
    };

    tracing::debug!(provider = %config.llm.provider, model = %config.llm.model, "Built content generator");
    Ok(generator)
}

pub(crate) fn draft_policy(config: &AppConfig) -> DraftPolicy {
    DraftPolicy::new(DraftPolicyConfig {
        min_content_chars: config.content.min_content_chars,
        max_tags: config.content.max_tags,
        forbidden_patterns: config.content.forbidden_patterns.clone(),
        ..Default::default()
    })
}

pub(crate) fn automation_config(config: &AppConfig) -> AutomationConfig {
    let lease = (config.automation.lease_ttl_secs > 0).then(|| LeaseConfig {
        holder: format!(
            "pid-{}-{}",
            std::process::id(),
            OffsetDateTime::now_utc().unix_timestamp_nanos()
        ),
        ttl: Duration::from_secs(config.automation.lease_ttl_secs),
    });

    AutomationConfig {
        lease,
        failure_alert_threshold: config.automation.failure_alert_threshold,
    }
}

pub(crate) fn default_interval(config: &AppConfig) -> Result<IntervalMinutes> {
    IntervalMinutes::new(config.automation.default_interval_minutes)
        .context("Invalid automation.default_interval_minutes")
}

pub(crate) fn build_controller(config: &AppConfig, db: &Database) -> Result<SharedController> {
    let generator = build_generator(config)?;

    Ok(SharedController::new(
        Arc::new(db.status_store()),
        generator,
        Arc::new(db.post_repository()),
        Arc::new(SystemClock),
        draft_policy(config),
        automation_config(config),
    ))
}
