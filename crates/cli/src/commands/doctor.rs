//! Doctor command - validate configuration and show status

use anyhow::Result;
use autopost_domain::StatusStore;
use serde::Serialize;
use std::path::PathBuf;

use super::{default_interval, open_database};
use crate::args::OutputArgs;
use crate::config::AppConfig;

#[derive(Debug, Serialize)]
struct DoctorReport {
    config: CheckResult,
    database: CheckResult,
    llm: CheckResult,
    admin_token: CheckResult,
    webhook_key: CheckResult,
    overall: String,
}

#[derive(Debug, Serialize)]
struct CheckResult {
    status: String,
    message: String,
    details: Option<serde_json::Value>,
}

impl CheckResult {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            status: "ok".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn warn(message: impl Into<String>) -> Self {
        Self {
            status: "warn".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    fn is_ok(&self) -> bool {
        self.status == "ok"
    }

    fn is_error(&self) -> bool {
        self.status == "error"
    }
}

pub async fn execute(args: OutputArgs, config_path: Option<PathBuf>) -> Result<()> {
    let mut report = DoctorReport {
        config: CheckResult::error("Not checked"),
        database: CheckResult::error("Not checked"),
        llm: CheckResult::error("Not checked"),
        admin_token: CheckResult::error("Not checked"),
        webhook_key: CheckResult::error("Not checked"),
        overall: "error".to_string(),
    };

    let config = match AppConfig::load(config_path.as_deref()) {
        Ok(c) => {
            report.config = check_config(&c);
            Some(c)
        }
        Err(e) => {
            report.config = CheckResult::error(format!("Failed to load config: {:#}", e));
            None
        }
    };

    if let Some(ref config) = config {
        report.database = check_database(config).await;
        report.llm = check_llm(config);
        report.admin_token = check_secret(&config.server.admin_token_env, "/api/automation");
        report.webhook_key = check_secret(&config.server.webhook_key_env, "/api/cron/generate");
    }

    let checks = [
        &report.config,
        &report.database,
        &report.llm,
        &report.admin_token,
        &report.webhook_key,
    ];

    let has_error = checks.iter().any(|c| c.is_error());
    let all_ok = checks.iter().all(|c| c.is_ok());

    report.overall = if has_error {
        "error".to_string()
    } else if all_ok {
        "ok".to_string()
    } else {
        "warn".to_string()
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if report.overall == "error" {
        std::process::exit(1);
    }

    Ok(())
}

fn check_config(config: &AppConfig) -> CheckResult {
    if let Err(e) = default_interval(config) {
        return CheckResult::error(format!("{:#}", e));
    }
    if config.content.topics.is_empty() {
        return CheckResult::warn("No content topics configured, using a generic topic");
    }
    CheckResult::ok("Configuration loaded successfully")
}

async fn check_database(config: &AppConfig) -> CheckResult {
    let db = match open_database(config).await {
        Ok(db) => db,
        Err(e) => return CheckResult::error(format!("{:#}", e)),
    };

    match db.status_store().load_or_default().await {
        Ok(status) => CheckResult::ok(format!(
            "{} ({}, {} posts)",
            config.general.db_path.display(),
            if status.is_running { "running" } else { "stopped" },
            status.total_posts
        ))
        .with_details(serde_json::json!({
            "is_running": status.is_running,
            "interval_minutes": status.interval_minutes.get(),
            "total_posts": status.total_posts,
        })),
        Err(e) => CheckResult::error(format!("Failed to read automation status: {}", e)),
    }
}

fn check_llm(config: &AppConfig) -> CheckResult {
    let provider = &config.llm.provider;
    let model = &config.llm.model;

    // Check the env var is set without revealing the value
    let api_key_env = match provider.as_str() {
        "openai" => &config.llm.openai.api_key_env,
        "anthropic" => &config.llm.anthropic.api_key_env,
        "stub" => return CheckResult::ok("Provider: stub (offline)"),
        other => return CheckResult::error(format!("Unknown provider: {}", other)),
    };

    if api_key_env.is_empty() {
        return CheckResult::error(format!("No API key env var configured for {}", provider));
    }

    match std::env::var(api_key_env) {
        Ok(val) if !val.is_empty() => CheckResult::ok(format!(
            "Provider: {}, Model: {}, API key: {} (set)",
            provider, model, api_key_env
        )),
        _ => CheckResult::warn(format!(
            "Provider: {}, Model: {}, API key: {} (not set)",
            provider, model, api_key_env
        )),
    }
}

fn check_secret(env_var: &str, endpoint: &str) -> CheckResult {
    if env_var.is_empty() {
        return CheckResult::warn(format!("No env var configured, {} is disabled", endpoint));
    }

    match std::env::var(env_var) {
        Ok(val) if !val.trim().is_empty() => CheckResult::ok(format!("{} (set)", env_var)),
        _ => CheckResult::warn(format!(
            "{} (not set), {} will reject every request",
            env_var, endpoint
        )),
    }
}

fn print_report(report: &DoctorReport) {
    println!("autopost Doctor Report");
    println!("======================");
    println!();

    print_check("Config", &report.config);
    print_check("Database", &report.database);
    print_check("LLM Provider", &report.llm);
    print_check("Admin Token", &report.admin_token);
    print_check("Webhook Key", &report.webhook_key);

    println!();
    let symbol = match report.overall.as_str() {
        "ok" => "✓",
        "warn" => "⚠",
        _ => "✗",
    };
    println!("{} Overall: {}", symbol, report.overall.to_uppercase());

    if report.overall != "error" {
        println!();
        println!("Try: autopost generate");
    }
}

fn print_check(name: &str, result: &CheckResult) {
    let symbol = match result.status.as_str() {
        "ok" => "✓",
        "warn" => "⚠",
        _ => "✗",
    };
    println!("{} {}: {}", symbol, name, result.message);
}
