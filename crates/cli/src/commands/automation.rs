//! start/stop/status/generate - one-shot operations on the stored automation state

use anyhow::{Context, Result};
use autopost_domain::{
    AutomationStatus, GenerationReport, IntervalMinutes, StatusPatch, StatusStore, TriggerSource,
};
use std::path::PathBuf;
use time::format_description::well_known::Rfc3339;

use super::{build_controller, default_interval, open_database};
use crate::args::{OutputArgs, StartArgs};
use crate::config::AppConfig;

/// Persist `is_running = true`.
///
/// A running `serve` process picks this up on its next tick or restart.
pub async fn start(args: StartArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;

    let interval = match args.interval_minutes {
        Some(minutes) => IntervalMinutes::from_signed(minutes)?,
        None => default_interval(&config)?,
    };

    let db = open_database(&config).await?;
    let status = db
        .status_store()
        .apply(&StatusPatch::started(interval))
        .await
        .context("Failed to update automation status")?;

    tracing::info!(interval_minutes = interval.get(), "Automation marked as running");
    print_status(&status, args.json)
}

pub async fn stop(args: OutputArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;

    let db = open_database(&config).await?;
    let status = db
        .status_store()
        .apply(&StatusPatch::stopped())
        .await
        .context("Failed to update automation status")?;

    tracing::info!("Automation marked as stopped");
    print_status(&status, args.json)
}

pub async fn status(args: OutputArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;

    let db = open_database(&config).await?;
    let status = db
        .status_store()
        .load_or_default()
        .await
        .context("Failed to read automation status")?;

    print_status(&status, args.json)
}

/// Generate one post now, whether or not automation is running
pub async fn generate(args: OutputArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;

    let db = open_database(&config).await?;
    let controller = build_controller(&config, &db)?;

    let report = controller
        .execute_generation(TriggerSource::Cli)
        .await
        .context("Generation failed")?;

    if args.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        println!("{}", json);
    } else {
        print_report(&report);
    }

    Ok(())
}

fn print_status(status: &AutomationStatus, json: bool) -> Result<()> {
    if json {
        let json = serde_json::to_string_pretty(status).context("Failed to serialize status")?;
        println!("{}", json);
        return Ok(());
    }

    let state = if status.is_running { "running" } else { "stopped" };
    let last = match status.last_generated_at {
        Some(at) => at.format(&Rfc3339).context("Failed to format timestamp")?,
        None => "never".to_string(),
    };

    println!("Automation:  {}", state);
    println!("Interval:    {} minutes", status.interval_minutes.get());
    println!("Last post:   {}", last);
    println!("Total posts: {}", status.total_posts);

    Ok(())
}

fn print_report(report: &GenerationReport) {
    println!("Generated: {}", report.post.title);
    println!("Slug:      {}", report.post.slug);
    if !report.post.tags.is_empty() {
        println!("Tags:      {}", report.post.tags.join(", "));
    }
    if let Some(category) = &report.post.category {
        println!("Category:  {}", category);
    }

    for failure in &report.taxonomy_failures {
        println!("⚠ {}", failure);
    }
}
