//! Main entry point for the cabin finder.
//! Watches the campsites named on the command line and emails subscribers
//! when matching sites become available.

mod config;
mod registry;
mod schedule;

use std::sync::Arc;

use anyhow::{Context, Result};
use campground_scan::{
    AvailabilityFinder, CycleLog, CycleOutcome, FinderConfig, FuzzyDelay, ReqwestSessionFactory,
    SessionFactory,
};
use chrono::Utc;
use chrono_tz::Tz;
use clap::Parser;
use futures_util::future::join_all;
use notification_services::{EmailNotifier, EmailService, LogEmailService, SesEmailService};

use crate::config::{Cli, EnvConfig};
use crate::registry::{Registry, parse_campsite_info};
use crate::schedule::{periodic_wait, quiet_period_remaining};

async fn email_transport(cli: &Cli, env: &EnvConfig) -> Result<Arc<dyn EmailService>> {
    if cli.dry_run {
        log::info!("📝 Dry run: emails will only be logged");
        return Ok(Arc::new(LogEmailService));
    }
    let service = SesEmailService::new(env.sender(false)?)
        .await
        .context("Failed to initialize SES email service")?;
    log::info!("📧 Notification service initialized successfully");
    Ok(Arc::new(service))
}

async fn build_finders(cli: &Cli, env: &EnvConfig) -> Result<Vec<AvailabilityFinder>> {
    let mut registry = Registry::builtin();
    if let Some(path) = &cli.campsites {
        let added = registry.extend_from_file(path)?;
        log::info!("📁 Loaded {} campsites from {}", added, path.display());
    }

    let transport = email_transport(cli, env).await?;
    let sessions: Arc<dyn SessionFactory> = Arc::new(ReqwestSessionFactory::new(None));

    let mut finders = Vec::new();
    for arg in &cli.campsite_info {
        let info = parse_campsite_info(arg)?;
        let campsite = registry.campsite(&info.key)?;

        let parser = campsite
            .platform
            .build_parser(sessions.clone(), FuzzyDelay::standard())
            .with_context(|| format!("Failed to build parser for {}", info.key))?;
        let notifier = EmailNotifier::new(
            campsite.name.clone(),
            info.emails.clone(),
            env.admin_email.clone(),
            transport.clone(),
        )
        .with_context(|| format!("Invalid recipients for {}", info.key))?;

        let mut cycle_log = CycleLog::new(info.key.clone());
        if let Some(path) = &env.log_file {
            cycle_log = cycle_log.with_flush_file(path);
        }

        log::info!(
            "🏕️ Watching {} ({}) for {}",
            campsite.name,
            parser.platform_name(),
            info.emails.join(",")
        );
        finders.push(AvailabilityFinder::new(
            campsite.name,
            campsite.site_filter,
            parser,
            Arc::new(notifier),
            cycle_log,
            FinderConfig::default(),
        ));
    }
    Ok(finders)
}

/// Run every finder once, concurrently. Each finder reports its own failures.
async fn run_pass(finders: &mut [AvailabilityFinder], tz: Tz) {
    let today = Utc::now().with_timezone(&tz).date_naive();
    let outcomes = join_all(
        finders
            .iter_mut()
            .map(|finder| async move {
                let outcome = finder.run_at(today, Utc::now()).await;
                (finder.campsite().to_string(), outcome)
            }),
    )
    .await;

    for (campsite, outcome) in outcomes {
        match outcome {
            CycleOutcome::Notified(reason) => {
                log::info!("✅ {}: notified ({:?})", campsite, reason)
            }
            CycleOutcome::Skipped(reason) => {
                log::info!("💤 {}: nothing to send ({:?})", campsite, reason)
            }
            CycleOutcome::NotifyFailed(e) => log::warn!("⚠️ {}: {}", campsite, e),
            CycleOutcome::Failed(e) => log::error!("❌ {}: {}", campsite, e),
        }
    }
}

async fn wait_for_next_pass(cli: &Cli) {
    let wait = periodic_wait(cli.poll_interval());
    log::info!("⏳ Next pass in {:.0} seconds", wait.as_secs_f64());
    tokio::time::sleep(wait).await;

    let now = Utc::now().with_timezone(&cli.timezone).naive_local();
    if let Some(remaining) = quiet_period_remaining(now, cli.quiet_start, cli.quiet_end) {
        log::info!(
            "🌙 In quiet period, going to sleep for {:.2} hours",
            remaining.num_minutes() as f64 / 60.0
        );
        if let Ok(remaining) = remaining.to_std() {
            tokio::time::sleep(remaining).await;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let cli = Cli::parse();
    let env = EnvConfig::from_env();

    log::info!("🚀 Starting cabin finder...");
    let mut finders = build_finders(&cli, &env).await?;

    loop {
        run_pass(&mut finders, cli.timezone).await;
        if cli.once {
            break;
        }
        wait_for_next_pass(&cli).await;
    }

    log::info!("👋 Single pass finished");
    Ok(())
}
