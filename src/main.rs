use anyhow::Result;
use chrono::{Duration as ChronoDuration, Utc};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

mod bot;
mod config;
mod db;
mod identity;
mod live_scores;
mod notify;
mod odds;
mod snapshot;

use bot::HalftimeEngine;
use config::{Command, Config};
use db::Database;
use live_scores::Espn;
use notify::{DiscordWebhook, LogNotifier, Notifier};
use odds::TheOddsApi;
use snapshot::CaptureWindow;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise tracing / logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    config.validate()?;

    let db = Database::open(&config.database_path)?;
    info!("Alert journal opened: {}", config.database_path);

    let scores = Arc::new(Espn::new(&config.scoreboard_api_url, config.http_timeout_secs)?);
    let odds = Arc::new(TheOddsApi::new(
        config.odds_api_key.as_deref().unwrap_or_default(),
        &config.odds_api_url,
        config.http_timeout_secs,
    )?);

    let notifier: Arc<dyn Notifier> = if config.dry_run {
        info!("🟡 DRY RUN mode – alerts are logged, not posted");
        Arc::new(LogNotifier)
    } else {
        let urls = config
            .discord_webhook_urls
            .iter()
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .collect();
        Arc::new(DiscordWebhook::new(urls)?)
    };

    let mut engine = HalftimeEngine::new(
        config.clone(),
        db,
        scores,
        odds,
        notifier,
        Box::new(StdRng::from_entropy()),
        Utc::now(),
    );

    match config.command() {
        Command::Pregame => {
            engine.daily_setup(Utc::now()).await;
        }
        Command::Once => {
            let n = engine.poll_once(Utc::now()).await;
            info!("Single pass done: {} new halftime(s)", n);
        }
        Command::Recap { date } => {
            let date = date.unwrap_or_else(|| {
                CaptureWindow::containing(Utc::now(), config.capture_start_hour).operating_date()
                    - ChronoDuration::days(1)
            });
            engine.recap(date).await;
        }
        Command::Run => {
            let poll_interval = Duration::from_secs(config.poll_interval_secs);
            info!("Halftime monitor started (interval={:?})", poll_interval);
            let mut interval = tokio::time::interval(poll_interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        engine.poll_once(Utc::now()).await;
                    }
                    _ = tokio::signal::ctrl_c() => {
                        info!("Shutdown requested");
                        break;
                    }
                }
            }
        }
    }

    Ok(())
}
