// Main entry point for the vacancy aggregation service

mod config;
mod delivery;
mod scheduled_tasks;
mod stores;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use aggregation::{Distributor, HhSource, Scheduler, SchedulerConfig};
use telegram::{TelegramOptions, TelegramService};

use crate::config::Config;
use crate::delivery::TelegramChannel;
use crate::stores::PgStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,aggregation=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting vacancy aggregation service");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Configuration loaded");

    // Connect to database
    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(20)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connected");

    // Run migrations
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Migrations complete");

    // Verify the bot token before scheduling anything
    let telegram = TelegramService::new(TelegramOptions {
        bot_token: config.bot_token.clone(),
    });
    telegram
        .get_me()
        .await
        .map_err(anyhow::Error::msg)
        .context("Telegram bot token check failed")?;
    tracing::info!("Telegram bot token verified");

    // Wire the pipeline: Postgres stores, hh.uz source, Telegram delivery
    let store = Arc::new(PgStore::new(pool.clone()));
    let channel = Arc::new(TelegramChannel::new(telegram));
    let distributor = Distributor::new(store.clone(), channel);
    let pipeline = Arc::new(
        Scheduler::new(
            store.clone(),
            store,
            Arc::new(HhSource::new()),
            distributor,
        )
        .with_config(SchedulerConfig {
            max_concurrent_groups: config.max_concurrent_groups,
            page_limit: config.fetch_page_limit,
            fallback_location: config.fallback_location.clone(),
        }),
    );

    // Kick off one cycle immediately; the scheduler owns the rest
    {
        let pipeline = Arc::clone(&pipeline);
        tokio::spawn(async move {
            if let Err(e) = pipeline.run_cycle().await {
                tracing::error!("Initial scrape cycle failed: {}", e);
            }
        });
    }

    let mut scheduler =
        scheduled_tasks::start_scheduler(Arc::clone(&pipeline), config.scrape_interval_secs)
            .await
            .context("Failed to start scheduler")?;

    tracing::info!(
        "Service ready (scrape interval {}s, {} concurrent groups)",
        config.scrape_interval_secs,
        config.max_concurrent_groups
    );

    // Wait for shutdown; an in-flight cycle is abandoned best-effort, and
    // delivery records keep the next run from resending anything recorded.
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    tracing::info!("Shutting down...");
    scheduler.shutdown().await.ok();
    pool.close().await;
    tracing::info!("Shutdown complete");

    Ok(())
}
