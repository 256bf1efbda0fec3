//! Scheduled background tasks using tokio-cron-scheduler.
//!
//! One repeated job drives the scrape cycle. The cycle itself enforces
//! at-most-one concurrent run through its own lock, so a firing that lands
//! while a long cycle is still going is coalesced inside `run_cycle`, not
//! queued here.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio_cron_scheduler::{Job, JobScheduler};

use aggregation::Scheduler;

/// Start all scheduled tasks
pub async fn start_scheduler(pipeline: Arc<Scheduler>, interval_secs: u64) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let scrape_pipeline = Arc::clone(&pipeline);
    let scrape_job = Job::new_repeated_async(
        Duration::from_secs(interval_secs),
        move |_uuid, _lock| {
            let pipeline = Arc::clone(&scrape_pipeline);
            Box::pin(async move {
                match pipeline.run_cycle().await {
                    Ok(report) if report.coalesced => {
                        tracing::warn!("Scrape firing coalesced into the running cycle");
                    }
                    Ok(report) => {
                        tracing::info!(
                            groups = report.groups,
                            failed_groups = report.failed_groups,
                            active_users = report.active_users,
                            "Scrape cycle finished"
                        );
                    }
                    Err(e) => {
                        // Next firing retries naturally.
                        tracing::error!("Scrape cycle failed: {}", e);
                    }
                }
            })
        },
    )?;

    scheduler.add(scrape_job).await?;
    scheduler.start().await?;

    tracing::info!("Scheduled tasks started (scrape cycle every {}s)", interval_secs);
    Ok(scheduler)
}
