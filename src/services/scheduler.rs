use anyhow::Result;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::{Duration, interval};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use super::show_updater::{RunOutcome, ShowUpdater};
use crate::config::SchedulerConfig;
use crate::state::SharedState;

pub type SchedulerState = Arc<RwLock<SharedState>>;

pub struct Scheduler {
    state: SchedulerState,
    config: SchedulerConfig,
    running: Arc<RwLock<bool>>,
}

impl Scheduler {
    pub fn new(state: SchedulerState, config: SchedulerConfig) -> Self {
        Self {
            state,
            config,
            running: Arc::new(RwLock::new(false)),
        }
    }

    pub async fn start(&self) -> Result<()> {
        if !self.config.enabled {
            info!("Scheduler is disabled in config");
            return Ok(());
        }

        *self.running.write().await = true;
        info!("Starting background scheduler");

        if self.config.run_on_startup {
            self.run_once(false).await;
        }

        if let Some(cron_expr) = &self.config.cron_expression {
            self.run_with_cron(cron_expr).await
        } else {
            self.run_with_interval().await
        }
    }

    async fn run_with_cron(&self, cron_expr: &str) -> Result<()> {
        let mut sched = JobScheduler::new().await?;

        let state = Arc::clone(&self.state);
        let running = Arc::clone(&self.running);

        let job = Job::new_async(cron_expr, move |_uuid, _lock| {
            let state = Arc::clone(&state);
            let running = Arc::clone(&running);
            Box::pin(async move {
                if !*running.read().await {
                    return;
                }
                let updater = Arc::clone(&state.read().await.show_updater);
                run_show_update(&updater, false).await;
            })
        })?;

        sched.add(job).await?;
        sched.start().await?;

        info!("Scheduler running with cron: {}", cron_expr);

        loop {
            if !*self.running.read().await {
                break;
            }
            tokio::time::sleep(Duration::from_secs(1)).await;
        }

        sched.shutdown().await?;
        Ok(())
    }

    async fn run_with_interval(&self) -> Result<()> {
        let interval_hours = self.config.show_update_interval_hours.max(1);

        info!("Scheduler running: show update every {}h", interval_hours);

        let mut update_interval = interval(Duration::from_secs(u64::from(interval_hours) * 60 * 60));
        // The first tick completes immediately; startup runs are opt-in.
        update_interval.tick().await;

        loop {
            update_interval.tick().await;
            if !*self.running.read().await {
                break;
            }

            self.run_once(false).await;
        }

        Ok(())
    }

    pub async fn stop(&self) {
        info!("Stopping scheduler...");
        *self.running.write().await = false;
    }

    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }

    pub async fn run_once(&self, force: bool) -> RunOutcome {
        let updater = Arc::clone(&self.state.read().await.show_updater);
        run_show_update(&updater, force).await
    }
}

async fn run_show_update(updater: &ShowUpdater, force: bool) -> RunOutcome {
    let start = std::time::Instant::now();
    info!(event = "job_started", job_name = "show_update", forced = force, "Starting scheduled show update");

    let outcome = updater.run(force).await;

    match &outcome {
        RunOutcome::Completed(report) => {
            if let Some(reason) = &report.aborted {
                error!(event = "job_failed", job_name = "show_update", error = %reason, "Scheduled show update failed");
            }
            info!(
                event = "job_finished",
                job_name = "show_update",
                queued = report.queued_count(),
                duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
                "Scheduled show update finished"
            );
        }
        RunOutcome::AlreadyRunning => {
            info!(event = "job_skipped", job_name = "show_update", "Show update already in progress");
        }
    }

    outcome
}
