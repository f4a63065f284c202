//! Periodic show update pass.
//!
//! Each run walks the show registry, asks every show's indexer what changed
//! since the last run and queues full or per-season updates. Failures are
//! contained per show and collected in an [`UpdateReport`].

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use super::indexer::IndexerRegistry;
use super::progress::ProgressTracker;
use super::show_queue::{ActionHandle, ActionQueue, ShowQueueError};
use crate::db::{ShowRepository, UpdateTimestampStore};
use crate::domain::{Indexer, ShowKey};
use crate::models::show::Show;

/// Progress indicator key for the handles queued by a run.
pub const DAILY_UPDATE_KEY: &str = "dailyUpdate";

pub const DEFAULT_UPDATE_MAX_WEEKS: u32 = 12;

const WEEK_SECONDS: i64 = 604_800;

/// Work decided for one show during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduledWork {
    FullRefresh(Show),
    SeasonUpdate(Show, i32),
}

impl ScheduledWork {
    #[must_use]
    pub const fn show(&self) -> &Show {
        match self {
            Self::FullRefresh(show) | Self::SeasonUpdate(show, _) => show,
        }
    }

    const fn season(&self) -> Option<i32> {
        match self {
            Self::FullRefresh(_) => None,
            Self::SeasonUpdate(_, season) => Some(*season),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    Update { season: Option<i32> },
    Refresh,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkOutcome {
    Queued,
    /// Folded into an action already pending on the queue.
    Coalesced,
    SkippedPaused,
    /// The queue refused the action.
    Rejected(String),
    Failed(String),
}

impl WorkOutcome {
    const fn label(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Coalesced => "coalesced",
            Self::SkippedPaused => "paused",
            Self::Rejected(_) => "rejected",
            Self::Failed(_) => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReport {
    pub show: ShowKey,
    pub show_name: String,
    pub submission: Submission,
    pub outcome: WorkOutcome,
}

/// A show left unclassified because its indexer could not answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedShow {
    pub show: ShowKey,
    pub show_name: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateReport {
    /// Epoch seconds the run started at; stamped on updated indexers.
    pub started_at: i64,
    pub forced: bool,
    pub scheduled: Vec<ScheduledWork>,
    pub skipped: Vec<SkippedShow>,
    pub submissions: Vec<SubmissionReport>,
    pub stamped_indexers: Vec<Indexer>,
    /// Set when the run stopped before classifying any show.
    pub aborted: Option<String>,
}

impl UpdateReport {
    pub fn full_refreshes(&self) -> impl Iterator<Item = &Show> {
        self.scheduled.iter().filter_map(|work| match work {
            ScheduledWork::FullRefresh(show) => Some(show),
            ScheduledWork::SeasonUpdate(..) => None,
        })
    }

    pub fn season_updates(&self) -> impl Iterator<Item = (&Show, i32)> {
        self.scheduled.iter().filter_map(|work| match work {
            ScheduledWork::SeasonUpdate(show, season) => Some((show, *season)),
            ScheduledWork::FullRefresh(_) => None,
        })
    }

    #[must_use]
    pub fn queued_count(&self) -> usize {
        self.submissions
            .iter()
            .filter(|s| s.outcome == WorkOutcome::Queued)
            .count()
    }

    fn record(&mut self, show: &Show, submission: Submission, outcome: WorkOutcome) {
        metrics::counter!("show_updater_submissions_total", "outcome" => outcome.label())
            .increment(1);
        self.submissions.push(SubmissionReport {
            show: show.key(),
            show_name: show.name.clone(),
            submission,
            outcome,
        });
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed(UpdateReport),
    /// Another run held the guard; nothing was done.
    AlreadyRunning,
}

pub struct ShowUpdater {
    shows: Arc<dyn ShowRepository>,
    indexers: IndexerRegistry,
    timestamps: Arc<dyn UpdateTimestampStore>,
    queue: Arc<dyn ActionQueue>,
    progress: Arc<dyn ProgressTracker>,
    max_weeks: u32,
    guard: Mutex<()>,
}

impl ShowUpdater {
    pub fn new(
        shows: Arc<dyn ShowRepository>,
        indexers: IndexerRegistry,
        timestamps: Arc<dyn UpdateTimestampStore>,
        queue: Arc<dyn ActionQueue>,
        progress: Arc<dyn ProgressTracker>,
    ) -> Self {
        Self {
            shows,
            indexers,
            timestamps,
            queue,
            progress,
            max_weeks: DEFAULT_UPDATE_MAX_WEEKS,
            guard: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn with_max_weeks(mut self, max_weeks: u32) -> Self {
        self.max_weeks = max_weeks.max(1);
        self
    }

    /// Whether a run currently holds the guard.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.guard.try_lock().is_err()
    }

    pub async fn run(&self, force: bool) -> RunOutcome {
        self.run_at(force, Utc::now().timestamp()).await
    }

    /// Runs one pass as if the clock read `now` (epoch seconds).
    pub async fn run_at(&self, force: bool, now: i64) -> RunOutcome {
        let Ok(_guard) = self.guard.try_lock() else {
            info!(event = "show_update_skipped", "Show update already running");
            return RunOutcome::AlreadyRunning;
        };

        let start = Instant::now();
        info!(event = "show_update_started", forced = force, "Started periodic show updates");
        metrics::counter!("show_updater_runs_total").increment(1);

        let mut report = UpdateReport {
            started_at: now,
            forced: force,
            ..UpdateReport::default()
        };

        match self.shows.list_all().await {
            Ok(shows) => {
                for show in shows {
                    self.classify(show, now, &mut report).await;
                }
                self.submit(&mut report).await;
                self.stamp_indexers(now, &mut report).await;
            }
            Err(e) => {
                error!(event = "show_update_failed", error = %e, "Failed to load tracked shows");
                report.aborted = Some(e.to_string());
            }
        }

        metrics::histogram!("show_updater_run_duration_seconds")
            .record(start.elapsed().as_secs_f64());
        info!(
            event = "show_update_finished",
            scheduled = report.scheduled.len(),
            queued = report.queued_count(),
            skipped = report.skipped.len(),
            duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Finished periodic show updates"
        );

        RunOutcome::Completed(report)
    }

    async fn classify(&self, show: Show, now: i64, report: &mut UpdateReport) {
        let indexer = show.indexer;

        let client = match self.indexers.client(indexer) {
            Ok(client) => client,
            Err(e) => {
                warn!(
                    indexer = %indexer,
                    show = %show.name,
                    error = %e,
                    "Indexer seems to be having connectivity issues, skipping show"
                );
                report.skipped.push(SkippedShow {
                    show: show.key(),
                    show_name: show.name,
                    reason: e.to_string(),
                });
                return;
            }
        };

        if !client.supports_incremental_updates() {
            return;
        }

        let last_update = match self.timestamps.last_update(indexer.name()).await {
            Ok(last_update) => last_update,
            Err(e) => {
                error!(indexer = %indexer, show = %show.name, error = %e, "Failed to read last update time");
                report.skipped.push(SkippedShow {
                    show: show.key(),
                    show_name: show.name,
                    reason: e.to_string(),
                });
                return;
            }
        };

        let cutoff = now - WEEK_SECONDS * i64::from(self.max_weeks);
        let since = match last_update {
            Some(ts) if ts >= cutoff => ts,
            _ => {
                debug!(
                    show = %show.name,
                    indexer = %indexer,
                    weeks = self.max_weeks,
                    "Last update is missing or too old, doing a full update"
                );
                report.scheduled.push(ScheduledWork::FullRefresh(show));
                return;
            }
        };

        match client
            .last_updated_seasons(&[show.series_id], since, self.max_weeks)
            .await
        {
            Ok(mut updated) => {
                let seasons = updated.remove(&show.series_id).unwrap_or_default();
                if !seasons.is_empty() {
                    info!(show = %show.name, seasons = ?seasons, "Adding seasons to the update queue");
                }
                for season in seasons {
                    report
                        .scheduled
                        .push(ScheduledWork::SeasonUpdate(show.clone(), season));
                }
            }
            Err(e) => {
                warn!(
                    indexer = %indexer,
                    show = %show.name,
                    error = %e,
                    "Indexer failed to report updated seasons, skipping show"
                );
                report.skipped.push(SkippedShow {
                    show: show.key(),
                    show_name: show.name,
                    reason: e.to_string(),
                });
            }
        }
    }

    async fn submit(&self, report: &mut UpdateReport) {
        let mut handles: Vec<ActionHandle> = Vec::new();
        let scheduled = report.scheduled.clone();

        let (full, seasons): (Vec<_>, Vec<_>) = scheduled
            .iter()
            .partition(|work| matches!(work, ScheduledWork::FullRefresh(_)));

        for work in full.into_iter().chain(seasons) {
            let show = work.show();
            let submission = Submission::Update {
                season: work.season(),
            };

            if show.paused {
                info!(show = %show.name, "Show update skipped, show is paused");
                report.record(show, submission, WorkOutcome::SkippedPaused);
                continue;
            }

            match work.season() {
                Some(season) => info!(show = %show.name, season, "Updating season"),
                None => info!(show = %show.name, "Full update on show"),
            }

            let outcome = match self.queue.submit_update(show, work.season()).await {
                Ok(handle) => {
                    handles.push(handle);
                    WorkOutcome::Queued
                }
                Err(e) => Self::submission_failure(show, &e),
            };
            report.record(show, submission, outcome);
        }

        // Full refreshes refresh the show themselves once the update ends.
        let mut refreshed = HashSet::new();
        for (show, _) in scheduled.iter().filter_map(|work| match work {
            ScheduledWork::SeasonUpdate(show, season) => Some((show, *season)),
            ScheduledWork::FullRefresh(_) => None,
        }) {
            if !refreshed.insert(show.key()) {
                continue;
            }

            if show.paused {
                info!(show = %show.name, "Show refresh skipped, show is paused");
                report.record(show, Submission::Refresh, WorkOutcome::SkippedPaused);
                continue;
            }

            let outcome = match self.queue.submit_refresh(show, true).await {
                Ok(Some(handle)) => {
                    handles.push(handle);
                    WorkOutcome::Queued
                }
                Ok(None) => WorkOutcome::Coalesced,
                Err(e) => Self::submission_failure(show, &e),
            };
            report.record(show, Submission::Refresh, outcome);
        }

        self.progress.register(DAILY_UPDATE_KEY, handles).await;
    }

    fn submission_failure(show: &Show, err: &ShowQueueError) -> WorkOutcome {
        match err {
            ShowQueueError::CantUpdateShow { .. } | ShowQueueError::CantRefreshShow { .. } => {
                warn!(show = %show.name, error = %err, "Automatic update failed");
                WorkOutcome::Rejected(err.to_string())
            }
            ShowQueueError::Internal(_) => {
                error!(show = %show.name, error = %err, "Automatic update failed");
                WorkOutcome::Failed(err.to_string())
            }
        }
    }

    async fn stamp_indexers(&self, now: i64, report: &mut UpdateReport) {
        let indexers: BTreeSet<Indexer> = report
            .scheduled
            .iter()
            .map(ScheduledWork::show)
            .filter(|show| !show.paused)
            .map(|show| show.indexer)
            .collect();

        if indexers.is_empty() {
            info!("Completed but there was nothing to update");
            return;
        }

        for indexer in indexers {
            match self.timestamps.set_last_update(indexer.name(), now).await {
                Ok(()) => {
                    info!(indexer = %indexer, "Updated last update time");
                    report.stamped_indexers.push(indexer);
                }
                Err(e) => {
                    error!(indexer = %indexer, error = %e, "Failed to store last update time");
                }
            }
        }

        info!("Completed scheduling updates on shows");
    }
}
