//! Periodic show updates wired to a real store and show queue.

mod common;

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use common::temp_store;
use showarr::config::{Config, ShowQueueConfig};
use showarr::db::{Store, UpdateTimestampStore};
use showarr::domain::{Indexer, SeriesId};
use showarr::models::Show;
use showarr::services::{
    DAILY_UPDATE_KEY, IndexerError, IndexerGateway, IndexerRegistry, ProgressIndicators,
    RunOutcome, Scheduler, ShowActions, ShowQueue, ShowUpdater, UpdateReport, UpdatedSeasons,
    WorkOutcome,
};
use showarr::state::SharedState;
use tokio::sync::RwLock;

struct StaticIndexer {
    seasons: HashMap<SeriesId, BTreeSet<i32>>,
}

#[async_trait::async_trait]
impl IndexerGateway for StaticIndexer {
    fn indexer(&self) -> Indexer {
        Indexer::Tvmaze
    }

    fn supports_incremental_updates(&self) -> bool {
        true
    }

    async fn last_updated_seasons(
        &self,
        series_ids: &[SeriesId],
        _since: i64,
        _max_weeks: u32,
    ) -> Result<UpdatedSeasons, IndexerError> {
        Ok(series_ids
            .iter()
            .filter_map(|id| self.seasons.get(id).map(|s| (*id, s.clone())))
            .collect())
    }
}

fn updater(store: &Store, seasons: HashMap<SeriesId, BTreeSet<i32>>) -> (ShowUpdater, ProgressIndicators) {
    let store_arc = Arc::new(store.clone());
    let queue = ShowQueue::new(
        Arc::new(ShowActions::from_store(store)),
        ShowQueueConfig {
            retry_attempts: 0,
            retry_delay_seconds: 0,
            ..ShowQueueConfig::default()
        },
    );
    let progress = ProgressIndicators::new();
    let indexers = IndexerRegistry::new().with(Arc::new(StaticIndexer { seasons }));

    let updater = ShowUpdater::new(
        store_arc.clone(),
        indexers,
        store_arc,
        Arc::new(queue),
        Arc::new(progress.clone()),
    );
    (updater, progress)
}

async fn wait_for_progress(progress: &ProgressIndicators) {
    tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            if let Some(p) = progress.progress(DAILY_UPDATE_KEY).await
                && p.is_complete()
            {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("queued actions did not finish in time");
}

fn completed(outcome: RunOutcome) -> UpdateReport {
    match outcome {
        RunOutcome::Completed(report) => report,
        RunOutcome::AlreadyRunning => panic!("updater reported a concurrent run"),
    }
}

#[tokio::test]
async fn first_run_fully_updates_and_generates_templates() {
    let store = temp_store().await;
    let show = Show::new(Indexer::Tvmaze, SeriesId::new(82), "Foo");
    store.add_show(&show).await.unwrap();

    let (updater, progress) = updater(&store, HashMap::new());
    let report = completed(updater.run(false).await);

    assert_eq!(report.full_refreshes().count(), 1);
    assert_eq!(report.season_updates().count(), 0);
    assert_eq!(report.stamped_indexers, vec![Indexer::Tvmaze]);
    assert_eq!(
        store.last_update(Indexer::Tvmaze.name()).await.unwrap(),
        Some(report.started_at)
    );

    wait_for_progress(&progress).await;

    let templates = store.get_search_templates(show.key()).await.unwrap();
    let patterns: Vec<_> = templates.iter().map(|t| t.template().to_string()).collect();
    assert_eq!(patterns, vec!["Foo S%0SE%0E", "Foo %0S"]);
}

#[tokio::test]
async fn recent_timestamp_queues_changed_seasons_and_a_refresh() {
    let store = temp_store().await;
    let show = Show::new(Indexer::Tvmaze, SeriesId::new(82), "Foo");
    store.add_show(&show).await.unwrap();

    let now = chrono::Utc::now().timestamp();
    store.set_last_update(Indexer::Tvmaze.name(), now - 3600).await.unwrap();

    let seasons = HashMap::from([(SeriesId::new(82), BTreeSet::from([2, 3]))]);
    let (updater, progress) = updater(&store, seasons);
    let report = completed(updater.run_at(false, now).await);

    let updated: Vec<_> = report.season_updates().map(|(_, season)| season).collect();
    assert_eq!(updated, vec![2, 3]);
    assert_eq!(report.full_refreshes().count(), 0);

    // Two season updates plus one refresh queued behind them.
    assert_eq!(report.submissions.len(), 3);
    assert!(
        report
            .submissions
            .iter()
            .all(|s| s.outcome == WorkOutcome::Queued),
        "unexpected outcomes {:?}",
        report.submissions
    );

    assert_eq!(store.last_update(Indexer::Tvmaze.name()).await.unwrap(), Some(now));
    wait_for_progress(&progress).await;

    let done = progress.progress(DAILY_UPDATE_KEY).await.unwrap();
    assert_eq!(done.total, 3);
    assert_eq!(done.finished, 3);
}

#[tokio::test]
async fn paused_shows_are_not_submitted_nor_stamped() {
    let store = temp_store().await;
    let mut show = Show::new(Indexer::Tvmaze, SeriesId::new(5), "Paused");
    show.paused = true;
    store.add_show(&show).await.unwrap();

    let (updater, _progress) = updater(&store, HashMap::new());
    let report = completed(updater.run(true).await);

    assert!(report.forced);
    assert_eq!(report.full_refreshes().count(), 1);
    assert!(report.submissions.iter().all(|s| s.outcome == WorkOutcome::SkippedPaused));
    assert!(report.stamped_indexers.is_empty());
    assert_eq!(store.last_update(Indexer::Tvmaze.name()).await.unwrap(), None);
}

#[tokio::test]
async fn scheduler_run_skips_shows_without_an_indexer_client() {
    let store = temp_store().await;
    store
        .add_show(&Show::new(Indexer::Tvdb, SeriesId::new(1), "Foo"))
        .await
        .unwrap();

    let mut config = Config::default();
    config.indexers.tvmaze.enabled = false;
    let scheduler_config = config.scheduler.clone();
    let state = SharedState::with_store(config, store.clone()).unwrap();

    let scheduler = Scheduler::new(Arc::new(RwLock::new(state)), scheduler_config);
    let report = completed(scheduler.run_once(true).await);

    assert_eq!(report.skipped.len(), 1);
    assert!(report.scheduled.is_empty());
    assert!(report.stamped_indexers.is_empty());
    assert!(!scheduler.is_running().await);
}
