//! Bounded queue of show update and refresh actions.
//!
//! Actions for the same show run one at a time; actions for different shows
//! run concurrently up to `max_concurrent_actions`.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::sync::{Mutex, Semaphore, watch};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::ShowQueueConfig;
use crate::domain::ShowKey;
use crate::models::show::Show;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShowQueueError {
    #[error("Can't update show {show}: {reason}")]
    CantUpdateShow { show: ShowKey, reason: String },

    #[error("Can't refresh show {show}: {reason}")]
    CantRefreshShow { show: ShowKey, reason: String },

    #[error("Show queue error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for ShowQueueError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    /// Re-fetch metadata; `None` covers every season.
    Update { season: Option<i32> },
    /// Re-read the show from the library.
    Refresh,
}

impl ActionKind {
    const fn label(self) -> &'static str {
        match self {
            Self::Update { .. } => "update",
            Self::Refresh => "refresh",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Update { season: Some(s) } => write!(f, "update season {s}"),
            Self::Update { season: None } => f.write_str("update"),
            Self::Refresh => f.write_str("refresh"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionStatus {
    Queued,
    Running,
    Finished,
    Failed,
}

impl ActionStatus {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Finished | Self::Failed)
    }

    const fn label(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Finished => "finished",
            Self::Failed => "failed",
        }
    }
}

/// Observer for one queued action.
#[derive(Debug, Clone)]
pub struct ActionHandle {
    id: Uuid,
    show: ShowKey,
    kind: ActionKind,
    status: watch::Receiver<ActionStatus>,
}

impl ActionHandle {
    #[must_use]
    pub fn new(show: ShowKey, kind: ActionKind) -> (Self, watch::Sender<ActionStatus>) {
        let (tx, rx) = watch::channel(ActionStatus::Queued);
        let handle = Self {
            id: Uuid::new_v4(),
            show,
            kind,
            status: rx,
        };
        (handle, tx)
    }

    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub const fn show(&self) -> ShowKey {
        self.show
    }

    #[must_use]
    pub const fn kind(&self) -> ActionKind {
        self.kind
    }

    #[must_use]
    pub fn status(&self) -> ActionStatus {
        *self.status.borrow()
    }

    const fn season(&self) -> Option<i32> {
        match self.kind {
            ActionKind::Update { season } => season,
            ActionKind::Refresh => None,
        }
    }

    /// Waits until the action finishes or fails.
    pub async fn wait(&self) -> ActionStatus {
        let mut rx = self.status.clone();
        loop {
            let current = *rx.borrow_and_update();
            if current.is_terminal() {
                return current;
            }
            if rx.changed().await.is_err() {
                return *rx.borrow();
            }
        }
    }
}

/// Accepts show actions for background execution.
#[async_trait::async_trait]
pub trait ActionQueue: Send + Sync {
    /// Queues a metadata update for the whole show or a single season.
    ///
    /// # Errors
    ///
    /// - [`ShowQueueError::CantUpdateShow`] if an overlapping update is pending
    async fn submit_update(
        &self,
        show: &Show,
        season: Option<i32>,
    ) -> Result<ActionHandle, ShowQueueError>;

    /// Queues a refresh.
    ///
    /// Without `bypass_throttle` a refresh requested while an update is pending
    /// is folded into that update and `Ok(None)` is returned. With it the
    /// refresh is queued and runs once the pending updates have ended.
    /// `Ok(None)` is also returned when a bypassing refresh finds one already
    /// queued.
    ///
    /// # Errors
    ///
    /// - [`ShowQueueError::CantRefreshShow`] if a refresh is pending or the show
    ///   was refreshed recently and `bypass_throttle` is false
    async fn submit_refresh(
        &self,
        show: &Show,
        bypass_throttle: bool,
    ) -> Result<Option<ActionHandle>, ShowQueueError>;
}

/// Performs the work behind queued actions.
#[async_trait::async_trait]
pub trait ShowActionExecutor: Send + Sync {
    async fn update_show(&self, show: ShowKey, season: Option<i32>) -> anyhow::Result<()>;

    async fn refresh_show(&self, show: ShowKey) -> anyhow::Result<()>;
}

#[derive(Default)]
struct PendingActions {
    updates: Vec<ActionHandle>,
    refresh: Option<Uuid>,
}

impl PendingActions {
    fn is_empty(&self) -> bool {
        self.updates.is_empty() && self.refresh.is_none()
    }

    fn conflicting_update(&self, season: Option<i32>) -> Option<String> {
        self.updates.iter().find_map(|handle| match (handle.season(), season) {
            (None, _) => Some("a full update is already queued".to_string()),
            (Some(_), None) => Some("a season update is already queued".to_string()),
            (Some(a), Some(b)) if a == b => Some(format!("season {a} is already queued")),
            _ => None,
        })
    }
}

#[derive(Default)]
struct QueueState {
    pending: HashMap<ShowKey, PendingActions>,
    last_refresh: HashMap<ShowKey, Instant>,
}

struct QueueInner {
    executor: Arc<dyn ShowActionExecutor>,
    config: ShowQueueConfig,
    permits: Semaphore,
    state: Mutex<QueueState>,
    show_locks: Mutex<HashMap<ShowKey, Arc<Mutex<()>>>>,
}

#[derive(Clone)]
pub struct ShowQueue {
    inner: Arc<QueueInner>,
}

impl ShowQueue {
    pub fn new(executor: Arc<dyn ShowActionExecutor>, config: ShowQueueConfig) -> Self {
        let permits = Semaphore::new(config.max_concurrent_actions.max(1));
        Self {
            inner: Arc::new(QueueInner {
                executor,
                config,
                permits,
                state: Mutex::new(QueueState::default()),
                show_locks: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Number of queued or running actions.
    pub async fn pending_count(&self) -> usize {
        let state = self.inner.state.lock().await;
        state
            .pending
            .values()
            .map(|p| p.updates.len() + usize::from(p.refresh.is_some()))
            .sum()
    }

    /// Runs `handle` in the background once every action in `after` has ended.
    fn spawn(
        &self,
        handle: &ActionHandle,
        status: watch::Sender<ActionStatus>,
        after: Vec<ActionHandle>,
    ) {
        let inner = Arc::clone(&self.inner);
        let id = handle.id();
        let show = handle.show();
        let kind = handle.kind();

        tokio::spawn(async move {
            for previous in &after {
                previous.wait().await;
            }

            let show_lock = {
                let mut locks = inner.show_locks.lock().await;
                Arc::clone(locks.entry(show).or_default())
            };
            let _show_guard = show_lock.lock().await;

            let outcome = match inner.permits.acquire().await {
                Ok(_permit) => {
                    status.send_replace(ActionStatus::Running);
                    inner.execute(show, kind).await
                }
                Err(e) => Err(anyhow::anyhow!("queue closed: {e}")),
            };

            let final_status = match outcome {
                Ok(()) => {
                    info!(event = "show_action_finished", show = %show, action = %kind, "Show action finished");
                    ActionStatus::Finished
                }
                Err(e) => {
                    error!(event = "show_action_failed", show = %show, action = %kind, error = %e, "Show action failed");
                    ActionStatus::Failed
                }
            };

            metrics::counter!(
                "show_queue_actions_total",
                "kind" => kind.label(),
                "status" => final_status.label()
            )
            .increment(1);

            inner.complete(show, id, kind).await;
            status.send_replace(final_status);
        });
    }
}

impl QueueInner {
    async fn execute(&self, show: ShowKey, kind: ActionKind) -> anyhow::Result<()> {
        let attempts = self.config.retry_attempts + 1;
        let mut attempt = 1;

        loop {
            debug!(show = %show, action = %kind, attempt, "Running show action");
            let result = match kind {
                ActionKind::Update { season } => self.executor.update_show(show, season).await,
                ActionKind::Refresh => self.executor.refresh_show(show).await,
            };

            match result {
                Ok(()) => return Ok(()),
                Err(e) if attempt < attempts => {
                    warn!(
                        show = %show,
                        action = %kind,
                        attempt,
                        error = %e,
                        "Show action failed, retrying in {}s",
                        self.config.retry_delay_seconds
                    );
                    tokio::time::sleep(Duration::from_secs(self.config.retry_delay_seconds)).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn complete(&self, show: ShowKey, id: Uuid, kind: ActionKind) {
        let mut state = self.state.lock().await;

        if kind == ActionKind::Refresh {
            state.last_refresh.insert(show, Instant::now());
        }

        if let Some(pending) = state.pending.get_mut(&show) {
            pending.updates.retain(|handle| handle.id() != id);
            if pending.refresh == Some(id) {
                pending.refresh = None;
            }
            if pending.is_empty() {
                state.pending.remove(&show);
            }
        }
    }
}

#[async_trait::async_trait]
impl ActionQueue for ShowQueue {
    async fn submit_update(
        &self,
        show: &Show,
        season: Option<i32>,
    ) -> Result<ActionHandle, ShowQueueError> {
        let key = show.key();
        let kind = ActionKind::Update { season };

        let (handle, status) = {
            let mut state = self.inner.state.lock().await;
            let pending = state.pending.entry(key).or_default();

            if let Some(reason) = pending.conflicting_update(season) {
                return Err(ShowQueueError::CantUpdateShow { show: key, reason });
            }

            let (handle, status) = ActionHandle::new(key, kind);
            pending.updates.push(handle.clone());
            (handle, status)
        };

        info!(event = "show_action_queued", show = %show.name, action = %kind, "Queued show action");
        self.spawn(&handle, status, Vec::new());
        Ok(handle)
    }

    async fn submit_refresh(
        &self,
        show: &Show,
        bypass_throttle: bool,
    ) -> Result<Option<ActionHandle>, ShowQueueError> {
        let key = show.key();
        let throttle = Duration::from_secs(self.inner.config.refresh_throttle_seconds);

        let (handle, status, after) = {
            let mut state = self.inner.state.lock().await;

            let recently_refreshed = state
                .last_refresh
                .get(&key)
                .is_some_and(|at| at.elapsed() < throttle);

            let pending = state.pending.entry(key).or_default();

            if !pending.updates.is_empty() && !bypass_throttle {
                debug!(show = %show.name, "Refresh folded into pending update");
                return Ok(None);
            }

            if pending.refresh.is_some() {
                if bypass_throttle {
                    return Ok(None);
                }
                return Err(ShowQueueError::CantRefreshShow {
                    show: key,
                    reason: "a refresh is already queued".to_string(),
                });
            }

            if recently_refreshed && !bypass_throttle {
                if pending.is_empty() {
                    state.pending.remove(&key);
                }
                return Err(ShowQueueError::CantRefreshShow {
                    show: key,
                    reason: "refreshed too recently".to_string(),
                });
            }

            let (handle, status) = ActionHandle::new(key, ActionKind::Refresh);
            pending.refresh = Some(handle.id());
            (handle, status, pending.updates.clone())
        };

        info!(
            event = "show_action_queued",
            show = %show.name,
            action = "refresh",
            after_updates = after.len(),
            "Queued show action"
        );
        self.spawn(&handle, status, after);
        Ok(Some(handle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Indexer, SeriesId};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<(ShowKey, ActionKind)>>,
        failures_left: AtomicUsize,
        gate: Option<Arc<Semaphore>>,
    }

    #[async_trait::async_trait]
    impl ShowActionExecutor for Recorder {
        async fn update_show(&self, show: ShowKey, season: Option<i32>) -> anyhow::Result<()> {
            if let Some(gate) = &self.gate {
                gate.acquire().await.unwrap().forget();
            }
            self.calls
                .lock()
                .await
                .push((show, ActionKind::Update { season }));
            if self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                anyhow::bail!("indexer hiccup");
            }
            Ok(())
        }

        async fn refresh_show(&self, show: ShowKey) -> anyhow::Result<()> {
            self.calls.lock().await.push((show, ActionKind::Refresh));
            Ok(())
        }
    }

    fn config() -> ShowQueueConfig {
        ShowQueueConfig {
            max_concurrent_actions: 2,
            retry_attempts: 1,
            retry_delay_seconds: 0,
            refresh_throttle_seconds: 600,
        }
    }

    fn show(id: i32) -> Show {
        Show::new(Indexer::Tvmaze, SeriesId::new(id), format!("Show {id}"))
    }

    #[tokio::test]
    async fn update_runs_and_finishes() {
        let recorder = Arc::new(Recorder::default());
        let queue = ShowQueue::new(recorder.clone(), config());

        let handle = queue.submit_update(&show(1), None).await.unwrap();
        assert_eq!(handle.wait().await, ActionStatus::Finished);

        let calls = recorder.calls.lock().await;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, ActionKind::Update { season: None });
        drop(calls);
        assert_eq!(queue.pending_count().await, 0);
    }

    #[tokio::test]
    async fn retries_recoverable_failures() {
        let recorder = Arc::new(Recorder {
            failures_left: AtomicUsize::new(1),
            ..Recorder::default()
        });
        let queue = ShowQueue::new(recorder.clone(), config());

        let handle = queue.submit_update(&show(1), Some(2)).await.unwrap();
        assert_eq!(handle.wait().await, ActionStatus::Finished);
        assert_eq!(recorder.calls.lock().await.len(), 2);
    }

    #[tokio::test]
    async fn fails_after_exhausting_retries() {
        let recorder = Arc::new(Recorder {
            failures_left: AtomicUsize::new(5),
            ..Recorder::default()
        });
        let queue = ShowQueue::new(recorder.clone(), config());

        let handle = queue.submit_update(&show(1), None).await.unwrap();
        assert_eq!(handle.wait().await, ActionStatus::Failed);
        assert_eq!(recorder.calls.lock().await.len(), 2);
    }

    #[tokio::test]
    async fn rejects_overlapping_updates_but_allows_other_seasons() {
        let gate = Arc::new(Semaphore::new(0));
        let recorder = Arc::new(Recorder {
            gate: Some(gate.clone()),
            ..Recorder::default()
        });
        let queue = ShowQueue::new(recorder, config());
        let foo = show(1);

        let first = queue.submit_update(&foo, Some(1)).await.unwrap();
        let second = queue.submit_update(&foo, Some(2)).await.unwrap();

        assert!(matches!(
            queue.submit_update(&foo, Some(1)).await,
            Err(ShowQueueError::CantUpdateShow { .. })
        ));
        assert!(matches!(
            queue.submit_update(&foo, None).await,
            Err(ShowQueueError::CantUpdateShow { .. })
        ));

        assert_eq!(queue.submit_refresh(&foo, false).await.unwrap().map(|h| h.id()), None);

        gate.add_permits(2);
        first.wait().await;
        second.wait().await;
    }

    #[tokio::test]
    async fn bypassing_refresh_runs_after_pending_updates() {
        let gate = Arc::new(Semaphore::new(0));
        let recorder = Arc::new(Recorder {
            gate: Some(gate.clone()),
            ..Recorder::default()
        });
        let queue = ShowQueue::new(recorder.clone(), config());
        let foo = show(1);

        let first = queue.submit_update(&foo, Some(1)).await.unwrap();
        let second = queue.submit_update(&foo, Some(2)).await.unwrap();
        let refresh = queue
            .submit_refresh(&foo, true)
            .await
            .unwrap()
            .expect("bypassing refresh should be queued");

        assert_eq!(queue.submit_refresh(&foo, true).await.unwrap().map(|h| h.id()), None);
        assert_eq!(refresh.status(), ActionStatus::Queued);

        gate.add_permits(2);
        assert_eq!(refresh.wait().await, ActionStatus::Finished);
        assert!(first.status().is_terminal());
        assert!(second.status().is_terminal());

        let calls = recorder.calls.lock().await;
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[2], (foo.key(), ActionKind::Refresh));
        drop(calls);
        assert_eq!(queue.pending_count().await, 0);
    }

    #[tokio::test]
    async fn throttles_refresh_unless_bypassed() {
        let recorder = Arc::new(Recorder::default());
        let queue = ShowQueue::new(recorder.clone(), config());
        let foo = show(1);

        let handle = queue.submit_refresh(&foo, false).await.unwrap().unwrap();
        assert_eq!(handle.wait().await, ActionStatus::Finished);

        assert!(matches!(
            queue.submit_refresh(&foo, false).await,
            Err(ShowQueueError::CantRefreshShow { .. })
        ));

        let bypassed = queue.submit_refresh(&foo, true).await.unwrap().unwrap();
        assert_eq!(bypassed.wait().await, ActionStatus::Finished);
        assert_eq!(recorder.calls.lock().await.len(), 2);
    }
}
