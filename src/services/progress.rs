use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;

use super::show_queue::{ActionHandle, ActionStatus};

/// Groups queued actions under a named indicator.
#[async_trait::async_trait]
pub trait ProgressTracker: Send + Sync {
    /// Replaces the handles tracked under `key`.
    async fn register(&self, key: &str, handles: Vec<ActionHandle>);
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub total: usize,
    pub queued: usize,
    pub running: usize,
    pub finished: usize,
    pub failed: usize,
    pub percent: u8,
}

impl Progress {
    fn from_handles(handles: &[ActionHandle]) -> Self {
        let mut progress = Self {
            total: handles.len(),
            ..Self::default()
        };

        for handle in handles {
            match handle.status() {
                ActionStatus::Queued => progress.queued += 1,
                ActionStatus::Running => progress.running += 1,
                ActionStatus::Finished => progress.finished += 1,
                ActionStatus::Failed => progress.failed += 1,
            }
        }

        if progress.total > 0 {
            let done = (progress.finished + progress.failed) * 100 / progress.total;
            progress.percent = u8::try_from(done).unwrap_or(100);
        }

        progress
    }

    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.finished + self.failed == self.total
    }
}

/// In-memory [`ProgressTracker`].
#[derive(Clone, Default)]
pub struct ProgressIndicators {
    indicators: Arc<RwLock<HashMap<String, Vec<ActionHandle>>>>,
}

impl ProgressIndicators {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn progress(&self, key: &str) -> Option<Progress> {
        let indicators = self.indicators.read().await;
        indicators.get(key).map(|handles| Progress::from_handles(handles))
    }

    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<_> = self.indicators.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait::async_trait]
impl ProgressTracker for ProgressIndicators {
    async fn register(&self, key: &str, handles: Vec<ActionHandle>) {
        self.indicators
            .write()
            .await
            .insert(key.to_string(), handles);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Indexer, SeriesId, ShowKey};
    use crate::services::show_queue::ActionKind;

    fn key() -> ShowKey {
        ShowKey::new(Indexer::Tvdb, SeriesId::new(1))
    }

    #[tokio::test]
    async fn reports_counts_and_percent() {
        let indicators = ProgressIndicators::new();
        let (a, a_tx) = ActionHandle::new(key(), ActionKind::Refresh);
        let (b, b_tx) = ActionHandle::new(key(), ActionKind::Update { season: Some(1) });
        let (c, _c_tx) = ActionHandle::new(key(), ActionKind::Update { season: Some(2) });
        let (d, d_tx) = ActionHandle::new(key(), ActionKind::Update { season: Some(3) });

        a_tx.send_replace(ActionStatus::Finished);
        b_tx.send_replace(ActionStatus::Failed);
        d_tx.send_replace(ActionStatus::Running);

        indicators.register("dailyUpdate", vec![a, b, c, d]).await;
        let progress = indicators.progress("dailyUpdate").await.unwrap();

        assert_eq!(progress.total, 4);
        assert_eq!(progress.finished, 1);
        assert_eq!(progress.failed, 1);
        assert_eq!(progress.running, 1);
        assert_eq!(progress.queued, 1);
        assert_eq!(progress.percent, 50);
        assert!(!progress.is_complete());
    }

    #[tokio::test]
    async fn empty_indicator_is_complete_at_zero_percent() {
        let indicators = ProgressIndicators::new();
        indicators.register("dailyUpdate", Vec::new()).await;

        let progress = indicators.progress("dailyUpdate").await.unwrap();
        assert_eq!(progress.percent, 0);
        assert!(progress.is_complete());
        assert!(indicators.progress("other").await.is_none());
    }
}
