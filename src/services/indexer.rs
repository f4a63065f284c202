//! Indexer capabilities consumed by the show updater.
//!
//! An [`IndexerGateway`] wraps one metadata source. Only gateways that report
//! [`IndexerGateway::supports_incremental_updates`] take part in scheduled
//! updates; the rest are left alone.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use thiserror::Error;

use crate::domain::{Indexer, SeriesId};

/// Errors reported by an indexer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexerError {
    /// The indexer could not be reached. Callers skip the show and retry on
    /// the next run.
    #[error("{indexer} is unavailable: {message}")]
    Unavailable { indexer: Indexer, message: String },

    /// The indexer answered with something unusable.
    #[error("{indexer} returned an invalid response: {message}")]
    Protocol { indexer: Indexer, message: String },
}

impl IndexerError {
    pub fn unavailable(indexer: Indexer, message: impl Into<String>) -> Self {
        Self::Unavailable {
            indexer,
            message: message.into(),
        }
    }

    pub fn protocol(indexer: Indexer, message: impl Into<String>) -> Self {
        Self::Protocol {
            indexer,
            message: message.into(),
        }
    }
}

/// Seasons changed on the indexer, keyed by series.
pub type UpdatedSeasons = HashMap<SeriesId, BTreeSet<i32>>;

#[async_trait::async_trait]
pub trait IndexerGateway: Send + Sync {
    fn indexer(&self) -> Indexer;

    /// Whether [`Self::last_updated_seasons`] is backed by the indexer.
    fn supports_incremental_updates(&self) -> bool {
        false
    }

    /// Seasons of `series_ids` that changed since `since` (epoch seconds).
    ///
    /// Series with no changes may be absent from the map or map to an empty
    /// set. `max_weeks` bounds how far back the indexer is asked to look.
    ///
    /// # Errors
    ///
    /// - [`IndexerError::Unavailable`] on connection failures and timeouts
    /// - [`IndexerError::Protocol`] on unexpected status codes or payloads
    async fn last_updated_seasons(
        &self,
        series_ids: &[SeriesId],
        since: i64,
        max_weeks: u32,
    ) -> Result<UpdatedSeasons, IndexerError>;
}

/// Gateways by indexer.
#[derive(Clone, Default)]
pub struct IndexerRegistry {
    gateways: HashMap<Indexer, Arc<dyn IndexerGateway>>,
}

impl IndexerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `gateway` under the indexer it reports, replacing any
    /// previous one.
    pub fn register(&mut self, gateway: Arc<dyn IndexerGateway>) {
        self.gateways.insert(gateway.indexer(), gateway);
    }

    #[must_use]
    pub fn with(mut self, gateway: Arc<dyn IndexerGateway>) -> Self {
        self.register(gateway);
        self
    }

    /// Resolves the gateway for `indexer`.
    ///
    /// An indexer with no configured gateway is reported as unavailable so the
    /// caller treats it like a connectivity failure.
    pub fn client(&self, indexer: Indexer) -> Result<Arc<dyn IndexerGateway>, IndexerError> {
        self.gateways
            .get(&indexer)
            .cloned()
            .ok_or_else(|| IndexerError::unavailable(indexer, "no client configured"))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.gateways.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.gateways.is_empty()
    }
}
