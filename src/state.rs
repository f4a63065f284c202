use anyhow::Context;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use crate::clients::tvmaze::TvMazeClient;
use crate::config::Config;
use crate::db::Store;
use crate::domain::ShowKey;
use crate::models::show::Show;
use crate::services::{
    IndexerRegistry, ProgressIndicators, SearchTemplates, ShowActions, ShowQueue, ShowUpdater,
};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub indexers: IndexerRegistry,

    pub show_queue: ShowQueue,

    pub progress: ProgressIndicators,

    pub show_updater: Arc<ShowUpdater>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        Self::with_store(config, store)
    }

    pub fn with_store(config: Config, store: Store) -> anyhow::Result<Self> {
        let mut indexers = IndexerRegistry::new();
        if config.indexers.tvmaze.enabled {
            indexers.register(Arc::new(TvMazeClient::new(&config.indexers.tvmaze)?));
            info!("TVmaze indexer enabled at {}", config.indexers.tvmaze.base_url);
        }

        let actions = ShowActions::from_store(&store).with_separator(config.search.separator.clone());
        let show_queue = ShowQueue::new(Arc::new(actions), config.show_queue.clone());
        let progress = ProgressIndicators::new();

        let store_arc = Arc::new(store.clone());
        let show_updater = Arc::new(
            ShowUpdater::new(
                store_arc.clone(),
                indexers.clone(),
                store_arc,
                Arc::new(show_queue.clone()),
                Arc::new(progress.clone()),
            )
            .with_max_weeks(config.scheduler.update_max_weeks),
        );

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            store,
            indexers,
            show_queue,
            progress,
            show_updater,
        })
    }

    pub async fn config(&self) -> Config {
        self.config.read().await.clone()
    }

    /// Search templates for `show`, configured with the current separator.
    pub async fn search_templates(&self, show: Show) -> SearchTemplates {
        let separator = self.config.read().await.search.separator.clone();
        let store = Arc::new(self.store.clone());
        SearchTemplates::new(show, store.clone(), store).with_separator(separator)
    }

    /// Loads a tracked show and regenerates its templates.
    pub async fn generate_templates(&self, key: ShowKey) -> anyhow::Result<Option<SearchTemplates>> {
        let Some(show) = self.store.get_show(key).await? else {
            return Ok(None);
        };

        let mut templates = self.search_templates(show).await;
        templates
            .generate()
            .await
            .with_context(|| format!("Failed to generate templates for {key}"))?;
        Ok(Some(templates))
    }
}
