//! Persistence seams consumed by the services.
//!
//! [`Store`] implements all of them over SQLite; tests may substitute their own.

use std::collections::HashSet;

use anyhow::Result;

use super::Store;
use crate::domain::ShowKey;
use crate::models::search_template::SearchTemplate;
use crate::models::show::{AliasException, Show};

/// Registry of tracked shows.
#[async_trait::async_trait]
pub trait ShowRepository: Send + Sync {
    async fn list_all(&self) -> Result<Vec<Show>>;

    async fn find(&self, key: ShowKey) -> Result<Option<Show>>;
}

/// Shared table of release-group names per show and season.
#[async_trait::async_trait]
pub trait SceneExceptionStore: Send + Sync {
    /// Every exception stored for the show whose name differs from `show_name`.
    async fn exceptions_for_show(
        &self,
        key: ShowKey,
        show_name: &str,
    ) -> Result<Vec<AliasException>>;

    /// Names that apply to `season` of the show, from its aliases and the shared table.
    async fn get_for_season(&self, show: &Show, season: i32) -> Result<HashSet<String>>;
}

#[async_trait::async_trait]
pub trait TemplateStore: Send + Sync {
    async fn upsert_default(&self, key: ShowKey, template: &SearchTemplate) -> Result<()>;

    async fn save(&self, key: ShowKey, template: &SearchTemplate) -> Result<()>;

    /// Removes templates whose title is not listed; returns the number deleted.
    async fn delete_except_titles(&self, key: ShowKey, keep_titles: &[String]) -> Result<u64>;

    async fn list(&self, key: ShowKey) -> Result<Vec<SearchTemplate>>;
}

/// Epoch seconds of the last incremental update query, per indexer name.
#[async_trait::async_trait]
pub trait UpdateTimestampStore: Send + Sync {
    async fn last_update(&self, indexer_name: &str) -> Result<Option<i64>>;

    async fn set_last_update(&self, indexer_name: &str, epoch_seconds: i64) -> Result<()>;
}

#[async_trait::async_trait]
impl ShowRepository for Store {
    async fn list_all(&self) -> Result<Vec<Show>> {
        self.list_shows().await
    }

    async fn find(&self, key: ShowKey) -> Result<Option<Show>> {
        self.get_show(key).await
    }
}

#[async_trait::async_trait]
impl SceneExceptionStore for Store {
    async fn exceptions_for_show(
        &self,
        key: ShowKey,
        show_name: &str,
    ) -> Result<Vec<AliasException>> {
        self.get_scene_exceptions(key, Some(show_name)).await
    }

    async fn get_for_season(&self, show: &Show, season: i32) -> Result<HashSet<String>> {
        let mut names = self.get_season_exception_names(show.key(), season).await?;
        names.extend(
            show.aliases
                .iter()
                .filter(|alias| alias.season() == season)
                .map(|alias| alias.series_name().to_string()),
        );
        Ok(names)
    }
}

#[async_trait::async_trait]
impl TemplateStore for Store {
    async fn upsert_default(&self, key: ShowKey, template: &SearchTemplate) -> Result<()> {
        self.search_template_repo()
            .upsert_default(key, template)
            .await
    }

    async fn save(&self, key: ShowKey, template: &SearchTemplate) -> Result<()> {
        self.search_template_repo().save(key, template).await
    }

    async fn delete_except_titles(&self, key: ShowKey, keep_titles: &[String]) -> Result<u64> {
        self.search_template_repo()
            .delete_except_titles(key, keep_titles)
            .await
    }

    async fn list(&self, key: ShowKey) -> Result<Vec<SearchTemplate>> {
        self.get_search_templates(key).await
    }
}

#[async_trait::async_trait]
impl UpdateTimestampStore for Store {
    async fn last_update(&self, indexer_name: &str) -> Result<Option<i64>> {
        self.get_last_indexer_update(indexer_name).await
    }

    async fn set_last_update(&self, indexer_name: &str, epoch_seconds: i64) -> Result<()> {
        self.set_last_indexer_update(indexer_name, epoch_seconds)
            .await
    }
}
