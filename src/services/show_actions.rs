use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use super::search_templates::{DEFAULT_SEPARATOR, SearchTemplates};
use super::show_queue::ShowActionExecutor;
use crate::db::{SceneExceptionStore, ShowRepository, Store, TemplateStore};
use crate::domain::ShowKey;

/// Executor behind the production [`ShowQueue`](super::ShowQueue).
///
/// Both actions reload the show from the registry and regenerate its search
/// templates, so aliases changed since the last run take effect.
#[derive(Clone)]
pub struct ShowActions {
    shows: Arc<dyn ShowRepository>,
    templates: Arc<dyn TemplateStore>,
    exceptions: Arc<dyn SceneExceptionStore>,
    separator: String,
}

impl ShowActions {
    pub fn new(
        shows: Arc<dyn ShowRepository>,
        templates: Arc<dyn TemplateStore>,
        exceptions: Arc<dyn SceneExceptionStore>,
    ) -> Self {
        Self {
            shows,
            templates,
            exceptions,
            separator: DEFAULT_SEPARATOR.to_string(),
        }
    }

    #[must_use]
    pub fn from_store(store: &Store) -> Self {
        let store = Arc::new(store.clone());
        Self::new(store.clone(), store.clone(), store)
    }

    #[must_use]
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    async fn regenerate_templates(&self, key: ShowKey) -> Result<usize> {
        let show = self
            .shows
            .find(key)
            .await?
            .with_context(|| format!("Show {key} is no longer tracked"))?;

        let mut templates = SearchTemplates::new(
            show,
            Arc::clone(&self.templates),
            Arc::clone(&self.exceptions),
        )
        .with_separator(self.separator.clone());

        templates
            .generate()
            .await
            .with_context(|| format!("Failed to regenerate search templates for {key}"))?;

        Ok(templates.templates().len())
    }
}

#[async_trait::async_trait]
impl ShowActionExecutor for ShowActions {
    async fn update_show(&self, show: ShowKey, season: Option<i32>) -> Result<()> {
        let count = self.regenerate_templates(show).await?;
        match season {
            Some(season) => info!(show = %show, season, templates = count, "Updated show season"),
            None => info!(show = %show, templates = count, "Updated show"),
        }
        Ok(())
    }

    async fn refresh_show(&self, show: ShowKey) -> Result<()> {
        let count = self.regenerate_templates(show).await?;
        info!(show = %show, templates = count, "Refreshed show");
        Ok(())
    }
}
