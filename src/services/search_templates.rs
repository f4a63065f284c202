//! Per-show search templates.
//!
//! Every show gets one default episode template and one default season
//! template for its own name and for each of its alternate names. Users may
//! disable defaults or add custom templates; regeneration keeps their choices.

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::db::{SceneExceptionStore, TemplateStore};
use crate::domain::ValidationError;
use crate::models::search_template::SearchTemplate;
use crate::models::show::{ALL_SEASONS, AliasException, Show, ShowKind};

pub const DEFAULT_SEPARATOR: &str = " ";

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Invalid search template: {0}")]
    Validation(#[from] ValidationError),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sea_orm::DbErr> for TemplateError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for TemplateError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

fn compose(title: &str, separator: &str, token: &str) -> String {
    format!("{title}{separator}{token}").trim().to_string()
}

/// Episode template for `title`.
///
/// `season_exception` marks `title` as a season-specific scene name, which
/// makes anime shows search by episode instead of absolute number.
#[must_use]
pub fn episode_search_string(
    show: &Show,
    title: &str,
    separator: &str,
    season_exception: bool,
) -> String {
    let token = match show.kind() {
        ShowKind::AirByDate => "%A-D",
        ShowKind::Sports => "%ADb",
        ShowKind::Anime if season_exception => "%XE",
        ShowKind::Anime if show.is_scene => "%XAB",
        ShowKind::Anime => "%AB",
        ShowKind::Standard if show.is_scene => "S%0XSE%XE",
        ShowKind::Standard => "S%0SE%0E",
    };
    compose(title, separator, token)
}

/// Season template for `title`.
#[must_use]
pub fn season_search_string(show: &Show, title: &str, separator: &str) -> String {
    let token = match show.kind() {
        ShowKind::AirByDate | ShowKind::Sports => "%A-D",
        ShowKind::Anime => "Season",
        ShowKind::Standard => "%0S",
    };
    compose(title, separator, token)
}

pub struct SearchTemplates {
    show: Show,
    store: Arc<dyn TemplateStore>,
    exceptions: Arc<dyn SceneExceptionStore>,
    separator: String,
    templates: Vec<SearchTemplate>,
}

impl SearchTemplates {
    pub fn new(
        show: Show,
        store: Arc<dyn TemplateStore>,
        exceptions: Arc<dyn SceneExceptionStore>,
    ) -> Self {
        Self {
            show,
            store,
            exceptions,
            separator: DEFAULT_SEPARATOR.to_string(),
            templates: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    #[must_use]
    pub const fn show(&self) -> &Show {
        &self.show
    }

    /// Templates as last read from storage, in storage order.
    #[must_use]
    pub fn templates(&self) -> &[SearchTemplate] {
        &self.templates
    }

    /// Regenerates the default templates, drops templates for names that no
    /// longer apply and reloads the list.
    pub async fn generate(&mut self) -> Result<(), TemplateError> {
        let key = self.show.key();
        let candidates = self.candidate_exceptions().await?;

        for exception in &candidates {
            let title = exception.series_name();
            let season = exception.season();

            let episode = self.episode_template(title, season).await?;
            let episode = SearchTemplate::generated(title, season, episode, false)?;
            self.store.upsert_default(key, &episode).await?;

            let season_template = season_search_string(&self.show, title, &self.separator);
            let season_template = SearchTemplate::generated(title, season, season_template, true)?;
            self.store.upsert_default(key, &season_template).await?;
        }

        let mut keep: Vec<String> = candidates
            .iter()
            .map(|c| c.series_name().to_string())
            .collect();
        keep.sort();
        keep.dedup();

        let removed = self.store.delete_except_titles(key, &keep).await?;
        if removed > 0 {
            debug!(show = %self.show.name, removed, "Removed stale search templates");
        }

        self.read_from_db().await
    }

    pub async fn read_from_db(&mut self) -> Result<(), TemplateError> {
        self.templates = self.store.list(self.show.key()).await?;
        Ok(())
    }

    /// Persists a user-edited template.
    pub async fn save(&self, template: &SearchTemplate) -> Result<(), TemplateError> {
        self.store.save(self.show.key(), template).await?;
        Ok(())
    }

    /// Saves each template and swaps it into the in-memory list wherever the
    /// template string matches.
    pub async fn update(
        &mut self,
        templates: Vec<SearchTemplate>,
    ) -> Result<&[SearchTemplate], TemplateError> {
        for template in templates {
            self.save(&template).await?;

            for existing in &mut self.templates {
                if existing.template() == template.template() {
                    *existing = template.clone();
                }
            }
        }

        Ok(&self.templates)
    }

    /// The templates in their client JSON form.
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(&self.templates)
    }

    /// The show's own name for every season, followed by its aliases, or by
    /// the shared scene exceptions when it has none.
    async fn candidate_exceptions(&self) -> Result<Vec<AliasException>, TemplateError> {
        let others = if self.show.aliases.is_empty() {
            self.exceptions
                .exceptions_for_show(self.show.key(), &self.show.name)
                .await?
        } else {
            self.show.aliases.clone()
        };

        let mut candidates = Vec::with_capacity(others.len() + 1);
        candidates.push(AliasException::new(ALL_SEASONS, self.show.name.clone())?);
        for exception in others {
            if !candidates.contains(&exception) {
                candidates.push(exception);
            }
        }

        Ok(candidates)
    }

    async fn episode_template(&self, title: &str, season: i32) -> Result<String, TemplateError> {
        let season_exception = if self.show.kind() == ShowKind::Anime {
            self.exceptions
                .get_for_season(&self.show, season)
                .await?
                .contains(title)
        } else {
            false
        };

        Ok(episode_search_string(
            &self.show,
            title,
            &self.separator,
            season_exception,
        ))
    }
}
