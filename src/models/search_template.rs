use serde::{Deserialize, Serialize};

use crate::domain::ValidationError;
use crate::models::show::ALL_SEASONS;

/// A search pattern for one show, either generated or written by a user.
///
/// Fields are private so every instance has passed validation. Serialized
/// form is the one exposed to clients: `{title, template, season, enabled,
/// default, seasonSearch}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "TemplateInput")]
pub struct SearchTemplate {
    title: String,
    template: String,
    season: i32,
    enabled: bool,
    default: bool,
    season_search: bool,
}

/// Unvalidated template fields, as received from a client or a database row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateInput {
    pub title: String,
    pub template: String,
    pub season: i32,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub default: bool,
    #[serde(default)]
    pub season_search: bool,
}

const fn default_true() -> bool {
    true
}

impl TryFrom<TemplateInput> for SearchTemplate {
    type Error = ValidationError;

    fn try_from(input: TemplateInput) -> Result<Self, Self::Error> {
        Self::new(input)
    }
}

impl SearchTemplate {
    pub fn new(input: TemplateInput) -> Result<Self, ValidationError> {
        if input.season < ALL_SEASONS {
            return Err(ValidationError::Season(input.season));
        }
        if input.template.trim().is_empty() {
            return Err(ValidationError::EmptyTemplate);
        }
        if input.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }

        Ok(Self {
            title: input.title,
            template: input.template,
            season: input.season,
            enabled: input.enabled,
            default: input.default,
            season_search: input.season_search,
        })
    }

    /// A generated template, enabled by default.
    pub fn generated(
        title: &str,
        season: i32,
        template: String,
        season_search: bool,
    ) -> Result<Self, ValidationError> {
        Self::new(TemplateInput {
            title: title.to_string(),
            template,
            season,
            enabled: true,
            default: true,
            season_search,
        })
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    #[must_use]
    pub const fn season(&self) -> i32 {
        self.season
    }

    #[must_use]
    pub const fn enabled(&self) -> bool {
        self.enabled
    }

    #[must_use]
    pub const fn is_default(&self) -> bool {
        self.default
    }

    #[must_use]
    pub const fn season_search(&self) -> bool {
        self.season_search
    }
}
