use serde::{Deserialize, Serialize};

use crate::domain::{Indexer, SeriesId, ShowKey, ValidationError};

/// Season value meaning "every season", used for a show's primary name.
pub const ALL_SEASONS: i32 = -1;

/// Alternate name used by release groups, optionally scoped to one season.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "AliasInput")]
pub struct AliasException {
    season: i32,
    series_name: String,
}

#[derive(Deserialize)]
struct AliasInput {
    season: i32,
    series_name: String,
}

impl TryFrom<AliasInput> for AliasException {
    type Error = ValidationError;

    fn try_from(input: AliasInput) -> Result<Self, Self::Error> {
        Self::new(input.season, input.series_name)
    }
}

impl AliasException {
    pub fn new(season: i32, series_name: impl Into<String>) -> Result<Self, ValidationError> {
        if season < ALL_SEASONS {
            return Err(ValidationError::Season(season));
        }

        let series_name = series_name.into();
        if series_name.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }

        Ok(Self {
            season,
            series_name,
        })
    }

    #[must_use]
    pub const fn season(&self) -> i32 {
        self.season
    }

    #[must_use]
    pub fn series_name(&self) -> &str {
        &self.series_name
    }
}

/// How episodes of a show are numbered in release names.
///
/// Checked in this order: air-by-date, sports, anime, standard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowKind {
    AirByDate,
    Sports,
    Anime,
    Standard,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Show {
    pub indexer: Indexer,
    pub series_id: SeriesId,
    pub name: String,
    #[serde(default)]
    pub paused: bool,
    #[serde(default)]
    pub air_by_date: bool,
    #[serde(default)]
    pub sports: bool,
    #[serde(default)]
    pub anime: bool,
    #[serde(default)]
    pub is_scene: bool,
    #[serde(default)]
    pub aliases: Vec<AliasException>,
}

impl Show {
    #[must_use]
    pub fn new(indexer: Indexer, series_id: SeriesId, name: impl Into<String>) -> Self {
        Self {
            indexer,
            series_id,
            name: name.into(),
            paused: false,
            air_by_date: false,
            sports: false,
            anime: false,
            is_scene: false,
            aliases: Vec::new(),
        }
    }

    #[must_use]
    pub const fn key(&self) -> ShowKey {
        ShowKey::new(self.indexer, self.series_id)
    }

    #[must_use]
    pub const fn kind(&self) -> ShowKind {
        if self.air_by_date {
            ShowKind::AirByDate
        } else if self.sports {
            ShowKind::Sports
        } else if self.anime {
            ShowKind::Anime
        } else {
            ShowKind::Standard
        }
    }

    /// Adds an alias unless an identical one is already present.
    pub fn push_alias(&mut self, alias: AliasException) {
        if !self.aliases.contains(&alias) {
            self.aliases.push(alias);
        }
    }

    pub fn remove_alias(&mut self, series_name: &str) {
        self.aliases.retain(|a| a.series_name() != series_name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alias_rejects_seasons_below_all_seasons() {
        assert_eq!(
            AliasException::new(-2, "Foo"),
            Err(ValidationError::Season(-2))
        );
        assert!(AliasException::new(ALL_SEASONS, "Foo").is_ok());
        assert!(AliasException::new(3, "Foo S3").is_ok());
    }

    #[test]
    fn alias_rejects_blank_names() {
        assert_eq!(
            AliasException::new(1, "   "),
            Err(ValidationError::EmptyTitle)
        );
    }

    #[test]
    fn alias_deserialization_validates() {
        let ok: AliasException =
            serde_json::from_str(r#"{"season": 2, "series_name": "Foo Zwei"}"#).unwrap();
        assert_eq!(ok.season(), 2);

        let err = serde_json::from_str::<AliasException>(r#"{"season": -5, "series_name": "x"}"#);
        assert!(err.is_err());
    }

    #[test]
    fn kind_prefers_air_by_date_over_everything() {
        let mut show = Show::new(Indexer::Tvdb, SeriesId::new(1), "Daily");
        show.air_by_date = true;
        show.sports = true;
        show.anime = true;
        assert_eq!(show.kind(), ShowKind::AirByDate);

        show.air_by_date = false;
        assert_eq!(show.kind(), ShowKind::Sports);

        show.sports = false;
        assert_eq!(show.kind(), ShowKind::Anime);

        show.anime = false;
        assert_eq!(show.kind(), ShowKind::Standard);
    }

    #[test]
    fn push_alias_keeps_order_and_skips_duplicates() {
        let mut show = Show::new(Indexer::Tvmaze, SeriesId::new(7), "Foo");
        show.push_alias(AliasException::new(1, "Foo One").unwrap());
        show.push_alias(AliasException::new(2, "Foo Two").unwrap());
        show.push_alias(AliasException::new(1, "Foo One").unwrap());

        let names: Vec<_> = show.aliases.iter().map(AliasException::series_name).collect();
        assert_eq!(names, vec!["Foo One", "Foo Two"]);

        show.remove_alias("Foo One");
        assert_eq!(show.aliases.len(), 1);
    }
}
