//! Domain types for show tracking with strong typing.
//!
//! Shows are identified by the indexer that supplies their metadata plus the
//! series id on that indexer. Newtypes keep the two halves from being mixed up
//! with other integers flowing through the scheduler.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised when a domain record is built from untrusted input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Season must be >= -1, got {0}")]
    Season(i32),

    #[error("Search template must not be empty")]
    EmptyTemplate,

    #[error("Title must not be empty")]
    EmptyTitle,

    #[error("Unknown indexer: {0}")]
    UnknownIndexer(String),
}

/// Metadata source a show is tracked on.
///
/// The numeric ids are persisted, so they must never be renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Indexer {
    Tvdb,
    Tvmaze,
    Tmdb,
}

impl Indexer {
    pub const ALL: [Self; 3] = [Self::Tvdb, Self::Tvmaze, Self::Tmdb];

    #[must_use]
    pub const fn id(self) -> i32 {
        match self {
            Self::Tvdb => 1,
            Self::Tvmaze => 3,
            Self::Tmdb => 4,
        }
    }

    /// Display name, also used as the key of the `last_update` table.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Tvdb => "theTVDB",
            Self::Tvmaze => "TVmaze",
            Self::Tmdb => "TMDB",
        }
    }

    /// Short prefix used in show slugs, e.g. `tvmaze1234`.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Tvdb => "tvdb",
            Self::Tvmaze => "tvmaze",
            Self::Tmdb => "tmdb",
        }
    }

    pub fn from_id(id: i32) -> Result<Self, ValidationError> {
        Self::ALL
            .into_iter()
            .find(|indexer| indexer.id() == id)
            .ok_or_else(|| ValidationError::UnknownIndexer(id.to_string()))
    }
}

impl fmt::Display for Indexer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Indexer {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(id) = s.parse::<i32>() {
            return Self::from_id(id);
        }

        Self::ALL
            .into_iter()
            .find(|indexer| {
                indexer.slug().eq_ignore_ascii_case(s) || indexer.name().eq_ignore_ascii_case(s)
            })
            .ok_or_else(|| ValidationError::UnknownIndexer(s.to_string()))
    }
}

impl Serialize for Indexer {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_i32(self.id())
    }
}

impl<'de> Deserialize<'de> for Indexer {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let id = i32::deserialize(deserializer)?;
        Self::from_id(id).map_err(serde::de::Error::custom)
    }
}

/// Series identifier on a specific indexer.
///
/// # Examples
///
/// ```rust
/// use showarr::domain::SeriesId;
///
/// let id = SeriesId::new(82);
/// assert_eq!(id.value(), 82);
/// assert_eq!(id.to_string(), "82");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SeriesId(i32);

impl SeriesId {
    #[must_use]
    pub const fn new(id: i32) -> Self {
        debug_assert!(id >= 0, "SeriesId should be non-negative");
        Self(id)
    }

    #[must_use]
    pub const fn value(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for SeriesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<SeriesId> for i32 {
    fn from(id: SeriesId) -> Self {
        id.0
    }
}

impl From<i32> for SeriesId {
    fn from(id: i32) -> Self {
        Self::new(id)
    }
}

impl Serialize for SeriesId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_i32(self.0)
    }
}

impl<'de> Deserialize<'de> for SeriesId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let id = i32::deserialize(deserializer)?;
        Ok(Self::new(id))
    }
}

/// Identity of a show: `(indexer, series_id)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ShowKey {
    pub indexer: Indexer,
    pub series_id: SeriesId,
}

impl ShowKey {
    #[must_use]
    pub const fn new(indexer: Indexer, series_id: SeriesId) -> Self {
        Self { indexer, series_id }
    }
}

impl fmt::Display for ShowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.indexer.slug(), self.series_id)
    }
}
