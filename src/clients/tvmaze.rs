use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::debug;

use crate::config::TvMazeConfig;
use crate::domain::{Indexer, SeriesId};
use crate::services::indexer::{IndexerError, IndexerGateway, UpdatedSeasons};

const DAY: i64 = 86_400;
const WEEK: i64 = 7 * DAY;
const MONTH: i64 = 30 * DAY;

/// How long a fetched update index is reused across shows of one run.
const UPDATES_TTL: Duration = Duration::from_secs(300);

type ShowUpdates = Arc<HashMap<i32, i64>>;

struct CachedUpdates {
    fetched_at: Instant,
    updates: ShowUpdates,
}

#[derive(Debug, Deserialize)]
pub struct TvMazeSeason {
    pub id: i64,
    pub number: Option<i32>,
    #[serde(rename = "premiereDate")]
    pub premiere_date: Option<String>,
    #[serde(rename = "endDate")]
    pub end_date: Option<String>,
}

impl TvMazeSeason {
    /// A season is affected by changes since `since` unless it ended before
    /// that day. Seasons without an end date are still airing.
    fn touched_since(&self, since: NaiveDate) -> bool {
        self.end_date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            .is_none_or(|end| end >= since)
    }
}

/// The narrowest `since` bucket of `/updates/shows` that still covers
/// `since`, or `None` when the full update index is needed.
#[must_use]
pub const fn update_window(since: i64, now: i64) -> Option<&'static str> {
    let age = now - since;
    if age <= DAY {
        Some("day")
    } else if age <= WEEK {
        Some("week")
    } else if age <= MONTH {
        Some("month")
    } else {
        None
    }
}

#[derive(Clone)]
pub struct TvMazeClient {
    client: Client,
    base_url: String,
    updates_cache: Arc<Mutex<HashMap<Option<&'static str>, CachedUpdates>>>,
}

impl TvMazeClient {
    pub fn new(config: &TvMazeConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .user_agent("Showarr/1.0")
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build TVmaze HTTP client: {e}"))?;

        Ok(Self::with_client(client, &config.base_url))
    }

    #[must_use]
    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            updates_cache: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// [`Self::get_show_updates`] reused for [`UPDATES_TTL`] per window.
    ///
    /// The lock is held across the request so shows checked back to back
    /// share a single download of the index.
    async fn cached_show_updates(
        &self,
        window: Option<&'static str>,
    ) -> Result<ShowUpdates, IndexerError> {
        let mut cache = self.updates_cache.lock().await;

        if let Some(cached) = cache.get(&window)
            && cached.fetched_at.elapsed() < UPDATES_TTL
        {
            debug!(window = ?window, "Reusing cached TVmaze update index");
            return Ok(Arc::clone(&cached.updates));
        }

        let updates = Arc::new(self.get_show_updates(window).await?);
        cache.insert(
            window,
            CachedUpdates {
                fetched_at: Instant::now(),
                updates: Arc::clone(&updates),
            },
        );
        Ok(updates)
    }

    /// Show ids mapped to the epoch second of their last change.
    pub async fn get_show_updates(
        &self,
        window: Option<&str>,
    ) -> Result<HashMap<i32, i64>, IndexerError> {
        let url = match window {
            Some(since) => format!("{}/updates/shows?since={since}", self.base_url),
            None => format!("{}/updates/shows", self.base_url),
        };

        let raw: HashMap<String, i64> = self.get_json(&url).await?;

        raw.into_iter()
            .map(|(id, updated)| {
                id.parse::<i32>()
                    .map(|id| (id, updated))
                    .map_err(|_| IndexerError::protocol(Indexer::Tvmaze, format!("bad show id {id:?}")))
            })
            .collect()
    }

    pub async fn get_seasons(&self, series_id: SeriesId) -> Result<Vec<TvMazeSeason>, IndexerError> {
        let url = format!("{}/shows/{}/seasons", self.base_url, series_id);
        self.get_json(&url).await
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, IndexerError> {
        let response = self.client.get(url).send().await.map_err(map_request_error)?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            return Err(IndexerError::unavailable(
                Indexer::Tvmaze,
                format!("HTTP {status} from {url}"),
            ));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IndexerError::protocol(
                Indexer::Tvmaze,
                format!("HTTP {status} from {url}: {body}"),
            ));
        }

        response.json().await.map_err(map_request_error)
    }
}

fn map_request_error(err: reqwest::Error) -> IndexerError {
    if err.is_connect() || err.is_timeout() {
        IndexerError::unavailable(Indexer::Tvmaze, err.to_string())
    } else {
        IndexerError::protocol(Indexer::Tvmaze, err.to_string())
    }
}

#[async_trait::async_trait]
impl IndexerGateway for TvMazeClient {
    fn indexer(&self) -> Indexer {
        Indexer::Tvmaze
    }

    fn supports_incremental_updates(&self) -> bool {
        true
    }

    async fn last_updated_seasons(
        &self,
        series_ids: &[SeriesId],
        since: i64,
        max_weeks: u32,
    ) -> Result<UpdatedSeasons, IndexerError> {
        let now = Utc::now().timestamp();
        let since = since.max(now - i64::from(max_weeks) * WEEK);

        let updates = self.cached_show_updates(update_window(since, now)).await?;

        let since_day = DateTime::from_timestamp(since, 0)
            .map(|dt| dt.date_naive())
            .ok_or_else(|| IndexerError::protocol(Indexer::Tvmaze, format!("bad timestamp {since}")))?;

        let mut result = UpdatedSeasons::new();
        for &series_id in series_ids {
            let changed = updates
                .get(&series_id.value())
                .is_some_and(|&updated| updated >= since);
            if !changed {
                continue;
            }

            let seasons: BTreeSet<i32> = self
                .get_seasons(series_id)
                .await?
                .iter()
                .filter(|season| season.touched_since(since_day))
                .filter_map(|season| season.number)
                .collect();

            debug!(series_id = %series_id, seasons = ?seasons, "TVmaze reported changed seasons");
            result.insert(series_id, seasons);
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn window_picks_narrowest_bucket() {
        let now = 1_700_000_000;
        assert_eq!(update_window(now - 3_600, now), Some("day"));
        assert_eq!(update_window(now - 3 * DAY, now), Some("week"));
        assert_eq!(update_window(now - 20 * DAY, now), Some("month"));
        assert_eq!(update_window(now - 60 * DAY, now), None);
    }

    #[test]
    fn seasons_ended_before_since_are_untouched() {
        let since = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let ended = TvMazeSeason {
            id: 1,
            number: Some(1),
            premiere_date: Some("2023-01-01".into()),
            end_date: Some("2023-04-01".into()),
        };
        let airing = TvMazeSeason {
            id: 2,
            number: Some(2),
            premiere_date: Some("2024-02-01".into()),
            end_date: None,
        };
        assert!(!ended.touched_since(since));
        assert!(airing.touched_since(since));
    }

    #[tokio::test]
    async fn reports_only_changed_shows() {
        let server = MockServer::start().await;
        let now = Utc::now().timestamp();

        Mock::given(method("GET"))
            .and(path("/updates/shows"))
            .and(query_param("since", "day"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "1": now - 60,
                "2": now - 7 * DAY,
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/shows/1/seasons"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": 10, "number": 1, "premiereDate": "2001-01-01", "endDate": "2001-05-01"},
                {"id": 11, "number": 2, "premiereDate": "2030-01-01", "endDate": null},
            ])))
            .mount(&server)
            .await;

        let client = TvMazeClient::with_client(Client::new(), &server.uri());
        let updated = client
            .last_updated_seasons(&[SeriesId::new(1), SeriesId::new(2)], now - 3_600, 12)
            .await
            .unwrap();

        assert_eq!(updated.len(), 1);
        assert_eq!(updated[&SeriesId::new(1)], BTreeSet::from([2]));
    }

    #[tokio::test]
    async fn update_index_is_fetched_once_for_many_shows() {
        let server = MockServer::start().await;
        let now = Utc::now().timestamp();

        Mock::given(method("GET"))
            .and(path("/updates/shows"))
            .and(query_param("since", "day"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "1": now - 60,
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/shows/1/seasons"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": 10, "number": 1, "premiereDate": "2030-01-01", "endDate": null},
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let client = TvMazeClient::with_client(Client::new(), &server.uri());
        for id in 1..=5 {
            let updated = client
                .last_updated_seasons(&[SeriesId::new(id)], now - 3_600, 12)
                .await
                .unwrap();
            assert_eq!(updated.len(), usize::from(id == 1));
        }

        server.verify().await;
    }

    #[tokio::test]
    async fn failed_index_fetch_is_not_cached() {
        let server = MockServer::start().await;
        let now = Utc::now().timestamp();

        Mock::given(method("GET"))
            .and(path("/updates/shows"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/updates/shows"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let client = TvMazeClient::with_client(Client::new(), &server.uri());
        let err = client
            .last_updated_seasons(&[SeriesId::new(1)], now - 3_600, 12)
            .await
            .unwrap_err();
        assert!(matches!(err, IndexerError::Unavailable { .. }));

        let updated = client
            .last_updated_seasons(&[SeriesId::new(1)], now - 3_600, 12)
            .await
            .unwrap();
        assert!(updated.is_empty());
    }

    #[tokio::test]
    async fn server_errors_are_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/updates/shows"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = TvMazeClient::with_client(Client::new(), &server.uri());
        let err = client.get_show_updates(Some("day")).await.unwrap_err();
        assert!(matches!(err, IndexerError::Unavailable { .. }));
    }

    #[tokio::test]
    async fn malformed_payload_is_protocol_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/updates/shows"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = TvMazeClient::with_client(Client::new(), &server.uri());
        let err = client.get_show_updates(None).await.unwrap_err();
        assert!(matches!(err, IndexerError::Protocol { .. }));
    }
}
