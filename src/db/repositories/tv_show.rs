use crate::domain::{Indexer, SeriesId, ShowKey};
use crate::entities::{prelude::*, tv_shows};
use crate::models::show::{AliasException, Show};
use anyhow::Result;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set, sea_query::Expr,
};
use tracing::{info, warn};

pub struct TvShowRepository {
    conn: DatabaseConnection,
}

impl TvShowRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn map_model_to_show(model: tv_shows::Model) -> Result<Show> {
        let indexer = Indexer::from_id(model.indexer)?;
        let aliases: Vec<AliasException> = model
            .aliases
            .as_deref()
            .and_then(|json| serde_json::from_str(json).ok())
            .unwrap_or_default();

        Ok(Show {
            indexer,
            series_id: SeriesId::new(model.series_id),
            name: model.name,
            paused: model.paused,
            air_by_date: model.air_by_date,
            sports: model.sports,
            anime: model.anime,
            is_scene: model.is_scene,
            aliases,
        })
    }

    fn by_key(key: ShowKey) -> sea_orm::Select<TvShows> {
        TvShows::find()
            .filter(tv_shows::Column::Indexer.eq(key.indexer.id()))
            .filter(tv_shows::Column::SeriesId.eq(key.series_id.value()))
    }

    pub async fn upsert(&self, show: &Show) -> Result<()> {
        let aliases = if show.aliases.is_empty() {
            None
        } else {
            Some(serde_json::to_string(&show.aliases)?)
        };

        let active_model = tv_shows::ActiveModel {
            indexer: Set(show.indexer.id()),
            series_id: Set(show.series_id.value()),
            name: Set(show.name.clone()),
            paused: Set(show.paused),
            air_by_date: Set(show.air_by_date),
            sports: Set(show.sports),
            anime: Set(show.anime),
            is_scene: Set(show.is_scene),
            aliases: Set(aliases),
            created_at: Set(Some(chrono::Utc::now().to_rfc3339())),
            ..Default::default()
        };

        TvShows::insert(active_model)
            .on_conflict(
                sea_orm::sea_query::OnConflict::columns([
                    tv_shows::Column::Indexer,
                    tv_shows::Column::SeriesId,
                ])
                .update_columns([
                    tv_shows::Column::Name,
                    tv_shows::Column::Paused,
                    tv_shows::Column::AirByDate,
                    tv_shows::Column::Sports,
                    tv_shows::Column::Anime,
                    tv_shows::Column::IsScene,
                    tv_shows::Column::Aliases,
                ])
                .to_owned(),
            )
            .exec(&self.conn)
            .await?;

        info!("Added (or updated) show: {} [{}]", show.name, show.key());
        Ok(())
    }

    pub async fn get(&self, key: ShowKey) -> Result<Option<Show>> {
        Self::by_key(key)
            .one(&self.conn)
            .await?
            .map(Self::map_model_to_show)
            .transpose()
    }

    pub async fn list_all(&self) -> Result<Vec<Show>> {
        let rows = TvShows::find()
            .order_by_asc(tv_shows::Column::Name)
            .all(&self.conn)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let show_id = row.show_id;
                match Self::map_model_to_show(row) {
                    Ok(show) => Some(show),
                    Err(e) => {
                        warn!(show_id, error = %e, "Skipping unreadable show row");
                        None
                    }
                }
            })
            .collect())
    }

    pub async fn set_paused(&self, key: ShowKey, paused: bool) -> Result<bool> {
        let result = TvShows::update_many()
            .col_expr(tv_shows::Column::Paused, Expr::value(paused))
            .filter(tv_shows::Column::Indexer.eq(key.indexer.id()))
            .filter(tv_shows::Column::SeriesId.eq(key.series_id.value()))
            .exec(&self.conn)
            .await?;

        Ok(result.rows_affected > 0)
    }

    pub async fn remove(&self, key: ShowKey) -> Result<bool> {
        let result = TvShows::delete_many()
            .filter(tv_shows::Column::Indexer.eq(key.indexer.id()))
            .filter(tv_shows::Column::SeriesId.eq(key.series_id.value()))
            .exec(&self.conn)
            .await?;

        Ok(result.rows_affected > 0)
    }
}
