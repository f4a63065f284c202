use crate::domain::ShowKey;
use crate::entities::{prelude::*, scene_exceptions};
use crate::models::show::AliasException;
use anyhow::Result;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use std::collections::HashSet;
use tracing::warn;

pub struct SceneExceptionRepository {
    conn: DatabaseConnection,
}

impl SceneExceptionRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn by_key(key: ShowKey) -> sea_orm::Select<SceneExceptions> {
        SceneExceptions::find()
            .filter(scene_exceptions::Column::Indexer.eq(key.indexer.id()))
            .filter(scene_exceptions::Column::SeriesId.eq(key.series_id.value()))
    }

    /// Exceptions for a show in insertion order, skipping rows named `exclude_name`.
    pub async fn for_show(
        &self,
        key: ShowKey,
        exclude_name: Option<&str>,
    ) -> Result<Vec<AliasException>> {
        let mut query = Self::by_key(key);
        if let Some(name) = exclude_name {
            query = query.filter(scene_exceptions::Column::ShowName.ne(name));
        }

        let rows = query
            .order_by_asc(scene_exceptions::Column::ExceptionId)
            .all(&self.conn)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|row| match AliasException::new(row.season, row.show_name) {
                Ok(alias) => Some(alias),
                Err(e) => {
                    warn!(exception_id = row.exception_id, error = %e, "Skipping invalid scene exception");
                    None
                }
            })
            .collect())
    }

    pub async fn names_for_season(&self, key: ShowKey, season: i32) -> Result<HashSet<String>> {
        let rows = Self::by_key(key)
            .filter(scene_exceptions::Column::Season.eq(season))
            .all(&self.conn)
            .await?;

        Ok(rows.into_iter().map(|row| row.show_name).collect())
    }

    /// Replaces every exception of a show with `exceptions`.
    pub async fn replace_for_show(&self, key: ShowKey, exceptions: &[AliasException]) -> Result<()> {
        let txn = self.conn.begin().await?;

        SceneExceptions::delete_many()
            .filter(scene_exceptions::Column::Indexer.eq(key.indexer.id()))
            .filter(scene_exceptions::Column::SeriesId.eq(key.series_id.value()))
            .exec(&txn)
            .await?;

        if !exceptions.is_empty() {
            let models = exceptions.iter().map(|exception| scene_exceptions::ActiveModel {
                indexer: Set(key.indexer.id()),
                series_id: Set(key.series_id.value()),
                show_name: Set(exception.series_name().to_string()),
                season: Set(exception.season()),
                ..Default::default()
            });

            SceneExceptions::insert_many(models).exec(&txn).await?;
        }

        txn.commit().await?;
        Ok(())
    }
}
