use crate::entities::{last_update, prelude::*};
use anyhow::Result;
use sea_orm::{DatabaseConnection, EntityTrait, Set};

pub struct LastUpdateRepository {
    conn: DatabaseConnection,
}

impl LastUpdateRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get(&self, provider: &str) -> Result<Option<i64>> {
        let row = LastUpdate::find_by_id(provider.to_string())
            .one(&self.conn)
            .await?;

        Ok(row.map(|m| m.time))
    }

    pub async fn set(&self, provider: &str, time: i64) -> Result<()> {
        let active_model = last_update::ActiveModel {
            provider: Set(provider.to_string()),
            time: Set(time),
        };

        LastUpdate::insert(active_model)
            .on_conflict(
                sea_orm::sea_query::OnConflict::column(last_update::Column::Provider)
                    .update_column(last_update::Column::Time)
                    .to_owned(),
            )
            .exec(&self.conn)
            .await?;

        Ok(())
    }
}
