use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let conn = manager.get_connection();

        conn.execute_unprepared(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_tv_shows_indexer_series ON tv_shows(indexer, series_id)",
        )
        .await?;

        conn.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_scene_exceptions_show ON scene_exceptions(indexer, series_id)",
        )
        .await?;

        // Only generated templates have a natural key; custom ones may share a title.
        conn.execute_unprepared(
            r#"CREATE UNIQUE INDEX IF NOT EXISTS idx_search_templates_default_key
               ON search_templates(indexer, series_id, title, season, "default", season_search)
               WHERE "default" = 1"#,
        )
        .await?;

        conn.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_search_templates_template ON search_templates(indexer, series_id, template, season)",
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let conn = manager.get_connection();

        conn.execute_unprepared("DROP INDEX IF EXISTS idx_search_templates_template")
            .await?;
        conn.execute_unprepared("DROP INDEX IF EXISTS idx_search_templates_default_key")
            .await?;
        conn.execute_unprepared("DROP INDEX IF EXISTS idx_scene_exceptions_show")
            .await?;
        conn.execute_unprepared("DROP INDEX IF EXISTS idx_tv_shows_indexer_series")
            .await?;

        Ok(())
    }
}
