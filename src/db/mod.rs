use crate::domain::ShowKey;
use crate::models::search_template::SearchTemplate;
use crate::models::show::{AliasException, Show};
use anyhow::Result;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;
pub mod stores;

pub use stores::{SceneExceptionStore, ShowRepository, TemplateStore, UpdateTimestampStore};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    fn tv_show_repo(&self) -> repositories::tv_show::TvShowRepository {
        repositories::tv_show::TvShowRepository::new(self.conn.clone())
    }

    fn scene_exception_repo(&self) -> repositories::scene_exception::SceneExceptionRepository {
        repositories::scene_exception::SceneExceptionRepository::new(self.conn.clone())
    }

    fn search_template_repo(&self) -> repositories::search_template::SearchTemplateRepository {
        repositories::search_template::SearchTemplateRepository::new(self.conn.clone())
    }

    fn last_update_repo(&self) -> repositories::last_update::LastUpdateRepository {
        repositories::last_update::LastUpdateRepository::new(self.conn.clone())
    }

    pub async fn add_show(&self, show: &Show) -> Result<()> {
        self.tv_show_repo().upsert(show).await
    }

    pub async fn get_show(&self, key: ShowKey) -> Result<Option<Show>> {
        self.tv_show_repo().get(key).await
    }

    pub async fn list_shows(&self) -> Result<Vec<Show>> {
        self.tv_show_repo().list_all().await
    }

    pub async fn set_show_paused(&self, key: ShowKey, paused: bool) -> Result<bool> {
        self.tv_show_repo().set_paused(key, paused).await
    }

    pub async fn remove_show(&self, key: ShowKey) -> Result<bool> {
        self.tv_show_repo().remove(key).await
    }

    pub async fn get_scene_exceptions(
        &self,
        key: ShowKey,
        exclude_name: Option<&str>,
    ) -> Result<Vec<AliasException>> {
        self.scene_exception_repo()
            .for_show(key, exclude_name)
            .await
    }

    pub async fn get_season_exception_names(
        &self,
        key: ShowKey,
        season: i32,
    ) -> Result<HashSet<String>> {
        self.scene_exception_repo()
            .names_for_season(key, season)
            .await
    }

    pub async fn set_scene_exceptions(
        &self,
        key: ShowKey,
        exceptions: &[AliasException],
    ) -> Result<()> {
        self.scene_exception_repo()
            .replace_for_show(key, exceptions)
            .await
    }

    pub async fn get_search_templates(&self, key: ShowKey) -> Result<Vec<SearchTemplate>> {
        self.search_template_repo().list(key).await
    }

    pub async fn get_last_indexer_update(&self, indexer_name: &str) -> Result<Option<i64>> {
        self.last_update_repo().get(indexer_name).await
    }

    pub async fn set_last_indexer_update(&self, indexer_name: &str, time: i64) -> Result<()> {
        self.last_update_repo().set(indexer_name, time).await
    }
}
