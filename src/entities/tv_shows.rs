use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "tv_shows")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub show_id: i32,
    pub indexer: i32,
    pub series_id: i32,
    pub name: String,
    pub paused: bool,
    pub air_by_date: bool,
    pub sports: bool,
    pub anime: bool,
    pub is_scene: bool,
    /// JSON array of `{season, series_name}` objects.
    #[sea_orm(column_type = "Text", nullable)]
    pub aliases: Option<String>,
    pub created_at: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
