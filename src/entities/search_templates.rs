use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "search_templates")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub search_template_id: i32,
    pub indexer: i32,
    pub series_id: i32,
    pub template: String,
    pub title: String,
    pub season: i32,
    pub enabled: bool,
    #[sea_orm(column_name = "default")]
    pub is_default: bool,
    pub season_search: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
