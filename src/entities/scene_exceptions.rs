use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "scene_exceptions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub exception_id: i32,
    pub indexer: i32,
    pub series_id: i32,
    pub show_name: String,
    pub season: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
