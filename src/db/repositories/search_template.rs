use crate::domain::ShowKey;
use crate::entities::{prelude::*, search_templates};
use crate::models::search_template::{SearchTemplate, TemplateInput};
use anyhow::Result;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait, sea_query::Expr,
};
use tracing::{debug, warn};

pub struct SearchTemplateRepository {
    conn: DatabaseConnection,
}

impl SearchTemplateRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn by_key(key: ShowKey) -> sea_orm::Select<SearchTemplates> {
        SearchTemplates::find()
            .filter(search_templates::Column::Indexer.eq(key.indexer.id()))
            .filter(search_templates::Column::SeriesId.eq(key.series_id.value()))
    }

    fn new_row(key: ShowKey, template: &SearchTemplate) -> search_templates::ActiveModel {
        search_templates::ActiveModel {
            indexer: Set(key.indexer.id()),
            series_id: Set(key.series_id.value()),
            template: Set(template.template().to_string()),
            title: Set(template.title().to_string()),
            season: Set(template.season()),
            enabled: Set(template.enabled()),
            is_default: Set(template.is_default()),
            season_search: Set(template.season_search()),
            ..Default::default()
        }
    }

    /// Upserts a generated template on `(indexer, series_id, title, season,
    /// default, season_search)`. The `enabled` flag of an existing row is kept.
    pub async fn upsert_default(&self, key: ShowKey, template: &SearchTemplate) -> Result<()> {
        let txn = self.conn.begin().await?;

        let existing = Self::by_key(key)
            .filter(search_templates::Column::Title.eq(template.title()))
            .filter(search_templates::Column::Season.eq(template.season()))
            .filter(search_templates::Column::IsDefault.eq(true))
            .filter(search_templates::Column::SeasonSearch.eq(template.season_search()))
            .one(&txn)
            .await?;

        match existing {
            Some(row) if row.template == template.template() => {}
            Some(row) => {
                debug!(
                    old = %row.template,
                    new = %template.template(),
                    "Rewriting default search template"
                );
                let mut active: search_templates::ActiveModel = row.into();
                active.template = Set(template.template().to_string());
                active.update(&txn).await?;
            }
            None => {
                SearchTemplates::insert(Self::new_row(key, template))
                    .exec(&txn)
                    .await?;
            }
        }

        txn.commit().await?;
        Ok(())
    }

    /// Saves a user-edited template matched on `(indexer, series_id, template, season)`.
    ///
    /// Matching rows get the new title and enabled flag; their default and
    /// season-search flags identify the row and are left alone.
    pub async fn save(&self, key: ShowKey, template: &SearchTemplate) -> Result<()> {
        let txn = self.conn.begin().await?;

        let updated = SearchTemplates::update_many()
            .col_expr(search_templates::Column::Title, Expr::value(template.title()))
            .col_expr(search_templates::Column::Enabled, Expr::value(template.enabled()))
            .filter(search_templates::Column::Indexer.eq(key.indexer.id()))
            .filter(search_templates::Column::SeriesId.eq(key.series_id.value()))
            .filter(search_templates::Column::Template.eq(template.template()))
            .filter(search_templates::Column::Season.eq(template.season()))
            .exec(&txn)
            .await?;

        if updated.rows_affected == 0 {
            SearchTemplates::insert(Self::new_row(key, template))
                .exec(&txn)
                .await?;
        }

        txn.commit().await?;
        Ok(())
    }

    /// Deletes every template of the show whose title is not in `keep_titles`.
    pub async fn delete_except_titles(&self, key: ShowKey, keep_titles: &[String]) -> Result<u64> {
        let result = SearchTemplates::delete_many()
            .filter(search_templates::Column::Indexer.eq(key.indexer.id()))
            .filter(search_templates::Column::SeriesId.eq(key.series_id.value()))
            .filter(search_templates::Column::Title.is_not_in(keep_titles.iter().cloned()))
            .exec(&self.conn)
            .await?;

        Ok(result.rows_affected)
    }

    pub async fn list(&self, key: ShowKey) -> Result<Vec<SearchTemplate>> {
        let rows = Self::by_key(key)
            .order_by_asc(search_templates::Column::SearchTemplateId)
            .all(&self.conn)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let id = row.search_template_id;
                let input = TemplateInput {
                    title: row.title,
                    template: row.template,
                    season: row.season,
                    enabled: row.enabled,
                    default: row.is_default,
                    season_search: row.season_search,
                };
                match SearchTemplate::new(input) {
                    Ok(template) => Some(template),
                    Err(e) => {
                        warn!(search_template_id = id, error = %e, "Skipping invalid search template row");
                        None
                    }
                }
            })
            .collect())
    }
}
