//! Search template generation against a real SQLite store.

mod common;

use std::sync::Arc;

use common::temp_store;
use showarr::db::{Store, TemplateStore};
use showarr::domain::{Indexer, SeriesId};
use showarr::models::{AliasException, SearchTemplate, Show, TemplateInput};
use showarr::services::SearchTemplates;

fn engine(store: &Store, show: Show) -> SearchTemplates {
    let store = Arc::new(store.clone());
    SearchTemplates::new(show, store.clone(), store)
}

fn rendered(templates: &SearchTemplates) -> Vec<(String, i32, String, bool)> {
    templates
        .templates()
        .iter()
        .map(|t| {
            (
                t.title().to_string(),
                t.season(),
                t.template().to_string(),
                t.season_search(),
            )
        })
        .collect()
}

#[tokio::test]
async fn generate_twice_keeps_a_single_row_per_template() {
    let store = temp_store().await;
    let mut show = Show::new(Indexer::Tvdb, SeriesId::new(1), "Foo");
    show.push_alias(AliasException::new(1, "Foo Alt").unwrap());
    store.add_show(&show).await.unwrap();

    let mut templates = engine(&store, show.clone());
    templates.generate().await.unwrap();
    let first = rendered(&templates);

    let mut templates = engine(&store, show);
    templates.generate().await.unwrap();

    assert_eq!(rendered(&templates), first);
    assert_eq!(
        first,
        vec![
            ("Foo".to_string(), -1, "Foo S%0SE%0E".to_string(), false),
            ("Foo".to_string(), -1, "Foo %0S".to_string(), true),
            ("Foo Alt".to_string(), 1, "Foo Alt S%0SE%0E".to_string(), false),
            ("Foo Alt".to_string(), 1, "Foo Alt %0S".to_string(), true),
        ]
    );
}

#[tokio::test]
async fn removing_an_alias_removes_its_templates() {
    let store = temp_store().await;
    let mut show = Show::new(Indexer::Tvmaze, SeriesId::new(2), "Foo");
    show.push_alias(AliasException::new(-1, "Foo Alt").unwrap());

    engine(&store, show.clone()).generate().await.unwrap();

    show.remove_alias("Foo Alt");
    let mut templates = engine(&store, show);
    templates.generate().await.unwrap();

    assert_eq!(templates.templates().len(), 2);
    assert!(templates.templates().iter().all(|t| t.title() == "Foo"));
}

#[tokio::test]
async fn scene_exceptions_are_used_when_show_has_no_aliases() {
    let store = temp_store().await;
    let mut show = Show::new(Indexer::Tvdb, SeriesId::new(3), "Foo");
    show.anime = true;

    store
        .set_scene_exceptions(
            show.key(),
            &[AliasException::new(2, "Foo S2").unwrap()],
        )
        .await
        .unwrap();

    let mut templates = engine(&store, show);
    templates.generate().await.unwrap();

    assert_eq!(
        rendered(&templates),
        vec![
            ("Foo".to_string(), -1, "Foo %AB".to_string(), false),
            ("Foo".to_string(), -1, "Foo Season".to_string(), true),
            ("Foo S2".to_string(), 2, "Foo S2 %XE".to_string(), false),
            ("Foo S2".to_string(), 2, "Foo S2 Season".to_string(), true),
        ]
    );
}

#[tokio::test]
async fn scene_exception_matching_the_show_name_is_not_duplicated() {
    let store = temp_store().await;
    let show = Show::new(Indexer::Tvdb, SeriesId::new(8), "Foo");

    store
        .set_scene_exceptions(
            show.key(),
            &[
                AliasException::new(-1, "Foo").unwrap(),
                AliasException::new(1, "Foo One").unwrap(),
            ],
        )
        .await
        .unwrap();

    let mut templates = engine(&store, show);
    templates.generate().await.unwrap();

    let titles: Vec<_> = templates.templates().iter().map(SearchTemplate::title).collect();
    assert_eq!(titles, vec!["Foo", "Foo", "Foo One", "Foo One"]);
    assert_eq!(templates.templates()[2].template(), "Foo One S%0SE%0E");
}

#[tokio::test]
async fn air_by_date_uses_date_pattern_for_both_templates() {
    let store = temp_store().await;
    let mut show = Show::new(Indexer::Tvdb, SeriesId::new(4), "Bar");
    show.air_by_date = true;
    show.anime = true;

    let mut templates = engine(&store, show);
    templates.generate().await.unwrap();

    let patterns: Vec<_> = templates.templates().iter().map(SearchTemplate::template).collect();
    assert_eq!(patterns, vec!["Bar %A-D", "Bar %A-D"]);
}

#[tokio::test]
async fn disabled_default_survives_regeneration() {
    let store = temp_store().await;
    let show = Show::new(Indexer::Tvdb, SeriesId::new(5), "Foo");

    let mut templates = engine(&store, show.clone());
    templates.generate().await.unwrap();

    let disabled = SearchTemplate::new(TemplateInput {
        title: "Foo".to_string(),
        template: "Foo %0S".to_string(),
        season: -1,
        enabled: false,
        default: true,
        season_search: true,
    })
    .unwrap();
    let updated = templates.update(vec![disabled]).await.unwrap();
    assert!(updated[0].enabled());
    assert!(!updated[1].enabled());

    let mut templates = engine(&store, show);
    templates.generate().await.unwrap();

    let json = templates.to_json().unwrap();
    assert_eq!(json[0]["template"], "Foo S%0SE%0E");
    assert_eq!(json[0]["enabled"], true);
    assert_eq!(json[1]["template"], "Foo %0S");
    assert_eq!(json[1]["enabled"], false);
    assert_eq!(json[1]["seasonSearch"], true);
}

#[tokio::test]
async fn custom_templates_follow_the_title_rules() {
    let store = temp_store().await;
    let show = Show::new(Indexer::Tvdb, SeriesId::new(6), "Foo");

    let custom = |title: &str, template: &str| {
        SearchTemplate::new(TemplateInput {
            title: title.to_string(),
            template: template.to_string(),
            season: 1,
            enabled: true,
            default: false,
            season_search: false,
        })
        .unwrap()
    };

    store
        .save(show.key(), &custom("Foo", "Foo 1x%0E"))
        .await
        .unwrap();
    store
        .save(show.key(), &custom("Gone", "Gone 1x%0E"))
        .await
        .unwrap();

    let mut templates = engine(&store, show);
    templates.generate().await.unwrap();

    let titles: Vec<_> = templates
        .templates()
        .iter()
        .map(|t| (t.title().to_string(), t.is_default()))
        .collect();
    assert_eq!(
        titles,
        vec![
            ("Foo".to_string(), false),
            ("Foo".to_string(), true),
            ("Foo".to_string(), true),
        ]
    );
}

#[tokio::test]
async fn custom_separator_is_persisted() {
    let store = temp_store().await;
    let show = Show::new(Indexer::Tmdb, SeriesId::new(7), "Foo");

    let mut templates = engine(&store, show).with_separator(".");
    templates.generate().await.unwrap();

    assert_eq!(templates.templates()[0].template(), "Foo.S%0SE%0E");
    assert_eq!(templates.templates()[1].template(), "Foo.%0S");
}
