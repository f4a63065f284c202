use anyhow::Context;

use crate::config::Config;
use crate::db::Store;
use crate::domain::{Indexer, SeriesId};
use crate::models::show::{AliasException, Show};

/// Flags of the `add` command.
#[derive(Debug, Default, Clone)]
pub struct AddShowArgs {
    pub air_by_date: bool,
    pub sports: bool,
    pub anime: bool,
    pub scene: bool,
    pub aliases: Vec<String>,
}

/// Parses `SEASON:NAME`.
fn parse_alias(raw: &str) -> anyhow::Result<AliasException> {
    let (season, name) = raw
        .split_once(':')
        .with_context(|| format!("Alias must look like SEASON:NAME, got {raw:?}"))?;
    let season: i32 = season
        .trim()
        .parse()
        .with_context(|| format!("Invalid alias season in {raw:?}"))?;
    Ok(AliasException::new(season, name.trim())?)
}

pub async fn cmd_add_show(
    config: &Config,
    indexer: Indexer,
    series_id: i32,
    name: &str,
    args: AddShowArgs,
) -> anyhow::Result<()> {
    let mut show = Show::new(indexer, SeriesId::new(series_id), name);
    show.air_by_date = args.air_by_date;
    show.sports = args.sports;
    show.anime = args.anime;
    show.is_scene = args.scene;
    for raw in &args.aliases {
        show.push_alias(parse_alias(raw)?);
    }

    let store = Store::new(&config.general.database_path).await?;
    store.add_show(&show).await?;

    println!("✓ Tracking: {} [{}]", show.name, show.key());
    if !show.aliases.is_empty() {
        println!("  Aliases: {}", show.aliases.len());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_season_and_name() {
        let alias = parse_alias("2: Foo Zwei").unwrap();
        assert_eq!(alias.season(), 2);
        assert_eq!(alias.series_name(), "Foo Zwei");
    }

    #[test]
    fn rejects_malformed_alias() {
        assert!(parse_alias("Foo").is_err());
        assert!(parse_alias("x:Foo").is_err());
        assert!(parse_alias("-4:Foo").is_err());
    }
}
