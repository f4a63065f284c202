//! List shows command handler

use crate::config::Config;
use crate::db::Store;

pub async fn cmd_list_shows(config: &Config) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let shows = store.list_shows().await?;

    if shows.is_empty() {
        println!("No shows being tracked.");
        println!();
        println!("Add a show with: showarr add tvmaze <series_id> \"show name\"");
        return Ok(());
    }

    println!("Tracked Shows ({} total)", shows.len());
    println!("{:-<70}", "");

    for show in shows {
        let status_indicator = if show.paused { "⏸" } else { "•" };
        let kind = format!("{:?}", show.kind());

        println!("{} {} [{}]", status_indicator, show.name, show.key());
        println!(
            "  Indexer: {} | Kind: {} | Scene: {} | Aliases: {}",
            show.indexer,
            kind,
            if show.is_scene { "yes" } else { "no" },
            show.aliases.len()
        );
    }

    println!();
    println!("Legend: • Active | ⏸ Paused");

    Ok(())
}
