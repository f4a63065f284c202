use crate::config::Config;
use crate::db::Store;
use crate::domain::{Indexer, SeriesId, ShowKey};

pub async fn cmd_pause_show(
    config: &Config,
    indexer: Indexer,
    series_id: i32,
    resume: bool,
) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let key = ShowKey::new(indexer, SeriesId::new(series_id));

    if store.set_show_paused(key, !resume).await? {
        if resume {
            println!("✓ Resumed updates for {key}");
        } else {
            println!("✓ Paused updates for {key}");
        }
    } else {
        println!("Show {key} is not tracked.");
    }

    Ok(())
}
