use crate::config::Config;
use crate::db::Store;
use crate::domain::{Indexer, SeriesId, ShowKey};

pub async fn cmd_remove_show(config: &Config, indexer: Indexer, series_id: i32) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let key = ShowKey::new(indexer, SeriesId::new(series_id));

    if let Some(show) = store.get_show(key).await? {
        println!("Stop tracking '{}' ({})?", show.name, key);
        println!("Enter 'y' to confirm, anything else to cancel:");

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;

        if input.trim().eq_ignore_ascii_case("y") {
            if store.remove_show(key).await? {
                println!("✓ Removed: {}", show.name);
            } else {
                println!("Failed to remove show.");
            }
        } else {
            println!("Cancelled.");
        }
    } else {
        println!("Show {key} is not tracked.");
    }

    Ok(())
}
