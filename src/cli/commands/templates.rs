use crate::config::Config;
use crate::domain::{Indexer, SeriesId, ShowKey};
use crate::state::SharedState;

pub async fn cmd_templates(config: &Config, indexer: Indexer, series_id: i32) -> anyhow::Result<()> {
    let state = SharedState::new(config.clone()).await?;
    let key = ShowKey::new(indexer, SeriesId::new(series_id));

    let Some(templates) = state.generate_templates(key).await? else {
        println!("Show {key} is not tracked.");
        println!("Use 'showarr shows' to see tracked shows.");
        return Ok(());
    };

    println!("{}", serde_json::to_string_pretty(&templates.to_json()?)?);

    Ok(())
}
