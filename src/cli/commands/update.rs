use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use crate::config::Config;
use crate::services::{DAILY_UPDATE_KEY, RunOutcome, Scheduler, WorkOutcome};
use crate::state::SharedState;

pub async fn cmd_update(config: &Config, force: bool) -> anyhow::Result<()> {
    let state = SharedState::new(config.clone()).await?;
    let progress = state.progress.clone();
    let scheduler = Scheduler::new(Arc::new(RwLock::new(state)), config.scheduler.clone());

    let RunOutcome::Completed(report) = scheduler.run_once(force).await else {
        println!("A show update is already running.");
        return Ok(());
    };

    if let Some(reason) = &report.aborted {
        anyhow::bail!("Show update failed: {reason}");
    }

    println!(
        "Scheduled {} full update(s) and {} season update(s)",
        report.full_refreshes().count(),
        report.season_updates().count()
    );

    for skipped in &report.skipped {
        println!("  ⚠ Skipped {}: {}", skipped.show_name, skipped.reason);
    }
    for submission in &report.submissions {
        match &submission.outcome {
            WorkOutcome::Rejected(reason) | WorkOutcome::Failed(reason) => {
                println!("  ✗ {}: {}", submission.show_name, reason);
            }
            WorkOutcome::SkippedPaused => println!("  ⏸ {} is paused", submission.show_name),
            WorkOutcome::Queued | WorkOutcome::Coalesced => {}
        }
    }

    // Queued actions run in the background; wait for them before exiting.
    loop {
        let Some(current) = progress.progress(DAILY_UPDATE_KEY).await else {
            break;
        };
        if current.is_complete() {
            println!(
                "✓ Done: {} finished, {} failed",
                current.finished, current.failed
            );
            break;
        }
        tokio::time::sleep(Duration::from_millis(250)).await;
    }

    Ok(())
}
