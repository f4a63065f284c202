pub mod cli;
pub mod clients;
pub mod config;
pub mod db;
pub mod domain;
pub mod entities;
pub mod models;
pub mod services;
pub mod state;

use std::sync::Arc;
use tokio::signal;
use tokio::sync::RwLock;

use anyhow::Context;
use clap::Parser;
use cli::{Cli, Commands};
pub use config::Config;
use services::Scheduler;
use state::SharedState;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = Config::load()?;
    config.validate()?;

    init_tracing(&config)?;

    let Some(command) = cli.command else {
        use clap::CommandFactory;
        Cli::command().print_help()?;
        return Ok(());
    };

    match command {
        Commands::Daemon => run_daemon(config).await,

        Commands::Update { force } => cli::cmd_update(&config, force).await,

        Commands::Templates { indexer, series_id } => {
            cli::cmd_templates(&config, indexer, series_id).await
        }

        Commands::Shows => cli::cmd_list_shows(&config).await,

        Commands::Add {
            indexer,
            series_id,
            name,
            air_by_date,
            sports,
            anime,
            scene,
            aliases,
        } => {
            let args = cli::AddShowArgs {
                air_by_date,
                sports,
                anime,
                scene,
                aliases,
            };
            cli::cmd_add_show(&config, indexer, series_id, &name.join(" "), args).await
        }

        Commands::Remove { indexer, series_id } => {
            cli::cmd_remove_show(&config, indexer, series_id).await
        }

        Commands::Pause {
            indexer,
            series_id,
            resume,
        } => cli::cmd_pause_show(&config, indexer, series_id, resume).await,

        Commands::Init => {
            if Config::create_default_if_missing()? {
                println!("✓ Config file created. Edit config.toml and run again.");
            } else {
                println!("config.toml already exists.");
            }
            Ok(())
        }
    }
}

fn init_tracing(config: &Config) -> anyhow::Result<()> {
    use tracing_subscriber::{Layer, layer::SubscriberExt, util::SubscriberInitExt};

    let mut log_level = config.general.log_level.clone();
    if config.general.suppress_connection_errors {
        log_level.push_str(",reqwest::retry=off,hyper_util=off");
    }

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level));

    let fmt_layer = if config.general.log_format == "json" {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer);

    if config.observability.loki_enabled {
        let url = url::Url::parse(&config.observability.loki_url).context("Invalid Loki URL")?;

        let mut builder = tracing_loki::builder();
        for (key, value) in &config.observability.loki_labels {
            builder = builder.label(key.as_str(), value.as_str())?;
        }
        let (layer, task) = builder.build_url(url)?;

        tokio::spawn(task);

        registry.with(layer).init();
        info!(
            "Loki logging initialized at {}",
            config.observability.loki_url
        );
    } else {
        registry.init();
    }

    Ok(())
}

fn init_metrics(config: &Config) -> anyhow::Result<()> {
    if !config.observability.metrics_enabled {
        return Ok(());
    }

    use metrics_exporter_prometheus::PrometheusBuilder;
    let mut builder = PrometheusBuilder::new();

    if let Some(port) = config.observability.metrics_port {
        builder = builder.with_http_listener(([0, 0, 0, 0], port));
        builder
            .install()
            .context("Failed to install Prometheus exporter")?;
        info!("Prometheus metrics exported on port {}", port);
    } else {
        builder
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        info!("Prometheus metrics recorder initialized");
    }

    Ok(())
}

async fn run_daemon(config: Config) -> anyhow::Result<()> {
    info!(
        "Showarr v{} starting in daemon mode...",
        env!("CARGO_PKG_VERSION")
    );

    init_metrics(&config)?;

    let state = SharedState::new(config.clone()).await?;
    let scheduler_state = Arc::new(RwLock::new(state));

    let scheduler = Arc::new(Scheduler::new(
        Arc::clone(&scheduler_state),
        config.scheduler.clone(),
    ));

    let scheduler_handle = {
        let sched = Arc::clone(&scheduler);
        tokio::spawn(async move {
            if let Err(e) = sched.start().await {
                error!("Scheduler error: {}", e);
            }
        })
    };

    info!("Daemon running. Press Ctrl+C to stop.");

    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Shutdown signal received");
        }
        Err(e) => {
            error!("Error listening for shutdown: {}", e);
        }
    }

    scheduler.stop().await;
    scheduler_handle.abort();
    info!("Daemon stopped");

    Ok(())
}
