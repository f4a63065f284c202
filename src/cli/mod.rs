//! CLI module - Command-line interface for Showarr
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use clap::{Parser, Subcommand};

use crate::domain::Indexer;

/// Showarr - TV show update scheduler and search template manager
#[derive(Parser)]
#[command(name = "showarr")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run as background daemon with scheduler
    #[command(alias = "-d", alias = "--daemon")]
    Daemon,

    /// Run a single show update pass
    #[command(alias = "u")]
    Update {
        /// Mark the run as manually forced
        #[arg(long)]
        force: bool,
    },

    /// Regenerate and print the search templates of a show as JSON
    #[command(alias = "t")]
    Templates {
        /// Indexer slug, name or id (e.g. tvmaze)
        indexer: Indexer,
        /// Series id on the indexer
        series_id: i32,
    },

    /// List tracked shows
    #[command(alias = "ls", alias = "list")]
    Shows,

    /// Track a show
    #[command(alias = "a")]
    Add {
        /// Indexer slug, name or id (e.g. tvmaze)
        indexer: Indexer,
        /// Series id on the indexer
        series_id: i32,
        /// Show name
        #[arg(required = true)]
        name: Vec<String>,
        /// Episodes are numbered by air date
        #[arg(long)]
        air_by_date: bool,
        /// Sports show
        #[arg(long)]
        sports: bool,
        /// Anime show
        #[arg(long)]
        anime: bool,
        /// Releases use scene numbering
        #[arg(long)]
        scene: bool,
        /// Alternate name as SEASON:NAME, season -1 for all seasons (repeatable)
        #[arg(long = "alias", value_name = "SEASON:NAME")]
        aliases: Vec<String>,
    },

    /// Stop tracking a show
    #[command(alias = "rm")]
    Remove {
        indexer: Indexer,
        series_id: i32,
    },

    /// Pause or resume scheduled updates for a show
    Pause {
        indexer: Indexer,
        series_id: i32,
        /// Resume instead of pausing
        #[arg(long)]
        resume: bool,
    },

    /// Create default config file
    #[command(alias = "--init")]
    Init,
}

pub use commands::*;
