//! medkg CLI - answer medical questions from a knowledge graph.

mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::config::{Config, Overrides};

#[derive(Parser)]
#[command(name = "medkg")]
#[command(author, version, about = "medkg - Knowledge-graph grounded medical question answering", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (default: medkg.toml in the current or a parent directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Search budget profile (Deeper or Deep)
    #[arg(short, long, global = true)]
    budget: Option<String>,

    /// Skip second-hop expansion
    #[arg(long, global = true)]
    disable_multi_hop: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default medkg.toml
    Init {
        /// Project directory (default: current directory)
        #[arg(short, long)]
        path: Option<String>,
    },

    /// Answer one question
    Ask {
        /// The question
        question: String,

        /// Print the extracted entities and retrieved facts
        #[arg(short, long)]
        show_context: bool,
    },

    /// Answer questions interactively
    Chat {
        /// Print the extracted entities and retrieved facts
        #[arg(short, long)]
        show_context: bool,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load(cli.config.as_deref())?;
    config.apply_overrides(&Overrides {
        budget: cli.budget.clone(),
        disable_multi_hop: cli.disable_multi_hop,
    });
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Init { path } => commands::init::run(path.clone()),
        Commands::Ask {
            question,
            show_context,
        } => commands::ask::run(&load_config(&cli)?, question, *show_context),
        Commands::Chat { show_context } => {
            commands::chat::run(&load_config(&cli)?, *show_context)
        }
    }
}
