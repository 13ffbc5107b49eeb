//! HEXREALM CLI - Command-line interface
//!
//! Commands:
//! - new: Start a game and optionally play a command script
//! - load: Resume a saved game and optionally play a command script
//! - inspect: Print a saved game

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use hexrealm_cli::{inspect, run_script};
use hexrealm_core::{save, GameConfig, TurnEngine};

#[derive(Parser)]
#[command(name = "hexrealm")]
#[command(about = "HEXREALM turn-based hex strategy engine")]
struct Cli {
    /// Game config JSON (defaults apply to missing fields)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a new game
    New {
        #[arg(long)]
        rows: Option<u32>,
        #[arg(long)]
        cols: Option<u32>,
        #[arg(long)]
        players: Option<u8>,
        #[arg(long)]
        seed: Option<u64>,
        #[command(flatten)]
        play: PlayArgs,
    },
    /// Resume a saved game
    Load {
        /// Save file to resume
        #[arg(value_name = "SAVE")]
        save: PathBuf,
        #[command(flatten)]
        play: PlayArgs,
    },
    /// Print a saved game
    Inspect {
        #[arg(value_name = "SAVE")]
        save: PathBuf,
        /// Dump the raw save document
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct PlayArgs {
    /// Command script to run against the game
    #[arg(long, value_name = "FILE")]
    script: Option<PathBuf>,

    /// Where to write the game afterwards
    #[arg(long, value_name = "FILE")]
    out: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::default(),
    };

    match cli.command {
        Commands::New {
            rows,
            cols,
            players,
            seed,
            play,
        } => {
            let mut config = config;
            if let Some(rows) = rows {
                config.rows = rows;
            }
            if let Some(cols) = cols {
                config.cols = cols;
            }
            if let Some(players) = players {
                config = config.with_players(players);
            }
            if let Some(seed) = seed {
                config = config.with_seed(seed);
            }
            let engine = TurnEngine::new_game(&config)?;
            play_and_store(engine, &play)
        }
        Commands::Load { save: path, play } => {
            let engine = save::load_from_path(&path, config)
                .with_context(|| format!("loading {}", path.display()))?;
            play_and_store(engine, &play)
        }
        Commands::Inspect { save: path, json } => {
            let engine = save::load_from_path(&path, config)
                .with_context(|| format!("loading {}", path.display()))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&save::capture(&engine))?);
            } else {
                print!("{}", inspect::summary(&engine)?);
            }
            Ok(())
        }
    }
}

fn play_and_store(mut engine: TurnEngine, play: &PlayArgs) -> Result<()> {
    if let Some(script) = &play.script {
        let text = read_script(script)?;
        for line in run_script(&mut engine, &text)? {
            println!("{line}");
        }
    }

    print!("{}", inspect::summary(&engine)?);

    if let Some(out) = &play.out {
        engine
            .save_game(out)
            .with_context(|| format!("writing {}", out.display()))?;
        println!("saved to {}", out.display());
    }
    Ok(())
}

fn read_script(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading script {}", path.display()))
}
