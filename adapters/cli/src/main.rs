#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays Lawn Defence headlessly and keeps the leaderboard.

mod config;
mod logging;
mod session;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use lawn_defence_leaderboard::{
    filter::Column, JsonFileStore, Leaderboard, MemoryStore, Player, PlayerStore, Query,
};
use lawn_defence_world::query;

use crate::{config::SessionConfig, session::Session};

const DEFAULT_LEADERBOARD: &str = "leaderboard.json";
const TOP_ROWS: usize = 10;

/// Headless Lawn Defence runner.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand)]
enum Mode {
    /// Play a scripted game and record its score.
    Play(PlayArgs),
    /// Print leaderboard records, best first.
    Leaderboard {
        /// Leaderboard file to read.
        #[arg(long, default_value = DEFAULT_LEADERBOARD)]
        file: PathBuf,
        /// Query such as `nickname:bo; score:>=1000`.
        #[arg(short, long, default_value = "")]
        filter: String,
    },
}

#[derive(Args)]
struct PlayArgs {
    /// Session file in TOML format.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Overrides the session seed.
    #[arg(long)]
    seed: Option<u64>,
    /// Overrides the number of rounds to play.
    #[arg(long)]
    rounds: Option<u32>,
    /// Name recorded on the leaderboard.
    #[arg(long, default_value = "autopilot")]
    nickname: String,
    /// Leaderboard file; scores are not persisted without one.
    #[arg(long)]
    leaderboard: Option<PathBuf>,
}

/// Entry point for the Lawn Defence command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.mode {
        Mode::Play(args) => play(args),
        Mode::Leaderboard { file, filter } => {
            let leaderboard = Leaderboard::open(JsonFileStore::new(file))
                .context("failed to open leaderboard")?;
            print_rows(&leaderboard, &Query::parse(&filter), usize::MAX);
            Ok(())
        }
    }
}

fn play(args: PlayArgs) -> Result<()> {
    let mut config = SessionConfig::load(args.config.as_deref())?;
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(rounds) = args.rounds {
        config.max_rounds = rounds;
    }

    let mut session = Session::new(&config)?;
    println!("{}", query::welcome_banner(session.world()));
    let outcome = session.run()?;
    println!(
        "{} after {} rounds ({} ticks, {:.1}s in rounds): score {}",
        if outcome.defeated { "defeated" } else { "survived" },
        outcome.rounds_completed,
        query::tick_index(session.world()),
        query::elapsed(session.world()).as_secs_f32(),
        outcome.score,
    );

    let player = Player::new(args.nickname, outcome.score);
    match args.leaderboard {
        Some(path) => record(
            Leaderboard::open(JsonFileStore::new(path)).context("failed to open leaderboard")?,
            player,
        ),
        None => record(Leaderboard::open(MemoryStore::default())?, player),
    }
}

fn record<S: PlayerStore>(mut leaderboard: Leaderboard<S>, player: Player) -> Result<()> {
    if !leaderboard.record(player)? {
        println!("score too low for the leaderboard");
    }
    print_rows(&leaderboard, &Query::default(), TOP_ROWS);
    Ok(())
}

fn print_rows<S: PlayerStore>(leaderboard: &Leaderboard<S>, query: &Query, limit: usize) {
    let header: Vec<&str> = Column::ALL.iter().map(|column| column.name()).collect();
    println!("{:<24}{:>12}", header[0], header[1]);
    for player in leaderboard.search(query).into_iter().take(limit) {
        println!(
            "{:<24}{:>12}",
            Column::Nickname.text(player),
            Column::Score.text(player)
        );
    }
}
