//! Cake Catch headless entry point
//!
//! Plays one full round with the autopilot standing in for hand tracking,
//! then records the result on the leaderboard.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::Parser;

use cake_catch::sim::{Catcher, GameSession, autopilot_target};
use cake_catch::{Leaderboard, Result, Settings, Tuning};

#[derive(Debug, Parser)]
#[command(name = "cake-catch", about = "Play a 60 second Cake Catch round headlessly")]
struct Args {
    /// RNG seed (random if omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Player name for the leaderboard (defaults to the last one used)
    #[arg(long)]
    name: Option<String>,

    /// Playfield width in pixels (default 1920)
    #[arg(long)]
    width: Option<f32>,

    /// Playfield height in pixels (default 1080)
    #[arg(long)]
    height: Option<f32>,

    /// JSON tuning overrides
    #[arg(long)]
    tuning: Option<PathBuf>,

    /// Leaderboard file
    #[arg(long, default_value = "scores.json")]
    scores: PathBuf,

    /// Settings file
    #[arg(long, default_value = "settings.json")]
    settings: PathBuf,

    /// Print every tick with catches or milestones as a JSON line
    #[arg(long)]
    events: bool,
}

fn now_ms() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64() * 1000.0)
        .unwrap_or(0.0)
}

fn run(args: Args) -> Result<()> {
    let mut settings = Settings::load(&args.settings);
    let name = args
        .name
        .clone()
        .unwrap_or_else(|| settings.last_name.clone());
    settings.remember_player(&name);
    if let Err(e) = settings.save(&args.settings) {
        log::warn!("Could not save settings: {}", e);
    }

    let mut tuning = match &args.tuning {
        Some(path) => Tuning::load(path)?,
        None => Tuning::default(),
    };
    if args.width.is_some() || args.height.is_some() {
        let width = args.width.unwrap_or(tuning.screen_width);
        let height = args.height.unwrap_or(tuning.screen_height);
        tuning = tuning.with_screen(width, height);
    }
    tuning.validate()?;

    let seed = args.seed.unwrap_or_else(|| now_ms() as u64);
    let dt = tuning.tick_dt();
    let mut catcher = Catcher::new(&tuning);
    let mut session = GameSession::new(tuning, seed);

    let mut next_report = 10.0;
    loop {
        // Stand-in for the hand tracker: None keeps the previous target
        let target = autopilot_target(session.items(), &catcher, session.tuning().screen_width);
        catcher.update_target(target);
        catcher.update();

        let result = session.advance(dt, catcher.rect());
        if result.terminal {
            break;
        }

        if args.events && (!result.catches.is_empty() || !result.milestones.is_empty()) {
            println!("{}", serde_json::to_string(&result)?);
        }
        if session.take_special_visual() {
            log::info!("Combo x10 celebration!");
        }

        if session.elapsed_time() >= next_report {
            let (combo, window) = session.combo_state();
            log::info!(
                "{:>4.1}s left | score {} | combo x{} ({:.0}%)",
                session.remaining_time(),
                session.score(),
                combo,
                window * 100.0
            );
            next_report += 10.0;
        }
    }

    let score = session.score();
    let specials = session.special_schedule().total_special_spawned;
    println!("{} scored {} ({} specials offered)", settings.last_name, score, specials);

    let mut board = Leaderboard::load(&args.scores);
    match board.add_score(&settings.last_name, score, now_ms()) {
        Some(rank) => println!("New high score! Rank #{}", rank),
        None => println!("No high score this time"),
    }
    board.save(&args.scores)?;

    for (i, entry) in board.entries.iter().enumerate() {
        println!("{:>2}. {:<15} {:>6}", i + 1, entry.name, entry.score);
    }

    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Cake Catch (headless) starting...");

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
