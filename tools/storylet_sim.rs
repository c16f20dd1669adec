/// Storylet Sim: run a seeded session and print the beats it tells.
///
/// Usage: storylet_sim <seed_file> [--rounds <n>] [--rng-seed <n>] [--minutes-per-round <n>] [--json]
use std::path::PathBuf;
use std::process;

use clap::Parser;
use storylet_engine::core::seeding::DEFAULT_STORYLET_LIMIT;
use storylet_engine::{Clock, ContentDelta, ManualClock, StoryletEngine, SystemClock};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "storylet_sim", about = "Run a storylet session from a seed file", version)]
struct Args {
    /// Seed file (.ron or .json)
    seed_file: PathBuf,

    /// Rounds to run
    #[arg(short, long, default_value_t = 10)]
    rounds: usize,

    /// RNG seed; the same seed replays the same story
    #[arg(long, default_value_t = 42)]
    rng_seed: u64,

    /// Simulated time between rounds, so cooldowns can expire
    #[arg(long, default_value_t = 10)]
    minutes_per_round: u64,

    /// Raise tension every n rounds (0 disables)
    #[arg(long, default_value_t = 0)]
    escalate_every: usize,

    /// Cap on storylets generated from the seed's entities
    #[arg(long, default_value_t = DEFAULT_STORYLET_LIMIT)]
    limit: usize,

    /// Print beats as JSON lines
    #[arg(long)]
    json: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("storylet_engine=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let clock = ManualClock::new(SystemClock.now());

    let mut engine = match StoryletEngine::builder()
        .seed(args.rng_seed)
        .clock(clock.clone())
        .storylet_limit(args.limit)
        .seed_file(&args.seed_file)
        .build()
    {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("ERROR: {e}");
            process::exit(1);
        }
    };

    if !args.json {
        println!(
            "Loaded {} storylets from {}\n",
            engine.catalog().len(),
            args.seed_file.display()
        );
    }

    let mut told = 0;
    for round in 1..=args.rounds {
        if args.escalate_every > 0 && round % args.escalate_every == 0 {
            let delta = ContentDelta {
                tension_delta: 0.15,
                escalate: true,
                ..ContentDelta::default()
            };
            if let Err(e) = engine.apply(delta) {
                eprintln!("ERROR: {e}");
                process::exit(1);
            }
        }

        let Some(beat) = engine.step() else {
            if !args.json {
                println!("(nothing eligible after {told} beats)");
            }
            break;
        };
        told += 1;

        if args.json {
            match serde_json::to_string(&beat) {
                Ok(line) => println!("{line}"),
                Err(e) => eprintln!("ERROR: {e}"),
            }
        } else {
            println!(
                "[{:>3}] {:<32} weight {:>7.2}  of {} candidates",
                beat.round, beat.name, beat.adjusted_weight, beat.candidates
            );
            for consequence in &beat.consequences {
                println!("        - {consequence}");
            }
        }

        clock.advance_secs(args.minutes_per_round * 60);
    }

    if !args.json {
        let analysis = engine.analyze();
        println!(
            "\n{} beats, world tension {:.2}, complexity {:.2}",
            told,
            engine.world().tension,
            analysis.complexity_score
        );
        for suggestion in analysis.suggestions() {
            println!("  - {suggestion}");
        }
    }
}
