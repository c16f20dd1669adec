/// Seed Linter: checks a seed file for storylets that can never fire or
/// will never be weighed the way the author expects.
///
/// Usage: seed_linter <seed_file> [--strict]
use std::collections::HashSet;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use storylet_engine::core::seeding::{self, DEFAULT_STORYLET_LIMIT};
use storylet_engine::core::trigger::Trigger;
use storylet_engine::SeedConfig;

#[derive(Parser)]
#[command(name = "seed_linter", about = "Validate a storylet seed file", version)]
struct Args {
    /// Seed file (.ron or .json)
    seed_file: PathBuf,

    /// Treat warnings as errors
    #[arg(long)]
    strict: bool,
}

fn main() {
    let args = Args::parse();

    let seed = match SeedConfig::load(&args.seed_file) {
        Ok(seed) => seed,
        Err(e) => {
            eprintln!("ERROR: Failed to load seed file: {e}");
            process::exit(1);
        }
    };

    let (errors, warnings) = lint_seed(&seed);

    println!("\n=== Seed Lint Report: {} ===\n", seed.name);

    if errors.is_empty() && warnings.is_empty() {
        println!("All checks passed!");
    }
    for warning in &warnings {
        println!("WARNING: {warning}");
    }
    for error in &errors {
        println!("ERROR: {error}");
    }
    println!("\nSummary: {} errors, {} warnings", errors.len(), warnings.len());

    let failed = !errors.is_empty() || (args.strict && !warnings.is_empty());
    process::exit(i32::from(failed));
}

fn lint_seed(seed: &SeedConfig) -> (Vec<String>, Vec<String>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    for (id, character) in &seed.characters {
        for rel in &character.relationships {
            if seeding::parse_relationship_kind(&rel.kind).is_none() {
                warnings.push(format!(
                    "Character '{id}' has relationship type '{}' which will be skipped",
                    rel.kind
                ));
            }
            if !seed.characters.contains_key(&rel.entity) {
                warnings.push(format!(
                    "Character '{id}' relates to unknown character '{}'",
                    rel.entity
                ));
            }
        }
    }

    let storylets = seeding::base_storylets(seed, DEFAULT_STORYLET_LIMIT);
    let mut seen = HashSet::new();
    for storylet in &storylets {
        let id = storylet.id.as_str();

        if !seen.insert(id) {
            errors.push(format!("Storylet id '{id}' is used more than once; the later one wins"));
        }

        if !(storylet.weight.is_finite() && storylet.weight > 0.0) {
            errors.push(format!(
                "Storylet '{id}' has weight {} and can only be picked as a fallback",
                storylet.weight
            ));
        }

        if let Some(cooldown) = storylet.cooldown {
            if !(cooldown.is_finite() && cooldown > 0.0) {
                warnings.push(format!("Storylet '{id}' has cooldown {cooldown} which is ignored"));
            }
        }

        let trimmed = storylet.trigger.trim();
        if !trimmed.is_empty() && Trigger::parse(trimmed) == Trigger::Always {
            warnings.push(format!(
                "Storylet '{id}' trigger \"{trimmed}\" matches no pattern and is always eligible"
            ));
        }

        for flag in &storylet.prerequisites {
            if storylet.excludes.contains(flag) {
                errors.push(format!(
                    "Storylet '{id}' both requires and excludes '{flag}' and can never fire"
                ));
            }
        }
    }

    // two per character, one per environment and item, three general beats
    let generated = seed.characters.len() * 2 + seed.environments.len() + seed.items.len() + 3;
    if generated > DEFAULT_STORYLET_LIMIT {
        warnings.push(format!(
            "Seed entities produce {generated} storylets; only the first {DEFAULT_STORYLET_LIMIT} are kept"
        ));
    }

    (errors, warnings)
}
