/// Haunted Keep example: a seed built in code, a scripted content source,
/// and a session that escalates from a quiet homecoming to the cellar.
///
/// Run with: cargo run --example haunted_keep
use storylet_engine::schema::seed::{
    CharacterSeed, EnvironmentSeed, NarrativeDepth, NarrativeSeed, RelationshipSeed, StoryletSeed,
};
use storylet_engine::{
    ContentDelta, ManualClock, NarrativeContext, SeedConfig, Storylet, StoryletCatalog,
    StoryletEngine, WorldState,
};

fn seed() -> SeedConfig {
    let mut seed = SeedConfig {
        name: "The Haunted Keep".to_string(),
        ..SeedConfig::default()
    };

    seed.characters.insert(
        "ada".to_string(),
        CharacterSeed {
            name: "Ada".to_string(),
            description: Some("A disgraced knight come home".to_string()),
            relationships: vec![RelationshipSeed {
                entity: "bram".to_string(),
                kind: "rival".to_string(),
                notes: "He holds what was hers".to_string(),
            }],
        },
    );
    seed.characters.insert(
        "bram".to_string(),
        CharacterSeed {
            name: "Bram".to_string(),
            description: Some("The warden".to_string()),
            relationships: Vec::new(),
        },
    );
    seed.environments.insert(
        "cellar".to_string(),
        EnvironmentSeed {
            name: "Cellar".to_string(),
            description: Some("Flooded and cold".to_string()),
        },
    );

    seed.narrative = Some(NarrativeSeed {
        depth: NarrativeDepth::Deep,
        goals: vec!["revelation".to_string()],
        storylets: vec![StoryletSeed {
            id: Some("cellar-voices".to_string()),
            name: Some("Voices Below".to_string()),
            trigger: "when tension is high".to_string(),
            content: "Something answers from beneath the floor".to_string(),
            actions: Vec::new(),
            consequences: vec!["Nobody will go below".to_string()],
            weight: Some(40.0),
            tags: vec!["climax".to_string(), "revelation".to_string()],
            cooldown: Some(600.0),
            prerequisites: Vec::new(),
            excludes: Vec::new(),
        }],
        ..NarrativeSeed::default()
    });
    seed
}

fn main() {
    let clock = ManualClock::new(1_700_000_000_000);

    let mut engine = StoryletEngine::builder()
        .seed(2026)
        .clock(clock.clone())
        .with_seed_config(seed())
        .with_storylets([Storylet::new(
            "signet-found",
            "The Signet in the Silt",
            "when ada is present",
        )
        .with_weight(30.0)
        .with_prerequisites(&["cellar_opened"])
        .with_tags(&["revelation", "buildup"])])
        .build()
        .expect("Failed to build engine");

    // Every third round the keep pushes back: tension rises, and once it
    // is high enough the cellar is opened.
    let mut rounds_seen = 0;
    let mut keep = |world: &WorldState, _: &NarrativeContext, _: &StoryletCatalog| {
        rounds_seen += 1;
        if rounds_seen % 3 != 0 {
            return ContentDelta::default();
        }
        ContentDelta {
            tension_delta: 0.2,
            escalate: true,
            set_flags: if world.tension > 0.5 {
                vec!["cellar_opened".to_string()]
            } else {
                Vec::new()
            },
            ..ContentDelta::default()
        }
    };

    println!("=== The Haunted Keep ===\n");
    for _ in 0..12 {
        engine.absorb(&mut keep).expect("Failed to apply content");

        let Some(beat) = engine.step() else {
            println!("(the keep falls silent)");
            break;
        };
        println!(
            "Round {:>2} | tension {:.1} | {} (weight {:.1}, {} candidates)",
            beat.round,
            engine.world().tension,
            beat.name,
            beat.adjusted_weight,
            beat.candidates
        );
        for consequence in &beat.consequences {
            println!("           {consequence}");
        }

        clock.advance_secs(15 * 60);
    }

    let analysis = engine.analyze();
    println!(
        "\n{} characters, {} relationships, {} distinct tags, complexity {:.2}",
        analysis.character_count,
        analysis.relationship_count,
        analysis.tag_diversity,
        analysis.complexity_score
    );
}
