/// Seeding: the starting storylets, world, and context for a session,
/// derived from a `SeedConfig`.
use tracing::warn;

use crate::core::context::{NarrativeContext, Pacing};
use crate::schema::seed::{NarrativeDepth, SeedConfig};
use crate::schema::storylet::{Storylet, StoryletContent};
use crate::schema::world::{
    CharacterState, ItemState, LocationState, Mood, RelationshipKind, RelationshipState,
    WorldState,
};

/// Generated storylets kept per session unless the caller asks otherwise.
pub const DEFAULT_STORYLET_LIMIT: usize = 20;

/// Sessions open quiet.
pub const OPENING_TENSION: f64 = 0.2;

const DEFAULT_GOALS: [&str; 3] = ["character-development", "world-building", "plot-advancement"];

fn content(description: String, actions: [String; 3], consequences: [String; 3]) -> StoryletContent {
    StoryletContent {
        description,
        actions: actions.into(),
        consequences: consequences.into(),
    }
}

/// Storylets implied by the seed's characters, environments and items,
/// followed by the general story beats, truncated to `limit`. Storylets
/// authored in the seed's `narrative` block are appended after the limit
/// is applied, so hand-written content is never dropped.
pub fn base_storylets(seed: &SeedConfig, limit: usize) -> Vec<Storylet> {
    let mut storylets = Vec::new();

    for (id, character) in &seed.characters {
        let name = &character.name;
        let lower = name.to_lowercase();

        storylets.push(
            Storylet::new(
                format!("intro-{id}"),
                format!("{name} Introduction"),
                format!("when story begins or {lower} first appears"),
            )
            .with_content(content(
                format!("Introduce {name} to the story"),
                [
                    format!("{name} makes their first appearance"),
                    format!("Establish {name}'s personality and role"),
                    format!("Show {name} in their element"),
                ],
                [
                    format!("{name} is established in the narrative"),
                    format!("Other characters can interact with {name}"),
                    format!("{name}'s story arc begins"),
                ],
            ))
            .with_weight(100.0)
            .with_tags(&["introduction", "character", lower.as_str()])
            .with_cooldown(3600.0),
        );

        if character.description.is_some() {
            storylets.push(
                Storylet::new(
                    format!("develop-{id}"),
                    format!("{name} Development"),
                    format!("when {lower} is present and story needs development"),
                )
                .with_content(content(
                    format!("Develop {name}'s character through action"),
                    [
                        format!("{name} faces a personal challenge"),
                        "Character traits are revealed through behavior".to_string(),
                        format!("{name} makes a significant choice"),
                    ],
                    [
                        format!("{name} grows as a character"),
                        format!("Relationships with {name} evolve"),
                        "New story possibilities emerge".to_string(),
                    ],
                ))
                .with_weight(80.0)
                .with_tags(&["development", "character", lower.as_str()])
                .with_cooldown(1800.0),
            );
        }
    }

    for (id, environment) in &seed.environments {
        let name = &environment.name;
        let lower = name.to_lowercase();
        let approaching = format!("approaching_{id}");

        storylets.push(
            Storylet::new(
                format!("explore-{id}"),
                format!("Exploring {name}"),
                format!("when characters arrive at {lower}"),
            )
            .with_content(content(
                format!("Characters explore and discover {name}"),
                [
                    format!("Detailed description of {name}"),
                    "Characters notice important details".to_string(),
                    "Hidden aspects of the location are revealed".to_string(),
                ],
                [
                    format!("{name} becomes familiar"),
                    "New paths or secrets are discovered".to_string(),
                    "Characters gain environmental knowledge".to_string(),
                ],
            ))
            .with_weight(90.0)
            .with_tags(&["exploration", "environment", lower.as_str()])
            .with_prerequisites(&[approaching.as_str()]),
        );
    }

    for (id, item) in &seed.items {
        let name = &item.name;
        let lower = name.to_lowercase();

        storylets.push(
            Storylet::new(
                format!("discover-{id}"),
                format!("Discovering {name}"),
                "when characters search or explore",
            )
            .with_content(content(
                format!("Characters discover the {name}"),
                [
                    format!("The {name} is found in an interesting location"),
                    "Characters examine and understand its significance".to_string(),
                    format!("Decision about what to do with the {name}"),
                ],
                [
                    format!("{name} is added to inventory"),
                    "New story possibilities open up".to_string(),
                    "Characters gain a useful tool or information".to_string(),
                ],
            ))
            .with_weight(70.0)
            .with_tags(&["discovery", "item", lower.as_str()])
            .with_cooldown(900.0),
        );
    }

    storylets.extend(general_storylets());
    storylets.truncate(limit);

    if let Some(narrative) = &seed.narrative {
        for (index, authored) in narrative.storylets.iter().enumerate() {
            let id = authored
                .id
                .clone()
                .unwrap_or_else(|| format!("authored-{}", index + 1));
            let name = authored.name.clone().unwrap_or_else(|| id.clone());
            let mut storylet = Storylet::new(id, name, authored.trigger.clone())
                .with_content(authored.content())
                .with_weight(authored.weight.unwrap_or(50.0));
            storylet.tags = authored.tags.iter().map(|t| t.to_lowercase()).collect();
            storylet.cooldown = authored.cooldown;
            storylet.prerequisites = authored.prerequisites.clone();
            storylet.excludes = authored.excludes.clone();
            storylets.push(storylet);
        }
    }

    storylets
}

fn general_storylets() -> [Storylet; 3] {
    [
        Storylet::new("opening-scene", "Story Opening", "when story begins")
            .with_content(content(
                "Set the stage and hook the audience".to_string(),
                [
                    "Establish the setting and atmosphere".to_string(),
                    "Introduce the central premise".to_string(),
                    "Create immediate engagement".to_string(),
                ],
                [
                    "Story officially begins".to_string(),
                    "Audience is invested".to_string(),
                    "Narrative momentum is established".to_string(),
                ],
            ))
            .with_weight(200.0)
            .with_tags(&["opening", "structure"])
            .with_cooldown(86_400.0),
        Storylet::new(
            "plot-twist",
            "Unexpected Revelation",
            "when tension is medium and story needs surprise",
        )
        .with_content(content(
            "Introduce an unexpected plot development".to_string(),
            [
                "Reveal hidden information".to_string(),
                "Subvert audience expectations".to_string(),
                "Change the direction of the story".to_string(),
            ],
            [
                "Story takes new direction".to_string(),
                "Characters must adapt to new reality".to_string(),
                "Audience engagement increases".to_string(),
            ],
        ))
        .with_weight(60.0)
        .with_tags(&["twist", "surprise", "plot"])
        .with_cooldown(3600.0),
        Storylet::new(
            "emotional-moment",
            "Emotional Core Scene",
            "when characters need emotional development",
        )
        .with_content(content(
            "Focus on character emotions and relationships".to_string(),
            [
                "Characters share vulnerable moments".to_string(),
                "Emotional stakes are clarified".to_string(),
                "Relationships deepen or strain".to_string(),
            ],
            [
                "Character bonds strengthen or break".to_string(),
                "Emotional investment increases".to_string(),
                "Character motivations become clearer".to_string(),
            ],
        ))
        .with_weight(85.0)
        .with_tags(&["emotion", "character", "relationship"])
        .with_cooldown(1200.0),
    ]
}

pub fn parse_relationship_kind(kind: &str) -> Option<RelationshipKind> {
    match kind.trim().to_lowercase().as_str() {
        "friend" | "ally" => Some(RelationshipKind::Friend),
        "enemy" | "foe" | "nemesis" => Some(RelationshipKind::Enemy),
        "lover" => Some(RelationshipKind::Lover),
        "rival" => Some(RelationshipKind::Rival),
        "mentor" => Some(RelationshipKind::Mentor),
        "family" => Some(RelationshipKind::Family),
        _ => None,
    }
}

/// Starting strength for a freshly seeded relationship.
fn initial_strength(kind: RelationshipKind) -> f64 {
    match kind {
        RelationshipKind::Enemy => -0.7,
        RelationshipKind::Rival => -0.3,
        RelationshipKind::Friend | RelationshipKind::Family => 0.5,
        RelationshipKind::Mentor => 0.6,
        RelationshipKind::Lover => 0.8,
    }
}

/// The world as it stands before the first round.
pub fn world_from_seed(seed: &SeedConfig) -> WorldState {
    let mut world = WorldState::new().with_tension(OPENING_TENSION);
    world.mood = seed
        .metadata
        .mood
        .as_deref()
        .and_then(Mood::parse)
        .unwrap_or_default();

    for (id, character) in &seed.characters {
        world.characters.insert(
            id.clone(),
            CharacterState {
                id: id.clone(),
                name: character.name.clone(),
                location: "unknown".to_string(),
                health: 100.0,
                motivation: character
                    .description
                    .clone()
                    .unwrap_or_else(|| "Unknown motivation".to_string()),
                relationships: Vec::new(),
                inventory: Vec::new(),
                flags: Default::default(),
            },
        );
    }

    for (id, character) in &seed.characters {
        for rel in &character.relationships {
            let Some(kind) = parse_relationship_kind(&rel.kind) else {
                warn!(character = %id, kind = %rel.kind, "unknown relationship type skipped");
                continue;
            };
            let rel_id = format!("{id}-{}", rel.entity);
            if let Some(state) = world.characters.get_mut(id) {
                state.relationships.push(rel_id.clone());
            }
            world.add_relationship(RelationshipState {
                id: rel_id,
                character_a: id.clone(),
                character_b: rel.entity.clone(),
                kind,
                strength: initial_strength(kind),
                history: if rel.notes.is_empty() {
                    Vec::new()
                } else {
                    vec![rel.notes.clone()]
                },
            });
        }
    }

    for (id, environment) in &seed.environments {
        world.locations.insert(
            id.clone(),
            LocationState {
                id: id.clone(),
                name: environment.name.clone(),
                description: environment.description.clone().unwrap_or_default(),
                characters: Vec::new(),
                items: Vec::new(),
                connections: Vec::new(),
                flags: Default::default(),
            },
        );
    }

    for (id, item) in &seed.items {
        world.items.insert(
            id.clone(),
            ItemState {
                id: id.clone(),
                name: item.name.clone(),
                description: item.description.clone().unwrap_or_default(),
                location: None,
                owner: None,
                flags: Default::default(),
            },
        );
    }

    world
}

pub fn pacing_for(depth: NarrativeDepth) -> Pacing {
    match depth {
        NarrativeDepth::Surface => Pacing::Fast,
        NarrativeDepth::Moderate => Pacing::Medium,
        NarrativeDepth::Deep => Pacing::Slow,
    }
}

/// Opening context: everyone on stage, opening scene, seed goals or the
/// default three.
pub fn context_from_seed(seed: &SeedConfig, recent_capacity: usize) -> NarrativeContext {
    let mut ctx = NarrativeContext::with_capacity(recent_capacity)
        .scene("opening")
        .pacing(pacing_for(seed.depth()))
        .tension(OPENING_TENSION);
    ctx.active_characters = seed.characters.keys().cloned().collect();

    let goals = seed
        .narrative
        .as_ref()
        .map(|n| n.goals.clone())
        .unwrap_or_default();
    ctx.narrative_goals = if goals.is_empty() {
        DEFAULT_GOALS.iter().map(|g| g.to_string()).collect()
    } else {
        goals
    };
    ctx
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::seed::{
        CharacterSeed, EnvironmentSeed, ItemSeed, NarrativeSeed, RelationshipSeed, StoryletSeed,
    };

    fn sample_seed() -> SeedConfig {
        let mut seed = SeedConfig {
            name: "Saltmarsh".to_string(),
            ..SeedConfig::default()
        };
        seed.characters.insert(
            "ada".to_string(),
            CharacterSeed {
                name: "Ada".to_string(),
                description: Some("A smuggler with debts".to_string()),
                relationships: vec![RelationshipSeed {
                    entity: "bram".to_string(),
                    kind: "Enemy".to_string(),
                    notes: "Owes him money".to_string(),
                }],
            },
        );
        seed.characters.insert(
            "bram".to_string(),
            CharacterSeed {
                name: "Bram".to_string(),
                description: None,
                relationships: vec![RelationshipSeed {
                    entity: "ada".to_string(),
                    kind: "frenemy".to_string(),
                    notes: String::new(),
                }],
            },
        );
        seed.environments.insert(
            "docks".to_string(),
            EnvironmentSeed {
                name: "The Docks".to_string(),
                description: None,
            },
        );
        seed.items.insert(
            "ledger".to_string(),
            ItemSeed {
                name: "Ledger".to_string(),
                description: Some("Water-stained".to_string()),
            },
        );
        seed
    }

    #[test]
    fn base_storylets_cover_every_entity() {
        let storylets = base_storylets(&sample_seed(), DEFAULT_STORYLET_LIMIT);
        let ids: Vec<&str> = storylets.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "intro-ada",
                "develop-ada",
                "intro-bram",
                "explore-docks",
                "discover-ledger",
                "opening-scene",
                "plot-twist",
                "emotional-moment",
            ]
        );
    }

    #[test]
    fn base_storylet_details() {
        let storylets = base_storylets(&sample_seed(), DEFAULT_STORYLET_LIMIT);
        let explore = storylets.iter().find(|s| s.id == "explore-docks").unwrap();
        assert_eq!(explore.trigger, "when characters arrive at the docks");
        assert_eq!(explore.prerequisites, vec!["approaching_docks".to_string()]);
        assert_eq!(explore.weight, 90.0);
        assert!(explore.has_tag("the docks"));

        let develop = storylets.iter().find(|s| s.id == "develop-ada").unwrap();
        assert_eq!(develop.trigger, "when ada is present and story needs development");
        assert_eq!(develop.content.actions.len(), 3);
    }

    #[test]
    fn limit_truncates_generated_but_keeps_authored() {
        let mut seed = sample_seed();
        seed.narrative = Some(NarrativeSeed {
            storylets: vec![StoryletSeed {
                id: None,
                name: None,
                trigger: "when tension is high".to_string(),
                content: "The tide turns".to_string(),
                actions: Vec::new(),
                consequences: Vec::new(),
                weight: None,
                tags: vec!["Climax".to_string()],
                cooldown: None,
                prerequisites: Vec::new(),
                excludes: Vec::new(),
            }],
            ..NarrativeSeed::default()
        });
        let storylets = base_storylets(&seed, 2);
        let ids: Vec<&str> = storylets.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["intro-ada", "develop-ada", "authored-1"]);
        assert_eq!(storylets[2].weight, 50.0);
        assert_eq!(storylets[2].tags, vec!["climax".to_string()]);
    }

    #[test]
    fn world_from_seed_builds_entities_and_relationships() {
        let world = world_from_seed(&sample_seed());
        assert_eq!(world.characters.len(), 2);
        assert_eq!(world.locations.len(), 1);
        assert_eq!(world.items.len(), 1);
        assert_eq!(world.tension, OPENING_TENSION);
        assert_eq!(world.mood, Mood::Mysterious);
        assert_eq!(world.characters["bram"].motivation, "Unknown motivation");

        // "frenemy" is not a known kind and is dropped
        assert_eq!(world.relationships.len(), 1);
        let rel = &world.relationships["ada-bram"];
        assert_eq!(rel.kind, RelationshipKind::Enemy);
        assert!(world.has_conflict());
        assert_eq!(world.characters["ada"].relationships, vec!["ada-bram".to_string()]);
    }

    #[test]
    fn mood_comes_from_metadata() {
        let mut seed = sample_seed();
        seed.metadata.mood = Some("Tragic".to_string());
        assert_eq!(world_from_seed(&seed).mood, Mood::Tragic);
    }

    #[test]
    fn context_from_seed_defaults() {
        let ctx = context_from_seed(&sample_seed(), 4);
        assert_eq!(ctx.current_scene, "opening");
        assert_eq!(ctx.active_characters, vec!["ada".to_string(), "bram".to_string()]);
        assert_eq!(ctx.pacing, Pacing::Medium);
        assert_eq!(ctx.narrative_goals.len(), 3);
        assert_eq!(ctx.recent_capacity(), 4);
    }

    #[test]
    fn depth_drives_pacing() {
        assert_eq!(pacing_for(NarrativeDepth::Surface), Pacing::Fast);
        assert_eq!(pacing_for(NarrativeDepth::Deep), Pacing::Slow);
    }
}
