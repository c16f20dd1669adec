use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

/// The overall emotional register of the story world.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mood {
    Tragic,
    Comedic,
    Epic,
    #[default]
    Mysterious,
    Romantic,
}

impl Mood {
    /// Parse a mood from free text, e.g. the `metadata.mood` field of a seed.
    pub fn parse(input: &str) -> Option<Mood> {
        match input.trim().to_lowercase().as_str() {
            "tragic" => Some(Self::Tragic),
            "comedic" => Some(Self::Comedic),
            "epic" => Some(Self::Epic),
            "mysterious" => Some(Self::Mysterious),
            "romantic" => Some(Self::Romantic),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationshipKind {
    Friend,
    Enemy,
    Lover,
    Rival,
    Mentor,
    Family,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterState {
    pub id: String,
    pub name: String,
    pub location: String,
    pub health: f64,
    pub motivation: String,
    #[serde(default)]
    pub relationships: Vec<String>,
    #[serde(default)]
    pub inventory: Vec<String>,
    #[serde(default)]
    pub flags: FxHashSet<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationState {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub characters: Vec<String>,
    #[serde(default)]
    pub items: Vec<String>,
    #[serde(default)]
    pub connections: Vec<String>,
    #[serde(default)]
    pub flags: FxHashSet<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemState {
    pub id: String,
    pub name: String,
    pub description: String,
    pub location: Option<String>,
    pub owner: Option<String>,
    #[serde(default)]
    pub flags: FxHashSet<String>,
}

/// A typed edge between two characters. `strength` runs from -1 (bitter)
/// to 1 (devoted).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipState {
    pub id: String,
    pub character_a: String,
    pub character_b: String,
    pub kind: RelationshipKind,
    pub strength: f64,
    #[serde(default)]
    pub history: Vec<String>,
}

impl RelationshipState {
    /// Hostile edges are what conflict triggers look for.
    pub fn is_hostile(&self) -> bool {
        self.kind == RelationshipKind::Enemy || self.strength < -0.5
    }
}

/// Mutable snapshot of the simulated story world.
///
/// Selection only ever reads this; consequence application and external
/// content sources are the writers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldState {
    #[serde(default)]
    pub characters: FxHashMap<String, CharacterState>,
    #[serde(default)]
    pub locations: FxHashMap<String, LocationState>,
    #[serde(default)]
    pub items: FxHashMap<String, ItemState>,
    #[serde(default)]
    pub relationships: FxHashMap<String, RelationshipState>,
    #[serde(default)]
    pub global_flags: FxHashSet<String>,
    #[serde(default)]
    pub timeline_position: u64,
    /// 0.0 calm to 1.0 breaking point.
    #[serde(default)]
    pub tension: f64,
    #[serde(default)]
    pub mood: Mood,
}

impl WorldState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tension(mut self, tension: f64) -> Self {
        self.tension = tension.clamp(0.0, 1.0);
        self
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.global_flags.contains(flag)
    }

    pub fn set_flag(&mut self, flag: impl Into<String>) {
        self.global_flags.insert(flag.into());
    }

    pub fn clear_flag(&mut self, flag: &str) -> bool {
        self.global_flags.remove(flag)
    }

    /// Shift tension by `delta`, staying within [0, 1].
    pub fn adjust_tension(&mut self, delta: f64) {
        self.tension = (self.tension + delta).clamp(0.0, 1.0);
    }

    pub fn advance_timeline(&mut self) -> u64 {
        self.timeline_position += 1;
        self.timeline_position
    }

    pub fn add_relationship(&mut self, relationship: RelationshipState) {
        self.relationships
            .insert(relationship.id.clone(), relationship);
    }

    /// True when at least one relationship is openly hostile.
    pub fn has_conflict(&self) -> bool {
        self.relationships.values().any(RelationshipState::is_hostile)
    }
}
