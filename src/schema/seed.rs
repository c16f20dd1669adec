use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

use super::storylet::StoryletContent;

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("JSON deserialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported seed format '{0}': expected .ron or .json")]
    UnsupportedFormat(String),
}

/// Declarative world description a session is generated from.
///
/// Maps are keyed by the author's ids and kept ordered so that every
/// derived storylet list comes out in the same order on every run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedConfig {
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub characters: BTreeMap<String, CharacterSeed>,
    #[serde(default)]
    pub environments: BTreeMap<String, EnvironmentSeed>,
    #[serde(default)]
    pub items: BTreeMap<String, ItemSeed>,
    #[serde(default)]
    pub metadata: SeedMetadata,
    #[serde(default)]
    pub narrative: Option<NarrativeSeed>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CharacterSeed {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub relationships: Vec<RelationshipSeed>,
}

/// A relationship as an author writes it: free-form type, target by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationshipSeed {
    pub entity: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvironmentSeed {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemSeed {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedMetadata {
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub themes: Vec<String>,
    #[serde(default)]
    pub mood: Option<String>,
}

/// How much room the story gets to breathe. Maps onto pacing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NarrativeDepth {
    Surface,
    #[default]
    Moderate,
    Deep,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NarrativeSeed {
    #[serde(default)]
    pub themes: Vec<String>,
    #[serde(default)]
    pub depth: NarrativeDepth,
    #[serde(default)]
    pub goals: Vec<String>,
    #[serde(default)]
    pub storylets: Vec<StoryletSeed>,
}

/// A hand-authored storylet in a seed file. Ids are assigned on import.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryletSeed {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    pub trigger: String,
    pub content: String,
    #[serde(default)]
    pub actions: Vec<String>,
    #[serde(default)]
    pub consequences: Vec<String>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub cooldown: Option<f64>,
    #[serde(default)]
    pub prerequisites: Vec<String>,
    #[serde(default)]
    pub excludes: Vec<String>,
}

impl StoryletSeed {
    pub fn content(&self) -> StoryletContent {
        StoryletContent {
            description: self.content.clone(),
            actions: self.actions.clone(),
            consequences: self.consequences.clone(),
        }
    }
}

impl SeedConfig {
    /// Load a seed from disk. The extension selects the format.
    pub fn load(path: &Path) -> Result<SeedConfig, SeedError> {
        let contents = std::fs::read_to_string(path)?;
        match path.extension().and_then(|s| s.to_str()) {
            Some("ron") => Self::from_ron_str(&contents),
            Some("json") => Self::from_json_str(&contents),
            other => Err(SeedError::UnsupportedFormat(
                other.unwrap_or_default().to_string(),
            )),
        }
    }

    pub fn from_ron_str(input: &str) -> Result<SeedConfig, SeedError> {
        Ok(ron::from_str(input)?)
    }

    pub fn from_json_str(input: &str) -> Result<SeedConfig, SeedError> {
        Ok(serde_json::from_str(input)?)
    }

    pub fn depth(&self) -> NarrativeDepth {
        self.narrative
            .as_ref()
            .map(|n| n.depth)
            .unwrap_or_default()
    }
}
