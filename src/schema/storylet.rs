use serde::{Deserialize, Serialize};

/// Descriptive payload of a storylet. Opaque to selection; consumed by
/// whatever presents or applies the storylet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoryletContent {
    pub description: String,
    #[serde(default)]
    pub actions: Vec<String>,
    #[serde(default)]
    pub consequences: Vec<String>,
}

/// A self-contained narrative fragment with an eligibility trigger,
/// a payload, and a base selection weight.
///
/// `last_used` is bookkeeping owned by the catalog; everything else is
/// treated as an immutable template once the storylet is registered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Storylet {
    pub id: String,
    pub name: String,
    pub trigger: String,
    #[serde(default)]
    pub content: StoryletContent,
    #[serde(default = "default_weight")]
    pub weight: f64,
    /// Seconds before the storylet may fire again after a use.
    #[serde(default)]
    pub cooldown: Option<f64>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Milliseconds since the Unix epoch of the most recent selection.
    #[serde(default)]
    pub last_used: Option<u64>,
    #[serde(default)]
    pub prerequisites: Vec<String>,
    #[serde(default)]
    pub excludes: Vec<String>,
}

fn default_weight() -> f64 {
    1.0
}

impl Storylet {
    pub fn new(id: impl Into<String>, name: impl Into<String>, trigger: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            trigger: trigger.into(),
            content: StoryletContent::default(),
            weight: default_weight(),
            cooldown: None,
            tags: Vec::new(),
            last_used: None,
            prerequisites: Vec::new(),
            excludes: Vec::new(),
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_cooldown(mut self, seconds: f64) -> Self {
        self.cooldown = Some(seconds);
        self
    }

    /// Tags are stored lowercase so tag matching never depends on the
    /// author's capitalisation.
    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_lowercase()).collect();
        self
    }

    pub fn with_prerequisites(mut self, flags: &[&str]) -> Self {
        self.prerequisites = flags.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn with_excludes(mut self, flags: &[&str]) -> Self {
        self.excludes = flags.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn with_content(mut self, content: StoryletContent) -> Self {
        self.content = content;
        self
    }

    pub fn with_last_used(mut self, at_ms: u64) -> Self {
        self.last_used = Some(at_ms);
        self
    }

    /// Returns true if this storylet carries the given tag.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}
