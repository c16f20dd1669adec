/// Narrative context: pacing, goals, and anti-repetition tracking.
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// How many recent storylets are remembered unless configured otherwise.
pub const DEFAULT_RECENT_CAPACITY: usize = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pacing {
    Slow,
    #[default]
    Medium,
    Fast,
}

/// Session state supplied to every generation round.
///
/// `tension` is a working copy that may drift away from the world's
/// tension; weighting reads this one, trigger matching reads the world's.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrativeContext {
    recent_storylets: VecDeque<String>,
    recent_capacity: usize,
    pub current_scene: String,
    pub active_characters: Vec<String>,
    pub narrative_goals: Vec<String>,
    pub pacing: Pacing,
    pub tension: f64,
    pub last_conflict: Option<String>,
}

impl Default for NarrativeContext {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_RECENT_CAPACITY)
    }
}

impl NarrativeContext {
    pub fn with_capacity(recent_capacity: usize) -> Self {
        Self {
            recent_storylets: VecDeque::with_capacity(recent_capacity),
            recent_capacity,
            current_scene: String::new(),
            active_characters: Vec::new(),
            narrative_goals: Vec::new(),
            pacing: Pacing::default(),
            tension: 0.0,
            last_conflict: None,
        }
    }

    pub fn scene(mut self, scene: impl Into<String>) -> Self {
        self.current_scene = scene.into();
        self
    }

    pub fn pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn tension(mut self, tension: f64) -> Self {
        self.tension = tension.clamp(0.0, 1.0);
        self
    }

    pub fn characters(mut self, names: &[&str]) -> Self {
        self.active_characters = names.iter().map(|n| n.to_string()).collect();
        self
    }

    pub fn goals(mut self, goals: &[&str]) -> Self {
        self.narrative_goals = goals.iter().map(|g| g.to_string()).collect();
        self
    }

    /// Remember `id` as recently told, evicting the oldest entry once the
    /// window is full. A capacity of zero disables the window.
    pub fn record(&mut self, id: impl Into<String>) {
        if self.recent_capacity == 0 {
            return;
        }
        while self.recent_storylets.len() >= self.recent_capacity {
            self.recent_storylets.pop_front();
        }
        self.recent_storylets.push_back(id.into());
    }

    pub fn is_recent(&self, id: &str) -> bool {
        self.recent_storylets.iter().any(|r| r == id)
    }

    pub fn recent(&self) -> impl Iterator<Item = &str> {
        self.recent_storylets.iter().map(String::as_str)
    }

    pub fn recent_capacity(&self) -> usize {
        self.recent_capacity
    }

    pub fn nudge_tension(&mut self, delta: f64) {
        self.tension = (self.tension + delta).clamp(0.0, 1.0);
    }
}
