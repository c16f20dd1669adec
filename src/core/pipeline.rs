/// The storylet pipeline: evaluate → select → mark used → remember, round
/// after round.
///
/// Also the seam where external content sources feed new storylets and
/// world changes back into a running session.
use rand::rngs::StdRng;
use rand::SeedableRng;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use crate::core::catalog::{CatalogConfig, CatalogError, StoryletCatalog};
use crate::core::clock::{Clock, SystemClock};
use crate::core::context::{NarrativeContext, DEFAULT_RECENT_CAPACITY};
use crate::core::seeding::{self, DEFAULT_STORYLET_LIMIT};
use crate::schema::seed::{SeedConfig, SeedError};
use crate::schema::storylet::Storylet;
use crate::schema::world::WorldState;

/// How far one escalation pushes the working tension.
pub const ESCALATION_STEP: f64 = 0.1;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),
    #[error("seed error: {0}")]
    Seed(#[from] SeedError),
}

/// One storylet told during a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Beat {
    pub round: u64,
    pub storylet_id: String,
    pub name: String,
    pub adjusted_weight: f64,
    /// How many storylets were eligible when this one was drawn.
    pub candidates: usize,
    pub consequences: Vec<String>,
}

/// Changes proposed by a content source between rounds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentDelta {
    pub new_storylets: Vec<Storylet>,
    pub set_flags: Vec<String>,
    pub clear_flags: Vec<String>,
    /// Added to the world's tension.
    pub tension_delta: f64,
    /// Raise the working tension by `ESCALATION_STEP`.
    pub escalate: bool,
}

impl ContentDelta {
    pub fn is_empty(&self) -> bool {
        self.new_storylets.is_empty()
            && self.set_flags.is_empty()
            && self.clear_flags.is_empty()
            && self.tension_delta == 0.0
            && !self.escalate
    }
}

/// Anything that proposes new content for a session: authoring tools,
/// heuristic agents, a scripted test double.
pub trait ContentSource {
    fn propose(
        &mut self,
        world: &WorldState,
        ctx: &NarrativeContext,
        catalog: &StoryletCatalog,
    ) -> ContentDelta;
}

impl<F> ContentSource for F
where
    F: FnMut(&WorldState, &NarrativeContext, &StoryletCatalog) -> ContentDelta,
{
    fn propose(
        &mut self,
        world: &WorldState,
        ctx: &NarrativeContext,
        catalog: &StoryletCatalog,
    ) -> ContentDelta {
        self(world, ctx, catalog)
    }
}

/// RNG seed for one round. The round is spread across all bits so that
/// neighbouring session seeds do not replay shifted copies of each other.
fn round_seed(seed: u64, round: u64) -> u64 {
    seed ^ round.wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

/// Rough measure of how much a session has going on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrativeAnalysis {
    pub character_count: usize,
    pub relationship_count: usize,
    pub tag_diversity: usize,
    pub deltas_applied: usize,
    /// 0.0 to 1.0.
    pub complexity_score: f64,
}

impl NarrativeAnalysis {
    /// Below this score a session is considered thin.
    pub const LOW_COMPLEXITY: f64 = 0.5;

    /// Authoring hints for growing the session's content.
    pub fn suggestions(&self) -> Vec<&'static str> {
        let mut suggestions = vec![
            "Add more character backstory elements",
            "Introduce subplot complications",
            "Develop environmental storytelling",
        ];
        if self.complexity_score < Self::LOW_COMPLEXITY {
            suggestions
                .push("Increase narrative complexity with additional characters or plot threads");
        }
        suggestions
    }
}

/// The top-level session. Built via `StoryletEngine::builder()`.
#[derive(Debug)]
pub struct StoryletEngine {
    catalog: StoryletCatalog,
    world: WorldState,
    context: NarrativeContext,
    seed: u64,
    round: u64,
    deltas_applied: usize,
}

/// Builder for constructing a `StoryletEngine`.
pub struct StoryletEngineBuilder {
    seed: u64,
    clock: Arc<dyn Clock>,
    catalog_config: CatalogConfig,
    recent_capacity: usize,
    storylet_limit: usize,
    seed_path: Option<PathBuf>,
    seed_config: Option<SeedConfig>,
    world: Option<WorldState>,
    context: Option<NarrativeContext>,
    storylets: Vec<Storylet>,
}

impl StoryletEngine {
    pub fn builder() -> StoryletEngineBuilder {
        StoryletEngineBuilder {
            seed: 0,
            clock: Arc::new(SystemClock),
            catalog_config: CatalogConfig::default(),
            recent_capacity: DEFAULT_RECENT_CAPACITY,
            storylet_limit: DEFAULT_STORYLET_LIMIT,
            seed_path: None,
            seed_config: None,
            world: None,
            context: None,
            storylets: Vec::new(),
        }
    }

    /// Run one round. `None` when nothing is eligible; the session is
    /// left untouched in that case.
    pub fn step(&mut self) -> Option<Beat> {
        let round = self.round + 1;
        // One RNG per round keeps each round reproducible on its own.
        let mut rng = StdRng::seed_from_u64(round_seed(self.seed, round));

        let (id, adjusted_weight, candidates) = {
            let available = self.catalog.evaluate_available(&self.world, &self.context);
            let Some(chosen) = self.catalog.select_scored(&available, &self.context, &mut rng)
            else {
                debug!(round, "no eligible storylets");
                return None;
            };
            (chosen.storylet.id.clone(), chosen.weight, available.len())
        };

        self.catalog.mark_used(&id);
        self.context.record(id.clone());
        self.world.advance_timeline();
        self.round = round;

        let storylet = self.catalog.get(&id)?;
        info!(round, id = %id, weight = adjusted_weight, candidates, "beat");
        Some(Beat {
            round,
            storylet_id: id.clone(),
            name: storylet.name.clone(),
            adjusted_weight,
            candidates,
            consequences: storylet.content.consequences.clone(),
        })
    }

    /// Run up to `rounds` rounds, stopping early at the first round with
    /// nothing eligible.
    pub fn run(&mut self, rounds: usize) -> Vec<Beat> {
        let mut beats = Vec::with_capacity(rounds);
        for _ in 0..rounds {
            match self.step() {
                Some(beat) => beats.push(beat),
                None => break,
            }
        }
        beats
    }

    /// Apply a content delta. Every new storylet is validated before
    /// anything changes, so a rejected delta leaves the session as it was.
    pub fn apply(&mut self, delta: ContentDelta) -> Result<(), EngineError> {
        if let Some(bad) = delta.new_storylets.iter().find(|s| s.id.trim().is_empty()) {
            return Err(CatalogError::MissingId {
                name: bad.name.clone(),
            }
            .into());
        }

        let added = delta.new_storylets.len();
        self.catalog.extend(delta.new_storylets)?;
        for flag in delta.set_flags {
            self.world.set_flag(flag);
        }
        for flag in &delta.clear_flags {
            self.world.clear_flag(flag);
        }
        self.world.adjust_tension(delta.tension_delta);
        if delta.escalate {
            self.context.nudge_tension(ESCALATION_STEP);
        }
        self.deltas_applied += 1;

        debug!(
            added,
            world_tension = self.world.tension,
            context_tension = self.context.tension,
            "content delta applied"
        );
        Ok(())
    }

    /// Ask `source` for a delta and apply it.
    pub fn absorb<S: ContentSource + ?Sized>(&mut self, source: &mut S) -> Result<(), EngineError> {
        let delta = source.propose(&self.world, &self.context, &self.catalog);
        if delta.is_empty() {
            return Ok(());
        }
        self.apply(delta)
    }

    pub fn analyze(&self) -> NarrativeAnalysis {
        let tags: FxHashSet<&str> = self
            .catalog
            .all()
            .flat_map(|s| s.tags.iter().map(String::as_str))
            .collect();

        let character_count = self.world.characters.len();
        let relationship_count = self.world.relationships.len();
        let complexity_score = (character_count as f64 * 0.1
            + relationship_count as f64 * 0.15
            + tags.len() as f64 * 0.05
            + self.deltas_applied as f64 * 0.01)
            .min(1.0);

        NarrativeAnalysis {
            character_count,
            relationship_count,
            tag_diversity: tags.len(),
            deltas_applied: self.deltas_applied,
            complexity_score,
        }
    }

    pub fn round(&self) -> u64 {
        self.round
    }

    pub fn catalog(&self) -> &StoryletCatalog {
        &self.catalog
    }

    pub fn catalog_mut(&mut self) -> &mut StoryletCatalog {
        &mut self.catalog
    }

    pub fn world(&self) -> &WorldState {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut WorldState {
        &mut self.world
    }

    pub fn context(&self) -> &NarrativeContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut NarrativeContext {
        &mut self.context
    }
}

impl StoryletEngineBuilder {
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn catalog_config(mut self, config: CatalogConfig) -> Self {
        self.catalog_config = config;
        self
    }

    pub fn recent_capacity(mut self, capacity: usize) -> Self {
        self.recent_capacity = capacity;
        self
    }

    /// Cap on storylets generated from the seed's entities.
    pub fn storylet_limit(mut self, limit: usize) -> Self {
        self.storylet_limit = limit;
        self
    }

    /// Load the seed from a `.ron` or `.json` file at build time.
    pub fn seed_file(mut self, path: impl AsRef<Path>) -> Self {
        self.seed_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Provide a seed directly (for testing without files).
    pub fn with_seed_config(mut self, seed: SeedConfig) -> Self {
        self.seed_config = Some(seed);
        self
    }

    /// Start from this world instead of one derived from the seed.
    pub fn with_world(mut self, world: WorldState) -> Self {
        self.world = Some(world);
        self
    }

    /// Start from this context instead of one derived from the seed.
    pub fn with_context(mut self, context: NarrativeContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Extra storylets, registered after any seed-derived ones.
    pub fn with_storylets(mut self, storylets: impl IntoIterator<Item = Storylet>) -> Self {
        self.storylets.extend(storylets);
        self
    }

    pub fn build(self) -> Result<StoryletEngine, EngineError> {
        let seed_config = match (self.seed_config, &self.seed_path) {
            (Some(config), _) => Some(config),
            (None, Some(path)) => Some(SeedConfig::load(path)?),
            (None, None) => None,
        };

        let mut catalog = StoryletCatalog::new()
            .with_config(self.catalog_config)
            .with_shared_clock(self.clock);

        let (world, context) = match &seed_config {
            Some(seed) => {
                catalog.extend(seeding::base_storylets(seed, self.storylet_limit))?;
                (
                    self.world.unwrap_or_else(|| seeding::world_from_seed(seed)),
                    self.context
                        .unwrap_or_else(|| seeding::context_from_seed(seed, self.recent_capacity)),
                )
            }
            None => (
                self.world.unwrap_or_default(),
                self.context
                    .unwrap_or_else(|| NarrativeContext::with_capacity(self.recent_capacity)),
            ),
        };
        catalog.extend(self.storylets)?;

        if let Some(seed) = &seed_config {
            info!(seed = %seed.name, storylets = catalog.len(), "session built");
        }

        Ok(StoryletEngine {
            catalog,
            world,
            context,
            seed: self.seed,
            round: 0,
            deltas_applied: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::ManualClock;
    use crate::schema::seed::{CharacterSeed, EnvironmentSeed};

    const START: u64 = 1_700_000_000_000;

    fn small_seed() -> SeedConfig {
        let mut seed = SeedConfig {
            name: "Keep".to_string(),
            ..SeedConfig::default()
        };
        seed.characters.insert(
            "ada".to_string(),
            CharacterSeed {
                name: "Ada".to_string(),
                description: Some("A knight".to_string()),
                relationships: Vec::new(),
            },
        );
        seed.environments.insert(
            "hall".to_string(),
            EnvironmentSeed {
                name: "Hall".to_string(),
                description: None,
            },
        );
        seed
    }

    fn build_test_engine(seed: u64) -> StoryletEngine {
        StoryletEngine::builder()
            .seed(seed)
            .clock(ManualClock::new(START))
            .with_seed_config(small_seed())
            .build()
            .unwrap()
    }

    #[test]
    fn builder_with_seed() {
        let engine = StoryletEngine::builder().seed(12345).build().unwrap();
        assert_eq!(engine.seed, 12345);
        assert!(engine.catalog().is_empty());
        assert_eq!(engine.context().recent_capacity(), DEFAULT_RECENT_CAPACITY);
    }

    #[test]
    fn build_from_seed_registers_base_storylets() {
        let engine = build_test_engine(1);
        // intro, develop, explore, plus three general storylets
        assert_eq!(engine.catalog().len(), 6);
        assert_eq!(engine.world().characters.len(), 1);
        assert_eq!(engine.context().current_scene, "opening");
    }

    #[test]
    fn explicit_world_overrides_seed() {
        let engine = StoryletEngine::builder()
            .with_seed_config(small_seed())
            .with_world(WorldState::new().with_tension(0.9))
            .build()
            .unwrap();
        assert_eq!(engine.world().tension, 0.9);
        assert!(engine.world().characters.is_empty());
    }

    #[test]
    fn step_marks_used_and_records_recency() {
        let mut engine = build_test_engine(7);
        let beat = engine.step().unwrap();
        assert_eq!(beat.round, 1);
        assert!(engine.context().is_recent(&beat.storylet_id));
        assert_eq!(engine.catalog().usage_history(&beat.storylet_id).len(), 1);
        assert_eq!(engine.world().timeline_position, 1);
        assert_eq!(engine.round(), 1);
    }

    #[test]
    fn run_stops_when_content_runs_dry() {
        let mut engine = build_test_engine(3);
        // Everything eligible carries a cooldown and the clock never moves,
        // so each storylet can fire at most once.
        let beats = engine.run(50);
        assert!(!beats.is_empty());
        assert!(beats.len() < 50);
        let ids: FxHashSet<&str> = beats.iter().map(|b| b.storylet_id.as_str()).collect();
        assert_eq!(ids.len(), beats.len());
        assert!(engine.step().is_none());
    }

    #[test]
    fn same_seed_same_story() {
        let a: Vec<String> = build_test_engine(99).run(4).into_iter().map(|b| b.storylet_id).collect();
        let b: Vec<String> = build_test_engine(99).run(4).into_iter().map(|b| b.storylet_id).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn apply_delta_updates_world_and_catalog() {
        let mut engine = build_test_engine(1);
        let before = engine.catalog().len();
        engine
            .apply(ContentDelta {
                new_storylets: vec![Storylet::new("siege", "Siege", "when tension is high")],
                set_flags: vec!["approaching_hall".to_string()],
                clear_flags: Vec::new(),
                tension_delta: 0.3,
                escalate: true,
            })
            .unwrap();
        assert_eq!(engine.catalog().len(), before + 1);
        assert!(engine.world().has_flag("approaching_hall"));
        assert!((engine.world().tension - 0.5).abs() < 1e-9);
        assert!((engine.context().tension - 0.3).abs() < 1e-9);
        assert_eq!(engine.analyze().deltas_applied, 1);
    }

    #[test]
    fn rejected_delta_changes_nothing() {
        let mut engine = build_test_engine(1);
        let before = engine.catalog().len();
        let result = engine.apply(ContentDelta {
            new_storylets: vec![
                Storylet::new("fine", "Fine", ""),
                Storylet::new("", "Broken", ""),
            ],
            set_flags: vec!["should_not_appear".to_string()],
            ..ContentDelta::default()
        });
        assert!(matches!(
            result,
            Err(EngineError::Catalog(CatalogError::MissingId { .. }))
        ));
        assert_eq!(engine.catalog().len(), before);
        assert!(!engine.world().has_flag("should_not_appear"));
    }

    #[test]
    fn absorb_from_closure_source() {
        let mut engine = build_test_engine(1);
        let mut calls = 0;
        let mut source = |world: &WorldState, _: &NarrativeContext, _: &StoryletCatalog| {
            calls += 1;
            ContentDelta {
                set_flags: vec![format!("seen_{}", world.characters.len())],
                ..ContentDelta::default()
            }
        };
        engine.absorb(&mut source).unwrap();
        assert!(engine.world().has_flag("seen_1"));
        assert_eq!(calls, 1);
    }

    #[test]
    fn empty_delta_is_not_counted() {
        let mut engine = build_test_engine(1);
        let mut source =
            |_: &WorldState, _: &NarrativeContext, _: &StoryletCatalog| ContentDelta::default();
        engine.absorb(&mut source).unwrap();
        assert_eq!(engine.analyze().deltas_applied, 0);
    }

    #[test]
    fn analysis_scores_complexity() {
        let engine = build_test_engine(1);
        let analysis = engine.analyze();
        assert_eq!(analysis.character_count, 1);
        assert_eq!(analysis.relationship_count, 0);
        assert!(analysis.tag_diversity > 0);
        let expected = (0.1 + analysis.tag_diversity as f64 * 0.05).min(1.0);
        assert!((analysis.complexity_score - expected).abs() < 1e-9);
    }

    #[test]
    fn neighbouring_seeds_do_not_share_rounds() {
        for seed in [0u64, 1, 42, u64::MAX - 1] {
            for round in 1..50u64 {
                assert_ne!(round_seed(seed, round + 1), round_seed(seed + 1, round));
                assert_ne!(round_seed(seed, round), round_seed(seed, round + 1));
            }
        }
    }

    #[test]
    fn thin_sessions_get_a_complexity_hint() {
        let mut analysis = build_test_engine(1).analyze();
        analysis.complexity_score = 0.2;
        let thin = analysis.suggestions();
        assert_eq!(thin.len(), 4);
        assert!(thin[3].starts_with("Increase narrative complexity"));

        analysis.complexity_score = NarrativeAnalysis::LOW_COMPLEXITY;
        assert_eq!(analysis.suggestions().len(), 3);
    }

    #[test]
    fn beat_carries_the_selected_weight() {
        let mut engine = build_test_engine(8);
        let available = engine
            .catalog()
            .evaluate_available(engine.world(), engine.context())
            .len();
        let beat = engine.step().unwrap();
        assert_eq!(beat.candidates, available);
        let storylet = engine.catalog().get(&beat.storylet_id).unwrap();
        assert!(beat.adjusted_weight > 0.0);
        assert!(beat.adjusted_weight <= storylet.weight * 1.5 * 2.0 * 1.4);
    }
}
