/// Storylet catalog: registered storylets, their parsed triggers, and
/// usage history.
use rand::Rng;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, trace};

use crate::core::clock::{Clock, Millis, SystemClock};
use crate::core::context::NarrativeContext;
use crate::core::eligibility;
use crate::core::trigger::Trigger;
use crate::core::weighting::{self, Scored, WeightingRules};
use crate::schema::storylet::Storylet;
use crate::schema::world::WorldState;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("storylet '{name}' has no id")]
    MissingId { name: String },
}

/// Catalog tuning.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Keep at most this many usage timestamps per storylet, dropping the
    /// oldest. `None` keeps everything for the life of the catalog.
    pub history_limit: Option<usize>,
    #[serde(default)]
    pub weighting: WeightingRules,
}

#[derive(Debug, Clone)]
struct CatalogEntry {
    storylet: Storylet,
    trigger: Trigger,
    history: Vec<Millis>,
}

/// The set of storylets available to one session.
///
/// Iteration, evaluation and tie-breaking all follow insertion order.
#[derive(Debug, Clone)]
pub struct StoryletCatalog {
    entries: FxHashMap<String, CatalogEntry>,
    order: Vec<String>,
    config: CatalogConfig,
    clock: Arc<dyn Clock>,
}

impl Default for StoryletCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl StoryletCatalog {
    pub fn new() -> Self {
        Self {
            entries: FxHashMap::default(),
            order: Vec::new(),
            config: CatalogConfig::default(),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn with_shared_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_config(mut self, config: CatalogConfig) -> Self {
        self.config = config;
        self
    }

    pub fn now(&self) -> Millis {
        self.clock.now()
    }

    /// Register a storylet, replacing any storylet with the same id.
    ///
    /// A replaced storylet keeps its place in the catalog and its usage
    /// history; its `last_used` carries over unless the new record brings
    /// its own. Tags are stored lowercased.
    pub fn add(&mut self, mut storylet: Storylet) -> Result<(), CatalogError> {
        if storylet.id.trim().is_empty() {
            return Err(CatalogError::MissingId {
                name: storylet.name.clone(),
            });
        }
        for tag in &mut storylet.tags {
            *tag = tag.to_lowercase();
        }

        let trigger = Trigger::parse(&storylet.trigger);
        match self.entries.get_mut(&storylet.id) {
            Some(entry) => {
                if storylet.last_used.is_none() {
                    storylet.last_used = entry.storylet.last_used;
                }
                trace!(id = %storylet.id, "storylet replaced");
                entry.storylet = storylet;
                entry.trigger = trigger;
            }
            None => {
                trace!(id = %storylet.id, ?trigger, "storylet added");
                self.order.push(storylet.id.clone());
                self.entries.insert(
                    storylet.id.clone(),
                    CatalogEntry {
                        storylet,
                        trigger,
                        history: Vec::new(),
                    },
                );
            }
        }
        Ok(())
    }

    /// Add every storylet in order, stopping at the first one rejected.
    pub fn extend<I>(&mut self, storylets: I) -> Result<(), CatalogError>
    where
        I: IntoIterator<Item = Storylet>,
    {
        for storylet in storylets {
            self.add(storylet)?;
        }
        Ok(())
    }

    /// Remove a storylet and its history. Unknown ids are ignored.
    pub fn remove(&mut self, id: &str) -> Option<Storylet> {
        let entry = self.entries.remove(id)?;
        self.order.retain(|o| o != id);
        Some(entry.storylet)
    }

    pub fn get(&self, id: &str) -> Option<&Storylet> {
        self.entries.get(id).map(|e| &e.storylet)
    }

    pub fn trigger(&self, id: &str) -> Option<&Trigger> {
        self.entries.get(id).map(|e| &e.trigger)
    }

    pub fn all(&self) -> impl Iterator<Item = &Storylet> {
        self.entries_in_order().map(|e| &e.storylet)
    }

    pub fn by_tag<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Storylet> + 'a {
        self.all().filter(move |s| s.has_tag(tag))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn usage_history(&self, id: &str) -> &[Millis] {
        self.entries
            .get(id)
            .map(|e| e.history.as_slice())
            .unwrap_or(&[])
    }

    /// Stamp a storylet as used now. Returns false for unknown ids.
    pub fn mark_used(&mut self, id: &str) -> bool {
        let now = self.clock.now();
        let limit = self.config.history_limit;
        let Some(entry) = self.entries.get_mut(id) else {
            return false;
        };

        entry.storylet.last_used = Some(now);
        entry.history.push(now);
        if let Some(limit) = limit {
            let excess = entry.history.len().saturating_sub(limit);
            entry.history.drain(..excess);
        }
        true
    }

    /// Storylets that may fire right now, in catalog order.
    pub fn evaluate_available(&self, world: &WorldState, ctx: &NarrativeContext) -> Vec<&Storylet> {
        let now = self.clock.now();
        self.entries_in_order()
            .filter(|entry| {
                match eligibility::check(&entry.storylet, &entry.trigger, world, ctx, now) {
                    Ok(()) => true,
                    Err(reason) => {
                        trace!(id = %entry.storylet.id, %reason, "storylet held back");
                        false
                    }
                }
            })
            .map(|entry| &entry.storylet)
            .collect()
    }

    /// Adjusted weight of a storylet given its usage so far.
    pub fn adjusted_weight(&self, storylet: &Storylet, ctx: &NarrativeContext) -> f64 {
        self.config.weighting.adjusted_weight(
            storylet,
            self.usage_history(&storylet.id),
            ctx,
            self.clock.now(),
        )
    }

    /// Score and rank candidates, heaviest first.
    pub fn score<'a>(&self, available: &[&'a Storylet], ctx: &NarrativeContext) -> Vec<Scored<'a>> {
        weighting::rank(
            available
                .iter()
                .map(|&storylet| Scored {
                    storylet,
                    weight: self.adjusted_weight(storylet, ctx),
                })
                .collect(),
        )
    }

    /// Pick one of `available` at random, biased by adjusted weight.
    /// `None` only when `available` is empty.
    pub fn select_next<'a, R: Rng + ?Sized>(
        &self,
        available: &[&'a Storylet],
        ctx: &NarrativeContext,
        rng: &mut R,
    ) -> Option<&'a Storylet> {
        self.select_scored(available, ctx, rng).map(|s| s.storylet)
    }

    /// Like `select_next`, keeping the adjusted weight the pick was drawn
    /// with.
    pub fn select_scored<'a, R: Rng + ?Sized>(
        &self,
        available: &[&'a Storylet],
        ctx: &NarrativeContext,
        rng: &mut R,
    ) -> Option<Scored<'a>> {
        let ranked = self.score(available, ctx);
        let chosen = *weighting::pick(&ranked, rng)?;
        debug!(
            id = %chosen.storylet.id,
            weight = chosen.weight,
            candidates = ranked.len(),
            "storylet selected"
        );
        Some(chosen)
    }

    fn entries_in_order(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.order.iter().filter_map(|id| self.entries.get(id))
    }
}
