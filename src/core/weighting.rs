/// Weighting and selection: turns eligible storylets into one pick.
use rand::distributions::WeightedIndex;
use rand::prelude::Distribution;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::clock::Millis;
use crate::core::context::{NarrativeContext, Pacing};
use crate::schema::storylet::Storylet;

/// Multipliers applied on top of a storylet's base weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightingRules {
    /// Fast pacing favours "action", slow pacing favours "contemplative".
    pub pacing_boost: f64,
    /// Context tension above this favours "climax".
    pub high_tension: f64,
    pub climax_boost: f64,
    /// Context tension below this favours "buildup".
    pub low_tension: f64,
    pub buildup_boost: f64,
    /// Any narrative goal found inside any tag.
    pub goal_boost: f64,
    /// Uses younger than this count against a storylet.
    pub recency_window_ms: u64,
    /// Penalty per recent use.
    pub recency_step: f64,
    /// The penalty never pushes the multiplier below this.
    pub recency_floor: f64,
}

impl Default for WeightingRules {
    fn default() -> Self {
        Self {
            pacing_boost: 1.5,
            high_tension: 0.7,
            climax_boost: 2.0,
            low_tension: 0.3,
            buildup_boost: 1.3,
            goal_boost: 1.4,
            recency_window_ms: 3_600_000,
            recency_step: 0.2,
            recency_floor: 0.1,
        }
    }
}

impl WeightingRules {
    /// Adjusted weight of `storylet` given its usage `history`.
    ///
    /// Always finite and non-negative.
    pub fn adjusted_weight(
        &self,
        storylet: &Storylet,
        history: &[Millis],
        ctx: &NarrativeContext,
        now: Millis,
    ) -> f64 {
        let mut weight = storylet.weight;

        match ctx.pacing {
            Pacing::Fast if storylet.has_tag("action") => weight *= self.pacing_boost,
            Pacing::Slow if storylet.has_tag("contemplative") => weight *= self.pacing_boost,
            _ => {}
        }

        if ctx.tension > self.high_tension && storylet.has_tag("climax") {
            weight *= self.climax_boost;
        } else if ctx.tension < self.low_tension && storylet.has_tag("buildup") {
            weight *= self.buildup_boost;
        }

        if aligns_with_goals(storylet, &ctx.narrative_goals) {
            weight *= self.goal_boost;
        }

        weight *= self.recency_multiplier(history, now);

        if weight.is_finite() && weight > 0.0 {
            weight
        } else {
            0.0
        }
    }

    /// `max(floor, 1 - step * uses_in_window)`.
    pub fn recency_multiplier(&self, history: &[Millis], now: Millis) -> f64 {
        let recent = history
            .iter()
            .filter(|&&t| now.saturating_sub(t) < self.recency_window_ms)
            .count();
        (1.0 - recent as f64 * self.recency_step).max(self.recency_floor)
    }
}

fn aligns_with_goals(storylet: &Storylet, goals: &[String]) -> bool {
    goals
        .iter()
        .map(|g| g.to_lowercase())
        .any(|goal| storylet.tags.iter().any(|tag| tag.contains(goal.as_str())))
}

/// A candidate paired with its adjusted weight.
#[derive(Debug, Clone, Copy)]
pub struct Scored<'a> {
    pub storylet: &'a Storylet,
    pub weight: f64,
}

/// Sort heaviest first. The sort is stable, so ties keep the order the
/// candidates were given in.
pub fn rank(mut scored: Vec<Scored<'_>>) -> Vec<Scored<'_>> {
    scored.sort_by(|a, b| b.weight.total_cmp(&a.weight));
    scored
}

/// Weighted-random pick over `ranked` with a single draw against the
/// cumulative weights.
///
/// Zero-weight candidates can only come back through the fallback: when
/// nothing carries weight the first (heaviest) candidate is returned, so a
/// non-empty slice always yields a pick.
pub fn pick<'r, 'a, R: Rng + ?Sized>(ranked: &'r [Scored<'a>], rng: &mut R) -> Option<&'r Scored<'a>> {
    let first = ranked.first()?;

    let total: f64 = ranked.iter().map(|s| s.weight).sum();
    if !(total.is_finite() && total > 0.0) {
        return Some(first);
    }

    match WeightedIndex::new(ranked.iter().map(|s| s.weight)) {
        Ok(dist) => ranked.get(dist.sample(rng)).or(Some(first)),
        Err(_) => Some(first),
    }
}
