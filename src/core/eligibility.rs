/// Eligibility: the ordered gate a storylet passes before it can be weighted.
use std::fmt;

use crate::core::clock::Millis;
use crate::core::context::NarrativeContext;
use crate::core::trigger::Trigger;
use crate::schema::storylet::Storylet;
use crate::schema::world::WorldState;

/// Why a storylet was held back this round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ineligible {
    /// Still cooling down; milliseconds left.
    Cooldown { remaining_ms: u64 },
    Recent,
    Trigger,
    MissingPrerequisite(String),
    Excluded(String),
}

impl fmt::Display for Ineligible {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cooldown { remaining_ms } => write!(f, "cooling down ({remaining_ms}ms left)"),
            Self::Recent => write!(f, "told recently"),
            Self::Trigger => write!(f, "trigger does not match"),
            Self::MissingPrerequisite(flag) => write!(f, "missing prerequisite '{flag}'"),
            Self::Excluded(flag) => write!(f, "excluded by '{flag}'"),
        }
    }
}

/// Run the checks in order, stopping at the first failure:
/// cooldown, recency, trigger, prerequisites, exclusions.
pub fn check(
    storylet: &Storylet,
    trigger: &Trigger,
    world: &WorldState,
    ctx: &NarrativeContext,
    now: Millis,
) -> Result<(), Ineligible> {
    if let Some(remaining_ms) = cooldown_remaining(storylet, now) {
        return Err(Ineligible::Cooldown { remaining_ms });
    }

    if ctx.is_recent(&storylet.id) {
        return Err(Ineligible::Recent);
    }

    if !trigger.matches(world, ctx) {
        return Err(Ineligible::Trigger);
    }

    if let Some(missing) = storylet
        .prerequisites
        .iter()
        .find(|flag| !world.has_flag(flag))
    {
        return Err(Ineligible::MissingPrerequisite(missing.clone()));
    }

    if let Some(excluded) = storylet.excludes.iter().find(|flag| world.has_flag(flag)) {
        return Err(Ineligible::Excluded(excluded.clone()));
    }

    Ok(())
}

/// Milliseconds of cooldown left at `now`, if any.
///
/// A use stamped in the future (clock skew) counts as zero elapsed time.
/// Non-positive or non-finite cooldowns never block.
fn cooldown_remaining(storylet: &Storylet, now: Millis) -> Option<u64> {
    let cooldown = storylet.cooldown?;
    let last_used = storylet.last_used?;
    if !(cooldown.is_finite() && cooldown > 0.0) {
        return None;
    }

    let window_ms = cooldown * 1000.0;
    let elapsed = now.saturating_sub(last_used) as f64;
    if elapsed < window_ms {
        Some((window_ms - elapsed).ceil() as u64)
    } else {
        None
    }
}
