/// Trigger matching: a small, fixed set of pattern checks over the
/// storylet's trigger text.
///
/// Triggers are deliberately coarse. The text is lowercased and tested
/// against each category in priority order; the first category whose
/// pattern actually matches decides the trigger, later clauses are ignored.
/// Text that matches nothing is always eligible.
use regex::Regex;
use std::sync::LazyLock;

use crate::core::context::NarrativeContext;
use crate::schema::world::WorldState;

static PRESENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"when (\w+) (?:is )?present").expect("valid regex"));

static LOCATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:at|in) (\w+)").expect("valid regex"));

/// Tension bands as named in trigger text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TensionBand {
    /// Above 0.7.
    High,
    /// Below 0.3.
    Low,
    /// 0.3 to 0.7 inclusive.
    Medium,
}

impl TensionBand {
    /// First band named in `text`, checked high, low, medium.
    fn find(text: &str) -> Option<TensionBand> {
        if text.contains("high") {
            Some(Self::High)
        } else if text.contains("low") {
            Some(Self::Low)
        } else if text.contains("medium") {
            Some(Self::Medium)
        } else {
            None
        }
    }

    pub fn contains(self, tension: f64) -> bool {
        match self {
            Self::High => tension > 0.7,
            Self::Low => tension < 0.3,
            Self::Medium => (0.3..=0.7).contains(&tension),
        }
    }
}

/// A parsed trigger.
#[derive(Debug, Clone, PartialEq)]
pub enum Trigger {
    /// "when ada is present": some active character's name contains the word.
    Presence(String),
    /// "at the harbor", "in tavern": the current scene contains the word.
    Location(String),
    /// "when tension is high": the world's tension lies in the band.
    Tension(TensionBand),
    /// "conflict" / "enemy": some relationship is hostile.
    Conflict,
    Always,
}

impl Trigger {
    pub fn parse(text: &str) -> Trigger {
        let lower = text.to_lowercase();

        if lower.contains("when") && lower.contains("present") {
            if let Some(caps) = PRESENCE.captures(&lower) {
                return Trigger::Presence(caps[1].to_string());
            }
        }

        if lower.contains("at") || lower.contains("in") {
            if let Some(caps) = LOCATION.captures(&lower) {
                return Trigger::Location(caps[1].to_string());
            }
        }

        if lower.contains("tension") {
            if let Some(band) = TensionBand::find(&lower) {
                return Trigger::Tension(band);
            }
        }

        if lower.contains("conflict") || lower.contains("enemy") {
            return Trigger::Conflict;
        }

        Trigger::Always
    }

    pub fn matches(&self, world: &WorldState, ctx: &NarrativeContext) -> bool {
        match self {
            Trigger::Presence(name) => ctx
                .active_characters
                .iter()
                .any(|c| c.to_lowercase().contains(name.as_str())),
            Trigger::Location(place) => ctx.current_scene.to_lowercase().contains(place.as_str()),
            Trigger::Tension(band) => band.contains(world.tension),
            Trigger::Conflict => world.has_conflict(),
            Trigger::Always => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::world::{RelationshipKind, RelationshipState};

    #[test]
    fn parse_presence() {
        assert_eq!(
            Trigger::parse("When Ada is present and story needs development"),
            Trigger::Presence("ada".to_string())
        );
        assert_eq!(
            Trigger::parse("when bram present"),
            Trigger::Presence("bram".to_string())
        );
    }

    #[test]
    fn parse_location() {
        assert_eq!(
            Trigger::parse("when characters arrive at harbor"),
            Trigger::Location("harbor".to_string())
        );
        assert_eq!(
            Trigger::parse("a quiet moment in chapel"),
            Trigger::Location("chapel".to_string())
        );
    }

    #[test]
    fn parse_tension_bands() {
        assert_eq!(
            Trigger::parse("when tension is high"),
            Trigger::Tension(TensionBand::High)
        );
        assert_eq!(
            Trigger::parse("TENSION LOW"),
            Trigger::Tension(TensionBand::Low)
        );
        assert_eq!(
            Trigger::parse("when tension is medium and story needs surprise"),
            Trigger::Tension(TensionBand::Medium)
        );
    }

    #[test]
    fn parse_conflict_and_default() {
        assert_eq!(Trigger::parse("old enemy returns"), Trigger::Conflict);
        assert_eq!(Trigger::parse("when story begins"), Trigger::Always);
        assert_eq!(Trigger::parse(""), Trigger::Always);
    }

    #[test]
    fn keyword_without_pattern_falls_through() {
        // "present" without the "when X present" shape, then "enemy"
        assert_eq!(Trigger::parse("when the enemy is present"), Trigger::Conflict);
        // "tension" with no band named
        assert_eq!(Trigger::parse("when tension rises"), Trigger::Always);
    }

    #[test]
    fn first_category_wins() {
        // mentions tension too, but presence comes first
        assert_eq!(
            Trigger::parse("when ada is present and tension is high"),
            Trigger::Presence("ada".to_string())
        );
    }

    #[test]
    fn presence_matches_active_characters() {
        let world = WorldState::default();
        let ctx = NarrativeContext::default().characters(&["Ada Lovelace", "Bram"]);
        assert!(Trigger::Presence("ada".into()).matches(&world, &ctx));
        assert!(!Trigger::Presence("cyril".into()).matches(&world, &ctx));
    }

    #[test]
    fn location_matches_scene() {
        let world = WorldState::default();
        let ctx = NarrativeContext::default().scene("The Harbor at Dusk");
        assert!(Trigger::Location("harbor".into()).matches(&world, &ctx));
        assert!(!Trigger::Location("chapel".into()).matches(&world, &ctx));
    }

    #[test]
    fn tension_band_edges() {
        assert!(!TensionBand::High.contains(0.7));
        assert!(TensionBand::High.contains(0.71));
        assert!(TensionBand::Low.contains(0.29));
        assert!(!TensionBand::Low.contains(0.3));
        assert!(TensionBand::Medium.contains(0.3));
        assert!(TensionBand::Medium.contains(0.7));
        assert!(!TensionBand::Medium.contains(0.71));
    }

    #[test]
    fn conflict_needs_hostile_relationship() {
        let ctx = NarrativeContext::default();
        let mut world = WorldState::default();
        assert!(!Trigger::Conflict.matches(&world, &ctx));
        world.add_relationship(RelationshipState {
            id: "ada-bram".to_string(),
            character_a: "ada".to_string(),
            character_b: "bram".to_string(),
            kind: RelationshipKind::Enemy,
            strength: 0.0,
            history: Vec::new(),
        });
        assert!(Trigger::Conflict.matches(&world, &ctx));
    }
}
