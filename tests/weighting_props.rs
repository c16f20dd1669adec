/// Property tests for the weighting rules.
use proptest::prelude::*;
use storylet_engine::core::weighting::WeightingRules;
use storylet_engine::{NarrativeContext, Pacing, Storylet};

const NOW: u64 = 1_700_000_000_000;

fn pacing() -> impl Strategy<Value = Pacing> {
    prop_oneof![Just(Pacing::Slow), Just(Pacing::Medium), Just(Pacing::Fast)]
}

proptest! {
    #[test]
    fn more_recent_uses_never_weigh_more(base in 0.0f64..1_000.0, uses in 0usize..20) {
        let rules = WeightingRules::default();
        let s = Storylet::new("a", "A", "").with_weight(base);
        let ctx = NarrativeContext::default();
        let fewer = rules.adjusted_weight(&s, &vec![NOW - 1; uses], &ctx, NOW);
        let more = rules.adjusted_weight(&s, &vec![NOW - 1; uses + 1], &ctx, NOW);
        prop_assert!(more <= fewer);
    }

    #[test]
    fn adjusted_weight_is_finite_and_non_negative(
        base in prop::num::f64::ANY,
        tension in -1.0f64..2.0,
        pacing in pacing(),
        age in 0u64..10_000_000,
    ) {
        let s = Storylet::new("a", "A", "")
            .with_weight(base)
            .with_tags(&["action", "climax", "buildup", "contemplative"]);
        let ctx = NarrativeContext::default().pacing(pacing).tension(tension).goals(&["clim"]);
        let w = WeightingRules::default().adjusted_weight(&s, &[NOW.saturating_sub(age)], &ctx, NOW);
        prop_assert!(w.is_finite());
        prop_assert!(w >= 0.0);
    }

    #[test]
    fn recency_multiplier_stays_in_bounds(ages in prop::collection::vec(0u64..7_200_000, 0..30)) {
        let rules = WeightingRules::default();
        let history: Vec<u64> = ages.iter().map(|a| NOW - a).collect();
        let m = rules.recency_multiplier(&history, NOW);
        prop_assert!(m >= rules.recency_floor);
        prop_assert!(m <= 1.0);
    }
}
