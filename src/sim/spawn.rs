//! Weighted spawn-tier selection
//!
//! Two weight vectors keyed to the score band. Only tiers `0..N-1` are
//! eligible; the terminal tier is reachable by merging alone.

use rand::Rng;

use crate::tuning::Tuning;

#[derive(Debug, Clone)]
pub struct SpawnSelector {
    early: Vec<f64>,
    late: Vec<f64>,
    early_mass: f64,
    late_mass: f64,
    late_game_score: u64,
}

impl SpawnSelector {
    /// Build from validated tuning. Any terminal-tier weight is dropped.
    pub fn new(tuning: &Tuning) -> Self {
        let eligible = tuning.tiers.len().saturating_sub(1);
        Self::from_weights(
            &tuning.early_weights,
            &tuning.late_weights,
            tuning.late_game_score,
            eligible,
        )
    }

    pub fn from_weights(early: &[f64], late: &[f64], late_game_score: u64, eligible: usize) -> Self {
        let fit = |weights: &[f64]| {
            let mut w: Vec<f64> = weights.iter().copied().take(eligible).collect();
            w.resize(eligible, 0.0);
            w
        };
        let (early, late) = (fit(early), fit(late));
        let (early_mass, late_mass) = (total_mass(&early), total_mass(&late));
        for (table, mass) in [("early", early_mass), ("late", late_mass)] {
            if !(mass > 0.0) {
                log::warn!("{} spawn weights have no mass; those spawns fall back to tier 0", table);
            }
        }
        Self {
            early,
            late,
            early_mass,
            late_mass,
            late_game_score,
        }
    }

    /// Weight vector in effect for a score
    pub fn weights_for(&self, score: u64) -> &[f64] {
        if score > self.late_game_score {
            &self.late
        } else {
            &self.early
        }
    }

    fn mass_for(&self, score: u64) -> f64 {
        if score > self.late_game_score {
            self.late_mass
        } else {
            self.early_mass
        }
    }

    /// False when the weights in effect for `score` can't be drawn from
    pub fn has_mass(&self, score: u64) -> bool {
        self.mass_for(score) > 0.0
    }

    /// Draw a spawn tier for the current score
    pub fn pick_tier<R: Rng>(&self, score: u64, rng: &mut R) -> usize {
        let total = self.mass_for(score);
        if !self.has_mass(score) {
            return 0;
        }
        let draw = rng.random_range(0.0..total);
        self.pick_with_draw(score, draw)
    }

    /// Walk the cumulative weights and return the first eligible tier whose
    /// running total reaches `draw`. `draw` is expected in `[0, total)`.
    pub fn pick_with_draw(&self, score: u64, draw: f64) -> usize {
        if !self.has_mass(score) {
            return 0;
        }
        let weights = self.weights_for(score);

        let mut acc = 0.0;
        let mut last_positive = 0;
        for (tier, &weight) in weights.iter().enumerate() {
            acc += weight;
            if weight > 0.0 {
                last_positive = tier;
                if acc >= draw {
                    return tier;
                }
            }
        }
        // Only reachable when rounding leaves draw a hair above the final sum
        last_positive
    }
}

fn total_mass(weights: &[f64]) -> f64 {
    let mut total = 0.0;
    for &weight in weights {
        total += weight;
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn selector() -> SpawnSelector {
        SpawnSelector::new(&Tuning::default())
    }

    #[test]
    fn test_max_draw_selects_last_weighted_tier() {
        let sel = selector();
        let total = total_mass(sel.weights_for(0));
        let draw = f64::from_bits(total.to_bits() - 1);
        assert!(draw < total);
        assert_eq!(sel.pick_with_draw(0, draw), 4);
    }

    #[test]
    fn test_zero_draw_selects_first_tier() {
        assert_eq!(selector().pick_with_draw(0, 0.0), 0);
    }

    #[test]
    fn test_exact_boundary_goes_to_lower_tier() {
        // Cumulative after tier 0 is exactly 6
        assert_eq!(selector().pick_with_draw(0, 6.0), 0);
        assert_eq!(selector().pick_with_draw(0, 6.0001), 1);
    }

    #[test]
    fn test_leading_zero_weight_never_selected() {
        let sel = SpawnSelector::from_weights(&[0.0, 1.0, 1.0], &[0.0, 1.0, 1.0], 800, 3);
        assert_eq!(sel.pick_with_draw(0, 0.0), 1);
    }

    #[test]
    fn test_mass_checked_per_band() {
        let sel = SpawnSelector::from_weights(&[0.0, 0.0], &[1.0, 2.0], 800, 2);
        assert!(!sel.has_mass(800));
        assert!(sel.has_mass(801));
        let mut rng = Pcg32::seed_from_u64(5);
        for _ in 0..50 {
            assert_eq!(sel.pick_tier(0, &mut rng), 0);
            assert!(sel.pick_tier(801, &mut rng) < 2);
        }
    }

    #[test]
    fn test_score_band_switch() {
        let sel = selector();
        assert_eq!(sel.weights_for(800)[0], 6.0);
        assert_eq!(sel.weights_for(801)[0], 2.0);
    }

    #[test]
    fn test_terminal_weight_ignored() {
        let sel = SpawnSelector::from_weights(&[1.0, 0.0, 50.0], &[1.0, 0.0, 50.0], 800, 2);
        let mut rng = Pcg32::seed_from_u64(7);
        for _ in 0..200 {
            assert_eq!(sel.pick_tier(0, &mut rng), 0);
        }
    }

    #[test]
    fn test_degenerate_table_falls_back_to_zero() {
        let sel = SpawnSelector::from_weights(&[0.0; 7], &[0.0; 7], 800, 7);
        assert!(!sel.has_mass(0));
        assert!(!sel.has_mass(900));
        let mut rng = Pcg32::seed_from_u64(1);
        assert_eq!(sel.pick_tier(0, &mut rng), 0);
        assert_eq!(sel.pick_with_draw(900, 3.0), 0);
    }

    #[test]
    fn test_late_game_can_reach_tier_six() {
        let sel = selector();
        let total = total_mass(sel.weights_for(1000));
        let draw = f64::from_bits(total.to_bits() - 1);
        assert_eq!(sel.pick_with_draw(1000, draw), 6);
    }

    proptest! {
        #[test]
        fn prop_never_spawns_terminal(seed in any::<u64>(), score in 0u64..5000) {
            let sel = selector();
            let mut rng = Pcg32::seed_from_u64(seed);
            for _ in 0..32 {
                let tier = sel.pick_tier(score, &mut rng);
                prop_assert!(tier < 7);
                prop_assert!(sel.weights_for(score)[tier] > 0.0);
            }
        }

        #[test]
        fn prop_any_draw_in_range_is_eligible(frac in 0.0f64..1.0, score in 0u64..2000) {
            let sel = selector();
            let total = total_mass(sel.weights_for(score));
            let tier = sel.pick_with_draw(score, frac * total);
            prop_assert!(tier < 7);
        }
    }
}
