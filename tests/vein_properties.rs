//! Property tests for vein shapes and weighted catalog draws.

use colony_mapgen::catalog::pick_weighted_index;
use colony_mapgen::vein::{VeinShapeGenerator, VeinSpec};
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

proptest! {
    #[test]
    fn vein_strip_respects_bounds(
        length in 1usize..16,
        thickness in 0.5f32..5.0,
        variance in 0.0f32..2.0,
        seed in any::<u64>(),
    ) {
        let spec = VeinSpec { length, thickness, thickness_variance: variance };
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let strip = VeinShapeGenerator::default().build_strip(&spec, &mut rng);

        prop_assert_eq!(strip.width, length);
        for x in 0..strip.width {
            let on = (0..strip.height).filter(|&y| *strip.get(x, y)).count();
            prop_assert!(on >= 1);
            prop_assert!(on <= spec.max_thickness());
        }
    }

    #[test]
    fn rotated_vein_keeps_its_cells(
        length in 1usize..12,
        thickness in 1.0f32..4.0,
        seed in any::<u64>(),
    ) {
        let spec = VeinSpec { length, thickness, thickness_variance: 0.5 };
        let generator = VeinShapeGenerator::default();
        let strip = generator.build_strip(&spec, &mut ChaCha8Rng::seed_from_u64(seed));
        let vein = generator.generate(&spec, &mut ChaCha8Rng::seed_from_u64(seed));
        prop_assert_eq!(strip.count_set(), vein.count_set());
        prop_assert!(vein.width == length || vein.height == length);
    }

    #[test]
    fn weighted_pick_only_returns_positive_weights(
        weights in prop::collection::vec(-1.0f32..5.0, 0..8),
        seed in any::<u64>(),
    ) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let picked = pick_weighted_index(&weights, &mut rng);
        let any_positive = weights.iter().any(|&w| w > 0.0);
        prop_assert_eq!(picked.is_some(), any_positive);
        if let Some(i) = picked {
            prop_assert!(weights[i] > 0.0);
        }
    }
}
