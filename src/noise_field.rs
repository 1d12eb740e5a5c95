//! Multi-octave simplex noise sampling.

use noise::{Fbm, MultiFractal, NoiseFn, Simplex};
use rand::Rng;

/// Coherent noise over tile coordinates.
///
/// Wraps an fBm stack of simplex octaves. Seeds are drawn from the run's
/// generator so that the field is reproducible for a given run.
pub struct SimplexNoiseField {
    fbm: Fbm<Simplex>,
}

impl SimplexNoiseField {
    /// Feature size (in tiles) for the broad fields used by rock banding and
    /// height perturbation.
    pub const LARGE_FEATURE_SCALE: f64 = 48.0;

    pub fn new(seed: u32, feature_scale: f64, octaves: usize, persistence: f64) -> Self {
        let fbm = Fbm::<Simplex>::new(seed)
            .set_octaves(octaves)
            .set_frequency(1.0 / feature_scale.max(1.0))
            .set_persistence(persistence)
            .set_lacunarity(2.0);
        Self { fbm }
    }

    /// Large, smooth features with a seed drawn from `rng`.
    pub fn large_features<R: Rng>(rng: &mut R) -> Self {
        Self::new(rng.gen(), Self::LARGE_FEATURE_SCALE, 4, 0.5)
    }

    /// Raw sample, roughly in `[-1, 1]`.
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        self.fbm.get([x, y])
    }

    /// Sample remapped and clamped into `[0, 1]`.
    pub fn sample_unit(&self, x: f64, y: f64) -> f32 {
        ((self.sample(x, y) + 1.0) * 0.5).clamp(0.0, 1.0) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_same_seed_same_field() {
        let a = SimplexNoiseField::large_features(&mut ChaCha8Rng::seed_from_u64(9));
        let b = SimplexNoiseField::large_features(&mut ChaCha8Rng::seed_from_u64(9));
        for i in 0..20 {
            let (x, y) = (i as f64 * 3.7, i as f64 * 1.3);
            assert_eq!(a.sample(x, y), b.sample(x, y));
        }
    }

    #[test]
    fn test_unit_samples_are_clamped() {
        let field = SimplexNoiseField::new(3, 4.0, 6, 0.8);
        for y in 0..32 {
            for x in 0..32 {
                let v = field.sample_unit(x as f64, y as f64);
                assert!((0.0..=1.0).contains(&v));
            }
        }
    }

    #[test]
    fn test_field_is_not_constant() {
        let field = SimplexNoiseField::new(11, 8.0, 3, 0.5);
        let first = field.sample(0.5, 0.5);
        assert!((0..64).any(|i| (field.sample(i as f64 * 2.1, 0.5) - first).abs() > 1e-3));
    }
}
