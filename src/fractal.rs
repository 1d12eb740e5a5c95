//! Fractal terrain synthesis by midpoint displacement (diamond-square).
//!
//! The vertex field is always `2^n + 1` vertices on a side. Each generation
//! doubles the resolution: old vertices land on even indices, new square
//! centers average their four diagonal corners, and new edge midpoints
//! (diamonds) average their cardinal neighbors. Only the new vertices are
//! perturbed, by a variance that shrinks each generation.

use rand::Rng;

use crate::tilemap::Tilemap;

/// Square grid of vertex heights, `2^n + 1` vertices per side
#[derive(Clone, Debug, PartialEq)]
pub struct VertexField {
    heights: Tilemap<f32>,
}

impl VertexField {
    /// The 2x2 starting field with random corner heights in `[0, 1)`.
    pub fn seed<R: Rng>(rng: &mut R) -> Self {
        let mut heights = Tilemap::new_with(2, 2, 0.0f32);
        for y in 0..2 {
            for x in 0..2 {
                heights.set(x, y, rng.gen::<f32>());
            }
        }
        Self { heights }
    }

    pub fn from_heights(heights: Tilemap<f32>) -> Self {
        debug_assert_eq!(heights.width, heights.height);
        debug_assert!((heights.width - 1).is_power_of_two());
        Self { heights }
    }

    /// Vertices per side
    pub fn size(&self) -> usize {
        self.heights.width
    }

    /// Tiles per side the field can cover
    pub fn tile_span(&self) -> usize {
        self.size() - 1
    }

    pub fn height_at(&self, x: usize, y: usize) -> f32 {
        *self.heights.get(x, y)
    }

    pub fn heights(&self) -> &Tilemap<f32> {
        &self.heights
    }

    pub fn into_heights(self) -> Tilemap<f32> {
        self.heights
    }

    pub fn normalize(&mut self) {
        self.heights.normalize();
    }

    /// Whether the field covers a `width` x `height` tile map
    pub fn covers(&self, width: usize, height: usize) -> bool {
        self.tile_span() >= width.max(height)
    }

    /// New square centers (odd, odd) in a field of this size
    fn is_square_point(x: usize, y: usize) -> bool {
        x % 2 == 1 && y % 2 == 1
    }

    /// New edge midpoints: exactly one odd coordinate
    fn is_diamond_point(x: usize, y: usize) -> bool {
        (x % 2) != (y % 2)
    }

    /// Average of the 4 diagonal corners of a square center
    fn square_average(&self, x: usize, y: usize) -> f32 {
        let h = &self.heights;
        (*h.get(x - 1, y - 1) + *h.get(x + 1, y - 1) + *h.get(x - 1, y + 1) + *h.get(x + 1, y + 1)) / 4.0
    }

    /// Average of the cardinal neighbors that exist (3 on the border, else 4)
    fn diamond_average(&self, x: usize, y: usize) -> f32 {
        let mut sum = 0.0;
        let mut count = 0;
        for (nx, ny) in self.heights.neighbors(x, y) {
            sum += *self.heights.get(nx, ny);
            count += 1;
        }
        sum / count as f32
    }

    fn recompute_diamonds(&mut self) {
        let size = self.size();
        for y in 0..size {
            for x in 0..size {
                if Self::is_diamond_point(x, y) {
                    let avg = self.diamond_average(x, y);
                    self.heights.set(x, y, avg);
                }
            }
        }
    }
}

/// Doubles and roughens a [`VertexField`] one generation at a time.
#[derive(Clone, Debug)]
pub struct FractalTerrainSynthesizer {
    variance: f32,
    roughness: f32,
}

impl FractalTerrainSynthesizer {
    pub fn new(initial_variance: f32, roughness: f32) -> Self {
        Self {
            variance: initial_variance,
            roughness,
        }
    }

    /// Variance the next perturbation will use
    pub fn variance(&self) -> f32 {
        self.variance
    }

    /// Double the field resolution, filling new vertices with neighbor averages.
    pub fn grow(field: &VertexField) -> VertexField {
        let old_size = field.size();
        let size = (old_size - 1) * 2 + 1;
        let mut grown = VertexField {
            heights: Tilemap::new_with(size, size, 0.0f32),
        };

        for y in 0..old_size {
            for x in 0..old_size {
                grown.heights.set(x * 2, y * 2, field.height_at(x, y));
            }
        }
        for y in (1..size).step_by(2) {
            for x in (1..size).step_by(2) {
                let avg = grown.square_average(x, y);
                grown.heights.set(x, y, avg);
            }
        }
        grown.recompute_diamonds();
        grown
    }

    /// Perturb the vertices created by the last [`grow`](Self::grow) by
    /// +/- the current variance, then shrink the variance.
    ///
    /// Square centers move first; diamonds are re-averaged from the moved
    /// centers and then perturbed themselves. Even-indexed vertices are never
    /// touched.
    pub fn perturb<R: Rng>(&mut self, field: &mut VertexField, rng: &mut R) {
        let size = field.size();
        let variance = self.variance;

        for y in 0..size {
            for x in 0..size {
                if VertexField::is_square_point(x, y) {
                    let offset = rng.gen_range(-variance..=variance);
                    *field.heights.get_mut(x, y) += offset;
                }
            }
        }

        field.recompute_diamonds();

        for y in 0..size {
            for x in 0..size {
                if VertexField::is_diamond_point(x, y) {
                    let offset = rng.gen_range(-variance..=variance);
                    *field.heights.get_mut(x, y) += offset;
                }
            }
        }

        self.variance *= self.roughness;
    }

    /// One full generation: grow, perturb, normalize.
    pub fn step<R: Rng>(&mut self, field: &VertexField, rng: &mut R) -> VertexField {
        let mut grown = Self::grow(field);
        self.perturb(&mut grown, rng);
        grown.normalize();
        grown
    }
}
