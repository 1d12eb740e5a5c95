//! Vein footprints for ore and gem deposits.
//!
//! A vein is a strip `length` columns wide. Each column is a vertical run of
//! cells whose thickness peaks in the middle and tapers toward both ends. The
//! strip is then sheared and rotated by a random multiple of 90 degrees.
//! Masks carry no map coordinates; the placement driver positions them.

use rand::Rng;

use crate::tilemap::Tilemap;

/// Shape inputs for one vein
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VeinSpec {
    /// Columns in the unrotated strip
    pub length: usize,
    /// Peak thickness before jitter
    pub thickness: f32,
    /// Symmetric jitter added to every column's thickness
    pub thickness_variance: f32,
}

impl VeinSpec {
    /// Thickest column these inputs can produce
    pub fn max_thickness(&self) -> usize {
        ((self.thickness + self.thickness_variance).round() as usize).max(1)
    }
}

/// Builds vein masks
#[derive(Clone, Copy, Debug)]
pub struct VeinShapeGenerator {
    /// Largest total vertical shift as a fraction of the length
    pub max_skew: f32,
}

impl Default for VeinShapeGenerator {
    fn default() -> Self {
        Self { max_skew: 0.5 }
    }
}

impl VeinShapeGenerator {
    /// Per-column thickness: triangular taper plus jitter, clamped to
    /// `1..=spec.max_thickness()`.
    pub fn column_thicknesses<R: Rng>(&self, spec: &VeinSpec, rng: &mut R) -> Vec<usize> {
        let center = (spec.length as f32 - 1.0) / 2.0;
        let max = spec.max_thickness();
        (0..spec.length)
            .map(|i| {
                let taper = 1.0 - (i as f32 - center).abs() / (center + 1.0);
                let jitter = if spec.thickness_variance > 0.0 {
                    rng.gen_range(-spec.thickness_variance..=spec.thickness_variance)
                } else {
                    0.0
                };
                ((spec.thickness * taper + jitter).round().max(1.0) as usize).min(max)
            })
            .collect()
    }

    /// The sheared strip before rotation. Always exactly `spec.length` wide.
    pub fn build_strip<R: Rng>(&self, spec: &VeinSpec, rng: &mut R) -> Tilemap<bool> {
        let columns = self.column_thicknesses(spec, rng);
        let band = columns.iter().copied().max().unwrap_or(1);

        let skew = if self.max_skew > 0.0 {
            rng.gen_range(-self.max_skew..=self.max_skew)
        } else {
            0.0
        };
        let total_shift = (skew * spec.length as f32).round() as i64;
        let last = spec.length.saturating_sub(1).max(1) as f32;
        let shift_of = |i: usize| (total_shift as f32 * i as f32 / last).round() as i64;
        let lowest = total_shift.min(0);
        let height = band + total_shift.unsigned_abs() as usize;

        let mut mask = Tilemap::new_with(spec.length, height, false);
        for (x, &thickness) in columns.iter().enumerate() {
            let blank = band - thickness;
            let mut before = blank / 2;
            if blank % 2 == 1 && rng.gen_bool(0.5) {
                before += 1;
            }
            let top = (shift_of(x) - lowest) as usize + before;
            for y in top..top + thickness {
                mask.set(x, y, true);
            }
        }
        mask
    }

    /// A full vein mask: strip, then 0-2 clockwise quarter turns.
    pub fn generate<R: Rng>(&self, spec: &VeinSpec, rng: &mut R) -> Tilemap<bool> {
        let mut mask = self.build_strip(spec, rng);
        let turns = rng.gen_range(0..=2);
        for _ in 0..turns {
            mask = mask.rotated_clockwise();
        }
        mask
    }
}
