//! Heightfield cropping and discretization into mountain/outside tiles

use crate::fractal::VertexField;
use crate::map::{GameMap, Tile, TileType};
use crate::noise_field::SimplexNoiseField;
use crate::tilemap::Tilemap;

/// How strongly the coherent noise overlay bends the contours
const NOISE_BLEND: f32 = 0.18;

/// Raw heights on a vertex grid, still larger than the target map until cropped
#[derive(Clone, Debug, PartialEq)]
pub struct HeightField {
    vertices: Tilemap<f32>,
}

impl HeightField {
    pub fn from_vertices(field: VertexField) -> Self {
        Self {
            vertices: field.into_heights(),
        }
    }

    pub fn vertex_width(&self) -> usize {
        self.vertices.width
    }

    pub fn vertex_height(&self) -> usize {
        self.vertices.height
    }

    /// Centered crop to the vertex grid of a `width` x `height` tile map
    /// (one extra vertex per dimension). A field already at that size is
    /// returned unchanged.
    pub fn crop(self, width: usize, height: usize) -> Self {
        let (vw, vh) = (width + 1, height + 1);
        if self.vertices.width == vw && self.vertices.height == vh {
            return self;
        }
        debug_assert!(self.vertices.width >= vw && self.vertices.height >= vh);
        let x0 = (self.vertices.width - vw) / 2;
        let y0 = (self.vertices.height - vh) / 2;
        Self {
            vertices: self.vertices.crop(x0, y0, vw, vh),
        }
    }

    pub fn normalize(&mut self) {
        self.vertices.normalize();
    }

    /// Per-tile height: the mean of the tile's four corner vertices
    pub fn tile_heights(&self) -> Tilemap<f32> {
        let v = &self.vertices;
        Tilemap::from_fn(v.width - 1, v.height - 1, |x, y| {
            (*v.get(x, y) + *v.get(x + 1, y) + *v.get(x, y + 1) + *v.get(x + 1, y + 1)) / 4.0
        })
    }
}

/// Height above which `ratio` of the values lie.
///
/// Returns `f32::INFINITY` when no value should qualify.
pub fn mountain_threshold(values: &[f32], ratio: f32) -> f32 {
    let n = values.len();
    let above = ((n as f32) * ratio.clamp(0.0, 1.0)).round() as usize;
    if above == 0 || n == 0 {
        return f32::INFINITY;
    }
    let mut sorted = values.to_vec();
    let (_, nth, _) = sorted.select_nth_unstable_by(n - above, |a, b| a.total_cmp(b));
    *nth
}

/// Turns a cropped heightfield into the first tile grid
pub struct HeightfieldDiscretizer<'a> {
    noise: &'a SimplexNoiseField,
    mountain_ratio: f32,
}

impl<'a> HeightfieldDiscretizer<'a> {
    pub fn new(noise: &'a SimplexNoiseField, mountain_ratio: f32) -> Self {
        Self {
            noise,
            mountain_ratio,
        }
    }

    /// Build the tile grid. Heights are bent by the noise overlay and
    /// renormalized before the threshold is chosen, so the mountain share
    /// matches the requested ratio.
    pub fn discretize(&self, field: &HeightField) -> GameMap {
        let mut heights = field.tile_heights();
        for (x, y, h) in heights.iter_mut() {
            let bend = self.noise.sample(x as f64, y as f64) as f32;
            *h += bend * NOISE_BLEND;
        }
        heights.normalize();

        let values: Vec<f32> = heights.iter().map(|(_, _, &h)| h).collect();
        let threshold = mountain_threshold(&values, self.mountain_ratio);

        let tiles = Tilemap::from_fn(heights.width, heights.height, |x, y| {
            let h = *heights.get(x, y);
            let tile_type = if h >= threshold { TileType::Mountain } else { TileType::Outside };
            Tile::new(tile_type, h)
        });
        GameMap::new(tiles)
    }
}
