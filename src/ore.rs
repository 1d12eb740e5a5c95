//! Ore and gem placement: stamp vein masks into large mountain regions until
//! the requested share of their tiles carries a deposit.

use rand::Rng;
use tracing::{debug, warn};

use crate::catalog::{pick_weighted, DepositType, GemTypeId, OreTypeId};
use crate::error::{MapGenError, Result};
use crate::map::{GameMap, RegionId, RegionKind, Tile, TileType};
use crate::params::VeinLength;
use crate::tilemap::GridPoint;
use crate::vein::{VeinShapeGenerator, VeinSpec};

/// A mountain region counts as large above this share of the map area
pub const LARGE_REGION_SHARE: f64 = 0.001;
/// Rejection-sampling tries for a point inside a region
pub const POINT_ATTEMPTS: usize = 64;
/// Veins attempted per required tile before giving up
const VEINS_PER_REQUIRED_TILE: usize = 8;
const MIN_VEIN_BUDGET: usize = 64;

/// Which tile field a deposit lands in
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DepositKind {
    Ore,
    Gem,
}

impl DepositKind {
    pub fn label(self) -> &'static str {
        match self {
            DepositKind::Ore => "ore",
            DepositKind::Gem => "gem",
        }
    }
}

/// Large mountain regions with cumulative sizes for weighted picks
#[derive(Clone, Debug, Default)]
pub struct MountainRegions {
    ids: Vec<RegionId>,
    cumulative: Vec<usize>,
    total: usize,
}

impl MountainRegions {
    pub fn collect(map: &GameMap) -> Self {
        let min_size = map.area() as f64 * LARGE_REGION_SHARE;
        let mut regions = Self::default();
        for region in map.regions.regions() {
            if region.kind != RegionKind::Mountain || region.size() as f64 <= min_size {
                continue;
            }
            regions.total += region.size();
            regions.ids.push(region.id);
            regions.cumulative.push(regions.total);
        }
        regions
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn total_tiles(&self) -> usize {
        self.total
    }

    /// Tiles a deposit kind must cover for `ratio`
    pub fn required(&self, ratio: f32) -> usize {
        (self.total as f64 * ratio as f64).ceil() as usize
    }

    /// Region drawn with probability proportional to its size
    pub fn pick<R: Rng>(&self, rng: &mut R) -> Option<RegionId> {
        if self.total == 0 {
            return None;
        }
        let draw = rng.gen_range(0..self.total);
        let idx = self.cumulative.partition_point(|&c| c <= draw);
        self.ids.get(idx).copied()
    }
}

/// Uniform point inside a region's bounds that belongs to the region and is
/// still solid mountain. Gives up after [`POINT_ATTEMPTS`] draws.
pub fn random_point_in<R: Rng>(map: &GameMap, id: RegionId, rng: &mut R) -> Option<GridPoint> {
    let region = map.region(id)?;
    let b = region.bounds;
    for _ in 0..POINT_ATTEMPTS {
        let x = rng.gen_range(b.min_x..=b.max_x);
        let y = rng.gen_range(b.min_y..=b.max_y);
        let tile = map.tile(x, y);
        if tile.region == Some(id) && tile.tile_type == TileType::Mountain {
            return Some((x, y));
        }
    }
    None
}

/// Drives vein placement for one deposit kind
pub struct VeinPlacer<'a> {
    pub kind: DepositKind,
    pub catalog: &'a [DepositType],
    pub ratio: f32,
    pub vein_length: VeinLength,
    pub shapes: VeinShapeGenerator,
}

impl<'a> VeinPlacer<'a> {
    pub fn new(kind: DepositKind, catalog: &'a [DepositType], ratio: f32, vein_length: VeinLength) -> Self {
        Self {
            kind,
            catalog,
            ratio,
            vein_length,
            shapes: VeinShapeGenerator::default(),
        }
    }

    fn random_spec<R: Rng>(&self, rng: &mut R) -> VeinSpec {
        let length = rng.gen_range(self.vein_length.min..=self.vein_length.max);
        let peak = (length as f32 / 2.0).max(1.0);
        VeinSpec {
            length,
            thickness: rng.gen_range(1.0..=peak),
            thickness_variance: 0.5,
        }
    }

    fn pick_deposit<R: Rng>(&self, map: &GameMap, (x, y): GridPoint, rng: &mut R) -> Result<usize> {
        let group = map.tile(x, y).rock_group;
        let hosted = self
            .catalog
            .iter()
            .enumerate()
            .filter(|(_, deposit)| group.map_or(true, |g| deposit.accepts(g)));
        pick_weighted(hosted, rng)
            .or_else(|| pick_weighted(self.catalog.iter().enumerate(), rng))
            .ok_or(MapGenError::EmptyCatalog(match self.kind {
                DepositKind::Ore => "ore_types",
                DepositKind::Gem => "gem_types",
            }))
    }

    fn can_take_deposit(map: &GameMap, x: usize, y: usize) -> bool {
        let tile = map.tile(x, y);
        tile.tile_type == TileType::Mountain && tile.ore.is_none() && tile.gem.is_none()
    }

    fn carries_kind(&self, tile: &Tile) -> bool {
        match self.kind {
            DepositKind::Ore => tile.ore.is_some(),
            DepositKind::Gem => tile.gem.is_some(),
        }
    }

    fn stamp(&self, map: &mut GameMap, x: usize, y: usize, deposit: usize) {
        let tile = map.tile_mut(x, y);
        match self.kind {
            DepositKind::Ore => tile.ore = Some(OreTypeId(deposit as u16)),
            DepositKind::Gem => tile.gem = Some(GemTypeId(deposit as u16)),
        }
    }

    /// Stamp veins until exactly `regions.required(ratio)` tiles carry this
    /// deposit kind. Tiles already carrying it count toward the quota, so a
    /// pass that failed part way can be run again. Returns the number of
    /// tiles carrying the deposit kind.
    pub fn place<R: Rng>(&self, map: &mut GameMap, regions: &MountainRegions, rng: &mut R) -> Result<usize> {
        let required = regions.required(self.ratio);
        let mut generated = map.count_tiles(|t| self.carries_kind(t));
        if generated >= required {
            return Ok(generated);
        }
        let budget = (required * VEINS_PER_REQUIRED_TILE).max(MIN_VEIN_BUDGET);
        let mut veins = 0;

        while generated < required && veins < budget {
            veins += 1;
            let Some(region) = regions.pick(rng) else { break };
            let Some(center) = random_point_in(map, region, rng) else {
                debug!(kind = self.kind.label(), region = region.0, "no interior point found, skipping vein");
                continue;
            };

            let deposit = self.pick_deposit(map, center, rng)?;
            let spec = self.random_spec(rng);
            let mask = self.shapes.generate(&spec, rng);
            let x0 = center.0 as i64 - (mask.width / 2) as i64;
            let y0 = center.1 as i64 - (mask.height / 2) as i64;

            for (mx, my, &on) in mask.iter() {
                if !on {
                    continue;
                }
                let Some((x, y)) = map.tiles.offset((0, 0), (x0 + mx as i64, y0 + my as i64)) else {
                    continue;
                };
                if !Self::can_take_deposit(map, x, y) {
                    continue;
                }
                self.stamp(map, x, y, deposit);
                generated += 1;
                if generated == required {
                    break;
                }
            }
        }

        if generated < required {
            warn!(kind = self.kind.label(), generated, required, veins, "vein budget exhausted");
            return Err(MapGenError::QuotaUnreachable {
                deposit: self.kind.label(),
                generated,
                required,
            });
        }
        debug!(kind = self.kind.label(), tiles = generated, veins, "deposits placed");
        Ok(generated)
    }
}
