use rand::Rng;
use tracing::debug;

use super::{spread, Planter};
use crate::catalog::{pick_weighted, Catalogs, TreeTypeId};
use crate::error::{MapGenError, Result};
use crate::map::{Bounds, GameMap, SubRegionId, SubType, TileType};
use crate::tilemap::GridPoint;

/// Trees spreading through one forest sub-region.
///
/// A tree needs `sprite_height - 1` outdoor tiles above it, and no other
/// tree or river in the columns `x - 1..=x + 1` within `band` rows. The band
/// is the tallest sprite in the catalog, so the rule holds in both
/// directions no matter which tree went in first.
pub struct TreePlanter<'a> {
    catalogs: &'a Catalogs,
    sub_region: SubRegionId,
    bounds: Bounds,
    types: Vec<TreeTypeId>,
    headroom: usize,
    band: usize,
}

impl<'a> TreePlanter<'a> {
    pub fn new(catalogs: &'a Catalogs, sub_region: SubRegionId, bounds: Bounds, types: Vec<TreeTypeId>) -> Self {
        let headroom = types
            .iter()
            .map(|&id| catalogs.tree_type(id).sprite_height)
            .max()
            .unwrap_or(1);
        Self {
            catalogs,
            sub_region,
            bounds,
            types,
            headroom,
            band: catalogs.max_tree_height(),
        }
    }

    fn has_headroom(&self, map: &GameMap, (x, y): GridPoint) -> bool {
        (1..self.headroom).all(|dy| {
            map.tile_at(x as i64, y as i64 - dy as i64)
                .is_some_and(|t| t.tile_type == TileType::Outside)
        })
    }

    fn band_is_clear(&self, map: &GameMap, (x, y): GridPoint) -> bool {
        let band = self.band as i64;
        for dy in -band..=band {
            for dx in -1..=1 {
                let Some(tile) = map.tile_at(x as i64 + dx, y as i64 + dy) else { continue };
                if tile.river || ((dx, dy) != (0, 0) && tile.tree.is_some()) {
                    return false;
                }
            }
        }
        true
    }
}

impl Planter for TreePlanter<'_> {
    const ATTEMPTS: usize = 16;
    const RING: i64 = 3;

    fn bounds(&self) -> Bounds {
        self.bounds
    }

    fn allowed(&self, map: &GameMap, point: GridPoint) -> bool {
        let tile = map.tile(point.0, point.1);
        tile.sub_region == Some(self.sub_region)
            && tile.is_open_ground()
            && !tile.has_plant()
            && self.has_headroom(map, point)
            && self.band_is_clear(map, point)
    }

    fn place<R: Rng>(&mut self, map: &mut GameMap, (x, y): GridPoint, rng: &mut R) {
        let candidates = self.types.iter().map(|&id| (id.index(), self.catalogs.tree_type(id)));
        let picked = pick_weighted(candidates, rng).map_or(self.types[0], |i| TreeTypeId(i as u16));
        map.tile_mut(x, y).tree = Some(picked);
    }
}

/// One or two tree types that grow at `vertical_position`, weighted.
/// Falls back to the whole catalog when none fit.
fn choose_tree_types<R: Rng>(catalogs: &Catalogs, vertical_position: f32, rng: &mut R) -> Result<Vec<TreeTypeId>> {
    let fitting: Vec<usize> = (0..catalogs.tree_types.len())
        .filter(|&i| catalogs.tree_types[i].grows_at(vertical_position))
        .collect();
    let mut pool: Vec<usize> = if fitting.is_empty() {
        (0..catalogs.tree_types.len()).collect()
    } else {
        fitting
    };

    let wanted = rng.gen_range(1..=2).min(pool.len());
    let mut chosen = Vec::with_capacity(wanted);
    for _ in 0..wanted {
        let picked = pick_weighted(pool.iter().map(|&i| (i, &catalogs.tree_types[i])), rng)
            .ok_or(MapGenError::EmptyCatalog("tree_types"))?;
        pool.retain(|&i| i != picked);
        chosen.push(TreeTypeId(picked as u16));
    }
    if chosen.is_empty() {
        return Err(MapGenError::EmptyCatalog("tree_types"));
    }
    Ok(chosen)
}

/// Plant trees in every forest sub-region. Returns the number of trees.
pub fn plant_forests<R: Rng>(map: &mut GameMap, catalogs: &Catalogs, rng: &mut R) -> Result<usize> {
    let forests: Vec<(SubRegionId, Bounds, f32)> = map
        .regions
        .sub_regions()
        .filter(|s| s.sub_type == SubType::Forest)
        .map(|s| (s.id, s.bounds, s.vertical_position(map.height())))
        .collect();

    let mut total = 0;
    for (id, bounds, position) in forests {
        let types = choose_tree_types(catalogs, position, rng)?;
        let mut planter = TreePlanter::new(catalogs, id, bounds, types);
        total += spread(&mut planter, map, rng);
    }
    debug!(trees = total, "forests planted");
    Ok(total)
}
