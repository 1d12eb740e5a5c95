use rand::Rng;
use tracing::debug;

use super::{spread, Planter};
use crate::catalog::{pick_weighted, Catalogs, ShrubTypeId};
use crate::error::{MapGenError, Result};
use crate::map::{Bounds, GameMap, RegionKind, SubRegionId, SubType};
use crate::tilemap::GridPoint;

/// Most trees and shrubs allowed around any shrub
pub const MAX_PLANT_NEIGHBORS: usize = 2;

/// Shrubs spreading through one grassland sub-region
pub struct ShrubPlanter {
    sub_region: SubRegionId,
    bounds: Bounds,
    fruiting: ShrubTypeId,
    plain: ShrubTypeId,
    fruit_ratio: f32,
}

fn plant_neighbors(map: &GameMap, (x, y): GridPoint) -> usize {
    map.tiles.count_neighbors_8(x, y, |t| t.has_plant())
}

impl ShrubPlanter {
    pub fn new(sub_region: SubRegionId, bounds: Bounds, fruiting: ShrubTypeId, plain: ShrubTypeId, fruit_ratio: f32) -> Self {
        Self {
            sub_region,
            bounds,
            fruiting,
            plain,
            fruit_ratio,
        }
    }
}

impl Planter for ShrubPlanter {
    const ATTEMPTS: usize = 10;
    const RING: i64 = 2;

    fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// The new shrub must not crowd itself or any shrub already next to it.
    fn allowed(&self, map: &GameMap, (x, y): GridPoint) -> bool {
        let tile = map.tile(x, y);
        if tile.sub_region != Some(self.sub_region) || !tile.is_open_ground() || tile.has_plant() {
            return false;
        }
        if plant_neighbors(map, (x, y)) > MAX_PLANT_NEIGHBORS {
            return false;
        }
        map.neighbors_8(x, y)
            .into_iter()
            .filter(|&(nx, ny)| map.tile(nx, ny).shrub.is_some())
            .all(|n| plant_neighbors(map, n) < MAX_PLANT_NEIGHBORS)
    }

    fn place<R: Rng>(&mut self, map: &mut GameMap, (x, y): GridPoint, rng: &mut R) {
        let shrub = if rng.gen::<f32>() < self.fruit_ratio { self.fruiting } else { self.plain };
        map.tile_mut(x, y).shrub = Some(shrub);
    }
}

/// Weighted shrub from the entries with the given fruiting flag, or from the
/// whole catalog when there are none.
fn pick_shrub<R: Rng>(catalogs: &Catalogs, fruiting: bool, rng: &mut R) -> Result<ShrubTypeId> {
    let matching = catalogs
        .shrub_types
        .iter()
        .enumerate()
        .filter(|(_, s)| s.fruiting == fruiting);
    pick_weighted(matching, rng)
        .or_else(|| pick_weighted(catalogs.shrub_types.iter().enumerate(), rng))
        .map(|i| ShrubTypeId(i as u16))
        .ok_or(MapGenError::EmptyCatalog("shrub_types"))
}

/// Plant shrubs in every outdoor grassland sub-region.
pub fn plant_shrubs<R: Rng>(map: &mut GameMap, catalogs: &Catalogs, fruit_ratio: f32, rng: &mut R) -> Result<usize> {
    let grasslands: Vec<(SubRegionId, Bounds)> = map
        .regions
        .sub_regions()
        .filter(|s| s.sub_type == SubType::Grassland)
        .filter(|s| map.region(s.region).is_some_and(|r| r.kind == RegionKind::Outside))
        .map(|s| (s.id, s.bounds))
        .collect();

    let mut total = 0;
    for (id, bounds) in grasslands {
        let fruiting = pick_shrub(catalogs, true, rng)?;
        let plain = pick_shrub(catalogs, false, rng)?;
        let mut planter = ShrubPlanter::new(id, bounds, fruiting, plain, fruit_ratio);
        total += spread(&mut planter, map, rng);
    }
    debug!(shrubs = total, "shrubs planted");
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::{Tile, TileType};
    use crate::regions::{FloodFillRegionAnalyzer, RegionAnalyzer};
    use crate::tilemap::Tilemap;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn grass_map(width: usize, height: usize) -> GameMap {
        let mut map = GameMap::new(Tilemap::new_with(width, height, Tile::new(TileType::Outside, 0.2)));
        FloodFillRegionAnalyzer.assign_regions(&mut map);
        FloodFillRegionAnalyzer.assign_sub_regions(&mut map);
        map
    }

    #[test]
    fn test_shrubs_never_crowded() {
        let mut map = grass_map(24, 24);
        let catalogs = Catalogs::default();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let planted = plant_shrubs(&mut map, &catalogs, 0.3, &mut rng).unwrap();
        assert!(planted >= 9);
        for (x, y, tile) in map.tiles.iter() {
            if tile.shrub.is_some() {
                assert!(plant_neighbors(&map, (x, y)) <= MAX_PLANT_NEIGHBORS);
            }
        }
    }

    #[test]
    fn test_fruit_ratio_extremes() {
        let catalogs = Catalogs::default();
        for (ratio, fruiting) in [(1.0, true), (0.0, false)] {
            let mut map = grass_map(16, 16);
            let mut rng = ChaCha8Rng::seed_from_u64(4);
            plant_shrubs(&mut map, &catalogs, ratio, &mut rng).unwrap();
            for (_, _, tile) in map.tiles.iter() {
                if let Some(id) = tile.shrub {
                    assert_eq!(catalogs.shrub_types[id.index()].fruiting, fruiting);
                }
            }
        }
    }

    #[test]
    fn test_shrubs_skip_river_and_trees() {
        let mut map = grass_map(12, 12);
        map.tile_mut(3, 3).river = true;
        map.tile_mut(6, 6).tree = Some(crate::catalog::TreeTypeId(0));
        let catalogs = Catalogs::default();
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        plant_shrubs(&mut map, &catalogs, 0.5, &mut rng).unwrap();
        assert!(map.tile(3, 3).shrub.is_none());
        assert!(map.tile(6, 6).shrub.is_none());
    }
}
