use rand::Rng;
use tracing::debug;

use super::{spread, Planter};
use crate::catalog::{pick_weighted, Catalogs, MushroomTypeId};
use crate::error::{MapGenError, Result};
use crate::map::{Bounds, GameMap, SubRegionId, SubType, TileType};
use crate::tilemap::GridPoint;

/// Stone floor within this Chebyshev distance of a mushroom turns to loam
pub const LOAM_RADIUS: usize = 2;

fn is_floor(sub_type: SubType) -> bool {
    matches!(sub_type, SubType::StoneFloor | SubType::LoamFloor)
}

fn mushroom_nearby(map: &GameMap, (x, y): GridPoint) -> bool {
    map.tiles.count_neighbors_8(x, y, |t| t.mushroom.is_some()) > 0
}

/// Mushroom colonies in one stone-floor cave sub-region
pub struct MushroomSpawner<'a> {
    catalogs: &'a Catalogs,
    sub_region: SubRegionId,
    bounds: Bounds,
    quota: usize,
    placed: Vec<GridPoint>,
}

impl<'a> MushroomSpawner<'a> {
    pub fn new(catalogs: &'a Catalogs, sub_region: SubRegionId, bounds: Bounds, quota: usize) -> Self {
        Self {
            catalogs,
            sub_region,
            bounds,
            quota,
            placed: Vec::new(),
        }
    }

    fn plant<R: Rng>(&self, map: &mut GameMap, (x, y): GridPoint, rng: &mut R) {
        let picked = pick_weighted(self.catalogs.mushroom_types.iter().enumerate(), rng).unwrap_or(0);
        map.tile_mut(x, y).mushroom = Some(MushroomTypeId(picked as u16));
    }

    fn convert_to_loam(map: &mut GameMap, (x, y): GridPoint) {
        let r = LOAM_RADIUS as i64;
        for dy in -r..=r {
            for dx in -r..=r {
                let Some((nx, ny)) = map.tiles.offset((x, y), (dx, dy)) else { continue };
                let tile = map.tile_mut(nx, ny);
                if tile.tile_type == TileType::Cave && tile.sub_type == SubType::StoneFloor {
                    tile.sub_type = SubType::LoamFloor;
                }
            }
        }
    }

    /// Companion mushrooms on the loam around each colony: at most one per
    /// placed mushroom, on loam exactly [`LOAM_RADIUS`] away, never next to
    /// another mushroom. Returns the number added.
    pub fn spawn_companions<R: Rng>(&mut self, map: &mut GameMap, rng: &mut R) -> usize {
        let r = LOAM_RADIUS as i64;
        let parents = self.placed.clone();
        let mut added = 0;
        for parent in parents {
            let ring: Vec<GridPoint> = (-r..=r)
                .flat_map(|dy| (-r..=r).map(move |dx| (dx, dy)))
                .filter(|&(dx, dy)| dx.abs().max(dy.abs()) == r)
                .filter_map(|offset| map.tiles.offset(parent, offset))
                .filter(|&(x, y)| {
                    let tile = map.tile(x, y);
                    tile.tile_type == TileType::Cave
                        && tile.sub_type == SubType::LoamFloor
                        && tile.mushroom.is_none()
                        && !mushroom_nearby(map, (x, y))
                })
                .collect();
            if ring.is_empty() {
                continue;
            }
            let spot = ring[rng.gen_range(0..ring.len())];
            self.plant(map, spot, rng);
            self.placed.push(spot);
            added += 1;
        }
        added
    }

    pub fn placed(&self) -> &[GridPoint] {
        &self.placed
    }
}

impl Planter for MushroomSpawner<'_> {
    const ATTEMPTS: usize = 6;
    const RING: i64 = 3;

    fn bounds(&self) -> Bounds {
        self.bounds
    }

    fn allowed(&self, map: &GameMap, point: GridPoint) -> bool {
        let tile = map.tile(point.0, point.1);
        tile.sub_region == Some(self.sub_region)
            && tile.tile_type == TileType::Cave
            && is_floor(tile.sub_type)
            && tile.mushroom.is_none()
            && !mushroom_nearby(map, point)
    }

    fn place<R: Rng>(&mut self, map: &mut GameMap, point: GridPoint, rng: &mut R) {
        self.plant(map, point, rng);
        Self::convert_to_loam(map, point);
        self.placed.push(point);
    }

    fn satisfied(&self) -> bool {
        self.placed.len() >= self.quota
    }
}

/// Spawn mushroom colonies in every stone-floor cave sub-region, then a
/// companion batch on the loam they leave behind.
pub fn spawn_mushrooms<R: Rng>(map: &mut GameMap, catalogs: &Catalogs, ratio: f32, rng: &mut R) -> Result<usize> {
    if catalogs.mushroom_types.is_empty() {
        return Err(MapGenError::EmptyCatalog("mushroom_types"));
    }
    let caves: Vec<(SubRegionId, Bounds, usize)> = map
        .regions
        .sub_regions()
        .filter(|s| s.sub_type == SubType::StoneFloor)
        .map(|s| (s.id, s.bounds, (s.size() as f32 * ratio).ceil() as usize))
        .filter(|&(_, _, quota)| quota > 0)
        .collect();

    let mut total = 0;
    let mut companions = 0;
    for (id, bounds, quota) in caves {
        let mut spawner = MushroomSpawner::new(catalogs, id, bounds, quota);
        total += spread(&mut spawner, map, rng);
        companions += spawner.spawn_companions(map, rng);
    }
    debug!(mushrooms = total, companions, "mushrooms spawned");
    Ok(total + companions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::Tile;
    use crate::regions::{FloodFillRegionAnalyzer, RegionAnalyzer};
    use crate::tilemap::Tilemap;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn cave_map(width: usize, height: usize) -> GameMap {
        let tiles = Tilemap::from_fn(width, height, |x, y| {
            let border = x == 0 || y == 0 || x + 1 == width || y + 1 == height;
            Tile::new(if border { TileType::Mountain } else { TileType::Cave }, 0.8)
        });
        let mut map = GameMap::new(tiles);
        FloodFillRegionAnalyzer.assign_regions(&mut map);
        FloodFillRegionAnalyzer.assign_sub_regions(&mut map);
        map
    }

    #[test]
    fn test_mushrooms_never_touch() {
        let mut map = cave_map(24, 24);
        let catalogs = Catalogs::default();
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let spawned = spawn_mushrooms(&mut map, &catalogs, 0.1, &mut rng).unwrap();
        assert!(spawned > 0);
        assert_eq!(spawned, map.count_tiles(|t| t.mushroom.is_some()));
        for (x, y, tile) in map.tiles.iter() {
            if tile.mushroom.is_some() {
                assert!(!mushroom_nearby(&map, (x, y)), "crowded at ({x},{y})");
                assert_eq!(tile.tile_type, TileType::Cave);
            }
        }
    }

    #[test]
    fn test_colonies_leave_loam() {
        let mut map = cave_map(16, 16);
        let catalogs = Catalogs::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        spawn_mushrooms(&mut map, &catalogs, 0.05, &mut rng).unwrap();
        for (x, y, tile) in map.tiles.iter() {
            if tile.mushroom.is_some() {
                assert_eq!(tile.sub_type, SubType::LoamFloor, "({x},{y})");
            }
        }
        assert_eq!(map.count_tiles(|t| t.tile_type == TileType::Mountain && t.sub_type == SubType::LoamFloor), 0);
    }

    #[test]
    fn test_quota_caps_first_batch() {
        let mut map = cave_map(20, 20);
        let catalogs = Catalogs::default();
        let sub = map.regions.sub_regions().find(|s| s.sub_type == SubType::StoneFloor).unwrap();
        let (id, bounds) = (sub.id, sub.bounds);
        let mut spawner = MushroomSpawner::new(&catalogs, id, bounds, 3);
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        assert_eq!(spread(&mut spawner, &mut map, &mut rng), 3);
        assert_eq!(spawner.placed().len(), 3);
    }
}
