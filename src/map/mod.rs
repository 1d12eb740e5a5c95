//! The generated tile grid and its region side table.

mod region;
mod tile;

pub use region::{
    Bounds, MapEdge, MapRegion, MapSubRegion, RegionId, RegionKind, RegionTable, SubRegionId,
};
pub use tile::{RockGroup, SubType, Tile, TileType};

use serde::{Deserialize, Serialize};

use crate::river::RiverPath;
use crate::tilemap::{GridPoint, Tilemap};

/// Output of the generation pipeline
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameMap {
    pub tiles: Tilemap<Tile>,
    pub regions: RegionTable,
    /// The carved river, if one was generated
    pub river: Option<RiverPath>,
}

/// Tile counts for a finished (or partially finished) map
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapStats {
    pub outside_tiles: usize,
    pub mountain_tiles: usize,
    pub cave_tiles: usize,
    pub river_tiles: usize,
    pub forest_tiles: usize,
    pub loam_tiles: usize,
    pub trees: usize,
    pub shrubs: usize,
    pub mushrooms: usize,
    pub ore_tiles: usize,
    pub gem_tiles: usize,
    pub regions: usize,
    pub sub_regions: usize,
}

impl GameMap {
    pub fn new(tiles: Tilemap<Tile>) -> Self {
        Self {
            tiles,
            regions: RegionTable::default(),
            river: None,
        }
    }

    pub fn width(&self) -> usize {
        self.tiles.width
    }

    pub fn height(&self) -> usize {
        self.tiles.height
    }

    pub fn area(&self) -> usize {
        self.tiles.len()
    }

    pub fn tile(&self, x: usize, y: usize) -> &Tile {
        self.tiles.get(x, y)
    }

    pub fn tile_mut(&mut self, x: usize, y: usize) -> &mut Tile {
        self.tiles.get_mut(x, y)
    }

    pub fn tile_at(&self, x: i64, y: i64) -> Option<&Tile> {
        self.tiles.get_checked(x, y)
    }

    pub fn neighbors(&self, x: usize, y: usize) -> Vec<GridPoint> {
        self.tiles.neighbors(x, y)
    }

    pub fn diagonal_neighbors(&self, x: usize, y: usize) -> Vec<GridPoint> {
        self.tiles.diagonal_neighbors(x, y)
    }

    pub fn neighbors_8(&self, x: usize, y: usize) -> Vec<GridPoint> {
        self.tiles.neighbors_8(x, y)
    }

    pub fn region(&self, id: RegionId) -> Option<&MapRegion> {
        self.regions.region(id)
    }

    pub fn sub_region(&self, id: SubRegionId) -> Option<&MapSubRegion> {
        self.regions.sub_region(id)
    }

    /// Region containing a tile, if regions have been assigned
    pub fn region_at(&self, x: usize, y: usize) -> Option<&MapRegion> {
        self.tile(x, y).region.and_then(|id| self.region(id))
    }

    pub fn count_tiles(&self, mut pred: impl FnMut(&Tile) -> bool) -> usize {
        self.tiles.iter().filter(|(_, _, tile)| pred(tile)).count()
    }

    pub fn stats(&self) -> MapStats {
        let mut stats = MapStats {
            regions: self.regions.region_count(),
            sub_regions: self.regions.sub_region_count(),
            ..MapStats::default()
        };
        for (_, _, tile) in self.tiles.iter() {
            match tile.tile_type {
                TileType::Outside => stats.outside_tiles += 1,
                TileType::Mountain => stats.mountain_tiles += 1,
                TileType::Cave => stats.cave_tiles += 1,
            }
            stats.river_tiles += tile.river as usize;
            stats.forest_tiles += (tile.sub_type == SubType::Forest) as usize;
            stats.loam_tiles += (tile.sub_type == SubType::LoamFloor) as usize;
            stats.trees += tile.tree.is_some() as usize;
            stats.shrubs += tile.shrub.is_some() as usize;
            stats.mushrooms += tile.mushroom.is_some() as usize;
            stats.ore_tiles += tile.ore.is_some() as usize;
            stats.gem_tiles += tile.gem.is_some() as usize;
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_count_tile_types() {
        let mut tiles = Tilemap::new_with(4, 4, Tile::new(TileType::Outside, 0.0));
        tiles.set(0, 0, Tile::new(TileType::Mountain, 1.0));
        tiles.set(1, 0, Tile::new(TileType::Cave, 1.0));
        tiles.get_mut(2, 2).river = true;
        let map = GameMap::new(tiles);
        let stats = map.stats();
        assert_eq!(stats.outside_tiles, 14);
        assert_eq!(stats.mountain_tiles, 1);
        assert_eq!(stats.cave_tiles, 1);
        assert_eq!(stats.river_tiles, 1);
    }

    #[test]
    fn test_tile_at_checks_bounds() {
        let map = GameMap::new(Tilemap::new_with(2, 2, Tile::default()));
        assert!(map.tile_at(-1, 0).is_none());
        assert!(map.tile_at(1, 1).is_some());
    }
}
