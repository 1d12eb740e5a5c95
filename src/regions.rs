//! Region analysis: flood-fill grouping of contiguous tiles.
//!
//! Regions group orthogonally-connected tiles of the same [`RegionKind`];
//! sub-regions split a region further by [`SubType`]. The pipeline only
//! consumes the [`RegionAnalyzer`] trait, so a host game can plug in its
//! own connectivity rules.

use std::collections::VecDeque;

use tracing::debug;

use crate::map::{
    Bounds, GameMap, MapEdge, MapRegion, MapSubRegion, RegionId, RegionKind, SubRegionId, SubType,
    TileType,
};
use crate::tilemap::{GridPoint, Tilemap};

/// Connectivity collaborator used by the generation pipeline
pub trait RegionAnalyzer {
    /// Rebuild every region from scratch. Clears sub-regions too.
    fn assign_regions(&self, map: &mut GameMap);

    /// Rebuild every sub-region inside the current regions.
    fn assign_sub_regions(&self, map: &mut GameMap);

    /// Turn outdoor pockets that do not reach the map border into mountain.
    /// Returns the tiles of each converted pocket.
    fn set_enclosed_outside_areas_as_mountain(&self, map: &mut GameMap) -> Vec<Vec<GridPoint>>;

    /// Re-analyze only `tiles`: their old region and sub-region records are
    /// discarded and fresh ones are built from the tiles' current state.
    fn assign_regions_in(&self, tiles: &[GridPoint], map: &mut GameMap);
}

/// Default analyzer: breadth-first flood fill over orthogonal neighbors
#[derive(Clone, Copy, Debug, Default)]
pub struct FloodFillRegionAnalyzer;

/// Flood fill from `start` over orthogonal neighbors accepted by `same`.
fn flood_fill(
    map: &GameMap,
    start: GridPoint,
    visited: &mut Tilemap<bool>,
    mut same: impl FnMut(GridPoint) -> bool,
) -> Vec<GridPoint> {
    let mut tiles = Vec::new();
    let mut queue = VecDeque::new();
    visited.set(start.0, start.1, true);
    queue.push_back(start);

    while let Some((x, y)) = queue.pop_front() {
        tiles.push((x, y));
        for (nx, ny) in map.neighbors(x, y) {
            if *visited.get(nx, ny) || !same((nx, ny)) {
                continue;
            }
            visited.set(nx, ny, true);
            queue.push_back((nx, ny));
        }
    }
    tiles
}

fn region_kind_at(map: &GameMap, (x, y): GridPoint) -> RegionKind {
    let tile = map.tile(x, y);
    RegionKind::of(tile.tile_type, tile.river)
}

fn build_region(map: &GameMap, id: RegionId, kind: RegionKind, tiles: Vec<GridPoint>) -> MapRegion {
    let (w, h) = (map.width(), map.height());
    let mut bounds = Bounds::empty();
    let mut edge_tiles: [Vec<GridPoint>; 4] = Default::default();
    for &(x, y) in &tiles {
        bounds.include((x, y));
        if y == 0 {
            edge_tiles[MapEdge::North.index()].push((x, y));
        }
        if x + 1 == w {
            edge_tiles[MapEdge::East.index()].push((x, y));
        }
        if y + 1 == h {
            edge_tiles[MapEdge::South.index()].push((x, y));
        }
        if x == 0 {
            edge_tiles[MapEdge::West.index()].push((x, y));
        }
    }
    MapRegion {
        id,
        kind,
        tiles,
        bounds,
        edge_tiles,
    }
}

fn build_sub_region(id: SubRegionId, region: RegionId, sub_type: SubType, tiles: Vec<GridPoint>) -> MapSubRegion {
    let mut bounds = Bounds::empty();
    for &point in &tiles {
        bounds.include(point);
    }
    MapSubRegion {
        id,
        region,
        sub_type,
        tiles,
        bounds,
    }
}

impl FloodFillRegionAnalyzer {
    /// Build regions for every unassigned tile accepted by `in_scope`.
    fn fill_regions(map: &mut GameMap, in_scope: &Tilemap<bool>) -> Vec<RegionId> {
        let mut visited = Tilemap::new_with(map.width(), map.height(), false);
        let mut created = Vec::new();

        for y in 0..map.height() {
            for x in 0..map.width() {
                if !*in_scope.get(x, y) || *visited.get(x, y) || map.tile(x, y).region.is_some() {
                    continue;
                }
                let kind = region_kind_at(map, (x, y));
                let tiles = flood_fill(map, (x, y), &mut visited, |p| {
                    *in_scope.get(p.0, p.1) && region_kind_at(map, p) == kind
                });

                let id = map.regions.next_region_id();
                for &(tx, ty) in &tiles {
                    map.tile_mut(tx, ty).region = Some(id);
                }
                let region = build_region(map, id, kind, tiles);
                map.regions.insert_region(region);
                created.push(id);
            }
        }
        created
    }

    /// Build sub-regions inside the listed regions.
    fn fill_sub_regions(map: &mut GameMap, regions: &[RegionId]) {
        let mut visited = Tilemap::new_with(map.width(), map.height(), false);

        for &region_id in regions {
            let Some(region) = map.region(region_id) else { continue };
            let tiles = region.tiles.clone();

            for (x, y) in tiles {
                if *visited.get(x, y) {
                    continue;
                }
                let sub_type = map.tile(x, y).sub_type;
                let members = flood_fill(map, (x, y), &mut visited, |(nx, ny)| {
                    let tile = map.tile(nx, ny);
                    tile.region == Some(region_id) && tile.sub_type == sub_type
                });

                let id = map.regions.next_sub_region_id();
                for &(tx, ty) in &members {
                    map.tile_mut(tx, ty).sub_region = Some(id);
                }
                map.regions.insert_sub_region(build_sub_region(id, region_id, sub_type, members));
            }
        }
    }
}

impl RegionAnalyzer for FloodFillRegionAnalyzer {
    fn assign_regions(&self, map: &mut GameMap) {
        map.regions.clear();
        for (_, _, tile) in map.tiles.iter_mut() {
            tile.region = None;
            tile.sub_region = None;
        }
        let everything = Tilemap::new_with(map.width(), map.height(), true);
        let created = Self::fill_regions(map, &everything);
        debug!(regions = created.len(), "regions assigned");
    }

    fn assign_sub_regions(&self, map: &mut GameMap) {
        let stale: Vec<SubRegionId> = map.regions.sub_regions().map(|s| s.id).collect();
        for id in stale {
            map.regions.remove_sub_region(id);
        }
        for (_, _, tile) in map.tiles.iter_mut() {
            tile.sub_region = None;
        }
        let regions: Vec<RegionId> = map.regions.regions().map(|r| r.id).collect();
        Self::fill_sub_regions(map, &regions);
        debug!(sub_regions = map.regions.sub_region_count(), "sub-regions assigned");
    }

    fn set_enclosed_outside_areas_as_mountain(&self, map: &mut GameMap) -> Vec<Vec<GridPoint>> {
        let mut visited = Tilemap::new_with(map.width(), map.height(), false);
        let mut enclosed = Vec::new();

        for y in 0..map.height() {
            for x in 0..map.width() {
                if *visited.get(x, y) || map.tile(x, y).tile_type != TileType::Outside {
                    continue;
                }
                let area = flood_fill(map, (x, y), &mut visited, |(nx, ny)| {
                    map.tile(nx, ny).tile_type == TileType::Outside
                });
                if area.iter().any(|&(ax, ay)| map.tiles.is_border(ax, ay)) {
                    continue;
                }
                for &(ax, ay) in &area {
                    map.tile_mut(ax, ay).set_tile_type(TileType::Mountain);
                }
                enclosed.push(area);
            }
        }
        debug!(pockets = enclosed.len(), "enclosed outdoor pockets filled");
        enclosed
    }

    fn assign_regions_in(&self, tiles: &[GridPoint], map: &mut GameMap) {
        let mut scope = Tilemap::new_with(map.width(), map.height(), false);
        let mut stale_regions = Vec::new();
        let mut stale_sub_regions = Vec::new();

        for &(x, y) in tiles {
            scope.set(x, y, true);
            let tile = map.tile_mut(x, y);
            stale_regions.extend(tile.region.take());
            stale_sub_regions.extend(tile.sub_region.take());
        }
        stale_regions.sort_unstable();
        stale_regions.dedup();
        stale_sub_regions.sort_unstable();
        stale_sub_regions.dedup();
        for id in stale_regions {
            map.regions.remove_region(id);
        }
        for id in stale_sub_regions {
            map.regions.remove_sub_region(id);
        }

        let created = Self::fill_regions(map, &scope);
        Self::fill_sub_regions(map, &created);
        debug!(tiles = tiles.len(), regions = created.len(), "regions re-analyzed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::Tile;

    /// Build a map from rows of `#` (mountain), `.` (outside), `~` (river), `c` (cave)
    fn map_from(rows: &[&str]) -> GameMap {
        let height = rows.len();
        let width = rows[0].len();
        let tiles = Tilemap::from_fn(width, height, |x, y| {
            let ch = rows[y].as_bytes()[x];
            let mut tile = Tile::new(
                match ch {
                    b'#' => TileType::Mountain,
                    b'c' => TileType::Cave,
                    _ => TileType::Outside,
                },
                0.5,
            );
            tile.river = ch == b'~';
            tile
        });
        GameMap::new(tiles)
    }

    #[test]
    fn test_regions_split_by_kind() {
        let mut map = map_from(&[
            "..##",
            "..##",
            "####",
            "#..#",
        ]);
        FloodFillRegionAnalyzer.assign_regions(&mut map);
        assert_eq!(map.regions.region_count(), 3);
        let corner = map.region_at(0, 0).unwrap();
        assert_eq!(corner.kind, RegionKind::Outside);
        assert_eq!(corner.size(), 4);
        assert_eq!(corner.edges(), vec![MapEdge::North, MapEdge::West]);
        let bottom = map.region_at(1, 3).unwrap();
        assert_eq!(bottom.edges(), vec![MapEdge::South]);
        assert_ne!(map.tile(0, 0).region, map.tile(1, 3).region);
    }

    #[test]
    fn test_enclosed_pockets_become_mountain() {
        let mut map = map_from(&[
            ".....",
            ".###.",
            ".#.#.",
            ".###.",
            ".....",
        ]);
        let pockets = FloodFillRegionAnalyzer.set_enclosed_outside_areas_as_mountain(&mut map);
        assert_eq!(pockets, vec![vec![(2, 2)]]);
        assert_eq!(map.tile(2, 2).tile_type, TileType::Mountain);
        assert_eq!(map.tile(0, 0).tile_type, TileType::Outside);
    }

    #[test]
    fn test_sub_regions_follow_sub_type() {
        let mut map = map_from(&[
            "....",
            "....",
        ]);
        map.tile_mut(0, 0).sub_type = SubType::Forest;
        map.tile_mut(1, 0).sub_type = SubType::Forest;
        FloodFillRegionAnalyzer.assign_regions(&mut map);
        FloodFillRegionAnalyzer.assign_sub_regions(&mut map);
        assert_eq!(map.regions.region_count(), 1);
        assert_eq!(map.regions.sub_region_count(), 2);
        let forest = map.sub_region(map.tile(0, 0).sub_region.unwrap()).unwrap();
        assert_eq!(forest.sub_type, SubType::Forest);
        assert_eq!(forest.size(), 2);
    }

    #[test]
    fn test_scoped_reanalysis_splits_region_around_river() {
        let mut map = map_from(&[
            ".....",
            ".....",
            ".....",
        ]);
        FloodFillRegionAnalyzer.assign_regions(&mut map);
        FloodFillRegionAnalyzer.assign_sub_regions(&mut map);
        let old = map.tile(0, 0).region.unwrap();
        let members = map.region(old).unwrap().tiles.clone();

        for y in 0..3 {
            map.tile_mut(2, y).river = true;
        }
        FloodFillRegionAnalyzer.assign_regions_in(&members, &mut map);

        assert!(map.region(old).is_none());
        assert_eq!(map.regions.region_count(), 3);
        assert_eq!(map.region_at(2, 1).unwrap().kind, RegionKind::River);
        assert_ne!(map.tile(0, 0).region, map.tile(4, 0).region);
        assert!(map.tiles.iter().all(|(_, _, t)| t.sub_region.is_some()));
    }
}
