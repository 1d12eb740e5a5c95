//! Region and sub-region records.
//!
//! Tiles point at these by id. The table is rebuilt by the region analyzer;
//! generation stages only read it.

use serde::{Deserialize, Serialize};

use crate::tilemap::GridPoint;
use super::tile::{SubType, TileType};

/// Region identifier, an index into [`RegionTable`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegionId(pub u32);

/// Sub-region identifier, an index into [`RegionTable`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubRegionId(pub u32);

/// Map border a region can touch
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MapEdge {
    North,
    East,
    South,
    West,
}

impl MapEdge {
    pub const ALL: [MapEdge; 4] = [MapEdge::North, MapEdge::East, MapEdge::South, MapEdge::West];

    pub fn index(self) -> usize {
        match self {
            MapEdge::North => 0,
            MapEdge::East => 1,
            MapEdge::South => 2,
            MapEdge::West => 3,
        }
    }

    pub fn opposite(self) -> MapEdge {
        match self {
            MapEdge::North => MapEdge::South,
            MapEdge::East => MapEdge::West,
            MapEdge::South => MapEdge::North,
            MapEdge::West => MapEdge::East,
        }
    }

    /// North/south edges run along x; east/west edges run along y.
    pub fn runs_along_x(self) -> bool {
        matches!(self, MapEdge::North | MapEdge::South)
    }
}

/// What a region groups together
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegionKind {
    Outside,
    River,
    Mountain,
    Cave,
}

impl RegionKind {
    pub fn of(tile_type: TileType, river: bool) -> Self {
        match tile_type {
            TileType::Outside if river => RegionKind::River,
            TileType::Outside => RegionKind::Outside,
            TileType::Mountain => RegionKind::Mountain,
            TileType::Cave => RegionKind::Cave,
        }
    }
}

/// Inclusive bounding box
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: usize,
    pub min_y: usize,
    pub max_x: usize,
    pub max_y: usize,
}

impl Bounds {
    pub fn empty() -> Self {
        Self {
            min_x: usize::MAX,
            min_y: usize::MAX,
            max_x: 0,
            max_y: 0,
        }
    }

    pub fn include(&mut self, (x, y): GridPoint) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    pub fn width(&self) -> usize {
        if self.max_x >= self.min_x {
            self.max_x - self.min_x + 1
        } else {
            0
        }
    }

    pub fn height(&self) -> usize {
        if self.max_y >= self.min_y {
            self.max_y - self.min_y + 1
        } else {
            0
        }
    }

    pub fn contains(&self, (x, y): GridPoint) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }
}

/// A maximal orthogonally-connected group of tiles of one [`RegionKind`]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MapRegion {
    pub id: RegionId,
    pub kind: RegionKind,
    pub tiles: Vec<GridPoint>,
    pub bounds: Bounds,
    /// Border tiles per edge, indexed by [`MapEdge::index`]
    pub edge_tiles: [Vec<GridPoint>; 4],
}

impl MapRegion {
    pub fn size(&self) -> usize {
        self.tiles.len()
    }

    /// Edges this region touches, in N/E/S/W order
    pub fn edges(&self) -> Vec<MapEdge> {
        MapEdge::ALL
            .into_iter()
            .filter(|edge| !self.edge_tiles[edge.index()].is_empty())
            .collect()
    }

    pub fn edge_tiles(&self, edge: MapEdge) -> &[GridPoint] {
        &self.edge_tiles[edge.index()]
    }

    /// Total tiles on the map border (a corner tile counts once per edge)
    pub fn border_tile_count(&self) -> usize {
        self.edge_tiles.iter().map(Vec::len).sum()
    }
}

/// A connected group of same-[`SubType`] tiles inside one region
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MapSubRegion {
    pub id: SubRegionId,
    pub region: RegionId,
    pub sub_type: SubType,
    pub tiles: Vec<GridPoint>,
    pub bounds: Bounds,
}

impl MapSubRegion {
    pub fn size(&self) -> usize {
        self.tiles.len()
    }

    /// Vertical position of the bounding-box center, 0 at the top row and 1 at the bottom
    pub fn vertical_position(&self, map_height: usize) -> f32 {
        if map_height <= 1 {
            return 0.0;
        }
        let center = (self.bounds.min_y + self.bounds.max_y) as f32 / 2.0;
        center / (map_height - 1) as f32
    }
}

/// Side table of region and sub-region records. Discarded records leave a
/// `None` slot so ids stay stable.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionTable {
    regions: Vec<Option<MapRegion>>,
    sub_regions: Vec<Option<MapSubRegion>>,
}

impl RegionTable {
    pub fn clear(&mut self) {
        self.regions.clear();
        self.sub_regions.clear();
    }

    pub fn next_region_id(&self) -> RegionId {
        RegionId(self.regions.len() as u32)
    }

    pub fn next_sub_region_id(&self) -> SubRegionId {
        SubRegionId(self.sub_regions.len() as u32)
    }

    pub fn insert_region(&mut self, region: MapRegion) {
        debug_assert_eq!(region.id, self.next_region_id());
        self.regions.push(Some(region));
    }

    pub fn insert_sub_region(&mut self, sub_region: MapSubRegion) {
        debug_assert_eq!(sub_region.id, self.next_sub_region_id());
        self.sub_regions.push(Some(sub_region));
    }

    pub fn region(&self, id: RegionId) -> Option<&MapRegion> {
        self.regions.get(id.0 as usize).and_then(Option::as_ref)
    }

    pub fn sub_region(&self, id: SubRegionId) -> Option<&MapSubRegion> {
        self.sub_regions.get(id.0 as usize).and_then(Option::as_ref)
    }

    pub fn remove_region(&mut self, id: RegionId) -> Option<MapRegion> {
        self.regions.get_mut(id.0 as usize).and_then(Option::take)
    }

    pub fn remove_sub_region(&mut self, id: SubRegionId) -> Option<MapSubRegion> {
        self.sub_regions.get_mut(id.0 as usize).and_then(Option::take)
    }

    /// Live regions in id order
    pub fn regions(&self) -> impl Iterator<Item = &MapRegion> {
        self.regions.iter().flatten()
    }

    /// Live sub-regions in id order
    pub fn sub_regions(&self) -> impl Iterator<Item = &MapSubRegion> {
        self.sub_regions.iter().flatten()
    }

    pub fn region_count(&self) -> usize {
        self.regions().count()
    }

    pub fn sub_region_count(&self) -> usize {
        self.sub_regions().count()
    }
}
