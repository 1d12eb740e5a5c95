//! River generation: pick an outdoor region that touches at least two map
//! edges, route a path between points on two of those edges, and carve it.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::map::{GameMap, MapEdge, MapRegion, RegionId, RegionKind, TileType};
use crate::noise_field::SimplexNoiseField;
use crate::regions::RegionAnalyzer;
use crate::tilemap::{GridPoint, Tilemap, ALL_OFFSETS};

/// Share of an edge span skipped at each end when picking river endpoints
pub const EDGE_TRIM: f32 = 0.1;
/// Neighborhood searched around each endpoint for extra border river tiles
pub const ENDPOINT_RADIUS: usize = 3;

/// The carved river, in carve order
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RiverPath {
    pub path: Vec<GridPoint>,
    /// Inflow points on the map border
    pub starts: Vec<GridPoint>,
    /// Outflow points on the map border
    pub ends: Vec<GridPoint>,
}

/// Route-finding collaborator. An empty path means no route exists.
pub trait RiverPathfinder {
    fn find_path(&self, map: &GameMap, start: GridPoint, end: GridPoint) -> Vec<GridPoint>;
}

#[derive(Debug, Clone, Copy)]
struct PathNode {
    x: usize,
    y: usize,
    /// Cost so far plus the heuristic
    priority: f32,
}

impl PartialEq for PathNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PathNode {}

impl PartialOrd for PathNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PathNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap, ties broken by position for determinism
        other
            .priority
            .total_cmp(&self.priority)
            .then_with(|| (other.y, other.x).cmp(&(self.y, self.x)))
    }
}

/// 8-connected A* over outdoor tiles. Step costs are scaled by coherent
/// noise so the cheapest route wanders instead of running straight.
pub struct MeanderingPathfinder {
    noise: SimplexNoiseField,
    meander: f32,
}

impl MeanderingPathfinder {
    /// Feature size of the meander field, in tiles
    const FEATURE_SCALE: f64 = 12.0;

    pub fn new<R: Rng>(rng: &mut R) -> Self {
        Self {
            noise: SimplexNoiseField::new(rng.gen(), Self::FEATURE_SCALE, 3, 0.5),
            meander: 4.0,
        }
    }

    /// A pathfinder with no noise term: plain shortest paths.
    pub fn straight() -> Self {
        Self {
            noise: SimplexNoiseField::new(0, Self::FEATURE_SCALE, 1, 0.5),
            meander: 0.0,
        }
    }

    fn passable(map: &GameMap, x: usize, y: usize) -> bool {
        map.tile(x, y).tile_type == TileType::Outside
    }

    fn step_cost(&self, x: usize, y: usize, diagonal: bool) -> f32 {
        let base = if diagonal { std::f32::consts::SQRT_2 } else { 1.0 };
        base * (1.0 + self.meander * self.noise.sample_unit(x as f64, y as f64))
    }

    /// Octile distance; never overestimates since every step costs at least its base.
    fn heuristic((x, y): GridPoint, (ex, ey): GridPoint) -> f32 {
        let dx = x.abs_diff(ex) as f32;
        let dy = y.abs_diff(ey) as f32;
        dx.max(dy) + (std::f32::consts::SQRT_2 - 1.0) * dx.min(dy)
    }
}

impl RiverPathfinder for MeanderingPathfinder {
    fn find_path(&self, map: &GameMap, start: GridPoint, end: GridPoint) -> Vec<GridPoint> {
        if !Self::passable(map, start.0, start.1) || !Self::passable(map, end.0, end.1) {
            return Vec::new();
        }
        let mut cost = Tilemap::new_with(map.width(), map.height(), f32::INFINITY);
        let mut came_from: Tilemap<Option<GridPoint>> = Tilemap::new(map.width(), map.height());
        let mut closed = Tilemap::new_with(map.width(), map.height(), false);
        let mut open = BinaryHeap::new();

        cost.set(start.0, start.1, 0.0);
        open.push(PathNode { x: start.0, y: start.1, priority: Self::heuristic(start, end) });

        while let Some(PathNode { x, y, .. }) = open.pop() {
            if (x, y) == end {
                let mut path = vec![end];
                let mut current = end;
                while let Some(prev) = *came_from.get(current.0, current.1) {
                    path.push(prev);
                    current = prev;
                }
                path.reverse();
                return path;
            }
            if *closed.get(x, y) {
                continue;
            }
            closed.set(x, y, true);

            let here = *cost.get(x, y);
            for &(dx, dy) in &ALL_OFFSETS {
                let Some((nx, ny)) = map.tiles.offset((x, y), (dx, dy)) else { continue };
                if *closed.get(nx, ny) || !Self::passable(map, nx, ny) {
                    continue;
                }
                let next = here + self.step_cost(nx, ny, dx != 0 && dy != 0);
                if next < *cost.get(nx, ny) {
                    cost.set(nx, ny, next);
                    came_from.set(nx, ny, Some((x, y)));
                    open.push(PathNode {
                        x: nx,
                        y: ny,
                        priority: next + Self::heuristic((nx, ny), end),
                    });
                }
            }
        }
        Vec::new()
    }
}

/// Outdoor region touching the most map edges (ties: most border tiles).
/// Needs at least two edges.
pub fn select_river_region(map: &GameMap) -> Option<&MapRegion> {
    map.regions
        .regions()
        .filter(|r| r.kind == RegionKind::Outside && r.edges().len() >= 2)
        .max_by(|a, b| {
            a.edges()
                .len()
                .cmp(&b.edges().len())
                .then(a.border_tile_count().cmp(&b.border_tile_count()))
                // Lowest id wins a full tie
                .then(b.id.cmp(&a.id))
        })
}

/// Two distinct edges of `region`, opposite ones when possible.
pub fn choose_edges<R: Rng>(region: &MapRegion, rng: &mut R) -> Option<(MapEdge, MapEdge)> {
    let edges = region.edges();
    let opposite: Vec<(MapEdge, MapEdge)> = edges
        .iter()
        .filter(|e| matches!(e, MapEdge::North | MapEdge::West))
        .filter(|e| edges.contains(&e.opposite()))
        .map(|&e| (e, e.opposite()))
        .collect();
    if let Some(&(a, b)) = opposite.choose(rng) {
        return Some(if rng.gen_bool(0.5) { (a, b) } else { (b, a) });
    }
    let picked: Vec<MapEdge> = edges.choose_multiple(rng, 2).copied().collect();
    match picked.as_slice() {
        [a, b] => Some((*a, *b)),
        _ => None,
    }
}

/// Random border tile of `region` on `edge`, skipping [`EDGE_TRIM`] of the
/// span at each end so rivers do not start in a corner.
pub fn edge_point<R: Rng>(region: &MapRegion, edge: MapEdge, rng: &mut R) -> Option<GridPoint> {
    let mut span = region.edge_tiles(edge).to_vec();
    if edge.runs_along_x() {
        span.sort_unstable_by_key(|&(x, _)| x);
    } else {
        span.sort_unstable_by_key(|&(_, y)| y);
    }
    let trim = (span.len() as f32 * EDGE_TRIM) as usize;
    let trimmed = if span.len() > trim * 2 { &span[trim..span.len() - trim] } else { &span[..] };
    trimmed.choose(rng).copied()
}

/// Places the river on a map
pub struct RiverGenerator<'a> {
    pathfinder: &'a dyn RiverPathfinder,
}

impl<'a> RiverGenerator<'a> {
    pub fn new(pathfinder: &'a dyn RiverPathfinder) -> Self {
        Self { pathfinder }
    }

    /// One attempt at a river. Returns `false` when no river could be placed;
    /// the map is left untouched in that case.
    pub fn add_river<R: Rng>(&self, map: &mut GameMap, rng: &mut R) -> bool {
        let Some(region) = select_river_region(map) else {
            warn!("no outdoor region touches two map edges, skipping river");
            return false;
        };
        let region_id = region.id;
        let endpoints = choose_edges(region, rng).and_then(|(a, b)| {
            Some((edge_point(region, a, rng)?, edge_point(region, b, rng)?))
        });
        let Some((start, end)) = endpoints else {
            warn!(region = region_id.0, "no usable river endpoints");
            return false;
        };

        let path = self.pathfinder.find_path(map, start, end);
        if path.is_empty() {
            warn!(?start, ?end, "pathfinder found no river route");
            return false;
        }

        for &(x, y) in &path {
            let tile = map.tile_mut(x, y);
            tile.river = true;
            tile.tree = None;
            tile.shrub = None;
        }
        info!(?start, ?end, length = path.len(), "river carved");
        map.river = Some(RiverPath {
            path,
            starts: vec![start],
            ends: vec![end],
        });
        true
    }
}

/// Add every border river tile within `radius` of an endpoint to that
/// endpoint's set.
pub fn ensure_river_endpoints(map: &mut GameMap, radius: usize) {
    let Some(mut river) = map.river.take() else { return };
    let extend = |points: &mut Vec<GridPoint>| {
        let anchors = points.clone();
        for (ax, ay) in anchors {
            for y in ay.saturating_sub(radius)..=(ay + radius).min(map.height() - 1) {
                for x in ax.saturating_sub(radius)..=(ax + radius).min(map.width() - 1) {
                    if map.tile(x, y).river && map.tiles.is_border(x, y) && !points.contains(&(x, y)) {
                        points.push((x, y));
                    }
                }
            }
        }
    };
    extend(&mut river.starts);
    extend(&mut river.ends);
    debug!(starts = river.starts.len(), ends = river.ends.len(), "river endpoints extended");
    map.river = Some(river);
}

/// Rebuild the regions the river was carved through so river and bank
/// tiles get their own region records.
pub fn replace_river_region(analyzer: &dyn RegionAnalyzer, map: &mut GameMap) {
    let Some(river) = map.river.as_ref() else { return };
    let Some(&(sx, sy)) = river.starts.first() else { return };

    let mut stale: Vec<RegionId> = map.tile(sx, sy).region.into_iter().collect();
    for (_, _, tile) in map.tiles.iter() {
        if tile.river {
            stale.extend(tile.region);
        }
    }
    stale.sort_unstable();
    stale.dedup();

    let tiles: Vec<GridPoint> = stale
        .iter()
        .filter_map(|&id| map.region(id))
        .flat_map(|r| r.tiles.iter().copied())
        .collect();
    analyzer.assign_regions_in(&tiles, map);
    debug!(regions = stale.len(), tiles = tiles.len(), "river regions replaced");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::Tile;
    use crate::regions::FloodFillRegionAnalyzer;

    #[test]
    fn test_path_node_equality_matches_ordering() {
        let a = PathNode { x: 1, y: 2, priority: 3.0 };
        let b = PathNode { x: 4, y: 2, priority: 3.0 };
        assert_ne!(a, b);
        assert_ne!(a.cmp(&b), Ordering::Equal);
        assert_eq!(a, PathNode { x: 1, y: 2, priority: 3.0 });

        let mut open = BinaryHeap::new();
        open.push(PathNode { x: 0, y: 0, priority: 5.0 });
        open.push(b);
        open.push(a);
        // Lowest priority first, then lowest (y, x)
        assert_eq!(open.pop().map(|n| (n.x, n.y)), Some((1, 2)));
        assert_eq!(open.pop().map(|n| (n.x, n.y)), Some((4, 2)));
    }
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn open_map(width: usize, height: usize) -> GameMap {
        let mut map = GameMap::new(Tilemap::new_with(width, height, Tile::new(TileType::Outside, 0.1)));
        FloodFillRegionAnalyzer.assign_regions(&mut map);
        map
    }

    fn is_adjacent(a: GridPoint, b: GridPoint) -> bool {
        a != b && a.0.abs_diff(b.0) <= 1 && a.1.abs_diff(b.1) <= 1
    }

    #[test]
    fn test_straight_path_on_open_ground() {
        let map = open_map(10, 5);
        let path = MeanderingPathfinder::straight().find_path(&map, (0, 2), (9, 2));
        assert_eq!(path.len(), 10);
        assert_eq!(path.first(), Some(&(0, 2)));
        assert_eq!(path.last(), Some(&(9, 2)));
    }

    #[test]
    fn test_path_routes_around_rock() {
        let mut map = open_map(7, 7);
        for y in 0..6 {
            map.tile_mut(3, y).set_tile_type(TileType::Mountain);
        }
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let path = MeanderingPathfinder::new(&mut rng).find_path(&map, (0, 0), (6, 0));
        assert!(!path.is_empty());
        assert!(path.contains(&(3, 6)));
        assert!(path.windows(2).all(|w| is_adjacent(w[0], w[1])));
    }

    #[test]
    fn test_blocked_path_is_empty() {
        let mut map = open_map(6, 6);
        for y in 0..6 {
            map.tile_mut(2, y).set_tile_type(TileType::Mountain);
        }
        let path = MeanderingPathfinder::straight().find_path(&map, (0, 0), (5, 5));
        assert!(path.is_empty());
    }

    #[test]
    fn test_prefers_opposite_edges() {
        let map = open_map(12, 12);
        let region = select_river_region(&map).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        for _ in 0..10 {
            let (a, b) = choose_edges(region, &mut rng).unwrap();
            assert_eq!(a.opposite(), b);
        }
    }

    #[test]
    fn test_edge_points_skip_corners() {
        let map = open_map(20, 20);
        let region = select_river_region(&map).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        for _ in 0..30 {
            let (x, y) = edge_point(region, MapEdge::North, &mut rng).unwrap();
            assert_eq!(y, 0);
            assert!((2..18).contains(&x), "{x}");
        }
    }

    #[test]
    fn test_no_river_without_two_edges() {
        // Outdoor area only touches the west edge
        let mut map = open_map(8, 8);
        for (x, _, tile) in map.tiles.iter_mut() {
            if x > 2 {
                tile.set_tile_type(TileType::Mountain);
            }
        }
        for y in [0, 7] {
            for x in 0..3 {
                map.tile_mut(x, y).set_tile_type(TileType::Mountain);
            }
        }
        FloodFillRegionAnalyzer.assign_regions(&mut map);
        let pathfinder = MeanderingPathfinder::straight();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(!RiverGenerator::new(&pathfinder).add_river(&mut map, &mut rng));
        assert!(map.river.is_none());
        assert_eq!(map.count_tiles(|t| t.river), 0);
    }

    #[test]
    fn test_carved_river_crosses_the_map() {
        let mut map = open_map(16, 10);
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let pathfinder = MeanderingPathfinder::new(&mut rng);
        assert!(RiverGenerator::new(&pathfinder).add_river(&mut map, &mut rng));

        let river = map.river.clone().unwrap();
        assert!(river.path.windows(2).all(|w| is_adjacent(w[0], w[1])));
        let (sx, sy) = river.starts[0];
        let (ex, ey) = river.ends[0];
        assert!(map.tiles.is_border(sx, sy) && map.tiles.is_border(ex, ey));
        assert_eq!(map.count_tiles(|t| t.river), river.path.len());
    }

    #[test]
    fn test_endpoints_pick_up_border_river_tiles() {
        let mut map = open_map(10, 10);
        for x in 3..6 {
            map.tile_mut(x, 0).river = true;
        }
        map.river = Some(RiverPath {
            path: vec![(4, 0)],
            starts: vec![(4, 0)],
            ends: vec![],
        });
        ensure_river_endpoints(&mut map, ENDPOINT_RADIUS);
        let river = map.river.unwrap();
        assert_eq!(river.starts, vec![(4, 0), (3, 0), (5, 0)]);
    }

    #[test]
    fn test_replace_region_splits_banks() {
        let mut map = open_map(9, 9);
        for y in 0..9 {
            map.tile_mut(4, y).river = true;
        }
        map.river = Some(RiverPath {
            path: (0..9).map(|y| (4, y)).collect(),
            starts: vec![(4, 0)],
            ends: vec![(4, 8)],
        });
        replace_river_region(&FloodFillRegionAnalyzer, &mut map);

        assert_eq!(map.regions.region_count(), 3);
        let river_region = map.region_at(4, 4).unwrap();
        assert_eq!(river_region.kind, RegionKind::River);
        assert_ne!(map.tile(0, 0).region, map.tile(8, 0).region);
        assert!(map.tiles.iter().all(|(_, _, t)| t.region.is_some()));
    }
}
