//! Cellular-automata smoothing passes.
//!
//! Every pass reads one buffer and writes the other, then the buffers swap.
//! No cell ever sees a neighbor that was already updated in the same pass.
//!
//! Rule (birth/death limits of 4 in every pass):
//! - alive cell survives with `n >= death_limit` alive neighbors
//! - dead cell is born with `n > birth_limit` alive neighbors
//!
//! Neighbors off the map are not counted.

use crate::map::{GameMap, RockGroup, SubType, TileType};
use crate::tilemap::{Tilemap, ALL_OFFSETS, DIAGONAL_OFFSETS, ORTHOGONAL_OFFSETS};

/// Wall/outside smoothing passes after discretization
pub const WALL_PASSES: usize = 5;
/// Cave smoothing passes after carving
pub const CAVE_PASSES: usize = 6;
/// Forest/grassland smoothing passes
pub const SUB_REGION_PASSES: usize = 4;
/// Rock-group smoothing passes
pub const ROCK_GROUP_PASSES: usize = 4;
/// River widening passes
pub const RIVER_GROWTH_PASSES: usize = 2;

/// Birth/death rule over a boolean grid
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellularAutomaton {
    pub death_limit: usize,
    pub birth_limit: usize,
}

impl Default for CellularAutomaton {
    fn default() -> Self {
        Self {
            death_limit: 4,
            birth_limit: 4,
        }
    }
}

impl CellularAutomaton {
    pub fn next_state(&self, alive: bool, alive_neighbors: usize) -> bool {
        if alive {
            alive_neighbors >= self.death_limit
        } else {
            alive_neighbors > self.birth_limit
        }
    }

    /// One pass from `current` into `next`. Cells outside `mask` are copied unchanged.
    pub fn step(&self, current: &Tilemap<bool>, next: &mut Tilemap<bool>, mask: Option<&Tilemap<bool>>) {
        for y in 0..current.height {
            for x in 0..current.width {
                let alive = *current.get(x, y);
                let in_mask = mask.map_or(true, |m| *m.get(x, y));
                let state = if in_mask {
                    let n = current.count_neighbors_8(x, y, |&v| v);
                    self.next_state(alive, n)
                } else {
                    alive
                };
                next.set(x, y, state);
            }
        }
    }

    /// Run `passes` passes with a double buffer and return the final grid.
    pub fn run(&self, cells: Tilemap<bool>, passes: usize, mask: Option<&Tilemap<bool>>) -> Tilemap<bool> {
        let mut current = cells;
        let mut next = current.clone();
        for _ in 0..passes {
            self.step(&current, &mut next, mask);
            std::mem::swap(&mut current, &mut next);
        }
        current
    }
}

/// Roofed/outside smoothing over the whole map, followed by the corner fix.
pub fn smooth_walls(map: &mut GameMap, passes: usize) {
    let cells = Tilemap::from_fn(map.width(), map.height(), |x, y| map.tile(x, y).is_roofed());
    let smoothed = CellularAutomaton::default().run(cells, passes, None);

    for (x, y, &roofed) in smoothed.iter() {
        let tile = map.tile_mut(x, y);
        if roofed != tile.is_roofed() {
            tile.set_tile_type(if roofed { TileType::Mountain } else { TileType::Outside });
        }
    }
    fix_corners(map);
}

/// Corner tiles only have 3 neighbors, so the rule always kills them.
/// Each corner instead follows its two edge neighbors when they agree.
pub fn fix_corners(map: &mut GameMap) {
    let (w, h) = (map.width(), map.height());
    let corners = [
        ((0, 0), (1, 0), (0, 1)),
        ((w - 1, 0), (w - 2, 0), (w - 1, 1)),
        ((0, h - 1), (1, h - 1), (0, h - 2)),
        ((w - 1, h - 1), (w - 2, h - 1), (w - 1, h - 2)),
    ];
    for ((cx, cy), (ax, ay), (bx, by)) in corners {
        let a = map.tile(ax, ay).is_roofed();
        let b = map.tile(bx, by).is_roofed();
        if a == b && map.tile(cx, cy).is_roofed() != a {
            map.tile_mut(cx, cy)
                .set_tile_type(if a { TileType::Mountain } else { TileType::Outside });
        }
    }
}

/// Cave smoothing inside `candidates`; alive means solid rock, dead means cave floor.
pub fn smooth_caves(map: &mut GameMap, candidates: &Tilemap<bool>, passes: usize) {
    let cells = Tilemap::from_fn(map.width(), map.height(), |x, y| {
        map.tile(x, y).tile_type != TileType::Cave
    });
    let smoothed = CellularAutomaton::default().run(cells, passes, Some(candidates));

    for (x, y, &solid) in smoothed.iter() {
        if !*candidates.get(x, y) {
            continue;
        }
        let tile = map.tile_mut(x, y);
        let wanted = if solid { TileType::Mountain } else { TileType::Cave };
        if tile.tile_type != wanted {
            let group = tile.rock_group;
            tile.set_tile_type(wanted);
            tile.rock_group = group;
        }
    }
}

/// Forest/grassland smoothing over outdoor tiles; alive means forest.
pub fn smooth_sub_regions(map: &mut GameMap, passes: usize) {
    let outdoor = Tilemap::from_fn(map.width(), map.height(), |x, y| {
        map.tile(x, y).tile_type == TileType::Outside
    });
    let cells = Tilemap::from_fn(map.width(), map.height(), |x, y| {
        map.tile(x, y).sub_type == SubType::Forest
    });
    let smoothed = CellularAutomaton::default().run(cells, passes, Some(&outdoor));

    for (x, y, &forest) in smoothed.iter() {
        if *outdoor.get(x, y) {
            map.tile_mut(x, y).sub_type = if forest { SubType::Forest } else { SubType::Grassland };
        }
    }
}

/// Multi-class version of the rule over roofed tiles: a tile keeps its group
/// with at least `death_limit` same-group neighbors, otherwise switches to the
/// most common neighbor group when that group has more than `birth_limit`.
pub fn smooth_rock_groups(map: &mut GameMap, passes: usize) {
    let rule = CellularAutomaton::default();
    let mut current = Tilemap::from_fn(map.width(), map.height(), |x, y| map.tile(x, y).rock_group);
    let mut next = current.clone();

    for _ in 0..passes {
        for y in 0..current.height {
            for x in 0..current.width {
                let Some(group) = *current.get(x, y) else {
                    next.set(x, y, None);
                    continue;
                };
                let mut counts = [0usize; 3];
                for &(dx, dy) in &ALL_OFFSETS {
                    if let Some(Some(g)) = current.get_checked(x as i64 + dx, y as i64 + dy) {
                        counts[g.index()] += 1;
                    }
                }
                let mut chosen = group;
                if counts[group.index()] < rule.death_limit {
                    let best = RockGroup::ALL
                        .into_iter()
                        .filter(|g| *g != group)
                        .max_by_key(|g| counts[g.index()]);
                    if let Some(best) = best {
                        if counts[best.index()] > rule.birth_limit {
                            chosen = best;
                        }
                    }
                }
                next.set(x, y, Some(chosen));
            }
        }
        std::mem::swap(&mut current, &mut next);
    }

    for (x, y, group) in current.iter() {
        if let Some(group) = group {
            map.tile_mut(x, y).set_rock_group(*group);
        }
    }
}

/// One river growth pass. An outdoor, non-river tile joins the river with at
/// least 2 orthogonal river neighbors, or exactly 1 orthogonal and at least
/// 2 diagonal ones. Returns the number of tiles added.
pub fn grow_river(map: &mut GameMap) -> usize {
    let river = Tilemap::from_fn(map.width(), map.height(), |x, y| map.tile(x, y).river);
    let count = |x: usize, y: usize, offsets: &[(i64, i64)]| {
        offsets
            .iter()
            .filter(|&&(dx, dy)| river.get_checked(x as i64 + dx, y as i64 + dy) == Some(&true))
            .count()
    };

    let mut added = 0;
    for y in 0..map.height() {
        for x in 0..map.width() {
            if !map.tile(x, y).is_open_ground() {
                continue;
            }
            let orthogonal = count(x, y, &ORTHOGONAL_OFFSETS);
            let diagonal = count(x, y, &DIAGONAL_OFFSETS);
            if orthogonal >= 2 || (orthogonal == 1 && diagonal >= 2) {
                let tile = map.tile_mut(x, y);
                tile.river = true;
                tile.tree = None;
                tile.shrub = None;
                added += 1;
            }
        }
    }
    added
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::Tile;

    #[test]
    fn test_rule_limits() {
        let rule = CellularAutomaton::default();
        assert!(rule.next_state(true, 4));
        assert!(!rule.next_state(true, 3));
        assert!(!rule.next_state(false, 4));
        assert!(rule.next_state(false, 5));
    }

    #[test]
    fn test_isolated_cell_dies_and_hole_fills() {
        let mut cells = Tilemap::new_with(7, 7, false);
        cells.set(1, 1, true);
        for y in 3..7 {
            for x in 3..7 {
                cells.set(x, y, true);
            }
        }
        cells.set(5, 5, false);
        let result = CellularAutomaton::default().run(cells, 1, None);
        assert!(!*result.get(1, 1));
        assert!(*result.get(5, 5));
    }

    #[test]
    fn test_full_block_loses_corners() {
        let cells = Tilemap::new_with(3, 3, true);
        let result = CellularAutomaton::default().run(cells, 1, None);
        assert!(!*result.get(0, 0));
        assert!(!*result.get(2, 2));
        assert!(*result.get(1, 0));
        assert!(*result.get(1, 1));
        assert_eq!(result.count_set(), 5);
    }

    #[test]
    fn test_mask_freezes_cells() {
        let cells = Tilemap::new_with(4, 4, true);
        let mut mask = Tilemap::new_with(4, 4, false);
        mask.set(1, 1, true);
        let result = CellularAutomaton::default().run(cells, 3, Some(&mask));
        assert_eq!(result.count_set(), 16);
    }

    #[test]
    fn test_corner_follows_agreeing_edges() {
        let mut map = GameMap::new(Tilemap::new_with(4, 4, Tile::new(TileType::Mountain, 1.0)));
        map.tile_mut(0, 0).set_tile_type(TileType::Outside);
        fix_corners(&mut map);
        assert_eq!(map.tile(0, 0).tile_type, TileType::Mountain);
    }

    #[test]
    fn test_river_growth_rule() {
        let mut map = GameMap::new(Tilemap::new_with(5, 5, Tile::new(TileType::Outside, 0.0)));
        map.tile_mut(1, 2).river = true;
        map.tile_mut(3, 2).river = true;
        map.tile_mut(1, 1).river = true;
        map.tile_mut(3, 3).river = true;
        // (2,2): orthogonal (1,2) and (3,2) -> joins
        // (2,1): orthogonal (1,1); diagonal (1,2), (3,2) -> joins
        // (0,0): diagonal (1,1) only -> stays dry
        let added = grow_river(&mut map);
        assert!(map.tile(2, 2).river);
        assert!(map.tile(2, 1).river);
        assert!(!map.tile(0, 0).river);
        assert!(added >= 2);
    }

    #[test]
    fn test_river_does_not_grow_into_rock() {
        let mut map = GameMap::new(Tilemap::new_with(3, 3, Tile::new(TileType::Mountain, 1.0)));
        map.tile_mut(0, 1).set_tile_type(TileType::Outside);
        map.tile_mut(0, 1).river = true;
        map.tile_mut(2, 1).set_tile_type(TileType::Outside);
        map.tile_mut(2, 1).river = true;
        grow_river(&mut map);
        assert!(!map.tile(1, 1).river);
    }

    #[test]
    fn test_rock_group_islands_are_absorbed() {
        let mut map = GameMap::new(Tilemap::new_with(5, 5, Tile::new(TileType::Mountain, 1.0)));
        for (_, _, tile) in map.tiles.iter_mut() {
            tile.set_rock_group(RockGroup::Igneous);
        }
        map.tile_mut(2, 2).set_rock_group(RockGroup::Metamorphic);
        smooth_rock_groups(&mut map, 1);
        assert_eq!(map.tile(2, 2).rock_group, Some(RockGroup::Igneous));
    }
}
