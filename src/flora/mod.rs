//! Flora placement shared by trees, shrubs and mushrooms.
//!
//! Every planter works one sub-region at a time:
//! 1. try 9 seed points on a 3x3 grid at quarter intervals of the bounds
//! 2. each placed plant goes on a work queue
//! 3. a popped parent spawns up to [`CHILDREN_PER_PARENT`] children, each
//!    found by trying offsets from a ring around the parent plus a 3x3 jitter
//!
//! A child that cannot be placed within the planter's attempt budget ends
//! that parent's spawning.

mod mushrooms;
mod shrubs;
mod trees;

pub use mushrooms::{spawn_mushrooms, MushroomSpawner};
pub use shrubs::{plant_shrubs, ShrubPlanter};
pub use trees::{plant_forests, TreePlanter};

use std::collections::VecDeque;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::map::{Bounds, GameMap};
use crate::tilemap::{GridPoint, ALL_OFFSETS};

/// Children a placed plant may spawn
pub const CHILDREN_PER_PARENT: usize = 3;

/// One kind of plant spreading through one sub-region
pub trait Planter {
    /// Offsets tried per child before the parent gives up
    const ATTEMPTS: usize;
    /// Distance of the ring children are spawned on
    const RING: i64;

    fn bounds(&self) -> Bounds;

    /// Whether a plant may go at `point`.
    fn allowed(&self, map: &GameMap, point: GridPoint) -> bool;

    fn place<R: Rng>(&mut self, map: &mut GameMap, point: GridPoint, rng: &mut R);

    /// Stop spreading early, e.g. once a quota is met.
    fn satisfied(&self) -> bool {
        false
    }
}

/// The 3x3 seed grid at quarter intervals of `bounds`
pub fn seed_points(bounds: &Bounds) -> Vec<GridPoint> {
    let (w, h) = (bounds.width(), bounds.height());
    let mut points = Vec::with_capacity(9);
    for j in 1..=3 {
        for i in 1..=3 {
            points.push((bounds.min_x + w * i / 4, bounds.min_y + h * j / 4));
        }
    }
    points
}

/// A ring offset scaled by `ring`, nudged by a random 3x3 jitter.
fn child_offset<R: Rng>(ring: i64, rng: &mut R) -> (i64, i64) {
    let (dx, dy) = ALL_OFFSETS.choose(rng).copied().unwrap_or((1, 0));
    (dx * ring + rng.gen_range(-1..=1), dy * ring + rng.gen_range(-1..=1))
}

/// Run the seed-and-spread loop for one planter. Returns plants placed.
pub fn spread<P: Planter, R: Rng>(planter: &mut P, map: &mut GameMap, rng: &mut R) -> usize {
    let mut queue = VecDeque::new();
    let mut placed = 0;

    for point in seed_points(&planter.bounds()) {
        if planter.satisfied() {
            return placed;
        }
        if planter.allowed(map, point) {
            planter.place(map, point, rng);
            queue.push_back(point);
            placed += 1;
        }
    }

    while let Some(parent) = queue.pop_front() {
        for _ in 0..CHILDREN_PER_PARENT {
            if planter.satisfied() {
                return placed;
            }
            let child = (0..P::ATTEMPTS).find_map(|_| {
                let offset = child_offset(P::RING, rng);
                map.tiles
                    .offset(parent, offset)
                    .filter(|&point| planter.allowed(map, point))
            });
            let Some(child) = child else { break };
            planter.place(map, child, rng);
            queue.push_back(child);
            placed += 1;
        }
    }
    placed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_points_at_quarters() {
        let bounds = Bounds {
            min_x: 10,
            min_y: 0,
            max_x: 17,
            max_y: 3,
        };
        let points = seed_points(&bounds);
        assert_eq!(points.len(), 9);
        assert_eq!(points[0], (12, 1));
        assert_eq!(points[4], (14, 2));
        assert_eq!(points[8], (16, 3));
    }

    #[test]
    fn test_child_offsets_stay_near_ring() {
        use rand::SeedableRng;
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(3);
        for _ in 0..100 {
            let (dx, dy) = child_offset(3, &mut rng);
            assert!(dx.abs() <= 4 && dy.abs() <= 4);
            assert!(dx.abs() >= 2 || dy.abs() >= 2);
        }
    }
}
