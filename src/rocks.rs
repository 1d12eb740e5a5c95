//! Rock composition: groups from noise and height bands, then one rock type
//! flood-filled across each contiguous same-group patch.

use std::collections::VecDeque;

use rand::Rng;
use tracing::debug;

use crate::catalog::Catalogs;
use crate::error::Result;
use crate::map::{GameMap, RockGroup};
use crate::noise_field::SimplexNoiseField;
use crate::tilemap::Tilemap;

/// Raw noise above this turns rock metamorphic
const METAMORPHIC_CUTOFF: f64 = 0.3;
/// Igneous/sedimentary split line is `IGNEOUS_LINE - noise` in normalized height
const IGNEOUS_LINE: f64 = 0.8;

/// Group for one roofed tile
pub fn rock_group_for(noise: f64, height: f32) -> RockGroup {
    if noise > METAMORPHIC_CUTOFF {
        RockGroup::Metamorphic
    } else if height as f64 > IGNEOUS_LINE - noise {
        RockGroup::Igneous
    } else {
        RockGroup::Sedimentary
    }
}

/// Assign a rock group to every roofed tile.
pub fn assign_rock_groups(map: &mut GameMap, noise: &SimplexNoiseField) {
    let mut counts = [0usize; 3];
    for (x, y, tile) in map.tiles.iter_mut() {
        if !tile.is_roofed() {
            continue;
        }
        let group = rock_group_for(noise.sample(x as f64, y as f64), tile.height);
        tile.set_rock_group(group);
        counts[group.index()] += 1;
    }
    debug!(
        igneous = counts[0],
        sedimentary = counts[1],
        metamorphic = counts[2],
        "rock groups assigned"
    );
}

/// Give every contiguous same-group patch of roofed tiles a single rock
/// type. Returns the number of patches stamped.
pub fn assign_rock_types<R: Rng>(map: &mut GameMap, catalogs: &Catalogs, rng: &mut R) -> Result<usize> {
    let mut queued = Tilemap::new_with(map.width(), map.height(), false);
    let mut patches = 0;

    for y in 0..map.height() {
        for x in 0..map.width() {
            let tile = map.tile(x, y);
            let Some(group) = tile.rock_group else { continue };
            if !tile.is_roofed() || tile.rock_type.is_some() {
                continue;
            }

            let rock_type = catalogs.pick_rock_type(group, rng)?;
            let mut queue = VecDeque::from([(x, y)]);
            queued.set(x, y, true);

            while let Some((cx, cy)) = queue.pop_front() {
                map.tile_mut(cx, cy).rock_type = Some(rock_type);
                for (nx, ny) in map.neighbors(cx, cy) {
                    let next = map.tile(nx, ny);
                    if *queued.get(nx, ny)
                        || !next.is_roofed()
                        || next.rock_group != Some(group)
                        || next.rock_type.is_some()
                    {
                        continue;
                    }
                    queued.set(nx, ny, true);
                    queue.push_back((nx, ny));
                }
            }
            patches += 1;
        }
    }
    debug!(patches, "rock types assigned");
    Ok(patches)
}
