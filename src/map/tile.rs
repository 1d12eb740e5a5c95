//! Per-tile records of the generated map.

use serde::{Deserialize, Serialize};

use crate::catalog::{GemTypeId, MushroomTypeId, OreTypeId, RockTypeId, ShrubTypeId, TreeTypeId};
use super::region::{RegionId, SubRegionId};

/// Elevation-derived classification of a tile
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TileType {
    /// Open sky
    #[default]
    Outside,
    /// Solid rock
    Mountain,
    /// Open floor under a rock roof
    Cave,
}

impl TileType {
    /// Mountain and cave tiles sit under rock and carry rock composition.
    pub fn is_roofed(self) -> bool {
        matches!(self, TileType::Mountain | TileType::Cave)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            TileType::Outside => "Outside",
            TileType::Mountain => "Mountain",
            TileType::Cave => "Cave",
        }
    }
}

/// Finer classification inside a tile type
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SubType {
    /// Solid rock has no floor
    #[default]
    None,
    Grassland,
    Forest,
    StoneFloor,
    LoamFloor,
}

impl SubType {
    pub fn display_name(&self) -> &'static str {
        match self {
            SubType::None => "None",
            SubType::Grassland => "Grassland",
            SubType::Forest => "Forest",
            SubType::StoneFloor => "Stone floor",
            SubType::LoamFloor => "Loamy floor",
        }
    }
}

/// Coarse rock family; each family has its own rock types in the catalog
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RockGroup {
    Igneous,
    Sedimentary,
    Metamorphic,
}

impl RockGroup {
    pub const ALL: [RockGroup; 3] = [RockGroup::Igneous, RockGroup::Sedimentary, RockGroup::Metamorphic];

    pub fn index(self) -> usize {
        match self {
            RockGroup::Igneous => 0,
            RockGroup::Sedimentary => 1,
            RockGroup::Metamorphic => 2,
        }
    }
}

/// A single tile of the generated map
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    pub tile_type: TileType,
    pub sub_type: SubType,
    /// Normalized elevation (0.0-1.0) from the heightfield
    pub height: f32,
    pub rock_group: Option<RockGroup>,
    pub rock_type: Option<RockTypeId>,
    pub ore: Option<OreTypeId>,
    pub gem: Option<GemTypeId>,
    pub tree: Option<TreeTypeId>,
    pub shrub: Option<ShrubTypeId>,
    pub mushroom: Option<MushroomTypeId>,
    pub river: bool,
    pub region: Option<RegionId>,
    pub sub_region: Option<SubRegionId>,
}

impl Tile {
    pub fn new(tile_type: TileType, height: f32) -> Self {
        let sub_type = match tile_type {
            TileType::Outside => SubType::Grassland,
            TileType::Mountain => SubType::None,
            TileType::Cave => SubType::StoneFloor,
        };
        Self {
            tile_type,
            sub_type,
            height,
            ..Self::default()
        }
    }

    pub fn is_roofed(&self) -> bool {
        self.tile_type.is_roofed()
    }

    /// Change the tile type, resetting the sub-type and dropping rock
    /// composition when the tile loses its roof.
    pub fn set_tile_type(&mut self, tile_type: TileType) {
        if self.tile_type == tile_type {
            return;
        }
        *self = Tile::new(tile_type, self.height);
    }

    /// Rock group only sticks to roofed tiles.
    pub fn set_rock_group(&mut self, group: RockGroup) {
        if self.is_roofed() {
            self.rock_group = Some(group);
        }
    }

    /// Open outdoor ground that can take a river, tree, or shrub
    pub fn is_open_ground(&self) -> bool {
        self.tile_type == TileType::Outside && !self.river
    }

    pub fn has_plant(&self) -> bool {
        self.tree.is_some() || self.shrub.is_some()
    }
}
