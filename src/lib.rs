//! Colony map generation library
//!
//! Turns a seed and a set of [`GenerationParameters`] into a populated 2D
//! tile map: terrain, caves, rock composition, a river, ore and gem veins,
//! and flora. Generation is steppable through [`MapGenerator`].

pub mod ascii;
pub mod catalog;
pub mod error;
pub mod flora;
pub mod fractal;
pub mod generator;
pub mod heightfield;
pub mod logging;
pub mod map;
pub mod map_export;
pub mod noise_field;
pub mod ore;
pub mod params;
pub mod regions;
pub mod river;
pub mod rocks;
pub mod smoothing;
pub mod tilemap;
pub mod vein;

pub use error::{MapGenError, Result};
pub use generator::{GenerationStep, MapGenerator, MapStage};
pub use map::{GameMap, MapStats, Tile, TileType};
pub use params::GenerationParameters;
