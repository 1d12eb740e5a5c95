//! PNG export of generated maps
//!
//! Each tile becomes a `scale` x `scale` block. Colors follow tile type and
//! sub-type, tinted by rock group under a roof and shaded by elevation.
//! Occupants (river, flora, deposits) are drawn over the ground color.

use std::path::Path;

use image::{ImageBuffer, Rgb, RgbImage};
use tracing::info;

use crate::error::{MapGenError, Result};
use crate::map::{GameMap, RockGroup, SubType, Tile, TileType};

/// Blend two colors with a given ratio (0.0 = color a, 1.0 = color b)
fn blend_colors(a: (u8, u8, u8), b: (u8, u8, u8), ratio: f32) -> (u8, u8, u8) {
    let ratio = ratio.clamp(0.0, 1.0);
    let inv = 1.0 - ratio;
    (
        (a.0 as f32 * inv + b.0 as f32 * ratio) as u8,
        (a.1 as f32 * inv + b.1 as f32 * ratio) as u8,
        (a.2 as f32 * inv + b.2 as f32 * ratio) as u8,
    )
}

/// Darken or lighten by elevation (0.8 at the bottom, 1.1 at the top)
fn shade((r, g, b): (u8, u8, u8), height: f32) -> (u8, u8, u8) {
    let factor = 0.8 + height.clamp(0.0, 1.0) * 0.3;
    (
        (r as f32 * factor).clamp(0.0, 255.0) as u8,
        (g as f32 * factor).clamp(0.0, 255.0) as u8,
        (b as f32 * factor).clamp(0.0, 255.0) as u8,
    )
}

fn rock_color(group: Option<RockGroup>) -> (u8, u8, u8) {
    match group {
        Some(RockGroup::Igneous) => (96, 84, 88),
        Some(RockGroup::Sedimentary) => (150, 128, 96),
        Some(RockGroup::Metamorphic) => (112, 120, 136),
        None => (110, 110, 110),
    }
}

fn ground_color(tile: &Tile) -> (u8, u8, u8) {
    match (tile.tile_type, tile.sub_type) {
        (TileType::Mountain, _) => rock_color(tile.rock_group),
        (TileType::Cave, SubType::LoamFloor) => (92, 70, 48),
        (TileType::Cave, _) => blend_colors(rock_color(tile.rock_group), (40, 40, 44), 0.6),
        (TileType::Outside, SubType::Forest) => (70, 120, 60),
        (TileType::Outside, _) => (120, 160, 80),
    }
}

/// Final color of one tile
pub fn tile_color(tile: &Tile) -> (u8, u8, u8) {
    if tile.river {
        return (50, 110, 180);
    }
    let ground = shade(ground_color(tile), tile.height);
    if tile.gem.is_some() {
        (200, 60, 200)
    } else if tile.ore.is_some() {
        (210, 150, 40)
    } else if tile.tree.is_some() {
        blend_colors(ground, (20, 70, 25), 0.75)
    } else if tile.shrub.is_some() {
        blend_colors(ground, (60, 110, 40), 0.6)
    } else if tile.mushroom.is_some() {
        (180, 140, 170)
    } else {
        ground
    }
}

/// Render the map into an image, `scale` pixels per tile
pub fn render_image(map: &GameMap, scale: u32) -> RgbImage {
    let scale = scale.max(1);
    let mut img = ImageBuffer::new(map.width() as u32 * scale, map.height() as u32 * scale);
    for (x, y, tile) in map.tiles.iter() {
        let (r, g, b) = tile_color(tile);
        for py in 0..scale {
            for px in 0..scale {
                img.put_pixel(x as u32 * scale + px, y as u32 * scale + py, Rgb([r, g, b]));
            }
        }
    }
    img
}

/// Export the map as a PNG
pub fn export_png(map: &GameMap, path: impl AsRef<Path>, scale: u32) -> Result<()> {
    if scale == 0 {
        return Err(MapGenError::InvalidParameter {
            name: "png_scale",
            reason: "must be at least 1".to_string(),
        });
    }
    let path = path.as_ref();
    render_image(map, scale).save(path)?;
    info!(path = %path.display(), scale, "exported map image");
    Ok(())
}
