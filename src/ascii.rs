//! ASCII rendering and export for generated maps
//!
//! Provides functions to render a [`GameMap`] as text and export it to a file.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use chrono::Local;

use crate::error::Result;
use crate::map::{GameMap, RockGroup, SubType, Tile, TileType};

/// ASCII rendering modes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AsciiMode {
    /// Terrain, flora, river and deposits
    Terrain,
    /// Rock group of every roofed tile
    Rock,
    /// Elevation gradient
    Height,
}

impl AsciiMode {
    pub fn name(&self) -> &'static str {
        match self {
            AsciiMode::Terrain => "Terrain",
            AsciiMode::Rock => "Rock",
            AsciiMode::Height => "Height",
        }
    }

    pub fn all() -> &'static [AsciiMode] {
        &[AsciiMode::Terrain, AsciiMode::Rock, AsciiMode::Height]
    }
}

/// Terrain character for a tile. Occupants win over the ground beneath them.
pub fn tile_char(tile: &Tile) -> char {
    if tile.river {
        return '~';
    }
    if tile.gem.is_some() {
        return '*';
    }
    if tile.ore.is_some() {
        return '$';
    }
    if tile.tree.is_some() {
        return 'T';
    }
    if tile.shrub.is_some() {
        return 'b';
    }
    if tile.mushroom.is_some() {
        return 'm';
    }
    match (tile.tile_type, tile.sub_type) {
        (TileType::Mountain, _) => '#',
        (TileType::Cave, SubType::LoamFloor) => ',',
        (TileType::Cave, _) => '_',
        (TileType::Outside, SubType::Forest) => '"',
        (TileType::Outside, _) => '.',
    }
}

/// Rock group character; open sky is blank
pub fn rock_char(tile: &Tile) -> char {
    match tile.rock_group {
        Some(RockGroup::Igneous) => 'I',
        Some(RockGroup::Sedimentary) => 'S',
        Some(RockGroup::Metamorphic) => 'M',
        None => ' ',
    }
}

/// Get ASCII character for a normalized height
pub fn height_char(height: f32) -> char {
    const RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];
    let idx = ((height.clamp(0.0, 1.0) * (RAMP.len() - 1) as f32).round()) as usize;
    RAMP[idx.min(RAMP.len() - 1)]
}

/// Render the map one character per tile, one line per row
pub fn render_ascii(map: &GameMap, mode: AsciiMode) -> String {
    let mut result = String::with_capacity((map.width() + 1) * map.height());
    for y in 0..map.height() {
        for x in 0..map.width() {
            let tile = map.tile(x, y);
            let ch = match mode {
                AsciiMode::Terrain => tile_char(tile),
                AsciiMode::Rock => rock_char(tile),
                AsciiMode::Height => height_char(tile.height),
            };
            result.push(ch);
        }
        result.push('\n');
    }
    result
}

/// Generate legend for terrain characters
pub fn legend() -> String {
    let mut legend = String::new();
    legend.push_str("=== LEGEND ===\n");
    legend.push_str("  . Grassland   \" Forest      # Mountain\n");
    legend.push_str("  _ Cave floor  , Loamy floor  ~ River\n");
    legend.push_str("  T Tree        b Shrub       m Mushroom\n");
    legend.push_str("  $ Ore         * Gem\n");
    legend
}

/// Write the map, legend and statistics to a text file
pub fn export_ascii(map: &GameMap, seed: u64, path: impl AsRef<Path>) -> Result<()> {
    let mut file = File::create(path.as_ref())?;
    let stats = map.stats();
    let total = map.area().max(1) as f64;

    // Header
    writeln!(file, "=== COLONY MAP ===")?;
    writeln!(file, "Seed: {}", seed)?;
    writeln!(file, "Size: {}x{}", map.width(), map.height())?;
    writeln!(file, "Generated: {}", Local::now().format("%Y-%m-%d %H:%M:%S"))?;
    writeln!(file)?;

    writeln!(file, "=== MAP (Terrain View) ===")?;
    write!(file, "{}", render_ascii(map, AsciiMode::Terrain))?;
    writeln!(file)?;
    write!(file, "{}", legend())?;
    writeln!(file)?;

    writeln!(file, "=== MAP (Rock View) ===")?;
    write!(file, "{}", render_ascii(map, AsciiMode::Rock))?;
    writeln!(file)?;

    writeln!(file, "=== STATISTICS ===")?;
    for (name, count) in [
        ("Outside", stats.outside_tiles),
        ("Mountain", stats.mountain_tiles),
        ("Cave", stats.cave_tiles),
        ("River", stats.river_tiles),
        ("Forest", stats.forest_tiles),
        ("Loam", stats.loam_tiles),
    ] {
        writeln!(file, "  {:10} {:>6} ({:>5.1}%)", name, count, 100.0 * count as f64 / total)?;
    }
    writeln!(
        file,
        "Trees: {}  Shrubs: {}  Mushrooms: {}",
        stats.trees, stats.shrubs, stats.mushrooms
    )?;
    writeln!(file, "Ore tiles: {}  Gem tiles: {}", stats.ore_tiles, stats.gem_tiles)?;
    writeln!(file, "Regions: {}  Sub-regions: {}", stats.regions, stats.sub_regions)?;

    Ok(())
}

/// Print ASCII map to stdout
pub fn print_ascii(map: &GameMap, mode: AsciiMode) {
    print!("{}", render_ascii(map, mode));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::OreTypeId;
    use crate::tilemap::Tilemap;

    fn sample_map() -> GameMap {
        let mut tiles = Tilemap::new_with(3, 2, Tile::new(TileType::Outside, 0.0));
        tiles.set(1, 0, Tile::new(TileType::Mountain, 1.0));
        tiles.get_mut(1, 0).set_rock_group(RockGroup::Igneous);
        tiles.get_mut(2, 0).river = true;
        tiles.set(0, 1, Tile::new(TileType::Cave, 0.8));
        tiles.get_mut(2, 1).ore = Some(OreTypeId(0));
        GameMap::new(tiles)
    }

    #[test]
    fn test_render_terrain() {
        assert_eq!(render_ascii(&sample_map(), AsciiMode::Terrain), ".#~\n_.$\n");
    }

    #[test]
    fn test_render_rock_and_height() {
        let map = sample_map();
        assert_eq!(render_ascii(&map, AsciiMode::Rock), " I \n   \n");
        assert_eq!(height_char(0.0), ' ');
        assert_eq!(height_char(1.0), '@');
    }

    #[test]
    fn test_export_writes_header_and_map() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map.txt");
        export_ascii(&sample_map(), 42, &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("=== COLONY MAP ===\nSeed: 42\nSize: 3x2\nGenerated: "));
        assert!(text.contains(".#~\n_.$\n"));
        assert!(text.contains("Ore tiles: 1"));
    }
}
