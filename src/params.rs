//! Generation parameters and their JSON configuration surface

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::catalog::Catalogs;
use crate::error::{MapGenError, Result};

/// Inclusive length range for a family of veins
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct VeinLength {
    pub min: usize,
    pub max: usize,
}

/// Tunable inputs of one generation run. Partial JSON overrides only the
/// fields it names.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationParameters {
    /// Target map width in tiles
    pub width: usize,
    /// Target map height in tiles
    pub height: usize,
    /// Initial midpoint perturbation (heights live in 0.0-1.0)
    pub height_map_variance: f32,
    /// Variance multiplier applied per doubling (0.0-1.0, lower = smoother)
    pub roughness: f32,
    /// Fraction of tiles that end up under a rock roof
    pub mountain_ratio: f32,
    /// Fraction of large-region mountain tiles tagged with ore
    pub ore_ratio: f32,
    pub ore_vein_length: VeinLength,
    /// Fraction of large-region mountain tiles tagged with gems
    pub gem_ratio: f32,
    pub gem_vein_length: VeinLength,
    /// Target fraction of each cave sub-region covered by mushrooms
    pub mushroom_ratio: f32,
    /// Chance that a placed shrub is a fruiting variety
    pub fruit_shrub_ratio: f32,
    pub catalogs: Catalogs,
}

impl Default for GenerationParameters {
    fn default() -> Self {
        Self {
            width: 128,
            height: 128,
            height_map_variance: 0.5,
            roughness: 0.55,
            mountain_ratio: 0.4,
            ore_ratio: 0.02,
            ore_vein_length: VeinLength { min: 3, max: 8 },
            gem_ratio: 0.004,
            gem_vein_length: VeinLength { min: 2, max: 4 },
            mushroom_ratio: 0.08,
            fruit_shrub_ratio: 0.3,
            catalogs: Catalogs::default(),
        }
    }
}

fn check_ratio(name: &'static str, value: f32) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(MapGenError::InvalidParameter {
            name,
            reason: format!("{value} is outside 0.0-1.0"),
        });
    }
    Ok(())
}

fn check_vein(name: &'static str, length: VeinLength) -> Result<()> {
    if length.min == 0 || length.min > length.max {
        return Err(MapGenError::InvalidParameter {
            name,
            reason: format!("need 1 <= min <= max, got {}..={}", length.min, length.max),
        });
    }
    Ok(())
}

impl GenerationParameters {
    /// Smallest map the pipeline accepts in either dimension
    pub const MIN_DIMENSION: usize = 8;

    pub fn with_size(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let params: Self = serde_json::from_str(json)?;
        params.validate()?;
        Ok(params)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("width", self.width), ("height", self.height)] {
            if value < Self::MIN_DIMENSION {
                return Err(MapGenError::InvalidParameter {
                    name,
                    reason: format!("{value} is below the minimum of {}", Self::MIN_DIMENSION),
                });
            }
        }
        if !(self.height_map_variance > 0.0) || !self.height_map_variance.is_finite() {
            return Err(MapGenError::InvalidParameter {
                name: "height_map_variance",
                reason: "must be a positive number".to_string(),
            });
        }
        if !(self.roughness > 0.0 && self.roughness < 1.0) {
            return Err(MapGenError::InvalidParameter {
                name: "roughness",
                reason: format!("{} is outside the open range 0.0-1.0", self.roughness),
            });
        }
        check_ratio("mountain_ratio", self.mountain_ratio)?;
        check_ratio("ore_ratio", self.ore_ratio)?;
        check_ratio("gem_ratio", self.gem_ratio)?;
        // Ore and gem never share a tile
        if self.ore_ratio + self.gem_ratio > 1.0 {
            return Err(MapGenError::InvalidParameter {
                name: "gem_ratio",
                reason: format!(
                    "ore_ratio {} plus gem_ratio {} exceeds 1.0",
                    self.ore_ratio, self.gem_ratio
                ),
            });
        }
        check_ratio("mushroom_ratio", self.mushroom_ratio)?;
        check_ratio("fruit_shrub_ratio", self.fruit_shrub_ratio)?;
        check_vein("ore_vein_length", self.ore_vein_length)?;
        check_vein("gem_vein_length", self.gem_vein_length)?;
        self.catalogs.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        GenerationParameters::default().validate().unwrap();
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let params = GenerationParameters::from_json_str(r#"{ "width": 64, "ore_ratio": 0.05 }"#).unwrap();
        assert_eq!(params.width, 64);
        assert_eq!(params.ore_ratio, 0.05);
        assert_eq!(params.height, GenerationParameters::default().height);
        assert_eq!(params.catalogs, Catalogs::default());
    }

    #[test]
    fn test_rejects_bad_ratio() {
        let params = GenerationParameters {
            mountain_ratio: 1.5,
            ..GenerationParameters::default()
        };
        assert!(matches!(
            params.validate(),
            Err(MapGenError::InvalidParameter { name: "mountain_ratio", .. })
        ));
    }

    #[test]
    fn test_rejects_deposit_ratios_over_one() {
        let params = GenerationParameters {
            ore_ratio: 0.6,
            gem_ratio: 0.6,
            ..GenerationParameters::default()
        };
        assert!(matches!(
            params.validate(),
            Err(MapGenError::InvalidParameter { name: "gem_ratio", .. })
        ));

        let params = GenerationParameters {
            ore_ratio: 0.5,
            gem_ratio: 0.5,
            ..GenerationParameters::default()
        };
        params.validate().unwrap();
    }

    #[test]
    fn test_rejects_inverted_vein_range() {
        let params = GenerationParameters {
            gem_vein_length: VeinLength { min: 5, max: 2 },
            ..GenerationParameters::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_rejects_tiny_maps() {
        assert!(GenerationParameters::with_size(4, 64).validate().is_err());
    }

    #[test]
    fn test_json_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.json");
        let params = GenerationParameters::with_size(40, 24);
        std::fs::write(&path, params.to_json_pretty().unwrap()).unwrap();
        assert_eq!(GenerationParameters::from_json_file(&path).unwrap(), params);
    }
}
