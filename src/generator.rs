//! Steppable map generation.
//!
//! [`MapGenerator`] runs the pipeline one bounded step per
//! [`process_next_step`](MapGenerator::process_next_step) call so a caller can
//! render progress between steps. A single seeded `ChaCha8Rng` is threaded
//! through every stage; the same seed and parameters always give the same map.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{MapGenError, Result};
use crate::flora::{plant_forests, plant_shrubs, spawn_mushrooms};
use crate::fractal::{FractalTerrainSynthesizer, VertexField};
use crate::heightfield::{HeightField, HeightfieldDiscretizer};
use crate::map::{GameMap, SubType, TileType};
use crate::noise_field::SimplexNoiseField;
use crate::ore::{DepositKind, MountainRegions, VeinPlacer};
use crate::params::GenerationParameters;
use crate::regions::{FloodFillRegionAnalyzer, RegionAnalyzer};
use crate::river::{
    ensure_river_endpoints, replace_river_region, MeanderingPathfinder, RiverGenerator, RiverPathfinder,
    ENDPOINT_RADIUS,
};
use crate::rocks::{assign_rock_groups, assign_rock_types};
use crate::smoothing::{
    grow_river, smooth_caves, smooth_rock_groups, smooth_sub_regions, smooth_walls, CAVE_PASSES,
    RIVER_GROWTH_PASSES, ROCK_GROUP_PASSES, SUB_REGION_PASSES, WALL_PASSES,
};
use crate::tilemap::{GridPoint, Tilemap};

/// Chance an enclosed-pocket tile starts as open cave before smoothing
const CAVE_SEED_CHANCE: f64 = 0.55;
/// Chance an outdoor tile starts as forest before smoothing
const FOREST_SEED_CHANCE: f64 = 0.5;

// ============================================================================
// Steps
// ============================================================================

/// Pipeline steps in execution order. `Finished` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GenerationStep {
    SeedVertices,
    GrowTerrain,
    Discretize,
    FillEnclosedAreas,
    SmoothWalls,
    CarveCaves,
    SmoothCaves,
    SmoothSubRegions,
    AssignRockGroups,
    SmoothRockGroups,
    AssignRegions,
    AssignRockTypes,
    AddRiver,
    GrowRiver,
    PlantForests,
    PlantShrubs,
    SpawnMushrooms,
    PlaceDeposits,
    Finished,
}

impl GenerationStep {
    pub const ALL: [GenerationStep; 19] = [
        GenerationStep::SeedVertices,
        GenerationStep::GrowTerrain,
        GenerationStep::Discretize,
        GenerationStep::FillEnclosedAreas,
        GenerationStep::SmoothWalls,
        GenerationStep::CarveCaves,
        GenerationStep::SmoothCaves,
        GenerationStep::SmoothSubRegions,
        GenerationStep::AssignRockGroups,
        GenerationStep::SmoothRockGroups,
        GenerationStep::AssignRegions,
        GenerationStep::AssignRockTypes,
        GenerationStep::AddRiver,
        GenerationStep::GrowRiver,
        GenerationStep::PlantForests,
        GenerationStep::PlantShrubs,
        GenerationStep::SpawnMushrooms,
        GenerationStep::PlaceDeposits,
        GenerationStep::Finished,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            GenerationStep::SeedVertices => "Seeding vertices",
            GenerationStep::GrowTerrain => "Growing terrain",
            GenerationStep::Discretize => "Discretizing heights",
            GenerationStep::FillEnclosedAreas => "Filling enclosed areas",
            GenerationStep::SmoothWalls => "Smoothing walls",
            GenerationStep::CarveCaves => "Carving caves",
            GenerationStep::SmoothCaves => "Smoothing caves",
            GenerationStep::SmoothSubRegions => "Growing forests",
            GenerationStep::AssignRockGroups => "Assigning rock groups",
            GenerationStep::SmoothRockGroups => "Smoothing rock groups",
            GenerationStep::AssignRegions => "Assigning regions",
            GenerationStep::AssignRockTypes => "Assigning rock types",
            GenerationStep::AddRiver => "Adding river",
            GenerationStep::GrowRiver => "Growing river",
            GenerationStep::PlantForests => "Planting forests",
            GenerationStep::PlantShrubs => "Planting shrubs",
            GenerationStep::SpawnMushrooms => "Spawning mushrooms",
            GenerationStep::PlaceDeposits => "Placing ore and gems",
            GenerationStep::Finished => "Finished",
        }
    }

    fn next(self) -> GenerationStep {
        Self::ALL
            .get(self.index() + 1)
            .copied()
            .unwrap_or(GenerationStep::Finished)
    }
}

// ============================================================================
// Stage
// ============================================================================

/// What the generator currently holds
#[derive(Clone, Debug, Default)]
pub enum MapStage {
    #[default]
    Empty,
    Vertices(VertexField),
    Tiles(GameMap),
}

impl MapStage {
    pub fn name(&self) -> &'static str {
        match self {
            MapStage::Empty => "empty",
            MapStage::Vertices(_) => "vertices",
            MapStage::Tiles(_) => "tiles",
        }
    }

    pub fn vertices(&self) -> Option<&VertexField> {
        match self {
            MapStage::Vertices(field) => Some(field),
            _ => None,
        }
    }

    pub fn map(&self) -> Option<&GameMap> {
        match self {
            MapStage::Tiles(map) => Some(map),
            _ => None,
        }
    }
}

// ============================================================================
// Generator
// ============================================================================

pub struct MapGenerator {
    params: GenerationParameters,
    rng: ChaCha8Rng,
    analyzer: Box<dyn RegionAnalyzer>,
    pathfinder: Box<dyn RiverPathfinder>,
    synthesizer: FractalTerrainSynthesizer,
    terrain_noise: SimplexNoiseField,
    rock_noise: SimplexNoiseField,
    stage: MapStage,
    step: GenerationStep,
    enclosed: Vec<Vec<GridPoint>>,
    cave_candidates: Option<Tilemap<bool>>,
}

impl MapGenerator {
    /// Generator with the built-in flood-fill analyzer and meandering pathfinder.
    pub fn new(params: GenerationParameters, seed: u64) -> Result<Self> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let terrain_noise = SimplexNoiseField::large_features(&mut rng);
        let rock_noise = SimplexNoiseField::large_features(&mut rng);
        let pathfinder = MeanderingPathfinder::new(&mut rng);
        Self::build(
            params,
            rng,
            Box::new(FloodFillRegionAnalyzer),
            Box::new(pathfinder),
            terrain_noise,
            rock_noise,
        )
    }

    /// Generator with caller-supplied region and river collaborators.
    pub fn with_collaborators(
        params: GenerationParameters,
        seed: u64,
        analyzer: Box<dyn RegionAnalyzer>,
        pathfinder: Box<dyn RiverPathfinder>,
    ) -> Result<Self> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let terrain_noise = SimplexNoiseField::large_features(&mut rng);
        let rock_noise = SimplexNoiseField::large_features(&mut rng);
        Self::build(params, rng, analyzer, pathfinder, terrain_noise, rock_noise)
    }

    fn build(
        params: GenerationParameters,
        rng: ChaCha8Rng,
        analyzer: Box<dyn RegionAnalyzer>,
        pathfinder: Box<dyn RiverPathfinder>,
        terrain_noise: SimplexNoiseField,
        rock_noise: SimplexNoiseField,
    ) -> Result<Self> {
        params.validate()?;
        let synthesizer = FractalTerrainSynthesizer::new(params.height_map_variance, params.roughness);
        Ok(Self {
            params,
            rng,
            analyzer,
            pathfinder,
            synthesizer,
            terrain_noise,
            rock_noise,
            stage: MapStage::Empty,
            step: GenerationStep::SeedVertices,
            enclosed: Vec::new(),
            cave_candidates: None,
        })
    }

    pub fn params(&self) -> &GenerationParameters {
        &self.params
    }

    /// The step the next [`process_next_step`](Self::process_next_step) call runs
    pub fn current_step(&self) -> GenerationStep {
        self.step
    }

    pub fn is_finished(&self) -> bool {
        self.step == GenerationStep::Finished
    }

    /// Fraction of steps completed, 0.0-1.0
    pub fn progress(&self) -> f32 {
        self.step.index() as f32 / GenerationStep::Finished.index() as f32
    }

    pub fn stage(&self) -> &MapStage {
        &self.stage
    }

    /// The tile map, once discretization has run
    pub fn map(&self) -> Option<&GameMap> {
        self.stage.map()
    }

    /// Take the finished map.
    pub fn into_map(self) -> Result<GameMap> {
        if !self.is_finished() {
            return Err(MapGenError::NotFinished(self.step));
        }
        match self.stage {
            MapStage::Tiles(map) => Ok(map),
            _ => Err(MapGenError::WrongStage {
                expected: "tiles",
                found: GenerationStep::Finished,
            }),
        }
    }

    /// Run every remaining step.
    pub fn complete_generation(&mut self) -> Result<()> {
        while !self.is_finished() {
            self.process_next_step()?;
        }
        Ok(())
    }

    /// Run one bounded unit of work and return the step that ran. The
    /// terrain growth step repeats until the field covers the target size.
    pub fn process_next_step(&mut self) -> Result<GenerationStep> {
        let step = self.step;
        match step {
            GenerationStep::Finished => return Err(MapGenError::AlreadyFinished),
            GenerationStep::SeedVertices => {
                self.stage = MapStage::Vertices(VertexField::seed(&mut self.rng));
                self.step = step.next();
            }
            GenerationStep::GrowTerrain => {
                let MapStage::Vertices(field) = &self.stage else {
                    return Err(MapGenError::WrongStage { expected: "vertices", found: step });
                };
                let grown = self.synthesizer.step(field, &mut self.rng);
                debug!(size = grown.size(), variance = self.synthesizer.variance(), "terrain grown");
                if grown.covers(self.params.width, self.params.height) {
                    self.step = step.next();
                }
                self.stage = MapStage::Vertices(grown);
            }
            GenerationStep::Discretize => {
                let MapStage::Vertices(field) = std::mem::take(&mut self.stage) else {
                    return Err(MapGenError::WrongStage { expected: "vertices", found: step });
                };
                let mut heights = HeightField::from_vertices(field).crop(self.params.width, self.params.height);
                heights.normalize();
                let map = HeightfieldDiscretizer::new(&self.terrain_noise, self.params.mountain_ratio)
                    .discretize(&heights);
                self.stage = MapStage::Tiles(map);
                self.step = step.next();
            }
            _ => {
                self.run_tile_step(step)?;
                self.step = step.next();
            }
        }
        info!(step = step.label(), index = step.index(), "generation step complete");
        if self.is_finished() {
            if let Some(map) = self.map() {
                info!(stats = ?map.stats(), "map generation finished");
            }
        }
        Ok(step)
    }

    fn run_tile_step(&mut self, step: GenerationStep) -> Result<()> {
        let MapStage::Tiles(map) = &mut self.stage else {
            return Err(MapGenError::WrongStage { expected: "tiles", found: step });
        };
        let rng = &mut self.rng;
        let params = &self.params;

        match step {
            GenerationStep::FillEnclosedAreas => {
                self.enclosed = self.analyzer.set_enclosed_outside_areas_as_mountain(map);
            }
            GenerationStep::SmoothWalls => smooth_walls(map, WALL_PASSES),
            GenerationStep::CarveCaves => {
                let mut candidates = Tilemap::new_with(map.width(), map.height(), false);
                for &(x, y) in self.enclosed.iter().flatten() {
                    if map.tile(x, y).tile_type != TileType::Mountain {
                        continue;
                    }
                    candidates.set(x, y, true);
                    if rng.gen_bool(CAVE_SEED_CHANCE) {
                        map.tile_mut(x, y).set_tile_type(TileType::Cave);
                    }
                }
                debug!(candidates = candidates.count_set(), "cave pockets seeded");
                self.cave_candidates = Some(candidates);
            }
            GenerationStep::SmoothCaves => {
                if let Some(candidates) = self.cave_candidates.take() {
                    smooth_caves(map, &candidates, CAVE_PASSES);
                }
            }
            GenerationStep::SmoothSubRegions => {
                for (_, _, tile) in map.tiles.iter_mut() {
                    if tile.tile_type == TileType::Outside {
                        tile.sub_type = if rng.gen_bool(FOREST_SEED_CHANCE) {
                            SubType::Forest
                        } else {
                            SubType::Grassland
                        };
                    }
                }
                smooth_sub_regions(map, SUB_REGION_PASSES);
            }
            GenerationStep::AssignRockGroups => assign_rock_groups(map, &self.rock_noise),
            GenerationStep::SmoothRockGroups => smooth_rock_groups(map, ROCK_GROUP_PASSES),
            GenerationStep::AssignRegions => {
                self.analyzer.assign_regions(map);
                self.analyzer.assign_sub_regions(map);
            }
            GenerationStep::AssignRockTypes => {
                assign_rock_types(map, &params.catalogs, rng)?;
            }
            GenerationStep::AddRiver => {
                RiverGenerator::new(self.pathfinder.as_ref()).add_river(map, rng);
            }
            GenerationStep::GrowRiver => {
                if map.river.is_some() {
                    let added: usize = (0..RIVER_GROWTH_PASSES).map(|_| grow_river(map)).sum();
                    debug!(added, "river widened");
                }
            }
            GenerationStep::PlantForests => {
                if map.river.is_some() {
                    ensure_river_endpoints(map, ENDPOINT_RADIUS);
                    replace_river_region(self.analyzer.as_ref(), map);
                }
                plant_forests(map, &params.catalogs, rng)?;
            }
            GenerationStep::PlantShrubs => {
                plant_shrubs(map, &params.catalogs, params.fruit_shrub_ratio, rng)?;
            }
            GenerationStep::SpawnMushrooms => {
                spawn_mushrooms(map, &params.catalogs, params.mushroom_ratio, rng)?;
            }
            GenerationStep::PlaceDeposits => {
                let regions = MountainRegions::collect(map);
                debug!(regions = regions.len(), tiles = regions.total_tiles(), "large mountain regions");
                VeinPlacer::new(DepositKind::Ore, &params.catalogs.ore_types, params.ore_ratio, params.ore_vein_length)
                    .place(map, &regions, rng)?;
                VeinPlacer::new(DepositKind::Gem, &params.catalogs.gem_types, params.gem_ratio, params.gem_vein_length)
                    .place(map, &regions, rng)?;
            }
            GenerationStep::SeedVertices | GenerationStep::GrowTerrain | GenerationStep::Discretize => {
                return Err(MapGenError::WrongStage { expected: "vertices", found: step });
            }
            GenerationStep::Finished => return Err(MapGenError::AlreadyFinished),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::GemTypeId;

    fn small_params() -> GenerationParameters {
        GenerationParameters::with_size(32, 24)
    }

    #[test]
    fn test_steps_are_ordered() {
        for (i, step) in GenerationStep::ALL.iter().enumerate() {
            assert_eq!(step.index(), i);
        }
        assert_eq!(GenerationStep::PlaceDeposits.next(), GenerationStep::Finished);
        assert_eq!(GenerationStep::Finished.next(), GenerationStep::Finished);
    }

    #[test]
    fn test_stages_advance() {
        let mut generator = MapGenerator::new(small_params(), 3).unwrap();
        assert!(matches!(generator.stage(), MapStage::Empty));
        generator.process_next_step().unwrap();
        assert!(generator.stage().vertices().is_some());
        while generator.current_step() != GenerationStep::FillEnclosedAreas {
            generator.process_next_step().unwrap();
        }
        let map = generator.map().unwrap();
        assert_eq!((map.width(), map.height()), (32, 24));
    }

    #[test]
    fn test_finished_generator_rejects_more_steps() {
        let mut generator = MapGenerator::new(small_params(), 7).unwrap();
        generator.complete_generation().unwrap();
        assert!(generator.is_finished());
        assert_eq!(generator.progress(), 1.0);
        assert!(matches!(generator.process_next_step(), Err(MapGenError::AlreadyFinished)));
    }

    #[test]
    fn test_unfinished_map_cannot_be_taken() {
        let generator = MapGenerator::new(small_params(), 1).unwrap();
        assert!(matches!(
            generator.into_map(),
            Err(MapGenError::NotFinished(GenerationStep::SeedVertices))
        ));
    }

    #[test]
    fn test_invalid_params_rejected_up_front() {
        let mut params = small_params();
        params.catalogs.rock_types.clear();
        assert!(matches!(
            MapGenerator::new(params, 0),
            Err(MapGenError::EmptyCatalog("rock_types"))
        ));
    }

    #[test]
    fn test_failed_deposit_step_resumes_without_restamping() {
        let params = GenerationParameters { ore_ratio: 0.1, ..small_params() };
        let mut generator = MapGenerator::new(params, 5).unwrap();
        while generator.current_step() != GenerationStep::PlaceDeposits {
            generator.process_next_step().unwrap();
        }

        let MapStage::Tiles(map) = &mut generator.stage else { panic!("expected tiles") };
        let required = MountainRegions::collect(map).required(0.1);
        assert!(required >= 2);
        // Leave fewer open mountain tiles than the ore quota needs
        let mut open = required / 2;
        for (_, _, tile) in map.tiles.iter_mut() {
            if tile.tile_type != TileType::Mountain {
                continue;
            }
            if open > 0 {
                open -= 1;
            } else {
                tile.gem = Some(GemTypeId(0));
            }
        }
        assert!(matches!(
            generator.process_next_step(),
            Err(MapGenError::QuotaUnreachable { deposit: "ore", .. })
        ));
        assert_eq!(generator.current_step(), GenerationStep::PlaceDeposits);

        let MapStage::Tiles(map) = &mut generator.stage else { panic!("expected tiles") };
        for (_, _, tile) in map.tiles.iter_mut() {
            tile.gem = None;
        }
        generator.process_next_step().unwrap();
        assert!(generator.is_finished());
        let map = generator.into_map().unwrap();
        assert_eq!(map.count_tiles(|t| t.ore.is_some()), required);
    }

    #[test]
    fn test_every_roofed_tile_has_rock() {
        let mut generator = MapGenerator::new(small_params(), 11).unwrap();
        generator.complete_generation().unwrap();
        let map = generator.into_map().unwrap();
        for (_, _, tile) in map.tiles.iter() {
            if tile.is_roofed() {
                assert!(tile.rock_group.is_some());
                assert!(tile.rock_type.is_some());
            }
        }
    }
}
