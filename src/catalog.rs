//! Weighted configuration catalogs (rocks, ores, gems, trees, shrubs, mushrooms)
//!
//! Catalogs are immutable input loaded once per run. Tiles refer to entries
//! by index newtypes so the grid stays `Copy`-friendly.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{MapGenError, Result};
use crate::map::RockGroup;

macro_rules! catalog_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub u16);

        impl $name {
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

catalog_id!(/// Index into [`Catalogs::rock_types`]
    RockTypeId);
catalog_id!(/// Index into [`Catalogs::ore_types`]
    OreTypeId);
catalog_id!(/// Index into [`Catalogs::gem_types`]
    GemTypeId);
catalog_id!(/// Index into [`Catalogs::tree_types`]
    TreeTypeId);
catalog_id!(/// Index into [`Catalogs::shrub_types`]
    ShrubTypeId);
catalog_id!(/// Index into [`Catalogs::mushroom_types`]
    MushroomTypeId);

/// Anything that can be drawn from a weighted catalog.
pub trait Weighted {
    fn weight(&self) -> f32;
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RockType {
    pub name: String,
    pub group: RockGroup,
    pub weight: f32,
}

/// An ore or gem deposit kind. An empty `host_groups` accepts any rock.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DepositType {
    pub name: String,
    pub weight: f32,
    #[serde(default)]
    pub host_groups: Vec<RockGroup>,
}

impl DepositType {
    pub fn accepts(&self, group: RockGroup) -> bool {
        self.host_groups.is_empty() || self.host_groups.contains(&group)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TreeType {
    pub name: String,
    pub weight: f32,
    /// Normalized vertical band of the map (0 = top row, 1 = bottom row) this tree grows in
    pub vertical_range: (f32, f32),
    /// Tiles of headroom the tree needs above its base
    pub sprite_height: usize,
}

impl TreeType {
    pub fn grows_at(&self, vertical_position: f32) -> bool {
        let (lo, hi) = self.vertical_range;
        vertical_position >= lo && vertical_position <= hi
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShrubType {
    pub name: String,
    pub weight: f32,
    pub fruiting: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MushroomType {
    pub name: String,
    pub weight: f32,
}

macro_rules! impl_weighted {
    ($($ty:ty),*) => {
        $(impl Weighted for $ty {
            fn weight(&self) -> f32 {
                self.weight
            }
        })*
    };
}

impl_weighted!(RockType, DepositType, TreeType, ShrubType, MushroomType);

/// Cumulative-weight draw over raw weights.
///
/// Non-positive weights are never chosen. Returns `None` when nothing can be
/// drawn. On an exact boundary the last positive candidate wins.
pub fn pick_weighted_index<R: Rng>(weights: &[f32], rng: &mut R) -> Option<usize> {
    let total: f32 = weights.iter().filter(|w| **w > 0.0).sum();
    if !(total > 0.0) {
        return None;
    }
    let mut draw = rng.gen::<f32>() * total;
    let mut last_positive = None;
    for (i, &w) in weights.iter().enumerate() {
        if w <= 0.0 {
            continue;
        }
        last_positive = Some(i);
        draw -= w;
        if draw <= 0.0 {
            return Some(i);
        }
    }
    last_positive
}

/// Draw one catalog index from `(index, entry)` candidates.
pub fn pick_weighted<'a, T, R>(
    candidates: impl IntoIterator<Item = (usize, &'a T)>,
    rng: &mut R,
) -> Option<usize>
where
    T: Weighted + 'a,
    R: Rng,
{
    let (indices, weights): (Vec<usize>, Vec<f32>) = candidates
        .into_iter()
        .map(|(i, entry)| (i, entry.weight()))
        .unzip();
    pick_weighted_index(&weights, rng).map(|i| indices[i])
}

/// All weighted catalogs for one run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Catalogs {
    pub rock_types: Vec<RockType>,
    pub ore_types: Vec<DepositType>,
    pub gem_types: Vec<DepositType>,
    pub tree_types: Vec<TreeType>,
    pub shrub_types: Vec<ShrubType>,
    pub mushroom_types: Vec<MushroomType>,
}

fn validate_weights<T: Weighted>(name: &'static str, entries: &[T]) -> Result<()> {
    if entries.is_empty() {
        return Err(MapGenError::EmptyCatalog(name));
    }
    if entries.iter().any(|e| !e.weight().is_finite() || e.weight() < 0.0) {
        return Err(MapGenError::InvalidParameter {
            name,
            reason: "weights must be finite and non-negative".to_string(),
        });
    }
    let total: f32 = entries.iter().map(Weighted::weight).sum();
    if total <= 0.0 {
        return Err(MapGenError::ZeroCatalogWeight(name));
    }
    Ok(())
}

impl Catalogs {
    /// Every catalog must be non-empty with a positive total weight.
    pub fn validate(&self) -> Result<()> {
        validate_weights("rock_types", &self.rock_types)?;
        validate_weights("ore_types", &self.ore_types)?;
        validate_weights("gem_types", &self.gem_types)?;
        validate_weights("tree_types", &self.tree_types)?;
        validate_weights("shrub_types", &self.shrub_types)?;
        validate_weights("mushroom_types", &self.mushroom_types)?;
        for tree in &self.tree_types {
            if tree.sprite_height == 0 {
                return Err(MapGenError::InvalidParameter {
                    name: "tree_types",
                    reason: format!("tree `{}` has a sprite height of zero", tree.name),
                });
            }
        }
        Ok(())
    }

    /// Weighted rock type for a group. Falls back to the whole catalog when no
    /// entry names the group.
    pub fn pick_rock_type<R: Rng>(&self, group: RockGroup, rng: &mut R) -> Result<RockTypeId> {
        let in_group = self
            .rock_types
            .iter()
            .enumerate()
            .filter(|(_, rock)| rock.group == group);
        let picked = match pick_weighted(in_group, rng) {
            Some(i) => Some(i),
            None => pick_weighted(self.rock_types.iter().enumerate(), rng),
        };
        picked
            .map(|i| RockTypeId(i as u16))
            .ok_or(MapGenError::EmptyCatalog("rock_types"))
    }

    pub fn rock_type(&self, id: RockTypeId) -> &RockType {
        &self.rock_types[id.index()]
    }

    pub fn tree_type(&self, id: TreeTypeId) -> &TreeType {
        &self.tree_types[id.index()]
    }

    /// Tallest tree in the catalog, used to bound spacing scans.
    pub fn max_tree_height(&self) -> usize {
        self.tree_types.iter().map(|t| t.sprite_height).max().unwrap_or(1)
    }
}

impl Default for Catalogs {
    fn default() -> Self {
        use RockGroup::*;

        let rock = |name: &str, group, weight| RockType { name: name.to_string(), group, weight };
        let deposit = |name: &str, weight, host_groups: &[RockGroup]| DepositType {
            name: name.to_string(),
            weight,
            host_groups: host_groups.to_vec(),
        };
        let tree = |name: &str, weight, lo, hi, sprite_height| TreeType {
            name: name.to_string(),
            weight,
            vertical_range: (lo, hi),
            sprite_height,
        };
        let shrub = |name: &str, weight, fruiting| ShrubType { name: name.to_string(), weight, fruiting };
        let mushroom = |name: &str, weight| MushroomType { name: name.to_string(), weight };

        Self {
            rock_types: vec![
                rock("granite", Igneous, 3.0),
                rock("basalt", Igneous, 2.0),
                rock("obsidian", Igneous, 0.5),
                rock("sandstone", Sedimentary, 3.0),
                rock("limestone", Sedimentary, 2.0),
                rock("shale", Sedimentary, 1.0),
                rock("marble", Metamorphic, 1.5),
                rock("slate", Metamorphic, 2.0),
                rock("quartzite", Metamorphic, 1.0),
            ],
            ore_types: vec![
                deposit("copper", 4.0, &[]),
                deposit("iron", 4.0, &[Igneous, Sedimentary]),
                deposit("coal", 3.0, &[Sedimentary]),
                deposit("silver", 1.5, &[Igneous, Metamorphic]),
                deposit("gold", 0.8, &[Igneous, Metamorphic]),
            ],
            gem_types: vec![
                deposit("quartz", 4.0, &[]),
                deposit("amethyst", 2.0, &[Igneous]),
                deposit("emerald", 1.0, &[Metamorphic]),
                deposit("ruby", 0.6, &[Metamorphic, Igneous]),
                deposit("opal", 0.8, &[Sedimentary]),
            ],
            tree_types: vec![
                tree("pine", 3.0, 0.0, 0.45, 3),
                tree("birch", 2.0, 0.0, 0.7, 2),
                tree("oak", 3.0, 0.3, 1.0, 2),
                tree("willow", 1.0, 0.55, 1.0, 2),
                tree("palm", 1.5, 0.75, 1.0, 3),
            ],
            shrub_types: vec![
                shrub("berry bush", 2.0, true),
                shrub("bramble", 1.0, true),
                shrub("fern", 2.0, false),
                shrub("thornbush", 1.0, false),
            ],
            mushroom_types: vec![
                mushroom("plump helmet", 3.0),
                mushroom("cave wheat", 2.0),
                mushroom("glowcap", 1.0),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_default_catalogs_validate() {
        Catalogs::default().validate().unwrap();
    }

    #[test]
    fn test_empty_catalog_is_rejected() {
        let mut catalogs = Catalogs::default();
        catalogs.gem_types.clear();
        assert!(matches!(catalogs.validate(), Err(MapGenError::EmptyCatalog("gem_types"))));
    }

    #[test]
    fn test_zero_weight_catalog_is_rejected() {
        let mut catalogs = Catalogs::default();
        for mushroom in &mut catalogs.mushroom_types {
            mushroom.weight = 0.0;
        }
        assert!(matches!(
            catalogs.validate(),
            Err(MapGenError::ZeroCatalogWeight("mushroom_types"))
        ));
    }

    #[test]
    fn test_pick_skips_zero_weights() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..200 {
            assert_eq!(pick_weighted_index(&[0.0, 2.0, 0.0], &mut rng), Some(1));
        }
        assert_eq!(pick_weighted_index(&[], &mut rng), None);
        assert_eq!(pick_weighted_index(&[0.0, 0.0], &mut rng), None);
    }

    #[test]
    fn test_pick_follows_weights() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut counts = [0usize; 2];
        for _ in 0..4000 {
            counts[pick_weighted_index(&[1.0, 3.0], &mut rng).unwrap()] += 1;
        }
        let ratio = counts[1] as f32 / counts[0] as f32;
        assert!(ratio > 2.5 && ratio < 3.5, "ratio was {ratio}");
    }

    #[test]
    fn test_rock_pick_respects_group() {
        let catalogs = Catalogs::default();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..100 {
            let id = catalogs.pick_rock_type(RockGroup::Metamorphic, &mut rng).unwrap();
            assert_eq!(catalogs.rock_type(id).group, RockGroup::Metamorphic);
        }
    }

    #[test]
    fn test_rock_pick_falls_back_when_group_missing() {
        let catalogs = Catalogs {
            rock_types: vec![RockType {
                name: "granite".to_string(),
                group: RockGroup::Igneous,
                weight: 1.0,
            }],
            ..Catalogs::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let id = catalogs.pick_rock_type(RockGroup::Sedimentary, &mut rng).unwrap();
        assert_eq!(id, RockTypeId(0));
    }
}
