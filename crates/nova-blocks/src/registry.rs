use std::collections::HashMap;
use std::error::Error;
use std::fs;
use std::path::Path;

use thiserror::Error;

use super::config::BlocksConfig;
use super::material::MaterialCatalog;
use super::types::{Block, BlockId, BlockState, BlockType, MaterialId};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("block id {id} is used by both `{first}` and `{second}`")]
    DuplicateId {
        id: BlockId,
        first: String,
        second: String,
    },
    #[error("block name `{0}` is defined twice")]
    DuplicateName(String),
    #[error("block id 0 is reserved for air, found `{0}`")]
    AirIdTaken(String),
}

#[derive(Clone, Debug)]
pub struct BlockRegistry {
    pub materials: MaterialCatalog,
    /// Dense table indexed by block id; holes are `None`.
    pub blocks: Vec<Option<BlockType>>,
    pub by_name: HashMap<String, BlockId>,
}

impl Default for BlockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn air_type() -> BlockType {
    BlockType {
        id: 0,
        name: "air".to_string(),
        solid: false,
        transparent: true,
        cutout: false,
        emissive: false,
        material: MaterialId(0),
    }
}

impl BlockRegistry {
    /// Registry containing only air.
    pub fn new() -> Self {
        Self {
            materials: MaterialCatalog::new(),
            blocks: vec![Some(air_type())],
            by_name: HashMap::from([("air".to_string(), 0)]),
        }
    }

    #[inline]
    pub fn get(&self, id: BlockId) -> Option<&BlockType> {
        self.blocks.get(id as usize).and_then(|b| b.as_ref())
    }

    pub fn id_by_name(&self, name: &str) -> Option<BlockId> {
        self.by_name.get(name).copied()
    }

    /// Resolves a stored block to the state view filters and renderers consume.
    /// Unknown ids resolve to `None`.
    #[inline]
    pub fn state(&self, block: Block) -> Option<BlockState<'_>> {
        self.get(block.id).map(|ty| BlockState::new(ty, block.damage))
    }

    pub fn len(&self) -> usize {
        self.blocks.iter().filter(|b| b.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &BlockType> {
        self.blocks.iter().filter_map(|b| b.as_ref())
    }

    pub fn load_from_paths(
        materials_path: impl AsRef<Path>,
        blocks_path: impl AsRef<Path>,
    ) -> Result<Self, Box<dyn Error>> {
        let materials = MaterialCatalog::from_path(materials_path)?;
        let blocks_toml = fs::read_to_string(blocks_path)?;
        let blocks_cfg: BlocksConfig = toml::from_str(&blocks_toml)?;
        Ok(Self::from_configs(materials, blocks_cfg)?)
    }

    pub fn from_toml_strs(materials: &str, blocks: &str) -> Result<Self, Box<dyn Error>> {
        let materials = MaterialCatalog::from_toml_str(materials)?;
        let blocks_cfg: BlocksConfig = toml::from_str(blocks)?;
        Ok(Self::from_configs(materials, blocks_cfg)?)
    }

    pub fn from_configs(
        materials: MaterialCatalog,
        cfg: BlocksConfig,
    ) -> Result<Self, RegistryError> {
        let mut reg = BlockRegistry {
            materials,
            ..BlockRegistry::new()
        };
        // Ids not given explicitly continue after the highest id seen so far.
        let mut next_id: BlockId = 1;
        for def in cfg.blocks.into_iter() {
            if def.name == "air" {
                continue;
            }
            let id = match def.id {
                Some(0) => return Err(RegistryError::AirIdTaken(def.name)),
                Some(id) => id,
                None => next_id,
            };
            next_id = next_id.max(id.saturating_add(1));
            if reg.by_name.contains_key(&def.name) {
                return Err(RegistryError::DuplicateName(def.name));
            }
            if let Some(existing) = reg.get(id) {
                return Err(RegistryError::DuplicateId {
                    id,
                    first: existing.name.clone(),
                    second: def.name,
                });
            }
            let solid = def.solid.unwrap_or(true);
            let material = def
                .material
                .as_deref()
                .and_then(|k| reg.materials.get_id(k))
                .or_else(|| reg.materials.get_id(&def.name))
                .unwrap_or(MaterialId(0));
            let ty = BlockType {
                id,
                name: def.name,
                solid,
                transparent: def.transparent.unwrap_or(!solid),
                cutout: def.cutout.unwrap_or(false),
                emissive: def.emissive.unwrap_or(false),
                material,
            };
            if reg.blocks.len() <= id as usize {
                reg.blocks.resize(id as usize + 1, None);
            }
            reg.by_name.insert(ty.name.clone(), id);
            reg.blocks[id as usize] = Some(ty);
        }
        log::debug!(
            "block registry: {} types, {} materials",
            reg.len(),
            reg.materials.materials.len()
        );
        Ok(reg)
    }
}
