use std::collections::HashMap;
use std::error::Error;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use super::types::MaterialId;

/// Number of tiles per row in the terrain atlas when materials are given as tile coordinates.
pub const DEFAULT_ATLAS_TILES: u16 = 16;

/// Normalized location of a sprite inside the terrain atlas.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct UvRect {
    pub min_u: f32,
    pub min_v: f32,
    pub max_u: f32,
    pub max_v: f32,
}

impl UvRect {
    pub const FULL: UvRect = UvRect {
        min_u: 0.0,
        min_v: 0.0,
        max_u: 1.0,
        max_v: 1.0,
    };

    pub fn from_tile(col: u16, row: u16, tiles: u16) -> Self {
        let step = 1.0 / tiles.max(1) as f32;
        UvRect {
            min_u: col as f32 * step,
            min_v: row as f32 * step,
            max_u: (col + 1) as f32 * step,
            max_v: (row + 1) as f32 * step,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Material {
    pub id: MaterialId,
    pub key: String,
    pub uv: UvRect,
}

#[derive(Clone, Debug)]
pub struct MaterialCatalog {
    pub materials: Vec<Material>,
    pub by_key: HashMap<String, MaterialId>,
}

impl Default for MaterialCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl MaterialCatalog {
    /// Creates a catalog holding only the sentinel material at id 0.
    pub fn new() -> Self {
        Self {
            materials: vec![Material {
                id: MaterialId(0),
                key: String::new(),
                uv: UvRect::FULL,
            }],
            by_key: HashMap::new(),
        }
    }

    pub fn get_id(&self, key: &str) -> Option<MaterialId> {
        self.by_key.get(key).copied()
    }

    pub fn get(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(id.0 as usize)
    }

    /// UV rect for `id`, the full atlas when unknown.
    pub fn uv(&self, id: MaterialId) -> UvRect {
        self.get(id).map(|m| m.uv).unwrap_or(UvRect::FULL)
    }

    pub fn from_toml_str(toml_str: &str) -> Result<Self, Box<dyn Error>> {
        let cfg: MaterialsConfig = toml::from_str(toml_str)?;
        let tiles = cfg.atlas_tiles.unwrap_or(DEFAULT_ATLAS_TILES);
        let mut catalog = MaterialCatalog::new();
        let mut entries: Vec<(String, MaterialEntry)> = cfg.materials.into_iter().collect();
        // HashMap iteration order is nondeterministic; sort keys so MaterialId assignment is stable.
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        for (key, entry) in entries {
            let uv = match entry {
                MaterialEntry::Rect([min_u, min_v, max_u, max_v]) => UvRect {
                    min_u,
                    min_v,
                    max_u,
                    max_v,
                },
                MaterialEntry::Tile { tile } => UvRect::from_tile(tile[0], tile[1], tiles),
            };
            let id = MaterialId(catalog.materials.len() as u16);
            catalog.by_key.insert(key.clone(), id);
            catalog.materials.push(Material { id, key, uv });
        }
        Ok(catalog)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let s = fs::read_to_string(path)?;
        Self::from_toml_str(&s)
    }
}

// --- Config ---

#[derive(Deserialize)]
pub struct MaterialsConfig {
    #[serde(default)]
    pub atlas_tiles: Option<u16>,
    pub materials: HashMap<String, MaterialEntry>,
}

#[derive(Deserialize)]
#[serde(untagged)]
pub enum MaterialEntry {
    // Explicit: stone = [min_u, min_v, max_u, max_v]
    Rect([f32; 4]),
    // Tiled: stone = { tile = [col, row] }
    Tile { tile: [u16; 2] },
}
