use std::path::{Path, PathBuf};
use std::sync::Arc;

use nova_blocks::{BlockRegistry, FilterDef, FilterError, FilterSet};
use nova_gui::AtlasResolver;
use nova_runtime::RuntimeConfig;
use nova_sink::TextureAtlas;
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("filter: {0}")]
    Filter(#[from] FilterError),
    #[error("loading block registry: {source}")]
    Registry {
        #[source]
        source: Box<dyn std::error::Error>,
    },
    #[error("block registry has no `{0}`")]
    MissingBlock(String),
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RuntimeSection {
    pub workers: usize,
    pub log_every: usize,
}

impl Default for RuntimeSection {
    fn default() -> Self {
        let d = RuntimeConfig::default();
        Self {
            workers: d.workers,
            log_every: d.log_every,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SceneSection {
    /// Chunk columns on each side of the centre column.
    pub radius: i32,
    pub sections_y: i32,
    pub ground_height: i32,
}

impl Default for SceneSection {
    fn default() -> Self {
        Self {
            radius: 2,
            sections_y: 2,
            ground_height: 12,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GuiSection {
    pub white_texture: String,
    pub terrain: Vec<String>,
    pub gui: Vec<String>,
    pub font: Vec<String>,
}

impl Default for GuiSection {
    fn default() -> Self {
        Self {
            white_texture: "nova:white_gui".to_string(),
            terrain: Vec::new(),
            gui: vec!["gui/widgets".to_string()],
            font: vec!["font/ascii".to_string()],
        }
    }
}

/// Top-level `nova.toml`.
#[derive(Clone, Debug, Deserialize)]
pub struct NovaConfig {
    #[serde(default = "default_blocks")]
    pub blocks: PathBuf,
    #[serde(default = "default_materials")]
    pub materials: PathBuf,
    #[serde(default)]
    pub runtime: RuntimeSection,
    #[serde(default)]
    pub scene: SceneSection,
    #[serde(default, rename = "filter")]
    pub filters: Vec<FilterDef>,
    #[serde(default)]
    pub gui: GuiSection,
    /// Directory the file was loaded from; relative paths resolve against it.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

fn default_blocks() -> PathBuf {
    PathBuf::from("blocks.toml")
}

fn default_materials() -> PathBuf {
    PathBuf::from("materials.toml")
}

impl Default for NovaConfig {
    fn default() -> Self {
        Self {
            blocks: default_blocks(),
            materials: default_materials(),
            runtime: RuntimeSection::default(),
            scene: SceneSection::default(),
            filters: Vec::new(),
            gui: GuiSection::default(),
            base_dir: PathBuf::from("."),
        }
    }
}

impl NovaConfig {
    pub fn from_toml_str(s: &str, path: &Path) -> Result<Self, ConfigError> {
        let mut cfg: NovaConfig = toml::from_str(s).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        cfg.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Ok(cfg)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&s, path)
    }

    pub fn blocks_path(&self) -> PathBuf {
        self.base_dir.join(&self.blocks)
    }

    pub fn materials_path(&self) -> PathBuf {
        self.base_dir.join(&self.materials)
    }

    pub fn runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            workers: self.runtime.workers,
            log_every: self.runtime.log_every,
        }
    }

    /// Declared filters, or the stock set when none are declared.
    pub fn filter_set(&self) -> Result<FilterSet, ConfigError> {
        if self.filters.is_empty() {
            return Ok(FilterSet::defaults());
        }
        Ok(FilterSet::from_defs(&self.filters)?)
    }

    pub fn load_registry(&self) -> Result<BlockRegistry, ConfigError> {
        BlockRegistry::load_from_paths(self.materials_path(), self.blocks_path())
            .map_err(|source| ConfigError::Registry { source })
    }

    pub fn atlas_resolver(&self) -> AtlasResolver {
        let mut r = AtlasResolver::new(self.gui.white_texture.as_str().into());
        r.register(TextureAtlas::Terrain, &self.gui.terrain);
        r.register(TextureAtlas::Gui, &self.gui.gui);
        r.register(TextureAtlas::Font, &self.gui.font);
        r
    }
}

/// Re-reads only the `[[filter]]` list; used by the file watcher.
pub fn reload_filter_set(path: &Path) -> Result<Arc<FilterSet>, ConfigError> {
    let cfg = NovaConfig::load(path)?;
    Ok(Arc::new(cfg.filter_set()?))
}
