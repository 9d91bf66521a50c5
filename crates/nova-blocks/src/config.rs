use serde::Deserialize;

// Top-level blocks config file
#[derive(Deserialize, Debug, Default)]
pub struct BlocksConfig {
    pub blocks: Vec<BlockDef>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct BlockDef {
    pub name: String,
    #[serde(default)]
    pub id: Option<u16>,
    #[serde(default)]
    pub solid: Option<bool>,
    #[serde(default)]
    pub transparent: Option<bool>,
    #[serde(default)]
    pub cutout: Option<bool>,
    #[serde(default)]
    pub emissive: Option<bool>,
    // Material key in the catalog; falls back to the block name, then to the sentinel
    #[serde(default)]
    pub material: Option<String>,
}
