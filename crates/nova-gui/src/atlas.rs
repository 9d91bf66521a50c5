use std::fmt;
use std::str::FromStr;

use hashbrown::HashMap;
use nova_sink::TextureAtlas;

pub const DEFAULT_NAMESPACE: &str = "minecraft";

/// `namespace:path` texture identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceLocation {
    pub namespace: String,
    pub path: String,
}

impl ResourceLocation {
    pub fn new(namespace: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            path: path.into(),
        }
    }

    /// Path with any `textures/` prefix and `.png` suffix removed; the atlas key.
    pub fn atlas_key(&self) -> &str {
        let p = self.path.as_str();
        let p = p.strip_prefix("textures/").unwrap_or(p);
        p.strip_suffix(".png").unwrap_or(p)
    }
}

impl FromStr for ResourceLocation {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.split_once(':') {
            Some((ns, path)) => ResourceLocation::new(ns, path),
            None => ResourceLocation::new(DEFAULT_NAMESPACE, s),
        })
    }
}

impl From<&str> for ResourceLocation {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(loc) => loc,
            Err(never) => match never {},
        }
    }
}

impl fmt::Display for ResourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.path)
    }
}

/// Maps texture locations to the native atlas holding them.
#[derive(Clone, Debug)]
pub struct AtlasResolver {
    white_texture: ResourceLocation,
    /// namespace -> atlas key -> atlas
    by_key: HashMap<String, HashMap<String, TextureAtlas>>,
}

impl AtlasResolver {
    pub fn new(white_texture: ResourceLocation) -> Self {
        Self {
            white_texture,
            by_key: HashMap::new(),
        }
    }

    /// Registers sprite keys (`textures/` and `.png` optional) for `atlas`.
    /// Keys without a namespace belong to `minecraft`. A key already
    /// registered keeps its first atlas.
    pub fn register<I, S>(&mut self, atlas: TextureAtlas, keys: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for k in keys {
            let loc = ResourceLocation::from(k.as_ref());
            let key = loc.atlas_key().to_string();
            self.by_key
                .entry(loc.namespace)
                .or_default()
                .entry(key)
                .or_insert(atlas);
        }
    }

    pub fn white_texture(&self) -> &ResourceLocation {
        &self.white_texture
    }

    /// Unresolvable textures are `TextureAtlas::None`, never an error.
    pub fn resolve(&self, texture: &ResourceLocation) -> TextureAtlas {
        if *texture == self.white_texture {
            return TextureAtlas::Gui;
        }
        self.by_key
            .get(texture.namespace.as_str())
            .and_then(|keys| keys.get(texture.atlas_key()))
            .copied()
            .unwrap_or(TextureAtlas::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_strips_prefix_and_extension() {
        let mut r = AtlasResolver::new("nova:white".into());
        r.register(TextureAtlas::Gui, ["gui/widgets"]);
        r.register(TextureAtlas::Font, ["font/ascii.png"]);
        r.register(TextureAtlas::Terrain, ["blocks/stone", "gui/widgets"]);
        assert_eq!(r.resolve(&"textures/gui/widgets.png".into()), TextureAtlas::Gui);
        assert_eq!(r.resolve(&"minecraft:textures/font/ascii.png".into()), TextureAtlas::Font);
        assert_eq!(r.resolve(&"blocks/stone".into()), TextureAtlas::Terrain);
        assert_eq!(r.resolve(&"nova:white".into()), TextureAtlas::Gui);
        assert_eq!(r.resolve(&"textures/gui/unknown.png".into()), TextureAtlas::None);
    }

    #[test]
    fn same_path_in_another_namespace_is_unresolved() {
        let mut r = AtlasResolver::new("nova:white".into());
        r.register(TextureAtlas::Gui, ["gui/widgets"]);
        r.register(TextureAtlas::Terrain, ["mymod:blocks/ore"]);
        assert_eq!(r.resolve(&"minecraft:gui/widgets".into()), TextureAtlas::Gui);
        assert_eq!(r.resolve(&"foo:gui/widgets".into()), TextureAtlas::None);
        assert_eq!(r.resolve(&"foo:textures/gui/widgets.png".into()), TextureAtlas::None);
        assert_eq!(r.resolve(&"mymod:textures/blocks/ore.png".into()), TextureAtlas::Terrain);
        assert_eq!(r.resolve(&"blocks/ore".into()), TextureAtlas::None);
    }

    #[test]
    fn bare_paths_get_default_namespace() {
        let loc = ResourceLocation::from("textures/gui/options_background.png");
        assert_eq!(loc.namespace, "minecraft");
        assert_eq!(loc.to_string(), "minecraft:textures/gui/options_background.png");
        assert_eq!(loc.atlas_key(), "gui/options_background");
    }
}
