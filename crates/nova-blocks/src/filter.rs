//! Geometry filters: named predicates that route block geometry into render groups.
//!
//! A filter is parsed from a whitespace separated expression such as
//! `geometry_type::block not_transparent`. Filters are immutable after parsing and
//! are shared read-only between compile workers.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;

use crate::types::BlockState;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FilterError {
    #[error("unknown filter token `{0}`")]
    UnknownToken(String),
    #[error("unknown geometry type `{0}`")]
    UnknownGeometryType(String),
    #[error("`{0}` needs a value after `::`")]
    MissingValue(String),
    #[error("filter `{0}` is defined twice")]
    DuplicateName(String),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum GeometryType {
    Block,
    Entity,
    FallingBlock,
    Gui,
    Text,
    GuiBackground,
    Cloud,
    SkyDecoration,
    SelectionBox,
    Glint,
    Weather,
    Hand,
    FullscreenQuad,
    Particle,
    LitParticle,
    Eyes,
}

impl GeometryType {
    pub const ALL: [GeometryType; 16] = [
        GeometryType::Block,
        GeometryType::Entity,
        GeometryType::FallingBlock,
        GeometryType::Gui,
        GeometryType::Text,
        GeometryType::GuiBackground,
        GeometryType::Cloud,
        GeometryType::SkyDecoration,
        GeometryType::SelectionBox,
        GeometryType::Glint,
        GeometryType::Weather,
        GeometryType::Hand,
        GeometryType::FullscreenQuad,
        GeometryType::Particle,
        GeometryType::LitParticle,
        GeometryType::Eyes,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            GeometryType::Block => "block",
            GeometryType::Entity => "entity",
            GeometryType::FallingBlock => "falling_block",
            GeometryType::Gui => "gui",
            GeometryType::Text => "text",
            GeometryType::GuiBackground => "gui_background",
            GeometryType::Cloud => "cloud",
            GeometryType::SkyDecoration => "sky_decoration",
            GeometryType::SelectionBox => "selection_box",
            GeometryType::Glint => "glint",
            GeometryType::Weather => "weather",
            GeometryType::Hand => "hand",
            GeometryType::FullscreenQuad => "fullscreen_quad",
            GeometryType::Particle => "particle",
            GeometryType::LitParticle => "lit_particle",
            GeometryType::Eyes => "eyes",
        }
    }
}

impl FromStr for GeometryType {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GeometryType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| FilterError::UnknownGeometryType(s.to_string()))
    }
}

impl fmt::Display for GeometryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Predicate over a block state. See the module docs for the expression grammar.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GeometryFilter {
    pub geometry_types: Vec<GeometryType>,
    pub names: Vec<String>,
    pub name_parts: Vec<String>,
    pub solid: Option<bool>,
    pub transparent: Option<bool>,
    pub cutout: Option<bool>,
    pub emissive: Option<bool>,
    pub damaged: Option<bool>,
    /// `nothing_else`: properties left unmentioned must be false.
    pub strict: bool,
}

impl GeometryFilter {
    pub fn parse(expr: &str) -> Result<Self, FilterError> {
        let mut f = GeometryFilter::default();
        for token in expr.split_whitespace() {
            if let Some((key, value)) = token.split_once("::") {
                if value.is_empty() {
                    return Err(FilterError::MissingValue(key.to_string()));
                }
                match key {
                    "geometry_type" => f.geometry_types.push(value.parse()?),
                    "name" => f.names.push(value.to_string()),
                    "name_part" => f.name_parts.push(value.to_string()),
                    _ => return Err(FilterError::UnknownToken(token.to_string())),
                }
                continue;
            }
            let (flag, value) = match token.strip_prefix("not_") {
                Some(rest) => (rest, false),
                None => (token, true),
            };
            match flag {
                "solid" => f.solid = Some(value),
                "transparent" => f.transparent = Some(value),
                "cutout" => f.cutout = Some(value),
                "emissive" => f.emissive = Some(value),
                "damaged" => f.damaged = Some(value),
                "everything_else" if value => f.strict = false,
                "nothing_else" if value => f.strict = true,
                _ => return Err(FilterError::UnknownToken(token.to_string())),
            }
        }
        Ok(f)
    }

    fn has_constraints(&self) -> bool {
        self.strict
            || !self.geometry_types.is_empty()
            || self.solid.is_some()
            || self.transparent.is_some()
            || self.cutout.is_some()
            || self.emissive.is_some()
            || self.damaged.is_some()
    }

    #[inline]
    fn check(&self, wanted: Option<bool>, actual: bool) -> bool {
        match wanted {
            Some(w) => w == actual,
            None => !self.strict || !actual,
        }
    }

    /// Chunk geometry is always of type `block`.
    #[inline]
    pub fn matches(&self, state: &BlockState<'_>) -> bool {
        self.matches_geometry(GeometryType::Block, state)
    }

    pub fn matches_geometry(&self, geometry: GeometryType, state: &BlockState<'_>) -> bool {
        let name = state.name();
        if self.names.iter().any(|n| n == name)
            || self.name_parts.iter().any(|p| name.contains(p.as_str()))
        {
            return true;
        }
        if !self.has_constraints() && !(self.names.is_empty() && self.name_parts.is_empty()) {
            return false;
        }
        if !self.geometry_types.is_empty() && !self.geometry_types.contains(&geometry) {
            return false;
        }
        let ty = state.ty;
        self.check(self.solid, ty.solid)
            && self.check(self.transparent, ty.transparent)
            && self.check(self.cutout, ty.cutout)
            && self.check(self.emissive, ty.emissive)
            && self.check(self.damaged, state.is_damaged())
    }
}

impl FromStr for GeometryFilter {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GeometryFilter::parse(s)
    }
}

/// `[[filter]]` entry in the top-level config.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct FilterDef {
    pub name: String,
    pub expr: String,
}

/// Ordered name -> filter mapping. Declaration order is the submission order.
#[derive(Clone, Debug, Default)]
pub struct FilterSet {
    filters: Vec<(String, GeometryFilter)>,
    by_name: HashMap<String, usize>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, filter: GeometryFilter) -> Result<(), FilterError> {
        let name = name.into();
        if self.by_name.contains_key(&name) {
            return Err(FilterError::DuplicateName(name));
        }
        self.by_name.insert(name.clone(), self.filters.len());
        self.filters.push((name, filter));
        Ok(())
    }

    pub fn from_defs(defs: &[FilterDef]) -> Result<Self, FilterError> {
        let mut set = FilterSet::new();
        for def in defs {
            set.insert(def.name.clone(), GeometryFilter::parse(&def.expr)?)?;
        }
        Ok(set)
    }

    /// The stock terrain/water/damage split used when config declares no filters.
    pub fn defaults() -> Self {
        let defs = [
            ("gbuffers_terrain", "geometry_type::block not_transparent"),
            ("gbuffers_water", "geometry_type::block transparent"),
            ("gbuffers_damagedblock", "geometry_type::block damaged"),
        ];
        let mut set = FilterSet::new();
        for (name, expr) in defs {
            if let Ok(f) = GeometryFilter::parse(expr) {
                let _ = set.insert(name, f);
            }
        }
        set
    }

    /// Unknown names are `None`; callers treat that as "no match".
    pub fn get(&self, name: &str) -> Option<&GeometryFilter> {
        self.by_name.get(name).map(|&i| &self.filters[i].1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &GeometryFilter)> {
        self.filters.iter().map(|(n, f)| (n.as_str(), f))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.filters.iter().map(|(n, _)| n.as_str())
    }

    /// Names of every filter accepting `state`, in declaration order.
    pub fn matching<'a>(&'a self, state: &'a BlockState<'_>) -> impl Iterator<Item = &'a str> + 'a {
        self.filters
            .iter()
            .filter(move |(_, f)| f.matches(state))
            .map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}
