use serde::{Deserialize, Serialize};

pub type BlockId = u16;

/// Compact per-position block value stored in chunk sections.
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug, Hash, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    /// Break progress overlay (0 = intact).
    pub damage: u8,
}

impl Block {
    pub const AIR: Block = Block { id: 0, damage: 0 };

    #[inline]
    pub const fn new(id: BlockId) -> Self {
        Self { id, damage: 0 }
    }

    #[inline]
    pub const fn with_damage(self, damage: u8) -> Self {
        Self {
            id: self.id,
            damage,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct MaterialId(pub u16);

/// Static description of a kind of block: the material queries filters run against.
#[derive(Clone, Debug, PartialEq)]
pub struct BlockType {
    pub id: BlockId,
    pub name: String,
    pub solid: bool,
    pub transparent: bool,
    pub cutout: bool,
    pub emissive: bool,
    pub material: MaterialId,
}

impl BlockType {
    #[inline]
    pub fn is_air(&self) -> bool {
        self.id == 0
    }

    /// Fully hides the faces of neighbouring blocks.
    #[inline]
    pub fn is_opaque(&self) -> bool {
        self.solid && !self.transparent && !self.cutout
    }
}

/// A block type at a concrete position, as seen by filters and block renderers.
#[derive(Copy, Clone, Debug)]
pub struct BlockState<'a> {
    pub ty: &'a BlockType,
    pub damage: u8,
}

impl<'a> BlockState<'a> {
    #[inline]
    pub fn new(ty: &'a BlockType, damage: u8) -> Self {
        Self { ty, damage }
    }

    #[inline]
    pub fn name(&self) -> &'a str {
        &self.ty.name
    }

    #[inline]
    pub fn is_damaged(&self) -> bool {
        self.damage > 0
    }
}
