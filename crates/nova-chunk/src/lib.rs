//! Chunk section storage and the block-access contract renderers read through.
#![forbid(unsafe_code)]

use hashbrown::HashMap;
use nova_blocks::types::Block;
use nova_geom::{BlockBox, BlockPos, SECTION_SIZE};

const S: usize = SECTION_SIZE as usize;
pub const SECTION_VOLUME: usize = S * S * S;

/// Read-only block lookup in world block coordinates. Positions with no data read as air.
pub trait BlockAccess: Send + Sync {
    fn block_at(&self, pos: BlockPos) -> Block;
}

/// One 16×16×16 cube of blocks at a section-aligned block-space origin.
#[derive(Clone, Debug)]
pub struct ChunkSection {
    pub origin: BlockPos,
    pub blocks: Vec<Block>,
}

impl ChunkSection {
    pub fn new(origin: BlockPos) -> Self {
        debug_assert_eq!(origin, origin.section_origin());
        Self {
            origin,
            blocks: vec![Block::AIR; SECTION_VOLUME],
        }
    }

    pub fn from_blocks_local(origin: BlockPos, blocks: Vec<Block>) -> Self {
        let mut b = blocks;
        if b.len() != SECTION_VOLUME {
            b.resize(SECTION_VOLUME, Block::AIR);
        }
        ChunkSection { origin, blocks: b }
    }

    #[inline]
    pub fn idx(&self, x: usize, y: usize, z: usize) -> usize {
        (y * S + z) * S + x
    }

    #[inline]
    pub fn get_local(&self, x: usize, y: usize, z: usize) -> Block {
        self.blocks[self.idx(x, y, z)]
    }

    #[inline]
    pub fn set_local(&mut self, x: usize, y: usize, z: usize, block: Block) {
        let i = self.idx(x, y, z);
        self.blocks[i] = block;
    }

    #[inline]
    pub fn bounds(&self) -> BlockBox {
        BlockBox::section(self.origin)
    }

    #[inline]
    pub fn contains_world(&self, p: BlockPos) -> bool {
        self.bounds().contains(p)
    }

    #[inline]
    pub fn get_world(&self, p: BlockPos) -> Option<Block> {
        if !self.contains_world(p) {
            return None;
        }
        let l = p - self.origin;
        Some(self.get_local(l.x as usize, l.y as usize, l.z as usize))
    }

    #[inline]
    pub fn has_non_air(&self) -> bool {
        self.blocks.iter().any(|b| b.id != 0)
    }

    #[inline]
    pub fn is_all_air(&self) -> bool {
        !self.has_non_air()
    }
}

impl BlockAccess for ChunkSection {
    #[inline]
    fn block_at(&self, pos: BlockPos) -> Block {
        self.get_world(pos).unwrap_or(Block::AIR)
    }
}

/// Sparse world of sections keyed by section origin.
#[derive(Clone, Debug, Default)]
pub struct SectionMap {
    sections: HashMap<BlockPos, ChunkSection>,
}

impl SectionMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, section: ChunkSection) -> Option<ChunkSection> {
        self.sections.insert(section.origin, section)
    }

    pub fn get(&self, origin: BlockPos) -> Option<&ChunkSection> {
        self.sections.get(&origin)
    }

    pub fn section_mut(&mut self, origin: BlockPos) -> &mut ChunkSection {
        self.sections
            .entry(origin)
            .or_insert_with(|| ChunkSection::new(origin))
    }

    pub fn set_block(&mut self, pos: BlockPos, block: Block) {
        let sec = self.section_mut(pos.section_origin());
        let l = pos - sec.origin;
        sec.set_local(l.x as usize, l.y as usize, l.z as usize, block);
    }

    /// Writes `block` at every position of the inclusive box.
    pub fn fill(&mut self, area: BlockBox, block: Block) {
        for p in area.iter() {
            self.set_block(p, block);
        }
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChunkSection> {
        self.sections.values()
    }
}

impl BlockAccess for SectionMap {
    #[inline]
    fn block_at(&self, pos: BlockPos) -> Block {
        self.sections
            .get(&pos.section_origin())
            .and_then(|s| s.get_world(pos))
            .unwrap_or(Block::AIR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_block_creates_section_across_negative_boundary() {
        let mut map = SectionMap::new();
        let p = BlockPos::new(-1, 0, -17);
        map.set_block(p, Block::new(3));
        assert_eq!(map.block_at(p), Block::new(3));
        assert!(map.get(BlockPos::new(-16, 0, -32)).is_some());
        assert_eq!(map.block_at(BlockPos::new(0, 0, -17)), Block::AIR);
    }
}
