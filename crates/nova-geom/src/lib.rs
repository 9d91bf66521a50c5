//! Minimal geometry types shared by the bridge crates (no renderer dependency).
#![forbid(unsafe_code)]

use core::ops::{Add, AddAssign, Mul, Neg, Sub};

/// Edge length of a chunk section, in blocks.
pub const SECTION_SIZE: i32 = 16;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    #[inline]
    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    #[inline]
    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;
    #[inline]
    fn mul(self, rhs: f32) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

/// Integer block-space coordinate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub const ORIGIN: BlockPos = BlockPos { x: 0, y: 0, z: 0 };

    #[inline]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// Section coordinate containing this block (floor division by [`SECTION_SIZE`]).
    #[inline]
    pub fn section(self) -> BlockPos {
        BlockPos::new(
            self.x.div_euclid(SECTION_SIZE),
            self.y.div_euclid(SECTION_SIZE),
            self.z.div_euclid(SECTION_SIZE),
        )
    }

    /// Minimum corner (block-space origin) of the section containing this block.
    #[inline]
    pub fn section_origin(self) -> BlockPos {
        let s = self.section();
        BlockPos::new(s.x * SECTION_SIZE, s.y * SECTION_SIZE, s.z * SECTION_SIZE)
    }

    #[inline]
    pub fn as_vec3(self) -> Vec3 {
        Vec3::new(self.x as f32, self.y as f32, self.z as f32)
    }
}

impl Add for BlockPos {
    type Output = BlockPos;
    #[inline]
    fn add(self, rhs: BlockPos) -> BlockPos {
        BlockPos::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for BlockPos {
    #[inline]
    fn add_assign(&mut self, rhs: BlockPos) {
        self.x += rhs.x;
        self.y += rhs.y;
        self.z += rhs.z;
    }
}

impl Sub for BlockPos {
    type Output = BlockPos;
    #[inline]
    fn sub(self, rhs: BlockPos) -> BlockPos {
        BlockPos::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Neg for BlockPos {
    type Output = BlockPos;
    #[inline]
    fn neg(self) -> BlockPos {
        BlockPos::new(-self.x, -self.y, -self.z)
    }
}

impl core::fmt::Display for BlockPos {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    #[inline]
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Box covering the whole section whose minimum corner is `origin`.
    #[inline]
    pub fn section(origin: BlockPos) -> Self {
        let min = origin.as_vec3();
        let s = SECTION_SIZE as f32;
        Self::new(min, min + Vec3::new(s, s, s))
    }

    #[inline]
    pub fn contains(&self, p: Vec3) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }
}

/// Inclusive integer box of block positions; the host's chunk bounding box.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockBox {
    pub min: BlockPos,
    pub max: BlockPos,
}

impl BlockBox {
    #[inline]
    pub const fn new(min: BlockPos, max: BlockPos) -> Self {
        Self { min, max }
    }

    /// The 16×16×16 box whose minimum corner is `origin`.
    #[inline]
    pub const fn section(origin: BlockPos) -> Self {
        Self::new(
            origin,
            origin.offset(SECTION_SIZE - 1, SECTION_SIZE - 1, SECTION_SIZE - 1),
        )
    }

    #[inline]
    pub fn contains(&self, p: BlockPos) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }

    /// Number of block positions covered; zero when the box is inverted.
    pub fn volume(&self) -> usize {
        let d = |lo: i32, hi: i32| if hi < lo { 0 } else { (hi - lo + 1) as usize };
        d(self.min.x, self.max.x) * d(self.min.y, self.max.y) * d(self.min.z, self.max.z)
    }

    /// Iterates y-major, then z, then x, matching the host's compile loop order.
    pub fn iter(&self) -> impl Iterator<Item = BlockPos> + '_ {
        let (min, max) = (self.min, self.max);
        (min.y..=max.y).flat_map(move |y| {
            (min.z..=max.z).flat_map(move |z| (min.x..=max.x).map(move |x| BlockPos::new(x, y, z)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn section_origin_contains_block(
            p in (-(1i32 << 24)..1 << 24, -(1i32 << 24)..1 << 24, -(1i32 << 24)..1 << 24)
                .prop_map(|(x, y, z)| BlockPos::new(x, y, z))
        ) {
            let o = p.section_origin();
            prop_assert!(BlockBox::section(o).contains(p));
        }
    }

    #[test]
    fn negative_blocks_floor_into_lower_section() {
        assert_eq!(BlockPos::new(-1, 0, 15).section(), BlockPos::new(-1, 0, 0));
        assert_eq!(
            BlockPos::new(-1, 17, -16).section_origin(),
            BlockPos::new(-16, 16, -16)
        );
    }
}
