use nova_geom::{BlockPos, Vec3};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Face {
    PosY = 0,
    NegY = 1,
    PosX = 2,
    NegX = 3,
    PosZ = 4,
    NegZ = 5,
}

/// Unit-cube corner offsets per face, counter-clockwise seen from outside the cube.
const CORNERS: [[[i32; 3]; 4]; 6] = [
    [[0, 1, 0], [0, 1, 1], [1, 1, 1], [1, 1, 0]],
    [[0, 0, 0], [1, 0, 0], [1, 0, 1], [0, 0, 1]],
    [[1, 0, 0], [1, 1, 0], [1, 1, 1], [1, 0, 1]],
    [[0, 0, 0], [0, 0, 1], [0, 1, 1], [0, 1, 0]],
    [[0, 0, 1], [1, 0, 1], [1, 1, 1], [0, 1, 1]],
    [[0, 0, 0], [0, 1, 0], [1, 1, 0], [1, 0, 0]],
];

impl Face {
    pub const ALL: [Face; 6] = [
        Face::PosY,
        Face::NegY,
        Face::PosX,
        Face::NegX,
        Face::PosZ,
        Face::NegZ,
    ];

    /// Returns the `[0..6)` index of this face.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Returns the unit-normal vector for this face.
    #[inline]
    pub fn normal(self) -> Vec3 {
        let (dx, dy, dz) = self.delta();
        Vec3::new(dx as f32, dy as f32, dz as f32)
    }

    /// Returns the integer grid delta `(dx,dy,dz)` when stepping out of this face.
    #[inline]
    pub fn delta(self) -> (i32, i32, i32) {
        match self {
            Face::PosY => (0, 1, 0),
            Face::NegY => (0, -1, 0),
            Face::PosX => (1, 0, 0),
            Face::NegX => (-1, 0, 0),
            Face::PosZ => (0, 0, 1),
            Face::NegZ => (0, 0, -1),
        }
    }

    #[inline]
    pub fn neighbor(self, p: BlockPos) -> BlockPos {
        let (dx, dy, dz) = self.delta();
        p.offset(dx, dy, dz)
    }

    /// The four corners of this face of the block at `p`, in emission order.
    pub fn corners(self, p: BlockPos) -> [BlockPos; 4] {
        CORNERS[self.index()].map(|[x, y, z]| p.offset(x, y, z))
    }

    /// In-plane `(s, t)` of each corner, `t` pointing up the texture.
    pub fn corner_st(self) -> [(f32, f32); 4] {
        CORNERS[self.index()].map(|[x, y, z]| match self {
            Face::PosY | Face::NegY => (x as f32, z as f32),
            Face::PosX | Face::NegX => (z as f32, y as f32),
            Face::PosZ | Face::NegZ => (x as f32, y as f32),
        })
    }
}
