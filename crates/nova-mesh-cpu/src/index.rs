/// Triangle winding for the two triangles emitted per quad.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum Winding {
    /// `[o, o+1, o+2, o, o+2, o+3]`
    #[default]
    CounterClockwise,
    /// `[o, o+2, o+1, o, o+3, o+2]`
    Clockwise,
}

/// Growing index list for quad geometry.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IndexList {
    indices: Vec<u32>,
}

impl IndexList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quad_capacity(quads: usize) -> Self {
        Self {
            indices: Vec::with_capacity(quads * 6),
        }
    }

    /// Indices for `quads` sequential quads starting at vertex 0.
    pub fn for_quads(quads: usize, winding: Winding) -> Self {
        let mut list = Self::with_quad_capacity(quads);
        let mut offset = 0u32;
        for _ in 0..quads {
            list.add_indices_for_face(offset, winding);
            offset += 4;
        }
        list
    }

    /// Appends the six indices of the quad whose first vertex is `start`.
    #[inline]
    pub fn add_indices_for_face(&mut self, start: u32, winding: Winding) {
        let o = start;
        match winding {
            Winding::CounterClockwise => {
                self.indices
                    .extend_from_slice(&[o, o + 1, o + 2, o, o + 2, o + 3])
            }
            Winding::Clockwise => {
                self.indices
                    .extend_from_slice(&[o, o + 2, o + 1, o, o + 3, o + 2])
            }
        }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.indices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &[u32] {
        &self.indices
    }

    pub fn into_vec(self) -> Vec<u32> {
        self.indices
    }
}
