use nova_sink::VertexFormat;

/// One attribute of a vertex, measured in 32-bit words.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum VertexElement {
    Position,
    /// Packed `r<<24 | g<<16 | b<<8 | a`.
    Color,
    Uv,
    /// Packed `(sky<<16) | block`.
    Lightmap,
    Normal,
}

impl VertexElement {
    #[inline]
    pub const fn words(self) -> usize {
        match self {
            VertexElement::Position => 3,
            VertexElement::Color => 1,
            VertexElement::Uv => 2,
            VertexElement::Lightmap => 1,
            VertexElement::Normal => 3,
        }
    }

    #[inline]
    const fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

/// Ordered attribute list describing how one vertex is laid out in a capture buffer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct VertexLayout {
    pub elements: &'static [VertexElement],
    /// Tag handed to the native sink alongside data captured in this layout.
    pub format: VertexFormat,
}

impl VertexLayout {
    /// Legacy packed block layout: 7 words per vertex.
    pub const BLOCK: VertexLayout = VertexLayout {
        elements: &[
            VertexElement::Position,
            VertexElement::Color,
            VertexElement::Uv,
            VertexElement::Lightmap,
        ],
        format: VertexFormat::PosUvLightmapUvNormalTangent,
    };

    /// Block layout with a trailing normal: 10 words per vertex.
    pub const BLOCK_NORMAL: VertexLayout = VertexLayout {
        elements: &[
            VertexElement::Position,
            VertexElement::Color,
            VertexElement::Uv,
            VertexElement::Lightmap,
            VertexElement::Normal,
        ],
        format: VertexFormat::PosUvLightmapUvNormalTangent,
    };

    pub const POSITION_TEX: VertexLayout = VertexLayout {
        elements: &[VertexElement::Position, VertexElement::Uv],
        format: VertexFormat::PosUv,
    };

    /// Words per vertex.
    pub const fn stride(&self) -> usize {
        let mut n = 0;
        let mut i = 0;
        while i < self.elements.len() {
            n += self.elements[i].words();
            i += 1;
        }
        n
    }

    /// Word offset of `element` inside one vertex, `None` when the layout lacks it.
    pub fn offset_of(&self, element: VertexElement) -> Option<usize> {
        let mut off = 0;
        for e in self.elements {
            if *e == element {
                return Some(off);
            }
            off += e.words();
        }
        None
    }

    /// Bitmask with one bit per element present.
    pub(crate) fn mask(&self) -> u8 {
        self.elements.iter().fold(0, |m, e| m | e.bit())
    }

    pub(crate) fn element_bit(element: VertexElement) -> u8 {
        element.bit()
    }
}
