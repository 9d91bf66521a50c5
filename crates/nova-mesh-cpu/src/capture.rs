//! The vertex-builder contract block renderers write through, and a buffer that
//! captures into memory instead of uploading.

use nova_geom::BlockPos;

use crate::layout::{VertexElement, VertexLayout};

/// Primitive hint passed to [`VertexSink::begin`]. Capture does not branch on it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum DrawMode {
    #[default]
    Quads,
    Triangles,
    Lines,
}

/// Vertex builder interface expected by block renderers.
///
/// Callers supply every element of the configured layout before `end_vertex`;
/// elements the layout does not carry are accepted and dropped.
pub trait VertexSink {
    fn begin(&mut self, mode: DrawMode, layout: VertexLayout);
    /// Offset added to every following position.
    fn set_translation(&mut self, dx: f64, dy: f64, dz: f64);
    fn pos(&mut self, x: f64, y: f64, z: f64);
    fn color(&mut self, r: u8, g: u8, b: u8, a: u8);
    fn tex(&mut self, u: f64, v: f64);
    fn lightmap(&mut self, sky: u16, block: u16);
    fn normal(&mut self, nx: f32, ny: f32, nz: f32);
    fn end_vertex(&mut self);
    fn finish_drawing(&mut self);

    fn color_f32(&mut self, r: f32, g: f32, b: f32, a: f32) {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0) as u8;
        self.color(q(r), q(g), q(b), q(a));
    }
}

/// Accumulates committed vertices as raw `u32` words in the configured layout.
#[derive(Clone, Debug)]
pub struct CapturingVertexBuffer {
    origin: BlockPos,
    translation: [f64; 3],
    layout: VertexLayout,
    mode: DrawMode,
    drawing: bool,
    data: Vec<u32>,
    staged: Vec<u32>,
    staged_mask: u8,
    vertex_count: usize,
}

impl CapturingVertexBuffer {
    pub fn new(origin: BlockPos) -> Self {
        Self::with_layout(origin, VertexLayout::BLOCK)
    }

    pub fn with_layout(origin: BlockPos, layout: VertexLayout) -> Self {
        Self {
            origin,
            translation: [0.0; 3],
            layout,
            mode: DrawMode::Quads,
            drawing: false,
            data: Vec::new(),
            staged: vec![0; layout.stride()],
            staged_mask: 0,
            vertex_count: 0,
        }
    }

    #[inline]
    pub fn origin(&self) -> BlockPos {
        self.origin
    }

    #[inline]
    pub fn layout(&self) -> VertexLayout {
        self.layout
    }

    #[inline]
    pub fn mode(&self) -> DrawMode {
        self.mode
    }

    #[inline]
    pub fn is_drawing(&self) -> bool {
        self.drawing
    }

    #[inline]
    pub fn translation(&self) -> [f64; 3] {
        self.translation
    }

    /// Everything committed by `end_vertex` since construction or the last reset.
    #[inline]
    pub fn raw_data(&self) -> &[u32] {
        &self.data
    }

    /// Moves the captured words out, leaving the buffer empty.
    pub fn take_raw_data(&mut self) -> Vec<u32> {
        self.vertex_count = 0;
        std::mem::take(&mut self.data)
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertex_count == 0
    }

    /// Drops captured data. Origin and translation are kept.
    pub fn reset(&mut self) {
        self.data.clear();
        self.vertex_count = 0;
        self.staged_mask = 0;
        self.drawing = false;
    }

    #[inline]
    fn stage(&mut self, element: VertexElement, words: &[u32]) {
        if let Some(off) = self.layout.offset_of(element) {
            self.staged[off..off + words.len()].copy_from_slice(words);
            self.staged_mask |= VertexLayout::element_bit(element);
        }
    }
}

impl VertexSink for CapturingVertexBuffer {
    fn begin(&mut self, mode: DrawMode, layout: VertexLayout) {
        debug_assert!(
            self.data.is_empty() || layout == self.layout,
            "layout change over captured data"
        );
        self.mode = mode;
        self.layout = layout;
        self.staged.resize(layout.stride(), 0);
        self.staged_mask = 0;
        self.drawing = true;
    }

    fn set_translation(&mut self, dx: f64, dy: f64, dz: f64) {
        self.translation = [dx, dy, dz];
    }

    #[inline]
    fn pos(&mut self, x: f64, y: f64, z: f64) {
        let [tx, ty, tz] = self.translation;
        self.stage(
            VertexElement::Position,
            &[
                ((x + tx) as f32).to_bits(),
                ((y + ty) as f32).to_bits(),
                ((z + tz) as f32).to_bits(),
            ],
        );
    }

    #[inline]
    fn color(&mut self, r: u8, g: u8, b: u8, a: u8) {
        let packed = (r as u32) << 24 | (g as u32) << 16 | (b as u32) << 8 | a as u32;
        self.stage(VertexElement::Color, &[packed]);
    }

    #[inline]
    fn tex(&mut self, u: f64, v: f64) {
        self.stage(
            VertexElement::Uv,
            &[(u as f32).to_bits(), (v as f32).to_bits()],
        );
    }

    #[inline]
    fn lightmap(&mut self, sky: u16, block: u16) {
        self.stage(
            VertexElement::Lightmap,
            &[(sky as u32) << 16 | block as u32],
        );
    }

    #[inline]
    fn normal(&mut self, nx: f32, ny: f32, nz: f32) {
        self.stage(
            VertexElement::Normal,
            &[nx.to_bits(), ny.to_bits(), nz.to_bits()],
        );
    }

    #[inline]
    fn end_vertex(&mut self) {
        debug_assert_eq!(
            self.staged_mask & self.layout.mask(),
            self.layout.mask(),
            "incomplete vertex"
        );
        self.data.extend_from_slice(&self.staged);
        self.staged_mask = 0;
        self.vertex_count += 1;
    }

    fn finish_drawing(&mut self) {
        self.drawing = false;
    }
}
