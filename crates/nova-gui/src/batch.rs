//! Per-texture GUI batches and the draw helpers screens call into.

use std::collections::BTreeMap;

use nova_sink::{GuiBufferCommand, NativeSink};

use crate::atlas::{AtlasResolver, ResourceLocation};
use crate::color::Rgb;

/// x, y, z, u, v, r, g, b
pub const FLOATS_PER_VERTEX: usize = 8;

/// Pixel to UV factor for the fixed 256×256 legacy texture convention.
pub const LEGACY_UV_SCALE: f32 = 0.00390625;

const Z_START: f32 = 0.9999;
const Z_STEP: f32 = 0.0001;

/// Quad fan used by rectangles: vertices are TL, TR, BL, BR.
const RECT_INDICES: [u32; 6] = [0, 1, 2, 2, 1, 3];

#[inline]
pub fn legacy_uv(px: f32) -> f32 {
    px * LEGACY_UV_SCALE
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct GuiBatch {
    pub indices: Vec<u32>,
    pub vertices: Vec<f32>,
}

impl GuiBatch {
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / FLOATS_PER_VERTEX
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Appends a batch whose indices count from zero.
    pub fn append(&mut self, indices: &[u32], vertices: &[f32]) {
        debug_assert_eq!(vertices.len() % FLOATS_PER_VERTEX, 0);
        let base = self.vertex_count() as u32;
        self.indices.extend(indices.iter().map(|i| i + base));
        self.vertices.extend_from_slice(vertices);
    }
}

/// Collects one frame's GUI geometry grouped by texture.
#[derive(Debug)]
pub struct GuiDrawBatcher {
    batches: BTreeMap<ResourceLocation, GuiBatch>,
    white_texture: ResourceLocation,
    z: f32,
}

impl GuiDrawBatcher {
    pub fn new(white_texture: ResourceLocation) -> Self {
        Self {
            batches: BTreeMap::new(),
            white_texture,
            z: Z_START,
        }
    }

    pub fn clear(&mut self) {
        self.batches.clear();
        self.z = Z_START;
    }

    pub fn batch(&self, texture: &ResourceLocation) -> Option<&GuiBatch> {
        self.batches.get(texture)
    }

    pub fn batches(&self) -> impl Iterator<Item = (&ResourceLocation, &GuiBatch)> {
        self.batches.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.values().all(GuiBatch::is_empty)
    }

    pub fn white_texture(&self) -> &ResourceLocation {
        &self.white_texture
    }

    /// Depth for the next helper draw; later draws sit in front.
    pub fn next_z(&mut self) -> f32 {
        let z = self.z;
        self.z = (self.z - Z_STEP).max(0.0);
        z
    }

    /// Low-level entry: indices are rebased by the batch's current vertex count.
    pub fn draw(&mut self, texture: &ResourceLocation, indices: &[u32], vertices: &[f32]) {
        self.batches
            .entry(texture.clone())
            .or_default()
            .append(indices, vertices);
    }

    #[allow(clippy::too_many_arguments)]
    pub fn draw_rectangle(
        &mut self,
        texture: &ResourceLocation,
        x: f32,
        y: f32,
        z: f32,
        w: f32,
        h: f32,
        u: f32,
        v: f32,
        uw: f32,
        uh: f32,
    ) {
        self.draw_rectangle_colored(texture, x, y, z, w, h, u, v, uw, uh, [Rgb::WHITE; 4]);
    }

    /// `colors` are per corner in TL, TR, BL, BR order.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_rectangle_colored(
        &mut self,
        texture: &ResourceLocation,
        x: f32,
        y: f32,
        z: f32,
        w: f32,
        h: f32,
        u: f32,
        v: f32,
        uw: f32,
        uh: f32,
        colors: [Rgb; 4],
    ) {
        let corners = [
            (x, y, u, v),
            (x + w, y, u + uw, v),
            (x, y + h, u, v + uh),
            (x + w, y + h, u + uw, v + uh),
        ];
        let mut vertices = [0.0f32; 4 * FLOATS_PER_VERTEX];
        for (i, ((px, py, pu, pv), c)) in corners.into_iter().zip(colors).enumerate() {
            vertices[i * FLOATS_PER_VERTEX..(i + 1) * FLOATS_PER_VERTEX]
                .copy_from_slice(&[px, py, z, pu, pv, c.r, c.g, c.b]);
        }
        self.draw(texture, &RECT_INDICES, &vertices);
    }

    /// Solid rectangle in the white texture. Corners may come in either order.
    pub fn draw_rect(&mut self, left: i32, top: i32, right: i32, bottom: i32, argb: u32) {
        let (l, r) = (left.min(right), left.max(right));
        let (t, b) = (top.min(bottom), top.max(bottom));
        let z = self.next_z();
        let white = self.white_texture.clone();
        let c = Rgb::from_argb(argb);
        self.draw_rectangle_colored(
            &white,
            l as f32,
            t as f32,
            z,
            (r - l) as f32,
            (b - t) as f32,
            0.0,
            0.0,
            1.0,
            1.0,
            [c; 4],
        );
    }

    /// Vertical gradient, `start_argb` at the top and `end_argb` at the bottom.
    pub fn draw_gradient_rect(
        &mut self,
        left: i32,
        top: i32,
        right: i32,
        bottom: i32,
        start_argb: u32,
        end_argb: u32,
    ) {
        let z = self.next_z();
        let white = self.white_texture.clone();
        let (s, e) = (Rgb::from_argb(start_argb), Rgb::from_argb(end_argb));
        let (l, t, r, b) = (left as f32, top as f32, right as f32, bottom as f32);
        let vertices = [
            l, b, z, 0.0, 1.0, e.r, e.g, e.b, //
            l, t, z, 0.0, 0.0, s.r, s.g, s.b, //
            r, t, z, 1.0, 0.0, s.r, s.g, s.b, //
            r, b, z, 1.0, 1.0, e.r, e.g, e.b,
        ];
        self.draw(&white, &[0, 1, 2, 0, 2, 3], &vertices);
    }

    /// Textured rectangle with UVs in legacy 256-pixel texture space.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_textured_modal_rect(
        &mut self,
        texture: &ResourceLocation,
        x: i32,
        y: i32,
        tex_x: i32,
        tex_y: i32,
        width: i32,
        height: i32,
    ) {
        let z = self.next_z();
        self.draw_rectangle(
            texture,
            x as f32,
            y as f32,
            z,
            width as f32,
            height as f32,
            legacy_uv(tex_x as f32),
            legacy_uv(tex_y as f32),
            legacy_uv(width as f32),
            legacy_uv(height as f32),
        );
    }

    /// Textured rectangle with UVs in pixels of a texture of the given size.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_modal_rect_with_custom_sized_texture(
        &mut self,
        texture: &ResourceLocation,
        x: i32,
        y: i32,
        u: f32,
        v: f32,
        width: i32,
        height: i32,
        texture_width: f32,
        texture_height: f32,
    ) {
        let (fu, fv) = (1.0 / texture_width, 1.0 / texture_height);
        let z = self.next_z();
        self.draw_rectangle(
            texture,
            x as f32,
            y as f32,
            z,
            width as f32,
            height as f32,
            u * fu,
            v * fv,
            width as f32 * fu,
            height as f32 * fv,
        );
    }

    /// One command per non-empty batch, in texture order.
    pub fn commands(&self, resolver: &AtlasResolver) -> Vec<GuiBufferCommand> {
        self.batches
            .iter()
            .filter(|(_, b)| !b.is_empty())
            .map(|(tex, b)| GuiBufferCommand {
                texture_name: tex.path.clone(),
                index_buffer: b.indices.clone(),
                vertex_buffer: b.vertices.clone(),
                texture_atlas: resolver.resolve(tex),
            })
            .collect()
    }

    /// Sends every non-empty batch to the sink and empties the batcher.
    pub fn flush(&mut self, sink: &dyn NativeSink, resolver: &AtlasResolver) -> usize {
        let batches = std::mem::take(&mut self.batches);
        let mut sent = 0;
        for (tex, b) in batches {
            if b.is_empty() {
                continue;
            }
            let texture_atlas = resolver.resolve(&tex);
            log::trace!(
                "gui batch {} atlas={:?} verts={} indices={}",
                tex,
                texture_atlas,
                b.vertex_count(),
                b.indices.len()
            );
            sink.send_gui_buffer_command(GuiBufferCommand {
                texture_name: tex.path.clone(),
                index_buffer: b.indices,
                vertex_buffer: b.vertices,
                texture_atlas,
            });
            sent += 1;
        }
        sent
    }
}
