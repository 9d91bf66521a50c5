use std::sync::Arc;

use nova_blocks::{BlockRegistry, BlockState};
use nova_chunk::BlockAccess;
use nova_geom::BlockPos;

use crate::capture::VertexSink;
use crate::face::Face;

/// Full-bright skylight value in the packed lightmap.
pub const FULL_SKY: u16 = 240;
pub const FULL_BLOCK: u16 = 240;

/// Writes one block's geometry into a vertex sink, in world block coordinates.
/// Returns whether anything was emitted.
pub trait BlockRenderer: Send + Sync {
    fn render_block(
        &self,
        state: &BlockState<'_>,
        pos: BlockPos,
        world: &dyn BlockAccess,
        target: &mut dyn VertexSink,
    ) -> bool;
}

/// Renders every block as a unit cube, skipping faces hidden by a neighbour.
pub struct CubeBlockRenderer {
    registry: Arc<BlockRegistry>,
}

impl CubeBlockRenderer {
    pub fn new(registry: Arc<BlockRegistry>) -> Self {
        Self { registry }
    }

    /// A face is hidden behind an opaque neighbour, or between two
    /// non-opaque blocks of the same type (water against water).
    fn face_hidden(&self, state: &BlockState<'_>, world: &dyn BlockAccess, at: BlockPos) -> bool {
        let nb = world.block_at(at);
        if nb.id == 0 {
            return false;
        }
        match self.registry.get(nb.id) {
            Some(ty) if ty.is_opaque() => true,
            Some(ty) => ty.id == state.ty.id,
            None => false,
        }
    }
}

impl BlockRenderer for CubeBlockRenderer {
    fn render_block(
        &self,
        state: &BlockState<'_>,
        pos: BlockPos,
        world: &dyn BlockAccess,
        target: &mut dyn VertexSink,
    ) -> bool {
        let uv = self.registry.materials.uv(state.ty.material);
        let block_light = if state.ty.emissive { FULL_BLOCK } else { 0 };
        let mut emitted = false;
        for face in Face::ALL {
            if self.face_hidden(state, world, face.neighbor(pos)) {
                continue;
            }
            let n = face.normal();
            let corners = face.corners(pos);
            let st = face.corner_st();
            for (c, (s, t)) in corners.iter().zip(st) {
                let u = uv.min_u + (uv.max_u - uv.min_u) * s;
                let v = uv.max_v - (uv.max_v - uv.min_v) * t;
                target.pos(c.x as f64, c.y as f64, c.z as f64);
                target.color(255, 255, 255, 255);
                target.tex(u as f64, v as f64);
                target.lightmap(FULL_SKY, block_light);
                target.normal(n.x, n.y, n.z);
                target.end_vertex();
            }
            emitted = true;
        }
        emitted
    }
}
