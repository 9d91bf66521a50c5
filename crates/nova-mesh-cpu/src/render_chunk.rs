//! Per-section chunk mesh assembly.
//!
//! A [`RenderChunk`] owns one capture buffer per filter. A compile runs
//! `pre_render`, then `capture_block` for every block of the section, then
//! `finalize`, which packages each non-empty buffer into a
//! [`ChunkRenderObject`] and hands it to the sink. Which filters were submitted
//! is remembered so `teardown` removes exactly those.

use std::sync::Arc;
use std::time::Instant;

use hashbrown::HashSet;
use nova_blocks::{BlockRegistry, BlockState, FilterSet};
use nova_chunk::BlockAccess;
use nova_geom::{BlockBox, BlockPos};
use nova_sink::{ChunkGeometryHandle, ChunkRenderObject, NativeSink};

use crate::capture::{CapturingVertexBuffer, DrawMode, VertexSink};
use crate::index::{IndexList, Winding};
use crate::layout::VertexLayout;
use crate::renderer::BlockRenderer;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ChunkState {
    Uninitialized,
    Compiling,
    Compiled,
    TornDown,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompileStats {
    pub blocks: usize,
    /// Block renders into filter buffers; a block matching two filters counts twice.
    pub captures: usize,
    pub quads: usize,
    pub submitted: usize,
    /// Filters that had geometry last time and none now.
    pub stale_removed: usize,
    pub micros: u128,
}

pub struct RenderChunk {
    index: usize,
    origin: BlockPos,
    layout: VertexLayout,
    filters: Arc<FilterSet>,
    /// Parallel to `filters.iter()`.
    buffers: Vec<CapturingVertexBuffer>,
    submitted: HashSet<String>,
    state: ChunkState,
}

impl RenderChunk {
    pub fn new(index: usize, origin: BlockPos, filters: Arc<FilterSet>) -> Self {
        Self::with_layout(index, origin, filters, VertexLayout::BLOCK)
    }

    pub fn with_layout(
        index: usize,
        origin: BlockPos,
        filters: Arc<FilterSet>,
        layout: VertexLayout,
    ) -> Self {
        let buffers = filters
            .iter()
            .map(|_| CapturingVertexBuffer::with_layout(origin, layout))
            .collect();
        Self {
            index,
            origin,
            layout,
            filters,
            buffers,
            submitted: HashSet::new(),
            state: ChunkState::Uninitialized,
        }
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub fn origin(&self) -> BlockPos {
        self.origin
    }

    #[inline]
    pub fn state(&self) -> ChunkState {
        self.state
    }

    #[inline]
    pub fn handle(&self) -> ChunkGeometryHandle {
        ChunkGeometryHandle::new(self.index, self.origin)
    }

    #[inline]
    pub fn bounds(&self) -> BlockBox {
        BlockBox::section(self.origin)
    }

    pub fn filters(&self) -> &Arc<FilterSet> {
        &self.filters
    }

    pub fn buffer(&self, filter: &str) -> Option<&CapturingVertexBuffer> {
        self.filters
            .names()
            .position(|n| n == filter)
            .map(|i| &self.buffers[i])
    }

    /// Filters with geometry resident in the sink: filter order first, then any
    /// left over from a previous filter set, sorted.
    pub fn submitted_filters(&self) -> Vec<String> {
        let mut out: Vec<String> = self
            .filters
            .names()
            .filter(|n| self.submitted.contains(*n))
            .map(str::to_string)
            .collect();
        let mut rest: Vec<String> = self
            .submitted
            .iter()
            .filter(|n| !self.filters.contains(n))
            .cloned()
            .collect();
        rest.sort();
        out.extend(rest);
        out
    }

    /// Moves the chunk to a new origin. Geometry submitted at the old origin is removed first.
    pub fn reposition(&mut self, origin: BlockPos, sink: &dyn NativeSink) {
        if origin == self.origin {
            return;
        }
        self.teardown(sink);
        self.origin = origin;
        self.rebuild_buffers();
    }

    /// Installs a new filter set. Callers tear down first; anything still
    /// submitted stays tracked and is removed on the next teardown.
    pub fn set_filters(&mut self, filters: Arc<FilterSet>) {
        self.filters = filters;
        self.rebuild_buffers();
    }

    fn rebuild_buffers(&mut self) {
        let (origin, layout) = (self.origin, self.layout);
        self.buffers = self
            .filters
            .iter()
            .map(|_| CapturingVertexBuffer::with_layout(origin, layout))
            .collect();
    }

    /// Fresh buffers at the current origin, opened and translated into chunk space.
    pub fn pre_render(&mut self) {
        self.rebuild_buffers();
        let o = self.origin;
        for buf in &mut self.buffers {
            buf.begin(DrawMode::Quads, self.layout);
            buf.set_translation(-o.x as f64, -o.y as f64, -o.z as f64);
        }
        self.state = ChunkState::Compiling;
    }

    /// Renders `state` into every filter buffer whose filter accepts it.
    /// Returns how many buffers received geometry.
    pub fn capture_block(
        &mut self,
        state: &BlockState<'_>,
        pos: BlockPos,
        world: &dyn BlockAccess,
        renderer: &dyn BlockRenderer,
    ) -> usize {
        debug_assert_eq!(self.state, ChunkState::Compiling);
        let mut hits = 0;
        for ((_, filter), buf) in self.filters.iter().zip(self.buffers.iter_mut()) {
            if filter.matches(state) && renderer.render_block(state, pos, world, buf) {
                hits += 1;
            }
        }
        hits
    }

    /// Submits every non-empty buffer and removes filters that went empty.
    pub fn finalize(&mut self, sink: &dyn NativeSink) -> CompileStats {
        let mut stats = CompileStats::default();
        let handle = self.handle();
        let mut now = HashSet::with_capacity(self.buffers.len());
        for ((name, _), buf) in self.filters.iter().zip(self.buffers.iter_mut()) {
            buf.finish_drawing();
            if buf.is_empty() {
                if self.submitted.contains(name) {
                    log::debug!("chunk {} filter {} emptied; removing", handle, name);
                    sink.remove_chunk_geometry_for_filter(name, handle);
                    stats.stale_removed += 1;
                }
                continue;
            }
            let quads = buf.vertex_count() / 4;
            let vertex_data = buf.take_raw_data();
            let indices = IndexList::for_quads(quads, Winding::CounterClockwise).into_vec();
            log::debug!(
                "chunk {} filter {}: {} quads, {} words",
                handle,
                name,
                quads,
                vertex_data.len()
            );
            sink.add_chunk_geometry_for_filter(
                name,
                ChunkRenderObject {
                    format: self.layout.format,
                    handle,
                    vertex_data,
                    indices,
                },
            );
            now.insert(name.to_string());
            stats.quads += quads;
            stats.submitted += 1;
        }
        // Geometry tracked under filters no longer in the set cannot be refreshed.
        for name in self.submitted.iter() {
            if !self.filters.contains(name) {
                sink.remove_chunk_geometry_for_filter(name, handle);
                stats.stale_removed += 1;
            }
        }
        self.submitted = now;
        self.state = ChunkState::Compiled;
        stats
    }

    /// Full compile of the section: pre-render, capture every non-air block, finalize.
    pub fn compile(
        &mut self,
        world: &dyn BlockAccess,
        registry: &BlockRegistry,
        renderer: &dyn BlockRenderer,
        sink: &dyn NativeSink,
    ) -> CompileStats {
        let t0 = Instant::now();
        self.pre_render();
        let mut blocks = 0;
        let mut captures = 0;
        for pos in self.bounds().iter() {
            let block = world.block_at(pos);
            if block.id == 0 {
                continue;
            }
            let Some(state) = registry.state(block) else {
                log::trace!("unknown block id {} at {}", block.id, pos);
                continue;
            };
            blocks += 1;
            captures += self.capture_block(&state, pos, world, renderer);
        }
        let mut stats = self.finalize(sink);
        stats.blocks = blocks;
        stats.captures = captures;
        stats.micros = t0.elapsed().as_micros();
        stats
    }

    /// Removes every submitted filter's geometry and clears the buffers.
    pub fn teardown(&mut self, sink: &dyn NativeSink) -> usize {
        let handle = self.handle();
        let names = self.submitted_filters();
        for name in &names {
            log::debug!("chunk {} remove filter {}", handle, name);
            sink.remove_chunk_geometry_for_filter(name, handle);
        }
        self.submitted.clear();
        for buf in &mut self.buffers {
            buf.reset();
        }
        self.state = ChunkState::TornDown;
        names.len()
    }
}
