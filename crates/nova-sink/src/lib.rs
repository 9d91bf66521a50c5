//! The native renderer boundary: wire structs handed across it and the sink trait.
//!
//! The renderer itself lives outside this workspace. `RecordingSink` and `StatsSink`
//! stand in for it in tests and in the demo binary.
#![forbid(unsafe_code)]

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use hashbrown::{HashMap, HashSet};
use nova_geom::BlockPos;
use parking_lot::Mutex;

/// Attribute layout tag the native side uses to interpret raw vertex words.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum VertexFormat {
    Pos = 0,
    PosUv = 1,
    PosUvLightmapUvNormalTangent = 2,
    PosUvColor = 3,
}

impl VertexFormat {
    #[inline]
    pub fn ordinal(self) -> i32 {
        self as i32
    }
}

/// Which native texture atlas a GUI texture lives in.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum TextureAtlas {
    /// Texture could not be resolved to any atlas.
    None = -1,
    Terrain = 0,
    Entities = 1,
    Gui = 2,
    Particles = 3,
    Effects = 4,
    Font = 5,
}

impl TextureAtlas {
    #[inline]
    pub fn ordinal(self) -> i32 {
        self as i32
    }
}

/// Identity of one chunk's geometry in the native sink: chunk slot index plus block-space origin.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ChunkGeometryHandle {
    pub index: usize,
    pub origin: BlockPos,
}

impl ChunkGeometryHandle {
    #[inline]
    pub const fn new(index: usize, origin: BlockPos) -> Self {
        Self { index, origin }
    }
}

impl fmt::Display for ChunkGeometryHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}@{}", self.index, self.origin)
    }
}

/// Packaged mesh for one (chunk, filter) pair. Owned by the sink once submitted.
#[derive(Clone, Debug, PartialEq)]
pub struct ChunkRenderObject {
    pub format: VertexFormat,
    pub handle: ChunkGeometryHandle,
    /// Interleaved vertex words; floats are stored as their bit patterns.
    pub vertex_data: Vec<u32>,
    pub indices: Vec<u32>,
}

impl ChunkRenderObject {
    #[inline]
    pub fn id(&self) -> usize {
        self.handle.index
    }

    #[inline]
    pub fn origin(&self) -> BlockPos {
        self.handle.origin
    }

    pub fn byte_size(&self) -> usize {
        (self.vertex_data.len() + self.indices.len()) * std::mem::size_of::<u32>()
    }
}

/// One texture's worth of GUI geometry for the current screen.
#[derive(Clone, Debug, PartialEq)]
pub struct GuiBufferCommand {
    /// Texture path without its namespace, e.g. `textures/gui/widgets.png`.
    pub texture_name: String,
    pub index_buffer: Vec<u32>,
    /// 8 floats per vertex: x, y, z, u, v, r, g, b.
    pub vertex_buffer: Vec<f32>,
    pub texture_atlas: TextureAtlas,
}

impl GuiBufferCommand {
    #[inline]
    pub fn index_buffer_size(&self) -> usize {
        self.index_buffer.len()
    }

    #[inline]
    pub fn vertex_buffer_size(&self) -> usize {
        self.vertex_buffer.len()
    }
}

/// The native renderer. Every method may be called concurrently from compile workers.
pub trait NativeSink: Send + Sync {
    fn add_chunk_geometry_for_filter(&self, filter: &str, object: ChunkRenderObject);
    fn remove_chunk_geometry_for_filter(&self, filter: &str, handle: ChunkGeometryHandle);
    fn send_gui_buffer_command(&self, command: GuiBufferCommand);
    fn clear_gui_buffers(&self);
}

#[derive(Clone, Debug, PartialEq)]
pub enum SinkCall {
    AddChunk {
        filter: String,
        object: ChunkRenderObject,
    },
    RemoveChunk {
        filter: String,
        handle: ChunkGeometryHandle,
    },
    GuiCommand(GuiBufferCommand),
    ClearGui,
}

/// Records every call in arrival order and tracks which geometry is currently resident.
#[derive(Default)]
pub struct RecordingSink {
    calls: Mutex<Vec<SinkCall>>,
    live: Mutex<HashSet<(String, ChunkGeometryHandle)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<SinkCall> {
        self.calls.lock().clone()
    }

    /// Returns and forgets the recorded calls; resident geometry is kept.
    pub fn take(&self) -> Vec<SinkCall> {
        std::mem::take(&mut *self.calls.lock())
    }

    pub fn len(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.lock().is_empty()
    }

    pub fn adds(&self) -> Vec<(String, ChunkRenderObject)> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                SinkCall::AddChunk { filter, object } => Some((filter.clone(), object.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn removes(&self) -> Vec<(String, ChunkGeometryHandle)> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                SinkCall::RemoveChunk { filter, handle } => Some((filter.clone(), *handle)),
                _ => None,
            })
            .collect()
    }

    pub fn gui_commands(&self) -> Vec<GuiBufferCommand> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                SinkCall::GuiCommand(cmd) => Some(cmd.clone()),
                _ => None,
            })
            .collect()
    }

    /// Geometry added and not yet removed, sorted for stable comparisons.
    pub fn live_geometry(&self) -> Vec<(String, ChunkGeometryHandle)> {
        let mut v: Vec<_> = self.live.lock().iter().cloned().collect();
        v.sort_by(|a, b| {
            (a.0.as_str(), a.1.index, a.1.origin).cmp(&(b.0.as_str(), b.1.index, b.1.origin))
        });
        v
    }
}

impl NativeSink for RecordingSink {
    fn add_chunk_geometry_for_filter(&self, filter: &str, object: ChunkRenderObject) {
        self.live.lock().insert((filter.to_string(), object.handle));
        self.calls.lock().push(SinkCall::AddChunk {
            filter: filter.to_string(),
            object,
        });
    }

    fn remove_chunk_geometry_for_filter(&self, filter: &str, handle: ChunkGeometryHandle) {
        self.live.lock().remove(&(filter.to_string(), handle));
        self.calls.lock().push(SinkCall::RemoveChunk {
            filter: filter.to_string(),
            handle,
        });
    }

    fn send_gui_buffer_command(&self, command: GuiBufferCommand) {
        self.calls.lock().push(SinkCall::GuiCommand(command));
    }

    fn clear_gui_buffers(&self) {
        self.calls.lock().push(SinkCall::ClearGui);
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SinkStats {
    pub adds: usize,
    pub removes: usize,
    pub gui_commands: usize,
    pub gui_clears: usize,
    pub resident_objects: usize,
    pub resident_bytes: usize,
    /// Removes that named geometry the sink never held.
    pub stray_removes: usize,
}

/// Counts traffic and keeps per-filter residency, discarding the payloads.
#[derive(Default)]
pub struct StatsSink {
    adds: AtomicUsize,
    removes: AtomicUsize,
    gui_commands: AtomicUsize,
    gui_clears: AtomicUsize,
    stray_removes: AtomicUsize,
    resident: Mutex<HashMap<(String, ChunkGeometryHandle), usize>>,
}

impl StatsSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> SinkStats {
        let resident = self.resident.lock();
        SinkStats {
            adds: self.adds.load(Ordering::Relaxed),
            removes: self.removes.load(Ordering::Relaxed),
            gui_commands: self.gui_commands.load(Ordering::Relaxed),
            gui_clears: self.gui_clears.load(Ordering::Relaxed),
            resident_objects: resident.len(),
            resident_bytes: resident.values().sum(),
            stray_removes: self.stray_removes.load(Ordering::Relaxed),
        }
    }

    /// Resident object count per filter name, sorted by name.
    pub fn resident_by_filter(&self) -> Vec<(String, usize)> {
        let resident = self.resident.lock();
        let mut per: HashMap<&str, usize> = HashMap::new();
        for (filter, _) in resident.keys() {
            *per.entry(filter.as_str()).or_default() += 1;
        }
        let mut v: Vec<_> = per.into_iter().map(|(k, n)| (k.to_string(), n)).collect();
        v.sort();
        v
    }
}

impl NativeSink for StatsSink {
    fn add_chunk_geometry_for_filter(&self, filter: &str, object: ChunkRenderObject) {
        self.adds.fetch_add(1, Ordering::Relaxed);
        log::trace!(
            "sink add {} {} ({} words, {} indices)",
            filter,
            object.handle,
            object.vertex_data.len(),
            object.indices.len()
        );
        let bytes = object.byte_size();
        self.resident
            .lock()
            .insert((filter.to_string(), object.handle), bytes);
    }

    fn remove_chunk_geometry_for_filter(&self, filter: &str, handle: ChunkGeometryHandle) {
        self.removes.fetch_add(1, Ordering::Relaxed);
        if self
            .resident
            .lock()
            .remove(&(filter.to_string(), handle))
            .is_none()
        {
            self.stray_removes.fetch_add(1, Ordering::Relaxed);
            log::trace!("sink remove of absent {} {}", filter, handle);
        }
    }

    fn send_gui_buffer_command(&self, command: GuiBufferCommand) {
        self.gui_commands.fetch_add(1, Ordering::Relaxed);
        log::trace!(
            "sink gui {} atlas={} ({} indices)",
            command.texture_name,
            command.texture_atlas.ordinal(),
            command.index_buffer_size()
        );
    }

    fn clear_gui_buffers(&self) {
        self.gui_clears.fetch_add(1, Ordering::Relaxed);
    }
}
