use std::sync::Arc;

use nova_blocks::{Block, BlockRegistry, FilterSet, GeometryFilter};
use nova_chunk::SectionMap;
use nova_geom::BlockPos;
use nova_mesh_cpu::{ChunkState, CubeBlockRenderer, RenderChunk};
use nova_sink::{ChunkGeometryHandle, RecordingSink, SinkCall, VertexFormat};

const MATERIALS: &str = r#"
[materials]
stone = { tile = [1, 0] }
glass = { tile = [1, 3] }
"#;

const BLOCKS: &str = r#"
[[blocks]]
name = "stone"
id = 1

[[blocks]]
name = "glass"
id = 2
transparent = true

[[blocks]]
name = "water"
id = 3
solid = false
"#;

fn registry() -> Arc<BlockRegistry> {
    Arc::new(BlockRegistry::from_toml_strs(MATERIALS, BLOCKS).unwrap())
}

fn filters(defs: &[(&str, &str)]) -> Arc<FilterSet> {
    let mut set = FilterSet::new();
    for (name, expr) in defs {
        set.insert(*name, GeometryFilter::parse(expr).unwrap()).unwrap();
    }
    Arc::new(set)
}

fn solid_and_water() -> Arc<FilterSet> {
    filters(&[("solid", "not_transparent"), ("water", "transparent")])
}

struct Fixture {
    reg: Arc<BlockRegistry>,
    renderer: CubeBlockRenderer,
    sink: RecordingSink,
}

fn fixture() -> Fixture {
    let reg = registry();
    Fixture {
        renderer: CubeBlockRenderer::new(reg.clone()),
        reg,
        sink: RecordingSink::new(),
    }
}

fn add_filters(sink: &RecordingSink) -> Vec<String> {
    sink.adds().into_iter().map(|(f, _)| f).collect()
}

#[test]
fn single_opaque_block_submits_one_face_per_side() {
    let fx = fixture();
    let origin = BlockPos::new(16, 0, 32);
    let mut world = SectionMap::new();
    world.set_block(origin.offset(3, 4, 5), Block::new(1));
    let mut chunk = RenderChunk::new(7, origin, solid_and_water());
    let stats = chunk.compile(&world, &fx.reg, &fx.renderer, &fx.sink);
    assert_eq!(chunk.state(), ChunkState::Compiled);
    assert_eq!(stats.blocks, 1);
    assert_eq!(stats.quads, 6);
    let adds = fx.sink.adds();
    assert_eq!(adds.len(), 1);
    let (filter, obj) = &adds[0];
    assert_eq!(filter, "solid");
    assert_eq!(obj.format, VertexFormat::PosUvLightmapUvNormalTangent);
    assert_eq!(obj.handle, ChunkGeometryHandle::new(7, origin));
    assert_eq!(obj.indices.len(), 6 * 6);
    assert_eq!(obj.vertex_data.len(), 6 * 4 * 7);
    // Positions are chunk-local.
    for v in obj.vertex_data.chunks(7) {
        let (x, y, z) = (
            f32::from_bits(v[0]),
            f32::from_bits(v[1]),
            f32::from_bits(v[2]),
        );
        assert!((3.0..=4.0).contains(&x), "{x}");
        assert!((4.0..=5.0).contains(&y), "{y}");
        assert!((5.0..=6.0).contains(&z), "{z}");
    }
}

#[test]
fn enclosed_face_yields_exactly_one_quad() {
    // A block boxed in on five sides by opaque neighbours outside the section shows a single face.
    let fx = fixture();
    let origin = BlockPos::ORIGIN;
    let mut world = SectionMap::new();
    let p = BlockPos::new(0, 0, 0);
    world.set_block(p, Block::new(1));
    for q in [
        p.offset(-1, 0, 0),
        p.offset(0, -1, 0),
        p.offset(0, 0, -1),
        p.offset(1, 0, 0),
        p.offset(0, 0, 1),
    ] {
        world.set_block(q, Block::new(1));
    }
    let mut chunk = RenderChunk::new(0, origin, filters(&[("solid", "name::stone")]));
    let only = BlockPos::new(0, 0, 0);
    chunk.pre_render();
    let state = fx.reg.state(world_block(&world, only)).unwrap();
    chunk.capture_block(&state, only, &world, &fx.renderer);
    chunk.finalize(&fx.sink);
    let adds = fx.sink.adds();
    assert_eq!(adds.len(), 1);
    assert_eq!(adds[0].1.indices.len(), 6);
    assert_eq!(adds[0].1.vertex_data.len(), 4 * 7);
}

fn world_block(world: &SectionMap, p: BlockPos) -> Block {
    use nova_chunk::BlockAccess;
    world.block_at(p)
}

#[test]
fn no_matching_blocks_submits_nothing() {
    let fx = fixture();
    let mut world = SectionMap::new();
    world.set_block(BlockPos::new(1, 1, 1), Block::new(1));
    let mut chunk = RenderChunk::new(0, BlockPos::ORIGIN, filters(&[("glassy", "name::glass")]));
    let stats = chunk.compile(&world, &fx.reg, &fx.renderer, &fx.sink);
    assert_eq!(stats.submitted, 0);
    assert!(fx.sink.adds().is_empty());
    assert!(chunk.submitted_filters().is_empty());
}

#[test]
fn empty_section_submits_nothing() {
    let fx = fixture();
    let world = SectionMap::new();
    let mut chunk = RenderChunk::new(0, BlockPos::ORIGIN, solid_and_water());
    chunk.compile(&world, &fx.reg, &fx.renderer, &fx.sink);
    assert!(fx.sink.is_empty());
}

#[test]
fn block_matching_two_filters_goes_to_both() {
    let fx = fixture();
    let mut world = SectionMap::new();
    world.set_block(BlockPos::new(2, 2, 2), Block::new(2));
    let set = filters(&[("transparent", "transparent"), ("glass", "name::glass")]);
    let mut chunk = RenderChunk::new(0, BlockPos::ORIGIN, set);
    chunk.compile(&world, &fx.reg, &fx.renderer, &fx.sink);
    assert_eq!(add_filters(&fx.sink), vec!["transparent", "glass"]);
    let adds = fx.sink.adds();
    assert_eq!(adds[0].1.vertex_data, adds[1].1.vertex_data);
}

#[test]
fn teardown_removes_exactly_submitted_filters() {
    let fx = fixture();
    let origin = BlockPos::new(0, 16, 0);
    let mut world = SectionMap::new();
    world.set_block(origin.offset(1, 1, 1), Block::new(1));
    world.set_block(origin.offset(5, 1, 1), Block::new(3));
    let set = filters(&[
        ("solid", "not_transparent"),
        ("water", "name::water"),
        ("glass", "name::glass"),
    ]);
    let mut chunk = RenderChunk::new(3, origin, set);
    chunk.compile(&world, &fx.reg, &fx.renderer, &fx.sink);
    assert_eq!(chunk.submitted_filters(), vec!["solid", "water"]);
    fx.sink.take();
    let removed = chunk.teardown(&fx.sink);
    assert_eq!(removed, 2);
    let removes = fx.sink.removes();
    let h = ChunkGeometryHandle::new(3, origin);
    assert_eq!(
        removes,
        vec![("solid".to_string(), h), ("water".to_string(), h)]
    );
    assert!(fx.sink.adds().is_empty());
    assert!(fx.sink.live_geometry().is_empty());
    assert_eq!(chunk.state(), ChunkState::TornDown);
    // A second teardown has nothing left to remove.
    assert_eq!(chunk.teardown(&fx.sink), 0);
}

#[test]
fn recompile_removes_filters_that_went_empty() {
    let fx = fixture();
    let mut world = SectionMap::new();
    world.set_block(BlockPos::new(1, 1, 1), Block::new(1));
    world.set_block(BlockPos::new(4, 1, 1), Block::new(3));
    let mut chunk = RenderChunk::new(0, BlockPos::ORIGIN, solid_and_water());
    chunk.compile(&world, &fx.reg, &fx.renderer, &fx.sink);
    assert_eq!(fx.sink.live_geometry().len(), 2);

    world.set_block(BlockPos::new(4, 1, 1), Block::AIR);
    fx.sink.take();
    let stats = chunk.compile(&world, &fx.reg, &fx.renderer, &fx.sink);
    assert_eq!(stats.stale_removed, 1);
    assert_eq!(add_filters(&fx.sink), vec!["solid"]);
    assert_eq!(
        fx.sink.removes(),
        vec![(
            "water".to_string(),
            ChunkGeometryHandle::new(0, BlockPos::ORIGIN)
        )]
    );
    assert_eq!(chunk.submitted_filters(), vec!["solid"]);
}

#[test]
fn reposition_tears_down_old_origin() {
    let fx = fixture();
    let mut world = SectionMap::new();
    world.set_block(BlockPos::new(1, 1, 1), Block::new(1));
    world.set_block(BlockPos::new(17, 1, 1), Block::new(1));
    let mut chunk = RenderChunk::new(9, BlockPos::ORIGIN, solid_and_water());
    chunk.compile(&world, &fx.reg, &fx.renderer, &fx.sink);
    let moved = BlockPos::new(16, 0, 0);
    chunk.reposition(moved, &fx.sink);
    assert_eq!(
        fx.sink.removes(),
        vec![(
            "solid".to_string(),
            ChunkGeometryHandle::new(9, BlockPos::ORIGIN)
        )]
    );
    chunk.compile(&world, &fx.reg, &fx.renderer, &fx.sink);
    assert_eq!(
        fx.sink.live_geometry(),
        vec![("solid".to_string(), ChunkGeometryHandle::new(9, moved))]
    );
}

#[test]
fn adjacent_water_hides_shared_faces() {
    let fx = fixture();
    let mut world = SectionMap::new();
    world.set_block(BlockPos::new(1, 1, 1), Block::new(3));
    world.set_block(BlockPos::new(2, 1, 1), Block::new(3));
    let mut chunk = RenderChunk::new(0, BlockPos::ORIGIN, solid_and_water());
    let stats = chunk.compile(&world, &fx.reg, &fx.renderer, &fx.sink);
    assert_eq!(stats.quads, 10);
}

#[test]
fn damaged_blocks_reach_damage_filter() {
    let fx = fixture();
    let mut world = SectionMap::new();
    world.set_block(BlockPos::new(1, 1, 1), Block::new(1).with_damage(4));
    world.set_block(BlockPos::new(8, 1, 1), Block::new(1));
    let mut chunk = RenderChunk::new(0, BlockPos::ORIGIN, Arc::new(FilterSet::defaults()));
    chunk.compile(&world, &fx.reg, &fx.renderer, &fx.sink);
    let adds = fx.sink.adds();
    assert_eq!(add_filters(&fx.sink), vec!["gbuffers_terrain", "gbuffers_damagedblock"]);
    assert_eq!(adds[0].1.indices.len(), 12 * 6);
    assert_eq!(adds[1].1.indices.len(), 6 * 6);
}

#[test]
fn filter_swap_removes_geometry_of_dropped_filters() {
    let fx = fixture();
    let mut world = SectionMap::new();
    world.set_block(BlockPos::new(1, 1, 1), Block::new(1));
    let mut chunk = RenderChunk::new(0, BlockPos::ORIGIN, filters(&[("old", "solid")]));
    chunk.compile(&world, &fx.reg, &fx.renderer, &fx.sink);
    chunk.set_filters(filters(&[("new", "solid")]));
    chunk.compile(&world, &fx.reg, &fx.renderer, &fx.sink);
    let calls = fx.sink.calls();
    assert!(matches!(&calls[calls.len() - 1], SinkCall::RemoveChunk { filter, .. } if filter == "old"));
    assert_eq!(
        fx.sink.live_geometry(),
        vec![("new".to_string(), ChunkGeometryHandle::new(0, BlockPos::ORIGIN))]
    );
}
