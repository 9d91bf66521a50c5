use std::sync::Arc;
use std::time::Duration;

use nova_blocks::{Block, BlockRegistry, FilterSet, GeometryFilter};
use nova_chunk::SectionMap;
use nova_geom::{BlockBox, BlockPos};
use nova_mesh_cpu::{ChunkState, CubeBlockRenderer};
use nova_runtime::{JobOutcome, Runtime, RuntimeConfig};
use nova_sink::{ChunkGeometryHandle, RecordingSink};
use proptest::prelude::*;

const MATERIALS: &str = r#"
[materials]
stone = { tile = [1, 0] }
"#;

const BLOCKS: &str = r#"
[[blocks]]
name = "stone"
id = 1

[[blocks]]
name = "water"
id = 2
solid = false
"#;

const WAIT: Duration = Duration::from_secs(10);

fn setup(world: SectionMap, workers: usize) -> (Runtime, Arc<RecordingSink>) {
    let reg = Arc::new(BlockRegistry::from_toml_strs(MATERIALS, BLOCKS).unwrap());
    let sink = Arc::new(RecordingSink::new());
    let rt = Runtime::new(
        RuntimeConfig {
            workers,
            log_every: 0,
        },
        Arc::new(world),
        reg.clone(),
        Arc::new(FilterSet::defaults()),
        Arc::new(CubeBlockRenderer::new(reg)),
        sink.clone(),
    );
    (rt, sink)
}

fn ground(radius: i32) -> SectionMap {
    let mut world = SectionMap::new();
    let r = radius * 16;
    world.fill(
        BlockBox::new(BlockPos::new(-r, 0, -r), BlockPos::new(r + 15, 3, r + 15)),
        Block::new(1),
    );
    world.set_block(BlockPos::new(2, 4, 2), Block::new(2));
    world
}

#[test]
fn grid_of_chunks_compiles_once_each() {
    let (rt, sink) = setup(ground(1), 3);
    let mut index = 0;
    for z in -1..=1 {
        for x in -1..=1 {
            rt.place_chunk(index, BlockPos::new(x * 16, 0, z * 16));
            index += 1;
        }
    }
    assert!(rt.wait_idle(WAIT));
    let results = rt.drain_results();
    let compiled = results
        .iter()
        .filter(|r| matches!(r.outcome, JobOutcome::Compiled(_)))
        .count();
    assert_eq!(compiled, 9);
    let live = sink.live_geometry();
    let terrain = live.iter().filter(|(f, _)| f == "gbuffers_terrain").count();
    let water = live.iter().filter(|(f, _)| f == "gbuffers_water").count();
    assert_eq!(terrain, 9);
    assert_eq!(water, 1);
    assert_eq!(rt.chunk_state(4), Some(ChunkState::Compiled));
    assert_eq!(rt.queue_debug_counts(), (0, 0, 0, 0));
}

#[test]
fn repositioned_chunk_leaves_no_ghost() {
    let (rt, sink) = setup(ground(2), 2);
    rt.place_chunk(0, BlockPos::ORIGIN);
    assert!(rt.wait_idle(WAIT));
    rt.place_chunk(0, BlockPos::new(32, 0, 0));
    assert!(rt.wait_idle(WAIT));
    assert_eq!(rt.chunk_origin(0), Some(BlockPos::new(32, 0, 0)));
    let live = sink.live_geometry();
    assert_eq!(
        live,
        vec![(
            "gbuffers_terrain".to_string(),
            ChunkGeometryHandle::new(0, BlockPos::new(32, 0, 0))
        )]
    );
}

#[test]
fn teardown_and_remove_clear_sink() {
    let (rt, sink) = setup(ground(0), 1);
    rt.place_chunk(5, BlockPos::ORIGIN);
    assert!(rt.wait_idle(WAIT));
    assert_eq!(rt.teardown(5), 2);
    assert!(sink.live_geometry().is_empty());
    assert!(rt.remove_chunk(5));
    assert_eq!(rt.chunk_count(), 0);
    assert!(!rt.schedule_compile(5));
}

#[test]
fn reload_filters_moves_geometry_to_new_names() {
    let (rt, sink) = setup(ground(0), 2);
    rt.place_chunk(0, BlockPos::ORIGIN);
    assert!(rt.wait_idle(WAIT));
    let mut set = FilterSet::new();
    set.insert("everything", GeometryFilter::parse("").unwrap())
        .unwrap();
    assert_eq!(rt.reload_filters(Arc::new(set)), 1);
    assert!(rt.wait_idle(WAIT));
    assert_eq!(
        sink.live_geometry(),
        vec![(
            "everything".to_string(),
            ChunkGeometryHandle::new(0, BlockPos::ORIGIN)
        )]
    );
    assert_eq!(rt.submitted_filters(0), Some(vec!["everything".to_string()]));
}

#[test]
fn world_swap_is_picked_up_by_next_compile() {
    let (rt, sink) = setup(SectionMap::new(), 1);
    rt.place_chunk(0, BlockPos::ORIGIN);
    assert!(rt.wait_idle(WAIT));
    assert!(sink.live_geometry().is_empty());
    rt.set_world(Arc::new(ground(0)));
    rt.schedule_compile(0);
    assert!(rt.wait_idle(WAIT));
    assert_eq!(sink.live_geometry().len(), 2);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    // However many compiles are queued back to back, the sink ends with exactly
    // the latest geometry and at most one job per burst did real work last.
    #[test]
    fn repeated_schedules_converge(bursts in 1usize..20) {
        let (rt, sink) = setup(ground(0), 4);
        rt.place_chunk(0, BlockPos::ORIGIN);
        for _ in 0..bursts {
            rt.schedule_compile(0);
            rt.schedule_compile_urgent(0);
        }
        prop_assert!(rt.wait_idle(WAIT));
        let results = rt.drain_results();
        prop_assert_eq!(results.len(), 1 + bursts * 2);
        let last_rev = results.iter().map(|r| r.rev).max().unwrap();
        for r in &results {
            if r.rev == last_rev {
                prop_assert!(matches!(r.outcome, JobOutcome::Compiled(_)));
            }
        }
        prop_assert_eq!(sink.live_geometry().len(), 2);
    }
}
