mod config;
mod scene;
mod watch;

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use nova_gui::{FrameContext, GuiDrawBatcher, nova_draw_screen};
use nova_mesh_cpu::CubeBlockRenderer;
use nova_runtime::{JobOutcome, Runtime};
use nova_sink::StatsSink;

use crate::config::NovaConfig;
use crate::scene::{DemoBlocks, DemoMenu};

const IDLE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless driver for the chunk and GUI geometry bridge")]
struct Cli {
    /// Top-level config file
    #[arg(long, default_value = "assets/nova.toml")]
    config: PathBuf,
    /// Compile workers (0 = available parallelism); overrides [runtime].workers
    #[arg(long)]
    workers: Option<usize>,
    /// Chunk columns around the centre; overrides [scene].radius
    #[arg(long)]
    radius: Option<i32>,
    /// GUI frames to simulate
    #[arg(long, default_value_t = 120)]
    frames: u32,
    /// Keep running and reload filters when the config file changes
    #[arg(long)]
    watch: bool,
    /// Log filter when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log: String,
}

fn main() {
    let cli = Cli::parse();
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log.as_str()))
        .format_timestamp_millis()
        .try_init();
    if let Err(e) = run(cli) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let mut cfg = NovaConfig::load(&cli.config)?;
    if let Some(w) = cli.workers {
        cfg.runtime.workers = w;
    }
    if let Some(r) = cli.radius {
        cfg.scene.radius = r.max(0);
    }

    let reg = Arc::new(cfg.load_registry()?);
    let filters = Arc::new(cfg.filter_set()?);
    let resolver = cfg.atlas_resolver();
    log::info!(
        "registry: {} block(s), {} material(s); filters: [{}]",
        reg.len(),
        reg.materials.materials.len(),
        filters.names().collect::<Vec<_>>().join(", ")
    );

    let blocks = DemoBlocks::resolve(&reg)?;
    let world = Arc::new(scene::build_world(&blocks, &cfg.scene));
    let sink = Arc::new(StatsSink::new());
    let rt = Runtime::new(
        cfg.runtime_config(),
        world,
        reg.clone(),
        filters,
        Arc::new(CubeBlockRenderer::new(reg)),
        sink.clone(),
    );

    let origins = scene::chunk_origins(&cfg.scene);
    let t0 = Instant::now();
    for (i, origin) in origins.iter().enumerate() {
        rt.place_chunk(i, *origin);
    }
    settle(&rt, "initial compile", t0)?;
    log_sink(&sink);

    let t0 = Instant::now();
    let moves = scene::camera_shift(&cfg.scene, &origins);
    for (i, to) in &moves {
        rt.place_chunk(*i, *to);
        rt.schedule_compile_urgent(*i);
    }
    settle(&rt, "camera shift", t0)?;
    log_sink(&sink);

    run_gui_frames(&resolver, sink.as_ref(), cli.frames);

    if cli.watch {
        let rx = watch::spawn_config_watcher(cli.config.clone());
        while rx.recv().is_ok() {
            // editors often emit several events per save
            std::thread::sleep(Duration::from_millis(100));
            while rx.try_recv().is_ok() {}
            match config::reload_filter_set(&cli.config) {
                Ok(set) => {
                    let t0 = Instant::now();
                    rt.reload_filters(set);
                    settle(&rt, "filter reload", t0)?;
                    log_sink(&sink);
                }
                Err(e) => log::warn!("keeping current filters: {}", e),
            }
        }
        log::warn!("config watcher stopped");
    }
    Ok(())
}

/// Waits for both lanes to drain and summarises the results.
fn settle(rt: &Runtime, phase: &str, t0: Instant) -> Result<(), Box<dyn Error>> {
    if !rt.wait_idle(IDLE_TIMEOUT) {
        let (qu, iu, qb, ib) = rt.queue_debug_counts();
        return Err(format!("{phase}: runtime not idle after {:?} (q_u={qu} if_u={iu} q_bg={qb} if_bg={ib})", IDLE_TIMEOUT).into());
    }
    let results = rt.drain_results();
    let (mut compiled, mut stale, mut quads) = (0usize, 0usize, 0usize);
    for r in &results {
        match &r.outcome {
            JobOutcome::Compiled(stats) => {
                compiled += 1;
                quads += stats.quads;
            }
            JobOutcome::Stale | JobOutcome::Missing => stale += 1,
        }
    }
    let ms = t0.elapsed().as_millis().min(u128::from(u32::MAX)) as u32;
    log::info!(
        target: "perf",
        "phase={} ms={} compiled={} skipped={} quads={} chunks={}",
        phase,
        ms,
        compiled,
        stale,
        quads,
        rt.chunk_count()
    );
    Ok(())
}

fn log_sink(sink: &StatsSink) {
    let s = sink.stats();
    log::info!(
        "sink: adds={} removes={} resident={} ({} KiB) stray_removes={}",
        s.adds,
        s.removes,
        s.resident_objects,
        s.resident_bytes / 1024,
        s.stray_removes
    );
    for (filter, n) in sink.resident_by_filter() {
        log::debug!("  {}: {} object(s)", filter, n);
    }
}

/// Sweeps the mouse diagonally across a 2x-scaled display, then parks it on the
/// first button; only hover changes redraw.
fn run_gui_frames(resolver: &nova_gui::AtlasResolver, sink: &StatsSink, frames: u32) {
    let (dw, dh, scale) = (1708, 960, 2);
    let (sw, sh) = (dw / scale, dh / scale);
    let mut gui = GuiDrawBatcher::new(resolver.white_texture().clone());
    let mut menu = DemoMenu::new(sw, sh);
    let park = menu
        .button_rect(0)
        .map(|b| (b.x + b.w / 2, b.y + b.h / 2))
        .unwrap_or((sw / 2, sh / 2));
    let (mut redraws, mut commands) = (0u32, 0usize);
    let t0 = Instant::now();
    for f in 0..frames {
        let (raw_x, raw_y) = if f + 1 == frames {
            // inverse of FrameContext::mouse
            (park.0 * dw / sw, (sh - 1 - park.1) * dh / sh)
        } else {
            let t = f as f32 / frames.max(1) as f32;
            ((t * dw as f32) as i32, (t * dh as f32) as i32)
        };
        let ctx = FrameContext {
            display_width: dw,
            display_height: dh,
            scaled_width: sw,
            scaled_height: sh,
            raw_mouse_x: raw_x,
            raw_mouse_y: raw_y,
            resolver,
        };
        let report = nova_draw_screen(&mut gui, &mut menu, &ctx, sink);
        if report.redrawn {
            redraws += 1;
            commands += report.commands;
        }
    }
    let ms = t0.elapsed().as_millis().min(u128::from(u32::MAX)) as u32;
    log::info!(
        target: "perf",
        "gui_frames={} redraws={} commands={} hovered={:?} ms={}",
        frames,
        redraws,
        commands,
        menu.hovered(),
        ms
    );
}
