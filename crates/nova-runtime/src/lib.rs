//! Compile scheduling: worker lanes that run chunk compiles against a shared sink.
#![forbid(unsafe_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, TryRecvError, select, unbounded};
use hashbrown::HashMap;
use nova_blocks::{BlockRegistry, FilterSet};
use nova_chunk::SectionMap;
use nova_geom::BlockPos;
use nova_mesh_cpu::{BlockRenderer, ChunkState, CompileStats, RenderChunk};
use nova_sink::NativeSink;
use parking_lot::{Mutex, RwLock};
use rayon::{ThreadPool, ThreadPoolBuilder};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Total compile workers; 0 picks the available parallelism.
    pub workers: usize,
    /// Emit an aggregated perf line every this many compiles; 0 disables it.
    pub log_every: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            workers: 0,
            log_every: 64,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct CompileJob {
    pub index: usize,
    pub rev: u64,
    pub job_id: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobKind {
    Urgent,
    Bg,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JobOutcome {
    Compiled(CompileStats),
    /// A newer compile or a teardown superseded this job.
    Stale,
    /// The chunk slot was removed before the job ran.
    Missing,
}

#[derive(Clone, Debug)]
pub struct JobOut {
    pub index: usize,
    pub origin: Option<BlockPos>,
    pub rev: u64,
    pub job_id: u64,
    pub kind: JobKind,
    pub outcome: JobOutcome,
    pub t_total_ms: u32,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
enum Lane {
    Urgent,
    Bg,
}

struct Slot {
    chunk: Mutex<RenderChunk>,
    rev: AtomicU64,
}

impl Slot {
    #[inline]
    fn bump(&self) -> u64 {
        self.rev.fetch_add(1, Ordering::AcqRel) + 1
    }

    #[inline]
    fn is_current(&self, rev: u64) -> bool {
        self.rev.load(Ordering::Acquire) == rev
    }
}

struct Shared {
    world: RwLock<Arc<SectionMap>>,
    filters: RwLock<Arc<FilterSet>>,
    registry: Arc<BlockRegistry>,
    renderer: Arc<dyn BlockRenderer>,
    sink: Arc<dyn NativeSink>,
    slots: RwLock<HashMap<usize, Arc<Slot>>>,
    log_every: usize,
    perf_count: AtomicUsize,
    perf_micros: AtomicU64,
    perf_quads: AtomicUsize,
}

impl Shared {
    fn slot(&self, index: usize) -> Option<Arc<Slot>> {
        self.slots.read().get(&index).cloned()
    }

    fn record_perf(&self, stats: &CompileStats) {
        if self.log_every == 0 {
            return;
        }
        self.perf_micros
            .fetch_add(stats.micros.min(u128::from(u64::MAX)) as u64, Ordering::Relaxed);
        self.perf_quads.fetch_add(stats.quads, Ordering::Relaxed);
        let n = self.perf_count.fetch_add(1, Ordering::Relaxed) + 1;
        if n % self.log_every == 0 {
            let micros = self.perf_micros.swap(0, Ordering::Relaxed);
            let quads = self.perf_quads.swap(0, Ordering::Relaxed);
            log::info!(
                target: "perf",
                "compile_avg_ms={:.3} quads_avg={} window={} total_compiles={}",
                micros as f64 / 1000.0 / self.log_every as f64,
                quads / self.log_every,
                self.log_every,
                n
            );
        }
    }
}

fn process_compile_job(job: CompileJob, lane: Lane, shared: &Shared, tx: &Sender<JobOut>) {
    let t_job_start = Instant::now();
    let kind = match lane {
        Lane::Urgent => JobKind::Urgent,
        Lane::Bg => JobKind::Bg,
    };
    let finish = |origin, outcome| {
        let t_total_ms = t_job_start.elapsed().as_millis().min(u128::from(u32::MAX)) as u32;
        let _ = tx.send(JobOut {
            index: job.index,
            origin,
            rev: job.rev,
            job_id: job.job_id,
            kind,
            outcome,
            t_total_ms,
        });
    };
    let Some(slot) = shared.slot(job.index) else {
        finish(None, JobOutcome::Missing);
        return;
    };
    if !slot.is_current(job.rev) {
        finish(None, JobOutcome::Stale);
        return;
    }
    let mut chunk = slot.chunk.lock();
    // The rev may have moved while this worker waited on the lock.
    if !slot.is_current(job.rev) {
        let origin = chunk.origin();
        drop(chunk);
        finish(Some(origin), JobOutcome::Stale);
        return;
    }
    let world = shared.world.read().clone();
    let stats = chunk.compile(
        world.as_ref(),
        &shared.registry,
        shared.renderer.as_ref(),
        shared.sink.as_ref(),
    );
    let origin = chunk.origin();
    drop(chunk);
    log::trace!(
        "compiled chunk {} at {} rev={} quads={} submitted={}",
        job.index,
        origin,
        job.rev,
        stats.quads,
        stats.submitted
    );
    shared.record_perf(&stats);
    finish(Some(origin), JobOutcome::Compiled(stats));
}

pub struct Runtime {
    job_tx_urgent: Sender<CompileJob>,
    job_tx_bg: Sender<CompileJob>,
    res_rx: Receiver<JobOut>,
    _urgent_pool: Arc<ThreadPool>,
    _bg_pool: Arc<ThreadPool>,
    shared: Arc<Shared>,
    next_job_id: AtomicU64,
    q_urgent: Arc<AtomicUsize>,
    q_bg: Arc<AtomicUsize>,
    inflight_urgent: Arc<AtomicUsize>,
    inflight_bg: Arc<AtomicUsize>,
    pub w_urgent: usize,
    pub w_bg: usize,
}

impl Runtime {
    pub fn new(
        cfg: RuntimeConfig,
        world: Arc<SectionMap>,
        registry: Arc<BlockRegistry>,
        filters: Arc<FilterSet>,
        renderer: Arc<dyn BlockRenderer>,
        sink: Arc<dyn NativeSink>,
    ) -> Self {
        let (job_tx_urgent, job_rx_urgent) = unbounded::<CompileJob>();
        let (job_tx_bg, job_rx_bg) = unbounded::<CompileJob>();
        let (res_tx, res_rx) = unbounded::<JobOut>();

        let worker_count = if cfg.workers > 0 {
            cfg.workers
        } else {
            thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(8)
        };
        let w_urgent = 1usize;
        let w_bg = worker_count.saturating_sub(w_urgent).max(1);

        let shared = Arc::new(Shared {
            world: RwLock::new(world),
            filters: RwLock::new(filters),
            registry,
            renderer,
            sink,
            slots: RwLock::new(HashMap::new()),
            log_every: cfg.log_every,
            perf_count: AtomicUsize::new(0),
            perf_micros: AtomicU64::new(0),
            perf_quads: AtomicUsize::new(0),
        });

        let q_urgent_ctr = Arc::new(AtomicUsize::new(0));
        let q_bg_ctr = Arc::new(AtomicUsize::new(0));
        let inflight_urgent_ctr = Arc::new(AtomicUsize::new(0));
        let inflight_bg_ctr = Arc::new(AtomicUsize::new(0));

        let urgent_pool = Arc::new(
            ThreadPoolBuilder::new()
                .num_threads(w_urgent)
                .thread_name(|i| format!("nova-urgent-{i}"))
                .build()
                .expect("urgent pool"),
        );
        for _ in 0..w_urgent {
            let rx = job_rx_urgent.clone();
            let tx = res_tx.clone();
            let shared = shared.clone();
            let q_urgent = q_urgent_ctr.clone();
            let inflight_urgent = inflight_urgent_ctr.clone();
            urgent_pool.spawn(move || {
                while let Ok(job) = rx.recv() {
                    inflight_urgent.fetch_add(1, Ordering::AcqRel);
                    q_urgent.fetch_sub(1, Ordering::AcqRel);
                    process_compile_job(job, Lane::Urgent, shared.as_ref(), &tx);
                    inflight_urgent.fetch_sub(1, Ordering::AcqRel);
                }
            });
        }

        let bg_pool = Arc::new(
            ThreadPoolBuilder::new()
                .num_threads(w_bg)
                .thread_name(|i| format!("nova-compile-{i}"))
                .build()
                .expect("compile pool"),
        );
        for _ in 0..w_bg {
            let bg_rx = job_rx_bg.clone();
            let urgent_rx = job_rx_urgent.clone();
            let tx = res_tx.clone();
            let shared = shared.clone();
            let q_bg = q_bg_ctr.clone();
            let inflight_bg = inflight_bg_ctr.clone();
            let q_urgent = q_urgent_ctr.clone();
            let inflight_urgent = inflight_urgent_ctr.clone();
            bg_pool.spawn(move || {
                loop {
                    // Background workers help drain the urgent lane first.
                    match urgent_rx.try_recv() {
                        Ok(job) => {
                            inflight_urgent.fetch_add(1, Ordering::AcqRel);
                            q_urgent.fetch_sub(1, Ordering::AcqRel);
                            process_compile_job(job, Lane::Urgent, shared.as_ref(), &tx);
                            inflight_urgent.fetch_sub(1, Ordering::AcqRel);
                            continue;
                        }
                        Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => {}
                    }
                    select! {
                        recv(bg_rx) -> res => match res {
                            Ok(job) => {
                                inflight_bg.fetch_add(1, Ordering::AcqRel);
                                q_bg.fetch_sub(1, Ordering::AcqRel);
                                process_compile_job(job, Lane::Bg, shared.as_ref(), &tx);
                                inflight_bg.fetch_sub(1, Ordering::AcqRel);
                            }
                            Err(_) => break,
                        },
                        recv(urgent_rx) -> res => match res {
                            Ok(job) => {
                                inflight_urgent.fetch_add(1, Ordering::AcqRel);
                                q_urgent.fetch_sub(1, Ordering::AcqRel);
                                process_compile_job(job, Lane::Urgent, shared.as_ref(), &tx);
                                inflight_urgent.fetch_sub(1, Ordering::AcqRel);
                            }
                            Err(_) => break,
                        },
                    }
                }
            });
        }
        log::info!("runtime: {} urgent + {} compile workers", w_urgent, w_bg);

        Self {
            job_tx_urgent,
            job_tx_bg,
            res_rx,
            _urgent_pool: urgent_pool,
            _bg_pool: bg_pool,
            shared,
            next_job_id: AtomicU64::new(1),
            q_urgent: q_urgent_ctr,
            q_bg: q_bg_ctr,
            inflight_urgent: inflight_urgent_ctr,
            inflight_bg: inflight_bg_ctr,
            w_urgent,
            w_bg,
        }
    }

    /// Creates the slot at `index`, or moves it to `origin` (tearing down the old
    /// geometry first), then schedules a compile.
    pub fn place_chunk(&self, index: usize, origin: BlockPos) {
        let existing = self.shared.slot(index);
        match existing {
            Some(slot) => {
                slot.bump();
                let mut chunk = slot.chunk.lock();
                if chunk.origin() != origin {
                    log::debug!("chunk {} moves {} -> {}", index, chunk.origin(), origin);
                    chunk.reposition(origin, self.shared.sink.as_ref());
                }
            }
            None => {
                let filters = self.shared.filters.read().clone();
                let slot = Arc::new(Slot {
                    chunk: Mutex::new(RenderChunk::new(index, origin, filters)),
                    rev: AtomicU64::new(0),
                });
                self.shared.slots.write().insert(index, slot);
            }
        }
        self.schedule_compile(index);
    }

    fn enqueue(&self, index: usize, lane: Lane) -> bool {
        let Some(slot) = self.shared.slot(index) else {
            return false;
        };
        let rev = slot.bump();
        let job = CompileJob {
            index,
            rev,
            job_id: self.next_job_id.fetch_add(1, Ordering::Relaxed),
        };
        let (tx, q) = match lane {
            Lane::Urgent => (&self.job_tx_urgent, &self.q_urgent),
            Lane::Bg => (&self.job_tx_bg, &self.q_bg),
        };
        q.fetch_add(1, Ordering::AcqRel);
        if tx.send(job).is_err() {
            q.fetch_sub(1, Ordering::AcqRel);
            return false;
        }
        true
    }

    /// Queues a compile; any older queued compile of the same chunk becomes stale.
    pub fn schedule_compile(&self, index: usize) -> bool {
        self.enqueue(index, Lane::Bg)
    }

    pub fn schedule_compile_urgent(&self, index: usize) -> bool {
        self.enqueue(index, Lane::Urgent)
    }

    /// Removes the chunk's geometry from the sink and cancels queued compiles.
    /// Returns the number of filters removed.
    pub fn teardown(&self, index: usize) -> usize {
        let Some(slot) = self.shared.slot(index) else {
            return 0;
        };
        slot.bump();
        let mut chunk = slot.chunk.lock();
        chunk.teardown(self.shared.sink.as_ref())
    }

    pub fn remove_chunk(&self, index: usize) -> bool {
        self.teardown(index);
        self.shared.slots.write().remove(&index).is_some()
    }

    /// Swaps the world snapshot read by subsequent compiles.
    pub fn set_world(&self, world: Arc<SectionMap>) {
        *self.shared.world.write() = world;
    }

    pub fn world(&self) -> Arc<SectionMap> {
        self.shared.world.read().clone()
    }

    pub fn filters(&self) -> Arc<FilterSet> {
        self.shared.filters.read().clone()
    }

    /// Tears every chunk down under the old filters, installs `filters`, and
    /// recompiles everything. Returns the number of chunks rescheduled.
    pub fn reload_filters(&self, filters: Arc<FilterSet>) -> usize {
        *self.shared.filters.write() = filters.clone();
        let slots: Vec<(usize, Arc<Slot>)> = self
            .shared
            .slots
            .read()
            .iter()
            .map(|(i, s)| (*i, s.clone()))
            .collect();
        let mut removed = 0;
        for (_, slot) in &slots {
            slot.bump();
            let mut chunk = slot.chunk.lock();
            removed += chunk.teardown(self.shared.sink.as_ref());
            chunk.set_filters(filters.clone());
        }
        log::info!(
            "filters reloaded: [{}]; removed {} objects, recompiling {} chunks",
            filters.names().collect::<Vec<_>>().join(", "),
            removed,
            slots.len()
        );
        let mut indices: Vec<usize> = slots.iter().map(|(i, _)| *i).collect();
        indices.sort_unstable();
        indices
            .into_iter()
            .filter(|i| self.schedule_compile(*i))
            .count()
    }

    pub fn drain_results(&self) -> Vec<JobOut> {
        self.res_rx.try_iter().collect()
    }

    /// Blocks until both lanes are empty and idle. Returns false on timeout.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            let (qu, iu, qb, ib) = self.queue_debug_counts();
            if qu + iu + qb + ib == 0 {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(Duration::from_millis(1));
        }
    }

    /// `(queued_urgent, inflight_urgent, queued_bg, inflight_bg)`
    pub fn queue_debug_counts(&self) -> (usize, usize, usize, usize) {
        (
            self.q_urgent.load(Ordering::Acquire),
            self.inflight_urgent.load(Ordering::Acquire),
            self.q_bg.load(Ordering::Acquire),
            self.inflight_bg.load(Ordering::Acquire),
        )
    }

    pub fn chunk_count(&self) -> usize {
        self.shared.slots.read().len()
    }

    pub fn chunk_origin(&self, index: usize) -> Option<BlockPos> {
        self.shared.slot(index).map(|s| s.chunk.lock().origin())
    }

    pub fn chunk_state(&self, index: usize) -> Option<ChunkState> {
        self.shared.slot(index).map(|s| s.chunk.lock().state())
    }

    pub fn submitted_filters(&self, index: usize) -> Option<Vec<String>> {
        self.shared
            .slot(index)
            .map(|s| s.chunk.lock().submitted_filters())
    }
}
