use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use rayon::ThreadPool;
use tracing::{debug, warn};

use iterview_core::{IterationFunction, Sample, Viewport, ERROR_COLOR};

use crate::raster::RasterBuffer;
use crate::tile::{Phase, Tile};

/// Messages from workers and the engine to a render's supervisor.
#[derive(Debug)]
pub(crate) enum Control {
    /// The pending pixel count reached zero.
    Done,
    /// The engine stopped the render and drained the pool.
    Stop,
}

/// Which function instance a tile evaluates with.
pub(crate) enum TileFunction {
    /// A private copy owned by the tile.
    Owned(Box<dyn IterationFunction>),
    /// The render's own instance, for functions that cannot be copied.
    Master,
}

/// One unit of scheduled work: a tile at a given refinement phase.
pub(crate) struct TileTask {
    pub(crate) tile: Tile,
    pub(crate) phase: Phase,
    pub(crate) function: TileFunction,
}

/// Shared state of one render.
///
/// Tasks are kept in a FIFO so every tile finishes a phase before any tile
/// starts the next one; each pool job pops whichever task is at the front.
/// A task that completes a probe phase is pushed back with the next phase,
/// and a fill task retires after its last row.
pub(crate) struct RenderJob {
    pub(crate) generation: u64,
    pub(crate) raster: Arc<RasterBuffer>,
    pub(crate) viewport: Viewport,
    pool: Arc<ThreadPool>,
    rendering: AtomicBool,
    pending: AtomicUsize,
    total: usize,
    queue: Mutex<VecDeque<TileTask>>,
    in_flight: Mutex<usize>,
    idle: Condvar,
    master: Mutex<Option<Box<dyn IterationFunction>>>,
    failures: AtomicUsize,
    control: mpsc::Sender<Control>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Decrements the in-flight count when a pool job returns.
struct InFlight<'a>(&'a RenderJob);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut n = lock(&self.0.in_flight);
        *n -= 1;
        if *n == 0 {
            self.0.idle.notify_all();
        }
    }
}

impl RenderJob {
    pub(crate) fn new(
        generation: u64,
        raster: Arc<RasterBuffer>,
        viewport: Viewport,
        pool: Arc<ThreadPool>,
        master: Box<dyn IterationFunction>,
        control: mpsc::Sender<Control>,
    ) -> Self {
        let total = raster.len();
        Self {
            generation,
            raster,
            viewport,
            pool,
            rendering: AtomicBool::new(true),
            pending: AtomicUsize::new(total),
            total,
            queue: Mutex::new(VecDeque::new()),
            in_flight: Mutex::new(0),
            idle: Condvar::new(),
            master: Mutex::new(Some(master)),
            failures: AtomicUsize::new(0),
            control,
        }
    }

    pub(crate) fn is_rendering(&self) -> bool {
        self.rendering.load(Ordering::Acquire)
    }

    /// Clear the rendering flag. Returns whether it was set.
    pub(crate) fn cancel(&self) -> bool {
        self.rendering.swap(false, Ordering::AcqRel)
    }

    pub(crate) fn pending(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    /// `100 − 100 · pending / total`.
    pub(crate) fn percent(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        100.0 - 100.0 * self.pending() as f64 / self.total as f64
    }

    pub(crate) fn failures(&self) -> usize {
        self.failures.load(Ordering::Relaxed)
    }

    /// Borrow the render's own function instance.
    pub(crate) fn master(&self) -> MutexGuard<'_, Option<Box<dyn IterationFunction>>> {
        lock(&self.master)
    }

    /// Queue tasks and hand one pool job to each.
    pub(crate) fn submit(self: &Arc<Self>, tasks: Vec<TileTask>) {
        let n = tasks.len();
        lock(&self.queue).extend(tasks);
        for _ in 0..n {
            self.spawn_one();
        }
    }

    /// Block until no pool job of this render is running or queued.
    pub(crate) fn drain(&self) {
        let mut n = lock(&self.in_flight);
        while *n > 0 {
            n = self.idle.wait(n).unwrap_or_else(PoisonError::into_inner);
        }
        drop(n);
        lock(&self.queue).clear();
    }

    fn spawn_one(self: &Arc<Self>) {
        *lock(&self.in_flight) += 1;
        let job = Arc::clone(self);
        self.pool.spawn(move || {
            let _guard = InFlight(&job);
            job.run_next();
        });
    }

    fn run_next(self: &Arc<Self>) {
        let Some(mut task) = lock(&self.queue).pop_front() else {
            return;
        };
        if !self.is_rendering() {
            return;
        }
        match task.phase {
            Phase::Fill => self.fill(&mut task),
            phase => {
                if let Some(region) = task.tile.probe_region(phase) {
                    let raw = self.with_function(&mut task.function, |f| {
                        self.evaluate(f, region.x as i32, region.y as i32)
                    });
                    if let Some(raw) = raw {
                        self.raster.set_region(
                            region.x as i32,
                            region.y as i32,
                            region.width,
                            region.height,
                            raw,
                        );
                    }
                }
                if let Some(next) = phase.next() {
                    task.phase = next;
                    lock(&self.queue).push_back(task);
                    self.spawn_one();
                }
            }
        }
    }

    /// Compute every pixel of the tile not yet final, row by row.
    ///
    /// The rendering flag is checked before each row; an abandoned tile
    /// neither reschedules nor touches the pending count.
    fn fill(&self, task: &mut TileTask) {
        let tile = task.tile;
        let row_len = tile.width as usize;
        let width = self.raster.width() as usize;
        self.with_function(&mut task.function, |f| {
            for py in tile.y..tile.y + tile.height {
                if !self.is_rendering() {
                    debug!(generation = self.generation, x = tile.x, y = py, "Tile abandoned");
                    return;
                }
                let row = py as usize * width;
                for px in tile.x..tile.x + tile.width {
                    let i = row + px as usize;
                    if !self.raster.is_computed_at(i) {
                        let raw = self.evaluate(f, px as i32, py as i32);
                        self.raster.store_at(i, raw, true);
                    }
                }
                let before = self.pending.fetch_sub(row_len, Ordering::AcqRel);
                if before == row_len {
                    self.complete();
                }
            }
        });
    }

    fn complete(&self) {
        if self
            .rendering
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            // The supervisor may already be gone if the engine was dropped.
            let _ = self.control.send(Control::Done);
        }
    }

    fn with_function<R>(
        &self,
        function: &mut TileFunction,
        body: impl FnOnce(&mut dyn IterationFunction) -> R,
    ) -> Option<R> {
        match function {
            TileFunction::Owned(f) => Some(body(f.as_mut())),
            TileFunction::Master => {
                let mut guard = self.master();
                guard.as_deref_mut().map(|f| body(f))
            }
        }
    }

    /// Raw sample for one pixel. Panics and non-finite escape values
    /// become [`ERROR_COLOR`].
    fn evaluate(&self, f: &mut dyn IterationFunction, px: i32, py: i32) -> f64 {
        let x = self.viewport.x(px as f64);
        let y = self.viewport.y(py as f64);
        match panic::catch_unwind(AssertUnwindSafe(|| f.iterate(x, y))) {
            Ok(sample) if sample.is_valid() => sample.to_raw(),
            Ok(_) | Err(_) => {
                if self.failures.fetch_add(1, Ordering::Relaxed) == 0 {
                    warn!(
                        generation = self.generation,
                        px,
                        py,
                        function = f.name(),
                        "Iteration function failed; pixel marked with error color"
                    );
                }
                Sample::Color(ERROR_COLOR).to_raw()
            }
        }
    }
}
