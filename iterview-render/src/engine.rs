use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, info, warn};

use iterview_core::{Annotations, Canvas, IterationFunction, Viewport};

use crate::colormap::Colormap;
use crate::config::EngineConfig;
use crate::job::{Control, RenderJob, TileFunction, TileTask};
use crate::present::{self, Frame};
use crate::raster::RasterBuffer;
use crate::session::{RenderOutcome, RenderRequest, RenderSession};
use crate::tile::{build_tile_grid, Phase, Tile};

/// Notifications published by a [`RenderEngine`].
///
/// Every render produces zero or more `Progress` events followed by exactly
/// one of `Finished` (all pixels computed) or `Stopped`.
#[derive(Debug)]
pub enum RenderEvent {
    Started {
        generation: u64,
        tiles: usize,
        workers: usize,
    },
    /// Periodic snapshot of a render in flight.
    Progress {
        generation: u64,
        percent: f64,
        frame: Arc<Frame>,
    },
    Finished {
        generation: u64,
        elapsed: Duration,
        cores: usize,
        /// Human-readable summary, e.g. `Finished in 120 ms (8 cores)`.
        status: String,
        outcome: Box<RenderOutcome>,
    },
    Stopped {
        generation: u64,
        percent: f64,
    },
}

impl RenderEvent {
    pub fn generation(&self) -> u64 {
        match self {
            RenderEvent::Started { generation, .. }
            | RenderEvent::Progress { generation, .. }
            | RenderEvent::Finished { generation, .. }
            | RenderEvent::Stopped { generation, .. } => *generation,
        }
    }
}

struct ActiveRender {
    job: Arc<RenderJob>,
    control: mpsc::Sender<Control>,
    supervisor: JoinHandle<Option<RenderOutcome>>,
}

/// Tiled progressive renderer.
///
/// Owns a worker pool and runs at most one render at a time. Starting a
/// render while another is active stops the old one first. Events are
/// delivered on the channel returned by [`RenderEngine::new`]; a dropped
/// receiver does not disturb rendering.
pub struct RenderEngine {
    config: EngineConfig,
    pool: Arc<ThreadPool>,
    workers: usize,
    single_threaded: bool,
    events: mpsc::Sender<RenderEvent>,
    active: Option<ActiveRender>,
    superseded: Option<RenderOutcome>,
    generation: u64,
}

impl RenderEngine {
    pub fn new(config: EngineConfig) -> crate::Result<(Self, mpsc::Receiver<RenderEvent>)> {
        config.validate()?;
        let mut workers = config.worker_count();
        let mut single_threaded = config.single_threaded;
        let pool = match build_pool(workers) {
            Ok(pool) => pool,
            Err(e) => {
                warn!(workers, "Could not start worker pool ({e}); rendering single-threaded");
                workers = 1;
                single_threaded = true;
                build_pool(1)?
            }
        };
        debug!(workers, single_threaded, tile_size = config.tile_size, "Render engine ready");

        let (tx, rx) = mpsc::channel();
        let engine = Self {
            config,
            pool: Arc::new(pool),
            workers,
            single_threaded,
            events: tx,
            active: None,
            superseded: None,
            generation: 0,
        };
        Ok((engine, rx))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Whether the current render still has pixels to compute.
    pub fn is_rendering(&self) -> bool {
        self.active.as_ref().is_some_and(|a| a.job.is_rendering())
    }

    /// Completion percentage of the current render, if any.
    pub fn progress(&self) -> Option<f64> {
        self.active.as_ref().map(|a| a.job.percent())
    }

    /// The raster of the current render, readable while it is written.
    pub fn raster(&self) -> Option<Arc<RasterBuffer>> {
        self.active.as_ref().map(|a| Arc::clone(&a.job.raster))
    }

    /// Validate and start a render. Returns its generation number.
    ///
    /// Invalid requests are rejected before anything is scheduled and leave
    /// a running render untouched. A render still in progress is stopped
    /// first; its partial outcome is kept for [`take_superseded`].
    ///
    /// [`take_superseded`]: RenderEngine::take_superseded
    pub fn start(&mut self, request: RenderRequest) -> crate::Result<u64> {
        let RenderRequest {
            function,
            viewport,
            colormap,
            raster,
        } = request;
        let viewport = Viewport::new(viewport.rect, viewport.width, viewport.height)?;

        if let Some(outcome) = self.stop() {
            self.superseded = Some(outcome);
        }

        let raster = match raster {
            Some(mut r) => {
                r.resize(viewport.width, viewport.height)?;
                r
            }
            None => RasterBuffer::new(viewport.width, viewport.height)?,
        };
        let raster = Arc::new(raster);

        self.generation += 1;
        let generation = self.generation;
        let (tasks, workers) = self.plan(&*function, viewport.width, viewport.height);
        let tile_count = tasks.len();

        let (control_tx, control_rx) = mpsc::channel();
        let job = Arc::new(RenderJob::new(
            generation,
            Arc::clone(&raster),
            viewport,
            Arc::clone(&self.pool),
            function,
            control_tx.clone(),
        ));

        info!(
            generation,
            width = viewport.width,
            height = viewport.height,
            tiles = tile_count,
            workers,
            "Render started"
        );
        let _ = self.events.send(RenderEvent::Started {
            generation,
            tiles: tile_count,
            workers,
        });

        let supervisor = Supervisor {
            job: Arc::clone(&job),
            control: control_rx,
            events: self.events.clone(),
            colormap,
            interval: self.config.progress_interval(),
            sandbox: self.config.sandbox,
            annotate: self.config.annotate,
            max_annotations: self.config.max_annotations,
            cores: workers,
            started: Instant::now(),
        };
        let supervisor = std::thread::Builder::new()
            .name("render-supervisor".into())
            .spawn(move || supervisor.run())?;

        job.submit(tasks);
        self.active = Some(ActiveRender {
            job,
            control: control_tx,
            supervisor,
        });
        Ok(generation)
    }

    /// Stop the current render and wait until no tile is running.
    ///
    /// Returns the partial outcome of a render that was still in progress,
    /// or `None` if nothing was running or it had already finished (its
    /// outcome then went out with [`RenderEvent::Finished`]).
    pub fn stop(&mut self) -> Option<RenderOutcome> {
        let active = self.active.take()?;
        let was_rendering = active.job.cancel();
        active.job.drain();
        // The supervisor is gone already if the render finished.
        let _ = active.control.send(Control::Stop);
        let outcome = match active.supervisor.join() {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(generation = active.job.generation, "Render supervisor panicked");
                None
            }
        };
        if was_rendering {
            info!(
                generation = active.job.generation,
                percent = active.job.percent(),
                "Render stopped"
            );
        }
        outcome
    }

    /// Partial outcome of the last render that a later [`start`] stopped
    /// before it finished.
    ///
    /// [`start`]: RenderEngine::start
    pub fn take_superseded(&mut self) -> Option<RenderOutcome> {
        self.superseded.take()
    }

    /// Split the raster into tasks, with the number of workers that will
    /// run them. Falls back to one full-resolution task on the function
    /// itself when single-threaded or not copyable.
    fn plan(
        &self,
        function: &dyn IterationFunction,
        width: u32,
        height: u32,
    ) -> (Vec<TileTask>, usize) {
        let whole = Tile {
            x: 0,
            y: 0,
            width,
            height,
        };
        let single = vec![TileTask {
            tile: whole,
            phase: Phase::Fill,
            function: TileFunction::Master,
        }];
        if self.single_threaded {
            return (single, 1);
        }

        let grid = build_tile_grid(width, height, self.config.tile_size);
        let mut tasks = Vec::with_capacity(grid.len());
        for tile in grid {
            match function.copy() {
                Some(copy) => tasks.push(TileTask {
                    tile,
                    phase: Phase::Corner,
                    function: TileFunction::Owned(copy),
                }),
                None => {
                    warn!(
                        function = function.name(),
                        "Function cannot be copied; rendering single-threaded"
                    );
                    return (single, 1);
                }
            }
        }
        (tasks, self.workers)
    }
}

impl Drop for RenderEngine {
    fn drop(&mut self) {
        self.stop();
    }
}

fn build_pool(workers: usize) -> Result<ThreadPool, rayon::ThreadPoolBuildError> {
    ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("tile-{i}"))
        .build()
}

/// Per-render thread that publishes progress and runs the finishing steps
/// once the workers are done.
struct Supervisor {
    job: Arc<RenderJob>,
    control: mpsc::Receiver<Control>,
    events: mpsc::Sender<RenderEvent>,
    colormap: Arc<Colormap>,
    interval: Duration,
    sandbox: bool,
    annotate: bool,
    max_annotations: usize,
    cores: usize,
    started: Instant,
}

impl Supervisor {
    fn run(self) -> Option<RenderOutcome> {
        let generation = self.job.generation;
        loop {
            match self.control.recv_timeout(self.interval) {
                Err(RecvTimeoutError::Timeout) => {
                    let frame = present::colorize(&self.job.raster, &self.colormap);
                    let _ = self.events.send(RenderEvent::Progress {
                        generation,
                        percent: self.job.percent(),
                        frame: Arc::new(frame),
                    });
                }
                Ok(Control::Done) => {
                    self.finish();
                    return None;
                }
                Ok(Control::Stop) | Err(RecvTimeoutError::Disconnected) => {
                    let percent = self.job.percent();
                    let outcome = self.outcome(Annotations::with_capacity(self.max_annotations), false);
                    let _ = self.events.send(RenderEvent::Stopped { generation, percent });
                    return outcome;
                }
            }
        }
    }

    fn finish(&self) {
        self.job.drain();
        let elapsed = self.started.elapsed();
        let mut annotations = Annotations::with_capacity(self.max_annotations);
        if self.sandbox || self.annotate {
            let mut master = self.job.master();
            if let Some(function) = master.as_deref_mut() {
                let mut canvas = Canvas::new(&*self.job.raster, self.job.viewport, &mut annotations);
                if self.sandbox {
                    function.sandbox(&mut canvas);
                }
                if self.annotate {
                    function.annotate(&mut canvas);
                }
            }
        }
        if annotations.dropped() > 0 {
            warn!(
                generation = self.job.generation,
                dropped = annotations.dropped(),
                "Annotation limit reached"
            );
        }

        let Some(outcome) = self.outcome(annotations, true) else {
            return;
        };
        let status = format!(
            "Finished in {} ms ({} cores)",
            elapsed.as_millis(),
            self.cores
        );
        info!(
            generation = self.job.generation,
            elapsed_ms = elapsed.as_millis() as u64,
            cores = self.cores,
            failures = self.job.failures(),
            "{status}"
        );
        let _ = self.events.send(RenderEvent::Finished {
            generation: self.job.generation,
            elapsed,
            cores: self.cores,
            status,
            outcome: Box::new(outcome),
        });
    }

    fn outcome(&self, annotations: Annotations, complete: bool) -> Option<RenderOutcome> {
        self.job.drain();
        let function = self.job.master().take()?;
        let viewport = self.job.viewport;
        let frame = present::present(
            &self.job.raster,
            &self.colormap,
            &annotations.resolved(&viewport),
        );
        let session = RenderSession {
            viewport,
            space: function.space(),
            function_name: function.name().to_string(),
            args: function.arg_map(),
            annotations,
            raster: Arc::clone(&self.job.raster),
            colormap: Arc::clone(&self.colormap),
            elapsed: self.started.elapsed(),
            complete,
        };
        Some(RenderOutcome {
            session,
            function,
            frame,
        })
    }
}

/// Wait for the `Finished` event of `generation`, skipping everything else.
///
/// Returns `None` on timeout, if that render was stopped, or if the engine
/// is gone.
pub fn wait_for_finish(
    events: &mpsc::Receiver<RenderEvent>,
    generation: u64,
    timeout: Duration,
) -> Option<(Duration, RenderOutcome)> {
    let deadline = Instant::now() + timeout;
    loop {
        let left = deadline.checked_duration_since(Instant::now())?;
        match events.recv_timeout(left) {
            Ok(RenderEvent::Finished {
                generation: g,
                elapsed,
                outcome,
                ..
            }) if g == generation => return Some((elapsed, *outcome)),
            Ok(RenderEvent::Stopped { generation: g, .. }) if g == generation => return None,
            Ok(_) => continue,
            Err(_) => return None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RenderError;
    use iterview_core::{PlaneRect, Quadratic, Space};

    fn request(width: u32, height: u32) -> RenderRequest {
        let viewport = Viewport::new(PlaneRect::new(-2.2, 1.4, -1.8, 1.8), width, height).unwrap();
        RenderRequest::new(
            Quadratic::boxed(Space::Parameter),
            viewport,
            Arc::new(Colormap::default()),
        )
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = EngineConfig {
            tile_size: 0,
            ..EngineConfig::default()
        };
        assert!(matches!(
            RenderEngine::new(config),
            Err(RenderError::InvalidTileSize(0))
        ));
    }

    #[test]
    fn invalid_viewport_is_rejected_without_starting() {
        let (mut engine, _rx) = RenderEngine::new(EngineConfig::default()).unwrap();
        let mut req = request(10, 10);
        req.viewport.rect.xmax = f64::NAN;
        assert!(matches!(engine.start(req), Err(RenderError::Core(_))));
        assert!(!engine.is_rendering());
        assert!(engine.raster().is_none());

        let mut req = request(10, 10);
        req.viewport.width = 0;
        assert!(engine.start(req).is_err());
    }

    #[test]
    fn render_finishes_with_full_coverage() {
        let config = EngineConfig {
            tile_size: 16,
            threads: Some(3),
            ..EngineConfig::default()
        };
        let (mut engine, rx) = RenderEngine::new(config).unwrap();
        let generation = engine.start(request(70, 45)).unwrap();
        let (_, outcome) = wait_for_finish(&rx, generation, Duration::from_secs(30)).unwrap();
        assert!(outcome.session.complete);
        assert!(outcome.session.raster.is_complete());
        assert_eq!(outcome.session.function_name, "mandi");
        assert_eq!((outcome.frame.width, outcome.frame.height), (70, 45));
        assert!(!engine.is_rendering());
    }

    #[test]
    fn generations_increase_and_restart_stops_previous() {
        let (mut engine, rx) = RenderEngine::new(EngineConfig::default()).unwrap();
        let first = engine.start(request(200, 200)).unwrap();
        let second = engine.start(request(30, 30)).unwrap();
        assert!(second > first);
        let (_, outcome) = wait_for_finish(&rx, second, Duration::from_secs(30)).unwrap();
        assert_eq!(outcome.session.viewport.width, 30);
    }

    #[test]
    fn stop_when_idle_is_noop() {
        let (mut engine, _rx) = RenderEngine::new(EngineConfig::default()).unwrap();
        assert!(engine.stop().is_none());
        assert!(!engine.is_rendering());
    }
}
