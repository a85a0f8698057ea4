use std::sync::mpsc;
use std::sync::Arc;

use tracing::{debug, info, warn};

use iterview_core::{IterationFunction, Viewport};
use iterview_render::{
    Colormap, EngineConfig, RenderEngine, RenderError, RenderEvent, RenderOutcome, RenderRequest,
    SessionHistory,
};

/// Runs renders one after another and keeps the history of finished ones.
pub(crate) struct Driver {
    engine: RenderEngine,
    events: mpsc::Receiver<RenderEvent>,
    pub(crate) history: SessionHistory,
}

impl Driver {
    pub(crate) fn new(config: EngineConfig) -> iterview_render::Result<Self> {
        let history = SessionHistory::new(config.history_capacity);
        let (engine, events) = RenderEngine::new(config)?;
        Ok(Self {
            engine,
            events,
            history,
        })
    }

    /// Render and block until it finishes, logging progress as it goes.
    pub(crate) fn render(
        &mut self,
        function: Box<dyn IterationFunction>,
        viewport: Viewport,
        colormap: Arc<Colormap>,
    ) -> iterview_render::Result<RenderOutcome> {
        let request = RenderRequest::new(function, viewport, colormap);
        let generation = self.engine.start(request)?;
        let mut last_logged = -1.0;
        loop {
            let event = self.events.recv().map_err(|_| RenderError::EngineClosed)?;
            if event.generation() != generation {
                continue;
            }
            match event {
                RenderEvent::Started { tiles, workers, .. } => {
                    debug!(generation, tiles, workers, "Render dispatched");
                }
                RenderEvent::Progress { percent, .. } => {
                    if percent - last_logged >= 10.0 {
                        info!(generation, "{percent:.0}%");
                        last_logged = percent;
                    }
                }
                RenderEvent::Finished { outcome, .. } => return Ok(*outcome),
                RenderEvent::Stopped { percent, .. } => {
                    warn!(generation, percent, "Render stopped before finishing");
                    return Err(RenderError::EngineClosed);
                }
            }
        }
    }
}
