use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use iterview_core::{Annotations, IterationFunction, Space, Viewport};

use crate::colormap::Colormap;
use crate::present::{self, Frame};
use crate::raster::RasterBuffer;

/// Everything needed to start one render.
pub struct RenderRequest {
    pub function: Box<dyn IterationFunction>,
    pub viewport: Viewport,
    pub colormap: Arc<Colormap>,
    /// A buffer from an earlier render to reuse. It is resized, or just
    /// cleared when the dimensions already match.
    pub raster: Option<RasterBuffer>,
}

impl RenderRequest {
    pub fn new(function: Box<dyn IterationFunction>, viewport: Viewport, colormap: Arc<Colormap>) -> Self {
        Self {
            function,
            viewport,
            colormap,
            raster: None,
        }
    }

    pub fn with_raster(mut self, raster: RasterBuffer) -> Self {
        self.raster = Some(raster);
        self
    }
}

/// The record of one render: where it looked, with what, and its samples.
#[derive(Debug, Clone)]
pub struct RenderSession {
    pub viewport: Viewport,
    pub space: Space,
    pub function_name: String,
    /// Arguments of the function as rendered, see
    /// [`IterationFunction::arg_map`].
    pub args: BTreeMap<String, String>,
    pub annotations: Annotations,
    pub raster: Arc<RasterBuffer>,
    pub colormap: Arc<Colormap>,
    pub elapsed: Duration,
    /// `false` for a render that was stopped before it finished.
    pub complete: bool,
}

impl RenderSession {
    /// Re-apply this session's arguments to `function`.
    pub fn restore_args(&self, function: &mut dyn IterationFunction) -> crate::Result<()> {
        function.restore_args(&self.args)?;
        Ok(())
    }

    /// Colorize the stored samples and burn the stored annotations, without
    /// recomputing anything.
    pub fn present(&self) -> Frame {
        present::present(
            &self.raster,
            &self.colormap,
            &self.annotations.resolved(&self.viewport),
        )
    }

    /// Same as [`present`](RenderSession::present) with another colormap.
    pub fn present_with(&self, colormap: &Colormap) -> Frame {
        present::present(&self.raster, colormap, &self.annotations.resolved(&self.viewport))
    }

    /// Take the raster back for reuse if no one else holds it.
    pub fn into_raster(self) -> Option<RasterBuffer> {
        Arc::try_unwrap(self.raster).ok()
    }
}

/// What a render hands back when it ends: the session, the function
/// instance it ran with, and the final frame.
pub struct RenderOutcome {
    pub session: RenderSession,
    pub function: Box<dyn IterationFunction>,
    pub frame: Frame,
}

impl std::fmt::Debug for RenderOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderOutcome")
            .field("session", &self.session)
            .field("function", &self.function.name())
            .field("frame", &(self.frame.width, self.frame.height))
            .finish()
    }
}

/// Bounded stack of completed sessions for back-navigation.
///
/// Pushing past capacity evicts the oldest session.
#[derive(Debug, Clone)]
pub struct SessionHistory {
    sessions: VecDeque<RenderSession>,
    capacity: usize,
}

impl SessionHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            sessions: VecDeque::with_capacity(capacity.min(64)),
            capacity,
        }
    }

    pub fn push(&mut self, session: RenderSession) {
        if self.capacity == 0 {
            return;
        }
        if self.sessions.len() == self.capacity {
            self.sessions.pop_front();
        }
        self.sessions.push_back(session);
    }

    /// The most recent session, removed from the stack.
    pub fn pop(&mut self) -> Option<RenderSession> {
        self.sessions.pop_back()
    }

    pub fn peek(&self) -> Option<&RenderSession> {
        self.sessions.back()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn clear(&mut self) {
        self.sessions.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iterview_core::{PlaneRect, Quadratic, Sample};

    fn session(xmin: f64) -> RenderSession {
        let viewport = Viewport::new(PlaneRect::new(xmin, xmin + 1.0, 0.0, 1.0), 4, 4).unwrap();
        RenderSession {
            viewport,
            space: Space::Parameter,
            function_name: "mandi".into(),
            args: BTreeMap::new(),
            annotations: Annotations::default(),
            raster: Arc::new(RasterBuffer::new(4, 4).unwrap()),
            colormap: Arc::new(Colormap::default()),
            elapsed: Duration::ZERO,
            complete: true,
        }
    }

    #[test]
    fn history_is_lifo_and_bounded() {
        let mut history = SessionHistory::new(2);
        history.push(session(0.0));
        history.push(session(1.0));
        history.push(session(2.0));
        assert_eq!(history.len(), 2);
        assert_eq!(history.pop().map(|s| s.viewport.rect.xmin), Some(2.0));
        assert_eq!(history.pop().map(|s| s.viewport.rect.xmin), Some(1.0));
        assert!(history.pop().is_none());
    }

    #[test]
    fn zero_capacity_keeps_nothing() {
        let mut history = SessionHistory::new(0);
        history.push(session(0.0));
        assert!(history.is_empty());
    }

    #[test]
    fn present_uses_stored_samples() {
        let s = session(0.0);
        s.raster.set_pixel(1, 1, Sample::rgb(1, 2, 3).to_raw(), true);
        let frame = s.present();
        assert_eq!(frame.pixel(1, 1), Some(0xFF01_0203));
        assert_eq!(frame.pixel(0, 0), Some(0xFF00_0000));
    }

    #[test]
    fn restore_args_reapplies_saved_values() {
        let mut f = Quadratic::new(Space::Parameter);
        f.set_arg("depth", "42").unwrap();
        let mut s = session(0.0);
        s.args = f.arg_map();

        let mut g = Quadratic::new(Space::Parameter);
        s.restore_args(&mut g).unwrap();
        assert_eq!(g.arg_map(), s.args);
    }

    #[test]
    fn into_raster_requires_sole_owner() {
        let s = session(0.0);
        let shared = Arc::clone(&s.raster);
        assert!(s.clone().into_raster().is_none());
        drop(shared);
        assert!(s.into_raster().is_some());
    }
}
