use crate::annotation::Annotations;
use crate::sample::Sample;
use crate::viewport::Viewport;

/// Storage a [`Canvas`] draws into.
///
/// Methods take `&self` so a shared raster can be written while a render
/// presents it. Out-of-range coordinates are ignored by `put` and yield
/// `None` from `fetch`.
pub trait PixelSink: Sync {
    fn put(&self, x: i32, y: i32, sample: Sample);
    fn fetch(&self, x: i32, y: i32) -> Option<Sample>;
}

/// Drawing surface handed to the `sandbox` and `annotate` hooks.
///
/// Plane-coordinate methods map through the render's viewport; the `_px`
/// variants address raster pixels directly, row 0 at the top.
pub struct Canvas<'a> {
    sink: &'a dyn PixelSink,
    viewport: Viewport,
    annotations: &'a mut Annotations,
}

impl<'a> Canvas<'a> {
    pub fn new(sink: &'a dyn PixelSink, viewport: Viewport, annotations: &'a mut Annotations) -> Self {
        Self {
            sink,
            viewport,
            annotations,
        }
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn annotations(&mut self) -> &mut Annotations {
        self.annotations
    }

    pub fn set_pixel(&self, x: f64, y: f64, sample: Sample) {
        self.sink
            .put(self.viewport.inv_x(x), self.viewport.inv_y(y), sample);
    }

    pub fn set_pixel_px(&self, x: i32, y: i32, sample: Sample) {
        self.sink.put(x, y, sample);
    }

    pub fn pixel(&self, x: f64, y: f64) -> Option<Sample> {
        self.sink.fetch(self.viewport.inv_x(x), self.viewport.inv_y(y))
    }

    pub fn pixel_px(&self, x: i32, y: i32) -> Option<Sample> {
        self.sink.fetch(x, y)
    }

    /// Horizontal run of `dx` plane units starting at `(x, y)`.
    pub fn hline(&self, x: f64, y: f64, dx: f64, sample: Sample) {
        let px = self.viewport.inv_x(x);
        let len = self.viewport.inv_w(dx);
        self.hline_px(px, self.viewport.inv_y(y), len, sample);
    }

    /// Vertical run of `dy` plane units starting at `(x, y)`, upward.
    pub fn vline(&self, x: f64, y: f64, dy: f64, sample: Sample) {
        let py = self.viewport.inv_y(y);
        let len = self.viewport.inv_h(dy);
        self.vline_px(self.viewport.inv_x(x), py, -len, sample);
    }

    /// Pixels `x..=x+dx` on row `y`; `dx` may be negative.
    pub fn hline_px(&self, x: i32, y: i32, dx: i32, sample: Sample) {
        let (a, b) = (x.min(x + dx), x.max(x + dx));
        for px in a..=b {
            self.sink.put(px, y, sample);
        }
    }

    /// Pixels `y..=y+dy` on column `x`; `dy` may be negative.
    pub fn vline_px(&self, x: i32, y: i32, dy: i32, sample: Sample) {
        let (a, b) = (y.min(y + dy), y.max(y + dy));
        for py in a..=b {
            self.sink.put(x, py, sample);
        }
    }
}
