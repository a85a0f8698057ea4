use crate::viewport::Viewport;

/// Drawing primitive recorded by an iteration function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnnotationOp {
    /// `r, g, b, opacity` in `0..=255`.
    SetStrokeColor,
    /// `r, g, b, opacity` in `0..=255`.
    SetFillColor,
    /// `width` in pixels.
    SetLineWidth,
    /// `x0, y0, x1, y1`.
    DrawLine,
    /// `x, y, w, h`.
    DrawRect,
    FillRect,
    /// Ellipse inscribed in `x, y, w, h`.
    DrawEllipse,
    FillEllipse,
    /// Font family in `text`, point size in the first operand.
    SetFont,
    /// `text` anchored at `x, y`.
    DrawText,
}

impl AnnotationOp {
    /// Whether the operands are positions that depend on the coordinate system.
    pub fn is_positional(self) -> bool {
        !matches!(
            self,
            AnnotationOp::SetStrokeColor
                | AnnotationOp::SetFillColor
                | AnnotationOp::SetLineWidth
                | AnnotationOp::SetFont
        )
    }
}

/// One recorded drawing command.
///
/// Positional operands are plane coordinates when `plane_coords` is set and
/// raster pixels otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub op: AnnotationOp,
    pub operands: [f64; 4],
    pub text: Option<String>,
    pub plane_coords: bool,
}

impl Annotation {
    pub fn new(op: AnnotationOp, operands: [f64; 4], plane_coords: bool) -> Self {
        Self {
            op,
            operands,
            text: None,
            plane_coords: plane_coords && op.is_positional(),
        }
    }

    /// Convert to raster coordinates for `viewport`.
    ///
    /// Rectangles are normalised so `w` and `h` are non-negative and `x, y`
    /// is the top-left corner. Raster-space annotations are returned as-is.
    pub fn resolve(&self, viewport: &Viewport) -> Annotation {
        if !self.plane_coords {
            return self.clone();
        }
        let [a, b, c, d] = self.operands;
        let px = |x: f64| viewport.inv_x(x) as f64;
        let py = |y: f64| viewport.inv_y(y) as f64;
        let operands = match self.op {
            AnnotationOp::DrawLine => [px(a), py(b), px(c), py(d)],
            AnnotationOp::DrawRect
            | AnnotationOp::FillRect
            | AnnotationOp::DrawEllipse
            | AnnotationOp::FillEllipse => {
                let (x0, x1) = (px(a), px(a + c));
                let (y0, y1) = (py(b), py(b + d));
                [x0.min(x1), y0.min(y1), (x1 - x0).abs(), (y1 - y0).abs()]
            }
            AnnotationOp::DrawText => [px(a), py(b), c, d],
            _ => self.operands,
        };
        Annotation {
            op: self.op,
            operands,
            text: self.text.clone(),
            plane_coords: false,
        }
    }
}

/// Bounded list of annotations owned by a render session.
///
/// Commands past the capacity are dropped so a runaway hook cannot grow
/// memory without limit.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotations {
    items: Vec<Annotation>,
    capacity: usize,
    dropped: usize,
}

impl Default for Annotations {
    fn default() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }
}

impl Annotations {
    pub const DEFAULT_CAPACITY: usize = 10_000;

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::new(),
            capacity,
            dropped: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Commands refused because the list was full.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Annotation> {
        self.items.iter()
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.dropped = 0;
    }

    /// Append unless full. Returns whether the command was kept.
    pub fn push(&mut self, annotation: Annotation) -> bool {
        if self.items.len() >= self.capacity {
            self.dropped += 1;
            return false;
        }
        self.items.push(annotation);
        true
    }

    /// Every command in raster coordinates.
    pub fn resolved(&self, viewport: &Viewport) -> Vec<Annotation> {
        self.items.iter().map(|a| a.resolve(viewport)).collect()
    }

    pub fn stroke_color(&mut self, r: f64, g: f64, b: f64, opacity: f64) {
        self.push(Annotation::new(AnnotationOp::SetStrokeColor, [r, g, b, opacity], false));
    }

    pub fn fill_color(&mut self, r: f64, g: f64, b: f64, opacity: f64) {
        self.push(Annotation::new(AnnotationOp::SetFillColor, [r, g, b, opacity], false));
    }

    pub fn line_width(&mut self, width: f64) {
        self.push(Annotation::new(AnnotationOp::SetLineWidth, [width, 0.0, 0.0, 0.0], false));
    }

    pub fn line(&mut self, x0: f64, y0: f64, x1: f64, y1: f64, plane: bool) {
        self.push(Annotation::new(AnnotationOp::DrawLine, [x0, y0, x1, y1], plane));
    }

    pub fn rect(&mut self, x: f64, y: f64, w: f64, h: f64, plane: bool) {
        self.push(Annotation::new(AnnotationOp::DrawRect, [x, y, w, h], plane));
    }

    pub fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, plane: bool) {
        self.push(Annotation::new(AnnotationOp::FillRect, [x, y, w, h], plane));
    }

    pub fn ellipse(&mut self, x: f64, y: f64, w: f64, h: f64, plane: bool) {
        self.push(Annotation::new(AnnotationOp::DrawEllipse, [x, y, w, h], plane));
    }

    pub fn fill_ellipse(&mut self, x: f64, y: f64, w: f64, h: f64, plane: bool) {
        self.push(Annotation::new(AnnotationOp::FillEllipse, [x, y, w, h], plane));
    }

    pub fn font(&mut self, name: &str, size: f64) {
        let mut a = Annotation::new(AnnotationOp::SetFont, [size, 0.0, 0.0, 0.0], false);
        a.text = Some(name.to_string());
        self.push(a);
    }

    pub fn text(&mut self, text: &str, x: f64, y: f64, plane: bool) {
        let mut a = Annotation::new(AnnotationOp::DrawText, [x, y, 0.0, 0.0], plane);
        a.text = Some(text.to_string());
        self.push(a);
    }
}

impl<'a> IntoIterator for &'a Annotations {
    type Item = &'a Annotation;
    type IntoIter = std::slice::Iter<'a, Annotation>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
