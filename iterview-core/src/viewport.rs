use serde::{Deserialize, Serialize};

use crate::complex::Complex;
use crate::error::CoreError;

/// An axis-aligned rectangle of the complex plane.
///
/// `x` runs along the real axis and `y` along the imaginary axis. A valid
/// rectangle has finite bounds with `xmax > xmin` and `ymax > ymin`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaneRect {
    pub xmin: f64,
    pub xmax: f64,
    pub ymin: f64,
    pub ymax: f64,
}

impl PlaneRect {
    pub const fn new(xmin: f64, xmax: f64, ymin: f64, ymax: f64) -> Self {
        Self {
            xmin,
            xmax,
            ymin,
            ymax,
        }
    }

    /// A rectangle centred on `center` spanning `width` × `height` plane units.
    pub fn centered(center: Complex, width: f64, height: f64) -> Self {
        Self::new(
            center.re - width / 2.0,
            center.re + width / 2.0,
            center.im - height / 2.0,
            center.im + height / 2.0,
        )
    }

    pub fn validate(&self) -> crate::Result<()> {
        let finite = [self.xmin, self.xmax, self.ymin, self.ymax]
            .iter()
            .all(|v| v.is_finite());
        if !finite {
            return Err(CoreError::InvalidRange {
                reason: format!("bounds must be finite, got {self}"),
            });
        }
        if self.xmax <= self.xmin || self.ymax <= self.ymin {
            return Err(CoreError::InvalidRange {
                reason: format!("need xmax > xmin and ymax > ymin, got {self}"),
            });
        }
        Ok(())
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }

    pub fn center(&self) -> Complex {
        Complex::new(
            (self.xmin + self.xmax) / 2.0,
            (self.ymin + self.ymax) / 2.0,
        )
    }

    pub fn contains(&self, z: Complex) -> bool {
        (self.xmin..=self.xmax).contains(&z.re) && (self.ymin..=self.ymax).contains(&z.im)
    }

    /// Row count that keeps pixels square for a given column count.
    ///
    /// Rounded to the nearest row and never less than one.
    pub fn resolution_for(&self, xres: u32) -> u32 {
        let yres = (xres as f64 * self.height() / self.width()).round() as u32;
        yres.max(1)
    }
}

impl std::fmt::Display for PlaneRect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}, {}] × [{}, {}]",
            self.xmin, self.xmax, self.ymin, self.ymax
        )
    }
}

/// A plane rectangle bound to a raster resolution.
///
/// This is the coordinate mapper between pixel indices and plane
/// coordinates. Pixel `(0, 0)` is the top-left corner and maps to
/// `(xmin, ymax)`; the last pixel maps to `(xmax, ymin)`, so both edges of
/// the rectangle are sampled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub rect: PlaneRect,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(rect: PlaneRect, width: u32, height: u32) -> crate::Result<Self> {
        if width == 0 || height == 0 {
            return Err(CoreError::InvalidResolution { width, height });
        }
        rect.validate()?;
        Ok(Self {
            rect,
            width,
            height,
        })
    }

    /// Viewport whose row count follows the rectangle's aspect ratio.
    pub fn with_columns(rect: PlaneRect, width: u32) -> crate::Result<Self> {
        rect.validate()?;
        Self::new(rect, width, rect.resolution_for(width))
    }

    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Plane X of pixel column `px`. A one-column raster always maps to `xmin`.
    #[inline]
    pub fn x(&self, px: f64) -> f64 {
        if self.width <= 1 {
            return self.rect.xmin;
        }
        self.rect.xmin + self.rect.width() * px / (self.width - 1) as f64
    }

    /// Plane Y of pixel row `py`, row 0 being `ymax`. A one-row raster
    /// always maps to `ymin`.
    #[inline]
    pub fn y(&self, py: f64) -> f64 {
        if self.height <= 1 {
            return self.rect.ymin;
        }
        self.rect.ymin + (1.0 - py / (self.height - 1) as f64) * self.rect.height()
    }

    #[inline]
    pub fn point(&self, px: i32, py: i32) -> Complex {
        Complex::new(self.x(px as f64), self.y(py as f64))
    }

    /// Pixel column containing plane X, truncated toward the lower index.
    pub fn inv_x(&self, x: f64) -> i32 {
        if self.width <= 1 {
            return 0;
        }
        let t = (self.width - 1) as f64 * ((x - self.rect.xmin) / self.rect.width());
        snap_floor(t)
    }

    /// Pixel row containing plane Y, truncated toward the lower index.
    pub fn inv_y(&self, y: f64) -> i32 {
        if self.height <= 1 {
            return 0;
        }
        let t = (self.height - 1) as f64 * (1.0 - (y - self.rect.ymin) / self.rect.height());
        snap_floor(t)
    }

    /// Pixel length of a plane-space horizontal extent.
    pub fn inv_w(&self, w: f64) -> i32 {
        (self.width as f64 * w / self.rect.width()) as i32
    }

    /// Pixel length of a plane-space vertical extent.
    pub fn inv_h(&self, h: f64) -> i32 {
        (self.height as f64 * h / self.rect.height()) as i32
    }

    /// Plane rectangle covered by a pixel selection (e.g. a rubber band).
    ///
    /// The selection may extend past the raster; its corners are mapped
    /// with the same linear relations as in-range pixels.
    pub fn from_selection(&self, px: i32, py: i32, pw: u32, ph: u32) -> crate::Result<PlaneRect> {
        let rect = PlaneRect::new(
            self.x(px as f64),
            self.x(px as f64 + pw as f64),
            self.y(py as f64 + ph as f64),
            self.y(py as f64),
        );
        rect.validate()?;
        Ok(rect)
    }
}

/// Floor with a small tolerance so values a rounding error below an
/// integer land on that integer.
#[inline]
fn snap_floor(t: f64) -> i32 {
    let nearest = t.round();
    if (t - nearest).abs() < 1e-7 {
        nearest as i32
    } else {
        t.floor() as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-12;

    fn vp(w: u32, h: u32) -> Viewport {
        Viewport::new(PlaneRect::new(-2.0, 1.0, -1.5, 1.5), w, h).unwrap()
    }

    #[test]
    fn corners_map_to_rect_edges() {
        let v = vp(100, 80);
        assert!((v.x(0.0) - (-2.0)).abs() < EPSILON);
        assert!((v.x(99.0) - 1.0).abs() < EPSILON);
        assert!((v.y(0.0) - 1.5).abs() < EPSILON);
        assert!((v.y(79.0) - (-1.5)).abs() < EPSILON);
    }

    #[test]
    fn pixel_round_trip_is_exact() {
        for (w, h) in [(2, 2), (3, 7), (100, 100), (641, 479), (1920, 1080)] {
            let v = vp(w, h);
            for px in 0..w as i32 {
                assert_eq!(v.inv_x(v.x(px as f64)), px, "column {px} of {w}");
            }
            for py in 0..h as i32 {
                assert_eq!(v.inv_y(v.y(py as f64)), py, "row {py} of {h}");
            }
        }
    }

    #[test]
    fn inverse_truncates_between_pixels() {
        let v = vp(4, 4);
        // Columns sit at -2, -1, 0, 1.
        assert_eq!(v.inv_x(-0.5), 1);
        assert_eq!(v.inv_x(0.99), 2);
        // Rows sit at 1.5, 0.5, -0.5, -1.5.
        assert_eq!(v.inv_y(1.0), 0);
        assert_eq!(v.inv_y(-1.0), 2);
    }

    #[test]
    fn lengths_scale_without_translation() {
        let v = vp(300, 300);
        assert_eq!(v.inv_w(1.0), 100);
        assert_eq!(v.inv_h(1.5), 150);
        assert_eq!(v.inv_w(0.0), 0);
    }

    #[test]
    fn single_pixel_axes_do_not_divide_by_zero() {
        let v = vp(1, 1);
        assert_eq!(v.x(0.0), -2.0);
        assert_eq!(v.y(0.0), -1.5);
        assert_eq!(v.inv_x(0.3), 0);
        assert_eq!(v.inv_y(0.3), 0);
        assert!(v.x(0.0).is_finite() && v.y(0.0).is_finite());
    }

    #[test]
    fn invalid_inputs_are_rejected() {
        let r = PlaneRect::new(-2.0, 1.0, -1.5, 1.5);
        assert!(Viewport::new(r, 0, 10).is_err());
        assert!(Viewport::new(r, 10, 0).is_err());
        assert!(Viewport::new(PlaneRect::new(1.0, 1.0, 0.0, 1.0), 10, 10).is_err());
        assert!(Viewport::new(PlaneRect::new(0.0, 1.0, 2.0, 1.0), 10, 10).is_err());
        assert!(Viewport::new(PlaneRect::new(0.0, f64::NAN, 0.0, 1.0), 10, 10).is_err());
    }

    #[test]
    fn resolution_follows_aspect_ratio() {
        let r = PlaneRect::new(-2.2, 1.4, -1.8, 1.8);
        assert_eq!(r.resolution_for(360), 360);
        let wide = PlaneRect::new(0.0, 4.0, 0.0, 1.0);
        assert_eq!(wide.resolution_for(400), 100);
        assert_eq!(wide.resolution_for(2), 1);
        let v = Viewport::with_columns(wide, 400).unwrap();
        assert_eq!(v.height, 100);
    }

    #[test]
    fn selection_becomes_sub_rectangle() {
        let v = Viewport::new(PlaneRect::new(0.0, 10.0, 0.0, 10.0), 11, 11).unwrap();
        let r = v.from_selection(2, 3, 4, 5).unwrap();
        assert!((r.xmin - 2.0).abs() < EPSILON);
        assert!((r.xmax - 6.0).abs() < EPSILON);
        assert!((r.ymax - 7.0).abs() < EPSILON);
        assert!((r.ymin - 2.0).abs() < EPSILON);
        assert!(v.from_selection(2, 3, 0, 5).is_err());
    }

    #[test]
    fn centered_rect() {
        let r = PlaneRect::centered(Complex::new(1.0, -1.0), 2.0, 4.0);
        assert_eq!(r, PlaneRect::new(0.0, 2.0, -3.0, 1.0));
        assert_eq!(r.center(), Complex::new(1.0, -1.0));
        assert!(r.contains(Complex::new(0.5, 0.5)));
        assert!(!r.contains(Complex::new(2.5, 0.5)));
    }
}
