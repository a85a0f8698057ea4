use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use iterview_core::{PixelSink, Sample};

use crate::error::RenderError;

/// Per-pixel raw samples plus a "computed" flag, shared by all tiles of a
/// render.
///
/// Slots are atomics so workers write disjoint pixels and a presenter reads
/// a consistent-enough snapshot concurrently without locks. A flag is set
/// with release ordering after its value is stored, so a pixel observed as
/// computed always holds its final value. Coordinates outside the raster
/// are ignored on write and yield `None` on read.
#[derive(Debug)]
pub struct RasterBuffer {
    width: u32,
    height: u32,
    values: Vec<AtomicU64>,
    computed: Vec<AtomicBool>,
}

impl RasterBuffer {
    pub fn new(width: u32, height: u32) -> crate::Result<Self> {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidDimensions { width, height });
        }
        let len = width as usize * height as usize;
        Ok(Self {
            width,
            height,
            values: (0..len).map(|_| AtomicU64::new(0)).collect(),
            computed: (0..len).map(|_| AtomicBool::new(false)).collect(),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    #[inline]
    pub fn set_pixel(&self, x: i32, y: i32, value: f64, mark_computed: bool) {
        if let Some(i) = self.index(x, y) {
            self.store_at(i, value, mark_computed);
        }
    }

    /// Fill a rectangle with one value, clipped to the raster.
    ///
    /// Only the top-left pixel is marked computed; the rest stay open so a
    /// later exact pass overwrites them. Empty regions are a no-op.
    pub fn set_region(&self, x: i32, y: i32, w: u32, h: u32, value: f64) {
        if w == 0 || h == 0 {
            return;
        }
        let x0 = x.max(0) as i64;
        let y0 = y.max(0) as i64;
        let x1 = (x as i64 + w as i64).min(self.width as i64);
        let y1 = (y as i64 + h as i64).min(self.height as i64);
        let bits = value.to_bits();
        for py in y0..y1 {
            let row = py as usize * self.width as usize;
            for px in x0..x1 {
                self.values[row + px as usize].store(bits, Ordering::Relaxed);
            }
        }
        if let Some(i) = self.index(x, y) {
            self.computed[i].store(true, Ordering::Release);
        }
    }

    #[inline]
    pub fn get(&self, x: i32, y: i32) -> Option<f64> {
        self.index(x, y).map(|i| self.value_at(i))
    }

    pub fn sample(&self, x: i32, y: i32) -> Option<Sample> {
        self.get(x, y).map(Sample::from_raw)
    }

    #[inline]
    pub fn is_computed(&self, x: i32, y: i32) -> bool {
        self.index(x, y).is_some_and(|i| self.is_computed_at(i))
    }

    #[inline]
    pub fn value_at(&self, index: usize) -> f64 {
        f64::from_bits(self.values[index].load(Ordering::Relaxed))
    }

    #[inline]
    pub fn is_computed_at(&self, index: usize) -> bool {
        self.computed[index].load(Ordering::Acquire)
    }

    #[inline]
    pub fn store_at(&self, index: usize, value: f64, mark_computed: bool) {
        self.values[index].store(value.to_bits(), Ordering::Relaxed);
        if mark_computed {
            self.computed[index].store(true, Ordering::Release);
        }
    }

    /// Zero every value and clear every flag.
    pub fn clear(&self) {
        for v in &self.values {
            v.store(0, Ordering::Relaxed);
        }
        for c in &self.computed {
            c.store(false, Ordering::Release);
        }
    }

    /// Reallocate for new dimensions, or clear in place if they match.
    pub fn resize(&mut self, width: u32, height: u32) -> crate::Result<()> {
        if width == self.width && height == self.height {
            self.clear();
            return Ok(());
        }
        *self = Self::new(width, height)?;
        Ok(())
    }

    /// Copy of every raw value, row-major.
    pub fn snapshot(&self) -> Vec<f64> {
        self.values
            .iter()
            .map(|v| f64::from_bits(v.load(Ordering::Relaxed)))
            .collect()
    }

    pub fn computed_count(&self) -> usize {
        self.computed
            .iter()
            .filter(|c| c.load(Ordering::Acquire))
            .count()
    }

    pub fn is_complete(&self) -> bool {
        self.computed.iter().all(|c| c.load(Ordering::Acquire))
    }
}

/// Pixels drawn by finish hooks are final.
impl PixelSink for RasterBuffer {
    fn put(&self, x: i32, y: i32, sample: Sample) {
        self.set_pixel(x, y, sample.to_raw(), true);
    }

    fn fetch(&self, x: i32, y: i32) -> Option<Sample> {
        self.sample(x, y)
    }
}
