use rayon::prelude::*;

use iterview_core::Annotation;

use crate::colormap::Colormap;
use crate::overlay;
use crate::raster::RasterBuffer;

/// A colorized image, one packed `0xAARRGGBB` per pixel, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u32>,
}

impl Frame {
    /// A frame filled with opaque black.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0xFF00_0000; width as usize * height as usize],
        }
    }

    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[y as usize * self.width as usize + x as usize])
    }

    /// RGBA bytes, 4 per pixel, for image encoders.
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut out = vec![0u8; self.pixels.len() * 4];
        out.par_chunks_mut(4)
            .zip(self.pixels.par_iter())
            .for_each(|(dst, &argb)| {
                let [a, r, g, b] = argb.to_be_bytes();
                dst.copy_from_slice(&[r, g, b, a]);
            });
        out
    }
}

/// Colorize the raster's current contents.
///
/// Safe to call while workers are still writing; pixels not yet reached
/// show whatever value their slot holds.
pub fn colorize(raster: &RasterBuffer, colormap: &Colormap) -> Frame {
    let mut pixels = vec![0u32; raster.len()];
    pixels
        .par_iter_mut()
        .enumerate()
        .for_each(|(i, px)| *px = colormap.map(raster.value_at(i)));
    Frame {
        width: raster.width(),
        height: raster.height(),
        pixels,
    }
}

/// Colorize and burn raster-space annotations on top.
pub fn present(raster: &RasterBuffer, colormap: &Colormap, annotations: &[Annotation]) -> Frame {
    let mut frame = colorize(raster, colormap);
    if !annotations.is_empty() {
        overlay::burn(&mut frame, annotations);
    }
    frame
}
