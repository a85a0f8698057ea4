use std::panic::{self, AssertUnwindSafe};

use iterview_core::{Complex, IterationFunction, Sample, Space, Viewport, ERROR_COLOR};

use crate::colormap::Colormap;
use crate::error::RenderError;
use crate::present::{self, Frame};
use crate::raster::RasterBuffer;

/// Thumbnail of the dynamical-space picture belonging to one parameter.
///
/// `companion` is the dynamical-space instance of the function being
/// explored; its parameter is set to `parameter` and it is rendered over
/// its default range into a `size`×`size` frame on the calling thread.
pub fn parameter_preview(
    companion: &mut dyn IterationFunction,
    parameter: Complex,
    size: u32,
    colormap: &Colormap,
) -> crate::Result<Frame> {
    if companion.space() != Space::Dynamical {
        return Err(RenderError::InvalidConfig(format!(
            "preview needs a dynamical-space function, got {} space",
            companion.space()
        )));
    }
    companion.set_parameter(parameter.re, parameter.im);
    let viewport = Viewport::new(companion.default_range(), size, size)?;
    let raster = RasterBuffer::new(size, size)?;
    for py in 0..size as i32 {
        for px in 0..size as i32 {
            let z = viewport.point(px, py);
            let sample = match panic::catch_unwind(AssertUnwindSafe(|| companion.iterate(z.re, z.im))) {
                Ok(s) if s.is_valid() => s,
                _ => Sample::Color(ERROR_COLOR),
            };
            raster.set_pixel(px, py, sample.to_raw(), true);
        }
    }
    Ok(present::colorize(&raster, colormap))
}
