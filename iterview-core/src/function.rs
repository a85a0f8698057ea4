use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::annotation::{Annotation, AnnotationOp, Annotations};
use crate::args::Args;
use crate::canvas::Canvas;
use crate::complex::Complex;
use crate::error::CoreError;
use crate::sample::Sample;
use crate::viewport::PlaneRect;

/// Which view of a function family a pixel selects.
///
/// In parameter space a pixel picks the family parameter; in dynamical
/// space it picks the starting point for a fixed parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Space {
    #[default]
    Parameter,
    Dynamical,
}

impl Space {
    /// The companion space.
    pub fn other(self) -> Self {
        match self {
            Space::Parameter => Space::Dynamical,
            Space::Dynamical => Space::Parameter,
        }
    }
}

impl fmt::Display for Space {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Space::Parameter => "parameter",
            Space::Dynamical => "dynamical",
        })
    }
}

impl FromStr for Space {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "parameter" | "p" => Ok(Space::Parameter),
            "dynamical" | "d" => Ok(Space::Dynamical),
            _ => Err(CoreError::InvalidArgument {
                name: "space".to_string(),
                value: s.to_string(),
                expected: "parameter or dynamical",
            }),
        }
    }
}

/// A function evaluated once per pixel.
///
/// A render evaluates one value per pixel through [`iterate`]. For parallel
/// rendering each tile works on its own instance obtained from [`copy`];
/// a function that returns `None` there is rendered on a single thread.
/// Implementations may keep mutable scratch state since an instance is
/// never shared between threads.
///
/// [`iterate`]: IterationFunction::iterate
/// [`copy`]: IterationFunction::copy
pub trait IterationFunction: Send {
    /// Registry name.
    fn name(&self) -> &str;

    fn space(&self) -> Space;

    /// The plane rectangle worth looking at in this function's space.
    fn default_range(&self) -> PlaneRect;

    fn args(&self) -> &Args;

    fn args_mut(&mut self) -> &mut Args;

    /// Called after any argument changed so cached fields can be refreshed.
    fn refresh(&mut self) {}

    /// Evaluate one point of the plane.
    fn iterate(&mut self, x: f64, y: f64) -> Sample;

    /// An independent instance with the same arguments.
    fn copy(&self) -> Option<Box<dyn IterationFunction>> {
        None
    }

    /// Fix the family parameter, e.g. from a point picked in parameter space.
    fn set_parameter(&mut self, _x: f64, _y: f64) {}

    /// One step of the underlying map, if the function has one.
    fn orbit(&self, _z: Complex) -> Option<Complex> {
        None
    }

    /// Runs once after a completed render and may draw into the raster.
    fn sandbox(&mut self, _canvas: &mut Canvas<'_>) {}

    /// Runs once after a completed render to record annotations.
    fn annotate(&mut self, _canvas: &mut Canvas<'_>) {}

    /// Parse and store one argument.
    fn set_arg(&mut self, name: &str, value: &str) -> crate::Result<()> {
        self.args_mut().parse(name, value)?;
        self.refresh();
        Ok(())
    }

    /// Reset every argument to the default of this function's space.
    fn defaults(&mut self) {
        let space = self.space();
        self.args_mut().reset(space);
        self.refresh();
    }

    /// All arguments rendered to text, for storing with a session.
    fn arg_map(&self) -> BTreeMap<String, String> {
        self.args().to_map()
    }

    /// Re-apply a map produced by [`arg_map`](IterationFunction::arg_map).
    fn restore_args(&mut self, saved: &BTreeMap<String, String>) -> crate::Result<()> {
        for (name, value) in saved {
            self.args_mut().parse(name, value)?;
        }
        self.refresh();
        Ok(())
    }
}

/// Modulus beyond which an orbit is considered gone.
pub const ORBIT_ESCAPE_RADIUS: f64 = 1.0e3;

/// Record the orbit of `start` as plane-coordinate line segments.
///
/// Clears `annotations`, sets a pink stroke and follows up to `steps`
/// applications of [`IterationFunction::orbit`], stopping early when the
/// function has no orbit or it leaves the finite plane. The segment that
/// carries the orbit past [`ORBIT_ESCAPE_RADIUS`] is the last one drawn.
/// Returns the number of segments drawn.
pub fn orbit_trace(
    function: &dyn IterationFunction,
    start: Complex,
    steps: usize,
    annotations: &mut Annotations,
) -> usize {
    annotations.clear();
    annotations.stroke_color(255.0, 127.0, 255.0, 255.0);
    let mut z = start;
    let mut drawn = 0;
    for _ in 0..steps {
        let Some(next) = function.orbit(z) else { break };
        if !next.is_finite() {
            break;
        }
        let segment = Annotation::new(AnnotationOp::DrawLine, [z.re, z.im, next.re, next.im], true);
        if annotations.push(segment) {
            drawn += 1;
        }
        if next.norm_sq() > ORBIT_ESCAPE_RADIUS * ORBIT_ESCAPE_RADIUS {
            break;
        }
        z = next;
    }
    drawn
}
