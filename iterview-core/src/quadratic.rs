use crate::args::{ArgValue, Args};
use crate::canvas::Canvas;
use crate::complex::Complex;
use crate::function::{IterationFunction, Space};
use crate::sample::Sample;
use crate::viewport::PlaneRect;

pub const NAME: &str = "mandi";

/// The quadratic family `z ↦ z² + c`.
///
/// In parameter space each pixel is `c` and the orbit starts at the
/// critical point `0` (the Mandelbrot set). In dynamical space each pixel
/// is the starting `z` and `c` comes from the `C` argument (a filled
/// Julia set). The escape value is the iteration count divided by `depth`,
/// so points that never escape map to `1.0`.
#[derive(Debug, Clone)]
pub struct Quadratic {
    space: Space,
    args: Args,
    c: Complex,
    depth: u32,
    escape_sq: f64,
}

impl Quadratic {
    pub fn new(space: Space) -> Self {
        let args = Args::new()
            .with_spaces(
                "C",
                ArgValue::Complex(Complex::ZERO),
                ArgValue::Complex(Complex::new(-1.0, 0.0)),
            )
            .with("depth", ArgValue::Int(150))
            .with("escape", ArgValue::Double(1000.0));
        let mut f = Self {
            space,
            args,
            c: Complex::ZERO,
            depth: 150,
            escape_sq: 1e6,
        };
        f.defaults();
        f
    }

    pub fn boxed(space: Space) -> Box<dyn IterationFunction> {
        Box::new(Self::new(space))
    }

    pub fn c(&self) -> Complex {
        self.c
    }
}

impl IterationFunction for Quadratic {
    fn name(&self) -> &str {
        NAME
    }

    fn space(&self) -> Space {
        self.space
    }

    fn default_range(&self) -> PlaneRect {
        match self.space {
            Space::Parameter => PlaneRect::new(-2.2, 1.4, -1.8, 1.8),
            Space::Dynamical => PlaneRect::new(-2.0, 2.0, -2.0, 2.0),
        }
    }

    fn args(&self) -> &Args {
        &self.args
    }

    fn args_mut(&mut self) -> &mut Args {
        &mut self.args
    }

    fn refresh(&mut self) {
        self.c = self.args.complex("C").unwrap_or(Complex::ZERO);
        self.depth = self.args.int("depth").unwrap_or(150).clamp(1, u32::MAX as i64) as u32;
        let escape = self.args.double("escape").unwrap_or(1000.0);
        self.escape_sq = escape * escape;
    }

    fn iterate(&mut self, x: f64, y: f64) -> Sample {
        let (mut z, c) = match self.space {
            Space::Parameter => (Complex::ZERO, Complex::new(x, y)),
            Space::Dynamical => (Complex::new(x, y), self.c),
        };
        let mut i = 0;
        while i < self.depth {
            z = z.square() + c;
            if z.norm_sq() > self.escape_sq {
                break;
            }
            i += 1;
        }
        Sample::Escape(i as f64 / self.depth as f64)
    }

    fn copy(&self) -> Option<Box<dyn IterationFunction>> {
        Some(Box::new(self.clone()))
    }

    fn set_parameter(&mut self, x: f64, y: f64) {
        let c = Complex::new(x, y);
        if self.args.set("C", ArgValue::Complex(c)).is_ok() {
            self.c = c;
        }
    }

    fn orbit(&self, z: Complex) -> Option<Complex> {
        Some(z.square() + self.c)
    }

    /// Plots the critical orbit in the brightest colormap entry.
    fn sandbox(&mut self, canvas: &mut Canvas<'_>) {
        let mut z = Complex::ZERO;
        for _ in 0..self.depth {
            z = z.square() + self.c;
            if !z.is_finite() {
                break;
            }
            canvas.set_pixel(z.re, z.im, Sample::Escape(1.0));
        }
        canvas.annotations().stroke_color(0.0, 0.0, 0.0, 255.0);
    }
}
