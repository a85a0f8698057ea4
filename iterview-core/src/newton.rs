use std::f64::consts::PI;

use crate::args::{ArgValue, Args};
use crate::canvas::Canvas;
use crate::complex::Complex;
use crate::function::{IterationFunction, Space};
use crate::sample::Sample;
use crate::viewport::PlaneRect;

pub const NAME: &str = "newton";

/// Cube roots of unity and the channel each basin is drawn in.
const ROOTS: [(Complex, [u8; 3]); 3] = [
    (Complex { re: 1.0, im: 0.0 }, [230, 60, 50]),
    (
        Complex {
            re: -0.5,
            im: 0.866_025_403_784_438_6,
        },
        [60, 200, 80],
    ),
    (
        Complex {
            re: -0.5,
            im: -0.866_025_403_784_438_6,
        },
        [50, 90, 230],
    ),
];

/// Relaxed Newton's method for `z³ − 1`: `z ↦ z − a·(z³ − 1)/(3z²)`.
///
/// Pixels are colored directly by the root they converge to, darker the
/// longer convergence took; points that do not converge within `depth`
/// steps are black. In dynamical space the pixel is the starting point
/// and `a` is the `relax` argument. In parameter space the pixel is `a`
/// and the orbit starts at the free critical point `∛(2a / (3 − a))`.
#[derive(Debug, Clone)]
pub struct Newton {
    space: Space,
    args: Args,
    relax: Complex,
    depth: u32,
    tolerance_sq: f64,
}

impl Newton {
    pub fn new(space: Space) -> Self {
        let args = Args::new()
            .with("relax", ArgValue::Complex(Complex::ONE))
            .with("depth", ArgValue::Int(64))
            .with("tolerance", ArgValue::Double(1e-6));
        let mut f = Self {
            space,
            args,
            relax: Complex::ONE,
            depth: 64,
            tolerance_sq: 1e-12,
        };
        f.defaults();
        f
    }

    pub fn boxed(space: Space) -> Box<dyn IterationFunction> {
        Box::new(Self::new(space))
    }

    #[inline]
    fn step(z: Complex, a: Complex) -> Complex {
        let z2 = z.square();
        z - a * ((z2 * z - Complex::ONE) / (z2 * 3.0))
    }

    /// Principal cube root of `2a / (3 − a)`.
    fn critical_point(a: Complex) -> Complex {
        let w = (a * 2.0) / (Complex::new(3.0, 0.0) - a);
        Complex::from_polar(w.abs().cbrt(), w.arg() / 3.0)
    }

    fn converge(&self, mut z: Complex, a: Complex) -> Sample {
        for i in 0..self.depth {
            if !z.is_finite() {
                break;
            }
            for (root, rgb) in ROOTS {
                if (z - root).norm_sq() < self.tolerance_sq {
                    let shade = 1.0 - 0.75 * i as f64 / self.depth as f64;
                    let [r, g, b] = rgb.map(|c| (c as f64 * shade).round() as u8);
                    return Sample::rgb(r, g, b);
                }
            }
            z = Self::step(z, a);
        }
        Sample::Color(0)
    }
}

impl IterationFunction for Newton {
    fn name(&self) -> &str {
        NAME
    }

    fn space(&self) -> Space {
        self.space
    }

    fn default_range(&self) -> PlaneRect {
        match self.space {
            Space::Parameter => PlaneRect::new(-0.5, 2.5, -1.5, 1.5),
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
        self.relax = self.args.complex("relax").unwrap_or(Complex::ONE);
        self.depth = self.args.int("depth").unwrap_or(64).clamp(1, u32::MAX as i64) as u32;
        let tolerance = self.args.double("tolerance").unwrap_or(1e-6);
        self.tolerance_sq = tolerance * tolerance;
    }

    fn iterate(&mut self, x: f64, y: f64) -> Sample {
        match self.space {
            Space::Dynamical => self.converge(Complex::new(x, y), self.relax),
            Space::Parameter => {
                let a = Complex::new(x, y);
                self.converge(Self::critical_point(a), a)
            }
        }
    }

    fn copy(&self) -> Option<Box<dyn IterationFunction>> {
        Some(Box::new(self.clone()))
    }

    fn set_parameter(&mut self, x: f64, y: f64) {
        let a = Complex::new(x, y);
        if self.args.set("relax", ArgValue::Complex(a)).is_ok() {
            self.relax = a;
        }
    }

    fn orbit(&self, z: Complex) -> Option<Complex> {
        Some(Self::step(z, self.relax))
    }

    /// Rings the three roots in dynamical space.
    fn annotate(&mut self, canvas: &mut Canvas<'_>) {
        if self.space != Space::Dynamical {
            return;
        }
        let r = canvas.viewport().rect.width() / 100.0;
        let notes = canvas.annotations();
        notes.stroke_color(255.0, 255.0, 255.0, 255.0);
        for (root, _) in ROOTS {
            notes.ellipse(root.re - r, root.im - r, 2.0 * r, 2.0 * r, true);
        }
    }
}
