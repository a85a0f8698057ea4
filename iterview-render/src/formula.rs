use std::f64::consts::PI;
use std::fmt;

/// Procedural colormaps: closed-form `t ∈ [0, 1] → 0xAARRGGBB`.
///
/// Inputs are clamped to `[0, 1]` (NaN counts as 0) and every channel is
/// clamped then rounded to `0..=255`. Alpha is always opaque.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Formula {
    Hot,
    Cool,
    Rainbow,
    Plasma,
    Viridis,
    Fire,
    Ocean,
    Magma,
    Sunset,
    Electric,
    /// Fire over a logarithmic ramp, spreading out low escape values.
    LogScaled,
    /// Repeating rainbow bands, brighter toward the set.
    Banded,
    /// Viridis over `√t`.
    SquareRoot,
    /// Magma over a saturating exponential, for detail near `t = 0`.
    ExponentialDetail,
    /// Plasma over `t^gamma`.
    Power { gamma: f64 },
    /// Rainbow over a fixed equalisation curve approximating a histogram
    /// of typical escape-time renders.
    HistogramEqualized,
}

impl Formula {
    pub const CATALOG: [Formula; 16] = [
        Formula::Hot,
        Formula::Cool,
        Formula::Rainbow,
        Formula::Plasma,
        Formula::Viridis,
        Formula::Fire,
        Formula::Ocean,
        Formula::Magma,
        Formula::Sunset,
        Formula::Electric,
        Formula::LogScaled,
        Formula::Banded,
        Formula::SquareRoot,
        Formula::ExponentialDetail,
        Formula::Power { gamma: 0.5 },
        Formula::HistogramEqualized,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Formula::Hot => "hot",
            Formula::Cool => "cool",
            Formula::Rainbow => "rainbow",
            Formula::Plasma => "plasma",
            Formula::Viridis => "viridis",
            Formula::Fire => "fire",
            Formula::Ocean => "ocean",
            Formula::Magma => "magma",
            Formula::Sunset => "sunset",
            Formula::Electric => "electric",
            Formula::LogScaled => "log",
            Formula::Banded => "banded",
            Formula::SquareRoot => "sqrt",
            Formula::ExponentialDetail => "exp-detail",
            Formula::Power { .. } => "power",
            Formula::HistogramEqualized => "histogram",
        }
    }

    /// Look up by name. `power` accepts an optional exponent as `power:0.7`.
    pub fn from_name(name: &str) -> Option<Formula> {
        let name = name.trim().to_ascii_lowercase();
        if let Some(gamma) = name.strip_prefix("power:") {
            let gamma: f64 = gamma.parse().ok()?;
            return (gamma > 0.0 && gamma.is_finite()).then_some(Formula::Power { gamma });
        }
        Self::CATALOG.into_iter().find(|f| f.name() == name)
    }

    pub fn color(&self, t: f64) -> u32 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        match *self {
            Formula::Hot => hot(t),
            Formula::Cool => pack(t, 1.0 - t, 1.0),
            Formula::Rainbow => rainbow(t),
            Formula::Plasma => plasma(t),
            Formula::Viridis => viridis(t),
            Formula::Fire => fire(t),
            Formula::Ocean => pack(0.1 + 0.4 * t, 0.2 + 0.6 * t, 0.8 + 0.2 * t),
            Formula::Magma => magma(t),
            Formula::Sunset => pack(
                1.0 - 0.3 * (PI * t).sin(),
                0.5 + 0.5 * (PI * t - 1.57).sin(),
                0.2 + 0.3 * t,
            ),
            Formula::Electric => {
                let a = 3.0 * PI * t;
                pack(
                    0.5 + 0.5 * a.sin(),
                    0.5 + 0.5 * (a + 2.09).sin(),
                    0.5 + 0.5 * (a + 4.19).sin(),
                )
            }
            Formula::LogScaled => fire((1.0 + 1000.0 * t).ln() / 1001f64.ln()),
            Formula::Banded => {
                let shade = 0.35 + 0.65 * t;
                let [_, r, g, b] = rainbow((t * 12.0).fract()).to_be_bytes();
                pack(
                    r as f64 / 255.0 * shade,
                    g as f64 / 255.0 * shade,
                    b as f64 / 255.0 * shade,
                )
            }
            Formula::SquareRoot => viridis(t.sqrt()),
            Formula::ExponentialDetail => magma((1.0 - (-5.0 * t).exp()) / (1.0 - (-5f64).exp())),
            Formula::Power { gamma } => plasma(t.powf(gamma)),
            Formula::HistogramEqualized => {
                rainbow((1.0 - (-8.0 * t).exp()) / (1.0 - (-8f64).exp()))
            }
        }
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Formula::Power { gamma } => write!(f, "power:{gamma}"),
            other => f.write_str(other.name()),
        }
    }
}

#[inline]
fn channel(v: f64) -> u32 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u32
}

#[inline]
fn pack(r: f64, g: f64, b: f64) -> u32 {
    0xFF00_0000 | channel(r) << 16 | channel(g) << 8 | channel(b)
}

fn hot(t: f64) -> u32 {
    if t < 0.4 {
        pack(t / 0.4, 0.0, 0.0)
    } else if t < 0.8 {
        pack(1.0, (t - 0.4) / 0.4, 0.0)
    } else {
        pack(1.0, 1.0, (t - 0.8) / 0.2)
    }
}

fn rainbow(t: f64) -> u32 {
    let h = t * 360.0;
    let x = 1.0 - ((h / 60.0) % 2.0 - 1.0).abs();
    let (r, g, b) = match h {
        h if h < 60.0 => (1.0, x, 0.0),
        h if h < 120.0 => (x, 1.0, 0.0),
        h if h < 180.0 => (0.0, 1.0, x),
        h if h < 240.0 => (0.0, x, 1.0),
        h if h < 300.0 => (x, 0.0, 1.0),
        _ => (1.0, 0.0, x),
    };
    pack(r, g, b)
}

fn plasma(t: f64) -> u32 {
    pack(
        0.05 + 0.9 * t.powf(0.8),
        0.3 * (PI * t).sin() + 0.7 * t.powf(1.5),
        0.9 - 0.8 * t,
    )
}

fn viridis(t: f64) -> u32 {
    pack(
        0.267 + 0.005 * t + 4.55 * t * t,
        0.004 + 1.24 * t - 0.43 * t * t,
        0.329 - 0.134 * t + 2.94 * t * t - 2.87 * t * t * t,
    )
}

fn fire(t: f64) -> u32 {
    let r = if t < 0.5 { 2.0 * t } else { 1.0 };
    let g = if t < 0.25 {
        0.0
    } else if t < 0.75 {
        4.0 * (t - 0.25)
    } else {
        1.0
    };
    let b = if t < 0.75 { 0.0 } else { 4.0 * (t - 0.75) };
    pack(r, g, b)
}

fn magma(t: f64) -> u32 {
    pack(
        -0.002 + 0.999 * t.powf(0.7),
        t.powi(3),
        0.5 * (PI * t).sin() + 0.5 * t * t,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_formula_is_opaque_and_total() {
        for f in Formula::CATALOG {
            for i in 0..=100 {
                let c = f.color(i as f64 / 100.0);
                assert_eq!(c >> 24, 0xFF, "{f} at {i}");
            }
            assert_eq!(f.color(-3.0), f.color(0.0), "{f} clamps below");
            assert_eq!(f.color(7.0), f.color(1.0), "{f} clamps above");
            assert_eq!(f.color(f64::NAN), f.color(0.0));
        }
    }

    #[test]
    fn hot_endpoints() {
        assert_eq!(Formula::Hot.color(0.0), 0xFF00_0000);
        assert_eq!(Formula::Hot.color(1.0), 0xFFFF_FFFF);
        assert_eq!(Formula::Hot.color(0.2), 0xFF80_0000);
    }

    #[test]
    fn cool_and_ocean_are_linear() {
        assert_eq!(Formula::Cool.color(0.0), 0xFF00_FFFF);
        assert_eq!(Formula::Cool.color(1.0), 0xFFFF_00FF);
        assert_eq!(Formula::Ocean.color(1.0), 0xFF80_CCFF);
    }

    #[test]
    fn rainbow_primaries() {
        assert_eq!(Formula::Rainbow.color(0.0), 0xFFFF_0000);
        assert_eq!(Formula::Rainbow.color(1.0 / 3.0), 0xFF00_FF00);
        assert_eq!(Formula::Rainbow.color(2.0 / 3.0), 0xFF00_00FF);
    }

    #[test]
    fn names_round_trip() {
        for f in Formula::CATALOG {
            assert_eq!(Formula::from_name(f.name()).map(|g| g.name()), Some(f.name()));
        }
        assert_eq!(
            Formula::from_name("power:2"),
            Some(Formula::Power { gamma: 2.0 })
        );
        assert_eq!(Formula::from_name("power:-1"), None);
        assert_eq!(Formula::from_name("mauve"), None);
        assert_eq!(Formula::from_name(" Viridis "), Some(Formula::Viridis));
    }

    #[test]
    fn enhanced_variants_differ_from_their_base() {
        assert_ne!(Formula::LogScaled.color(0.01), Formula::Fire.color(0.01));
        assert_ne!(Formula::SquareRoot.color(0.25), Formula::Viridis.color(0.25));
        assert_eq!(Formula::SquareRoot.color(0.25), Formula::Viridis.color(0.5));
        assert_eq!(
            Formula::Power { gamma: 1.0 }.color(0.3),
            Formula::Plasma.color(0.3)
        );
    }
}
