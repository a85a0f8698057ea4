/// Bit marking a raw sample as a direct color rather than an escape value.
pub const COLOR_TAG: u64 = 0x8000_0000_0000_0000;

/// Direct color stored for pixels whose evaluation failed (opaque magenta).
pub const ERROR_COLOR: u32 = 0xFFFF_00FF;

/// The result of evaluating an iteration function at one point.
///
/// `Escape` carries a value that is normally in `[0, 1]` and goes through
/// the colormap. `Color` carries a packed `0xRRGGBB` (high byte ignored)
/// that bypasses the colormap and is shown opaque.
///
/// In a raster both variants share one `f64` slot: colors are stored with
/// the sign bit set and the color in the low 32 bits. Escape values are
/// expected to be non-negative; a negative escape value reads back as a
/// color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sample {
    Escape(f64),
    Color(u32),
}

impl Sample {
    /// Shorthand for `Sample::Color` from separate channels.
    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Sample::Color(u32::from_be_bytes([0, r, g, b]))
    }

    /// The raster representation.
    #[inline]
    pub fn to_raw(self) -> f64 {
        match self {
            Sample::Escape(v) => v,
            Sample::Color(c) => f64::from_bits(COLOR_TAG | c as u64),
        }
    }

    #[inline]
    pub fn from_raw(raw: f64) -> Self {
        let bits = raw.to_bits();
        if bits & COLOR_TAG != 0 {
            Sample::Color(bits as u32)
        } else {
            Sample::Escape(raw)
        }
    }

    /// Whether this sample can be stored as-is.
    ///
    /// Non-finite escape values are treated like evaluation failures.
    pub fn is_valid(self) -> bool {
        match self {
            Sample::Escape(v) => v.is_finite(),
            Sample::Color(_) => true,
        }
    }
}

impl From<f64> for Sample {
    fn from(v: f64) -> Self {
        Sample::Escape(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_values_are_stored_verbatim() {
        for v in [0.0, 0.25, 1.0, 0.999_999] {
            assert_eq!(Sample::Escape(v).to_raw(), v);
            assert_eq!(Sample::from_raw(v), Sample::Escape(v));
        }
    }

    #[test]
    fn colors_survive_the_raw_slot() {
        for c in [0u32, 0x0A141E, 0x00FF_FFFF, 0xFFFF_FFFF, 0x1234_5678] {
            let raw = Sample::Color(c).to_raw();
            assert!(raw.to_bits() & COLOR_TAG != 0);
            assert_eq!(Sample::from_raw(raw), Sample::Color(c));
        }
    }

    #[test]
    fn rgb_packs_channels() {
        assert_eq!(Sample::rgb(10, 20, 30), Sample::Color(0x0A141E));
    }

    #[test]
    fn non_finite_escape_is_invalid() {
        assert!(!Sample::Escape(f64::NAN).is_valid());
        assert!(!Sample::Escape(f64::INFINITY).is_valid());
        assert!(Sample::Escape(0.5).is_valid());
        assert!(Sample::Color(0).is_valid());
    }
}
