use std::fmt::Write as _;
use std::path::Path;

use iterview_core::{Sample, COLOR_TAG};

use crate::error::RenderError;
use crate::formula::Formula;

pub const TABLE_SIZE: usize = 256;

/// 256-entry RGB table with a working copy and the original it came from.
///
/// Edits touch only the working copy; [`revert`](ColorTable::revert)
/// restores the original. A fresh table is a grayscale ramp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorTable {
    working: [[u8; 3]; TABLE_SIZE],
    original: [[u8; 3]; TABLE_SIZE],
}

impl Default for ColorTable {
    fn default() -> Self {
        let mut ramp = [[0u8; 3]; TABLE_SIZE];
        for (i, entry) in ramp.iter_mut().enumerate() {
            *entry = [i as u8; 3];
        }
        Self {
            working: ramp,
            original: ramp,
        }
    }
}

impl ColorTable {
    /// Parse the text format: three whitespace-separated integers per line.
    ///
    /// Up to 256 lines are read starting at index 0; entries not listed
    /// keep their grayscale default. Blank lines are skipped and lines past
    /// the 256th are ignored. Values outside `0..=255` are rejected.
    pub fn parse(text: &str) -> crate::Result<Self> {
        let mut table = Self::default();
        let mut index = 0;
        for (n, line) in text.lines().enumerate() {
            if index == TABLE_SIZE {
                break;
            }
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.is_empty() {
                continue;
            }
            if fields.len() != 3 {
                return Err(RenderError::ColormapParse {
                    line: n + 1,
                    reason: format!("expected 3 values, found {}", fields.len()),
                });
            }
            let mut rgb = [0u8; 3];
            for (slot, field) in rgb.iter_mut().zip(&fields) {
                *slot = field.parse().map_err(|_| RenderError::ColormapParse {
                    line: n + 1,
                    reason: format!("{field:?} is not an integer in 0..=255"),
                })?;
            }
            table.working[index] = rgb;
            index += 1;
        }
        table.original = table.working;
        Ok(table)
    }

    pub fn load(path: &Path) -> crate::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// The working table in the text format, 256 lines of `r g b`.
    pub fn to_text(&self) -> String {
        let mut out = String::with_capacity(TABLE_SIZE * 12);
        for [r, g, b] in self.working {
            let _ = writeln!(out, "{r} {g} {b}");
        }
        out
    }

    pub fn save(&self, path: &Path) -> crate::Result<()> {
        std::fs::write(path, self.to_text())?;
        Ok(())
    }

    pub fn entry(&self, index: u8) -> [u8; 3] {
        self.working[index as usize]
    }

    pub fn set_entry(&mut self, index: u8, rgb: [u8; 3]) {
        self.working[index as usize] = rgb;
    }

    /// Discard edits made since the table was created or loaded.
    pub fn revert(&mut self) {
        self.working = self.original;
    }

    /// Opaque ARGB of the entry nearest to `t * 255`.
    #[inline]
    pub fn lookup(&self, t: f64) -> u32 {
        let t = if t.is_nan() { 0.0 } else { t };
        let index = (t * 255.0).round().clamp(0.0, 255.0) as usize;
        let [r, g, b] = self.working[index];
        u32::from_be_bytes([0xFF, r, g, b])
    }
}

/// Maps raw raster samples to opaque ARGB.
///
/// Escape values go through either a [`Formula`] or a [`ColorTable`].
/// Direct colors (see [`Sample`]) bypass both and only get their alpha
/// forced to `0xFF`. Editing a table entry switches a formula colormap to
/// table mode; [`restore`](Colormap::restore) undoes both.
#[derive(Debug, Clone)]
pub struct Colormap {
    name: String,
    formula: Option<Formula>,
    original_formula: Option<Formula>,
    table: ColorTable,
}

impl Default for Colormap {
    fn default() -> Self {
        Self::from_table("grayscale", ColorTable::default())
    }
}

impl Colormap {
    pub fn from_formula(formula: Formula) -> Self {
        Self {
            name: formula.to_string(),
            formula: Some(formula),
            original_formula: Some(formula),
            table: ColorTable::default(),
        }
    }

    pub fn from_table(name: impl Into<String>, table: ColorTable) -> Self {
        Self {
            name: name.into(),
            formula: None,
            original_formula: None,
            table,
        }
    }

    /// A formula colormap by name, or `grayscale` for the default table.
    pub fn by_name(name: &str) -> crate::Result<Self> {
        if name.eq_ignore_ascii_case("grayscale") {
            return Ok(Self::default());
        }
        Formula::from_name(name)
            .map(Self::from_formula)
            .ok_or_else(|| RenderError::UnknownColormap(name.to_string()))
    }

    /// Load a table file; the colormap is named after the file stem.
    pub fn load(path: &Path) -> crate::Result<Self> {
        let table = ColorTable::load(path)?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "table".to_string());
        Ok(Self::from_table(name, table))
    }

    /// Names accepted by [`by_name`](Colormap::by_name).
    pub fn catalog() -> Vec<&'static str> {
        std::iter::once("grayscale")
            .chain(Formula::CATALOG.iter().map(Formula::name))
            .collect()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn formula(&self) -> Option<Formula> {
        self.formula
    }

    pub fn table(&self) -> &ColorTable {
        &self.table
    }

    /// Edit one table entry and switch to table mode.
    pub fn set_color(&mut self, index: u8, r: u8, g: u8, b: u8) {
        self.table.set_entry(index, [r, g, b]);
        self.formula = None;
    }

    /// Revert table edits and the original formula.
    pub fn restore(&mut self) {
        self.table.revert();
        self.formula = self.original_formula;
    }

    pub fn save(&self, path: &Path) -> crate::Result<()> {
        self.table.save(path)
    }

    /// Color for one raw raster value.
    #[inline]
    pub fn map(&self, raw: f64) -> u32 {
        if raw.to_bits() & COLOR_TAG != 0 {
            return raw.to_bits() as u32 | 0xFF00_0000;
        }
        match self.formula {
            Some(f) => f.color(raw),
            None => self.table.lookup(raw),
        }
    }

    pub fn map_sample(&self, sample: Sample) -> u32 {
        self.map(sample.to_raw())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_is_grayscale() {
        let cm = Colormap::default();
        assert_eq!(cm.map(0.0), 0xFF00_0000);
        assert_eq!(cm.map(1.0), 0xFFFF_FFFF);
        assert_eq!(cm.map(0.5), 0xFF80_8080);
    }

    #[test]
    fn table_entry_lookup() {
        let mut cm = Colormap::default();
        cm.set_color(128, 10, 20, 30);
        assert_eq!(cm.map(128.0 / 255.0), 0xFF0A_141E);
    }

    #[test]
    fn lookup_rounds_to_nearest_entry() {
        let mut cm = Colormap::default();
        cm.set_color(128, 10, 20, 30);
        // 127.6 and 128.4 both land on 128; 127.4 stays on 127
        assert_eq!(cm.map(127.6 / 255.0), 0xFF0A_141E);
        assert_eq!(cm.map(128.4 / 255.0), 0xFF0A_141E);
        assert_eq!(cm.map(127.4 / 255.0), 0xFF7F_7F7F);
    }

    #[test]
    fn out_of_range_escape_values_clamp() {
        let cm = Colormap::default();
        assert_eq!(cm.map(5.0), 0xFFFF_FFFF);
        assert_eq!(cm.map(f64::NAN), 0xFF00_0000);
    }

    #[test]
    fn direct_colors_bypass_mapping() {
        let cm = Colormap::by_name("hot").unwrap();
        for c in [0u32, 0x0A141E, 0x00FF_FFFF, 0x7F12_3456, 0xFFFF_FFFF] {
            let raw = Sample::Color(c).to_raw();
            assert_eq!(cm.map(raw), c | 0xFF00_0000);
        }
    }

    #[test]
    fn set_color_switches_formula_to_table_and_restore_reverts() {
        let mut cm = Colormap::by_name("fire").unwrap();
        let before = cm.map(0.5);
        cm.set_color(128, 1, 2, 3);
        assert_eq!(cm.formula(), None);
        assert_eq!(cm.map(128.0 / 255.0), 0xFF01_0203);
        cm.restore();
        assert_eq!(cm.formula(), Some(Formula::Fire));
        assert_eq!(cm.map(0.5), before);
        assert_eq!(cm.table().entry(128), [128, 128, 128]);
    }

    #[test]
    fn parse_reads_triples_in_order() {
        let table = ColorTable::parse("1 2 3\n\n  4\t5 6\n").unwrap();
        assert_eq!(table.entry(0), [1, 2, 3]);
        assert_eq!(table.entry(1), [4, 5, 6]);
        assert_eq!(table.entry(2), [2, 2, 2]);
    }

    #[test]
    fn parse_rejects_bad_lines() {
        assert!(matches!(
            ColorTable::parse("1 2 3\n1 2\n"),
            Err(RenderError::ColormapParse { line: 2, .. })
        ));
        assert!(matches!(
            ColorTable::parse("1 2 300\n"),
            Err(RenderError::ColormapParse { line: 1, .. })
        ));
    }

    #[test]
    fn parse_stops_after_table_size() {
        let text: String = (0..300).map(|i| format!("{} 0 0\n", i % 256)).collect();
        let table = ColorTable::parse(&text).unwrap();
        assert_eq!(table.entry(255), [255, 0, 0]);
    }

    #[test]
    fn text_round_trip_and_revert() {
        let mut table = ColorTable::default();
        table.set_entry(7, [9, 8, 7]);
        let text = table.to_text();
        assert_eq!(text.lines().count(), 256);
        assert_eq!(text.lines().nth(7), Some("9 8 7"));

        let mut loaded = ColorTable::parse(&text).unwrap();
        assert_eq!(loaded.entry(7), [9, 8, 7]);
        loaded.set_entry(7, [0, 0, 0]);
        loaded.revert();
        assert_eq!(loaded.entry(7), [9, 8, 7]);
    }

    #[test]
    fn save_and_load_file() {
        let dir = std::env::temp_dir().join("iterview_test_colormap");
        let _ = std::fs::create_dir_all(&dir);
        let path = dir.join("sepia.map");
        let mut cm = Colormap::default();
        cm.set_color(0, 40, 30, 20);
        cm.save(&path).unwrap();

        let loaded = Colormap::load(&path).unwrap();
        assert_eq!(loaded.name(), "sepia");
        assert_eq!(loaded.map(0.0), 0xFF28_1E14);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn catalog_names_resolve() {
        for name in Colormap::catalog() {
            assert!(Colormap::by_name(name).is_ok(), "{name}");
        }
        assert!(matches!(
            Colormap::by_name("mauve"),
            Err(RenderError::UnknownColormap(_))
        ));
    }
}
