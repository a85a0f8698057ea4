/// Default tile edge length in pixels.
pub const TILE_SIZE: u32 = 50;

/// A rectangular tile within the raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    /// Pixel x of the top-left corner.
    pub x: u32,
    /// Pixel y of the top-left corner.
    pub y: u32,
    /// Tile width in pixels (may be smaller at the right edge).
    pub width: u32,
    /// Tile height in pixels (may be smaller at the bottom edge).
    pub height: u32,
}

impl Tile {
    /// Number of pixels in this tile.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// The region a coarse phase fills from a single probe at its
    /// top-left pixel, or `None` for [`Phase::Fill`] and for quadrants
    /// that are empty because the tile is one pixel wide or tall.
    pub fn probe_region(&self, phase: Phase) -> Option<Tile> {
        let hw = self.width / 2;
        let hh = self.height / 2;
        let (w2, h2) = (self.width - hw, self.height - hh);
        let region = match phase {
            Phase::Corner => *self,
            Phase::Right => Tile {
                x: self.x + hw,
                y: self.y,
                width: w2,
                height: hh,
            },
            Phase::Bottom => Tile {
                x: self.x,
                y: self.y + hh,
                width: hw,
                height: h2,
            },
            Phase::BottomRight => Tile {
                x: self.x + hw,
                y: self.y + hh,
                width: w2,
                height: h2,
            },
            Phase::Fill => return None,
        };
        (!region.is_empty()).then_some(region)
    }
}

/// Refinement stage of a tile, coarsest first.
///
/// The four probe phases each evaluate one pixel and paint it over a
/// quadrant as a preview; [`Phase::Fill`] computes every pixel that is
/// not final yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    Corner,
    Right,
    Bottom,
    BottomRight,
    Fill,
}

impl Phase {
    pub const ALL: [Phase; 5] = [
        Phase::Corner,
        Phase::Right,
        Phase::Bottom,
        Phase::BottomRight,
        Phase::Fill,
    ];

    /// The following phase, or `None` after [`Phase::Fill`].
    pub fn next(self) -> Option<Phase> {
        match self {
            Phase::Corner => Some(Phase::Right),
            Phase::Right => Some(Phase::Bottom),
            Phase::Bottom => Some(Phase::BottomRight),
            Phase::BottomRight => Some(Phase::Fill),
            Phase::Fill => None,
        }
    }

    pub fn index(self) -> u8 {
        self as u8
    }
}

/// Build a grid of tiles for the given raster dimensions.
///
/// Tiles are emitted row by row; those on the right and bottom edges are
/// clipped to the remaining width and height. A zero `tile_size` yields
/// no tiles.
pub fn build_tile_grid(width: u32, height: u32, tile_size: u32) -> Vec<Tile> {
    let mut tiles = Vec::new();
    if tile_size == 0 {
        return tiles;
    }
    let mut y = 0;
    while y < height {
        let th = tile_size.min(height - y);
        let mut x = 0;
        while x < width {
            let tw = tile_size.min(width - x);
            tiles.push(Tile {
                x,
                y,
                width: tw,
                height: th,
            });
            x += tw;
        }
        y += th;
    }
    tiles
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_grid_covers_raster() {
        let tiles = build_tile_grid(200, 150, TILE_SIZE);
        let total_pixels: usize = tiles.iter().map(|t| t.pixel_count()).sum();
        assert_eq!(total_pixels, 200 * 150);
    }

    #[test]
    fn tile_grid_no_overlap() {
        for (w, h, size) in [(200, 150, 50), (101, 37, 16), (7, 300, 50), (1, 1, 50)] {
            let tiles = build_tile_grid(w, h, size);
            let mut covered = vec![false; (w * h) as usize];
            for tile in &tiles {
                for py in tile.y..tile.y + tile.height {
                    for px in tile.x..tile.x + tile.width {
                        let idx = py as usize * w as usize + px as usize;
                        assert!(!covered[idx], "pixel ({px}, {py}) covered twice");
                        covered[idx] = true;
                    }
                }
            }
            assert!(covered.iter().all(|&c| c), "all pixels must be covered");
        }
    }

    #[test]
    fn tile_size_is_respected() {
        let tiles = build_tile_grid(256, 256, TILE_SIZE);
        assert_eq!(tiles.len(), 36);
        for tile in &tiles {
            assert!(tile.width <= TILE_SIZE);
            assert!(tile.height <= TILE_SIZE);
        }
        assert!(build_tile_grid(10, 10, 0).is_empty());
    }

    #[test]
    fn phases_advance_in_order() {
        let mut seen = vec![Phase::Corner];
        while let Some(p) = seen.last().copied().and_then(Phase::next) {
            seen.push(p);
        }
        assert_eq!(seen, Phase::ALL.to_vec());
        assert_eq!(Phase::Fill.index(), 4);
    }

    #[test]
    fn probe_regions_partition_odd_tile() {
        let tile = Tile {
            x: 10,
            y: 20,
            width: 5,
            height: 7,
        };
        assert_eq!(tile.probe_region(Phase::Corner), Some(tile));
        let right = tile.probe_region(Phase::Right).unwrap();
        let bottom = tile.probe_region(Phase::Bottom).unwrap();
        let corner = tile.probe_region(Phase::BottomRight).unwrap();
        assert_eq!((right.x, right.y, right.width, right.height), (12, 20, 3, 3));
        assert_eq!((bottom.x, bottom.y, bottom.width, bottom.height), (10, 23, 2, 4));
        assert_eq!((corner.x, corner.y, corner.width, corner.height), (12, 23, 3, 4));
        // Top-left quadrant plus the three probed quadrants cover the tile.
        let top_left = 2 * 3;
        assert_eq!(
            top_left + right.pixel_count() + bottom.pixel_count() + corner.pixel_count(),
            tile.pixel_count()
        );
        assert_eq!(tile.probe_region(Phase::Fill), None);
    }

    #[test]
    fn thin_tiles_skip_empty_quadrants() {
        let column = Tile {
            x: 0,
            y: 0,
            width: 1,
            height: 4,
        };
        assert_eq!(column.probe_region(Phase::Bottom), None);
        assert!(column.probe_region(Phase::Right).is_some());
        let dot = Tile {
            x: 3,
            y: 3,
            width: 1,
            height: 1,
        };
        assert_eq!(dot.probe_region(Phase::Right), None);
        assert_eq!(dot.probe_region(Phase::BottomRight), Some(dot));
    }
}
