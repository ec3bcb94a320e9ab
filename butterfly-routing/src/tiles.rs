//! Slippy-map tile coordinate system
//!
//! The network is partitioned into square Web Mercator tiles at one fixed
//! zoom level. A tile is identified by `y * 2^zoom + x`, which keeps ids in a
//! u32 up to zoom 16.

use butterfly_common::{BoundingBox, Error, Location, Result};
use std::f64::consts::PI;

/// Highest zoom level whose tile ids fit in a u32.
pub const MAX_ZOOM: u32 = 16;

/// Latitude limit of the Web Mercator projection.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tile {
    pub x: u32,
    pub y: u32,
    pub zoom: u32,
}

impl Tile {
    pub const fn new(x: u32, y: u32, zoom: u32) -> Self {
        Self { x, y, zoom }
    }

    /// The tile containing the given coordinate.
    pub fn at(lon: f64, lat: f64, zoom: u32) -> Self {
        let (x, y) = world_to_tile(lon, lat, zoom);
        Self { x, y, zoom }
    }

    pub fn containing(location: &Location, zoom: u32) -> Self {
        Self::at(location.lon, location.lat, zoom)
    }

    pub const fn local_id(&self) -> u32 {
        to_local_id(self.x, self.y, self.zoom)
    }

    pub const fn from_local_id(id: u32, zoom: u32) -> Self {
        let (x, y) = from_local_id(id, zoom);
        Self { x, y, zoom }
    }

    /// North-west corner.
    pub fn top_left(&self) -> Location {
        tile_to_world(self.x, self.y, self.zoom)
    }

    /// South-east corner.
    pub fn bottom_right(&self) -> Location {
        tile_to_world(self.x + 1, self.y + 1, self.zoom)
    }

    pub fn bounds(&self) -> BoundingBox {
        let top_left = self.top_left();
        let bottom_right = self.bottom_right();
        BoundingBox::new(top_left.lon, top_left.lat, bottom_right.lon, bottom_right.lat)
    }

    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        self.bounds().contains(&Location::new(lon, lat))
    }
}

/// Mercator slippy-map projection of a coordinate to tile `(x, y)`.
///
/// Coordinates on the far edges (lon = 180, latitudes beyond the projection
/// limit) are clamped into the grid.
pub fn world_to_tile(lon: f64, lat: f64, zoom: u32) -> (u32, u32) {
    let n = (1u64 << zoom) as f64;
    let max = (1u64 << zoom) - 1;

    let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    let x = ((lon + 180.0) / 360.0 * n).floor();
    let y = ((1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0 * n).floor();

    let x = (x.max(0.0) as u64).min(max) as u32;
    let y = (y.max(0.0) as u64).min(max) as u32;
    (x, y)
}

/// North-west corner of tile `(x, y)`.
pub fn tile_to_world(x: u32, y: u32, zoom: u32) -> Location {
    let n = (1u64 << zoom) as f64;
    let lon = x as f64 / n * 360.0 - 180.0;
    let lat = (PI * (1.0 - 2.0 * y as f64 / n)).sinh().atan().to_degrees();
    Location::new(lon, lat)
}

pub const fn to_local_id(x: u32, y: u32, zoom: u32) -> u32 {
    let x_max = 1u32 << zoom;
    y.wrapping_mul(x_max).wrapping_add(x)
}

pub const fn from_local_id(id: u32, zoom: u32) -> (u32, u32) {
    let x_max = 1u64 << zoom;
    let id = id as u64;
    ((id % x_max) as u32, (id / x_max) as u32)
}

pub fn check_zoom(zoom: u32) -> Result<()> {
    if zoom > MAX_ZOOM {
        return Err(Error::InvalidZoom {
            zoom,
            max: MAX_ZOOM,
        });
    }
    Ok(())
}

/// The rectangle of tiles covering a bounding box at one zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRange {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
    pub zoom: u32,
}

impl TileRange {
    /// Fails for boxes crossing the antimeridian, wrap-around iteration is
    /// not supported.
    pub fn new(bbox: &BoundingBox, zoom: u32) -> Result<Self> {
        check_zoom(zoom)?;
        if bbox.left > bbox.right {
            return Err(Error::AntimeridianRange {
                left: bbox.left,
                right: bbox.right,
            });
        }

        let (left, y1) = world_to_tile(bbox.left, bbox.top, zoom);
        let (right, y2) = world_to_tile(bbox.right, bbox.bottom, zoom);

        Ok(Self {
            left,
            top: y1.min(y2),
            right,
            bottom: y1.max(y2),
            zoom,
        })
    }

    /// Number of tiles covered, never zero.
    pub fn tile_count(&self) -> usize {
        (self.right - self.left + 1) as usize * (self.bottom - self.top + 1) as usize
    }

    pub fn contains(&self, tile: &Tile) -> bool {
        tile.zoom == self.zoom
            && tile.x >= self.left
            && tile.x <= self.right
            && tile.y >= self.top
            && tile.y <= self.bottom
    }

    /// Tiles in row-major order.
    pub fn iter(&self) -> TileRangeIter {
        TileRangeIter {
            range: *self,
            x: self.left,
            y: self.top,
        }
    }
}

impl IntoIterator for &TileRange {
    type Item = Tile;
    type IntoIter = TileRangeIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct TileRangeIter {
    range: TileRange,
    x: u32,
    y: u32,
}

impl Iterator for TileRangeIter {
    type Item = Tile;

    fn next(&mut self) -> Option<Tile> {
        if self.y > self.range.bottom {
            return None;
        }

        let tile = Tile::new(self.x, self.y, self.range.zoom);
        if self.x == self.range.right {
            self.x = self.range.left;
            self.y += 1;
        } else {
            self.x += 1;
        }
        Some(tile)
    }
}
