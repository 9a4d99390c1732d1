// crates/carto-core/src/geometry.rs

//! # Geometry
//!
//! Map coordinates, extents and the Web Mercator (EPSG:3857) projection.
//!
//! Geometry sources are authored in lon/lat (EPSG:4326). Everything the
//! engine sees (extents, overlay anchors, fly-to targets) is expressed in
//! projected metres, the same space the map view works in.

use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Half the width of the projected world, in metres.
pub const HALF_WORLD_M: f64 = PI * EARTH_RADIUS_M;

/// Latitude at which the square Web Mercator world is clipped.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

pub const TILE_SIZE_PX: f64 = 256.0;

/// A position in map projection units (EPSG:3857 metres).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
}

impl Coordinate {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A geographic position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LonLat {
    pub lon: f64,
    pub lat: f64,
}

impl LonLat {
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

impl std::fmt::Display for LonLat {
    /// Formats the way the coordinate readout shows it: two decimals.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LAT: {:.2} • LON: {:.2}", self.lat, self.lon)
    }
}

/// Projects lon/lat degrees into Web Mercator metres.
///
/// Latitudes beyond [`MAX_LATITUDE`] are clamped.
pub fn from_lon_lat(p: LonLat) -> Coordinate {
    let lat = p.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);
    Coordinate {
        x: EARTH_RADIUS_M * p.lon.to_radians(),
        y: EARTH_RADIUS_M * (FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln(),
    }
}

/// Inverse of [`from_lon_lat`].
pub fn to_lon_lat(c: Coordinate) -> LonLat {
    LonLat {
        lon: (c.x / EARTH_RADIUS_M).to_degrees(),
        lat: (2.0 * (c.y / EARTH_RADIUS_M).exp().atan() - FRAC_PI_2).to_degrees(),
    }
}

/// Map units per pixel at a given zoom level.
pub fn resolution_for_zoom(zoom: f64) -> f64 {
    (2.0 * HALF_WORLD_M) / (TILE_SIZE_PX * 2f64.powf(zoom))
}

/// Zoom level at which one pixel spans `resolution` map units.
pub fn zoom_for_resolution(resolution: f64) -> f64 {
    ((2.0 * HALF_WORLD_M) / (TILE_SIZE_PX * resolution)).log2()
}

/// Axis-aligned bounding box in map projection units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Extent {
    /// An extent containing nothing; extending it with any point yields a
    /// zero-area extent at that point.
    pub const EMPTY: Extent = Extent {
        min_x: f64::INFINITY,
        min_y: f64::INFINITY,
        max_x: f64::NEG_INFINITY,
        max_y: f64::NEG_INFINITY,
    };

    pub const fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.max_x < self.min_x || self.max_y < self.min_y
    }

    pub fn extend(&mut self, c: Coordinate) {
        self.min_x = self.min_x.min(c.x);
        self.min_y = self.min_y.min(c.y);
        self.max_x = self.max_x.max(c.x);
        self.max_y = self.max_y.max(c.y);
    }

    pub fn merge(&mut self, other: &Extent) {
        if other.is_empty() {
            return;
        }
        self.extend(Coordinate::new(other.min_x, other.min_y));
        self.extend(Coordinate::new(other.max_x, other.max_y));
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> Coordinate {
        Coordinate {
            x: (self.min_x + self.max_x) / 2.0,
            y: (self.min_y + self.max_y) / 2.0,
        }
    }

    pub fn contains(&self, c: Coordinate) -> bool {
        c.x >= self.min_x && c.x <= self.max_x && c.y >= self.min_y && c.y <= self.max_y
    }

    /// `[min_x, min_y, max_x, max_y]`, the layout map engines expect.
    pub fn to_array(&self) -> [f64; 4] {
        [self.min_x, self.min_y, self.max_x, self.max_y]
    }
}

impl Default for Extent {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// A lon/lat position as stored in a geometry source (altitude dropped).
pub type Position = [f64; 2];

/// Geometry of a single feature, in source (lon/lat) coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Geometry {
    Point(Position),
    MultiPoint(Vec<Position>),
    LineString(Vec<Position>),
    MultiLineString(Vec<Vec<Position>>),
    Polygon(Vec<Vec<Position>>),
    MultiPolygon(Vec<Vec<Vec<Position>>>),
    GeometryCollection(Vec<Geometry>),
}

impl Geometry {
    /// Visits every position of the geometry, in source order.
    pub fn for_each_position(&self, f: &mut impl FnMut(Position)) {
        match self {
            Geometry::Point(p) => f(*p),
            Geometry::MultiPoint(ps) | Geometry::LineString(ps) => ps.iter().copied().for_each(f),
            Geometry::MultiLineString(rings) | Geometry::Polygon(rings) => {
                rings.iter().flatten().copied().for_each(f)
            }
            Geometry::MultiPolygon(polys) => polys.iter().flatten().flatten().copied().for_each(f),
            Geometry::GeometryCollection(parts) => {
                for part in parts {
                    part.for_each_position(f);
                }
            }
        }
    }

    /// Bounding box of the geometry in map projection units.
    ///
    /// Returns `None` for geometries without any position.
    pub fn projected_extent(&self) -> Option<Extent> {
        let mut extent = Extent::EMPTY;
        self.for_each_position(&mut |[lon, lat]| extent.extend(from_lon_lat(LonLat { lon, lat })));
        (!extent.is_empty()).then_some(extent)
    }
}
