//! WGS84 locations, bounding boxes and distance helpers

use geo::HaversineDistance;
use geo::Point;
use serde::{Deserialize, Serialize};

/// Mean earth radius in meters, the same constant the haversine formula uses.
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Meters per degree of latitude (and of longitude at the equator).
pub const METERS_PER_DEGREE: f64 = EARTH_RADIUS_M * std::f64::consts::PI / 180.0;

/// A point on the earth with an optional elevation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lon: f64,
    pub lat: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elevation: Option<f32>,
}

impl Location {
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self {
            lon,
            lat,
            elevation: None,
        }
    }

    pub const fn with_elevation(lon: f64, lat: f64, elevation: f32) -> Self {
        Self {
            lon,
            lat,
            elevation: Some(elevation),
        }
    }

    /// Great-circle distance in meters.
    pub fn distance(&self, other: &Location) -> f64 {
        haversine_distance(self.lat, self.lon, other.lat, other.lon)
    }

    /// Fast planar distance estimate in meters, see [`distance_estimate`].
    pub fn distance_estimate(&self, other: &Location) -> f64 {
        distance_estimate(self, other)
    }
}

#[allow(deprecated)]
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let p1 = Point::new(lon1, lat1);
    let p2 = Point::new(lon2, lat2);
    p1.haversine_distance(&p2)
}

/// Equirectangular distance estimate in meters.
///
/// Longitude differences are scaled by the cosine of the mean latitude. Good to
/// well under a percent at the scale of a single street segment.
pub fn distance_estimate(a: &Location, b: &Location) -> f64 {
    let mean_lat = ((a.lat + b.lat) / 2.0).to_radians();
    let dx = (b.lon - a.lon) * mean_lat.cos() * METERS_PER_DEGREE;
    let dy = (b.lat - a.lat) * METERS_PER_DEGREE;
    (dx * dx + dy * dy).sqrt()
}

/// Project `p` on the segment `a`-`b` in a local equirectangular frame.
///
/// Returns the fraction along the segment in `[0, 1]` and the projected point.
pub fn project_on_segment(p: &Location, a: &Location, b: &Location) -> (f64, Location) {
    let scale_x = ((a.lat + b.lat) / 2.0).to_radians().cos();

    let dx = (b.lon - a.lon) * scale_x;
    let dy = b.lat - a.lat;
    let len_sq = dx * dx + dy * dy;

    if len_sq < 1e-18 {
        // Degenerate segment
        return (0.0, *a);
    }

    let t = (((p.lon - a.lon) * scale_x * dx + (p.lat - a.lat) * dy) / len_sq).clamp(0.0, 1.0);

    (t, interpolate(a, b, t))
}

/// Point at fraction `t` between `a` and `b`.
pub fn interpolate(a: &Location, b: &Location, t: f64) -> Location {
    let elevation = match (a.elevation, b.elevation) {
        (Some(ea), Some(eb)) => Some(ea + (eb - ea) * t as f32),
        _ => None,
    };
    Location {
        lon: a.lon + (b.lon - a.lon) * t,
        lat: a.lat + (b.lat - a.lat) * t,
        elevation,
    }
}

/// An axis aligned box in lon/lat degrees.
///
/// `left > right` describes a box crossing the antimeridian; it is
/// representable but tile ranges refuse to enumerate it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl BoundingBox {
    pub const fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Box extending `offset_m` meters in every direction around `center`.
    pub fn around(center: &Location, offset_m: f64) -> Self {
        let dlat = offset_m / METERS_PER_DEGREE;
        let cos_lat = center.lat.to_radians().cos().max(1e-6);
        let dlon = offset_m / (METERS_PER_DEGREE * cos_lat);

        Self {
            left: (center.lon - dlon).max(-180.0),
            top: (center.lat + dlat).min(90.0),
            right: (center.lon + dlon).min(180.0),
            bottom: (center.lat - dlat).max(-90.0),
        }
    }

    pub fn center(&self) -> Location {
        Location::new((self.left + self.right) / 2.0, (self.top + self.bottom) / 2.0)
    }

    pub fn contains(&self, location: &Location) -> bool {
        location.lon >= self.left
            && location.lon <= self.right
            && location.lat >= self.bottom
            && location.lat <= self.top
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_agrees_with_haversine_on_short_distances() {
        let a = Location::new(4.3517, 50.8503);
        let b = Location::new(4.3600, 50.8550);

        let exact = a.distance(&b);
        let estimate = a.distance_estimate(&b);

        assert!(exact > 700.0 && exact < 800.0, "unexpected distance {exact}");
        assert!((exact - estimate).abs() / exact < 0.005);
    }

    #[test]
    fn projection_clamps_to_the_segment() {
        let a = Location::new(0.0, 0.0);
        let b = Location::new(0.001, 0.0);

        let (t, p) = project_on_segment(&Location::new(0.0005, 0.0003), &a, &b);
        assert!((t - 0.5).abs() < 1e-9);
        assert!((p.lon - 0.0005).abs() < 1e-12);

        let (t, p) = project_on_segment(&Location::new(-0.01, 0.0), &a, &b);
        assert_eq!(t, 0.0);
        assert_eq!(p, a);
    }

    #[test]
    fn box_around_contains_its_center() {
        let center = Location::new(7.42, 43.73);
        let bbox = BoundingBox::around(&center, 100.0);

        assert!(bbox.contains(&center));
        assert!(bbox.left < bbox.right);
        assert!(bbox.top > bbox.bottom);
        let c = bbox.center();
        assert!((c.lon - center.lon).abs() < 1e-9);
        assert!((c.lat - center.lat).abs() < 1e-9);
        assert!(!bbox.contains(&Location::new(7.43, 43.73)));
    }
}
