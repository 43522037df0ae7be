//! Bearing and destination-point math on the WGS84 ellipsoid. Points are (latitude, longitude)
//! in degrees.

use geo::{Bearing, Destination, Geodesic, Point, Rhumb};

fn to_point((lat, lon): (f64, f64)) -> Point<f64> {
    Point::new(lon, lat)
}

/// Compass bearing in degrees [0, 360) of the rhumb line from the first point to the second.
pub fn rhumb_bearing(from: (f64, f64), to: (f64, f64)) -> f64 {
    Rhumb
        .bearing(to_point(from), to_point(to))
        .rem_euclid(360.0)
}

/// Where you end up after travelling `meters` along the geodesic leaving `from` at `bearing`
/// degrees. Longitude is normalized into [-180, 180].
pub fn destination(from: (f64, f64), bearing: f64, meters: f64) -> (f64, f64) {
    let pt = Geodesic.destination(to_point(from), bearing, meters);
    (pt.y(), pt.x())
}
