use geom::LonLat;

/// Great-circle distance in meters, ignoring altitude.
pub fn distance_2d(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    LonLat::new(lon1, lat1)
        .gps_dist(LonLat::new(lon2, lat2))
        .inner_meters()
}

/// Like distance_2d, but also accounts for the altitude change when both altitudes are known.
pub fn distance_3d(
    (lat1, lon1, alt1): (f64, f64, Option<f64>),
    (lat2, lon2, alt2): (f64, f64, Option<f64>),
) -> f64 {
    let flat = distance_2d(lat1, lon1, lat2, lon2);
    match (alt1, alt2) {
        (Some(a1), Some(a2)) => (flat.powi(2) + (a2 - a1).powi(2)).sqrt(),
        _ => flat,
    }
}
