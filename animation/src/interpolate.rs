use chrono::Duration;

use tracks::Point;

use crate::geodesy::{destination, rhumb_bearing};
use crate::{CumulativePoint, FramePoint, Provenance};

/// Synthesizes a point between `start` and `end` for a window with no recorded points.
/// `point_idx` counts how many empty windows in a row there have been, so consecutive calls move
/// further from `start`. Proportions are taken from `end`'s own time gap to its predecessor.
///
/// None if `end` has no usable time gap, since no speed can be derived.
pub fn interpolate(
    start: &CumulativePoint,
    end: &CumulativePoint,
    window_width: f64,
    point_idx: usize,
) -> Option<FramePoint> {
    let end_time_difference = end.point.time_difference;
    if end_time_difference == 0.0 || !end_time_difference.is_finite() {
        return None;
    }
    let time_proportion = (window_width * point_idx as f64) / end_time_difference;
    let distance_proportion = end.point.distance * time_proportion;
    let time_diff_proportion = end_time_difference * time_proportion;
    if time_diff_proportion == 0.0 || !time_diff_proportion.is_finite() {
        return None;
    }
    let speed = distance_proportion / time_diff_proportion;

    let from = (start.point.latitude, start.point.longitude);
    let bearing = rhumb_bearing(from, (end.point.latitude, end.point.longitude));
    let (latitude, longitude) = destination(from, bearing, distance_proportion);

    let altitude = match (start.point.altitude, end.point.altitude) {
        (Some(a1), Some(a2)) => Some((a1 + a2) / 2.0),
        _ => None,
    };

    Some(FramePoint {
        point: Point {
            route_id: start.point.route_id.clone(),
            latitude,
            longitude,
            altitude,
            timestamp: start.point.timestamp + Duration::seconds(time_diff_proportion.trunc() as i64),
            speed,
            time_difference: window_width.trunc(),
            distance: window_width * speed,
            source_file: None,
        },
        cum_time_diff: (start.cum_time_diff + time_diff_proportion).trunc(),
        // The caller decides the frame
        video_frame: 0,
        provenance: Provenance::Interpolated,
        color: None,
    })
}
