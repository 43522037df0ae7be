use std::collections::BTreeMap;

use abstutil::Timer;
use anyhow::Result;
use serde::{Deserialize, Serialize};

use tracks::{Point, RouteID};

use crate::{compute_cumulative, interpolate, CumulativePoint, FramePoint};

/// How long the animation should be and how finely it's sliced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameParams {
    /// The duration of the output video. 0 means no timeline; every point lands in frame 0.
    pub time_seconds: u32,
    pub framerate: u32,
}

impl Default for FrameParams {
    fn default() -> Self {
        Self {
            time_seconds: 0,
            framerate: 5,
        }
    }
}

impl FrameParams {
    pub fn n_frames(self) -> usize {
        self.time_seconds as usize * self.framerate as usize
    }
}

/// Resamples every route onto `params.n_frames()` equal slices of its own duration, so routes of
/// different lengths and sampling rates finish on the same frame. Frame 0 holds the start of each
/// route. A slice without recorded points gets one interpolated point, if the route has points on
/// both sides of it.
///
/// The result is sorted by frame, then route.
pub fn normalize(points: &[Point], params: FrameParams, timer: &mut Timer) -> Result<Vec<FramePoint>> {
    if params.time_seconds == 0 {
        return Ok(compute_cumulative(points)
            .iter()
            .map(|pt| FramePoint::recorded(pt, 0))
            .collect());
    }

    // The whole table, not per route
    let mut sorted = points.to_vec();
    sorted.sort_by_key(|pt| pt.timestamp);
    for pt in &sorted {
        if !pt.time_difference.is_finite() || pt.time_difference < 0.0 {
            bail!(
                "Route {} has an invalid time_difference {} at {}",
                pt.route_id,
                pt.time_difference,
                pt.timestamp
            );
        }
    }

    let mut per_route: BTreeMap<RouteID, Vec<CumulativePoint>> = BTreeMap::new();
    for pt in compute_cumulative(&sorted) {
        per_route
            .entry(pt.point.route_id.clone())
            .or_insert_with(Vec::new)
            .push(pt);
    }

    timer.start("normalize to video frames");
    let mut result = Vec::new();
    for list in timer.parallelize(
        "normalize routes",
        per_route.into_values().collect(),
        |route| normalize_route(&route, params),
    ) {
        result.extend(list);
    }
    sort_for_rendering(&mut result);
    timer.stop("normalize to video frames");

    info!(
        "Normalized {} points into {} points over {} frames",
        abstutil::prettyprint_usize(points.len()),
        abstutil::prettyprint_usize(result.len()),
        params.n_frames()
    );
    Ok(result)
}

fn normalize_route(points: &[CumulativePoint], params: FrameParams) -> Vec<FramePoint> {
    let n_frames = params.n_frames();
    let total = points.last().map(|pt| pt.cum_time_diff).unwrap_or(0.0);
    // How many seconds of the route one frame covers
    let window_width = (total / params.time_seconds as f64) / params.framerate as f64;

    let mut output: Vec<FramePoint> = points
        .iter()
        .filter(|pt| pt.cum_time_diff == 0.0)
        .map(|pt| FramePoint::recorded(pt, 0))
        .collect();

    // How many empty windows in a row
    let mut point_idx = 1;
    for frame in 1..=n_frames {
        let lower = window_width * (frame - 1) as f64;
        // Don't lose the final point to rounding
        let upper = if frame == n_frames {
            total
        } else {
            window_width * frame as f64
        };

        // cum_time_diff is non-decreasing, so the window is one contiguous run
        let first_inside = points.partition_point(|pt| pt.cum_time_diff <= lower);
        let first_after = points.partition_point(|pt| pt.cum_time_diff <= upper);
        if first_inside < first_after {
            output.extend(
                points[first_inside..first_after]
                    .iter()
                    .map(|pt| FramePoint::recorded(pt, frame)),
            );
            point_idx = 1;
            continue;
        }

        if first_inside > 0 && first_after < points.len() {
            let start = &points[first_inside - 1];
            let end = &points[first_after];
            match interpolate(start, end, window_width, point_idx) {
                Some(mut pt) => {
                    pt.video_frame = frame;
                    output.push(pt);
                }
                None => {
                    debug!(
                        "Can't interpolate frame {} of {}: no time between the points around it",
                        frame, start.point.route_id
                    );
                }
            }
        }
        point_idx += 1;
    }
    output
}

/// The point-count alternative to `normalize`: ignores time entirely. The route with the most
/// points gets one frame per point, starting at 1; every other route spreads its points out with
/// a fixed stride.
pub fn normalize_by_points(points: &[Point]) -> Vec<FramePoint> {
    let cumulative = compute_cumulative(points);

    let mut per_route: Vec<(RouteID, Vec<&CumulativePoint>)> = Vec::new();
    let mut index: BTreeMap<&RouteID, usize> = BTreeMap::new();
    for pt in &cumulative {
        let idx = *index.entry(&pt.point.route_id).or_insert_with(|| {
            per_route.push((pt.point.route_id.clone(), Vec::new()));
            per_route.len() - 1
        });
        per_route[idx].1.push(pt);
    }

    let max_len = per_route.iter().map(|(_, list)| list.len()).max().unwrap_or(0);
    // Ties go to the lowest RouteID
    let leader = per_route
        .iter()
        .filter(|(_, list)| list.len() == max_len)
        .map(|(id, _)| id)
        .min()
        .cloned();

    let mut result = Vec::new();
    for (route, list) in &per_route {
        let stride = max_len / list.len() + 1;
        for (k, pt) in list.iter().enumerate() {
            let frame = if Some(route) == leader.as_ref() {
                k + 1
            } else {
                k * stride
            };
            result.push(FramePoint::recorded(pt, frame));
        }
    }
    sort_for_rendering(&mut result);
    result
}

fn sort_for_rendering(points: &mut [FramePoint]) {
    points.sort_by(|a, b| {
        a.video_frame
            .cmp(&b.video_frame)
            .then_with(|| a.point.route_id.cmp(&b.point.route_id))
    });
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDateTime};

    use super::*;
    use crate::Provenance;

    fn route(name: &str, seconds: &[i64]) -> Vec<Point> {
        let start =
            NaiveDateTime::parse_from_str("2017-08-01 10:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
        let mut result = Vec::new();
        let mut prev = None;
        for (idx, s) in seconds.iter().enumerate() {
            let time_difference = prev.map(|p| (s - p) as f64).unwrap_or(0.0);
            result.push(Point {
                route_id: RouteID::from(name),
                latitude: 0.0,
                longitude: idx as f64 * 0.001,
                altitude: None,
                timestamp: start + Duration::seconds(*s),
                speed: 0.0,
                time_difference,
                distance: if prev.is_some() { 111.0 } else { 0.0 },
                source_file: None,
            });
            prev = Some(*s);
        }
        result
    }

    #[test]
    fn dense_route_keeps_every_point() {
        let pts = route("a", &[0, 1, 2, 3, 4]);
        let output = normalize(
            &pts,
            FrameParams {
                time_seconds: 2,
                framerate: 2,
            },
            &mut Timer::throwaway(),
        )
        .unwrap();
        let frames: Vec<usize> = output.iter().map(|pt| pt.video_frame).collect();
        assert_eq!(frames, vec![0, 1, 2, 3, 4]);
        assert!(output.iter().all(|pt| pt.provenance == Provenance::Recorded));
    }

    #[test]
    fn several_points_share_a_window() {
        let pts = route("a", &[0, 1, 2, 3, 4]);
        let output = normalize(
            &pts,
            FrameParams {
                time_seconds: 1,
                framerate: 2,
            },
            &mut Timer::throwaway(),
        )
        .unwrap();
        let frames: Vec<usize> = output.iter().map(|pt| pt.video_frame).collect();
        assert_eq!(frames, vec![0, 1, 1, 2, 2]);
    }

    #[test]
    fn single_point_route() {
        let pts = route("solo", &[0]);
        let output = normalize(
            &pts,
            FrameParams {
                time_seconds: 3,
                framerate: 1,
            },
            &mut Timer::throwaway(),
        )
        .unwrap();
        assert_eq!(output.len(), 1);
        assert_eq!(output[0].video_frame, 0);
    }

    #[test]
    fn rejects_negative_gaps() {
        let mut pts = route("a", &[0, 10]);
        pts[1].time_difference = -10.0;
        assert!(normalize(
            &pts,
            FrameParams {
                time_seconds: 1,
                framerate: 1,
            },
            &mut Timer::throwaway(),
        )
        .is_err());
    }

    #[test]
    fn by_points() {
        let mut pts = route("long", &[0, 1, 2, 3, 4, 5]);
        pts.extend(route("short", &[0, 10]));
        let output = normalize_by_points(&pts);
        let long: Vec<usize> = output
            .iter()
            .filter(|pt| pt.point.route_id == RouteID::from("long"))
            .map(|pt| pt.video_frame)
            .collect();
        let short: Vec<usize> = output
            .iter()
            .filter(|pt| pt.point.route_id == RouteID::from("short"))
            .map(|pt| pt.video_frame)
            .collect();
        assert_eq!(long, vec![1, 2, 3, 4, 5, 6]);
        // 6 / 2 + 1
        assert_eq!(short, vec![0, 4]);
    }

    #[test]
    fn nonzero_first_gap() {
        let mut pts = route("a", &[30, 40, 50]);
        pts[0].time_difference = 30.0;
        let output = normalize(
            &pts,
            FrameParams {
                time_seconds: 2,
                framerate: 1,
            },
            &mut Timer::throwaway(),
        )
        .unwrap();
        // The route still starts on frame 0, and the 20s it covers are split into 10s windows
        let frames: Vec<(usize, f64)> = output
            .iter()
            .map(|pt| (pt.video_frame, pt.cum_time_diff))
            .collect();
        assert_eq!(frames, vec![(0, 0.0), (1, 10.0), (2, 20.0)]);
    }
}
