use std::collections::BTreeMap;

use tracks::{Point, RouteID};

/// A point along with the seconds elapsed since the first point of its route.
#[derive(Clone, Debug, PartialEq)]
pub struct CumulativePoint {
    pub point: Point,
    pub cum_time_diff: f64,
}

/// Running total of time_difference per route, in row order. The input must already be sorted by
/// time within each route; nothing is reordered.
pub fn compute_cumulative(points: &[Point]) -> Vec<CumulativePoint> {
    let mut totals: BTreeMap<&RouteID, f64> = BTreeMap::new();
    let mut result = Vec::with_capacity(points.len());
    for pt in points {
        let cum_time_diff = match totals.get_mut(&pt.route_id) {
            Some(total) => {
                *total += pt.time_difference;
                *total
            }
            None => {
                // The first point of a route starts the clock, whatever its own time_difference
                totals.insert(&pt.route_id, 0.0);
                0.0
            }
        };
        result.push(CumulativePoint {
            point: pt.clone(),
            cum_time_diff,
        });
    }
    result
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDateTime;

    use super::*;

    fn pt(route: &str, seconds: i64, time_difference: f64) -> Point {
        Point {
            route_id: RouteID::from(route),
            latitude: 0.0,
            longitude: 0.0,
            altitude: None,
            timestamp: NaiveDateTime::parse_from_str("2017-08-01 10:00:00", "%Y-%m-%d %H:%M:%S")
                .unwrap()
                + chrono::Duration::seconds(seconds),
            speed: 0.0,
            time_difference,
            distance: 0.0,
            source_file: None,
        }
    }

    #[test]
    fn per_route_running_sum() {
        let input = vec![
            pt("a", 0, 0.0),
            pt("b", 0, 0.0),
            pt("a", 5, 5.0),
            pt("b", 7, 7.0),
            pt("a", 12, 7.0),
        ];
        let cum: Vec<f64> = compute_cumulative(&input)
            .into_iter()
            .map(|x| x.cum_time_diff)
            .collect();
        assert_eq!(cum, vec![0.0, 0.0, 5.0, 7.0, 12.0]);
    }

    #[test]
    fn keeps_order_and_input() {
        let input = vec![pt("b", 0, 0.0), pt("a", 0, 0.0), pt("b", 3, 3.0)];
        let output = compute_cumulative(&input);
        assert_eq!(output.len(), 3);
        for (before, after) in input.iter().zip(output.iter()) {
            assert_eq!(before, &after.point);
        }
        assert!(compute_cumulative(&[]).is_empty());
    }

    #[test]
    fn first_gap_is_not_counted() {
        // Like a table cut down by a time-of-day filter, where the first kept point still carries
        // the gap to a dropped one
        let input = vec![pt("a", 30, 30.0), pt("a", 40, 10.0), pt("a", 50, 10.0)];
        let cum: Vec<f64> = compute_cumulative(&input)
            .into_iter()
            .map(|x| x.cum_time_diff)
            .collect();
        assert_eq!(cum, vec![0.0, 10.0, 20.0]);
    }
}
