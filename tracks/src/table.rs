use std::collections::BTreeSet;

use anyhow::Result;
use chrono::{NaiveDate, NaiveTime};
use geom::{GPSBounds, LonLat};
use serde::{Deserialize, Serialize};

use crate::{Point, RouteID};

/// All points from one or more routes. Operations never modify the table; they return a new one.
#[derive(Clone, Debug, Default)]
pub struct TrackTable {
    pub points: Vec<Point>,
}

/// A rectangle in degrees. Containment is strict on every side.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    /// Parses "min_lat,min_lon,max_lat,max_lon"
    pub fn parse(input: &str) -> Result<Self> {
        let parts = input
            .split(',')
            .map(|x| x.trim().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| anyhow!("Bad bounding box '{}': {}", input, err))?;
        if parts.len() != 4 {
            bail!(
                "Bad bounding box '{}': need min_lat,min_lon,max_lat,max_lon",
                input
            );
        }
        let bbox = Self {
            min_lat: parts[0],
            min_lon: parts[1],
            max_lat: parts[2],
            max_lon: parts[3],
        };
        if bbox.min_lat >= bbox.max_lat || bbox.min_lon >= bbox.max_lon {
            bail!("Bad bounding box '{}': minimums must be below maximums", input);
        }
        Ok(bbox)
    }

    pub fn contains(&self, pt: &Point) -> bool {
        pt.latitude > self.min_lat
            && pt.latitude < self.max_lat
            && pt.longitude > self.min_lon
            && pt.longitude < self.max_lon
    }
}

impl TrackTable {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Distinct routes, in order of first appearance
    pub fn route_ids(&self) -> Vec<RouteID> {
        let mut seen = BTreeSet::new();
        let mut result = Vec::new();
        for pt in &self.points {
            if seen.insert(&pt.route_id) {
                result.push(pt.route_id.clone());
            }
        }
        result
    }

    /// A stable sort over the whole table, not per route.
    pub fn sorted_by_time(&self) -> Self {
        let mut points = self.points.clone();
        points.sort_by_key(|pt| pt.timestamp);
        Self { points }
    }

    pub fn concat(&self, others: &[TrackTable]) -> Self {
        let mut points = self.points.clone();
        for other in others {
            points.extend(other.points.iter().cloned());
        }
        Self { points }
    }

    /// Removes later points of a route that repeat an earlier latitude and longitude exactly.
    pub fn drop_duplicates(&self) -> Self {
        let mut seen = BTreeSet::new();
        let mut points = Vec::new();
        for pt in &self.points {
            let key = (
                pt.route_id.clone(),
                pt.latitude.to_bits(),
                pt.longitude.to_bits(),
            );
            if seen.insert(key) {
                points.push(pt.clone());
            }
        }
        Self { points }
    }

    /// With `only_points`, keeps the points inside the box. Otherwise keeps every point of any
    /// route passing through the box.
    pub fn within_bounds(&self, bbox: &BoundingBox, only_points: bool) -> Self {
        if only_points {
            return Self {
                points: self
                    .points
                    .iter()
                    .filter(|pt| bbox.contains(pt))
                    .cloned()
                    .collect(),
            };
        }
        let routes: BTreeSet<&RouteID> = self
            .points
            .iter()
            .filter(|pt| bbox.contains(pt))
            .map(|pt| &pt.route_id)
            .collect();
        Self {
            points: self
                .points
                .iter()
                .filter(|pt| routes.contains(&pt.route_id))
                .cloned()
                .collect(),
        }
    }

    /// Keeps points recorded on any calendar day from `start` to `end`, inclusive. A missing
    /// bound is open.
    pub fn between_dates(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self {
            points: self
                .points
                .iter()
                .filter(|pt| {
                    let day = pt.timestamp.date();
                    start.map(|s| day >= s).unwrap_or(true) && end.map(|e| day <= e).unwrap_or(true)
                })
                .cloned()
                .collect(),
        }
    }

    /// Keeps points recorded at a time of day between `start` and `end`, on any date. When `start`
    /// is after `end`, the range wraps past midnight.
    pub fn between_times(
        &self,
        start: NaiveTime,
        end: NaiveTime,
        include_start: bool,
        include_end: bool,
    ) -> Self {
        let after_start = |t: NaiveTime| if include_start { t >= start } else { t > start };
        let before_end = |t: NaiveTime| if include_end { t <= end } else { t < end };
        Self {
            points: self
                .points
                .iter()
                .filter(|pt| {
                    let t = pt.timestamp.time();
                    if start <= end {
                        after_start(t) && before_end(t)
                    } else {
                        after_start(t) || before_end(t)
                    }
                })
                .cloned()
                .collect(),
        }
    }

    pub fn bounds(&self) -> GPSBounds {
        let mut bounds = GPSBounds::new();
        for pt in &self.points {
            bounds.update(LonLat::new(pt.longitude, pt.latitude));
        }
        bounds
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDateTime;

    use super::*;

    fn pt(route: &str, lat: f64, lon: f64, time: &str) -> Point {
        Point {
            route_id: RouteID::from(route),
            latitude: lat,
            longitude: lon,
            altitude: None,
            timestamp: NaiveDateTime::parse_from_str(time, "%Y-%m-%d %H:%M:%S").unwrap(),
            speed: 0.0,
            time_difference: 0.0,
            distance: 0.0,
            source_file: None,
        }
    }

    fn table() -> TrackTable {
        TrackTable::new(vec![
            pt("a", 1.0, 1.0, "2017-08-01 23:30:00"),
            pt("a", 5.0, 5.0, "2017-08-02 08:00:00"),
            pt("b", 8.0, 8.0, "2017-08-02 00:30:00"),
            pt("b", 8.0, 8.0, "2017-08-03 12:00:00"),
            pt("c", 1.5, 1.5, "2017-08-01 07:00:00"),
        ])
    }

    #[test]
    fn bbox_filters() {
        let bbox = BoundingBox::parse("0, 0, 2, 2").unwrap();
        let only = table().within_bounds(&bbox, true);
        assert_eq!(only.len(), 2);
        let whole = table().within_bounds(&bbox, false);
        assert_eq!(whole.len(), 3);
        assert_eq!(whole.route_ids(), vec![RouteID::from("a"), RouteID::from("c")]);

        // Strict edges
        let edge = BoundingBox::parse("1,1,2,2").unwrap();
        assert_eq!(table().within_bounds(&edge, true).len(), 1);

        assert!(BoundingBox::parse("1,1,2").is_err());
        assert!(BoundingBox::parse("2,1,1,2").is_err());
    }

    #[test]
    fn date_filter() {
        let day = NaiveDate::from_ymd_opt(2017, 8, 2);
        assert_eq!(table().between_dates(day, day).len(), 2);
        assert_eq!(table().between_dates(day, None).len(), 3);
    }

    #[test]
    fn time_filter_wraps_midnight() {
        let night = table().between_times(
            NaiveTime::from_hms_opt(23, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(1, 0, 0).unwrap(),
            true,
            true,
        );
        assert_eq!(night.len(), 2);

        let morning = table().between_times(
            NaiveTime::from_hms_opt(7, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            false,
            true,
        );
        assert_eq!(morning.len(), 1);
        assert_eq!(morning.points[0].route_id, RouteID::from("a"));
    }

    #[test]
    fn duplicates_and_sorting() {
        let deduped = table().drop_duplicates();
        assert_eq!(deduped.len(), 4);

        let sorted = table().sorted_by_time();
        assert_eq!(sorted.points[0].route_id, RouteID::from("c"));
        assert_eq!(sorted.points[4].route_id, RouteID::from("b"));
        assert_eq!(sorted.route_ids().len(), 3);
    }
}
