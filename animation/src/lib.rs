//! Puts GPS tracks with unrelated sampling rates onto one shared video timeline, so they can be
//! animated together.

#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod color;
mod cumulative;
mod export;
mod frames;
pub mod geodesy;
mod interpolate;
mod normalize;

use serde::{Deserialize, Serialize};

use tracks::Point;

pub use color::{calculate_rgb, set_colors, Attribute, Rgb};
pub use cumulative::{compute_cumulative, CumulativePoint};
pub use export::{export, ExportFormat, ExportRow};
pub use frames::{frames, FrameSegments, Segment};
pub use interpolate::interpolate;
pub use normalize::{normalize, normalize_by_points, FrameParams};

/// Whether a point was recorded by a device or synthesized between two recorded points.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Provenance {
    Recorded,
    Interpolated,
}

/// A point assigned to a video frame. Points from different routes with the same frame are drawn
/// together.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FramePoint {
    pub point: Point,
    /// Seconds since the first point of the route
    pub cum_time_diff: f64,
    pub video_frame: usize,
    pub provenance: Provenance,
    pub color: Option<Rgb>,
}

impl FramePoint {
    fn recorded(pt: &CumulativePoint, video_frame: usize) -> Self {
        Self {
            point: pt.point.clone(),
            cum_time_diff: pt.cum_time_diff,
            video_frame,
            provenance: Provenance::Recorded,
            color: None,
        }
    }
}
