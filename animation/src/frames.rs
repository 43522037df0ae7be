use std::collections::BTreeMap;

use tracks::RouteID;

use crate::{FramePoint, Rgb};

/// Splits rows into frames: maximal runs of consecutive rows with the same video_frame. The rows
/// should already be sorted by frame.
pub fn frames(rows: &[FramePoint]) -> impl Iterator<Item = &[FramePoint]> {
    rows.chunk_by(|a, b| a.video_frame == b.video_frame)
}

/// The newest piece of one route drawn in a frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Segment {
    pub route_id: RouteID,
    /// (latitude, longitude)
    pub from: (f64, f64),
    pub to: (f64, f64),
    pub color: Option<Rgb>,
}

/// Walks frames in order, remembering where each route was last seen, and yields the segments
/// that each frame adds to the drawing.
pub struct FrameSegments<'a> {
    frames: Box<dyn Iterator<Item = &'a [FramePoint]> + 'a>,
    last_position: BTreeMap<&'a RouteID, (f64, f64)>,
}

impl<'a> FrameSegments<'a> {
    pub fn new(rows: &'a [FramePoint]) -> Self {
        Self {
            frames: Box::new(frames(rows)),
            last_position: BTreeMap::new(),
        }
    }
}

impl<'a> Iterator for FrameSegments<'a> {
    /// The frame number and the segments it adds
    type Item = (usize, Vec<Segment>);

    fn next(&mut self) -> Option<Self::Item> {
        let frame = self.frames.next()?;
        let mut segments = Vec::new();
        for pt in frame {
            let to = (pt.point.latitude, pt.point.longitude);
            if let Some(from) = self.last_position.insert(&pt.point.route_id, to) {
                segments.push(Segment {
                    route_id: pt.point.route_id.clone(),
                    from,
                    to,
                    color: pt.color,
                });
            }
        }
        Some((frame[0].video_frame, segments))
    }
}
