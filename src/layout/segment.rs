//! Line segment extraction.
//!
//! Turns the `TextLine` elements of one column into [`LineSegment`]s sorted in
//! reading order, and gathers the per-page statistics the later stages need:
//! a horizontal midpoint per region type (to spot second hemistychs) and the
//! median line height (to scale the clustering threshold).

use crate::config::{ConversionConfig, RegionSelection};
use crate::document::LayoutDocument;
use crate::geometry::{Bounded, BoundingBox};
use crate::layout::column_detector::Column;
use crate::layout::region::{outline, RegionType};
use crate::utils::{median, safe_float_cmp};
use std::cmp::Ordering;
use std::collections::HashMap;

/// One OCR line polygon with its text.
#[derive(Debug, Clone, PartialEq)]
pub struct LineSegment {
    /// Bounding box of the line polygon
    pub bbox: BoundingBox,
    /// Type of the containing region
    pub region_type: RegionType,
    /// Text of the line, untrimmed
    pub text: String,
}

impl LineSegment {
    /// Create a new segment.
    pub fn new(bbox: BoundingBox, region_type: RegionType, text: impl Into<String>) -> Self {
        Self {
            bbox,
            region_type,
            text: text.into(),
        }
    }
}

impl Bounded for LineSegment {
    fn bbox(&self) -> BoundingBox {
        self.bbox
    }
}

/// Segments of one column plus the statistics gathered while reading them.
#[derive(Debug, Clone, Default)]
pub struct SegmentSet {
    /// Segments sorted by `(min_y asc, max_x desc)`
    pub segments: Vec<LineSegment>,
    /// Horizontal midpoint of each region type present
    pub region_midpoints: HashMap<RegionType, f32>,
    /// Median of `max_y - min_y` over the segments, `None` when empty
    pub median_line_height: Option<f32>,
    /// Lines skipped because they have no polygon
    pub missing_geometry: usize,
}

impl SegmentSet {
    /// Midpoint of the given region type, if it has any segment.
    pub fn midpoint(&self, region_type: &RegionType) -> Option<f32> {
        self.region_midpoints.get(region_type).copied()
    }

    /// Whether no segment was extracted.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Extract the segments of one column.
///
/// A line is kept when its region type passes the selection (orphan lines
/// are dropped first when `discard_orphan_lines` is set), it has a polygon,
/// and its horizontal midpoint lies strictly inside `column`.
pub fn extract_segments(
    doc: &LayoutDocument,
    selection: &RegionSelection,
    column: &Column,
    config: &ConversionConfig,
) -> SegmentSet {
    let mut segments = Vec::new();
    let mut region_xs: HashMap<RegionType, Vec<f32>> = HashMap::new();
    let mut heights = Vec::new();
    let mut missing_geometry = 0;

    for element in doc.lines() {
        let region_type = RegionType::of_element(element.region, config);
        if region_type == RegionType::Unknown && config.discard_orphan_lines {
            continue;
        }
        if !selection.admits(&region_type, config) {
            continue;
        }

        let polygon = match outline(element.line, "line") {
            Ok(polygon) => polygon,
            Err(e) => {
                log::debug!("{}: {}, skipped", doc.name(), e);
                missing_geometry += 1;
                continue;
            },
        };
        let bbox = polygon.bounding_box();
        if !column.contains(bbox.mid_x()) {
            continue;
        }

        heights.push(bbox.height());
        region_xs
            .entry(region_type.clone())
            .or_default()
            .extend(polygon.xs());
        segments.push(LineSegment::new(bbox, region_type, element.line.text_content()));
    }

    segments.sort_by(reading_order);

    let region_midpoints = region_xs
        .into_iter()
        .map(|(region_type, mut xs)| {
            let mid = region_midpoint(&mut xs, config.extremes_ratio, config.midpoint_ratio);
            (region_type, mid)
        })
        .collect();

    log::debug!(
        "{}: {} segment(s) in column ({}, {})",
        doc.name(),
        segments.len(),
        column.min_x,
        column.max_x
    );

    SegmentSet {
        segments,
        region_midpoints,
        median_line_height: median(&heights),
        missing_geometry,
    }
}

/// Reading order of segments: top to bottom, then right to left.
pub fn reading_order(a: &LineSegment, b: &LineSegment) -> Ordering {
    safe_float_cmp(a.bbox.min_y, b.bbox.min_y).then_with(|| safe_float_cmp(b.bbox.max_x, a.bbox.max_x))
}

/// Horizontal midpoint of a region from the x coordinates of its lines.
///
/// `floor(extremes_ratio * n)` values are trimmed from each end of the
/// sorted coordinates when that count is above one; the result is
/// `midpoint_ratio * (min + max)` of what is left. Sorts `xs` in place.
/// Returns 0 for an empty slice.
///
/// # Examples
///
/// ```
/// use pagexml_oxide::layout::segment::region_midpoint;
///
/// let mut xs = vec![100.0, 900.0, 120.0, 880.0];
/// assert_eq!(region_midpoint(&mut xs, 0.1, 0.5), 500.0);
/// assert_eq!(region_midpoint(&mut [], 0.1, 0.6), 0.0);
/// ```
pub fn region_midpoint(xs: &mut [f32], extremes_ratio: f32, midpoint_ratio: f32) -> f32 {
    xs.sort_by(|a, b| safe_float_cmp(*a, *b));
    let extremes = (extremes_ratio * xs.len() as f32).floor() as usize;
    let kept = if extremes > 1 && 2 * extremes < xs.len() {
        &xs[extremes..xs.len() - extremes]
    } else {
        &xs[..]
    };
    match (kept.first(), kept.last()) {
        (Some(min), Some(max)) => midpoint_ratio * (min + max),
        _ => 0.0,
    }
}
