//! Grouping line segments into visual lines.
//!
//! OCR engines often return one visual line as several polygons, e.g. the two
//! hemistychs of a verse separated by a gap. Segments are walked in reading
//! order (top to bottom) and compared with the segment placed just before:
//!
//! - vertical overlap without horizontal overlap: same visual line;
//! - anything else: a new line starts.
//!
//! The overlap threshold derives from the median line height, so a page with
//! a few very tall or very short polygons can mis-cluster. That is a known
//! limitation of the heuristic.

use crate::geometry::Bounded;
use crate::utils::safe_float_cmp;

/// Overlap (in pixels) that counts as meaningful on a page.
///
/// A third of the median line height, never below `floor`. Pages without any
/// line heights use `floor` alone.
///
/// # Examples
///
/// ```
/// use pagexml_oxide::layout::clustering::min_line_overlap;
///
/// assert_eq!(min_line_overlap(Some(90.0), 20.0), 30.0);
/// assert_eq!(min_line_overlap(Some(30.0), 20.0), 20.0);
/// assert_eq!(min_line_overlap(None, 20.0), 20.0);
/// ```
pub fn min_line_overlap(median_line_height: Option<f32>, floor: f32) -> f32 {
    match median_line_height {
        Some(median) => (median / 3.0).max(floor),
        None => floor,
    }
}

/// Cluster segments into visual lines.
///
/// `segments` must already be in reading order (`min_y` ascending). Each
/// returned line is sorted by `min_x` descending, i.e. right to left.
///
/// The previously placed segment starts at `(0, 0, 0)`. Horizontal overlap
/// is measured from whichever side the new segment sticks out on: when its
/// right edge is past the previous right edge, against the previous right
/// edge, otherwise against the previous left edge.
///
/// # Examples
///
/// ```
/// use pagexml_oxide::geometry::BoundingBox;
/// use pagexml_oxide::layout::clustering::cluster_segments;
///
/// let right = BoundingBox::new(150.0, 220.0, 52.0, 69.0);
/// let left = BoundingBox::new(10.0, 100.0, 50.0, 70.0);
/// let lines = cluster_segments(&[left, right], 5.0);
/// assert_eq!(lines, vec![vec![right, left]]);
/// ```
pub fn cluster_segments<T: Bounded + Clone>(segments: &[T], min_overlap: f32) -> Vec<Vec<T>> {
    let mut lines: Vec<Vec<T>> = Vec::new();
    let mut current: Vec<T> = Vec::new();

    let mut prev_max_y = 0.0_f32;
    let mut prev_max_x = 0.0_f32;
    let mut prev_min_x = 0.0_f32;

    for segment in segments {
        let bbox = segment.bbox();

        let vertical_overlap = (prev_max_y - bbox.min_y) > min_overlap;
        // Most failure-prone rule: which edge is compared depends on the
        // strict `>` between right edges.
        let horizontal_overlap = if bbox.max_x > prev_max_x {
            (prev_max_x - bbox.min_x) > min_overlap
        } else {
            (bbox.max_x - prev_min_x) > min_overlap
        };

        if vertical_overlap && !horizontal_overlap {
            current.push(segment.clone());
        } else {
            close_line(&mut current, &mut lines);
            current.push(segment.clone());
        }

        prev_max_y = bbox.max_y;
        prev_max_x = bbox.max_x;
        prev_min_x = bbox.min_x;
    }
    close_line(&mut current, &mut lines);

    lines
}

fn close_line<T: Bounded>(current: &mut Vec<T>, lines: &mut Vec<Vec<T>>) {
    if current.is_empty() {
        return;
    }
    let mut line = std::mem::take(current);
    // Stable, so segments with the same left edge keep reading order
    line.sort_by(|a, b| safe_float_cmp(b.bbox().min_x, a.bbox().min_x));
    lines.push(line);
}
