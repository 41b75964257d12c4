//! Column detection from main-text regions.
//!
//! Scripts handled here are read right to left, so columns are ordered by
//! their right edge, rightmost first. Each main-text region that contains lines
//! becomes one column. When those regions overlap horizontally the page is
//! treated as a single column spanning the whole image.

use crate::layout::region::{Region, RegionType};
use crate::utils::safe_float_cmp;

/// A vertical band of the page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Column {
    /// Left edge
    pub min_x: f32,
    /// Right edge (`f32::INFINITY` for the full-page column)
    pub max_x: f32,
}

impl Column {
    /// Column covering the whole page.
    pub fn full_page() -> Self {
        Self {
            min_x: 0.0,
            max_x: f32::INFINITY,
        }
    }

    /// Whether a horizontal midpoint lies strictly inside the band.
    ///
    /// # Examples
    ///
    /// ```
    /// use pagexml_oxide::layout::column_detector::Column;
    ///
    /// let col = Column { min_x: 100.0, max_x: 500.0 };
    /// assert!(col.contains(300.0));
    /// assert!(!col.contains(100.0));
    /// assert!(!col.contains(500.0));
    /// ```
    pub fn contains(&self, mid_x: f32) -> bool {
        self.min_x < mid_x && mid_x < self.max_x
    }
}

/// Column layout of one page.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnLayout {
    /// Columns in reading order (rightmost first)
    pub columns: Vec<Column>,
    /// Number of main-text regions with lines
    pub main_regions: usize,
    /// Main-text regions overlapped, so the page fell back to one column
    pub ambiguous: bool,
}

impl ColumnLayout {
    /// Layout with the single full-page column.
    pub fn single() -> Self {
        Self {
            columns: vec![Column::full_page()],
            main_regions: 0,
            ambiguous: false,
        }
    }

    /// Whether page markers need a column suffix.
    pub fn is_multi_column(&self) -> bool {
        self.columns.len() > 1
    }
}

/// Detect the columns of a page from its regions.
///
/// Only regions classified as main text are considered; callers pass the
/// output of [`collect_regions`](crate::layout::region::collect_regions), which
/// already ignores regions without lines.
pub fn detect_columns(regions: &[Region]) -> ColumnLayout {
    let mut main: Vec<&Region> = regions
        .iter()
        .filter(|r| r.region_type == RegionType::Main)
        .collect();

    if main.len() <= 1 {
        return ColumnLayout {
            main_regions: main.len(),
            ..ColumnLayout::single()
        };
    }

    main.sort_by(|a, b| safe_float_cmp(b.bounding_box.max_x, a.bounding_box.max_x));

    let ambiguous = main
        .windows(2)
        .any(|pair| pair[0].bounding_box.min_x < pair[1].bounding_box.max_x);
    if ambiguous {
        log::debug!(
            "{} main-text regions overlap horizontally: {:?}",
            main.len(),
            main.iter().map(|r| r.id.as_str()).collect::<Vec<_>>()
        );
        return ColumnLayout {
            columns: vec![Column::full_page()],
            main_regions: main.len(),
            ambiguous: true,
        };
    }

    ColumnLayout {
        columns: main
            .iter()
            .map(|r| Column {
                min_x: r.bounding_box.min_x,
                max_x: r.bounding_box.max_x,
            })
            .collect(),
        main_regions: main.len(),
        ambiguous: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::BoundingBox;

    fn region(id: &str, region_type: RegionType, min_x: f32, max_x: f32) -> Region {
        Region {
            id: id.to_string(),
            region_type,
            bounding_box: BoundingBox::new(min_x, max_x, 0.0, 1000.0),
            line_count: 3,
        }
    }

    #[test]
    fn test_single_main_region_is_full_page() {
        let layout = detect_columns(&[
            region("m", RegionType::Main, 100.0, 900.0),
            region("t", RegionType::Title, 50.0, 950.0),
        ]);
        assert_eq!(layout.columns, vec![Column::full_page()]);
        assert_eq!(layout.main_regions, 1);
        assert!(!layout.is_multi_column());
    }

    #[test]
    fn test_no_regions() {
        let layout = detect_columns(&[]);
        assert_eq!(layout, ColumnLayout::single());
    }

    #[test]
    fn test_two_columns_rightmost_first() {
        let layout = detect_columns(&[
            region("left", RegionType::Main, 50.0, 450.0),
            region("right", RegionType::Main, 550.0, 950.0),
        ]);
        assert!(layout.is_multi_column());
        assert!(!layout.ambiguous);
        assert_eq!(
            layout.columns,
            vec![
                Column { min_x: 550.0, max_x: 950.0 },
                Column { min_x: 50.0, max_x: 450.0 },
            ]
        );
    }

    #[test]
    fn test_overlapping_main_regions_fall_back() {
        let layout = detect_columns(&[
            region("a", RegionType::Main, 50.0, 600.0),
            region("b", RegionType::Main, 500.0, 950.0),
        ]);
        assert!(layout.ambiguous);
        assert_eq!(layout.main_regions, 2);
        assert_eq!(layout.columns, vec![Column::full_page()]);
    }

    #[test]
    fn test_touching_regions_are_not_ambiguous() {
        let layout = detect_columns(&[
            region("a", RegionType::Main, 0.0, 500.0),
            region("b", RegionType::Main, 500.0, 1000.0),
        ]);
        assert!(!layout.ambiguous);
        assert_eq!(layout.columns.len(), 2);
    }

    #[test]
    fn test_full_page_contains() {
        let col = Column::full_page();
        assert!(col.contains(1.0));
        assert!(col.contains(1.0e9));
        assert!(!col.contains(0.0));
    }
}
