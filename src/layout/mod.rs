//! Layout analysis for OCR page layouts.
//!
//! This module turns the geometry of one page into ordered, formatted lines:
//! - Region classification and selection
//! - Column detection from main-text regions
//! - Line segment extraction in reading order
//! - Clustering of segments into visual lines
//! - Paragraph and verse formatting

pub mod clustering;
pub mod column_detector;
pub mod paragraph;
pub mod region;
pub mod segment;

// Re-export main types
pub use clustering::{cluster_segments, min_line_overlap};
pub use column_detector::{detect_columns, Column, ColumnLayout};
pub use paragraph::{format_lines, indent_threshold, FormattedLine, LineKind};
pub use region::{
    collect_regions, discover_region_types, resolve_selection, AcceptAllRegions, Region,
    RegionDecider, RegionType,
};
pub use segment::{extract_segments, region_midpoint, LineSegment, SegmentSet};
