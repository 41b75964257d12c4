//! Paragraph and verse formatting of clustered lines.
//!
//! Each visual line becomes one output line:
//!
//! - segments from title regions become headings (`### | `);
//! - a main-text segment lying left of its region's midpoint is the second
//!   hemistych of a verse and is joined with ` %~% `;
//! - other segments are joined with the configured separator.
//!
//! Lines starting left of the indentation threshold open a paragraph (`# `),
//! the others continue the previous one (`~~`). The bounding boxes are the
//! only signal available, so indentation is inferred from how far the right
//! edge (where right-to-left lines start) sits from the column median.

use crate::config::ConversionConfig;
use crate::layout::region::RegionType;
use crate::layout::segment::LineSegment;
use crate::utils::median;
use std::collections::HashMap;

/// Paragraph start token
pub const PARAGRAPH_MARK: &str = "# ";
/// Paragraph continuation token
pub const CONTINUATION_MARK: &str = "~~";
/// Separator between the two hemistychs of a verse
pub const HEMISTYCH_SEPARATOR: &str = " %~% ";
/// Heading token
pub const HEADING_MARK: &str = "### | ";

/// How a formatted line relates to its neighbours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Indented line opening a paragraph
    ParagraphStart,
    /// Line continuing the current paragraph
    Continuation,
    /// Line starting with a title segment
    Heading,
}

/// One output line with its classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedLine {
    /// Classification
    pub kind: LineKind,
    /// Joined segment text, without the paragraph token
    pub text: String,
}

impl FormattedLine {
    /// The line with its paragraph token.
    pub fn render(&self) -> String {
        match self.kind {
            LineKind::ParagraphStart => format!("{}{}", PARAGRAPH_MARK, self.text),
            LineKind::Continuation => format!("{}{}", CONTINUATION_MARK, self.text),
            LineKind::Heading => self.text.clone(),
        }
    }
}

/// Indentation threshold of a column.
///
/// `median(start) - 0.03 * median(length)`, where a line starts at the right
/// edge of its first segment and ends at the left edge of its last one. Zero
/// for a column without lines.
pub fn indent_threshold(lines: &[Vec<LineSegment>]) -> f32 {
    let starts: Vec<f32> = lines
        .iter()
        .filter_map(|line| line.first())
        .map(|s| s.bbox.max_x)
        .collect();
    let lengths: Vec<f32> = lines
        .iter()
        .filter_map(|line| Some(line.first()?.bbox.max_x - line.last()?.bbox.min_x))
        .collect();
    median(&starts).unwrap_or(0.0) - 0.03 * median(&lengths).unwrap_or(0.0)
}

/// Format the clustered lines of one column.
///
/// `midpoints` maps region types to the midpoints computed by
/// [`extract_segments`](crate::layout::segment::extract_segments).
pub fn format_lines(
    lines: &[Vec<LineSegment>],
    midpoints: &HashMap<RegionType, f32>,
    config: &ConversionConfig,
) -> Vec<FormattedLine> {
    let threshold = indent_threshold(lines);
    let main_midpoint = midpoints.get(&RegionType::Main).copied();

    lines
        .iter()
        .filter(|line| !line.is_empty())
        .map(|line| {
            let mut text = String::new();
            for segment in line {
                let content = segment.text.trim();
                match segment.region_type {
                    RegionType::Title => {
                        text.push('\n');
                        text.push_str(HEADING_MARK);
                        text.push_str(content);
                    },
                    RegionType::Main if main_midpoint.is_some_and(|mid| segment.bbox.max_x < mid) => {
                        text.push_str(HEMISTYCH_SEPARATOR);
                        text.push_str(content);
                    },
                    _ => {
                        if !text.is_empty() {
                            text.push_str(&config.segment_separator);
                        }
                        text.push_str(content);
                    },
                }
            }

            let first = &line[0];
            let kind = if first.region_type == RegionType::Title {
                LineKind::Heading
            } else if first.bbox.max_x < threshold {
                LineKind::ParagraphStart
            } else {
                LineKind::Continuation
            };
            FormattedLine { kind, text }
        })
        .collect()
}
