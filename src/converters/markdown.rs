//! mARkdown converter for layout pages.
//!
//! This module assembles the text of one page:
//! - Column detection and per-column segment extraction
//! - Line clustering and paragraph/verse formatting
//! - Page markers (`PageV01P007`, lettered per column on multi-column pages)
//! - Image reference line and artifact clean-up

use crate::config::{ConversionConfig, RegionSelection};
use crate::converters::whitespace::PostProcessor;
use crate::document::LayoutDocument;
use crate::error::{PageWarning, Result};
use crate::layout::clustering::{cluster_segments, min_line_overlap};
use crate::layout::column_detector::detect_columns;
use crate::layout::paragraph::format_lines;
use crate::layout::region::collect_regions;
use crate::layout::segment::extract_segments;
use indexmap::IndexMap;

/// Page marker closing a column.
///
/// # Examples
///
/// ```
/// use pagexml_oxide::converters::markdown::page_marker;
///
/// assert_eq!(page_marker(1, 7, ""), "\nPageV01P007\n\n");
/// assert_eq!(page_marker(2, 12, "B"), "\nPageV02P012B\n\n");
/// ```
pub fn page_marker(volume: u32, page: i64, suffix: &str) -> String {
    format!("\nPageV{:02}P{:03}{}\n\n", volume, page, suffix)
}

/// Letter suffix of the n-th column (0-based).
fn column_suffix(index: usize) -> char {
    char::from(b'A' + (index % 26) as u8)
}

/// Running page numbering of a batch.
///
/// The page number printed in a marker is the number found in the file name
/// plus an offset. A first-page override fixes the offset on the first page
/// numbered; afterwards the offset is carried unchanged, so numbering stays
/// continuous even when file names restart.
///
/// # Examples
///
/// ```
/// use pagexml_oxide::config::ConversionConfig;
/// use pagexml_oxide::converters::markdown::PageNumbering;
///
/// let config = ConversionConfig::default().with_first_page(5);
/// let mut numbering = PageNumbering::new(&config);
/// assert_eq!(numbering.number(Some(1)), 5);
/// assert_eq!(numbering.number(Some(2)), 6);
/// assert_eq!(numbering.number(Some(3)), 7);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageNumbering {
    offset: i64,
    first_page: Option<i64>,
    position: i64,
}

impl PageNumbering {
    /// Start numbering with the configured offset and first-page override.
    ///
    /// A first page of 0 means "no override".
    pub fn new(config: &ConversionConfig) -> Self {
        Self {
            offset: config.page_offset,
            first_page: config.first_page.filter(|&page| page != 0),
            position: 0,
        }
    }

    /// Number of the next page.
    ///
    /// `declared` is the number found in the file name; pages without one use
    /// their 1-based position in the batch.
    pub fn number(&mut self, declared: Option<i64>) -> i64 {
        self.position += 1;
        let declared = declared.unwrap_or(self.position);
        if let Some(first_page) = self.first_page.take() {
            self.offset = first_page - declared;
            if first_page < 0 {
                self.offset += 1;
            }
            log::debug!("First page {} set page offset to {}", first_page, self.offset);
        }
        declared + self.offset
    }

    /// Offset currently applied.
    pub fn offset(&self) -> i64 {
        self.offset
    }
}

/// Assembled text of one page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageText {
    /// Page text, markers included
    pub text: String,
    /// Number printed in the page marker(s)
    pub page_number: i64,
    /// `Metadata` fields of the page
    pub metadata: IndexMap<String, String>,
    /// Degradations met while converting
    pub warnings: Vec<PageWarning>,
}

/// Converter from layout pages to mARkdown.
///
/// # Examples
///
/// ```
/// use pagexml_oxide::config::{ConversionConfig, RegionSelection};
/// use pagexml_oxide::converters::markdown::{MarkdownConverter, PageNumbering};
/// use pagexml_oxide::document::LayoutDocument;
///
/// let xml = r#"<PcGts xmlns="urn:page"><Page imageFilename="f1.jpg">
///   <TextRegion custom="structure {type:Main;}">
///     <Coords points="0,0 1000,0 1000,1000 0,1000"/>
///     <TextLine><Coords points="100,50 900,50 900,90 100,90"/>
///       <TextEquiv><Unicode>bismillah</Unicode></TextEquiv></TextLine>
///   </TextRegion></Page></PcGts>"#;
/// let doc = LayoutDocument::parse_str(xml, "page_1.xml")?;
///
/// let config = ConversionConfig::default();
/// let converter = MarkdownConverter::new(&config)?;
/// let mut numbering = PageNumbering::new(&config);
/// let page = converter.convert_page(&doc, &RegionSelection::All, &mut numbering);
/// assert_eq!(page.text, "![image filename](./f1.jpg)\n\n~~bismillah\n\nPageV01P001\n\n");
/// # Ok::<(), pagexml_oxide::error::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct MarkdownConverter {
    config: ConversionConfig,
    post: PostProcessor,
}

impl MarkdownConverter {
    /// Create a converter for the given configuration.
    pub fn new(config: &ConversionConfig) -> Result<Self> {
        Ok(Self {
            config: config.clone(),
            post: PostProcessor::new(&config.segment_separator)?,
        })
    }

    /// Configuration in use.
    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// Convert one page.
    ///
    /// `selection` must already be resolved; an undecided selection admits
    /// every region.
    pub fn convert_page(
        &self,
        doc: &LayoutDocument,
        selection: &RegionSelection,
        numbering: &mut PageNumbering,
    ) -> PageText {
        let config = &self.config;
        let page_name = doc.name();
        let mut warnings = Vec::new();

        let (regions, missing_regions) = collect_regions(doc, config);
        let layout = detect_columns(&regions);
        if layout.ambiguous {
            log::warn!("{}: overlapping columns, converting as a single column", page_name);
            warnings.push(PageWarning::AmbiguousColumnLayout {
                page: page_name.clone(),
                regions: layout.main_regions,
            });
        } else if layout.is_multi_column() {
            log::warn!("{} columns in {}", layout.columns.len(), page_name);
        }

        let page_number = numbering.number(doc.page_number());

        let mut text = String::new();
        let mut segment_count = 0;
        // Lines without coordinates are seen once per column
        let mut missing_lines = 0;
        for (index, column) in layout.columns.iter().enumerate() {
            let set = extract_segments(doc, selection, column, config);
            segment_count += set.segments.len();
            missing_lines = missing_lines.max(set.missing_geometry);

            let overlap = min_line_overlap(set.median_line_height, config.min_line_overlap);
            let lines = cluster_segments(&set.segments, overlap);
            for line in format_lines(&lines, &set.region_midpoints, config) {
                text.push_str(&line.render());
                text.push('\n');
            }

            let suffix = if layout.is_multi_column() {
                column_suffix(index).to_string()
            } else {
                String::new()
            };
            text.push_str(&page_marker(config.volume, page_number, &suffix));
        }

        if segment_count == 0 {
            log::warn!("{}: no usable lines", page_name);
            warnings.push(PageWarning::EmptyPage {
                page: page_name.clone(),
            });
        }
        let missing = missing_regions + missing_lines;
        if missing > 0 {
            warnings.push(PageWarning::MissingGeometry {
                page: page_name.clone(),
                count: missing,
            });
        }

        if config.include_image_name {
            text = format!("![image filename](./{})\n\n{}", doc.image_filename(), text);
        }

        log::debug!(
            "{}: page {} with {} segment(s) in {} column(s)",
            page_name,
            page_number,
            segment_count,
            layout.columns.len()
        );

        PageText {
            text: self.post.process(&text),
            page_number,
            metadata: doc.metadata().clone(),
            warnings,
        }
    }
}
