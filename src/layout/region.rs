//! Region classification and selection.
//!
//! Region types come from a free-text `custom` attribute
//! (`custom="structure {type:Main;}"`). Classification never fails: anything
//! absent or unreadable becomes [`RegionType::Unknown`].

use crate::config::{ConversionConfig, RegionSelection};
use crate::document::LayoutDocument;
use crate::error::{Error, Result};
use crate::geometry::{BoundingBox, Polygon};
use crate::xml::XmlElement;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// `type:<name>` inside a `custom` attribute
    static ref RE_REGION_TYPE: Regex = Regex::new(r"type:(\w+)").unwrap();
}

/// Type of a page region.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RegionType {
    /// Main text (label configured by `main_text_region`)
    Main,
    /// Titles and headings (label configured by `title_region`)
    Title,
    /// Footnotes
    Footnotes,
    /// Any other labelled region
    Other(String),
    /// No label, or a line outside any region
    Unknown,
}

impl RegionType {
    /// Classify a `custom` attribute value.
    ///
    /// # Examples
    ///
    /// ```
    /// use pagexml_oxide::config::ConversionConfig;
    /// use pagexml_oxide::layout::region::RegionType;
    ///
    /// let config = ConversionConfig::default();
    /// assert_eq!(RegionType::classify(Some("structure {type:Main;}"), &config), RegionType::Main);
    /// assert_eq!(
    ///     RegionType::classify(Some("structure {type:Commentary;}"), &config),
    ///     RegionType::Other("Commentary".into())
    /// );
    /// assert_eq!(RegionType::classify(Some("readingOrder {index:0;}"), &config), RegionType::Unknown);
    /// assert_eq!(RegionType::classify(None, &config), RegionType::Unknown);
    /// ```
    pub fn classify(custom: Option<&str>, config: &ConversionConfig) -> Self {
        custom
            .and_then(|c| RE_REGION_TYPE.captures(c))
            .and_then(|caps| caps.get(1))
            .map(|m| Self::from_label(m.as_str(), config))
            .unwrap_or(RegionType::Unknown)
    }

    /// Map a bare label to a region type.
    pub fn from_label(label: &str, config: &ConversionConfig) -> Self {
        if label == config.main_text_region {
            RegionType::Main
        } else if label == config.title_region {
            RegionType::Title
        } else if label == "Footnotes" {
            RegionType::Footnotes
        } else {
            RegionType::Other(label.to_string())
        }
    }

    /// Type of the region element containing a line (`None` = orphan line).
    pub fn of_element(region: Option<&XmlElement>, config: &ConversionConfig) -> Self {
        region
            .map(|r| Self::classify(r.attr("custom"), config))
            .unwrap_or(RegionType::Unknown)
    }

    /// Label used in selection lists, or `None` for [`RegionType::Unknown`].
    pub fn label<'a>(&'a self, config: &'a ConversionConfig) -> Option<&'a str> {
        match self {
            RegionType::Main => Some(config.main_text_region.as_str()),
            RegionType::Title => Some(config.title_region.as_str()),
            RegionType::Footnotes => Some("Footnotes"),
            RegionType::Other(label) => Some(label.as_str()),
            RegionType::Unknown => None,
        }
    }
}

impl RegionSelection {
    /// Whether lines of the given region type are extracted.
    ///
    /// An undecided selection admits everything; the batch driver resolves it
    /// before the first page is converted.
    pub fn admits(&self, region_type: &RegionType, config: &ConversionConfig) -> bool {
        let label = region_type.label(config);
        match self {
            RegionSelection::All | RegionSelection::Undecided => true,
            RegionSelection::Include(names) => label.is_some_and(|l| names.iter().any(|n| n == l)),
            RegionSelection::Exclude(names) => label.map_or(true, |l| !names.iter().any(|n| n == l)),
        }
    }
}

/// Decides the region selection when none was configured.
///
/// Stands in for asking a person which of the discovered region types to
/// keep. Closures taking the discovered types implement it too.
pub trait RegionDecider: Send + Sync {
    /// Choose a selection given the region types found on the first page.
    fn decide(&self, discovered: &[RegionType]) -> RegionSelection;

    /// Return the name of this decider for debugging.
    fn name(&self) -> &'static str {
        "custom"
    }
}

/// Decider that keeps every region.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAllRegions;

impl RegionDecider for AcceptAllRegions {
    fn decide(&self, _discovered: &[RegionType]) -> RegionSelection {
        RegionSelection::All
    }

    fn name(&self) -> &'static str {
        "accept-all"
    }
}

impl<F> RegionDecider for F
where
    F: Fn(&[RegionType]) -> RegionSelection + Send + Sync,
{
    fn decide(&self, discovered: &[RegionType]) -> RegionSelection {
        self(discovered)
    }
}

/// Resolve the configured selection for a batch whose first page is `doc`.
pub fn resolve_selection(
    config: &ConversionConfig,
    doc: &LayoutDocument,
    decider: &dyn RegionDecider,
) -> RegionSelection {
    if !config.regions.is_undecided() {
        return config.regions.clone();
    }
    let discovered = discover_region_types(doc, config);
    let selection = decider.decide(&discovered);
    log::info!(
        "Region selection for {} by {} decider (discovered {:?}): {:?}",
        doc.name(),
        decider.name(),
        discovered,
        selection
    );
    selection
}

/// Distinct region types used on a page, in order of first appearance.
pub fn discover_region_types(doc: &LayoutDocument, config: &ConversionConfig) -> Vec<RegionType> {
    let mut types: Vec<RegionType> = Vec::new();
    for region in doc.regions() {
        let region_type = RegionType::classify(region.attr("custom"), config);
        if !types.contains(&region_type) {
            types.push(region_type);
        }
    }
    types
}

/// A labelled region with text lines in it.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    /// `id` attribute (empty when missing)
    pub id: String,
    /// Classified type
    pub region_type: RegionType,
    /// Bounding box of the outline polygon
    pub bounding_box: BoundingBox,
    /// Number of `TextLine` children
    pub line_count: usize,
}

/// Outline polygon of a region or line element, from its `Coords` child.
///
/// # Errors
///
/// [`Error::MissingGeometry`] when the element has no `Coords` child or its
/// points do not parse. `kind` names the element in the error.
pub fn outline(element: &XmlElement, kind: &'static str) -> Result<Polygon> {
    element
        .find("Coords")
        .and_then(|coords| coords.attr("points"))
        .and_then(Polygon::parse)
        .ok_or_else(|| Error::MissingGeometry {
            element: kind,
            id: element.attr("id").unwrap_or_default().to_string(),
        })
}

/// Regions of a page that contain at least one line.
///
/// Regions without an outline are skipped; the second value counts them.
pub fn collect_regions(doc: &LayoutDocument, config: &ConversionConfig) -> (Vec<Region>, usize) {
    let mut regions = Vec::new();
    let mut missing = 0;
    for element in doc.regions() {
        let line_count = element.child_elements().filter(|c| c.name == "TextLine").count();
        if line_count == 0 {
            continue;
        }
        let id = element.attr("id").unwrap_or_default().to_string();
        let polygon = match outline(element, "region") {
            Ok(polygon) => polygon,
            Err(e) => {
                log::debug!("{}: {}, skipped", doc.name(), e);
                missing += 1;
                continue;
            },
        };
        regions.push(Region {
            id,
            region_type: RegionType::classify(element.attr("custom"), config),
            bounding_box: polygon.bounding_box(),
            line_count,
        });
    }
    (regions, missing)
}
