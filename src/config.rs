//! Configuration for layout reconstruction.
//!
//! One immutable [`ConversionConfig`] is threaded through every stage of the
//! engine. It can be built in code with the `with_*` methods or loaded from a
//! JSON file; missing keys take their defaults.

use crate::error::{Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Which regions of a page contribute text.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionSelection {
    /// Every region, including lines outside any labelled region
    All,
    /// Only the named region types
    Include(Vec<String>),
    /// Every discovered region type except the named ones
    Exclude(Vec<String>),
    /// Not decided yet; resolved on the first page by a
    /// [`RegionDecider`](crate::layout::region::RegionDecider)
    #[default]
    Undecided,
}

impl RegionSelection {
    /// Build a selection from a comma/semicolon separated list.
    ///
    /// The literal `all` anywhere in the list selects everything.
    ///
    /// # Examples
    ///
    /// ```
    /// use pagexml_oxide::config::RegionSelection;
    ///
    /// assert_eq!(
    ///     RegionSelection::include_from_list("Main; Title,"),
    ///     RegionSelection::Include(vec!["Main".into(), "Title".into()])
    /// );
    /// assert_eq!(RegionSelection::include_from_list("Main, all"), RegionSelection::All);
    /// ```
    pub fn include_from_list(list: &str) -> Self {
        let names = split_names(list);
        if names.iter().any(|n| n == "all") {
            RegionSelection::All
        } else if names.is_empty() {
            RegionSelection::Undecided
        } else {
            RegionSelection::Include(names)
        }
    }

    /// Whether the selection still needs a decision.
    pub fn is_undecided(&self) -> bool {
        matches!(self, RegionSelection::Undecided)
    }
}

fn split_names(list: &str) -> Vec<String> {
    list.split([',', ';'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Batch conversion configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    /// Region selection policy
    pub regions: RegionSelection,

    /// Floor (in pixels) for the vertical/horizontal overlap that counts as
    /// meaningful when clustering line segments.
    pub min_line_overlap: f32,

    /// Separator between segments of one visual line that are not hemistychs.
    pub segment_separator: String,

    /// Prefix every page with a reference to its source image.
    pub include_image_name: bool,

    /// Drop lines that are not inside a labelled region.
    pub discard_orphan_lines: bool,

    /// Number added to the page number found in each file name.
    pub page_offset: i64,

    /// Real page number of the first file of the batch, if known.
    pub first_page: Option<i64>,

    /// Swap left/right pages whose file numbering is inverted.
    pub reorder_pages: bool,

    /// Label of the region type holding the main text.
    pub main_text_region: String,

    /// Label of the region type holding titles.
    pub title_region: String,

    /// Batch-level metadata appended to the document header.
    pub transcription_meta: IndexMap<String, String>,

    /// Volume number used in page markers.
    pub volume: u32,

    /// Extension of layout files inside a folder or archive.
    pub extension: String,

    /// Fraction of x coordinates discarded on each side before computing a
    /// region midpoint.
    pub extremes_ratio: f32,

    /// Multiplier applied to `min + max` of the trimmed x coordinates to get a
    /// region midpoint.
    pub midpoint_ratio: f32,

    /// Metadata fields that only describe a single page; never copied into the
    /// document header. An entry ending in `*` matches every longer field
    /// name starting with the rest of the entry.
    pub page_specific_metadata: Vec<String>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversionConfig {
    /// Create new configuration with defaults.
    pub fn new() -> Self {
        Self {
            regions: RegionSelection::Undecided,
            min_line_overlap: 20.0,
            segment_separator: "   ".to_string(),
            include_image_name: true,
            discard_orphan_lines: true,
            page_offset: 0,
            first_page: None,
            reorder_pages: false,
            main_text_region: "Main".to_string(),
            title_region: "Title".to_string(),
            transcription_meta: IndexMap::new(),
            volume: 1,
            extension: "xml".to_string(),
            extremes_ratio: 0.1,
            midpoint_ratio: 0.6,
            page_specific_metadata: vec![
                "LastChange".to_string(),
                "Comments".to_string(),
                "IMAGE*".to_string(),
            ],
        }
    }

    /// Load a configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that numeric options are in range.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..0.5).contains(&self.extremes_ratio) {
            return Err(Error::InvalidConfig(format!(
                "extremes_ratio must be in [0, 0.5), got {}",
                self.extremes_ratio
            )));
        }
        if !(self.midpoint_ratio > 0.0 && self.midpoint_ratio.is_finite()) {
            return Err(Error::InvalidConfig(format!(
                "midpoint_ratio must be positive, got {}",
                self.midpoint_ratio
            )));
        }
        if self.min_line_overlap.is_nan() || self.min_line_overlap < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "min_line_overlap must be non-negative, got {}",
                self.min_line_overlap
            )));
        }
        if self.extension.trim_start_matches('.').is_empty() {
            return Err(Error::InvalidConfig("extension must not be empty".to_string()));
        }
        Ok(())
    }

    /// Set the region selection.
    pub fn with_regions(mut self, regions: RegionSelection) -> Self {
        self.regions = regions;
        self
    }

    /// Set the minimum overlap floor.
    pub fn with_min_line_overlap(mut self, pixels: f32) -> Self {
        self.min_line_overlap = pixels;
        self
    }

    /// Set the segment separator.
    pub fn with_segment_separator(mut self, separator: impl Into<String>) -> Self {
        self.segment_separator = separator.into();
        self
    }

    /// Enable or disable image references.
    pub fn with_image_names(mut self, enable: bool) -> Self {
        self.include_image_name = enable;
        self
    }

    /// Keep or drop orphan lines.
    pub fn with_discard_orphan_lines(mut self, discard: bool) -> Self {
        self.discard_orphan_lines = discard;
        self
    }

    /// Set the initial page offset.
    pub fn with_page_offset(mut self, offset: i64) -> Self {
        self.page_offset = offset;
        self
    }

    /// Set the real page number of the first file.
    pub fn with_first_page(mut self, first_page: i64) -> Self {
        self.first_page = Some(first_page);
        self
    }

    /// Enable left/right page reordering.
    pub fn with_reorder_pages(mut self, enable: bool) -> Self {
        self.reorder_pages = enable;
        self
    }

    /// Set the main text region label.
    pub fn with_main_text_region(mut self, label: impl Into<String>) -> Self {
        self.main_text_region = label.into();
        self
    }

    /// Set the volume number.
    pub fn with_volume(mut self, volume: u32) -> Self {
        self.volume = volume;
        self
    }

    /// Add one batch metadata field.
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.transcription_meta.insert(key.into(), value.into());
        self
    }

    /// Normalised extension without a leading dot.
    pub fn extension(&self) -> &str {
        self.extension.trim_start_matches('.')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ConversionConfig::default();
        assert_eq!(config.min_line_overlap, 20.0);
        assert_eq!(config.segment_separator, "   ");
        assert!(config.include_image_name);
        assert!(config.discard_orphan_lines);
        assert_eq!(config.main_text_region, "Main");
        assert_eq!(config.volume, 1);
        assert!(config.regions.is_undecided());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = ConversionConfig::new()
            .with_first_page(5)
            .with_volume(2)
            .with_meta("transcription_layer_name", "kraken:model")
            .with_regions(RegionSelection::Exclude(vec!["Footnotes".into()]));
        assert_eq!(config.first_page, Some(5));
        assert_eq!(config.volume, 2);
        assert_eq!(config.transcription_meta["transcription_layer_name"], "kraken:model");
        assert_eq!(config.regions, RegionSelection::Exclude(vec!["Footnotes".into()]));
    }

    #[test]
    fn test_validate_rejects_bad_ratios() {
        let mut config = ConversionConfig::default();
        config.extremes_ratio = 0.5;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let mut config = ConversionConfig::default();
        config.midpoint_ratio = 0.0;
        assert!(config.validate().is_err());

        let mut config = ConversionConfig::default();
        config.extension = ".".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_json_partial_config() {
        let json = r#"{
            "regions": {"include": ["Main", "Title"]},
            "first_page": 3,
            "transcription_meta": {"model": "arabic_best"}
        }"#;
        let config: ConversionConfig = serde_json::from_str(json).unwrap();
        assert_eq!(
            config.regions,
            RegionSelection::Include(vec!["Main".into(), "Title".into()])
        );
        assert_eq!(config.first_page, Some(3));
        assert_eq!(config.segment_separator, "   ");
        assert_eq!(config.transcription_meta.get("model").map(String::as_str), Some("arabic_best"));
    }

    #[test]
    fn test_json_all_selection() {
        let config: ConversionConfig = serde_json::from_str(r#"{"regions": "all"}"#).unwrap();
        assert_eq!(config.regions, RegionSelection::All);
    }

    #[test]
    fn test_extension_normalised() {
        let mut config = ConversionConfig::default();
        config.extension = ".xml".to_string();
        assert_eq!(config.extension(), "xml");
    }
}
