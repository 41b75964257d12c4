//! Document header block.
//!
//! A converted document opens with a fixed header:
//!
//! ```text
//! ######OpenITI#
//!
//! #META# Creator: escriptorium
//! #META# transcription model: arabic_best
//!
//!
//! #META#Header#End#
//!
//! ```
//!
//! Fields come from the first converted page's `Metadata` element, minus the
//! fields that only describe that page, followed by batch-level transcription
//! metadata supplied by the caller.

use crate::config::ConversionConfig;
use crate::error::Result;
use indexmap::IndexMap;
use serde_json::Value;
use std::path::Path;

/// First line of every document
pub const HEADER_START: &str = "######OpenITI#";
/// Sentinel closing the header
pub const HEADER_END: &str = "#META#Header#End#";
/// Prefix of a metadata line
pub const META_PREFIX: &str = "#META# ";

/// Ordered `key: value` fields of a document header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentHeader {
    fields: Vec<(String, String)>,
}

impl DocumentHeader {
    /// Header without fields.
    pub fn new() -> Self {
        Self::default()
    }

    /// Compose the header of a batch from its first page's metadata.
    ///
    /// Page-specific fields (`config.page_specific_metadata`, compared
    /// case-insensitively, `*` entries by prefix) are dropped. Transcription metadata keys have
    /// underscores replaced by spaces; empty values are skipped.
    ///
    /// # Examples
    ///
    /// ```
    /// use indexmap::IndexMap;
    /// use pagexml_oxide::config::ConversionConfig;
    /// use pagexml_oxide::converters::header::DocumentHeader;
    ///
    /// let mut page = IndexMap::new();
    /// page.insert("Creator".to_string(), "escriptorium".to_string());
    /// page.insert("LastChange".to_string(), "2023-02-01".to_string());
    /// let config = ConversionConfig::default().with_meta("transcription_model", "arabic_best");
    ///
    /// let header = DocumentHeader::compose(&page, &config);
    /// assert_eq!(
    ///     header.render(),
    ///     "######OpenITI#\n\n#META# Creator: escriptorium\n#META# transcription model: arabic_best\n\n\n#META#Header#End#\n\n"
    /// );
    /// ```
    pub fn compose(page_metadata: &IndexMap<String, String>, config: &ConversionConfig) -> Self {
        let mut header = Self::new();
        for (key, value) in page_metadata {
            let page_specific = config
                .page_specific_metadata
                .iter()
                .any(|field| field_matches(field, key));
            if page_specific {
                log::debug!("Header: dropping page-specific field '{}'", key);
                continue;
            }
            header.push(key.clone(), value.clone());
        }
        for (key, value) in &config.transcription_meta {
            if value.is_empty() {
                continue;
            }
            header.push(key.replace('_', " "), value.clone());
        }
        header
    }

    /// Append a field.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.push((key.into(), value.into()));
    }

    /// Fields in order.
    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    /// Render the header block, sentinel and trailing blank line included.
    pub fn render(&self) -> String {
        let mut out = String::from(HEADER_START);
        out.push_str("\n\n");
        for (key, value) in &self.fields {
            out.push_str(META_PREFIX);
            out.push_str(key);
            out.push_str(": ");
            out.push_str(value);
            out.push('\n');
        }
        out.push_str("\n\n");
        out.push_str(HEADER_END);
        out.push_str("\n\n");
        out
    }
}

/// Case-insensitive field match; a trailing `*` matches any non-empty rest.
fn field_matches(pattern: &str, key: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => {
            key.len() > prefix.len()
                && key
                    .get(..prefix.len())
                    .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
        },
        None => pattern.eq_ignore_ascii_case(key),
    }
}

/// Split a rendered document at the header sentinel.
///
/// Returns the text before the sentinel and the text after it, or `None` if
/// the document has no header.
///
/// # Examples
///
/// ```
/// use pagexml_oxide::converters::header::split_header;
///
/// let (head, body) = split_header("######OpenITI#\n\n#META#Header#End#\n\n# text").unwrap();
/// assert_eq!(head, "######OpenITI#\n\n");
/// assert_eq!(body, "\n\n# text");
/// assert!(split_header("# no header").is_none());
/// ```
pub fn split_header(document: &str) -> Option<(&str, &str)> {
    document.split_once(HEADER_END)
}

/// Load transcription metadata from a JSON object file.
///
/// Strings are taken as they are, `null` values are omitted, and any other
/// value is kept as its JSON text. Key order follows the file.
pub fn load_transcription_meta(path: impl AsRef<Path>) -> Result<IndexMap<String, String>> {
    let text = std::fs::read_to_string(path.as_ref())?;
    let raw: IndexMap<String, Value> = serde_json::from_str(&text)?;
    let meta: IndexMap<String, String> = raw
        .into_iter()
        .filter_map(|(key, value)| match value {
            Value::Null => None,
            Value::String(s) => Some((key, s)),
            other => Some((key, other.to_string())),
        })
        .collect();
    log::debug!(
        "Loaded {} transcription metadata field(s) from {}",
        meta.len(),
        path.as_ref().display()
    );
    Ok(meta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_header() {
        assert_eq!(
            DocumentHeader::new().render(),
            "######OpenITI#\n\n\n\n#META#Header#End#\n\n"
        );
    }

    #[test]
    fn test_page_specific_fields_case_insensitive() {
        let mut page = IndexMap::new();
        page.insert("Creator".to_string(), "kraken".to_string());
        page.insert("lastchange".to_string(), "x".to_string());
        page.insert("Comments".to_string(), "y".to_string());
        page.insert("Created".to_string(), "".to_string());
        let header = DocumentHeader::compose(&page, &ConversionConfig::default());
        assert_eq!(
            header.fields(),
            &[
                ("Creator".to_string(), "kraken".to_string()),
                ("Created".to_string(), "".to_string()),
            ]
        );
    }

    #[test]
    fn test_image_fields_dropped_by_prefix() {
        let mut page = IndexMap::new();
        page.insert("IMAGE FILENAME".to_string(), "p_1.png".to_string());
        page.insert("IMAGE WIDTH".to_string(), "2480".to_string());
        page.insert("image height".to_string(), "3508".to_string());
        page.insert("IMAGE".to_string(), "kept".to_string());
        page.insert("Creator".to_string(), "kraken".to_string());
        let header = DocumentHeader::compose(&page, &ConversionConfig::default());
        assert_eq!(
            header.fields(),
            &[
                ("IMAGE".to_string(), "kept".to_string()),
                ("Creator".to_string(), "kraken".to_string()),
            ]
        );

        assert!(field_matches("Comments", "COMMENTS"));
        assert!(!field_matches("Comments", "Comments2"));
        assert!(field_matches("IMAGE*", "Image_Size"));
        assert!(!field_matches("IMAGE*", "ImagE"));
    }

    #[test]
    fn test_empty_transcription_values_skipped() {
        let config = ConversionConfig::default()
            .with_meta("transcription_layer", "")
            .with_meta("model_name", "m1");
        let header = DocumentHeader::compose(&IndexMap::new(), &config);
        assert_eq!(header.fields(), &[("model name".to_string(), "m1".to_string())]);
    }

    #[test]
    fn test_split_rendered_header() {
        let mut header = DocumentHeader::new();
        header.push("A", "1");
        let doc = format!("{}# body\n", header.render());
        let (head, body) = split_header(&doc).unwrap();
        assert!(head.starts_with(HEADER_START));
        assert!(head.contains("#META# A: 1\n"));
        assert_eq!(body, "\n\n# body\n");
    }

    #[test]
    fn test_load_transcription_meta() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"transcription_name": "manual", "pk": 12, "archived": null, "tags": ["a"]}}"#
        )
        .unwrap();
        let meta = load_transcription_meta(file.path()).unwrap();
        let pairs: Vec<(&str, &str)> = meta.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        assert_eq!(
            pairs,
            vec![("transcription_name", "manual"), ("pk", "12"), ("tags", "[\"a\"]")]
        );
    }

    #[test]
    fn test_load_transcription_meta_rejects_non_object() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[1, 2]").unwrap();
        assert!(load_transcription_meta(file.path()).is_err());
    }
}
