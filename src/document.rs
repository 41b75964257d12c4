//! Layout document loading.
//!
//! A [`LayoutDocument`] is one page of PAGE XML: the parsed element tree, the
//! namespace map, and the page-level facts later stages need (source image,
//! metadata fields, page number declared by the file name).

use crate::error::{Error, Result};
use crate::xml::{XmlElement, XmlTree};
use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

lazy_static! {
    /// Runs of digits in a file name
    static ref RE_DIGITS: Regex = Regex::new(r"[0-9]+").unwrap();
}

/// A `TextLine` element together with the element that contains it.
#[derive(Debug, Clone, Copy)]
pub struct LineElement<'a> {
    /// The `TextLine` element
    pub line: &'a XmlElement,
    /// Its `TextRegion`, or `None` for an orphan line
    pub region: Option<&'a XmlElement>,
}

/// One page's parsed layout.
#[derive(Debug, Clone)]
pub struct LayoutDocument {
    path: PathBuf,
    tree: XmlTree,
    image_filename: String,
    metadata: IndexMap<String, String>,
    page_number: Option<i64>,
}

impl LayoutDocument {
    /// Open and parse a layout file.
    ///
    /// # Errors
    ///
    /// [`Error::UnreadablePage`] when the file cannot be read,
    /// [`Error::MalformedLayout`] when it is not well-formed XML or not UTF-8.
    /// Both are page-local.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use pagexml_oxide::document::LayoutDocument;
    ///
    /// let doc = LayoutDocument::open("export/page_0007.xml")?;
    /// println!("{} -> {:?}", doc.image_filename(), doc.page_number());
    /// # Ok::<(), pagexml_oxide::error::Error>(())
    /// ```
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| Error::UnreadablePage {
            path: path.to_path_buf(),
            source,
        })?;
        let text = String::from_utf8(bytes).map_err(|e| Error::malformed(path, e))?;
        Self::parse_str(&text, path)
    }

    /// Parse layout XML held in memory. `path` supplies the page name and the
    /// page number.
    pub fn parse_str(xml: &str, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        // Tolerate a UTF-8 byte order mark
        let xml = xml.strip_prefix('\u{feff}').unwrap_or(xml);
        let tree = XmlTree::parse(xml, &path)?;

        let mut doc = Self {
            page_number: page_number_from_path(&path),
            path,
            tree,
            image_filename: String::new(),
            metadata: IndexMap::new(),
        };
        doc.image_filename = doc
            .first_element("Page")
            .and_then(|page| page.attr("imageFilename"))
            .unwrap_or_default()
            .to_string();
        doc.metadata = doc.read_metadata();

        log::debug!(
            "Loaded {}: image='{}', page={:?}, {} metadata field(s)",
            doc.name(),
            doc.image_filename,
            doc.page_number,
            doc.metadata.len()
        );
        Ok(doc)
    }

    fn read_metadata(&self) -> IndexMap<String, String> {
        let mut fields = IndexMap::new();
        if let Some(meta) = self.first_element("Metadata") {
            for child in meta.child_elements() {
                fields.insert(child.name.clone(), child.text_content().trim().to_string());
            }
        }
        fields
    }

    /// Path the page was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name of the page, used in logs and warnings.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    /// Root element of the tree.
    pub fn root(&self) -> &XmlElement {
        &self.tree.root
    }

    /// Namespace map; the default namespace is under `"default"`.
    pub fn namespaces(&self) -> &HashMap<String, String> {
        &self.tree.namespaces
    }

    /// Source image declared by the `Page` element, or `""`.
    pub fn image_filename(&self) -> &str {
        &self.image_filename
    }

    /// Children of the `Metadata` element as `tag → text`.
    pub fn metadata(&self) -> &IndexMap<String, String> {
        &self.metadata
    }

    /// Page number declared by the file name (last run of digits).
    pub fn page_number(&self) -> Option<i64> {
        self.page_number
    }

    /// Override the page number, e.g. after reordering a batch.
    pub fn set_page_number(&mut self, page_number: i64) {
        self.page_number = Some(page_number);
    }

    /// Whether an element is in the namespace of the root element.
    ///
    /// The root's namespace is the page namespace whether it is declared as
    /// the default or bound to a prefix (`<pc:PcGts xmlns:pc="...">`).
    fn in_page_namespace(&self, element: &XmlElement) -> bool {
        element.namespace == self.tree.root.namespace
    }

    fn first_element(&self, name: &str) -> Option<&XmlElement> {
        if self.tree.root.name == name && self.in_page_namespace(&self.tree.root) {
            return Some(&self.tree.root);
        }
        self.tree
            .root
            .descendants(name)
            .into_iter()
            .find(|el| self.in_page_namespace(el))
    }

    /// All `TextRegion` elements in document order.
    pub fn regions(&self) -> Vec<&XmlElement> {
        self.tree
            .root
            .descendants("TextRegion")
            .into_iter()
            .filter(|el| self.in_page_namespace(el))
            .collect()
    }

    /// All `TextLine` elements with their containing region.
    pub fn lines(&self) -> Vec<LineElement<'_>> {
        self.tree
            .root
            .descendants_with_parent("TextLine")
            .into_iter()
            .filter(|(_, line)| self.in_page_namespace(line))
            .map(|(parent, line)| LineElement {
                line,
                region: (parent.name == "TextRegion").then_some(parent),
            })
            .collect()
    }
}

/// Page number declared by a file name: its last run of digits.
///
/// Only the file name is inspected, so digits in parent folders are ignored.
///
/// # Examples
///
/// ```
/// use pagexml_oxide::document::page_number_from_path;
/// use std::path::Path;
///
/// assert_eq!(page_number_from_path(Path::new("vol2/ms_12_page_007.xml")), Some(7));
/// assert_eq!(page_number_from_path(Path::new("cover.xml")), None);
/// ```
pub fn page_number_from_path(path: &Path) -> Option<i64> {
    let name = path.file_name()?.to_string_lossy();
    RE_DIGITS
        .find_iter(&name)
        .last()
        .and_then(|m| m.as_str().parse::<i64>().ok())
}
