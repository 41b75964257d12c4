//! Minimal owned XML element tree.
//!
//! Layout files are small (one page each), so they are parsed eagerly into an
//! owned tree with quick-xml and queried by local name afterwards. Blank text
//! nodes are dropped while parsing.

use crate::error::{Error, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::path::Path;

/// Key under which the document's default namespace is stored.
pub const DEFAULT_NAMESPACE_KEY: &str = "default";

/// A node of the tree.
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    /// Child element
    Element(XmlElement),
    /// Text (or CDATA) content, already unescaped
    Text(String),
}

/// An element with its resolved namespace and attributes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct XmlElement {
    /// Local name (prefix stripped)
    pub name: String,
    /// Namespace URI, if the element is in one
    pub namespace: Option<String>,
    /// Attributes by local name, in document order
    pub attributes: Vec<(String, String)>,
    /// Child nodes in document order
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    /// Value of the attribute with the given local name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Direct child elements.
    pub fn child_elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(el) => Some(el),
            XmlNode::Text(_) => None,
        })
    }

    /// First direct child with the given local name.
    pub fn find(&self, name: &str) -> Option<&XmlElement> {
        self.child_elements().find(|el| el.name == name)
    }

    /// All descendants (excluding `self`) with the given local name, in
    /// document order.
    pub fn descendants(&self, name: &str) -> Vec<&XmlElement> {
        let mut out = Vec::new();
        self.collect_descendants(name, &mut out);
        out
    }

    fn collect_descendants<'a>(&'a self, name: &str, out: &mut Vec<&'a XmlElement>) {
        for child in self.child_elements() {
            if child.name == name {
                out.push(child);
            }
            child.collect_descendants(name, out);
        }
    }

    /// Descendants with the given local name paired with their parent element.
    pub fn descendants_with_parent<'a>(&'a self, name: &str) -> Vec<(&'a XmlElement, &'a XmlElement)> {
        let mut out = Vec::new();
        self.collect_with_parent(name, &mut out);
        out
    }

    fn collect_with_parent<'a>(
        &'a self,
        name: &str,
        out: &mut Vec<(&'a XmlElement, &'a XmlElement)>,
    ) {
        for child in self.child_elements() {
            if child.name == name {
                out.push((self, child));
            }
            child.collect_with_parent(name, out);
        }
    }

    /// Concatenation of every text node below this element.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for node in &self.children {
            match node {
                XmlNode::Text(text) => out.push_str(text),
                XmlNode::Element(el) => el.collect_text(out),
            }
        }
    }
}

/// A parsed document: root element plus the namespace declarations found.
#[derive(Debug, Clone)]
pub struct XmlTree {
    /// Root element
    pub root: XmlElement,
    /// Prefix → URI; the default namespace is under [`DEFAULT_NAMESPACE_KEY`]
    pub namespaces: HashMap<String, String>,
}

impl XmlTree {
    /// Parse a document. `path` is only used in error messages.
    pub fn parse(xml: &str, path: &Path) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        let mut namespaces: HashMap<String, String> = HashMap::new();
        // One scope per open element: prefix -> uri declared on that element
        let mut scopes: Vec<Vec<(String, String)>> = Vec::new();
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            let event = reader.read_event().map_err(|e| {
                Error::malformed(path, format!("{} (at byte {})", e, reader.buffer_position()))
            })?;
            match event {
                Event::Start(start) => {
                    let (element, declared) = open_element(&start, &scopes, &mut namespaces, path)?;
                    scopes.push(declared);
                    stack.push(element);
                },
                Event::Empty(start) => {
                    let (element, _) = open_element(&start, &scopes, &mut namespaces, path)?;
                    attach(element, &mut stack, &mut root, path)?;
                },
                Event::End(_) => {
                    scopes.pop();
                    let element = stack
                        .pop()
                        .ok_or_else(|| Error::malformed(path, "closing tag without opening tag"))?;
                    attach(element, &mut stack, &mut root, path)?;
                },
                Event::Text(text) => {
                    let text = text.unescape().map_err(|e| Error::malformed(path, e))?;
                    push_text(text.into_owned(), &mut stack, path)?;
                },
                Event::CData(cdata) => {
                    let text = String::from_utf8_lossy(&cdata.into_inner()).into_owned();
                    push_text(text, &mut stack, path)?;
                },
                Event::Eof => break,
                // Declarations, comments, processing instructions, doctype
                _ => {},
            }
        }

        if let Some(open) = stack.last() {
            return Err(Error::malformed(path, format!("unclosed element <{}>", open.name)));
        }
        let root = root.ok_or_else(|| Error::malformed(path, "document has no root element"))?;
        Ok(Self { root, namespaces })
    }

    /// URI of the default namespace, if declared.
    pub fn default_namespace(&self) -> Option<&str> {
        self.namespaces.get(DEFAULT_NAMESPACE_KEY).map(String::as_str)
    }
}

fn open_element(
    start: &BytesStart<'_>,
    scopes: &[Vec<(String, String)>],
    namespaces: &mut HashMap<String, String>,
    path: &Path,
) -> Result<(XmlElement, Vec<(String, String)>)> {
    let qname = std::str::from_utf8(start.name().as_ref())
        .map_err(|e| Error::malformed(path, e))?
        .to_string();

    let mut declared = Vec::new();
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| Error::malformed(path, e))?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(|e| Error::malformed(path, e))?
            .to_string();
        let value = attr
            .unescape_value()
            .map_err(|e| Error::malformed(path, e))?
            .into_owned();
        if key == "xmlns" {
            namespaces
                .entry(DEFAULT_NAMESPACE_KEY.to_string())
                .or_insert_with(|| value.clone());
            declared.push((String::new(), value));
        } else if let Some(prefix) = key.strip_prefix("xmlns:") {
            namespaces
                .entry(prefix.to_string())
                .or_insert_with(|| value.clone());
            declared.push((prefix.to_string(), value));
        } else {
            let local = key.rsplit(':').next().unwrap_or(&key).to_string();
            attributes.push((local, value));
        }
    }

    let (prefix, local) = match qname.split_once(':') {
        Some((p, l)) => (p, l.to_string()),
        None => ("", qname.clone()),
    };
    let namespace = declared
        .iter()
        .rev()
        .chain(scopes.iter().rev().flat_map(|scope| scope.iter().rev()))
        .find(|(p, _)| p == prefix)
        .map(|(_, uri)| uri.clone());

    Ok((
        XmlElement {
            name: local,
            namespace,
            attributes,
            children: Vec::new(),
        },
        declared,
    ))
}

fn attach(
    element: XmlElement,
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    path: &Path,
) -> Result<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(XmlNode::Element(element));
        Ok(())
    } else if root.is_none() {
        *root = Some(element);
        Ok(())
    } else {
        Err(Error::malformed(path, "more than one root element"))
    }
}

fn push_text(text: String, stack: &mut [XmlElement], path: &Path) -> Result<()> {
    if text.trim().is_empty() {
        return Ok(());
    }
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(XmlNode::Text(text));
            Ok(())
        },
        None => Err(Error::malformed(path, "text outside the root element")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(xml: &str) -> Result<XmlTree> {
        XmlTree::parse(xml, Path::new("test.xml"))
    }

    #[test]
    fn test_parse_default_namespace() {
        let tree = parse(
            r#"<?xml version="1.0" encoding="UTF-8"?>
            <PcGts xmlns="http://schema.primaresearch.org/PAGE/gts/pagecontent/2019-07-15">
                <Page imageFilename="img_001.jpg"/>
            </PcGts>"#,
        )
        .unwrap();
        assert_eq!(
            tree.default_namespace(),
            Some("http://schema.primaresearch.org/PAGE/gts/pagecontent/2019-07-15")
        );
        let page = tree.root.find("Page").unwrap();
        assert_eq!(page.namespace.as_deref(), tree.default_namespace());
        assert_eq!(page.attr("imageFilename"), Some("img_001.jpg"));
    }

    #[test]
    fn test_prefixed_elements_resolve_namespace() {
        let tree = parse(r#"<p:root xmlns:p="urn:x"><p:child a="1"/></p:root>"#).unwrap();
        assert_eq!(tree.root.name, "root");
        assert_eq!(tree.root.namespace.as_deref(), Some("urn:x"));
        assert_eq!(tree.namespaces.get("p").map(String::as_str), Some("urn:x"));
        assert!(tree.default_namespace().is_none());
    }

    #[test]
    fn test_blank_text_is_stripped() {
        let tree = parse("<a>\n   <b>x</b>\n   </a>").unwrap();
        assert_eq!(tree.root.children.len(), 1);
        assert_eq!(tree.root.text_content(), "x");
    }

    #[test]
    fn test_text_content_concatenates_descendants() {
        let tree = parse("<l><e><u>ab</u></e><e><u>&amp;c</u></e></l>").unwrap();
        assert_eq!(tree.root.text_content(), "ab&c");
    }

    #[test]
    fn test_descendants_with_parent() {
        let tree = parse("<r><g id='1'><x/></g><x/></r>").unwrap();
        let found = tree.root.descendants_with_parent("x");
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].0.attr("id"), Some("1"));
        assert_eq!(found[1].0.name, "r");
    }

    #[test]
    fn test_mismatched_tags_are_malformed() {
        let err = parse("<a><b></a>").unwrap_err();
        assert!(matches!(err, Error::MalformedLayout { .. }));
    }

    #[test]
    fn test_unclosed_tag_is_malformed() {
        let err = parse("<a><b>").unwrap_err();
        assert!(matches!(err, Error::MalformedLayout { .. }));
    }

    #[test]
    fn test_empty_input_is_malformed() {
        assert!(matches!(parse("").unwrap_err(), Error::MalformedLayout { .. }));
        assert!(matches!(parse("just text").unwrap_err(), Error::MalformedLayout { .. }));
    }
}
