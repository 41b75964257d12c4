//! Clean-up of assembled page text.
//!
//! Removes artifacts left by line formatting: blank paragraphs, line numbers
//! that the OCR read as separate segments, and over-indented lines that are
//! really headings.

use crate::error::{Error, Result};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// A paragraph mark followed directly by a hemistych separator: the line
    /// started far left of the column, i.e. a centred title.
    static ref RE_INDENTED_TITLE: Regex = Regex::new(r"# +%~% ").unwrap();
}

/// Post-processing pass for one page, bound to a segment separator.
///
/// The separator-dependent patterns are compiled once per batch.
///
/// # Examples
///
/// ```
/// use pagexml_oxide::converters::whitespace::PostProcessor;
///
/// let post = PostProcessor::new("   ")?;
/// assert_eq!(post.process("# text\n~~   \n~~more   12\n"), "# text\n~~more\n");
/// assert_eq!(post.process("#  %~% Chapter\n"), "### | Chapter\n");
/// # Ok::<(), pagexml_oxide::error::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct PostProcessor {
    blank_paragraph: Regex,
    trailing_number: Regex,
    leading_number: Regex,
}

impl PostProcessor {
    /// Build the patterns for the given separator.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidConfig`] if a pattern exceeds the regex size limit,
    /// which only happens for absurdly long separators.
    pub fn new(separator: &str) -> Result<Self> {
        let sep = regex::escape(separator);
        let compile = |pattern: String| {
            Regex::new(&pattern)
                .map_err(|e| Error::InvalidConfig(format!("segment separator: {}", e)))
        };
        Ok(Self {
            blank_paragraph: compile(format!(r"\n~~(?:{})*\n", sep))?,
            trailing_number: compile(format!(r"{}\d+\n", sep))?,
            leading_number: compile(format!(r"(\n[# ~]+)\d+{}", sep))?,
        })
    }

    /// Apply the clean-up rules in order.
    pub fn process(&self, text: &str) -> String {
        let text = self.blank_paragraph.replace_all(text, "\n");
        let text = self.trailing_number.replace_all(&text, "\n");
        let text = self.leading_number.replace_all(&text, "${1}");
        RE_INDENTED_TITLE.replace_all(&text, "### | ").into_owned()
    }
}
