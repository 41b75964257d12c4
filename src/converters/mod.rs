//! Output converters for layout pages.
//!
//! This module turns analysed pages into mARkdown text:
//! - **Markdown**: page assembly with paragraph, verse and page markers
//! - **Header**: the document header block and its metadata fields
//! - **Whitespace**: clean-up of formatting artifacts
//!
//! # Examples
//!
//! ```no_run
//! use pagexml_oxide::config::{ConversionConfig, RegionSelection};
//! use pagexml_oxide::converters::{MarkdownConverter, PageNumbering};
//! use pagexml_oxide::document::LayoutDocument;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConversionConfig::default();
//! let converter = MarkdownConverter::new(&config)?;
//! let mut numbering = PageNumbering::new(&config);
//!
//! let doc = LayoutDocument::open("export/page_0001.xml")?;
//! let page = converter.convert_page(&doc, &RegionSelection::All, &mut numbering);
//! println!("{}", page.text);
//! # Ok(())
//! # }
//! ```

pub mod header;
pub mod markdown;
pub mod whitespace;

// Re-export main types
pub use header::{load_transcription_meta, split_header, DocumentHeader};
pub use markdown::{page_marker, MarkdownConverter, PageNumbering, PageText};
pub use whitespace::PostProcessor;
