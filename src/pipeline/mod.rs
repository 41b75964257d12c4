//! Batch pipeline from page files to a document.
//!
//! ```text
//! folder / zip archive
//!     ↓
//! [list_layout_files] (extension filter, natural order, optional L/R reorder)
//!     ↓
//! LayoutDocument per page
//!     ↓
//! [MarkdownConverter] (columns → segments → lines → formatted text)
//!     ↓
//! Document (header + page texts)
//!     ↓
//! [merge_volumes] (multi-volume works only)
//! ```
//!
//! # Key Design Principles
//!
//! 1. **Sequential fold**: pages are converted in natural file order, because
//!    the page offset and the region selection carry from page to page.
//!
//! 2. **Best effort**: a malformed page is skipped and reported; only a
//!    broken batch input stops the conversion.

pub mod batch;
pub mod natural_sort;
pub mod volumes;

// Re-export main types
pub use batch::{
    list_layout_files, reorder_left_right, BatchConverter, ConversionReport, ConvertedDocument,
    Document, PageSource,
};
pub use natural_sort::{natural_cmp, natural_sort};
pub use volumes::{merge_volumes, merged_volume_name, VolumeGroups};
