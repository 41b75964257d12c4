//! Error types for the layout reconstruction engine.
//!
//! Errors split into two families:
//! - [`Error`]: something that stops an operation. Per-page variants
//!   ([`Error::MalformedLayout`], [`Error::UnreadablePage`],
//!   [`Error::MissingGeometry`]) are caught by the batch driver and turn into
//!   skips; batch-level variants ([`Error::Archive`], [`Error::NoPages`], I/O
//!   on the input folder itself) are returned to the caller.
//! - [`PageWarning`]: a degradation that never stops anything. Warnings are
//!   collected in the conversion report so callers can audit a batch.

use std::fmt;
use std::path::PathBuf;

/// Result type alias for layout reconstruction operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while reconstructing a document.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Layout file is not well-formed XML
    #[error("Malformed layout file {path}: {reason}")]
    MalformedLayout {
        /// File (or logical name) of the page
        path: PathBuf,
        /// Parser message
        reason: String,
    },

    /// Page file could not be read
    #[error("Cannot read layout file {path}: {source}")]
    UnreadablePage {
        /// Page file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Line or region without a coordinate polygon
    #[error("Missing geometry for {element} '{id}'")]
    MissingGeometry {
        /// Element kind ("line" or "region")
        element: &'static str,
        /// Element id, or empty when the element has none
        id: String,
    },

    /// Archive could not be opened or extracted
    #[error("Archive error for {path}: {reason}")]
    Archive {
        /// Archive path
        path: PathBuf,
        /// Underlying reason
        reason: String,
    },

    /// Batch input contained no usable layout files
    #[error("No layout files found in {0}")]
    NoPages(PathBuf),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Multi-volume input could not be merged
    #[error("Cannot merge volumes: {0}")]
    VolumeMerge(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (configuration or metadata sidecar) error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Build a [`Error::MalformedLayout`] for the given page.
    pub fn malformed(path: impl Into<PathBuf>, reason: impl fmt::Display) -> Self {
        Error::MalformedLayout {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether the batch driver may skip the page and continue.
    pub fn is_page_local(&self) -> bool {
        matches!(
            self,
            Error::MalformedLayout { .. } | Error::UnreadablePage { .. } | Error::MissingGeometry { .. }
        )
    }
}

/// Non-fatal degradations recorded while converting a page.
#[derive(Debug, Clone, PartialEq)]
pub enum PageWarning {
    /// Main-text regions overlap horizontally; page treated as one column.
    AmbiguousColumnLayout {
        /// Page file name
        page: String,
        /// Number of main-text regions found
        regions: usize,
    },
    /// No usable lines; page contributes only its page marker.
    EmptyPage {
        /// Page file name
        page: String,
    },
    /// A line or region was dropped because it has no polygon.
    MissingGeometry {
        /// Page file name
        page: String,
        /// Number of elements dropped
        count: usize,
    },
}

impl fmt::Display for PageWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageWarning::AmbiguousColumnLayout { page, regions } => write!(
                f,
                "{}: {} overlapping main-text regions, converted as a single column",
                page, regions
            ),
            PageWarning::EmptyPage { page } => write!(f, "{}: no usable lines", page),
            PageWarning::MissingGeometry { page, count } => {
                write!(f, "{}: {} element(s) without coordinates skipped", page, count)
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_layout_error() {
        let err = Error::malformed("page_003.xml", "unexpected end of file");
        let msg = format!("{}", err);
        assert!(msg.contains("page_003.xml"));
        assert!(msg.contains("unexpected end of file"));
        assert!(err.is_page_local());
    }

    #[test]
    fn test_missing_geometry_error() {
        let err = Error::MissingGeometry {
            element: "line",
            id: "eSc_line_42".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("line"));
        assert!(msg.contains("eSc_line_42"));
        assert!(err.is_page_local());
    }

    #[test]
    fn test_unreadable_page_error() {
        let err = Error::UnreadablePage {
            path: PathBuf::from("export/page_0004.xml"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert!(err.to_string().contains("page_0004.xml"));
        assert!(err.is_page_local());
        assert!(!Error::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone")).is_page_local());
    }

    #[test]
    fn test_archive_error_is_batch_level() {
        let err = Error::Archive {
            path: PathBuf::from("export.zip"),
            reason: "invalid Zip archive".to_string(),
        };
        assert!(!err.is_page_local());
        assert!(format!("{}", err).contains("export.zip"));
    }

    #[test]
    fn test_warning_display() {
        let w = PageWarning::AmbiguousColumnLayout {
            page: "p1.xml".to_string(),
            regions: 2,
        };
        assert!(w.to_string().contains("single column"));
        let w = PageWarning::EmptyPage {
            page: "p2.xml".to_string(),
        };
        assert_eq!(w.to_string(), "p2.xml: no usable lines");
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}
