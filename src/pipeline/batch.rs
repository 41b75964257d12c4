//! Batch conversion of page folders and archives into one document.
//!
//! Pages are converted strictly in order: the region selection is decided on
//! the first page and the page offset carries from page to page. A page that
//! cannot be parsed is skipped and recorded in the [`ConversionReport`];
//! problems with the batch input itself are returned as errors.

use crate::config::{ConversionConfig, RegionSelection};
use crate::converters::header::DocumentHeader;
use crate::converters::markdown::{MarkdownConverter, PageNumbering, PageText};
use crate::document::{page_number_from_path, LayoutDocument};
use crate::error::{Error, PageWarning, Result};
use crate::layout::region::{
    discover_region_types, resolve_selection, AcceptAllRegions, RegionDecider, RegionType,
};
use crate::pipeline::natural_sort::natural_cmp;
use std::fs;
use std::path::{Path, PathBuf};

/// A page file with the number it is converted under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSource {
    /// Layout file
    pub path: PathBuf,
    /// Page number; `None` keeps the number found in the file name
    pub page_number: Option<i64>,
}

impl PageSource {
    /// Source keeping the file's own page number.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            page_number: None,
        }
    }
}

/// Outcome of a batch besides the text itself.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversionReport {
    /// Pages converted
    pub pages_converted: usize,
    /// Pages skipped, with the reason
    pub skipped: Vec<(PathBuf, String)>,
    /// Non-fatal degradations, in page order
    pub warnings: Vec<PageWarning>,
    /// Region selection used for the batch
    pub selection: RegionSelection,
}

/// A converted document: header plus page texts in order.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Header block
    pub header: DocumentHeader,
    /// Converted pages
    pub pages: Vec<PageText>,
}

impl Document {
    /// Concatenated page texts.
    pub fn body(&self) -> String {
        self.pages.iter().map(|p| p.text.as_str()).collect()
    }

    /// Full document text, header first.
    pub fn render(&self) -> String {
        let mut out = self.header.render();
        out.push_str(&self.body());
        out
    }

    /// Write the rendered document to a file.
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path.as_ref(), self.render())?;
        log::info!("Wrote {} page(s) to {}", self.pages.len(), path.as_ref().display());
        Ok(())
    }
}

/// A converted document with its report.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertedDocument {
    /// The document
    pub document: Document,
    /// What happened while converting it
    pub report: ConversionReport,
}

/// Layout files of a folder, in natural order.
///
/// Keeps regular files whose name ends with the configured extension and
/// does not start with `METS` (the archive manifest).
pub fn list_layout_files(dir: impl AsRef<Path>, config: &ConversionConfig) -> Result<Vec<PathBuf>> {
    let suffix = format!(".{}", config.extension());
    let mut files = Vec::new();
    for entry in fs::read_dir(dir.as_ref())? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };
        if name.ends_with(&suffix) && !name.starts_with("METS") {
            files.push(path);
        }
    }
    sort_paths(&mut files);
    Ok(files)
}

fn sort_paths(files: &mut [PathBuf]) {
    files.sort_by(|a, b| natural_cmp(&a.to_string_lossy(), &b.to_string_lossy()));
}

/// Swap left and right pages whose file numbering is inverted.
///
/// Scans of a book opening are sometimes numbered left page first. Each
/// odd-numbered file moves two slots earlier, then the numbers originally
/// found in the file names are handed out again, in ascending order, along
/// the new order. Files `1..=6` come out as `1, 3, 2, 5, 4, 6`, numbered
/// `1..=6`. Files without a number keep their own and go last.
///
/// Nothing on disk is renamed.
///
/// # Examples
///
/// ```
/// use pagexml_oxide::pipeline::batch::reorder_left_right;
/// use std::path::PathBuf;
///
/// let files: Vec<PathBuf> = (1..=4).map(|n| PathBuf::from(format!("p_{}.xml", n))).collect();
/// let order: Vec<(String, Option<i64>)> = reorder_left_right(&files)
///     .into_iter()
///     .map(|s| (s.path.display().to_string(), s.page_number))
///     .collect();
/// assert_eq!(
///     order,
///     vec![
///         ("p_1.xml".to_string(), Some(1)),
///         ("p_3.xml".to_string(), Some(2)),
///         ("p_2.xml".to_string(), Some(3)),
///         ("p_4.xml".to_string(), Some(4)),
///     ]
/// );
/// ```
pub fn reorder_left_right(files: &[PathBuf]) -> Vec<PageSource> {
    let mut numbers: Vec<i64> = files.iter().filter_map(|p| page_number_from_path(p)).collect();
    numbers.sort_unstable();

    let mut keyed: Vec<(i64, &PathBuf)> = files
        .iter()
        .map(|path| {
            let key = match page_number_from_path(path) {
                Some(n) if n % 2 != 0 => n - 2,
                Some(n) => n,
                None => i64::MAX,
            };
            (key, path)
        })
        .collect();
    keyed.sort_by_key(|(key, _)| *key);

    let mut numbers = numbers.into_iter();
    keyed
        .into_iter()
        .map(|(_, path)| PageSource {
            path: path.clone(),
            page_number: page_number_from_path(path).and_then(|_| numbers.next()),
        })
        .collect()
}

/// Converts a batch of layout pages into one document.
pub struct BatchConverter {
    config: ConversionConfig,
    decider: Box<dyn RegionDecider>,
}

impl BatchConverter {
    /// Create a converter; the configuration is validated first.
    pub fn new(config: ConversionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            decider: Box::new(AcceptAllRegions),
        })
    }

    /// Use a custom decider for an undecided region selection.
    pub fn with_region_decider(mut self, decider: impl RegionDecider + 'static) -> Self {
        self.decider = Box::new(decider);
        self
    }

    /// Configuration in use.
    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// Region types used across a batch, in order of first appearance.
    ///
    /// Unparseable pages are skipped, so callers can pick a selection before
    /// converting.
    pub fn discover_regions(&self, files: &[PathBuf]) -> Result<Vec<RegionType>> {
        let mut types: Vec<RegionType> = Vec::new();
        for path in files {
            let doc = match load_page(path)? {
                Some(doc) => doc,
                None => continue,
            };
            for region_type in discover_region_types(&doc, &self.config) {
                if !types.contains(&region_type) {
                    types.push(region_type);
                }
            }
        }
        Ok(types)
    }

    /// Convert every layout file of a folder.
    pub fn convert_folder(&self, dir: impl AsRef<Path>) -> Result<ConvertedDocument> {
        let dir = dir.as_ref();
        let files = list_layout_files(dir, &self.config)?;
        log::info!("Converting {} page(s) from {}", files.len(), dir.display());
        self.convert_sources(&self.prepare(&files), dir)
    }

    /// Convert the given files, in the given order.
    pub fn convert_files(&self, files: &[PathBuf]) -> Result<ConvertedDocument> {
        let origin = files
            .first()
            .and_then(|p| p.parent())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        self.convert_sources(&self.prepare(files), &origin)
    }

    /// Convert the layout files of a zip archive.
    ///
    /// The archive is extracted to a temporary folder, removed when the
    /// conversion ends.
    pub fn convert_zip(&self, archive: impl AsRef<Path>) -> Result<ConvertedDocument> {
        let archive = archive.as_ref();
        let archive_error = |reason: String| Error::Archive {
            path: archive.to_path_buf(),
            reason,
        };

        let file = fs::File::open(archive).map_err(|e| archive_error(e.to_string()))?;
        let mut zip = zip::ZipArchive::new(file).map_err(|e| archive_error(e.to_string()))?;
        let scratch = tempfile::Builder::new().prefix("pagexml-").tempdir()?;
        zip.extract(scratch.path())
            .map_err(|e| archive_error(e.to_string()))?;
        log::debug!(
            "Extracted {} entries of {} to {}",
            zip.len(),
            archive.display(),
            scratch.path().display()
        );

        let mut files = Vec::new();
        collect_layout_files(scratch.path(), &self.config, &mut files)?;
        sort_paths(&mut files);
        log::info!("Converting {} page(s) from {}", files.len(), archive.display());

        let result = self.convert_sources(&self.prepare(&files), archive);
        // `scratch` is removed here
        drop(scratch);
        result
    }

    fn prepare(&self, files: &[PathBuf]) -> Vec<PageSource> {
        if self.config.reorder_pages {
            reorder_left_right(files)
        } else {
            files.iter().map(PageSource::new).collect()
        }
    }

    /// Convert page sources in order.
    pub fn convert_sources(&self, sources: &[PageSource], origin: &Path) -> Result<ConvertedDocument> {
        let converter = MarkdownConverter::new(&self.config)?;
        let mut numbering = PageNumbering::new(&self.config);
        let mut selection: Option<RegionSelection> = None;
        let mut header: Option<DocumentHeader> = None;
        let mut pages = Vec::new();
        let mut report = ConversionReport::default();

        for source in sources {
            let mut doc = match LayoutDocument::open(&source.path) {
                Ok(doc) => doc,
                Err(e) if e.is_page_local() => {
                    log::warn!("Skipping {}: {}", source.path.display(), e);
                    report.skipped.push((source.path.clone(), e.to_string()));
                    continue;
                },
                Err(e) => return Err(e),
            };
            if let Some(number) = source.page_number {
                doc.set_page_number(number);
            }

            let selection =
                selection.get_or_insert_with(|| resolve_selection(&self.config, &doc, self.decider.as_ref()));
            let page = converter.convert_page(&doc, selection, &mut numbering);
            if header.is_none() {
                header = Some(DocumentHeader::compose(&page.metadata, &self.config));
            }
            report.warnings.extend(page.warnings.iter().cloned());
            pages.push(page);
        }

        if pages.is_empty() {
            return Err(Error::NoPages(origin.to_path_buf()));
        }

        report.pages_converted = pages.len();
        report.selection = selection.unwrap_or_default();
        log::info!(
            "Converted {} page(s), skipped {}, {} warning(s)",
            report.pages_converted,
            report.skipped.len(),
            report.warnings.len()
        );

        Ok(ConvertedDocument {
            document: Document {
                header: header.unwrap_or_default(),
                pages,
            },
            report,
        })
    }
}

/// Load a page, turning page-local errors into `None`.
fn load_page(path: &Path) -> Result<Option<LayoutDocument>> {
    match LayoutDocument::open(path) {
        Ok(doc) => Ok(Some(doc)),
        Err(e) if e.is_page_local() => {
            log::warn!("Skipping {}: {}", path.display(), e);
            Ok(None)
        },
        Err(e) => Err(e),
    }
}

/// Layout files below `dir`, at any depth.
fn collect_layout_files(dir: &Path, config: &ConversionConfig, out: &mut Vec<PathBuf>) -> Result<()> {
    out.extend(list_layout_files(dir, config)?);
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_layout_files(&path, config, out)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<PcGts xmlns="urn:page"><Metadata><Creator>test</Creator><LastChange>now</LastChange></Metadata>
<Page imageFilename="img.jpg">
  <TextRegion id="r" custom="structure {type:Main;}">
    <Coords points="0,0 1000,0 1000,1000 0,1000"/>
    <TextLine id="l"><Coords points="100,50 900,50 900,90 100,90"/><TextEquiv><Unicode>text</Unicode></TextEquiv></TextLine>
  </TextRegion>
</Page></PcGts>"#;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_list_layout_files_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "p_10.xml", PAGE);
        write(dir.path(), "p_2.xml", PAGE);
        write(dir.path(), "METS.xml", PAGE);
        write(dir.path(), "notes.txt", "x");
        fs::create_dir(dir.path().join("sub.xml")).unwrap();

        let files = list_layout_files(dir.path(), &ConversionConfig::default()).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["p_2.xml", "p_10.xml"]);
    }

    #[test]
    fn test_reorder_six_pages() {
        let files: Vec<PathBuf> = (1..=6).map(|n| PathBuf::from(format!("p_{}.xml", n))).collect();
        let sources = reorder_left_right(&files);
        let order: Vec<String> = sources.iter().map(|s| s.path.display().to_string()).collect();
        assert_eq!(
            order,
            vec!["p_1.xml", "p_3.xml", "p_2.xml", "p_5.xml", "p_4.xml", "p_6.xml"]
        );
        let numbers: Vec<Option<i64>> = sources.iter().map(|s| s.page_number).collect();
        assert_eq!(numbers, (1..=6).map(Some).collect::<Vec<_>>());
    }

    #[test]
    fn test_reorder_unnumbered_last() {
        let files = vec![PathBuf::from("cover.xml"), PathBuf::from("p_2.xml")];
        let sources = reorder_left_right(&files);
        assert_eq!(sources[0].path, PathBuf::from("p_2.xml"));
        assert_eq!(sources[0].page_number, Some(2));
        assert_eq!(sources[1].page_number, None);
    }

    #[test]
    fn test_malformed_page_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "p_1.xml", PAGE);
        write(dir.path(), "p_2.xml", "<PcGts><Page>");
        write(dir.path(), "p_3.xml", PAGE);

        let converter = BatchConverter::new(ConversionConfig::default()).unwrap();
        let converted = converter.convert_folder(dir.path()).unwrap();
        assert_eq!(converted.report.pages_converted, 2);
        assert_eq!(converted.report.skipped.len(), 1);
        assert!(converted.report.skipped[0].0.ends_with("p_2.xml"));
        let text = converted.document.render();
        assert!(text.contains("PageV01P001"));
        assert!(!text.contains("PageV01P002"));
        assert!(text.contains("PageV01P003"));
    }

    #[test]
    fn test_unreadable_page_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![
            write(dir.path(), "p_1.xml", PAGE),
            dir.path().join("p_2.xml"),
            write(dir.path(), "p_3.xml", PAGE),
        ];

        let converter = BatchConverter::new(ConversionConfig::default()).unwrap();
        let converted = converter.convert_files(&files).unwrap();
        assert_eq!(converted.report.pages_converted, 2);
        assert_eq!(converted.report.skipped.len(), 1);
        assert_eq!(converted.report.skipped[0].0, files[1]);
        let text = converted.document.render();
        assert!(text.contains("PageV01P001"));
        assert!(text.contains("PageV01P003"));
    }

    #[test]
    fn test_header_from_first_page() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "p_1.xml", PAGE);
        let config = ConversionConfig::default().with_meta("transcription_model", "best");
        let converted = BatchConverter::new(config).unwrap().convert_folder(dir.path()).unwrap();
        let text = converted.document.render();
        assert!(text.starts_with(
            "######OpenITI#\n\n#META# Creator: test\n#META# transcription model: best\n\n\n#META#Header#End#\n\n"
        ));
        assert!(!text.contains("LastChange"));
    }

    #[test]
    fn test_empty_folder_is_no_pages() {
        let dir = tempfile::tempdir().unwrap();
        let converter = BatchConverter::new(ConversionConfig::default()).unwrap();
        assert!(matches!(converter.convert_folder(dir.path()), Err(Error::NoPages(_))));
    }

    #[test]
    fn test_missing_folder_is_io_error() {
        let converter = BatchConverter::new(ConversionConfig::default()).unwrap();
        let err = converter.convert_folder("/definitely/not/here").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = ConversionConfig::default();
        config.extremes_ratio = 0.7;
        assert!(BatchConverter::new(config).is_err());
    }

    #[test]
    fn test_decider_runs_once() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "p_1.xml", PAGE);
        write(dir.path(), "p_2.xml", PAGE);
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let converter = BatchConverter::new(ConversionConfig::default())
            .unwrap()
            .with_region_decider(move |types: &[RegionType]| {
                counter.fetch_add(1, Ordering::SeqCst);
                assert_eq!(types, &[RegionType::Main]);
                RegionSelection::Include(vec!["Main".to_string()])
            });
        let converted = converter.convert_folder(dir.path()).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            converted.report.selection,
            RegionSelection::Include(vec!["Main".to_string()])
        );
    }

    #[test]
    fn test_discover_regions_across_batch() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(dir.path(), "p_1.xml", PAGE);
        let b = write(
            dir.path(),
            "p_2.xml",
            r#"<PcGts xmlns="urn:page"><Page><TextRegion custom="structure {type:Title;}"/><TextRegion custom="structure {type:Main;}"/></Page></PcGts>"#,
        );
        let c = write(dir.path(), "p_3.xml", "not xml <");
        let converter = BatchConverter::new(ConversionConfig::default()).unwrap();
        let types = converter.discover_regions(&[a, b, c]).unwrap();
        assert_eq!(types, vec![RegionType::Main, RegionType::Title]);
    }
}
