//! Merging single-volume documents of a multi-volume work.

use crate::converters::header::{split_header, HEADER_END};
use crate::error::{Error, Result};
use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::Regex;
use std::path::{Path, PathBuf};

lazy_static! {
    /// Volume part of a page marker
    static ref RE_PAGE_VOLUME: Regex = Regex::new(r"PageV\d+").unwrap();
}

/// Merge rendered volumes into one document.
///
/// Volumes are ordered by number. The first volume's header is kept; every
/// body keeps its text, with the volume part of its page markers rewritten to
/// its own volume number. Bodies are joined with a blank line.
///
/// # Errors
///
/// [`Error::VolumeMerge`] when no volume is given or one has no header.
///
/// # Examples
///
/// ```
/// use pagexml_oxide::pipeline::volumes::merge_volumes;
///
/// let v1 = "######OpenITI#\n\n#META#Header#End#\n\n~~a\n\nPageV01P001\n\n".to_string();
/// let v2 = "######OpenITI#\n\n#META#Header#End#\n\n~~b\n\nPageV01P001\n\n".to_string();
/// let merged = merge_volumes(&[(2, v2), (1, v1)])?;
/// assert_eq!(
///     merged,
///     "######OpenITI#\n\n#META#Header#End#\n\n~~a\n\nPageV01P001\n\n\n\n\n\n~~b\n\nPageV02P001\n\n"
/// );
/// # Ok::<(), pagexml_oxide::error::Error>(())
/// ```
pub fn merge_volumes(volumes: &[(u32, String)]) -> Result<String> {
    let mut ordered: Vec<&(u32, String)> = volumes.iter().collect();
    ordered.sort_by_key(|(volume, _)| *volume);

    let mut header: Option<&str> = None;
    let mut bodies = Vec::with_capacity(ordered.len());
    for (volume, text) in ordered {
        let (head, body) = split_header(text)
            .ok_or_else(|| Error::VolumeMerge(format!("volume {} has no header", volume)))?;
        header.get_or_insert(head);
        let marker = format!("PageV{:02}", volume);
        bodies.push(RE_PAGE_VOLUME.replace_all(body, marker.as_str()).into_owned());
    }

    let header = header.ok_or_else(|| Error::VolumeMerge("no volumes to merge".to_string()))?;
    log::debug!("Merged {} volume(s)", bodies.len());
    Ok(format!("{}{}{}", header, HEADER_END, bodies.join("\n\n")))
}

/// File name of a merged multi-volume document.
///
/// `<uri>.<version>-<lang>` becomes `<uri>.<version>Vols-<lang>`; names
/// without a dash get `Vols` appended.
///
/// # Examples
///
/// ```
/// use pagexml_oxide::pipeline::volumes::merged_volume_name;
/// use std::path::{Path, PathBuf};
///
/// assert_eq!(
///     merged_volume_name(Path::new("out/0845Maqrizi.Khitat.Shamela0001-ara1")),
///     PathBuf::from("out/0845Maqrizi.Khitat.Shamela0001Vols-ara1")
/// );
/// ```
pub fn merged_volume_name(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let merged = match name.split_once('-') {
        Some((stem, rest)) => format!("{}Vols-{}", stem, rest),
        None => format!("{}Vols", name),
    };
    path.with_file_name(merged)
}

/// Volumes accumulated across a run, grouped by book.
#[derive(Debug, Clone, Default)]
pub struct VolumeGroups {
    groups: IndexMap<String, Vec<(u32, String)>>,
}

impl VolumeGroups {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a rendered volume of a book.
    pub fn register(&mut self, book: impl Into<String>, volume: u32, text: String) {
        self.groups.entry(book.into()).or_default().push((volume, text));
    }

    /// Number of books seen.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether nothing was registered.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Merge every book with at least two volumes.
    ///
    /// Books with a single volume are left out; their document is already
    /// complete.
    pub fn finish(self) -> Result<Vec<(String, String)>> {
        let mut merged = Vec::new();
        for (book, volumes) in self.groups {
            if volumes.len() < 2 {
                continue;
            }
            log::info!("Merging {} volumes of {}", volumes.len(), book);
            let text = merge_volumes(&volumes)?;
            merged.push((book, text));
        }
        Ok(merged)
    }
}
