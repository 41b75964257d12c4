//! Numeric-aware ordering of file names (`page_2` before `page_10`).

use lazy_static::lazy_static;
use regex::Regex;
use std::cmp::Ordering;

lazy_static! {
    /// Alternating runs of ASCII digits and everything else
    static ref RE_CHUNK: Regex = Regex::new(r"[0-9]+|[^0-9]+").unwrap();
}

#[derive(Debug, PartialEq, Eq)]
enum Chunk<'a> {
    Number(&'a str),
    Text(String),
}

impl Ord for Chunk<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Chunk::Number(a), Chunk::Number(b)) => compare_digits(a, b),
            // Numbers sort before text, as in a plain character comparison
            (Chunk::Number(_), Chunk::Text(_)) => Ordering::Less,
            (Chunk::Text(_), Chunk::Number(_)) => Ordering::Greater,
            (Chunk::Text(a), Chunk::Text(b)) => a.cmp(b),
        }
    }
}

impl PartialOrd for Chunk<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Compare two digit runs by value without parsing (no overflow).
fn compare_digits(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn chunks(name: &str) -> Vec<Chunk<'_>> {
    RE_CHUNK
        .find_iter(name)
        .map(|m| {
            let s = m.as_str();
            if s.as_bytes()[0].is_ascii_digit() {
                Chunk::Number(s)
            } else {
                Chunk::Text(s.to_lowercase())
            }
        })
        .collect()
}

/// Compare two names, treating digit runs as numbers and text
/// case-insensitively.
///
/// Names equal under that rule fall back to plain comparison, so the order
/// is total.
///
/// # Examples
///
/// ```
/// use pagexml_oxide::pipeline::natural_sort::natural_cmp;
/// use std::cmp::Ordering;
///
/// assert_eq!(natural_cmp("page_2.xml", "page_10.xml"), Ordering::Less);
/// assert_eq!(natural_cmp("Page_3.xml", "page_3.xml"), Ordering::Less);
/// ```
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    chunks(a).cmp(&chunks(b)).then_with(|| a.cmp(b))
}

/// Sort names in natural order.
pub fn natural_sort<S: AsRef<str>>(names: &mut [S]) {
    names.sort_by(|a, b| natural_cmp(a.as_ref(), b.as_ref()));
}
