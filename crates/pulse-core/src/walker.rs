// crates/pulse-core/src/walker.rs

//! # Source Tree Walker
//!
//! Locates documents below the dataset root and decodes the
//! `…/<state>/<year>/<quarter>.json` convention into a [`Slice`].
//! Handles the physical layer (I/O, decompression) so the extractor only
//! ever sees a reader.

use crate::category::Category;
use crate::error::{PulseError, Result};
use crate::record::Slice;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

const JSON_SUFFIX: &str = ".json";
#[cfg(feature = "compact")]
const GZ_SUFFIX: &str = ".json.gz";

/// One document on disk together with the slice its path encodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentPath {
    pub category: Category,
    pub path: PathBuf,
    pub slice: Slice,
}

/// The root of an upstream `data/` checkout.
#[derive(Debug, Clone)]
pub struct SourceTree {
    root: PathBuf,
}

impl SourceTree {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(PulseError::NotFound(format!(
                "Dataset directory not found at {}",
                root.display()
            )));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// All documents of `category`, sorted by path so repeated runs visit
    /// them in the same order. A category missing from the checkout yields
    /// an empty list.
    pub fn documents(&self, category: Category) -> Result<Vec<DocumentPath>> {
        let dir = self.root.join(category.source_dir());
        if !dir.is_dir() {
            debug!(category = %category, dir = %dir.display(), "category directory absent");
            return Ok(Vec::new());
        }

        let mut out = Vec::new();
        for entry in WalkDir::new(&dir).sort_by_file_name() {
            let entry = entry.map_err(io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if quarter_stem(path).is_none() {
                continue;
            }
            let slice = decode_slice(path)?;
            out.push(DocumentPath {
                category,
                path: path.to_path_buf(),
                slice,
            });
        }
        Ok(out)
    }
}

/// Returns the part of the file name before `.json` / `.json.gz`, or `None`
/// when the file is not a document at all.
fn quarter_stem(path: &Path) -> Option<&str> {
    let name = path.file_name()?.to_str()?;
    #[cfg(feature = "compact")]
    if let Some(stem) = name.strip_suffix(GZ_SUFFIX) {
        return Some(stem);
    }
    name.strip_suffix(JSON_SUFFIX)
}

/// `…/<state>/<year>/<quarter>.json` -> `Slice { state, year, quarter }`.
pub fn decode_slice(path: &Path) -> Result<Slice> {
    let quarter = quarter_stem(path)
        .ok_or_else(|| PulseError::parse(path, "not a .json document"))?;
    let quarter: u8 = quarter
        .parse()
        .ok()
        .filter(|q| (1..=4).contains(q))
        .ok_or_else(|| PulseError::parse(path, format!("quarter `{quarter}` is not 1-4")))?;

    let year_dir = path.parent();
    let year = year_dir
        .and_then(|p| p.file_name())
        .and_then(|s| s.to_str())
        .ok_or_else(|| PulseError::parse(path, "missing year directory"))?;
    let year: u16 = year
        .parse()
        .ok()
        .filter(|y| *y > 0)
        .ok_or_else(|| PulseError::parse(path, format!("year directory `{year}` is not a year")))?;

    let state = year_dir
        .and_then(|p| p.parent())
        .and_then(|p| p.file_name())
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| PulseError::parse(path, "missing state directory"))?;

    Ok(Slice::new(state, year, quarter))
}

/// Opens a document, buffers it, and unwraps gzip when the name says so.
/// Returns a generic reader so the caller doesn't care about the compression.
pub fn open_document(path: &Path) -> Result<Box<dyn Read>> {
    let file = File::open(path).map_err(|e| {
        PulseError::NotFound(format!("Document not found at {}: {}", path.display(), e))
    })?;
    let reader = BufReader::new(file);

    #[cfg(feature = "compact")]
    if path.to_string_lossy().ends_with(GZ_SUFFIX) {
        use flate2::read::GzDecoder;
        return Ok(Box::new(BufReader::new(GzDecoder::new(reader))));
    }

    Ok(Box::new(reader))
}
