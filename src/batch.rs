//! Directory-wide rewriting.
//!
//! Walks a source tree, rewrites every file whose extension is configured,
//! and writes the result either back in place or into a mirrored output tree:
//!
//! ```text
//! site/                          out/
//! ├── index.html        ──▶     ├── index.html
//! ├── blog/                      ├── blog/
//! │   └── post.htm      ──▶     │   └── post.htm
//! └── style.css                  (not copied)
//! ```
//!
//! ## Parallel Processing
//!
//! Files are rewritten in parallel on the global [rayon](https://docs.rs/rayon)
//! pool. Each file gets its own [`Rewriter`], so the current type never leaks
//! from one document into another; only the type catalog is shared.
//!
//! Files that aren't valid UTF-8 are skipped with a warning.

use crate::catalog::TypeCatalog;
use crate::config::{ConfigError, StructuredDataConfig};
use crate::rewrite::{RewriteError, RewriteOutcome, Rewriter};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Rewrite(#[from] RewriteError),
    #[error("Source directory not found: {0}")]
    SourceNotFound(PathBuf),
}

/// Result of rewriting one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    /// Path relative to the source root.
    pub path: PathBuf,
    pub markers: usize,
    pub unresolved: usize,
    pub changed: bool,
}

/// Result of rewriting a whole tree. Files are sorted by path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub files: Vec<FileReport>,
    /// Files left alone because they couldn't be decoded.
    pub skipped: Vec<PathBuf>,
}

impl BatchReport {
    pub fn total_markers(&self) -> usize {
        self.files.iter().map(|f| f.markers).sum()
    }

    pub fn total_unresolved(&self) -> usize {
        self.files.iter().map(|f| f.unresolved).sum()
    }

    pub fn changed_files(&self) -> usize {
        self.files.iter().filter(|f| f.changed).count()
    }
}

/// A rewriter set up with the configured semantic and suffix list.
pub fn configured_rewriter<'c>(
    config: &StructuredDataConfig,
    catalog: &'c TypeCatalog,
) -> Result<Rewriter<'c>, BatchError> {
    let mut rewriter = Rewriter::with_semantic(config.semantic()?, catalog)?;
    rewriter.set_suffixes(&config.suffixes)?;
    Ok(rewriter)
}

/// Files under `root` with a configured extension, relative to `root` and
/// sorted. Anything under `exclude` is not visited.
pub fn collect_files(
    root: &Path,
    config: &StructuredDataConfig,
    exclude: Option<&Path>,
) -> Result<Vec<PathBuf>, BatchError> {
    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| exclude.is_none_or(|ex| entry.path() != ex));
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() || !config.matches_extension(entry.path()) {
            continue;
        }
        if let Ok(relative) = entry.path().strip_prefix(root) {
            files.push(relative.to_path_buf());
        }
    }
    Ok(files)
}

/// Rewrite one document on disk. `Ok(None)` means the file wasn't UTF-8.
///
/// A distinct `target` is always written, markers or not. In place, the file
/// is only written when its content changed.
pub fn rewrite_file(
    source: &Path,
    target: &Path,
    rewriter: &mut Rewriter<'_>,
) -> Result<Option<RewriteOutcome>, BatchError> {
    let bytes = fs::read(source)?;
    let Ok(html) = String::from_utf8(bytes) else {
        return Ok(None);
    };
    let outcome = rewriter.rewrite_document(&html);

    let in_place = source == target;
    if !in_place || outcome.html != html {
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(target, &outcome.html)?;
    }
    Ok(Some(outcome))
}

/// Rewrite every matching file under `source`.
///
/// With `output` set, every matching file lands at the same relative path
/// under it, including files without markers, and the source tree is
/// untouched. Without it, changed files are rewritten in
/// place.
pub fn rewrite_tree(
    source: &Path,
    output: Option<&Path>,
    config: &StructuredDataConfig,
    catalog: &TypeCatalog,
) -> Result<BatchReport, BatchError> {
    if !source.is_dir() {
        return Err(BatchError::SourceNotFound(source.to_path_buf()));
    }
    let files = collect_files(source, config, output)?;
    info!("Rewriting {} files under {}", files.len(), source.display());

    let results = files
        .par_iter()
        .map(|relative| -> Result<_, BatchError> {
            let mut rewriter = configured_rewriter(config, catalog)?;
            let from = source.join(relative);
            let to = output.map_or_else(|| from.clone(), |out| out.join(relative));
            let outcome = rewrite_file(&from, &to, &mut rewriter)?;
            Ok((relative, outcome))
        })
        .collect::<Result<Vec<_>, BatchError>>()?;

    let mut report = BatchReport::default();
    for (relative, outcome) in results {
        match outcome {
            Some(outcome) => {
                let file = FileReport {
                    path: relative.clone(),
                    markers: outcome.edits.len(),
                    unresolved: outcome.unresolved(),
                    changed: !outcome.edits.is_empty(),
                };
                info!("{}: {} markers", file.path.display(), file.markers);
                if file.unresolved > 0 {
                    warn!(
                        "{}: {} markers resolved to nothing",
                        file.path.display(),
                        file.unresolved
                    );
                }
                report.files.push(file);
            }
            None => {
                warn!("Skipping {}: not valid UTF-8", relative.display());
                report.skipped.push(relative.clone());
            }
        }
    }
    Ok(report)
}
