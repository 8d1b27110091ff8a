use crate::{
    config::Config,
    error::{Error, Result},
    filter::{SuffixFilter, Verdict},
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace};
use walkdir::{DirEntry, WalkDir};

/// A file chosen for concatenation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    /// Path as produced by traversal (root joined with the relative path)
    pub path: PathBuf,

    /// Path relative to the root directory
    pub relative_path: PathBuf,
}

/// Counters collected while walking.
#[derive(Debug, Default, Clone, Serialize)]
pub struct SelectStats {
    /// Regular files visited
    pub visited_files: usize,

    /// Files kept by the filter
    pub selected_files: usize,

    /// Files rejected by an exclusion suffix
    pub excluded_files: usize,

    /// Files matching no inclusion suffix
    pub unmatched_files: usize,
}

/// Result of a selection: ordered files plus counters.
#[derive(Debug, Clone)]
pub struct Selection {
    /// Selected files in traversal order
    pub files: Vec<SelectedFile>,

    /// Walk statistics
    pub stats: SelectStats,
}

/// Walks a root directory and selects files by suffix.
pub(crate) struct Selector {
    root_dir: PathBuf,
    filter: SuffixFilter,
}

impl Selector {
    /// Creates a new selector from configuration.
    pub(crate) fn new(config: &Config) -> Self {
        Self::with_filter(
            config.root_dir.clone(),
            SuffixFilter::new(
                config.include_suffixes.iter().cloned(),
                config.exclude_suffixes.iter().cloned(),
            ),
        )
    }

    pub(crate) const fn with_filter(root_dir: PathBuf, filter: SuffixFilter) -> Self {
        Self { root_dir, filter }
    }

    /// Walks the root directory and returns the selected files.
    ///
    /// Entries of each directory are visited in file-name order, depth
    /// first, so repeated runs over an unchanged tree agree exactly.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The root is missing or not a directory
    /// - Any directory below the root cannot be read
    pub(crate) fn select(&self) -> Result<Selection> {
        if !self.root_dir.is_dir() {
            return Err(Error::config(format!(
                "Root path is not a directory: {}",
                self.root_dir.display()
            )));
        }

        debug!("Starting walk of {}", self.root_dir.display());

        let mut files = Vec::new();
        let mut stats = SelectStats::default();

        let walker = WalkDir::new(&self.root_dir)
            .follow_links(false)
            .sort_by_file_name();

        for entry in walker {
            let entry = entry?;

            if !is_regular_file(&entry) {
                continue;
            }

            stats.visited_files += 1;
            let name = entry.file_name().to_string_lossy();

            match self.filter.verdict(&name) {
                Verdict::Excluded(suffix) => {
                    info!("Excluding file: {}", name);
                    trace!("{} matched exclusion suffix {:?}", entry.path().display(), suffix);
                    stats.excluded_files += 1;
                }
                Verdict::Included(_) => {
                    trace!("Selected {}", entry.path().display());
                    files.push(self.selected(entry.path()));
                }
                Verdict::Unmatched => {
                    stats.unmatched_files += 1;
                }
            }
        }

        stats.selected_files = files.len();

        debug!(
            "Walk complete: {} visited, {} selected, {} excluded, {} unmatched",
            stats.visited_files, stats.selected_files, stats.excluded_files, stats.unmatched_files
        );

        Ok(Selection { files, stats })
    }

    fn selected(&self, path: &Path) -> SelectedFile {
        let relative_path =
            pathdiff::diff_paths(path, &self.root_dir).unwrap_or_else(|| path.to_path_buf());

        SelectedFile {
            path: path.to_path_buf(),
            relative_path,
        }
    }
}

/// Regular files, and symlinks resolving to regular files.
fn is_regular_file(entry: &DirEntry) -> bool {
    if entry.file_type().is_file() {
        return true;
    }

    if entry.path_is_symlink() {
        let resolved = entry.path().is_file();
        if !resolved {
            debug!("Skipping symlink that is not a file: {}", entry.path().display());
        }
        return resolved;
    }

    false
}
