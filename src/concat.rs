//! Concatenation of selected files into a single text document.
//!
//! Each file becomes one block:
//!
//! ```text
//! File: <path>
//! <raw file content>
//!
//! ```
//!
//! The `File: ` marker is consumed by prompt construction downstream and
//! must not change.

use crate::{
    config::{Config, HeaderPath},
    error::Result,
    file::{line_count, read_text},
    selector::SelectedFile,
};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Literal marker that opens every block.
pub const HEADER_PREFIX: &str = "File: ";

/// Separator appended after each file's content.
pub const BLOCK_SEPARATOR: &str = "\n\n";

/// Metadata about one block of a [`Document`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentEntry {
    /// File that was read
    pub path: PathBuf,

    /// Path text written after the marker
    pub header: String,

    /// Content size in bytes
    pub bytes: usize,

    /// Content line count
    pub lines: usize,
}

/// The concatenated document.
#[derive(Debug, Clone, Default)]
pub struct Document {
    text: String,
    entries: Vec<DocumentEntry>,
}

impl Document {
    /// The full document text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Blocks in document order.
    #[must_use]
    pub fn entries(&self) -> &[DocumentEntry] {
        &self.entries
    }

    /// Header paths in document order.
    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.header.as_str())
    }

    /// Number of files in the document.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no file was concatenated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Reads files and joins them into a [`Document`].
#[derive(Debug, Clone)]
pub struct Concatenator {
    header_path: HeaderPath,
    parallel_reads: bool,
}

impl Default for Concatenator {
    fn default() -> Self {
        Self {
            header_path: HeaderPath::Traversal,
            parallel_reads: false,
        }
    }
}

impl Concatenator {
    /// Creates a concatenator from configuration.
    #[must_use]
    pub const fn new(config: &Config) -> Self {
        Self {
            header_path: config.header_path,
            parallel_reads: config.parallel_reads,
        }
    }

    /// Sets how header paths are rendered.
    #[must_use]
    pub const fn header_path(mut self, mode: HeaderPath) -> Self {
        self.header_path = mode;
        self
    }

    /// Enables or disables multi-threaded reads.
    #[must_use]
    pub const fn parallel_reads(mut self, enabled: bool) -> Self {
        self.parallel_reads = enabled;
        self
    }

    /// Concatenates selected files in the given order.
    ///
    /// # Errors
    ///
    /// Fails on the first file (in input order) that cannot be read or is
    /// not valid UTF-8. No partial document is returned.
    pub fn concatenate(&self, files: &[SelectedFile]) -> Result<Document> {
        let sources: Vec<(&Path, String)> = files
            .iter()
            .map(|f| (f.path.as_path(), self.header_for(f)))
            .collect();

        self.assemble(&sources)
    }

    /// Concatenates arbitrary paths, using each path as its own header.
    ///
    /// # Errors
    ///
    /// Same as [`Concatenator::concatenate`].
    pub fn concatenate_paths<P: AsRef<Path>>(&self, paths: &[P]) -> Result<Document> {
        let sources: Vec<(&Path, String)> = paths
            .iter()
            .map(|p| (p.as_ref(), p.as_ref().display().to_string()))
            .collect();

        self.assemble(&sources)
    }

    fn header_for(&self, file: &SelectedFile) -> String {
        match self.header_path {
            HeaderPath::Traversal => file.path.display().to_string(),
            HeaderPath::Relative => file.relative_path.display().to_string(),
        }
    }

    fn assemble(&self, sources: &[(&Path, String)]) -> Result<Document> {
        let paths: Vec<&Path> = sources.iter().map(|(p, _)| *p).collect();

        let contents = if self.parallel_reads && paths.len() > 1 {
            read_parallel(&paths)?
        } else {
            paths.iter().map(|p| read_text(p)).collect::<Result<Vec<_>>>()?
        };

        let capacity = sources
            .iter()
            .zip(&contents)
            .map(|((_, header), content)| {
                HEADER_PREFIX.len() + header.len() + 1 + content.len() + BLOCK_SEPARATOR.len()
            })
            .sum();

        let mut text = String::with_capacity(capacity);
        let mut entries = Vec::with_capacity(sources.len());

        for ((path, header), content) in sources.iter().zip(contents) {
            text.push_str(HEADER_PREFIX);
            text.push_str(header);
            text.push('\n');
            text.push_str(&content);
            text.push_str(BLOCK_SEPARATOR);

            trace!("Appended {} ({} bytes)", header, content.len());

            entries.push(DocumentEntry {
                path: path.to_path_buf(),
                header: header.clone(),
                bytes: content.len(),
                lines: line_count(&content),
            });
        }

        debug!(
            "Concatenated {} files into {} bytes",
            entries.len(),
            text.len()
        );

        Ok(Document { text, entries })
    }
}

/// Concatenates `paths` in order with default options.
///
/// # Errors
///
/// Fails if any file cannot be read or decoded.
pub fn concatenate<P: AsRef<Path>>(paths: &[P]) -> Result<Document> {
    Concatenator::default().concatenate_paths(paths)
}

/// Reads files on the rayon pool, returning contents in input order.
///
/// Every read finishes before errors are inspected, so the reported error is
/// the first failing file in input order.
fn read_parallel(paths: &[&Path]) -> Result<Vec<String>> {
    trace!(
        "Reading {} files on {} threads",
        paths.len(),
        rayon::current_num_threads()
    );

    paths
        .par_iter()
        .map(|p| read_text(p))
        .collect::<Vec<Result<String>>>()
        .into_iter()
        .collect()
}
