//! # repocat
//!
//! Concatenates the source files of a directory tree into a single text
//! document, estimates its token count and hands it to a language model.
//!
//! ## Quick Start
//!
//! ```no_run
//! use repocat::{Config, Pipeline};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = Config::builder()
//!     .root_dir("./ring")
//!     .include([".go"])
//!     .exclude(["_test.go"])
//!     .output_path("concat.txt")
//!     .build()?;
//!
//! Pipeline::new(config)?.run()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Document format
//!
//! One block per selected file, in selection order:
//!
//! ```text
//! File: <path>
//! <raw file content>
//!
//! ```
//!
//! ## Architecture
//!
//! 1. **Selector**: walks the root and filters file names by suffix
//! 2. **Concatenator**: reads selected files and joins them with headers
//! 3. **Writer**: persists the document atomically
//!
//! Token estimation ([`TokenizerKind`]) and model calls ([`ModelClient`],
//! [`generate`]) work on the written document.

#![warn(
    missing_docs,
    rust_2018_idioms,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery
)]
#![allow(clippy::module_name_repetitions)]

mod concat;
mod config;
mod error;
mod file;
mod filter;
mod generate;
mod pipeline;
mod selector;
mod token;
mod writer;

pub mod model;
pub mod prompt;

pub use concat::{
    BLOCK_SEPARATOR, Concatenator, Document, DocumentEntry, HEADER_PREFIX, concatenate,
};
pub use config::{Config, ConfigBuilder, HeaderPath};
pub use error::{Error, Result};
pub use file::read_text;
pub use filter::{SuffixFilter, Verdict};
pub use generate::{GenerateRequest, GenerateStats, generate};
pub use model::{ModelClient, ModelConfig, OpenAiClient};
pub use pipeline::{ConcatStats, Pipeline};
pub use prompt::{Persona, Prompt, PromptEngine, PromptKind, TaskPrompt};
pub use selector::{SelectStats, SelectedFile, Selection};
pub use token::{TokenEstimator, TokenizerKind, estimate_file};
pub use writer::Writer;

use std::path::Path;

/// Runs select, concatenate and write with the given configuration.
///
/// # Errors
///
/// Returns an error if:
/// - Configuration is invalid
/// - Root directory doesn't exist or a subdirectory cannot be read
/// - A selected file vanished, is unreadable or is not valid UTF-8
/// - The output cannot be written
pub fn run(config: Config) -> Result<ConcatStats> {
    Pipeline::new(config)?.run()
}

/// Selects files under `root` by suffix, in deterministic traversal order.
///
/// Exclusion suffixes win over inclusion suffixes. Every excluded file is
/// reported through a `tracing` event.
///
/// # Errors
///
/// Returns an error if `root` is not a readable directory or a
/// subdirectory cannot be read.
///
/// # Examples
///
/// ```no_run
/// let files = repocat::select("./smt", &[".go"], &["_test.go"])?;
/// let document = repocat::concatenate(
///     &files.iter().map(|f| &f.path).collect::<Vec<_>>(),
/// )?;
/// # Ok::<(), repocat::Error>(())
/// ```
pub fn select<I, E>(root: impl AsRef<Path>, include: &[I], exclude: &[E]) -> Result<Vec<SelectedFile>>
where
    I: AsRef<str>,
    E: AsRef<str>,
{
    let filter = SuffixFilter::new(
        include.iter().map(|s| s.as_ref().to_string()),
        exclude.iter().map(|s| s.as_ref().to_string()),
    );

    selector::Selector::with_filter(root.as_ref().to_path_buf(), filter)
        .select()
        .map(|selection| selection.files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    #[test]
    fn test_select_then_concatenate() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("a.go").write_str("package a").unwrap();
        temp.child("a_test.go").write_str("package a").unwrap();
        temp.child("b.py").write_str("pass").unwrap();
        temp.child("README.md").write_str("readme").unwrap();

        let files = select(temp.path(), &[".go"], &["_test.go"]).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].relative_path, Path::new("a.go"));

        let document = Concatenator::default()
            .header_path(HeaderPath::Relative)
            .concatenate(&files)
            .unwrap();
        assert_eq!(document.as_str(), "File: a.go\npackage a\n\n");
    }

    #[test]
    fn test_select_without_exclusions() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("a.go").touch().unwrap();
        temp.child("a_test.go").touch().unwrap();
        temp.child("b.py").touch().unwrap();
        temp.child("README.md").touch().unwrap();

        let no_exclusions: [&str; 0] = [];
        let files = select(temp.path(), &[".go", ".py"], &no_exclusions).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|f| f.relative_path.to_string_lossy().to_string())
            .collect();

        assert_eq!(names, vec!["a.go", "a_test.go", "b.py"]);
    }

    #[test]
    fn test_headers_follow_selection() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("x/one.rs").write_str("1").unwrap();
        temp.child("y/two.rs").write_str("2").unwrap();
        temp.child("y/two.pb.rs").write_str("generated").unwrap();

        let files = select(temp.path(), &[".rs"], &[".pb.rs"]).unwrap();
        let paths: Vec<_> = files.iter().map(|f| f.path.clone()).collect();
        let document = concatenate(&paths).unwrap();

        let expected: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
        assert_eq!(document.headers().collect::<Vec<_>>(), expected);
        assert_eq!(document.as_str().matches(HEADER_PREFIX).count(), 2);
    }
}
