use crate::error::{Error, Result};
use crate::token::TokenizerKind;
use std::fs;
use std::path::PathBuf;

const DEFAULT_OUTPUT_PATH: &str = "output.diff";

/// How the path after the `File: ` marker is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeaderPath {
    /// The path as produced by traversal, i.e. the root joined with the
    /// file's relative location.
    #[default]
    Traversal,
    /// The path relative to the root directory.
    Relative,
}

/// Configuration for a concatenation run.
///
/// Use [`Config::builder()`] to construct a new configuration.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct Config {
    /// Root directory to walk
    pub root_dir: PathBuf,

    /// File name suffixes that make a file a candidate
    pub include_suffixes: Vec<String>,

    /// File name suffixes that reject a file, checked first
    pub exclude_suffixes: Vec<String>,

    /// Destination of the concatenated document
    pub output_path: PathBuf,

    /// Rendering of header paths
    pub header_path: HeaderPath,

    /// Read selected files on worker threads
    pub parallel_reads: bool,

    /// Tokenizer used to report the document size
    pub tokenizer: TokenizerKind,

    /// Dry run mode (no file writes)
    pub dry_run: bool,

    /// Create backups of an existing output file
    pub backup_existing: bool,
}

impl Config {
    /// Creates a new configuration builder.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use repocat::Config;
    ///
    /// let config = Config::builder()
    ///     .root_dir("./src")
    ///     .include([".go"])
    ///     .exclude(["_test.go"])
    ///     .build()
    ///     .expect("valid configuration");
    /// ```
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Root directory doesn't exist, is not a directory or cannot be listed
    /// - No inclusion suffix is given
    /// - Any suffix is an empty string
    pub fn validate(&self) -> Result<()> {
        if !self.root_dir.exists() {
            return Err(Error::config(format!(
                "Root directory does not exist: {}",
                self.root_dir.display()
            )));
        }

        if !self.root_dir.is_dir() {
            return Err(Error::config(format!(
                "Root path is not a directory: {}",
                self.root_dir.display()
            )));
        }

        fs::read_dir(&self.root_dir).map_err(|e| {
            Error::config(format!(
                "Root directory is not readable: {}: {e}",
                self.root_dir.display()
            ))
        })?;

        if self.include_suffixes.is_empty() {
            return Err(Error::config("at least one inclusion suffix is required"));
        }

        // An empty suffix matches every file name
        if self.include_suffixes.iter().any(String::is_empty) {
            return Err(Error::config("inclusion suffixes must not be empty strings"));
        }

        if self.exclude_suffixes.iter().any(String::is_empty) {
            return Err(Error::config("exclusion suffixes must not be empty strings"));
        }

        if self.output_path.as_os_str().is_empty() {
            return Err(Error::config("output path must not be empty"));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("."),
            include_suffixes: Vec::new(),
            exclude_suffixes: Vec::new(),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            header_path: HeaderPath::default(),
            parallel_reads: false,
            tokenizer: TokenizerKind::Simple,
            dry_run: false,
            backup_existing: false,
        }
    }
}

/// Builder for creating a [`Config`].
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    root_dir: Option<PathBuf>,
    include_suffixes: Vec<String>,
    exclude_suffixes: Vec<String>,
    output_path: Option<PathBuf>,
    header_path: Option<HeaderPath>,
    parallel_reads: bool,
    tokenizer: Option<TokenizerKind>,
    dry_run: bool,
    backup_existing: bool,
}

impl ConfigBuilder {
    /// Sets the root directory to walk.
    #[must_use]
    pub fn root_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.root_dir = Some(path.into());
        self
    }

    /// Adds inclusion suffixes. Repeated calls are additive.
    #[must_use]
    pub fn include<I, S>(mut self, suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include_suffixes
            .extend(suffixes.into_iter().map(Into::into));
        self
    }

    /// Adds exclusion suffixes. Repeated calls are additive.
    #[must_use]
    pub fn exclude<I, S>(mut self, suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_suffixes
            .extend(suffixes.into_iter().map(Into::into));
        self
    }

    /// Sets the output file path.
    #[must_use]
    pub fn output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    /// Sets how header paths are rendered.
    #[must_use]
    pub fn header_path(mut self, mode: HeaderPath) -> Self {
        self.header_path = Some(mode);
        self
    }

    /// Enables or disables multi-threaded reads.
    #[must_use]
    pub fn parallel_reads(mut self, enabled: bool) -> Self {
        self.parallel_reads = enabled;
        self
    }

    /// Sets the tokenizer implementation.
    #[must_use]
    pub fn tokenizer(mut self, kind: TokenizerKind) -> Self {
        self.tokenizer = Some(kind);
        self
    }

    /// Enables dry run mode (no file writes).
    #[must_use]
    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    /// Enables or disables backup creation.
    #[must_use]
    pub fn backup_existing(mut self, enabled: bool) -> Self {
        self.backup_existing = enabled;
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails.
    pub fn build(self) -> Result<Config> {
        let config = Config {
            root_dir: self.root_dir.unwrap_or_else(|| PathBuf::from(".")),
            include_suffixes: self.include_suffixes,
            exclude_suffixes: self.exclude_suffixes,
            output_path: self
                .output_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_PATH)),
            header_path: self.header_path.unwrap_or_default(),
            parallel_reads: self.parallel_reads,
            tokenizer: self.tokenizer.unwrap_or(TokenizerKind::Simple),
            dry_run: self.dry_run,
            backup_existing: self.backup_existing,
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let temp = assert_fs::TempDir::new().unwrap();
        let config = Config::builder()
            .root_dir(temp.path())
            .include([".go"])
            .build()
            .unwrap();

        assert_eq!(config.output_path, PathBuf::from(DEFAULT_OUTPUT_PATH));
        assert_eq!(config.header_path, HeaderPath::Traversal);
        assert!(config.exclude_suffixes.is_empty());
        assert!(!config.dry_run);
    }

    #[test]
    fn test_invalid_root_dir() {
        let result = Config::builder()
            .root_dir("/nonexistent/path/that/should/not/exist")
            .include([".go"])
            .build();

        assert!(result.unwrap_err().is_config());
    }

    #[test]
    fn test_root_is_file() {
        use assert_fs::prelude::*;

        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("main.go");
        file.write_str("package main").unwrap();

        let result = Config::builder()
            .root_dir(file.path())
            .include([".go"])
            .build();

        let err = result.unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("not a directory"));
    }

    #[test]
    fn test_requires_inclusion_suffix() {
        let temp = assert_fs::TempDir::new().unwrap();

        let result = Config::builder().root_dir(temp.path()).build();

        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_empty_suffix() {
        let temp = assert_fs::TempDir::new().unwrap();

        let result = Config::builder()
            .root_dir(temp.path())
            .include([".go"])
            .exclude([""])
            .build();

        assert!(result.is_err());
    }

    #[test]
    fn test_suffixes_are_additive() {
        let temp = assert_fs::TempDir::new().unwrap();

        let config = Config::builder()
            .root_dir(temp.path())
            .include([".go"])
            .include([".py", ".rs"])
            .exclude(["_test.go"])
            .build()
            .unwrap();

        assert_eq!(config.include_suffixes, vec![".go", ".py", ".rs"]);
        assert_eq!(config.exclude_suffixes, vec!["_test.go"]);
    }
}
