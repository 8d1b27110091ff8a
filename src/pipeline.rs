use crate::{
    concat::{Concatenator, Document},
    config::Config,
    error::Result,
    selector::{SelectStats, Selector},
    token::TokenEstimator,
    writer::Writer,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, instrument, warn};

/// Statistics collected during a concatenation run.
#[derive(Debug, Clone, Serialize)]
pub struct ConcatStats {
    /// Regular files visited under the root
    pub visited_files: usize,

    /// Files written into the document
    pub selected_files: usize,

    /// Files rejected by an exclusion suffix
    pub excluded_files: usize,

    /// Files matching no inclusion suffix
    pub unmatched_files: usize,

    /// Document size in bytes
    pub total_bytes: usize,

    /// Lines across all selected files
    pub total_lines: usize,

    /// Estimated tokens in the document
    pub total_tokens: usize,

    /// Total execution time
    pub duration: Duration,

    /// Time spent walking
    pub select_duration: Duration,

    /// Time spent reading and joining
    pub concat_duration: Duration,

    /// Time spent writing
    pub write_duration: Duration,

    /// Output file path
    pub output_path: String,

    /// Whether the output file was written
    pub written: bool,
}

impl ConcatStats {
    fn new(select: &SelectStats, document: &Document, total_tokens: usize) -> Self {
        Self {
            visited_files: select.visited_files,
            selected_files: document.file_count(),
            excluded_files: select.excluded_files,
            unmatched_files: select.unmatched_files,
            total_bytes: document.as_str().len(),
            total_lines: document.entries().iter().map(|e| e.lines).sum(),
            total_tokens,
            duration: Duration::ZERO,
            select_duration: Duration::ZERO,
            concat_duration: Duration::ZERO,
            write_duration: Duration::ZERO,
            output_path: String::new(),
            written: false,
        }
    }

    /// Prints a human-readable summary to stdout.
    pub fn print_summary(&self) {
        println!("\n╔═══════════════════════════════════════════════════════╗");
        println!("║              Concatenation Summary                    ║");
        println!("╠═══════════════════════════════════════════════════════╣");
        println!(
            "║ Files Visited:        {:>8}                        ║",
            self.visited_files
        );
        println!(
            "║   - Selected:         {:>8}                        ║",
            self.selected_files
        );
        println!(
            "║   - Excluded:         {:>8}                        ║",
            self.excluded_files
        );
        println!(
            "║   - Unmatched:        {:>8}                        ║",
            self.unmatched_files
        );
        println!("║                                                       ║");
        println!(
            "║ Document Size:        {:>8} bytes                  ║",
            self.total_bytes
        );
        println!(
            "║ Total Lines:          {:>8}                        ║",
            self.total_lines
        );
        println!(
            "║ Estimated Tokens:     {:>8}                        ║",
            self.total_tokens
        );
        println!("║                                                       ║");
        println!("║ Output File:                                          ║");
        println!("║   {}", self.output_path);
        if !self.written {
            println!("║ ⚠ Nothing was written (dry run mode)                  ║");
        }
        println!("║                                                       ║");
        println!("║ Timing Breakdown:                                     ║");
        println!(
            "║   - Selecting:        {:>8.2}s                     ║",
            self.select_duration.as_secs_f64()
        );
        println!(
            "║   - Concatenating:    {:>8.2}s                     ║",
            self.concat_duration.as_secs_f64()
        );
        println!(
            "║   - Writing:          {:>8.2}s                     ║",
            self.write_duration.as_secs_f64()
        );
        println!(
            "║   - Total:            {:>8.2}s                     ║",
            self.duration.as_secs_f64()
        );
        println!("╚═══════════════════════════════════════════════════════╝\n");
    }
}

/// Select, concatenate and write, in that order.
pub struct Pipeline {
    config: Config,
    selector: Selector,
    concatenator: Concatenator,
    writer: Writer,
    tokenizer: Arc<dyn TokenEstimator>,
}

impl Pipeline {
    /// Creates a new pipeline with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration validation fails
    /// - The tokenizer cannot be created
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let selector = Selector::new(&config);
        let concatenator = Concatenator::new(&config);
        let writer = Writer::new(config.backup_existing);
        let tokenizer = config.tokenizer.create()?;

        Ok(Self {
            config,
            selector,
            concatenator,
            writer,
            tokenizer,
        })
    }

    /// Builds the document without writing it.
    ///
    /// # Errors
    ///
    /// Returns an error if selection or concatenation fails.
    pub fn document(&self) -> Result<Document> {
        let selection = self.selector.select()?;
        self.concatenator.concatenate(&selection.files)
    }

    /// Executes the complete pipeline and returns statistics.
    ///
    /// # Process
    ///
    /// 1. **Select**: walks the root and applies the suffix filter
    /// 2. **Concatenate**: reads every selected file into one document
    /// 3. **Write**: persists the document to the output path
    ///
    /// Any failure aborts the run before the output is touched.
    ///
    /// # Errors
    ///
    /// Returns an error if any stage fails.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use repocat::{Config, Pipeline};
    ///
    /// # fn main() -> anyhow::Result<()> {
    /// let config = Config::builder()
    ///     .root_dir("./smt")
    ///     .include([".go"])
    ///     .exclude(["_test.go"])
    ///     .output_path("concat.txt")
    ///     .build()?;
    ///
    /// let stats = Pipeline::new(config)?.run()?;
    /// stats.print_summary();
    /// # Ok(())
    /// # }
    /// ```
    #[instrument(skip(self), fields(root_dir = %self.config.root_dir.display()))]
    pub fn run(self) -> Result<ConcatStats> {
        let start_time = Instant::now();

        info!("Stage 1/3: Selecting files...");
        let select_start = Instant::now();
        let selection = self.selector.select()?;
        let select_duration = select_start.elapsed();

        info!(
            "✓ Selected {} of {} files ({} excluded) in {:.2}s",
            selection.stats.selected_files,
            selection.stats.visited_files,
            selection.stats.excluded_files,
            select_duration.as_secs_f64()
        );

        if selection.files.is_empty() {
            warn!(
                "No files under {} matched {:?}",
                self.config.root_dir.display(),
                self.config.include_suffixes
            );
        }

        info!("Stage 2/3: Concatenating...");
        let concat_start = Instant::now();
        let document = self.concatenator.concatenate(&selection.files)?;
        let concat_duration = concat_start.elapsed();

        let total_tokens = self.tokenizer.estimate(document.as_str());

        info!(
            "✓ Built {} byte document (~{} tokens) in {:.2}s",
            document.as_str().len(),
            total_tokens,
            concat_duration.as_secs_f64()
        );

        let write_start = Instant::now();
        let written = if self.config.dry_run {
            warn!("Dry run mode enabled - skipping file write");
            false
        } else {
            info!("Stage 3/3: Writing {}...", self.config.output_path.display());
            self.writer
                .write(&self.config.output_path, document.as_str())?;
            true
        };
        let write_duration = write_start.elapsed();

        let mut stats = ConcatStats::new(&selection.stats, &document, total_tokens);
        stats.duration = start_time.elapsed();
        stats.select_duration = select_duration;
        stats.concat_duration = concat_duration;
        stats.write_duration = write_duration;
        stats.output_path = self.config.output_path.display().to_string();
        stats.written = written;

        info!(
            "✓ Pipeline completed successfully in {:.2}s",
            stats.duration.as_secs_f64()
        );

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HeaderPath;
    use assert_fs::prelude::*;
    use std::path::Path;

    fn sample_tree() -> assert_fs::TempDir {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("src/a.go").write_str("package a\n").unwrap();
        temp.child("src/a_test.go").write_str("package a\n").unwrap();
        temp.child("src/b.py").write_str("print('b')\n").unwrap();
        temp.child("src/README.md").write_str("# readme\n").unwrap();
        temp
    }

    fn config(temp: &assert_fs::TempDir, include: &[&str], exclude: &[&str]) -> Config {
        Config::builder()
            .root_dir(temp.path().join("src"))
            .include(include.iter().copied())
            .exclude(exclude.iter().copied())
            .output_path(temp.path().join("output.diff"))
            .header_path(HeaderPath::Relative)
            .build()
            .unwrap()
    }

    #[test]
    fn test_pipeline_excludes_tests() {
        let temp = sample_tree();

        let stats = Pipeline::new(config(&temp, &[".go"], &["_test.go"]))
            .unwrap()
            .run()
            .unwrap();

        assert_eq!(stats.selected_files, 1);
        assert_eq!(stats.excluded_files, 1);
        assert!(stats.written);
        temp.child("output.diff").assert("File: a.go\npackage a\n\n\n");
    }

    #[test]
    fn test_pipeline_multiple_suffixes() {
        let temp = sample_tree();

        let stats = Pipeline::new(config(&temp, &[".go", ".py"], &[]))
            .unwrap()
            .run()
            .unwrap();

        assert_eq!(stats.selected_files, 3);
        let output = std::fs::read_to_string(temp.path().join("output.diff")).unwrap();
        assert_eq!(output.matches("File: ").count(), 3);
        assert!(output.starts_with("File: a.go\n"));
    }

    #[test]
    fn test_pipeline_empty_directory_writes_empty_file() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("src").create_dir_all().unwrap();

        let stats = Pipeline::new(config(&temp, &[".go"], &[]))
            .unwrap()
            .run()
            .unwrap();

        assert_eq!(stats.selected_files, 0);
        assert_eq!(stats.total_tokens, 0);
        temp.child("output.diff").assert("");
    }

    #[test]
    fn test_pipeline_dry_run() {
        let temp = sample_tree();
        let mut config = config(&temp, &[".go"], &[]);
        config.dry_run = true;

        let stats = Pipeline::new(config).unwrap().run().unwrap();

        assert!(!stats.written);
        assert!(stats.total_bytes > 0);
        assert!(!temp.path().join("output.diff").exists());
    }

    #[test]
    fn test_pipeline_decoding_error_leaves_output_untouched() {
        let temp = sample_tree();
        temp.child("src/z.go").write_binary(&[0xff, 0xfe]).unwrap();
        temp.child("output.diff").write_str("previous").unwrap();

        let result = Pipeline::new(config(&temp, &[".go"], &[])).unwrap().run();

        assert!(result.unwrap_err().is_invalid_utf8());
        temp.child("output.diff").assert("previous");
    }

    #[test]
    fn test_document_matches_written_output() {
        let temp = sample_tree();
        let pipeline = Pipeline::new(config(&temp, &[".py"], &[])).unwrap();

        let document = pipeline.document().unwrap();
        pipeline.run().unwrap();

        let written = std::fs::read_to_string(temp.path().join("output.diff")).unwrap();
        assert_eq!(document.as_str(), written);
    }

    #[test]
    fn test_pipeline_rejects_missing_root() {
        let config = Config {
            root_dir: Path::new("/nonexistent/repocat/root").to_path_buf(),
            include_suffixes: vec![".go".to_string()],
            ..Config::default()
        };

        assert!(Pipeline::new(config).is_err());
    }
}
