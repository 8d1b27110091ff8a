//! Selecting and concatenating without the pipeline
//!
//! Useful when the document is consumed in memory instead of written.

use repocat::{Concatenator, HeaderPath};

fn main() -> anyhow::Result<()> {
    let files = repocat::select("./src", &[".rs"], &["main.rs"])?;

    for file in &files {
        println!("  {}", file.relative_path.display());
    }

    let document = Concatenator::default()
        .header_path(HeaderPath::Relative)
        .parallel_reads(true)
        .concatenate(&files)?;

    println!(
        "\n✓ {} files, {} bytes",
        document.file_count(),
        document.as_str().len()
    );

    Ok(())
}
