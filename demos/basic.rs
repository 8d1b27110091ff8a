//! Basic example of using repocat as a library
//!
//! Concatenates every Rust source under `./src` into `concat.txt`.

use repocat::{Config, Pipeline};

fn main() -> anyhow::Result<()> {
    let config = Config::builder()
        .root_dir("./src")
        .include([".rs"])
        .output_path("concat.txt")
        .build()?;

    let stats = Pipeline::new(config)?.run()?;

    stats.print_summary();

    println!(
        "\n✓ Concatenated {} files (~{} tokens)",
        stats.selected_files, stats.total_tokens
    );
    println!("✓ Output written to: {}", stats.output_path);

    Ok(())
}
