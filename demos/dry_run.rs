//! Dry run: build the document and report its size without writing it

use repocat::{Config, Pipeline, TokenizerKind};

fn main() -> anyhow::Result<()> {
    let config = Config::builder()
        .root_dir(".")
        .include([".rs", ".toml"])
        .exclude(["_test.rs"])
        .tokenizer(TokenizerKind::O200k)
        .dry_run(true)
        .build()?;

    let stats = Pipeline::new(config)?.run()?;

    println!(
        "Would write {} files, {} bytes, ~{} tokens",
        stats.selected_files, stats.total_bytes, stats.total_tokens
    );

    Ok(())
}
