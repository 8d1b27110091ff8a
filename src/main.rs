use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use repocat::{
    Config, GenerateRequest, HeaderPath, ModelConfig, OpenAiClient, Persona, Pipeline,
    PromptKind, TaskPrompt, TokenizerKind,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    name = "repocat",
    version,
    about = "Concatenate source files into one document and ask an LLM about it",
    long_about = "Concatenate source files into one document and ask an LLM about it.\n\n\
    USAGE EXAMPLES:\n  \
      # Concatenate Go sources, skipping tests\n  \
      repocat concat ./smt -i .go -e _test.go -o concat.txt\n\n  \
      # Count tokens with the gpt-4o encoding\n  \
      repocat tokens concat.txt\n\n  \
      # Ask the model for a diff\n  \
      repocat generate concat.txt result.diff --task smt-leaf-count"
)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Concatenate files whose names end with the given suffixes
    Concat(ConcatArgs),
    /// Estimate the number of tokens in a text file
    Tokens(TokensArgs),
    /// Send a concatenated document to a model and save the completion
    Generate(GenerateArgs),
}

#[derive(Args, Debug)]
struct ConcatArgs {
    /// Root directory to walk
    #[arg(value_name = "PATH")]
    root: PathBuf,

    /// File name suffixes to include (e.g. .go .py)
    #[arg(short, long = "include", value_name = "SUFFIX", num_args = 1.., required = true)]
    include: Vec<String>,

    /// File name suffixes to exclude, checked first (e.g. _test.go)
    #[arg(short, long = "exclude", value_name = "SUFFIX", num_args = 1..)]
    exclude: Vec<String>,

    /// Output file for the concatenated document
    #[arg(short, long, default_value = "output.diff", value_name = "FILE")]
    output: PathBuf,

    /// Write header paths relative to the root
    #[arg(long)]
    relative_headers: bool,

    /// Read files on multiple threads
    #[arg(long)]
    parallel: bool,

    /// Keep a timestamped backup of an existing output file
    #[arg(long)]
    backup: bool,

    /// Tokenizer used to report the document size
    #[arg(long, value_enum, default_value = "o200k")]
    tokenizer: CliTokenizer,

    /// Dry run (don't write the output)
    #[arg(long)]
    dry_run: bool,

    /// Print a summary table when done
    #[arg(long)]
    summary: bool,
}

#[derive(Args, Debug)]
struct TokensArgs {
    /// Text file to measure
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Tokenizer to use
    #[arg(long, value_enum, default_value = "o200k")]
    tokenizer: CliTokenizer,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Concatenated document to send
    #[arg(value_name = "DOCUMENT")]
    document: PathBuf,

    /// File to save the completion to
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Custom task prompt (overrides --task)
    #[arg(long, value_name = "TEXT")]
    prompt: Option<String>,

    /// Built-in task prompt
    #[arg(long, value_enum, default_value = "smt-leaf-count")]
    task: CliTask,

    /// System prompt persona
    #[arg(long, value_enum, default_value = "expert")]
    persona: CliPersona,

    /// Programming language named in the prompts
    #[arg(long, default_value = "Golang")]
    language: String,

    /// Model name
    #[arg(long, env = "REPOCAT_MODEL", default_value = "gpt-3.5-turbo-16k")]
    model: String,

    /// OpenAI-compatible API base URL (e.g. a locally hosted server)
    #[arg(long, env = "REPOCAT_BASE_URL", default_value = "https://api.openai.com/v1")]
    base_url: String,

    /// API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 300)]
    timeout_secs: u64,

    /// Keep a timestamped backup of an existing output file
    #[arg(long)]
    backup: bool,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliTokenizer {
    Simple,
    Enhanced,
    O200k,
}

impl From<CliTokenizer> for TokenizerKind {
    fn from(t: CliTokenizer) -> Self {
        match t {
            CliTokenizer::Simple => Self::Simple,
            CliTokenizer::Enhanced => Self::Enhanced,
            CliTokenizer::O200k => Self::O200k,
        }
    }
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliTask {
    /// Unit test for a ring signature of size 1
    RingSignature,
    /// Leaf counting in a sparse merkle sum trie
    SmtLeafCount,
}

impl From<CliTask> for PromptKind {
    fn from(t: CliTask) -> Self {
        match t {
            CliTask::RingSignature => Self::RingSignature,
            CliTask::SmtLeafCount => Self::SmtLeafCount,
        }
    }
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliPersona {
    /// Expert programmer in the given language
    Expert,
    /// Principal engineer with a cryptography background
    Principal,
}

impl From<CliPersona> for Persona {
    fn from(p: CliPersona) -> Self {
        match p {
            CliPersona::Expert => Self::Expert,
            CliPersona::Principal => Self::Principal,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_tracing(cli.verbose)?;

    match cli.command {
        Command::Concat(args) => concat(args),
        Command::Tokens(args) => tokens(&args),
        Command::Generate(args) => generate(args),
    }
}

fn concat(args: ConcatArgs) -> anyhow::Result<()> {
    let header_path = if args.relative_headers {
        HeaderPath::Relative
    } else {
        HeaderPath::Traversal
    };

    let config = Config::builder()
        .root_dir(args.root)
        .include(args.include)
        .exclude(args.exclude)
        .output_path(args.output)
        .header_path(header_path)
        .parallel_reads(args.parallel)
        .backup_existing(args.backup)
        .tokenizer(args.tokenizer.into())
        .dry_run(args.dry_run)
        .build()
        .context("Failed to build configuration")?;

    let stats = Pipeline::new(config)
        .context("Failed to create pipeline")?
        .run()
        .context("Concatenation failed")?;

    if args.summary {
        stats.print_summary();
    }

    Ok(())
}

fn tokens(args: &TokensArgs) -> anyhow::Result<()> {
    let count = repocat::estimate_file(&args.file, args.tokenizer.into())
        .with_context(|| format!("Failed to estimate tokens in {}", args.file.display()))?;

    println!(
        "Estimated number of tokens in {}: {}",
        args.file.display(),
        count
    );

    Ok(())
}

fn generate(args: GenerateArgs) -> anyhow::Result<()> {
    let client = OpenAiClient::new(ModelConfig {
        base_url: args.base_url,
        model: args.model,
        api_key: args.api_key.filter(|k| !k.is_empty()),
        timeout: Duration::from_secs(args.timeout_secs),
    })
    .context("Failed to create model client")?;

    // An empty --prompt falls back to the built-in task
    let task = match args.prompt.filter(|p| !p.trim().is_empty()) {
        Some(text) => TaskPrompt::Custom(text),
        None => TaskPrompt::Builtin(args.task.into()),
    };

    let request = GenerateRequest {
        document_path: args.document,
        output_path: args.output,
        task,
        persona: args.persona.into(),
        language: args.language,
        backup_existing: args.backup,
    };

    repocat::generate(&client, &request).context("Generation failed")?;

    Ok(())
}

fn setup_tracing(verbosity: u8) -> anyhow::Result<()> {
    let filter = match verbosity {
        0 => EnvFilter::new("repocat=info"),
        1 => EnvFilter::new("repocat=debug"),
        _ => EnvFilter::new("repocat=trace"),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_writer(std::io::stderr),
        )
        .try_init()
        .context("Failed to initialise logging")?;

    Ok(())
}
