use crate::{
    error::Result,
    file::read_text,
    model::ModelClient,
    prompt::{Persona, PromptEngine, TaskPrompt},
    writer::Writer,
};
use serde::Serialize;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{info, instrument};

/// Inputs for one model invocation over a concatenated document.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    /// Concatenated document to embed in the prompt
    pub document_path: PathBuf,

    /// Where the completion is saved
    pub output_path: PathBuf,

    /// Task prompt placed before the document
    pub task: TaskPrompt,

    /// System prompt persona
    pub persona: Persona,

    /// Programming language named in the prompts
    pub language: String,

    /// Create a backup of an existing output file
    pub backup_existing: bool,
}

impl GenerateRequest {
    /// Creates a request with the default task, persona and language.
    #[must_use]
    pub fn new(document_path: impl Into<PathBuf>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            document_path: document_path.into(),
            output_path: output_path.into(),
            task: TaskPrompt::default(),
            persona: Persona::default(),
            language: "Golang".to_string(),
            backup_existing: false,
        }
    }
}

/// Statistics for a model invocation.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateStats {
    /// Size of the embedded document in bytes
    pub document_bytes: usize,

    /// Size of the user message in bytes
    pub prompt_bytes: usize,

    /// Size of the saved completion in bytes
    pub response_bytes: usize,

    /// Output file path
    pub output_path: String,

    /// Time spent waiting for the model
    pub model_duration: Duration,
}

/// Reads the document, asks `client` for a completion and saves it.
///
/// # Errors
///
/// Returns an error if the document cannot be read, prompt rendering fails,
/// the model call fails, or the output cannot be written. Nothing is written
/// when the model call fails.
#[instrument(skip(client, request), fields(document = %request.document_path.display()))]
pub fn generate(client: &dyn ModelClient, request: &GenerateRequest) -> Result<GenerateStats> {
    let document = read_text(&request.document_path)?;

    let engine = PromptEngine::new()?;
    let prompt = engine.build(&request.task, request.persona, &request.language, &document)?;

    info!("Requesting completion ({} prompt bytes)", prompt.user.len());
    let model_start = Instant::now();
    let response = client.complete(&prompt.system, &prompt.user)?;
    let model_duration = model_start.elapsed();

    Writer::new(request.backup_existing).write(&request.output_path, &response)?;

    info!("Response saved to {}", request.output_path.display());

    Ok(GenerateStats {
        document_bytes: document.len(),
        prompt_bytes: prompt.user.len(),
        response_bytes: response.len(),
        output_path: request.output_path.display().to_string(),
        model_duration,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::prompt::PromptKind;
    use assert_fs::prelude::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct StubClient {
        reply: Option<String>,
        calls: RefCell<Vec<(String, String)>>,
    }

    impl ModelClient for StubClient {
        fn complete(&self, system: &str, user: &str) -> Result<String> {
            self.calls
                .borrow_mut()
                .push((system.to_string(), user.to_string()));
            self.reply
                .clone()
                .ok_or_else(|| Error::model("stub has no reply"))
        }
    }

    fn stub(reply: &str) -> StubClient {
        StubClient {
            reply: Some(reply.to_string()),
            ..StubClient::default()
        }
    }

    #[test]
    fn test_generate_saves_response() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("concat.txt")
            .write_str("File: a.go\npackage a\n\n")
            .unwrap();

        let mut request = GenerateRequest::new(
            temp.path().join("concat.txt"),
            temp.path().join("out/result.diff"),
        );
        request.task = TaskPrompt::Custom("Add a leaf counter.".to_string());

        let client = stub("+count := 0\n");
        let stats = generate(&client, &request).unwrap();

        temp.child("out/result.diff").assert("+count := 0\n");
        assert_eq!(stats.response_bytes, 12);
        assert_eq!(stats.document_bytes, 22);

        let calls = client.calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "You are an expert Golang programmer.");
        assert_eq!(calls[0].1, "Add a leaf counter.\n\nFile: a.go\npackage a\n\n");
    }

    #[test]
    fn test_generate_with_builtin_prompt() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("concat.txt").write_str("File: ring.go\n\n\n").unwrap();

        let mut request =
            GenerateRequest::new(temp.path().join("concat.txt"), temp.path().join("test.diff"));
        request.task = TaskPrompt::Builtin(PromptKind::RingSignature);
        request.persona = Persona::Principal;
        request.language = "Rust".to_string();

        let client = stub("#[test] fn ring_of_one() {}");
        generate(&client, &request).unwrap();

        let calls = client.calls.borrow();
        assert!(calls[0].0.contains("writing code in Rust"));
        assert!(calls[0].1.contains("ring size of 1"));
        assert!(calls[0].1.ends_with("File: ring.go\n\n\n"));
    }

    #[test]
    fn test_generate_missing_document() {
        let temp = assert_fs::TempDir::new().unwrap();
        let request =
            GenerateRequest::new(temp.path().join("missing.txt"), temp.path().join("out.diff"));

        let client = stub("unused");
        let err = generate(&client, &request).unwrap_err();

        assert!(err.is_io());
        assert!(client.calls.borrow().is_empty());
    }

    #[test]
    fn test_generate_model_failure_writes_nothing() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("concat.txt").write_str("File: a.go\n\n\n").unwrap();
        let request =
            GenerateRequest::new(temp.path().join("concat.txt"), temp.path().join("out.diff"));

        let client = StubClient::default();
        let err = generate(&client, &request).unwrap_err();

        assert!(matches!(err, Error::Model { .. }));
        assert!(!temp.path().join("out.diff").exists());
    }
}
