//! Prompt construction around a concatenated document.
//!
//! The system prompt sets the model's persona for a programming language;
//! the user message is a task prompt followed by the document verbatim.

use crate::error::{Error, Result};
use serde::Serialize;
use tera::{Context, Tera};

/// Built-in task prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    /// Unit test showing that a ring signature of size 1 does not work
    RingSignature,
    /// Counting non-empty leaves in a sparse merkle sum trie, with a diff
    SmtLeafCount,
}

impl PromptKind {
    const fn template_name(self) -> &'static str {
        match self {
            Self::RingSignature => "ring_signature",
            Self::SmtLeafCount => "smt_leaf_count",
        }
    }
}

/// Persona used for the system prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Persona {
    /// "You are an expert <language> programmer."
    #[default]
    Expert,
    /// Principal engineer with a cryptography and blockchain background
    Principal,
}

impl Persona {
    const fn template_name(self) -> &'static str {
        match self {
            Self::Expert => "system_expert",
            Self::Principal => "system_principal",
        }
    }
}

/// Task prompt placed before the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskPrompt {
    /// One of the bundled prompts
    Builtin(PromptKind),
    /// Caller-supplied text, used verbatim
    Custom(String),
}

impl Default for TaskPrompt {
    fn default() -> Self {
        Self::Builtin(PromptKind::SmtLeafCount)
    }
}

/// System and user messages ready for a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Prompt {
    /// System message
    pub system: String,
    /// User message: task prompt, blank line, document
    pub user: String,
}

#[derive(Serialize)]
struct PromptContext<'a> {
    language: &'a str,
}

/// Renders prompts from the bundled templates.
pub struct PromptEngine {
    tera: Tera,
}

impl PromptEngine {
    /// Creates a new prompt engine with the built-in templates registered.
    ///
    /// # Errors
    ///
    /// Returns an error if a bundled template fails to parse.
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();
        Self::register_builtin_templates(&mut tera)?;
        Ok(Self { tera })
    }

    fn register_builtin_templates(tera: &mut Tera) -> Result<()> {
        let templates = [
            ("system_expert", include_str!("../templates/system_expert.tera")),
            ("system_principal", include_str!("../templates/system_principal.tera")),
            ("ring_signature", include_str!("../templates/ring_signature.tera")),
            ("smt_leaf_count", include_str!("../templates/smt_leaf_count.tera")),
        ];

        for (name, source) in templates {
            tera.add_raw_template(name, source)
                .map_err(|e| Error::template(name, &e))?;
        }

        Ok(())
    }

    fn render(&self, name: &str, language: &str) -> Result<String> {
        let context = Context::from_serialize(PromptContext { language })
            .map_err(|e| Error::template(name, &e))?;

        self.tera
            .render(name, &context)
            .map(|s| s.trim_end().to_string())
            .map_err(|e| Error::template(name, &e))
    }

    /// Renders the system prompt for `language`.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    pub fn system_prompt(&self, persona: Persona, language: &str) -> Result<String> {
        self.render(persona.template_name(), language)
    }

    /// Renders the task prompt for `language`.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    pub fn task_prompt(&self, task: &TaskPrompt, language: &str) -> Result<String> {
        match task {
            TaskPrompt::Builtin(kind) => self.render(kind.template_name(), language),
            TaskPrompt::Custom(text) => Ok(text.clone()),
        }
    }

    /// Builds the system and user messages around `document`.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    pub fn build(
        &self,
        task: &TaskPrompt,
        persona: Persona,
        language: &str,
        document: &str,
    ) -> Result<Prompt> {
        let system = self.system_prompt(persona, language)?;
        let task = self.task_prompt(task, language)?;

        Ok(Prompt {
            system,
            user: format!("{task}\n\n{document}"),
        })
    }
}
