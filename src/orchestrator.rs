//! Single entry point tying command resolution, prompting, generation and parsing together.

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info, Dispatch};

use crate::inference::{BackendError, GenerationBackend, GenerationRequest};
use crate::task::{ParsedFeedback, PromptBuilder, ResponseParser, TaskKind, TaskRegistry};

/// Prompt excerpts in error logs are cut to this many characters.
const PROMPT_EXCERPT_CHARS: usize = 80;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("unknown task in command: {0}")]
    UnknownTask(String),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case", tag = "type", content = "result")]
pub enum TaskOutput {
    Translation(String),
    Grammar(ParsedFeedback),
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct TaskResult {
    pub task: TaskKind,
    #[serde(flatten)]
    pub output: TaskOutput,
}

pub struct Orchestrator<B> {
    registry: TaskRegistry,
    backend: B,
    dispatch: Option<Dispatch>,
}

impl<B: GenerationBackend> Orchestrator<B> {
    pub fn new(registry: TaskRegistry, backend: B) -> Self {
        Self {
            registry,
            backend,
            dispatch: None,
        }
    }

    /// Routes every event of [`Orchestrator::handle`] to `dispatch` instead of the global subscriber.
    pub fn with_dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = Some(dispatch);
        self
    }

    pub fn handle(&mut self, command: &str) -> Result<TaskResult, OrchestratorError> {
        match self.dispatch.clone() {
            Some(dispatch) => tracing::dispatcher::with_default(&dispatch, || self.run(command)),
            None => self.run(command),
        }
    }

    fn run(&mut self, command: &str) -> Result<TaskResult, OrchestratorError> {
        let Some(resolution) = self.registry.resolve(command) else {
            error!(command, policy = %self.registry.policy(), "unknown task in command");
            return Err(OrchestratorError::UnknownTask(command.to_string()));
        };
        let spec = resolution.spec;
        info!(task = ?resolution.kind, keyword = spec.keyword, "resolved task");

        let messages = PromptBuilder::build(spec.system_content, &resolution.remainder);
        info!(?messages, "built prompt");

        let request = GenerationRequest {
            messages: messages.to_vec(),
            max_new_tokens: spec.max_new_tokens,
            sampling: spec.sampling,
            eos_marker: self.backend.eos_marker().to_string(),
        };

        let raw = match self.backend.generate(&request) {
            Ok(raw) => raw,
            Err(err) => {
                error!(
                    task = ?resolution.kind,
                    prompt = %excerpt(&resolution.remainder),
                    error = %err,
                    "generation failed"
                );
                return Err(err.into());
            }
        };
        info!(output = %raw, "generated output");

        let output = match resolution.kind {
            TaskKind::TranslateToEnglish | TaskKind::TranslateToKorean => {
                TaskOutput::Translation(raw)
            }
            TaskKind::GrammarCheck => {
                let parsed = ResponseParser::parse(&raw);
                if parsed.is_fallback() {
                    debug!(status = ?parsed.status, "grammar output did not match the expected format");
                }
                TaskOutput::Grammar(parsed)
            }
        };

        Ok(TaskResult {
            task: resolution.kind,
            output,
        })
    }
}

fn excerpt(text: &str) -> String {
    match text.char_indices().nth(PROMPT_EXCERPT_CHARS) {
        Some((index, _)) => format!("{}...", &text[..index]),
        None => text.to_string(),
    }
}
