pub mod feedback;
pub mod prompt;
pub mod registry;

use serde::{Deserialize, Serialize};

pub use feedback::{FallbackReason, ParseStatus, ParsedFeedback, RatingTier, ResponseParser};
pub use prompt::{Message, PromptBuilder, Role};
pub use registry::{MatchPolicy, Resolution, TaskRegistry};

/// The operations a command can request.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    TranslateToEnglish,
    TranslateToKorean,
    GrammarCheck,
}

impl TaskKind {
    /// Registry iteration order. Substring matching picks the first keyword found in this order.
    pub const ALL: [TaskKind; 3] = [
        TaskKind::TranslateToKorean,
        TaskKind::TranslateToEnglish,
        TaskKind::GrammarCheck,
    ];

    pub fn spec(self) -> &'static TaskSpec {
        match self {
            TaskKind::TranslateToEnglish => &TRANSLATE_TO_ENGLISH,
            TaskKind::TranslateToKorean => &TRANSLATE_TO_KOREAN,
            TaskKind::GrammarCheck => &GRAMMAR_CHECK,
        }
    }

    pub fn keyword(self) -> &'static str {
        self.spec().keyword
    }
}

/// Nucleus sampling settings handed to the generation backend.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq)]
pub struct SamplingParams {
    /// Probability mass kept by nucleus sampling, in (0, 1]
    pub top_p: f64,

    /// Softmax temperature, > 0
    pub temperature: f64,

    /// Penalty applied to recently seen tokens, 1.0 disables it
    pub repeat_penalty: f32,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            top_p: 0.95,
            temperature: 0.7,
            repeat_penalty: 1.2,
        }
    }
}

/// Fixed per-task configuration.
#[derive(Debug, PartialEq)]
pub struct TaskSpec {
    pub kind: TaskKind,

    /// Selector a caller puts in the command string
    pub keyword: &'static str,

    /// Role-defining instruction given to the model before the user's text
    pub system_content: &'static str,

    /// Instruction substituted in place of the keyword
    pub command_phrase: &'static str,

    pub max_new_tokens: usize,
    pub sampling: SamplingParams,
}

const SAMPLING: SamplingParams = SamplingParams {
    top_p: 0.95,
    temperature: 0.7,
    repeat_penalty: 1.2,
};

static TRANSLATE_TO_KOREAN: TaskSpec = TaskSpec {
    kind: TaskKind::TranslateToKorean,
    keyword: "t-to-ko",
    system_content:
        "You are EXAONE model from LG AI Research. A professional English to Korean translator.",
    command_phrase: "Translate this following text to natural, fluent Korean:",
    max_new_tokens: 128,
    sampling: SAMPLING,
};

static TRANSLATE_TO_ENGLISH: TaskSpec = TaskSpec {
    kind: TaskKind::TranslateToEnglish,
    keyword: "t-to-en",
    system_content:
        "You are EXAONE model from LG AI Research. A professional Korean to English translator.",
    command_phrase: "Translate this following text to natural, fluent English:",
    max_new_tokens: 128,
    sampling: SAMPLING,
};

static GRAMMAR_CHECK: TaskSpec = TaskSpec {
    kind: TaskKind::GrammarCheck,
    keyword: "g-check",
    system_content:
        "You are EXAONE model from LG AI Research, a professional Korean and English grammar checker.",
    command_phrase:
        "Provide a grammar quality rating (1-10). Respond in strict format: rating, feedback",
    max_new_tokens: 256,
    sampling: SAMPLING,
};
